use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

use crate::classify::Aggregation;
use crate::config::LookupConfig;
use crate::domain::normalize_domain;
use crate::export::{self, ExportFormat, ExportSummary};
use crate::input::{load_domains, DomainList, LoadOutcome};
use crate::lookup::{ContactLookup, HunterClient};
use crate::records::{DomainOutcome, RecordSet, RunTimestamp};
use crate::utils::format_number;
use crate::{Args, Command};

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub executives_only: bool,
    pub role: Option<String>,
}

#[derive(Debug)]
pub struct RunReport {
    pub domains_searched: usize,
    pub records: RecordSet,
    pub export: Result<ExportSummary>,
}

fn found_message(count: usize, executives_only: bool) -> String {
    let kind = if executives_only { "executive" } else { "contact" };
    format!("Found {} {} email(s)", count, kind)
}

/// Looks up every domain in order and classifies the results. A failed lookup
/// becomes a not-found record; it never stops the batch.
pub fn collect_records(
    lookup: &dyn ContactLookup,
    domains: &DomainList,
    options: &RunOptions,
    timestamp: RunTimestamp,
) -> RecordSet {
    let aggregation = Aggregation {
        executives_only: options.executives_only,
        timestamp,
    };
    let mut records = RecordSet::default();

    for domain in &domains.domains {
        println!("Searching {}...", domain);
        let outcome = lookup.domain_search(domain, options.role.as_deref());
        if let Err(e) = &outcome {
            warn!(
                action = "lookup",
                component = "pipeline",
                domain = domain.as_str(),
                error = %e,
                "Lookup failed"
            );
        }

        match aggregation.aggregate(domain, domains.group_for(domain), &outcome) {
            DomainOutcome::Found(found) => {
                println!("  {}", found_message(found.len(), options.executives_only));
                records.push(DomainOutcome::Found(found));
            }
            DomainOutcome::NotFound(missing) => {
                println!("  No emails found ({})", missing.reason);
                records.push(DomainOutcome::NotFound(missing));
            }
        }
    }

    records
}

/// Loads the input, runs every lookup, then merges the results into the output file.
pub fn run_search(
    lookup: &dyn ContactLookup,
    input: &Path,
    output: &Path,
    format: ExportFormat,
    options: &RunOptions,
) -> Result<RunReport> {
    let start_time = Instant::now();

    let domains = match load_domains(input)? {
        LoadOutcome::CreatedExample(list) => {
            println!(
                "WARNING: {} not found. Created an example file; searching its sample domains.",
                input.display()
            );
            list
        }
        LoadOutcome::Loaded(list) => list,
    };

    if domains.is_empty() {
        anyhow::bail!("No domains found in {}", input.display());
    }

    println!("Searching {} companies...\n", format_number(domains.len()));
    let timestamp = RunTimestamp::now();
    let records = collect_records(lookup, &domains, options, timestamp);

    info!(
        action = "lookup_complete",
        component = "pipeline",
        domains = domains.len(),
        found = records.found.len(),
        not_found = records.not_found.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Lookups finished"
    );

    let export = export::export(&records, output, format)
        .with_context(|| format!("Failed to write results to {}", output.display()));

    Ok(RunReport {
        domains_searched: domains.len(),
        records,
        export,
    })
}

pub fn print_run_report(report: &RunReport, output: &Path) {
    println!("\n--- Search Summary ---");
    println!("Domains searched: {}", format_number(report.domains_searched));
    println!("Contact emails found: {}", format_number(report.records.found.len()));
    println!("Domains without results: {}", format_number(report.records.not_found.len()));

    match &report.export {
        Ok(summary) if summary.wrote_anything() => {
            println!("\n✓ {} in {}", capitalize(&summary.to_string()), output.display());
        }
        Ok(summary) if summary.duplicates_skipped == 0 => {
            println!("\nNothing to export to {}", output.display());
        }
        Ok(summary) => {
            println!(
                "\n✓ No new records to add (all {} already exist in {})",
                format_number(summary.duplicates_skipped),
                output.display()
            );
        }
        Err(e) => println!("\n✗ Export failed: {:#}", e),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn find_person(
    client: &HunterClient,
    domain: &str,
    first_name: &str,
    last_name: &str,
) -> Result<()> {
    let domain = normalize_domain(domain)
        .with_context(|| format!("Could not read a domain from {:?}", domain))?;

    match client.find_email(&domain, first_name, last_name) {
        Ok(Some(contact)) => {
            println!(
                "{} {} <{}>",
                contact.first_name.as_deref().unwrap_or(first_name),
                contact.last_name.as_deref().unwrap_or(last_name),
                contact.email.as_deref().unwrap_or_default()
            );
            if let Some(position) = &contact.position {
                println!("Position: {}", position);
            }
            if let Some(confidence) = contact.confidence {
                println!("Confidence: {}", confidence);
            }
        }
        Ok(None) => println!("No email found for {} {} at {}", first_name, last_name, domain),
        Err(e) => anyhow::bail!(
            "Lookup failed for {} {} at {}: {}",
            first_name,
            last_name,
            domain,
            e
        ),
    }
    Ok(())
}

pub fn run(args: &Args) -> Result<()> {
    let config = LookupConfig::from_env(args.api_key.as_deref())?;
    let client = HunterClient::new(config).context("Failed to build HTTP client")?;

    if let Some(Command::Find {
        domain,
        first_name,
        last_name,
    }) = &args.command
    {
        return find_person(&client, domain, first_name, last_name);
    }

    println!("Executive Email Finder");
    println!("{}", "=".repeat(50));

    let options = RunOptions {
        executives_only: !args.all_contacts,
        role: args.role.clone(),
    };
    let report = run_search(&client, &args.input, &args.output, args.format, &options)?;
    print_run_report(&report, &args.output);

    report.export.map(|_| ())
}

//! Sectioned domain list loading.
//!
//! The input is plain text, one domain or URL per line. A `## Label` line starts a
//! new group; every domain below it belongs to that group until the next header.
//! Other `#` lines are comments.

use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::domain::normalize_domain;
use crate::records::DEFAULT_GROUP;

pub const EXAMPLE_INPUT: &str = "\
# Company domains to search, one per line (bare domains or full URLs)
# Start a group with a line like: ## Sponsor Name
## Example Sponsors
stripe.com
salesforce.com
";

/// Unique canonical domains in first-seen order, each tagged with its group label.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DomainList {
    pub domains: Vec<String>,
    pub groups: HashMap<String, String>,
}

impl DomainList {
    pub fn group_for(&self, domain: &str) -> &str {
        self.groups
            .get(domain)
            .map(String::as_str)
            .unwrap_or(DEFAULT_GROUP)
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The source existed; the list may be empty.
    Loaded(DomainList),
    /// The source was missing, so an example file was written and its contents returned.
    CreatedExample(DomainList),
}

impl LoadOutcome {
    pub fn domains(&self) -> &DomainList {
        match self {
            LoadOutcome::Loaded(list) | LoadOutcome::CreatedExample(list) => list,
        }
    }

    pub fn into_domains(self) -> DomainList {
        match self {
            LoadOutcome::Loaded(list) | LoadOutcome::CreatedExample(list) => list,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Line<'a> {
    Blank,
    Comment,
    Group(&'a str),
    Token(&'a str),
}

fn classify_line(raw: &str) -> Line<'_> {
    let line = raw.trim();
    if line.is_empty() {
        Line::Blank
    } else if line == "##" {
        Line::Group("")
    } else if let Some(label) = line.strip_prefix("## ") {
        Line::Group(label.trim())
    } else if line.starts_with('#') {
        Line::Comment
    } else {
        Line::Token(line)
    }
}

#[derive(Debug)]
struct ParseState {
    group: String,
    list: DomainList,
}

impl Default for ParseState {
    fn default() -> Self {
        Self {
            group: DEFAULT_GROUP.to_string(),
            list: DomainList::default(),
        }
    }
}

impl ParseState {
    fn apply(mut self, (line_num, raw): (usize, &str)) -> Self {
        match classify_line(raw) {
            Line::Blank | Line::Comment => {}
            Line::Group(label) => {
                self.group = if label.is_empty() {
                    DEFAULT_GROUP.to_string()
                } else {
                    label.to_string()
                };
            }
            Line::Token(token) => match normalize_domain(token) {
                Some(domain) => {
                    if !self.list.groups.contains_key(&domain) {
                        self.list.groups.insert(domain.clone(), self.group.clone());
                        self.list.domains.push(domain);
                    }
                }
                None => {
                    warn!(
                        action = "parse",
                        component = "input_loader",
                        line_number = line_num + 1,
                        token = token,
                        "Skipping unparseable domain"
                    )
                }
            },
        }
        self
    }
}

/// Parses sectioned text into a deduplicated domain list. First occurrence wins,
/// including its group label.
pub fn parse_domain_list(content: &str) -> DomainList {
    content
        .lines()
        .enumerate()
        .fold(ParseState::default(), ParseState::apply)
        .list
}

/// Loads the domain list at `path`, writing an example file there if it is missing.
pub fn load_domains(path: &Path) -> Result<LoadOutcome> {
    if !path.exists() {
        warn!(
            action = "create",
            component = "input_loader",
            file_path = ?path,
            "Input file not found, creating example file"
        );
        fs::write(path, EXAMPLE_INPUT)
            .with_context(|| format!("Failed to create example input file {:?}", path))?;
        return Ok(LoadOutcome::CreatedExample(parse_domain_list(EXAMPLE_INPUT)));
    }

    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read input file {:?}", path))?;
    let list = parse_domain_list(&content);

    let group_count = list.groups.values().collect::<HashSet<_>>().len();
    info!(
        action = "loaded",
        component = "input_loader",
        file_path = ?path,
        domain_count = list.len(),
        group_count,
        "Loaded domains"
    );
    Ok(LoadOutcome::Loaded(list))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_plain_list_defaults_to_unknown_group() {
        let list = parse_domain_list("stripe.com\nsalesforce.com\n");
        assert_eq!(list.domains, vec!["stripe.com", "salesforce.com"]);
        assert_eq!(list.group_for("stripe.com"), "Unknown");
        assert_eq!(list.group_for("salesforce.com"), "Unknown");
    }

    #[test]
    fn test_group_headers_assign_labels() {
        let content = "## Acme Foundation\nstripe.com\n## Beta Club\nhttps://www.Notion.so/pricing\n";
        let list = parse_domain_list(content);

        assert_eq!(list.domains, vec!["stripe.com", "notion.so"]);
        assert_eq!(list.group_for("stripe.com"), "Acme Foundation");
        assert_eq!(list.group_for("notion.so"), "Beta Club");
    }

    #[test]
    fn test_first_seen_label_wins() {
        let list = parse_domain_list("## A\nx.com\n## B\nx.com\n");
        assert_eq!(list.domains, vec!["x.com"]);
        assert_eq!(list.group_for("x.com"), "A");
    }

    #[test]
    fn test_duplicate_forms_collapse_to_one_domain() {
        let list = parse_domain_list("example.com\nhttps://www.example.com/team\nEXAMPLE.COM\n");
        assert_eq!(list.domains, vec!["example.com"]);
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let list = parse_domain_list("# a comment\n\n   \n#another\nexample.com\n");
        assert_eq!(list.domains, vec!["example.com"]);
    }

    #[test]
    fn test_empty_group_header_resets_to_unknown() {
        let list = parse_domain_list("## Sponsors\na.com\n##\nb.com\n## \nc.com\n");
        assert_eq!(list.group_for("a.com"), "Sponsors");
        assert_eq!(list.group_for("b.com"), "Unknown");
        assert_eq!(list.group_for("c.com"), "Unknown");
    }

    #[test]
    fn test_group_label_is_trimmed() {
        let list = parse_domain_list("##    Spaced Out   \na.com\n");
        assert_eq!(list.group_for("a.com"), "Spaced Out");
    }

    #[test]
    fn test_unparseable_lines_do_not_stop_parsing() {
        let list = parse_domain_list("https://\nexample.com\n");
        assert_eq!(list.domains, vec!["example.com"]);
    }

    #[test]
    fn test_missing_file_creates_example() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("companies.txt");

        let outcome = load_domains(&path).unwrap();

        assert!(matches!(outcome, LoadOutcome::CreatedExample(_)));
        assert_eq!(outcome.domains().domains, vec!["stripe.com", "salesforce.com"]);
        assert_eq!(outcome.domains().group_for("stripe.com"), "Example Sponsors");
        assert_eq!(fs::read_to_string(&path).unwrap(), EXAMPLE_INPUT);
    }

    #[test]
    fn test_existing_file_without_domains_is_empty_not_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("companies.txt");
        fs::write(&path, "# nothing here yet\n## Group\n").unwrap();

        let outcome = load_domains(&path).unwrap();

        assert!(matches!(outcome, LoadOutcome::Loaded(ref list) if list.is_empty()));
    }
}

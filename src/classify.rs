use crate::lookup::{Contact, DomainSearch, LookupError};
use crate::records::{
    ContactRecord, DomainOutcome, NoResultRecord, RunTimestamp, REASON_NO_EMAILS,
    REASON_NO_EXECUTIVES,
};

/// Substrings that mark a position as executive. Matching is plain substring on the
/// lowercased title, so "head" also hits titles like "headquarters liaison".
pub const EXECUTIVE_KEYWORDS: [&str; 11] = [
    "ceo",
    "cfo",
    "cto",
    "coo",
    "chief",
    "president",
    "founder",
    "director",
    "vp",
    "vice president",
    "head",
];

pub fn is_executive(contact: &Contact) -> bool {
    let position = contact.position.as_deref().unwrap_or_default().to_lowercase();
    EXECUTIVE_KEYWORDS
        .iter()
        .any(|keyword| position.contains(keyword))
}

/// Per-run settings shared by every domain's aggregation.
#[derive(Debug, Clone, Copy)]
pub struct Aggregation {
    pub executives_only: bool,
    pub timestamp: RunTimestamp,
}

impl Aggregation {
    /// Turns one domain's lookup outcome into either found records or a single
    /// not-found record.
    pub fn aggregate(
        &self,
        domain: &str,
        group: &str,
        outcome: &Result<DomainSearch, LookupError>,
    ) -> DomainOutcome {
        let search = match outcome {
            Ok(search) => search,
            Err(err) => return self.not_found(domain, domain, group, err.reason()),
        };

        let company = search.company.as_deref().unwrap_or(domain);
        if search.contacts.is_empty() {
            return self.not_found(domain, company, group, REASON_NO_EMAILS.to_string());
        }

        let records: Vec<ContactRecord> = search
            .contacts
            .iter()
            .filter(|contact| !self.executives_only || is_executive(contact))
            .filter_map(|contact| {
                let email = contact.email.as_deref()?.trim();
                (!email.is_empty()).then(|| ContactRecord {
                    domain: domain.to_string(),
                    company: company.to_string(),
                    email: email.to_string(),
                    first_name: contact.first_name.clone(),
                    last_name: contact.last_name.clone(),
                    position: contact.position.clone(),
                    department: contact.department.clone(),
                    confidence: contact.confidence,
                    group: group.to_string(),
                    timestamp: self.timestamp,
                })
            })
            .collect();

        if records.is_empty() {
            self.not_found(domain, company, group, REASON_NO_EXECUTIVES.to_string())
        } else {
            DomainOutcome::Found(records)
        }
    }

    fn not_found(&self, domain: &str, company: &str, group: &str, reason: String) -> DomainOutcome {
        DomainOutcome::NotFound(NoResultRecord {
            domain: domain.to_string(),
            company: company.to_string(),
            group: group.to_string(),
            reason,
            timestamp: self.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn timestamp() -> RunTimestamp {
        RunTimestamp::at(
            NaiveDate::from_ymd_opt(2026, 10, 15)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
        )
    }

    fn contact(email: &str, position: Option<&str>) -> Contact {
        Contact {
            email: Some(email.to_string()),
            first_name: Some("Pat".to_string()),
            last_name: Some("Lee".to_string()),
            position: position.map(str::to_string),
            department: Some("executive".to_string()),
            confidence: Some(91),
        }
    }

    fn executives_only() -> Aggregation {
        Aggregation {
            executives_only: true,
            timestamp: timestamp(),
        }
    }

    #[test]
    fn test_executive_keywords() {
        assert!(is_executive(&contact("a@x.com", Some("Chief Financial Officer"))));
        assert!(is_executive(&contact("a@x.com", Some("CEO & Co-Founder"))));
        assert!(is_executive(&contact("a@x.com", Some("VP of Sales"))));
        assert!(is_executive(&contact("a@x.com", Some("Head of Partnerships"))));
        assert!(!is_executive(&contact("a@x.com", Some("Software Engineer"))));
        assert!(!is_executive(&contact("a@x.com", None)));
    }

    #[test]
    fn test_keyword_match_is_plain_substring() {
        assert!(is_executive(&contact("a@x.com", Some("Headquarters Liaison"))));
    }

    #[test]
    fn test_executive_contact_becomes_found_record() {
        let outcome = Ok(DomainSearch {
            company: Some("Stripe".to_string()),
            contacts: vec![contact("pat@stripe.com", Some("Chief Financial Officer"))],
        });

        let result = executives_only().aggregate("stripe.com", "Sponsors", &outcome);

        let DomainOutcome::Found(records) = result else {
            panic!("expected found records");
        };
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].email, "pat@stripe.com");
        assert_eq!(records[0].company, "Stripe");
        assert_eq!(records[0].position.as_deref(), Some("Chief Financial Officer"));
        assert_eq!(records[0].group, "Sponsors");
        assert_eq!(records[0].timestamp, timestamp());
    }

    #[test]
    fn test_only_non_executives_yields_no_executive_reason() {
        let outcome = Ok(DomainSearch {
            company: None,
            contacts: vec![contact("dev@stripe.com", Some("Software Engineer"))],
        });

        let result = executives_only().aggregate("stripe.com", "Unknown", &outcome);

        let DomainOutcome::NotFound(record) = result else {
            panic!("expected not-found record");
        };
        assert_eq!(record.reason, "No executive emails found");
        assert_eq!(record.company, "stripe.com");
    }

    #[test]
    fn test_all_contacts_mode_keeps_non_executives() {
        let aggregation = Aggregation {
            executives_only: false,
            timestamp: timestamp(),
        };
        let outcome = Ok(DomainSearch {
            company: None,
            contacts: vec![
                contact("dev@stripe.com", Some("Software Engineer")),
                contact("ceo@stripe.com", Some("CEO")),
            ],
        });

        let DomainOutcome::Found(records) = aggregation.aggregate("stripe.com", "Unknown", &outcome)
        else {
            panic!("expected found records");
        };
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_zero_contacts_yields_no_emails_reason() {
        let outcome = Ok(DomainSearch::default());
        let result = executives_only().aggregate("quiet.io", "Unknown", &outcome);
        assert!(matches!(result, DomainOutcome::NotFound(ref r) if r.reason == "No emails in database"));
    }

    #[test]
    fn test_lookup_failure_carries_reason() {
        let outcome = Err(LookupError::Timeout);
        let result = executives_only().aggregate("slow.io", "Group", &outcome);

        let DomainOutcome::NotFound(record) = result else {
            panic!("expected not-found record");
        };
        assert_eq!(record.reason, "Lookup failed: request timed out");
        assert_eq!(record.group, "Group");
    }

    #[test]
    fn test_contacts_without_address_do_not_qualify() {
        let mut nameless = contact("", Some("CEO"));
        nameless.email = None;
        let outcome = Ok(DomainSearch {
            company: None,
            contacts: vec![nameless, contact("  ", Some("CTO"))],
        });

        let result = executives_only().aggregate("x.com", "Unknown", &outcome);
        assert!(matches!(result, DomainOutcome::NotFound(ref r) if r.reason == "No executive emails found"));
    }
}

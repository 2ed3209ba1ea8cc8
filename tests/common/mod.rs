#![allow(dead_code)]

use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::HashMap;

use execmail::lookup::{Contact, ContactLookup, DomainSearch, LookupError};
use execmail::records::{ContactRecord, NoResultRecord, RunTimestamp};

pub fn timestamp() -> RunTimestamp {
    RunTimestamp::at(
        NaiveDate::from_ymd_opt(2026, 10, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap(),
    )
}

pub fn found(domain: &str, email: &str, position: &str) -> ContactRecord {
    ContactRecord {
        domain: domain.to_string(),
        company: domain.to_string(),
        email: email.to_string(),
        first_name: Some("Pat".to_string()),
        last_name: Some("Lee".to_string()),
        position: Some(position.to_string()),
        department: Some("executive".to_string()),
        confidence: Some(95),
        group: "Sponsors".to_string(),
        timestamp: timestamp(),
    }
}

pub fn not_found(domain: &str, reason: &str) -> NoResultRecord {
    NoResultRecord {
        domain: domain.to_string(),
        company: domain.to_string(),
        group: "Sponsors".to_string(),
        reason: reason.to_string(),
        timestamp: timestamp(),
    }
}

pub fn contact(email: &str, position: &str) -> Contact {
    Contact {
        email: Some(email.to_string()),
        first_name: Some("Pat".to_string()),
        last_name: Some("Lee".to_string()),
        position: Some(position.to_string()),
        department: None,
        confidence: Some(90),
    }
}

/// Canned lookup results keyed by domain; unknown domains return no contacts.
#[derive(Default)]
pub struct FakeLookup {
    responses: HashMap<String, Result<DomainSearch, LookupError>>,
    pub calls: RefCell<Vec<String>>,
}

impl FakeLookup {
    pub fn with(mut self, domain: &str, response: Result<DomainSearch, LookupError>) -> Self {
        self.responses.insert(domain.to_string(), response);
        self
    }

    pub fn with_contacts(self, domain: &str, company: &str, contacts: Vec<Contact>) -> Self {
        self.with(
            domain,
            Ok(DomainSearch {
                company: Some(company.to_string()),
                contacts,
            }),
        )
    }
}

impl ContactLookup for FakeLookup {
    fn domain_search(
        &self,
        domain: &str,
        _role: Option<&str>,
    ) -> Result<DomainSearch, LookupError> {
        self.calls.borrow_mut().push(domain.to_string());
        self.responses
            .get(domain)
            .cloned()
            .unwrap_or_else(|| Ok(DomainSearch::default()))
    }
}

use chrono::{Local, NaiveDateTime};
use std::fmt;

pub const DEFAULT_GROUP: &str = "Unknown";

/// Column order of found records, shared by the row file and the "found" sheet.
pub const FOUND_HEADERS: [&str; 10] = [
    "Domain",
    "Company",
    "Email",
    "First Name",
    "Last Name",
    "Position",
    "Department",
    "Confidence",
    "Group Label",
    "Run Timestamp",
];

pub const NOT_FOUND_HEADERS: [&str; 5] =
    ["Domain", "Company", "Group Label", "Reason", "Run Timestamp"];

pub const REASON_NO_EXECUTIVES: &str = "No executive emails found";
pub const REASON_NO_EMAILS: &str = "No emails in database";

/// Captured once per run and stamped on every record produced by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTimestamp(NaiveDateTime);

impl RunTimestamp {
    pub fn now() -> Self {
        Self(Local::now().naive_local())
    }

    pub fn at(moment: NaiveDateTime) -> Self {
        Self(moment)
    }
}

impl fmt::Display for RunTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S"))
    }
}

/// One executive contact discovered for a domain.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactRecord {
    pub domain: String,
    pub company: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub confidence: Option<u8>,
    pub group: String,
    pub timestamp: RunTimestamp,
}

impl ContactRecord {
    pub fn email_key(&self) -> String {
        self.email.trim().to_lowercase()
    }

    pub fn domain_key(&self) -> String {
        self.domain.trim().to_lowercase()
    }

    /// Cells in `FOUND_HEADERS` order.
    pub fn to_row(&self) -> [String; 10] {
        [
            self.domain.clone(),
            self.company.clone(),
            self.email.clone(),
            self.first_name.clone().unwrap_or_default(),
            self.last_name.clone().unwrap_or_default(),
            self.position.clone().unwrap_or_default(),
            self.department.clone().unwrap_or_default(),
            self.confidence.map(|c| c.to_string()).unwrap_or_default(),
            self.group.clone(),
            self.timestamp.to_string(),
        ]
    }
}

/// A domain that produced no qualifying contact.
#[derive(Debug, Clone, PartialEq)]
pub struct NoResultRecord {
    pub domain: String,
    pub company: String,
    pub group: String,
    pub reason: String,
    pub timestamp: RunTimestamp,
}

impl NoResultRecord {
    pub fn domain_key(&self) -> String {
        self.domain.trim().to_lowercase()
    }

    /// Cells in `NOT_FOUND_HEADERS` order.
    pub fn to_row(&self) -> [String; 5] {
        [
            self.domain.clone(),
            self.company.clone(),
            self.group.clone(),
            self.reason.clone(),
            self.timestamp.to_string(),
        ]
    }
}

/// Outcome of classifying one domain's lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainOutcome {
    Found(Vec<ContactRecord>),
    NotFound(NoResultRecord),
}

/// Everything a run produced, in lookup order.
#[derive(Debug, Default, Clone)]
pub struct RecordSet {
    pub found: Vec<ContactRecord>,
    pub not_found: Vec<NoResultRecord>,
}

impl RecordSet {
    pub fn push(&mut self, outcome: DomainOutcome) {
        match outcome {
            DomainOutcome::Found(records) => self.found.extend(records),
            DomainOutcome::NotFound(record) => self.not_found.push(record),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.found.is_empty() && self.not_found.is_empty()
    }

    pub fn total(&self) -> usize {
        self.found.len() + self.not_found.len()
    }
}

//! Contact discovery through the Hunter REST API.
//!
//! The rest of the crate only depends on [`ContactLookup`]; [`HunterClient`] is the
//! production implementation. Every call is a single blocking attempt bounded by the
//! configured timeout.

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::LookupConfig;

/// One person returned by the lookup service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Contact {
    #[serde(rename = "value")]
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub confidence: Option<u8>,
}

/// Successful result of a domain search. `contacts` may be empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomainSearch {
    pub company: Option<String>,
    pub contacts: Vec<Contact>,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LookupError {
    #[error("request timed out")]
    Timeout,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("HTTP {status}: {detail}")]
    Http { status: u16, detail: String },

    #[error("network error: {0}")]
    Network(String),
}

impl LookupError {
    /// Human-readable reason stored on the not-found record for this failure.
    pub fn reason(&self) -> String {
        match self {
            LookupError::RateLimited => {
                "Lookup failed: rate limit exceeded (HTTP 429), try again later".to_string()
            }
            LookupError::Unauthorized(_) => {
                "Lookup failed: API key rejected (check HUNTER_API_KEY)".to_string()
            }
            other => format!("Lookup failed: {}", other),
        }
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LookupError::Timeout
        } else {
            LookupError::Network(err.to_string())
        }
    }
}

/// The contract the pipeline needs from a contact discovery service.
pub trait ContactLookup {
    fn domain_search(&self, domain: &str, role: Option<&str>)
        -> Result<DomainSearch, LookupError>;
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct DomainSearchData {
    organization: Option<String>,
    #[serde(default)]
    emails: Vec<Contact>,
}

#[derive(Debug, Deserialize)]
struct EmailFinderData {
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    position: Option<String>,
    score: Option<u8>,
}

pub struct HunterClient {
    client: Client,
    config: LookupConfig,
}

impl HunterClient {
    pub fn new(config: LookupConfig) -> Result<Self, LookupError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Looks up a single person's address at `domain`. `Ok(None)` means the service
    /// answered but had no address.
    pub fn find_email(
        &self,
        domain: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<Contact>, LookupError> {
        let url = format!("{}/email-finder", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("domain", domain),
                ("first_name", first_name),
                ("last_name", last_name),
                ("api_key", self.config.api_key.as_str()),
            ])
            .send()?;

        let envelope: Envelope<EmailFinderData> = decode(response)?;
        Ok(envelope.data.and_then(|data| {
            data.email.map(|email| Contact {
                email: Some(email),
                first_name: data.first_name,
                last_name: data.last_name,
                position: data.position,
                department: None,
                confidence: data.score,
            })
        }))
    }
}

impl ContactLookup for HunterClient {
    fn domain_search(
        &self,
        domain: &str,
        role: Option<&str>,
    ) -> Result<DomainSearch, LookupError> {
        let url = format!("{}/domain-search", self.config.base_url);
        let mut params = vec![
            ("domain", domain),
            ("api_key", self.config.api_key.as_str()),
            ("type", "personal"),
        ];
        if let Some(role) = role {
            params.push(("role", role));
        }

        debug!(
            action = "request",
            component = "hunter_client",
            domain = domain,
            role = ?role,
            "Domain search"
        );
        let response = self.client.get(&url).query(&params).send()?;
        let envelope: Envelope<DomainSearchData> = decode(response)?;

        Ok(match envelope.data {
            Some(data) => DomainSearch {
                company: data.organization.filter(|name| !name.trim().is_empty()),
                contacts: data.emails,
            },
            None => DomainSearch::default(),
        })
    }
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T, LookupError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .map_err(|e| LookupError::Network(format!("invalid response body: {}", e)));
    }

    let detail = response.text().unwrap_or_default();
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LookupError::Unauthorized(detail),
        StatusCode::TOO_MANY_REQUESTS => LookupError::RateLimited,
        _ => LookupError::Http {
            status: status.as_u16(),
            detail,
        },
    })
}

//! Authentication handling for provider APIs
//!
//! Supports the credential placements used by the providers:
//! - API key as a URL query parameter (Gemini-style `?key=`)
//! - API key in a request header (`x-api-key`)
//! - Access token as a body/form field (Graph `access_token`)

use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::ProviderDescriptor;
use crate::{Error, Result};

/// Where a provider expects its credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "in", content = "name", rename_all = "snake_case")]
pub enum CredentialPlacement {
    Query(String),
    Header(String),
    FormField(String),
}

/// The mutable pieces of a request that authentication may touch
#[derive(Debug, Clone)]
pub struct RequestParts {
    pub url: Url,
    pub headers: Vec<(String, String)>,
    /// Top-level body fields: JSON keys or multipart text fields
    pub fields: Vec<(String, String)>,
}

impl RequestParts {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            headers: Vec::new(),
            fields: Vec::new(),
        }
    }
}

/// Trait for handling provider-specific authentication
pub trait AuthHandler: Send + Sync {
    /// Apply authentication to the outgoing request
    fn apply_auth(&self, parts: &mut RequestParts);

    /// Name of the placement, for logs
    fn describe(&self) -> String;
}

/// `?<name>=<key>` on the endpoint URL
#[derive(Debug, Clone)]
pub struct QueryKeyAuth {
    name: String,
    api_key: String,
}

impl AuthHandler for QueryKeyAuth {
    fn apply_auth(&self, parts: &mut RequestParts) {
        parts.url.query_pairs_mut().append_pair(&self.name, &self.api_key);
    }

    fn describe(&self) -> String {
        format!("query parameter '{}'", self.name)
    }
}

/// `<name>: <key>` request header
#[derive(Debug, Clone)]
pub struct HeaderKeyAuth {
    name: String,
    api_key: String,
}

impl AuthHandler for HeaderKeyAuth {
    fn apply_auth(&self, parts: &mut RequestParts) {
        parts.headers.push((self.name.clone(), self.api_key.clone()));
    }

    fn describe(&self) -> String {
        format!("header '{}'", self.name)
    }
}

/// `<name>=<token>` body field
#[derive(Debug, Clone)]
pub struct FormFieldAuth {
    name: String,
    token: String,
}

impl AuthHandler for FormFieldAuth {
    fn apply_auth(&self, parts: &mut RequestParts) {
        parts.fields.push((self.name.clone(), self.token.clone()));
    }

    fn describe(&self) -> String {
        format!("form field '{}'", self.name)
    }
}

/// Create the appropriate auth handler for a resolved provider
pub fn create_auth_handler(provider: &ProviderDescriptor) -> Result<Box<dyn AuthHandler>> {
    let secret = provider.api_key.clone().ok_or_else(|| {
        Error::configuration(format!(
            "{} credential not found. Set {} environment variable",
            provider.name, provider.credential.key_var
        ))
    })?;

    let handler: Box<dyn AuthHandler> = match &provider.credential.placement {
        CredentialPlacement::Query(name) => Box::new(QueryKeyAuth {
            name: name.clone(),
            api_key: secret,
        }),
        CredentialPlacement::Header(name) => Box::new(HeaderKeyAuth {
            name: name.clone(),
            api_key: secret,
        }),
        CredentialPlacement::FormField(name) => Box::new(FormFieldAuth {
            name: name.clone(),
            token: secret,
        }),
    };
    Ok(handler)
}

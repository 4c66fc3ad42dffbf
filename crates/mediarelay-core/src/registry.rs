//! Provider registry and built-in provider catalogs
//!
//! The registry turns a static catalog plus an explicit credential snapshot
//! into the ordered list of providers a request should try. It never reads
//! the process environment on its own; callers build [`Credentials`] once
//! and hand them in.

use std::collections::HashMap;

use tracing::debug;

use crate::http::auth::CredentialPlacement;
use crate::types::{Capabilities, CredentialSpec, PayloadShape, ProviderDescriptor, MAX_REFERENCE_IMAGES};
use crate::{Error, Result};

pub const ANTIGRAVITY: &str = "antigravity";
pub const NANOBANANA: &str = "nanobanana";
pub const FACEBOOK: &str = "facebook";

pub const ANTIGRAVITY_BASE_URL: &str = "http://192.168.1.159:8045";
pub const NANOBANANA_BASE_URL: &str = "https://allapi.store";
pub const FACEBOOK_GRAPH_BASE_URL: &str = "https://graph.facebook.com/v24.0";

/// Immutable snapshot of credential values keyed by variable name
#[derive(Clone, Default)]
pub struct Credentials {
    values: HashMap<String, String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.values.keys().collect();
        names.sort();
        f.debug_struct("Credentials").field("configured", &names).finish()
    }
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value; blank values are treated as unset
    pub fn with(mut self, var: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.trim().is_empty() {
            self.values.insert(var.into(), value);
        }
        self
    }

    /// Snapshot the named variables from the process environment
    pub fn from_env<'a, I>(vars: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        vars.into_iter().fold(Self::new(), |creds, var| match std::env::var(var) {
            Ok(value) => creds.with(var, value),
            Err(_) => creds,
        })
    }

    pub fn get(&self, var: &str) -> Option<&str> {
        self.values.get(var).map(String::as_str)
    }

    pub fn contains(&self, var: &str) -> bool {
        self.values.contains_key(var)
    }
}

/// Every variable a catalog may read: secrets and account ids
pub fn credential_vars(catalog: &[ProviderDescriptor]) -> Vec<&str> {
    let mut vars = Vec::new();
    for provider in catalog {
        vars.push(provider.credential.key_var.as_str());
        if let Some(account) = &provider.credential.account_var {
            vars.push(account.as_str());
        }
    }
    vars
}

/// Image generation providers, highest capability first
pub fn image_generation_catalog() -> Vec<ProviderDescriptor> {
    vec![
        ProviderDescriptor {
            name: ANTIGRAVITY.to_string(),
            base_url: ANTIGRAVITY_BASE_URL.to_string(),
            path: "/v1/messages".to_string(),
            model: Some("gemini-3-pro-image".to_string()),
            credential: CredentialSpec {
                key_var: "ANTIGRAVITY_API_KEY".to_string(),
                placement: CredentialPlacement::Header("x-api-key".to_string()),
                account_var: None,
            },
            capabilities: Capabilities {
                multipart: false,
                max_reference_images: 1,
                batch: true,
            },
            shape: PayloadShape::ChatCompletion,
            api_key: None,
            account_id: None,
        },
        ProviderDescriptor {
            name: NANOBANANA.to_string(),
            base_url: NANOBANANA_BASE_URL.to_string(),
            path: "/v1beta/models/gemini-3-pro-image-preview:generateContent".to_string(),
            model: Some("gemini-3-pro-image-preview".to_string()),
            credential: CredentialSpec {
                key_var: "ALLAPI_KEY".to_string(),
                placement: CredentialPlacement::Query("key".to_string()),
                account_var: None,
            },
            capabilities: Capabilities {
                multipart: false,
                max_reference_images: MAX_REFERENCE_IMAGES,
                batch: false,
            },
            shape: PayloadShape::GenerateContent,
            api_key: None,
            account_id: None,
        },
    ]
}

/// Publishing providers
pub fn publishing_catalog() -> Vec<ProviderDescriptor> {
    vec![ProviderDescriptor {
        name: FACEBOOK.to_string(),
        base_url: FACEBOOK_GRAPH_BASE_URL.to_string(),
        path: String::new(),
        model: None,
        credential: CredentialSpec {
            key_var: "FACEBOOK_PAGE_ACCESS_TOKEN".to_string(),
            placement: CredentialPlacement::FormField("access_token".to_string()),
            account_var: Some("FACEBOOK_PAGE_ID".to_string()),
        },
        capabilities: Capabilities {
            multipart: true,
            max_reference_images: 0,
            batch: false,
        },
        shape: PayloadShape::GraphUpload,
        api_key: None,
        account_id: None,
    }]
}

/// Ordered provider catalog bound to a credential snapshot
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    catalog: Vec<ProviderDescriptor>,
    credentials: Credentials,
}

impl ProviderRegistry {
    pub fn new(catalog: Vec<ProviderDescriptor>, credentials: Credentials) -> Self {
        Self { catalog, credentials }
    }

    pub fn image_generation(credentials: Credentials) -> Self {
        Self::new(image_generation_catalog(), credentials)
    }

    pub fn publishing(credentials: Credentials) -> Self {
        Self::new(publishing_catalog(), credentials)
    }

    /// Point a catalog entry at a different host; unknown names are ignored
    pub fn with_base_url(mut self, name: &str, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        if let Some(provider) = self.catalog.iter_mut().find(|p| p.name == name) {
            debug!(provider = name, base_url = %base_url, "Overriding provider base URL");
            provider.base_url = base_url;
        }
        self
    }

    pub fn catalog(&self) -> &[ProviderDescriptor] {
        &self.catalog
    }

    pub fn names(&self) -> Vec<&str> {
        self.catalog.iter().map(|p| p.name.as_str()).collect()
    }

    /// Providers to try, in priority order.
    ///
    /// A forced provider yields exactly that provider or a configuration
    /// error; otherwise every provider with a complete credential is
    /// returned.
    pub fn resolve(&self, force: Option<&str>) -> Result<Vec<ProviderDescriptor>> {
        if let Some(name) = force {
            let name = name.trim();
            let provider = self.catalog.iter().find(|p| p.name.eq_ignore_ascii_case(name)).ok_or_else(|| {
                Error::configuration(format!(
                    "Unknown provider '{}'. Available providers: {}",
                    name,
                    self.names().join(", ")
                ))
            })?;
            let bound = self.bind(provider).map_err(|missing| {
                Error::configuration(format!(
                    "Provider '{}' was forced but {} is not set",
                    provider.name, missing
                ))
            })?;
            return Ok(vec![bound]);
        }

        let resolved: Vec<ProviderDescriptor> =
            self.catalog.iter().filter_map(|p| self.bind(p).ok()).collect();

        if resolved.is_empty() {
            let expected = self
                .catalog
                .iter()
                .map(|p| p.credential.key_var.as_str())
                .collect::<Vec<_>>()
                .join(" or ");
            return Err(Error::NoProviderAvailable {
                message: format!("no provider has credentials configured; set {}", expected),
            });
        }

        debug!(
            providers = ?resolved.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            "Resolved provider order"
        );
        Ok(resolved)
    }

    /// Attach credential values, or name the first missing variable
    fn bind(&self, provider: &ProviderDescriptor) -> std::result::Result<ProviderDescriptor, String> {
        let credential = &provider.credential;
        let api_key = self
            .credentials
            .get(&credential.key_var)
            .ok_or_else(|| credential.key_var.clone())?;
        let account_id = match &credential.account_var {
            Some(var) => Some(self.credentials.get(var).ok_or_else(|| var.clone())?),
            None => None,
        };

        let mut bound = provider.clone();
        bound.api_key = Some(api_key.to_string());
        bound.account_id = account_id.map(str::to_string);
        Ok(bound)
    }
}

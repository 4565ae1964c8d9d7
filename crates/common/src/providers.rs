//! Provider catalog.
//!
//! The catalog is plain data, built once at startup and handed to connector
//! constructors by reference.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::error::{Error, ErrorKind, Result};

const WORKSPACE_PLACEHOLDER: &str = "{{.workspace}}";

/// Identifier of a SaaS provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Provider(Cow<'static, str>);

impl Provider {
    pub const SALESFORCE: Provider = Provider(Cow::Borrowed("salesforce"));
    pub const MICROSOFT_OFFICE_365: Provider = Provider(Cow::Borrowed("microsoftOffice365"));
    pub const ZOHO: Provider = Provider(Cow::Borrowed("zoho"));

    /// A provider not in the built-in list.
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which bulk write modes a provider supports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkWriteSupport {
    pub insert: bool,
    pub update: bool,
    pub upsert: bool,
    pub delete: bool,
}

/// Static description of a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInfo {
    pub display_name: String,
    /// Base URL, possibly containing a `{{.workspace}}` placeholder.
    pub base_url: String,
    pub bulk_write: BulkWriteSupport,
}

impl ProviderInfo {
    pub fn new(display_name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            base_url: base_url.into(),
            bulk_write: BulkWriteSupport::default(),
        }
    }

    pub fn with_bulk_write(mut self, support: BulkWriteSupport) -> Self {
        self.bulk_write = support;
        self
    }

    /// Whether the base URL needs a workspace to be usable.
    pub fn requires_workspace(&self) -> bool {
        self.base_url.contains(WORKSPACE_PLACEHOLDER)
    }

    /// Substitute the workspace into the base URL.
    pub fn resolve_base_url(&self, workspace: Option<&str>) -> Result<String> {
        if !self.requires_workspace() {
            return Ok(self.base_url.clone());
        }

        match workspace.map(str::trim).filter(|w| !w.is_empty()) {
            Some(workspace) => Ok(self.base_url.replace(WORKSPACE_PLACEHOLDER, workspace)),
            None => Err(Error::new(ErrorKind::Config(format!(
                "{} requires a workspace",
                self.display_name
            )))),
        }
    }
}

/// Map of known providers.
#[derive(Debug, Clone, Default)]
pub struct ProviderCatalog {
    providers: HashMap<Provider, ProviderInfo>,
}

impl ProviderCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The providers shipped with this library.
    pub fn builtin() -> Self {
        Self::new()
            .with(
                Provider::SALESFORCE,
                ProviderInfo::new("Salesforce", "https://{{.workspace}}.my.salesforce.com")
                    .with_bulk_write(BulkWriteSupport {
                        insert: false,
                        update: false,
                        upsert: true,
                        delete: true,
                    }),
            )
            .with(
                Provider::MICROSOFT_OFFICE_365,
                ProviderInfo::new("Microsoft Office 365", "https://graph.microsoft.com"),
            )
            .with(
                Provider::ZOHO,
                ProviderInfo::new("Zoho", "https://www.zohoapis.com"),
            )
    }

    /// Add or replace a provider.
    pub fn with(mut self, provider: Provider, info: ProviderInfo) -> Self {
        self.providers.insert(provider, info);
        self
    }

    pub fn get(&self, provider: &Provider) -> Option<&ProviderInfo> {
        self.providers.get(provider)
    }

    /// Look up a provider and resolve its base URL for `workspace`.
    pub fn read_info(&self, provider: &Provider, workspace: Option<&str>) -> Result<ProviderInfo> {
        let info = self.get(provider).ok_or_else(|| {
            Error::new(ErrorKind::Config(format!("unknown provider '{}'", provider)))
        })?;

        Ok(ProviderInfo {
            base_url: info.resolve_base_url(workspace)?,
            ..info.clone()
        })
    }
}

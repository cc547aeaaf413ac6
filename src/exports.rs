//! Group-scoped export resolution.
//!
//! Maps a `(namespace, dataset)` request plus the caller's groups onto the
//! object-store key of the matching export artifact. The key layout
//! `export/<dataset>/<dataset>[_<group>]_<namespace>.json` is shared with the
//! export producers and must not change.

use std::collections::BTreeSet;

use crate::{
    auth::Identity,
    config::{AppConfig, UNLIMITED_GROUP},
    error::ApiError,
};

/// Namespaces for which exports are produced.
pub const NAMESPACES: &[&str] = &["0", "6", "14"];

/// Project families a dataset code may end with (`enwiki`, `dewiktionary`, ...).
const PROJECT_FAMILIES: &[&str] = &[
    "wiktionary",
    "wikibooks",
    "wikinews",
    "wikiquote",
    "wikisource",
    "wikiversity",
    "wikivoyage",
    "wiki",
];

/// ExportPolicy
///
/// Validation rules and group scoping for export requests. Holds no per-request
/// state.
#[derive(Debug, Clone)]
pub struct ExportPolicy {
    restricted_group: String,
    datasets: BTreeSet<String>,
}

impl ExportPolicy {
    pub fn new<I, D>(restricted_group: impl Into<String>, datasets: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<String>,
    {
        Self {
            restricted_group: restricted_group.into(),
            datasets: datasets.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.exports_group.clone(), config.export_datasets.iter().cloned())
    }

    pub fn restricted_group(&self) -> &str {
        &self.restricted_group
    }

    pub fn validate_namespace(&self, namespace: &str) -> Result<(), ApiError> {
        if NAMESPACES.contains(&namespace) {
            Ok(())
        } else {
            Err(ApiError::BadRequest(format!(
                "unrecognized namespace '{namespace}'"
            )))
        }
    }

    pub fn validate_dataset(&self, dataset: &str) -> Result<(), ApiError> {
        let known = if self.datasets.is_empty() {
            is_project_code(dataset)
        } else {
            self.datasets.contains(dataset)
        };

        if known {
            Ok(())
        } else {
            Err(ApiError::BadRequest(format!(
                "unrecognized dataset '{dataset}'"
            )))
        }
    }

    /// Picks the key variant for the caller. `unlimited` members get the unscoped
    /// artifact; members of the restricted group get their own. Anyone else is
    /// refused even if an upstream guard let them through.
    pub fn group_suffix<'a>(&'a self, identity: &Identity) -> Result<Option<&'a str>, ApiError> {
        if identity.in_group(UNLIMITED_GROUP) {
            return Ok(None);
        }
        if identity.in_group(&self.restricted_group) {
            return Ok(Some(&self.restricted_group));
        }
        Err(ApiError::Forbidden(format!(
            "user '{}' has no access to exports",
            identity.username
        )))
    }

    /// Validates the request and returns the storage key to fetch. Parameters are
    /// checked before group membership, namespace first.
    pub fn resolve(
        &self,
        namespace: &str,
        dataset: &str,
        identity: &Identity,
    ) -> Result<String, ApiError> {
        self.validate_namespace(namespace)?;
        self.validate_dataset(dataset)?;
        let group = self.group_suffix(identity)?;
        Ok(resource_key(dataset, group, namespace))
    }
}

/// `export/<dataset>/<dataset>[_<group>]_<namespace>.json`
pub fn resource_key(dataset: &str, group: Option<&str>, namespace: &str) -> String {
    match group {
        Some(group) if !group.is_empty() => {
            format!("export/{dataset}/{dataset}_{group}_{namespace}.json")
        }
        _ => format!("export/{dataset}/{dataset}_{namespace}.json"),
    }
}

fn is_project_code(dataset: &str) -> bool {
    PROJECT_FAMILIES.iter().any(|family| {
        dataset.strip_suffix(family).is_some_and(|site| {
            !site.is_empty()
                && site
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        })
    })
}

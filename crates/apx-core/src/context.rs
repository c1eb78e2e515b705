//! # Attestation Contexts
//!
//! A context names an independent attestation relationship between two
//! accounts. The same (owner, setter) pair may hold one record per context.
//! On the ledger the context is the property name, always carrying
//! [`CONTEXT_PREFIX`].

use serde::{Deserialize, Serialize};

/// Protocol identifier prepended to every context before it is used as a
/// ledger property name.
pub const CONTEXT_PREFIX: &str = "ap://";

/// Prefix `context` with [`CONTEXT_PREFIX`] unless it already carries it.
///
/// Idempotent: `normalize_context(&normalize_context(x)) == normalize_context(x)`.
pub fn normalize_context(context: &str) -> String {
    if context.starts_with(CONTEXT_PREFIX) {
        context.to_string()
    } else {
        format!("{CONTEXT_PREFIX}{context}")
    }
}

/// A normalized attestation context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct AttestationContext(String);

impl AttestationContext {
    /// Normalize and wrap a context name.
    pub fn new(context: impl AsRef<str>) -> Self {
        Self(normalize_context(context.as_ref()))
    }

    /// The property name used on the ledger.
    pub fn property_name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AttestationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for AttestationContext {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for AttestationContext {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<AttestationContext> for String {
    fn from(context: AttestationContext) -> Self {
        context.0
    }
}

//! In-process ledger.
//!
//! Backs tests and offline CLI use. Supports failure injection per owner so
//! the non-atomic paired write can be exercised, and counts calls so tests
//! can assert how many hops a walk fetched.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use apx_core::{AccountId, TransportError};
use apx_crypto::Identity;
use parking_lot::RwLock;

use crate::store::LedgerStore;

type PropertyKey = (AccountId, AccountId, String);

/// A [`LedgerStore`] held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    properties: RwLock<HashMap<PropertyKey, String>>,
    failing_owners: RwLock<HashSet<AccountId>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value directly, bypassing signing. Used to seed fixtures.
    pub fn insert(
        &self,
        owner: &AccountId,
        setter: &AccountId,
        property: &str,
        value: impl Into<String>,
    ) {
        self.properties.write().insert(
            (owner.clone(), setter.clone(), property.to_string()),
            value.into(),
        );
    }

    /// Read a value directly without counting the call.
    pub fn peek(&self, owner: &AccountId, setter: &AccountId, property: &str) -> Option<String> {
        self.properties
            .read()
            .get(&(owner.clone(), setter.clone(), property.to_string()))
            .cloned()
    }

    /// Make every subsequent write or delete on `owner` fail with a node error.
    pub fn fail_writes_to(&self, owner: &AccountId) {
        self.failing_owners.write().insert(owner.clone());
    }

    /// Number of `get_property` calls served.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of successful `set_property` and `delete_property` calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// Number of stored properties.
    pub fn len(&self) -> usize {
        self.properties.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.read().is_empty()
    }

    fn check_writable(&self, operation: &str, owner: &AccountId) -> Result<(), TransportError> {
        if self.failing_owners.read().contains(owner) {
            return Err(TransportError::Node {
                endpoint: format!("memory {operation}"),
                description: format!("writes to {owner} are disabled"),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl LedgerStore for MemoryLedger {
    async fn get_property(
        &self,
        owner: &AccountId,
        setter: &AccountId,
        property: &str,
    ) -> Result<Option<String>, TransportError> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.peek(owner, setter, property))
    }

    async fn set_property(
        &self,
        owner: &AccountId,
        property: &str,
        value: &str,
        signer: &Identity,
    ) -> Result<(), TransportError> {
        self.check_writable("set_property", owner)?;
        self.insert(owner, signer.account(), property, value);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn delete_property(
        &self,
        owner: &AccountId,
        property: &str,
        signer: &Identity,
    ) -> Result<(), TransportError> {
        self.check_writable("delete_property", owner)?;
        self.properties.write().remove(&(
            owner.clone(),
            signer.account().clone(),
            property.to_string(),
        ));
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

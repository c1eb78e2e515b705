//! # apx-ledger: Account-Property Store Adapters
//!
//! The engine reads and writes attestation records through the
//! [`LedgerStore`] trait. This crate defines it and ships two adapters:
//!
//! - [`MemoryLedger`]: in-process map with failure injection, for tests and
//!   offline use.
//! - [`HttpLedgerClient`]: `reqwest` client for a ledger node's HTTP API,
//!   configured through [`LedgerConfig`].
//!
//! Every failure surfaces as a [`TransportError`](apx_core::TransportError)
//! so the engine can classify it into the protocol taxonomy.

pub mod config;
pub mod http;
pub mod memory;
pub mod store;

pub use config::{ConfigError, LedgerConfig};
pub use http::HttpLedgerClient;
pub use memory::MemoryLedger;
pub use store::LedgerStore;

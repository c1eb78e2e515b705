//! # apx-crypto: Identity and Token Primitives
//!
//! Provides the signing side of the protocol:
//!
//! - **Seams** (`provider.rs`): the [`IdentityProvider`] and [`TokenService`]
//!   traits consumed by the engine, and the [`Identity`] value that pairs an
//!   account with its secret.
//! - **Ed25519** (`ed25519.rs`): [`Ed25519Provider`], a local implementation
//!   of both traits with a fixed 100-byte token layout.
//!
//! ## Crate Policy
//!
//! - Depends only on `apx-core` internally.
//! - No mocking of cryptographic operations in tests; all tests use real
//!   SHA-256 and real Ed25519.
//! - Secrets live in `Zeroizing` buffers and never appear in `Debug` output.

pub mod ed25519;
pub mod provider;

pub use ed25519::{Ed25519KeyPair, Ed25519Provider};
pub use provider::{DecodedToken, Identity, IdentityProvider, TokenService};

//! # mfkdf
//!
//! A Multi-Factor Key Derivation Function: derive one deterministic,
//! high-entropy key from a threshold subset of heterogeneous authentication
//! factors (passwords, one-time codes, hardware challenge-response,
//! recovery codes), backed by a policy document that is safe to store in
//! the clear.
//!
//! ## Pipeline
//!
//! - [`field`] / [`sharing`]: Shamir-style secret sharing over GF(256).
//! - [`kdf`]: a uniform interface over pbkdf2, bcrypt, scrypt, and the
//!   argon2 family.
//! - [`factor`]: the setup-side and derive-side contracts factor
//!   implementations (passwords, HOTP, recovery UUIDs, ...) must satisfy.
//! - [`pad`]: the per-factor blinding construction
//!   (`pad = share XOR HKDF-SHA512(material)`).
//! - [`policy`]: the schema-validated JSON document carrying everything
//!   needed to re-derive the key.
//! - [`orchestrator`]: [`orchestrator::setup`] and [`orchestrator::derive`],
//!   which compose everything above.
//!
//! ## Example
//!
//! ```rust,ignore
//! use mfkdf::orchestrator::{setup, derive, SetupOptions, DeriveOptions};
//!
//! let setup_result = setup(factors, SetupOptions { threshold: Some(2), ..Default::default() }).await?;
//! let policy = setup_result.policy;
//!
//! let derived = derive(&policy, producers, DeriveOptions::default()).await?;
//! assert_eq!(derived.key, setup_result.key);
//! ```
//!
//! ## Scope
//!
//! This crate is the core setup/derive pipeline and its cryptographic
//! invariants only. Persistence of the policy, factor-specific input
//! collection (QR codes, HOTP counters, password-strength estimation), and
//! any CLI/demo surface are external collaborators consumed through
//! [`factor::SetupFactor`] / [`factor::DeriveFactor`] but not implemented
//! here.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod error;
pub mod factor;
pub mod field;
pub mod kdf;
pub mod orchestrator;
pub mod pad;
pub mod policy;
pub mod sharing;
pub mod utils;

pub use error::{MfkdfError, Result};
pub use orchestrator::{derive, setup, DerivedKey, DeriveOptions, EntropyBits, SetupOptions};
pub use policy::Policy;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Policy schema version this crate reads and writes.
pub const POLICY_SCHEMA_VERSION: &str = "1.0.0";

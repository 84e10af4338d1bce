//! Key Derivation Functions for the MFKDF core
//!
//! A single entrypoint, [`kdf`], dispatches over a tagged [`KdfSpec`] to one
//! of the six supported primitives (pbkdf2, bcrypt, scrypt, argon2i/2d/2id)
//! and always returns exactly `size` bytes, so the orchestrator never has to
//! know which primitive produced the final key.

mod engine;

pub use engine::{kdf, Argon2Variant, Digest, KdfSpec};

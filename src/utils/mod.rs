//! Utility modules for the MFKDF core
//!
//! - `rng`: CSPRNG helpers, obtained fresh per call (`spec.md` §5 — no
//!   global singletons, no cached randomness).

pub mod rng;

pub use rng::random_bytes;

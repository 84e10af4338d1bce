//! Secure random number generation
//!
//! A thin wrapper over the OS CSPRNG. A fresh handle is obtained on every
//! call rather than cached in a singleton, per `spec.md` §5 ("no global
//! singletons; a CSPRNG handle is obtained per-call").

use rand::rngs::OsRng;
use rand::RngCore;

/// Returns a freshly allocated `len`-byte buffer of CSPRNG output.
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    OsRng.fill_bytes(&mut buf);
    buf
}

/// Fills an existing buffer with CSPRNG output.
pub fn fill_random(buf: &mut [u8]) {
    OsRng.fill_bytes(buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_bytes_are_the_right_length_and_not_all_zero() {
        let bytes = random_bytes(32);
        assert_eq!(bytes.len(), 32);
        assert!(bytes.iter().any(|&b| b != 0));
    }

    #[test]
    fn successive_calls_differ() {
        assert_ne!(random_bytes(32), random_bytes(32));
    }
}

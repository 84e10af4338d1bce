//! KDF dispatch table
//!
//! Each variant of [`KdfSpec`] carries exactly the parameters its primitive
//! needs; [`kdf`] matches on the variant and calls into the corresponding
//! RustCrypto crate. Bcrypt's fixed 24-byte output is re-expanded or
//! truncated to `size` bytes by SHA-256-hashing it when `size != 24` (see
//! [`bcrypt_dispatch`] for the exact scheme).

use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};
use sha2::{Digest as _, Sha256};

use crate::error::{MfkdfError, Result};

/// Digest used underneath PBKDF2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, SerdeSerialize, SerdeDeserialize)]
#[serde(rename_all = "lowercase")]
pub enum Digest {
    /// SHA-1 (legacy, kept for compatibility with existing policies)
    Sha1,
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
}

/// Which Argon2 variant to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, SerdeSerialize, SerdeDeserialize)]
#[serde(rename_all = "lowercase")]
pub enum Argon2Variant {
    /// Data-dependent (fastest, vulnerable to side channels)
    Argon2d,
    /// Data-independent (resistant to side channels)
    Argon2i,
    /// Hybrid of the two (recommended default)
    Argon2id,
}

/// Tagged union over the supported KDF algorithms and their parameters,
/// matching `spec.md` §4.3 and the policy's `kdf` field.
#[derive(Debug, Clone, SerdeSerialize, SerdeDeserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum KdfSpec {
    /// PBKDF2-HMAC
    Pbkdf2 {
        /// Iteration count
        rounds: u32,
        /// Underlying HMAC digest
        digest: Digest,
    },
    /// bcrypt
    Bcrypt {
        /// Cost factor (log2 of the iteration count)
        rounds: u32,
    },
    /// scrypt
    Scrypt {
        /// CPU/memory cost, must be a power of two
        n: u32,
        /// Block size
        r: u32,
        /// Parallelism
        p: u32,
    },
    /// Argon2 family
    Argon2 {
        /// Which Argon2 variant to run
        variant: Argon2Variant,
        /// Time cost (iterations)
        time: u32,
        /// Memory cost in KiB
        memory: u32,
        /// Parallelism
        parallelism: u32,
    },
}

impl KdfSpec {
    /// The default KDF per `spec.md` §6: Argon2id, time=2, mem=24576 KiB,
    /// parallelism=1.
    pub fn default_argon2id() -> Self {
        KdfSpec::Argon2 {
            variant: Argon2Variant::Argon2id,
            time: 2,
            memory: 24576,
            parallelism: 1,
        }
    }

    /// The default PBKDF2 configuration: rounds=310000, digest=sha256.
    pub fn default_pbkdf2() -> Self {
        KdfSpec::Pbkdf2 {
            rounds: 310_000,
            digest: Digest::Sha256,
        }
    }

    /// The default bcrypt configuration: rounds=10.
    pub fn default_bcrypt() -> Self {
        KdfSpec::Bcrypt { rounds: 10 }
    }

    /// The default scrypt configuration: N=16384, r=8, p=1.
    pub fn default_scrypt() -> Self {
        KdfSpec::Scrypt { n: 16384, r: 8, p: 1 }
    }
}

/// Derives a `size`-byte key from `input` and `salt` using the algorithm
/// and parameters described by `spec`.
pub fn kdf(input: &[u8], salt: &[u8], size: usize, spec: &KdfSpec) -> Result<Vec<u8>> {
    match spec {
        KdfSpec::Pbkdf2 { rounds, digest } => pbkdf2_dispatch(input, salt, size, *rounds, *digest),
        KdfSpec::Bcrypt { rounds } => bcrypt_dispatch(input, salt, size, *rounds),
        KdfSpec::Scrypt { n, r, p } => scrypt_dispatch(input, salt, size, *n, *r, *p),
        KdfSpec::Argon2 {
            variant,
            time,
            memory,
            parallelism,
        } => argon2_dispatch(input, salt, size, *variant, *time, *memory, *parallelism),
    }
}

fn pbkdf2_dispatch(
    input: &[u8],
    salt: &[u8],
    size: usize,
    rounds: u32,
    digest: Digest,
) -> Result<Vec<u8>> {
    let mut out = vec![0u8; size];
    match digest {
        Digest::Sha1 => pbkdf2::pbkdf2_hmac::<sha1::Sha1>(input, salt, rounds, &mut out),
        Digest::Sha256 => pbkdf2::pbkdf2_hmac::<sha2::Sha256>(input, salt, rounds, &mut out),
        Digest::Sha384 => pbkdf2::pbkdf2_hmac::<sha2::Sha384>(input, salt, rounds, &mut out),
        Digest::Sha512 => pbkdf2::pbkdf2_hmac::<sha2::Sha512>(input, salt, rounds, &mut out),
    }
    Ok(out)
}

fn bcrypt_dispatch(input: &[u8], salt: &[u8], size: usize, rounds: u32) -> Result<Vec<u8>> {
    // bcrypt requires a 16-byte salt; the policy salt is stretched to this
    // width with SHA-256 so arbitrary-length salts can be used uniformly.
    let mut bcrypt_salt = [0u8; 16];
    bcrypt_salt.copy_from_slice(&Sha256::digest_prefix(salt, 16));

    let raw = bcrypt_pbkdf_compat::bcrypt(rounds, bcrypt_salt, input)?;

    if size == raw.len() {
        return Ok(raw.to_vec());
    }

    Ok(sha256_stretch(&raw, size))
}

/// Re-expands (or truncates) `input` to `size` bytes by SHA-256-hashing it:
/// block 0 is `SHA256(input)`, block `i > 0` is `SHA256(input || i as u32 LE)`,
/// blocks are concatenated and the result truncated to `size`. For
/// `size <= 32` this is exactly `SHA256(input)[..size]`.
fn sha256_stretch(input: &[u8], size: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(size);
    let mut counter: u32 = 0;
    while out.len() < size {
        let mut hasher = Sha256::new();
        hasher.update(input);
        if counter > 0 {
            hasher.update(counter.to_le_bytes());
        }
        let block = hasher.finalize();
        let take = (size - out.len()).min(block.len());
        out.extend_from_slice(&block[..take]);
        counter += 1;
    }
    out
}

fn scrypt_dispatch(input: &[u8], salt: &[u8], size: usize, n: u32, r: u32, p: u32) -> Result<Vec<u8>> {
    let log_n = (31 - n.leading_zeros()) as u8;
    if 1u32 << log_n != n {
        return Err(MfkdfError::InvalidArgument("scrypt N must be a power of two".into()));
    }
    let params = scrypt::Params::new(log_n, r, p, size)?;
    let mut out = vec![0u8; size];
    scrypt::scrypt(input, salt, &params, &mut out)?;
    Ok(out)
}

fn argon2_dispatch(
    input: &[u8],
    salt: &[u8],
    size: usize,
    variant: Argon2Variant,
    time: u32,
    memory: u32,
    parallelism: u32,
) -> Result<Vec<u8>> {
    let algorithm = match variant {
        Argon2Variant::Argon2d => argon2::Algorithm::Argon2d,
        Argon2Variant::Argon2i => argon2::Algorithm::Argon2i,
        Argon2Variant::Argon2id => argon2::Algorithm::Argon2id,
    };
    let params = argon2::Params::new(memory, time, parallelism, Some(size))?;
    let argon2 = argon2::Argon2::new(algorithm, argon2::Version::V0x13, params);

    let mut out = vec![0u8; size];
    argon2.hash_password_into(input, salt, &mut out)?;
    Ok(out)
}

/// Small helper trait so `bcrypt_dispatch` can get a fixed-width SHA-256
/// prefix without pulling in a second hashing API surface.
trait DigestPrefix {
    fn digest_prefix(data: &[u8], len: usize) -> Vec<u8>;
}

impl DigestPrefix for Sha256 {
    fn digest_prefix(data: &[u8], len: usize) -> Vec<u8> {
        use sha2::Digest as _;
        let hash = Sha256::digest(data);
        hash[..len].to_vec()
    }
}

/// Thin wrapper isolating the third-party `bcrypt` crate's raw entrypoint.
mod bcrypt_pbkdf_compat {
    use crate::error::Result;

    pub fn bcrypt(rounds: u32, salt: [u8; 16], password: &[u8]) -> Result<[u8; 24]> {
        Ok(bcrypt::bcrypt(rounds, salt, password))
    }
}

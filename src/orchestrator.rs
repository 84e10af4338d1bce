//! Setup and derive orchestration
//!
//! These two free functions compose every other module in the crate: field
//! arithmetic, sharing, the KDF engine, pad construction, and the factor
//! contracts. Factor calls are sequential and strictly ordered by policy
//! index (`spec.md` §5) because a rotating factor's `params` callable needs
//! the derived key, which only exists once every factor has contributed its
//! share.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use tracing::{debug, info_span};
use zeroize::Zeroizing;

use crate::error::{MfkdfError, Result};
use crate::factor::{DeriveFactor, DeriveMaterial, ParamsAction, RotationContext, SetupFactor};
use crate::kdf::{self, KdfSpec};
use crate::pad;
use crate::policy::{FactorRecord, Policy, SCHEMA_URI};
use crate::sharing;
use crate::utils::rng::random_bytes;

/// Sum of `threshold` smallest per-factor entropy estimates, in bits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntropyBits {
    /// Sum of `threshold` smallest `|data_i| * 8` values.
    pub theoretical: u64,
    /// Sum of `threshold` smallest real-world entropy estimates.
    pub real: f64,
}

/// The in-memory result of a `setup` or `derive` call.
pub struct DerivedKey {
    /// The (possibly rewritten) policy.
    pub policy: Policy,
    /// The final derived key, `size` bytes.
    pub key: Zeroizing<Vec<u8>>,
    /// The master secret (shared-secret before the final KDF step).
    pub secret: Zeroizing<Vec<u8>>,
    /// Full reconstructed share vector, one per policy factor.
    pub shares: Vec<Zeroizing<Vec<u8>>>,
    /// Setup-only: `factor.id -> factor.output()`. Empty after a derive.
    pub outputs: HashMap<String, Value>,
    /// Entropy report.
    pub entropy_bits: EntropyBits,
}

/// Options accepted by [`setup`]. Defaults match `spec.md` §6.
pub struct SetupOptions {
    /// Stable identifier for the resulting key; defaults to a fresh UUIDv4.
    pub id: Option<String>,
    /// Key size in bytes. Defaults to 32.
    pub size: usize,
    /// Reconstruction threshold. Defaults to the factor count.
    pub threshold: Option<usize>,
    /// Random salt; defaults to `size` CSPRNG bytes.
    pub salt: Option<Vec<u8>>,
    /// KDF algorithm and parameters. Defaults to Argon2id.
    pub kdf: KdfSpec,
    /// Optional cooperative cancellation flag, polled between factors.
    pub cancel: Option<&'static AtomicBool>,
}

impl Default for SetupOptions {
    fn default() -> Self {
        SetupOptions {
            id: None,
            size: 32,
            threshold: None,
            salt: None,
            kdf: KdfSpec::default_argon2id(),
            cancel: None,
        }
    }
}

fn check_cancelled(cancel: Option<&AtomicBool>) -> Result<()> {
    if let Some(flag) = cancel {
        if flag.load(Ordering::SeqCst) {
            return Err(MfkdfError::Cancelled);
        }
    }
    Ok(())
}

/// Runs the setup pipeline of `spec.md` §4.6 over `factors`, producing a
/// fresh [`Policy`] and the resulting [`DerivedKey`].
pub async fn setup(
    factors: Vec<Box<dyn SetupFactor>>,
    options: SetupOptions,
) -> Result<DerivedKey> {
    let _span = info_span!("mfkdf::setup", factor_count = factors.len()).entered();

    if factors.is_empty() {
        return Err(MfkdfError::InvalidArgument("at least one factor is required".into()));
    }
    if options.size == 0 {
        return Err(MfkdfError::InvalidArgument("size must be positive".into()));
    }
    let n = factors.len();
    let threshold = options.threshold.unwrap_or(n);
    if threshold == 0 || threshold > n {
        return Err(MfkdfError::InvalidArgument(format!(
            "threshold {threshold} must be between 1 and {n}"
        )));
    }
    {
        let mut ids = std::collections::HashSet::new();
        for f in &factors {
            if f.data().is_empty() {
                return Err(MfkdfError::InvalidArgument(format!(
                    "factor {} has empty data",
                    f.id()
                )));
            }
            if !ids.insert(f.id().to_string()) {
                return Err(MfkdfError::InvalidArgument(format!(
                    "duplicate factor id {:?}",
                    f.id()
                )));
            }
        }
    }

    let id = options.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let salt = options.salt.unwrap_or_else(|| random_bytes(options.size));
    if salt.len() != options.size {
        return Err(MfkdfError::InvalidArgument("salt must be `size` bytes".into()));
    }

    let secret = Zeroizing::new(random_bytes(options.size));

    let key = Zeroizing::new(kdf::kdf(&secret, &salt, options.size, &options.kdf)?);

    let shares = sharing::share(&secret, threshold, n)?;

    let ctx = RotationContext { key: key.clone() };

    let mut records = Vec::with_capacity(n);
    let mut outputs = HashMap::with_capacity(n);
    for (i, factor) in factors.iter().enumerate() {
        check_cancelled(options.cancel)?;
        debug!(index = i, id = factor.id(), "mfkdf::setup factor");

        let pad_bytes = pad::compute_pad(&shares[i], factor.data())?;
        let params = factor.params(&ctx).await.resolve(&ctx);
        records.push(FactorRecord {
            id: factor.id().to_string(),
            factor_type: factor.factor_type().to_string(),
            pad: STANDARD.encode(pad_bytes),
            params,
        });
        outputs.insert(factor.id().to_string(), factor.output().await);
    }

    let entropies: Vec<(u64, f64)> = factors
        .iter()
        .map(|f| ((f.data().len() as u64) * 8, f.entropy()))
        .collect();
    let mut by_theoretical: Vec<u64> = entropies.iter().map(|e| e.0).collect();
    by_theoretical.sort_unstable();
    let mut by_real: Vec<f64> = entropies.iter().map(|e| e.1).collect();
    by_real.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let theoretical: u64 = by_theoretical.iter().take(threshold).sum();
    let real: f64 = by_real.iter().take(threshold).sum();

    let policy = Policy {
        schema: SCHEMA_URI.to_string(),
        id,
        size: options.size,
        threshold,
        salt: STANDARD.encode(&salt),
        kdf: options.kdf,
        factors: records,
    };
    policy.validate()?;

    Ok(DerivedKey {
        policy,
        key,
        secret,
        shares,
        outputs,
        entropy_bits: EntropyBits { theoretical, real },
    })
}

/// Options accepted by [`derive`].
#[derive(Default)]
pub struct DeriveOptions {
    /// Optional cooperative cancellation flag, polled between factors.
    pub cancel: Option<&'static AtomicBool>,
}

/// Runs the derive pipeline of `spec.md` §4.7 against `policy`, using
/// `producers` (keyed by factor id) to resolve each factor's material.
/// Factors in the policy with no entry in `producers` contribute `null` and
/// only count against the threshold if too many are missing.
pub async fn derive(
    policy: &Policy,
    producers: HashMap<String, Box<dyn DeriveFactor>>,
    options: DeriveOptions,
) -> Result<DerivedKey> {
    let _span = info_span!("mfkdf::derive", factor_count = policy.factors.len()).entered();

    policy.validate()?;

    let supplied = producers
        .keys()
        .filter(|id| policy.factors.iter().any(|f| &f.id == *id))
        .count();
    if supplied < policy.threshold {
        return Err(MfkdfError::InsufficientShares {
            threshold: policy.threshold,
            supplied,
        });
    }

    let n = policy.factors.len();
    let salt = STANDARD.decode(&policy.salt)?;

    let mut partial: Vec<Option<Vec<u8>>> = vec![None; n];

    for (i, record) in policy.factors.iter().enumerate() {
        check_cancelled(options.cancel)?;
        debug!(index = i, id = %record.id, "mfkdf::derive factor");

        if let Some(producer) = producers.get(&record.id) {
            let material = producer.material(&record.params).await?;
            let share = match material {
                DeriveMaterial::Persisted { data } => data,
                DeriveMaterial::Stretched { factor_type, data } => {
                    if factor_type != record.factor_type {
                        return Err(MfkdfError::FactorTypeMismatch {
                            id: record.id.clone(),
                            expected: record.factor_type.clone(),
                            actual: factor_type,
                        });
                    }
                    let pad_bytes = STANDARD.decode(&record.pad)?;
                    pad::invert_pad(&pad_bytes, &data)?
                }
            };
            partial[i] = Some(share.to_vec());
        }
    }

    let non_null = partial.iter().filter(|s| s.is_some()).count();
    if non_null < policy.threshold {
        return Err(MfkdfError::InsufficientShares {
            threshold: policy.threshold,
            supplied: non_null,
        });
    }

    let secret = sharing::combine(&partial, policy.threshold)?;
    let key = Zeroizing::new(kdf::kdf(&secret, &salt, policy.size, &policy.kdf)?);

    let ctx = RotationContext { key: key.clone() };

    let mut new_factors = policy.factors.clone();
    for (i, record) in policy.factors.iter().enumerate() {
        if let Some(producer) = producers.get(&record.id) {
            if let ParamsAction::Rotating(f) = producer.params(&ctx).await {
                new_factors[i].params = f(&ctx);
            }
        }
    }

    let full_shares = sharing::recover(&partial, policy.threshold, n)?;

    let new_policy = Policy {
        schema: policy.schema.clone(),
        id: policy.id.clone(),
        size: policy.size,
        threshold: policy.threshold,
        salt: policy.salt.clone(),
        kdf: policy.kdf.clone(),
        factors: new_factors,
    };

    Ok(DerivedKey {
        policy: new_policy,
        key,
        secret,
        shares: full_shares,
        outputs: HashMap::new(),
        entropy_bits: EntropyBits { theoretical: 0, real: 0.0 },
    })
}

//! Policy schema and codec (v1.0.0)
//!
//! The [`Policy`] is the only durable artifact the core produces: a
//! schema-validated JSON document safe to store publicly, carrying
//! everything needed to re-derive the key given a threshold of factors.
//! Unknown fields are rejected at both the top level and per factor
//! (`spec.md` §4.8), and field order is preserved as constructed at setup —
//! `derive` never reorders keys when producing a rewritten policy.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MfkdfError, Result};
use crate::kdf::KdfSpec;

/// Current policy schema URI.
pub const SCHEMA_URI: &str = "https://mfkdf.com/schema/v1.0.0/policy.json";

/// One factor's record within a [`Policy`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FactorRecord {
    /// Id unique within the policy.
    pub id: String,
    /// Short type tag, e.g. `"password"`.
    #[serde(rename = "type")]
    pub factor_type: String,
    /// Base64-encoded pad (`share XOR stretch(material)`).
    pub pad: String,
    /// Public per-factor parameters.
    pub params: Value,
}

/// A schema-validated MFKDF policy document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Policy {
    /// Schema URI.
    #[serde(rename = "$schema")]
    pub schema: String,
    /// Stable identifier for this key.
    #[serde(rename = "$id")]
    pub id: String,
    /// Key size in bytes.
    pub size: usize,
    /// Reconstruction threshold.
    pub threshold: usize,
    /// Base64-encoded `size`-byte random salt.
    pub salt: String,
    /// KDF algorithm and parameters.
    pub kdf: KdfSpec,
    /// Ordered per-factor records; order is significant and fixes each
    /// factor's share index (`i+1`).
    pub factors: Vec<FactorRecord>,
}

impl Policy {
    /// Validates the structural invariants from `spec.md` §3 that cannot be
    /// expressed purely in the type system (uniqueness, threshold bounds,
    /// pad/size consistency).
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(MfkdfError::InvalidPolicy("$id must be non-empty".into()));
        }
        if self.size == 0 {
            return Err(MfkdfError::InvalidPolicy("size must be positive".into()));
        }
        if self.threshold == 0 || self.threshold > self.factors.len() {
            return Err(MfkdfError::InvalidPolicy(format!(
                "threshold {} must be between 1 and {} (factor count)",
                self.threshold,
                self.factors.len()
            )));
        }

        let salt = STANDARD
            .decode(&self.salt)
            .map_err(|e| MfkdfError::InvalidPolicy(format!("salt: {e}")))?;
        if salt.len() != self.size {
            return Err(MfkdfError::InvalidPolicy(format!(
                "salt must be exactly {} bytes, got {}",
                self.size,
                salt.len()
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for factor in &self.factors {
            if !seen.insert(factor.id.as_str()) {
                return Err(MfkdfError::InvalidPolicy(format!(
                    "duplicate factor id {:?}",
                    factor.id
                )));
            }
            let pad = STANDARD
                .decode(&factor.pad)
                .map_err(|e| MfkdfError::InvalidPolicy(format!("pad for {}: {e}", factor.id)))?;
            if pad.len() < self.size {
                return Err(MfkdfError::InvalidPolicy(format!(
                    "pad for {} is shorter than size",
                    factor.id
                )));
            }
        }

        Ok(())
    }

    /// Parses and validates a policy from its canonical JSON string form.
    pub fn from_json(s: &str) -> Result<Policy> {
        let policy: Policy = serde_json::from_str(s)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Serializes this policy to its canonical JSON string form,
    /// preserving field and factor order as constructed.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

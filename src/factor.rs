//! Factor contracts (setup-side and derive-side)
//!
//! The core never knows what a "password" or "hotp" factor actually is; it
//! only knows the shapes in this module. Concrete factor implementations
//! (QR codes, HOTP counters, password prompts, ...) are external
//! collaborators (`spec.md` §1) that implement [`SetupFactor`] /
//! [`DeriveFactor`].

use async_trait::async_trait;
use serde_json::Value;
use zeroize::Zeroizing;

use crate::error::Result;

/// The key material produced by a successful derivation, handed to a
/// factor's deferred `params` callable so challenge-response factors can
/// rotate their stored state.
#[derive(Clone)]
pub struct RotationContext {
    /// The freshly derived key.
    pub key: Zeroizing<Vec<u8>>,
}

/// Per-factor `params` production, modeled as the explicit enum `spec.md`
/// §9 recommends in place of an embedded callable: most factors contribute
/// static, already-known params; challenge-response factors need the
/// derived key before they can compute theirs.
pub enum ParamsAction {
    /// Params already known at the time `output()`/material were produced.
    Static(Value),
    /// Params that depend on the freshly derived key (e.g. a fresh HOTP
    /// counter, a new HMAC challenge).
    Rotating(Box<dyn FnOnce(&RotationContext) -> Value + Send>),
}

impl ParamsAction {
    /// Resolves this action to a concrete JSON value, given the key.
    pub fn resolve(self, ctx: &RotationContext) -> Value {
        match self {
            ParamsAction::Static(v) => v,
            ParamsAction::Rotating(f) => f(ctx),
        }
    }
}

/// A setup-side factor: produces the secret material to be shared, plus
/// whatever public information the policy and the caller need.
#[async_trait]
pub trait SetupFactor: Send + Sync {
    /// Short type tag, e.g. `"password"`, `"uuid"`, `"hmacsha1"`.
    fn factor_type(&self) -> &str;

    /// Id unique within the policy being built.
    fn id(&self) -> &str;

    /// Opaque secret material backing this factor (non-empty).
    fn data(&self) -> &[u8];

    /// Estimated real-world entropy of this factor, in bits. Used only for
    /// the `entropyBits.real` report.
    fn entropy(&self) -> f64;

    /// Deferred production of this factor's public `params`, given the
    /// freshly derived key.
    async fn params(&self, ctx: &RotationContext) -> ParamsAction;

    /// Public post-setup information returned to the caller (e.g. a
    /// generated UUID, an HMAC secret). Never persisted in the policy.
    async fn output(&self) -> Value;
}

/// The tagged union a derive-side factor resolves to, per `spec.md` §9:
/// either stretched raw material matching the policy slot's type, or a
/// raw, already-reconstructed share (the recovery-code path).
pub enum DeriveMaterial {
    /// Ordinary factor material to be HKDF-stretched and XORed against the
    /// stored pad.
    Stretched {
        /// Must match `policy.factors[i].type`.
        factor_type: String,
        /// Raw factor material.
        data: Zeroizing<Vec<u8>>,
    },
    /// A raw share, bypassing stretching entirely.
    Persisted {
        /// The share bytes, already `size` (or `size + k`) long.
        data: Zeroizing<Vec<u8>>,
    },
}

/// A derive-side factor: given the policy's stored `params` for this id,
/// produces material (or a persisted share) plus an optional rotation.
#[async_trait]
pub trait DeriveFactor: Send + Sync {
    /// Resolves this factor against the policy's stored params for its id.
    async fn material(&self, params: &Value) -> Result<DeriveMaterial>;

    /// Optional rotation of this factor's params after a successful
    /// derivation. Factors that never rotate should return
    /// `ParamsAction::Static` echoing the original params unchanged.
    async fn params(&self, ctx: &RotationContext) -> ParamsAction;
}

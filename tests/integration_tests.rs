//! End-to-end tests for the MFKDF setup/derive pipeline.
//!
//! These exercise the full round trip through the public API surface: a
//! 2-of-3 policy built from a password, a challenge-response-style factor,
//! and a recovery UUID, re-derived from every qualifying subset, including
//! the policy's JSON encoding in between.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use zeroize::Zeroizing;

use mfkdf::factor::{DeriveFactor, DeriveMaterial, ParamsAction, RotationContext, SetupFactor};
use mfkdf::{derive, setup, DeriveOptions, MfkdfError, Policy, SetupOptions};

struct PlainFactor {
    id: String,
    factor_type: String,
    data: Vec<u8>,
    entropy: f64,
}

#[async_trait]
impl SetupFactor for PlainFactor {
    fn factor_type(&self) -> &str {
        &self.factor_type
    }
    fn id(&self) -> &str {
        &self.id
    }
    fn data(&self) -> &[u8] {
        &self.data
    }
    fn entropy(&self) -> f64 {
        self.entropy
    }
    async fn params(&self, _ctx: &RotationContext) -> ParamsAction {
        ParamsAction::Static(serde_json::json!({}))
    }
    async fn output(&self) -> Value {
        serde_json::json!({ "id": self.id })
    }
}

/// A setup-side factor whose derive-side counterpart rotates a counter in
/// its stored params after every successful derivation, modeling a
/// challenge-response factor without implementing HOTP itself (an external
/// collaborator outside this crate's scope).
struct RotatingFactor {
    id: String,
    data: Vec<u8>,
}

#[async_trait]
impl SetupFactor for RotatingFactor {
    fn factor_type(&self) -> &str {
        "hotp"
    }
    fn id(&self) -> &str {
        &self.id
    }
    fn data(&self) -> &[u8] {
        &self.data
    }
    fn entropy(&self) -> f64 {
        30.0
    }
    async fn params(&self, _ctx: &RotationContext) -> ParamsAction {
        ParamsAction::Static(serde_json::json!({ "counter": 0 }))
    }
    async fn output(&self) -> Value {
        serde_json::json!({})
    }
}

struct PlainDeriveFactor {
    factor_type: String,
    data: Vec<u8>,
}

#[async_trait]
impl DeriveFactor for PlainDeriveFactor {
    async fn material(&self, _params: &Value) -> mfkdf::Result<DeriveMaterial> {
        Ok(DeriveMaterial::Stretched {
            factor_type: self.factor_type.clone(),
            data: Zeroizing::new(self.data.clone()),
        })
    }
    async fn params(&self, _ctx: &RotationContext) -> ParamsAction {
        ParamsAction::Static(serde_json::json!({}))
    }
}

struct RotatingDeriveFactor {
    data: Vec<u8>,
}

#[async_trait]
impl DeriveFactor for RotatingDeriveFactor {
    async fn material(&self, _params: &Value) -> mfkdf::Result<DeriveMaterial> {
        Ok(DeriveMaterial::Stretched {
            factor_type: "hotp".to_string(),
            data: Zeroizing::new(self.data.clone()),
        })
    }
    async fn params(&self, _ctx: &RotationContext) -> ParamsAction {
        ParamsAction::Rotating(Box::new(|_ctx| serde_json::json!({ "counter": 1 })))
    }
}

const PASSWORD: &[u8] = b"correct horse battery staple";
const HOTP_SECRET: &[u8] = b"hello world hmac secret";
const RECOVERY_UUID: &str = "9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d";

fn setup_factors() -> Vec<Box<dyn SetupFactor>> {
    vec![
        Box::new(PlainFactor {
            id: "password".to_string(),
            factor_type: "password".to_string(),
            data: PASSWORD.to_vec(),
            entropy: 20.0,
        }),
        Box::new(RotatingFactor {
            id: "hotp".to_string(),
            data: HOTP_SECRET.to_vec(),
        }),
        Box::new(PlainFactor {
            id: "recovery".to_string(),
            factor_type: "uuid".to_string(),
            data: RECOVERY_UUID.as_bytes().to_vec(),
            entropy: 122.0,
        }),
    ]
}

fn derive_producer(id: &str) -> Box<dyn DeriveFactor> {
    match id {
        "password" => Box::new(PlainDeriveFactor {
            factor_type: "password".to_string(),
            data: PASSWORD.to_vec(),
        }),
        "hotp" => Box::new(RotatingDeriveFactor { data: HOTP_SECRET.to_vec() }),
        "recovery" => Box::new(PlainDeriveFactor {
            factor_type: "uuid".to_string(),
            data: RECOVERY_UUID.as_bytes().to_vec(),
        }),
        other => panic!("unknown factor id {other}"),
    }
}

async fn two_of_three_policy() -> mfkdf::DerivedKey {
    setup(
        setup_factors(),
        SetupOptions { threshold: Some(2), size: 16, ..Default::default() },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn any_two_of_three_factors_derive_the_same_key() {
    let setup_result = two_of_three_policy().await;

    for subset in [
        ["password", "hotp"],
        ["password", "recovery"],
        ["hotp", "recovery"],
    ] {
        let mut producers: HashMap<String, Box<dyn DeriveFactor>> = HashMap::new();
        for id in subset {
            producers.insert(id.to_string(), derive_producer(id));
        }

        let derived = derive(&setup_result.policy, producers, DeriveOptions::default())
            .await
            .unwrap();
        assert_eq!(derived.key.as_slice(), setup_result.key.as_slice());
        assert_eq!(derived.key.len(), 16);
    }
}

#[tokio::test]
async fn below_threshold_derivation_is_rejected() {
    let setup_result = two_of_three_policy().await;

    let mut producers: HashMap<String, Box<dyn DeriveFactor>> = HashMap::new();
    producers.insert("password".to_string(), derive_producer("password"));

    let err = derive(&setup_result.policy, producers, DeriveOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MfkdfError::InsufficientShares { threshold: 2, supplied: 1 }
    ));
}

#[tokio::test]
async fn mismatched_factor_type_under_an_existing_id_is_rejected() {
    let setup_result = two_of_three_policy().await;

    let mut producers: HashMap<String, Box<dyn DeriveFactor>> = HashMap::new();
    producers.insert(
        "password".to_string(),
        Box::new(PlainDeriveFactor {
            factor_type: "uuid".to_string(),
            data: RECOVERY_UUID.as_bytes().to_vec(),
        }),
    );
    producers.insert("hotp".to_string(), derive_producer("hotp"));

    let err = derive(&setup_result.policy, producers, DeriveOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, MfkdfError::FactorTypeMismatch { .. }));
}

#[tokio::test]
async fn policy_round_trips_through_json_bytewise() {
    let setup_result = two_of_three_policy().await;

    let json = setup_result.policy.to_json().unwrap();
    let parsed = Policy::from_json(&json).unwrap();
    assert_eq!(parsed.to_json().unwrap(), json);
}

#[tokio::test]
async fn rotating_factor_params_change_while_static_factors_are_untouched() {
    let setup_result = two_of_three_policy().await;

    let recovery_before = setup_result
        .policy
        .factors
        .iter()
        .find(|f| f.id == "recovery")
        .unwrap()
        .params
        .clone();

    let mut producers: HashMap<String, Box<dyn DeriveFactor>> = HashMap::new();
    producers.insert("password".to_string(), derive_producer("password"));
    producers.insert("hotp".to_string(), derive_producer("hotp"));

    let derived = derive(&setup_result.policy, producers, DeriveOptions::default())
        .await
        .unwrap();

    let hotp_before = setup_result
        .policy
        .factors
        .iter()
        .find(|f| f.id == "hotp")
        .unwrap()
        .params
        .clone();
    let hotp_after = derived
        .policy
        .factors
        .iter()
        .find(|f| f.id == "hotp")
        .unwrap()
        .params
        .clone();
    assert_ne!(hotp_before, hotp_after);

    let recovery_after = derived
        .policy
        .factors
        .iter()
        .find(|f| f.id == "recovery")
        .unwrap()
        .params
        .clone();
    assert_eq!(recovery_before, recovery_after);
}

#[tokio::test]
async fn entropy_report_sums_the_threshold_smallest_real_estimates() {
    let setup_result = two_of_three_policy().await;
    // smallest two of {20.0, 30.0, 122.0} are 20.0 and 30.0
    assert_eq!(setup_result.entropy_bits.real, 50.0);
}

#[tokio::test]
async fn single_factor_setup_with_default_threshold_round_trips() {
    let setup_result = setup(
        vec![Box::new(PlainFactor {
            id: "password".to_string(),
            factor_type: "password".to_string(),
            data: PASSWORD.to_vec(),
            entropy: 20.0,
        })],
        SetupOptions { size: 16, ..Default::default() },
    )
    .await
    .unwrap();
    assert_eq!(setup_result.policy.threshold, 1);

    let mut producers: HashMap<String, Box<dyn DeriveFactor>> = HashMap::new();
    producers.insert("password".to_string(), derive_producer("password"));
    let derived = derive(&setup_result.policy, producers, DeriveOptions::default())
        .await
        .unwrap();
    assert_eq!(derived.key.as_slice(), setup_result.key.as_slice());
}

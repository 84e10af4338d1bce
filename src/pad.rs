//! Pad construction and inversion
//!
//! The "pad" is the public, policy-stored value that blinds a factor's share:
//! `pad = share XOR HKDF-SHA512(factor material)`. Knowing only the pad
//! leaks nothing about the share without also knowing the factor's raw
//! material, and vice versa — this is what lets the policy be stored in the
//! clear.

use hkdf::Hkdf;
use sha2::Sha512;
use zeroize::Zeroizing;

use crate::error::{MfkdfError, Result};

/// Stretches factor material to exactly `len` bytes via HKDF-SHA512 with an
/// empty salt and empty info string, per `spec.md` §4.4 step 1.
pub fn stretch(material: &[u8], len: usize) -> Result<Zeroizing<Vec<u8>>> {
    let hk = Hkdf::<Sha512>::new(Some(b""), material);
    let mut out = vec![0u8; len];
    hk.expand(b"", &mut out).map_err(|_| MfkdfError::KdfFailure)?;
    Ok(Zeroizing::new(out))
}

/// XORs two byte strings, left-padding the shorter one with zero bytes so
/// that share lengths of `size` and `size + k` (a wider field backend) are
/// handled uniformly, per `spec.md` §4.1 and §9.
pub(crate) fn xor_widen(a: &[u8], b: &[u8]) -> Vec<u8> {
    let len = a.len().max(b.len());
    let mut out = vec![0u8; len];
    for (i, byte) in out.iter_mut().enumerate() {
        let av = a.get(i.wrapping_sub(len - a.len())).copied().unwrap_or(0);
        let bv = b.get(i.wrapping_sub(len - b.len())).copied().unwrap_or(0);
        *byte = av ^ bv;
    }
    out
}

/// Computes `pad = share XOR stretch(material)` for one factor at setup
/// time (`spec.md` §4.4).
pub fn compute_pad(share: &[u8], material: &[u8]) -> Result<Vec<u8>> {
    let stretched = stretch(material, share.len())?;
    Ok(xor_widen(share, &stretched))
}

/// Recovers `share = pad XOR stretch(material)` for one factor at derive
/// time (`spec.md` §4.5). The stretched material is widened to `pad`'s
/// length before the XOR, never the other way around, so a pad wider than
/// `size` is handled without truncating real share bytes.
pub fn invert_pad(pad: &[u8], material: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let stretched = stretch(material, pad.len())?;
    Ok(Zeroizing::new(xor_widen(pad, &stretched)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_round_trips() {
        let share = b"0123456789abcdef".to_vec();
        let material = b"correct horse battery staple";

        let pad = compute_pad(&share, material).unwrap();
        let recovered = invert_pad(&pad, material).unwrap();
        assert_eq!(recovered.as_slice(), share.as_slice());
    }

    #[test]
    fn wrong_material_does_not_recover_share() {
        let share = b"0123456789abcdef".to_vec();
        let pad = compute_pad(&share, b"right material").unwrap();
        let recovered = invert_pad(&pad, b"wrong material!").unwrap();
        assert_ne!(recovered.as_slice(), share.as_slice());
    }

    #[test]
    fn xor_widen_left_pads_the_shorter_operand() {
        // A 3-byte value XORed with a left-padded 1-byte value: only the
        // low-order byte should change.
        let a = vec![0xAA, 0xBB, 0xCC];
        let b = vec![0x0F];
        let out = xor_widen(&a, &b);
        assert_eq!(out, vec![0xAA, 0xBB, 0xCC ^ 0x0F]);
        // Symmetric in argument order.
        assert_eq!(xor_widen(&b, &a), out);
    }
}

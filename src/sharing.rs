//! Shamir-style secret sharing over GF(256)
//!
//! Shares are `size`-byte buffers: each byte of the secret is protected
//! independently by a random degree-`t-1` polynomial, and share `i`
//! (1-indexed) is the vector of per-byte evaluations at `x = i`. This keeps
//! `share(secret).len() == secret.len()`, which is the byte-for-byte
//! invariant the pad construction in `pad.rs` relies on.

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::{MfkdfError, Result};
use crate::field::FieldElement;

/// Splits `secret` into `n` shares such that any `t` reconstruct it.
///
/// Requires `1 <= t <= n`. The polynomial for each byte is
/// `P(x) = secret_byte + c_1 x + ... + c_{t-1} x^{t-1}` with coefficients
/// `c_1..c_{t-1}` drawn uniformly at random; `share[i-1] = P(i)` for
/// `i` in `1..=n`.
pub fn share(secret: &[u8], t: usize, n: usize) -> Result<Vec<Zeroizing<Vec<u8>>>> {
    if t == 0 || t > n {
        return Err(MfkdfError::InvalidArgument(format!(
            "threshold {t} must be between 1 and {n}"
        )));
    }
    if n > 255 {
        return Err(MfkdfError::InvalidArgument(
            "at most 255 shares are supported (GF(256) x-coordinates)".into(),
        ));
    }

    let mut shares: Vec<Zeroizing<Vec<u8>>> =
        (0..n).map(|_| Zeroizing::new(vec![0u8; secret.len()])).collect();

    let mut rng = OsRng;
    for (byte_index, &secret_byte) in secret.iter().enumerate() {
        let mut coeffs = vec![FieldElement::ZERO; t];
        coeffs[0] = FieldElement::from(secret_byte);
        for c in coeffs.iter_mut().skip(1) {
            let mut b = [0u8; 1];
            rng.fill_bytes(&mut b);
            *c = FieldElement::from(b[0]);
        }

        for (i, s) in shares.iter_mut().enumerate() {
            let x = FieldElement::from((i + 1) as u8);
            s[byte_index] = FieldElement::eval_polynomial(&coeffs, x).byte();
        }
    }

    Ok(shares)
}

/// Reconstructs the secret from a set of shares at their original indices.
///
/// `partial[i]` is `Some(share)` for factor index `i` (1-based x-coordinate
/// `i+1`) if that share was recovered, `None` otherwise. At least `t`
/// entries must be `Some`.
pub fn combine(partial: &[Option<Vec<u8>>], t: usize) -> Result<Zeroizing<Vec<u8>>> {
    let present: Vec<(usize, &Vec<u8>)> = partial
        .iter()
        .enumerate()
        .filter_map(|(i, s)| s.as_ref().map(|s| (i, s)))
        .collect();

    if present.len() < t {
        return Err(MfkdfError::InsufficientShares {
            threshold: t,
            supplied: present.len(),
        });
    }

    let secret_len = present[0].1.len();
    let used = &present[..t];

    let mut secret = vec![0u8; secret_len];
    for (byte_index, out) in secret.iter_mut().enumerate() {
        let points: Vec<(FieldElement, FieldElement)> = used
            .iter()
            .map(|(i, s)| {
                (
                    FieldElement::from((*i + 1) as u8),
                    FieldElement::from(s[byte_index]),
                )
            })
            .collect();
        *out = FieldElement::lagrange_at_zero(&points).byte();
    }

    Ok(Zeroizing::new(secret))
}

/// Reconstructs the full `n`-length share vector from any `t` present
/// shares, evaluating the interpolated polynomial at each missing index.
pub fn recover(
    partial: &[Option<Vec<u8>>],
    t: usize,
    n: usize,
) -> Result<Vec<Zeroizing<Vec<u8>>>> {
    let present: Vec<(usize, &Vec<u8>)> = partial
        .iter()
        .enumerate()
        .filter_map(|(i, s)| s.as_ref().map(|s| (i, s)))
        .collect();

    if present.len() < t {
        return Err(MfkdfError::InsufficientShares {
            threshold: t,
            supplied: present.len(),
        });
    }

    let secret_len = present[0].1.len();
    let used = &present[..t];

    let mut full: Vec<Zeroizing<Vec<u8>>> = (0..n)
        .map(|_| Zeroizing::new(vec![0u8; secret_len]))
        .collect();

    for (byte_index, _) in (0..secret_len).enumerate() {
        let points: Vec<(FieldElement, FieldElement)> = used
            .iter()
            .map(|(i, s)| {
                (
                    FieldElement::from((*i + 1) as u8),
                    FieldElement::from(s[byte_index]),
                )
            })
            .collect();

        for (i, out) in full.iter_mut().enumerate() {
            if let Some((_, s)) = present.iter().find(|(pi, _)| *pi == i) {
                out[byte_index] = s[byte_index];
            } else {
                let x = FieldElement::from((i + 1) as u8);
                out[byte_index] = FieldElement::lagrange_at(&points, x).byte();
            }
        }
    }

    Ok(full)
}

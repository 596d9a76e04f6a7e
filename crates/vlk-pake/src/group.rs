//! ristretto255 arithmetic: OPRF blinding, hardening, triple-DH, and the
//! session key schedule.

use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use hkdf::Hkdf;
use sha2::{Digest, Sha256, Sha512};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Map arbitrary bytes onto the group (Elligator via 64-byte hash).
pub fn hash_to_point(input: &[u8]) -> RistrettoPoint {
    RistrettoPoint::hash_from_bytes::<Sha512>(input)
}

pub fn random_scalar() -> Scalar {
    Scalar::random(&mut rand::thread_rng())
}

/// Fresh keypair `(sk, sk·B)`.
pub fn keypair() -> (Scalar, RistrettoPoint) {
    let sk = random_scalar();
    let pk = RISTRETTO_BASEPOINT_POINT * sk;
    (sk, pk)
}

pub fn public_key(sk: &Scalar) -> RistrettoPoint {
    RISTRETTO_BASEPOINT_POINT * sk
}

pub fn encode_point(point: &RistrettoPoint) -> [u8; 32] {
    point.compress().to_bytes()
}

/// Decode 32 bytes as a group element. `None` for anything that is not a
/// canonical ristretto255 encoding.
pub fn decode_point(bytes: &[u8]) -> Option<RistrettoPoint> {
    let arr: [u8; 32] = bytes.try_into().ok()?;
    CompressedRistretto(arr).decompress()
}

/// Decode 32 bytes as a canonical scalar.
pub fn decode_scalar(bytes: &[u8]) -> Option<Scalar> {
    let arr: [u8; 32] = bytes.try_into().ok()?;
    Scalar::from_canonical_bytes(arr).into()
}

/// OPRF blind: mask the hashed password with a fresh random factor so the
/// evaluator only ever sees `H(pw)·r`.
pub fn blind(password: &[u8]) -> (Scalar, RistrettoPoint) {
    let r = random_scalar();
    let alpha = hash_to_point(password) * r;
    (r, alpha)
}

/// Remove the blinding factor from the evaluated element:
/// `(H(pw)·r·ks)·r⁻¹ = H(pw)·ks`.
pub fn unblind(beta: &RistrettoPoint, r: &Scalar) -> RistrettoPoint {
    beta * r.invert()
}

/// Iterated SHA-256 over the OPRF output. The round count is the tunable
/// cost parameter slowing offline guessing of `rw`.
pub fn harden(point: &RistrettoPoint, iterations: u32) -> [u8; 32] {
    let mut buf = encode_point(point);
    for _ in 0..iterations.max(1) {
        buf = Sha256::digest(buf).into();
    }
    buf
}

/// The three values derived from one handshake's shared secret.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KeySchedule {
    pub session_key: [u8; 32],
    pub server_confirm: [u8; 32],
    pub client_confirm: [u8; 32],
}

/// HKDF-SHA256 expansion of the triple-DH shared point into the session
/// key and both confirmation tags, domain-separated by info string.
pub fn derive_schedule(shared: &RistrettoPoint) -> anyhow::Result<KeySchedule> {
    let mut ikm = encode_point(shared);
    let hkdf = Hkdf::<Sha256>::new(None, &ikm);
    ikm.zeroize();

    let mut schedule = KeySchedule {
        session_key: [0u8; 32],
        server_confirm: [0u8; 32],
        client_confirm: [0u8; 32],
    };
    hkdf.expand(b"vaultlink-session-key", &mut schedule.session_key)
        .map_err(|e| anyhow::anyhow!("HKDF expand failed: {e}"))?;
    hkdf.expand(b"vaultlink-server-confirm", &mut schedule.server_confirm)
        .map_err(|e| anyhow::anyhow!("HKDF expand failed: {e}"))?;
    hkdf.expand(b"vaultlink-client-confirm", &mut schedule.client_confirm)
        .map_err(|e| anyhow::anyhow!("HKDF expand failed: {e}"))?;
    Ok(schedule)
}

/// Constant-time equality for confirmation tags and key encodings.
pub fn ct_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    use subtle::ConstantTimeEq;
    bool::from(a.ct_eq(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blind_unblind_identity() {
        let ks = random_scalar();
        let password = b"swordfish";

        // Unblinded OPRF evaluation
        let expected = hash_to_point(password) * ks;

        // Blinded evaluation round-trips to the same element
        let (r, alpha) = blind(password);
        let beta = alpha * ks;
        assert_eq!(encode_point(&unblind(&beta, &r)), encode_point(&expected));
    }

    #[test]
    fn test_blinding_masks_the_password_element() {
        let (_, alpha1) = blind(b"swordfish");
        let (_, alpha2) = blind(b"swordfish");
        assert_ne!(
            encode_point(&alpha1),
            encode_point(&alpha2),
            "fresh blinds must produce unlinkable elements"
        );
    }

    #[test]
    fn test_harden_deterministic_and_iteration_sensitive() {
        let p = hash_to_point(b"x");
        assert_eq!(harden(&p, 100), harden(&p, 100));
        assert_ne!(harden(&p, 100), harden(&p, 101));
        assert_ne!(harden(&p, 100), harden(&hash_to_point(b"y"), 100));
    }

    #[test]
    fn test_triple_dh_agreement() {
        // Client static + ephemeral, server static + ephemeral
        let (pu, cl_static) = keypair();
        let (xu, cl_eph) = keypair();
        let (ps, sv_static) = keypair();
        let (xs, sv_eph) = keypair();

        let client_side = sv_static * xu + sv_eph * pu + sv_eph * xu;
        let server_side = cl_eph * ps + cl_static * xs + cl_eph * xs;

        assert_eq!(encode_point(&client_side), encode_point(&server_side));
    }

    #[test]
    fn test_schedule_domain_separation() {
        let (_, p) = keypair();
        let schedule = derive_schedule(&p).unwrap();
        assert_ne!(schedule.session_key, schedule.server_confirm);
        assert_ne!(schedule.session_key, schedule.client_confirm);
        assert_ne!(schedule.server_confirm, schedule.client_confirm);
    }

    #[test]
    fn test_decode_point_rejects_junk() {
        assert!(decode_point(&[0xffu8; 32]).is_none());
        assert!(decode_point(b"short").is_none());

        let (_, p) = keypair();
        assert!(decode_point(&encode_point(&p)).is_some());
    }
}

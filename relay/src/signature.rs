//! Webhook signature verification.
//!
//! The sender attaches a base64 signature over the raw request body in the
//! `X-Hook-Signature` header. Two schemes are supported, chosen once at
//! startup:
//!
//! - HMAC-SHA512 keyed with a shared secret, base64-encoded
//! - RSA PKCS#1 v1.5 over a SHA-256 digest, checked with a public key
//!
//! With no secret configured every request is accepted.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use rsa::{pkcs8::DecodePublicKey, Pkcs1v15Sign, RsaPublicKey};
use sha2::{Digest, Sha256, Sha512};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::config::VerificationMode;

type HmacSha512 = Hmac<Sha512>;

/// Header carrying the base64 signature.
pub const SIGNATURE_HEADER: &str = "X-Hook-Signature";

/// Unusable key material. Fatal at startup.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("webhook public key is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("webhook public key is not a DER-encoded RSA public key: {0}")]
    InvalidPublicKey(#[from] rsa::pkcs8::spki::Error),
}

/// Signature verifier, selected once from configuration.
#[derive(Clone)]
pub enum Verifier {
    /// No secret configured; accepts everything.
    Disabled,
    /// Shared HMAC-SHA512 key.
    Hmac(Vec<u8>),
    /// RSA public key, PKCS#1 v1.5 with SHA-256.
    Rsa(RsaPublicKey),
}

impl Verifier {
    /// Build a verifier from the configured mode and secret.
    ///
    /// A missing or blank secret yields [`Verifier::Disabled`] regardless of
    /// mode. In RSA mode the secret must be a base64 SubjectPublicKeyInfo
    /// blob holding an RSA key.
    pub fn from_config(mode: VerificationMode, secret: Option<&str>) -> Result<Self, KeyError> {
        let secret = match secret {
            Some(s) if !s.trim().is_empty() => s,
            _ => return Ok(Verifier::Disabled),
        };

        match mode {
            // The key is the secret exactly as configured, whitespace included.
            VerificationMode::Hmac => Ok(Verifier::Hmac(secret.as_bytes().to_vec())),
            VerificationMode::Rsa => {
                let der = STANDARD.decode(secret.trim())?;
                let key = RsaPublicKey::from_public_key_der(&der)?;
                Ok(Verifier::Rsa(key))
            }
        }
    }

    /// Check `signature` against the exact `payload` bytes.
    ///
    /// Malformed signatures are an ordinary `false`, never an error.
    pub fn verify(&self, payload: &[u8], signature: &str) -> bool {
        match self {
            Verifier::Disabled => true,
            Verifier::Hmac(key) => verify_hmac(key, payload, signature),
            Verifier::Rsa(key) => verify_rsa(key, payload, signature),
        }
    }

    /// Short scheme name for logging.
    pub fn mode_name(&self) -> &'static str {
        match self {
            Verifier::Disabled => "disabled",
            Verifier::Hmac(_) => "hmac-sha512",
            Verifier::Rsa(_) => "rsa-sha256",
        }
    }

    /// Whether requests are actually being checked.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Verifier::Disabled)
    }
}

impl fmt::Debug for Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Verifier").field(&self.mode_name()).finish()
    }
}

/// Compute the base64 HMAC-SHA512 signature a sender attaches to `payload`.
pub fn sign_hmac(secret: &[u8], payload: &[u8]) -> String {
    let mut mac =
        <HmacSha512 as Mac>::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);
    STANDARD.encode(mac.finalize().into_bytes())
}

fn verify_hmac(key: &[u8], payload: &[u8], signature: &str) -> bool {
    let expected = sign_hmac(key, payload);
    constant_time_eq(expected.as_bytes(), signature.as_bytes())
}

fn verify_rsa(key: &RsaPublicKey, payload: &[u8], signature: &str) -> bool {
    let Ok(sig) = STANDARD.decode(signature) else {
        return false;
    };

    let digest = Sha256::digest(payload);
    key.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, &sig).is_ok()
}

/// Constant-time equality. Only the length is allowed to leak.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::{pkcs8::EncodePublicKey, RsaPrivateKey};
    use std::sync::OnceLock;

    const PAYLOAD: &[u8] = br#"{"eventType":"TEST"}"#;

    fn hmac_verifier(secret: &str) -> Verifier {
        Verifier::from_config(VerificationMode::Hmac, Some(secret)).unwrap()
    }

    fn test_key() -> &'static RsaPrivateKey {
        static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
        KEY.get_or_init(|| RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap())
    }

    fn public_key_b64() -> String {
        let public = RsaPublicKey::from(test_key());
        STANDARD.encode(public.to_public_key_der().unwrap().as_bytes())
    }

    fn rsa_sign(payload: &[u8]) -> Vec<u8> {
        let digest = Sha256::digest(payload);
        test_key()
            .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
            .unwrap()
    }

    fn rsa_verifier() -> Verifier {
        Verifier::from_config(VerificationMode::Rsa, Some(public_key_b64().as_str())).unwrap()
    }

    #[test]
    fn test_hmac_valid_signature() {
        let verifier = hmac_verifier("test-secret");
        let signature = sign_hmac(b"test-secret", PAYLOAD);
        assert!(verifier.verify(PAYLOAD, &signature));
    }

    #[test]
    fn test_hmac_invalid_signature() {
        let verifier = hmac_verifier("test-secret");
        assert!(!verifier.verify(PAYLOAD, "invalid-signature"));
    }

    #[test]
    fn test_hmac_secret_used_verbatim() {
        let verifier = hmac_verifier(" test-secret\n");

        let signature = sign_hmac(b" test-secret\n", PAYLOAD);
        assert!(verifier.verify(PAYLOAD, &signature));

        let trimmed = sign_hmac(b"test-secret", PAYLOAD);
        assert!(!verifier.verify(PAYLOAD, &trimmed));
    }

    #[test]
    fn test_rsa_key_surrounding_whitespace_ignored() {
        let padded = format!("  {}\n", public_key_b64());
        let verifier = Verifier::from_config(VerificationMode::Rsa, Some(padded.as_str())).unwrap();

        let signature = STANDARD.encode(rsa_sign(PAYLOAD));
        assert!(verifier.verify(PAYLOAD, &signature));
    }

    #[test]
    fn test_hmac_wrong_secret() {
        let verifier = hmac_verifier("test-secret");
        let signature = sign_hmac(b"other-secret", PAYLOAD);
        assert!(!verifier.verify(PAYLOAD, &signature));
    }

    #[test]
    fn test_hmac_single_bit_mutations_rejected() {
        let verifier = hmac_verifier("test-secret");
        let signature = sign_hmac(b"test-secret", PAYLOAD);

        for i in 0..PAYLOAD.len() {
            let mut mutated = PAYLOAD.to_vec();
            mutated[i] ^= 0x01;
            assert!(!verifier.verify(&mutated, &signature), "payload byte {i}");
        }

        for i in 0..signature.len() {
            let mut mutated = signature.clone().into_bytes();
            mutated[i] ^= 0x01;
            let mutated = String::from_utf8_lossy(&mutated);
            assert!(!verifier.verify(PAYLOAD, &mutated), "signature byte {i}");
        }
    }

    #[test]
    fn test_hmac_empty_inputs_are_compared() {
        let verifier = hmac_verifier("test-secret");
        assert!(!verifier.verify(b"", ""));
        assert!(!verifier.verify(PAYLOAD, ""));

        let empty_sig = sign_hmac(b"test-secret", b"");
        assert!(verifier.verify(b"", &empty_sig));
    }

    #[test]
    fn test_disabled_accepts_anything() {
        let verifier = Verifier::from_config(VerificationMode::Hmac, None).unwrap();
        assert!(!verifier.is_enabled());
        assert!(verifier.verify(PAYLOAD, "any-signature"));
        assert!(verifier.verify(PAYLOAD, ""));
        assert!(verifier.verify(b"", ""));
    }

    #[test]
    fn test_blank_secret_disables_in_either_mode() {
        for mode in [VerificationMode::Hmac, VerificationMode::Rsa] {
            let verifier = Verifier::from_config(mode, Some("  ")).unwrap();
            assert!(matches!(verifier, Verifier::Disabled));
        }
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"xbc"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn test_rsa_valid_signature() {
        let verifier = rsa_verifier();
        assert_eq!(verifier.mode_name(), "rsa-sha256");

        let signature = STANDARD.encode(rsa_sign(PAYLOAD));
        assert!(verifier.verify(PAYLOAD, &signature));
    }

    #[test]
    fn test_rsa_single_bit_mutations_rejected() {
        let verifier = rsa_verifier();
        let sig = rsa_sign(PAYLOAD);
        let signature = STANDARD.encode(&sig);

        let mut payload = PAYLOAD.to_vec();
        payload[0] ^= 0x01;
        assert!(!verifier.verify(&payload, &signature));

        for i in [0, sig.len() / 2, sig.len() - 1] {
            let mut mutated = sig.clone();
            mutated[i] ^= 0x01;
            assert!(!verifier.verify(PAYLOAD, &STANDARD.encode(mutated)), "sig byte {i}");
        }
    }

    #[test]
    fn test_rsa_malformed_signature_is_false() {
        let verifier = rsa_verifier();
        assert!(!verifier.verify(PAYLOAD, "not base64!!"));
        assert!(!verifier.verify(PAYLOAD, ""));
        assert!(!verifier.verify(PAYLOAD, "AAAA"));
    }

    #[test]
    fn test_rsa_rejects_hmac_signature() {
        let verifier = rsa_verifier();
        let signature = sign_hmac(public_key_b64().as_bytes(), PAYLOAD);
        assert!(!verifier.verify(PAYLOAD, &signature));
    }

    #[test]
    fn test_rsa_invalid_base64_key() {
        let result = Verifier::from_config(VerificationMode::Rsa, Some("not base64!!"));
        assert!(matches!(result, Err(KeyError::InvalidBase64(_))));
    }

    #[test]
    fn test_rsa_non_rsa_key() {
        // Ed25519 SubjectPublicKeyInfo with an all-zero key
        let ed25519 = "MCowBQYDK2VwAyEAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";
        let result = Verifier::from_config(VerificationMode::Rsa, Some(ed25519));
        assert!(matches!(result, Err(KeyError::InvalidPublicKey(_))));
    }

    #[test]
    fn test_rsa_garbage_der() {
        let result = Verifier::from_config(VerificationMode::Rsa, Some("aGVsbG8gd29ybGQ="));
        assert!(matches!(result, Err(KeyError::InvalidPublicKey(_))));
    }

    #[test]
    fn test_debug_hides_key() {
        let verifier = hmac_verifier("test-secret");
        let debug = format!("{:?}", verifier);
        assert!(!debug.contains("test-secret"));
        assert!(debug.contains("hmac-sha512"));
    }
}

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use ed25519_dalek::{Signer as _, SigningKey, VerifyingKey};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::MdnError;

/// Detached-signature capability used to seal an MDN report.
///
/// Implementations hold their key material immutably; one instance is
/// shared read-only across concurrent `create_mdn` calls.
pub trait MdnSigner: Send + Sync {
    /// Value for the `micalg` parameter of the signed envelope.
    fn micalg(&self) -> &str;

    /// Produce a detached signature over the exact report bytes.
    fn sign(&self, content: &[u8]) -> Result<Vec<u8>, MdnError>;
}

/// Responder key material, supplied once when the factory is built.
#[derive(Debug)]
pub struct SigningCredentials {
    pub signing_key: SigningKey,
    /// DER-encoded responder certificate, carried opaquely.
    pub certificate: Vec<u8>,
}

impl SigningCredentials {
    pub fn new(signing_key: SigningKey, certificate: Vec<u8>) -> Self {
        Self {
            signing_key,
            certificate,
        }
    }

    /// Load the 32-byte private key seed from its base64 form.
    pub fn from_base64(seed: &str, certificate: Vec<u8>) -> Result<Self, MdnError> {
        let bytes = BASE64
            .decode(seed)
            .map_err(|e| MdnError::Signing(format!("invalid key encoding: {e}")))?;
        let seed: [u8; 32] = bytes
            .try_into()
            .map_err(|_| MdnError::Signing("invalid key length".into()))?;
        Ok(Self::new(SigningKey::from_bytes(&seed), certificate))
    }
}

/// Generate a fresh random signing key.
pub fn generate_signing_key() -> SigningKey {
    let mut seed = [0u8; 32];
    rand::rng().fill_bytes(&mut seed);
    SigningKey::from_bytes(&seed)
}

/// Encode a key seed to base64 for configuration files.
pub fn seed_to_base64(seed: &[u8; 32]) -> String {
    BASE64.encode(seed)
}

/// Signs the SHA-256 digest of the report with Ed25519.
pub struct Ed25519Signer {
    credentials: SigningCredentials,
}

impl Ed25519Signer {
    pub fn new(credentials: SigningCredentials) -> Self {
        Self { credentials }
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.credentials.signing_key.verifying_key()
    }

    pub fn certificate(&self) -> &[u8] {
        &self.credentials.certificate
    }

    /// Digest signed by [`MdnSigner::sign`]; exposed so peers holding the
    /// certificate can verify the detached signature.
    pub fn digest(content: &[u8]) -> [u8; 32] {
        Sha256::digest(content).into()
    }
}

impl MdnSigner for Ed25519Signer {
    fn micalg(&self) -> &str {
        "sha-256"
    }

    fn sign(&self, content: &[u8]) -> Result<Vec<u8>, MdnError> {
        let digest = Ed25519Signer::digest(content);
        let signature = self.credentials.signing_key.sign(&digest);
        Ok(signature.to_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier};

    fn test_signer() -> Ed25519Signer {
        let key = SigningKey::from_bytes(&[7u8; 32]);
        Ed25519Signer::new(SigningCredentials::new(key, b"test-cert".to_vec()))
    }

    #[test]
    fn detached_signature_verifies() {
        let signer = test_signer();
        let content = b"report bytes";

        let raw = signer.sign(content).unwrap();
        let signature = Signature::from_slice(&raw).unwrap();
        let digest = Ed25519Signer::digest(content);

        assert!(signer.verifying_key().verify(&digest, &signature).is_ok());
    }

    #[test]
    fn seed_round_trips_through_base64() {
        let seed = [42u8; 32];
        let encoded = seed_to_base64(&seed);
        let credentials = SigningCredentials::from_base64(&encoded, Vec::new()).unwrap();
        assert_eq!(credentials.signing_key.to_bytes(), seed);
    }

    #[test]
    fn bad_seed_is_a_signing_error() {
        let err = SigningCredentials::from_base64("c2hvcnQ=", Vec::new()).unwrap_err();
        assert!(matches!(err, MdnError::Signing(_)));
    }
}

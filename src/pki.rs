use rand_core::CryptoRngCore;
use rsa::pkcs1v15::{Signature as RsaSignature, SigningKey as RsaSigningKey};
use rsa::pkcs1v15::VerifyingKey as RsaVerifyingKey;
use rsa::signature::{RandomizedSigner, SignatureEncoding, Signer, Verifier};
use sha2::Sha256;

use crate::cert::SignatureAlgorithm;
use crate::error::{CertNowError, Result};
use crate::key::{KeyPair, PublicKey};

fn signing_error(err: impl std::fmt::Display) -> CertNowError {
    CertNowError::SigningError(err.to_string())
}

/// Signs `data` with `key` using the algorithm [`KeyPair::signature_algorithm`]
/// reports. ECDSA signatures are DER-encoded `Ecdsa-Sig-Value`s, as X.509
/// requires.
pub fn sign_data<R: CryptoRngCore>(key: &KeyPair, rng: &mut R, data: &[u8]) -> Result<Vec<u8>> {
    match key {
        KeyPair::Rsa { private, .. } => {
            let signing_key: RsaSigningKey<Sha256> = RsaSigningKey::new(*private.clone());
            let signature = signing_key
                .try_sign_with_rng(rng, data)
                .map_err(signing_error)?;
            Ok(signature.to_vec())
        }
        KeyPair::EcdsaP256 { signing_key, .. } => {
            let signature: p256::ecdsa::Signature =
                signing_key.try_sign(data).map_err(signing_error)?;
            Ok(signature.to_der().as_bytes().to_vec())
        }
        KeyPair::EcdsaP384 { signing_key, .. } => {
            let signature: p384::ecdsa::Signature =
                signing_key.try_sign(data).map_err(signing_error)?;
            Ok(signature.to_der().as_bytes().to_vec())
        }
        KeyPair::EcdsaP521 { secret, .. } => {
            let signing_key =
                p521::ecdsa::SigningKey::from_bytes(&secret.to_bytes()).map_err(signing_error)?;
            let signature: p521::ecdsa::Signature =
                signing_key.try_sign(data).map_err(signing_error)?;
            Ok(signature.to_der().as_bytes().to_vec())
        }
        KeyPair::Ed25519 { signing_key } => {
            let signature = signing_key.try_sign(data).map_err(signing_error)?;
            Ok(signature.to_bytes().to_vec())
        }
    }
}

/// Verifies `signature` over `data` against `public`.
///
/// The algorithm must be the one the key type signs with; a mismatch is
/// reported as a failed verification.
pub fn verify_signature(
    public: &PublicKey,
    algorithm: &SignatureAlgorithm,
    data: &[u8],
    signature: &[u8],
) -> Result<()> {
    match (public, algorithm) {
        (PublicKey::Rsa(public), SignatureAlgorithm::Sha256WithRSA) => {
            let verifying_key: RsaVerifyingKey<Sha256> = RsaVerifyingKey::new(public.clone());
            let signature = RsaSignature::try_from(signature).map_err(signing_error)?;
            verifying_key.verify(data, &signature).map_err(signing_error)
        }
        (PublicKey::EcdsaP256(verifying_key), SignatureAlgorithm::Sha256WithECDSA) => {
            let signature = p256::ecdsa::Signature::from_der(signature).map_err(signing_error)?;
            verifying_key.verify(data, &signature).map_err(signing_error)
        }
        (PublicKey::EcdsaP384(verifying_key), SignatureAlgorithm::Sha384WithECDSA) => {
            let signature = p384::ecdsa::Signature::from_der(signature).map_err(signing_error)?;
            verifying_key.verify(data, &signature).map_err(signing_error)
        }
        (PublicKey::EcdsaP521(public), SignatureAlgorithm::Sha512WithECDSA) => {
            let verifying_key =
                p521::ecdsa::VerifyingKey::from_affine(*public.as_affine()).map_err(signing_error)?;
            let signature = p521::ecdsa::Signature::from_der(signature).map_err(signing_error)?;
            verifying_key.verify(data, &signature).map_err(signing_error)
        }
        (PublicKey::Ed25519(verifying_key), SignatureAlgorithm::Ed25519) => {
            let signature =
                ed25519_dalek::Signature::from_slice(signature).map_err(signing_error)?;
            verifying_key.verify(data, &signature).map_err(signing_error)
        }
        (_, algorithm) => Err(CertNowError::SigningError(format!(
            "{algorithm:?} does not match the issuer key type"
        ))),
    }
}

use std::fmt;

use const_oid::ObjectIdentifier;
use ed25519_dalek::{SigningKey as Ed25519SigningKey, VerifyingKey as Ed25519VerifyingKey};
use p256::ecdsa::{SigningKey as P256SigningKey, VerifyingKey as P256VerifyingKey};
use p384::ecdsa::{SigningKey as P384SigningKey, VerifyingKey as P384VerifyingKey};
use pkcs8::{DecodePrivateKey, EncodePrivateKey, PrivateKeyInfo};
use pkcs8::spki::DecodePublicKey;
use rand_core::{CryptoRngCore, OsRng};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha1::{Digest, Sha1};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::SignatureAlgorithm;
use crate::error::{CertNowError, Result};
use crate::pem_utils;
use crate::pki;

/// RSA modulus size used when no key is configured.
pub const DEFAULT_RSA_BITS: usize = 2048;

/// Elliptic curves supported for ECDSA keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcdsaCurve {
    P256,
    P384,
    P521,
}

/// A private signing key together with its public half.
///
/// This is the "signing capability" every certificate is minted with: it can
/// sign a TBS certificate and expose the public key that goes into the
/// certificate's SubjectPublicKeyInfo.
#[derive(Clone)]
pub enum KeyPair {
    Rsa {
        private: Box<RsaPrivateKey>,
        public: RsaPublicKey,
    },
    EcdsaP256 {
        signing_key: P256SigningKey,
        verifying_key: P256VerifyingKey,
    },
    EcdsaP384 {
        signing_key: P384SigningKey,
        verifying_key: P384VerifyingKey,
    },
    EcdsaP521 {
        secret: p521::SecretKey,
        public: p521::PublicKey,
    },
    Ed25519 {
        signing_key: Ed25519SigningKey,
    },
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("KeyPair").field(&self.algorithm_name()).finish()
    }
}

impl KeyPair {
    /// Generate an RSA key pair with the specified number of bits.
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        Self::generate_rsa_with_rng(&mut OsRng, bits)
    }

    pub fn generate_rsa_with_rng<R: CryptoRngCore>(rng: &mut R, bits: usize) -> Result<Self> {
        let private = RsaPrivateKey::new(rng, bits)
            .map_err(|e| CertNowError::KeyGenerationError(format!("RSA-{bits}: {e}")))?;
        let public = RsaPublicKey::from(&private);
        Ok(KeyPair::Rsa {
            private: Box::new(private),
            public,
        })
    }

    /// Generate an ECDSA key pair on the given curve.
    pub fn generate_ecdsa(curve: EcdsaCurve) -> Self {
        Self::generate_ecdsa_with_rng(&mut OsRng, curve)
    }

    pub fn generate_ecdsa_with_rng<R: CryptoRngCore>(rng: &mut R, curve: EcdsaCurve) -> Self {
        match curve {
            EcdsaCurve::P256 => {
                let signing_key = P256SigningKey::random(rng);
                let verifying_key = *signing_key.verifying_key();
                KeyPair::EcdsaP256 {
                    signing_key,
                    verifying_key,
                }
            }
            EcdsaCurve::P384 => {
                let signing_key = P384SigningKey::random(rng);
                let verifying_key = *signing_key.verifying_key();
                KeyPair::EcdsaP384 {
                    signing_key,
                    verifying_key,
                }
            }
            EcdsaCurve::P521 => {
                let secret = p521::SecretKey::random(rng);
                let public = secret.public_key();
                KeyPair::EcdsaP521 { secret, public }
            }
        }
    }

    /// Generate an Ed25519 key pair.
    pub fn generate_ed25519() -> Self {
        Self::generate_ed25519_with_rng(&mut OsRng)
    }

    pub fn generate_ed25519_with_rng<R: CryptoRngCore>(rng: &mut R) -> Self {
        KeyPair::Ed25519 {
            signing_key: Ed25519SigningKey::generate(rng),
        }
    }

    fn algorithm_name(&self) -> &'static str {
        match self {
            KeyPair::Rsa { .. } => "RSA",
            KeyPair::EcdsaP256 { .. } => "ECDSA P-256",
            KeyPair::EcdsaP384 { .. } => "ECDSA P-384",
            KeyPair::EcdsaP521 { .. } => "ECDSA P-521",
            KeyPair::Ed25519 { .. } => "Ed25519",
        }
    }

    /// The signature algorithm certificates signed by this key carry.
    pub fn signature_algorithm(&self) -> SignatureAlgorithm {
        match self {
            KeyPair::Rsa { .. } => SignatureAlgorithm::Sha256WithRSA,
            KeyPair::EcdsaP256 { .. } => SignatureAlgorithm::Sha256WithECDSA,
            KeyPair::EcdsaP384 { .. } => SignatureAlgorithm::Sha384WithECDSA,
            KeyPair::EcdsaP521 { .. } => SignatureAlgorithm::Sha512WithECDSA,
            KeyPair::Ed25519 { .. } => SignatureAlgorithm::Ed25519,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_key_pair(self)
    }

    /// Signs `data` with this key. `rng` feeds RSA blinding; the ECDSA and
    /// Ed25519 signers are deterministic.
    pub fn sign_data<R: CryptoRngCore>(&self, rng: &mut R, data: &[u8]) -> Result<Vec<u8>> {
        pki::sign_data(self, rng, data)
    }

    /// Encodes the private key as a PKCS#8 `PrivateKeyInfo` document.
    pub fn to_pkcs8_der(&self) -> Result<Vec<u8>> {
        let doc = match self {
            KeyPair::Rsa { private, .. } => private.to_pkcs8_der()?,
            KeyPair::EcdsaP256 { signing_key, .. } => signing_key.to_pkcs8_der()?,
            KeyPair::EcdsaP384 { signing_key, .. } => signing_key.to_pkcs8_der()?,
            KeyPair::EcdsaP521 { secret, .. } => secret.to_pkcs8_der()?,
            KeyPair::Ed25519 { signing_key } => signing_key.to_pkcs8_der()?,
        };
        Ok(doc.as_bytes().to_vec())
    }

    pub fn to_pkcs8_pem(&self) -> Result<String> {
        Ok(pem_utils::der_to_pem(
            &self.to_pkcs8_der()?,
            pem_utils::PRIVATE_KEY_LABEL,
        ))
    }

    /// Decodes a PKCS#8 `PrivateKeyInfo` holding an RSA, ECDSA (P-256, P-384,
    /// P-521) or Ed25519 key.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let info = PrivateKeyInfo::try_from(der)?;
        match info.algorithm.oid {
            const_oid::db::rfc5912::RSA_ENCRYPTION => {
                let private = RsaPrivateKey::from_pkcs8_der(der)?;
                let public = RsaPublicKey::from(&private);
                Ok(KeyPair::Rsa {
                    private: Box::new(private),
                    public,
                })
            }
            const_oid::db::rfc5912::ID_EC_PUBLIC_KEY => {
                match info.algorithm.parameters_oid()? {
                    const_oid::db::rfc5912::SECP_256_R_1 => {
                        let signing_key = P256SigningKey::from_pkcs8_der(der)?;
                        let verifying_key = *signing_key.verifying_key();
                        Ok(KeyPair::EcdsaP256 {
                            signing_key,
                            verifying_key,
                        })
                    }
                    const_oid::db::rfc5912::SECP_384_R_1 => {
                        let signing_key = P384SigningKey::from_pkcs8_der(der)?;
                        let verifying_key = *signing_key.verifying_key();
                        Ok(KeyPair::EcdsaP384 {
                            signing_key,
                            verifying_key,
                        })
                    }
                    const_oid::db::rfc5912::SECP_521_R_1 => {
                        let secret = p521::SecretKey::from_pkcs8_der(der)?;
                        let public = secret.public_key();
                        Ok(KeyPair::EcdsaP521 { secret, public })
                    }
                    curve => Err(CertNowError::DecodingError(format!(
                        "unsupported elliptic curve {curve}"
                    ))),
                }
            }
            const_oid::db::rfc8410::ID_ED_25519 => Ok(KeyPair::Ed25519 {
                signing_key: Ed25519SigningKey::from_pkcs8_der(der)?,
            }),
            oid => Err(CertNowError::DecodingError(format!(
                "unsupported private key algorithm {oid}"
            ))),
        }
    }

    pub fn from_pkcs8_pem(pem_str: &str) -> Result<Self> {
        Self::from_pkcs8_der(&pem_utils::pem_to_der(pem_str)?)
    }
}

/// Where the certificate's key comes from.
///
/// Key generation is deferred until defaults are resolved, so directives that
/// pick a key type never generate material that a later directive discards.
#[derive(Clone, Debug)]
pub enum KeySource {
    /// Use this key as is.
    Provided(KeyPair),
    /// Generate an RSA key of the given modulus size.
    Rsa(usize),
    /// Generate an ECDSA key on the given curve.
    Ecdsa(EcdsaCurve),
    /// Generate an Ed25519 key.
    Ed25519,
}

impl Default for KeySource {
    fn default() -> Self {
        KeySource::Rsa(DEFAULT_RSA_BITS)
    }
}

impl KeySource {
    pub fn into_key_pair<R: CryptoRngCore>(self, rng: &mut R) -> Result<KeyPair> {
        match self {
            KeySource::Provided(key) => Ok(key),
            KeySource::Rsa(bits) => KeyPair::generate_rsa_with_rng(rng, bits),
            KeySource::Ecdsa(curve) => Ok(KeyPair::generate_ecdsa_with_rng(rng, curve)),
            KeySource::Ed25519 => Ok(KeyPair::generate_ed25519_with_rng(rng)),
        }
    }
}

/// The named curve in an `id-ecPublicKey` algorithm identifier.
fn ec_curve_oid(spki: &SubjectPublicKeyInfoOwned) -> Result<ObjectIdentifier> {
    let parameters = spki.algorithm.parameters.as_ref().ok_or_else(|| {
        CertNowError::DecodingError("EC public key without curve parameters".to_string())
    })?;
    Ok(parameters.decode_as::<ObjectIdentifier>()?)
}

/// Public half of a [`KeyPair`], or a key decoded from a certificate.
#[derive(Clone, Debug, PartialEq)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    EcdsaP256(P256VerifyingKey),
    EcdsaP384(P384VerifyingKey),
    EcdsaP521(p521::PublicKey),
    Ed25519(Ed25519VerifyingKey),
}

impl PublicKey {
    pub fn from_key_pair(key: &KeyPair) -> Self {
        match key {
            KeyPair::Rsa { public, .. } => PublicKey::Rsa(public.clone()),
            KeyPair::EcdsaP256 { verifying_key, .. } => PublicKey::EcdsaP256(*verifying_key),
            KeyPair::EcdsaP384 { verifying_key, .. } => PublicKey::EcdsaP384(*verifying_key),
            KeyPair::EcdsaP521 { public, .. } => PublicKey::EcdsaP521(*public),
            KeyPair::Ed25519 { signing_key } => PublicKey::Ed25519(signing_key.verifying_key()),
        }
    }

    /// Encodes the key as an X.509 SubjectPublicKeyInfo.
    pub fn to_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        let spki = match self {
            PublicKey::Rsa(public) => SubjectPublicKeyInfoOwned::from_key(public.clone())?,
            PublicKey::EcdsaP256(verifying_key) => {
                SubjectPublicKeyInfoOwned::from_key(*verifying_key)?
            }
            PublicKey::EcdsaP384(verifying_key) => {
                SubjectPublicKeyInfoOwned::from_key(*verifying_key)?
            }
            PublicKey::EcdsaP521(public) => SubjectPublicKeyInfoOwned::from_key(*public)?,
            PublicKey::Ed25519(verifying_key) => {
                SubjectPublicKeyInfoOwned::from_key(*verifying_key)?
            }
        };
        Ok(spki)
    }

    /// Decodes a SubjectPublicKeyInfo taken from a certificate.
    pub fn from_x509spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        use der::Encode;

        let der = spki.to_der()?;
        match spki.algorithm.oid {
            const_oid::db::rfc5912::RSA_ENCRYPTION => {
                Ok(PublicKey::Rsa(RsaPublicKey::from_public_key_der(&der)?))
            }
            const_oid::db::rfc5912::ID_EC_PUBLIC_KEY => match ec_curve_oid(spki)? {
                const_oid::db::rfc5912::SECP_256_R_1 => Ok(PublicKey::EcdsaP256(
                    P256VerifyingKey::from_public_key_der(&der)?,
                )),
                const_oid::db::rfc5912::SECP_384_R_1 => Ok(PublicKey::EcdsaP384(
                    P384VerifyingKey::from_public_key_der(&der)?,
                )),
                const_oid::db::rfc5912::SECP_521_R_1 => Ok(PublicKey::EcdsaP521(
                    p521::PublicKey::from_public_key_der(&der)?,
                )),
                curve => Err(CertNowError::DecodingError(format!(
                    "unsupported elliptic curve {curve}"
                ))),
            },
            const_oid::db::rfc8410::ID_ED_25519 => Ok(PublicKey::Ed25519(
                Ed25519VerifyingKey::from_public_key_der(&der)?,
            )),
            oid => Err(CertNowError::DecodingError(format!(
                "unsupported public key algorithm {oid}"
            ))),
        }
    }

    /// Key identifier per RFC 5280 section 4.2.1.2, method 1: the SHA-1 hash
    /// of the subjectPublicKey BIT STRING, excluding tag, length and unused
    /// bits octet.
    pub fn key_identifier(&self) -> Result<Vec<u8>> {
        let spki = self.to_spki()?;
        Ok(Sha1::digest(spki.subject_public_key.raw_bytes()).to_vec())
    }
}

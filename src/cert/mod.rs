pub mod extensions;
pub mod params;

use der::{Decode, Encode, EncodePem};
use extensions::ToAndFromX509Extension;
use params::{DistinguishedName, ExtensionParam, SerialNumber, Validity};
use x509_cert::certificate::CertificateInner;
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::error::{CertNowError, Result};
use crate::key::PublicKey;
use crate::pem_utils;
use crate::tbs_certificate;

/// Represents the supported signature algorithms for certificates.
///
/// This enum provides a mapping to the corresponding OIDs for each algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-256 with RSA encryption (PKCS#1 v1.5).
    Sha256WithRSA,
    /// SHA-256 with ECDSA.
    Sha256WithECDSA,
    /// SHA-384 with ECDSA.
    Sha384WithECDSA,
    /// SHA-512 with ECDSA.
    Sha512WithECDSA,
    /// Ed25519 (PureEdDSA).
    Ed25519,
}

impl From<SignatureAlgorithm> for AlgorithmIdentifierOwned {
    /// Converts a `SignatureAlgorithm` into an `AlgorithmIdentifierOwned`.
    ///
    /// RSA identifiers carry an explicit NULL parameter, the ECDSA and EdDSA
    /// identifiers carry none (RFC 4055, RFC 5758, RFC 8410).
    fn from(value: SignatureAlgorithm) -> Self {
        match value {
            SignatureAlgorithm::Sha256WithRSA => AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
                parameters: Some(der::asn1::Any::null()),
            },
            SignatureAlgorithm::Sha256WithECDSA => AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::ECDSA_WITH_SHA_256,
                parameters: None,
            },
            SignatureAlgorithm::Sha384WithECDSA => AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::ECDSA_WITH_SHA_384,
                parameters: None,
            },
            SignatureAlgorithm::Sha512WithECDSA => AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::ECDSA_WITH_SHA_512,
                parameters: None,
            },
            SignatureAlgorithm::Ed25519 => AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc8410::ID_ED_25519,
                parameters: None,
            },
        }
    }
}

impl TryFrom<&AlgorithmIdentifierOwned> for SignatureAlgorithm {
    type Error = CertNowError;

    fn try_from(value: &AlgorithmIdentifierOwned) -> Result<Self> {
        match value.oid {
            const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION => Ok(Self::Sha256WithRSA),
            const_oid::db::rfc5912::ECDSA_WITH_SHA_256 => Ok(Self::Sha256WithECDSA),
            const_oid::db::rfc5912::ECDSA_WITH_SHA_384 => Ok(Self::Sha384WithECDSA),
            const_oid::db::rfc5912::ECDSA_WITH_SHA_512 => Ok(Self::Sha512WithECDSA),
            const_oid::db::rfc8410::ID_ED_25519 => Ok(Self::Ed25519),
            oid => Err(CertNowError::DecodingError(format!(
                "Unsupported signature algorithm {oid}"
            ))),
        }
    }
}

/// Represents an X.509 certificate.
///
/// This struct provides methods to encode the certificate into DER or PEM
/// formats and to read back the fields this crate writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

impl Certificate {
    /// Parses a DER-encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = CertificateInner::from_der(der)
            .map_err(|e| CertNowError::CertificateError(format!("malformed certificate: {e}")))?;
        Ok(Self { inner })
    }

    /// Parses the first `CERTIFICATE` block of a PEM document.
    pub fn from_pem(pem_str: &str) -> Result<Self> {
        let der = pem_utils::pem_to_der_all(pem_str, pem_utils::CERTIFICATE_LABEL)?
            .into_iter()
            .next()
            .ok_or_else(|| CertNowError::DecodingError("no CERTIFICATE block".to_string()))?;
        Self::from_der(&der)
    }

    /// Encodes the certificate into DER format.
    ///
    /// # Returns
    /// A byte vector containing the DER-encoded certificate.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| CertNowError::EncodingError(e.to_string()))
    }

    /// Encodes the certificate into PEM format.
    ///
    /// # Returns
    /// A string containing the PEM-encoded certificate.
    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_pem(pkcs8::LineEnding::LF)
            .map_err(|e| CertNowError::EncodingError(e.to_string()))
    }

    pub fn subject(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(&self.inner.tbs_certificate.subject)
    }

    pub fn issuer(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(&self.inner.tbs_certificate.issuer)
    }

    /// True when the encoded issuer and subject names are identical.
    pub fn is_self_issued(&self) -> bool {
        self.inner.tbs_certificate.issuer == self.inner.tbs_certificate.subject
    }

    pub fn serial_number(&self) -> Result<SerialNumber> {
        SerialNumber::from_x509(&self.inner.tbs_certificate.serial_number)
    }

    pub fn validity(&self) -> Validity {
        let validity = &self.inner.tbs_certificate.validity;
        Validity {
            not_before: tbs_certificate::from_x509_time(&validity.not_before),
            not_after: tbs_certificate::from_x509_time(&validity.not_after),
        }
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_x509spki(&self.inner.tbs_certificate.subject_public_key_info)
    }

    pub fn signature_algorithm(&self) -> Result<SignatureAlgorithm> {
        SignatureAlgorithm::try_from(&self.inner.signature_algorithm)
    }

    /// All extensions, in encoded order.
    pub fn extensions(&self) -> Vec<ExtensionParam> {
        self.inner
            .tbs_certificate
            .extensions
            .iter()
            .flatten()
            .map(|ext| ExtensionParam {
                oid: ext.extn_id,
                critical: ext.critical,
                value: ext.extn_value.as_bytes().to_vec(),
            })
            .collect()
    }

    /// Decodes the extension of type `E`, if the certificate carries one.
    pub fn extension<E: ToAndFromX509Extension>(&self) -> Result<Option<E>> {
        self.extensions()
            .iter()
            .find(|ext| ext.oid == E::OID)
            .map(|ext| ext.to_extension())
            .transpose()
    }

    /// Checks that this certificate's signature was produced by the private
    /// half of `issuer_key`.
    pub fn verify_signed_by(&self, issuer_key: &PublicKey) -> Result<()> {
        let tbs = self.inner.tbs_certificate.to_der()?;
        crate::pki::verify_signature(
            issuer_key,
            &self.signature_algorithm()?,
            &tbs,
            self.inner.signature.raw_bytes(),
        )
    }

    /// Checks that `issuer` names this certificate's issuer and that its key
    /// produced this certificate's signature.
    pub fn verify_issued_by(&self, issuer: &Certificate) -> Result<()> {
        if self.inner.tbs_certificate.issuer != issuer.inner.tbs_certificate.subject {
            return Err(CertNowError::CertificateError(format!(
                "issuer {} does not match {}",
                self.inner.tbs_certificate.issuer, issuer.inner.tbs_certificate.subject
            )));
        }
        self.verify_signed_by(&issuer.public_key()?)
    }
}

//! use certnow::error::CertNowError;

use thiserror::Error;

/// Represents errors that can occur while minting certificates.
///
/// Every failure in the directive pipeline, in default resolution and in
/// signing surfaces as one of these variants, unchanged and unretried.
#[derive(Debug, Error, Clone)]
pub enum CertNowError {
    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// Error due to invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error during key generation.
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    /// Error related to certificate operations.
    #[error("Certificate error: {0}")]
    CertificateError(String),

    /// The signing primitive failed, or a signature did not verify.
    #[error("Signature error: {0}")]
    SigningError(String),

    /// The authority's private key material is not a usable signing key for
    /// the authority certificate.
    #[error("authority private key is not a valid signing key: {0}")]
    InvalidAuthorityKey(String),

    /// Error while writing PEM output.
    #[error("I/O error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, CertNowError>;

impl From<der::Error> for CertNowError {
    /// Converts a `der::Error` into a `CertNowError`.
    fn from(err: der::Error) -> Self {
        CertNowError::DecodingError(err.to_string())
    }
}

impl From<pkcs8::Error> for CertNowError {
    fn from(err: pkcs8::Error) -> Self {
        CertNowError::DecodingError(err.to_string())
    }
}

impl From<pkcs8::spki::Error> for CertNowError {
    fn from(err: pkcs8::spki::Error) -> Self {
        CertNowError::EncodingError(err.to_string())
    }
}

impl From<pem::PemError> for CertNowError {
    fn from(err: pem::PemError) -> Self {
        CertNowError::DecodingError(err.to_string())
    }
}

impl From<std::io::Error> for CertNowError {
    fn from(err: std::io::Error) -> Self {
        CertNowError::Io(err.to_string())
    }
}

//! The generation entry points.

use rand_core::{CryptoRngCore, OsRng};

use crate::cert::Certificate;
use crate::config::CertificateConfig;
use crate::error::{CertNowError, Result};
use crate::issuer::{Issuer, SelfIssuer};
use crate::key::KeyPair;
use crate::options::{CertOption, apply_options};

/// A freshly minted certificate chain and the private key of its leaf.
#[derive(Clone, Debug)]
pub struct GeneratedCertificate {
    /// DER certificates, leaf first, followed by the authority's own chain.
    /// Never empty when produced by this crate.
    pub chain: Vec<Vec<u8>>,
    /// The key whose public half is in the leaf.
    pub key: KeyPair,
}

impl GeneratedCertificate {
    /// DER of the newly generated certificate, empty if `chain` is.
    pub fn leaf(&self) -> &[u8] {
        self.chain.first().map(Vec::as_slice).unwrap_or_default()
    }

    /// The newly generated certificate, parsed.
    pub fn certificate(&self) -> Result<Certificate> {
        Certificate::from_der(self.leaf())
    }
}

/// Generates a certificate and key from `options`, drawing randomness from
/// the operating system.
///
/// With no options the result is a self-signed RSA-2048 certificate valid for
/// 90 days from now, usable for TLS server and client authentication.
///
/// # Example
/// ```no_run
/// use certnow::{CertOption, generate};
///
/// let root = generate([CertOption::common_name("Root CA"), CertOption::IsCa(true)])?;
/// let leaf = generate([
///     CertOption::common_name("www.example.com"),
///     CertOption::names(["www.example.com", "127.0.0.1"]),
///     CertOption::authority(&root)?,
/// ])?;
/// assert_eq!(leaf.chain.len(), 2);
/// # Ok::<(), certnow::error::CertNowError>(())
/// ```
pub fn generate<I>(options: I) -> Result<GeneratedCertificate>
where
    I: IntoIterator<Item = CertOption>,
{
    generate_with_rng(&mut OsRng, options)
}

/// Like [`generate`], with `rng` supplying the serial number, key material
/// and signing randomness.
pub fn generate_with_rng<R, I>(rng: &mut R, options: I) -> Result<GeneratedCertificate>
where
    R: CryptoRngCore,
    I: IntoIterator<Item = CertOption>,
{
    let mut config = CertificateConfig::default();
    apply_options(&mut config, options)?;
    let resolved = config.resolve(rng)?;

    let certificate = match &resolved.authority {
        Some(authority) => authority.issue(&resolved, rng)?,
        None => SelfIssuer::new(&resolved)?.issue(&resolved, rng)?,
    };
    let leaf = certificate.to_der()?;

    tracing::info!(
        subject = %certificate.inner.tbs_certificate.subject,
        issuer = %certificate.inner.tbs_certificate.issuer,
        key = ?resolved.key,
        "generated certificate"
    );

    let authority_chain = resolved
        .authority
        .as_ref()
        .map(|authority| authority.chain.as_slice())
        .unwrap_or_default();
    let chain = assemble_chain(leaf, authority_chain)?;

    Ok(GeneratedCertificate {
        chain,
        key: resolved.key,
    })
}

/// The new leaf followed by every certificate of the authority chain, in
/// order. Each authority certificate must parse.
pub fn assemble_chain(leaf: Vec<u8>, authority_chain: &[Vec<u8>]) -> Result<Vec<Vec<u8>>> {
    let mut chain = Vec::with_capacity(authority_chain.len() + 1);
    chain.push(leaf);
    for (depth, der) in authority_chain.iter().enumerate() {
        Certificate::from_der(der).map_err(|e| {
            CertNowError::CertificateError(format!("authority chain entry {depth}: {e}"))
        })?;
        chain.push(der.clone());
    }
    Ok(chain)
}

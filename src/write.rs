//! PEM output for generated certificates and keys, and loading them back.
//!
//! Certificates are written as `CERTIFICATE` blocks, keys as PKCS#8
//! `PRIVATE KEY` blocks.

use std::fs;
use std::io;
use std::path::Path;

use crate::cert::Certificate;
use crate::error::{CertNowError, Result};
use crate::generate::GeneratedCertificate;
use crate::key::KeyPair;
use crate::pem_utils;

/// The leaf certificate of `generated` as a single PEM block.
pub fn encode_certificate_pem(generated: &GeneratedCertificate) -> String {
    pem_utils::der_to_pem(generated.leaf(), pem_utils::CERTIFICATE_LABEL)
}

/// Every certificate of the chain, leaf first, as concatenated PEM blocks.
pub fn encode_chain_pem(generated: &GeneratedCertificate) -> String {
    generated
        .chain
        .iter()
        .map(|der| pem_utils::der_to_pem(der, pem_utils::CERTIFICATE_LABEL))
        .collect()
}

pub fn encode_private_key_pem(generated: &GeneratedCertificate) -> Result<String> {
    generated.key.to_pkcs8_pem()
}

pub fn write_certificate<W: io::Write>(generated: &GeneratedCertificate, mut out: W) -> Result<()> {
    out.write_all(encode_certificate_pem(generated).as_bytes())?;
    Ok(())
}

pub fn write_private_key<W: io::Write>(generated: &GeneratedCertificate, mut out: W) -> Result<()> {
    out.write_all(encode_private_key_pem(generated)?.as_bytes())?;
    Ok(())
}

/// Writes the leaf certificate PEM to `path`, creating or truncating it, and
/// sets its permission bits to `mode` on Unix.
pub fn write_certificate_file(
    generated: &GeneratedCertificate,
    path: impl AsRef<Path>,
    mode: u32,
) -> Result<()> {
    write_file(path.as_ref(), encode_certificate_pem(generated).as_bytes(), mode)
}

/// Writes the private key PEM to `path`, creating or truncating it, and sets
/// its permission bits to `mode` on Unix.
pub fn write_private_key_file(
    generated: &GeneratedCertificate,
    path: impl AsRef<Path>,
    mode: u32,
) -> Result<()> {
    write_file(path.as_ref(), encode_private_key_pem(generated)?.as_bytes(), mode)
}

fn write_file(path: &Path, contents: &[u8], mode: u32) -> Result<()> {
    let io_error = |action: &str, e: io::Error| CertNowError::Io(format!("{action} {}: {e}", path.display()));

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    let mut file = options.open(path).map_err(|e| io_error("opening", e))?;

    // Creation mode is masked by the umask and ignored for existing files;
    // set the exact bits before any content lands.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(mode))
            .map_err(|e| io_error("setting mode on", e))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    io::Write::write_all(&mut file, contents).map_err(|e| io_error("writing", e))?;

    tracing::debug!(path = %path.display(), mode = format_args!("{mode:o}"), "wrote PEM file");
    Ok(())
}

/// Rebuilds a [`GeneratedCertificate`] from a PEM certificate chain (leaf
/// first) and a PKCS#8 private key. The key must belong to the leaf.
pub fn load_pem_key_pair(cert_pem: &str, key_pem: &str) -> Result<GeneratedCertificate> {
    let chain = pem_utils::pem_to_der_all(cert_pem, pem_utils::CERTIFICATE_LABEL)?;
    let leaf = chain
        .first()
        .ok_or_else(|| CertNowError::DecodingError("no CERTIFICATE block".to_string()))?;
    let certificate = Certificate::from_der(leaf)?;
    for der in &chain[1..] {
        Certificate::from_der(der)?;
    }

    let key = KeyPair::from_pkcs8_pem(key_pem)?;
    if key.public_key() != certificate.public_key()? {
        return Err(CertNowError::InvalidInput(
            "private key does not match the leaf certificate".to_string(),
        ));
    }

    Ok(GeneratedCertificate { chain, key })
}

pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";
pub const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(
        &pem,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

/// Convert a PEM‑encoded string to DER‑encoded bytes.
pub fn pem_to_der(pem_str: &str) -> Result<Vec<u8>, pem::PemError> {
    let pem = pem::parse(pem_str)?;
    Ok(pem.contents().to_vec())
}

/// Collect the contents of every PEM block carrying `label`, in order.
pub fn pem_to_der_all(pem_str: &str, label: &str) -> Result<Vec<Vec<u8>>, pem::PemError> {
    Ok(pem::parse_many(pem_str)?
        .into_iter()
        .filter(|block| block.tag() == label)
        .map(|block| block.into_contents())
        .collect())
}

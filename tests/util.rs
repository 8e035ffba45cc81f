#![allow(dead_code)]

use certnow::cert::Certificate;
use certnow::cert::extensions::KeyUsages;
use certnow::{CertOption, GeneratedCertificate, generate};

pub fn ca_options(common_name: &str) -> Vec<CertOption> {
    vec![
        CertOption::common_name(common_name),
        CertOption::add_date(20, 0, 0),
        CertOption::KeyUsage(
            KeyUsages::DigitalSignature | KeyUsages::KeyCertSign | KeyUsages::CRLSign,
        ),
        CertOption::ExtKeyUsage(vec![]),
        CertOption::IsCa(true),
    ]
}

/// A self-signed root CA with an ECDSA P-256 key.
pub fn generate_root_ca() -> GeneratedCertificate {
    let mut options = ca_options("My Root CA");
    options.push(CertOption::Ecdsa(certnow::key::EcdsaCurve::P256));
    generate(options).unwrap()
}

/// An intermediate CA signed by `root`.
pub fn generate_intermediate_ca(root: &GeneratedCertificate) -> GeneratedCertificate {
    let mut options = ca_options("My CA");
    options.push(CertOption::Ecdsa(certnow::key::EcdsaCurve::P256));
    options.push(CertOption::authority(root).unwrap());
    generate(options).unwrap()
}

/// A server certificate for `www.example.com` and 127.0.0.1 signed by
/// `authority`.
pub fn generate_server_cert(authority: &GeneratedCertificate) -> GeneratedCertificate {
    generate([
        CertOption::authority(authority).unwrap(),
        CertOption::common_name("www.example.com"),
        CertOption::names(["www.example.com", "127.0.0.1"]),
        CertOption::Ecdsa(certnow::key::EcdsaCurve::P256),
        CertOption::IsCa(false),
    ])
    .unwrap()
}

pub fn parse_chain(generated: &GeneratedCertificate) -> Vec<Certificate> {
    generated
        .chain
        .iter()
        .map(|der| Certificate::from_der(der).unwrap())
        .collect()
}

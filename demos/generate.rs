//! Mints a root CA, an intermediate CA and a server certificate, and writes
//! them as PEM files into the directory given as the first argument
//! (default `certs`).
//!
//! Run with `RUST_LOG=certnow=debug` to see each step.

use std::path::PathBuf;

use certnow::cert::extensions::KeyUsages;
use certnow::key::EcdsaCurve;
use certnow::write::{encode_chain_pem, write_certificate_file, write_private_key_file};
use certnow::{CertOption, GeneratedCertificate, generate};
use tracing_subscriber::EnvFilter;

fn ca(common_name: &str, authority: Option<&GeneratedCertificate>) -> anyhow::Result<GeneratedCertificate> {
    let mut options = vec![
        CertOption::common_name(common_name),
        CertOption::add_date(20, 0, 0),
        CertOption::KeyUsage(
            KeyUsages::DigitalSignature | KeyUsages::KeyCertSign | KeyUsages::CRLSign,
        ),
        CertOption::ExtKeyUsage(vec![]),
        CertOption::IsCa(true),
        CertOption::Ecdsa(EcdsaCurve::P384),
    ];
    if let Some(authority) = authority {
        options.push(CertOption::authority(authority)?);
    }
    Ok(generate(options)?)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let out_dir = PathBuf::from(std::env::args().nth(1).unwrap_or_else(|| "certs".to_string()));
    std::fs::create_dir_all(&out_dir)?;

    let root = ca("certnow Demo Root CA", None)?;
    let intermediate = ca("certnow Demo Intermediate CA", Some(&root))?;
    let server = generate([
        CertOption::authority(&intermediate)?,
        CertOption::common_name("localhost"),
        CertOption::names(["localhost", "127.0.0.1", "::1"]),
        CertOption::Ecdsa(EcdsaCurve::P256),
    ])?;

    for (name, generated) in [("root", &root), ("intermediate", &intermediate), ("server", &server)] {
        write_certificate_file(generated, out_dir.join(format!("{name}.crt")), 0o644)?;
        write_private_key_file(generated, out_dir.join(format!("{name}.key")), 0o600)?;
    }
    std::fs::write(out_dir.join("server-chain.pem"), encode_chain_pem(&server))?;

    println!("wrote certificates to {}", out_dir.display());
    Ok(())
}

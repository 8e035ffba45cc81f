//! # certnow - Ready-to-use X.509 certificates in one call
//!
//! certnow mints X.509 certificates for ephemeral and test TLS deployments.
//! A single call to [`generate()`] takes an ordered list of [`CertOption`]
//! directives, fills every gap with a sane default, signs the certificate
//! (self-signed, or with a caller-supplied authority) and returns the chain
//! together with the private key.
//!
//! ## Defaults
//!
//! - **Key**: RSA 2048 bits
//! - **Serial number**: random, below 2^63
//! - **Common name**: `Self Signed Cert ` followed by hex digits of the serial
//! - **Validity**: now until 90 days from now
//! - **Key usage**: digital signature, key encipherment
//! - **Extended key usage**: server auth, client auth
//!
//! ## Supported Key Types
//!
//! - **RSA**: any size the `rsa` crate accepts, signed with SHA-256
//! - **ECDSA**: P-256 (SHA-256), P-384 (SHA-384) and P-521 (SHA-512)
//! - **Ed25519**
//!
//! ## Quick Start
//!
//! ### A self-signed certificate
//!
//! ```rust,no_run
//! use certnow::{CertOption, generate, write};
//!
//! # fn main() -> Result<(), certnow::error::CertNowError> {
//! let cert = generate([
//!     CertOption::common_name("localhost"),
//!     CertOption::names(["localhost", "127.0.0.1", "::1"]),
//! ])?;
//!
//! println!("{}", write::encode_certificate_pem(&cert));
//! # Ok(())
//! # }
//! ```
//!
//! ### A certificate chain
//!
//! ```rust,no_run
//! use certnow::cert::extensions::KeyUsages;
//! use certnow::key::EcdsaCurve;
//! use certnow::{CertOption, generate};
//!
//! # fn main() -> Result<(), certnow::error::CertNowError> {
//! let root = generate([
//!     CertOption::common_name("Root CA"),
//!     CertOption::add_date(20, 0, 0),
//!     CertOption::KeyUsage(
//!         KeyUsages::DigitalSignature | KeyUsages::KeyCertSign | KeyUsages::CRLSign,
//!     ),
//!     CertOption::ExtKeyUsage(vec![]),
//!     CertOption::IsCa(true),
//! ])?;
//!
//! let server = generate([
//!     CertOption::authority(&root)?,
//!     CertOption::common_name("www.example.com"),
//!     CertOption::dns_names(["www.example.com"]),
//!     CertOption::Ecdsa(EcdsaCurve::P256),
//! ])?;
//!
//! // Leaf first, then the root.
//! assert_eq!(server.chain.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every failure is a [`error::CertNowError`]. The first directive that fails
//! aborts the call and no certificate is produced:
//!
//! ```rust
//! use certnow::error::CertNowError;
//! use certnow::options::AuthorityMaterial;
//! use certnow::{CertOption, generate};
//!
//! let bogus = AuthorityMaterial {
//!     chain: vec![],
//!     private_key_der: vec![],
//! };
//! match generate([CertOption::Authority(bogus)]) {
//!     Err(CertNowError::CertificateError(msg)) => println!("bad authority: {msg}"),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`options`]: The configuration directives and the pipeline applying them
//! - [`config`]: The configuration record and its defaults
//! - [`generate`](mod@generate): The entry points and chain assembly
//! - [`issuer`]: Certificate issuing, self-signed or by an authority
//! - [`key`]: Key generation, import/export, and cryptographic operations
//! - [`cert`]: Certificate model, extensions, encoding and decoding
//! - [`write`]: PEM output to writers and files, and loading it back
//! - [`error`]: Error types
//! - [`tbs_certificate`]: Low-level certificate structure manipulation

pub mod cert;
pub mod config;
pub mod error;
pub mod generate;
pub mod issuer;
pub mod key;
pub mod options;
pub mod pem_utils;
pub mod pki;
pub mod tbs_certificate;
pub mod write;

pub use generate::{GeneratedCertificate, generate, generate_with_rng};
pub use options::CertOption;

//! Configuration directives and the pipeline that applies them.
//!
//! Directives are applied strictly in order, each one seeing the effects of
//! those before it. The first directive that fails stops the pipeline and its
//! error is returned; later directives are never applied.

use std::net::IpAddr;

use bon::Builder;
use time::{Date, Duration, Month, OffsetDateTime};

use crate::cert::Certificate;
use crate::cert::extensions::{ExtendedKeyUsageOption, FlagSet, KeyUsages};
use crate::cert::params::{DistinguishedName, SerialNumber};
use crate::config::{Authority, CertificateConfig};
use crate::error::{CertNowError, Result};
use crate::generate::GeneratedCertificate;
use crate::key::{EcdsaCurve, KeyPair, KeySource};
use crate::pem_utils;

/// Certificate and key of an authority that will sign the new certificate.
#[derive(Clone, Debug, Builder)]
pub struct AuthorityMaterial {
    /// DER certificates, leaf first. The first one is the authority itself.
    pub chain: Vec<Vec<u8>>,
    /// PKCS#8 `PrivateKeyInfo` of the authority.
    pub private_key_der: Vec<u8>,
}

impl AuthorityMaterial {
    /// Reads every `CERTIFICATE` block of `chain_pem` and the first
    /// `PRIVATE KEY` block of `key_pem`.
    pub fn from_pem(chain_pem: &str, key_pem: &str) -> Result<Self> {
        let chain = pem_utils::pem_to_der_all(chain_pem, pem_utils::CERTIFICATE_LABEL)?;
        let private_key_der = pem_utils::pem_to_der_all(key_pem, pem_utils::PRIVATE_KEY_LABEL)?
            .into_iter()
            .next()
            .ok_or_else(|| CertNowError::DecodingError("no PRIVATE KEY block".to_string()))?;
        Ok(Self {
            chain,
            private_key_der,
        })
    }
}

impl TryFrom<&GeneratedCertificate> for AuthorityMaterial {
    type Error = CertNowError;

    fn try_from(generated: &GeneratedCertificate) -> Result<Self> {
        Ok(Self {
            chain: generated.chain.clone(),
            private_key_der: generated.key.to_pkcs8_der()?,
        })
    }
}

/// A single configuration directive.
#[derive(Clone, Debug)]
pub enum CertOption {
    /// Replace the whole subject name.
    Subject(DistinguishedName),
    /// Set only the subject common name.
    CommonName(String),
    SerialNumber(SerialNumber),
    NotBefore(OffsetDateTime),
    NotAfter(OffsetDateTime),
    /// Set `not_after` relative to `not_before`, fixing `not_before` to now
    /// first if it is unset.
    AddDate { years: i32, months: i32, days: i32 },
    /// Sign with this key.
    Signer(KeyPair),
    /// Generate an RSA key of this many bits.
    Rsa(usize),
    /// Generate an ECDSA key on this curve.
    Ecdsa(EcdsaCurve),
    /// Generate an Ed25519 key.
    Ed25519,
    KeyUsage(FlagSet<KeyUsages>),
    /// Replace the extended key usages. An empty list removes the extension.
    ExtKeyUsage(Vec<ExtendedKeyUsageOption>),
    DnsNamesReset(Vec<String>),
    DnsNames(Vec<String>),
    EmailAddressesReset(Vec<String>),
    EmailAddresses(Vec<String>),
    IpAddressesReset(Vec<IpAddr>),
    IpAddresses(Vec<IpAddr>),
    /// Append each entry to the IP addresses if it parses as one, to the DNS
    /// names otherwise.
    Names(Vec<String>),
    BasicConstraintsValid(bool),
    /// Set the CA flag; basic constraints become valid either way.
    IsCa(bool),
    Authority(AuthorityMaterial),
}

fn non_empty(values: Vec<String>) -> Vec<String> {
    values.into_iter().filter(|v| !v.is_empty()).collect()
}

fn strings<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(Into::into).collect()
}

impl CertOption {
    pub fn common_name(name: impl Into<String>) -> Self {
        CertOption::CommonName(name.into())
    }

    pub fn add_date(years: i32, months: i32, days: i32) -> Self {
        CertOption::AddDate {
            years,
            months,
            days,
        }
    }

    pub fn dns_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CertOption::DnsNames(strings(names))
    }

    pub fn email_addresses<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CertOption::EmailAddresses(strings(emails))
    }

    pub fn ip_addresses(ips: impl IntoIterator<Item = IpAddr>) -> Self {
        CertOption::IpAddresses(ips.into_iter().collect())
    }

    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CertOption::Names(strings(names))
    }

    /// Sign with the certificate and key of an earlier generation.
    pub fn authority(generated: &GeneratedCertificate) -> Result<Self> {
        Ok(CertOption::Authority(AuthorityMaterial::try_from(generated)?))
    }

    /// Applies this directive to `config`.
    pub fn apply(self, config: &mut CertificateConfig) -> Result<()> {
        match self {
            CertOption::Subject(name) => config.subject = Some(name),
            CertOption::CommonName(name) => {
                config.subject.get_or_insert_with(Default::default).common_name = name;
            }
            CertOption::SerialNumber(serial) => config.serial_number = Some(serial),
            CertOption::NotBefore(at) => config.not_before = Some(at),
            CertOption::NotAfter(at) => config.not_after = Some(at),
            CertOption::AddDate {
                years,
                months,
                days,
            } => {
                let not_before = *config.not_before.get_or_insert_with(OffsetDateTime::now_utc);
                config.not_after = Some(add_date(not_before, years, months, days)?);
            }
            CertOption::Signer(key) => config.key = Some(KeySource::Provided(key)),
            CertOption::Rsa(bits) => config.key = Some(KeySource::Rsa(bits)),
            CertOption::Ecdsa(curve) => config.key = Some(KeySource::Ecdsa(curve)),
            CertOption::Ed25519 => config.key = Some(KeySource::Ed25519),
            CertOption::KeyUsage(usage) => config.key_usage = usage,
            CertOption::ExtKeyUsage(usage) => config.ext_key_usage = usage,
            CertOption::DnsNamesReset(names) => config.dns_names = non_empty(names),
            CertOption::DnsNames(names) => config.dns_names.extend(non_empty(names)),
            CertOption::EmailAddressesReset(emails) => config.email_addresses = non_empty(emails),
            CertOption::EmailAddresses(emails) => config.email_addresses.extend(non_empty(emails)),
            CertOption::IpAddressesReset(ips) => config.ip_addresses = ips,
            CertOption::IpAddresses(ips) => config.ip_addresses.extend(ips),
            CertOption::Names(names) => {
                for name in non_empty(names) {
                    match name.parse::<IpAddr>() {
                        Ok(ip) => config.ip_addresses.push(ip),
                        Err(_) => config.dns_names.push(name),
                    }
                }
            }
            CertOption::BasicConstraintsValid(valid) => config.basic_constraints_valid = valid,
            CertOption::IsCa(is_ca) => {
                config.basic_constraints_valid = true;
                config.is_ca = is_ca;
            }
            CertOption::Authority(material) => config.authority = Some(load_authority(material)?),
        }
        Ok(())
    }
}

/// Applies `options` to `config` in order, stopping at the first error.
pub fn apply_options<I>(config: &mut CertificateConfig, options: I) -> Result<()>
where
    I: IntoIterator<Item = CertOption>,
{
    options
        .into_iter()
        .enumerate()
        .try_for_each(|(index, option)| {
            option.apply(config).inspect_err(|err| {
                tracing::debug!(index, error = %err, "certificate option rejected");
            })
        })
}

fn load_authority(material: AuthorityMaterial) -> Result<Authority> {
    let leaf = material
        .chain
        .first()
        .ok_or_else(|| CertNowError::CertificateError("authority chain is empty".to_string()))?;
    let certificate = Certificate::from_der(leaf)?;

    let key = KeyPair::from_pkcs8_der(&material.private_key_der).map_err(|err| {
        tracing::warn!(error = %err, "authority private key rejected");
        CertNowError::InvalidAuthorityKey(err.to_string())
    })?;
    if key.public_key() != certificate.public_key()? {
        tracing::warn!(
            authority = %certificate.inner.tbs_certificate.subject,
            "authority private key does not match its certificate"
        );
        return Err(CertNowError::InvalidAuthorityKey(
            "private key does not match the authority certificate".to_string(),
        ));
    }

    Ok(Authority {
        certificate,
        key,
        chain: material.chain,
    })
}

/// Calendar arithmetic with normalisation: months past December roll into
/// the next year and days past the end of the month roll into the next
/// month, so January 31 plus one month is March 3 (March 2 in leap years).
/// The time of day and offset are preserved.
pub fn add_date(at: OffsetDateTime, years: i32, months: i32, days: i32) -> Result<OffsetDateTime> {
    let overflow = || CertNowError::InvalidInput(format!("{at} + {years}y{months}m{days}d is out of range"));

    let month_index = i64::from(at.year()) * 12
        + i64::from(u8::from(at.month()) - 1)
        + i64::from(years) * 12
        + i64::from(months);
    let year = i32::try_from(month_index.div_euclid(12)).map_err(|_| overflow())?;
    let month = u8::try_from(month_index.rem_euclid(12) + 1)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .ok_or_else(overflow)?;

    let first_of_month = Date::from_calendar_date(year, month, 1).map_err(|_| overflow())?;
    let offset_days = i64::from(at.day()) - 1 + i64::from(days);
    let date = first_of_month
        .checked_add(Duration::days(offset_days))
        .ok_or_else(overflow)?;

    Ok(at.replace_date(date))
}

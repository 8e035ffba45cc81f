//! The per-call configuration record and the defaults that complete it.
//!
//! A [`CertificateConfig`] starts out sparse, is mutated by the option
//! pipeline in [`crate::options`], and is then turned into a
//! [`ResolvedConfig`] in which every field the certificate needs has a value.

use std::net::IpAddr;

use rand_core::CryptoRngCore;
use time::{Duration, OffsetDateTime};

use crate::cert::Certificate;
use crate::cert::extensions::{ExtendedKeyUsageOption, FlagSet, KeyUsages};
use crate::cert::params::{DistinguishedName, SerialNumber};
use crate::error::{CertNowError, Result};
use crate::key::{KeyPair, KeySource};

/// Validity length used when `not_after` is not configured.
pub const DEFAULT_VALIDITY_DAYS: i64 = 90;

/// Prefix of the common name derived from the serial number.
pub const DEFAULT_COMMON_NAME_PREFIX: &str = "Self Signed Cert ";

/// A parsed authority able to sign new certificates.
#[derive(Clone, Debug)]
pub struct Authority {
    pub certificate: Certificate,
    pub key: KeyPair,
    /// The authority's own chain, leaf first, starting with `certificate`.
    pub chain: Vec<Vec<u8>>,
}

/// Configuration record for a single generation call.
#[derive(Clone, Debug)]
pub struct CertificateConfig {
    pub subject: Option<DistinguishedName>,
    pub serial_number: Option<SerialNumber>,
    pub key: Option<KeySource>,
    pub not_before: Option<OffsetDateTime>,
    pub not_after: Option<OffsetDateTime>,
    pub key_usage: FlagSet<KeyUsages>,
    /// An empty list means the certificate carries no extended key usage.
    pub ext_key_usage: Vec<ExtendedKeyUsageOption>,
    pub basic_constraints_valid: bool,
    pub is_ca: bool,
    pub dns_names: Vec<String>,
    pub email_addresses: Vec<String>,
    pub ip_addresses: Vec<IpAddr>,
    pub authority: Option<Authority>,
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            subject: None,
            serial_number: None,
            key: None,
            not_before: None,
            not_after: None,
            key_usage: KeyUsages::DigitalSignature | KeyUsages::KeyEncipherment,
            ext_key_usage: vec![
                ExtendedKeyUsageOption::ServerAuth,
                ExtendedKeyUsageOption::ClientAuth,
            ],
            basic_constraints_valid: false,
            is_ca: false,
            dns_names: Vec::new(),
            email_addresses: Vec::new(),
            ip_addresses: Vec::new(),
            authority: None,
        }
    }
}

/// A configuration with every default applied and the key materialised.
#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub subject: DistinguishedName,
    pub serial_number: SerialNumber,
    pub key: KeyPair,
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
    pub key_usage: FlagSet<KeyUsages>,
    pub ext_key_usage: Vec<ExtendedKeyUsageOption>,
    pub basic_constraints_valid: bool,
    pub is_ca: bool,
    pub dns_names: Vec<String>,
    pub email_addresses: Vec<String>,
    pub ip_addresses: Vec<IpAddr>,
    pub authority: Option<Authority>,
}

/// Draws a serial uniformly from `[0, 2^63)`.
pub fn random_serial_number<R: CryptoRngCore>(rng: &mut R) -> SerialNumber {
    SerialNumber::from(rng.next_u64() & i64::MAX as u64)
}

/// `"Self Signed Cert "` followed by the hex of the serial's first three
/// big-endian bytes (fewer if the serial is shorter).
pub fn default_common_name(serial: &SerialNumber) -> String {
    let bytes = serial.as_be_bytes();
    let prefix = &bytes[..bytes.len().min(3)];
    format!("{DEFAULT_COMMON_NAME_PREFIX}{}", hex::encode(prefix))
}

fn truncate_to_seconds(at: OffsetDateTime) -> OffsetDateTime {
    at - Duration::nanoseconds(i64::from(at.nanosecond()))
}

impl CertificateConfig {
    /// Fills every unset field, in order: serial number, common name, key,
    /// `not_before`, `not_after`. The common name default depends on the
    /// serial and `not_after` on `not_before`.
    pub fn resolve<R: CryptoRngCore>(self, rng: &mut R) -> Result<ResolvedConfig> {
        let serial_number = match self.serial_number {
            Some(serial) => serial,
            None => random_serial_number(rng),
        };

        let mut subject = self.subject.unwrap_or_default();
        if subject.common_name.is_empty() {
            subject.common_name = default_common_name(&serial_number);
        }

        let key = self.key.unwrap_or_default().into_key_pair(rng)?;

        // Certificates carry whole seconds; compare what will be encoded.
        let not_before = truncate_to_seconds(self.not_before.unwrap_or_else(OffsetDateTime::now_utc));
        let not_after = match self.not_after {
            Some(not_after) => truncate_to_seconds(not_after),
            None => not_before
                .checked_add(Duration::days(DEFAULT_VALIDITY_DAYS))
                .ok_or_else(|| {
                    CertNowError::InvalidInput(format!(
                        "notBefore {not_before} + {DEFAULT_VALIDITY_DAYS} days is out of range"
                    ))
                })?,
        };
        if not_after <= not_before {
            return Err(CertNowError::InvalidInput(format!(
                "notAfter {not_after} is not after notBefore {not_before}"
            )));
        }

        tracing::debug!(
            common_name = %subject.common_name,
            serial = %hex::encode(serial_number.as_be_bytes()),
            %not_before,
            %not_after,
            "resolved certificate configuration"
        );

        Ok(ResolvedConfig {
            subject,
            serial_number,
            key,
            not_before,
            not_after,
            key_usage: self.key_usage,
            ext_key_usage: self.ext_key_usage,
            basic_constraints_valid: self.basic_constraints_valid,
            is_ca: self.is_ca,
            dns_names: self.dns_names,
            email_addresses: self.email_addresses,
            ip_addresses: self.ip_addresses,
            authority: self.authority,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use rand_core::{CryptoRng, RngCore, impls};

    use super::*;
    use crate::key::EcdsaCurve;

    /// Yields the same word forever; enough to make serial and Ed25519 key
    /// generation reproducible.
    pub(crate) struct FixedRng(pub u64);

    impl RngCore for FixedRng {
        fn next_u32(&mut self) -> u32 {
            self.0 as u32
        }

        fn next_u64(&mut self) -> u64 {
            self.0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            impls::fill_bytes_via_next(self, dest)
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand_core::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    impl CryptoRng for FixedRng {}

    fn ed25519_config() -> CertificateConfig {
        CertificateConfig {
            key: Some(KeySource::Ed25519),
            ..Default::default()
        }
    }

    #[test]
    fn test_random_serial_stays_below_2_pow_63() {
        let serial = random_serial_number(&mut FixedRng(u64::MAX));
        assert_eq!(serial, SerialNumber::from(i64::MAX as u64));
    }

    #[test]
    fn test_default_common_name_from_injected_rng() {
        let resolved = ed25519_config()
            .resolve(&mut FixedRng(0x8123_4567_89ab_cdef))
            .unwrap();
        assert_eq!(resolved.serial_number, SerialNumber::from(0x0123_4567_89ab_cdefu64));
        assert_eq!(resolved.subject.common_name, "Self Signed Cert 012345");
    }

    #[test]
    fn test_default_common_name_for_short_serials() {
        assert_eq!(
            default_common_name(&SerialNumber::from(0xabcdu64)),
            "Self Signed Cert abcd"
        );
        assert_eq!(default_common_name(&SerialNumber::from(0u64)), "Self Signed Cert ");
    }

    #[test]
    fn test_common_name_default_keeps_other_attributes() {
        let config = CertificateConfig {
            subject: Some(DistinguishedName::builder().organization("Acme").build()),
            serial_number: Some(SerialNumber::from(0x0a0b0c0du64)),
            ..ed25519_config()
        };
        let resolved = config.resolve(&mut rand_core::OsRng).unwrap();
        assert_eq!(resolved.subject.common_name, "Self Signed Cert 0a0b0c");
        assert_eq!(resolved.subject.organization.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_validity_defaults_to_ninety_days() {
        let not_before = time::macros::datetime!(2030-01-01 00:00:00 UTC);
        let config = CertificateConfig {
            not_before: Some(not_before),
            ..ed25519_config()
        };
        let resolved = config.resolve(&mut rand_core::OsRng).unwrap();
        assert_eq!(resolved.not_after, not_before + Duration::days(90));
    }

    #[test]
    fn test_rejects_inverted_validity() {
        let not_before = time::macros::datetime!(2030-01-01 00:00:00 UTC);
        let config = CertificateConfig {
            not_before: Some(not_before),
            not_after: Some(not_before - Duration::days(1)),
            ..ed25519_config()
        };
        assert!(matches!(
            config.resolve(&mut rand_core::OsRng),
            Err(CertNowError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_default_not_after_out_of_range_is_an_error() {
        let config = CertificateConfig {
            not_before: Some(time::macros::datetime!(9999-12-01 00:00:00 UTC)),
            ..ed25519_config()
        };
        assert!(matches!(
            config.resolve(&mut rand_core::OsRng),
            Err(CertNowError::InvalidInput(_))
        ));

        let config = CertificateConfig {
            not_before: Some(time::macros::datetime!(9999-12-01 00:00:00 UTC)),
            not_after: Some(time::macros::datetime!(9999-12-31 00:00:00 UTC)),
            ..ed25519_config()
        };
        assert!(config.resolve(&mut rand_core::OsRng).is_ok());
    }

    #[test]
    fn test_validity_within_one_second_is_rejected() {
        let config = CertificateConfig {
            not_before: Some(time::macros::datetime!(2030-01-01 00:00:00.100 UTC)),
            not_after: Some(time::macros::datetime!(2030-01-01 00:00:00.900 UTC)),
            ..ed25519_config()
        };
        assert!(matches!(
            config.resolve(&mut rand_core::OsRng),
            Err(CertNowError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_validity_is_truncated_to_seconds() {
        let config = CertificateConfig {
            not_before: Some(time::macros::datetime!(2030-01-01 00:00:00.100 UTC)),
            not_after: Some(time::macros::datetime!(2030-01-01 00:00:01.900 UTC)),
            ..ed25519_config()
        };
        let resolved = config.resolve(&mut rand_core::OsRng).unwrap();
        assert_eq!(resolved.not_before, time::macros::datetime!(2030-01-01 00:00:00 UTC));
        assert_eq!(resolved.not_after, time::macros::datetime!(2030-01-01 00:00:01 UTC));
    }

    #[test]
    fn test_key_is_generated_only_at_resolution() {
        let config = CertificateConfig {
            key: Some(KeySource::Ecdsa(EcdsaCurve::P384)),
            ..Default::default()
        };
        let resolved = config.resolve(&mut rand_core::OsRng).unwrap();
        assert!(matches!(resolved.key, KeyPair::EcdsaP384 { .. }));
    }

    #[test]
    fn test_default_key_is_rsa_2048() {
        use rsa::traits::PublicKeyParts;

        let resolved = CertificateConfig::default()
            .resolve(&mut rand_core::OsRng)
            .unwrap();
        let KeyPair::Rsa { public, .. } = &resolved.key else {
            panic!("expected an RSA key, got {:?}", resolved.key);
        };
        assert_eq!(public.size() * 8, 2048);
    }
}

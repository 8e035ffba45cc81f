use std::time::Duration;

use der::Encode;
use der::asn1::{GeneralizedTime, OctetString, UtcTime};
use der::DateTime;
use time::OffsetDateTime;
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::name::Name;
use x509_cert::time::Time;

use crate::cert::SignatureAlgorithm;
use crate::cert::params::{ExtensionParam, SerialNumber, Validity};
use crate::error::{CertNowError, Result};
use crate::key::PublicKey;

/// Represents the "To Be Signed" (TBS) portion of an X.509 certificate.
/// This struct contains all the fields required to generate a valid X.509 certificate.
///
/// # Fields
/// * `serial_number` - The unique identifier for the certificate.
/// * `signature_algorithm` - The algorithm the issuer signs with.
/// * `issuer` - The encoded name of the certificate issuer.
/// * `validity` - The `notBefore`/`notAfter` window.
/// * `subject` - The encoded name of the certificate subject.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `extensions` - X.509 v3 extensions, in encoding order.
pub struct TbsCertificate {
    pub serial_number: SerialNumber,
    pub signature_algorithm: SignatureAlgorithm,
    pub issuer: Name,
    pub validity: Validity,
    pub subject: Name,
    pub subject_public_key: PublicKey,
    pub extensions: Vec<ExtensionParam>,
}

impl TbsCertificate {
    /// Converts the `TbsCertificate` into a `TbsCertificateInner` for DER encoding.
    pub fn to_tbs_certificate_inner(&self) -> Result<TbsCertificateInner> {
        let extensions = self
            .extensions
            .iter()
            .map(|ext| -> Result<x509_cert::ext::Extension> {
                Ok(x509_cert::ext::Extension {
                    extn_id: ext.oid,
                    critical: ext.critical,
                    extn_value: OctetString::new(ext.value.clone())?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let validity = x509_cert::time::Validity {
            not_before: to_x509_time(self.validity.not_before)?,
            not_after: to_x509_time(self.validity.not_after)?,
        };

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number: self.serial_number.to_x509()?,
            signature: self.signature_algorithm.into(),
            issuer: self.issuer.clone(),
            validity,
            subject: self.subject.clone(),
            subject_public_key_info: self.subject_public_key.to_spki()?,
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: (!extensions.is_empty()).then_some(extensions),
        })
    }

    /// Encodes the `TbsCertificate` into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self.to_tbs_certificate_inner()?.to_der()?)
    }
}

/// Encodes a timestamp the way RFC 5280 section 4.1.2.5 requires: UTCTime
/// through 2049, GeneralizedTime from 2050 on. Sub-second precision is
/// dropped.
pub fn to_x509_time(at: OffsetDateTime) -> Result<Time> {
    let secs = u64::try_from(at.unix_timestamp()).map_err(|_| {
        CertNowError::InvalidInput(format!("{at} predates the Unix epoch"))
    })?;
    let datetime = DateTime::from_unix_duration(Duration::from_secs(secs))?;
    if datetime.year() < 2050 {
        Ok(Time::UtcTime(UtcTime::from_date_time(datetime)?))
    } else {
        Ok(Time::GeneralTime(GeneralizedTime::from_date_time(datetime)))
    }
}

pub fn from_x509_time(time: &Time) -> OffsetDateTime {
    OffsetDateTime::from(time.to_system_time())
}

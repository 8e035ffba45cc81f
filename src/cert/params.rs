use bon::Builder;
use const_oid::ObjectIdentifier;
use der::asn1::{Any, Ia5String, PrintableString, PrintableStringRef, SetOfVec, Utf8StringRef};
use time::OffsetDateTime;
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{RdnSequence, RelativeDistinguishedName};

use super::extensions::ToAndFromX509Extension;
pub use crate::cert::extensions::ExtendedKeyUsageOption;
use crate::error::{CertNowError, Result};

/// Distinguished name parameters for building an X.509 certificate.
///
/// This struct represents the subject or issuer name in a certificate.
/// Empty attributes are left out of the encoded name.
///
/// # Fields
/// * `common_name` - The common name (CN).
/// * `country` - The country (C).
/// * `state` - The state or province (ST).
/// * `locality` - The locality or city (L).
/// * `organization` - The organization (O).
/// * `organization_unit` - The organizational unit (OU).
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    #[builder(default, into)]
    pub common_name: String,
    #[builder(into)]
    pub country: Option<String>,
    #[builder(into)]
    pub state: Option<String>,
    #[builder(into)]
    pub locality: Option<String>,
    #[builder(into)]
    pub organization: Option<String>,
    #[builder(into)]
    pub organization_unit: Option<String>,
}

impl DistinguishedName {
    /// A name holding only a common name.
    pub fn from_common_name(common_name: impl Into<String>) -> Self {
        Self {
            common_name: common_name.into(),
            ..Default::default()
        }
    }

    /// True when no attribute is set, which X.509 encodes as an empty name.
    pub fn is_empty(&self) -> bool {
        self.attributes().next().is_none()
    }

    fn attributes(&self) -> impl Iterator<Item = (ObjectIdentifier, &str)> {
        use const_oid::db::rfc4519;

        [
            (rfc4519::C, self.country.as_deref()),
            (rfc4519::ST, self.state.as_deref()),
            (rfc4519::L, self.locality.as_deref()),
            (rfc4519::O, self.organization.as_deref()),
            (rfc4519::OU, self.organization_unit.as_deref()),
            (rfc4519::CN, Some(self.common_name.as_str())),
        ]
        .into_iter()
        .filter_map(|(oid, value)| value.filter(|v| !v.is_empty()).map(|v| (oid, v)))
    }

    /// Converts the distinguished name to an X.509-compatible format.
    ///
    /// Each attribute becomes its own RDN. Values are PrintableString when
    /// they fit that alphabet, UTF8String otherwise.
    pub fn as_x509_name(&self) -> Result<x509_cert::name::DistinguishedName> {
        let mut rdns = Vec::new();
        for (oid, value) in self.attributes() {
            let value = match PrintableStringRef::new(value) {
                Ok(printable) => Any::encode_from(&printable)?,
                Err(_) => Any::encode_from(&Utf8StringRef::new(value)?)?,
            };
            let set = SetOfVec::try_from(vec![AttributeTypeAndValue { oid, value }])?;
            rdns.push(RelativeDistinguishedName(set));
        }
        Ok(RdnSequence(rdns))
    }

    /// Creates a `DistinguishedName` from an X.509-compatible format.
    ///
    /// Attributes other than C, ST, L, O, OU and CN are ignored, as are
    /// values in string types other than UTF8String, PrintableString and
    /// IA5String.
    pub fn from_x509_name(x509dn: &x509_cert::name::DistinguishedName) -> Self {
        use const_oid::db::rfc4519;

        let mut name = DistinguishedName::default();
        for rdn in x509dn.0.iter() {
            for attr in rdn.0.iter() {
                let Some(value) = attribute_text(&attr.value) else {
                    continue;
                };
                match attr.oid {
                    rfc4519::CN => name.common_name = value,
                    rfc4519::C => name.country = Some(value),
                    rfc4519::ST => name.state = Some(value),
                    rfc4519::L => name.locality = Some(value),
                    rfc4519::O => name.organization = Some(value),
                    rfc4519::OU => name.organization_unit = Some(value),
                    _ => {}
                }
            }
        }
        name
    }
}

fn attribute_text(value: &Any) -> Option<String> {
    if let Ok(s) = value.decode_as::<String>() {
        return Some(s);
    }
    if let Ok(s) = value.decode_as::<PrintableString>() {
        return Some(s.to_string());
    }
    value.decode_as::<Ia5String>().ok().map(|s| s.to_string())
}

/// A certificate serial number: a non-negative integer of at most 20 octets.
///
/// Stored as minimal big-endian bytes, so zero is the empty sequence.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SerialNumber(Vec<u8>);

impl SerialNumber {
    pub const MAX_LEN: usize = 20;

    /// Interprets `bytes` as an unsigned big-endian integer.
    pub fn from_be_bytes(bytes: &[u8]) -> Result<Self> {
        let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        let minimal = &bytes[start..];
        if minimal.len() > Self::MAX_LEN {
            return Err(CertNowError::InvalidInput(format!(
                "serial number of {} octets exceeds {}",
                minimal.len(),
                Self::MAX_LEN
            )));
        }
        Ok(Self(minimal.to_vec()))
    }

    /// Minimal big-endian bytes, empty for zero.
    pub fn as_be_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_x509(&self) -> Result<x509_cert::serial_number::SerialNumber> {
        let bytes: &[u8] = if self.0.is_empty() { &[0] } else { &self.0 };
        Ok(x509_cert::serial_number::SerialNumber::new(bytes)?)
    }

    pub fn from_x509(serial: &x509_cert::serial_number::SerialNumber) -> Result<Self> {
        Self::from_be_bytes(serial.as_bytes())
    }
}

impl From<u64> for SerialNumber {
    fn from(value: u64) -> Self {
        let bytes = value.to_be_bytes();
        let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        Self(bytes[start..].to_vec())
    }
}

/// Certificate validity period.
///
/// This struct represents the `notBefore` and `notAfter` fields in a certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

/// Represents an X.509 extension.
///
/// This struct contains the OID, criticality, and value of an extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    pub fn from_extension<E: ToAndFromX509Extension>(extension: E, critical: bool) -> Result<Self> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E> {
        E::from_x509_extension_value(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_number_is_minimal_big_endian() {
        assert_eq!(SerialNumber::from(0x0102_0304u64).as_be_bytes(), &[1, 2, 3, 4]);
        assert!(SerialNumber::from(0u64).as_be_bytes().is_empty());
        assert_eq!(
            SerialNumber::from_be_bytes(&[0, 0, 0xab]).unwrap(),
            SerialNumber::from(0xabu64)
        );
        assert!(SerialNumber::from_be_bytes(&[1; 21]).is_err());
    }

    #[test]
    fn test_serial_number_x509_roundtrip() {
        for serial in [SerialNumber::from(0u64), SerialNumber::from(u64::MAX)] {
            let x509 = serial.to_x509().unwrap();
            assert_eq!(SerialNumber::from_x509(&x509).unwrap(), serial);
        }
    }

    #[test]
    fn test_distinguished_name_x509_roundtrip() {
        let dn = DistinguishedName::builder()
            .common_name("Example CA")
            .organization("Example Corp")
            .country("US")
            .build();
        let decoded = DistinguishedName::from_x509_name(&dn.as_x509_name().unwrap());
        assert_eq!(dn, decoded);
    }

    #[test]
    fn test_empty_attributes_are_omitted() {
        let dn = DistinguishedName::from_common_name("only.cn");
        let name = dn.as_x509_name().unwrap();
        assert_eq!(name.0.len(), 1);
        assert_eq!(name.to_string(), "CN=only.cn");
        assert!(DistinguishedName::default().is_empty());
    }

    #[test]
    fn test_non_printable_values_use_utf8() {
        let dn = DistinguishedName::from_common_name("Zürich CA");
        let decoded = DistinguishedName::from_x509_name(&dn.as_x509_name().unwrap());
        assert_eq!(decoded.common_name, "Zürich CA");
    }
}

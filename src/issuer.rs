use der::Encode;
use der::asn1::BitString;
use rand_core::CryptoRngCore;
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;

use crate::cert::Certificate;
use crate::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, KeyUsage, SubjectAltName,
    SubjectKeyIdentifier,
};
use crate::cert::params::{ExtensionParam, Validity};
use crate::config::{Authority, ResolvedConfig};
use crate::error::{CertNowError, Result};
use crate::key::KeyPair;
use crate::tbs_certificate::TbsCertificate;

/// Represents an entity capable of issuing certificates.
///
/// This trait provides methods to retrieve issuer details and issue certificates.
pub trait Issuer {
    /// Returns the encoded name placed in the issued certificate's issuer
    /// field.
    fn issuer_name(&self) -> &Name;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Returns the key identifier for the authority key identifier
    /// extension, or `None` when no such extension is written.
    fn authority_key_identifier(&self) -> Result<Option<Vec<u8>>>;

    /// Issues a certificate for `config`.
    ///
    /// Extensions are written in this order: key usage, extended key usage,
    /// basic constraints, subject key identifier, authority key identifier,
    /// subject alternative name.
    fn issue<R: CryptoRngCore>(&self, config: &ResolvedConfig, rng: &mut R) -> Result<Certificate> {
        let subject = config.subject.as_x509_name()?;
        let subject_public_key = config.key.public_key();

        let mut extensions = Vec::new();

        if !config.key_usage.is_empty() {
            extensions.push(ExtensionParam::from_extension(KeyUsage(config.key_usage), true)?);
        }

        if !config.ext_key_usage.is_empty() {
            let extended_key_usage = ExtendedKeyUsage {
                usage: config.ext_key_usage.clone(),
            };
            extensions.push(ExtensionParam::from_extension(extended_key_usage, false)?);
        }

        if config.basic_constraints_valid {
            let basic_constraints = BasicConstraints {
                is_ca: config.is_ca,
                max_path_length: None,
            };
            extensions.push(ExtensionParam::from_extension(basic_constraints, true)?);
        }

        let subject_key_id = SubjectKeyIdentifier {
            key_identifier: subject_public_key.key_identifier()?,
        };
        extensions.push(ExtensionParam::from_extension(subject_key_id, false)?);

        if let Some(key_identifier) = self.authority_key_identifier()? {
            let authority_key_id = AuthorityKeyIdentifier { key_identifier };
            extensions.push(ExtensionParam::from_extension(authority_key_id, false)?);
        }

        let subject_alt_name = SubjectAltName {
            dns_names: config.dns_names.clone(),
            email_addresses: config.email_addresses.clone(),
            ip_addresses: config.ip_addresses.clone(),
        };
        if !subject_alt_name.is_empty() {
            // RFC 5280 4.2.1.6: critical when the subject name is empty
            let critical = subject.0.is_empty();
            extensions.push(ExtensionParam::from_extension(subject_alt_name, critical)?);
        }

        let signing_key = self.signing_key();
        let signature_algorithm = signing_key.signature_algorithm();

        let tbs_cert = TbsCertificate {
            serial_number: config.serial_number.clone(),
            signature_algorithm,
            issuer: self.issuer_name().clone(),
            validity: Validity {
                not_before: config.not_before,
                not_after: config.not_after,
            },
            subject,
            subject_public_key,
            extensions,
        };

        let tbs_cert_inner = tbs_cert.to_tbs_certificate_inner()?;
        let signature = signing_key.sign_data(rng, &tbs_cert_inner.to_der()?)?;

        let cert_inner = CertificateInner {
            tbs_certificate: tbs_cert_inner,
            signature_algorithm: signature_algorithm.into(),
            signature: BitString::from_bytes(&signature)
                .map_err(|e| CertNowError::SigningError(e.to_string()))?,
        };

        Ok(Certificate { inner: cert_inner })
    }
}

/// Issuer for self-signed certificates: the subject names itself and signs
/// with its own key.
pub struct SelfIssuer<'a> {
    name: Name,
    key: &'a KeyPair,
}

impl<'a> SelfIssuer<'a> {
    pub fn new(config: &'a ResolvedConfig) -> Result<Self> {
        Ok(Self {
            name: config.subject.as_x509_name()?,
            key: &config.key,
        })
    }
}

impl Issuer for SelfIssuer<'_> {
    fn issuer_name(&self) -> &Name {
        &self.name
    }

    fn signing_key(&self) -> &KeyPair {
        self.key
    }

    fn authority_key_identifier(&self) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
}

impl Issuer for Authority {
    /// The authority certificate's subject, exactly as encoded there.
    fn issuer_name(&self) -> &Name {
        &self.certificate.inner.tbs_certificate.subject
    }

    fn signing_key(&self) -> &KeyPair {
        &self.key
    }

    fn authority_key_identifier(&self) -> Result<Option<Vec<u8>>> {
        Ok(Some(self.key.public_key().key_identifier()?))
    }
}

#[cfg(test)]
mod tests {
    use der::asn1::SetOfVec;
    use x509_cert::attr::AttributeTypeAndValue;
    use x509_cert::name::{RdnSequence, RelativeDistinguishedName};

    use super::*;
    use crate::cert::extensions::ToAndFromX509Extension;
    use crate::cert::params::DistinguishedName;
    use crate::config::CertificateConfig;
    use crate::key::{EcdsaCurve, KeySource};

    fn resolved(config: CertificateConfig) -> ResolvedConfig {
        config.resolve(&mut rand_core::OsRng).unwrap()
    }

    fn ecdsa_config() -> CertificateConfig {
        CertificateConfig {
            key: Some(KeySource::Ecdsa(EcdsaCurve::P256)),
            ..Default::default()
        }
    }

    fn oids(cert: &Certificate) -> Vec<der::oid::ObjectIdentifier> {
        cert.extensions().iter().map(|ext| ext.oid).collect()
    }

    #[test]
    fn test_self_issued_default_extensions() {
        let config = resolved(ecdsa_config());
        let cert = SelfIssuer::new(&config)
            .unwrap()
            .issue(&config, &mut rand_core::OsRng)
            .unwrap();

        assert!(cert.is_self_issued());
        assert_eq!(
            oids(&cert),
            vec![
                <KeyUsage as ToAndFromX509Extension>::OID,
                <ExtendedKeyUsage as ToAndFromX509Extension>::OID,
                <SubjectKeyIdentifier as ToAndFromX509Extension>::OID,
            ]
        );
        let extensions = cert.extensions();
        assert!(extensions[0].critical);
        assert!(!extensions[1].critical);
        assert!(cert.extension::<AuthorityKeyIdentifier>().unwrap().is_none());
        cert.verify_signed_by(&config.key.public_key()).unwrap();
    }

    #[test]
    fn test_full_extension_order() {
        let config = resolved(CertificateConfig {
            basic_constraints_valid: true,
            is_ca: true,
            dns_names: vec!["example.com".to_string()],
            ..ecdsa_config()
        });
        let root_config = resolved(CertificateConfig {
            basic_constraints_valid: true,
            is_ca: true,
            ..ecdsa_config()
        });
        let root = SelfIssuer::new(&root_config)
            .unwrap()
            .issue(&root_config, &mut rand_core::OsRng)
            .unwrap();
        let authority = Authority {
            chain: vec![root.to_der().unwrap()],
            certificate: root,
            key: root_config.key.clone(),
        };

        let cert = authority.issue(&config, &mut rand_core::OsRng).unwrap();
        assert_eq!(
            oids(&cert),
            vec![
                <KeyUsage as ToAndFromX509Extension>::OID,
                <ExtendedKeyUsage as ToAndFromX509Extension>::OID,
                <BasicConstraints as ToAndFromX509Extension>::OID,
                <SubjectKeyIdentifier as ToAndFromX509Extension>::OID,
                <AuthorityKeyIdentifier as ToAndFromX509Extension>::OID,
                <SubjectAltName as ToAndFromX509Extension>::OID,
            ]
        );
        let akid = cert.extension::<AuthorityKeyIdentifier>().unwrap().unwrap();
        let root_skid = authority
            .certificate
            .extension::<SubjectKeyIdentifier>()
            .unwrap()
            .unwrap();
        assert_eq!(akid.key_identifier, root_skid.key_identifier);
        cert.verify_issued_by(&authority.certificate).unwrap();
    }

    #[test]
    fn test_empty_usages_are_omitted() {
        let config = resolved(CertificateConfig {
            key_usage: Default::default(),
            ext_key_usage: vec![],
            ..ecdsa_config()
        });
        let cert = SelfIssuer::new(&config)
            .unwrap()
            .issue(&config, &mut rand_core::OsRng)
            .unwrap();
        assert_eq!(
            oids(&cert),
            vec![<SubjectKeyIdentifier as ToAndFromX509Extension>::OID]
        );
    }

    #[test]
    fn test_issuer_name_is_copied_byte_for_byte() {
        // A UTF8String CN that this crate would itself encode as PrintableString.
        let value = der::asn1::Any::encode_from(&der::asn1::Utf8StringRef::new("Legacy Root").unwrap())
            .unwrap();
        let set = SetOfVec::try_from(vec![AttributeTypeAndValue {
            oid: const_oid::db::rfc4519::CN,
            value,
        }])
        .unwrap();
        let legacy_name = RdnSequence(vec![RelativeDistinguishedName(set)]);

        let root_config = resolved(ecdsa_config());
        let mut root = SelfIssuer::new(&root_config)
            .unwrap()
            .issue(&root_config, &mut rand_core::OsRng)
            .unwrap();
        root.inner.tbs_certificate.subject = legacy_name.clone();
        let authority = Authority {
            chain: vec![],
            certificate: root,
            key: root_config.key.clone(),
        };

        let config = resolved(CertificateConfig {
            subject: Some(DistinguishedName::from_common_name("leaf")),
            ..ecdsa_config()
        });
        let cert = authority.issue(&config, &mut rand_core::OsRng).unwrap();
        assert_eq!(cert.inner.tbs_certificate.issuer, legacy_name);
        assert_eq!(
            cert.inner.tbs_certificate.issuer.to_der().unwrap(),
            legacy_name.to_der().unwrap()
        );
    }
}

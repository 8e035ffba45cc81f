mod util;

use certnow::key::EcdsaCurve;
use certnow::write::{encode_chain_pem, encode_private_key_pem};
use certnow::{CertOption, GeneratedCertificate, generate};
use openssl::nid::Nid;
use openssl::pkey::PKey;
use openssl::stack::Stack;
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::{X509, X509StoreContext};

fn to_x509(der: &[u8]) -> X509 {
    X509::from_der(der).expect("OpenSSL rejected the certificate")
}

/// Verifies `leaf` against a store trusting only the last certificate of its
/// chain.
fn openssl_verify(leaf: &GeneratedCertificate) -> bool {
    let certs: Vec<X509> = leaf.chain.iter().map(|der| to_x509(der)).collect();
    let (root, rest) = certs.split_last().unwrap();

    let mut store = X509StoreBuilder::new().unwrap();
    store.add_cert(root.clone()).unwrap();
    let store = store.build();

    let mut untrusted = Stack::new().unwrap();
    for cert in rest.iter().skip(1) {
        untrusted.push(cert.clone()).unwrap();
    }

    let mut context = X509StoreContext::new().unwrap();
    context
        .init(&store, &certs[0], &untrusted, |c| {
            let ok = c.verify_cert()?;
            if !ok {
                eprintln!("OpenSSL verification error: {}", c.error());
            }
            Ok(ok)
        })
        .unwrap()
}

fn common_name(name: &openssl::x509::X509NameRef) -> String {
    let bytes = name
        .entries_by_nid(Nid::COMMONNAME)
        .next()
        .unwrap()
        .data()
        .as_slice()
        .to_vec();
    String::from_utf8(bytes).unwrap()
}

#[test]
fn test_openssl_verifies_chain() {
    let root = util::generate_root_ca();
    let intermediate = util::generate_intermediate_ca(&root);
    let leaf = util::generate_server_cert(&intermediate);

    assert!(openssl_verify(&leaf));
    assert!(openssl_verify(&intermediate));
}

#[test]
fn test_openssl_reads_fields() {
    let root = util::generate_root_ca();
    let leaf = util::generate_server_cert(&root);
    let x509 = to_x509(leaf.leaf());

    assert_eq!(common_name(x509.subject_name()), "www.example.com");
    assert_eq!(common_name(x509.issuer_name()), "My Root CA");
    assert_eq!(x509.version(), 2, "X509 version should be 3 (0-based index)");
    assert_eq!(
        x509.signature_algorithm().object().nid(),
        Nid::ECDSA_WITH_SHA256
    );

    let serial = x509.serial_number().to_bn().unwrap();
    assert!(!serial.is_negative());
    assert!(serial.num_bits() <= 63);

    let sans = x509.subject_alt_names().unwrap();
    let dns: Vec<&str> = sans.iter().filter_map(|name| name.dnsname()).collect();
    let ips: Vec<&[u8]> = sans.iter().filter_map(|name| name.ipaddress()).collect();
    assert_eq!(dns, vec!["www.example.com"]);
    assert_eq!(ips, vec![&[127u8, 0, 0, 1][..]]);

    let root_x509 = to_x509(root.leaf());
    assert!(x509.verify(&root_x509.public_key().unwrap()).unwrap());
    assert_eq!(
        x509.authority_key_id().unwrap().as_slice(),
        root_x509.subject_key_id().unwrap().as_slice()
    );
}

#[test]
fn test_openssl_accepts_every_key_type() {
    let keys = [
        CertOption::Rsa(2048),
        CertOption::Ecdsa(EcdsaCurve::P256),
        CertOption::Ecdsa(EcdsaCurve::P384),
        CertOption::Ecdsa(EcdsaCurve::P521),
        CertOption::Ed25519,
    ];
    for key in keys {
        let generated = generate([key]).unwrap();
        let x509 = to_x509(generated.leaf());
        assert!(x509.verify(&x509.public_key().unwrap()).unwrap());

        let pem = encode_private_key_pem(&generated).unwrap();
        let private_key = PKey::private_key_from_pem(pem.as_bytes()).unwrap();
        assert!(private_key.public_eq(&x509.public_key().unwrap()));
    }
}

#[test]
fn test_openssl_parses_chain_pem() {
    let root = util::generate_root_ca();
    let leaf = util::generate_server_cert(&root);
    let stack = X509::stack_from_pem(encode_chain_pem(&leaf).as_bytes()).unwrap();
    assert_eq!(stack.len(), 2);
    assert_eq!(stack[0].to_der().unwrap(), leaf.leaf());
    assert_eq!(stack[1].to_der().unwrap(), root.leaf());
}

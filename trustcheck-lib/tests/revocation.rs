#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! CRL and OCSP processing, end to end.

mod common;

use common::*;
use trustcheck_lib::ocsp::ResponseStatus;
use trustcheck_lib::*;

const ROOT: &[u8] = include_bytes!("data/rsa_root.der");
const INTERMEDIATE: &[u8] = include_bytes!("data/ec_intermediate.der");
const EC_LEAF: &[u8] = include_bytes!("data/ec_leaf.der");
const P384_LEAF: &[u8] = include_bytes!("data/p384_leaf.der");
const CRL: &[u8] = include_bytes!("data/intermediate.crl");
const OCSP_GOOD: &[u8] = include_bytes!("data/ocsp_good.der");
const OCSP_REVOKED: &[u8] = include_bytes!("data/ocsp_revoked.der");
const OCSP_UNAUTHORIZED: &[u8] = include_bytes!("data/ocsp_unauthorized.der");

fn decode(der: &[u8]) -> DecodedCertificate {
    decode_certificate(der, &DecodeOptions::default()).unwrap()
}

fn fixture_store() -> MemoryTrustStore {
    store_of(&[&decode(ROOT), &decode(INTERMEDIATE)])
}

// ---- CRLs ----

#[test]
fn fixture_crl_contents() {
    let crl = decode_crl(CRL).unwrap();
    assert_eq!(crl.version(), 2);
    assert_eq!(crl.crl_number_hex().as_deref(), Some("2a"));
    assert_eq!(crl.revoked().len(), 2);
    assert_eq!(crl.revoked()[0].reason_name(), "keyCompromise");
    // no reason extension
    assert_eq!(crl.revoked()[1].reason, None);
    assert_eq!(crl.issuer().hash(), decode(INTERMEDIATE).subject().hash());
}

#[test]
fn fixture_crl_revokes_the_p384_leaf() {
    let crl = decode_crl(CRL).unwrap();
    verify_crl(&crl, &fixture_store(), &at_now()).unwrap();

    let err = check_revocation(&decode(P384_LEAF), [&crl]).unwrap_err();
    assert!(matches!(err, Error::Revoked { reason: "keyCompromise", .. }));
    check_revocation(&decode(EC_LEAF), [&crl]).unwrap();
}

#[test]
fn crl_without_next_update() {
    let key = TestKey::new(40);
    let ca = CertBuilder::ca("CRL Issuer", "CRL Issuer", None).decode(&key, &key);
    let store = store_of(&[&ca]);
    let crl = CrlBuilder::new("CRL Issuer")
        .window(NOW - DAY, None)
        .decode(&key);
    assert!(crl.next_update().is_none());

    verify_crl(&crl, &store, &at_now()).unwrap();
    let strict = VerifyOptions {
        require_next_update: true,
        ..at_now()
    };
    assert!(matches!(
        verify_crl(&crl, &store, &strict),
        Err(Error::MissingNextUpdate)
    ));
}

#[test]
fn stale_crl_and_skew() {
    let key = TestKey::new(41);
    let ca = CertBuilder::ca("CRL Issuer", "CRL Issuer", None).decode(&key, &key);
    let store = store_of(&[&ca]);
    let crl = CrlBuilder::new("CRL Issuer")
        .window(NOW - 8 * DAY, Some(NOW - 60))
        .decode(&key);

    assert!(matches!(
        verify_crl(&crl, &store, &at_now()),
        Err(Error::DateInvalid(DateBound::After))
    ));
    assert_eq!(crl.date_error(NOW), Some(DateBound::After));
    let lenient = VerifyOptions {
        skew_after: 60,
        ..at_now()
    };
    verify_crl(&crl, &store, &lenient).unwrap();
}

#[test]
fn crl_signed_by_non_crl_signer() {
    let key = TestKey::new(42);
    let ca = CertBuilder::ca("CRL Issuer", "CRL Issuer", None)
        .key_usage(Some(KU_CERT_SIGN))
        .decode(&key, &key);
    let crl = CrlBuilder::new("CRL Issuer").decode(&key);
    assert!(matches!(
        verify_crl(&crl, &store_of(&[&ca]), &at_now()),
        Err(Error::KeyUsageViolation("CRL signing"))
    ));
}

#[test]
fn tampered_crl_signature() {
    let key = TestKey::new(43);
    let ca = CertBuilder::ca("CRL Issuer", "CRL Issuer", None).decode(&key, &key);
    let mut der = CrlBuilder::new("CRL Issuer").revoke(&[0x07], None).build(&key);
    let last = der.len() - 1;
    der[last] ^= 0x80;
    let crl = decode_crl(&der).unwrap();
    assert!(matches!(
        verify_crl(&crl, &store_of(&[&ca]), &at_now()),
        Err(Error::SignatureMismatch)
    ));
}

#[test]
fn revocation_without_reason() {
    let ca_key = TestKey::new(44);
    let crl = CrlBuilder::new("CRL Issuer")
        .revoke(&[0x07], None)
        .decode(&ca_key);
    let cert = CertBuilder::leaf("leaf", "CRL Issuer")
        .serial(&[0x07])
        .decode(&TestKey::new(45), &ca_key);
    let err = check_revocation(&cert, [&crl]).unwrap_err();
    assert_eq!(err.to_string(), "certificate 07 revoked (unspecified)");
}

// ---- OCSP ----

fn good_request() -> OcspRequest {
    OcspRequest::for_certificate(&decode(EC_LEAF), &decode(INTERMEDIATE))
}

#[test]
fn good_response_answers_the_request() {
    let resp = decode_ocsp_response(OCSP_GOOD).unwrap();
    verify_ocsp_response(&resp, &fixture_store(), &at_now()).unwrap();

    let mut req = good_request();
    req.nonce = Some((0x10..0x20).collect());
    compare(&req, &resp).unwrap();
    assert_eq!(resp.single().unwrap().status, CertStatus::Good);
}

#[test]
fn nonce_off_by_one_byte() {
    let resp = decode_ocsp_response(OCSP_GOOD).unwrap();
    let mut nonce: Vec<u8> = (0x10..0x20).collect();
    nonce[0] ^= 0x01;
    let mut req = good_request();
    req.nonce = Some(nonce);
    assert!(matches!(
        compare(&req, &resp),
        Err(Error::CorrelationMismatch("nonce"))
    ));
}

#[test]
fn random_nonce_request() {
    let req = good_request().with_nonce(&mut rand_core::OsRng);
    assert_eq!(req.nonce.as_ref().map(Vec::len), Some(16));
    let der = req.encode();
    assert_eq!(der.first(), Some(&0x30));

    // a fresh nonce cannot match the canned response
    let resp = decode_ocsp_response(OCSP_GOOD).unwrap();
    assert!(compare(&req, &resp).is_err());
}

#[test]
fn revoked_response_from_delegated_responder() {
    let resp = decode_ocsp_response(OCSP_REVOKED).unwrap();
    verify_ocsp_response(&resp, &fixture_store(), &at_now()).unwrap();

    let single = resp.single().unwrap();
    assert!(matches!(single.status, CertStatus::Revoked { reason: Some(1), .. }));

    // no nonce in the response, so a nonce-less request correlates
    let req = OcspRequest::for_certificate(&decode(P384_LEAF), &decode(INTERMEDIATE));
    compare(&req, &resp).unwrap();
    // and a request for a different certificate does not
    assert!(matches!(
        compare(&good_request(), &resp),
        Err(Error::CorrelationMismatch("serial"))
    ));
}

#[test]
fn unsuccessful_response() {
    let resp = decode_ocsp_response(OCSP_UNAUTHORIZED).unwrap();
    assert_eq!(resp.status(), ResponseStatus::Unauthorized);
    assert!(matches!(
        verify_ocsp_response(&resp, &fixture_store(), &at_now()),
        Err(Error::OcspUnsuccessful(ResponseStatus::Unauthorized))
    ));
    assert!(matches!(
        compare(&good_request(), &resp),
        Err(Error::CorrelationMismatch("response"))
    ));
    assert!(ocsp_text(&resp).contains("unauthorized"));
}

#[test]
fn response_text_and_json() {
    let resp = decode_ocsp_response(OCSP_REVOKED).unwrap();
    let text = ocsp_text(&resp);
    assert!(text.contains("Cert Status: revoked"));
    assert!(text.contains("Revocation Time: "));
    let json: serde_json::Value = serde_json::from_str(&to_json(&resp).unwrap()).unwrap();
    assert!(json.is_object());
}

//! Certificate decoding.
//!
//! [`decode_certificate`] walks the DER `Certificate` once, top to bottom:
//! header, validity, names, key, extensions, then the outer algorithm and
//! signature. Every variable-length field is copied out, so the result does
//! not borrow the input buffer. A structural error aborts the decode; no
//! partially populated certificate is ever returned.
//!
//! Validity is only parsed here. Comparing it against a clock is a
//! verification concern (see [`crate::verify`]).

use crate::der::{tag, Element, Reader};
use crate::ext::{DecodeOptions, Extensions};
use crate::fields::{AltName, ExtKeyUsage, KeyUsage, NameConstraints};
use crate::fingerprint::{compute_fingerprint, DigestAlgorithm};
use crate::name::DecodedName;
use crate::oid::{self, Category, SignatureAlgorithm};
use crate::pubkey::PublicKey;
use crate::time::{Asn1Time, Validity};
use crate::util;
use crate::{Error, Result};
use serde::Serialize;

/// Longest serial number accepted, in bytes.
pub const MAX_SERIAL_LEN: usize = 32;

/// A fully decoded X.509 certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedCertificate {
    #[serde(skip)]
    raw: Vec<u8>,
    #[serde(skip)]
    tbs: Vec<u8>,
    version: u32,
    #[serde(serialize_with = "crate::util::serialize_hex")]
    serial: Vec<u8>,
    signature_algorithm: SignatureAlgorithm,
    issuer: DecodedName,
    subject: DecodedName,
    not_before: Asn1Time,
    not_after: Asn1Time,
    public_key: PublicKey,
    extensions: Extensions,
    #[serde(serialize_with = "crate::util::serialize_hex")]
    signature: Vec<u8>,
    self_signed: bool,
}

/// Decode a DER `Certificate`.
///
/// The buffer must hold exactly one certificate; trailing bytes are an
/// error.
pub fn decode_certificate(der: &[u8], options: &DecodeOptions) -> Result<DecodedCertificate> {
    let mut outer = Reader::new(der);
    let cert_el = outer.read_expected(tag::SEQUENCE)?;
    outer.finish("Certificate")?;

    let mut cert = cert_el.reader();
    let tbs_el = cert.read_expected(tag::SEQUENCE)?;
    let (outer_alg, outer_alg_el) = read_signature_algorithm(&mut cert)?;
    let signature = cert.read_bit_string(true)?.bytes.to_vec();
    cert.finish("Certificate")?;

    let mut tbs = tbs_el.reader();

    // Header
    let version = match tbs.read_optional(tag::explicit(0))? {
        Some(el) => {
            let mut r = el.reader();
            let v = r.read_small_integer()?;
            r.finish("version")?;
            v
        }
        None => 0,
    };
    if version > 2 {
        return Err(Error::UnsupportedVersion(version.saturating_add(1)));
    }
    let serial = tbs.read_integer()?;
    if serial.len() > MAX_SERIAL_LEN {
        return Err(Error::SerialTooLarge(serial.len()));
    }
    let (inner_alg, inner_alg_el) = read_signature_algorithm(&mut tbs)?;

    // Names and validity
    let issuer = DecodedName::read(&mut tbs)?;
    let mut validity = tbs.read_sequence()?;
    let not_before = Asn1Time::read(&mut validity)?;
    let not_after = Asn1Time::read(&mut validity)?;
    validity.finish("Validity")?;
    let subject = DecodedName::read(&mut tbs)?;

    let public_key = PublicKey::read(&mut tbs)?;

    // issuerUniqueID and subjectUniqueID are skipped
    tbs.read_optional(tag::context(1))?;
    tbs.read_optional(tag::context(2))?;

    let extensions = match tbs.read_optional(tag::explicit(3))? {
        Some(el) => {
            if version < 2 && !options.allow_legacy_extensions {
                return Err(Error::LegacyExtensions);
            }
            let mut r = el.reader();
            let exts = Extensions::read(&mut r, options)?;
            r.finish("extensions")?;
            exts
        }
        None => Extensions::default(),
    };
    tbs.finish("TBSCertificate")?;

    if outer_alg != inner_alg || outer_alg_el.raw() != inner_alg_el.raw() {
        return Err(Error::SignatureAlgorithmMismatch);
    }

    let self_signed = issuer.hash() == subject.hash();
    Ok(DecodedCertificate {
        raw: cert_el.raw().to_vec(),
        tbs: tbs_el.raw().to_vec(),
        version: version + 1,
        serial: serial.to_vec(),
        signature_algorithm: inner_alg,
        issuer,
        subject,
        not_before,
        not_after,
        public_key,
        extensions,
        signature,
        self_signed,
    })
}

/// Read a signature `AlgorithmIdentifier`, returning the algorithm and the
/// whole element so callers can compare encodings.
pub(crate) fn read_signature_algorithm<'a>(
    reader: &mut Reader<'a>,
) -> Result<(SignatureAlgorithm, Element<'a>)> {
    let el = reader.read_expected(tag::SEQUENCE)?;
    let mut alg = el.reader();
    let oid_der = alg.read_object_id()?;
    let algorithm = SignatureAlgorithm::from_der(oid_der).ok_or_else(|| Error::UnknownOid {
        category: Category::Signature,
        oid: oid::to_dotted(oid_der).unwrap_or_else(|_| hex::encode(oid_der)),
    })?;
    // parameters are NULL, absent, or (for PSS) opaque
    if !alg.is_empty() {
        alg.skip()?;
    }
    alg.finish("AlgorithmIdentifier")?;
    Ok((algorithm, el))
}

impl DecodedCertificate {
    /// The complete certificate DER.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// The exact signed `TBSCertificate` bytes.
    pub fn tbs(&self) -> &[u8] {
        &self.tbs
    }

    /// Version number as displayed (1, 2 or 3).
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Serial magnitude, big-endian, without a sign pad.
    pub fn serial(&self) -> &[u8] {
        &self.serial
    }

    /// Serial as colon-separated lowercase hex.
    pub fn serial_hex(&self) -> String {
        util::hex_colon_lower(&self.serial)
    }

    pub fn signature_algorithm(&self) -> SignatureAlgorithm {
        self.signature_algorithm
    }

    pub fn issuer(&self) -> &DecodedName {
        &self.issuer
    }

    pub fn subject(&self) -> &DecodedName {
        &self.subject
    }

    pub fn not_before(&self) -> &Asn1Time {
        &self.not_before
    }

    pub fn not_after(&self) -> &Asn1Time {
        &self.not_after
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Issuer name hash equals subject name hash.
    pub fn is_self_signed(&self) -> bool {
        self.self_signed
    }

    pub fn is_ca(&self) -> bool {
        self.extensions.is_ca()
    }

    pub fn path_len(&self) -> Option<u8> {
        self.extensions.path_len()
    }

    pub fn key_usage(&self) -> Option<KeyUsage> {
        self.extensions.key_usage
    }

    pub fn ext_key_usage(&self) -> Option<ExtKeyUsage> {
        self.extensions.ext_key_usage
    }

    pub fn subject_key_id(&self) -> Option<&[u8]> {
        self.extensions.subject_key_id.as_deref()
    }

    pub fn authority_key_id(&self) -> Option<&[u8]> {
        self.extensions.authority_key_id.as_deref()
    }

    pub fn alt_names(&self) -> &[AltName] {
        self.extensions.alt_names()
    }

    pub fn name_constraints(&self) -> Option<&NameConstraints> {
        self.extensions.name_constraints.as_ref()
    }

    pub fn crl_distribution_point(&self) -> Option<&str> {
        self.extensions.crl_distribution_point.as_deref()
    }

    pub fn ocsp_responder(&self) -> Option<&str> {
        self.extensions.ocsp_responder.as_deref()
    }

    pub fn policies(&self) -> &[String] {
        self.extensions.policies.as_deref().unwrap_or_default()
    }

    /// Evaluate the validity window at `now` with the given tolerances.
    pub fn validity_at(&self, now: i64, skew_before: i64, skew_after: i64) -> Validity {
        Validity::evaluate(
            self.not_before.timestamp(),
            self.not_after.timestamp(),
            now,
            skew_before,
            skew_after,
        )
    }

    pub fn is_not_yet_valid(&self, now: i64) -> bool {
        self.validity_at(now, 0, 0).not_yet_valid
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.validity_at(now, 0, 0).expired
    }

    /// Fingerprint over the full DER encoding.
    pub fn fingerprint(&self, algorithm: DigestAlgorithm) -> String {
        compute_fingerprint(&self.raw, algorithm)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::oid::NamedCurve;
    use crate::pubkey::KeyAlgorithm;

    const LEAF: &[u8] = include_bytes!("../tests/data/ec_leaf.der");
    const ROOT: &[u8] = include_bytes!("../tests/data/rsa_root.der");

    fn decode(der: &[u8]) -> Result<DecodedCertificate> {
        decode_certificate(der, &DecodeOptions::default())
    }

    #[test]
    fn decodes_leaf_header_and_names() {
        let cert = decode(LEAF).unwrap();
        assert_eq!(cert.version(), 3);
        assert_eq!(cert.serial(), &[0xc0, 0xff, 0xee]);
        assert_eq!(cert.serial_hex(), "c0:ff:ee");
        assert_eq!(cert.signature_algorithm(), SignatureAlgorithm::EcdsaWithSha256);
        assert_eq!(cert.subject().common_name(), Some("www.example.com"));
        assert_eq!(
            cert.issuer().common_name(),
            Some("Trustcheck EC Intermediate")
        );
        assert!(!cert.is_self_signed());
        assert_eq!(cert.not_before().timestamp(), 1_735_689_600);
        assert_eq!(cert.not_after().timestamp(), 1_798_761_600);
        assert_eq!(cert.raw(), LEAF);
    }

    #[test]
    fn tbs_is_exact_signed_range() {
        let cert = decode(LEAF).unwrap();
        let pos = LEAF
            .windows(cert.tbs().len())
            .position(|w| w == cert.tbs())
            .unwrap();
        // outer SEQUENCE header is 4 bytes for a certificate this size
        assert_eq!(pos, 4);
    }

    #[test]
    fn decodes_leaf_extensions() {
        let cert = decode(LEAF).unwrap();
        assert!(!cert.is_ca());
        let ku = cert.key_usage().unwrap();
        assert!(ku.contains(KeyUsage::DIGITAL_SIGNATURE | KeyUsage::KEY_AGREEMENT));
        assert!(cert
            .ext_key_usage()
            .unwrap()
            .contains(ExtKeyUsage::SERVER_AUTH | ExtKeyUsage::CLIENT_AUTH));
        assert_eq!(cert.alt_names().len(), 4);
        assert_eq!(cert.ocsp_responder(), Some("http://ocsp.example.com"));
        assert_eq!(
            cert.crl_distribution_point(),
            Some("http://crl.example.com/int.crl")
        );
        assert_eq!(
            cert.policies(),
            &["2.23.140.1.2.1".to_string(), "1.3.6.1.4.1.44947.1.1.1".to_string()]
        );
        assert_eq!(cert.subject_key_id().unwrap().len(), 20);
        assert_eq!(cert.authority_key_id().unwrap().len(), 20);
        assert_eq!(cert.public_key().algorithm(), KeyAlgorithm::Ec);
        assert_eq!(
            cert.public_key().curve().and_then(|c| c.named()),
            Some(NamedCurve::P256)
        );
    }

    #[test]
    fn root_is_self_signed_ca() {
        let cert = decode(ROOT).unwrap();
        assert!(cert.is_self_signed());
        assert!(cert.is_ca());
        assert_eq!(cert.path_len(), Some(1));
        assert_eq!(cert.public_key().key_size(), Some(2048));
    }

    #[test]
    fn validity_window_is_inclusive() {
        let cert = decode(LEAF).unwrap();
        let nb = cert.not_before().timestamp();
        let na = cert.not_after().timestamp();
        assert!(!cert.is_not_yet_valid(nb));
        assert!(cert.is_not_yet_valid(nb - 1));
        assert!(!cert.is_expired(na));
        assert!(cert.is_expired(na + 1));
        assert!(!cert.validity_at(nb - 10, 10, 0).not_yet_valid);
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut der = LEAF.to_vec();
        der.push(0);
        assert!(matches!(decode(&der), Err(Error::TrailingData(_))));
    }

    #[test]
    fn truncated_input_rejected() {
        for len in [0, 1, 4, LEAF.len() / 2, LEAF.len() - 1] {
            assert!(decode(&LEAF[..len]).is_err(), "len {}", len);
        }
    }

    #[test]
    fn outer_algorithm_must_match_inner() {
        let cert = decode(ROOT).unwrap();
        let sha256_rsa = SignatureAlgorithm::Sha256WithRsa.der();
        let sha384_rsa = SignatureAlgorithm::Sha384WithRsa.der();
        // rewrite only the outer AlgorithmIdentifier, which follows the TBS
        let mut der = ROOT.to_vec();
        let tbs_end = 4 + cert.tbs().len();
        let at = der[tbs_end..]
            .windows(sha256_rsa.len())
            .position(|w| w == sha256_rsa)
            .unwrap()
            + tbs_end;
        der[at..at + sha384_rsa.len()].copy_from_slice(sha384_rsa);
        assert!(matches!(decode(&der), Err(Error::SignatureAlgorithmMismatch)));
    }

    #[test]
    fn fingerprint_covers_raw_der() {
        let cert = decode(LEAF).unwrap();
        let fp = cert.fingerprint(DigestAlgorithm::Sha256);
        assert_eq!(fp, compute_fingerprint(LEAF, DigestAlgorithm::Sha256));
        assert_eq!(fp.len(), 32 * 3 - 1);
    }
}

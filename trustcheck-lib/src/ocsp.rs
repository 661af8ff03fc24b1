//! OCSP request encoding and response decoding (RFC 6960).
//!
//! Requests carry a single `CertID` and an optional nonce. Responses are
//! decoded in full: every `SingleResponse` is kept, with
//! [`OcspResponse::single`] returning the first for the usual
//! one-certificate-per-request exchange. [`compare`] checks that a
//! response answers a given request; it does not touch signatures.

use crate::der::{tag, Reader, Writer};
use crate::ext::{read_raw_extensions, DecodeOptions, RawExtension};
use crate::name::DecodedName;
use crate::oid::{self, Category, HashAlgorithm, OcspOid, SignatureAlgorithm};
use crate::parser::{decode_certificate, read_signature_algorithm, DecodedCertificate};
use crate::time::Asn1Time;
use crate::{Error, Result};
use digest::Digest;
use rand_core::RngCore;
use serde::Serialize;
use tracing::debug;

/// Length of generated request nonces.
pub const NONCE_LEN: usize = 16;

/// `OCSPResponseStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResponseStatus {
    Successful,
    MalformedRequest,
    InternalError,
    TryLater,
    SigRequired,
    Unauthorized,
}

impl ResponseStatus {
    fn from_code(code: u32) -> Result<Self> {
        Ok(match code {
            0 => ResponseStatus::Successful,
            1 => ResponseStatus::MalformedRequest,
            2 => ResponseStatus::InternalError,
            3 => ResponseStatus::TryLater,
            5 => ResponseStatus::SigRequired,
            6 => ResponseStatus::Unauthorized,
            _ => return Err(Error::Malformed("OCSPResponseStatus")),
        })
    }
}

impl std::fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ResponseStatus::Successful => "successful",
            ResponseStatus::MalformedRequest => "malformedRequest",
            ResponseStatus::InternalError => "internalError",
            ResponseStatus::TryLater => "tryLater",
            ResponseStatus::SigRequired => "sigRequired",
            ResponseStatus::Unauthorized => "unauthorized",
        })
    }
}

/// `CertID`: which certificate a request or response is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertId {
    pub hash_algorithm: HashAlgorithm,
    #[serde(serialize_with = "crate::util::serialize_hex")]
    pub issuer_name_hash: Vec<u8>,
    #[serde(serialize_with = "crate::util::serialize_hex")]
    pub issuer_key_hash: Vec<u8>,
    #[serde(serialize_with = "crate::util::serialize_hex")]
    pub serial: Vec<u8>,
}

impl CertId {
    /// SHA-1 `CertID` for `cert` issued by `issuer`.
    pub fn for_certificate(cert: &DecodedCertificate, issuer: &DecodedCertificate) -> Self {
        CertId {
            hash_algorithm: HashAlgorithm::Sha1,
            issuer_name_hash: sha1::Sha1::digest(issuer.subject().raw()).to_vec(),
            issuer_key_hash: issuer.public_key().key_hash().to_vec(),
            serial: cert.serial().to_vec(),
        }
    }

    fn read(reader: &mut Reader<'_>) -> Result<Self> {
        let mut seq = reader.read_sequence()?;
        let mut alg = seq.read_sequence()?;
        let oid_der = alg.read_object_id()?;
        let hash_algorithm = HashAlgorithm::from_der(oid_der).ok_or_else(|| Error::UnknownOid {
            category: Category::Hash,
            oid: oid::to_dotted(oid_der).unwrap_or_else(|_| hex::encode(oid_der)),
        })?;
        if !alg.is_empty() {
            alg.read_null()?;
        }
        alg.finish("CertID hashAlgorithm")?;
        let issuer_name_hash = seq.read_octet_string()?.to_vec();
        let issuer_key_hash = seq.read_octet_string()?.to_vec();
        let serial = seq.read_integer()?.to_vec();
        seq.finish("CertID")?;
        Ok(CertId {
            hash_algorithm,
            issuer_name_hash,
            issuer_key_hash,
            serial,
        })
    }

    fn write(&self, w: &mut Writer) {
        w.sequence(|w| {
            w.sequence(|w| {
                w.oid(self.hash_algorithm.der()).null();
            });
            w.octet_string(&self.issuer_name_hash)
                .octet_string(&self.issuer_key_hash)
                .integer(&self.serial);
        });
    }
}

/// A single-certificate OCSP request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OcspRequest {
    pub cert_id: CertId,
    #[serde(serialize_with = "crate::util::serialize_hex_opt")]
    pub nonce: Option<Vec<u8>>,
}

impl OcspRequest {
    pub fn new(cert_id: CertId) -> Self {
        OcspRequest {
            cert_id,
            nonce: None,
        }
    }

    /// Request the status of `cert`, issued by `issuer`.
    pub fn for_certificate(cert: &DecodedCertificate, issuer: &DecodedCertificate) -> Self {
        Self::new(CertId::for_certificate(cert, issuer))
    }

    /// Attach a fresh random nonce.
    pub fn with_nonce(mut self, rng: &mut impl RngCore) -> Self {
        let mut nonce = vec![0u8; NONCE_LEN];
        rng.fill_bytes(&mut nonce);
        self.nonce = Some(nonce);
        self
    }

    /// DER `OCSPRequest`, unsigned.
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.sequence(|w| {
            w.sequence(|w| {
                w.sequence(|w| {
                    w.sequence(|w| self.cert_id.write(w));
                });
                if let Some(nonce) = &self.nonce {
                    w.explicit(2, |w| {
                        w.sequence(|w| {
                            w.sequence(|w| {
                                let mut value = Writer::new();
                                value.octet_string(nonce);
                                w.oid(OcspOid::Nonce.der()).octet_string(value.as_bytes());
                            });
                        });
                    });
                }
            });
        });
        w.into_bytes()
    }
}

/// `CertStatus` of one `SingleResponse`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CertStatus {
    Good,
    Revoked {
        time: Asn1Time,
        /// CRLReason code, if given.
        reason: Option<u8>,
    },
    Unknown,
}

impl std::fmt::Display for CertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CertStatus::Good => f.write_str("good"),
            CertStatus::Revoked { .. } => f.write_str("revoked"),
            CertStatus::Unknown => f.write_str("unknown"),
        }
    }
}

/// One `SingleResponse`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SingleResponse {
    pub cert_id: CertId,
    pub status: CertStatus,
    pub this_update: Asn1Time,
    pub next_update: Option<Asn1Time>,
    /// Nonce echoed in `singleExtensions`.
    #[serde(serialize_with = "crate::util::serialize_hex_opt")]
    pub nonce: Option<Vec<u8>>,
}

/// `ResponderID`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum ResponderId {
    ByName(DecodedName),
    /// SHA-1 of the responder's public key bits.
    ByKey(#[serde(serialize_with = "crate::util::serialize_hex")] Vec<u8>),
}

impl std::fmt::Display for ResponderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponderId::ByName(name) => write!(f, "{}", name),
            ResponderId::ByKey(hash) => f.write_str(&crate::util::hex_colon_upper(hash)),
        }
    }
}

/// Body of a successful response (`BasicOCSPResponse`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BasicResponse {
    #[serde(skip)]
    tbs: Vec<u8>,
    version: u32,
    responder_id: ResponderId,
    produced_at: Asn1Time,
    responses: Vec<SingleResponse>,
    #[serde(serialize_with = "crate::util::serialize_hex_opt")]
    nonce: Option<Vec<u8>>,
    signature_algorithm: SignatureAlgorithm,
    #[serde(serialize_with = "crate::util::serialize_hex")]
    signature: Vec<u8>,
    #[serde(skip)]
    certs: Vec<DecodedCertificate>,
}

impl BasicResponse {
    /// The exact signed `ResponseData` bytes.
    pub fn tbs(&self) -> &[u8] {
        &self.tbs
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn responder_id(&self) -> &ResponderId {
        &self.responder_id
    }

    pub fn produced_at(&self) -> &Asn1Time {
        &self.produced_at
    }

    pub fn signature_algorithm(&self) -> SignatureAlgorithm {
        self.signature_algorithm
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Certificates embedded in the response, in encoded order.
    pub fn certs(&self) -> &[DecodedCertificate] {
        &self.certs
    }
}

/// A decoded `OCSPResponse`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OcspResponse {
    #[serde(skip)]
    raw: Vec<u8>,
    status: ResponseStatus,
    #[serde(flatten)]
    basic: Option<BasicResponse>,
}

impl OcspResponse {
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn status(&self) -> ResponseStatus {
        self.status
    }

    /// The signed body; present only when the status is successful.
    pub fn basic(&self) -> Option<&BasicResponse> {
        self.basic.as_ref()
    }

    /// Every `SingleResponse`, in encoded order.
    pub fn responses(&self) -> impl Iterator<Item = &SingleResponse> {
        self.basic.iter().flat_map(|b| b.responses.iter())
    }

    /// The first `SingleResponse`.
    pub fn single(&self) -> Option<&SingleResponse> {
        self.responses().next()
    }

    /// Nonce from `responseExtensions`, else from the first single
    /// response's extensions.
    pub fn nonce(&self) -> Option<&[u8]> {
        self.basic
            .as_ref()
            .and_then(|b| b.nonce.as_deref())
            .or_else(|| self.single().and_then(|s| s.nonce.as_deref()))
    }

    /// The embedded responder certificate, if any.
    pub fn responder_certificate(&self) -> Option<&DecodedCertificate> {
        self.basic.as_ref().and_then(|b| b.certs.first())
    }
}

/// Decode a DER `OCSPResponse`.
pub fn decode_ocsp_response(der: &[u8]) -> Result<OcspResponse> {
    let mut outer = Reader::new(der);
    let resp_el = outer.read_expected(tag::SEQUENCE)?;
    outer.finish("OCSPResponse")?;

    let mut resp = resp_el.reader();
    let status = ResponseStatus::from_code(resp.read_enumerated()?)?;
    let basic = match resp.read_optional(tag::explicit(0))? {
        Some(el) => {
            let mut wrapper = el.reader();
            let mut bytes = wrapper.read_sequence()?;
            wrapper.finish("responseBytes")?;
            let response_type = bytes.read_object_id()?;
            if OcspOid::from_der(response_type) != Some(OcspOid::Basic) {
                return Err(Error::UnknownOid {
                    category: Category::Ocsp,
                    oid: oid::to_dotted(response_type)?,
                });
            }
            let body = bytes.read_octet_string()?;
            bytes.finish("ResponseBytes")?;
            Some(read_basic(body)?)
        }
        None => None,
    };
    resp.finish("OCSPResponse")?;

    if status == ResponseStatus::Successful && basic.is_none() {
        return Err(Error::Malformed("successful OCSPResponse without responseBytes"));
    }
    if status != ResponseStatus::Successful && basic.is_some() {
        return Err(Error::Malformed("unsuccessful OCSPResponse with responseBytes"));
    }

    Ok(OcspResponse {
        raw: resp_el.raw().to_vec(),
        status,
        basic,
    })
}

fn read_basic(der: &[u8]) -> Result<BasicResponse> {
    let mut outer = Reader::new(der);
    let mut basic = outer.read_sequence()?;
    outer.finish("BasicOCSPResponse")?;

    let tbs_el = basic.read_expected(tag::SEQUENCE)?;
    let (signature_algorithm, _) = read_signature_algorithm(&mut basic)?;
    let signature = basic.read_bit_string(true)?.bytes.to_vec();
    let mut certs = Vec::new();
    if let Some(el) = basic.read_optional(tag::explicit(0))? {
        let mut wrapper = el.reader();
        let mut list = wrapper.read_sequence()?;
        wrapper.finish("certs")?;
        while !list.is_empty() {
            let cert_el = list.read_expected(tag::SEQUENCE)?;
            certs.push(decode_certificate(cert_el.raw(), &DecodeOptions::default())?);
        }
    }
    basic.finish("BasicOCSPResponse")?;

    let mut data = tbs_el.reader();
    let version = match data.read_optional(tag::explicit(0))? {
        Some(el) => {
            let mut r = el.reader();
            let v = r.read_small_integer()?;
            r.finish("version")?;
            v
        }
        None => 0,
    };
    if version != 0 {
        return Err(Error::UnsupportedVersion(version.saturating_add(1)));
    }

    let responder_id = match data.peek_tag() {
        Some(t) if t == tag::explicit(1) => {
            let mut r = data.read_explicit(1)?;
            let name = DecodedName::read(&mut r)?;
            r.finish("ResponderID")?;
            ResponderId::ByName(name)
        }
        Some(t) if t == tag::explicit(2) => {
            let mut r = data.read_explicit(2)?;
            let hash = r.read_octet_string()?;
            r.finish("ResponderID")?;
            ResponderId::ByKey(hash.to_vec())
        }
        _ => return Err(Error::Malformed("ResponderID")),
    };
    let produced_at = Asn1Time::read(&mut data)?;

    let mut responses = Vec::new();
    let mut list = data.read_sequence()?;
    while !list.is_empty() {
        responses.push(read_single(&mut list)?);
    }
    if responses.is_empty() {
        return Err(Error::Malformed("ResponseData without responses"));
    }
    if responses.len() > 1 {
        debug!(count = responses.len(), "OCSP response carries several responses");
    }

    let mut nonce = None;
    if let Some(el) = data.read_optional(tag::explicit(1))? {
        let mut r = el.reader();
        let exts = r.read_sequence()?;
        r.finish("responseExtensions")?;
        nonce = find_nonce(&read_raw_extensions(exts)?)?;
    }
    data.finish("ResponseData")?;

    Ok(BasicResponse {
        tbs: tbs_el.raw().to_vec(),
        version: version + 1,
        responder_id,
        produced_at,
        responses,
        nonce,
        signature_algorithm,
        signature,
        certs,
    })
}

fn read_single(list: &mut Reader<'_>) -> Result<SingleResponse> {
    let mut single = list.read_sequence()?;
    let cert_id = CertId::read(&mut single)?;

    let status_el = single.read_element()?;
    let status = match status_el.tag {
        t if t == tag::context(0) => CertStatus::Good,
        t if t == tag::explicit(1) => {
            let mut info = status_el.reader();
            let time = Asn1Time::read(&mut info)?;
            let reason = match info.read_optional(tag::explicit(0))? {
                Some(el) => {
                    let mut r = el.reader();
                    let code = r.read_enumerated()?;
                    r.finish("revocationReason")?;
                    Some(u8::try_from(code).map_err(|_| Error::Malformed("revocationReason"))?)
                }
                None => None,
            };
            info.finish("RevokedInfo")?;
            CertStatus::Revoked { time, reason }
        }
        t if t == tag::context(2) => CertStatus::Unknown,
        found => {
            return Err(Error::UnexpectedTag {
                expected: tag::context(0),
                found,
                offset: status_el.start,
            })
        }
    };

    let this_update = Asn1Time::read(&mut single)?;
    let next_update = match single.read_optional(tag::explicit(0))? {
        Some(el) => {
            let mut r = el.reader();
            let t = Asn1Time::read(&mut r)?;
            r.finish("nextUpdate")?;
            Some(t)
        }
        None => None,
    };
    let mut nonce = None;
    if let Some(el) = single.read_optional(tag::explicit(1))? {
        let mut r = el.reader();
        let exts = r.read_sequence()?;
        r.finish("singleExtensions")?;
        nonce = find_nonce(&read_raw_extensions(exts)?)?;
    }
    single.finish("SingleResponse")?;

    Ok(SingleResponse {
        cert_id,
        status,
        this_update,
        next_update,
        nonce,
    })
}

/// Nonce extension value: an OCTET STRING, or bare bytes from responders
/// that skip the inner wrapping.
fn find_nonce(exts: &[RawExtension<'_>]) -> Result<Option<Vec<u8>>> {
    let Some(ext) = exts
        .iter()
        .find(|e| OcspOid::from_der(e.oid) == Some(OcspOid::Nonce))
    else {
        return Ok(None);
    };
    let r = Reader::new(ext.value);
    if r.peek_tag() == Some(tag::OCTET_STRING) {
        let mut probe = r;
        if let Ok(inner) = probe.read_octet_string() {
            if probe.is_empty() {
                return Ok(Some(inner.to_vec()));
            }
        }
    }
    Ok(Some(ext.value.to_vec()))
}

/// Check that `response` answers `request`.
///
/// A nonce in the response must equal the request's; the issuer hashes
/// and serial of the first single response must match exactly.
pub fn compare(request: &OcspRequest, response: &OcspResponse) -> Result<()> {
    let single = response
        .single()
        .ok_or(Error::CorrelationMismatch("response"))?;
    if let Some(nonce) = response.nonce() {
        if request.nonce.as_deref() != Some(nonce) {
            return Err(Error::CorrelationMismatch("nonce"));
        }
    }
    let want = &request.cert_id;
    let got = &single.cert_id;
    if want.hash_algorithm != got.hash_algorithm || want.issuer_name_hash != got.issuer_name_hash {
        return Err(Error::CorrelationMismatch("issuer name hash"));
    }
    if want.issuer_key_hash != got.issuer_key_hash {
        return Err(Error::CorrelationMismatch("issuer key hash"));
    }
    if want.serial != got.serial {
        return Err(Error::CorrelationMismatch("serial"));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    const GOOD: &[u8] = include_bytes!("../tests/data/ocsp_good.der");
    const REVOKED: &[u8] = include_bytes!("../tests/data/ocsp_revoked.der");
    const UNAUTHORIZED: &[u8] = include_bytes!("../tests/data/ocsp_unauthorized.der");
    const LEAF: &[u8] = include_bytes!("../tests/data/ec_leaf.der");
    const INTERMEDIATE: &[u8] = include_bytes!("../tests/data/ec_intermediate.der");

    fn nonce() -> Vec<u8> {
        (0x10..0x20).collect()
    }

    fn request() -> OcspRequest {
        let leaf = decode_certificate(LEAF, &DecodeOptions::default()).unwrap();
        let issuer = decode_certificate(INTERMEDIATE, &DecodeOptions::default()).unwrap();
        OcspRequest::for_certificate(&leaf, &issuer)
    }

    /// Deterministic generator for nonce tests.
    struct Counter(u8);

    impl RngCore for Counter {
        fn next_u32(&mut self) -> u32 {
            rand_core::impls::next_u32_via_fill(self)
        }
        fn next_u64(&mut self) -> u64 {
            rand_core::impls::next_u64_via_fill(self)
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for b in dest {
                *b = self.0;
                self.0 = self.0.wrapping_add(1);
            }
        }
        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand_core::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    #[test]
    fn decodes_good_response() {
        let resp = decode_ocsp_response(GOOD).unwrap();
        assert_eq!(resp.status(), ResponseStatus::Successful);
        let single = resp.single().unwrap();
        assert_eq!(single.status, CertStatus::Good);
        assert_eq!(single.cert_id.serial, vec![0xc0, 0xff, 0xee]);
        assert_eq!(single.next_update.as_ref().unwrap().timestamp(), 1_749_340_800);
        assert_eq!(resp.nonce(), Some(nonce().as_slice()));
        let basic = resp.basic().unwrap();
        assert!(matches!(basic.responder_id(), ResponderId::ByKey(h) if h.len() == 20));
        assert!(basic.certs().is_empty());
        assert_eq!(resp.responses().count(), 1);
    }

    #[test]
    fn decodes_revoked_response_with_responder_cert() {
        let resp = decode_ocsp_response(REVOKED).unwrap();
        let single = resp.single().unwrap();
        match &single.status {
            CertStatus::Revoked { reason, .. } => assert_eq!(*reason, Some(1)),
            other => panic!("unexpected status {:?}", other),
        }
        assert!(matches!(
            resp.basic().unwrap().responder_id(),
            ResponderId::ByName(_)
        ));
        let responder = resp.responder_certificate().unwrap();
        assert_eq!(responder.serial(), &[0x0c, 0xcc]);
        assert!(resp.nonce().is_none());
    }

    #[test]
    fn unsuccessful_status_has_no_body() {
        let resp = decode_ocsp_response(UNAUTHORIZED).unwrap();
        assert_eq!(resp.status(), ResponseStatus::Unauthorized);
        assert!(resp.basic().is_none());
        assert!(resp.single().is_none());
        assert_eq!(resp.status().to_string(), "unauthorized");
    }

    #[test]
    fn request_cert_id_matches_response() {
        let resp = decode_ocsp_response(GOOD).unwrap();
        let mut req = request();
        assert_eq!(req.cert_id, resp.single().unwrap().cert_id);
        // the response carries a nonce, so the request must too
        assert!(matches!(
            compare(&req, &resp),
            Err(Error::CorrelationMismatch("nonce"))
        ));
        req.nonce = Some(nonce());
        compare(&req, &resp).unwrap();
    }

    #[test]
    fn one_byte_nonce_difference_is_a_mismatch() {
        let resp = decode_ocsp_response(GOOD).unwrap();
        let mut req = request();
        let mut n = nonce();
        n[15] ^= 0x01;
        req.nonce = Some(n);
        assert!(matches!(
            compare(&req, &resp),
            Err(Error::CorrelationMismatch("nonce"))
        ));
    }

    #[test]
    fn serial_and_key_hash_mismatch() {
        let resp = decode_ocsp_response(GOOD).unwrap();
        let mut req = request();
        req.nonce = Some(nonce());
        req.cert_id.serial = vec![0x01];
        assert!(matches!(
            compare(&req, &resp),
            Err(Error::CorrelationMismatch("serial"))
        ));
        let mut req = request();
        req.nonce = Some(nonce());
        req.cert_id.issuer_key_hash[0] ^= 0xff;
        assert!(matches!(
            compare(&req, &resp),
            Err(Error::CorrelationMismatch("issuer key hash"))
        ));
    }

    #[test]
    fn encoded_request_structure() {
        let req = request().with_nonce(&mut Counter(1));
        let nonce = req.nonce.clone().unwrap();
        assert_eq!(nonce.len(), NONCE_LEN);
        assert_eq!(nonce[0], 1);

        let der = req.encode();
        let mut r = Reader::new(&der);
        let mut ocsp_req = r.read_sequence().unwrap();
        r.finish("OCSPRequest").unwrap();
        let mut tbs = ocsp_req.read_sequence().unwrap();
        let mut list = tbs.read_sequence().unwrap();
        let mut single = list.read_sequence().unwrap();
        let cert_id = CertId::read(&mut single).unwrap();
        assert_eq!(cert_id, req.cert_id);

        let mut exts_wrapper = tbs.read_explicit(2).unwrap();
        let exts = read_raw_extensions(exts_wrapper.read_sequence().unwrap()).unwrap();
        assert_eq!(find_nonce(&exts).unwrap(), Some(nonce));
    }

    #[test]
    fn bare_nonce_value_accepted() {
        let ext = RawExtension {
            oid: OcspOid::Nonce.der(),
            critical: false,
            value: &[0xaa, 0xbb],
        };
        assert_eq!(find_nonce(&[ext]).unwrap(), Some(vec![0xaa, 0xbb]));
    }
}

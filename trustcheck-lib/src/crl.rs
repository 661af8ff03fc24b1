//! Certificate Revocation List decoding.
//!
//! Only the parts needed for revocation checking are interpreted: issuer,
//! update window, revoked serials (with their reason code), the authority
//! key identifier and the CRL number. Other CRL and entry extensions are
//! skipped.

use crate::der::{tag, Reader};
use crate::ext::{normalize_key_id, read_raw_extensions};
use crate::name::DecodedName;
use crate::oid::{self, ExtensionId, SignatureAlgorithm};
use crate::parser::read_signature_algorithm;
use crate::time::Asn1Time;
use crate::util;
use crate::{Error, Result};
use serde::Serialize;
use tracing::debug;

/// RFC 5280 name of a CRLReason code.
pub fn reason_name(code: u8) -> &'static str {
    match code {
        0 => "unspecified",
        1 => "keyCompromise",
        2 => "cACompromise",
        3 => "affiliationChanged",
        4 => "superseded",
        5 => "cessationOfOperation",
        6 => "certificateHold",
        // 7 is unused
        8 => "removeFromCRL",
        9 => "privilegeWithdrawn",
        10 => "aACompromise",
        _ => "unspecified",
    }
}

/// One `revokedCertificates` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevokedEntry {
    #[serde(serialize_with = "crate::util::serialize_hex")]
    pub serial: Vec<u8>,
    pub revocation_date: Asn1Time,
    /// CRLReason code, when the entry carries one.
    pub reason: Option<u8>,
}

impl RevokedEntry {
    pub fn reason_name(&self) -> &'static str {
        reason_name(self.reason.unwrap_or(0))
    }
}

/// A decoded `CertificateList`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedCrl {
    #[serde(skip)]
    raw: Vec<u8>,
    #[serde(skip)]
    tbs: Vec<u8>,
    version: u32,
    signature_algorithm: SignatureAlgorithm,
    issuer: DecodedName,
    this_update: Asn1Time,
    next_update: Option<Asn1Time>,
    revoked: Vec<RevokedEntry>,
    #[serde(serialize_with = "crate::util::serialize_hex_opt")]
    authority_key_id: Option<Vec<u8>>,
    #[serde(serialize_with = "crate::util::serialize_hex_opt")]
    crl_number: Option<Vec<u8>>,
    #[serde(serialize_with = "crate::util::serialize_hex")]
    signature: Vec<u8>,
}

/// Decode a DER `CertificateList`.
pub fn decode_crl(der: &[u8]) -> Result<DecodedCrl> {
    let mut outer = Reader::new(der);
    let list_el = outer.read_expected(tag::SEQUENCE)?;
    outer.finish("CertificateList")?;

    let mut list = list_el.reader();
    let tbs_el = list.read_expected(tag::SEQUENCE)?;
    let (outer_alg, outer_alg_el) = read_signature_algorithm(&mut list)?;
    let signature = list.read_bit_string(true)?.bytes.to_vec();
    list.finish("CertificateList")?;

    let mut tbs = tbs_el.reader();
    let version = if tbs.peek_tag() == Some(tag::INTEGER) {
        let v = tbs.read_small_integer()?;
        if v > 1 {
            return Err(Error::UnsupportedVersion(v.saturating_add(1)));
        }
        v
    } else {
        0
    };
    let (inner_alg, inner_alg_el) = read_signature_algorithm(&mut tbs)?;
    if outer_alg != inner_alg || outer_alg_el.raw() != inner_alg_el.raw() {
        return Err(Error::SignatureAlgorithmMismatch);
    }

    let issuer = DecodedName::read(&mut tbs)?;
    let this_update = Asn1Time::read(&mut tbs)?;
    let next_update = match tbs.peek_tag() {
        Some(tag::UTC_TIME | tag::GENERALIZED_TIME) => Some(Asn1Time::read(&mut tbs)?),
        _ => None,
    };

    let mut revoked = Vec::new();
    if tbs.peek_tag() == Some(tag::SEQUENCE) {
        let mut entries = tbs.read_sequence()?;
        while !entries.is_empty() {
            revoked.push(read_entry(&mut entries)?);
        }
    }

    let mut authority_key_id = None;
    let mut crl_number = None;
    if let Some(el) = tbs.read_optional(tag::explicit(0))? {
        let mut r = el.reader();
        let seq = r.read_sequence()?;
        r.finish("crlExtensions")?;
        for raw in read_raw_extensions(seq)? {
            let mut value = Reader::new(raw.value);
            match ExtensionId::from_der(raw.oid) {
                Some(ExtensionId::AuthorityKeyId) => {
                    let mut akid = value.read_sequence()?;
                    if let Some(key_id) = akid.read_optional(tag::context(0))? {
                        authority_key_id = Some(normalize_key_id(key_id.content()));
                    }
                }
                Some(ExtensionId::CrlNumber) => {
                    crl_number = Some(value.read_integer()?.to_vec());
                    value.finish("cRLNumber")?;
                }
                _ => debug!(
                    oid = %oid::to_dotted(raw.oid).unwrap_or_default(),
                    critical = raw.critical,
                    "ignoring CRL extension"
                ),
            }
        }
    }
    tbs.finish("TBSCertList")?;

    Ok(DecodedCrl {
        raw: list_el.raw().to_vec(),
        tbs: tbs_el.raw().to_vec(),
        version: version + 1,
        signature_algorithm: inner_alg,
        issuer,
        this_update,
        next_update,
        revoked,
        authority_key_id,
        crl_number,
        signature,
    })
}

fn read_entry(entries: &mut Reader<'_>) -> Result<RevokedEntry> {
    let mut entry = entries.read_sequence()?;
    let serial = entry.read_integer()?.to_vec();
    let revocation_date = Asn1Time::read(&mut entry)?;
    let mut reason = None;
    if !entry.is_empty() {
        let exts = entry.read_sequence()?;
        for raw in read_raw_extensions(exts)? {
            if ExtensionId::from_der(raw.oid) == Some(ExtensionId::CrlReason) {
                let mut value = Reader::new(raw.value);
                let code = value.read_enumerated()?;
                value.finish("CRLReason")?;
                reason = Some(u8::try_from(code).map_err(|_| Error::Malformed("CRLReason"))?);
            }
        }
    }
    entry.finish("revokedCertificate")?;
    Ok(RevokedEntry {
        serial,
        revocation_date,
        reason,
    })
}

impl DecodedCrl {
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// The exact signed `TBSCertList` bytes.
    pub fn tbs(&self) -> &[u8] {
        &self.tbs
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn signature_algorithm(&self) -> SignatureAlgorithm {
        self.signature_algorithm
    }

    pub fn issuer(&self) -> &DecodedName {
        &self.issuer
    }

    pub fn this_update(&self) -> &Asn1Time {
        &self.this_update
    }

    pub fn next_update(&self) -> Option<&Asn1Time> {
        self.next_update.as_ref()
    }

    /// Revoked entries in encoded order.
    pub fn revoked(&self) -> &[RevokedEntry] {
        &self.revoked
    }

    pub fn authority_key_id(&self) -> Option<&[u8]> {
        self.authority_key_id.as_deref()
    }

    pub fn crl_number(&self) -> Option<&[u8]> {
        self.crl_number.as_deref()
    }

    /// CRL number as colon-separated hex.
    pub fn crl_number_hex(&self) -> Option<String> {
        self.crl_number.as_deref().map(util::hex_colon_lower)
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Entry for `serial`, if revoked.
    pub fn find(&self, serial: &[u8]) -> Option<&RevokedEntry> {
        self.revoked.iter().find(|e| e.serial == serial)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CRL: &[u8] = include_bytes!("../tests/data/intermediate.crl");

    #[test]
    fn decodes_fixture() {
        let crl = decode_crl(CRL).unwrap();
        assert_eq!(crl.version(), 2);
        assert_eq!(crl.signature_algorithm(), SignatureAlgorithm::EcdsaWithSha256);
        assert_eq!(
            crl.issuer().common_name(),
            Some("Trustcheck EC Intermediate")
        );
        assert_eq!(crl.this_update().timestamp(), 1_748_736_000);
        assert_eq!(crl.next_update().unwrap().timestamp(), 1_780_272_000);
        assert_eq!(crl.crl_number(), Some(&[42u8][..]));
        assert_eq!(crl.authority_key_id().unwrap().len(), 20);
        assert_eq!(crl.revoked().len(), 2);
    }

    #[test]
    fn entry_reasons() {
        let crl = decode_crl(CRL).unwrap();
        let bad = crl.find(&[0x0b, 0xad]).unwrap();
        assert_eq!(bad.reason, Some(1));
        assert_eq!(bad.reason_name(), "keyCompromise");
        // 0x0DEAD has its high bit set, so the sign pad is stripped
        let dead = crl.find(&[0xde, 0xad]).unwrap();
        assert_eq!(dead.reason, None);
        assert_eq!(dead.reason_name(), "unspecified");
        assert!(crl.find(&[0xc0, 0xff, 0xee]).is_none());
    }

    #[test]
    fn reason_names() {
        assert_eq!(reason_name(6), "certificateHold");
        assert_eq!(reason_name(7), "unspecified");
        assert_eq!(reason_name(10), "aACompromise");
    }

    #[test]
    fn trailing_data_rejected() {
        let mut der = CRL.to_vec();
        der.extend_from_slice(&[0x05, 0x00]);
        assert!(matches!(decode_crl(&der), Err(Error::TrailingData(_))));
    }
}

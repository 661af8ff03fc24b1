//! X.509v3 extension decoding.
//!
//! [`Extensions::read`] walks the `Extensions` SEQUENCE once and dispatches
//! each entry on its OID. Decode errors in a recognized extension abort
//! immediately. An unrecognized extension marked critical does not: the
//! scan finishes first, so a caller-supplied
//! [`critical_extension_callback`](DecodeOptions::critical_extension_callback)
//! gets to see every unknown critical OID, and only those it refuses are
//! reported as [`Error::UnsupportedCriticalExtension`].

use crate::der::{tag, Element, Reader};
use crate::fields::{AltName, ExtKeyUsage, GeneralSubtree, KeyUsage, NameConstraints};
use crate::name::DecodedName;
use crate::oid::{self, AccessMethod, ExtensionId, KeyPurpose};
use crate::{Error, Result};
use digest::Digest;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Length of a SHA-1 key identifier.
pub const KEY_ID_LEN: usize = 20;

/// Largest pathLenConstraint accepted.
pub const MAX_PATH_LEN: u32 = 127;

/// Permissive hook for unknown critical extensions: receives the dotted OID
/// and the raw extension value, returns `true` to accept it.
pub type CriticalExtensionCallback = fn(oid: &str, value: &[u8]) -> bool;

/// Parse-time policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    /// Accept an extensions block on a v1 or v2 certificate.
    pub allow_legacy_extensions: bool,
    /// Accept duplicate certificate policy OIDs.
    pub lenient_policies: bool,
    pub critical_extension_callback: Option<CriticalExtensionCallback>,
}

/// BasicConstraints contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BasicConstraints {
    pub ca: bool,
    pub path_len: Option<u8>,
}

/// One extension as it appeared on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionEntry {
    /// Dotted OID.
    pub oid: String,
    /// Short name if the OID is known.
    pub name: Option<&'static str>,
    pub critical: bool,
    #[serde(serialize_with = "crate::util::serialize_hex")]
    pub value: Vec<u8>,
}

/// Decoded certificate extensions.
///
/// Every field is `None` (or empty) unless the extension was present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Extensions {
    pub basic_constraints: Option<BasicConstraints>,
    pub key_usage: Option<KeyUsage>,
    pub ext_key_usage: Option<ExtKeyUsage>,
    #[serde(serialize_with = "crate::util::serialize_hex_opt")]
    pub subject_key_id: Option<Vec<u8>>,
    #[serde(serialize_with = "crate::util::serialize_hex_opt")]
    pub authority_key_id: Option<Vec<u8>>,
    pub alt_names: Option<Vec<AltName>>,
    pub name_constraints: Option<NameConstraints>,
    /// URI of the first CRL distribution point.
    pub crl_distribution_point: Option<String>,
    /// OCSP responder URI from AuthorityInfoAccess.
    pub ocsp_responder: Option<String>,
    /// Policy OIDs in dotted form.
    pub policies: Option<Vec<String>>,
    /// Unknown critical extensions accepted by the callback.
    pub accepted_critical: Vec<String>,
    /// Every extension in encoded order.
    pub entries: Vec<ExtensionEntry>,
}

/// One `Extension` SEQUENCE, borrowed from the source buffer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawExtension<'a> {
    pub oid: &'a [u8],
    pub critical: bool,
    pub value: &'a [u8],
}

/// Read every `Extension` from a reader positioned inside `Extensions`.
pub(crate) fn read_raw_extensions<'a>(mut reader: Reader<'a>) -> Result<Vec<RawExtension<'a>>> {
    let mut out = Vec::new();
    while !reader.is_empty() {
        let mut ext = reader.read_sequence()?;
        let oid = ext.read_object_id()?;
        let critical = if ext.peek_tag() == Some(tag::BOOLEAN) {
            ext.read_boolean()?
        } else {
            false
        };
        let value = ext.read_octet_string()?;
        ext.finish("Extension")?;
        out.push(RawExtension {
            oid,
            critical,
            value,
        });
    }
    Ok(out)
}

/// Copy a key identifier if it is SHA-1 sized, otherwise hash it down.
pub fn normalize_key_id(id: &[u8]) -> Vec<u8> {
    if id.len() == KEY_ID_LEN {
        id.to_vec()
    } else {
        sha1::Sha1::digest(id).to_vec()
    }
}

impl Extensions {
    /// Decode the `Extensions` SEQUENCE at the reader's cursor.
    pub fn read(reader: &mut Reader<'_>, options: &DecodeOptions) -> Result<Self> {
        let seq = reader.read_sequence()?;
        let mut exts = Extensions::default();
        let mut seen = HashSet::new();
        let mut unknown_critical: Vec<String> = Vec::new();

        for raw in read_raw_extensions(seq)? {
            let dotted = oid::to_dotted(raw.oid)?;
            let id = ExtensionId::from_der(raw.oid);
            exts.entries.push(ExtensionEntry {
                oid: dotted.clone(),
                name: id.map(ExtensionId::name),
                critical: raw.critical,
                value: raw.value.to_vec(),
            });

            let handled = match id {
                Some(id) if is_handled(id) => {
                    if !seen.insert(id) {
                        return Err(Error::DuplicateExtension(id.name().to_string()));
                    }
                    exts.decode_one(id, raw.value, options)?;
                    true
                }
                _ => false,
            };

            if !handled && raw.critical {
                match options.critical_extension_callback {
                    Some(cb) if cb(&dotted, raw.value) => {
                        warn!(oid = %dotted, "accepting unknown critical extension");
                        exts.accepted_critical.push(dotted);
                    }
                    _ => unknown_critical.push(dotted),
                }
            }
        }

        if let Some(first) = unknown_critical.into_iter().next() {
            return Err(Error::UnsupportedCriticalExtension(first));
        }
        Ok(exts)
    }

    fn decode_one(&mut self, id: ExtensionId, value: &[u8], options: &DecodeOptions) -> Result<()> {
        let mut r = Reader::new(value);
        match id {
            ExtensionId::BasicConstraints => {
                self.basic_constraints = Some(decode_basic_constraints(&mut r)?);
            }
            ExtensionId::KeyUsage => {
                let bits = r.read_bit_string(false)?;
                self.key_usage = Some(KeyUsage::from_bits(bits.bytes));
            }
            ExtensionId::ExtKeyUsage => {
                self.ext_key_usage = Some(decode_ext_key_usage(&mut r)?);
            }
            ExtensionId::SubjectKeyId => {
                self.subject_key_id = Some(normalize_key_id(r.read_octet_string()?));
            }
            ExtensionId::AuthorityKeyId => {
                let mut seq = r.read_sequence()?;
                if let Some(key_id) = seq.read_optional(tag::context(0))? {
                    self.authority_key_id = Some(normalize_key_id(key_id.content()));
                }
                // authorityCertIssuer and serial are not used for matching
                while !seq.is_empty() {
                    seq.skip()?;
                }
            }
            ExtensionId::SubjectAltName => {
                let mut seq = r.read_sequence()?;
                let mut names = Vec::new();
                while !seq.is_empty() {
                    let el = seq.read_element()?;
                    if let Some(name) = read_general_name(&el)? {
                        names.push(name);
                    }
                }
                self.alt_names = Some(names);
            }
            ExtensionId::NameConstraints => {
                self.name_constraints = Some(decode_name_constraints(&mut r)?);
            }
            ExtensionId::CrlDistributionPoints => {
                self.crl_distribution_point = decode_crl_distribution_points(&mut r)?;
            }
            ExtensionId::AuthorityInfoAccess => {
                self.ocsp_responder = decode_authority_info_access(&mut r)?;
            }
            ExtensionId::CertificatePolicies => {
                self.policies = Some(decode_policies(&mut r, options.lenient_policies)?);
            }
            _ => return Ok(()),
        }
        r.finish(id.name())
    }

    pub fn is_ca(&self) -> bool {
        self.basic_constraints.is_some_and(|bc| bc.ca)
    }

    pub fn path_len(&self) -> Option<u8> {
        self.basic_constraints.and_then(|bc| bc.path_len)
    }

    /// Alt names, empty when the extension is absent.
    pub fn alt_names(&self) -> &[AltName] {
        self.alt_names.as_deref().unwrap_or_default()
    }

    /// Critical flag of a recognized extension, if present.
    pub fn is_critical(&self, id: ExtensionId) -> Option<bool> {
        let dotted = id.dotted();
        self.entries
            .iter()
            .find(|e| e.oid == dotted)
            .map(|e| e.critical)
    }
}

fn is_handled(id: ExtensionId) -> bool {
    matches!(
        id,
        ExtensionId::BasicConstraints
            | ExtensionId::KeyUsage
            | ExtensionId::ExtKeyUsage
            | ExtensionId::SubjectKeyId
            | ExtensionId::AuthorityKeyId
            | ExtensionId::SubjectAltName
            | ExtensionId::NameConstraints
            | ExtensionId::CrlDistributionPoints
            | ExtensionId::AuthorityInfoAccess
            | ExtensionId::CertificatePolicies
    )
}

fn decode_basic_constraints(r: &mut Reader<'_>) -> Result<BasicConstraints> {
    let mut seq = r.read_sequence()?;
    let mut bc = BasicConstraints::default();
    // an empty SEQUENCE is "not a CA"
    if seq.peek_tag() == Some(tag::BOOLEAN) {
        bc.ca = seq.read_boolean()?;
    }
    if seq.peek_tag() == Some(tag::INTEGER) {
        let len = seq.read_small_integer()?;
        if len > MAX_PATH_LEN {
            return Err(Error::Malformed("pathLenConstraint"));
        }
        bc.path_len = u8::try_from(len).ok();
    }
    seq.finish("BasicConstraints")?;
    Ok(bc)
}

fn decode_ext_key_usage(r: &mut Reader<'_>) -> Result<ExtKeyUsage> {
    let mut seq = r.read_sequence()?;
    let mut eku = ExtKeyUsage::default();
    while !seq.is_empty() {
        let purpose = seq.read_object_id()?;
        match KeyPurpose::from_der(purpose) {
            Some(KeyPurpose::Any) => {
                eku = ExtKeyUsage::ANY;
                break;
            }
            Some(KeyPurpose::ServerAuth) => eku |= ExtKeyUsage::SERVER_AUTH,
            Some(KeyPurpose::ClientAuth) => eku |= ExtKeyUsage::CLIENT_AUTH,
            Some(KeyPurpose::CodeSigning) => eku |= ExtKeyUsage::CODE_SIGNING,
            Some(KeyPurpose::EmailProtection) => eku |= ExtKeyUsage::EMAIL_PROTECTION,
            Some(KeyPurpose::TimeStamping) => eku |= ExtKeyUsage::TIME_STAMPING,
            Some(KeyPurpose::OcspSigning) => eku |= ExtKeyUsage::OCSP_SIGNING,
            _ => {}
        }
    }
    // rest of the list is irrelevant once "any" was seen
    while !seq.is_empty() {
        seq.skip()?;
    }
    Ok(eku)
}

/// Decode one `GeneralName` choice. Unsupported choices yield `None`.
pub(crate) fn read_general_name(el: &Element<'_>) -> Result<Option<AltName>> {
    let text = || String::from_utf8_lossy(el.content()).into_owned();
    let name = match el.tag {
        t if t == tag::context(1) => AltName::Email(text()),
        t if t == tag::context(2) => AltName::Dns(text()),
        t if t == tag::context(6) => {
            let uri = text();
            if !is_absolute_uri(&uri) {
                return Err(Error::InvalidAltName(uri));
            }
            AltName::Uri(uri)
        }
        t if t == tag::context(7) => AltName::Ip(format_ip(el.content())),
        t if t == tag::explicit(4) => {
            let mut r = el.reader();
            let name = DecodedName::read(&mut r)?;
            r.finish("directoryName")?;
            AltName::DirName(name.display().to_string())
        }
        t if t == tag::explicit(0) => {
            let mut r = el.reader();
            let type_id = r.read_object_id()?;
            if type_id == oid::HARDWARE_MODULE_NAME {
                let mut value = r.read_explicit(0)?;
                let mut hw = value.read_sequence()?;
                let hw_type = oid::to_dotted(hw.read_object_id()?)?;
                let serial = hex::encode(hw.read_octet_string()?);
                hw.finish("HardwareModuleName")?;
                AltName::HardwareModule { hw_type, serial }
            } else {
                AltName::Other(oid::to_dotted(type_id)?)
            }
        }
        other => {
            debug!(tag = other, "skipping unsupported GeneralName");
            return Ok(None);
        }
    };
    Ok(Some(name))
}

/// A URI must carry a scheme followed by `://`.
fn is_absolute_uri(uri: &str) -> bool {
    let Some((scheme, rest)) = uri.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && rest.starts_with("//")
}

fn format_ip(bytes: &[u8]) -> String {
    if let Ok(v4) = <[u8; 4]>::try_from(bytes) {
        std::net::Ipv4Addr::from(v4).to_string()
    } else if let Ok(v6) = <[u8; 16]>::try_from(bytes) {
        std::net::Ipv6Addr::from(v6).to_string()
    } else {
        // address/mask pairs from name constraints and junk lengths
        hex::encode(bytes)
    }
}

fn decode_name_constraints(r: &mut Reader<'_>) -> Result<NameConstraints> {
    let mut seq = r.read_sequence()?;
    let mut nc = NameConstraints::default();
    if let Some(permitted) = seq.read_optional(tag::explicit(0))? {
        nc.permitted = decode_subtrees(permitted.reader())?;
    }
    if let Some(excluded) = seq.read_optional(tag::explicit(1))? {
        nc.excluded = decode_subtrees(excluded.reader())?;
    }
    seq.finish("NameConstraints")?;
    Ok(nc)
}

fn decode_subtrees(mut r: Reader<'_>) -> Result<Vec<GeneralSubtree>> {
    let mut out = Vec::new();
    while !r.is_empty() {
        let mut subtree = r.read_sequence()?;
        let base = subtree.read_element()?;
        // minimum/maximum are unused in PKIX profiles
        while !subtree.is_empty() {
            subtree.skip()?;
        }
        let text = || String::from_utf8_lossy(base.content()).into_owned();
        match base.tag {
            t if t == tag::context(2) => out.push(GeneralSubtree::Dns(text())),
            t if t == tag::context(1) => out.push(GeneralSubtree::Email(text())),
            t if t == tag::explicit(4) => {
                let mut nr = base.reader();
                let name = DecodedName::read(&mut nr)?;
                nr.finish("directoryName")?;
                out.push(GeneralSubtree::DirName(name));
            }
            other => debug!(tag = other, "ignoring name constraint base type"),
        }
    }
    Ok(out)
}

fn decode_crl_distribution_points(r: &mut Reader<'_>) -> Result<Option<String>> {
    let mut seq = r.read_sequence()?;
    let mut first_uri = None;
    let mut index = 0usize;
    while !seq.is_empty() {
        let mut point = seq.read_sequence()?;
        if index > 0 {
            debug!(index, "ignoring additional CRL distribution point");
        } else if let Some(dp) = point.read_optional(tag::explicit(0))? {
            let mut dp = dp.reader();
            if let Some(full) = dp.read_optional(tag::explicit(0))? {
                let mut names = full.reader();
                while !names.is_empty() {
                    let el = names.read_element()?;
                    if let Some(AltName::Uri(uri)) = read_general_name(&el)? {
                        if first_uri.is_none() {
                            first_uri = Some(uri);
                        }
                    }
                }
            }
        }
        while !point.is_empty() {
            point.skip()?;
        }
        index += 1;
    }
    Ok(first_uri)
}

fn decode_authority_info_access(r: &mut Reader<'_>) -> Result<Option<String>> {
    let mut seq = r.read_sequence()?;
    let mut ocsp = None;
    while !seq.is_empty() {
        let mut desc = seq.read_sequence()?;
        let method = desc.read_object_id()?;
        let location = desc.read_element()?;
        desc.finish("AccessDescription")?;
        if AccessMethod::from_der(method) != Some(AccessMethod::Ocsp) || ocsp.is_some() {
            continue;
        }
        if let Some(AltName::Uri(uri)) = read_general_name(&location)? {
            ocsp = Some(uri);
        }
    }
    Ok(ocsp)
}

fn decode_policies(r: &mut Reader<'_>, lenient: bool) -> Result<Vec<String>> {
    let mut seq = r.read_sequence()?;
    let mut policies: Vec<String> = Vec::new();
    while !seq.is_empty() {
        let mut info = seq.read_sequence()?;
        let dotted = oid::to_dotted(info.read_object_id()?)?;
        // qualifiers are display-only and not retained
        while !info.is_empty() {
            info.skip()?;
        }
        if policies.contains(&dotted) {
            if !lenient {
                return Err(Error::DuplicatePolicy(dotted));
            }
            warn!(policy = %dotted, "accepting duplicate certificate policy");
            continue;
        }
        policies.push(dotted);
    }
    Ok(policies)
}

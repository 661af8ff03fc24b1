//! X.501 `Name` decoding.
//!
//! A `Name` is decoded into three views:
//!
//! - a flat display string (`/C=US/O=Org/CN=host`) built in a fixed
//!   canonical attribute order, capped at [`DISPLAY_BUDGET`] characters;
//! - [`NameFields`], one slot per recognized attribute, each recording the
//!   decoded value plus its offset and length in the source buffer;
//! - the SHA-1 hash of the whole `Name` TLV, used to match issuers to
//!   subjects without comparing names field by field.
//!
//! Unrecognized attribute types are kept for the one-line rendering but do
//! not contribute to the display string or the structured fields.

use crate::der::{tag, Reader};
use crate::oid::{self, NameAttribute};
use crate::Result;
use digest::Digest;
use serde::Serialize;
use tracing::debug;

/// Maximum length of the flat display string.
pub const DISPLAY_BUDGET: usize = 330;

/// Order attributes appear in the display string.
const CANONICAL_ORDER: &[NameAttribute] = &[
    NameAttribute::Country,
    NameAttribute::State,
    NameAttribute::Locality,
    NameAttribute::Street,
    NameAttribute::Organization,
    NameAttribute::OrgUnit,
    NameAttribute::Title,
    NameAttribute::Surname,
    NameAttribute::GivenName,
    NameAttribute::CommonName,
    NameAttribute::SerialNumber,
    NameAttribute::PostalCode,
    NameAttribute::Email,
    NameAttribute::UserId,
    NameAttribute::DomainComponent,
];

/// SHA-1 of a raw `Name` TLV.
pub fn name_hash(raw: &[u8]) -> [u8; 20] {
    sha1::Sha1::digest(raw).into()
}

/// A decoded attribute value and where it sits in the source buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameValue {
    pub value: String,
    /// Offset of the value's content octets in the buffer the name was
    /// decoded from.
    pub offset: usize,
    pub len: usize,
}

/// Recognized attributes of a name. Single-valued slots keep the first
/// occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NameFields {
    pub country: Option<NameValue>,
    pub state: Option<NameValue>,
    pub locality: Option<NameValue>,
    pub street: Option<NameValue>,
    pub organization: Option<NameValue>,
    pub org_unit: Option<NameValue>,
    pub title: Option<NameValue>,
    pub surname: Option<NameValue>,
    pub given_name: Option<NameValue>,
    pub common_name: Option<NameValue>,
    pub serial_number: Option<NameValue>,
    pub postal_code: Option<NameValue>,
    pub email: Option<NameValue>,
    pub user_id: Option<NameValue>,
    pub domain_components: Vec<NameValue>,
}

impl NameFields {
    fn record(&mut self, attr: NameAttribute, value: NameValue) {
        let slot = match attr {
            NameAttribute::Country => &mut self.country,
            NameAttribute::State => &mut self.state,
            NameAttribute::Locality => &mut self.locality,
            NameAttribute::Street => &mut self.street,
            NameAttribute::Organization => &mut self.organization,
            NameAttribute::OrgUnit => &mut self.org_unit,
            NameAttribute::Title => &mut self.title,
            NameAttribute::Surname => &mut self.surname,
            NameAttribute::GivenName => &mut self.given_name,
            NameAttribute::CommonName => &mut self.common_name,
            NameAttribute::SerialNumber => &mut self.serial_number,
            NameAttribute::PostalCode => &mut self.postal_code,
            NameAttribute::Email => &mut self.email,
            NameAttribute::UserId => &mut self.user_id,
            NameAttribute::DomainComponent => {
                self.domain_components.push(value);
                return;
            }
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }
}

/// One attribute in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameAttr {
    /// Short label (`CN`, `O`, ...) or dotted OID for unknown types.
    pub key: String,
    pub value: String,
    #[serde(skip)]
    pub kind: Option<NameAttribute>,
}

/// A fully decoded `Name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedName {
    #[serde(skip)]
    raw: Vec<u8>,
    #[serde(serialize_with = "crate::util::serialize_hex")]
    hash: [u8; 20],
    display: String,
    fields: NameFields,
    attributes: Vec<NameAttr>,
    #[serde(skip)]
    rdns: Vec<Vec<u8>>,
}

impl DecodedName {
    /// Decode the `Name` SEQUENCE at the reader's cursor.
    pub fn read(reader: &mut Reader<'_>) -> Result<Self> {
        let element = reader.read_expected(tag::SEQUENCE)?;
        let mut rdn_reader = element.reader();
        let mut fields = NameFields::default();
        let mut attributes = Vec::new();
        let mut rdns = Vec::new();

        while !rdn_reader.is_empty() {
            let set = rdn_reader.read_expected(tag::SET)?;
            rdns.push(set.raw().to_vec());
            let mut atvs = set.reader();
            while !atvs.is_empty() {
                let mut atv = atvs.read_sequence()?;
                let oid_der = atv.read_object_id()?;
                let value_el = atv.read_element()?;
                atv.finish("AttributeTypeAndValue")?;

                let value = decode_string(value_el.tag, value_el.content());
                let kind = NameAttribute::from_der(oid_der);
                match kind {
                    Some(attr) => fields.record(
                        attr,
                        NameValue {
                            value: value.clone(),
                            offset: value_el.content_start,
                            len: value_el.content().len(),
                        },
                    ),
                    None => debug!(
                        oid = %oid::to_dotted(oid_der).unwrap_or_default(),
                        "skipping unrecognized name attribute"
                    ),
                }
                let key = match kind {
                    Some(attr) => attr.name().to_string(),
                    None => oid::to_dotted(oid_der)?,
                };
                attributes.push(NameAttr { key, value, kind });
            }
        }

        let raw = element.raw().to_vec();
        let display = build_display(&attributes);
        Ok(DecodedName {
            hash: name_hash(&raw),
            raw,
            display,
            fields,
            attributes,
            rdns,
        })
    }

    /// Decode a standalone DER `Name`.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(der);
        let name = Self::read(&mut reader)?;
        reader.finish("Name")?;
        Ok(name)
    }

    /// The complete `Name` TLV.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// SHA-1 of [`raw`](Self::raw).
    pub fn hash(&self) -> &[u8; 20] {
        &self.hash
    }

    /// Flat `/KEY=value` rendering in canonical order.
    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn fields(&self) -> &NameFields {
        &self.fields
    }

    /// Attributes in the order they were encoded.
    pub fn attributes(&self) -> &[NameAttr] {
        &self.attributes
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn common_name(&self) -> Option<&str> {
        self.fields.common_name.as_ref().map(|v| v.value.as_str())
    }

    /// Every emailAddress attribute, in source order.
    pub fn emails(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .filter(|a| a.kind == Some(NameAttribute::Email))
            .map(|a| a.value.as_str())
    }

    /// Whether this name lies in the subtree rooted at `base`: every RDN of
    /// `base` matches the corresponding leading RDN of `self`.
    pub fn is_within(&self, base: &DecodedName) -> bool {
        base.rdns.len() <= self.rdns.len()
            && base.rdns.iter().zip(&self.rdns).all(|(b, s)| b == s)
    }

    /// Format as a comma-separated one-line string matching OpenSSL's default format.
    /// Example: "C = US, O = Org, CN = example.com"
    ///
    /// Values containing commas, equals signs, or backslashes are escaped
    /// to prevent ambiguous output.
    pub fn to_oneline(&self) -> String {
        let mut result = String::new();
        for (i, attr) in self.attributes.iter().enumerate() {
            if i > 0 {
                result.push_str(", ");
            }
            result.push_str(&attr.key);
            result.push_str(" = ");
            for ch in attr.value.chars() {
                match ch {
                    '\\' => result.push_str("\\\\"),
                    ',' => result.push_str("\\,"),
                    '=' => result.push_str("\\="),
                    _ => result.push(ch),
                }
            }
        }
        result
    }
}

impl std::fmt::Display for DecodedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_oneline())
    }
}

fn build_display(attributes: &[NameAttr]) -> String {
    let mut out = String::new();
    for kind in CANONICAL_ORDER {
        for attr in attributes.iter().filter(|a| a.kind == Some(*kind)) {
            let piece = format!("/{}={}", kind.name(), attr.value);
            if out.chars().count() + piece.chars().count() > DISPLAY_BUDGET {
                debug!(attribute = kind.name(), "name value dropped from display string");
                continue;
            }
            out.push_str(&piece);
        }
    }
    out
}

/// Decode a DirectoryString-family value to text.
#[allow(clippy::indexing_slicing)] // chunks_exact fixes the chunk width
pub(crate) fn decode_string(string_tag: u8, bytes: &[u8]) -> String {
    match string_tag {
        tag::BMP_STRING => {
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        tag::UNIVERSAL_STRING => bytes
            .chunks_exact(4)
            .map(|c| {
                char::from_u32(u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                    .unwrap_or(char::REPLACEMENT_CHARACTER)
            })
            .collect(),
        // Teletex is treated as Latin-1
        tag::T61_STRING => bytes.iter().map(|&b| char::from(b)).collect(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

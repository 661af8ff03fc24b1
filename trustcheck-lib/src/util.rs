//! PEM helpers and shared formatting utilities.
//!
//! The decoders only ever consume DER; these helpers strip PEM armour
//! using x509-parser's PEM reader so the CLI and trust store can accept
//! either form.

use crate::{Error, Result};
use x509_parser::pem::Pem;

/// Whether `input` looks like PEM (begins with `-----BEGIN` after leading
/// whitespace).
pub fn is_pem(input: &[u8]) -> bool {
    let start = input
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(input.len());
    input
        .get(start..)
        .is_some_and(|rest| rest.starts_with(b"-----BEGIN"))
}

/// Extract every PEM block whose label is in `labels`.
///
/// Trailing garbage after at least one good block is ignored; a parse
/// error before any block is found is reported.
fn pem_blocks(input: &[u8], labels: &[&str], what: &str) -> Result<Vec<Vec<u8>>> {
    let mut out = Vec::new();
    for pem_result in Pem::iter_from_buffer(input) {
        match pem_result {
            Ok(pem) => {
                if labels.contains(&pem.label.as_str()) {
                    out.push(pem.contents);
                }
            }
            Err(e) => {
                if !out.is_empty() {
                    break;
                }
                return Err(Error::Pem(format!("failed to parse {} PEM: {}", what, e)));
            }
        }
    }
    if out.is_empty() {
        return Err(Error::Pem(format!("no {} found in PEM input", what)));
    }
    Ok(out)
}

/// Parse a PEM file containing one or more certificates into DER blobs.
pub fn parse_pem_chain(input: &[u8]) -> Result<Vec<Vec<u8>>> {
    pem_blocks(
        input,
        &["CERTIFICATE", "TRUSTED CERTIFICATE", "X509 CERTIFICATE"],
        "certificates",
    )
}

/// Parse a PEM file containing one or more CRLs into DER blobs.
pub fn parse_pem_crl(input: &[u8]) -> Result<Vec<Vec<u8>>> {
    pem_blocks(input, &["X509 CRL"], "CRLs")
}

/// Format bytes as colon-separated uppercase hex (e.g., "AB:CD:EF").
pub fn hex_colon_upper(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Format bytes as colon-separated lowercase hex, OpenSSL's serial style.
pub fn hex_colon_lower(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Serde helper rendering a byte field as lowercase hex.
pub(crate) fn serialize_hex<T, S>(bytes: &T, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: serde::Serializer,
{
    serializer.serialize_str(&hex::encode(bytes))
}

/// Like [`serialize_hex`] for optional fields.
pub(crate) fn serialize_hex_opt<T, S>(
    bytes: &Option<T>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: serde::Serializer,
{
    match bytes {
        Some(b) => serializer.serialize_some(&hex::encode(b)),
        None => serializer.serialize_none(),
    }
}

//! Human-readable and JSON formatting of decoded objects.

use crate::crl::DecodedCrl;
use crate::ext::Extensions;
use crate::fingerprint::DigestAlgorithm;
use crate::ocsp::{CertStatus, OcspResponse};
use crate::oid::ExtensionId;
use crate::parser::DecodedCertificate;
use crate::util::hex_colon_upper;
use crate::Result;
use serde::Serialize;
use std::fmt::Write;

/// Format certificate information as human-readable text.
///
/// If `show_all` is true, includes signature bytes and full public key details.
pub fn display_text(cert: &DecodedCertificate, show_all: bool) -> String {
    let mut out = String::new();

    out.push_str("Certificate:\n");
    let _ = writeln!(out, "  Version: {} (0x{:x})", cert.version(), cert.version() - 1);
    let _ = writeln!(out, "  Serial: {}", cert.serial_hex());
    let _ = writeln!(out, "  Signature Algorithm: {}", cert.signature_algorithm());
    let _ = writeln!(out, "  Issuer: {}", cert.issuer().display());
    out.push_str("  Validity:\n");
    let _ = writeln!(out, "    Not Before: {}", cert.not_before().to_openssl());
    let _ = writeln!(out, "    Not After:  {}", cert.not_after().to_openssl());
    let _ = writeln!(out, "  Subject: {}", cert.subject().display());

    // Public key summary
    let key = cert.public_key();
    out.push_str("  Public Key:\n");
    let _ = write!(out, "    Algorithm: {}", key.algorithm());
    if let Some(bits) = key.key_size() {
        let _ = write!(out, " ({} bit)", bits);
    }
    if let Some(curve) = key.curve() {
        let _ = write!(out, " [{}]", curve.display_name());
    }
    out.push('\n');

    if show_all {
        if let Some(modulus) = key.modulus_hex() {
            let _ = writeln!(out, "    Modulus: {}", truncate(&modulus, 40));
        }
        if let Some(exponent) = key.exponent() {
            let _ = writeln!(out, "    Exponent: {} (0x{:x})", exponent, exponent);
        }
    }

    if !cert.extensions().entries.is_empty() {
        out.push_str("  Extensions:\n");
        format_extensions(&mut out, cert.extensions());
    }

    if cert.is_self_signed() {
        out.push_str("  Self-signed: yes\n");
    }

    let fp = cert.fingerprint(DigestAlgorithm::Sha256);
    let _ = writeln!(out, "  Fingerprint (SHA-256): {}", fp);

    if show_all {
        let sig = hex::encode_upper(cert.signature());
        let _ = writeln!(out, "  Signature: {}", truncate(&sig, 40));
    }

    out
}

fn format_extensions(out: &mut String, ext: &Extensions) {
    for entry in &ext.entries {
        let critical = if entry.critical { " [critical]" } else { "" };
        let name = entry.name.unwrap_or(entry.oid.as_str());
        let _ = write!(out, "    {}:{}", name, critical);
        let id = ExtensionId::ALL.iter().copied().find(|id| id.dotted() == entry.oid);
        match id {
            Some(ExtensionId::BasicConstraints) => {
                let bc = ext.basic_constraints.unwrap_or_default();
                let _ = write!(out, " CA={}", bc.ca);
                if let Some(n) = bc.path_len {
                    let _ = write!(out, ", pathlen:{}", n);
                }
            }
            Some(ExtensionId::KeyUsage) => {
                if let Some(ku) = ext.key_usage {
                    let _ = write!(out, " {}", ku.names().join(", "));
                }
            }
            Some(ExtensionId::ExtKeyUsage) => {
                if let Some(eku) = ext.ext_key_usage {
                    let _ = write!(out, " {}", eku.names().join(", "));
                }
            }
            Some(ExtensionId::SubjectKeyId) => {
                if let Some(id) = &ext.subject_key_id {
                    let _ = write!(out, " {}", hex_colon_upper(id));
                }
            }
            Some(ExtensionId::AuthorityKeyId) => {
                if let Some(id) = &ext.authority_key_id {
                    let _ = write!(out, " keyid:{}", hex_colon_upper(id));
                }
            }
            Some(ExtensionId::SubjectAltName) => {
                let names: Vec<String> = ext.alt_names().iter().map(|n| n.to_string()).collect();
                let _ = write!(out, " {}", names.join(", "));
            }
            Some(ExtensionId::NameConstraints) => {
                if let Some(nc) = &ext.name_constraints {
                    for p in &nc.permitted {
                        let _ = write!(out, "\n      Permitted: {}", p);
                    }
                    for x in &nc.excluded {
                        let _ = write!(out, "\n      Excluded: {}", x);
                    }
                }
            }
            Some(ExtensionId::CrlDistributionPoints) => {
                if let Some(uri) = &ext.crl_distribution_point {
                    let _ = write!(out, " {}", uri);
                }
            }
            Some(ExtensionId::AuthorityInfoAccess) => {
                if let Some(uri) = &ext.ocsp_responder {
                    let _ = write!(out, " OCSP - {}", uri);
                }
            }
            Some(ExtensionId::CertificatePolicies) => {
                if let Some(policies) = &ext.policies {
                    let _ = write!(out, " {}", policies.join(", "));
                }
            }
            _ => {
                let value = hex::encode_upper(&entry.value);
                let _ = write!(out, " {}", truncate(&value, 40));
            }
        }
        out.push('\n');
    }
}

/// Format a CRL as human-readable text.
pub fn crl_text(crl: &DecodedCrl) -> String {
    let mut out = String::new();
    out.push_str("Certificate Revocation List:\n");
    let _ = writeln!(out, "  Version: {}", crl.version());
    let _ = writeln!(out, "  Signature Algorithm: {}", crl.signature_algorithm());
    let _ = writeln!(out, "  Issuer: {}", crl.issuer().display());
    let _ = writeln!(out, "  Last Update: {}", crl.this_update().to_openssl());
    match crl.next_update() {
        Some(next) => {
            let _ = writeln!(out, "  Next Update: {}", next.to_openssl());
        }
        None => out.push_str("  Next Update: NONE\n"),
    }
    if let Some(number) = crl.crl_number_hex() {
        let _ = writeln!(out, "  CRL Number: {}", number);
    }
    if let Some(id) = crl.authority_key_id() {
        let _ = writeln!(out, "  Authority Key Identifier: {}", hex_colon_upper(id));
    }
    if crl.revoked().is_empty() {
        out.push_str("  No Revoked Certificates.\n");
    } else {
        out.push_str("  Revoked Certificates:\n");
        for entry in crl.revoked() {
            let _ = writeln!(
                out,
                "    Serial: {}  Date: {}  Reason: {}",
                crate::util::hex_colon_lower(&entry.serial),
                entry.revocation_date.to_openssl(),
                entry.reason_name()
            );
        }
    }
    out
}

/// Format an OCSP response as human-readable text.
pub fn ocsp_text(response: &OcspResponse) -> String {
    let mut out = String::new();
    out.push_str("OCSP Response:\n");
    let _ = writeln!(out, "  Response Status: {}", response.status());
    let Some(basic) = response.basic() else {
        return out;
    };
    let _ = writeln!(out, "  Version: {}", basic.version());
    let _ = writeln!(out, "  Responder Id: {}", basic.responder_id());
    let _ = writeln!(out, "  Produced At: {}", basic.produced_at().to_openssl());
    if let Some(nonce) = response.nonce() {
        let _ = writeln!(out, "  Nonce: {}", hex_colon_upper(nonce));
    }
    out.push_str("  Responses:\n");
    for single in response.responses() {
        let id = &single.cert_id;
        let _ = writeln!(out, "    Certificate ID:");
        let _ = writeln!(out, "      Hash Algorithm: {}", id.hash_algorithm);
        let _ = writeln!(out, "      Issuer Name Hash: {}", hex::encode_upper(&id.issuer_name_hash));
        let _ = writeln!(out, "      Issuer Key Hash: {}", hex::encode_upper(&id.issuer_key_hash));
        let _ = writeln!(out, "      Serial Number: {}", hex::encode_upper(&id.serial));
        let _ = writeln!(out, "    Cert Status: {}", single.status);
        if let CertStatus::Revoked { time, .. } = &single.status {
            let _ = writeln!(out, "    Revocation Time: {}", time.to_openssl());
        }
        let _ = writeln!(out, "    This Update: {}", single.this_update.to_openssl());
        if let Some(next) = &single.next_update {
            let _ = writeln!(out, "    Next Update: {}", next.to_openssl());
        }
    }
    let _ = writeln!(out, "  Signature Algorithm: {}", basic.signature_algorithm());
    for cert in basic.certs() {
        let _ = writeln!(out, "  Certificate: {}", cert.subject().display());
    }
    out
}

/// Serialize a decoded object to a pretty-printed JSON string.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn truncate(s: &str, max: usize) -> String {
    match s.get(..max) {
        Some(head) if s.len() > max => format!("{}...", head),
        _ => s.to_string(),
    }
}

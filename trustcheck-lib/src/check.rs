//! Certificate validity checks: expiry, hostname, email matching.

use crate::fields::AltName;
use crate::parser::DecodedCertificate;
use crate::time::{Clock, SystemClock};

/// Check if the certificate expires within `seconds` from now.
///
/// Returns `true` if the certificate will still be valid after `seconds` have
/// elapsed. Returns `false` if it will have expired by then (or is already expired).
pub fn check_expiry(cert: &DecodedCertificate, seconds: u64) -> bool {
    check_expiry_at(cert, seconds, SystemClock.now())
}

/// [`check_expiry`] against a fixed instant.
pub fn check_expiry_at(cert: &DecodedCertificate, seconds: u64, now: i64) -> bool {
    let horizon = now.saturating_add(i64::try_from(seconds).unwrap_or(i64::MAX));
    !cert.is_expired(now) && horizon <= cert.not_after().timestamp()
}

/// Check if the certificate matches the given hostname.
///
/// Checks SAN DNS entries first; falls back to CN only if no SAN DNS entries exist.
/// Supports wildcard matching (e.g., `*.example.com`).
pub fn check_host(cert: &DecodedCertificate, hostname: &str) -> bool {
    let host = hostname.trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() {
        return false;
    }
    let mut dns_names = cert
        .alt_names()
        .iter()
        .filter_map(|name| match name {
            AltName::Dns(d) => Some(d.as_str()),
            _ => None,
        })
        .peekable();
    if dns_names.peek().is_some() {
        return dns_names.any(|pattern| hostname_matches(pattern, &host));
    }
    cert.subject()
        .common_name()
        .is_some_and(|cn| hostname_matches(cn, &host))
}

/// Check if the certificate matches the given email address.
///
/// Checks SAN email entries and subject emailAddress attribute. The local
/// part is compared exactly, the domain case-insensitively.
pub fn check_email(cert: &DecodedCertificate, email: &str) -> bool {
    let san = cert.alt_names().iter().filter_map(|name| match name {
        AltName::Email(e) => Some(e.as_str()),
        _ => None,
    });
    san.chain(cert.subject().emails())
        .any(|candidate| email_eq(candidate, email))
}

/// RFC 6125 section 6.4.3: a wildcard is only honoured as the whole
/// left-most label and never matches more than one label.
fn hostname_matches(pattern: &str, host: &str) -> bool {
    let pattern = pattern.trim_end_matches('.').to_ascii_lowercase();
    match pattern.strip_prefix("*.") {
        Some(suffix) => {
            // "*.com" style patterns are too broad
            if !suffix.contains('.') {
                return false;
            }
            match host.split_once('.') {
                Some((label, rest)) => !label.is_empty() && rest == suffix,
                None => false,
            }
        }
        None => !pattern.contains('*') && pattern == host,
    }
}

fn email_eq(candidate: &str, email: &str) -> bool {
    match (candidate.rsplit_once('@'), email.rsplit_once('@')) {
        (Some((cl, cd)), Some((el, ed))) => cl == el && cd.eq_ignore_ascii_case(ed),
        _ => false,
    }
}

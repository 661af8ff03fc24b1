//! Name Constraints checking (RFC 5280 Section 4.2.1.10).
//!
//! A name type is only checked when the certificate carries at least one
//! name of that type and the constraints carry at least one subtree of
//! that type. Within a checked type, every name must fall inside some
//! permitted subtree (when any are listed) and inside no excluded one.

use crate::fields::{AltName, GeneralSubtree, NameConstraints};
use crate::name::DecodedName;
use crate::parser::DecodedCertificate;
use crate::{Error, Result};

/// Maximum work factor for Name Constraints checking (names × subtrees).
pub(crate) const MAX_NC_WORK_FACTOR: usize = 65_536;

/// Check every DNS, email and directory name of `cert` against `nc`.
pub(crate) fn check_name_constraints(cert: &DecodedCertificate, nc: &NameConstraints) -> Result<()> {
    let mut dns_names = Vec::new();
    let mut emails = Vec::new();
    for name in cert.alt_names() {
        match name {
            AltName::Dns(d) => dns_names.push(d.to_ascii_lowercase()),
            AltName::Email(e) => emails.push(e.to_ascii_lowercase()),
            _ => {}
        }
    }
    emails.extend(cert.subject().emails().map(str::to_ascii_lowercase));

    let total_names = dns_names.len() + emails.len() + 1;
    let total_subtrees = nc.permitted.len() + nc.excluded.len();
    if total_names.saturating_mul(total_subtrees) > MAX_NC_WORK_FACTOR {
        return Err(Error::NameConstraintViolation(format!(
            "too many names to check ({} names x {} subtrees)",
            total_names, total_subtrees
        )));
    }

    check_type(&dns_names, nc, dns_subtree, "DNS", |name, c| {
        dns_name_matches_constraint(name, &c.to_ascii_lowercase())
    })?;
    check_type(&emails, nc, email_subtree, "email", |name, c| {
        email_matches_constraint(name, &c.to_ascii_lowercase())
    })?;
    if !cert.subject().is_empty() {
        let subject = [cert.subject().clone()];
        check_type(&subject, nc, dir_subtree, "DirName", |name, base| {
            name.is_within(base)
        })?;
    }
    Ok(())
}

fn dns_subtree(subtree: &GeneralSubtree) -> Option<&str> {
    match subtree {
        GeneralSubtree::Dns(c) => Some(c),
        _ => None,
    }
}

fn email_subtree(subtree: &GeneralSubtree) -> Option<&str> {
    match subtree {
        GeneralSubtree::Email(c) => Some(c),
        _ => None,
    }
}

fn dir_subtree(subtree: &GeneralSubtree) -> Option<&DecodedName> {
    match subtree {
        GeneralSubtree::DirName(base) => Some(base),
        _ => None,
    }
}

/// Apply the permitted and excluded subtrees of one name type.
fn check_type<N, C>(
    names: &[N],
    nc: &NameConstraints,
    select: fn(&GeneralSubtree) -> Option<&C>,
    label: &str,
    matches: impl Fn(&N, &C) -> bool,
) -> Result<()>
where
    N: std::fmt::Display,
    C: ?Sized,
{
    if names.is_empty() {
        return Ok(());
    }
    let permitted: Vec<&C> = nc.permitted.iter().filter_map(select).collect();
    let excluded: Vec<&C> = nc.excluded.iter().filter_map(select).collect();
    for name in names {
        if !permitted.is_empty() && !permitted.iter().any(|c| matches(name, c)) {
            return Err(Error::NameConstraintViolation(format!(
                "{} name {} is not permitted",
                label, name
            )));
        }
        if excluded.iter().any(|c| matches(name, c)) {
            return Err(Error::NameConstraintViolation(format!(
                "{} name {} is excluded",
                label, name
            )));
        }
    }
    Ok(())
}

/// Check if a DNS name matches a Name Constraint.
///
/// RFC 5280: A constraint of ".example.com" matches "host.example.com" but
/// not "example.com". A constraint of "example.com" matches both
/// "example.com" and "host.example.com".
pub(crate) fn dns_name_matches_constraint(name: &str, constraint: &str) -> bool {
    if constraint.is_empty() {
        return true;
    }
    if constraint.starts_with('.') {
        name.ends_with(constraint)
    } else {
        name == constraint
            || (name.len() > constraint.len()
                && name.ends_with(constraint)
                && name.as_bytes().get(name.len() - constraint.len() - 1) == Some(&b'.'))
    }
}

/// Check if an email matches a Name Constraint.
///
/// A full address matches exactly, "example.com" matches any mailbox on
/// that host and ".example.com" any mailbox on a subdomain.
pub(crate) fn email_matches_constraint(email: &str, constraint: &str) -> bool {
    if constraint.is_empty() {
        return true;
    }
    if constraint.contains('@') {
        return email == constraint;
    }
    let Some((_, domain)) = email.rsplit_once('@') else {
        return false;
    };
    if constraint.starts_with('.') {
        domain.ends_with(constraint)
    } else {
        domain == constraint
    }
}

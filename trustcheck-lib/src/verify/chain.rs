//! Verification of a leaf-first certificate bundle.
//!
//! The bundle is verified from the top down. Each certificate is checked
//! against the trust store plus every CA above it that already verified,
//! so a bundle `[leaf, intermediate]` verifies against a store that only
//! holds the root.

use super::constraints::check_name_constraints;
use super::crl::{check_revocation, verify_crl};
use super::trust_store::OverlayStore;
use super::{
    find_signer, verify_certificate, ChainCertInfo, TrustStore, VerificationResult,
    VerifyOptions,
};
use crate::ext::DecodeOptions;
use crate::fields::NameConstraints;
use crate::parser::{decode_certificate, DecodedCertificate};
use crate::{DecodedCrl, Error, Result};
use tracing::debug;

/// Default limit on non-self-issued intermediates.
pub const MAX_CHAIN_DEPTH: usize = 32;

/// Verify a bundle ordered leaf first: `[leaf, intermediate..., (optional root)]`.
///
/// Checks performed:
/// 1. Depth limit (non-self-issued intermediates, 32 unless
///    `options.verify_depth` says otherwise)
/// 2. Every per-certificate check of [`verify_certificate`]
/// 3. The path length budget across the whole bundle
/// 4. Name constraints of the anchor and every CA above a certificate,
///    not only those of its direct issuer
/// 5. Revocation, when `options.crl_check_leaf` or `options.crl_check_all`
///    is set, using only the CRLs in `options.crls` that verify
pub fn verify_chain(
    certs: &[DecodedCertificate],
    store: &dyn TrustStore,
    options: &VerifyOptions,
) -> VerificationResult {
    let mut result = VerificationResult {
        is_valid: true,
        chain: certs.iter().enumerate().map(chain_info).collect(),
        ..VerificationResult::default()
    };

    if certs.is_empty() {
        result.fail(0, Error::Malformed("empty certificate chain"));
        return result;
    }

    // self-issued certificates do not count toward the depth limit
    let max_depth = options.verify_depth.unwrap_or(MAX_CHAIN_DEPTH);
    let intermediates = certs
        .iter()
        .skip(1)
        .filter(|cert| !cert.is_self_signed())
        .count();
    if intermediates > max_depth {
        result.fail(
            certs.len() - 1,
            Error::Malformed("certificate chain exceeds maximum depth"),
        );
        return result;
    }

    let mut overlay = OverlayStore::new(store);
    // remaining CA certificates allowed below the current one
    let mut budget: Option<u8> = None;
    let mut anchored = false;
    // name constraints of the anchor and every CA verified so far
    let mut inherited: Vec<NameConstraints> = Vec::new();

    for (depth, cert) in certs.iter().enumerate().rev() {
        if let Err(e) = verify_certificate(cert, &overlay, options) {
            result.fail(depth, e);
            continue;
        }

        let self_issued = cert.is_self_signed();
        if !anchored && !self_issued {
            let anchor =
                find_signer(&overlay, cert.authority_key_id(), cert.issuer().hash()).ok();
            budget = anchor.and_then(|signer| signer.path_len);
            inherited.extend(anchor.and_then(|signer| signer.name_constraints.clone()));
        }

        // self-issued intermediates are exempt, the leaf never is
        if depth == 0 || !self_issued {
            if let Err(e) = inherited
                .iter()
                .try_for_each(|nc| check_name_constraints(cert, nc))
            {
                result.fail(depth, e);
                continue;
            }
        }

        if self_issued {
            budget = cert.path_len();
        } else if depth > 0 && cert.is_ca() {
            if budget == Some(0) {
                result.fail(depth, Error::PathLengthViolation);
                continue;
            }
            budget = budget.map(|b| b.saturating_sub(1));
            budget = match (budget, cert.path_len()) {
                (Some(b), Some(own)) => Some(b.min(own)),
                (b, own) => b.or(own),
            };
        }
        anchored = true;

        if cert.is_ca() {
            inherited.extend(cert.name_constraints().cloned());
            overlay.promote(cert);
        }
    }

    if options.crl_check_leaf || options.crl_check_all {
        let crls: Vec<&DecodedCrl> = options
            .crls
            .iter()
            .filter(|crl| match verify_crl(crl, &overlay, options) {
                Ok(()) => true,
                Err(e) => {
                    debug!(issuer = %crl.issuer(), error = %e, "ignoring CRL that does not verify");
                    false
                }
            })
            .collect();
        let checked = if options.crl_check_all { certs.len() } else { 1 };
        for (depth, cert) in certs.iter().enumerate().take(checked) {
            if let Err(e) = check_revocation(cert, crls.iter().copied()) {
                result.fail(depth, e);
            }
        }
    }

    result
}

/// Decode a PEM bundle and verify it with [`verify_chain`].
pub fn verify_pem_chain(
    pem_data: &[u8],
    store: &dyn TrustStore,
    options: &VerifyOptions,
) -> Result<VerificationResult> {
    let certs = crate::util::parse_pem_chain(pem_data)?
        .iter()
        .map(|der| decode_certificate(der, &DecodeOptions::default()))
        .collect::<Result<Vec<_>>>()?;
    Ok(verify_chain(&certs, store, options))
}

fn chain_info((depth, cert): (usize, &DecodedCertificate)) -> ChainCertInfo {
    ChainCertInfo {
        depth,
        subject: cert.subject().display().to_string(),
        issuer: cert.issuer().display().to_string(),
        short_name: short_name(cert),
        serial: cert.serial_hex(),
    }
}

/// CN, else O, else OU, else the full subject.
fn short_name(cert: &DecodedCertificate) -> String {
    let subject = cert.subject();
    let fields = subject.fields();
    subject
        .common_name()
        .or(fields.organization.as_ref().map(|v| v.value.as_str()))
        .or(fields.org_unit.as_ref().map(|v| v.value.as_str()))
        .unwrap_or(subject.display())
        .to_string()
}

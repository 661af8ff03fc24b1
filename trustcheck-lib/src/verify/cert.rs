//! Single-certificate verification against a trust store.

use super::constraints::check_name_constraints;
use super::{find_signer, SignatureJob, Signer, TrustStore, VerifyOptions};
use crate::fields::KeyUsage;
use crate::parser::DecodedCertificate;
use crate::{Error, Result};
use tracing::debug;

/// Verify `cert`: validity dates (when `options.check_time`), signer
/// lookup, issuer policy and finally the signature.
pub fn verify_certificate(
    cert: &DecodedCertificate,
    store: &dyn TrustStore,
    options: &VerifyOptions,
) -> Result<()> {
    begin_certificate(cert, store, options)?.run()
}

/// Run every check except the signature confirmation, which is returned
/// as a job. Nothing is looked up if the dates are already invalid.
pub fn begin_certificate<'c>(
    cert: &'c DecodedCertificate,
    store: &dyn TrustStore,
    options: &VerifyOptions,
) -> Result<SignatureJob<'c>> {
    if options.check_time {
        let validity = cert.validity_at(options.now(), options.skew_before, options.skew_after);
        if let Some(bound) = validity.error() {
            debug!(subject = %cert.subject(), %bound, "certificate outside its validity window");
            return Err(Error::DateInvalid(bound));
        }
    }

    let signer = find_signer(store, cert.authority_key_id(), cert.issuer().hash())?;
    check_issuer_policy(cert, signer)?;

    Ok(SignatureJob::new(
        cert.signature_algorithm(),
        cert.tbs(),
        cert.signature(),
        signer.public_key.clone(),
    ))
}

/// CA flag, key usage, path length and name constraints of the issuer.
///
/// A self-issued certificate signed by a different key (a CA key rollover)
/// still needs a CA signer allowed to sign certificates.
fn check_issuer_policy(cert: &DecodedCertificate, signer: &Signer) -> Result<()> {
    let self_issued = cert.is_self_signed();
    let self_signed = self_issued && signer.public_key == *cert.public_key();
    if !self_signed {
        if !signer.is_ca {
            return Err(Error::IssuerNotCa);
        }
        // absent key usage permits everything
        if let Some(ku) = signer.key_usage {
            if !ku.contains(KeyUsage::KEY_CERT_SIGN) {
                return Err(Error::KeyUsageViolation("certificate signing"));
            }
        }
    }
    check_path_len(cert, signer, self_issued)?;
    if !self_issued {
        if let Some(nc) = &signer.name_constraints {
            check_name_constraints(cert, nc)?;
        }
    }
    Ok(())
}

/// A signer with path length 0 cannot sign a CA, and a CA's own path
/// length must be below its signer's. A self-signed certificate is its own
/// signer, so the two declared lengths must agree.
fn check_path_len(cert: &DecodedCertificate, signer: &Signer, self_signed: bool) -> Result<()> {
    if self_signed {
        return match (cert.path_len(), signer.path_len) {
            (Some(own), Some(anchor)) if own != anchor => Err(Error::PathLengthViolation),
            _ => Ok(()),
        };
    }
    if !cert.is_ca() {
        return Ok(());
    }
    match (signer.path_len, cert.path_len()) {
        (Some(0), _) => Err(Error::PathLengthViolation),
        (Some(limit), Some(own)) if own >= limit => Err(Error::PathLengthViolation),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ext::DecodeOptions;
    use crate::parser::decode_certificate;
    use crate::time::DateBound;
    use crate::verify::MemoryTrustStore;

    const ROOT: &[u8] = include_bytes!("../../tests/data/rsa_root.der");
    const INTERMEDIATE: &[u8] = include_bytes!("../../tests/data/ec_intermediate.der");
    const LEAF: &[u8] = include_bytes!("../../tests/data/ec_leaf.der");
    const RSA_LEAF: &[u8] = include_bytes!("../../tests/data/rsa_leaf.der");
    const NOW: i64 = 1_749_000_000;

    fn decode(der: &[u8]) -> DecodedCertificate {
        decode_certificate(der, &DecodeOptions::default()).unwrap()
    }

    fn at_now() -> VerifyOptions {
        VerifyOptions {
            at_time: Some(NOW),
            ..VerifyOptions::default()
        }
    }

    fn store_of(ders: &[&[u8]]) -> MemoryTrustStore {
        let mut store = MemoryTrustStore::new();
        for der in ders {
            store.add_der(der).unwrap();
        }
        store
    }

    #[test]
    fn root_verifies_against_itself() {
        let store = store_of(&[ROOT]);
        verify_certificate(&decode(ROOT), &store, &at_now()).unwrap();
    }

    #[test]
    fn leaf_with_intermediate_in_store() {
        let store = store_of(&[ROOT, INTERMEDIATE]);
        verify_certificate(&decode(INTERMEDIATE), &store, &at_now()).unwrap();
        verify_certificate(&decode(RSA_LEAF), &store, &at_now()).unwrap();
    }

    #[test]
    fn unknown_issuer() {
        let store = store_of(&[ROOT]);
        let result = verify_certificate(&decode(LEAF), &store, &at_now());
        assert!(matches!(result, Err(Error::NoTrustedSigner)));
    }

    #[test]
    fn leaf_not_yet_valid_skips_lookup() {
        // ec_leaf starts 2025-01-01; an empty store would otherwise fail
        // with NoTrustedSigner
        let store = MemoryTrustStore::new();
        let options = VerifyOptions {
            at_time: Some(1_700_000_000),
            ..VerifyOptions::default()
        };
        let result = verify_certificate(&decode(LEAF), &store, &options);
        assert!(matches!(result, Err(Error::DateInvalid(DateBound::Before))));
    }

    #[test]
    fn skew_tolerance() {
        let store = store_of(&[ROOT, INTERMEDIATE]);
        let leaf = decode(LEAF);
        let start = leaf.not_before().timestamp();
        let options = VerifyOptions {
            at_time: Some(start - 60),
            skew_before: 120,
            ..VerifyOptions::default()
        };
        verify_certificate(&leaf, &store, &options).unwrap();
    }

    #[test]
    fn time_check_can_be_disabled() {
        let store = store_of(&[ROOT, INTERMEDIATE]);
        let options = VerifyOptions {
            check_time: false,
            at_time: Some(i64::MAX / 2),
            ..VerifyOptions::default()
        };
        verify_certificate(&decode(LEAF), &store, &options).unwrap();
    }

    #[test]
    fn leaf_signer_is_not_ca() {
        let leaf = decode(RSA_LEAF);
        let mut signer = Signer::from_certificate(&decode(ROOT));
        signer.is_ca = false;
        assert!(matches!(
            check_issuer_policy(&leaf, &signer),
            Err(Error::IssuerNotCa)
        ));
    }

    #[test]
    fn signer_without_cert_sign() {
        let leaf = decode(RSA_LEAF);
        let mut signer = Signer::from_certificate(&decode(ROOT));
        signer.key_usage = Some(KeyUsage::DIGITAL_SIGNATURE);
        assert!(matches!(
            check_issuer_policy(&leaf, &signer),
            Err(Error::KeyUsageViolation(_))
        ));
    }

    #[test]
    fn rollover_signer_must_allow_cert_signing() {
        // same name as the root, signed by some other key
        let root = decode(ROOT);
        let mut signer = Signer::from_certificate(&root);
        signer.key_usage = Some(KeyUsage::DIGITAL_SIGNATURE);
        check_issuer_policy(&root, &signer).unwrap();

        signer.public_key = decode(INTERMEDIATE).public_key().clone();
        assert!(matches!(
            check_issuer_policy(&root, &signer),
            Err(Error::KeyUsageViolation(_))
        ));
        signer.key_usage = None;
        signer.is_ca = false;
        assert!(matches!(
            check_issuer_policy(&root, &signer),
            Err(Error::IssuerNotCa)
        ));
    }

    #[test]
    fn path_len_zero_signer_rejects_ca() {
        // the intermediate (pathLen 0) below a root whose pathLen is 0
        let intermediate = decode(INTERMEDIATE);
        let mut signer = Signer::from_certificate(&decode(ROOT));
        signer.path_len = Some(0);
        assert!(matches!(
            check_path_len(&intermediate, &signer, false),
            Err(Error::PathLengthViolation)
        ));
        signer.path_len = Some(1);
        check_path_len(&intermediate, &signer, false).unwrap();
    }

    #[test]
    fn self_signed_path_len_must_agree() {
        let root = decode(ROOT);
        let mut signer = Signer::from_certificate(&root);
        check_path_len(&root, &signer, true).unwrap();
        signer.path_len = Some(5);
        assert!(matches!(
            check_path_len(&root, &signer, true),
            Err(Error::PathLengthViolation)
        ));
    }
}

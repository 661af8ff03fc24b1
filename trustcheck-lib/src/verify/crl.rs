//! CRL verification and revocation lookup.

use super::{find_signer, SignatureJob, TrustStore, VerifyOptions};
use crate::crl::DecodedCrl;
use crate::fields::KeyUsage;
use crate::parser::DecodedCertificate;
use crate::time::{DateBound, Validity};
use crate::{Error, Result};
use tracing::debug;

/// Verify a CRL: update window, issuer lookup, CRL-signing key usage and
/// signature.
pub fn verify_crl(crl: &DecodedCrl, store: &dyn TrustStore, options: &VerifyOptions) -> Result<()> {
    begin_crl(crl, store, options)?.run()
}

/// Like [`verify_crl`], but hands back the signature confirmation.
pub fn begin_crl<'c>(
    crl: &'c DecodedCrl,
    store: &dyn TrustStore,
    options: &VerifyOptions,
) -> Result<SignatureJob<'c>> {
    if crl.next_update().is_none() && options.require_next_update {
        return Err(Error::MissingNextUpdate);
    }
    if options.check_time {
        let validity = Validity::evaluate(
            crl.this_update().timestamp(),
            crl.next_update().map_or(i64::MAX, |t| t.timestamp()),
            options.now(),
            options.skew_before,
            options.skew_after,
        );
        if let Some(bound) = validity.error() {
            debug!(issuer = %crl.issuer(), %bound, "CRL outside its update window");
            return Err(Error::DateInvalid(bound));
        }
    }

    let signer = find_signer(store, crl.authority_key_id(), crl.issuer().hash())?;
    // absent key usage permits everything
    if let Some(ku) = signer.key_usage {
        if !ku.contains(KeyUsage::CRL_SIGN) {
            return Err(Error::KeyUsageViolation("CRL signing"));
        }
    }

    Ok(SignatureJob::new(
        crl.signature_algorithm(),
        crl.tbs(),
        crl.signature(),
        signer.public_key.clone(),
    ))
}

/// Look `cert` up in every CRL issued by its issuer.
///
/// The CRLs are expected to be verified already. A certificate whose
/// issuer published none of them is not considered revoked.
pub fn check_revocation<'a>(
    cert: &DecodedCertificate,
    crls: impl IntoIterator<Item = &'a DecodedCrl>,
) -> Result<()> {
    let mut covered = false;
    for crl in crls {
        if crl.issuer().hash() != cert.issuer().hash() {
            continue;
        }
        covered = true;
        if let Some(entry) = crl.find(cert.serial()) {
            return Err(Error::Revoked {
                serial: cert.serial_hex(),
                reason: entry.reason_name(),
            });
        }
    }
    if !covered {
        debug!(issuer = %cert.issuer(), "no CRL for issuer");
    }
    Ok(())
}

impl DecodedCrl {
    /// Whether the CRL is stale or not yet current at `now`.
    pub fn date_error(&self, now: i64) -> Option<DateBound> {
        Validity::evaluate(
            self.this_update().timestamp(),
            self.next_update().map_or(i64::MAX, |t| t.timestamp()),
            now,
            0,
            0,
        )
        .error()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::crl::decode_crl;
    use crate::ext::DecodeOptions;
    use crate::parser::decode_certificate;
    use crate::verify::{MemoryTrustStore, Signer};

    const ROOT: &[u8] = include_bytes!("../../tests/data/rsa_root.der");
    const INTERMEDIATE: &[u8] = include_bytes!("../../tests/data/ec_intermediate.der");
    const LEAF: &[u8] = include_bytes!("../../tests/data/ec_leaf.der");
    const REVOKED_LEAF: &[u8] = include_bytes!("../../tests/data/p384_leaf.der");
    const CRL: &[u8] = include_bytes!("../../tests/data/intermediate.crl");
    const NOW: i64 = 1_749_000_000;

    fn at(now: i64) -> VerifyOptions {
        VerifyOptions {
            at_time: Some(now),
            ..VerifyOptions::default()
        }
    }

    fn intermediate_store() -> MemoryTrustStore {
        let mut store = MemoryTrustStore::new();
        store.add_der(ROOT).unwrap();
        store.add_der(INTERMEDIATE).unwrap();
        store
    }

    #[test]
    fn crl_verifies() {
        let crl = decode_crl(CRL).unwrap();
        verify_crl(&crl, &intermediate_store(), &at(NOW)).unwrap();
    }

    #[test]
    fn crl_update_window() {
        let crl = decode_crl(CRL).unwrap();
        let store = intermediate_store();
        assert!(matches!(
            verify_crl(&crl, &store, &at(1_700_000_000)),
            Err(Error::DateInvalid(DateBound::Before))
        ));
        assert!(matches!(
            verify_crl(&crl, &store, &at(1_800_000_000)),
            Err(Error::DateInvalid(DateBound::After))
        ));
        assert_eq!(crl.date_error(NOW), None);
    }

    #[test]
    fn crl_signer_without_crl_sign() {
        let crl = decode_crl(CRL).unwrap();
        let inter = decode_certificate(INTERMEDIATE, &DecodeOptions::default()).unwrap();
        let mut signer = Signer::from_certificate(&inter);
        signer.key_usage = Some(KeyUsage::KEY_CERT_SIGN);
        let mut store = MemoryTrustStore::new();
        store.add(signer);
        assert!(matches!(
            verify_crl(&crl, &store, &at(NOW)),
            Err(Error::KeyUsageViolation("CRL signing"))
        ));
    }

    #[test]
    fn crl_from_unknown_issuer() {
        let crl = decode_crl(CRL).unwrap();
        let mut store = MemoryTrustStore::new();
        store.add_der(ROOT).unwrap();
        assert!(matches!(
            verify_crl(&crl, &store, &at(NOW)),
            Err(Error::NoTrustedSigner)
        ));
    }

    #[test]
    fn revocation_lookup() {
        let crl = decode_crl(CRL).unwrap();
        let opts = DecodeOptions::default();
        let revoked = decode_certificate(REVOKED_LEAF, &opts).unwrap();
        let good = decode_certificate(LEAF, &opts).unwrap();
        let root = decode_certificate(ROOT, &opts).unwrap();

        let err = check_revocation(&revoked, [&crl]).unwrap_err();
        assert_eq!(err.to_string(), "certificate 0b:ad revoked (keyCompromise)");
        check_revocation(&good, [&crl]).unwrap();
        // issued by the root, which published no CRL here
        check_revocation(&root, [&crl]).unwrap();
    }
}

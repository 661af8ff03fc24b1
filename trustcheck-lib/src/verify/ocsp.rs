//! OCSP response verification.
//!
//! The response is signed either by the CA that issued the certificate in
//! question or by a delegated responder that CA issued with the OCSPSigning
//! extended key usage. A delegated responder certificate embedded in the
//! response is itself verified against the trust store first.

use super::{find_signer, verify_certificate, SignatureJob, Signer, TrustStore, VerifyOptions};
use crate::fields::ExtKeyUsage;
use crate::ocsp::{OcspResponse, ResponderId, ResponseStatus};
use crate::time::Validity;
use crate::{Error, Result};
use tracing::debug;

/// Verify a decoded OCSP response: status, update windows, responder
/// authorization and signature.
///
/// Correlation with the request is a separate step, see [`crate::compare`].
pub fn verify_ocsp_response(
    response: &OcspResponse,
    store: &dyn TrustStore,
    options: &VerifyOptions,
) -> Result<()> {
    begin_ocsp_response(response, store, options)?.run()
}

/// Like [`verify_ocsp_response`], but hands back the signature confirmation.
pub fn begin_ocsp_response<'r>(
    response: &'r OcspResponse,
    store: &dyn TrustStore,
    options: &VerifyOptions,
) -> Result<SignatureJob<'r>> {
    let basic = match response.basic() {
        Some(basic) if response.status() == ResponseStatus::Successful => basic,
        _ => return Err(Error::OcspUnsuccessful(response.status())),
    };

    if options.check_time {
        let now = options.now();
        for single in response.responses() {
            let validity = Validity::evaluate(
                single.this_update.timestamp(),
                single.next_update.as_ref().map_or(i64::MAX, |t| t.timestamp()),
                now,
                options.skew_before,
                options.skew_after,
            );
            if let Some(bound) = validity.error() {
                debug!(serial = %hex::encode(&single.cert_id.serial), %bound, "stale OCSP response");
                return Err(Error::DateInvalid(bound));
            }
        }
    }

    let issuer_hash = response
        .single()
        .map(|single| single.cert_id.issuer_name_hash.as_slice());

    let key = match response.responder_certificate() {
        Some(responder) => {
            verify_certificate(responder, store, options)?;
            authorize_responder(
                responder.subject().hash(),
                responder.issuer().hash(),
                responder.ext_key_usage(),
                issuer_hash,
            )?;
            responder.public_key().clone()
        }
        None => {
            let signer = find_responder(store, basic.responder_id(), issuer_hash)?;
            authorize_responder(
                &signer.subject_hash,
                &signer.issuer_hash,
                signer.ext_key_usage,
                issuer_hash,
            )?;
            signer.public_key.clone()
        }
    };

    Ok(SignatureJob::new(
        basic.signature_algorithm(),
        basic.tbs(),
        basic.signature(),
        key,
    ))
}

/// Find a responder in the store by its responder id, falling back to the
/// issuer named in the first CertID.
fn find_responder<'s>(
    store: &'s dyn TrustStore,
    responder_id: &ResponderId,
    issuer_hash: Option<&[u8]>,
) -> Result<&'s Signer> {
    let by_id = match responder_id {
        ResponderId::ByKey(key_hash) => store.find_by_key_id(key_hash),
        ResponderId::ByName(name) => store.find_by_name_hash(name.hash()),
    };
    if let Some(signer) = by_id {
        debug!(signer = %signer.subject, "OCSP responder found by responder id");
        return Ok(signer);
    }
    match issuer_hash {
        Some(hash) => find_signer(store, None, hash),
        None => Err(Error::NoTrustedSigner),
    }
}

/// The issuing CA itself may always sign. Anyone else needs OCSPSigning
/// and must have been issued by the CA named in the CertID.
fn authorize_responder(
    subject_hash: &[u8; 20],
    responder_issuer_hash: &[u8; 20],
    ext_key_usage: Option<ExtKeyUsage>,
    issuer_hash: Option<&[u8]>,
) -> Result<()> {
    if issuer_hash == Some(subject_hash.as_slice()) {
        return Ok(());
    }
    if !ext_key_usage.is_some_and(|eku| eku.contains(ExtKeyUsage::OCSP_SIGNING)) {
        return Err(Error::KeyUsageViolation("OCSP signing"));
    }
    if issuer_hash != Some(responder_issuer_hash.as_slice()) {
        debug!(
            responder_issuer = %hex::encode(responder_issuer_hash),
            "delegated OCSP responder was issued by another CA"
        );
        return Err(Error::KeyUsageViolation("OCSP signing for this issuer"));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::ext::DecodeOptions;
    use crate::ocsp::decode_ocsp_response;
    use crate::parser::decode_certificate;
    use crate::time::DateBound;
    use crate::verify::MemoryTrustStore;

    const ROOT: &[u8] = include_bytes!("../../tests/data/rsa_root.der");
    const INTERMEDIATE: &[u8] = include_bytes!("../../tests/data/ec_intermediate.der");
    const GOOD: &[u8] = include_bytes!("../../tests/data/ocsp_good.der");
    const REVOKED: &[u8] = include_bytes!("../../tests/data/ocsp_revoked.der");
    const UNAUTHORIZED: &[u8] = include_bytes!("../../tests/data/ocsp_unauthorized.der");
    const NOW: i64 = 1_749_000_000;

    fn store() -> MemoryTrustStore {
        let mut store = MemoryTrustStore::new();
        store.add_der(ROOT).unwrap();
        store.add_der(INTERMEDIATE).unwrap();
        store
    }

    fn at(now: i64) -> VerifyOptions {
        VerifyOptions {
            at_time: Some(now),
            ..VerifyOptions::default()
        }
    }

    #[test]
    fn issuer_signed_response() {
        let resp = decode_ocsp_response(GOOD).unwrap();
        verify_ocsp_response(&resp, &store(), &at(NOW)).unwrap();
    }

    #[test]
    fn delegated_responder_response() {
        let resp = decode_ocsp_response(REVOKED).unwrap();
        verify_ocsp_response(&resp, &store(), &at(NOW)).unwrap();
    }

    #[test]
    fn delegated_responder_must_chain() {
        let resp = decode_ocsp_response(REVOKED).unwrap();
        let mut roots = MemoryTrustStore::new();
        roots.add_der(ROOT).unwrap();
        assert!(matches!(
            verify_ocsp_response(&resp, &roots, &at(NOW)),
            Err(Error::NoTrustedSigner)
        ));
    }

    #[test]
    fn stale_response() {
        let resp = decode_ocsp_response(GOOD).unwrap();
        assert!(matches!(
            verify_ocsp_response(&resp, &store(), &at(1_760_000_000)),
            Err(Error::DateInvalid(DateBound::After))
        ));
        assert!(matches!(
            verify_ocsp_response(&resp, &store(), &at(1_740_000_000)),
            Err(Error::DateInvalid(DateBound::Before))
        ));
    }

    #[test]
    fn unsuccessful_status() {
        let resp = decode_ocsp_response(UNAUTHORIZED).unwrap();
        assert!(matches!(
            verify_ocsp_response(&resp, &store(), &at(NOW)),
            Err(Error::OcspUnsuccessful(ResponseStatus::Unauthorized))
        ));
    }

    #[test]
    fn responder_authorization() {
        let issuer = [7u8; 20];
        let other = [9u8; 20];
        let stranger = [3u8; 20];
        let cert_id_issuer = Some(&issuer[..]);
        authorize_responder(&issuer, &stranger, None, cert_id_issuer).unwrap();
        authorize_responder(&other, &issuer, Some(ExtKeyUsage::OCSP_SIGNING), cert_id_issuer)
            .unwrap();
        assert!(matches!(
            authorize_responder(&other, &issuer, Some(ExtKeyUsage::SERVER_AUTH), cert_id_issuer),
            Err(Error::KeyUsageViolation("OCSP signing"))
        ));
        assert!(matches!(
            authorize_responder(&other, &stranger, Some(ExtKeyUsage::OCSP_SIGNING), cert_id_issuer),
            Err(Error::KeyUsageViolation("OCSP signing for this issuer"))
        ));
        assert!(authorize_responder(&other, &issuer, None, None).is_err());
    }

    #[test]
    fn responder_from_another_ca_is_refused() {
        // point the CertID at the root; the embedded responder was issued
        // by the intermediate
        let inter_hash = *decode_certificate(INTERMEDIATE, &DecodeOptions::default())
            .unwrap()
            .subject()
            .hash();
        let root_hash = *decode_certificate(ROOT, &DecodeOptions::default())
            .unwrap()
            .subject()
            .hash();
        let mut der = REVOKED.to_vec();
        let offset = der
            .windows(20)
            .position(|w| w == inter_hash.as_slice())
            .unwrap();
        der[offset..offset + 20].copy_from_slice(&root_hash);

        let resp = decode_ocsp_response(&der).unwrap();
        assert!(matches!(
            verify_ocsp_response(&resp, &store(), &at(NOW)),
            Err(Error::KeyUsageViolation("OCSP signing for this issuer"))
        ));
    }
}

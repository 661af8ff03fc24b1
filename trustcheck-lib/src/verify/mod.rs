//! Signature and policy verification of decoded objects.
//!
//! Every object type has a `verify_*` entry point that runs the policy
//! checks and then confirms the signature with the software backend, and a
//! `begin_*` counterpart that stops after the policy checks and hands back a
//! [`SignatureJob`] so the caller can drive an asynchronous
//! [`CryptoBackend`] itself.
//!
//! Signers are only ever looked up through the [`TrustStore`] trait.

mod cert;
mod chain;
mod constraints;
mod crl;
mod ocsp;
mod trust_store;

use crate::oid::SignatureAlgorithm;
use crate::pubkey::PublicKey;
use crate::sig::{CryptoBackend, Phase, SignatureContext, SoftwareBackend};
use crate::time::{Clock, SystemClock};
use crate::{DecodedCrl, Error, Result};
use serde::Serialize;
use std::task::Poll;
use tracing::debug;

pub use cert::{begin_certificate, verify_certificate};
pub use chain::{verify_chain, verify_pem_chain, MAX_CHAIN_DEPTH};
pub use crl::{begin_crl, check_revocation, verify_crl};
pub use ocsp::{begin_ocsp_response, verify_ocsp_response};
pub use trust_store::{find_system_ca_bundle, MemoryTrustStore, Signer, TrustStore};

/// Options controlling verification behavior.
#[derive(Debug, Clone)]
pub struct VerifyOptions {
    /// Whether to check validity dates.
    /// Set to `false` to skip time checks (useful for testing expired certs).
    pub check_time: bool,
    /// Verify at a specific Unix timestamp instead of the current time.
    /// Matches OpenSSL's `-attime` flag.
    pub at_time: Option<i64>,
    /// Seconds a not-before (or thisUpdate) may lie in the future.
    pub skew_before: i64,
    /// Seconds a not-after (or nextUpdate) may lie in the past.
    pub skew_after: i64,
    /// Maximum number of non-self-issued intermediates. Defaults to 32.
    pub verify_depth: Option<usize>,
    /// Reject CRLs without a nextUpdate.
    pub require_next_update: bool,
    /// Decoded CRLs to check for revocation.
    pub crls: Vec<DecodedCrl>,
    /// Check CRLs for the leaf certificate only (`crl_check`).
    pub crl_check_leaf: bool,
    /// Check CRLs for all certificates in the chain (`crl_check_all`).
    pub crl_check_all: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            check_time: true,
            at_time: None,
            skew_before: 0,
            skew_after: 0,
            verify_depth: None,
            require_next_update: false,
            crls: Vec::new(),
            crl_check_leaf: false,
            crl_check_all: false,
        }
    }
}

impl VerifyOptions {
    /// The instant dates are checked against.
    pub fn now(&self) -> i64 {
        self.now_with(&SystemClock)
    }

    /// Like [`VerifyOptions::now`], reading `clock` unless `at_time` is set.
    pub fn now_with(&self, clock: &dyn Clock) -> i64 {
        self.at_time.unwrap_or_else(|| clock.now())
    }
}

/// A signature confirmation whose policy checks already passed.
///
/// Poll it with a backend until it returns `Ready`. Dropping a pending job
/// releases its context.
#[derive(Debug)]
pub struct SignatureJob<'a> {
    ctx: SignatureContext,
    message: &'a [u8],
    signature: &'a [u8],
    key: PublicKey,
}

impl<'a> SignatureJob<'a> {
    pub(crate) fn new(
        algorithm: SignatureAlgorithm,
        message: &'a [u8],
        signature: &'a [u8],
        key: PublicKey,
    ) -> Self {
        SignatureJob {
            ctx: SignatureContext::new(algorithm),
            message,
            signature,
            key,
        }
    }

    pub fn poll(&mut self, backend: &dyn CryptoBackend) -> Poll<Result<()>> {
        self.ctx
            .confirm(backend, self.message, self.signature, &self.key)
    }

    pub fn phase(&self) -> Phase {
        self.ctx.phase()
    }

    /// Run to completion on the software backend.
    pub fn run(mut self) -> Result<()> {
        match self.poll(&SoftwareBackend) {
            Poll::Ready(result) => result,
            Poll::Pending => Err(Error::Pending),
        }
    }
}

/// Resolve an issuer: by authority key identifier first, then by name hash.
pub(crate) fn find_signer<'s>(
    store: &'s dyn TrustStore,
    authority_key_id: Option<&[u8]>,
    issuer_hash: &[u8],
) -> Result<&'s Signer> {
    if let Some(key_id) = authority_key_id {
        if let Some(signer) = store.find_by_key_id(key_id) {
            debug!(signer = %signer.subject, "signer found by key id");
            return Ok(signer);
        }
    }
    match store.find_by_name_hash(issuer_hash) {
        Some(signer) => {
            debug!(signer = %signer.subject, "signer found by name hash");
            Ok(signer)
        }
        None => {
            debug!(issuer_hash = %hex::encode(issuer_hash), "no signer in trust store");
            Err(Error::NoTrustedSigner)
        }
    }
}

/// Result of certificate bundle verification.
#[derive(Debug, Default, Serialize)]
pub struct VerificationResult {
    /// Whether every certificate in the bundle verified.
    pub is_valid: bool,
    /// Information about each certificate in the bundle (leaf first).
    pub chain: Vec<ChainCertInfo>,
    /// Verification errors as display strings (empty if `is_valid` is true).
    pub errors: Vec<String>,
    /// The same errors, typed, with the depth they occurred at.
    #[serde(skip)]
    pub failures: Vec<(usize, Error)>,
}

impl VerificationResult {
    pub(crate) fn fail(&mut self, depth: usize, error: Error) {
        let subject = self
            .chain
            .get(depth)
            .map(|info| info.subject.as_str())
            .unwrap_or_default();
        debug!(depth, subject, error = %error, "verification failure");
        self.errors
            .push(format!("depth {} ({}): {}", depth, subject, error));
        self.failures.push((depth, error));
        self.is_valid = false;
    }
}

impl std::fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: [short_name], [serial], [OK/FAIL], [optional reason]
        if let Some(leaf) = self.chain.first() {
            write!(f, "{}, {}, ", leaf.short_name, leaf.serial)?;
        }
        if self.is_valid {
            write!(f, "OK")?;
        } else {
            write!(f, "FAIL")?;
            if !self.errors.is_empty() {
                write!(f, ", {}", self.errors.join("; "))?;
            }
        }
        Ok(())
    }
}

/// Information about a certificate in the verified bundle.
#[derive(Debug, Clone, Serialize)]
pub struct ChainCertInfo {
    /// Position in the bundle (0 = leaf).
    pub depth: usize,
    /// Subject distinguished name.
    pub subject: String,
    /// Issuer distinguished name.
    pub issuer: String,
    /// Short human-readable name derived from CN, O, or OU.
    pub short_name: String,
    /// Serial number as colon-separated hex.
    pub serial: String,
}

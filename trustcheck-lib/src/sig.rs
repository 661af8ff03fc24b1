//! Signature confirmation engine.
//!
//! Verifying a signature runs through four phases:
//!
//! ```text
//! Begin -> Hash -> KeyLoad -> Verify
//! ```
//!
//! `Begin` maps the signature algorithm to a digest and a key family,
//! `Hash` digests the exact signed bytes, `KeyLoad` imports the signer's
//! key into the primitive crate, and `Verify` runs the primitive.
//!
//! The primitives sit behind [`CryptoBackend`]. A backend bound to
//! asynchronous hardware may answer any call with [`Poll::Pending`]; the
//! caller keeps the same [`SignatureContext`] and calls
//! [`confirm`](SignatureContext::confirm) again with the same inputs until
//! it returns `Ready`. The context wipes its buffers on every terminal
//! outcome and on drop, but never while pending.

use crate::der::Writer;
use crate::oid::{HashAlgorithm, NamedCurve, SignatureAlgorithm};
use crate::pubkey::{KeyAlgorithm, KeyHandle, PublicKey};
use crate::{Error, Result};
use digest::Digest;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPublicKey};
use std::task::Poll;
use subtle::ConstantTimeEq;
use tracing::trace;
use zeroize::Zeroize;

/// Largest RSA modulus accepted, in bits.
pub const MAX_RSA_BITS: usize = 16384;

/// Minimum number of 0xFF octets in a PKCS#1 v1.5 signature block.
const MIN_PS_LEN: usize = 8;

/// Digest and key family a signature algorithm requires.
///
/// Ed25519 hashes internally and has no separate digest.
pub fn signature_scheme(algorithm: SignatureAlgorithm) -> Result<(Option<HashAlgorithm>, KeyAlgorithm)> {
    use SignatureAlgorithm as S;
    let scheme = match algorithm {
        S::Sha1WithRsa => (Some(HashAlgorithm::Sha1), KeyAlgorithm::Rsa),
        S::Sha224WithRsa => (Some(HashAlgorithm::Sha224), KeyAlgorithm::Rsa),
        S::Sha256WithRsa => (Some(HashAlgorithm::Sha256), KeyAlgorithm::Rsa),
        S::Sha384WithRsa => (Some(HashAlgorithm::Sha384), KeyAlgorithm::Rsa),
        S::Sha512WithRsa => (Some(HashAlgorithm::Sha512), KeyAlgorithm::Rsa),
        S::EcdsaWithSha1 => (Some(HashAlgorithm::Sha1), KeyAlgorithm::Ec),
        S::EcdsaWithSha224 => (Some(HashAlgorithm::Sha224), KeyAlgorithm::Ec),
        S::EcdsaWithSha256 => (Some(HashAlgorithm::Sha256), KeyAlgorithm::Ec),
        S::EcdsaWithSha384 => (Some(HashAlgorithm::Sha384), KeyAlgorithm::Ec),
        S::EcdsaWithSha512 => (Some(HashAlgorithm::Sha512), KeyAlgorithm::Ec),
        S::Ed25519 => (None, KeyAlgorithm::Ed25519),
        S::Md5WithRsa | S::RsaPss | S::Ed448 | S::DsaWithSha1 | S::DsaWithSha256 => {
            return Err(Error::UnsupportedAlgorithm(algorithm.name().to_string()))
        }
    };
    Ok(scheme)
}

/// Digest `data` in software.
pub fn software_digest(algorithm: HashAlgorithm, data: &[u8]) -> Result<Vec<u8>> {
    Ok(match algorithm {
        HashAlgorithm::Sha1 => sha1::Sha1::digest(data).to_vec(),
        HashAlgorithm::Sha224 => sha2::Sha224::digest(data).to_vec(),
        HashAlgorithm::Sha256 => sha2::Sha256::digest(data).to_vec(),
        HashAlgorithm::Sha384 => sha2::Sha384::digest(data).to_vec(),
        HashAlgorithm::Sha512 => sha2::Sha512::digest(data).to_vec(),
        HashAlgorithm::Md5 | HashAlgorithm::Sha3_256 => {
            return Err(Error::UnsupportedAlgorithm(algorithm.name().to_string()))
        }
    })
}

/// Raw RSA public operation `s^e mod n`, left-padded to the modulus size.
pub fn rsa_public_op(key: &RsaPublicKey, signature: &[u8]) -> Result<Vec<u8>> {
    let k = key.size();
    if signature.len() != k {
        return Err(Error::SignatureMismatch);
    }
    let s = BigUint::from_bytes_be(signature);
    if &s >= key.n() {
        return Err(Error::SignatureMismatch);
    }
    let m = s.modpow(key.e(), key.n()).to_bytes_be();
    let mut em = vec![0u8; k.saturating_sub(m.len())];
    em.extend_from_slice(&m);
    Ok(em)
}

/// Imported ECDSA verifying key.
#[derive(Debug, Clone)]
pub enum EcVerifyingKey {
    P256(p256::ecdsa::VerifyingKey),
    P384(p384::ecdsa::VerifyingKey),
}

impl EcVerifyingKey {
    /// Check a DER-encoded ECDSA signature over a precomputed digest.
    pub fn verify_prehash(&self, digest: &[u8], signature: &[u8]) -> bool {
        use p256::ecdsa::signature::hazmat::PrehashVerifier;
        match self {
            EcVerifyingKey::P256(key) => p256::ecdsa::Signature::from_der(signature)
                .is_ok_and(|sig| key.verify_prehash(digest, &sig).is_ok()),
            EcVerifyingKey::P384(key) => p384::ecdsa::Signature::from_der(signature)
                .is_ok_and(|sig| key.verify_prehash(digest, &sig).is_ok()),
        }
    }
}

/// Cryptographic primitives consumed by the engine.
///
/// Every method has a software default; a hardware backend overrides the
/// operations it offloads and may return `Poll::Pending` from them.
pub trait CryptoBackend {
    fn digest(&self, algorithm: HashAlgorithm, data: &[u8]) -> Poll<Result<Vec<u8>>> {
        Poll::Ready(software_digest(algorithm, data))
    }

    /// Recover the encoded message block from an RSA signature.
    fn rsa_public(&self, key: &RsaPublicKey, signature: &[u8]) -> Poll<Result<Vec<u8>>> {
        Poll::Ready(rsa_public_op(key, signature))
    }

    fn ecdsa_verify(
        &self,
        key: &EcVerifyingKey,
        digest: &[u8],
        signature: &[u8],
    ) -> Poll<Result<bool>> {
        Poll::Ready(Ok(key.verify_prehash(digest, signature)))
    }

    fn ed25519_verify(
        &self,
        key: &ed25519_dalek::VerifyingKey,
        message: &[u8],
        signature: &[u8],
    ) -> Poll<Result<bool>> {
        let ok = ed25519_dalek::Signature::from_slice(signature)
            .is_ok_and(|sig| key.verify_strict(message, &sig).is_ok());
        Poll::Ready(Ok(ok))
    }
}

/// Synchronous software primitives.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareBackend;

impl CryptoBackend for SoftwareBackend {}

/// Engine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Begin,
    Hash,
    KeyLoad,
    Verify,
}

enum VerifierKey {
    Rsa(RsaPublicKey),
    Ec(EcVerifyingKey),
    Ed25519(ed25519_dalek::VerifyingKey),
}

/// Per-verification state, retained by the caller across `Pending`.
pub struct SignatureContext {
    algorithm: SignatureAlgorithm,
    phase: Phase,
    hash: Option<HashAlgorithm>,
    digest: Vec<u8>,
    key: Option<VerifierKey>,
    scratch: Vec<u8>,
}

impl std::fmt::Debug for SignatureContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureContext")
            .field("algorithm", &self.algorithm)
            .field("phase", &self.phase)
            .finish()
    }
}

impl SignatureContext {
    pub fn new(algorithm: SignatureAlgorithm) -> Self {
        SignatureContext {
            algorithm,
            phase: Phase::Begin,
            hash: None,
            digest: Vec::new(),
            key: None,
            scratch: Vec::new(),
        }
    }

    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Drive the state machine as far as the backend allows.
    ///
    /// `message` is the exact signed byte range. On `Pending`, call again
    /// with the same arguments.
    pub fn confirm(
        &mut self,
        backend: &dyn CryptoBackend,
        message: &[u8],
        signature: &[u8],
        key: &PublicKey,
    ) -> Poll<Result<()>> {
        match self.step(backend, message, signature, key) {
            Ok(Poll::Pending) => {
                trace!(phase = ?self.phase, "signature confirmation pending");
                Poll::Pending
            }
            Ok(Poll::Ready(())) => {
                self.release();
                Poll::Ready(Ok(()))
            }
            Err(e) => {
                self.release();
                Poll::Ready(Err(e))
            }
        }
    }

    fn step(
        &mut self,
        backend: &dyn CryptoBackend,
        message: &[u8],
        signature: &[u8],
        key: &PublicKey,
    ) -> Result<Poll<()>> {
        loop {
            trace!(phase = ?self.phase, algorithm = self.algorithm.name(), "signature step");
            match self.phase {
                Phase::Begin => {
                    let (hash, family) = signature_scheme(self.algorithm)?;
                    if family != key.algorithm() {
                        return Err(Error::KeyAlgorithmMismatch);
                    }
                    self.hash = hash;
                    self.phase = Phase::Hash;
                }
                Phase::Hash => {
                    if let Some(hash) = self.hash {
                        let Poll::Ready(digest) = backend.digest(hash, message) else {
                            return Ok(Poll::Pending);
                        };
                        self.digest = digest?;
                    }
                    self.phase = Phase::KeyLoad;
                }
                Phase::KeyLoad => {
                    self.key = Some(load_key(key)?);
                    self.phase = Phase::Verify;
                }
                Phase::Verify => {
                    let Some(verifier) = &self.key else {
                        return Err(Error::Malformed("signature context lost its key"));
                    };
                    let ok = match verifier {
                        VerifierKey::Rsa(rsa_key) => {
                            let Poll::Ready(em) = backend.rsa_public(rsa_key, signature) else {
                                return Ok(Poll::Pending);
                            };
                            self.scratch = em?;
                            let hash = self.hash.ok_or(Error::KeyAlgorithmMismatch)?;
                            let mut expected = pkcs1_block(hash, &self.digest, self.scratch.len())?;
                            let ok = bool::from(self.scratch.ct_eq(&expected));
                            expected.zeroize();
                            ok
                        }
                        VerifierKey::Ec(ec_key) => {
                            let Poll::Ready(ok) = backend.ecdsa_verify(ec_key, &self.digest, signature)
                            else {
                                return Ok(Poll::Pending);
                            };
                            ok?
                        }
                        VerifierKey::Ed25519(ed_key) => {
                            let Poll::Ready(ok) = backend.ed25519_verify(ed_key, message, signature)
                            else {
                                return Ok(Poll::Pending);
                            };
                            ok?
                        }
                    };
                    return if ok {
                        Ok(Poll::Ready(()))
                    } else {
                        Err(Error::SignatureMismatch)
                    };
                }
            }
        }
    }

    fn release(&mut self) {
        self.digest.zeroize();
        self.scratch.zeroize();
        self.key = None;
        self.hash = None;
        self.phase = Phase::Begin;
    }
}

impl Drop for SignatureContext {
    fn drop(&mut self) {
        self.release();
    }
}

/// Verify synchronously with the software backend.
pub fn verify_signature(
    algorithm: SignatureAlgorithm,
    message: &[u8],
    signature: &[u8],
    key: &PublicKey,
) -> Result<()> {
    let mut ctx = SignatureContext::new(algorithm);
    match ctx.confirm(&SoftwareBackend, message, signature, key) {
        Poll::Ready(result) => result,
        Poll::Pending => Err(Error::Pending),
    }
}

fn load_key(key: &PublicKey) -> Result<VerifierKey> {
    match key.handle() {
        KeyHandle::Rsa { .. } => {
            let (n, e) = key.rsa_components()?;
            let rsa_key = RsaPublicKey::new_with_max_size(
                BigUint::from_bytes_be(n),
                BigUint::from_bytes_be(e),
                MAX_RSA_BITS,
            )
            .map_err(|e| Error::InvalidKey(format!("RSA: {}", e)))?;
            Ok(VerifierKey::Rsa(rsa_key))
        }
        KeyHandle::Ec { curve, point } => match curve.named() {
            Some(NamedCurve::P256) => p256::ecdsa::VerifyingKey::from_sec1_bytes(point)
                .map(|k| VerifierKey::Ec(EcVerifyingKey::P256(k)))
                .map_err(|e| Error::InvalidKey(format!("P-256: {}", e))),
            Some(NamedCurve::P384) => p384::ecdsa::VerifyingKey::from_sec1_bytes(point)
                .map(|k| VerifierKey::Ec(EcVerifyingKey::P384(k)))
                .map_err(|e| Error::InvalidKey(format!("P-384: {}", e))),
            _ => Err(Error::UnsupportedCurve(curve.display_name().to_string())),
        },
        KeyHandle::Ed25519(bytes) => ed25519_dalek::VerifyingKey::from_bytes(bytes)
            .map(VerifierKey::Ed25519)
            .map_err(|e| Error::InvalidKey(format!("Ed25519: {}", e))),
        KeyHandle::Dsa { .. } | KeyHandle::Dh { .. } => {
            Err(Error::UnsupportedKeyType(key.algorithm().to_string()))
        }
    }
}

/// DER `DigestInfo` for `digest` under `hash`.
pub fn digest_info(hash: HashAlgorithm, digest: &[u8]) -> Vec<u8> {
    let mut w = Writer::new();
    w.sequence(|w| {
        w.sequence(|w| {
            w.oid(hash.der()).null();
        });
        w.octet_string(digest);
    });
    w.into_bytes()
}

/// The PKCS#1 v1.5 block `00 01 FF.. 00 DigestInfo` of length `k`.
fn pkcs1_block(hash: HashAlgorithm, digest: &[u8], k: usize) -> Result<Vec<u8>> {
    let t = digest_info(hash, digest);
    let ps_len = k
        .checked_sub(3 + t.len())
        .filter(|len| *len >= MIN_PS_LEN)
        .ok_or(Error::SignatureMismatch)?;
    let mut block = Vec::with_capacity(k);
    block.extend_from_slice(&[0x00, 0x01]);
    block.resize(2 + ps_len, 0xff);
    block.push(0x00);
    block.extend_from_slice(&t);
    Ok(block)
}

//! trustcheck-lib: decoding and validation of X.509 trust objects.
//!
//! Decodes DER-encoded certificates, CRLs and OCSP messages into owned
//! structures, then verifies their signatures and chain policy (validity
//! dates, path length, name constraints, key usage, revocation) against a
//! caller-supplied trust store.
//!
//! Decoding and verification are separate steps: a decoded object can be
//! displayed without verifying it, or verified repeatedly under different
//! [`VerifyOptions`].

mod check;
pub mod crl;
pub mod der;
mod display;
pub mod ext;
pub mod fields;
mod fingerprint;
pub mod name;
pub mod ocsp;
pub mod oid;
mod parser;
pub mod pubkey;
pub mod sig;
pub mod time;
mod util;
pub mod verify;

pub use check::{check_email, check_expiry, check_expiry_at, check_host};
pub use crl::{decode_crl, DecodedCrl, RevokedEntry};
pub use display::{crl_text, display_text, ocsp_text, to_json};
pub use ext::{DecodeOptions, Extensions};
pub use fields::{AltName, ExtKeyUsage, GeneralSubtree, KeyUsage, NameConstraints};
pub use fingerprint::{compute_fingerprint, DigestAlgorithm};
pub use name::DecodedName;
pub use ocsp::{compare, decode_ocsp_response, CertId, CertStatus, OcspRequest, OcspResponse};
pub use parser::{decode_certificate, DecodedCertificate};
pub use pubkey::{KeyAlgorithm, PublicKey};
pub use sig::{CryptoBackend, SignatureContext, SoftwareBackend};
pub use time::{Asn1Time, Clock, DateBound, SystemClock};
pub use util::{is_pem, parse_pem_chain, parse_pem_crl};
pub use verify::{
    begin_certificate, begin_crl, begin_ocsp_response, check_revocation, find_system_ca_bundle,
    verify_certificate, verify_chain, verify_crl, verify_ocsp_response, verify_pem_chain,
    ChainCertInfo, MemoryTrustStore, SignatureJob, Signer, TrustStore, VerificationResult,
    VerifyOptions,
};

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by trustcheck-lib.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("buffer too short at offset {offset}")]
    BufferTooShort { offset: usize },

    #[error("invalid length encoding at offset {offset}")]
    InvalidLength { offset: usize },

    #[error("unexpected tag at offset {offset}: expected 0x{expected:02x}, found 0x{found:02x}")]
    UnexpectedTag {
        expected: u8,
        found: u8,
        offset: usize,
    },

    #[error("malformed INTEGER at offset {offset}")]
    MalformedInteger { offset: usize },

    #[error("malformed BIT STRING at offset {offset}")]
    MalformedBitString { offset: usize },

    #[error("malformed {0}")]
    Malformed(&'static str),

    #[error("trailing data after {0}")]
    TrailingData(&'static str),

    #[error("unknown {category} OID {oid}")]
    UnknownOid { category: oid::Category, oid: String },

    #[error("unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("unsupported elliptic curve: {0}")]
    UnsupportedCurve(String),

    #[error("unsupported public key type: {0}")]
    UnsupportedKeyType(String),

    #[error("unsupported certificate version: {0}")]
    UnsupportedVersion(u32),

    #[error("unsupported critical extension: {0}")]
    UnsupportedCriticalExtension(String),

    #[error("duplicate extension: {0}")]
    DuplicateExtension(String),

    #[error("duplicate certificate policy: {0}")]
    DuplicatePolicy(String),

    #[error("invalid alternative name: {0}")]
    InvalidAltName(String),

    #[error("extensions present on a v1/v2 certificate")]
    LegacyExtensions,

    #[error("serial number too large ({0} bytes)")]
    SerialTooLarge(usize),

    #[error("outer signature algorithm does not match the signed algorithm")]
    SignatureAlgorithmMismatch,

    #[error("signer key type does not match the signature algorithm")]
    KeyAlgorithmMismatch,

    #[error("invalid time: {0}")]
    InvalidTime(String),

    #[error("invalid public key: {0}")]
    InvalidKey(String),

    #[error("date invalid: {0}")]
    DateInvalid(DateBound),

    #[error("signature mismatch")]
    SignatureMismatch,

    #[error("no trusted signer found")]
    NoTrustedSigner,

    #[error("issuer is not a CA")]
    IssuerNotCa,

    #[error("path length constraint violated")]
    PathLengthViolation,

    #[error("name constraint violation: {0}")]
    NameConstraintViolation(String),

    #[error("key usage does not permit {0}")]
    KeyUsageViolation(&'static str),

    #[error("certificate {serial} revoked ({reason})")]
    Revoked { serial: String, reason: &'static str },

    #[error("CRL has no nextUpdate")]
    MissingNextUpdate,

    #[error("OCSP response status: {0}")]
    OcspUnsuccessful(ocsp::ResponseStatus),

    #[error("OCSP request/response mismatch: {0}")]
    CorrelationMismatch(&'static str),

    #[error("signature confirmation is pending on the crypto backend")]
    Pending,

    #[error("invalid PEM format: {0}")]
    Pem(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

//! `SubjectPublicKeyInfo` decoding.
//!
//! Decoding is structural only: the key is classified, its parameters are
//! resolved and the key bytes are copied out. No arithmetic validation
//! happens here; the signature engine imports keys into the primitive
//! crates when it needs them.

use crate::der::{tag, Reader};
use crate::oid::{self, NamedCurve, PublicKeyAlgorithm};
use crate::{Error, Result};
use digest::Digest;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Public key family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeyAlgorithm {
    Rsa,
    Ec,
    Ed25519,
    Dsa,
    Dh,
}

impl std::fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            KeyAlgorithm::Rsa => "RSA",
            KeyAlgorithm::Ec => "EC",
            KeyAlgorithm::Ed25519 => "Ed25519",
            KeyAlgorithm::Dsa => "DSA",
            KeyAlgorithm::Dh => "DH",
        })
    }
}

/// Inline prime-field curve definition (`ECParameters`).
///
/// Integers are stored as minimal big-endian magnitudes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurveParams {
    pub prime: Vec<u8>,
    pub a: Vec<u8>,
    pub b: Vec<u8>,
    pub base: Vec<u8>,
    pub order: Vec<u8>,
    pub cofactor: Option<Vec<u8>>,
}

struct KnownCurve {
    curve: NamedCurve,
    prime: &'static str,
    a: &'static str,
    b: &'static str,
    order: &'static str,
}

const KNOWN_EXPLICIT: &[KnownCurve] = &[
    KnownCurve {
        curve: NamedCurve::P256,
        prime: "ffffffff00000001000000000000000000000000ffffffffffffffffffffffff",
        a: "ffffffff00000001000000000000000000000000fffffffffffffffffffffffc",
        b: "5ac635d8aa3a93e7b3ebbd55769886bc651d06b0cc53b0f63bce3c3e27d2604b",
        order: "ffffffff00000000ffffffffffffffffbce6faada7179e84f3b9cac2fc632551",
    },
    KnownCurve {
        curve: NamedCurve::P384,
        prime: "fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffe\
                ffffffff0000000000000000ffffffff",
        a: "fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffe\
            ffffffff0000000000000000fffffffc",
        b: "b3312fa7e23ee7e4988e056be3f82d19181d9c6efe8141120314088f5013875a\
            c656398d8a2ed19d2a85c8edd3ec2aef",
        order: "ffffffffffffffffffffffffffffffffffffffffffffffffc7634d81f4372ddf\
                581a0db248b0a77aecec196accc52973",
    },
];

impl CurveParams {
    /// The named curve these parameters describe, if it is one we know.
    pub fn identify(&self) -> Option<NamedCurve> {
        KNOWN_EXPLICIT
            .iter()
            .find(|k| {
                hex::encode(&self.prime) == k.prime
                    && hex::encode(&self.a) == k.a
                    && hex::encode(&self.b) == k.b
                    && hex::encode(&self.order) == k.order
            })
            .map(|k| k.curve)
    }

    fn read(reader: &mut Reader<'_>) -> Result<Self> {
        let mut seq = reader.read_sequence()?;
        let version = seq.read_small_integer()?;
        if version != 1 {
            return Err(Error::UnsupportedCurve(format!(
                "ECParameters version {}",
                version
            )));
        }
        let mut field = seq.read_sequence()?;
        let field_type = field.read_object_id()?;
        if field_type != oid::PRIME_FIELD {
            return Err(Error::UnsupportedCurve(format!(
                "field type {}",
                oid::to_dotted(field_type)?
            )));
        }
        let prime = field.read_integer()?.to_vec();
        field.finish("FieldID")?;

        let mut curve = seq.read_sequence()?;
        let a = strip_zeros(curve.read_octet_string()?);
        let b = strip_zeros(curve.read_octet_string()?);
        // optional seed
        curve.read_optional(tag::BIT_STRING)?;
        curve.finish("Curve")?;

        let base = seq.read_octet_string()?.to_vec();
        let order = seq.read_integer()?.to_vec();
        let cofactor = if seq.peek_tag() == Some(tag::INTEGER) {
            Some(seq.read_integer()?.to_vec())
        } else {
            None
        };
        // hash OID and other trailing fields from later X9.62 revisions
        while !seq.is_empty() {
            seq.skip()?;
        }
        Ok(CurveParams {
            prime,
            a,
            b,
            base,
            order,
            cofactor,
        })
    }
}

/// Elliptic curve of an EC key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcCurve {
    Named(NamedCurve),
    Explicit(CurveParams),
}

impl EcCurve {
    /// Resolve to a named curve, matching explicit parameters where possible.
    pub fn named(&self) -> Option<NamedCurve> {
        match self {
            EcCurve::Named(c) => Some(*c),
            EcCurve::Explicit(p) => p.identify(),
        }
    }

    /// Byte width of one field element.
    pub fn coordinate_len(&self) -> usize {
        match self.named() {
            Some(NamedCurve::P224) => 28,
            Some(NamedCurve::P384) => 48,
            Some(NamedCurve::P521) => 66,
            Some(NamedCurve::P256 | NamedCurve::Secp256k1 | NamedCurve::BrainpoolP256r1) => 32,
            None => match self {
                EcCurve::Explicit(p) => p.prime.len(),
                EcCurve::Named(_) => 0,
            },
        }
    }

    /// Short display name (`P-256`, `secp256k1`, `explicit`).
    pub fn display_name(&self) -> &'static str {
        match self.named() {
            Some(NamedCurve::P256) => "P-256",
            Some(NamedCurve::P224) => "P-224",
            Some(NamedCurve::P384) => "P-384",
            Some(NamedCurve::P521) => "P-521",
            Some(other) => other.name(),
            None => "explicit",
        }
    }

    fn bits(&self) -> u32 {
        match self.named() {
            Some(NamedCurve::P521) => 521,
            _ => u32::try_from(self.coordinate_len() * 8).unwrap_or(0),
        }
    }
}

/// Algorithm-specific key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyHandle {
    /// DER `RSAPublicKey` SEQUENCE; `n` and `e` are decoded on demand.
    Rsa { raw: Vec<u8> },
    /// SEC1 point, compressed or uncompressed.
    Ec { curve: EcCurve, point: Vec<u8> },
    Ed25519([u8; 32]),
    /// DSA parameters (`Dss-Parms` TLV, may be empty) and the public INTEGER.
    Dsa { params: Vec<u8>, key: Vec<u8> },
    /// DH domain parameters TLV and the public INTEGER.
    Dh { params: Vec<u8>, key: Vec<u8> },
}

/// A decoded `SubjectPublicKeyInfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    algorithm: KeyAlgorithm,
    handle: KeyHandle,
    spki: Vec<u8>,
    key_bits: Vec<u8>,
}

impl PublicKey {
    /// Decode the `SubjectPublicKeyInfo` at the reader's cursor.
    pub fn read(reader: &mut Reader<'_>) -> Result<Self> {
        let element = reader.read_expected(tag::SEQUENCE)?;
        let mut spki = element.reader();
        let mut alg = spki.read_sequence()?;
        let alg_oid = alg.read_object_id()?;
        let params = if alg.is_empty() {
            None
        } else {
            Some(alg.read_element()?)
        };
        alg.finish("AlgorithmIdentifier")?;
        let bits = spki.read_bit_string(true)?;
        spki.finish("SubjectPublicKeyInfo")?;
        let key_bits = bits.bytes;

        let (algorithm, handle) = match PublicKeyAlgorithm::from_der(alg_oid) {
            Some(PublicKeyAlgorithm::Rsa) => {
                if params.is_some_and(|p| p.tag != tag::NULL || !p.content().is_empty()) {
                    return Err(Error::InvalidKey("RSA parameters must be NULL".into()));
                }
                let mut inner = Reader::new(key_bits);
                let seq = inner.read_expected(tag::SEQUENCE)?;
                inner.finish("RSAPublicKey")?;
                let handle = KeyHandle::Rsa {
                    raw: seq.raw().to_vec(),
                };
                (KeyAlgorithm::Rsa, handle)
            }
            Some(PublicKeyAlgorithm::Ec) => {
                let params = params.ok_or_else(|| Error::InvalidKey("EC key without curve".into()))?;
                let curve = match params.tag {
                    tag::OID => {
                        let curve_oid = params.content();
                        match NamedCurve::from_der(curve_oid) {
                            Some(c) => EcCurve::Named(c),
                            None => {
                                return Err(Error::UnsupportedCurve(oid::to_dotted(curve_oid)?))
                            }
                        }
                    }
                    tag::SEQUENCE => {
                        let mut r = Reader::new(params.raw());
                        EcCurve::Explicit(CurveParams::read(&mut r)?)
                    }
                    _ => return Err(Error::UnsupportedCurve("implicitCA".into())),
                };
                check_point(&curve, key_bits)?;
                let handle = KeyHandle::Ec {
                    curve,
                    point: key_bits.to_vec(),
                };
                (KeyAlgorithm::Ec, handle)
            }
            Some(PublicKeyAlgorithm::Ed25519) => {
                if params.is_some() {
                    return Err(Error::InvalidKey("Ed25519 takes no parameters".into()));
                }
                let point: [u8; 32] = key_bits
                    .try_into()
                    .map_err(|_| Error::InvalidKey(format!("Ed25519 key is {} bytes", key_bits.len())))?;
                (KeyAlgorithm::Ed25519, KeyHandle::Ed25519(point))
            }
            Some(PublicKeyAlgorithm::Dsa) => {
                let key = integer_key(key_bits)?;
                let params = params.map(|p| p.raw().to_vec()).unwrap_or_default();
                (KeyAlgorithm::Dsa, KeyHandle::Dsa { params, key })
            }
            Some(PublicKeyAlgorithm::Dh) => {
                let key = integer_key(key_bits)?;
                let params = params
                    .ok_or_else(|| Error::InvalidKey("DH key without parameters".into()))?
                    .raw()
                    .to_vec();
                (KeyAlgorithm::Dh, KeyHandle::Dh { params, key })
            }
            Some(other) => return Err(Error::UnsupportedKeyType(other.name().to_string())),
            None => return Err(Error::UnsupportedKeyType(oid::to_dotted(alg_oid)?)),
        };

        Ok(PublicKey {
            algorithm,
            handle,
            spki: element.raw().to_vec(),
            key_bits: key_bits.to_vec(),
        })
    }

    /// Decode a standalone DER `SubjectPublicKeyInfo`.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(der);
        let key = Self::read(&mut reader)?;
        reader.finish("SubjectPublicKeyInfo")?;
        Ok(key)
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    pub fn handle(&self) -> &KeyHandle {
        &self.handle
    }

    /// The complete `SubjectPublicKeyInfo` TLV.
    pub fn spki(&self) -> &[u8] {
        &self.spki
    }

    /// Content of the `subjectPublicKey` BIT STRING.
    pub fn key_bits(&self) -> &[u8] {
        &self.key_bits
    }

    /// SHA-1 of the `subjectPublicKey` bits: the OCSP issuer key hash and
    /// the RFC 5280 method-1 key identifier.
    pub fn key_hash(&self) -> [u8; 20] {
        sha1::Sha1::digest(&self.key_bits).into()
    }

    /// RSA modulus and exponent magnitudes.
    pub fn rsa_components(&self) -> Result<(&[u8], &[u8])> {
        match &self.handle {
            KeyHandle::Rsa { raw } => {
                let mut outer = Reader::new(raw);
                let mut seq = outer.read_sequence()?;
                let n = seq.read_integer()?;
                let e = seq.read_integer()?;
                seq.finish("RSAPublicKey")?;
                Ok((n, e))
            }
            _ => Err(Error::KeyAlgorithmMismatch),
        }
    }

    pub fn curve(&self) -> Option<&EcCurve> {
        match &self.handle {
            KeyHandle::Ec { curve, .. } => Some(curve),
            _ => None,
        }
    }

    /// Key size in bits, where it is meaningful.
    pub fn key_size(&self) -> Option<u32> {
        match &self.handle {
            KeyHandle::Rsa { .. } => {
                let (n, _) = self.rsa_components().ok()?;
                let first = n.first()?;
                let bits = (n.len() - 1) * 8 + (8 - first.leading_zeros() as usize);
                u32::try_from(bits).ok()
            }
            KeyHandle::Ec { curve, .. } => Some(curve.bits()),
            KeyHandle::Ed25519(_) => Some(256),
            KeyHandle::Dsa { key, .. } | KeyHandle::Dh { key, .. } => {
                u32::try_from(key.len() * 8).ok()
            }
        }
    }

    /// RSA modulus as uppercase hex.
    pub fn modulus_hex(&self) -> Option<String> {
        self.rsa_components()
            .ok()
            .map(|(n, _)| hex::encode_upper(n))
    }

    /// RSA public exponent, if it fits in 64 bits.
    pub fn exponent(&self) -> Option<u64> {
        let (_, e) = self.rsa_components().ok()?;
        if e.len() > 8 {
            return None;
        }
        Some(e.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("PublicKey", 5)?;
        s.serialize_field("algorithm", &self.algorithm)?;
        s.serialize_field("key_size", &self.key_size())?;
        s.serialize_field("curve", &self.curve().map(EcCurve::display_name))?;
        s.serialize_field("modulus", &self.modulus_hex())?;
        s.serialize_field("exponent", &self.exponent())?;
        s.end()
    }
}

fn strip_zeros(bytes: &[u8]) -> Vec<u8> {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes.get(start..).unwrap_or_default().to_vec()
}

fn integer_key(key_bits: &[u8]) -> Result<Vec<u8>> {
    let mut r = Reader::new(key_bits);
    let key = r.read_integer()?.to_vec();
    r.finish("public key INTEGER")?;
    Ok(key)
}

fn check_point(curve: &EcCurve, point: &[u8]) -> Result<()> {
    let width = curve.coordinate_len();
    let ok = match point.first() {
        Some(0x04) => point.len() == 1 + 2 * width,
        Some(0x02 | 0x03) => point.len() == 1 + width,
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidKey(format!(
            "EC point of {} bytes for {}",
            point.len(),
            curve.display_name()
        )))
    }
}

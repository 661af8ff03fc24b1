//! OID registry.
//!
//! Every category of object identifier the decoders understand is a typed
//! enum generated by `oid_table!`. Each variant carries a compact numeric
//! id (unique within its category), its canonical DER content bytes, its
//! dotted-decimal form, and a short label.
//!
//! Lookups always compare the full OID bytes; there is no abbreviated
//! identification path. Unknown OIDs come back as `None` from [`resolve`],
//! which callers treat as "unsupported" rather than as a parse failure.

use crate::{Error, Result};
use serde::Serialize;

/// Semantic category an OID is resolved within.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Hash,
    Signature,
    PublicKey,
    Curve,
    BlockCipher,
    KeyWrap,
    Ocsp,
    Extension,
    Aia,
    Policy,
    ExtKeyUsage,
    Pbe,
    Hmac,
    NameAttribute,
    /// Accepts any OID without comparison.
    Ignore,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Category::Hash => "hash",
            Category::Signature => "signature",
            Category::PublicKey => "public-key",
            Category::Curve => "elliptic-curve",
            Category::BlockCipher => "block-cipher",
            Category::KeyWrap => "key-wrap",
            Category::Ocsp => "OCSP",
            Category::Extension => "certificate-extension",
            Category::Aia => "AIA",
            Category::Policy => "certificate-policy",
            Category::ExtKeyUsage => "extended-key-usage",
            Category::Pbe => "PBE/KDF",
            Category::Hmac => "HMAC",
            Category::NameAttribute => "name-attribute",
            Category::Ignore => "ignored",
        };
        f.write_str(s)
    }
}

macro_rules! oid_table {
    (
        $(#[$meta:meta])*
        $name:ident : $category:path {
            $( $variant:ident = $id:literal, $dotted:literal, $label:literal, [$($byte:literal),+ $(,)?]; )+
        }
    ) => {
        $(#[$meta])*
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every entry of the table.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Category this table belongs to.
            pub const CATEGORY: Category = $category;

            /// Compact numeric id.
            pub const fn id(self) -> u32 {
                match self {
                    $($name::$variant => $id),+
                }
            }

            /// DER content bytes (without tag and length).
            pub const fn der(self) -> &'static [u8] {
                match self {
                    $($name::$variant => &[$($byte),+]),+
                }
            }

            /// Dotted-decimal form.
            pub const fn dotted(self) -> &'static str {
                match self {
                    $($name::$variant => $dotted),+
                }
            }

            /// Short human-readable label.
            pub const fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            pub fn from_id(id: u32) -> Option<Self> {
                Self::ALL.iter().copied().find(|v| v.id() == id)
            }

            /// Exact lookup by DER content bytes.
            pub fn from_der(der: &[u8]) -> Option<Self> {
                Self::ALL.iter().copied().find(|v| v.der() == der)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

oid_table! {
    /// Message digest algorithms.
    HashAlgorithm: Category::Hash {
        Md5 = 1, "1.2.840.113549.2.5", "MD5", [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x02, 0x05];
        Sha1 = 2, "1.3.14.3.2.26", "SHA1", [0x2b, 0x0e, 0x03, 0x02, 0x1a];
        Sha224 = 3, "2.16.840.1.101.3.4.2.4", "SHA224", [0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x04];
        Sha256 = 4, "2.16.840.1.101.3.4.2.1", "SHA256", [0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01];
        Sha384 = 5, "2.16.840.1.101.3.4.2.2", "SHA384", [0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x02];
        Sha512 = 6, "2.16.840.1.101.3.4.2.3", "SHA512", [0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x03];
        Sha3_256 = 7, "2.16.840.1.101.3.4.2.8", "SHA3-256", [0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x08];
    }
}

oid_table! {
    /// Signature algorithms as they appear in `AlgorithmIdentifier`.
    SignatureAlgorithm: Category::Signature {
        Md5WithRsa = 1, "1.2.840.113549.1.1.4", "md5WithRSAEncryption", [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x04];
        Sha1WithRsa = 2, "1.2.840.113549.1.1.5", "sha1WithRSAEncryption", [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x05];
        Sha224WithRsa = 3, "1.2.840.113549.1.1.14", "sha224WithRSAEncryption", [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0e];
        Sha256WithRsa = 4, "1.2.840.113549.1.1.11", "sha256WithRSAEncryption", [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0b];
        Sha384WithRsa = 5, "1.2.840.113549.1.1.12", "sha384WithRSAEncryption", [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0c];
        Sha512WithRsa = 6, "1.2.840.113549.1.1.13", "sha512WithRSAEncryption", [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0d];
        RsaPss = 7, "1.2.840.113549.1.1.10", "rsassaPss", [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0a];
        EcdsaWithSha1 = 8, "1.2.840.10045.4.1", "ecdsa-with-SHA1", [0x2a, 0x86, 0x48, 0xce, 0x3d, 0x04, 0x01];
        EcdsaWithSha224 = 9, "1.2.840.10045.4.3.1", "ecdsa-with-SHA224", [0x2a, 0x86, 0x48, 0xce, 0x3d, 0x04, 0x03, 0x01];
        EcdsaWithSha256 = 10, "1.2.840.10045.4.3.2", "ecdsa-with-SHA256", [0x2a, 0x86, 0x48, 0xce, 0x3d, 0x04, 0x03, 0x02];
        EcdsaWithSha384 = 11, "1.2.840.10045.4.3.3", "ecdsa-with-SHA384", [0x2a, 0x86, 0x48, 0xce, 0x3d, 0x04, 0x03, 0x03];
        EcdsaWithSha512 = 12, "1.2.840.10045.4.3.4", "ecdsa-with-SHA512", [0x2a, 0x86, 0x48, 0xce, 0x3d, 0x04, 0x03, 0x04];
        Ed25519 = 13, "1.3.101.112", "ED25519", [0x2b, 0x65, 0x70];
        Ed448 = 14, "1.3.101.113", "ED448", [0x2b, 0x65, 0x71];
        DsaWithSha1 = 15, "1.2.840.10040.4.3", "dsaWithSHA1", [0x2a, 0x86, 0x48, 0xce, 0x38, 0x04, 0x03];
        DsaWithSha256 = 16, "2.16.840.1.101.3.4.3.2", "dsa_with_SHA256", [0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x03, 0x02];
    }
}

oid_table! {
    /// `SubjectPublicKeyInfo` algorithm identifiers.
    PublicKeyAlgorithm: Category::PublicKey {
        Rsa = 1, "1.2.840.113549.1.1.1", "rsaEncryption", [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01];
        RsaPss = 2, "1.2.840.113549.1.1.10", "rsassaPss", [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0a];
        Ec = 3, "1.2.840.10045.2.1", "id-ecPublicKey", [0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01];
        Dsa = 4, "1.2.840.10040.4.1", "dsaEncryption", [0x2a, 0x86, 0x48, 0xce, 0x38, 0x04, 0x01];
        Dh = 5, "1.2.840.10046.2.1", "dhpublicnumber", [0x2a, 0x86, 0x48, 0xce, 0x3e, 0x02, 0x01];
        Ed25519 = 6, "1.3.101.112", "ED25519", [0x2b, 0x65, 0x70];
        Ed448 = 7, "1.3.101.113", "ED448", [0x2b, 0x65, 0x71];
    }
}

oid_table! {
    /// Named elliptic curves.
    NamedCurve: Category::Curve {
        P256 = 1, "1.2.840.10045.3.1.7", "prime256v1", [0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07];
        P224 = 2, "1.3.132.0.33", "secp224r1", [0x2b, 0x81, 0x04, 0x00, 0x21];
        P384 = 3, "1.3.132.0.34", "secp384r1", [0x2b, 0x81, 0x04, 0x00, 0x22];
        P521 = 4, "1.3.132.0.35", "secp521r1", [0x2b, 0x81, 0x04, 0x00, 0x23];
        Secp256k1 = 5, "1.3.132.0.10", "secp256k1", [0x2b, 0x81, 0x04, 0x00, 0x0a];
        BrainpoolP256r1 = 6, "1.3.36.3.3.2.8.1.1.7", "brainpoolP256r1", [0x2b, 0x24, 0x03, 0x03, 0x02, 0x08, 0x01, 0x01, 0x07];
    }
}

oid_table! {
    /// Symmetric block ciphers (content encryption).
    BlockCipher: Category::BlockCipher {
        Aes128Cbc = 1, "2.16.840.1.101.3.4.1.2", "aes-128-cbc", [0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x01, 0x02];
        Aes192Cbc = 2, "2.16.840.1.101.3.4.1.22", "aes-192-cbc", [0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x01, 0x16];
        Aes256Cbc = 3, "2.16.840.1.101.3.4.1.42", "aes-256-cbc", [0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x01, 0x2a];
        Aes128Gcm = 4, "2.16.840.1.101.3.4.1.6", "aes-128-gcm", [0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x01, 0x06];
        Aes256Gcm = 5, "2.16.840.1.101.3.4.1.46", "aes-256-gcm", [0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x01, 0x2e];
        DesEde3Cbc = 6, "1.2.840.113549.3.7", "des-ede3-cbc", [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x03, 0x07];
    }
}

oid_table! {
    /// AES key-wrap algorithms.
    KeyWrap: Category::KeyWrap {
        Aes128Wrap = 1, "2.16.840.1.101.3.4.1.5", "id-aes128-wrap", [0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x01, 0x05];
        Aes192Wrap = 2, "2.16.840.1.101.3.4.1.25", "id-aes192-wrap", [0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x01, 0x19];
        Aes256Wrap = 3, "2.16.840.1.101.3.4.1.45", "id-aes256-wrap", [0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x01, 0x2d];
    }
}

oid_table! {
    /// OCSP response types and extensions (RFC 6960).
    OcspOid: Category::Ocsp {
        Basic = 1, "1.3.6.1.5.5.7.48.1.1", "id-pkix-ocsp-basic", [0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x30, 0x01, 0x01];
        Nonce = 2, "1.3.6.1.5.5.7.48.1.2", "id-pkix-ocsp-nonce", [0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x30, 0x01, 0x02];
        CrlId = 3, "1.3.6.1.5.5.7.48.1.3", "id-pkix-ocsp-crl", [0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x30, 0x01, 0x03];
        NoCheck = 4, "1.3.6.1.5.5.7.48.1.5", "id-pkix-ocsp-nocheck", [0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x30, 0x01, 0x05];
    }
}

oid_table! {
    /// X.509v3 certificate and CRL extensions (RFC 5280 Section 4.2).
    ExtensionId: Category::Extension {
        AuthorityKeyId = 1, "2.5.29.35", "authorityKeyIdentifier", [0x55, 0x1d, 0x23];
        SubjectKeyId = 2, "2.5.29.14", "subjectKeyIdentifier", [0x55, 0x1d, 0x0e];
        KeyUsage = 3, "2.5.29.15", "keyUsage", [0x55, 0x1d, 0x0f];
        PrivateKeyUsagePeriod = 4, "2.5.29.16", "privateKeyUsagePeriod", [0x55, 0x1d, 0x10];
        SubjectAltName = 5, "2.5.29.17", "subjectAltName", [0x55, 0x1d, 0x11];
        IssuerAltName = 6, "2.5.29.18", "issuerAltName", [0x55, 0x1d, 0x12];
        BasicConstraints = 7, "2.5.29.19", "basicConstraints", [0x55, 0x1d, 0x13];
        CrlNumber = 8, "2.5.29.20", "cRLNumber", [0x55, 0x1d, 0x14];
        CrlReason = 9, "2.5.29.21", "cRLReason", [0x55, 0x1d, 0x15];
        InvalidityDate = 10, "2.5.29.24", "invalidityDate", [0x55, 0x1d, 0x18];
        DeltaCrlIndicator = 11, "2.5.29.27", "deltaCRLIndicator", [0x55, 0x1d, 0x1b];
        IssuingDistributionPoint = 12, "2.5.29.28", "issuingDistributionPoint", [0x55, 0x1d, 0x1c];
        NameConstraints = 13, "2.5.29.30", "nameConstraints", [0x55, 0x1d, 0x1e];
        CrlDistributionPoints = 14, "2.5.29.31", "cRLDistributionPoints", [0x55, 0x1d, 0x1f];
        CertificatePolicies = 15, "2.5.29.32", "certificatePolicies", [0x55, 0x1d, 0x20];
        PolicyMappings = 16, "2.5.29.33", "policyMappings", [0x55, 0x1d, 0x21];
        PolicyConstraints = 17, "2.5.29.36", "policyConstraints", [0x55, 0x1d, 0x24];
        ExtKeyUsage = 18, "2.5.29.37", "extendedKeyUsage", [0x55, 0x1d, 0x25];
        FreshestCrl = 19, "2.5.29.46", "freshestCRL", [0x55, 0x1d, 0x2e];
        InhibitAnyPolicy = 20, "2.5.29.54", "inhibitAnyPolicy", [0x55, 0x1d, 0x36];
        AuthorityInfoAccess = 21, "1.3.6.1.5.5.7.1.1", "authorityInfoAccess", [0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x01, 0x01];
        SubjectInfoAccess = 22, "1.3.6.1.5.5.7.1.11", "subjectInfoAccess", [0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x01, 0x0b];
        TlsFeature = 23, "1.3.6.1.5.5.7.1.12", "tlsfeature", [0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x01, 0x0c];
        NetscapeCertType = 24, "2.16.840.1.113730.1.1", "nsCertType", [0x60, 0x86, 0x48, 0x01, 0x86, 0xf8, 0x42, 0x01, 0x01];
        SctList = 25, "1.3.6.1.4.1.11129.2.4.2", "ct_precert_scts", [0x2b, 0x06, 0x01, 0x04, 0x01, 0xd6, 0x79, 0x02, 0x04, 0x02];
    }
}

oid_table! {
    /// Authority information access methods.
    AccessMethod: Category::Aia {
        Ocsp = 1, "1.3.6.1.5.5.7.48.1", "OCSP", [0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x30, 0x01];
        CaIssuers = 2, "1.3.6.1.5.5.7.48.2", "CA Issuers", [0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x30, 0x02];
    }
}

oid_table! {
    /// Certificate policy and qualifier identifiers.
    PolicyOid: Category::Policy {
        AnyPolicy = 1, "2.5.29.32.0", "anyPolicy", [0x55, 0x1d, 0x20, 0x00];
        Cps = 2, "1.3.6.1.5.5.7.2.1", "id-qt-cps", [0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x02, 0x01];
        UserNotice = 3, "1.3.6.1.5.5.7.2.2", "id-qt-unotice", [0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x02, 0x02];
        CabfEv = 4, "2.23.140.1.1", "ev-guidelines", [0x67, 0x81, 0x0c, 0x01, 0x01];
        CabfDv = 5, "2.23.140.1.2.1", "domain-validated", [0x67, 0x81, 0x0c, 0x01, 0x02, 0x01];
        CabfOv = 6, "2.23.140.1.2.2", "organization-validated", [0x67, 0x81, 0x0c, 0x01, 0x02, 0x02];
        CabfIv = 7, "2.23.140.1.2.3", "individual-validated", [0x67, 0x81, 0x0c, 0x01, 0x02, 0x03];
    }
}

oid_table! {
    /// Extended key usage purposes (RFC 5280 Section 4.2.1.12).
    KeyPurpose: Category::ExtKeyUsage {
        Any = 1, "2.5.29.37.0", "anyExtendedKeyUsage", [0x55, 0x1d, 0x25, 0x00];
        ServerAuth = 2, "1.3.6.1.5.5.7.3.1", "serverAuth", [0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x01];
        ClientAuth = 3, "1.3.6.1.5.5.7.3.2", "clientAuth", [0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x02];
        CodeSigning = 4, "1.3.6.1.5.5.7.3.3", "codeSigning", [0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x03];
        EmailProtection = 5, "1.3.6.1.5.5.7.3.4", "emailProtection", [0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x04];
        IpsecEndSystem = 6, "1.3.6.1.5.5.7.3.5", "ipsecEndSystem", [0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x05];
        IpsecTunnel = 7, "1.3.6.1.5.5.7.3.6", "ipsecTunnel", [0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x06];
        IpsecUser = 8, "1.3.6.1.5.5.7.3.7", "ipsecUser", [0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x07];
        TimeStamping = 9, "1.3.6.1.5.5.7.3.8", "timeStamping", [0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x08];
        OcspSigning = 10, "1.3.6.1.5.5.7.3.9", "OCSPSigning", [0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x09];
    }
}

oid_table! {
    /// Password-based encryption and key derivation schemes.
    PbeAlgorithm: Category::Pbe {
        Pbkdf2 = 1, "1.2.840.113549.1.5.12", "PBKDF2", [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x05, 0x0c];
        Pbes2 = 2, "1.2.840.113549.1.5.13", "PBES2", [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x05, 0x0d];
        PbeSha1Rc4_128 = 3, "1.2.840.113549.1.12.1.1", "pbeWithSHA1And128BitRC4", [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x0c, 0x01, 0x01];
        PbeSha1Des3 = 4, "1.2.840.113549.1.12.1.3", "pbeWithSHA1And3-KeyTripleDES-CBC", [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x0c, 0x01, 0x03];
        PbeSha1Rc2_40 = 5, "1.2.840.113549.1.12.1.6", "pbeWithSHA1And40BitRC2-CBC", [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x0c, 0x01, 0x06];
        PbeMd5Des = 6, "1.2.840.113549.1.5.3", "pbeWithMD5AndDES-CBC", [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x05, 0x03];
        PbeSha1Des = 7, "1.2.840.113549.1.5.10", "pbeWithSHA1AndDES-CBC", [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x05, 0x0a];
    }
}

oid_table! {
    /// HMAC PRFs.
    HmacAlgorithm: Category::Hmac {
        Sha1 = 1, "1.2.840.113549.2.7", "hmacWithSHA1", [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x02, 0x07];
        Sha224 = 2, "1.2.840.113549.2.8", "hmacWithSHA224", [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x02, 0x08];
        Sha256 = 3, "1.2.840.113549.2.9", "hmacWithSHA256", [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x02, 0x09];
        Sha384 = 4, "1.2.840.113549.2.10", "hmacWithSHA384", [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x02, 0x0a];
        Sha512 = 5, "1.2.840.113549.2.11", "hmacWithSHA512", [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x02, 0x0b];
    }
}

oid_table! {
    /// Distinguished name attribute types (X.520, PKCS#9, RFC 4519 pilot attributes).
    NameAttribute: Category::NameAttribute {
        CommonName = 1, "2.5.4.3", "CN", [0x55, 0x04, 0x03];
        Surname = 2, "2.5.4.4", "SN", [0x55, 0x04, 0x04];
        SerialNumber = 3, "2.5.4.5", "serialNumber", [0x55, 0x04, 0x05];
        Country = 4, "2.5.4.6", "C", [0x55, 0x04, 0x06];
        Locality = 5, "2.5.4.7", "L", [0x55, 0x04, 0x07];
        State = 6, "2.5.4.8", "ST", [0x55, 0x04, 0x08];
        Street = 7, "2.5.4.9", "street", [0x55, 0x04, 0x09];
        Organization = 8, "2.5.4.10", "O", [0x55, 0x04, 0x0a];
        OrgUnit = 9, "2.5.4.11", "OU", [0x55, 0x04, 0x0b];
        Title = 10, "2.5.4.12", "title", [0x55, 0x04, 0x0c];
        PostalCode = 11, "2.5.4.17", "postalCode", [0x55, 0x04, 0x11];
        GivenName = 12, "2.5.4.42", "GN", [0x55, 0x04, 0x2a];
        Email = 13, "1.2.840.113549.1.9.1", "emailAddress", [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x09, 0x01];
        DomainComponent = 14, "0.9.2342.19200300.100.1.25", "DC", [0x09, 0x92, 0x26, 0x89, 0x93, 0xf2, 0x2c, 0x64, 0x01, 0x19];
        UserId = 15, "0.9.2342.19200300.100.1.1", "UID", [0x09, 0x92, 0x26, 0x89, 0x93, 0xf2, 0x2c, 0x64, 0x01, 0x01];
    }
}

/// `prime-field` field type of explicit EC parameters (X9.62).
pub const PRIME_FIELD: &[u8] = &[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x01, 0x01];

/// `id-on-hardwareModuleName` otherName type (RFC 4108).
pub const HARDWARE_MODULE_NAME: &[u8] = &[0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x08, 0x04];

/// Resolve OID bytes to a numeric id within `category`.
///
/// [`Category::Ignore`] always succeeds with id 0.
pub fn resolve(der: &[u8], category: Category) -> Option<u32> {
    match category {
        Category::Ignore => Some(0),
        Category::Hash => HashAlgorithm::from_der(der).map(HashAlgorithm::id),
        Category::Signature => SignatureAlgorithm::from_der(der).map(SignatureAlgorithm::id),
        Category::PublicKey => PublicKeyAlgorithm::from_der(der).map(PublicKeyAlgorithm::id),
        Category::Curve => NamedCurve::from_der(der).map(NamedCurve::id),
        Category::BlockCipher => BlockCipher::from_der(der).map(BlockCipher::id),
        Category::KeyWrap => KeyWrap::from_der(der).map(KeyWrap::id),
        Category::Ocsp => OcspOid::from_der(der).map(OcspOid::id),
        Category::Extension => ExtensionId::from_der(der).map(ExtensionId::id),
        Category::Aia => AccessMethod::from_der(der).map(AccessMethod::id),
        Category::Policy => PolicyOid::from_der(der).map(PolicyOid::id),
        Category::ExtKeyUsage => KeyPurpose::from_der(der).map(KeyPurpose::id),
        Category::Pbe => PbeAlgorithm::from_der(der).map(PbeAlgorithm::id),
        Category::Hmac => HmacAlgorithm::from_der(der).map(HmacAlgorithm::id),
        Category::NameAttribute => NameAttribute::from_der(der).map(NameAttribute::id),
    }
}

/// Like [`resolve`], but an unknown OID is a hard [`Error::UnknownOid`].
pub fn resolve_strict(der: &[u8], category: Category) -> Result<u32> {
    resolve(der, category).ok_or_else(|| Error::UnknownOid {
        category,
        oid: to_dotted(der).unwrap_or_else(|_| hex::encode(der)),
    })
}

/// DER content bytes for a numeric id within `category`.
pub fn emit(id: u32, category: Category) -> Option<&'static [u8]> {
    match category {
        Category::Ignore => None,
        Category::Hash => HashAlgorithm::from_id(id).map(HashAlgorithm::der),
        Category::Signature => SignatureAlgorithm::from_id(id).map(SignatureAlgorithm::der),
        Category::PublicKey => PublicKeyAlgorithm::from_id(id).map(PublicKeyAlgorithm::der),
        Category::Curve => NamedCurve::from_id(id).map(NamedCurve::der),
        Category::BlockCipher => BlockCipher::from_id(id).map(BlockCipher::der),
        Category::KeyWrap => KeyWrap::from_id(id).map(KeyWrap::der),
        Category::Ocsp => OcspOid::from_id(id).map(OcspOid::der),
        Category::Extension => ExtensionId::from_id(id).map(ExtensionId::der),
        Category::Aia => AccessMethod::from_id(id).map(AccessMethod::der),
        Category::Policy => PolicyOid::from_id(id).map(PolicyOid::der),
        Category::ExtKeyUsage => KeyPurpose::from_id(id).map(KeyPurpose::der),
        Category::Pbe => PbeAlgorithm::from_id(id).map(PbeAlgorithm::der),
        Category::Hmac => HmacAlgorithm::from_id(id).map(HmacAlgorithm::der),
        Category::NameAttribute => NameAttribute::from_id(id).map(NameAttribute::der),
    }
}

/// Label of a known OID in any category, for display.
pub fn describe(der: &[u8]) -> Option<&'static str> {
    ExtensionId::from_der(der)
        .map(ExtensionId::name)
        .or_else(|| SignatureAlgorithm::from_der(der).map(SignatureAlgorithm::name))
        .or_else(|| PublicKeyAlgorithm::from_der(der).map(PublicKeyAlgorithm::name))
        .or_else(|| NamedCurve::from_der(der).map(NamedCurve::name))
        .or_else(|| HashAlgorithm::from_der(der).map(HashAlgorithm::name))
        .or_else(|| KeyPurpose::from_der(der).map(KeyPurpose::name))
        .or_else(|| PolicyOid::from_der(der).map(PolicyOid::name))
        .or_else(|| NameAttribute::from_der(der).map(NameAttribute::name))
        .or_else(|| AccessMethod::from_der(der).map(AccessMethod::name))
        .or_else(|| OcspOid::from_der(der).map(OcspOid::name))
}

/// Convert OID content bytes to dotted-decimal text.
pub fn to_dotted(der: &[u8]) -> Result<String> {
    let mut arcs: Vec<u64> = Vec::new();
    let mut value: u64 = 0;
    let mut in_progress = false;
    for &byte in der {
        if !in_progress && byte == 0x80 {
            // leading 0x80 makes a sub-identifier non-minimal
            return Err(Error::Malformed("object identifier"));
        }
        if value > (u64::MAX >> 7) {
            return Err(Error::Malformed("object identifier"));
        }
        value = (value << 7) | u64::from(byte & 0x7f);
        in_progress = byte & 0x80 != 0;
        if !in_progress {
            if arcs.is_empty() {
                let (first, second) = match value {
                    0..=39 => (0, value),
                    40..=79 => (1, value - 40),
                    _ => (2, value - 80),
                };
                arcs.push(first);
                arcs.push(second);
            } else {
                arcs.push(value);
            }
            value = 0;
        }
    }
    if in_progress || arcs.is_empty() {
        return Err(Error::Malformed("object identifier"));
    }
    Ok(arcs
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join("."))
}

/// Encode dotted-decimal text as OID content bytes.
pub fn from_dotted(dotted: &str) -> Option<Vec<u8>> {
    let arcs: Vec<u64> = dotted
        .split('.')
        .map(|s| s.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;
    let (&first, rest) = arcs.split_first()?;
    let (&second, rest) = rest.split_first()?;
    if first > 2 || (first < 2 && second >= 40) {
        return None;
    }
    let mut out = Vec::new();
    for arc in std::iter::once(first * 40 + second).chain(rest.iter().copied()) {
        let mut chunk = vec![(arc & 0x7f) as u8];
        let mut rem = arc >> 7;
        while rem != 0 {
            chunk.push((rem & 0x7f) as u8 | 0x80);
            rem >>= 7;
        }
        out.extend(chunk.iter().rev());
    }
    Some(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    macro_rules! check_table {
        ($table:ty) => {{
            let mut ids = HashSet::new();
            for entry in <$table>::ALL {
                assert_eq!(
                    from_dotted(entry.dotted()).unwrap(),
                    entry.der(),
                    "{} bytes do not match {}",
                    entry.name(),
                    entry.dotted()
                );
                assert_eq!(to_dotted(entry.der()).unwrap(), entry.dotted());
                assert!(ids.insert(entry.id()), "duplicate id in {}", stringify!($table));
                assert_eq!(resolve(entry.der(), <$table>::CATEGORY), Some(entry.id()));
                assert_eq!(emit(entry.id(), <$table>::CATEGORY), Some(entry.der()));
            }
        }};
    }

    #[test]
    fn every_table_is_self_consistent() {
        check_table!(HashAlgorithm);
        check_table!(SignatureAlgorithm);
        check_table!(PublicKeyAlgorithm);
        check_table!(NamedCurve);
        check_table!(BlockCipher);
        check_table!(KeyWrap);
        check_table!(OcspOid);
        check_table!(ExtensionId);
        check_table!(AccessMethod);
        check_table!(PolicyOid);
        check_table!(KeyPurpose);
        check_table!(PbeAlgorithm);
        check_table!(HmacAlgorithm);
        check_table!(NameAttribute);
    }

    #[test]
    fn standalone_constants_match_dotted() {
        assert_eq!(from_dotted("1.2.840.10045.1.1").unwrap(), PRIME_FIELD);
        assert_eq!(from_dotted("1.3.6.1.5.5.7.8.4").unwrap(), HARDWARE_MODULE_NAME);
    }

    #[test]
    fn unknown_oid_is_recoverable() {
        let unknown = from_dotted("1.2.3.4.5").unwrap();
        assert_eq!(resolve(&unknown, Category::Extension), None);
        match resolve_strict(&unknown, Category::Extension) {
            Err(Error::UnknownOid { category, oid }) => {
                assert_eq!(category, Category::Extension);
                assert_eq!(oid, "1.2.3.4.5");
            }
            other => panic!("expected UnknownOid, got {:?}", other),
        }
    }

    #[test]
    fn ignore_category_always_resolves() {
        assert_eq!(resolve(&[0x2a, 0x03], Category::Ignore), Some(0));
        assert_eq!(emit(0, Category::Ignore), None);
    }

    #[test]
    fn same_oid_in_two_categories_resolves_independently() {
        let ed25519 = SignatureAlgorithm::Ed25519.der();
        assert_eq!(
            resolve(ed25519, Category::Signature),
            Some(SignatureAlgorithm::Ed25519.id())
        );
        assert_eq!(
            resolve(ed25519, Category::PublicKey),
            Some(PublicKeyAlgorithm::Ed25519.id())
        );
        assert_eq!(resolve(ed25519, Category::Hash), None);
    }

    #[test]
    fn prefix_of_known_oid_does_not_match() {
        // 2.5.29 is a prefix of every certificate extension
        assert_eq!(resolve(&[0x55, 0x1d], Category::Extension), None);
        // one byte longer than basicConstraints
        assert_eq!(resolve(&[0x55, 0x1d, 0x13, 0x00], Category::Extension), None);
    }

    #[test]
    fn dotted_conversion_edge_cases() {
        assert_eq!(to_dotted(&[0x2a, 0x86, 0x48]).unwrap(), "1.2.840");
        assert_eq!(to_dotted(&[0x88, 0x37, 0x03]).unwrap(), "2.999.3");
        assert!(to_dotted(&[0x2a, 0x86]).is_err());
        assert!(to_dotted(&[0x2a, 0x80, 0x01]).is_err());
        assert!(to_dotted(&[]).is_err());
        assert_eq!(from_dotted("2.999.3").unwrap(), vec![0x88, 0x37, 0x03]);
        assert!(from_dotted("3.1").is_none());
        assert!(from_dotted("1.40").is_none());
        assert!(from_dotted("1").is_none());
        assert!(from_dotted("1.2.x").is_none());
    }

    #[test]
    fn describe_finds_labels() {
        assert_eq!(describe(ExtensionId::SubjectAltName.der()), Some("subjectAltName"));
        assert_eq!(describe(&from_dotted("1.2.3.4").unwrap()), None);
    }
}

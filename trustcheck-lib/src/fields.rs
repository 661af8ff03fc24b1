//! Typed values carried by certificate extensions.

use crate::name::DecodedName;
use serde::Serialize;

/// KeyUsage bitmask. The first BIT STRING octet maps to the low byte and
/// `decipherOnly` to `0x8000`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct KeyUsage(pub u16);

impl KeyUsage {
    pub const DIGITAL_SIGNATURE: KeyUsage = KeyUsage(0x0080);
    pub const NON_REPUDIATION: KeyUsage = KeyUsage(0x0040);
    pub const KEY_ENCIPHERMENT: KeyUsage = KeyUsage(0x0020);
    pub const DATA_ENCIPHERMENT: KeyUsage = KeyUsage(0x0010);
    pub const KEY_AGREEMENT: KeyUsage = KeyUsage(0x0008);
    pub const KEY_CERT_SIGN: KeyUsage = KeyUsage(0x0004);
    pub const CRL_SIGN: KeyUsage = KeyUsage(0x0002);
    pub const ENCIPHER_ONLY: KeyUsage = KeyUsage(0x0001);
    pub const DECIPHER_ONLY: KeyUsage = KeyUsage(0x8000);

    const NAMES: &'static [(KeyUsage, &'static str)] = &[
        (Self::DIGITAL_SIGNATURE, "Digital Signature"),
        (Self::NON_REPUDIATION, "Non Repudiation"),
        (Self::KEY_ENCIPHERMENT, "Key Encipherment"),
        (Self::DATA_ENCIPHERMENT, "Data Encipherment"),
        (Self::KEY_AGREEMENT, "Key Agreement"),
        (Self::KEY_CERT_SIGN, "Certificate Sign"),
        (Self::CRL_SIGN, "CRL Sign"),
        (Self::ENCIPHER_ONLY, "Encipher Only"),
        (Self::DECIPHER_ONLY, "Decipher Only"),
    ];

    /// Build from the content bytes of the KeyUsage BIT STRING.
    pub fn from_bits(bytes: &[u8]) -> Self {
        let low = bytes.first().copied().unwrap_or(0);
        let high = bytes.get(1).copied().unwrap_or(0);
        KeyUsage(u16::from(low) | (u16::from(high) << 8))
    }

    pub fn contains(self, other: KeyUsage) -> bool {
        self.0 & other.0 == other.0
    }

    /// OpenSSL-style labels of the set bits.
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl std::ops::BitOr for KeyUsage {
    type Output = KeyUsage;
    fn bitor(self, rhs: KeyUsage) -> KeyUsage {
        KeyUsage(self.0 | rhs.0)
    }
}

/// ExtendedKeyUsage bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ExtKeyUsage(pub u8);

impl ExtKeyUsage {
    pub const ANY: ExtKeyUsage = ExtKeyUsage(0x01);
    pub const SERVER_AUTH: ExtKeyUsage = ExtKeyUsage(0x02);
    pub const CLIENT_AUTH: ExtKeyUsage = ExtKeyUsage(0x04);
    pub const CODE_SIGNING: ExtKeyUsage = ExtKeyUsage(0x08);
    pub const EMAIL_PROTECTION: ExtKeyUsage = ExtKeyUsage(0x10);
    pub const TIME_STAMPING: ExtKeyUsage = ExtKeyUsage(0x20);
    pub const OCSP_SIGNING: ExtKeyUsage = ExtKeyUsage(0x40);

    const NAMES: &'static [(ExtKeyUsage, &'static str)] = &[
        (Self::ANY, "Any Extended Key Usage"),
        (Self::SERVER_AUTH, "TLS Web Server Authentication"),
        (Self::CLIENT_AUTH, "TLS Web Client Authentication"),
        (Self::CODE_SIGNING, "Code Signing"),
        (Self::EMAIL_PROTECTION, "E-mail Protection"),
        (Self::TIME_STAMPING, "Time Stamping"),
        (Self::OCSP_SIGNING, "OCSP Signing"),
    ];

    pub fn contains(self, other: ExtKeyUsage) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether `purpose` is allowed, counting `anyExtendedKeyUsage`.
    pub fn permits(self, purpose: ExtKeyUsage) -> bool {
        self.contains(Self::ANY) || self.contains(purpose)
    }

    pub fn names(self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl std::ops::BitOr for ExtKeyUsage {
    type Output = ExtKeyUsage;
    fn bitor(self, rhs: ExtKeyUsage) -> ExtKeyUsage {
        ExtKeyUsage(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for ExtKeyUsage {
    fn bitor_assign(&mut self, rhs: ExtKeyUsage) {
        self.0 |= rhs.0;
    }
}

/// Subject Alternative Name entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum AltName {
    Dns(String),
    Email(String),
    Uri(String),
    Ip(String),
    DirName(String),
    /// `id-on-hardwareModuleName` otherName.
    HardwareModule { hw_type: String, serial: String },
    /// Any other otherName, kept opaque; the type OID in dotted form.
    Other(String),
}

impl AltName {
    pub fn type_label(&self) -> &'static str {
        match self {
            AltName::Dns(_) => "DNS",
            AltName::Email(_) => "email",
            AltName::Uri(_) => "URI",
            AltName::Ip(_) => "IP Address",
            AltName::DirName(_) => "DirName",
            AltName::HardwareModule { .. } => "HardwareModuleName",
            AltName::Other(_) => "othername",
        }
    }
}

impl std::fmt::Display for AltName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AltName::Dns(v)
            | AltName::Email(v)
            | AltName::Uri(v)
            | AltName::Ip(v)
            | AltName::DirName(v) => write!(f, "{}:{}", self.type_label(), v),
            AltName::HardwareModule { hw_type, serial } => {
                write!(f, "{}:{}/{}", self.type_label(), hw_type, serial)
            }
            AltName::Other(oid) => write!(f, "{}:{}:<unsupported>", self.type_label(), oid),
        }
    }
}

/// One name-constraint subtree base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum GeneralSubtree {
    Dns(String),
    Email(String),
    DirName(DecodedName),
}

impl std::fmt::Display for GeneralSubtree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneralSubtree::Dns(v) => write!(f, "DNS:{}", v),
            GeneralSubtree::Email(v) => write!(f, "email:{}", v),
            GeneralSubtree::DirName(n) => write!(f, "DirName:{}", n.display()),
        }
    }
}

/// Permitted and excluded subtrees of a NameConstraints extension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NameConstraints {
    pub permitted: Vec<GeneralSubtree>,
    pub excluded: Vec<GeneralSubtree>,
}

impl NameConstraints {
    pub fn is_empty(&self) -> bool {
        self.permitted.is_empty() && self.excluded.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_usage_bit_layout() {
        // digitalSignature | keyCertSign, then decipherOnly in the second octet
        let ku = KeyUsage::from_bits(&[0x84, 0x80]);
        assert!(ku.contains(KeyUsage::DIGITAL_SIGNATURE));
        assert!(ku.contains(KeyUsage::KEY_CERT_SIGN));
        assert!(ku.contains(KeyUsage::DECIPHER_ONLY));
        assert!(!ku.contains(KeyUsage::CRL_SIGN));
        assert_eq!(
            ku.names(),
            vec!["Digital Signature", "Certificate Sign", "Decipher Only"]
        );
        assert_eq!(KeyUsage::from_bits(&[]), KeyUsage(0));
    }

    #[test]
    fn any_eku_permits_everything() {
        let eku = ExtKeyUsage::ANY;
        assert!(eku.permits(ExtKeyUsage::OCSP_SIGNING));
        let eku = ExtKeyUsage::SERVER_AUTH | ExtKeyUsage::CLIENT_AUTH;
        assert!(eku.permits(ExtKeyUsage::CLIENT_AUTH));
        assert!(!eku.permits(ExtKeyUsage::OCSP_SIGNING));
    }

    #[test]
    fn alt_name_rendering() {
        assert_eq!(AltName::Dns("a.example".into()).to_string(), "DNS:a.example");
        assert_eq!(
            AltName::HardwareModule {
                hw_type: "1.2.3".into(),
                serial: "0a0b".into()
            }
            .to_string(),
            "HardwareModuleName:1.2.3/0a0b"
        );
    }
}

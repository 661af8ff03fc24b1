//! Ed25519 certificate and CRL builder shared by the integration tests.
//!
//! Everything is generated from fixed seeds so the bytes are stable from
//! run to run.
#![allow(dead_code)]

use ed25519_dalek::{Signer as _, SigningKey};
use sha1::{Digest, Sha1};
use trustcheck_lib::der::{tag, Writer};
use trustcheck_lib::oid::{ExtensionId, NameAttribute, PublicKeyAlgorithm, SignatureAlgorithm};
use trustcheck_lib::time::encode_utc_time;
use trustcheck_lib::{
    decode_certificate, decode_crl, DecodeOptions, DecodedCertificate, DecodedCrl, KeyUsage,
    MemoryTrustStore, VerifyOptions,
};

/// 2025-06-04T01:20:00Z.
pub const NOW: i64 = 1_749_000_000;
pub const DAY: i64 = 86_400;

pub const KU_DIGITAL_SIGNATURE: u8 = 0x80;
pub const KU_CERT_SIGN: u8 = 0x04;
pub const KU_CRL_SIGN: u8 = 0x02;

pub struct TestKey {
    signing: SigningKey,
}

impl TestKey {
    pub fn new(seed: u8) -> Self {
        TestKey {
            signing: SigningKey::from_bytes(&[seed; 32]),
        }
    }

    pub fn public(&self) -> [u8; 32] {
        self.signing.verifying_key().to_bytes()
    }

    pub fn key_id(&self) -> Vec<u8> {
        Sha1::digest(self.public()).to_vec()
    }

    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing.sign(message).to_bytes().to_vec()
    }
}

#[derive(Debug, Clone)]
pub struct CertBuilder {
    /// X.509 version as displayed (1, 2 or 3).
    version: u8,
    serial: Vec<u8>,
    subject: String,
    issuer: String,
    not_before: i64,
    not_after: i64,
    /// BasicConstraints cA=TRUE with this path length.
    ca: Option<Option<u8>>,
    key_usage: Option<u8>,
    dns_names: Vec<String>,
    permitted_dns: Vec<String>,
    excluded_dns: Vec<String>,
    extra: Vec<(Vec<u8>, bool, Vec<u8>)>,
}

impl CertBuilder {
    /// End-entity certificate valid for 30 days either side of [`NOW`].
    pub fn leaf(subject: &str, issuer: &str) -> Self {
        CertBuilder {
            version: 3,
            serial: vec![0x01],
            subject: subject.to_string(),
            issuer: issuer.to_string(),
            not_before: NOW - 30 * DAY,
            not_after: NOW + 30 * DAY,
            ca: None,
            key_usage: Some(KU_DIGITAL_SIGNATURE),
            dns_names: Vec::new(),
            permitted_dns: Vec::new(),
            excluded_dns: Vec::new(),
            extra: Vec::new(),
        }
    }

    /// CA certificate with certificate and CRL signing key usage.
    pub fn ca(subject: &str, issuer: &str, path_len: Option<u8>) -> Self {
        CertBuilder {
            serial: vec![0x10],
            not_before: NOW - 365 * DAY,
            not_after: NOW + 365 * DAY,
            ca: Some(path_len),
            key_usage: Some(KU_CERT_SIGN | KU_CRL_SIGN),
            ..Self::leaf(subject, issuer)
        }
    }

    pub fn version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    pub fn serial(mut self, serial: &[u8]) -> Self {
        self.serial = serial.to_vec();
        self
    }

    pub fn validity(mut self, not_before: i64, not_after: i64) -> Self {
        self.not_before = not_before;
        self.not_after = not_after;
        self
    }

    pub fn key_usage(mut self, bits: Option<u8>) -> Self {
        self.key_usage = bits;
        self
    }

    pub fn dns(mut self, name: &str) -> Self {
        self.dns_names.push(name.to_string());
        self
    }

    pub fn permit_dns(mut self, base: &str) -> Self {
        self.permitted_dns.push(base.to_string());
        self
    }

    pub fn exclude_dns(mut self, base: &str) -> Self {
        self.excluded_dns.push(base.to_string());
        self
    }

    /// Append an arbitrary extension, `oid` given as content bytes.
    pub fn extension(mut self, oid: &[u8], critical: bool, value: &[u8]) -> Self {
        self.extra.push((oid.to_vec(), critical, value.to_vec()));
        self
    }

    /// DER certificate for `subject_key`, signed by `issuer_key`.
    pub fn build(&self, subject_key: &TestKey, issuer_key: &TestKey) -> Vec<u8> {
        let extensions = self.extensions(subject_key, issuer_key);
        let mut tbs = Writer::new();
        tbs.sequence(|w| {
            if self.version != 1 {
                w.explicit(0, |w| {
                    w.small_integer(u64::from(self.version) - 1);
                });
            }
            w.integer(&self.serial);
            ed25519_algorithm(w);
            write_name(w, &self.issuer);
            w.sequence(|w| {
                w.utc_time(&utc(self.not_before))
                    .utc_time(&utc(self.not_after));
            });
            write_name(w, &self.subject);
            w.sequence(|w| {
                w.sequence(|w| {
                    w.oid(PublicKeyAlgorithm::Ed25519.der());
                });
                w.bit_string(&subject_key.public());
            });
            if !extensions.is_empty() {
                w.explicit(3, |w| {
                    w.sequence(|w| {
                        for (oid, critical, value) in &extensions {
                            write_extension(w, oid, *critical, value);
                        }
                    });
                });
            }
        });
        signed(tbs.as_bytes(), issuer_key)
    }

    /// [`build`](Self::build) followed by decoding.
    pub fn decode(&self, subject_key: &TestKey, issuer_key: &TestKey) -> DecodedCertificate {
        decode_certificate(&self.build(subject_key, issuer_key), &DecodeOptions::default())
            .unwrap()
    }

    fn extensions(&self, subject_key: &TestKey, issuer_key: &TestKey) -> Vec<(Vec<u8>, bool, Vec<u8>)> {
        let mut out = Vec::new();
        if let Some(path_len) = self.ca {
            let mut w = Writer::new();
            w.sequence(|w| {
                w.boolean(true);
                if let Some(n) = path_len {
                    w.small_integer(u64::from(n));
                }
            });
            out.push((ExtensionId::BasicConstraints.der().to_vec(), true, w.into_bytes()));
        }
        if let Some(bits) = self.key_usage {
            let mut w = Writer::new();
            w.bit_string(&[bits]);
            out.push((ExtensionId::KeyUsage.der().to_vec(), true, w.into_bytes()));
        }

        let mut w = Writer::new();
        w.octet_string(&subject_key.key_id());
        out.push((ExtensionId::SubjectKeyId.der().to_vec(), false, w.into_bytes()));

        let mut w = Writer::new();
        w.sequence(|w| {
            w.element(tag::context(0), &issuer_key.key_id());
        });
        out.push((ExtensionId::AuthorityKeyId.der().to_vec(), false, w.into_bytes()));

        if !self.dns_names.is_empty() {
            let mut w = Writer::new();
            w.sequence(|w| {
                for name in &self.dns_names {
                    w.element(tag::context(2), name.as_bytes());
                }
            });
            out.push((ExtensionId::SubjectAltName.der().to_vec(), false, w.into_bytes()));
        }

        if !self.permitted_dns.is_empty() || !self.excluded_dns.is_empty() {
            let mut w = Writer::new();
            w.sequence(|w| {
                for (n, bases) in [(0u8, &self.permitted_dns), (1u8, &self.excluded_dns)] {
                    if bases.is_empty() {
                        continue;
                    }
                    w.explicit(n, |w| {
                        for base in bases {
                            w.sequence(|w| {
                                w.element(tag::context(2), base.as_bytes());
                            });
                        }
                    });
                }
            });
            out.push((ExtensionId::NameConstraints.der().to_vec(), true, w.into_bytes()));
        }

        out.extend(self.extra.iter().cloned());
        out
    }
}

#[derive(Debug, Clone)]
pub struct CrlBuilder {
    issuer: String,
    this_update: i64,
    next_update: Option<i64>,
    /// (serial, revocation date, reason code)
    revoked: Vec<(Vec<u8>, i64, Option<u8>)>,
    number: u64,
}

impl CrlBuilder {
    /// CRL published a day before [`NOW`], due a week later.
    pub fn new(issuer: &str) -> Self {
        CrlBuilder {
            issuer: issuer.to_string(),
            this_update: NOW - DAY,
            next_update: Some(NOW + 6 * DAY),
            revoked: Vec::new(),
            number: 1,
        }
    }

    pub fn revoke(mut self, serial: &[u8], reason: Option<u8>) -> Self {
        self.revoked.push((serial.to_vec(), NOW - 2 * DAY, reason));
        self
    }

    pub fn window(mut self, this_update: i64, next_update: Option<i64>) -> Self {
        self.this_update = this_update;
        self.next_update = next_update;
        self
    }

    pub fn build(&self, issuer_key: &TestKey) -> Vec<u8> {
        let mut tbs = Writer::new();
        tbs.sequence(|w| {
            w.small_integer(1);
            ed25519_algorithm(w);
            write_name(w, &self.issuer);
            w.utc_time(&utc(self.this_update));
            if let Some(next) = self.next_update {
                w.utc_time(&utc(next));
            }
            if !self.revoked.is_empty() {
                w.sequence(|w| {
                    for (serial, date, reason) in &self.revoked {
                        w.sequence(|w| {
                            w.integer(serial).utc_time(&utc(*date));
                            if let Some(code) = reason {
                                w.sequence(|w| {
                                    let mut value = Writer::new();
                                    value.element(tag::ENUMERATED, &[*code]);
                                    write_extension(
                                        w,
                                        ExtensionId::CrlReason.der(),
                                        false,
                                        value.as_bytes(),
                                    );
                                });
                            }
                        });
                    }
                });
            }
            w.explicit(0, |w| {
                w.sequence(|w| {
                    let mut akid = Writer::new();
                    akid.sequence(|w| {
                        w.element(tag::context(0), &issuer_key.key_id());
                    });
                    write_extension(w, ExtensionId::AuthorityKeyId.der(), false, akid.as_bytes());
                    let mut number = Writer::new();
                    number.small_integer(self.number);
                    write_extension(w, ExtensionId::CrlNumber.der(), false, number.as_bytes());
                });
            });
        });
        signed(tbs.as_bytes(), issuer_key)
    }

    pub fn decode(&self, issuer_key: &TestKey) -> DecodedCrl {
        decode_crl(&self.build(issuer_key)).unwrap()
    }
}

/// Options pinned to [`NOW`].
pub fn at_now() -> VerifyOptions {
    VerifyOptions {
        at_time: Some(NOW),
        ..VerifyOptions::default()
    }
}

pub fn store_of(certs: &[&DecodedCertificate]) -> MemoryTrustStore {
    let mut store = MemoryTrustStore::new();
    for cert in certs {
        store.add_certificate(cert);
    }
    store
}

/// Key usage bits as the decoder reports them.
pub fn key_usage(bits: u8) -> KeyUsage {
    KeyUsage::from_bits(&[bits])
}

fn utc(timestamp: i64) -> String {
    encode_utc_time(timestamp).unwrap()
}

fn ed25519_algorithm(w: &mut Writer) {
    w.sequence(|w| {
        w.oid(SignatureAlgorithm::Ed25519.der());
    });
}

fn write_name(w: &mut Writer, common_name: &str) {
    w.sequence(|w| {
        w.set(|w| {
            w.sequence(|w| {
                w.oid(NameAttribute::CommonName.der())
                    .utf8_string(common_name);
            });
        });
    });
}

fn write_extension(w: &mut Writer, oid: &[u8], critical: bool, value: &[u8]) {
    w.sequence(|w| {
        w.oid(oid);
        if critical {
            w.boolean(true);
        }
        w.octet_string(value);
    });
}

fn signed(tbs: &[u8], key: &TestKey) -> Vec<u8> {
    let mut w = Writer::new();
    w.sequence(|w| {
        w.raw(tbs);
        ed25519_algorithm(w);
        w.bit_string(&key.sign(tbs));
    });
    w.into_bytes()
}

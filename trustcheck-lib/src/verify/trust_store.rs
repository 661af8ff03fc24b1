//! Trust anchors and the stores they are looked up in.
//!
//! Verification only ever reads a store through the [`TrustStore`] trait,
//! by subject key identifier or by subject name hash. [`MemoryTrustStore`]
//! is the bundled implementation, loadable from DER, PEM bundles, PEM
//! directories and the system CA bundle (discovered the way OpenSSL does).

use crate::ext::DecodeOptions;
use crate::fields::{ExtKeyUsage, KeyUsage, NameConstraints};
use crate::parser::{decode_certificate, DecodedCertificate};
use crate::pubkey::PublicKey;
use crate::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Well-known CA bundle file paths, in order of preference.
pub(crate) const KNOWN_CA_BUNDLE_PATHS: &[&str] = &[
    "/etc/ssl/certs/ca-certificates.crt", // Debian/Ubuntu
    "/etc/pki/tls/certs/ca-bundle.crt",   // RHEL/CentOS/Fedora
    "/etc/ssl/ca-bundle.pem",             // openSUSE
    "/etc/ssl/cert.pem",                  // macOS, Alpine
];

/// Well-known CA certificate directory paths.
pub(crate) const KNOWN_CA_DIR_PATHS: &[&str] = &["/etc/ssl/certs"];

/// Matches `.pem`, `.crt`, `.cer` and OpenSSL hash links (`XXXXXXXX.N`).
fn is_pem_cert_file(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    matches!(ext, "pem" | "crt" | "cer")
        || (ext.len() == 1 && ext.bytes().next().is_some_and(|b| b.is_ascii_digit()))
}

/// A trusted signer: the parts of a CA certificate verification needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signer {
    pub public_key: PublicKey,
    /// SHA-1 of the subject `Name` encoding.
    pub subject_hash: [u8; 20],
    /// Subject in display form.
    pub subject: String,
    /// SHA-1 of the issuer `Name` encoding.
    pub issuer_hash: [u8; 20],
    /// Subject key identifier (SHA-1 sized).
    pub key_id: Vec<u8>,
    pub is_ca: bool,
    pub path_len: Option<u8>,
    pub key_usage: Option<KeyUsage>,
    pub ext_key_usage: Option<ExtKeyUsage>,
    pub name_constraints: Option<NameConstraints>,
}

impl Signer {
    /// Derive a signer from a decoded certificate. Without a subject key
    /// identifier, the SHA-1 of the public key bits stands in.
    pub fn from_certificate(cert: &DecodedCertificate) -> Self {
        let key_id = match cert.subject_key_id() {
            Some(id) => id.to_vec(),
            None => cert.public_key().key_hash().to_vec(),
        };
        Signer {
            public_key: cert.public_key().clone(),
            subject_hash: *cert.subject().hash(),
            subject: cert.subject().display().to_string(),
            issuer_hash: *cert.issuer().hash(),
            key_id,
            is_ca: cert.is_ca(),
            path_len: cert.path_len(),
            key_usage: cert.key_usage(),
            ext_key_usage: cert.ext_key_usage(),
            name_constraints: cert.name_constraints().cloned(),
        }
    }
}

/// Read-only signer lookup.
pub trait TrustStore {
    fn find_by_key_id(&self, key_id: &[u8]) -> Option<&Signer>;
    fn find_by_name_hash(&self, name_hash: &[u8]) -> Option<&Signer>;
}

impl<T: TrustStore + ?Sized> TrustStore for &T {
    fn find_by_key_id(&self, key_id: &[u8]) -> Option<&Signer> {
        (**self).find_by_key_id(key_id)
    }

    fn find_by_name_hash(&self, name_hash: &[u8]) -> Option<&Signer> {
        (**self).find_by_name_hash(name_hash)
    }
}

/// In-memory signer table keyed by key id and by name hash.
#[derive(Default)]
pub struct MemoryTrustStore {
    signers: Vec<Signer>,
    by_key_id: HashMap<Vec<u8>, usize>,
    by_name_hash: HashMap<[u8; 20], Vec<usize>>,
}

impl std::fmt::Debug for MemoryTrustStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTrustStore")
            .field("count", &self.signers.len())
            .finish()
    }
}

impl MemoryTrustStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the system trust store.
    ///
    /// Searches the same places OpenSSL does:
    /// 1. `SSL_CERT_FILE`, the `openssl-probe` file, then [`KNOWN_CA_BUNDLE_PATHS`]
    /// 2. `SSL_CERT_DIR`, the `openssl-probe` directory, then [`KNOWN_CA_DIR_PATHS`]
    pub fn system() -> Result<Self> {
        let mut store = MemoryTrustStore::new();

        if let Some(bundle_path) = find_system_ca_bundle() {
            if let Ok(data) = std::fs::read(&bundle_path) {
                let added = store.add_pem_bundle(&data)?;
                if added > 0 {
                    debug!(path = %bundle_path.display(), added, "loaded system CA bundle");
                    return Ok(store);
                }
            }
        }

        let probe = openssl_probe::probe();
        let dir_candidates = std::env::var("SSL_CERT_DIR")
            .ok()
            .into_iter()
            .chain(
                probe
                    .cert_dir
                    .iter()
                    .map(|p| p.to_string_lossy().into_owned()),
            )
            .chain(KNOWN_CA_DIR_PATHS.iter().map(|s| (*s).to_string()));

        for dir in dir_candidates {
            if let Ok(added) = store.add_pem_directory(Path::new(&dir)) {
                if added > 0 {
                    debug!(dir = %dir, added, "loaded system CA directory");
                    return Ok(store);
                }
            }
        }

        Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no system trust store found",
        )))
    }

    /// Build a store from a PEM bundle.
    pub fn from_pem(pem_data: &[u8]) -> Result<Self> {
        let mut store = MemoryTrustStore::new();
        store.add_pem_bundle(pem_data)?;
        Ok(store)
    }

    /// Insert a signer. A later signer with the same key id replaces the
    /// key-id mapping; name-hash lookups return the earliest.
    pub fn add(&mut self, signer: Signer) {
        let idx = self.signers.len();
        self.by_key_id.insert(signer.key_id.clone(), idx);
        self.by_name_hash
            .entry(signer.subject_hash)
            .or_default()
            .push(idx);
        self.signers.push(signer);
    }

    pub fn add_certificate(&mut self, cert: &DecodedCertificate) {
        self.add(Signer::from_certificate(cert));
    }

    /// Decode and add a DER certificate.
    pub fn add_der(&mut self, der: &[u8]) -> Result<()> {
        let cert = decode_certificate(der, &DecodeOptions::default())?;
        self.add_certificate(&cert);
        Ok(())
    }

    /// Add every certificate in a PEM bundle, skipping entries that fail
    /// to decode. Returns the number added.
    pub fn add_pem_bundle(&mut self, pem_data: &[u8]) -> Result<usize> {
        let mut added = 0;
        for der in crate::util::parse_pem_chain(pem_data)? {
            match self.add_der(&der) {
                Ok(()) => added += 1,
                Err(e) => debug!(error = %e, "skipping undecodable trust store entry"),
            }
        }
        Ok(added)
    }

    /// Load every PEM file in a directory (like OpenSSL's `-CApath`).
    pub fn add_pem_directory(&mut self, dir: &Path) -> Result<usize> {
        let mut total = 0;
        let entries = std::fs::read_dir(dir).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", dir.display(), e),
            ))
        })?;
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && is_pem_cert_file(&path) {
                if let Ok(data) = std::fs::read(&path) {
                    if let Ok(added) = self.add_pem_bundle(&data) {
                        total += added;
                    }
                }
            }
        }
        Ok(total)
    }

    pub fn len(&self) -> usize {
        self.signers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Signer> {
        self.signers.iter()
    }
}

impl TrustStore for MemoryTrustStore {
    fn find_by_key_id(&self, key_id: &[u8]) -> Option<&Signer> {
        self.by_key_id
            .get(key_id)
            .and_then(|idx| self.signers.get(*idx))
    }

    fn find_by_name_hash(&self, name_hash: &[u8]) -> Option<&Signer> {
        let hash: &[u8; 20] = name_hash.try_into().ok()?;
        self.by_name_hash
            .get(hash)
            .and_then(|ids| ids.first())
            .and_then(|idx| self.signers.get(*idx))
    }
}

/// A base store plus signers promoted during bundle verification.
pub(crate) struct OverlayStore<'a> {
    base: &'a dyn TrustStore,
    extra: MemoryTrustStore,
}

impl<'a> OverlayStore<'a> {
    pub(crate) fn new(base: &'a dyn TrustStore) -> Self {
        OverlayStore {
            base,
            extra: MemoryTrustStore::new(),
        }
    }

    pub(crate) fn promote(&mut self, cert: &DecodedCertificate) {
        self.extra.add_certificate(cert);
    }
}

impl TrustStore for OverlayStore<'_> {
    fn find_by_key_id(&self, key_id: &[u8]) -> Option<&Signer> {
        self.base
            .find_by_key_id(key_id)
            .or_else(|| self.extra.find_by_key_id(key_id))
    }

    fn find_by_name_hash(&self, name_hash: &[u8]) -> Option<&Signer> {
        self.base
            .find_by_name_hash(name_hash)
            .or_else(|| self.extra.find_by_name_hash(name_hash))
    }
}

/// Find the system CA bundle path (same location OpenSSL uses).
///
/// Checks `SSL_CERT_FILE`, then the `openssl-probe` result, then
/// [`KNOWN_CA_BUNDLE_PATHS`].
pub fn find_system_ca_bundle() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("SSL_CERT_FILE") {
        let p = PathBuf::from(&path);
        if p.exists() {
            return Some(p);
        }
    }

    let probe = openssl_probe::probe();
    if let Some(file) = probe.cert_file {
        let path = PathBuf::from(&file);
        if path.exists() {
            return Some(path);
        }
    }

    KNOWN_CA_BUNDLE_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ROOT: &[u8] = include_bytes!("../../tests/data/rsa_root.der");
    const INTERMEDIATE: &[u8] = include_bytes!("../../tests/data/ec_intermediate.der");

    #[test]
    fn pem_cert_file_names() {
        assert!(is_pem_cert_file(Path::new("/x/ca.pem")));
        assert!(is_pem_cert_file(Path::new("/x/ca.crt")));
        assert!(is_pem_cert_file(Path::new("/x/a1b2c3d4.0")));
        assert!(!is_pem_cert_file(Path::new("/x/a1b2c3d4.10")));
        assert!(!is_pem_cert_file(Path::new("/x/README")));
    }

    #[test]
    fn lookup_by_key_id_and_name_hash() {
        let mut store = MemoryTrustStore::new();
        store.add_der(ROOT).unwrap();
        store.add_der(INTERMEDIATE).unwrap();
        assert_eq!(store.len(), 2);

        let inter = decode_certificate(INTERMEDIATE, &DecodeOptions::default()).unwrap();
        let by_id = store
            .find_by_key_id(inter.subject_key_id().unwrap())
            .unwrap();
        assert_eq!(by_id.path_len, Some(0));
        let by_name = store.find_by_name_hash(inter.subject().hash()).unwrap();
        assert_eq!(by_id, by_name);
        assert!(store.find_by_name_hash(&[0u8; 20]).is_none());
        assert!(store.find_by_name_hash(&[0u8; 3]).is_none());
    }

    #[test]
    fn overlay_prefers_base() {
        let mut base = MemoryTrustStore::new();
        base.add_der(ROOT).unwrap();
        let inter = decode_certificate(INTERMEDIATE, &DecodeOptions::default()).unwrap();
        let mut overlay = OverlayStore::new(&base);
        assert!(overlay.find_by_name_hash(inter.subject().hash()).is_none());
        overlay.promote(&inter);
        assert!(overlay.find_by_name_hash(inter.subject().hash()).is_some());
    }
}

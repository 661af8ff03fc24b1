//! trustcheck: Command-line tool for inspecting and validating X.509 trust objects.

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use rayon::prelude::*;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use trustcheck_lib::{
    decode_certificate, decode_crl, decode_ocsp_response, AltName, DecodeOptions,
    DecodedCertificate, DecodedCrl, DigestAlgorithm, MemoryTrustStore, OcspRequest,
    VerificationResult, VerifyOptions,
};

#[derive(Parser)]
#[command(
    name = "trustcheck",
    version,
    about = "Decode and validate X.509 certificates, CRLs and OCSP responses",
    long_about = "trustcheck decodes X.509 certificates, CRLs and OCSP responses in PEM\n\
                  or DER form and verifies their signatures and chain policy against a\n\
                  trust store.\n\n\
                  Input format (PEM vs DER) is auto-detected unless --pem or --der\n\
                  is specified. Certificate commands read from stdin when no file is given.\n\
                  Set RUST_LOG or pass -v for diagnostics on stderr.",
    after_help = "EXAMPLES:\n\
                  \n  trustcheck show cert.pem\
                  \n  trustcheck show --json cert.pem\
                  \n  trustcheck field fingerprint --digest sha384 cert.pem\
                  \n  trustcheck check expiry 30d cert.pem\
                  \n  trustcheck verify --CAfile root.pem chain.pem\
                  \n  trustcheck crl --CAfile ca.pem ca.crl\
                  \n  trustcheck ocsp-request --cert leaf.pem --issuer ca.pem -o req.der\
                  \n  trustcheck ocsp-response --CAfile ca.pem resp.der"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

/// Where trusted signers come from.
#[derive(Args, Clone, Debug, Default)]
struct TrustArgs {
    /// PEM file containing trusted CA certificates
    #[arg(long = "CAfile", visible_alias = "ca-file", value_name = "FILE")]
    ca_file: Option<PathBuf>,
    /// Directory of trusted CA certificates in PEM format
    #[arg(long = "CApath", visible_alias = "ca-path", value_name = "DIR")]
    ca_path: Option<PathBuf>,
}

impl TrustArgs {
    fn is_set(&self) -> bool {
        self.ca_file.is_some() || self.ca_path.is_some()
    }
}

/// Date checking knobs shared by every verifying command.
#[derive(Args, Clone, Debug, Default)]
struct TimeArgs {
    /// Skip validity date checks
    #[arg(long)]
    no_check_time: bool,
    /// Verify at a specific Unix timestamp instead of current time
    #[arg(long, value_name = "EPOCH")]
    attime: Option<i64>,
    /// Clock skew tolerated on both validity bounds, in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = 0)]
    skew: i64,
}

impl TimeArgs {
    fn options(&self) -> VerifyOptions {
        VerifyOptions {
            check_time: !self.no_check_time,
            at_time: self.attime,
            skew_before: self.skew,
            skew_after: self.skew,
            ..VerifyOptions::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Display certificate information (like openssl x509 -text)
    #[command(after_help = "EXAMPLES:\n\
                      \n  trustcheck show cert.pem\
                      \n  trustcheck show --json cert.pem\
                      \n  trustcheck show --all cert.der\
                      \n  cat cert.pem | trustcheck show")]
    Show {
        /// Certificate file (PEM or DER). Reads from stdin if omitted.
        file: Option<PathBuf>,
        /// Force DER input parsing (default: auto-detect)
        #[arg(long)]
        der: bool,
        /// Force PEM input parsing (default: auto-detect)
        #[arg(long)]
        pem: bool,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Show all fields including signature bytes
        #[arg(long)]
        all: bool,
    },
    /// Extract a single field from the certificate
    #[command(after_help = "FIELDS:\n\
                      \n  subject        Subject distinguished name\
                      \n  issuer         Issuer distinguished name\
                      \n  serial         Serial number (colon-separated hex)\
                      \n  not-before     Not Before date (ISO 8601)\
                      \n  not-after      Not After date (ISO 8601)\
                      \n  fingerprint    Certificate fingerprint (default: SHA-256)\
                      \n  key-algorithm  Subject public key algorithm and size\
                      \n  modulus        RSA modulus in hex (RSA certificates only)\
                      \n  exponent       RSA public exponent (RSA certificates only)\
                      \n  emails         Email addresses from subject and SAN\
                      \n  san            Subject Alternative Names\
                      \n  ocsp-url       OCSP responder URL from the AIA extension\
                      \n  crl-url        CRL distribution point URL\
                      \n  policies       Certificate policy OIDs\
                      \n  key-usage      Key Usage extension values\
                      \n  ext-key-usage  Extended Key Usage extension values\
                      \n  extensions     All extensions (use --ext to filter)\
                      \n\nEXAMPLES:\n\
                      \n  trustcheck field subject cert.pem\
                      \n  trustcheck field fingerprint --digest sha384 cert.pem\
                      \n  trustcheck field san --json cert.pem\
                      \n  trustcheck field extensions --ext subjectAltName cert.pem")]
    Field {
        /// Field to extract
        field: FieldName,
        /// Certificate file. Reads from stdin if omitted.
        file: Option<PathBuf>,
        /// Force DER input parsing (default: auto-detect)
        #[arg(long)]
        der: bool,
        /// Force PEM input parsing (default: auto-detect)
        #[arg(long)]
        pem: bool,
        /// Hash algorithm for fingerprint: sha256, sha384, sha512, sha1
        #[arg(long, default_value = "sha256")]
        digest: String,
        /// Filter extensions by name or OID (e.g., "subjectAltName", "2.5.29.17")
        #[arg(long)]
        ext: Option<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Check certificate properties (exit code 0 = pass, 1 = fail)
    #[command(after_help = "CHECKS:\n\
                      \n  expiry <DURATION>  Pass if cert is valid for at least DURATION more\
                      \n  host <HOSTNAME>    Pass if hostname matches SAN/CN (RFC 6125 wildcards)\
                      \n  email <EMAIL>      Pass if email matches SAN or subject emailAddress\
                      \n\nDURATION FORMAT:\n\
                      \n  Plain numbers are treated as seconds. You can also use humantime\
                      \n  notation: s, m/min, h/hr, d/day, w/week, month, y/year.\
                      \n  Combine units: 1h30m, 2d12h, 1w3d.\
                      \n\nEXAMPLES:\n\
                      \n  trustcheck check expiry 30d cert.pem\
                      \n  trustcheck check expiry 2h30m certs/ --failures-only\
                      \n  trustcheck check host www.example.com cert.pem\
                      \n  trustcheck check email user@example.com cert.pem")]
    Check {
        /// Check to perform: expiry, host, email
        check: CheckType,
        /// Value to check (duration for expiry, hostname/email for others)
        value: String,
        /// Certificate file or directory. Reads from stdin if omitted.
        file: Option<PathBuf>,
        /// Force DER input parsing (default: auto-detect)
        #[arg(long)]
        der: bool,
        /// Force PEM input parsing (default: auto-detect)
        #[arg(long)]
        pem: bool,
        /// Only print failures (directory mode)
        #[arg(long)]
        failures_only: bool,
        /// Recurse into subdirectories (directory mode)
        #[arg(short, long)]
        recurse: bool,
    },
    /// Verify a certificate bundle against a trust store (exit 0 = valid, 2 = fail)
    #[command(
        after_help = "FILE is a PEM bundle with the leaf certificate first, followed by\n\
                      intermediates, or a single DER certificate. Uses the system trust\n\
                      store unless --CAfile or --CApath is given.\n\
                      \nEXAMPLES:\n\
                      \n  trustcheck verify chain.pem\
                      \n  trustcheck verify --CAfile root.pem chain.pem\
                      \n  trustcheck verify --CRLfile ca.crl --crl-check chain.pem\
                      \n  trustcheck verify --attime 1700000000 --json chain.pem\
                      \n  trustcheck verify --recurse --failures-only certs/"
    )]
    Verify {
        /// PEM bundle, DER certificate or directory. Reads from stdin if omitted.
        file: Option<PathBuf>,
        #[command(flatten)]
        trust: TrustArgs,
        #[command(flatten)]
        time: TimeArgs,
        /// Maximum number of intermediates
        #[arg(long, value_name = "N")]
        verify_depth: Option<usize>,
        /// Display subject and issuer for each certificate in the bundle
        #[arg(long)]
        show_chain: bool,
        /// CRL file (PEM or DER) for revocation checking; may be repeated
        #[arg(long = "CRLfile", visible_alias = "crl-file", value_name = "FILE")]
        crl_file: Vec<PathBuf>,
        /// Check CRL revocation for the leaf certificate
        #[arg(long)]
        crl_check: bool,
        /// Check CRL revocation for all certificates in the bundle
        #[arg(long)]
        crl_check_all: bool,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Only print failures (directory mode)
        #[arg(long)]
        failures_only: bool,
        /// Recurse into subdirectories (directory mode)
        #[arg(short, long)]
        recurse: bool,
    },
    /// Display a CRL and optionally verify it (exit 0 = valid, 2 = fail)
    #[command(after_help = "The CRL is verified when --CAfile or --CApath is given.\n\
                      \nEXAMPLES:\n\
                      \n  trustcheck crl ca.crl\
                      \n  trustcheck crl --json ca.crl\
                      \n  trustcheck crl --CAfile ca.pem --require-next-update ca.crl")]
    Crl {
        /// CRL file (PEM or DER)
        file: PathBuf,
        #[command(flatten)]
        trust: TrustArgs,
        #[command(flatten)]
        time: TimeArgs,
        /// Reject a CRL without a nextUpdate
        #[arg(long)]
        require_next_update: bool,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Build a DER OCSP request for a certificate
    #[command(after_help = "The request is written to OUTPUT, or to stdout when omitted.\n\
                      The generated nonce is printed on stderr as hex.\n\
                      \nEXAMPLES:\n\
                      \n  trustcheck ocsp-request --cert leaf.pem --issuer ca.pem -o req.der\
                      \n  trustcheck ocsp-request --cert leaf.pem --issuer ca.pem --no-nonce > req.der")]
    OcspRequest {
        /// Certificate whose status is requested
        #[arg(long, value_name = "FILE")]
        cert: PathBuf,
        /// Issuer of the certificate
        #[arg(long, value_name = "FILE")]
        issuer: PathBuf,
        /// Omit the nonce extension
        #[arg(long)]
        no_nonce: bool,
        /// Output file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Display an OCSP response, verify it and match it to a request
    #[command(after_help = "The response is verified when --CAfile or --CApath is given, and\n\
                      matched against the request for --cert/--issuer (plus --nonce)\n\
                      when those are given. Exit 0 = valid, 2 = fail.\n\
                      \nEXAMPLES:\n\
                      \n  trustcheck ocsp-response resp.der\
                      \n  trustcheck ocsp-response --CAfile ca.pem resp.der\
                      \n  trustcheck ocsp-response --CAfile ca.pem --cert leaf.pem --issuer ca.pem \\\
                      \n      --nonce 0a1b2c3d resp.der")]
    OcspResponse {
        /// DER OCSP response
        file: PathBuf,
        #[command(flatten)]
        trust: TrustArgs,
        #[command(flatten)]
        time: TimeArgs,
        /// Certificate the request was made for
        #[arg(long, value_name = "FILE", requires = "issuer")]
        cert: Option<PathBuf>,
        /// Issuer of --cert
        #[arg(long, value_name = "FILE", requires = "cert")]
        issuer: Option<PathBuf>,
        /// Nonce sent in the request, as hex
        #[arg(long, value_name = "HEX", requires = "cert")]
        nonce: Option<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Debug, clap::ValueEnum)]
enum FieldName {
    Subject,
    Issuer,
    Serial,
    NotBefore,
    NotAfter,
    Fingerprint,
    KeyAlgorithm,
    Modulus,
    Exponent,
    Emails,
    San,
    OcspUrl,
    CrlUrl,
    Policies,
    KeyUsage,
    ExtKeyUsage,
    Extensions,
}

#[derive(Clone, Debug, clap::ValueEnum)]
enum CheckType {
    Expiry,
    Host,
    Email,
}

/// Maximum file size for inputs (10 MiB).
const MAX_INPUT_BYTES: u64 = 10 * 1024 * 1024;

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_input(file: Option<&PathBuf>) -> Result<Vec<u8>> {
    match file {
        Some(path) => read_file(path),
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .take(MAX_INPUT_BYTES)
                .read_to_end(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat file: {}", path.display()))?;
    if meta.len() > MAX_INPUT_BYTES {
        anyhow::bail!(
            "File too large ({} bytes, max {} bytes): {}",
            meta.len(),
            MAX_INPUT_BYTES,
            path.display()
        );
    }
    std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Decode the first certificate of a PEM or DER input.
fn decode_input(input: &[u8], der: bool, pem: bool) -> Result<DecodedCertificate> {
    let as_pem = pem || (!der && trustcheck_lib::is_pem(input));
    let cert = if as_pem {
        let blobs = trustcheck_lib::parse_pem_chain(input)?;
        let first = blobs.first().context("No certificate in PEM input")?;
        decode_certificate(first, &DecodeOptions::default())?
    } else {
        decode_certificate(input, &DecodeOptions::default())?
    };
    Ok(cert)
}

/// Decode every certificate of a PEM bundle, or a single DER certificate.
fn decode_bundle(input: &[u8]) -> Result<Vec<DecodedCertificate>> {
    if trustcheck_lib::is_pem(input) {
        trustcheck_lib::parse_pem_chain(input)?
            .iter()
            .map(|der| Ok(decode_certificate(der, &DecodeOptions::default())?))
            .collect()
    } else {
        Ok(vec![decode_certificate(input, &DecodeOptions::default())?])
    }
}

fn read_certificate(path: &Path) -> Result<DecodedCertificate> {
    let data = read_file(path)?;
    decode_input(&data, false, false)
        .with_context(|| format!("Failed to decode certificate: {}", path.display()))
}

/// Decode every CRL in a PEM or DER file.
fn read_crls(path: &Path) -> Result<Vec<DecodedCrl>> {
    let data = read_file(path)?;
    let blobs = if trustcheck_lib::is_pem(&data) {
        trustcheck_lib::parse_pem_crl(&data)?
    } else {
        vec![data]
    };
    blobs
        .iter()
        .map(|der| {
            decode_crl(der).with_context(|| format!("Failed to decode CRL: {}", path.display()))
        })
        .collect()
}

fn load_trust_store(trust: &TrustArgs) -> Result<MemoryTrustStore> {
    let mut store = match &trust.ca_file {
        Some(path) => {
            let data = read_file(path)?;
            MemoryTrustStore::from_pem(&data)
                .with_context(|| format!("Failed to load CA file: {}", path.display()))?
        }
        None if trust.ca_path.is_some() => MemoryTrustStore::new(),
        None => MemoryTrustStore::system().context("Failed to load the system trust store")?,
    };
    if let Some(dir) = &trust.ca_path {
        let added = store
            .add_pem_directory(dir)
            .with_context(|| format!("Failed to load CA directory: {}", dir.display()))?;
        debug!(dir = %dir.display(), added, "loaded CA directory");
    }
    debug!(signers = store.len(), "trust store ready");
    Ok(store)
}

fn parse_digest(name: &str) -> Result<DigestAlgorithm> {
    Ok(match name.to_ascii_lowercase().as_str() {
        "sha256" => DigestAlgorithm::Sha256,
        "sha384" => DigestAlgorithm::Sha384,
        "sha512" => DigestAlgorithm::Sha512,
        "sha1" => DigestAlgorithm::Sha1,
        _ => anyhow::bail!(
            "Unsupported digest: {}. Use sha256, sha384, sha512, or sha1.",
            name
        ),
    })
}

/// Parse a hex nonce, tolerating colon separators.
fn parse_nonce(s: &str) -> Result<Vec<u8>> {
    let digits: String = s.chars().filter(|c| *c != ':').collect();
    hex::decode(&digits).with_context(|| format!("Invalid nonce: '{s}'"))
}

/// Parse a duration string using humantime format.
///
/// Plain numbers (e.g. "3600") default to seconds. Otherwise, standard
/// humantime units are accepted: `s`, `m`, `h`, `d`, `w`, `months`, `y`, etc.
fn parse_duration(s: &str) -> Result<Duration> {
    if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
        let secs: u64 = s.parse().context("Invalid duration value")?;
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(s).with_context(|| format!("Invalid duration: '{s}'"))
}

/// Check if a path has a certificate file extension.
fn is_cert_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("pem") || ext.eq_ignore_ascii_case("der")
            || ext.eq_ignore_ascii_case("crt") || ext.eq_ignore_ascii_case("cer")
    )
}

/// Find all certificate files (.pem, .der, .crt, .cer) in a directory.
fn find_cert_files(dir: &Path, recurse: bool) -> Vec<PathBuf> {
    let walker = if recurse {
        walkdir::WalkDir::new(dir)
    } else {
        walkdir::WalkDir::new(dir).max_depth(1)
    };
    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_cert_file(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// A single result from batch processing.
struct BatchResult {
    path: String,
    pass: bool,
    detail: String,
}

impl BatchResult {
    fn failed(path: String, detail: impl std::fmt::Display) -> Self {
        BatchResult {
            path,
            pass: false,
            detail: format!("FAIL ({})", detail),
        }
    }
}

/// Process files in parallel, printing `filename: result`.
///
/// Returns the number of failures.
fn run_batch<F>(files: &[PathBuf], failures_only: bool, op: F) -> usize
where
    F: Fn(&Path) -> BatchResult + Sync,
{
    let results: Vec<BatchResult> = files.par_iter().map(|f| op(f)).collect();

    let mut failures = 0;
    for r in &results {
        if !r.pass {
            failures += 1;
        }
        if failures_only && r.pass {
            continue;
        }
        if r.pass {
            println!("{}: {}", r.path, r.detail);
        } else {
            eprintln!("{}: {}", r.path, r.detail);
        }
    }
    failures
}

/// Print a single bundle verification result (JSON, text valid, or text invalid).
fn print_verify_result(
    label: &str,
    result: &VerificationResult,
    json: bool,
    show_chain: bool,
) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else if result.is_valid {
        println!("{}: {}", label, result);
        if show_chain {
            for info in &result.chain {
                println!(
                    "depth {}: subject = {}, issuer = {}",
                    info.depth, info.subject, info.issuer
                );
            }
        }
    } else {
        eprintln!("{}: {}", label, result);
    }
    Ok(())
}

fn run_check(check: &CheckType, cert: &DecodedCertificate, value: &str, secs: u64) -> bool {
    match check {
        CheckType::Expiry => trustcheck_lib::check_expiry(cert, secs),
        CheckType::Host => trustcheck_lib::check_host(cert, value),
        CheckType::Email => trustcheck_lib::check_email(cert, value),
    }
}

fn field_text(
    cert: &DecodedCertificate,
    field: &FieldName,
    digest: &str,
    json: bool,
) -> Result<String> {
    Ok(match field {
        FieldName::Subject => cert.subject().display().to_string(),
        FieldName::Issuer => cert.issuer().display().to_string(),
        FieldName::Serial => cert.serial_hex(),
        FieldName::NotBefore => cert.not_before().iso8601(),
        FieldName::NotAfter => cert.not_after().iso8601(),
        FieldName::Fingerprint => cert.fingerprint(parse_digest(digest)?),
        FieldName::KeyAlgorithm => {
            let key = cert.public_key();
            match (key.key_size(), key.curve()) {
                (_, Some(curve)) => format!("{} {}", key.algorithm(), curve.display_name()),
                (Some(bits), None) => format!("{} {}", key.algorithm(), bits),
                (None, None) => key.algorithm().to_string(),
            }
        }
        FieldName::Modulus => cert
            .public_key()
            .modulus_hex()
            .unwrap_or_else(|| "(not an RSA certificate)".to_string()),
        FieldName::Exponent => cert
            .public_key()
            .exponent()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "(not an RSA certificate)".to_string()),
        FieldName::Emails => {
            let mut emails: Vec<&str> = cert.subject().emails().collect();
            for name in cert.alt_names() {
                if let AltName::Email(email) = name {
                    if !emails.contains(&email.as_str()) {
                        emails.push(email);
                    }
                }
            }
            emails.join("\n")
        }
        FieldName::San => {
            if json {
                serde_json::to_string_pretty(cert.alt_names())?
            } else {
                cert.alt_names()
                    .iter()
                    .map(|n| n.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }
        FieldName::OcspUrl => cert.ocsp_responder().unwrap_or_default().to_string(),
        FieldName::CrlUrl => cert.crl_distribution_point().unwrap_or_default().to_string(),
        FieldName::Policies => cert.policies().join("\n"),
        FieldName::KeyUsage => cert
            .key_usage()
            .map(|u| u.names().join(", "))
            .unwrap_or_default(),
        FieldName::ExtKeyUsage => cert
            .ext_key_usage()
            .map(|u| u.names().join(", "))
            .unwrap_or_default(),
        FieldName::Extensions => {
            let entries = &cert.extensions().entries;
            if json {
                serde_json::to_string_pretty(entries)?
            } else {
                entries
                    .iter()
                    .map(|e| {
                        format!(
                            "{}{}: {}",
                            e.name.unwrap_or(e.oid.as_str()),
                            if e.critical { " [critical]" } else { "" },
                            hex::encode_upper(&e.value)
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Show {
            file,
            der,
            pem,
            json,
            all,
        } => {
            let input = read_input(file.as_ref())?;
            let cert = decode_input(&input, *der, *pem)?;

            if *json {
                println!("{}", trustcheck_lib::to_json(&cert)?);
            } else {
                print!("{}", trustcheck_lib::display_text(&cert, *all));
            }
        }
        Commands::Field {
            field,
            file,
            der,
            pem,
            digest,
            ext,
            json,
        } => {
            let input = read_input(file.as_ref())?;
            let cert = decode_input(&input, *der, *pem)?;

            // --ext selects extensions by name or OID
            if let Some(ext_name) = ext {
                let matching: Vec<_> = cert
                    .extensions()
                    .entries
                    .iter()
                    .filter(|e| {
                        e.name.is_some_and(|n| n.eq_ignore_ascii_case(ext_name))
                            || e.oid == *ext_name
                    })
                    .collect();
                if matching.is_empty() {
                    anyhow::bail!("Extension '{}' not found", ext_name);
                }
                if *json {
                    println!("{}", serde_json::to_string_pretty(&matching)?);
                } else {
                    for e in matching {
                        println!(
                            "{}{}: {}",
                            e.name.unwrap_or(e.oid.as_str()),
                            if e.critical { " [critical]" } else { "" },
                            hex::encode_upper(&e.value)
                        );
                    }
                }
                return Ok(());
            }

            println!("{}", field_text(&cert, field, digest, *json)?);
        }
        Commands::Check {
            check,
            value,
            file,
            der,
            pem,
            failures_only,
            recurse,
        } => {
            let expiry_secs = match check {
                CheckType::Expiry => parse_duration(value)?.as_secs(),
                _ => 0,
            };

            // Directory mode: process all cert files in parallel
            if let Some(path) = file.as_ref().filter(|p| p.is_dir()) {
                let files = find_cert_files(path, *recurse);
                if files.is_empty() {
                    anyhow::bail!(
                        "No certificate files (.pem, .der, .crt, .cer) found in {}",
                        path.display()
                    );
                }
                let failures = run_batch(&files, *failures_only, |f| {
                    let label = f.display().to_string();
                    let data = match std::fs::read(f) {
                        Ok(d) => d,
                        Err(e) => return BatchResult::failed(label, format!("read error: {}", e)),
                    };
                    let cert = match decode_input(&data, *der, *pem) {
                        Ok(c) => c,
                        Err(e) => return BatchResult::failed(label, format!("parse error: {}", e)),
                    };
                    let pass = run_check(check, &cert, value, expiry_secs);
                    BatchResult {
                        path: label,
                        pass,
                        detail: if pass { "PASS" } else { "FAIL" }.to_string(),
                    }
                });
                if failures > 0 {
                    std::process::exit(1);
                }
                return Ok(());
            }

            // Single file mode
            let input = read_input(file.as_ref())?;
            let cert = decode_input(&input, *der, *pem)?;
            if !run_check(check, &cert, value, expiry_secs) {
                std::process::exit(1);
            }
        }
        Commands::Verify {
            file,
            trust,
            time,
            verify_depth,
            show_chain,
            crl_file,
            crl_check,
            crl_check_all,
            json,
            failures_only,
            recurse,
        } => {
            let trust_store = load_trust_store(trust)?;

            if (*crl_check || *crl_check_all) && crl_file.is_empty() {
                anyhow::bail!(
                    "--crl-check and --crl-check-all require --CRLfile to specify a CRL file"
                );
            }
            let mut crls = Vec::new();
            for path in crl_file {
                crls.extend(read_crls(path)?);
            }

            let options = VerifyOptions {
                verify_depth: *verify_depth,
                crls,
                crl_check_leaf: *crl_check || *crl_check_all,
                crl_check_all: *crl_check_all,
                ..time.options()
            };

            // Directory mode: verify all bundles in parallel
            if let Some(path) = file.as_ref().filter(|p| p.is_dir()) {
                let files = find_cert_files(path, *recurse);
                if files.is_empty() {
                    anyhow::bail!(
                        "No certificate files (.pem, .der, .crt, .cer) found in {}",
                        path.display()
                    );
                }
                let failures = run_batch(&files, *failures_only, |f| {
                    let label = f.display().to_string();
                    let data = match std::fs::read(f) {
                        Ok(d) => d,
                        Err(e) => return BatchResult::failed(label, format!("read error: {}", e)),
                    };
                    let certs = match decode_bundle(&data) {
                        Ok(c) => c,
                        Err(e) => return BatchResult::failed(label, format!("parse error: {}", e)),
                    };
                    let result = trustcheck_lib::verify_chain(&certs, &trust_store, &options);
                    BatchResult {
                        path: label,
                        pass: result.is_valid,
                        detail: result.to_string(),
                    }
                });
                if failures > 0 {
                    std::process::exit(2);
                }
                return Ok(());
            }

            // Single bundle mode
            let input = read_input(file.as_ref())?;
            let label = file
                .as_ref()
                .map_or("stdin".to_string(), |f| f.display().to_string());
            let certs = decode_bundle(&input)?;
            let result = trustcheck_lib::verify_chain(&certs, &trust_store, &options);

            print_verify_result(&label, &result, *json, *show_chain)?;
            if !result.is_valid {
                std::process::exit(2);
            }
        }
        Commands::Crl {
            file,
            trust,
            time,
            require_next_update,
            json,
        } => {
            let crls = read_crls(file)?;
            let store = if trust.is_set() {
                Some(load_trust_store(trust)?)
            } else {
                None
            };
            let options = VerifyOptions {
                require_next_update: *require_next_update,
                ..time.options()
            };

            let mut any_invalid = false;
            for crl in &crls {
                if *json {
                    println!("{}", trustcheck_lib::to_json(crl)?);
                } else {
                    print!("{}", trustcheck_lib::crl_text(crl));
                }
                if let Some(store) = &store {
                    match trustcheck_lib::verify_crl(crl, store, &options) {
                        Ok(()) => eprintln!("{}: verify OK", file.display()),
                        Err(e) => {
                            eprintln!("{}: verify FAIL ({})", file.display(), e);
                            any_invalid = true;
                        }
                    }
                }
            }
            if any_invalid {
                std::process::exit(2);
            }
        }
        Commands::OcspRequest {
            cert,
            issuer,
            no_nonce,
            output,
        } => {
            let cert = read_certificate(cert)?;
            let issuer = read_certificate(issuer)?;
            let mut request = OcspRequest::for_certificate(&cert, &issuer);
            if !no_nonce {
                request = request.with_nonce(&mut rand_core::OsRng);
            }
            if let Some(nonce) = &request.nonce {
                eprintln!("Nonce: {}", hex::encode(nonce));
            }

            let der = request.encode();
            match output {
                Some(path) => std::fs::write(path, &der)
                    .with_context(|| format!("Failed to write request: {}", path.display()))?,
                None => std::io::stdout().write_all(&der)?,
            }
        }
        Commands::OcspResponse {
            file,
            trust,
            time,
            cert,
            issuer,
            nonce,
            json,
        } => {
            let data = read_file(file)?;
            let response = decode_ocsp_response(&data)
                .with_context(|| format!("Failed to decode OCSP response: {}", file.display()))?;

            if *json {
                println!("{}", trustcheck_lib::to_json(&response)?);
            } else {
                print!("{}", trustcheck_lib::ocsp_text(&response));
            }

            let mut any_invalid = false;
            if trust.is_set() {
                let store = load_trust_store(trust)?;
                match trustcheck_lib::verify_ocsp_response(&response, &store, &time.options()) {
                    Ok(()) => eprintln!("{}: verify OK", file.display()),
                    Err(e) => {
                        eprintln!("{}: verify FAIL ({})", file.display(), e);
                        any_invalid = true;
                    }
                }
            }
            if let (Some(cert_path), Some(issuer_path)) = (cert, issuer) {
                let cert = read_certificate(cert_path)?;
                let issuer = read_certificate(issuer_path)?;
                let mut request = OcspRequest::for_certificate(&cert, &issuer);
                request.nonce = nonce.as_deref().map(parse_nonce).transpose()?;
                match trustcheck_lib::compare(&request, &response) {
                    Ok(()) => {
                        let status = response
                            .single()
                            .map_or("unknown".to_string(), |s| s.status.to_string());
                        println!("{}: {}", cert_path.display(), status);
                    }
                    Err(e) => {
                        eprintln!("{}: FAIL ({})", cert_path.display(), e);
                        any_invalid = true;
                    }
                }
            }
            if any_invalid {
                std::process::exit(2);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn data_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../trustcheck-lib/tests/data")
    }

    // ---- Positive cases: valid duration strings ----

    #[test]
    fn parse_plain_seconds() {
        assert_eq!(parse_duration("3600").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("0").unwrap(), Duration::from_secs(0));
    }

    #[test]
    fn parse_unit_suffixes() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("5min").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("2hr").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("7days").unwrap(), Duration::from_secs(604800));
        assert_eq!(
            parse_duration("2weeks").unwrap(),
            Duration::from_secs(14 * 86400)
        );
    }

    #[test]
    fn parse_combined_units() {
        assert_eq!(
            parse_duration("2h30m").unwrap(),
            Duration::from_secs(2 * 3600 + 30 * 60)
        );
        assert_eq!(
            parse_duration("1w3d").unwrap(),
            Duration::from_secs(10 * 86400)
        );
        assert_eq!(parse_duration("1h 30m").unwrap(), Duration::from_secs(5400));
    }

    // ---- Negative cases: invalid duration strings ----

    #[test]
    fn reject_bad_durations() {
        for bad in ["", "d", "-30", "-5m", "30x", "3.5", "abc", "hours"] {
            assert!(parse_duration(bad).is_err(), "accepted {:?}", bad);
        }
    }

    // ---- argument helpers ----

    #[test]
    fn nonce_hex_with_or_without_colons() {
        assert_eq!(parse_nonce("0a1b").unwrap(), vec![0x0a, 0x1b]);
        assert_eq!(parse_nonce("0A:1B").unwrap(), vec![0x0a, 0x1b]);
        assert!(parse_nonce("0g").is_err());
    }

    #[test]
    fn digest_names() {
        assert_eq!(parse_digest("SHA384").unwrap(), DigestAlgorithm::Sha384);
        assert!(parse_digest("md5").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    // ---- file discovery ----

    #[test]
    fn is_cert_file_extensions() {
        for name in ["cert.pem", "cert.der", "cert.crt", "cert.cer", "cert.PEM"] {
            assert!(is_cert_file(Path::new(name)), "{}", name);
        }
        for name in ["cert.txt", "cert.key", "ca.crl", "README.md", "cert"] {
            assert!(!is_cert_file(Path::new(name)), "{}", name);
        }
    }

    #[test]
    fn find_cert_files_in_fixture_dir() {
        let dir = data_dir();
        let files = find_cert_files(&dir, false);
        assert!(files.iter().any(|f| f.ends_with("rsa_root.der")));
        // CRLs and the generator script are not certificate files
        assert!(files.iter().all(|f| is_cert_file(f)));
        let mut sorted = files.clone();
        sorted.sort();
        assert_eq!(files, sorted);
        for f in &files {
            let relative = f.strip_prefix(&dir).unwrap();
            assert_eq!(relative.components().count(), 1);
        }
    }

    #[test]
    fn find_cert_files_empty_dir() {
        let tmp = std::env::temp_dir().join("trustcheck_test_empty_dir");
        let _ = std::fs::create_dir(&tmp);
        assert!(find_cert_files(&tmp, false).is_empty());
        let _ = std::fs::remove_dir(&tmp);
    }

    // ---- decoding helpers ----

    #[test]
    fn decode_der_fixture_and_fields() {
        let data = std::fs::read(data_dir().join("ec_leaf.der")).unwrap();
        let cert = decode_input(&data, false, false).unwrap();
        let serial = field_text(&cert, &FieldName::Serial, "sha256", false).unwrap();
        assert_eq!(serial, "c0:ff:ee");
        let san = field_text(&cert, &FieldName::San, "sha256", false).unwrap();
        assert!(san.contains("DNS:www.example.com"));
        assert!(field_text(&cert, &FieldName::Fingerprint, "md5", false).is_err());
        assert_eq!(decode_bundle(&data).unwrap().len(), 1);
    }

    #[test]
    fn read_der_crl() {
        let crls = read_crls(&data_dir().join("intermediate.crl")).unwrap();
        assert_eq!(crls.len(), 1);
        assert_eq!(crls[0].revoked().len(), 2);
    }
}

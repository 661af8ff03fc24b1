#![no_main]

use libfuzzer_sys::fuzz_target;
use trustcheck_lib::{decode_certificate, DecodeOptions, DigestAlgorithm};

fuzz_target!(|data: &[u8]| {
    // The decoder must never panic, regardless of input.
    let lenient = DecodeOptions {
        allow_legacy_extensions: true,
        lenient_policies: true,
        ..DecodeOptions::default()
    };
    for options in [DecodeOptions::default(), lenient] {
        if let Ok(cert) = decode_certificate(data, &options) {
            let _ = cert.subject().display();
            let _ = cert.issuer().to_oneline();
            let _ = cert.serial_hex();
            let _ = cert.not_before().iso8601();
            let _ = cert.not_after().to_openssl();
            let _ = cert.fingerprint(DigestAlgorithm::Sha256);
            let _ = cert.public_key().key_size();
            let _ = cert.public_key().modulus_hex();
            let _ = cert.public_key().curve().and_then(|c| c.named());
            let _ = cert.alt_names();
            let _ = cert.key_usage().map(|k| k.names());
            let _ = cert.ext_key_usage().map(|k| k.names());
            let _ = cert.name_constraints();

            let _ = trustcheck_lib::display_text(&cert, true);
            let _ = trustcheck_lib::to_json(&cert);

            let _ = trustcheck_lib::check_expiry(&cert, 0);
            let _ = trustcheck_lib::check_host(&cert, "www.example.com");
            let _ = trustcheck_lib::check_email(&cert, "test@example.com");

            // a self-signed input exercises the signature engine too
            let mut store = trustcheck_lib::MemoryTrustStore::new();
            store.add_certificate(&cert);
            let options = trustcheck_lib::VerifyOptions {
                check_time: false,
                ..Default::default()
            };
            let _ = trustcheck_lib::verify_certificate(&cert, &store, &options);
        }
    }
});

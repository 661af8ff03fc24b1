#![no_main]

use libfuzzer_sys::fuzz_target;
use trustcheck_lib::{decode_crl, decode_ocsp_response};

fuzz_target!(|data: &[u8]| {
    if let Ok(crl) = decode_crl(data) {
        let _ = crl.crl_number_hex();
        let _ = crl.find(&[0x01]);
        for entry in crl.revoked() {
            let _ = entry.reason_name();
        }
        let _ = crl.date_error(0);
        let _ = trustcheck_lib::crl_text(&crl);
        let _ = trustcheck_lib::to_json(&crl);
    }

    if let Ok(response) = decode_ocsp_response(data) {
        let _ = response.nonce();
        let _ = response.responder_certificate();
        for single in response.responses() {
            let request = trustcheck_lib::OcspRequest::new(single.cert_id.clone());
            let _ = trustcheck_lib::compare(&request, &response);
        }
        let _ = trustcheck_lib::ocsp_text(&response);
        let _ = trustcheck_lib::to_json(&response);
    }
});

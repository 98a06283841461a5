#![no_main]
#[macro_use] extern crate libfuzzer_sys;
extern crate apdu_tunnel;

use apdu_tunnel::bitcoin::{CompactSignature, ExtendedPublicKey};
use apdu_tunnel::codec::base58check_decode;
use apdu_tunnel::u2f::SignedResponse;

fuzz_target!(|data: &[u8]| {
    if let Ok(signed) = SignedResponse::from_bytes(data) {
        assert_eq!(signed.payload.len() + 7, data.len());
    }

    if let Ok(signature) = CompactSignature::from_device_signature(data) {
        assert_eq!(signature.to_bytes().len(), 65);
    }

    if let Ok(text) = std::str::from_utf8(data) {
        let _ = SignedResponse::from_signature_data(text);
        let _ = base58check_decode(text);
        let _ = ExtendedPublicKey::deserialize(text);
    }
});

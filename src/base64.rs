pub use base64::Engine;
use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};

const CONFIG: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_encode_padding(true)
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);

const CONFIG_NO_PAD: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_encode_padding(false)
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);

pub const BASE64: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, CONFIG);
pub const BASE64_URLSAFE_NOPAD: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, CONFIG_NO_PAD);

/// Convert from normal to web-safe base64, stripping trailing `=`s.
pub fn to_web_safe_base64(base64: &str) -> String {
    base64.replace('+', "-").replace('/', "_").trim_end_matches('=').to_string()
}

/// Convert from web-safe to normal base64, adding trailing `=`s.
///
/// The padding is `"=="[..(3 * len) % 4]`, which is right for every valid web-safe length.
/// A length of `4n + 1` can't come out of a base64 encoder and gets two `=` appended,
/// the resulting string won't decode.
pub fn to_standard_base64(base64: &str) -> String {
    let pad_len = ((3 * base64.len()) % 4).min(2);
    let mut normal = base64.replace('-', "+").replace('_', "/");
    normal.push_str(&"=="[..pad_len]);
    normal
}

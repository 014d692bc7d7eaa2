use base64::{
    alphabet,
    engine::{general_purpose, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};

/// Standard alphabet, padding optional, trailing bits tolerated.
///
/// Node links in the wild are produced by many different tools; some pad,
/// some don't, some leave garbage in the final quantum.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Encodes a string to Base64 format.
pub fn base64_encode(input: &str) -> String {
    general_purpose::STANDARD.encode(input)
}

/// Reverses a URL-safe Base64 string to standard Base64 format.
pub fn url_safe_base64_reverse(input: &str) -> String {
    input.replace('-', "+").replace('_', "/")
}

/// Converts a Base64 string to URL-safe Base64 format by replacing specific characters.
pub fn url_safe_base64_apply(input: &str) -> String {
    input
        .replace('+', "-")
        .replace('/', "_")
        .replace('=', "")
}

/// Encodes a string to URL-safe Base64 format.
pub fn url_safe_base64_encode(input: &str) -> String {
    url_safe_base64_apply(&base64_encode(input))
}

/// Decodes standard or URL-safe Base64, with or without padding.
///
/// Whitespace is ignored. Returns `None` when the input is not Base64 or the
/// decoded bytes are not valid UTF-8.
pub fn base64_decode_lenient(input: &str) -> Option<String> {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let bytes = LENIENT.decode(url_safe_base64_reverse(&cleaned)).ok()?;
    String::from_utf8(bytes).ok()
}

/// Like [`base64_decode_lenient`] but additionally rejects results with
/// control characters.
///
/// Used where a field may be either Base64 or a literal: short literals
/// such as `user` are often valid Base64 that decodes to binary noise.
pub fn base64_decode_text(input: &str) -> Option<String> {
    base64_decode_lenient(input).filter(|s| !s.is_empty() && !s.chars().any(char::is_control))
}

//! URL encoding/decoding utilities

/// Decodes a URL-encoded string
///
/// Returns the input unchanged if decoding fails.
///
/// # Examples
/// ```
/// use nodesync::utils::url::url_decode;
///
/// let decoded = url_decode("Hello%20World%21");
/// assert_eq!(decoded, "Hello World!");
/// ```
pub fn url_decode(input: &str) -> String {
    urlencoding::decode(input)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| input.to_string())
}

/// Percent-decodes repeatedly, at most `max_passes` times.
///
/// Stops as soon as a pass changes nothing or produces invalid UTF-8, so a
/// singly-encoded name is never decoded twice.
///
/// # Examples
/// ```
/// use nodesync::utils::url::url_decode_repeated;
///
/// assert_eq!(url_decode_repeated("HK%2520Node", 3), "HK Node");
/// assert_eq!(url_decode_repeated("100%25", 3), "100%");
/// ```
pub fn url_decode_repeated(input: &str, max_passes: usize) -> String {
    let mut current = input.to_string();
    for _ in 0..max_passes {
        let next = match urlencoding::decode(&current) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => break,
        };
        if next == current {
            break;
        }
        current = next;
    }
    current
}

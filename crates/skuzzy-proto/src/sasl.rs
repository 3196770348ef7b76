//! SASL PLAIN (RFC 4616).

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

/// Largest AUTHENTICATE argument before the payload must be chunked.
pub const SASL_CHUNK_SIZE: usize = 400;

/// Encode `\0user\0password` for `AUTHENTICATE`.
///
/// ```
/// use skuzzy_proto::sasl::encode_plain;
///
/// assert_eq!(encode_plain("bot", "hunter2"), "AGJvdABodW50ZXIy");
/// ```
pub fn encode_plain(username: &str, password: &str) -> String {
    BASE64.encode(format!("\0{username}\0{password}"))
}

/// Split an encoded payload into `AUTHENTICATE` arguments.
///
/// Payloads are sent in 400-byte pieces; a payload whose length is an exact
/// multiple of 400 is terminated by a lone `+`.
pub fn chunk_payload(encoded: &str) -> Vec<String> {
    let mut chunks: Vec<String> = encoded
        .as_bytes()
        .chunks(SASL_CHUNK_SIZE)
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .collect();
    if encoded.len() % SASL_CHUNK_SIZE == 0 {
        chunks.push("+".to_string());
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_layout() {
        let decoded = BASE64.decode(encode_plain("testuser", "testpass")).unwrap();
        assert_eq!(decoded, b"\0testuser\0testpass");
    }

    #[test]
    fn short_payload_is_one_chunk() {
        assert_eq!(chunk_payload("AGJvdABodW50ZXIy"), vec!["AGJvdABodW50ZXIy"]);
    }

    #[test]
    fn exact_multiple_gets_terminator() {
        let payload = "A".repeat(SASL_CHUNK_SIZE);
        let chunks = chunk_payload(&payload);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1], "+");
    }

    #[test]
    fn long_payload_is_split() {
        let payload = "B".repeat(SASL_CHUNK_SIZE + 10);
        let chunks = chunk_payload(&payload);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), SASL_CHUNK_SIZE);
        assert_eq!(chunks[1].len(), 10);
    }
}

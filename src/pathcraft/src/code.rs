//! Build code decoding.
//!
//! Shareable build codes are a three-stage encoding:
//! 1. URL-safe base64 text (padding is frequently stripped in the wild)
//! 2. zlib-compressed byte stream
//! 3. UTF-8 XML document
//!
//! Decoding is a pure transform: no I/O, no retries. A failed stage is
//! terminal for the call and reported per stage so callers can tell
//! "code unreadable" apart from an empty build.

use std::io::Read;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use flate2::read::ZlibDecoder;
use thiserror::Error;

use crate::document::{parse_document, BuildDocument, DocumentError};

/// Errors from the three decode stages, in stage order.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid build code encoding: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    #[error("build code decompression failed: {0}")]
    DecompressionFailure(#[from] std::io::Error),

    #[error("build code document is malformed: {0}")]
    MalformedDocument(#[from] DocumentError),

    #[error("build code document is not valid UTF-8")]
    NotUtf8,
}

/// Decode a shareable build code into a document tree.
pub fn decode(code: &str) -> Result<BuildDocument, DecodeError> {
    let bytes = decode_token(code)?;
    let xml = inflate(&bytes)?;
    let text = String::from_utf8(xml).map_err(|_| DecodeError::NotUtf8)?;
    Ok(parse_document(&text)?)
}

/// Stage 1: base64 decode with the leniency policy.
///
/// Codes circulate in both the standard and URL-safe alphabets, and
/// sites routinely strip the `=` padding. Both are normalized here by
/// policy rather than rejected: `+`/`/` map to their URL-safe
/// counterparts and padding is restored to a multiple of four before
/// decoding. Characters outside the alphabet still fail.
fn decode_token(code: &str) -> Result<Vec<u8>, DecodeError> {
    let mut normalized: String = code
        .trim()
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();
    while normalized.len() % 4 != 0 {
        normalized.push('=');
    }
    Ok(URL_SAFE.decode(normalized)?)
}

/// Stage 2: zlib inflate.
fn inflate(bytes: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut decoder = ZlibDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    const SAMPLE_XML: &str = r#"<PathOfBuilding>
<Build className="Witch" ascendClassName="Occultist" level="92"/>
</PathOfBuilding>"#;

    fn encode_code(xml: &str) -> String {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(xml.as_bytes()).unwrap();
        URL_SAFE.encode(encoder.finish().unwrap())
    }

    #[test]
    fn test_decode_round_trip() {
        let code = encode_code(SAMPLE_XML);
        let doc = decode(&code).unwrap();
        assert_eq!(doc.root.name, "PathOfBuilding");
        assert_eq!(doc.build().and_then(|b| b.attr("className")), Some("Witch"));
    }

    #[test]
    fn test_decode_is_deterministic() {
        let code = encode_code(SAMPLE_XML);
        let a = decode(&code).unwrap();
        let b = decode(&code).unwrap();
        assert_eq!(a.root, b.root);
    }

    #[test]
    fn test_decode_tolerates_stripped_padding() {
        let code = encode_code(SAMPLE_XML);
        let stripped = code.trim_end_matches('=');
        let doc = decode(stripped).unwrap();
        assert_eq!(doc.root.name, "PathOfBuilding");
    }

    #[test]
    fn test_decode_accepts_standard_alphabet() {
        let code = encode_code(SAMPLE_XML).replace('-', "+").replace('_', "/");
        assert!(decode(&code).is_ok());
    }

    #[test]
    fn test_invalid_alphabet_is_encoding_error() {
        let result = decode("not a build code!!");
        assert!(matches!(result, Err(DecodeError::InvalidEncoding(_))));
    }

    #[test]
    fn test_non_zlib_stream_is_decompression_error() {
        // Valid base64 of bytes that are not a zlib stream.
        let code = URL_SAFE.encode(b"plainly not compressed");
        let result = decode(&code);
        assert!(matches!(result, Err(DecodeError::DecompressionFailure(_))));
    }

    #[test]
    fn test_bad_markup_is_document_error() {
        let code = encode_code("<a><b></a>");
        let result = decode(&code);
        assert!(matches!(result, Err(DecodeError::MalformedDocument(_))));
    }
}

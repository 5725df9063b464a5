//! Decode command handler

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use pathcraft::DecodeError;

/// Decode a build code and print the canonical record as JSON.
///
/// `code` may be the token itself or a path to a file holding one.
/// Decode failures are reported by category so the user can tell an
/// unreadable code apart from an empty build.
pub fn handle(code: &str, source: Option<&str>, pretty: bool) -> Result<()> {
    let token = read_token(code)?;

    let doc = pathcraft::decode(&token).map_err(describe_decode_error)?;
    let record = pathcraft::extract(&doc, source.unwrap_or_default());

    let json = if pretty {
        serde_json::to_string_pretty(&record)?
    } else {
        serde_json::to_string(&record)?
    };
    println!("{json}");
    Ok(())
}

fn read_token(code: &str) -> Result<String> {
    let path = Path::new(code);
    if path.is_file() {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read code file {}", path.display()))?;
        Ok(text.trim().to_string())
    } else {
        Ok(code.trim().to_string())
    }
}

fn describe_decode_error(err: DecodeError) -> anyhow::Error {
    let stage = match &err {
        DecodeError::InvalidEncoding(_) => "not valid base64",
        DecodeError::DecompressionFailure(_) => "not a valid compressed stream",
        DecodeError::MalformedDocument(_) | DecodeError::NotUtf8 => "document is malformed",
    };
    anyhow::Error::new(err).context(format!("code unreadable: {stage}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_token_passes_through_raw_codes() {
        let token = read_token("  eNrT0yMAAGTvBe8=  ").unwrap();
        assert_eq!(token, "eNrT0yMAAGTvBe8=");
    }

    #[test]
    fn test_read_token_reads_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        use std::io::Write;
        writeln!(file, "eNrT0yMAAGTvBe8=").unwrap();
        let token = read_token(file.path().to_str().unwrap()).unwrap();
        assert_eq!(token, "eNrT0yMAAGTvBe8=");
    }
}

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use super::ApiError;

/// Fraction of control bytes above which a decoded payload is treated as
/// binary and the inline preview is suppressed.
pub const BINARY_CONTROL_RATIO: f64 = 0.02;

/// Decoded blob payload with a mime guess. Binary payloads keep the original
/// base64 text so the raw bytes stay available for saving to disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileContent {
    pub mime: &'static str,
    pub size: u64,
    pub body: FileBody,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileBody {
    Text(String),
    Binary { base64: String },
}

impl FileContent {
    pub fn is_binary(&self) -> bool {
        matches!(self.body, FileBody::Binary { .. })
    }

    pub fn text(&self) -> Option<&str> {
        match &self.body {
            FileBody::Text(text) => Some(text),
            FileBody::Binary { .. } => None,
        }
    }

    /// Raw bytes of the payload, re-decoding the retained base64 for binary
    /// bodies. Used when saving a file to disk.
    pub fn bytes(&self) -> Result<Vec<u8>, ApiError> {
        match &self.body {
            FileBody::Text(text) => Ok(text.as_bytes().to_vec()),
            FileBody::Binary { base64 } => BASE64
                .decode(base64.as_bytes())
                .map_err(|error| ApiError::Decode(format!("invalid base64 blob payload: {error}"))),
        }
    }
}

/// Decodes a base64 blob payload (as returned by the blob endpoint, with
/// embedded newlines) and classifies it as text or binary.
pub fn decode_blob(raw_base64: &str, declared_size: u64, path: &str) -> Result<FileContent, ApiError> {
    let compact: String = raw_base64
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = BASE64
        .decode(compact.as_bytes())
        .map_err(|error| ApiError::Decode(format!("invalid base64 blob payload: {error}")))?;

    let mime = mime_for_path(path);
    let size = if declared_size > 0 {
        declared_size
    } else {
        bytes.len() as u64
    };

    match String::from_utf8(bytes) {
        Ok(text) if looks_like_text(&text) => Ok(FileContent {
            mime,
            size,
            body: FileBody::Text(text),
        }),
        _ => Ok(FileContent {
            mime,
            size,
            body: FileBody::Binary {
                base64: compact,
            },
        }),
    }
}

/// Control bytes excluding common whitespace (tab, LF, VT, FF, CR).
fn is_control_byte(byte: u8) -> bool {
    matches!(byte, 0x00..=0x08 | 0x0e..=0x1f)
}

pub fn looks_like_text(decoded: &str) -> bool {
    if decoded.is_empty() {
        return true;
    }

    let control = decoded.bytes().filter(|b| is_control_byte(*b)).count();
    (control as f64 / decoded.len() as f64) < BINARY_CONTROL_RATIO
}

pub fn mime_for_path(path: &str) -> &'static str {
    let lower = path.to_ascii_lowercase();
    let extension = lower.rsplit('.').next().unwrap_or("");

    match extension {
        "json" => "application/json",
        "js" | "jsx" | "ts" | "tsx" => "text/javascript",
        "md" => "text/markdown",
        "css" => "text/css",
        "html" => "text/html",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(bytes: &[u8]) -> String {
        BASE64.encode(bytes)
    }

    #[test]
    fn clean_text_classifies_as_text() {
        let payload = encode(b"fn main() {\n\tprintln!(\"hi\");\n}\n");
        let content = decode_blob(&payload, 0, "src/main.rs").unwrap();
        assert!(!content.is_binary());
        assert!(content.text().unwrap().contains("println!"));
    }

    #[test]
    fn control_heavy_payload_classifies_as_binary_and_keeps_base64() {
        // 10% control bytes, well over the 2% threshold.
        let mut bytes = vec![b'a'; 90];
        bytes.extend(std::iter::repeat_n(0x01u8, 10));
        let payload = encode(&bytes);

        let content = decode_blob(&payload, 0, "data.bin").unwrap();
        assert!(content.is_binary());
        assert!(content.text().is_none());
        match &content.body {
            FileBody::Binary { base64 } => assert_eq!(base64, &payload),
            FileBody::Text(_) => unreachable!(),
        }
    }

    #[test]
    fn invalid_utf8_classifies_as_binary() {
        let payload = encode(&[0xff, 0xfe, 0x00, 0x41]);
        let content = decode_blob(&payload, 4, "blob").unwrap();
        assert!(content.is_binary());
        assert_eq!(content.size, 4);
    }

    #[test]
    fn payload_with_embedded_newlines_decodes() {
        let mut payload = encode(b"hello world, this is a longer payload");
        payload.insert(10, '\n');
        payload.insert(20, '\n');
        let content = decode_blob(&payload, 0, "notes.txt").unwrap();
        assert_eq!(content.text().unwrap(), "hello world, this is a longer payload");
    }

    #[test]
    fn boundary_ratio_stays_text_below_threshold() {
        // 1 control byte in 100 -> 1%, under the 2% threshold.
        let mut bytes = vec![b'x'; 99];
        bytes.push(0x07);
        let content = decode_blob(&encode(&bytes), 0, "x.txt").unwrap();
        assert!(!content.is_binary());
    }

    #[test]
    fn common_whitespace_is_not_counted_as_control() {
        let text = "\t\t\n\r\n".repeat(50);
        assert!(looks_like_text(&text));
    }

    #[test]
    fn mime_guesses_follow_extension() {
        assert_eq!(mime_for_path("package.json"), "application/json");
        assert_eq!(mime_for_path("src/App.JSX"), "text/javascript");
        assert_eq!(mime_for_path("README.md"), "text/markdown");
        assert_eq!(mime_for_path("logo.svg"), "image/svg+xml");
        assert_eq!(mime_for_path("Makefile"), "application/octet-stream");
    }
}

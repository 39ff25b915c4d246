//! Character encoding selection for PUZ string fields.
//!
//! AcrossLite predates Unicode: files with major version below 2 store
//! strings in the Windows-1252 single-byte code page, files with major
//! version 2 and above use UTF-8.  Following the WHATWG mapping (and
//! `encoding_rs` with it), ISO-8859-1 labels resolve to Windows-1252,
//! which matches what AcrossLite actually wrote on Windows.

use crate::puzzle::parse_version;
use crate::validate::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Windows-1252, used by all 1.x files.
    Latin1,
    /// UTF-8, used from file version 2.0 onward.
    Utf8,
}

impl Encoding {
    /// Pick the string encoding implied by a `major.minor[patch]` version.
    pub fn for_version(file_version: &str) -> Result<Self, ValidationError> {
        let (major, _, _) = parse_version(file_version)?;
        Ok(if major >= 2 { Encoding::Utf8 } else { Encoding::Latin1 })
    }

    /// Decode bytes into a string.  Never fails: both encodings assign a
    /// character to every byte sequence, substituting where needed.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Encoding::Latin1 => encoding_rs::WINDOWS_1252
                .decode_without_bom_handling(bytes)
                .0
                .into_owned(),
            Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        }
    }

    /// Encode a string into bytes.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Encoding::Latin1 => encoding_rs::WINDOWS_1252.encode(text).0.into_owned(),
            Encoding::Utf8 => text.as_bytes().to_vec(),
        }
    }
}

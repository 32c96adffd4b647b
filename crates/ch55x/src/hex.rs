//! Intel-HEX program loading.
//!
//! Parsing and validation happen on a staged [`HexImage`]; code memory is
//! only written once the whole stream has been accepted.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

const RECORD_DATA: u8 = 0x00;
const RECORD_EOF: u8 = 0x01;

/// Errors that can occur while loading a HEX image.
#[derive(Debug, Error)]
pub enum HexError {
    #[error("cannot read {}: {source}", .path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("bad format on line {line}: {reason}")]
    BadFormat { line: usize, reason: &'static str },

    #[error("unsupported record type {record_type:02X} on line {line}")]
    UnsupportedVersion { line: usize, record_type: u8 },

    #[error("checksum failure on line {line}: expected {expected:02X}, found {found:02X}")]
    Checksum { line: usize, expected: u8, found: u8 },

    #[error("no end-of-file record")]
    MissingEndMarker,
}

/// A run of bytes from one data record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Source line, for error reporting.
    pub line: usize,
    pub address: u16,
    pub data: Vec<u8>,
}

/// A validated HEX stream that has not been written anywhere yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HexImage {
    segments: Vec<Segment>,
}

impl HexImage {
    pub fn parse(source: &str) -> Result<Self, HexError> {
        let mut segments = Vec::new();
        for (index, record) in source.lines().enumerate() {
            let line = index + 1;
            let record = record.trim();
            if record.is_empty() {
                continue;
            }

            let bytes = decode_record(line, record)?;
            let count = bytes[0] as usize;
            if bytes.len() != count + 5 {
                return Err(HexError::BadFormat {
                    line,
                    reason: "byte count does not match record length",
                });
            }

            let (body, found) = bytes.split_at(bytes.len() - 1);
            let expected = body
                .iter()
                .fold(0u8, |sum, byte| sum.wrapping_add(*byte))
                .wrapping_neg();
            if expected != found[0] {
                return Err(HexError::Checksum {
                    line,
                    expected,
                    found: found[0],
                });
            }

            match bytes[3] {
                RECORD_DATA => segments.push(Segment {
                    line,
                    address: u16::from_be_bytes([bytes[1], bytes[2]]),
                    data: bytes[4..4 + count].to_vec(),
                }),
                RECORD_EOF => return Ok(Self { segments }),
                record_type => return Err(HexError::UnsupportedVersion { line, record_type }),
            }
        }
        Err(HexError::MissingEndMarker)
    }

    /// Reads and parses a HEX file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, HexError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| HexError::NotFound {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Copies the image into `code` and returns the number of bytes written.
    /// Nothing is written unless every segment fits.
    pub fn apply(&self, code: &mut [u8]) -> Result<usize, HexError> {
        if let Some(segment) = self
            .segments
            .iter()
            .find(|segment| segment.address as usize + segment.data.len() > code.len())
        {
            return Err(HexError::BadFormat {
                line: segment.line,
                reason: "data record beyond the end of code memory",
            });
        }

        let mut written = 0;
        for segment in &self.segments {
            let start = segment.address as usize;
            code[start..start + segment.data.len()].copy_from_slice(&segment.data);
            written += segment.data.len();
        }
        debug!(segments = self.segments.len(), bytes = written, "loaded hex image");
        Ok(written)
    }
}

/// Decodes `:LLAAAATT...CC` into raw bytes, checking only the character
/// level syntax.
fn decode_record(line: usize, record: &str) -> Result<Vec<u8>, HexError> {
    let bad = |reason| HexError::BadFormat { line, reason };

    let digits = record
        .strip_prefix(':')
        .ok_or_else(|| bad("missing ':' start code"))?;
    if !digits.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return Err(bad("non-hex digit"));
    }
    if digits.len() % 2 != 0 {
        return Err(bad("odd number of hex digits"));
    }
    if digits.len() < 10 {
        return Err(bad("record too short"));
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| bad("non-hex digit")))
        .collect()
}

//! Text framing for the payload carried by a single symbol.
//!
//! Wire format: `<path>|<index>|<total>|<base64-chunk>`. `index` is 1-based,
//! `total` is repeated in every chunk of a file. The base64 alphabet never
//! contains the delimiter, so only `path` can be ambiguous; `parse` splits at
//! most three times so a stray delimiter can never leak into `data`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DELIMITER: char = '|';

/// One unit of transfer, as framed into a symbol.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedChunk {
    pub path: String,
    pub index: u32,
    pub total: u32,
    pub data: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected 4 fields, found {found}")]
    MissingFields { found: usize },

    #[error("{field} is not a number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{field} must be at least 1")]
    ZeroValue { field: &'static str },

    #[error("index {index} exceeds total {total}")]
    IndexOutOfRange { index: u32, total: u32 },
}

/// Build the payload text for one chunk. `path` is embedded as-is.
pub fn frame(path: &str, index: u32, total: u32, data: &str) -> String {
    let mut s = String::with_capacity(path.len() + data.len() + 24);
    s.push_str(path);
    s.push(DELIMITER);
    s.push_str(&index.to_string());
    s.push(DELIMITER);
    s.push_str(&total.to_string());
    s.push(DELIMITER);
    s.push_str(data);
    s
}

pub fn parse(text: &str) -> Result<EncodedChunk, ParseError> {
    let fields: Vec<&str> = text.splitn(4, DELIMITER).collect();
    if fields.len() < 4 {
        return Err(ParseError::MissingFields {
            found: fields.len(),
        });
    }

    let index = parse_positive("index", fields[1])?;
    let total = parse_positive("total", fields[2])?;
    if index > total {
        return Err(ParseError::IndexOutOfRange { index, total });
    }

    Ok(EncodedChunk {
        path: fields[0].to_string(),
        index,
        total,
        data: fields[3].to_string(),
    })
}

/// Plain base-10 digits only; no sign, no surrounding whitespace.
fn parse_positive(field: &'static str, raw: &str) -> Result<u32, ParseError> {
    let invalid = || ParseError::InvalidNumber {
        field,
        value: raw.to_string(),
    };
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let n: u32 = raw.parse().map_err(|_| invalid())?;
    if n == 0 {
        return Err(ParseError::ZeroValue { field });
    }
    Ok(n)
}

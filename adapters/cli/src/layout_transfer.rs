//! Single-line layout codes for sharing a maze design through chat.
//!
//! A code looks like `maze:v1:9x9:<payload>` where the payload is the
//! unpadded base64 encoding of the save file JSON without the size field.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use maze_bingo_core::SavePayload;

const CODE_DOMAIN: &str = "maze";
const CODE_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded payload.
pub(crate) const CODE_HEADER: &str = "maze:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Encodes the payload into a single-line string suitable for pasting.
pub(crate) fn encode(payload: &SavePayload) -> Result<String, LayoutTransferError> {
    let side = payload.side();
    let body = SavePayload {
        size: None,
        ..payload.clone()
    };
    let json = serde_json::to_vec(&body).map_err(LayoutTransferError::InvalidPayload)?;
    let encoded = STANDARD_NO_PAD.encode(json);
    Ok(format!("{CODE_HEADER}:{side}x{side}:{encoded}"))
}

/// Decodes a payload from its single-line representation.
pub(crate) fn decode(value: &str) -> Result<SavePayload, LayoutTransferError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LayoutTransferError::EmptyCode);
    }

    let mut parts = trimmed.splitn(4, FIELD_DELIMITER);
    let domain = parts.next().ok_or(LayoutTransferError::MissingPrefix)?;
    let version = parts.next().ok_or(LayoutTransferError::MissingVersion)?;
    let dimensions = parts.next().ok_or(LayoutTransferError::MissingDimensions)?;
    let payload = parts.next().ok_or(LayoutTransferError::MissingPayload)?;

    if domain != CODE_DOMAIN {
        return Err(LayoutTransferError::InvalidPrefix(domain.to_owned()));
    }
    if version != CODE_VERSION {
        return Err(LayoutTransferError::UnsupportedVersion(version.to_owned()));
    }

    let side = parse_dimensions(dimensions)?;
    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(LayoutTransferError::InvalidEncoding)?;
    let decoded: SavePayload =
        serde_json::from_slice(&bytes).map_err(LayoutTransferError::InvalidPayload)?;

    Ok(SavePayload {
        size: Some(side),
        ..decoded
    })
}

/// Errors that can occur while decoding layout codes.
#[derive(Debug, thiserror::Error)]
pub(crate) enum LayoutTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("layout code was empty")]
    EmptyCode,
    /// The prefix segment was missing.
    #[error("layout code is missing the prefix")]
    MissingPrefix,
    /// The version segment was missing.
    #[error("layout code is missing the version")]
    MissingVersion,
    /// The grid dimensions were missing.
    #[error("layout code is missing the grid dimensions")]
    MissingDimensions,
    /// The payload segment was missing.
    #[error("layout code is missing the payload")]
    MissingPayload,
    /// The code used an unexpected prefix segment.
    #[error("layout prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The code used an unsupported version identifier.
    #[error("layout version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed or were not square.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode layout payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The payload could not be (de)serialised.
    #[error("could not parse layout payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
}

fn parse_dimensions(dimensions: &str) -> Result<u32, LayoutTransferError> {
    let invalid = || LayoutTransferError::InvalidDimensions(dimensions.to_owned());
    let (columns, rows) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let columns = columns.trim().parse::<u32>().map_err(|_| invalid())?;
    let rows = rows.trim().parse::<u32>().map_err(|_| invalid())?;

    if columns == 0 || columns != rows {
        return Err(invalid());
    }

    Ok(columns)
}

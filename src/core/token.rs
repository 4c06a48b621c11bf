//! Compression and URL-safe text encoding shared by the encoder and decoder.
//!
//! A token is `base64url(zlib(payload))`. Tokens are emitted without `=`
//! padding; padded tokens are still accepted on the way back in.

use crate::utils::error::{AppError, Result};
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use std::io::Write;

const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Compress `payload` and encode it as a URL-safe token.
pub fn seal(payload: &[u8]) -> Result<String> {
    let mut compressor = ZlibEncoder::new(Vec::new(), Compression::default());
    compressor.write_all(payload)?;
    let compressed = compressor.finish()?;

    tracing::debug!(
        "Compressed {} bytes to {} bytes",
        payload.len(),
        compressed.len()
    );

    Ok(TOKEN_ENGINE.encode(compressed))
}

/// Upper bound on a decoded payload unless the caller configures one.
pub const DEFAULT_MAX_DECODED_BYTES: usize = 16 * 1024 * 1024;

/// Reverse of [`seal`]. Every failure is reported as a corrupt token,
/// including a payload that inflates past `max_decoded_bytes`.
pub fn open(token: &str, max_decoded_bytes: usize) -> Result<Vec<u8>> {
    let compressed = TOKEN_ENGINE
        .decode(token.trim())
        .map_err(|e| AppError::corrupt_token(format!("Invalid token encoding: {}", e)))?;

    inflate(&compressed, max_decoded_bytes)
}

/// Streams the zlib data into a buffer that never grows past `limit + 1` bytes.
fn inflate(compressed: &[u8], limit: usize) -> Result<Vec<u8>> {
    let too_large = || {
        AppError::corrupt_token(format!(
            "Decoded payload exceeds the {} byte limit",
            limit
        ))
    };

    let ceiling = limit.saturating_add(1);
    let mut decoder = Decompress::new(true);
    let mut out: Vec<u8> =
        Vec::with_capacity(compressed.len().saturating_mul(4).clamp(1, ceiling));

    loop {
        if out.len() == out.capacity() {
            if out.len() > limit {
                return Err(too_large());
            }
            let grow = out.capacity().min(ceiling - out.len()).max(1);
            out.reserve_exact(grow);
        }

        let in_before = decoder.total_in();
        let out_before = decoder.total_out();
        let status = decoder
            .decompress_vec(
                &compressed[in_before as usize..],
                &mut out,
                FlushDecompress::None,
            )
            .map_err(|e| AppError::corrupt_token(format!("Invalid compressed data: {}", e)))?;

        if out.len() > limit {
            return Err(too_large());
        }

        match status {
            Status::StreamEnd => return Ok(out),
            _ if decoder.total_in() == in_before && decoder.total_out() == out_before => {
                return Err(AppError::corrupt_token(
                    "Invalid compressed data: incomplete or truncated stream",
                ));
            }
            _ => {}
        }
    }
}

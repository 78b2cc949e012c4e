// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! JSON-RPC message framing over a byte stream.
//!
//! One message is a block of `Name: value` headers, each terminated by
//! `\r\n`, a blank line, and a body of exactly `Content-Length` bytes.
//! `Content-Length` is required; `Content-Type` is accepted and ignored
//! (the default is `application/vscode-jsonrpc; charset=utf-8`).
//!
//! Bodies are capped at 10 MiB. A framing error poisons only the current
//! message: the caller reports it and keeps reading. End of stream between
//! messages ends the session cleanly.

use std::io::{BufRead, Write};

use thiserror::Error;

/// Maximum accepted body size: 10 MiB.
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// A framing-level error.
#[derive(Debug, Error)]
pub enum TransportError {
    /// `Content-Length` was absent or unparseable, or the stream ended in
    /// the middle of a header block.
    #[error("missing or malformed Content-Length header")]
    InvalidHeader,

    /// The declared body size exceeds [`MAX_CONTENT_LENGTH`].
    #[error("message body exceeds the 10 MiB limit")]
    ContentTooLarge,

    /// The underlying stream failed.
    #[error("transport I/O error")]
    Io(#[from] std::io::Error),
}

/// Reads one framed message body.
///
/// Returns `Ok(None)` on a clean end of stream (before any header byte of
/// the next message). The body is returned as raw bytes; JSON decoding —
/// and JSON-level errors — belong to the layer above.
pub fn read_message<R: BufRead>(reader: &mut R) -> Result<Option<Vec<u8>>, TransportError> {
    let mut content_length: Option<usize> = None;
    let mut read_any_header = false;

    loop {
        let mut line = String::new();
        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            if read_any_header {
                // Stream died mid-header-block.
                return Err(TransportError::InvalidHeader);
            }
            return Ok(None);
        }
        read_any_header = true;

        let line = line.trim_end_matches('\n').trim_end_matches('\r');
        if line.is_empty() {
            break;
        }

        if let Some(value) = line.strip_prefix("Content-Length:") {
            let parsed = value
                .trim()
                .parse::<usize>()
                .map_err(|_| TransportError::InvalidHeader)?;
            content_length = Some(parsed);
        }
        // Other headers (Content-Type) are tolerated and ignored.
    }

    let length = content_length.ok_or(TransportError::InvalidHeader)?;
    if length > MAX_CONTENT_LENGTH {
        return Err(TransportError::ContentTooLarge);
    }

    let mut body = vec![0u8; length];
    reader.read_exact(&mut body)?;
    Ok(Some(body))
}

/// Writes one framed message and flushes.
pub fn write_message<W: Write>(writer: &mut W, body: &str) -> std::io::Result<()> {
    write!(writer, "Content-Length: {}\r\n\r\n{body}", body.len())?;
    writer.flush()
}

// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Sable Language Server Protocol server.
//!
//! This binary exposes the `sable-core` document model over the Language
//! Server Protocol on stdin/stdout. The request loop is synchronous: one
//! message is processed to completion before the next is read.

/// JSON-RPC 2.0 message shapes and error codes.
mod rpc;
/// LSP server backend implementation.
mod server;
/// Content-Length message framing.
mod transport;

use tracing_subscriber::EnvFilter;

/// Entry point for the Sable language server.
///
/// Initialises tracing, then serves over stdin/stdout until the client
/// sends `exit` or closes the stream.
fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        // LSP is consumed by editors/tools, so logs should be plain text (no ANSI escapes).
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut reader = stdin.lock();
    let mut writer = stdout.lock();

    let mut server = server::Server::new();
    server.run(&mut reader, &mut writer)
}

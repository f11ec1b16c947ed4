//! TCP client
//!
//! One persistent framed connection, used by the CLI and by the replica
//! puller. A request/response pair is a single `execute` call.

use std::net::{Shutdown, TcpStream};

use crate::error::{OrionError, Result};

use super::frame::{read_frame, write_frame};

/// Framed request/response client
pub struct TcpClient {
    stream: TcpStream,
    address: String,
}

impl TcpClient {
    pub fn connect(address: &str) -> Result<Self> {
        let stream = TcpStream::connect(address).map_err(|e| {
            OrionError::Network(format!("failed to connect to {address}: {e}"))
        })?;
        let _ = stream.set_nodelay(true);

        Ok(Self {
            stream,
            address: address.to_string(),
        })
    }

    /// Send one framed request and block for the framed response
    pub fn execute(&mut self, request: &[u8]) -> Result<Vec<u8>> {
        write_frame(&mut self.stream, request)?;
        read_frame(&mut self.stream, 0)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn disconnect(self) -> Result<()> {
        self.stream.shutdown(Shutdown::Both)?;
        Ok(())
    }
}

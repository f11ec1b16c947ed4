//! Replication codec
//!
//! Binary encoding of the replication messages. Both sides exchange single
//! frames over the same length-prefixed transport as client requests.
//!
//! ## Wire Format
//!
//! ### Request
//! ```text
//! ┌──────────────────┬──────────────────┐
//! │ segment_index(8) │ line_number (8)  │
//! └──────────────────┴──────────────────┘
//! ```
//!
//! ### Response
//! ```text
//! ┌───────────┬───────────┬───────────────────────────────┐
//! │ status(1) │ count (4) │ count x ( len (4) + utf8 )    │
//! └───────────┴───────────┴───────────────────────────────┘
//! ```
//!
//! All integers are big-endian.

use crate::error::{OrionError, Result};

/// Size of an encoded request: two u64 fields
pub const REQUEST_SIZE: usize = 16;

/// Replica -> primary: the position of the replica's durable tail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicationRequest {
    pub segment_index: u64,
    pub line_number: u64,
}

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReplicationStatus {
    /// Updates follow, possibly none
    Ok = 0x00,

    /// The addressed node is a slave and cannot serve the feed
    Refused = 0x01,
}

/// Primary -> replica: every log record strictly after the requested position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationResponse {
    pub status: ReplicationStatus,
    pub queries: Vec<String>,
}

impl Default for ReplicationResponse {
    fn default() -> Self {
        Self::ok(Vec::new())
    }
}

impl ReplicationRequest {
    pub fn encode(&self) -> Vec<u8> {
        let mut message = Vec::with_capacity(REQUEST_SIZE);
        message.extend_from_slice(&self.segment_index.to_be_bytes());
        message.extend_from_slice(&self.line_number.to_be_bytes());
        message
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != REQUEST_SIZE {
            return Err(OrionError::Protocol(format!(
                "replication request: expected {} bytes, got {}",
                REQUEST_SIZE,
                bytes.len()
            )));
        }

        let mut segment_index = [0u8; 8];
        let mut line_number = [0u8; 8];
        segment_index.copy_from_slice(&bytes[..8]);
        line_number.copy_from_slice(&bytes[8..]);

        Ok(Self {
            segment_index: u64::from_be_bytes(segment_index),
            line_number: u64::from_be_bytes(line_number),
        })
    }
}

impl ReplicationResponse {
    pub fn ok(queries: Vec<String>) -> Self {
        Self {
            status: ReplicationStatus::Ok,
            queries,
        }
    }

    pub fn refused() -> Self {
        Self {
            status: ReplicationStatus::Refused,
            queries: Vec::new(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let payload_len: usize = self.queries.iter().map(|q| 4 + q.len()).sum();
        let mut message = Vec::with_capacity(5 + payload_len);
        message.push(self.status as u8);
        message.extend_from_slice(&(self.queries.len() as u32).to_be_bytes());
        for query in &self.queries {
            message.extend_from_slice(&(query.len() as u32).to_be_bytes());
            message.extend_from_slice(query.as_bytes());
        }
        message
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let status = match bytes.first().copied() {
            Some(0x00) => ReplicationStatus::Ok,
            Some(0x01) => ReplicationStatus::Refused,
            Some(unknown) => {
                return Err(OrionError::Protocol(format!(
                    "replication response: unknown status 0x{unknown:02x}"
                )))
            }
            None => {
                return Err(OrionError::Protocol(
                    "replication response: empty message".to_string(),
                ))
            }
        };

        let count = read_u32(bytes, 1)? as usize;
        let mut offset = 5;

        let mut queries = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            let len = read_u32(bytes, offset)? as usize;
            offset += 4;

            let Some(raw) = bytes.get(offset..offset + len) else {
                return Err(OrionError::Protocol(format!(
                    "replication response: truncated entry of {len} bytes at offset {offset}"
                )));
            };
            offset += len;

            let query = String::from_utf8(raw.to_vec()).map_err(|e| {
                OrionError::Protocol(format!("replication response: invalid utf8: {e}"))
            })?;
            queries.push(query);
        }

        if offset != bytes.len() {
            return Err(OrionError::Protocol(format!(
                "replication response: {} trailing bytes",
                bytes.len() - offset
            )));
        }

        Ok(Self { status, queries })
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32> {
    let Some(raw) = bytes.get(offset..offset + 4) else {
        return Err(OrionError::Protocol(format!(
            "replication message: truncated integer at offset {offset}"
        )));
    };
    Ok(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

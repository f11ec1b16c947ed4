//! Replica-side puller
//!
//! Asks the primary for everything past the local durable tail. The
//! connection is persistent; a closed or refused link is re-dialed once
//! per fetch, and a second failure propagates to the caller.

use std::io::ErrorKind;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::ReplicationConfig;
use crate::error::{OrionError, Result};
use crate::network::TcpClient;
use crate::protocol::{ReplicationRequest, ReplicationResponse, ReplicationStatus};
use crate::wal::Wal;

/// Pulls WAL updates from the primary
pub struct SlaveReplicator {
    client: Mutex<TcpClient>,
    wal: Arc<Wal>,
    master_address: String,
}

impl SlaveReplicator {
    /// Dial the primary's replication endpoint
    pub fn connect(conf: &ReplicationConfig, wal: Arc<Wal>) -> Result<Self> {
        let client = TcpClient::connect(&conf.master_address)?;
        Ok(Self {
            client: Mutex::new(client),
            wal,
            master_address: conf.master_address.clone(),
        })
    }

    /// Fetch every record past the local WAL's durable tail, in primary
    /// WAL order.
    ///
    /// A refused response means the configured master is itself a slave;
    /// that is an operator mistake, not a reason to kill the node, so it
    /// is logged and treated as an empty update set until the config is
    /// fixed.
    pub fn fetch_updates(&self) -> Result<Vec<String>> {
        let position = self.wal.status();
        let request = ReplicationRequest {
            segment_index: position.segment_index,
            line_number: position.line_number,
        }
        .encode();

        let mut client = self.client.lock();
        let response = match client.execute(&request) {
            Ok(response) => response,
            Err(e) if is_connection_error(&e) => {
                tracing::warn!(
                    "replication link to {} lost, reconnecting: {e}",
                    self.master_address
                );
                *client = TcpClient::connect(&self.master_address)?;
                client.execute(&request)?
            }
            Err(e) => return Err(e),
        };

        let decoded = ReplicationResponse::decode(&response)?;
        if decoded.status == ReplicationStatus::Refused {
            tracing::error!(
                "node at {} is a slave and refused the replication request; check master_address",
                self.master_address
            );
            return Ok(Vec::new());
        }
        Ok(decoded.queries)
    }
}

/// Closed-link conditions worth one reconnect attempt
fn is_connection_error(err: &OrionError) -> bool {
    match err {
        OrionError::Io(io_err) => matches!(
            io_err.kind(),
            ErrorKind::ConnectionRefused
                | ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::BrokenPipe
                | ErrorKind::UnexpectedEof
        ),
        _ => false,
    }
}

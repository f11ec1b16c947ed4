//! Primary-side update feed
//!
//! Request handler for the replication endpoint: decode a replica's
//! position, read everything past it out of the WAL, encode the list.

use std::sync::Arc;

use crate::config::{ReplicaRole, ReplicationConfig};
use crate::error::Result;
use crate::protocol::{ReplicationRequest, ReplicationResponse};
use crate::wal::{LogPosition, Wal};

/// Serves WAL updates to replicas
pub struct MasterReplicator {
    role: ReplicaRole,
    wal: Arc<Wal>,
}

impl MasterReplicator {
    pub fn new(conf: &ReplicationConfig, wal: Arc<Wal>) -> Self {
        Self {
            role: conf.replica_type,
            wal,
        }
    }

    /// Handle one replication request; always produces an encoded
    /// [`ReplicationResponse`].
    ///
    /// A replica node refuses to serve the feed, marked by the refused
    /// status on the wire. A malformed request is logged and answered with
    /// an empty update set so the puller just retries on its next tick.
    pub fn handle_request(&self, request: &[u8]) -> Vec<u8> {
        if self.role.is_slave() {
            tracing::error!("replication request received by a slave node");
            return ReplicationResponse::refused().encode();
        }

        match self.updates_after(request) {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("failed to serve replication request: {e}");
                ReplicationResponse::default().encode()
            }
        }
    }

    fn updates_after(&self, request: &[u8]) -> Result<Vec<u8>> {
        let request = ReplicationRequest::decode(request)?;
        let queries = self.wal.read_from(LogPosition {
            segment_index: request.segment_index,
            line_number: request.line_number,
        })?;

        if !queries.is_empty() {
            tracing::debug!(
                count = queries.len(),
                segment = request.segment_index,
                line = request.line_number,
                "serving wal updates"
            );
        }

        Ok(ReplicationResponse::ok(queries).encode())
    }
}

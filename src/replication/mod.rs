//! Primary/replica replication
//!
//! The primary serves its WAL as a position-based update feed on a second
//! framed TCP endpoint; a replica pulls that feed on a timer and applies
//! the records through its own executor. Positions advance only as the
//! replica's own WAL durably advances, so delivery is at-least-once and
//! relies on SET/DEL being idempotent.

mod master;
mod slave;

pub use master::MasterReplicator;
pub use slave::SlaveReplicator;

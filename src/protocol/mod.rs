//! Client protocol and replication wire format
//!
//! Clients speak a one-line textual protocol: `SET key value`, `GET key`,
//! `DEL key`. Responses are textual templates with a `[success]` or
//! `[error]` prefix. The replication feed reuses the same framed transport
//! with a small binary request/response encoding.

mod codec;
mod command;
mod parser;
pub mod response;

pub use codec::{ReplicationRequest, ReplicationResponse, ReplicationStatus};
pub use command::Command;
pub use parser::{clean_query, parse_query};

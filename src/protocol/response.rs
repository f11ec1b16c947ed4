//! Response templates
//!
//! Every client-visible response is built from these. The literal strings
//! are part of the wire contract, bracketed prefix included.

use std::fmt::Display;

/// Mutation accepted
pub const SUCCESS: &str = "[success]";

/// Malformed query
pub const CANNOT_PARSE_QUERY: &str = "[error] cannot parse query";

/// Reserved: replication refusals travel as a status byte on the feed wire
pub const SLAVE_REPLICATION_ERROR: &str = "[error] slave cannot handle replication request";

/// Reserved: emitted when admission capacity is enforced non-blockingly
pub const NO_CONNECTIONS_AVAILABLE: &str = "[error] no connections available";

/// GET result; a missing key yields an empty value after the space
pub fn get_result(value: &str) -> String {
    format!("[success] {value}")
}

/// Reserved: command token recognized nowhere in the dispatch table
pub fn unknown_command(command: &str) -> String {
    format!("[error] unknown command: {command}")
}

/// WAL append or flush failure
pub fn store_error(detail: impl Display) -> String {
    format!("[error] command storing failed: {detail}")
}

/// Mutation attempted on a replica
pub fn slave_write_error(query: &str) -> String {
    format!("[error] modifying command cannot be executed on slave: {query}")
}

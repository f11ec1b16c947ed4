//! Tests for configuration loading and the size/duration string formats

use std::io::Write;
use std::time::Duration;

use orionkv::config::{parse_duration, parse_size, AppConfig, ReplicaRole};
use tempfile::NamedTempFile;

// =============================================================================
// Size strings
// =============================================================================

#[test]
fn parse_size_accepts_powers_of_1024() {
    assert_eq!(parse_size("512b").unwrap(), 512);
    assert_eq!(parse_size("1kb").unwrap(), 1024);
    assert_eq!(parse_size("4KB").unwrap(), 4096);
    assert_eq!(parse_size("2mb").unwrap(), 2 * 1024 * 1024);
}

#[test]
fn parse_size_rejects_unknown_units() {
    assert!(parse_size("1gb").is_err());
    assert!(parse_size("10").is_err());
    assert!(parse_size("kb").is_err());
    assert!(parse_size("").is_err());
}

// =============================================================================
// Duration strings
// =============================================================================

#[test]
fn parse_duration_accepts_common_units() {
    assert_eq!(parse_duration("10ms").unwrap(), Duration::from_millis(10));
    assert_eq!(parse_duration("1s").unwrap(), Duration::from_secs(1));
    assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
    assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
}

#[test]
fn parse_duration_rejects_unknown_units() {
    assert!(parse_duration("10d").is_err());
    assert!(parse_duration("fast").is_err());
}

// =============================================================================
// File loading
// =============================================================================

#[test]
fn load_partial_file_fills_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[network]
address = "127.0.0.1:4000"

[replication]
replica_type = "slave"
master_address = "10.0.0.1:3232"
"#
    )
    .unwrap();

    let conf = AppConfig::load(file.path()).unwrap();
    assert_eq!(conf.network.address, "127.0.0.1:4000");
    assert_eq!(conf.network.max_connections, 100);
    assert_eq!(conf.replication.replica_type, ReplicaRole::Slave);
    assert_eq!(conf.wal.flushing_batch_size, 100);
    assert_eq!(conf.engine.partitions_count, 0);
}

#[test]
fn load_rejects_bad_size_strings() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[wal]
max_segment_size = "1gb"
"#
    )
    .unwrap();

    assert!(AppConfig::load(file.path()).is_err());
}

#[test]
fn load_missing_file_is_an_error() {
    assert!(AppConfig::load(std::path::Path::new("/nonexistent/orionkv.toml")).is_err());
}

#[test]
fn replicator_network_config_swaps_only_the_address() {
    let mut conf = AppConfig::default();
    conf.network.address = "127.0.0.1:3223".to_string();
    conf.network.max_connections = 42;
    conf.replication.master_address = "192.168.1.10:3333".to_string();

    let replicator_conf = conf.replicator_network_config();
    assert_eq!(replicator_conf.address, "192.168.1.10:3333");
    assert_eq!(replicator_conf.max_connections, 42);
    assert_eq!(replicator_conf.max_message_size, conf.network.max_message_size);
    // the source network config is untouched
    assert_eq!(conf.network.address, "127.0.0.1:3223");
}

#[test]
fn max_segment_size_is_memoized() {
    let conf = AppConfig::default();
    let first = conf.wal.max_segment_size_bytes().unwrap();
    let second = conf.wal.max_segment_size_bytes().unwrap();
    assert_eq!(first, 1024);
    assert_eq!(first, second);
}

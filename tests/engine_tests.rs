//! Tests for the storage engines

use std::sync::Arc;
use std::thread;

use orionkv::config::EngineConfig;
use orionkv::storage::{from_config, InMemoryEngine, ShardedEngine, StorageEngine};

// =============================================================================
// Direct engine
// =============================================================================

#[test]
fn set_get_del_roundtrip() {
    let engine = InMemoryEngine::with_capacity(10);

    engine.set("q", "1");
    engine.set("w", "2");
    assert_eq!(engine.get("q"), "1");
    assert_eq!(engine.get("w"), "2");

    engine.del("w");
    assert_eq!(engine.get("w"), "");
}

#[test]
fn missing_keys_read_as_empty_string() {
    let engine = InMemoryEngine::with_capacity(0);
    assert_eq!(engine.get("never-written"), "");
}

#[test]
fn set_overwrites_and_is_idempotent() {
    let engine = InMemoryEngine::with_capacity(10);
    engine.set("k", "v1");
    engine.set("k", "v2");
    assert_eq!(engine.get("k"), "v2");

    engine.set("k", "v2");
    assert_eq!(engine.get("k"), "v2");

    // DEL of an absent key is a no-op
    engine.del("gone");
    engine.del("gone");
    assert_eq!(engine.get("gone"), "");
}

// =============================================================================
// Sharded engine
// =============================================================================

#[test]
fn sharded_engine_behaves_like_the_direct_one() {
    let engine = ShardedEngine::new(4, 10);

    for i in 0..100 {
        engine.set(&format!("key{i}"), &format!("value{i}"));
    }
    for i in 0..100 {
        assert_eq!(engine.get(&format!("key{i}")), format!("value{i}"));
    }

    engine.del("key42");
    assert_eq!(engine.get("key42"), "");
    assert_eq!(engine.get("key41"), "value41");
}

#[test]
fn sharded_engine_survives_concurrent_writers() {
    let engine = Arc::new(ShardedEngine::new(8, 100));

    let mut handles = Vec::new();
    for writer in 0..4 {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            for i in 0..250 {
                engine.set(&format!("w{writer}-k{i}"), &format!("{i}"));
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    for writer in 0..4 {
        for i in 0..250 {
            assert_eq!(engine.get(&format!("w{writer}-k{i}")), format!("{i}"));
        }
    }
}

// =============================================================================
// Config-driven selection
// =============================================================================

#[test]
fn from_config_builds_a_working_engine_either_way() {
    let direct_conf = EngineConfig {
        partitions_count: 0,
        ..EngineConfig::default()
    };
    let sharded_conf = EngineConfig {
        partitions_count: 4,
        ..EngineConfig::default()
    };

    for engine in [from_config(&direct_conf), from_config(&sharded_conf)] {
        engine.set("a", "1");
        assert_eq!(engine.get("a"), "1");
        engine.del("a");
        assert_eq!(engine.get("a"), "");
    }
}

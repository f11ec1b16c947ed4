//! Database executor
//!
//! The glue between transport and storage: parses queries, enforces the
//! replica write ban, appends mutations to the WAL, and only then mutates
//! the engine. On startup it replays the WAL to rebuild in-memory state;
//! on a replica it also drives the pull loop that applies the primary's
//! records.

use std::process;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{bounded, tick, Sender};
use crossbeam::select;
use parking_lot::Mutex;

use crate::config::{AppConfig, ReplicaRole};
use crate::error::{OrionError, Result};
use crate::protocol::{clean_query, parse_query, response, Command};
use crate::replication::SlaveReplicator;
use crate::storage::StorageEngine;
use crate::wal::Wal;

/// Query executor for one node
pub struct Database {
    engine: Box<dyn StorageEngine>,
    wal: Arc<Wal>,
    role: ReplicaRole,
    puller: Mutex<Option<PullerHandle>>,
}

struct PullerHandle {
    shutdown_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl Database {
    /// Build the executor: replay the WAL, and on a replica connect to the
    /// primary and start the pull loop.
    ///
    /// A record that fails to parse or execute during replay aborts the
    /// startup; a half-replayed node must not serve traffic.
    pub fn open(
        conf: &AppConfig,
        engine: Box<dyn StorageEngine>,
        wal: Arc<Wal>,
    ) -> Result<Arc<Self>> {
        let database = Arc::new(Self {
            engine,
            wal,
            role: conf.replication.replica_type,
            puller: Mutex::new(None),
        });

        database.load()?;

        if database.role.is_slave() {
            let replicator =
                SlaveReplicator::connect(&conf.replication, Arc::clone(&database.wal))?;
            database.start_puller(replicator, conf.replication.sync_interval()?)?;
        }

        Ok(database)
    }

    /// Rebuild in-memory state from the durable log without re-appending
    fn load(&self) -> Result<()> {
        let mut replayed = 0u64;
        self.wal.for_each(|record| {
            self.execute_query(record, false, true)?;
            replayed += 1;
            Ok(())
        })?;
        if replayed > 0 {
            tracing::info!(records = replayed, "replayed wal");
        }
        Ok(())
    }

    /// Execute one client request and render the textual response.
    ///
    /// Parse and durability failures become their response templates; the
    /// connection stays open either way.
    pub fn execute(&self, request: &[u8]) -> Vec<u8> {
        let raw = String::from_utf8_lossy(request);
        match self.execute_query(&raw, true, false) {
            Ok(resp) => resp.into_bytes(),
            Err(OrionError::Parse(e)) => {
                tracing::debug!(query = %raw.trim(), "cannot parse query: {e}");
                response::CANNOT_PARSE_QUERY.as_bytes().to_vec()
            }
            Err(e) => {
                tracing::error!(query = %raw.trim(), "failed to store command: {e}");
                response::store_error(e).into_bytes()
            }
        }
    }

    /// Parse, persist, and apply one query line.
    ///
    /// `persist` appends mutations to the WAL before the engine sees them;
    /// replay passes false because the records are already durable.
    /// `replicated` lifts the replica write ban for the pull loop and for
    /// replay, the only paths allowed to mutate a replica.
    fn execute_query(&self, raw: &str, persist: bool, replicated: bool) -> Result<String> {
        let cleaned = clean_query(raw);
        let command = parse_query(cleaned)?;

        if command.is_mutating() && self.role.is_slave() && !replicated {
            tracing::debug!(query = cleaned, "rejected mutation on slave");
            return Ok(response::slave_write_error(cleaned));
        }

        if persist && command.is_mutating() {
            self.wal.append(cleaned)?;
        }

        Ok(match command {
            Command::Set { key, value } => {
                self.engine.set(&key, &value);
                response::SUCCESS.to_string()
            }
            Command::Get { key } => response::get_result(&self.engine.get(&key)),
            Command::Del { key } => {
                self.engine.del(&key);
                response::SUCCESS.to_string()
            }
        })
    }

    /// Start the replica pull loop.
    ///
    /// The loop is a single thread, so records apply strictly in the order
    /// the primary returned them. An unrecoverable pull or apply failure
    /// exits the process: a replica must not keep serving reads while
    /// silently diverging.
    fn start_puller(
        self: &Arc<Self>,
        replicator: SlaveReplicator,
        sync_interval: Duration,
    ) -> Result<()> {
        let database = Arc::clone(self);
        let ticker = tick(sync_interval);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

        let handle = std::thread::Builder::new()
            .name("orionkv-replica-sync".to_string())
            .spawn(move || loop {
                select! {
                    recv(ticker) -> _ => database.pull_once(&replicator),
                    recv(shutdown_rx) -> _ => break,
                }
            })
            .map_err(|e| OrionError::Replication(format!("cannot spawn puller: {e}")))?;

        *self.puller.lock() = Some(PullerHandle {
            shutdown_tx,
            handle,
        });
        Ok(())
    }

    fn pull_once(&self, replicator: &SlaveReplicator) {
        let queries = match replicator.fetch_updates() {
            Ok(queries) => queries,
            Err(e) => {
                tracing::error!("replication pull failed, shutting down: {e}");
                process::exit(1);
            }
        };

        if queries.is_empty() {
            return;
        }
        tracing::debug!(count = queries.len(), "applying replicated queries");

        for query in &queries {
            if let Err(e) = self.execute_query(query, true, true) {
                tracing::error!(query = %query, "failed to apply replicated query, shutting down: {e}");
                process::exit(1);
            }
        }
    }

    /// Stop the pull loop and flush and close the WAL
    pub fn shutdown(&self) -> Result<()> {
        if let Some(puller) = self.puller.lock().take() {
            let _ = puller.shutdown_tx.send(());
            let _ = puller.handle.join();
        }
        self.wal.close()
    }
}

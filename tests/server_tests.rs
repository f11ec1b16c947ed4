//! End-to-end tests over the framed TCP transport

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use orionkv::config::AppConfig;
use orionkv::network::{TcpClient, TcpServer};
use orionkv::storage::from_config;
use orionkv::wal::Wal;
use orionkv::Database;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

struct TestServer {
    address: String,
    database: Arc<Database>,
    shutdown: orionkv::network::ShutdownHandle,
    accept_thread: Option<thread::JoinHandle<()>>,
}

fn start_server(dir: &TempDir, max_message_size: &str) -> TestServer {
    let mut conf = AppConfig::default();
    conf.wal.data_directory = dir.path().to_str().unwrap().to_string();
    conf.wal.flushing_batch_size = 1;
    conf.network.address = "127.0.0.1:0".to_string();
    conf.network.max_message_size = max_message_size.to_string();
    conf.network.idle_timeout = "2s".to_string();

    let wal = Arc::new(Wal::open(&conf.wal).unwrap());
    let database = Database::open(&conf, from_config(&conf.engine), wal).unwrap();

    let handler_db = Arc::clone(&database);
    let server = TcpServer::bind(
        &conf.network,
        Arc::new(move |request: &[u8]| handler_db.execute(request)),
    )
    .unwrap();

    let address = server.local_addr().unwrap().to_string();
    let shutdown = server.shutdown_handle();
    let accept_thread = thread::spawn(move || {
        server.run().unwrap();
    });

    TestServer {
        address,
        database,
        shutdown,
        accept_thread: Some(accept_thread),
    }
}

impl TestServer {
    fn query(&self, client: &mut TcpClient, query: &str) -> String {
        String::from_utf8(client.execute(query.as_bytes()).unwrap()).unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.shutdown();
        if let Some(handle) = self.accept_thread.take() {
            let _ = handle.join();
        }
        let _ = self.database.shutdown();
    }
}

// =============================================================================
// Request/response over the wire
// =============================================================================

#[test]
fn crud_over_tcp() {
    let dir = TempDir::new().unwrap();
    let server = start_server(&dir, "4kb");
    let mut client = TcpClient::connect(&server.address).unwrap();

    assert_eq!(server.query(&mut client, "SET q 1"), "[success]");
    assert_eq!(server.query(&mut client, "SET w 2"), "[success]");
    assert_eq!(server.query(&mut client, "GET q"), "[success] 1");
    assert_eq!(server.query(&mut client, "GET w"), "[success] 2");
    assert_eq!(server.query(&mut client, "DEL w"), "[success]");
    assert_eq!(server.query(&mut client, "GET w"), "[success] ");

    client.disconnect().unwrap();
}

#[test]
fn parse_errors_keep_the_connection_open() {
    let dir = TempDir::new().unwrap();
    let server = start_server(&dir, "4kb");
    let mut client = TcpClient::connect(&server.address).unwrap();

    assert_eq!(
        server.query(&mut client, "BOGUS one two"),
        "[error] cannot parse query"
    );
    // same connection, next request still served
    assert_eq!(server.query(&mut client, "SET a 1"), "[success]");
    assert_eq!(server.query(&mut client, "GET a"), "[success] 1");

    client.disconnect().unwrap();
}

#[test]
fn oversized_frames_terminate_the_connection() {
    let dir = TempDir::new().unwrap();
    let server = start_server(&dir, "64b");
    let mut client = TcpClient::connect(&server.address).unwrap();

    let huge = format!("SET key {}", "x".repeat(200));
    assert!(client.execute(huge.as_bytes()).is_err());

    // a fresh connection works fine
    let mut client = TcpClient::connect(&server.address).unwrap();
    assert_eq!(server.query(&mut client, "SET a 1"), "[success]");
    client.disconnect().unwrap();
}

#[test]
fn concurrent_clients_see_consistent_state() {
    let dir = TempDir::new().unwrap();
    let server = Arc::new(start_server(&dir, "4kb"));

    let mut handles = Vec::new();
    for writer in 0..4 {
        let address = server.address.clone();
        handles.push(thread::spawn(move || {
            let mut client = TcpClient::connect(&address).unwrap();
            for i in 0..50 {
                let response = client
                    .execute(format!("SET w{writer}-k{i} {i}").as_bytes())
                    .unwrap();
                assert_eq!(response, b"[success]");
            }
            client.disconnect().unwrap();
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let mut client = TcpClient::connect(&server.address).unwrap();
    for writer in 0..4 {
        for i in 0..50 {
            assert_eq!(
                server.query(&mut client, &format!("GET w{writer}-k{i}")),
                format!("[success] {i}")
            );
        }
    }
    client.disconnect().unwrap();
}

#[test]
fn idle_connections_are_closed_by_the_read_deadline() {
    let dir = TempDir::new().unwrap();
    let server = start_server(&dir, "4kb");
    let mut client = TcpClient::connect(&server.address).unwrap();

    assert_eq!(server.query(&mut client, "SET a 1"), "[success]");

    // outlive the 2s idle timeout, then watch the request fail
    thread::sleep(Duration::from_secs(3));
    assert!(client.execute(b"GET a").is_err());
}

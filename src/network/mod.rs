//! Framed TCP transport
//!
//! Every message in either direction, replication included, is a frame: a
//! 4-byte big-endian unsigned length followed by exactly that many payload
//! bytes. The server bounds concurrency with a counting semaphore and the
//! client keeps one persistent connection.

mod client;
mod frame;
mod semaphore;
mod server;

pub use client::TcpClient;
pub use frame::{read_frame, write_frame};
pub use semaphore::{Semaphore, SemaphorePermit};
pub use server::{RequestHandler, ShutdownHandle, TcpServer};

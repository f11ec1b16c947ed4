//! OrionKV CLI Client
//!
//! Interactive line client: reads queries from stdin, sends each as one
//! framed request, and prints the textual response. The server makes no
//! assumptions about client quality, so there is no validation here;
//! malformed queries simply come back as parse errors.

use std::io::{self, BufRead, Write};
use std::process;

use clap::Parser;

use orionkv::network::TcpClient;

/// OrionKV CLI
#[derive(Parser, Debug)]
#[command(name = "orionkv-cli")]
#[command(about = "Interactive client for OrionKV")]
#[command(version)]
struct Args {
    /// Server address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:3223")]
    address: String,
}

fn main() {
    let args = Args::parse();

    let mut client = match TcpClient::connect(&args.address) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("failed to connect to {}: {e}", args.address);
            process::exit(1);
        }
    };

    let stdin = io::stdin();
    let mut query = String::new();

    loop {
        print!("> ");
        let _ = io::stdout().flush();

        query.clear();
        match stdin.lock().read_line(&mut query) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("cannot read query: {e}");
                break;
            }
        }

        if query.trim().is_empty() {
            continue;
        }

        match client.execute(query.as_bytes()) {
            Ok(response) => println!("{}", String::from_utf8_lossy(&response)),
            Err(e) => {
                eprintln!("cannot execute query: {e}");
                process::exit(1);
            }
        }
    }

    if let Err(e) = client.disconnect() {
        eprintln!("error on disconnect: {e}");
    }
}

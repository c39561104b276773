//! Network request listener
//!
//! A small line-oriented JSON server that lets other lab machines push
//! shot files into the dashboard and query the accumulated table. One
//! JSON value per line per connection. Recognised requests:
//!
//! - `"hello"` - liveness check, echoed back
//! - `"get dataframe"` - responds with a snapshot of the current table
//! - `{"filepath": <path>}` - translates the path to a local one and
//!   queues it as a one-element ingestion batch
//!
//! The listener only ever touches the table through the snapshot read
//! and the queue handle, so it never contends with the UI thread's
//! single-writer discipline. Enqueueing is unbounded: a paused or slow
//! dashboard never causes this thread to block or refuse requests.

use crate::config::PathsConfig;
use crate::error::Result;
use crate::ingest::{IngestRequest, QueueHandle};
use crate::table::{get_dataframe, SharedTable};
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};

/// The request listener. Owns the TCP socket and the handles it needs
/// to serve requests.
pub struct RequestListener {
    listener: TcpListener,
    table: SharedTable,
    queue: QueueHandle,
    paths: PathsConfig,
}

impl RequestListener {
    /// Bind the listener on the configured port.
    pub fn bind(
        port: u16,
        table: SharedTable,
        queue: QueueHandle,
        paths: PathsConfig,
    ) -> Result<Self> {
        let listener = TcpListener::bind(("0.0.0.0", port))?;
        tracing::info!(port, "request listener bound");
        Ok(RequestListener {
            listener,
            table,
            queue,
            paths,
        })
    }

    /// Accept connections until the socket is closed. Each connection is
    /// served inline; requests are short-lived and rare.
    pub fn run(&self) {
        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Err(e) = self.serve(stream) {
                        tracing::warn!(error = %e, "request connection failed");
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                }
            }
        }
    }

    /// Spawn the listener on a dedicated thread.
    pub fn spawn(self) -> std::thread::JoinHandle<()> {
        std::thread::Builder::new()
            .name("shot-listener".to_string())
            .spawn(move || self.run())
            .expect("failed to spawn request listener")
    }

    fn serve(&self, stream: TcpStream) -> Result<()> {
        let mut reader = BufReader::new(stream.try_clone()?);
        let mut writer = stream;
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Ok(());
            }
            if line.trim().is_empty() {
                continue;
            }
            let request: serde_json::Value = match serde_json::from_str(line.trim()) {
                Ok(value) => value,
                Err(_) => serde_json::Value::String(line.trim().to_string()),
            };
            let response = self.handle(&request);
            serde_json::to_writer(&mut writer, &response)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
    }

    /// Dispatch one request to a response.
    fn handle(&self, request: &serde_json::Value) -> serde_json::Value {
        tracing::info!(request = %request, "listener request");
        match request {
            serde_json::Value::String(s) if s == "hello" => {
                serde_json::Value::String("hello".to_string())
            }
            serde_json::Value::String(s) if s == "get dataframe" => {
                get_dataframe(&self.table).to_json()
            }
            serde_json::Value::Object(map) => match map.get("filepath").and_then(|v| v.as_str()) {
                Some(filepath) => {
                    let local = self.paths.path_to_local(filepath);
                    match self.queue.enqueue(IngestRequest::add_one(local)) {
                        Ok(()) => serde_json::Value::String("added successfully".to_string()),
                        Err(e) => serde_json::Value::String(format!("error: {e}")),
                    }
                }
                None => unsupported(),
            },
            _ => unsupported(),
        }
    }
}

fn unsupported() -> serde_json::Value {
    serde_json::Value::String(
        "error: operation not supported. Recognised requests are:\n \
         'get dataframe'\n 'hello'\n {'filepath': <some_shot_filepath>}"
            .to_string(),
    )
}

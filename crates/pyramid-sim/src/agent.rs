//! Reader agent server
//!
//! Serves the newline-delimited JSON reader protocol over TCP, backed by a
//! shared [`SimulatedReader`]. Connections are handled one at a time.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use pyramid_core::agent::protocol::{ReaderResponse, Request, Response};

use crate::reader::SimulatedReader;

/// Agent server that accepts reader commands over TCP
pub struct ReaderAgent {
    listener: TcpListener,
    reader: Arc<Mutex<SimulatedReader>>,
    running: Arc<AtomicBool>,
}

impl ReaderAgent {
    /// Bind the listening socket.
    pub fn bind<A: ToSocketAddrs>(addr: A, reader: SimulatedReader) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        Ok(Self {
            listener,
            reader: Arc::new(Mutex::new(reader)),
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Shared handle to the simulated reader, for inspection and fault
    /// injection while the agent runs.
    pub fn reader(&self) -> Arc<Mutex<SimulatedReader>> {
        Arc::clone(&self.reader)
    }

    /// Run the accept loop (blocking) until [`stop`](Self::stop) is called.
    pub fn run(&self) -> io::Result<()> {
        self.running.store(true, Ordering::SeqCst);
        tracing::info!(addr = ?self.listener.local_addr().ok(), "reader agent listening");

        while self.running.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    tracing::info!(%peer, "connection opened");
                    if let Err(e) = self.handle_connection(stream) {
                        tracing::warn!(%peer, error = %e, "connection error");
                    }
                    tracing::info!(%peer, "connection closed");
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    std::thread::sleep(Duration::from_millis(20));
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }

        Ok(())
    }

    /// Stop the server after the current connection ends.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn lock_reader(&self) -> MutexGuard<'_, SimulatedReader> {
        self.reader
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn handle_connection(&self, mut stream: TcpStream) -> io::Result<()> {
        // The accepted socket inherits non-blocking mode on some platforms.
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(Duration::from_secs(30)))?;
        stream.set_write_timeout(Some(Duration::from_secs(10)))?;
        stream.set_nodelay(true)?;

        let reader = BufReader::new(stream.try_clone()?);

        for line in reader.lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            if line.trim().is_empty() {
                continue;
            }
            tracing::trace!(%line, "received");

            let responses = match Request::from_line(&line) {
                Ok(request) => self.lock_reader().exchange(&request),
                // No usable sequence number; 0 is never issued, so clients
                // treat this as stale.
                Err(e) => vec![Response {
                    seq: 0,
                    response: ReaderResponse::Error {
                        message: format!("Invalid command: {}", e),
                        code: Some(400),
                    },
                }],
            };

            for response in responses {
                let json = response.to_line().unwrap_or_else(|_| {
                    r#"{"seq":0,"status":"error","message":"Serialization failed"}"#.to_string()
                });
                writeln!(stream, "{}", json)?;
            }
            stream.flush()?;
        }

        Ok(())
    }
}

//! Agent client for talking to a reader agent over TCP
//!
//! Used by the CLI to drive a reader that is attached to another process
//! (or another machine).

use std::io::{self, BufRead, BufReader, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use super::protocol::{ReaderCommand, ReaderResponse, Request, Response};
use crate::device::{DeviceChannel, SequenceCounter};
use crate::error::{DeviceError, DeviceResult};

/// Client for communicating with a reader agent
pub struct AgentClient {
    stream: TcpStream,
    reader: BufReader<TcpStream>,
    peer: String,
    seq: SequenceCounter,
    /// Partial line carried across read timeouts
    pending: String,
}

impl AgentClient {
    /// Connect to an agent at the given address
    pub fn connect<A: ToSocketAddrs>(addr: A, connect_timeout: Duration) -> DeviceResult<Self> {
        let mut last_err = None;
        for sock_addr in addr.to_socket_addrs()? {
            match TcpStream::connect_timeout(&sock_addr, connect_timeout) {
                Ok(stream) => return Self::from_stream(stream, sock_addr),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err
            .map(DeviceError::Io)
            .unwrap_or_else(|| DeviceError::Protocol("address resolved to nothing".to_string())))
    }

    fn from_stream(stream: TcpStream, peer: SocketAddr) -> DeviceResult<Self> {
        stream.set_nodelay(true)?;
        stream.set_write_timeout(Some(Duration::from_secs(10)))?;
        let reader = BufReader::new(stream.try_clone()?);

        tracing::debug!(%peer, "connected to reader agent");
        Ok(Self {
            stream,
            reader,
            peer: peer.to_string(),
            seq: SequenceCounter::new(),
            pending: String::new(),
        })
    }

    /// Address of the agent
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Shut the connection down.
    pub fn close(self) -> DeviceResult<()> {
        tracing::debug!(peer = %self.peer, "closing reader agent connection");
        match self.stream.shutdown(Shutdown::Both) {
            Err(e) if e.kind() != io::ErrorKind::NotConnected => Err(e.into()),
            _ => Ok(()),
        }
    }

    /// Take the buffered line if it is complete.
    fn take_line(&mut self) -> Option<String> {
        if self.pending.ends_with('\n') {
            Some(std::mem::take(&mut self.pending))
        } else {
            None
        }
    }
}

impl DeviceChannel for AgentClient {
    fn name(&self) -> &str {
        &self.peer
    }

    fn clear(&mut self) -> DeviceResult<usize> {
        self.stream.set_nonblocking(true)?;
        let mut dropped = 0;
        let result = loop {
            match self.reader.read_line(&mut self.pending) {
                Ok(0) => break Err(DeviceError::Disconnected),
                Ok(_) => {
                    // An unfinished line stays buffered and is dropped as
                    // stale once the rest of it arrives.
                    if self.take_line().is_some() {
                        dropped += 1;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break Ok(dropped),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => break Err(DeviceError::Io(e)),
            }
        };
        self.stream.set_nonblocking(false)?;

        if let Ok(n) = result {
            if n > 0 {
                tracing::debug!(dropped = n, "cleared stale responses");
            }
        }
        result
    }

    fn send(&mut self, command: &ReaderCommand) -> DeviceResult<u32> {
        let seq = self.seq.next_seq();
        let line = Request {
            seq,
            command: command.clone(),
        }
        .to_line()?;

        writeln!(self.stream, "{}", line)?;
        self.stream.flush()?;

        tracing::trace!(seq, cmd = command.name(), "sent request");
        Ok(seq)
    }

    fn wait_for_response(&mut self, seq: u32, timeout: Duration) -> DeviceResult<ReaderResponse> {
        let deadline = Instant::now() + timeout;
        loop {
            let now = Instant::now();
            if now >= deadline {
                return Err(DeviceError::Timeout { seq, timeout });
            }
            self.stream.set_read_timeout(Some(deadline - now))?;

            match self.reader.read_line(&mut self.pending) {
                Ok(0) => return Err(DeviceError::Disconnected),
                Ok(_) => {}
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    return Err(DeviceError::Timeout { seq, timeout });
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }

            let Some(line) = self.take_line() else {
                continue;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let response = Response::from_line(line)?;
            if response.seq != seq {
                tracing::debug!(
                    expected = seq,
                    got = response.seq,
                    "discarding stale response"
                );
                continue;
            }
            return Ok(response.response);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    /// Agent stand-in that answers each request with the canned lines
    /// produced by `reply`.
    fn spawn_agent<F>(reply: F) -> SocketAddr
    where
        F: Fn(Request) -> Vec<String> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut writer = stream.try_clone().unwrap();
            for line in BufReader::new(stream).lines() {
                let Ok(line) = line else { break };
                let request = Request::from_line(&line).unwrap();
                for out in reply(request) {
                    writeln!(writer, "{}", out).unwrap();
                }
                writer.flush().unwrap();
            }
        });
        addr
    }

    fn ack(seq: u32) -> String {
        Response {
            seq,
            response: ReaderResponse::Ack,
        }
        .to_line()
        .unwrap()
    }

    #[test]
    fn test_transact_ack() {
        let addr = spawn_agent(|req| vec![ack(req.seq)]);
        let mut client = AgentClient::connect(addr, Duration::from_secs(1)).unwrap();
        let resp = client
            .transact(
                &ReaderCommand::WriteBlock { data: 1, block: 0 },
                Duration::from_secs(1),
            )
            .unwrap();
        assert_eq!(resp, ReaderResponse::Ack);
        client.close().unwrap();
    }

    #[test]
    fn test_stale_response_skipped() {
        // A leftover ack for an older request precedes the real one.
        let addr = spawn_agent(|req| vec![ack(req.seq + 100), ack(req.seq)]);
        let mut client = AgentClient::connect(addr, Duration::from_secs(1)).unwrap();
        let seq = client.send(&ReaderCommand::DemodPyramid).unwrap();
        let resp = client.wait_for_response(seq, Duration::from_secs(1)).unwrap();
        assert_eq!(resp, ReaderResponse::Ack);
    }

    #[test]
    fn test_silence_times_out() {
        let addr = spawn_agent(|_| Vec::new());
        let mut client = AgentClient::connect(addr, Duration::from_secs(1)).unwrap();
        let seq = client
            .send(&ReaderCommand::WriteBlock { data: 0, block: 2 })
            .unwrap();
        let err = client
            .wait_for_response(seq, Duration::from_millis(50))
            .unwrap_err();
        assert!(matches!(err, DeviceError::Timeout { seq: s, .. } if s == seq));
    }

    #[test]
    fn test_clear_drops_queued_lines() {
        // Every request triggers one real and two unsolicited responses.
        let addr = spawn_agent(|req| vec![ack(req.seq), ack(900), ack(901)]);
        let mut client = AgentClient::connect(addr, Duration::from_secs(1)).unwrap();
        client
            .transact(&ReaderCommand::DemodPyramid, Duration::from_secs(1))
            .unwrap();
        // Give the extra lines time to land.
        thread::sleep(Duration::from_millis(100));
        assert_eq!(client.clear().unwrap(), 2);
        assert_eq!(client.clear().unwrap(), 0);
    }

    #[test]
    fn test_rejected_response() {
        let addr = spawn_agent(|req| {
            vec![Response {
                seq: req.seq,
                response: ReaderResponse::Error {
                    message: "block out of range".into(),
                    code: Some(400),
                },
            }
            .to_line()
            .unwrap()]
        });
        let mut client = AgentClient::connect(addr, Duration::from_secs(1)).unwrap();
        let err = client
            .transact(
                &ReaderCommand::WriteBlock { data: 0, block: 9 },
                Duration::from_secs(1),
            )
            .unwrap_err();
        assert!(matches!(err, DeviceError::Rejected { .. }));
    }
}

//! In-process fake daemon for engine tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::{JoinHandle, JoinSet};

use super::client::ClientSettings;

pub const GREETING: &[u8] = b"OK MPD 0.23.5\n";

/// What the fake daemon does after receiving a command.
pub enum Reply {
    Send(Vec<u8>),
    /// Write each chunk separately with a short pause in between.
    Chunked(Vec<Vec<u8>>),
    /// Drop the connection without answering.
    Hangup,
}

impl Reply {
    /// `body` followed by a bare `OK`.
    pub fn ok(body: &str) -> Self {
        Reply::Send(format!("{}OK\n", body).into_bytes())
    }

    pub fn raw(text: &str) -> Self {
        Reply::Send(text.as_bytes().to_vec())
    }
}

/// Settings that keep keepalive out of the way and make reconnects fast.
pub fn fast_settings() -> ClientSettings {
    ClientSettings {
        connect_timeout: Duration::from_secs(1),
        io_timeout: Duration::from_secs(2),
        keepalive_interval: Duration::from_secs(60),
        idle_timeout: Duration::from_secs(60),
        reconnect_delay: Duration::from_millis(10),
    }
}

type Handler = Arc<dyn Fn(&str) -> Reply + Send + Sync>;

pub struct FakeDaemon {
    address: String,
    connections: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<u8>>>,
    task: JoinHandle<()>,
}

impl FakeDaemon {
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&str) -> Reply + Send + Sync + 'static,
    {
        Self::spawn(Arc::new(handler), usize::MAX).await
    }

    /// Only the first `greetings` connections are served; later ones are
    /// accepted and dropped straight away.
    pub async fn start_limited<F>(handler: F, greetings: usize) -> Self
    where
        F: Fn(&str) -> Reply + Send + Sync + 'static,
    {
        Self::spawn(Arc::new(handler), greetings).await
    }

    async fn spawn(handler: Handler, greetings: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake daemon");
        let address = listener.local_addr().expect("local addr").to_string();
        let connections = Arc::new(AtomicUsize::new(0));
        let received = Arc::new(Mutex::new(Vec::new()));

        let task = {
            let connections = connections.clone();
            let received = received.clone();
            tokio::spawn(async move {
                let mut served = JoinSet::new();
                loop {
                    let Ok((stream, _)) = listener.accept().await else {
                        break;
                    };
                    let count = connections.fetch_add(1, Ordering::SeqCst) + 1;
                    if count > greetings {
                        drop(stream);
                        continue;
                    }
                    served.spawn(serve(stream, handler.clone(), received.clone()));
                }
            })
        };

        Self {
            address,
            connections,
            received,
            task,
        }
    }

    pub fn address(&self) -> String {
        self.address.clone()
    }

    /// Number of accepted TCP connections.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// All received bytes, split into lines.
    pub fn received_lines(&self) -> Vec<String> {
        let bytes = self.received.lock().expect("received lock").clone();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Drop for FakeDaemon {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(stream: TcpStream, handler: Handler, received: Arc<Mutex<Vec<u8>>>) {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    if writer.write_all(GREETING).await.is_err() {
        return;
    }

    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        received.lock().expect("received lock").extend_from_slice(&line);

        let command = String::from_utf8_lossy(&line).trim_end().to_string();
        match handler(&command) {
            Reply::Send(bytes) => {
                if writer.write_all(&bytes).await.is_err() {
                    return;
                }
            }
            Reply::Chunked(chunks) => {
                for chunk in chunks {
                    if writer.write_all(&chunk).await.is_err() {
                        return;
                    }
                    let _ = writer.flush().await;
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
            Reply::Hangup => return,
        }
    }
}

//! Loopback handshake server.
//!
//! Each accepted connection reads one upgrade request, answers according to
//! the configured [`Behavior`], echoes any further bytes until the client
//! closes, and then reports what it saw.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use wsdial::compute_accept_key;

/// How the server answers the upgrade request.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Correct 101 response.
    Accept,
    /// Correct 101 response selecting a subprotocol.
    AcceptProtocol(&'static str),
    /// 101 response whose accept value was derived from another key.
    WrongAccept,
    /// Plain HTTP response with the given status.
    Status(u16),
    /// Read the request and never answer.
    Silent,
}

/// What the server observed on one connection.
#[derive(Debug, Clone)]
pub struct Observed {
    /// Raw request head.
    pub request: String,
    /// `true` if the client closed its side cleanly.
    pub peer_closed: bool,
}

impl Observed {
    /// Value of a request header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<String> {
        self.request.lines().find_map(|line| {
            let (n, v) = line.split_once(':')?;
            n.trim()
                .eq_ignore_ascii_case(name)
                .then(|| v.trim().to_string())
        })
    }
}

pub struct TestServer {
    handle: JoinHandle<()>,
    accepted: Arc<AtomicUsize>,
    observed: Mutex<mpsc::UnboundedReceiver<Observed>>,
}

impl TestServer {
    /// Bind to an ephemeral loopback port and start serving.
    pub async fn spawn(behavior: Behavior) -> (Self, SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::unbounded_channel();

        let counter = accepted.clone();
        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                let behavior = behavior.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    if let Some(observed) = serve(stream, behavior).await {
                        let _ = tx.send(observed);
                    }
                });
            }
        });

        let server = Self {
            handle,
            accepted,
            observed: Mutex::new(rx),
        };
        (server, addr)
    }

    /// Number of TCP connections accepted so far.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Wait for the next finished connection.
    pub async fn next_observed(&self) -> Observed {
        let mut rx = self.observed.lock().await;
        tokio::time::timeout(std::time::Duration::from_secs(10), rx.recv())
            .await
            .expect("server observation timed out")
            .expect("server stopped")
    }

    pub async fn shutdown(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }
}

async fn serve(stream: TcpStream, behavior: Behavior) -> Option<Observed> {
    let mut reader = BufReader::new(stream);
    let mut request = String::new();
    loop {
        let n = reader.read_line(&mut request).await.ok()?;
        if n == 0 {
            return None;
        }
        if request.ends_with("\r\n\r\n") {
            break;
        }
    }

    let key = request
        .lines()
        .find_map(|line| {
            let (n, v) = line.split_once(':')?;
            n.trim()
                .eq_ignore_ascii_case("sec-websocket-key")
                .then(|| v.trim().to_string())
        })
        .unwrap_or_default();

    let response = match behavior {
        Behavior::Accept => upgrade_response(&compute_accept_key(&key), None),
        Behavior::AcceptProtocol(proto) => {
            upgrade_response(&compute_accept_key(&key), Some(proto))
        }
        Behavior::WrongAccept => {
            upgrade_response(&compute_accept_key("AQIDBAUGBwgJCgsMDQ4PEA=="), None)
        }
        Behavior::Status(status) => format!(
            "HTTP/1.1 {} Nope\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            status
        ),
        Behavior::Silent => String::new(),
    };

    let mut stream = reader;
    if !response.is_empty() && stream.write_all(response.as_bytes()).await.is_err() {
        return Some(Observed {
            request,
            peer_closed: false,
        });
    }

    // Echo until the client goes away.
    let mut buf = [0u8; 1024];
    let peer_closed = loop {
        match stream.read(&mut buf).await {
            Ok(0) => break true,
            Ok(n) => {
                if stream.write_all(&buf[..n]).await.is_err() {
                    break false;
                }
            }
            Err(_) => break false,
        }
    };

    Some(Observed {
        request,
        peer_closed,
    })
}

fn upgrade_response(accept: &str, protocol: Option<&str>) -> String {
    let mut response = format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n",
        accept
    );
    if let Some(proto) = protocol {
        response.push_str(&format!("Sec-WebSocket-Protocol: {}\r\n", proto));
    }
    response.push_str("\r\n");
    response
}

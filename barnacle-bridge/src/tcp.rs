//! TCP transport to the kiosk shell
//!
//! The Android shell listens on a local port and speaks line-delimited
//! JSON: one request or reply per line, plus unsolicited event lines for
//! the barcode scanner. A `hello` handshake announces this client and the
//! shell answers with the function names it exposes; that reply is the
//! capability probe everything downstream routes on.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{broadcast, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::bridge::KioskBridge;
use crate::capability::{
    BridgeCapabilities, FN_OPEN_CASHBOX, FN_PRINT_IMAGE, FN_PRINT_TICKET, FN_START_SCANNER,
};
use crate::error::{BridgeError, BridgeResult};

use async_trait::async_trait;

const HELLO_OP: &str = "hello";
const SCAN_EVENT: &str = "barcodeScanned";

/// One request line sent to the shell.
#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    id: Uuid,
    op: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a str>,
}

/// Handshake line announcing this client.
#[derive(Debug, Serialize)]
struct WireHello<'a> {
    op: &'a str,
    client: &'a str,
    version: &'a str,
}

/// Any line received from the shell.
///
/// Replies carry `id` and `ok`; events carry `event`. One permissive
/// struct keeps the reader loop to a single parse.
#[derive(Debug, Deserialize)]
struct WireInbound {
    #[serde(default)]
    id: Option<Uuid>,
    #[serde(default)]
    ok: Option<bool>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    capabilities: Option<Vec<String>>,
}

#[derive(Debug)]
struct WireReply {
    ok: bool,
    error: Option<String>,
}

type PendingMap = Arc<Mutex<HashMap<Uuid, oneshot::Sender<WireReply>>>>;

/// Kiosk bridge over a local TCP connection.
///
/// Holds the write half directly; a background task owns the read half,
/// routes replies to their pending requests and fans scanner events out on
/// a broadcast channel. Dropping the bridge stops the reader task.
#[derive(Debug)]
pub struct TcpBridge {
    writer: Arc<tokio::sync::Mutex<OwnedWriteHalf>>,
    capabilities: BridgeCapabilities,
    pending: PendingMap,
    scan_tx: broadcast::Sender<String>,
    request_timeout: Duration,
    shutdown: CancellationToken,
}

impl TcpBridge {
    /// Connect to a kiosk shell with the default 5 second connect timeout.
    pub async fn connect(addr: &str, client_name: &str) -> BridgeResult<Self> {
        Self::connect_with_timeout(addr, client_name, Duration::from_secs(5)).await
    }

    /// Connect to a kiosk shell and complete the capability handshake.
    pub async fn connect_with_timeout(
        addr: &str,
        client_name: &str,
        connect_timeout: Duration,
    ) -> BridgeResult<Self> {
        info!(addr = %addr, "Connecting to kiosk shell");

        let stream = tokio::time::timeout(connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| BridgeError::Timeout(format!("Connection timeout: {}", addr)))?
            .map_err(|e| BridgeError::Connection(format!("{}: {}", addr, e)))?;

        let (read_half, mut write_half) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();

        let hello = WireHello {
            op: HELLO_OP,
            client: client_name,
            version: env!("CARGO_PKG_VERSION"),
        };
        write_line(&mut write_half, &hello).await?;

        let reply = tokio::time::timeout(connect_timeout, lines.next_line())
            .await
            .map_err(|_| BridgeError::Timeout("Handshake timeout".to_string()))?
            .map_err(BridgeError::Io)?
            .ok_or(BridgeError::Closed)?;

        let inbound: WireInbound = serde_json::from_str(&reply)
            .map_err(|e| BridgeError::Protocol(format!("Bad handshake reply: {}", e)))?;

        if inbound.ok != Some(true) {
            return Err(BridgeError::Protocol(
                "Shell rejected handshake".to_string(),
            ));
        }

        let names = inbound.capabilities.unwrap_or_default();
        let capabilities = BridgeCapabilities::from_names(names.iter().map(String::as_str));

        info!(
            print_image = capabilities.print_image,
            print_ticket = capabilities.print_ticket,
            open_cashbox = capabilities.open_cashbox,
            scanner = capabilities.scanner,
            "Kiosk shell connected"
        );

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (scan_tx, _) = broadcast::channel(64);
        let shutdown = CancellationToken::new();

        spawn_reader(lines, pending.clone(), scan_tx.clone(), shutdown.clone());

        Ok(Self {
            writer: Arc::new(tokio::sync::Mutex::new(write_half)),
            capabilities,
            pending,
            scan_tx,
            request_timeout: Duration::from_secs(10),
            shutdown,
        })
    }

    /// Set the per-request reply timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Send one request and wait for the shell's reply.
    #[instrument(skip(self, data))]
    async fn call(&self, op: &'static str, data: Option<&str>) -> BridgeResult<()> {
        let id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();

        {
            let mut pending = self.pending.lock().unwrap();
            pending.insert(id, tx);
        }

        let request = WireRequest { id, op, data };
        {
            let mut writer = self.writer.lock().await;
            if let Err(e) = write_line(&mut writer, &request).await {
                // Cleanup on send failure
                self.pending.lock().unwrap().remove(&id);
                return Err(e);
            }
        }

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(reply)) if reply.ok => {
                debug!(id = %id, "Shell acknowledged");
                Ok(())
            }
            Ok(Ok(reply)) => Err(BridgeError::Call {
                name: op.to_string(),
                message: reply
                    .error
                    .unwrap_or_else(|| "unspecified failure".to_string()),
            }),
            Ok(Err(_)) => Err(BridgeError::Closed),
            Err(_) => {
                // Timeout cleanup
                self.pending.lock().unwrap().remove(&id);
                Err(BridgeError::Timeout(format!("{} reply timed out", op)))
            }
        }
    }
}

#[async_trait]
impl KioskBridge for TcpBridge {
    fn capabilities(&self) -> BridgeCapabilities {
        self.capabilities
    }

    async fn print_image(&self, base64_jpeg: &str) -> BridgeResult<()> {
        if !self.capabilities.print_image {
            return Err(BridgeError::Unsupported(FN_PRINT_IMAGE));
        }
        self.call(FN_PRINT_IMAGE, Some(base64_jpeg)).await
    }

    async fn print_ticket(&self, content: &str) -> BridgeResult<()> {
        if !self.capabilities.print_ticket {
            return Err(BridgeError::Unsupported(FN_PRINT_TICKET));
        }
        self.call(FN_PRINT_TICKET, Some(content)).await
    }

    async fn open_cashbox(&self) -> BridgeResult<()> {
        if !self.capabilities.open_cashbox {
            return Err(BridgeError::Unsupported(FN_OPEN_CASHBOX));
        }
        self.call(FN_OPEN_CASHBOX, None).await
    }

    async fn start_scanner(&self) -> BridgeResult<()> {
        if !self.capabilities.scanner {
            return Err(BridgeError::Unsupported(FN_START_SCANNER));
        }
        self.call(FN_START_SCANNER, None).await
    }

    fn subscribe_scans(&self) -> broadcast::Receiver<String> {
        self.scan_tx.subscribe()
    }
}

impl Drop for TcpBridge {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Serialize a message and send it as one line.
async fn write_line<T: Serialize>(
    writer: &mut OwnedWriteHalf,
    message: &T,
) -> BridgeResult<()> {
    let mut line =
        serde_json::to_string(message).map_err(|e| BridgeError::Protocol(e.to_string()))?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Background reader: routes replies to pending requests, fans out events.
fn spawn_reader(
    mut lines: Lines<BufReader<OwnedReadHalf>>,
    pending: PendingMap,
    scan_tx: broadcast::Sender<String>,
    shutdown: CancellationToken,
) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("Bridge reader stopped");
                    break;
                }
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => dispatch_line(&line, &pending, &scan_tx),
                        Ok(None) => {
                            warn!("Kiosk shell closed the connection");
                            break;
                        }
                        Err(e) => {
                            error!(error = %e, "Bridge read error");
                            break;
                        }
                    }
                }
            }
        }

        // Dropping the senders wakes every in-flight call with a
        // closed-channel error.
        pending.lock().unwrap().clear();
    });
}

/// Handle one inbound line.
fn dispatch_line(line: &str, pending: &PendingMap, scan_tx: &broadcast::Sender<String>) {
    let inbound: WireInbound = match serde_json::from_str(line) {
        Ok(msg) => msg,
        Err(e) => {
            warn!(error = %e, "Ignoring unparseable line from shell");
            return;
        }
    };

    if let Some(id) = inbound.id {
        let reply = WireReply {
            ok: inbound.ok.unwrap_or(false),
            error: inbound.error,
        };
        let mut pending = pending.lock().unwrap();
        if let Some(tx) = pending.remove(&id) {
            let _ = tx.send(reply);
        } else {
            debug!(id = %id, "Reply for unknown request");
        }
        return;
    }

    if let Some(event) = inbound.event {
        match event.as_str() {
            SCAN_EVENT => {
                let code = inbound.data.unwrap_or_default();
                debug!(code = %code, "Barcode scanned");
                if scan_tx.send(code).is_err() {
                    debug!("No subscribers for scan event");
                }
            }
            other => debug!(event = %other, "Ignoring unknown shell event"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let id = Uuid::new_v4();
        let request = WireRequest {
            id,
            op: FN_PRINT_TICKET,
            data: Some("<div>hi</div>"),
        };
        let line = serde_json::to_string(&request).unwrap();
        assert!(line.contains("\"op\":\"printTicket\""));
        assert!(line.contains(&id.to_string()));
    }

    #[test]
    fn test_request_without_data_omits_field() {
        let request = WireRequest {
            id: Uuid::new_v4(),
            op: FN_OPEN_CASHBOX,
            data: None,
        };
        let line = serde_json::to_string(&request).unwrap();
        assert!(!line.contains("\"data\""));
    }

    #[test]
    fn test_dispatch_reply_resolves_pending() {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (scan_tx, _) = broadcast::channel(8);

        let id = Uuid::new_v4();
        let (tx, mut rx) = oneshot::channel();
        pending.lock().unwrap().insert(id, tx);

        let line = format!("{{\"id\":\"{}\",\"ok\":false,\"error\":\"paper out\"}}", id);
        dispatch_line(&line, &pending, &scan_tx);

        let reply = rx.try_recv().unwrap();
        assert!(!reply.ok);
        assert_eq!(reply.error.as_deref(), Some("paper out"));
        assert!(pending.lock().unwrap().is_empty());
    }

    #[test]
    fn test_dispatch_scan_event_broadcasts() {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (scan_tx, mut scan_rx) = broadcast::channel(8);

        dispatch_line(
            "{\"event\":\"barcodeScanned\",\"data\":\"4006381333931\"}",
            &pending,
            &scan_tx,
        );

        assert_eq!(scan_rx.try_recv().unwrap(), "4006381333931");
    }

    #[test]
    fn test_dispatch_garbage_is_ignored() {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (scan_tx, _) = broadcast::channel(8);
        dispatch_line("not json at all", &pending, &scan_tx);
    }
}

//! Bridge trait and provider seam
//!
//! `KioskBridge` is the capability surface consumed by the print pipeline.
//! `BridgeProvider` answers the one question asked at setup time: is there
//! a bridge at all? Absence is a routing signal, not an error.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::capability::BridgeCapabilities;
use crate::error::BridgeResult;

/// Hardware-facing capability surface of a kiosk shell.
///
/// Implementations must be cheap to share behind an `Arc`; every method
/// takes `&self`. Callers are expected to consult [`capabilities`] before
/// invoking a function, but implementations still fail with
/// `BridgeError::Unsupported` when an unadvertised function is called.
///
/// [`capabilities`]: KioskBridge::capabilities
#[async_trait]
pub trait KioskBridge: Send + Sync {
    /// Functions this shell advertised when the connection was set up.
    fn capabilities(&self) -> BridgeCapabilities;

    /// Send an encoded receipt image to the shell printer.
    ///
    /// `base64_jpeg` is the raw base64 payload with no data-URI prefix.
    async fn print_image(&self, base64_jpeg: &str) -> BridgeResult<()>;

    /// Send a raw text or HTML ticket to the shell printer.
    async fn print_ticket(&self, content: &str) -> BridgeResult<()>;

    /// Pulse the cash drawer, if the shell drives one.
    async fn open_cashbox(&self) -> BridgeResult<()>;

    /// Ask the shell to open its camera scanner.
    async fn start_scanner(&self) -> BridgeResult<()>;

    /// Subscribe to barcode codes pushed by the shell scanner.
    ///
    /// Bridges without a scanner return a receiver that never yields.
    fn subscribe_scans(&self) -> broadcast::Receiver<String>;
}

/// Answers whether a kiosk bridge is present for this process.
///
/// Injected once at setup so callers never consult process-wide state.
pub trait BridgeProvider: Send + Sync {
    /// The bridge, if one is reachable. `None` routes printing to the
    /// host's own default mechanism.
    fn bridge(&self) -> Option<Arc<dyn KioskBridge>>;
}

/// Provider backed by a fixed, already-established bridge (or none).
#[derive(Clone)]
pub struct StaticProvider {
    bridge: Option<Arc<dyn KioskBridge>>,
}

impl StaticProvider {
    /// Provider that hands out the given bridge.
    pub fn new(bridge: Arc<dyn KioskBridge>) -> Self {
        Self {
            bridge: Some(bridge),
        }
    }

    /// Provider for an environment without any kiosk shell.
    pub fn absent() -> Self {
        Self { bridge: None }
    }
}

impl BridgeProvider for StaticProvider {
    fn bridge(&self) -> Option<Arc<dyn KioskBridge>> {
        self.bridge.clone()
    }
}

//! # barnacle-bridge
//!
//! Transport layer for the kiosk shell - connectivity and capability
//! probing only.
//!
//! ## Scope
//!
//! This crate handles HOW to reach the shell:
//! - Line-delimited JSON over local TCP
//! - Handshake and capability discovery
//! - Request/reply correlation and timeouts
//! - Barcode scan event fan-out
//!
//! Business logic (WHAT to print) should stay in application code:
//! - Receipt and ticket rendering → barnacle-print
//!
//! ## Example
//!
//! ```ignore
//! use barnacle_bridge::{KioskBridge, TcpBridge};
//!
//! let bridge = TcpBridge::connect("127.0.0.1:7420", "register-1").await?;
//!
//! if bridge.capabilities().print_ticket {
//!     bridge.print_ticket("<div>Order #42</div>").await?;
//! }
//!
//! let mut scans = bridge.subscribe_scans();
//! bridge.start_scanner().await?;
//! let code = scans.recv().await?;
//! ```

mod bridge;
mod capability;
mod error;
mod tcp;

// Re-exports
pub use bridge::{BridgeProvider, KioskBridge, StaticProvider};
pub use capability::{
    BridgeCapabilities, FN_OPEN_CASHBOX, FN_PRINT_IMAGE, FN_PRINT_TICKET, FN_START_SCANNER,
};
pub use error::{BridgeError, BridgeResult};
pub use tcp::TcpBridge;

//! # barnacle-print
//!
//! Receipt-printing decision and transformation pipeline for the kiosk.
//!
//! ## Scope
//!
//! This crate decides WHAT to print and in which shape:
//! - Receipt document model and classification
//! - Kitchen ticket derivation (redacted receipt copy)
//! - Raster rendering of documents to JPEG
//! - Print dispatch with image-to-text fallback and one consolidated
//!   report per request
//!
//! Reaching the kiosk shell (HOW to print) lives in barnacle-bridge.
//!
//! ## Example
//!
//! ```ignore
//! use barnacle_print::{select_printer, Document, Node};
//! use barnacle_bridge::{StaticProvider, TcpBridge};
//! use std::sync::Arc;
//!
//! let bridge = TcpBridge::connect("127.0.0.1:7420", "register-1").await?;
//! let provider = StaticProvider::new(Arc::new(bridge));
//! let printer = select_printer(&provider);
//!
//! let report = printer.print_receipt(&receipt).await;
//! if !report.successful {
//!     show_error(report.error.unwrap());
//! }
//! ```

pub mod classify;
pub mod dispatch;
pub mod document;
pub mod render;
pub mod ticket;

// Re-exports
pub use classify::{ReceiptClass, classify};
pub use dispatch::{
    BridgePrinter, DefaultPrinter, DispatchError, DispatchResult, PrintFailure, PrintReport,
    ReceiptPrinter, select_printer,
};
pub use document::{Document, Node, tags};
pub use render::{
    DEFAULT_PRINT_WIDTH, ImageRenderer, RasterFormat, RenderError, RenderResult, RenderedImage,
};
pub use ticket::{BRANDING_MARKER, KITCHEN_TICKET_HEADING, build_kitchen_ticket};

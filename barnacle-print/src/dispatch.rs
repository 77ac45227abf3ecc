//! Print dispatch
//!
//! One entry point turns a receipt document into printer jobs: classify,
//! conditionally print the full receipt, always print the kitchen ticket,
//! fold every outcome into a single report. The printing strategy is
//! chosen once at setup from the injected bridge provider; nothing here
//! keeps global state.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use barnacle_bridge::{BridgeCapabilities, BridgeError, BridgeProvider, KioskBridge};

use crate::classify::{ReceiptClass, classify};
use crate::document::Document;
use crate::render::{ImageRenderer, RenderError};
use crate::ticket::build_kitchen_ticket;

/// Title shown for any failed print request.
const FAILURE_TITLE: &str = "Printing failed";

/// User-visible description of a failed print request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintFailure {
    pub title: String,
    pub body: String,
}

/// Consolidated outcome of one print request. Exactly one per request,
/// however many jobs ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintReport {
    pub successful: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<PrintFailure>,
}

impl PrintReport {
    pub fn ok() -> Self {
        Self {
            successful: true,
            error: None,
        }
    }

    pub fn failed(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            successful: false,
            error: Some(PrintFailure {
                title: title.into(),
                body: body.into(),
            }),
        }
    }
}

/// Errors of a single print job, folded into the report at the boundary.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Rendering the job's raster failed.
    #[error("Render failed: {0}")]
    Render(#[from] RenderError),

    /// A bridge call failed.
    #[error("{0}")]
    Bridge(#[from] BridgeError),

    /// The bridge exposes neither print function.
    #[error("Bridge exposes no print function")]
    NoPrintPath,
}

pub type DispatchResult<T> = Result<T, DispatchError>;

/// Strategy deciding how a receipt physically prints.
///
/// Selected once at setup via [`select_printer`]; callers hold it as
/// `Arc<dyn ReceiptPrinter>` and never re-probe.
#[async_trait]
pub trait ReceiptPrinter: Send + Sync {
    /// Print everything a finished order requires and report the outcome.
    ///
    /// Never panics and never returns `Err`; failures land in the report.
    async fn print_receipt(&self, document: &Document) -> PrintReport;

    /// Ask the printer's cash drawer to open. `true` when this strategy
    /// handled the request, `false` when the host must use its own
    /// drawer mechanism.
    async fn open_cashbox(&self) -> bool;
}

/// Strategy used when no kiosk bridge is present.
///
/// Reports success without rendering anything so the host's own printing
/// path proceeds untouched.
pub struct DefaultPrinter;

#[async_trait]
impl ReceiptPrinter for DefaultPrinter {
    async fn print_receipt(&self, _document: &Document) -> PrintReport {
        debug!("No kiosk bridge, deferring to host printing");
        PrintReport::ok()
    }

    async fn open_cashbox(&self) -> bool {
        false
    }
}

/// Strategy printing through the kiosk bridge.
pub struct BridgePrinter {
    bridge: Arc<dyn KioskBridge>,
    renderer: ImageRenderer,
}

impl BridgePrinter {
    pub fn new(bridge: Arc<dyn KioskBridge>) -> Self {
        Self {
            bridge,
            renderer: ImageRenderer::new(),
        }
    }

    pub fn with_renderer(bridge: Arc<dyn KioskBridge>, renderer: ImageRenderer) -> Self {
        Self { bridge, renderer }
    }

    /// Send one document: image path first, ticket text as fallback.
    #[instrument(skip(self, document, caps))]
    async fn print_document(
        &self,
        document: &Document,
        caps: &BridgeCapabilities,
        job: &'static str,
    ) -> DispatchResult<()> {
        if !caps.has_print_path() {
            return Err(DispatchError::NoPrintPath);
        }

        let mut last_error: Option<DispatchError> = None;

        if caps.print_image {
            match self.send_image(document).await {
                Ok(()) => {
                    info!("Job sent as image");
                    return Ok(());
                }
                Err(e) => {
                    warn!(error = %e, "Image path failed, trying ticket text");
                    last_error = Some(e);
                }
            }
        }

        if caps.print_ticket {
            match self.bridge.print_ticket(&document.to_html()).await {
                Ok(()) => {
                    info!("Job sent as ticket text");
                    return Ok(());
                }
                Err(e) => {
                    warn!(error = %e, "Ticket text path failed");
                    last_error = Some(e.into());
                }
            }
        }

        Err(last_error.unwrap_or(DispatchError::NoPrintPath))
    }

    async fn send_image(&self, document: &Document) -> DispatchResult<()> {
        let image = self.renderer.render_to_image(document).await?;
        let payload = image.to_base64();
        debug!(bytes = image.bytes.len(), "Raster encoded");
        self.bridge.print_image(&payload).await?;
        Ok(())
    }
}

#[async_trait]
impl ReceiptPrinter for BridgePrinter {
    #[instrument(skip(self, document), fields(request_id = %Uuid::new_v4()))]
    async fn print_receipt(&self, document: &Document) -> PrintReport {
        // Snapshot once so both jobs see the same capability set
        let caps = self.bridge.capabilities();
        let class = classify(document);
        info!(class = ?class, "Dispatching receipt");

        if class == ReceiptClass::PaidAtKiosk {
            if let Err(e) = self.print_document(document, &caps, "full-receipt").await {
                error!(job = "full-receipt", error = %e, "Print job failed");
                return PrintReport::failed(FAILURE_TITLE, e.to_string());
            }
        }

        let ticket = build_kitchen_ticket(document);
        if let Err(e) = self.print_document(&ticket, &caps, "kitchen-ticket").await {
            error!(job = "kitchen-ticket", error = %e, "Print job failed");
            return PrintReport::failed(FAILURE_TITLE, e.to_string());
        }

        PrintReport::ok()
    }

    async fn open_cashbox(&self) -> bool {
        if !self.bridge.capabilities().open_cashbox {
            debug!("Bridge has no cash drawer control");
            return false;
        }

        match self.bridge.open_cashbox().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Cash drawer request failed");
                false
            }
        }
    }
}

/// Choose the printing strategy for this process.
pub fn select_printer(provider: &dyn BridgeProvider) -> Arc<dyn ReceiptPrinter> {
    match provider.bridge() {
        Some(bridge) => {
            info!("Kiosk bridge present, printing through it");
            Arc::new(BridgePrinter::new(bridge))
        }
        None => {
            info!("No kiosk bridge, host default printing stays in charge");
            Arc::new(DefaultPrinter)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Node, tags};
    use barnacle_bridge::StaticProvider;

    fn create_paid_receipt() -> Document {
        Document::new(
            Node::new("div")
                .with_child(Node::new("div").with_text("Cafe con leche"))
                .with_child(Node::new("div").with_class(tags::PAYMENT_LINES).with_text("CARD")),
        )
    }

    #[test]
    fn test_report_constructors() {
        let ok = PrintReport::ok();
        assert!(ok.successful);
        assert!(ok.error.is_none());

        let failed = PrintReport::failed("Printing failed", "paper out");
        assert!(!failed.successful);
        let failure = failed.error.unwrap();
        assert_eq!(failure.title, "Printing failed");
        assert_eq!(failure.body, "paper out");
    }

    #[test]
    fn test_report_serializes_for_host_display() {
        let report = PrintReport::failed("Printing failed", "no paper");
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"successful\":false"));
        assert!(json.contains("\"title\":\"Printing failed\""));

        let ok_json = serde_json::to_string(&PrintReport::ok()).unwrap();
        assert!(!ok_json.contains("error"));
    }

    #[tokio::test]
    async fn test_default_printer_succeeds_without_bridge() {
        let printer = DefaultPrinter;
        let report = printer.print_receipt(&create_paid_receipt()).await;
        assert!(report.successful);
        assert!(report.error.is_none());
    }

    #[tokio::test]
    async fn test_default_printer_leaves_cashbox_to_host() {
        assert!(!DefaultPrinter.open_cashbox().await);
    }

    #[tokio::test]
    async fn test_absent_provider_selects_default_strategy() {
        let printer = select_printer(&StaticProvider::absent());

        // The default strategy is a no-op: success without any bridge
        let report = printer.print_receipt(&create_paid_receipt()).await;
        assert!(report.successful);
        assert!(!printer.open_cashbox().await);
    }
}

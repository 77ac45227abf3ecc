//! Receipt classification
//!
//! The kiosk embeds a payment-method section into receipts that were
//! settled at the machine. Its class tag is the only signal the dispatcher
//! needs: present means the customer already paid, absent means they pay
//! at the register. The check is structural and read-only.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::{Document, tags};

/// How the order was (or will be) settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptClass {
    /// Payment section present: print the full receipt for the customer.
    PaidAtKiosk,
    /// No payment section: the register prints the receipt later.
    PayAtRegister,
}

/// Classify a receipt by searching for the payment-lines marker.
///
/// Derived fresh on every call; the result is never cached on the
/// document.
pub fn classify(document: &Document) -> ReceiptClass {
    let class = if document.root.any(&|n| n.has_class(tags::PAYMENT_LINES)) {
        ReceiptClass::PaidAtKiosk
    } else {
        ReceiptClass::PayAtRegister
    };
    debug!(class = ?class, "Receipt classified");
    class
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Node;

    fn create_unpaid_receipt() -> Document {
        Document::new(
            Node::new("div")
                .with_child(Node::new("div").with_class(tags::PRICE).with_text("3.50"))
                .with_child(Node::new("div").with_class(tags::TOTAL).with_text("3.50")),
        )
    }

    #[test]
    fn test_without_marker_is_pay_at_register() {
        assert_eq!(
            classify(&create_unpaid_receipt()),
            ReceiptClass::PayAtRegister
        );
    }

    #[test]
    fn test_nested_marker_is_paid_at_kiosk() {
        let mut doc = create_unpaid_receipt();
        doc.root.children[1]
            .children
            .push(Node::new("div").with_class(tags::PAYMENT_LINES).with_text("CARD"));
        assert_eq!(classify(&doc), ReceiptClass::PaidAtKiosk);
    }

    #[test]
    fn test_inserting_marker_flips_classification() {
        let mut doc = create_unpaid_receipt();
        assert_eq!(classify(&doc), ReceiptClass::PayAtRegister);

        doc.root
            .children
            .push(Node::new("div").with_class(tags::PAYMENT_LINES));
        assert_eq!(classify(&doc), ReceiptClass::PaidAtKiosk);
    }

    #[test]
    fn test_other_classes_do_not_affect_classification() {
        let doc = Document::new(
            Node::new("div")
                .with_class(tags::TOTAL)
                .with_class(tags::TAX_BREAKDOWN)
                .with_class(tags::ORDER_META),
        );
        assert_eq!(classify(&doc), ReceiptClass::PayAtRegister);
    }

    #[test]
    fn test_classification_does_not_mutate() {
        let doc = create_unpaid_receipt();
        let before = doc.clone();
        let _ = classify(&doc);
        assert_eq!(doc, before);
    }
}

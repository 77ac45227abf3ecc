//! Kitchen ticket derivation
//!
//! The kitchen does not need prices, taxes, totals or payment details,
//! only what to prepare and how many. [`build_kitchen_ticket`] derives
//! that redacted variant from a customer receipt: a prominent heading on
//! top, monetary nodes stripped, quantity badges enlarged.

use tracing::debug;

use crate::document::{Document, Node, tags};

/// Fixed heading text. The kiosks run in Spanish-speaking stores and the
/// kitchen staff expect exactly this wording.
pub const KITCHEN_TICKET_HEADING: &str = "TICKET DE PREPARACIÓN";

/// Platform branding that footer blocks carry on customer receipts.
pub const BRANDING_MARKER: &str = "Powered by Barnacle";

/// Class tags whose nodes never appear on a kitchen ticket.
const EXCLUDED_CLASSES: [&str; 4] = [
    tags::PRICE,
    tags::TAX_BREAKDOWN,
    tags::TOTAL,
    tags::PAYMENT_LINES,
];

/// Build the kitchen ticket for a receipt.
///
/// Pure: works on a clone, never touches the input, performs no I/O.
/// Callers pass original receipts, not the output of a previous call.
pub fn build_kitchen_ticket(document: &Document) -> Document {
    let mut ticket = document.clone();

    ticket.root.children.insert(0, heading_node());

    ticket
        .root
        .prune_children(&|n| EXCLUDED_CLASSES.iter().any(|class| n.has_class(class)));

    reduce_price_per_unit(&mut ticket.root);

    ticket.root.prune_children(&|n| {
        n.has_class(tags::ORDER_META) && n.subtree_text().contains(BRANDING_MARKER)
    });

    debug!(nodes = ticket.root.node_count(), "Kitchen ticket built");
    ticket
}

fn heading_node() -> Node {
    Node::new("h1")
        .with_class(tags::TICKET_HEADING)
        .with_style("text-align", "center")
        .with_style("font-weight", "bold")
        .with_style("font-size", "2em")
        .with_style("border-bottom", "1px solid")
        .with_text(KITCHEN_TICKET_HEADING)
}

/// Reduce every price-per-unit line to its quantity badge.
///
/// The badge keeps the kitchen informed about amounts; everything else on
/// the line is unit-price detail. A line without a badge is kept as an
/// empty node so sibling order stays intact.
fn reduce_price_per_unit(node: &mut Node) {
    if node.has_class(tags::PRICE_PER_UNIT) {
        let badge = node
            .children
            .iter()
            .find(|child| child.has_class(tags::QTY_BADGE))
            .cloned();

        node.text = None;
        match badge {
            Some(mut badge) => {
                badge
                    .styles
                    .insert("font-size".to_string(), "2em".to_string());
                node.children = vec![badge];
            }
            None => node.children.clear(),
        }
    }

    for child in &mut node.children {
        reduce_price_per_unit(child);
    }
}

//! Receipt document model
//!
//! A receipt is a tree of [`Node`]s. Class tags (not style values) carry
//! the semantic roles the pipeline keys on: what is a price, what is the
//! payment section, what is a footer. Transformations never edit a
//! document in place; they clone first (`Clone` is deep here) and return
//! the new tree.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// Class-tag vocabulary shared by the classifier and the ticket builder.
pub mod tags {
    /// Marks the payment-method section; also the paid-at-kiosk marker.
    pub const PAYMENT_LINES: &str = "paymentlines";
    /// Unit-price / line-price badge.
    pub const PRICE: &str = "price";
    /// Order line showing price-per-unit detail.
    pub const PRICE_PER_UNIT: &str = "price-per-unit";
    /// Quantity badge inside a price-per-unit line.
    pub const QTY_BADGE: &str = "qty";
    /// Tax breakdown table.
    pub const TAX_BREAKDOWN: &str = "tax-breakdown";
    /// Total / amount-due line.
    pub const TOTAL: &str = "total";
    /// Footer and order metadata blocks.
    pub const ORDER_META: &str = "order-meta";
    /// Heading the ticket builder prepends.
    pub const TICKET_HEADING: &str = "ticket-heading";
}

/// One element of a receipt document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub styles: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Node {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            classes: Vec::new(),
            styles: HashMap::new(),
            children: Vec::new(),
            text: None,
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_style(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.styles.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// True if the predicate holds for this node or any descendant.
    pub fn any(&self, pred: &impl Fn(&Node) -> bool) -> bool {
        pred(self) || self.children.iter().any(|child| child.any(pred))
    }

    /// Depth-first visit of this node and every descendant.
    pub fn for_each(&self, f: &mut impl FnMut(&Node)) {
        f(self);
        for child in &self.children {
            child.for_each(f);
        }
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Node::node_count).sum::<usize>()
    }

    /// Every tag and class present in the subtree, deduplicated and sorted.
    pub fn class_and_tag_set(&self) -> BTreeSet<String> {
        let mut set = BTreeSet::new();
        self.for_each(&mut |node| {
            set.insert(node.tag.clone());
            for class in &node.classes {
                set.insert(class.clone());
            }
        });
        set
    }

    /// Concatenated text of the subtree, in document order.
    pub fn subtree_text(&self) -> String {
        let mut parts = Vec::new();
        self.for_each(&mut |node| {
            if let Some(text) = &node.text {
                if !text.is_empty() {
                    parts.push(text.clone());
                }
            }
        });
        parts.join(" ")
    }

    /// Remove every descendant matching the predicate. The node itself is
    /// never removed, so a document always keeps its root.
    pub fn prune_children(&mut self, pred: &impl Fn(&Node) -> bool) {
        self.children.retain(|child| !pred(child));
        for child in &mut self.children {
            child.prune_children(pred);
        }
    }

    /// Serialize the subtree as plain HTML for the text print path.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        if !self.classes.is_empty() {
            out.push_str(" class=\"");
            out.push_str(&self.classes.join(" "));
            out.push('"');
        }
        if !self.styles.is_empty() {
            // Sorted keys keep the output stable across runs
            let mut keys: Vec<&String> = self.styles.keys().collect();
            keys.sort();
            out.push_str(" style=\"");
            for key in keys {
                out.push_str(key);
                out.push(':');
                out.push_str(&self.styles[key]);
                out.push(';');
            }
            out.push('"');
        }
        out.push('>');
        if let Some(text) = &self.text {
            out.push_str(&escape_text(text));
        }
        for child in &self.children {
            child.write_html(out);
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

/// A complete receipt document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub root: Node,
}

impl Document {
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    pub fn to_html(&self) -> String {
        self.root.to_html()
    }
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

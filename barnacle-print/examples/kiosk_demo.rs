//! Kiosk print pipeline demo
//!
//! Demonstrates the full decision pipeline without a kiosk shell:
//! 1. Build a representative paid receipt document
//! 2. Classify it
//! 3. Derive the kitchen ticket and show its HTML
//! 4. Render the ticket to a JPEG on disk
//! 5. Run the dispatcher with an absent bridge (host default path)
//!
//! Run: cargo run --example kiosk_demo

use barnacle_bridge::StaticProvider;
use barnacle_print::{
    Document, ImageRenderer, Node, build_kitchen_ticket, classify, select_printer, tags,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("\n🧾 Kiosk print pipeline demo");
    println!("============================\n");

    // 1. A receipt as the order frontend would hand it over
    let receipt = Document::new(
        Node::new("div")
            .with_child(
                Node::new("div")
                    .with_style("text-align", "center")
                    .with_style("font-weight", "bold")
                    .with_text("BARNACLE TAPAS"),
            )
            .with_child(
                Node::new("div")
                    .with_child(Node::new("span").with_text("Gambas al ajillo"))
                    .with_child(
                        Node::new("span")
                            .with_class(tags::PRICE_PER_UNIT)
                            .with_text("2 x 8.50")
                            .with_child(
                                Node::new("span").with_class(tags::QTY_BADGE).with_text("2x"),
                            )
                            .with_child(
                                Node::new("span").with_class(tags::PRICE).with_text("17.00"),
                            ),
                    ),
            )
            .with_child(
                Node::new("div")
                    .with_class(tags::TAX_BREAKDOWN)
                    .with_text("IVA 10%: 1.55"),
            )
            .with_child(Node::new("div").with_class(tags::TOTAL).with_text("17.00"))
            .with_child(
                Node::new("div")
                    .with_class(tags::PAYMENT_LINES)
                    .with_text("TARJETA 17.00"),
            )
            .with_child(
                Node::new("footer")
                    .with_class(tags::ORDER_META)
                    .with_text("Powered by Barnacle"),
            ),
    );

    // 2. Classification decides whether the customer copy prints here
    let class = classify(&receipt);
    println!("Classification: {:?}\n", class);

    // 3. The kitchen copy, redacted
    let ticket = build_kitchen_ticket(&receipt);
    println!("Kitchen ticket HTML:\n{}\n", ticket.to_html());

    // 4. Raster the ticket as the bridge image path would
    let renderer = ImageRenderer::new();
    let image = renderer.render_to_image(&ticket).await?;
    std::fs::write("kitchen-ticket.jpg", &image.bytes)?;
    println!(
        "Rendered kitchen-ticket.jpg ({} bytes, base64 payload {} chars)\n",
        image.bytes.len(),
        image.to_base64().len()
    );

    // 5. No bridge connected: the selected strategy is the host default
    let printer = select_printer(&StaticProvider::absent());
    let report = printer.print_receipt(&receipt).await;
    println!("Dispatch without bridge: successful = {}", report.successful);

    Ok(())
}

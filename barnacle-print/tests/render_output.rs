// barnacle-print/tests/render_output.rs

use barnacle_print::{
    Document, ImageRenderer, Node, RasterFormat, build_kitchen_ticket, tags,
};
use tempfile::TempDir;

fn create_receipt() -> Document {
    Document::new(
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
                            ),
                    ),
            )
            .with_child(Node::new("div").with_class(tags::TOTAL).with_text("17.00"))
            .with_child(
                Node::new("div")
                    .with_class(tags::PAYMENT_LINES)
                    .with_text("EFECTIVO 20.00"),
            ),
    )
}

#[tokio::test]
async fn test_kitchen_ticket_renders_to_jpeg_file() {
    let dir = TempDir::new().unwrap();
    let renderer = ImageRenderer::new();

    let ticket = build_kitchen_ticket(&create_receipt());
    let image = renderer.render_to_image(&ticket).await.unwrap();

    assert_eq!(image.format, RasterFormat::Jpeg);
    // JPEG SOI marker
    assert_eq!(&image.bytes[..2], &[0xFF, 0xD8]);

    let path = dir.path().join("kitchen-ticket.jpg");
    std::fs::write(&path, &image.bytes).unwrap();
    assert!(std::fs::metadata(&path).unwrap().len() > 0);
}

#[tokio::test]
async fn test_render_is_deterministic() {
    let renderer = ImageRenderer::new();
    let doc = create_receipt();

    let first = renderer.render_to_image(&doc).await.unwrap();
    let second = renderer.render_to_image(&doc).await.unwrap();

    assert_eq!(first.bytes, second.bytes);
}

#[tokio::test]
async fn test_sequential_renders_leave_no_contexts() {
    let renderer = ImageRenderer::new();
    let receipt = create_receipt();
    let ticket = build_kitchen_ticket(&receipt);

    let _ = renderer.render_to_image(&receipt).await.unwrap();
    let _ = renderer.render_to_image(&ticket).await.unwrap();

    assert_eq!(renderer.active_contexts(), 0);
}

#[tokio::test]
async fn test_quality_changes_output_size() {
    let doc = create_receipt();

    let high = ImageRenderer::new().with_quality(95);
    let low = ImageRenderer::new().with_quality(20);

    let high_img = high.render_to_image(&doc).await.unwrap();
    let low_img = low.render_to_image(&doc).await.unwrap();

    assert!(low_img.bytes.len() < high_img.bytes.len());
}

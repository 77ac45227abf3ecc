//! Document raster rendering
//!
//! Lays a receipt document out at a fixed printable width and paints it
//! with a bitmap font into a grayscale JPEG, the only raster format the
//! kiosk shell accepts. Layout runs inside a scoped measurement context
//! that is released on every exit path; the renderer exposes the live
//! count so a leaked context is observable.

mod font;
mod surface;

pub use font::FontMetrics;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::document::{Document, Node};
use font::GlyphCache;
use surface::RasterSurface;

/// 72mm printable area at 203 DPI.
pub const DEFAULT_PRINT_WIDTH: usize = 576;

const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Errors that can occur while rendering a document.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Layout could not measure the content at the requested width.
    #[error("Layout failed: {0}")]
    Unmeasurable(String),

    /// The raster could not be encoded.
    #[error("Image encoding error: {0}")]
    Encode(String),

    /// The blocking render task was cancelled or crashed.
    #[error("Render task did not complete: {0}")]
    Canceled(String),
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Encoding of a rendered raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RasterFormat {
    Jpeg,
}

/// An encoded raster. Ephemeral: produced for one print job, sent, dropped.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub format: RasterFormat,
    pub bytes: Vec<u8>,
}

impl RenderedImage {
    /// Base64 payload for the bridge. No data-URI prefix.
    pub fn to_base64(&self) -> String {
        use base64::{Engine as _, engine::general_purpose::STANDARD};
        STANDARD.encode(&self.bytes)
    }
}

/// Counter handing out measurement contexts.
#[derive(Clone, Default)]
struct MeasureContexts {
    active: Arc<AtomicUsize>,
}

impl MeasureContexts {
    fn acquire(&self, width: usize) -> MeasureContext {
        self.active.fetch_add(1, Ordering::SeqCst);
        MeasureContext {
            width,
            active: self.active.clone(),
        }
    }

    fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Fixed-width measurement scope for one layout pass. Released on drop,
/// success and failure alike.
struct MeasureContext {
    width: usize,
    active: Arc<AtomicUsize>,
}

impl MeasureContext {
    fn width(&self) -> usize {
        self.width
    }

    /// Characters per line at the given size multiplier. `None` when even
    /// a single glyph does not fit.
    fn columns_for(&self, size: usize) -> Option<usize> {
        let glyph_width = FontMetrics::DEFAULT.char_width * size;
        if glyph_width == 0 || glyph_width > self.width {
            None
        } else {
            Some(self.width / glyph_width)
        }
    }
}

impl Drop for MeasureContext {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Renders receipt documents to JPEG rasters for the bridge image path.
pub struct ImageRenderer {
    print_width: usize,
    quality: u8,
    contexts: MeasureContexts,
}

impl Default for ImageRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageRenderer {
    /// Renderer for the standard printable width.
    pub fn new() -> Self {
        Self::for_width(DEFAULT_PRINT_WIDTH)
    }

    /// Renderer for an arbitrary printable width in dots.
    pub fn for_width(print_width: usize) -> Self {
        Self {
            print_width,
            quality: DEFAULT_JPEG_QUALITY,
            contexts: MeasureContexts::default(),
        }
    }

    /// Override the JPEG quality (1-100).
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    /// Measurement contexts currently alive. Zero whenever no render call
    /// is in flight.
    pub fn active_contexts(&self) -> usize {
        self.contexts.active()
    }

    /// Render a document to an encoded raster.
    ///
    /// Layout, paint and encode run on the blocking pool; the call
    /// suspends until they complete.
    #[instrument(skip(self, document), fields(width = self.print_width))]
    pub async fn render_to_image(&self, document: &Document) -> RenderResult<RenderedImage> {
        let document = document.clone();
        let quality = self.quality;
        let width = self.print_width;
        let contexts = self.contexts.clone();

        let outcome = tokio::task::spawn_blocking(move || {
            let ctx = contexts.acquire(width);
            render_with_context(&document, &ctx, quality)
        })
        .await;

        match outcome {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Render task aborted");
                Err(RenderError::Canceled(e.to_string()))
            }
        }
    }
}

fn render_with_context(
    document: &Document,
    ctx: &MeasureContext,
    quality: u8,
) -> RenderResult<RenderedImage> {
    let lines = layout(document, ctx)?;
    debug!(lines = lines.len(), "Document laid out");

    let mut painter = Painter::new(ctx.width());
    painter.paint(&lines);

    encode_jpeg(&painter.surface, quality)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Alignment {
    Left,
    Center,
    Right,
}

/// Inheritable text style resolved during layout.
#[derive(Debug, Clone, Copy)]
struct TextStyle {
    align: Alignment,
    bold: bool,
    size: usize,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            align: Alignment::Left,
            bold: false,
            size: 1,
        }
    }
}

/// One laid-out line ready for painting.
#[derive(Debug, Clone)]
struct LayoutLine {
    text: String,
    align: Alignment,
    bold: bool,
    size: usize,
    rule_after: bool,
}

fn layout(document: &Document, ctx: &MeasureContext) -> RenderResult<Vec<LayoutLine>> {
    let mut lines = Vec::new();
    collect_lines(&document.root, TextStyle::default(), ctx, &mut lines)?;
    Ok(lines)
}

fn collect_lines(
    node: &Node,
    inherited: TextStyle,
    ctx: &MeasureContext,
    out: &mut Vec<LayoutLine>,
) -> RenderResult<()> {
    let style = resolve_style(node, inherited);

    if let Some(text) = &node.text {
        wrap_text(text, style, ctx, out)?;
    }

    for child in &node.children {
        collect_lines(child, style, ctx, out)?;
    }

    if node.styles.contains_key("border-bottom") {
        out.push(LayoutLine {
            text: String::new(),
            align: style.align,
            bold: false,
            size: 1,
            rule_after: true,
        });
    }

    Ok(())
}

/// Apply a node's own style properties over the inherited style.
fn resolve_style(node: &Node, inherited: TextStyle) -> TextStyle {
    let mut style = inherited;

    if let Some(value) = node.styles.get("text-align") {
        style.align = match value.as_str() {
            "center" => Alignment::Center,
            "right" => Alignment::Right,
            _ => Alignment::Left,
        };
    }
    if let Some(value) = node.styles.get("font-weight") {
        style.bold = value == "bold";
    }
    if let Some(value) = node.styles.get("font-size") {
        if let Some(mult) = parse_size_mult(value) {
            style.size = mult;
        }
    }

    style
}

/// Parse a size multiplier out of an em value ("2em" -> 2).
fn parse_size_mult(value: &str) -> Option<usize> {
    let number = value.strip_suffix("em")?.trim();
    let mult: usize = number.parse().ok()?;
    Some(mult.max(1))
}

/// Greedy word wrap at the column boundary for the style's glyph size.
fn wrap_text(
    text: &str,
    style: TextStyle,
    ctx: &MeasureContext,
    out: &mut Vec<LayoutLine>,
) -> RenderResult<()> {
    let columns = ctx.columns_for(style.size).ok_or_else(|| {
        RenderError::Unmeasurable(format!(
            "glyph width {} exceeds printable width {}",
            FontMetrics::DEFAULT.char_width * style.size,
            ctx.width()
        ))
    })?;

    for raw_line in text.split('\n') {
        let mut current = String::new();
        for word in raw_line.split_whitespace() {
            let word_len = word.chars().count();
            let current_len = current.chars().count();

            if current.is_empty() {
                current = word.to_string();
            } else if current_len + 1 + word_len <= columns {
                current.push(' ');
                current.push_str(word);
            } else {
                out.push(make_line(current, style));
                current = word.to_string();
            }

            // Hard-break anything longer than a full line
            while current.chars().count() > columns {
                let head: String = current.chars().take(columns).collect();
                let tail: String = current.chars().skip(columns).collect();
                out.push(make_line(head, style));
                current = tail;
            }
        }
        if !current.is_empty() {
            out.push(make_line(current, style));
        }
    }

    Ok(())
}

fn make_line(text: String, style: TextStyle) -> LayoutLine {
    LayoutLine {
        text,
        align: style.align,
        bold: style.bold,
        size: style.size,
        rule_after: false,
    }
}

/// Paints laid-out lines onto a raster surface.
struct Painter {
    surface: RasterSurface,
    glyphs: GlyphCache,
    y: usize,
}

impl Painter {
    fn new(width: usize) -> Self {
        Self {
            surface: RasterSurface::new(width),
            glyphs: GlyphCache::default(),
            y: 0,
        }
    }

    fn paint(&mut self, lines: &[LayoutLine]) {
        for line in lines {
            self.paint_line(line);
        }
    }

    fn paint_line(&mut self, line: &LayoutLine) {
        let metrics = FontMetrics::DEFAULT;

        if !line.text.is_empty() {
            let char_width = metrics.char_width * line.size;
            let text_width = line.text.chars().count() * char_width;
            let width = self.surface.width();
            let start_x = match line.align {
                Alignment::Left => 0,
                Alignment::Center => width.saturating_sub(text_width) / 2,
                Alignment::Right => width.saturating_sub(text_width),
            };

            let mut x = start_x;
            for ch in line.text.chars() {
                self.paint_char(ch, x, line.size, line.bold);
                x += char_width;
            }
            self.y += metrics.char_height * line.size;
        }

        if line.rule_after {
            self.y += 3;
            self.surface.draw_rule(self.y, 2);
            self.y += 7;
        }
    }

    fn paint_char(&mut self, ch: char, base_x: usize, size: usize, bold: bool) {
        let metrics = FontMetrics::DEFAULT;
        let glyph = self.glyphs.get(ch);

        for gy in 0..metrics.char_height {
            for gx in 0..metrics.char_width {
                let idx = gy * metrics.char_width + gx;
                if glyph.get(idx).copied().unwrap_or(0) == 0 {
                    continue;
                }
                for sy in 0..size {
                    for sx in 0..size {
                        let px = base_x + gx * size + sx;
                        let py = self.y + gy * size + sy;
                        self.surface.set_pixel(px, py, true);
                        if bold {
                            // Double strike, one dot right
                            self.surface.set_pixel(px + 1, py, true);
                        }
                    }
                }
            }
        }
    }
}

fn encode_jpeg(surface: &RasterSurface, quality: u8) -> RenderResult<RenderedImage> {
    use image::codecs::jpeg::JpegEncoder;
    use image::{ExtendedColorType, GrayImage, ImageEncoder, Luma};

    let width = surface.width();
    let height = surface.trimmed_height(FontMetrics::DEFAULT.char_height);

    let mut img = GrayImage::new(width as u32, height as u32);
    for y in 0..height {
        for x in 0..width {
            let color = if surface.pixel(x, y) { 0u8 } else { 255u8 };
            img.put_pixel(x as u32, y as u32, Luma([color]));
        }
    }

    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
    encoder
        .write_image(img.as_raw(), width as u32, height as u32, ExtendedColorType::L8)
        .map_err(|e| RenderError::Encode(e.to_string()))?;

    Ok(RenderedImage {
        format: RasterFormat::Jpeg,
        bytes,
    })
}

//! Grayscale drawing surface for ticket rasters.

/// A growable 1-byte-per-pixel canvas (0 = white, 1 = black).
///
/// Width is fixed at construction; height grows as content is drawn and
/// trailing blank rows are trimmed before encoding.
pub struct RasterSurface {
    width: usize,
    height: usize,
    buffer: Vec<u8>,
}

impl RasterSurface {
    pub fn new(width: usize) -> Self {
        let initial_height = 100;
        Self {
            width,
            height: initial_height,
            buffer: vec![0u8; width * initial_height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Ensure the buffer has room for row `y`.
    fn ensure_height(&mut self, y: usize) {
        let needed = y + 1;
        if needed > self.height {
            // Grow by at least 100 rows at a time
            let new_height = needed.max(self.height + 100);
            self.buffer.resize(self.width * new_height, 0);
            self.height = new_height;
        }
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, black: bool) {
        if x >= self.width {
            return;
        }
        self.ensure_height(y);
        self.buffer[y * self.width + x] = if black { 1 } else { 0 };
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        if x >= self.width {
            return false;
        }
        self.buffer.get(y * self.width + x).copied().unwrap_or(0) != 0
    }

    /// Full-width horizontal rule of the given thickness.
    pub fn draw_rule(&mut self, y: usize, thickness: usize) {
        for dy in 0..thickness {
            for x in 0..self.width {
                self.set_pixel(x, y + dy, true);
            }
        }
    }

    /// Height after trimming trailing blank rows, at least `min`.
    pub fn trimmed_height(&self, min: usize) -> usize {
        let mut h = self.height;
        while h > 0 {
            let row_start = (h - 1) * self.width;
            let row_empty = self.buffer[row_start..row_start + self.width]
                .iter()
                .all(|&p| p == 0);
            if row_empty {
                h -= 1;
            } else {
                break;
            }
        }
        h.max(min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_read_pixel() {
        let mut surface = RasterSurface::new(64);
        surface.set_pixel(3, 5, true);
        assert!(surface.pixel(3, 5));
        assert!(!surface.pixel(4, 5));
    }

    #[test]
    fn test_out_of_width_writes_ignored() {
        let mut surface = RasterSurface::new(8);
        surface.set_pixel(8, 0, true);
        assert!(!surface.pixel(8, 0));
    }

    #[test]
    fn test_height_grows_on_demand() {
        let mut surface = RasterSurface::new(16);
        surface.set_pixel(0, 500, true);
        assert!(surface.pixel(0, 500));
    }

    #[test]
    fn test_trimmed_height_drops_blank_tail() {
        let mut surface = RasterSurface::new(16);
        surface.set_pixel(2, 30, true);
        assert_eq!(surface.trimmed_height(1), 31);
    }

    #[test]
    fn test_trimmed_height_respects_minimum() {
        let surface = RasterSurface::new(16);
        assert_eq!(surface.trimmed_height(24), 24);
    }

    #[test]
    fn test_draw_rule_spans_width() {
        let mut surface = RasterSurface::new(32);
        surface.draw_rule(10, 2);
        assert!(surface.pixel(0, 10));
        assert!(surface.pixel(31, 11));
        assert!(!surface.pixel(0, 12));
    }
}

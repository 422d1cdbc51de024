/// default screen size
pub const SCREEN_WIDTH: usize = 640;
pub const SCREEN_HEIGHT: usize = 480;

/// A grid of packed colour values, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<u16>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Framebuffer {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u16] {
        &self.pixels
    }

    pub fn clear(&mut self, color: u16) {
        self.pixels.fill(color);
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> Option<u16> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    /// silently ignores anything off screen
    pub fn set_pixel(&mut self, x: u32, y: u32, color: u16) {
        let (x, y) = (x as usize, y as usize);
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = color;
        }
    }

    /// Fill a rectangle, clipped to the right and bottom edges. Nothing
    /// happens if the corner is off screen or the rectangle is empty.
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: u16) {
        let (x1, y1) = (x as u64, y as u64);
        let x2 = (x1 + w as u64).min(self.width as u64);
        let y2 = (y1 + h as u64).min(self.height as u64);
        if x1 >= x2 || y1 >= y2 {
            return;
        }
        let (x1, x2) = (x1 as usize, x2 as usize);
        let (y1, y2) = (y1 as usize, y2 as usize);
        for row in self.pixels[y1 * self.width..y2 * self.width]
            .chunks_exact_mut(self.width)
        {
            row[x1..x2].fill(color);
        }
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Framebuffer::new(SCREEN_WIDTH, SCREEN_HEIGHT)
    }
}

/// How a packed colour splits into channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// x:1 r:5 g:5 b:5, each channel scaled by 8
    #[default]
    Rgb555,
    /// r:3 g:3 b:2 in the low byte; r and g scaled by 32, b by 64
    Rgb332,
}

impl PixelFormat {
    pub fn to_rgb(self, c: u16) -> (u8, u8, u8) {
        match self {
            PixelFormat::Rgb555 => (
                (((c >> 10) & 0x1f) * 8) as u8,
                (((c >> 5) & 0x1f) * 8) as u8,
                ((c & 0x1f) * 8) as u8,
            ),
            PixelFormat::Rgb332 => (
                (((c >> 5) & 0x07) * 32) as u8,
                (((c >> 2) & 0x07) * 32) as u8,
                ((c & 0x03) * 64) as u8,
            ),
        }
    }
}

/// A 24-bit image, row-major, ready for a display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<(u8, u8, u8)>,
}

impl RgbImage {
    pub fn get(&self, x: usize, y: usize) -> Option<(u8, u8, u8)> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[(u8, u8, u8)]> {
        self.pixels.chunks_exact(self.width.max(1))
    }
}

/// convert the whole framebuffer in one go
pub fn to_rgb_image(fb: &Framebuffer, format: PixelFormat) -> RgbImage {
    RgbImage {
        width: fb.width,
        height: fb.height,
        pixels: fb.pixels.iter().map(|c| format.to_rgb(*c)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framebuffer_zeroed() {
        let fb = Framebuffer::default();
        assert_eq!(fb.pixels().len(), 640 * 480);
        assert!(fb.pixels().iter().all(|p| *p == 0));
    }

    #[test]
    fn test_set_pixel_clips() {
        let mut fb = Framebuffer::new(4, 3);
        fb.set_pixel(3, 2, 7);
        fb.set_pixel(4, 0, 9);
        fb.set_pixel(u32::MAX, 0, 9);
        fb.set_pixel(0, 3, 9);
        assert_eq!(fb.get_pixel(3, 2), Some(7));
        assert_eq!(fb.pixels().iter().filter(|p| **p != 0).count(), 1);
    }

    #[test]
    fn test_fill_rect() {
        let mut fb = Framebuffer::default();
        fb.clear(0x0003);
        fb.fill_rect(100, 200, 150, 10, 0x1f);
        for y in 0..480 {
            for x in 0..640 {
                let inside = (100..250).contains(&x) && (200..210).contains(&y);
                let want = if inside { 0x1f } else { 0x0003 };
                assert_eq!(fb.get_pixel(x, y), Some(want), "at {},{}", x, y);
            }
        }
    }

    #[test]
    fn test_fill_rect_clipped() {
        let mut fb = Framebuffer::new(8, 8);
        fb.fill_rect(6, 6, 4, 100, 1);
        assert_eq!(fb.get_pixel(6, 6), Some(1));
        assert_eq!(fb.get_pixel(7, 7), Some(1));
        assert_eq!(fb.get_pixel(5, 7), Some(0));
        assert_eq!(fb.pixels().iter().filter(|p| **p == 1).count(), 4);
    }

    #[test]
    fn test_fill_rect_huge_size_fills_to_edge() {
        let mut fb = Framebuffer::new(8, 8);
        fb.fill_rect(0, 3, u32::MAX, 1, 1);
        fb.fill_rect(5, 5, 0x8000_0000, 0x8000_0000, 2);
        assert_eq!(fb.pixels().iter().filter(|p| **p == 1).count(), 8);
        assert_eq!(fb.pixels().iter().filter(|p| **p == 2).count(), 9);
    }

    #[test]
    fn test_fill_rect_empty() {
        let mut fb = Framebuffer::new(8, 8);
        fb.fill_rect(2, 2, 0, 5, 1);
        fb.fill_rect(2, 2, 5, 0, 1);
        fb.fill_rect(8, 0, 5, 5, 1);
        // a wrapped "negative" corner is far off screen, not clipped
        fb.fill_rect(-5i32 as u32, 0, 10, 5, 1);
        assert!(fb.pixels().iter().all(|p| *p == 0));
    }

    #[test]
    fn test_rgb555() {
        let f = PixelFormat::Rgb555;
        assert_eq!(f.to_rgb(0x1f), (0, 0, 248));
        assert_eq!(f.to_rgb(0x7c00), (248, 0, 0));
        assert_eq!(f.to_rgb(0x03e0), (0, 248, 0));
        // the spare top bit is ignored
        assert_eq!(f.to_rgb(0x8000), (0, 0, 0));
    }

    #[test]
    fn test_rgb332() {
        let f = PixelFormat::Rgb332;
        assert_eq!(f.to_rgb(0xe0), (224, 0, 0));
        assert_eq!(f.to_rgb(0x1c), (0, 224, 0));
        assert_eq!(f.to_rgb(0x03), (0, 0, 192));
        assert_eq!(f.to_rgb(7), (0, 32, 192));
    }

    #[test]
    fn test_to_rgb_image() {
        let mut fb = Framebuffer::new(3, 2);
        fb.set_pixel(2, 1, 0x7fff);
        let img = to_rgb_image(&fb, PixelFormat::Rgb555);
        assert_eq!((img.width, img.height), (3, 2));
        assert_eq!(img.get(2, 1), Some((248, 248, 248)));
        assert_eq!(img.get(0, 0), Some((0, 0, 0)));
        assert_eq!(img.rows().count(), 2);
    }
}

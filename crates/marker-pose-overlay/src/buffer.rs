/// Borrowed read-only view of an RGBA8 buffer (row-major, 4 bytes per pixel).
#[derive(Clone, Copy, Debug)]
pub struct Rgba8View<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // len = 4*w*h
}

/// Borrowed mutable view of a caller-owned RGBA8 buffer.
#[derive(Debug)]
pub struct Rgba8ViewMut<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a mut [u8], // len = 4*w*h
}

impl Rgba8ViewMut<'_> {
    /// Write one pixel; coordinates outside the buffer are ignored.
    #[inline]
    pub fn put_pixel(&mut self, x: i32, y: i32, color: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let i = 4 * (y as usize * self.width + x as usize);
        self.data[i..i + 4].copy_from_slice(&color);
    }

    #[inline]
    pub fn as_view(&self) -> Rgba8View<'_> {
        Rgba8View {
            width: self.width,
            height: self.height,
            data: self.data,
        }
    }
}

impl<'a> Rgba8View<'a> {
    /// Read one pixel, or `None` outside the buffer.
    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let i = 4 * (y as usize * self.width + x as usize);
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }
}

/// Owned RGBA8 image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rgba8Image {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl Rgba8Image {
    /// A zeroed (transparent black) image.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; 4 * width * height],
        }
    }

    pub fn view(&self) -> Rgba8View<'_> {
        Rgba8View {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    pub fn view_mut(&mut self) -> Rgba8ViewMut<'_> {
        Rgba8ViewMut {
            width: self.width,
            height: self.height,
            data: &mut self.data,
        }
    }
}

/// Owned 8-bit grayscale image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

/// One-shot RGBA to grayscale conversion (BT.601 luma weights).
pub fn rgba_to_gray(src: &Rgba8View<'_>) -> GrayImage {
    let mut data = Vec::with_capacity(src.width * src.height);
    for px in src.data.chunks_exact(4) {
        let luma = 0.299 * px[0] as f64 + 0.587 * px[1] as f64 + 0.114 * px[2] as f64;
        data.push(luma.round().clamp(0.0, 255.0) as u8);
    }
    GrayImage {
        width: src.width,
        height: src.height,
        data,
    }
}

/// Rotate 90° clockwise; output dimensions are transposed.
pub fn rotate90_cw(src: &Rgba8View<'_>) -> Rgba8Image {
    let mut out = Rgba8Image::new(src.height, src.width);
    for y in 0..src.height {
        for x in 0..src.width {
            let s = 4 * (y * src.width + x);
            let d = 4 * (x * out.width + (src.height - 1 - y));
            out.data[d..d + 4].copy_from_slice(&src.data[s..s + 4]);
        }
    }
    out
}

/// Rotate 90° counter-clockwise; output dimensions are transposed.
pub fn rotate90_ccw(src: &Rgba8View<'_>) -> Rgba8Image {
    let mut out = Rgba8Image::new(src.height, src.width);
    for y in 0..src.height {
        for x in 0..src.width {
            let s = 4 * (y * src.width + x);
            let d = 4 * ((src.width - 1 - x) * out.width + y);
            out.data[d..d + 4].copy_from_slice(&src.data[s..s + 4]);
        }
    }
    out
}

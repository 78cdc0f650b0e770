//! Adapters between `image` buffers and the overlay view types.

use marker_pose_overlay::{GrayImage, Rgba8View, Rgba8ViewMut};

/// Borrow an `image::RgbaImage` as a read-only overlay view.
pub fn rgba_view(img: &image::RgbaImage) -> Rgba8View<'_> {
    Rgba8View {
        width: img.width() as usize,
        height: img.height() as usize,
        data: &**img,
    }
}

/// Borrow an `image::RgbaImage` as a mutable overlay view for the duration
/// of one drawing call.
pub fn rgba_view_mut(img: &mut image::RgbaImage) -> Rgba8ViewMut<'_> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    Rgba8ViewMut {
        width,
        height,
        data: &mut **img,
    }
}

/// Copy a grayscale result into an `image::GrayImage`.
///
/// Returns `None` only if the buffer's stored dimensions do not match its
/// data length.
pub fn gray_to_image(gray: &GrayImage) -> Option<image::GrayImage> {
    image::GrayImage::from_raw(gray.width as u32, gray.height as u32, gray.data.clone())
}

//! Overlay rendering onto caller-owned pixel buffers.
//!
//! The buffer types are scoped borrows: a drawing call receives a mutable
//! view for its own duration and never retains it. Nothing here performs
//! locking; exclusive access to a live preview buffer is the caller's
//! contract.

mod buffer;
mod label;
mod polyline;

pub use buffer::{
    rgba_to_gray, rotate90_ccw, rotate90_cw, GrayImage, Rgba8Image, Rgba8View, Rgba8ViewMut,
};
pub use label::{draw_label, LabelOrientation, LabelStyle};
pub use polyline::{draw_closed_polyline, Stroke};

//! FieldMap Render Library
//!
//! Frame description, image decoding and rendering backends for FieldMap.
//! The default backend uses Vello for GPU-accelerated rendering.

pub mod display_list;
pub mod image_cache;
mod renderer;

#[cfg(feature = "vello-renderer")]
mod vello_impl;

pub use display_list::{DisplayItem, DisplayList, DrawCommand, Layer};
pub use image_cache::{DecodeError, DecodedImage, ImageCache, ImageDecoder, RasterDecoder};
pub use renderer::{DisplayListRenderer, RenderContext, RenderResult, Renderer, RendererError};

#[cfg(feature = "vello-renderer")]
pub use vello_impl::VelloRenderer;

//! Artboard Render Library
//!
//! Renderer abstraction for Artboard documents, plus an SVG implementation
//! used for export and deployment previews.

mod renderer;
mod svg;

pub use renderer::{GridStyle, RenderContext, RenderResult, Renderer, RendererError};
pub use svg::{SvgRenderer, render_svg};

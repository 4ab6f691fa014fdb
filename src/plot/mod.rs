//! Chart rendering for the long and short history views.

pub mod plotter;
pub mod svg;

pub use plotter::{PlotSnapshot, PlotSource, Plotter};
pub use svg::SvgRenderer;

use crate::core::{Result, Timestamp};

/// One chart's worth of data. Every series is at most `times.len()` long.
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    /// Chart title
    pub title: &'a str,
    /// Shared time axis, seconds since the Unix epoch
    pub times: &'a [Timestamp],
    /// One series per value column
    pub series: Vec<&'a [f64]>,
}

/// Turns a frame into encoded image bytes.
pub trait Renderer: Send {
    /// Append the encoded chart to `out`
    fn render(&mut self, frame: &Frame<'_>, out: &mut Vec<u8>) -> Result<()>;

    /// MIME type of the produced bytes
    fn content_type(&self) -> &'static str;
}

/// Builds a fresh renderer for each plotter.
pub type RendererFactory = Box<dyn Fn() -> Box<dyn Renderer> + Send + Sync>;

/// Factory for the built-in SVG renderer
pub fn svg_factory(width: u32, height: u32) -> RendererFactory {
    Box::new(move || Box::new(SvgRenderer::new(width, height)))
}

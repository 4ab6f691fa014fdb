//! Built-in SVG line chart renderer.

use crate::core::{DaqError, Result, Timestamp};
use crate::plot::{Frame, Renderer};
use chrono::{Local, TimeZone};
use std::fmt::Write as _;

const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 50.0;

const PALETTE: [&str; 6] = ["#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b"];

/// Time axis label format
pub const TIME_LABEL_FORMAT: &str = "%m-%d %H:%M:%S";

/// Line chart: one polyline per column, min/max value labels on the y axis
/// and first/last timestamps on the x axis.
#[derive(Debug, Clone)]
pub struct SvgRenderer {
    width: u32,
    height: u32,
}

impl SvgRenderer {
    /// Create a renderer producing `width` x `height` charts
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

/// Closed range with a non-zero span.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Span {
    lo: f64,
    hi: f64,
}

impl Span {
    fn of<'a>(values: impl Iterator<Item = &'a f64>) -> Option<Self> {
        let (lo, hi) = values
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        if lo > hi {
            return None;
        }
        if lo == hi {
            Some(Self { lo: lo - 0.5, hi: hi + 0.5 })
        } else {
            Some(Self { lo, hi })
        }
    }

    fn fraction(&self, v: f64) -> f64 {
        (v - self.lo) / (self.hi - self.lo)
    }
}

/// Local wall-clock rendering of an epoch timestamp
pub fn format_time(t: Timestamp) -> String {
    let secs = t.floor();
    let nanos = ((t - secs) * 1e9).clamp(0.0, 999_999_999.0) as u32;
    match Local.timestamp_opt(secs as i64, nanos).single() {
        Some(dt) => dt.format(TIME_LABEL_FORMAT).to_string(),
        None => format!("{:.0}", t),
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

impl Renderer for SvgRenderer {
    fn render(&mut self, frame: &Frame<'_>, out: &mut Vec<u8>) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(DaqError::render("chart dimensions must be non-zero"));
        }

        let (w, h) = (f64::from(self.width), f64::from(self.height));
        let plot_w = (w - MARGIN_LEFT - MARGIN_RIGHT).max(1.0);
        let plot_h = (h - MARGIN_TOP - MARGIN_BOTTOM).max(1.0);

        let mut svg = String::with_capacity(4096);
        // Writing into a String cannot fail.
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
        );
        let _ = write!(svg, r#"<rect width="{w}" height="{h}" fill="white"/>"#);
        let _ = write!(
            svg,
            r#"<text x="{}" y="24" font-family="sans-serif" font-size="16" text-anchor="middle">{}</text>"#,
            w / 2.0,
            escape(frame.title)
        );
        let _ = write!(
            svg,
            r##"<rect x="{MARGIN_LEFT}" y="{MARGIN_TOP}" width="{plot_w}" height="{plot_h}" fill="none" stroke="#444"/>"##
        );

        let x_span = Span::of(frame.times.iter());
        let y_span = Span::of(frame.series.iter().flat_map(|s| s.iter()));

        match (x_span, y_span) {
            (Some(x_span), Some(y_span)) => {
                let x = |t: f64| MARGIN_LEFT + x_span.fraction(t) * plot_w;
                let y = |v: f64| MARGIN_TOP + (1.0 - y_span.fraction(v)) * plot_h;

                for (index, series) in frame.series.iter().enumerate() {
                    let colour = PALETTE[index % PALETTE.len()];
                    // NaN gaps split a column into separate segments.
                    let mut points = String::new();
                    let flush = |points: &mut String, svg: &mut String| {
                        if !points.is_empty() {
                            let _ = write!(
                                svg,
                                r#"<polyline fill="none" stroke="{colour}" stroke-width="1.5" points="{}"/>"#,
                                points.trim_end()
                            );
                            points.clear();
                        }
                    };
                    for (&t, &v) in frame.times.iter().zip(series.iter()) {
                        if v.is_finite() && t.is_finite() {
                            let _ = write!(points, "{:.1},{:.1} ", x(t), y(v));
                        } else {
                            flush(&mut points, &mut svg);
                        }
                    }
                    flush(&mut points, &mut svg);
                }

                let label = |svg: &mut String, x: f64, y: f64, anchor: &str, text: &str| {
                    let _ = write!(
                        svg,
                        r#"<text x="{x:.1}" y="{y:.1}" font-family="sans-serif" font-size="12" text-anchor="{anchor}">{text}</text>"#
                    );
                };
                label(&mut svg, MARGIN_LEFT - 6.0, MARGIN_TOP + 4.0, "end", &format!("{:.1}", y_span.hi));
                label(&mut svg, MARGIN_LEFT - 6.0, MARGIN_TOP + plot_h, "end", &format!("{:.1}", y_span.lo));
                let bottom = MARGIN_TOP + plot_h + 20.0;
                label(&mut svg, MARGIN_LEFT, bottom, "start", &format_time(x_span.lo));
                label(&mut svg, MARGIN_LEFT + plot_w, bottom, "end", &format_time(x_span.hi));
            },
            _ => {
                let _ = write!(
                    svg,
                    r#"<text x="{}" y="{}" font-family="sans-serif" font-size="14" text-anchor="middle">no data</text>"#,
                    MARGIN_LEFT + plot_w / 2.0,
                    MARGIN_TOP + plot_h / 2.0
                );
            },
        }

        svg.push_str("</svg>\n");
        out.extend_from_slice(svg.as_bytes());
        Ok(())
    }

    fn content_type(&self) -> &'static str {
        "image/svg+xml"
    }
}

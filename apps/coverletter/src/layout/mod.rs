// Letter layout: link detection, wrapping, pagination and PDF output.
// Rendering is CPU-bound and must run inside tokio::task::spawn_blocking.

pub mod font_metrics;
pub mod fonts;
pub mod links;
pub mod pdf;
pub mod render;
pub mod winansi;
pub mod wrap;

pub use fonts::{FontError, FontResolver, SystemFontResolver};
pub use pdf::render_letter_pdf;
pub use render::{PageSize, StyleContext, DEFAULT_MARGIN};

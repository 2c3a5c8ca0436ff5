//! Paginated text renderer.
//!
//! Walks a letter top to bottom, one physical line at a time, and records
//! absolute-position drawing primitives per page. Lines containing links are
//! split into alternating plain and link runs; each link run carries an
//! underline and a click rectangle. The result is a plain data structure; the
//! PDF writer in `layout::pdf` turns it into bytes.
//!
//! Coordinates are PDF points with the origin at the bottom-left of the page.

use crate::layout::font_metrics::FontMetrics;
use crate::layout::links::detect;
use crate::layout::wrap::{split_paragraphs, wrap_paragraph};

/// One inch.
pub const DEFAULT_MARGIN: f32 = 72.0;

// ────────────────────────────────────────────────────────────────────────────
// Style and page geometry
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const LINK_BLUE: Rgb = Rgb::new(0.0, 0.0, 0.8);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

/// Font and colors for one document. Read-only while rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleContext {
    pub font_name: String,
    pub font_size: f32,
    pub link_color: Rgb,
    pub normal_color: Rgb,
}

impl StyleContext {
    /// Black body text with blue links.
    pub fn new(font_name: impl Into<String>, font_size: f32) -> Self {
        Self {
            font_name: font_name.into(),
            font_size,
            link_color: Rgb::LINK_BLUE,
            normal_color: Rgb::BLACK,
        }
    }

    /// Fixed vertical advance between lines.
    pub fn leading(&self) -> f32 {
        self.font_size + 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    /// US letter, 8.5" × 11".
    pub const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
    };
}

/// Current drawing position. `y` only moves down, except when a page break
/// sends it back to the top.
#[derive(Debug, Clone, PartialEq)]
pub struct PageCursor {
    pub x: f32,
    pub y: f32,
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
}

impl PageCursor {
    pub fn new(page_size: PageSize, margin: f32) -> Self {
        Self {
            x: margin,
            y: page_size.height - margin,
            page_width: page_size.width,
            page_height: page_size.height,
            margin,
        }
    }

    pub fn top(&self) -> f32 {
        self.page_height - self.margin
    }

    pub fn usable_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    pub fn is_exhausted(&self) -> bool {
        self.y <= self.margin
    }

    pub fn reset_to_top(&mut self) {
        self.y = self.top();
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rendered output
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// A text run with its baseline starting at `(x, y)`.
    Text {
        x: f32,
        y: f32,
        text: String,
        color: Rgb,
    },
    /// A horizontal stroke from `x1` to `x2` at height `y`.
    Underline { x1: f32, x2: f32, y: f32, color: Rgb },
    /// A clickable rectangle `[x1, y1, x2, y2]` bound to `uri`.
    Link { rect: [f32; 4], uri: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedPage {
    pub primitives: Vec<Primitive>,
}

impl RenderedPage {
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}

/// Pages of drawn primitives plus the geometry they were laid out for.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub pages: Vec<RenderedPage>,
    pub page_size: PageSize,
    pub font_name: String,
    pub font_size: f32,
}

impl RenderedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every click target in document order, with its page index.
    pub fn links(&self) -> impl Iterator<Item = (usize, &[f32; 4], &str)> + '_ {
        self.pages.iter().enumerate().flat_map(|(idx, page)| {
            page.primitives.iter().filter_map(move |p| match p {
                Primitive::Link { rect, uri } => Some((idx, rect, uri.as_str())),
                _ => None,
            })
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rendering
// ────────────────────────────────────────────────────────────────────────────

/// Lays out `document_text` onto pages.
///
/// Blank paragraphs advance the cursor by one line without drawing. Text
/// paragraphs are wrapped to the usable width and drawn one line at a time;
/// a page break happens before any line that would start at or below the
/// bottom margin. A page started by a trailing blank paragraph is kept.
pub fn render(
    document_text: &str,
    style: &StyleContext,
    page_size: PageSize,
    margin: f32,
    metrics: &FontMetrics,
) -> RenderedDocument {
    let mut cursor = PageCursor::new(page_size, margin);
    let mut pages = Vec::new();
    let mut current = RenderedPage::default();
    let max_width = cursor.usable_width();
    let leading = style.leading();

    for paragraph in split_paragraphs(document_text) {
        if paragraph.trim().is_empty() {
            cursor.y -= leading;
            if cursor.is_exhausted() {
                pages.push(std::mem::take(&mut current));
                cursor.reset_to_top();
            }
            continue;
        }

        for line in wrap_paragraph(paragraph, metrics, style.font_size, max_width) {
            if cursor.is_exhausted() {
                pages.push(std::mem::take(&mut current));
                cursor.reset_to_top();
            }
            draw_line(&mut current, &line, cursor.x, cursor.y, style, metrics);
            cursor.y -= leading;
        }
    }
    pages.push(current);

    RenderedDocument {
        pages,
        page_size,
        font_name: style.font_name.clone(),
        font_size: style.font_size,
    }
}

/// Draws one physical line at baseline `y`, splitting it into plain and link
/// runs when the line contains links.
fn draw_line(
    page: &mut RenderedPage,
    line: &str,
    x: f32,
    y: f32,
    style: &StyleContext,
    metrics: &FontMetrics,
) {
    let spans = detect(line);
    if spans.is_empty() {
        page.primitives.push(Primitive::Text {
            x,
            y,
            text: line.to_string(),
            color: style.normal_color,
        });
        return;
    }

    let size = style.font_size;
    let mut current_x = x;
    let mut last_end = 0;

    for span in &spans {
        if span.start > last_end {
            let before = &line[last_end..span.start];
            page.primitives.push(Primitive::Text {
                x: current_x,
                y,
                text: before.to_string(),
                color: style.normal_color,
            });
            current_x += metrics.string_width(before, size);
        }

        let link_width = metrics.string_width(&span.display_text, size);
        page.primitives.push(Primitive::Text {
            x: current_x,
            y,
            text: span.display_text.clone(),
            color: style.link_color,
        });
        page.primitives.push(Primitive::Link {
            rect: [current_x, y - 2.0, current_x + link_width, y + size],
            uri: span.target_uri.clone(),
        });
        page.primitives.push(Primitive::Underline {
            x1: current_x,
            x2: current_x + link_width,
            y: y - 1.0,
            color: style.link_color,
        });

        current_x += link_width;
        last_end = span.end;
    }

    if last_end < line.len() {
        page.primitives.push(Primitive::Text {
            x: current_x,
            y,
            text: line[last_end..].to_string(),
            color: style.normal_color,
        });
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

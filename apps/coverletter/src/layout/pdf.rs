//! Serialises a `RenderedDocument` into PDF bytes with pdf-writer.
//!
//! Object layout: catalog, page tree, document info, one font (`/F1`), then
//! link annotations, content streams and pages. Text is written as WinAnsi
//! bytes so the width table in the font dictionary matches what the renderer
//! measured.

use pdf_writer::types::{ActionType, AnnotationType, FontFlags};
use pdf_writer::{Content, Name, Pdf, Rect, Ref, Str, TextStr};
use tracing::debug;

use crate::layout::font_metrics::{FIRST_CHAR, LAST_CHAR};
use crate::layout::fonts::{
    load_font, EmbeddedFont, FontError, FontProgram, FontResolver, LoadedFont, OutlineFlavor,
};
use crate::layout::render::{render, PageSize, Primitive, RenderedDocument, Rgb, StyleContext};
use crate::layout::winansi;

const FONT_RESOURCE: &[u8] = b"F1";
const PRODUCER: &str = concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"));

/// Sequential object id allocator.
struct RefAlloc(i32);

impl RefAlloc {
    fn next(&mut self) -> Ref {
        self.0 += 1;
        Ref::new(self.0)
    }
}

/// Loads the font for `style`, lays the text out and writes the PDF.
///
/// Font resolution happens first, so an unknown family fails before any
/// layout work is done.
pub fn render_letter_pdf(
    text: &str,
    style: &StyleContext,
    page_size: PageSize,
    margin: f32,
    resolver: &dyn FontResolver,
) -> Result<Vec<u8>, FontError> {
    let font = load_font(&style.font_name, resolver)?;
    let document = render(text, style, page_size, margin, &font.metrics);
    debug!(
        "Rendered {} page(s) with {} link(s)",
        document.page_count(),
        document.links().count()
    );
    Ok(write_pdf(&document, &font))
}

/// Writes an already rendered document using `font` for every text run.
pub fn write_pdf(document: &RenderedDocument, font: &LoadedFont) -> Vec<u8> {
    let mut pdf = Pdf::new();
    let mut alloc = RefAlloc(0);

    let catalog_id = alloc.next();
    let pages_id = alloc.next();
    let info_id = alloc.next();
    let font_id = alloc.next();

    pdf.document_info(info_id).producer(TextStr(PRODUCER));
    write_font(&mut pdf, &mut alloc, font_id, font);

    let page_annotations: Vec<Vec<Ref>> = document
        .pages
        .iter()
        .map(|page| {
            page.primitives
                .iter()
                .filter_map(|p| match p {
                    Primitive::Link { rect, uri } => {
                        let annot_id = alloc.next();
                        let mut annot = pdf.annotation(annot_id);
                        annot
                            .subtype(AnnotationType::Link)
                            .rect(Rect::new(rect[0], rect[1], rect[2], rect[3]))
                            .border(0.0, 0.0, 0.0, None);
                        annot
                            .action()
                            .action_type(ActionType::Uri)
                            .uri(Str(uri.as_bytes()));
                        Some(annot_id)
                    }
                    _ => None,
                })
                .collect()
        })
        .collect();

    let n = document.pages.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc.next()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc.next()).collect();

    for (page, content_id) in document.pages.iter().zip(&content_ids) {
        let content = page_content(&page.primitives, document.font_size);
        pdf.stream(*content_id, &content.finish());
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    let PageSize { width, height } = document.page_size;
    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, width, height))
            .parent(pages_id)
            .contents(content_ids[i]);
        if !page_annotations[i].is_empty() {
            page.annotations(page_annotations[i].iter().copied());
        }
        page.resources().fonts().pair(Name(FONT_RESOURCE), font_id);
    }

    pdf.finish()
}

/// Content stream for one page. Fill and stroke colours are only emitted on
/// change and reset to black at the end.
fn page_content(primitives: &[Primitive], font_size: f32) -> Content {
    let mut content = Content::new();
    let mut fill = Rgb::BLACK;
    let mut stroke = Rgb::BLACK;

    for primitive in primitives {
        match primitive {
            Primitive::Text { x, y, text, color } => {
                if *color != fill {
                    content.set_fill_rgb(color.r, color.g, color.b);
                    fill = *color;
                }
                let bytes = winansi::encode(text);
                content
                    .begin_text()
                    .set_font(Name(FONT_RESOURCE), font_size)
                    .next_line(*x, *y)
                    .show(Str(&bytes))
                    .end_text();
            }
            Primitive::Underline { x1, x2, y, color } => {
                if *color != stroke {
                    content.set_stroke_rgb(color.r, color.g, color.b);
                    stroke = *color;
                }
                content.set_line_width(0.5);
                content.move_to(*x1, *y);
                content.line_to(*x2, *y);
                content.stroke();
            }
            // Written as annotations, not content.
            Primitive::Link { .. } => {}
        }
    }

    if fill != Rgb::BLACK {
        content.set_fill_gray(0.0);
    }
    if stroke != Rgb::BLACK {
        content.set_stroke_gray(0.0);
    }
    content
}

fn write_font(pdf: &mut Pdf, alloc: &mut RefAlloc, font_id: Ref, font: &LoadedFont) {
    match &font.program {
        FontProgram::Standard(standard) => {
            pdf.type1_font(font_id)
                .base_font(Name(standard.base_font().as_bytes()))
                .encoding_predefined(Name(b"WinAnsiEncoding"))
                .first_char(FIRST_CHAR)
                .last_char(LAST_CHAR)
                .widths(font.metrics.widths().iter().copied());
        }
        FontProgram::Embedded(embedded) => {
            write_embedded_font(pdf, alloc, font_id, embedded, font.metrics.widths());
        }
    }
}

fn write_embedded_font(
    pdf: &mut Pdf,
    alloc: &mut RefAlloc,
    font_id: Ref,
    embedded: &EmbeddedFont,
    widths: &[f32],
) {
    let descriptor_id = alloc.next();
    let data_id = alloc.next();
    let ps_name = embedded.postscript_name.as_bytes();

    match embedded.flavor {
        OutlineFlavor::TrueType => {
            let data_len = i32::try_from(embedded.data.len()).unwrap_or(i32::MAX);
            pdf.stream(data_id, &embedded.data)
                .pair(Name(b"Length1"), data_len);
        }
        OutlineFlavor::Cff => {
            pdf.stream(data_id, &embedded.data)
                .pair(Name(b"Subtype"), Name(b"OpenType"));
        }
    }

    let [x_min, y_min, x_max, y_max] = embedded.bbox;
    let mut descriptor = pdf.font_descriptor(descriptor_id);
    descriptor
        .name(Name(ps_name))
        .flags(FontFlags::NON_SYMBOLIC)
        .bbox(Rect::new(x_min, y_min, x_max, y_max))
        .italic_angle(0.0)
        .ascent(embedded.ascent)
        .descent(embedded.descent)
        .cap_height(embedded.cap_height)
        .stem_v(80.0);
    match embedded.flavor {
        OutlineFlavor::TrueType => descriptor.font_file2(data_id),
        OutlineFlavor::Cff => descriptor.font_file3(data_id),
    };
    drop(descriptor);

    let subtype: &[u8] = match embedded.flavor {
        OutlineFlavor::TrueType => b"TrueType",
        OutlineFlavor::Cff => b"Type1",
    };
    let mut dict = pdf.indirect(font_id).dict();
    dict.pair(Name(b"Type"), Name(b"Font"));
    dict.pair(Name(b"Subtype"), Name(subtype));
    dict.pair(Name(b"BaseFont"), Name(ps_name));
    dict.pair(Name(b"Encoding"), Name(b"WinAnsiEncoding"));
    dict.pair(Name(b"FirstChar"), i32::from(FIRST_CHAR));
    dict.pair(Name(b"LastChar"), i32::from(LAST_CHAR));
    dict.pair(Name(b"FontDescriptor"), descriptor_id);
    dict.insert(Name(b"Widths"))
        .array()
        .items(widths.iter().copied());
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

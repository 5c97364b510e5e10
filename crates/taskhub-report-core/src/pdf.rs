//! Markdown-to-PDF rendering
//!
//! Text-only rendering with the built-in Helvetica fonts: headings and
//! bullets become sized text runs, inline markers are stripped, long
//! lines wrap on an estimated character budget. Good enough for
//! productivity reports; not a general markdown engine.

use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerIndex, PdfPageIndex};

use taskhub_types::Report;

use crate::ReportError;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 18.0;
const FOOTER_MM: f32 = 14.0;

/// Points to millimetres
const PT_TO_MM: f32 = 0.352_778;
/// Average Helvetica glyph width as a fraction of the font size
const AVG_GLYPH_WIDTH_EM: f32 = 0.5;

/// Renders reports into PDF bytes
#[derive(Debug, Clone, Default)]
pub struct PdfRenderer;

struct PageWriter<'a> {
    doc: &'a printpdf::PdfDocumentReference,
    pages: Vec<(PdfPageIndex, PdfLayerIndex)>,
    cursor_mm: f32,
}

impl<'a> PageWriter<'a> {
    fn new(
        doc: &'a printpdf::PdfDocumentReference,
        first_page: PdfPageIndex,
        first_layer: PdfLayerIndex,
    ) -> Self {
        Self {
            doc,
            pages: vec![(first_page, first_layer)],
            cursor_mm: PAGE_HEIGHT_MM - MARGIN_MM,
        }
    }

    fn advance(&mut self, line_height_mm: f32) {
        if self.cursor_mm - line_height_mm < FOOTER_MM + MARGIN_MM {
            let (page, layer) = self
                .doc
                .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "content");
            self.pages.push((page, layer));
            self.cursor_mm = PAGE_HEIGHT_MM - MARGIN_MM;
        }
        self.cursor_mm -= line_height_mm;
    }

    fn write_line(&mut self, text: &str, size_pt: f32, font: &IndirectFontRef, indent_mm: f32) {
        self.advance(size_pt * 1.45 * PT_TO_MM);
        let (page, layer) = *self.pages.last().expect("at least one page");
        self.doc
            .get_page(page)
            .get_layer(layer)
            .use_text(text, size_pt, Mm(MARGIN_MM + indent_mm), Mm(self.cursor_mm), font);
    }

    fn write_wrapped(
        &mut self,
        text: &str,
        size_pt: f32,
        font: &IndirectFontRef,
        indent_mm: f32,
    ) {
        let usable_mm = PAGE_WIDTH_MM - 2.0 * MARGIN_MM - indent_mm;
        let glyph_mm = size_pt * AVG_GLYPH_WIDTH_EM * PT_TO_MM;
        let budget = ((usable_mm / glyph_mm) as usize).max(16);

        for line in wrap_text(text, budget) {
            self.write_line(&line, size_pt, font, indent_mm);
        }
    }

    fn blank(&mut self, size_pt: f32) {
        self.advance(size_pt * 1.45 * PT_TO_MM);
    }
}

impl PdfRenderer {
    /// Create a renderer
    pub fn new() -> Self {
        Self
    }

    /// Render a report to PDF bytes
    pub fn render(&self, report: &Report) -> Result<Vec<u8>, ReportError> {
        let (doc, first_page, first_layer) = PdfDocument::new(
            &report.title,
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "content",
        );
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ReportError::Render(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ReportError::Render(e.to_string()))?;

        let mut writer = PageWriter::new(&doc, first_page, first_layer);

        // Header block
        writer.write_line("AI Analysis Report", 20.0, &bold, 0.0);
        writer.blank(6.0);
        writer.write_wrapped(&strip_inline_markers(&report.title), 16.0, &bold, 0.0);
        writer.write_line(
            &format!("Generated: {}", format_timestamp(report.created_at)),
            10.0,
            &regular,
            0.0,
        );
        writer.blank(10.0);

        // Body
        for raw_line in report.content.lines() {
            let line = raw_line.trim_end();
            if line.trim().is_empty() {
                writer.blank(6.0);
            } else if let Some(heading) = line.strip_prefix("### ") {
                writer.blank(3.0);
                writer.write_wrapped(&strip_inline_markers(heading), 12.0, &bold, 0.0);
            } else if let Some(heading) = line.strip_prefix("## ") {
                writer.blank(4.0);
                writer.write_wrapped(&strip_inline_markers(heading), 14.0, &bold, 0.0);
            } else if let Some(heading) = line.strip_prefix("# ") {
                writer.blank(4.0);
                writer.write_wrapped(&strip_inline_markers(heading), 16.0, &bold, 0.0);
            } else if let Some(item) = line.strip_prefix("- ") {
                let text = format!("\u{2022} {}", strip_inline_markers(item));
                writer.write_wrapped(&text, 11.0, &regular, 4.0);
            } else if line.trim() == "---" {
                writer.write_line(&"-".repeat(50), 11.0, &regular, 0.0);
            } else {
                writer.write_wrapped(&strip_inline_markers(line), 11.0, &regular, 0.0);
            }
        }

        // Footer with page numbers; release the writer's borrow of the
        // document before saving consumes it
        let pages = std::mem::take(&mut writer.pages);
        drop(writer);

        let total = pages.len();
        for (number, (page, layer)) in pages.into_iter().enumerate() {
            let text = format!("Page {} of {}", number + 1, total);
            doc.get_page(page).get_layer(layer).use_text(
                text,
                9.0,
                Mm(PAGE_WIDTH_MM / 2.0 - 10.0),
                Mm(FOOTER_MM),
                &regular,
            );
        }

        doc.save_to_bytes()
            .map_err(|e| ReportError::Render(e.to_string()))
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Strip inline markdown markers, keeping the text:
/// `**bold**`, `*italic*`, `` `code` `` and `[text](url)`.
pub fn strip_inline_markers(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' | '`' => i += 1,
            '[' => {
                // [text](url) keeps text, drops url; a bare '[' is literal
                if let Some(close) = find_from(&chars, i + 1, ']') {
                    if chars.get(close + 1) == Some(&'(') {
                        if let Some(paren) = find_from(&chars, close + 2, ')') {
                            out.extend(&chars[i + 1..close]);
                            i = paren + 1;
                            continue;
                        }
                    }
                }
                out.push('[');
                i += 1;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

fn find_from(chars: &[char], start: usize, needle: char) -> Option<usize> {
    chars[start..].iter().position(|&c| c == needle).map(|p| p + start)
}

/// Greedy word wrap on a character budget; overlong words are split hard
fn wrap_text(text: &str, budget: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > budget {
            lines.push(std::mem::take(&mut current));
        }
        if word.chars().count() > budget {
            // Hard-split a word that can never fit
            let mut chunk = String::new();
            for c in word.chars() {
                if chunk.chars().count() == budget {
                    lines.push(std::mem::take(&mut chunk));
                }
                chunk.push(c);
            }
            current = chunk;
            continue;
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

//! A plotters backend that records vector drawing operations into a PDF page.
//!
//! The page is set up so that one figure pixel maps to 0.72pt (a 100 dpi
//! figure on a 72 dpi page) with the origin at the top-left corner, which lets
//! every drawing call use backend pixel coordinates unchanged. Text uses the
//! standard Helvetica font, so nothing has to be embedded.
use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str, TextStr};
use plotters_backend::text_anchor::{HPos, VPos};
use plotters_backend::{
    BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingBackend, DrawingErrorKind, FontTransform,
};
use std::convert::Infallible;

/// Points per figure pixel.
pub const POINTS_PER_PIXEL: f64 = 0.72;

const FONT_NAME: Name<'static> = Name(b"F1");

/// Bezier handle length of a quarter circle, relative to the radius.
const KAPPA: f32 = 0.552_284_8;

/// Records drawing operations into a page content stream.
pub struct PdfBackend<'a> {
    size: (u32, u32),
    content: &'a mut Content,
}

impl<'a> PdfBackend<'a> {
    pub fn new(content: &'a mut Content, size: (u32, u32)) -> Self {
        let (_, height) = page_size(size);
        let scale = POINTS_PER_PIXEL as f32;
        content.transform([scale, 0.0, 0.0, -scale, 0.0, height]);
        PdfBackend { size, content }
    }

    fn set_stroke(&mut self, color: BackendColor, width: u32) {
        let (r, g, b) = rgb(color);
        self.content.set_stroke_rgb(r, g, b);
        self.content.set_line_width(width.max(1) as f32);
    }

    fn set_fill(&mut self, color: BackendColor) {
        let (r, g, b) = rgb(color);
        self.content.set_fill_rgb(r, g, b);
    }

    fn trace<I: IntoIterator<Item = BackendCoord>>(&mut self, path: I) -> bool {
        let mut points = path.into_iter();
        let Some((x, y)) = points.next() else {
            return false;
        };
        self.content.move_to(x as f32, y as f32);
        for (x, y) in points {
            self.content.line_to(x as f32, y as f32);
        }
        true
    }
}

/// Page size in points for a figure size in pixels.
pub fn page_size((width, height): (u32, u32)) -> (f32, f32) {
    ((width as f64 * POINTS_PER_PIXEL) as f32, (height as f64 * POINTS_PER_PIXEL) as f32)
}

fn rgb(color: BackendColor) -> (f32, f32, f32) {
    let (r, g, b) = color.rgb;
    (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
}

fn invisible(color: &BackendColor) -> bool {
    color.alpha <= 0.0
}

/// Helvetica advance width of `c` in em.
fn char_width(c: char) -> f64 {
    match c {
        ' ' | '.' | ',' | ':' | ';' | '!' | '|' | 'i' | 'j' | 'l' | 'I' | '\'' => 0.278,
        'f' | 't' | 'r' | '/' | '(' | ')' | '[' | ']' | '-' => 0.333,
        '0'..='9' | '#' | '$' | '_' => 0.556,
        'm' | 'M' | 'W' | '%' => 0.833,
        'w' => 0.722,
        'a'..='z' => 0.52,
        'A'..='Z' | '&' => 0.667,
        _ => 0.584,
    }
}

/// Estimated width and height in pixels of `text` at `size`.
fn text_extent(text: &str, size: f64) -> (f64, f64) {
    (text.chars().map(char_width).sum::<f64>() * size, size)
}

/// Helvetica is shown through its built-in encoding, so only printable ASCII survives; the rest becomes '?'.
fn encode(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c as u8 } else { b'?' })
        .collect()
}

impl DrawingBackend for PdfBackend<'_> {
    type ErrorType = Infallible;

    fn get_size(&self) -> (u32, u32) {
        self.size
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<Infallible>> {
        Ok(())
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<Infallible>> {
        Ok(())
    }

    fn draw_pixel(&mut self, point: BackendCoord, color: BackendColor) -> Result<(), DrawingErrorKind<Infallible>> {
        if invisible(&color) {
            return Ok(());
        }
        self.set_fill(color);
        self.content.rect(point.0 as f32, point.1 as f32, 1.0, 1.0);
        self.content.fill_nonzero();
        Ok(())
    }

    fn draw_line<S: BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Infallible>> {
        if invisible(&style.color()) {
            return Ok(());
        }
        self.set_stroke(style.color(), style.stroke_width());
        self.trace([from, to]);
        self.content.stroke();
        Ok(())
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Infallible>> {
        if invisible(&style.color()) {
            return Ok(());
        }
        let (x0, y0) = (upper_left.0.min(bottom_right.0), upper_left.1.min(bottom_right.1));
        let (x1, y1) = (upper_left.0.max(bottom_right.0), upper_left.1.max(bottom_right.1));
        if fill {
            self.set_fill(style.color());
            self.content.rect(x0 as f32, y0 as f32, (x1 - x0 + 1) as f32, (y1 - y0 + 1) as f32);
            self.content.fill_nonzero();
        } else {
            self.set_stroke(style.color(), style.stroke_width());
            self.content.rect(x0 as f32, y0 as f32, (x1 - x0) as f32, (y1 - y0) as f32);
            self.content.stroke();
        }
        Ok(())
    }

    fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        path: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Infallible>> {
        if invisible(&style.color()) {
            return Ok(());
        }
        self.set_stroke(style.color(), style.stroke_width());
        if self.trace(path) {
            self.content.stroke();
        }
        Ok(())
    }

    fn draw_circle<S: BackendStyle>(
        &mut self,
        center: BackendCoord,
        radius: u32,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Infallible>> {
        if invisible(&style.color()) {
            return Ok(());
        }
        let (cx, cy, r) = (center.0 as f32, center.1 as f32, radius as f32);
        let k = r * KAPPA;
        if fill {
            self.set_fill(style.color());
        } else {
            self.set_stroke(style.color(), style.stroke_width());
        }
        self.content.move_to(cx + r, cy);
        self.content.cubic_to(cx + r, cy + k, cx + k, cy + r, cx, cy + r);
        self.content.cubic_to(cx - k, cy + r, cx - r, cy + k, cx - r, cy);
        self.content.cubic_to(cx - r, cy - k, cx - k, cy - r, cx, cy - r);
        self.content.cubic_to(cx + k, cy - r, cx + r, cy - k, cx + r, cy);
        self.content.close_path();
        if fill {
            self.content.fill_nonzero();
        } else {
            self.content.stroke();
        }
        Ok(())
    }

    fn fill_polygon<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        vert: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Infallible>> {
        if invisible(&style.color()) {
            return Ok(());
        }
        self.set_fill(style.color());
        if self.trace(vert) {
            self.content.close_path();
            self.content.fill_nonzero();
        }
        Ok(())
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<Infallible>> {
        let color = style.color();
        if invisible(&color) || text.trim().is_empty() {
            return Ok(());
        }
        let size = style.size();
        let (width, _) = text_extent(text, size);

        // glyph advance and glyph "up" directions in page pixels
        let (a, b, c, d) = match style.transform() {
            FontTransform::Rotate90 => (0.0, 1.0, 1.0, 0.0),
            FontTransform::Rotate180 => (-1.0, 0.0, 0.0, 1.0),
            FontTransform::Rotate270 => (0.0, -1.0, -1.0, 0.0),
            _ => (1.0, 0.0, 0.0, -1.0),
        };
        let along = match style.anchor().h_pos {
            HPos::Left => 0.0,
            HPos::Center => -width / 2.0,
            HPos::Right => -width,
        };
        let down = match style.anchor().v_pos {
            VPos::Top => 0.8 * size,
            VPos::Center => 0.3 * size,
            VPos::Bottom => -0.2 * size,
        };
        let x = pos.0 as f64 + along * a - down * c;
        let y = pos.1 as f64 + along * b - down * d;

        self.set_fill(color);
        self.content.begin_text();
        self.content.set_font(FONT_NAME, size as f32);
        self.content.set_text_matrix([a as f32, b as f32, c as f32, d as f32, x as f32, y as f32]);
        self.content.show(Str(&encode(text)));
        self.content.end_text();
        Ok(())
    }

    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<Infallible>> {
        let (width, height) = text_extent(text, style.size());
        Ok((width.ceil() as u32, height.ceil() as u32))
    }
}

/// Wraps a finished page content stream into a single-page PDF document.
pub fn write_document(content: Content, size: (u32, u32), title: &str) -> Vec<u8> {
    let catalog_id = Ref::new(1);
    let page_tree_id = Ref::new(2);
    let page_id = Ref::new(3);
    let font_id = Ref::new(4);
    let content_id = Ref::new(5);
    let info_id = Ref::new(6);
    let (width, height) = page_size(size);

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id).kids([page_id]).count(1);

    let mut page = pdf.page(page_id);
    page.media_box(Rect::new(0.0, 0.0, width, height));
    page.parent(page_tree_id);
    page.contents(content_id);
    page.resources().fonts().pair(FONT_NAME, font_id);
    page.finish();

    pdf.type1_font(font_id).base_font(Name(b"Helvetica"));
    pdf.stream(content_id, &content.finish());
    pdf.document_info(info_id)
        .title(TextStr(title))
        .creator(TextStr(env!("CARGO_PKG_NAME")));
    pdf.finish()
}

//! Minimal PDF 1.4 writer
//!
//! Produces multi-page documents with Helvetica text and JPEG images.
//! Layout coordinates are millimetres from the top-left corner of the page,
//! with text positioned at its baseline.
//!
//! ## WASM Compatibility
//!
//! Output is plain bytes with no file system access, so documents can be
//! built anywhere and handed to a [`StorageBackend`](crate::storage::StorageBackend).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ExportError;

/// Points per millimetre
pub const PT_PER_MM: f64 = 2.83465;

/// Page size options
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    /// A4 paper size (210 x 297 mm)
    #[default]
    A4,
    /// US Letter size (8.5 x 11 inches)
    Letter,
}

impl PageSize {
    /// Portrait dimensions in millimetres (width, height)
    pub fn dimensions_mm(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::Letter => (215.9, 279.4),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// A baseline JPEG ready for embedding as a `DCTDecode` XObject
#[derive(Debug, Clone, PartialEq)]
pub struct JpegImage {
    pub width_px: u32,
    pub height_px: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
enum PageItem {
    Text {
        x: f64,
        y: f64,
        size: f64,
        text: String,
    },
    Image {
        index: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

/// One page of a [`PdfDocument`]
#[derive(Debug, Clone, PartialEq)]
pub struct PdfPage {
    width_mm: f64,
    height_mm: f64,
    items: Vec<PageItem>,
}

impl PdfPage {
    pub fn width_mm(&self) -> f64 {
        self.width_mm
    }

    pub fn height_mm(&self) -> f64 {
        self.height_mm
    }

    pub fn orientation(&self) -> Orientation {
        if self.width_mm > self.height_mm {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }

    /// Text lines on the page, in drawing order
    pub fn texts(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|item| match item {
                PageItem::Text { text, .. } => Some(text.as_str()),
                PageItem::Image { .. } => None,
            })
            .collect()
    }

    pub fn image_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, PageItem::Image { .. }))
            .count()
    }

    /// Placement of each image as (x, y, width, height) in millimetres
    pub fn image_placements(&self) -> Vec<(f64, f64, f64, f64)> {
        self.items
            .iter()
            .filter_map(|item| match item {
                PageItem::Image {
                    x, y, width, height, ..
                } => Some((*x, *y, *width, *height)),
                PageItem::Text { .. } => None,
            })
            .collect()
    }
}

/// Document under construction
///
/// # Example
///
/// ```rust
/// use anomalyze_sdk::export::pdf::{Orientation, PageSize, PdfDocument};
///
/// let mut doc = PdfDocument::new("Report");
/// doc.add_page(PageSize::A4, Orientation::Portrait);
/// doc.text(14.0, 20.0, 20.0, "Report").unwrap();
/// let bytes = doc.to_bytes().unwrap();
/// assert!(bytes.starts_with(b"%PDF-1.4"));
/// ```
#[derive(Debug, Clone)]
pub struct PdfDocument {
    title: String,
    text_color: [u8; 3],
    created: DateTime<Utc>,
    pages: Vec<PdfPage>,
    images: Vec<JpegImage>,
}

impl PdfDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text_color: [50, 50, 50],
            created: Utc::now(),
            pages: Vec::new(),
            images: Vec::new(),
        }
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = created;
        self
    }

    pub fn set_text_color(&mut self, color: [u8; 3]) {
        self.text_color = color;
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn pages(&self) -> &[PdfPage] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Start a new page; subsequent drawing goes to it
    pub fn add_page(&mut self, size: PageSize, orientation: Orientation) {
        let (w, h) = size.dimensions_mm();
        let (width_mm, height_mm) = match orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        };
        self.pages.push(PdfPage {
            width_mm,
            height_mm,
            items: Vec::new(),
        });
    }

    /// Width of the current page
    pub fn page_width(&self) -> Option<f64> {
        self.pages.last().map(|p| p.width_mm)
    }

    /// Write `text` with its baseline starting at (x, y)
    pub fn text(&mut self, x: f64, y: f64, size: f64, text: &str) -> Result<(), ExportError> {
        check_finite(&[x, y, size])?;
        let page = self.current_page()?;
        page.items.push(PageItem::Text {
            x,
            y,
            size,
            text: text.to_string(),
        });
        Ok(())
    }

    /// Write `text` horizontally centred on the current page
    pub fn text_centered(&mut self, y: f64, size: f64, text: &str) -> Result<(), ExportError> {
        let page_width = self
            .page_width()
            .ok_or_else(|| assembly("no page to draw on"))?;
        let x = (page_width - text_width_mm(text, size)) / 2.0;
        self.text(x, y, size, text)
    }

    /// Place an image with its top-left corner at (x, y)
    pub fn image(
        &mut self,
        image: JpegImage,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), ExportError> {
        check_finite(&[x, y, width, height])?;
        if image.width_px == 0 || image.height_px == 0 || image.data.is_empty() {
            return Err(assembly("image has no pixels"));
        }
        if width <= 0.0 || height <= 0.0 {
            return Err(assembly("image placement has no area"));
        }
        let index = self.images.len();
        self.current_page()?.items.push(PageItem::Image {
            index,
            x,
            y,
            width,
            height,
        });
        self.images.push(image);
        Ok(())
    }

    fn current_page(&mut self) -> Result<&mut PdfPage, ExportError> {
        self.pages
            .last_mut()
            .ok_or_else(|| assembly("no page to draw on"))
    }

    /// Serialize the document
    ///
    /// Objects: 1 catalog, 2 page tree, 3 font, 4 info, then one XObject per
    /// image, then a page and content stream pair per page.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ExportError> {
        if self.pages.is_empty() {
            return Err(assembly("document has no pages"));
        }

        let first_image = 5;
        let first_page = first_image + self.images.len();
        let page_ids: Vec<usize> = (0..self.pages.len()).map(|i| first_page + i * 2).collect();

        let mut pdf = Vec::new();
        pdf.extend_from_slice(b"%PDF-1.4\n");
        pdf.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");
        let mut offsets: Vec<usize> = Vec::new();

        let mut begin = |pdf: &mut Vec<u8>, id: usize| {
            debug_assert_eq!(offsets.len() + 1, id);
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n", id).as_bytes());
        };

        begin(&mut pdf, 1);
        pdf.extend_from_slice(b"<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

        begin(&mut pdf, 2);
        let kids: Vec<String> = page_ids.iter().map(|id| format!("{} 0 R", id)).collect();
        pdf.extend_from_slice(
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n",
                kids.join(" "),
                self.pages.len()
            )
            .as_bytes(),
        );

        begin(&mut pdf, 3);
        pdf.extend_from_slice(
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>\nendobj\n",
        );

        begin(&mut pdf, 4);
        pdf.extend_from_slice(b"<< /Title ");
        pdf.extend_from_slice(&pdf_string(&self.title));
        pdf.extend_from_slice(
            format!(
                " /Producer (Anomalyze SDK) /CreationDate (D:{}) >>\nendobj\n",
                self.created.format("%Y%m%d%H%M%SZ")
            )
            .as_bytes(),
        );

        for (i, image) in self.images.iter().enumerate() {
            begin(&mut pdf, first_image + i);
            pdf.extend_from_slice(
                format!(
                    "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>\nstream\n",
                    image.width_px,
                    image.height_px,
                    image.data.len()
                )
                .as_bytes(),
            );
            pdf.extend_from_slice(&image.data);
            pdf.extend_from_slice(b"\nendstream\nendobj\n");
        }

        for (page, &page_id) in self.pages.iter().zip(&page_ids) {
            let xobjects: Vec<String> = page
                .items
                .iter()
                .filter_map(|item| match item {
                    PageItem::Image { index, .. } => {
                        Some(format!("/Im{} {} 0 R", index, first_image + index))
                    }
                    PageItem::Text { .. } => None,
                })
                .collect();

            begin(&mut pdf, page_id);
            pdf.extend_from_slice(
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] /Contents {} 0 R /Resources << /Font << /F1 3 0 R >> /XObject << {} >> >> >>\nendobj\n",
                    page.width_mm * PT_PER_MM,
                    page.height_mm * PT_PER_MM,
                    page_id + 1,
                    xobjects.join(" ")
                )
                .as_bytes(),
            );

            let stream = self.content_stream(page);
            begin(&mut pdf, page_id + 1);
            pdf.extend_from_slice(format!("<< /Length {} >>\nstream\n", stream.len()).as_bytes());
            pdf.extend_from_slice(&stream);
            pdf.extend_from_slice(b"\nendstream\nendobj\n");
        }

        let xref_start = pdf.len();
        pdf.extend_from_slice(format!("xref\n0 {}\n", offsets.len() + 1).as_bytes());
        pdf.extend_from_slice(b"0000000000 65535 f \n");
        for pos in &offsets {
            pdf.extend_from_slice(format!("{:010} 00000 n \n", pos).as_bytes());
        }
        pdf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R /Info 4 0 R >>\nstartxref\n{}\n%%EOF\n",
                offsets.len() + 1,
                xref_start
            )
            .as_bytes(),
        );

        Ok(pdf)
    }

    fn content_stream(&self, page: &PdfPage) -> Vec<u8> {
        let height_pt = page.height_mm * PT_PER_MM;
        let [r, g, b] = self.text_color.map(|c| f64::from(c) / 255.0);
        let mut stream = Vec::new();

        for item in &page.items {
            match item {
                PageItem::Text { x, y, size, text } => {
                    stream.extend_from_slice(
                        format!(
                            "BT\n{:.3} {:.3} {:.3} rg\n/F1 {:.1} Tf\n{:.2} {:.2} Td\n",
                            r,
                            g,
                            b,
                            size,
                            x * PT_PER_MM,
                            height_pt - y * PT_PER_MM
                        )
                        .as_bytes(),
                    );
                    stream.extend_from_slice(&pdf_string(text));
                    stream.extend_from_slice(b" Tj\nET\n");
                }
                PageItem::Image {
                    index,
                    x,
                    y,
                    width,
                    height,
                } => {
                    let w = width * PT_PER_MM;
                    let h = height * PT_PER_MM;
                    stream.extend_from_slice(
                        format!(
                            "q\n{:.2} 0 0 {:.2} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
                            w,
                            h,
                            x * PT_PER_MM,
                            height_pt - y * PT_PER_MM - h,
                            index
                        )
                        .as_bytes(),
                    );
                }
            }
        }
        stream
    }
}

fn assembly(message: &str) -> ExportError {
    ExportError::DocumentAssemblyFailure(message.to_string())
}

fn check_finite(values: &[f64]) -> Result<(), ExportError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(assembly("layout coordinate is not finite"))
    }
}

/// Encode a literal string in WinAnsi, escaping delimiters
///
/// Characters outside Latin-1 become `?`.
fn pdf_string(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len() + 2);
    out.push(b'(');
    for c in s.chars() {
        match c {
            '\\' | '(' | ')' => {
                out.push(b'\\');
                out.push(c as u8);
            }
            '\n' => out.extend_from_slice(b"\\n"),
            '\r' => out.extend_from_slice(b"\\r"),
            '\t' => out.extend_from_slice(b"\\t"),
            c if c.is_ascii() => out.push(c as u8),
            c if (c as u32) < 0x100 => out.extend_from_slice(format!("\\{:03o}", c as u32).as_bytes()),
            _ => out.push(b'?'),
        }
    }
    out.push(b')');
    out
}

/// Helvetica advance widths for printable ASCII, in 1/1000 em
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Rendered width of `text` in millimetres at `size` points
pub fn text_width_mm(text: &str, size: f64) -> f64 {
    let units: u32 = text
        .chars()
        .map(|c| match c {
            ' '..='~' => u32::from(HELVETICA_WIDTHS[c as usize - 32]),
            _ => 556,
        })
        .sum();
    f64::from(units) / 1000.0 * size / PT_PER_MM
}

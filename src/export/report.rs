//! Report export
//!
//! Turns chart regions into a paginated PDF. The `export_*` methods report
//! through notifications only and return `None` on failure; the `build_*`
//! and `try_export_*` methods expose the typed error.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose;
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::config::ExportConfig;
use super::pdf::{JpegImage, Orientation, PdfDocument};
use super::raster::{Capture, ChartRegion, Rasterizer};
use super::ExportError;
use crate::notify::{Notification, Notifier, TracingNotifier};
use crate::storage::StorageBackend;

/// Page width the single-chart orientation is judged against (mm)
const SINGLE_REFERENCE_WIDTH: f64 = 210.0;
const SINGLE_IMAGE: (f64, f64, f64) = (10.0, 40.0, 190.0);
const SECTION_IMAGE: (f64, f64, f64) = (15.0, 30.0, 180.0);

/// Result of PDF export operation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PdfExportResult {
    /// PDF content as base64-encoded bytes
    pub pdf_base64: String,
    /// File name the document was saved under
    pub filename: String,
    /// Number of pages
    pub page_count: u32,
    /// Document title
    pub title: String,
}

impl PdfExportResult {
    /// Decode the PDF bytes
    pub fn pdf_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        general_purpose::STANDARD.decode(&self.pdf_base64)
    }
}

/// Exports chart regions as PDF reports
pub struct ReportExporter {
    config: ExportConfig,
    rasterizer: Rasterizer,
    storage: Option<Arc<dyn StorageBackend>>,
    notifier: Arc<dyn Notifier>,
}

impl ReportExporter {
    pub fn new(config: ExportConfig) -> Result<Self, ExportError> {
        let rasterizer = Rasterizer::from_hex(config.scale, &config.background)?;
        Ok(Self {
            config,
            rasterizer,
            storage: None,
            notifier: Arc::new(TracingNotifier),
        })
    }

    /// Save finished documents to `storage`, keyed by file name
    pub fn with_storage(mut self, storage: Arc<dyn StorageBackend>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export one region, notifying on progress and outcome
    pub async fn export_single(
        &self,
        region: &dyn ChartRegion,
        filename: Option<&str>,
        title: Option<&str>,
    ) -> Option<PdfExportResult> {
        self.notifier
            .notify(Notification::info("Preparing your PDF report..."));
        let outcome = self.try_export_single(region, filename, title).await;
        self.finish(outcome, "PDF report downloaded successfully!")
    }

    /// Export a title page plus one page per region, notifying on outcome
    pub async fn export_multiple(
        &self,
        regions: &[&dyn ChartRegion],
        filename: Option<&str>,
        title: Option<&str>,
    ) -> Option<PdfExportResult> {
        if regions.is_empty() {
            return self.finish(Err(ExportError::NoRegions), "");
        }
        self.notifier
            .notify(Notification::info("Preparing comprehensive PDF report..."));
        let outcome = self.try_export_multiple(regions, filename, title).await;
        self.finish(outcome, "Comprehensive PDF report downloaded successfully!")
    }

    pub async fn try_export_single(
        &self,
        region: &dyn ChartRegion,
        filename: Option<&str>,
        title: Option<&str>,
    ) -> Result<PdfExportResult, ExportError> {
        let document = self.build_single(region, title)?;
        let filename = filename.unwrap_or(&self.config.default_filename);
        self.save(document, filename).await
    }

    pub async fn try_export_multiple(
        &self,
        regions: &[&dyn ChartRegion],
        filename: Option<&str>,
        title: Option<&str>,
    ) -> Result<PdfExportResult, ExportError> {
        let document = self.build_multiple(regions, title)?;
        let filename = filename.unwrap_or(&self.config.multi_filename);
        self.save(document, filename).await
    }

    /// Lay out a single-chart document
    ///
    /// The page is portrait when the capture, scaled to a full A4 width,
    /// would be taller than that width, and landscape otherwise.
    pub fn build_single(
        &self,
        region: &dyn ChartRegion,
        title: Option<&str>,
    ) -> Result<PdfDocument, ExportError> {
        let title = title.unwrap_or(&self.config.title);
        let capture = self.rasterizer.capture(region)?;
        let orientation = if capture.scaled_height(SINGLE_REFERENCE_WIDTH) > SINGLE_REFERENCE_WIDTH {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        };

        let mut document = PdfDocument::new(title);
        document.add_page(self.config.page_size, orientation);
        document.text(14.0, 20.0, 20.0, title)?;
        document.text(14.0, 28.0, 10.0, &generated_line())?;
        let (x, y, width) = SINGLE_IMAGE;
        place(&mut document, &capture, x, y, width)?;

        debug!(?orientation, "Laid out single-chart report");
        Ok(document)
    }

    /// Lay out a title page followed by one page per region
    ///
    /// Regions are captured one at a time, in order. Untitled regions are
    /// labelled `Chart N` by position.
    pub fn build_multiple(
        &self,
        regions: &[&dyn ChartRegion],
        title: Option<&str>,
    ) -> Result<PdfDocument, ExportError> {
        if regions.is_empty() {
            return Err(ExportError::NoRegions);
        }
        let title = title.unwrap_or(&self.config.multi_title);

        let mut document = PdfDocument::new(title);
        document.add_page(self.config.page_size, Orientation::Portrait);
        document.text_centered(40.0, 24.0, title)?;
        document.text_centered(50.0, 12.0, &generated_line())?;

        for (i, region) in regions.iter().enumerate() {
            let capture = self.rasterizer.capture(*region)?;
            let section = match region.title() {
                Some(t) if !t.is_empty() => t.to_string(),
                _ => format!("Chart {}", i + 1),
            };
            document.add_page(self.config.page_size, Orientation::Portrait);
            document.text(15.0, 20.0, 16.0, &section)?;
            let (x, y, width) = SECTION_IMAGE;
            place(&mut document, &capture, x, y, width)?;
            debug!(section = %section, "Captured chart region");
        }
        Ok(document)
    }

    async fn save(
        &self,
        document: PdfDocument,
        filename: &str,
    ) -> Result<PdfExportResult, ExportError> {
        let bytes = document.to_bytes()?;
        if let Some(storage) = &self.storage {
            storage.write_file(filename, &bytes).await?;
        }
        info!(
            filename,
            pages = document.page_count(),
            bytes = bytes.len(),
            "PDF report generated"
        );
        Ok(PdfExportResult {
            pdf_base64: general_purpose::STANDARD.encode(&bytes),
            filename: filename.to_string(),
            page_count: document.page_count() as u32,
            title: document.title().to_string(),
        })
    }

    fn finish(
        &self,
        outcome: Result<PdfExportResult, ExportError>,
        success: &str,
    ) -> Option<PdfExportResult> {
        match outcome {
            Ok(result) => {
                self.notifier.notify(Notification::success(success));
                Some(result)
            }
            Err(e) => {
                error!(error = %e, "Error exporting PDF");
                self.notifier.notify(Notification::error(e.user_message()));
                None
            }
        }
    }
}

fn generated_line() -> String {
    format!("Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))
}

fn place(
    document: &mut PdfDocument,
    capture: &Capture,
    x: f64,
    y: f64,
    width: f64,
) -> Result<(), ExportError> {
    let image = JpegImage {
        width_px: capture.width(),
        height_px: capture.height(),
        data: capture.to_jpeg()?,
    };
    document.image(image, x, y, width, capture.scaled_height(width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MemoryNotifier;
    use image::{Rgba, RgbaImage};

    struct Block {
        title: Option<&'static str>,
        size: (u32, u32),
    }

    impl ChartRegion for Block {
        fn title(&self) -> Option<&str> {
            self.title
        }

        fn size(&self) -> (u32, u32) {
            self.size
        }

        fn render(&self, scale: f32) -> Result<RgbaImage, String> {
            let w = (self.size.0 as f32 * scale) as u32;
            let h = (self.size.1 as f32 * scale) as u32;
            Ok(RgbaImage::from_pixel(w, h, Rgba([40, 120, 200, 255])))
        }
    }

    fn exporter() -> (ReportExporter, Arc<MemoryNotifier>) {
        let notifier = Arc::new(MemoryNotifier::new());
        let exporter = ReportExporter::new(ExportConfig::default())
            .unwrap()
            .with_notifier(notifier.clone());
        (exporter, notifier)
    }

    #[test]
    fn test_wide_capture_is_landscape() {
        let (exporter, _) = exporter();
        let doc = exporter
            .build_single(&Block { title: None, size: (400, 200) }, None)
            .unwrap();
        let page = &doc.pages()[0];
        assert_eq!(page.orientation(), Orientation::Landscape);
        assert_eq!(page.texts()[0], "Anomaly Detection Report");
        assert!(page.texts()[1].starts_with("Generated: "));
        let (x, y, w, h) = page.image_placements()[0];
        assert_eq!((x, y, w), (10.0, 40.0, 190.0));
        assert!((h - 95.0).abs() < 1e-9);
    }

    #[test]
    fn test_tall_capture_is_portrait() {
        let (exporter, _) = exporter();
        let doc = exporter
            .build_single(&Block { title: None, size: (100, 150) }, Some("Line 3"))
            .unwrap();
        assert_eq!(doc.pages()[0].orientation(), Orientation::Portrait);
        assert_eq!(doc.title(), "Line 3");
    }

    #[test]
    fn test_square_capture_is_landscape() {
        let (exporter, _) = exporter();
        let doc = exporter
            .build_single(&Block { title: None, size: (100, 100) }, None)
            .unwrap();
        assert_eq!(doc.pages()[0].orientation(), Orientation::Landscape);
    }

    #[test]
    fn test_multiple_has_title_page_and_fallback_titles() {
        let (exporter, _) = exporter();
        let a = Block { title: Some("Temperature"), size: (300, 150) };
        let b = Block { title: None, size: (300, 150) };
        let c = Block { title: Some(""), size: (300, 150) };
        let doc = exporter
            .build_multiple(&[&a, &b, &c], None)
            .unwrap();

        assert_eq!(doc.page_count(), 4);
        let title_page = &doc.pages()[0];
        assert_eq!(title_page.texts()[0], "Factory Anomaly Detection Report");
        assert_eq!(title_page.image_count(), 0);
        assert_eq!(doc.pages()[1].texts(), vec!["Temperature"]);
        assert_eq!(doc.pages()[2].texts(), vec!["Chart 2"]);
        assert_eq!(doc.pages()[3].texts(), vec!["Chart 3"]);
        for page in &doc.pages()[1..] {
            assert_eq!(page.orientation(), Orientation::Portrait);
            let (x, y, w, h) = page.image_placements()[0];
            assert_eq!((x, y, w), (15.0, 30.0, 180.0));
            assert!((h - 90.0).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn test_empty_region_list_notifies() {
        let (exporter, notifier) = exporter();
        assert!(exporter.export_multiple(&[], None, None).await.is_none());
        assert_eq!(notifier.messages(), vec!["No charts found to export"]);
    }

    #[tokio::test]
    async fn test_export_single_notifies_success() {
        let (exporter, notifier) = exporter();
        let result = exporter
            .export_single(&Block { title: None, size: (40, 20) }, None, None)
            .await
            .unwrap();
        assert_eq!(result.filename, "report.pdf");
        assert_eq!(result.page_count, 1);
        assert!(result.pdf_bytes().unwrap().starts_with(b"%PDF-1.4"));
        assert_eq!(
            notifier.messages(),
            vec![
                "Preparing your PDF report...",
                "PDF report downloaded successfully!"
            ]
        );
    }
}

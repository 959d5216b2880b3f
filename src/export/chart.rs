//! Built-in chart regions
//!
//! Charts are drawn without text on a transparent canvas; section titles
//! are written by the document, not the raster.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use rand::Rng;

use super::raster::ChartRegion;
use crate::models::{ReportPeriod, SensorReading, SensorType, generate_anomaly_series};

const DEFAULT_SIZE: (u32, u32) = (600, 300);
const PADDING: f32 = 24.0;
const GRID: Rgba<u8> = Rgba([255, 255, 255, 28]);
const WARNING: Rgba<u8> = Rgba([0xf5, 0x9e, 0x0b, 255]);
const CRITICAL: Rgba<u8> = Rgba([0xef, 0x44, 0x44, 255]);

/// Plot area in device pixels
#[derive(Debug, Clone, Copy)]
struct Plot {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

impl Plot {
    fn new(width: u32, height: u32, scale: f32) -> Option<Self> {
        let pad = PADDING * scale;
        let plot = Self {
            left: pad,
            top: pad,
            right: width as f32 - pad,
            bottom: height as f32 - pad,
        };
        (plot.right > plot.left && plot.bottom > plot.top).then_some(plot)
    }

    fn width(&self) -> f32 {
        self.right - self.left
    }

    fn height(&self) -> f32 {
        self.bottom - self.top
    }

    fn draw_grid(&self, canvas: &mut RgbaImage, lines: u32) {
        for i in 0..=lines {
            let y = self.top + self.height() * i as f32 / lines as f32;
            draw_line_segment_mut(canvas, (self.left, y), (self.right, y), GRID);
        }
    }
}

fn canvas_size(size: (u32, u32), scale: f32) -> Result<(u32, u32), String> {
    let width = (size.0 as f32 * scale).round();
    let height = (size.1 as f32 * scale).round();
    if !(width >= 1.0 && height >= 1.0) {
        return Err(format!("chart has no drawable area at scale {}", scale));
    }
    Ok((width as u32, height as u32))
}

fn rgba([r, g, b]: [u8; 3], alpha: u8) -> Rgba<u8> {
    Rgba([r, g, b, alpha])
}

/// Area/line chart of one sensor's readings with guide lines
#[derive(Debug, Clone)]
pub struct SeriesChart {
    title: Option<String>,
    sensor: SensorType,
    readings: Vec<SensorReading>,
    size: (u32, u32),
}

impl SeriesChart {
    pub fn new(sensor: SensorType, readings: Vec<SensorReading>) -> Self {
        Self {
            title: None,
            sensor,
            readings,
            size: DEFAULT_SIZE,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn readings(&self) -> &[SensorReading] {
        &self.readings
    }

    fn value_range(&self) -> (f64, f64) {
        let (normal_min, _) = self.sensor.normal_range();
        let critical = self.sensor.critical_threshold();
        let (lo, hi) = self
            .readings
            .iter()
            .fold((normal_min, critical), |(lo, hi), r| {
                (lo.min(r.value), hi.max(r.value))
            });
        let span = (hi - lo).max(f64::EPSILON);
        (lo - span * 0.05, hi + span * 0.05)
    }
}

impl ChartRegion for SeriesChart {
    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn render(&self, scale: f32) -> Result<RgbaImage, String> {
        let (width, height) = canvas_size(self.size, scale)?;
        let mut canvas = RgbaImage::new(width, height);
        let Some(plot) = Plot::new(width, height, scale) else {
            return Ok(canvas);
        };
        plot.draw_grid(&mut canvas, 4);

        let (lo, hi) = self.value_range();
        let y_of = |value: f64| plot.bottom - ((value - lo) / (hi - lo)) as f32 * plot.height();
        let step = if self.readings.len() > 1 {
            plot.width() / (self.readings.len() - 1) as f32
        } else {
            0.0
        };
        let points: Vec<(f32, f32)> = self
            .readings
            .iter()
            .enumerate()
            .map(|(i, r)| (plot.left + step * i as f32, y_of(r.value)))
            .collect();

        let color = self.sensor.color();
        for pair in points.windows(2) {
            let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
            for x in x0.round() as i32..=x1.round() as i32 {
                let t = if x1 > x0 { (x as f32 - x0) / (x1 - x0) } else { 0.0 };
                let y = y0 + (y1 - y0) * t.clamp(0.0, 1.0);
                draw_line_segment_mut(
                    &mut canvas,
                    (x as f32, y),
                    (x as f32, plot.bottom),
                    rgba(color, 64),
                );
            }
        }

        let threshold_y = y_of(self.sensor.normal_range().1);
        let critical_y = y_of(self.sensor.critical_threshold());
        let dash = 8.0 * scale;
        let mut x = plot.left;
        while x < plot.right {
            let end = (x + dash).min(plot.right);
            draw_line_segment_mut(&mut canvas, (x, threshold_y), (end, threshold_y), WARNING);
            draw_line_segment_mut(&mut canvas, (x, critical_y), (end, critical_y), CRITICAL);
            x += dash * 2.0;
        }

        for pair in points.windows(2) {
            draw_line_segment_mut(&mut canvas, pair[0], pair[1], rgba(color, 255));
        }

        let radius = (3.0 * scale).round().max(1.0) as i32;
        for (reading, (x, y)) in self.readings.iter().zip(&points) {
            let marker = if reading.is_critical() {
                CRITICAL
            } else if reading.is_anomalous() {
                WARNING
            } else {
                continue;
            };
            draw_filled_circle_mut(&mut canvas, (x.round() as i32, y.round() as i32), radius, marker);
        }

        Ok(canvas)
    }
}

/// One bar of a [`BarChart`]
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub value: f64,
    pub color: [u8; 3],
}

/// Vertical bar chart with bars scaled to the largest value
#[derive(Debug, Clone)]
pub struct BarChart {
    title: Option<String>,
    bars: Vec<Bar>,
    size: (u32, u32),
}

impl BarChart {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self {
            title: None,
            bars,
            size: DEFAULT_SIZE,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }
}

impl ChartRegion for BarChart {
    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn render(&self, scale: f32) -> Result<RgbaImage, String> {
        let (width, height) = canvas_size(self.size, scale)?;
        let mut canvas = RgbaImage::new(width, height);
        let Some(plot) = Plot::new(width, height, scale) else {
            return Ok(canvas);
        };
        plot.draw_grid(&mut canvas, 4);
        if self.bars.is_empty() {
            return Ok(canvas);
        }

        let max = self
            .bars
            .iter()
            .map(|b| b.value)
            .fold(0.0_f64, f64::max)
            .max(f64::EPSILON);
        let slot = plot.width() / self.bars.len() as f32;
        let bar_width = (slot * 0.6).max(1.0);
        for (i, bar) in self.bars.iter().enumerate() {
            let bar_height = (bar.value.max(0.0) / max) as f32 * plot.height();
            if bar_height < 1.0 {
                continue;
            }
            let x = plot.left + slot * i as f32 + (slot - bar_width) / 2.0;
            let rect = Rect::at(x.round() as i32, (plot.bottom - bar_height).round() as i32)
                .of_size(bar_width.round() as u32, bar_height.round() as u32);
            draw_filled_rect_mut(&mut canvas, rect, rgba(bar.color, 230));
        }
        Ok(canvas)
    }
}

/// Mock regions for each section of a report period, in section order
///
/// Distribution sections count anomalous days per sensor, the status
/// overview plots each sensor's latest reading as a share of its critical
/// threshold, and trends chart the temperature series.
pub fn period_regions<R: Rng + ?Sized>(
    period: ReportPeriod,
    rng: &mut R,
) -> Vec<Box<dyn ChartRegion>> {
    let series: Vec<(SensorType, Vec<SensorReading>)> = SensorType::all()
        .into_iter()
        .map(|sensor| (sensor, generate_anomaly_series(sensor, period.days(), rng)))
        .collect();

    period
        .sections()
        .iter()
        .map(|section| -> Box<dyn ChartRegion> {
            if section.ends_with("Distribution") {
                let bars = series
                    .iter()
                    .map(|(sensor, readings)| Bar {
                        value: readings.iter().filter(|r| r.is_anomalous()).count() as f64,
                        color: sensor.color(),
                    })
                    .collect();
                Box::new(BarChart::new(bars).with_title(*section))
            } else if section.ends_with("Overview") {
                let bars = series
                    .iter()
                    .map(|(sensor, readings)| Bar {
                        value: readings.last().map_or(0.0, |r| {
                            r.value / sensor.critical_threshold() * 100.0
                        }),
                        color: sensor.color(),
                    })
                    .collect();
                Box::new(BarChart::new(bars).with_title(*section))
            } else {
                let readings = series
                    .iter()
                    .find(|(sensor, _)| *sensor == SensorType::Temperature)
                    .map(|(_, readings)| readings.clone())
                    .unwrap_or_default();
                Box::new(SeriesChart::new(SensorType::Temperature, readings).with_title(*section))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn series(sensor: SensorType) -> Vec<SensorReading> {
        let mut rng = StdRng::seed_from_u64(7);
        generate_anomaly_series(sensor, 14, &mut rng)
    }

    #[test]
    fn test_series_chart_renders_at_scale() {
        let chart = SeriesChart::new(SensorType::Pressure, series(SensorType::Pressure))
            .with_title("Pressure")
            .with_size(300, 150);
        let image = chart.render(2.0).unwrap();
        assert_eq!(image.dimensions(), (600, 300));
        assert_eq!(chart.title(), Some("Pressure"));
        // corners stay transparent
        assert_eq!(image.get_pixel(0, 0)[3], 0);
        assert!(image.pixels().any(|p| p[3] == 255));
    }

    #[test]
    fn test_series_chart_marks_critical_day() {
        let readings = series(SensorType::Temperature);
        assert!(readings.iter().any(SensorReading::is_critical));
        let image = SeriesChart::new(SensorType::Temperature, readings)
            .render(1.0)
            .unwrap();
        assert!(image.pixels().any(|p| *p == CRITICAL));
    }

    #[test]
    fn test_single_reading_renders() {
        let mut readings = series(SensorType::Speed);
        readings.truncate(1);
        assert!(SeriesChart::new(SensorType::Speed, readings).render(1.0).is_ok());
    }

    #[test]
    fn test_zero_size_fails() {
        let chart = SeriesChart::new(SensorType::Speed, Vec::new()).with_size(0, 100);
        assert!(chart.render(2.0).is_err());
    }

    #[test]
    fn test_bar_chart_draws_bars() {
        let chart = BarChart::new(vec![
            Bar { value: 3.0, color: [255, 0, 0] },
            Bar { value: 0.0, color: [0, 255, 0] },
        ]);
        let image = chart.render(1.0).unwrap();
        assert!(image.pixels().any(|p| *p == Rgba([255, 0, 0, 230])));
        assert!(!image.pixels().any(|p| *p == Rgba([0, 255, 0, 230])));
    }

    #[test]
    fn test_period_regions_follow_sections() {
        let mut rng = StdRng::seed_from_u64(1);
        for period in [
            ReportPeriod::Daily,
            ReportPeriod::Weekly,
            ReportPeriod::Monthly,
            ReportPeriod::Trends,
        ] {
            let regions = period_regions(period, &mut rng);
            let titles: Vec<_> = regions.iter().map(|r| r.title().unwrap_or("")).collect();
            assert_eq!(titles, period.sections());
        }
    }
}

//! Sensor types and mock anomaly series
//!
//! The dashboard has no real telemetry. Charts are fed by
//! [`generate_anomaly_series`], which produces mostly in-range readings
//! with a fixed pattern of warning and critical spikes.

use chrono::{Duration, Local, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of factory sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorType {
    Temperature,
    Pressure,
    Vibration,
    Speed,
}

impl SensorType {
    pub fn all() -> [Self; 4] {
        [Self::Temperature, Self::Pressure, Self::Vibration, Self::Speed]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Pressure => "pressure",
            Self::Vibration => "vibration",
            Self::Speed => "speed",
        }
    }

    /// Normal operating range (min, max)
    pub fn normal_range(&self) -> (f64, f64) {
        match self {
            Self::Temperature => (70.0, 85.0),
            Self::Pressure => (90.0, 110.0),
            Self::Vibration => (0.5, 1.5),
            Self::Speed => (1500.0, 1800.0),
        }
    }

    pub fn critical_threshold(&self) -> f64 {
        match self {
            Self::Temperature => 90.0,
            Self::Pressure => 120.0,
            Self::Vibration => 2.5,
            Self::Speed => 1950.0,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Self::Temperature => "°C",
            Self::Pressure => "PSI",
            Self::Vibration => "mm/s",
            Self::Speed => "RPM",
        }
    }

    /// Chart line colour as RGB
    pub fn color(&self) -> [u8; 3] {
        match self {
            Self::Temperature => [0xef, 0x44, 0x44],
            Self::Pressure => [0x25, 0x63, 0xeb],
            Self::Vibration => [0x7c, 0x3a, 0xed],
            Self::Speed => [0x16, 0xa3, 0x4a],
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SensorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "temperature" => Ok(Self::Temperature),
            "pressure" => Ok(Self::Pressure),
            "vibration" => Ok(Self::Vibration),
            "speed" => Ok(Self::Speed),
            _ => Err(format!(
                "Invalid sensor type: {}. Expected: temperature, pressure, vibration, speed",
                s
            )),
        }
    }
}

/// One daily reading of a mock series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    pub date: NaiveDate,
    /// Short axis label, e.g. "Mar 5"
    pub label: String,
    pub value: f64,
    /// Upper bound of the normal range
    pub threshold: f64,
    pub critical: f64,
}

impl SensorReading {
    pub fn is_anomalous(&self) -> bool {
        self.value > self.threshold
    }

    pub fn is_critical(&self) -> bool {
        self.value >= self.critical
    }
}

/// Day offsets (counted back from today) that carry a warning-level spike
const WARNING_OFFSETS: [i64; 3] = [3, 8, 12];
/// Day offset that carries a critical spike
const CRITICAL_OFFSET: i64 = 5;

/// Generate `days + 1` daily readings ending today
pub fn generate_anomaly_series<R: Rng + ?Sized>(
    sensor: SensorType,
    days: u32,
    rng: &mut R,
) -> Vec<SensorReading> {
    generate_anomaly_series_until(sensor, days, Local::now().date_naive(), rng)
}

/// Generate `days + 1` daily readings ending at `end`
pub fn generate_anomaly_series_until<R: Rng + ?Sized>(
    sensor: SensorType,
    days: u32,
    end: NaiveDate,
    rng: &mut R,
) -> Vec<SensorReading> {
    let (min, max) = sensor.normal_range();
    let critical = sensor.critical_threshold();

    (0..=i64::from(days))
        .rev()
        .map(|offset| {
            let value = if WARNING_OFFSETS.contains(&offset) {
                max + rng.gen_range(0.0..1.0) * (critical - max)
            } else if offset == CRITICAL_OFFSET {
                critical + rng.gen_range(0.0..10.0)
            } else {
                min + rng.gen_range(0.0..1.0) * (max - min)
            };
            let date = end - Duration::days(offset);
            SensorReading {
                date,
                label: date.format("%b %-d").to_string(),
                value: (value * 100.0).round() / 100.0,
                threshold: max,
                critical,
            }
        })
        .collect()
}

/// Reporting period of the reports panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Trends,
}

impl ReportPeriod {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Trends => "trends",
        }
    }

    /// Download name, e.g. `factory_report_daily.pdf`
    pub fn filename(&self) -> String {
        format!("factory_report_{}.pdf", self.name())
    }

    /// Document title, e.g. `Factory Sensor Daily Report`
    pub fn title(&self) -> String {
        let name = self.name();
        let mut chars = name.chars();
        let capitalized = match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        };
        format!("Factory Sensor {} Report", capitalized)
    }

    /// Tagged chart sections shown for this period
    pub fn sections(&self) -> &'static [&'static str] {
        match self {
            Self::Daily => &["Daily Anomaly Distribution", "Sensor Status Overview"],
            Self::Weekly => &["Weekly Anomaly Distribution"],
            Self::Monthly => &["Monthly Anomaly Distribution"],
            Self::Trends => &["Anomaly Trends"],
        }
    }

    /// Days of history charted for this period
    pub fn days(&self) -> u32 {
        match self {
            Self::Daily => 14,
            Self::Weekly => 28,
            Self::Monthly => 90,
            Self::Trends => 180,
        }
    }
}

impl FromStr for ReportPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "trends" => Ok(Self::Trends),
            _ => Err(format!(
                "Invalid report period: {}. Expected: daily, weekly, monthly, trends",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_series_length_and_order() {
        let mut rng = StdRng::seed_from_u64(7);
        let end = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        let series = generate_anomaly_series_until(SensorType::Pressure, 14, end, &mut rng);
        assert_eq!(series.len(), 15);
        assert_eq!(series.last().unwrap().date, end);
        assert_eq!(series[0].date, NaiveDate::from_ymd_opt(2024, 3, 6).unwrap());
        assert_eq!(series.last().unwrap().label, "Mar 20");
    }

    #[test]
    fn test_series_spikes_follow_fixed_offsets() {
        let mut rng = StdRng::seed_from_u64(42);
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let series = generate_anomaly_series_until(SensorType::Temperature, 14, end, &mut rng);

        for reading in &series {
            let offset = (end - reading.date).num_days();
            if offset == CRITICAL_OFFSET {
                assert!(reading.is_critical(), "offset {offset} should be critical");
            } else if WARNING_OFFSETS.contains(&offset) {
                assert!(reading.value >= 85.0 && reading.value <= 90.0);
            } else {
                assert!(reading.value >= 70.0 && reading.value <= 85.0);
                assert!(!reading.is_critical());
            }
        }
    }

    #[test]
    fn test_report_period_names() {
        assert_eq!(ReportPeriod::Weekly.filename(), "factory_report_weekly.pdf");
        assert_eq!(ReportPeriod::Daily.title(), "Factory Sensor Daily Report");
        assert_eq!(ReportPeriod::Daily.sections().len(), 2);
        assert_eq!("TRENDS".parse::<ReportPeriod>().unwrap(), ReportPeriod::Trends);
        assert!("yearly".parse::<ReportPeriod>().is_err());
    }

    #[test]
    fn test_sensor_type_from_str() {
        assert_eq!("speed".parse::<SensorType>().unwrap(), SensorType::Speed);
        assert_eq!(SensorType::Vibration.unit(), "mm/s");
        assert!("humidity".parse::<SensorType>().is_err());
    }
}

//! Daily entries: one per station and calendar date.
//!
//! Holds the station level summary typed in by operators, the normalized tank
//! readings and the ordered remarks. Totals are recomputed from the tanks on
//! every read and only count tanks in service.

pub mod dao;
pub mod request;

use crate::database::decimal::{decimal, to_f64};
use crate::error::{Error, Result};
use crate::measurement::{Tank, TankReading};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::RangeInclusive;

/// Largest magnitude accepted for any volume, mass, level or water height.
pub const MAX_QUANTITY: f64 = 1.0e9;

const SUMMARY_LIMITS: RangeInclusive<f64> = -MAX_QUANTITY..=MAX_QUANTITY;
const GAUGE_LIMITS: RangeInclusive<f64> = 0.0..=MAX_QUANTITY;
const SG_LIMITS: RangeInclusive<f64> = 0.0..=2.0;
const TEMP_LIMITS_C: RangeInclusive<f64> = -100.0..=200.0;

/// Operator supplied station figures. Anything omitted is stored as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryFields {
    pub tfarm_discharge_volume: Option<f64>,
    pub kigamboni_discharge_volume: Option<f64>,
    #[serde(rename = "netDeliveryVolumeAt20C")]
    pub net_delivery_volume_at_20c: Option<f64>,
    pub net_delivery_mass: Option<f64>,
    pub pump_over_date: Option<NaiveDate>,
    pub prev_volume: Option<f64>,
    pub op_ullage_volume: Option<f64>,
}

impl SummaryFields {
    fn numbers(&self) -> [(&'static str, Option<f64>); 6] {
        [
            ("tfarmDischargeVolume", self.tfarm_discharge_volume),
            ("kigamboniDischargeVolume", self.kigamboni_discharge_volume),
            ("netDeliveryVolumeAt20C", self.net_delivery_volume_at_20c),
            ("netDeliveryMass", self.net_delivery_mass),
            ("prevVolume", self.prev_volume),
            ("opUllageVolume", self.op_ullage_volume),
        ]
    }
}

/// Everything saved for a station and date in one go.
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySubmission {
    pub date: NaiveDate,
    pub summary: SummaryFields,
    pub tanks: Vec<TankReading>,
    pub remarks: Vec<String>,
    /// When set, the save is rejected unless the stored entry is still at
    /// this version. Zero means the entry must not exist yet.
    pub expected_version: Option<i64>,
}

impl EntrySubmission {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            summary: SummaryFields::default(),
            tanks: Vec::new(),
            remarks: Vec::new(),
            expected_version: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in self.summary.numbers() {
            check_range(field, value, &SUMMARY_LIMITS)?;
        }
        let mut seen = HashSet::new();
        for tank in self.tanks.iter() {
            let name = tank.name.trim();
            if name.is_empty() {
                return Err(Error::Validation("tank name must not be empty".into()));
            }
            if !seen.insert(name) {
                return Err(Error::Validation(format!("duplicate tank name {name:?}")));
            }
            check_range("levelMm", Some(tank.level_mm), &GAUGE_LIMITS)?;
            check_range("volumeM3", tank.volume_m3, &GAUGE_LIMITS)?;
            check_range("waterCm", tank.water_cm.cm(), &GAUGE_LIMITS)?;
            check_range("sg", tank.sg, &SG_LIMITS)?;
            check_range("tempC", tank.temp_c, &TEMP_LIMITS_C)?;
        }
        Ok(())
    }
}

fn check_range(field: &str, value: Option<f64>, limits: &RangeInclusive<f64>) -> Result<()> {
    match value {
        Some(v) if !limits.contains(&v) => Err(Error::Validation(format!(
            "{field} must be a number between {} and {}",
            limits.start(),
            limits.end()
        ))),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Remark {
    pub position: i32,
    pub text: String,
}

/// Read model of a stored daily entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyEntry {
    pub station_id: i32,
    pub date: NaiveDate,
    pub tfarm_discharge_volume: f64,
    pub kigamboni_discharge_volume: f64,
    #[serde(rename = "netDeliveryVolumeAt20C")]
    pub net_delivery_volume_at_20c: f64,
    pub net_delivery_mass: f64,
    pub pump_over_date: Option<NaiveDate>,
    pub prev_volume: f64,
    pub op_ullage_volume: f64,
    pub version: i64,
    pub tanks: Vec<Tank>,
    pub remarks: Vec<Remark>,
}

impl DailyEntry {
    pub fn totals(&self) -> Totals {
        aggregate(&self.tanks)
    }

    pub fn total_discharge(&self) -> f64 {
        to_f64(self.discharge())
    }

    fn discharge(&self) -> Decimal {
        amount(self.tfarm_discharge_volume).saturating_add(amount(self.kigamboni_discharge_volume))
    }

    /// Physical stock against book stock carried from the previous day.
    pub fn reconciliation(&self) -> Reconciliation {
        let discharge = self.discharge();
        let book = amount(self.prev_volume)
            .saturating_add(amount(self.net_delivery_volume_at_20c))
            .saturating_sub(discharge);
        let physical = amount(self.totals().total_vol_at_20c);
        Reconciliation {
            total_discharge: to_f64(discharge),
            book_stock: to_f64(book),
            physical_stock: to_f64(physical),
            variance: to_f64(physical.saturating_sub(book)),
        }
    }

    pub fn report(self) -> EntryReport {
        EntryReport {
            totals: self.totals(),
            reconciliation: self.reconciliation(),
            entry: self,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_volume: f64,
    #[serde(rename = "totalVolAt20C")]
    pub total_vol_at_20c: f64,
    pub total_mts: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub total_discharge: f64,
    pub book_stock: f64,
    pub physical_stock: f64,
    pub variance: f64,
}

/// A daily entry together with its derived station figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryReport {
    #[serde(flatten)]
    pub entry: DailyEntry,
    pub totals: Totals,
    pub reconciliation: Reconciliation,
}

/// Sums volumes and masses over tanks in service.
///
/// Rehabilitation and maintenance tanks stay visible individually but add
/// nothing here. Readings that could not be corrected add nothing either.
pub fn aggregate(tanks: &[Tank]) -> Totals {
    let sum = |field: fn(&Tank) -> Option<f64>| {
        tanks
            .iter()
            .filter(|t| t.status.counts_toward_totals())
            .filter_map(|t| field(t).and_then(decimal))
            .fold(Decimal::ZERO, |acc, v| acc.saturating_add(v))
    };
    Totals {
        total_volume: to_f64(sum(|t| t.volume_m3)),
        total_vol_at_20c: to_f64(sum(|t| t.vol_at_20c)),
        total_mts: to_f64(sum(|t| t.mts)),
    }
}

fn amount(value: f64) -> Decimal {
    decimal(value).unwrap_or_default()
}

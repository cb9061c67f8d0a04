//! Bounded historical windows of daily entries turned into chart series.
//!
//! The inventory trend is strict: without an entry on the requested date the
//! whole series is empty, even when older entries exist. The quality series is
//! lenient and always returns the trailing window, reporting the missing day
//! only through an empty `current` snapshot.

pub mod dao;

use crate::entries::DailyEntry;
use crate::measurement::{density_at_20c, Tank, WaterLevel};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

pub const INVENTORY_WINDOW: usize = 15;
pub const QUALITY_WINDOW: usize = 10;
pub const KPI_WINDOW: usize = 15;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryPoint {
    pub date: NaiveDate,
    pub total_volume: f64,
    #[serde(rename = "totalVolAt20C")]
    pub total_vol_at_20c: f64,
    pub total_mts: f64,
    pub tfarm_discharge_volume: f64,
    pub kigamboni_discharge_volume: f64,
    pub total_discharge: f64,
}

impl From<&DailyEntry> for InventoryPoint {
    fn from(entry: &DailyEntry) -> Self {
        let totals = entry.totals();
        Self {
            date: entry.date,
            total_volume: totals.total_volume,
            total_vol_at_20c: totals.total_vol_at_20c,
            total_mts: totals.total_mts,
            tfarm_discharge_volume: entry.tfarm_discharge_volume,
            kigamboni_discharge_volume: entry.kigamboni_discharge_volume,
            total_discharge: entry.total_discharge(),
        }
    }
}

/// Quality figures of one tank on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TankQuality {
    pub temp: Option<f64>,
    pub sg: Option<f64>,
    #[serde(skip_serializing_if = "WaterLevel::is_not_measured")]
    pub water: WaterLevel,
    /// kg/m3 at 20 degC
    pub density: Option<f64>,
}

impl From<&Tank> for TankQuality {
    fn from(tank: &Tank) -> Self {
        Self {
            temp: tank.temp_c,
            sg: tank.sg,
            water: tank.water_cm,
            density: tank.sg.map(density_at_20c),
        }
    }
}

fn tank_qualities(entry: &DailyEntry) -> BTreeMap<String, TankQuality> {
    entry
        .tanks
        .iter()
        .map(|tank| (tank.name.clone(), TankQuality::from(tank)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityPoint {
    pub date: NaiveDate,
    pub tanks: BTreeMap<String, TankQuality>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct QualityData {
    pub trends: Vec<QualityPoint>,
    pub current: BTreeMap<String, TankQuality>,
    pub tanks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiPoint {
    pub date: NaiveDate,
    pub total_discharge: f64,
    #[serde(rename = "netDeliveryVolumeAt20C")]
    pub net_delivery_volume_at_20c: f64,
    pub net_delivery_mass: f64,
    pub book_stock: f64,
    pub physical_stock: f64,
    pub variance: f64,
}

// Keeps the newest `n` entries dated on or before `as_of`, oldest first.
fn trailing(as_of: NaiveDate, window: &[DailyEntry], n: usize) -> &[DailyEntry] {
    let end = window.partition_point(|entry| entry.date <= as_of);
    &window[end.saturating_sub(n)..end]
}

/// Inventory series for charting; empty unless `as_of` itself has an entry.
///
/// `window` must be in chronological order.
pub fn inventory_trend(as_of: NaiveDate, window: &[DailyEntry]) -> Vec<InventoryPoint> {
    let window = trailing(as_of, window, INVENTORY_WINDOW);
    if window.last().map(|entry| entry.date) != Some(as_of) {
        return Vec::new();
    }
    window.iter().map(InventoryPoint::from).collect()
}

/// Per tank quality series over the trailing window plus the `as_of` snapshot.
pub fn quality_data(as_of: NaiveDate, window: &[DailyEntry]) -> QualityData {
    let window = trailing(as_of, window, QUALITY_WINDOW);
    let mut tanks: Vec<String> = Vec::new();
    for tank in window.iter().flat_map(|entry| entry.tanks.iter()) {
        if !tanks.contains(&tank.name) {
            tanks.push(tank.name.clone());
        }
    }
    let current = window
        .last()
        .filter(|entry| entry.date == as_of)
        .map(tank_qualities)
        .unwrap_or_default();
    QualityData {
        trends: window
            .iter()
            .map(|entry| QualityPoint {
                date: entry.date,
                tanks: tank_qualities(entry),
            })
            .collect(),
        current,
        tanks,
    }
}

/// Daily delivery and stock reconciliation figures.
pub fn kpi_series(as_of: NaiveDate, window: &[DailyEntry]) -> Vec<KpiPoint> {
    trailing(as_of, window, KPI_WINDOW)
        .iter()
        .map(|entry| {
            let reconciliation = entry.reconciliation();
            KpiPoint {
                date: entry.date,
                total_discharge: reconciliation.total_discharge,
                net_delivery_volume_at_20c: entry.net_delivery_volume_at_20c,
                net_delivery_mass: entry.net_delivery_mass,
                book_stock: reconciliation.book_stock,
                physical_stock: reconciliation.physical_stock,
                variance: reconciliation.variance,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::TankStatus;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn tank(name: &str, status: TankStatus, vol: f64, temp: f64) -> Tank {
        Tank {
            name: name.into(),
            status,
            level_mm: 5000.0,
            volume_m3: Some(vol),
            water_cm: WaterLevel::MeasuredZero,
            sg: Some(0.8),
            temp_c: Some(temp),
            vol_at_20c: Some(vol),
            mts: Some(vol * 0.8),
        }
    }

    fn entry(d: u32, tanks: Vec<Tank>) -> DailyEntry {
        DailyEntry {
            station_id: 1,
            date: day(d),
            tfarm_discharge_volume: 10.0,
            kigamboni_discharge_volume: 5.5,
            net_delivery_volume_at_20c: 0.0,
            net_delivery_mass: 0.0,
            pump_over_date: None,
            prev_volume: 0.0,
            op_ullage_volume: 0.0,
            version: 1,
            tanks,
            remarks: vec![],
        }
    }

    #[test]
    fn inventory_is_gated_on_exact_date() {
        let window = vec![
            entry(1, vec![tank("T1", TankStatus::Active, 100.0, 25.0)]),
            entry(3, vec![tank("T1", TankStatus::Active, 90.0, 25.0)]),
        ];
        assert!(inventory_trend(day(2), &window).is_empty());
        let series = inventory_trend(day(3), &window);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, day(1));
        assert_eq!(series[1].date, day(3));
        assert_eq!(series[1].total_vol_at_20c, 90.0);
        assert_eq!(series[1].total_discharge, 15.5);
    }

    #[test]
    fn inventory_excludes_idle_tanks() {
        let window = vec![entry(
            1,
            vec![
                tank("T1", TankStatus::Active, 100.0, 25.0),
                tank("T2", TankStatus::Rehabilitation, 1000.0, 25.0),
            ],
        )];
        let series = inventory_trend(day(1), &window);
        assert_eq!(series[0].total_volume, 100.0);
        assert_eq!(series[0].total_mts, 80.0);
    }

    #[test]
    fn inventory_window_is_bounded() {
        let window: Vec<DailyEntry> = (1..=20).map(|d| entry(d, vec![])).collect();
        let series = inventory_trend(day(20), &window);
        assert_eq!(series.len(), INVENTORY_WINDOW);
        assert_eq!(series[0].date, day(6));
    }

    #[test]
    fn quality_is_not_gated() {
        let window = vec![
            entry(1, vec![tank("T1", TankStatus::Active, 100.0, 24.0)]),
            entry(
                3,
                vec![
                    tank("T2", TankStatus::Active, 50.0, 26.0),
                    tank("T1", TankStatus::Maintenance, 90.0, 27.5),
                ],
            ),
        ];
        let missing = quality_data(day(2), &window);
        assert_eq!(missing.trends.len(), 1);
        assert!(missing.current.is_empty());
        assert_eq!(missing.tanks, vec!["T1"]);

        let present = quality_data(day(3), &window);
        assert_eq!(present.trends.len(), 2);
        assert_eq!(present.tanks, vec!["T1", "T2"]);
        assert_eq!(present.current["T1"].temp, Some(27.5));
        // sparse: T2 has no reading on the first day
        assert!(!present.trends[0].tanks.contains_key("T2"));
        let density = present.current["T2"].density.unwrap();
        assert!((density - 798.56).abs() < 1e-9);
    }

    #[test]
    fn quality_window_is_bounded() {
        let window: Vec<DailyEntry> = (1..=12).map(|d| entry(d, vec![])).collect();
        assert_eq!(quality_data(day(31), &window).trends.len(), QUALITY_WINDOW);
    }

    #[test]
    fn kpi_reconciles_each_day() {
        let mut e = entry(1, vec![tank("T1", TankStatus::Active, 1000.0, 20.0)]);
        e.prev_volume = 900.0;
        e.net_delivery_volume_at_20c = 120.0;
        let kpi = kpi_series(day(1), &[e]);
        assert_eq!(kpi.len(), 1);
        assert_eq!(kpi[0].book_stock, 1004.5);
        assert_eq!(kpi[0].variance, -4.5);
    }
}

pub mod tank;
pub mod vcf;

pub use tank::{Tank, TankReading, TankStatus, WaterLevel};
pub use vcf::{Astm54b, VolumeCorrection};

use std::sync::Arc;

pub const REFERENCE_TEMP_C: f64 = 20.0;

// kg/m3
const WATER_DENSITY_20C: f64 = 998.2;
const AIR_BUOYANCY: f64 = 1.1;

/// Product density at 20 degC in kg/m3.
pub fn density_at_20c(sg: f64) -> f64 {
    sg * WATER_DENSITY_20C
}

/// Weight in air per cubic meter at 20 degC, in metric tons.
pub fn density_in_air(sg: f64) -> f64 {
    (density_at_20c(sg) - AIR_BUOYANCY) / 1000.0
}

/// Turns raw gauge readings into 20 degC volumes and masses.
///
/// Whether a tank counts towards station totals is decided later by the
/// aggregator; every reading is normalized the same way regardless of status.
#[derive(Debug, Clone)]
pub struct Normalizer {
    table: Arc<dyn VolumeCorrection>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self::with_table(Astm54b)
    }

    pub fn with_table(table: impl VolumeCorrection + 'static) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    /// Volume at 20 degC and mass in metric tons, or `None` when any input
    /// is missing or the correction table does not cover it.
    pub fn correct(&self, volume_m3: Option<f64>, sg: Option<f64>, temp_c: Option<f64>) -> Option<(f64, f64)> {
        let (volume, sg, temp) = (volume_m3?, sg?, temp_c?);
        let vcf = self.table.factor(sg, temp)?;
        let vol_at_20c = volume * vcf;
        Some((vol_at_20c, vol_at_20c * density_in_air(sg)))
    }

    pub fn normalize(&self, reading: &TankReading) -> Tank {
        let corrected = self.correct(reading.volume_m3, reading.sg, reading.temp_c);
        Tank {
            name: reading.name.clone(),
            status: reading.status,
            level_mm: reading.level_mm,
            volume_m3: reading.volume_m3,
            water_cm: reading.water_cm,
            sg: reading.sg,
            temp_c: reading.temp_c,
            vol_at_20c: corrected.map(|(v, _)| v),
            mts: corrected.map(|(_, m)| m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(status: TankStatus) -> TankReading {
        TankReading {
            name: "T1".into(),
            status,
            level_mm: 8450.0,
            volume_m3: Some(5000.0),
            water_cm: WaterLevel::MeasuredZero,
            sg: Some(0.835),
            temp_c: Some(20.0),
        }
    }

    #[test]
    fn reference_temperature_keeps_volume() {
        let tank = Normalizer::new().normalize(&reading(TankStatus::Active));
        assert_eq!(tank.vol_at_20c, Some(5000.0));
        let expected_mts = 5000.0 * (0.835 * 998.2 - 1.1) / 1000.0;
        assert!((tank.mts.unwrap() - expected_mts).abs() < 1e-9);
    }

    #[test]
    fn missing_inputs_leave_fields_unset() {
        let normalizer = Normalizer::new();
        for patch in 0..3 {
            let mut r = reading(TankStatus::Active);
            match patch {
                0 => r.sg = None,
                1 => r.temp_c = None,
                _ => r.volume_m3 = None,
            }
            let tank = normalizer.normalize(&r);
            assert_eq!(tank.vol_at_20c, None);
            assert_eq!(tank.mts, None);
        }
    }

    #[test]
    fn status_does_not_change_normalization() {
        let normalizer = Normalizer::new();
        let mut active = reading(TankStatus::Active);
        active.temp_c = Some(31.5);
        let mut idle = active.clone();
        idle.status = TankStatus::Maintenance;
        let a = normalizer.normalize(&active);
        let b = normalizer.normalize(&idle);
        assert_eq!(a.vol_at_20c, b.vol_at_20c);
        assert_eq!(a.mts, b.mts);
        assert!(a.vol_at_20c.unwrap() < 5000.0);
    }

    #[derive(Debug)]
    struct Flat;

    impl VolumeCorrection for Flat {
        fn factor(&self, _sg: f64, _temp_c: f64) -> Option<f64> {
            Some(1.0)
        }
    }

    #[test]
    fn table_is_replaceable() {
        let mut r = reading(TankStatus::Active);
        r.temp_c = Some(45.0);
        let tank = Normalizer::with_table(Flat).normalize(&r);
        assert_eq!(tank.vol_at_20c, Some(5000.0));
    }
}

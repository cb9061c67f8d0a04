use crate::error::Error;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TankStatus {
    #[default]
    Active,
    Rehabilitation,
    Maintenance,
}

impl TankStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TankStatus::Active => "Active",
            TankStatus::Rehabilitation => "Rehabilitation",
            TankStatus::Maintenance => "Maintenance",
        }
    }

    /// Only tanks in service contribute to station totals.
    pub fn counts_toward_totals(&self) -> bool {
        matches!(self, TankStatus::Active)
    }
}

impl fmt::Display for TankStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TankStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(TankStatus::Active),
            "Rehabilitation" => Ok(TankStatus::Rehabilitation),
            "Maintenance" => Ok(TankStatus::Maintenance),
            other => Err(Error::Corrupt(format!("unknown tank status {other:?}"))),
        }
    }
}

/// Free water height with its three states kept apart.
///
/// In JSON an absent field is `NotMeasured`, `null` is `MeasuredZero`
/// (gauged, no water found) and a number is `Measured`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum WaterLevel {
    #[default]
    NotMeasured,
    MeasuredZero,
    Measured(f64),
}

impl WaterLevel {
    pub fn is_not_measured(&self) -> bool {
        matches!(self, WaterLevel::NotMeasured)
    }

    /// Height in cm, with "no water" reported as zero.
    pub fn cm(&self) -> Option<f64> {
        match self {
            WaterLevel::NotMeasured => None,
            WaterLevel::MeasuredZero => Some(0.0),
            WaterLevel::Measured(v) => Some(*v),
        }
    }
}

impl Serialize for WaterLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WaterLevel::Measured(v) => serializer.serialize_f64(*v),
            _ => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for WaterLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<f64>::deserialize(deserializer)? {
            Some(v) => WaterLevel::Measured(v),
            None => WaterLevel::MeasuredZero,
        })
    }
}

/// A raw gauge reading as submitted by an operator.
///
/// There is deliberately no place for corrected volumes here: those are
/// always derived by the [`super::Normalizer`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TankReading {
    pub name: String,
    #[serde(default)]
    pub status: TankStatus,
    pub level_mm: f64,
    pub volume_m3: Option<f64>,
    #[serde(default)]
    pub water_cm: WaterLevel,
    pub sg: Option<f64>,
    pub temp_c: Option<f64>,
}

/// A normalized tank reading, as stored with its daily entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tank {
    pub name: String,
    pub status: TankStatus,
    pub level_mm: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_m3: Option<f64>,
    #[serde(skip_serializing_if = "WaterLevel::is_not_measured")]
    pub water_cm: WaterLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_c: Option<f64>,
    #[serde(rename = "volAt20C", skip_serializing_if = "Option::is_none")]
    pub vol_at_20c: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mts: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn water_three_states_from_json() {
        let absent: TankReading =
            serde_json::from_value(json!({"name": "T1", "levelMm": 100.0})).unwrap();
        assert_eq!(absent.water_cm, WaterLevel::NotMeasured);
        assert_eq!(absent.status, TankStatus::Active);

        let null: TankReading =
            serde_json::from_value(json!({"name": "T1", "levelMm": 100.0, "waterCm": null})).unwrap();
        assert_eq!(null.water_cm, WaterLevel::MeasuredZero);

        let value: TankReading =
            serde_json::from_value(json!({"name": "T1", "levelMm": 100.0, "waterCm": 2.5})).unwrap();
        assert_eq!(value.water_cm, WaterLevel::Measured(2.5));
    }

    #[test]
    fn water_three_states_to_json() {
        let mut tank = Tank {
            name: "T1".into(),
            status: TankStatus::Rehabilitation,
            level_mm: 10.0,
            volume_m3: None,
            water_cm: WaterLevel::NotMeasured,
            sg: None,
            temp_c: None,
            vol_at_20c: None,
            mts: None,
        };
        let out = serde_json::to_value(&tank).unwrap();
        assert!(out.get("waterCm").is_none());
        assert!(out.get("volAt20C").is_none());
        assert_eq!(out["status"], "Rehabilitation");

        tank.water_cm = WaterLevel::MeasuredZero;
        let out = serde_json::to_value(&tank).unwrap();
        assert!(out["waterCm"].is_null());

        tank.water_cm = WaterLevel::Measured(1.5);
        let out = serde_json::to_value(&tank).unwrap();
        assert_eq!(out["waterCm"], 1.5);
    }

    #[test]
    fn status_round_trips_through_storage_text() {
        for status in [TankStatus::Active, TankStatus::Rehabilitation, TankStatus::Maintenance] {
            assert_eq!(status.as_str().parse::<TankStatus>().unwrap(), status);
        }
        assert!("Broken".parse::<TankStatus>().is_err());
        assert!(TankStatus::Active.counts_toward_totals());
        assert!(!TankStatus::Maintenance.counts_toward_totals());
    }
}

use super::{EntrySubmission, SummaryFields};
use crate::error::{Error, Result};
use crate::measurement::TankReading;
use chrono::NaiveDate;
use serde::Deserialize;

/// A save-daily-entry payload as it arrives from a form or an upload.
///
/// The identifying fields are optional here so that a payload lacking them
/// is reported as a validation error instead of a decoding failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveEntryRequest {
    pub station_id: Option<i32>,
    pub date: Option<NaiveDate>,
    #[serde(flatten)]
    pub summary: SummaryFields,
    #[serde(default)]
    pub tanks: Vec<TankReading>,
    #[serde(default)]
    pub remarks: Vec<String>,
    pub expected_version: Option<i64>,
}

impl SaveEntryRequest {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Validation(format!("malformed entry payload: {e}")))
    }

    pub fn into_submission(self) -> Result<(i32, EntrySubmission)> {
        let (station_id, date) = match (self.station_id, self.date) {
            (Some(s), Some(d)) => (s, d),
            _ => return Err(Error::Validation("stationId and date are required".into())),
        };
        let submission = EntrySubmission {
            date,
            summary: self.summary,
            tanks: self.tanks,
            remarks: self.remarks,
            expected_version: self.expected_version,
        };
        submission.validate()?;
        Ok((station_id, submission))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::WaterLevel;

    #[test]
    fn full_payload() {
        let text = r#"{
            "stationId": 4,
            "date": "2025-01-03",
            "tfarmDischargeVolume": 120.5,
            "netDeliveryVolumeAt20C": 900,
            "pumpOverDate": "2025-01-02",
            "tanks": [
                {"name": "T1", "status": "Active", "levelMm": 8000, "volumeM3": 4000, "sg": 0.835, "tempC": 28.5, "waterCm": null},
                {"name": "T2", "status": "Maintenance", "levelMm": 0}
            ],
            "remarks": ["first", "second"]
        }"#;
        let (station_id, submission) = SaveEntryRequest::from_json(text)
            .unwrap()
            .into_submission()
            .unwrap();
        assert_eq!(station_id, 4);
        assert_eq!(submission.date, NaiveDate::from_ymd_opt(2025, 1, 3).unwrap());
        assert_eq!(submission.summary.tfarm_discharge_volume, Some(120.5));
        assert_eq!(submission.summary.kigamboni_discharge_volume, None);
        assert_eq!(submission.summary.net_delivery_volume_at_20c, Some(900.0));
        assert_eq!(submission.summary.pump_over_date, NaiveDate::from_ymd_opt(2025, 1, 2));
        assert_eq!(submission.tanks.len(), 2);
        assert_eq!(submission.tanks[0].water_cm, WaterLevel::MeasuredZero);
        assert_eq!(submission.tanks[1].water_cm, WaterLevel::NotMeasured);
        assert_eq!(submission.remarks, vec!["first", "second"]);
        assert_eq!(submission.expected_version, None);
    }

    #[test]
    fn missing_identity_is_a_validation_error() {
        let request = SaveEntryRequest::from_json(r#"{"date": "2025-01-03"}"#).unwrap();
        let err = request.into_submission().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(err.to_string(), "validation error: stationId and date are required");

        let request = SaveEntryRequest::from_json(r#"{"stationId": 1}"#).unwrap();
        assert!(matches!(request.into_submission(), Err(Error::Validation(_))));
    }

    #[test]
    fn malformed_json_is_a_validation_error() {
        assert!(matches!(
            SaveEntryRequest::from_json("{\"stationId\": \"one\"}"),
            Err(Error::Validation(_))
        ));
    }
}

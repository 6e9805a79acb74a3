use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, SightingError};

pub type SightingId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Both coordinates must be finite and inside the WGS84 ranges.
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(SightingError::Validation(
                "location coordinates must be finite".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(SightingError::Validation(format!(
                "latitude {} is outside [-90, 90]",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(SightingError::Validation(format!(
                "longitude {} is outside [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Confirmed,
    Unconfirmed,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Confirmed => f.write_str("confirmed"),
            Self::Unconfirmed => f.write_str("unconfirmed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sighting {
    pub id: SightingId,
    #[serde(default, deserialize_with = "deserialize_nullable_text")]
    pub witness_name: String,
    pub location: Location,
    pub description: String,
    #[serde(default)]
    pub picture: Option<String>,
    pub status: Status,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub date_time: DateTime<Utc>,
    #[serde(default, deserialize_with = "deserialize_nullable_text")]
    pub witness_contact: String,
}

/// A user submission before an id and status have been assigned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewSighting {
    pub description: String,
    pub location: Option<Location>,
    pub witness_name: String,
    pub witness_contact: String,
    pub picture: Option<String>,
    /// Event time; the submission instant is used when absent.
    pub date_time: Option<DateTime<Utc>>,
}

impl NewSighting {
    pub fn new(description: impl Into<String>, location: Location) -> Self {
        Self {
            description: description.into(),
            location: Some(location),
            ..Default::default()
        }
    }

    pub fn with_witness(mut self, name: impl Into<String>, contact: impl Into<String>) -> Self {
        self.witness_name = name.into();
        self.witness_contact = contact.into();
        self
    }

    pub fn with_picture(mut self, picture: impl Into<String>) -> Self {
        self.picture = Some(picture.into());
        self
    }

    pub fn with_date_time(mut self, date_time: DateTime<Utc>) -> Self {
        self.date_time = Some(date_time);
        self
    }

    /// Checks the fields a submission cannot do without and returns the
    /// validated location.
    pub fn validate(&self) -> Result<Location> {
        if self.description.trim().is_empty() {
            return Err(SightingError::Validation(
                "a description is required".to_string(),
            ));
        }
        let location = self.location.ok_or_else(|| {
            SightingError::Validation("location information is required".to_string())
        })?;
        location.validate()?;
        Ok(location)
    }

    /// Builds the stored record. New submissions always start unconfirmed.
    pub fn into_sighting(self, id: SightingId, location: Location) -> Sighting {
        Sighting {
            id,
            witness_name: self.witness_name,
            location,
            description: self.description,
            picture: self.picture.filter(|p| !p.is_empty()),
            status: Status::Unconfirmed,
            date_time: self.date_time.unwrap_or_else(Utc::now),
            witness_contact: self.witness_contact,
        }
    }
}

/// Parses RFC 3339 first, then a zone-less timestamp read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Missing and `null` text both read as empty.
fn deserialize_nullable_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid dateTime `{raw}`")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sighting_json_field_names() {
        let json = r#"{
            "id": 7,
            "witnessName": "Dana",
            "location": {"latitude": 51.5, "longitude": -0.09},
            "description": "lights over the river",
            "picture": "https://example.org/p.png",
            "status": "confirmed",
            "dateTime": "2024-03-01T21:15:00Z",
            "witnessContact": "dana@example.org"
        }"#;
        let sighting: Sighting = serde_json::from_str(json).unwrap();

        assert_eq!(sighting.id, 7);
        assert_eq!(sighting.witness_name, "Dana");
        assert_eq!(sighting.location, Location::new(51.5, -0.09));
        assert_eq!(sighting.status, Status::Confirmed);
        assert_eq!(
            sighting.date_time,
            Utc.with_ymd_and_hms(2024, 3, 1, 21, 15, 0).unwrap()
        );

        let value = serde_json::to_value(&sighting).unwrap();
        assert!(value.get("witnessContact").is_some());
        assert!(value.get("dateTime").is_some());
        assert_eq!(value["status"], "confirmed");
    }

    #[test]
    fn test_optional_fields_may_be_missing() {
        let json = r#"{
            "id": 1,
            "location": {"latitude": 0, "longitude": 0},
            "description": "disc",
            "status": "unconfirmed",
            "dateTime": "2023-11-05T08:00:00"
        }"#;
        let sighting: Sighting = serde_json::from_str(json).unwrap();
        assert_eq!(sighting.picture, None);
        assert!(sighting.witness_name.is_empty());
        assert!(sighting.witness_contact.is_empty());
    }

    #[test]
    fn test_null_witness_fields_read_as_empty() {
        let json = r#"[{
            "id": 2,
            "witnessName": null,
            "location": {"latitude": 0, "longitude": 0},
            "description": "cigar shape",
            "picture": null,
            "status": "confirmed",
            "dateTime": "2023-11-05T08:00:00Z",
            "witnessContact": null
        }]"#;
        let sightings: Vec<Sighting> = serde_json::from_str(json).unwrap();
        assert_eq!(sightings.len(), 1);
        assert!(sightings[0].witness_name.is_empty());
        assert!(sightings[0].witness_contact.is_empty());
        assert_eq!(sightings[0].picture, None);
    }

    #[test]
    fn test_bad_timestamp_is_rejected() {
        let json = r#"{
            "id": 1,
            "location": {"latitude": 0, "longitude": 0},
            "description": "disc",
            "status": "unconfirmed",
            "dateTime": "yesterday"
        }"#;
        assert!(serde_json::from_str::<Sighting>(json).is_err());
    }

    #[test]
    fn test_location_validation() {
        assert!(Location::new(10.0, 20.0).validate().is_ok());
        assert!(Location::new(90.0, -180.0).validate().is_ok());
        assert!(Location::new(90.5, 0.0).validate().is_err());
        assert!(Location::new(0.0, 181.0).validate().is_err());
        assert!(Location::new(f64::NAN, 0.0).validate().is_err());
        assert!(Location::new(0.0, f64::INFINITY).validate().is_err());
    }

    #[test]
    fn test_new_sighting_requires_description_and_location() {
        let blank = NewSighting::new("   ", Location::new(1.0, 1.0));
        assert!(matches!(blank.validate(), Err(SightingError::Validation(_))));

        let nowhere = NewSighting {
            description: "lights".to_string(),
            ..Default::default()
        };
        assert!(matches!(nowhere.validate(), Err(SightingError::Validation(_))));
    }

    #[test]
    fn test_into_sighting_is_unconfirmed() {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let submission = NewSighting::new("lights", Location::new(10.0, 20.0))
            .with_picture("")
            .with_date_time(at);
        let location = submission.validate().unwrap();
        let sighting = submission.into_sighting(4, location);

        assert_eq!(sighting.id, 4);
        assert_eq!(sighting.status, Status::Unconfirmed);
        assert_eq!(sighting.picture, None);
        assert_eq!(sighting.date_time, at);
    }
}

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::Writer;
use log::info;
use serde::Serialize;

use crate::error::{Result, SightingError};
use crate::record::Sighting;

/// Flat CSV shape of a sighting; the location is split into two columns.
#[derive(Debug, Serialize)]
struct SightingRow<'a> {
    id: i64,
    date_time: String,
    status: String,
    latitude: f64,
    longitude: f64,
    witness_name: &'a str,
    witness_contact: &'a str,
    description: &'a str,
    picture: &'a str,
}

impl<'a> From<&'a Sighting> for SightingRow<'a> {
    fn from(s: &'a Sighting) -> Self {
        Self {
            id: s.id,
            date_time: s.date_time.to_rfc3339(),
            status: s.status.to_string(),
            latitude: s.location.latitude,
            longitude: s.location.longitude,
            witness_name: &s.witness_name,
            witness_contact: &s.witness_contact,
            description: &s.description,
            picture: s.picture.as_deref().unwrap_or(""),
        }
    }
}

pub fn write_csv<W: Write>(sightings: &[Sighting], out: W) -> csv::Result<()> {
    let mut writer = Writer::from_writer(out);
    for sighting in sightings {
        writer.serialize(SightingRow::from(sighting))?;
    }
    writer.flush()?;
    Ok(())
}

/// Save records to a CSV file
pub fn save_to_csv(sightings: &[Sighting], path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| SightingError::storage(path, e))?;
    write_csv(sightings, file).map_err(|e| SightingError::storage(path, e.into()))?;
    info!("Data saved to {}", path.display());
    Ok(())
}

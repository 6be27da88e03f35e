use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

pub const TRIP_BOOKING_ID: &str = "CURRENT_TRIP";
pub const TRANSPORT_BOOKING_ID: &str = "CURRENT_TRANSPORT";
pub const TRIP_FILE: &str = "current_trip.json";
pub const TRANSPORT_FILE: &str = "current_transport.json";
pub const CONFIRMED: &str = "confirmed";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("booking file {path:?} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    pub booking_id: String,
    pub traveler_name: String,
    pub destination: String,
    pub start_date: String,
    pub end_date: String,
    pub budget: u32,
    pub booking_date: NaiveDateTime,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportRecord {
    pub transport_booking_id: String,
    pub trip_booking_id: String,
    pub transport_type: String,
    pub departure: String,
    pub arrival: String,
    pub departure_time: String,
    pub booking_date: NaiveDateTime,
    pub status: String,
}

/// One file per booking kind; every save replaces the previous booking.
#[derive(Debug, Clone)]
pub struct BookingStore {
    dir: PathBuf,
}

impl BookingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn now() -> NaiveDateTime {
        Local::now().naive_local()
    }

    pub fn save_trip(&self, record: &TripRecord) -> Result<PathBuf, StoreError> {
        self.write(TRIP_FILE, record)
    }

    pub fn load_trip(&self) -> Result<Option<TripRecord>, StoreError> {
        self.read(TRIP_FILE)
    }

    pub fn save_transport(&self, record: &TransportRecord) -> Result<PathBuf, StoreError> {
        self.write(TRANSPORT_FILE, record)
    }

    pub fn load_transport(&self) -> Result<Option<TransportRecord>, StoreError> {
        self.read(TRANSPORT_FILE)
    }

    fn write<T: Serialize>(&self, file: &str, record: &T) -> Result<PathBuf, StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.dir.join(file);
        let encoded = serde_json::to_string_pretty(record).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, encoded).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "Saved booking");
        Ok(path)
    }

    fn read<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>, StoreError> {
        let path = self.dir.join(file);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Json { path, source })
    }
}

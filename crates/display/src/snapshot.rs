//! The validated dashboard snapshot and its wire-format contract.
//!
//! The backend offers no schema guarantees, so everything the renderer
//! indexes into is checked here. A snapshot that made it past `from_json`
//! can be drawn without further bounds or presence checks.

use serde_json::Value;
use thiserror::Error;

pub const ROOM_COUNT: usize = 3;
pub const FORECAST_HOURS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct RoomReading {
    /// Relative humidity, percent.
    pub humidity: f32,
    /// Temperature, degrees Celsius.
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastHour {
    /// External condition code, e.g. "09d". Translated via [`crate::icons`].
    pub icon: String,
    pub time: String,
    /// Precipitation probability in [0, 1].
    pub pop: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub updated: String,
    pub tent: RoomReading,
    pub living: RoomReading,
    pub sleep: RoomReading,
    pub living_door_open: bool,
    pub sleep_door_open: bool,
    pub forecast: [ForecastHour; FORECAST_HOURS],
}

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("body is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("document is null or empty")]
    EmptyDocument,
    #[error("missing or mistyped field `{0}`")]
    MissingField(&'static str),
    #[error("forecast has {0} entries, need {FORECAST_HOURS}")]
    ShortForecast(usize),
}

impl Snapshot {
    pub fn from_json(body: &str) -> Result<Snapshot, SnapshotError> {
        if body.trim().is_empty() {
            return Err(SnapshotError::EmptyDocument);
        }

        let doc: Value = serde_json::from_str(body)?;
        if doc.is_null() {
            return Err(SnapshotError::EmptyDocument);
        }

        let hours = field(&doc, "weather")?
            .get("hourly")
            .and_then(Value::as_array)
            .ok_or(SnapshotError::MissingField("weather.hourly"))?;
        if hours.len() < FORECAST_HOURS {
            return Err(SnapshotError::ShortForecast(hours.len()));
        }

        let mut forecast = Vec::with_capacity(FORECAST_HOURS);
        for hour in &hours[..FORECAST_HOURS] {
            forecast.push(ForecastHour {
                icon: str_field(hour, "icon")?.to_owned(),
                time: str_field(hour, "time")?.to_owned(),
                pop: f32_field(hour, "pop")?,
            });
        }
        let forecast = <[ForecastHour; FORECAST_HOURS]>::try_from(forecast)
            .map_err(|rest: Vec<_>| SnapshotError::ShortForecast(rest.len()))?;

        Ok(Snapshot {
            updated: str_field(&doc, "updated")?.to_owned(),
            tent: room(&doc, "Tent")?,
            living: room(&doc, "LivingTemp")?,
            sleep: room(&doc, "Sleep")?,
            living_door_open: door_open(&doc, "living-door-sensor")?,
            sleep_door_open: door_open(&doc, "sleep-door-sensor")?,
            forecast,
        })
    }
}

fn field<'a>(doc: &'a Value, key: &'static str) -> Result<&'a Value, SnapshotError> {
    match doc.get(key) {
        Some(value) if !value.is_null() => Ok(value),
        _ => Err(SnapshotError::MissingField(key)),
    }
}

fn str_field<'a>(doc: &'a Value, key: &'static str) -> Result<&'a str, SnapshotError> {
    field(doc, key)?
        .as_str()
        .ok_or(SnapshotError::MissingField(key))
}

fn f32_field(doc: &Value, key: &'static str) -> Result<f32, SnapshotError> {
    field(doc, key)?
        .as_f64()
        .map(|v| v as f32)
        .ok_or(SnapshotError::MissingField(key))
}

fn room(doc: &Value, key: &'static str) -> Result<RoomReading, SnapshotError> {
    let value = field(doc, key)?;
    Ok(RoomReading {
        humidity: f32_field(value, "humidity")?,
        temperature: f32_field(value, "temperature")?,
    })
}

fn door_open(doc: &Value, key: &'static str) -> Result<bool, SnapshotError> {
    field(doc, key)?
        .get("open")
        .and_then(Value::as_bool)
        .ok_or(SnapshotError::MissingField(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "updated": "2024-06-01 12:00",
        "Tent": { "humidity": 45.3, "temperature": 21.7 },
        "LivingTemp": { "humidity": 51.0, "temperature": 22.4 },
        "Sleep": { "humidity": 48.2, "temperature": 19.9 },
        "living-door-sensor": { "open": true },
        "sleep-door-sensor": { "open": false },
        "weather": {
            "hourly": [
                { "icon": "01d", "time": "13:00", "pop": 0.0 },
                { "icon": "02d", "time": "14:00", "pop": 0.125 },
                { "icon": "09d", "time": "15:00", "pop": 0.5 },
                { "icon": "11d", "time": "16:00", "pop": 0.75 },
                { "icon": "01n", "time": "17:00", "pop": 0.0 }
            ]
        }
    }"#;

    #[test]
    fn parses_complete_document() {
        let snapshot = Snapshot::from_json(SAMPLE).unwrap();

        assert_eq!(snapshot.updated, "2024-06-01 12:00");
        assert_eq!(snapshot.tent.humidity, 45.3);
        assert_eq!(snapshot.tent.temperature, 21.7);
        assert!(snapshot.living_door_open);
        assert!(!snapshot.sleep_door_open);
        assert_eq!(snapshot.forecast.len(), FORECAST_HOURS);
        assert_eq!(snapshot.forecast[2].icon, "09d");
        assert_eq!(snapshot.forecast[2].pop, 0.5);
    }

    #[test]
    fn extra_forecast_hours_are_ignored() {
        let mut doc: Value = serde_json::from_str(SAMPLE).unwrap();
        let hours = doc["weather"]["hourly"].as_array_mut().unwrap();
        let extra = hours[0].clone();
        hours.push(extra);

        let snapshot = Snapshot::from_json(&doc.to_string()).unwrap();
        assert_eq!(snapshot.forecast.len(), FORECAST_HOURS);
    }

    #[test]
    fn rejects_short_forecast() {
        let mut doc: Value = serde_json::from_str(SAMPLE).unwrap();
        doc["weather"]["hourly"].as_array_mut().unwrap().truncate(3);

        match Snapshot::from_json(&doc.to_string()) {
            Err(SnapshotError::ShortForecast(3)) => {}
            other => panic!("expected ShortForecast(3), got {other:?}"),
        }
    }

    #[test]
    fn rejects_missing_room() {
        let mut doc: Value = serde_json::from_str(SAMPLE).unwrap();
        doc.as_object_mut().unwrap().remove("Sleep");

        match Snapshot::from_json(&doc.to_string()) {
            Err(SnapshotError::MissingField("Sleep")) => {}
            other => panic!("expected MissingField(Sleep), got {other:?}"),
        }
    }

    #[test]
    fn rejects_null_and_empty_documents() {
        assert!(matches!(
            Snapshot::from_json("null"),
            Err(SnapshotError::EmptyDocument)
        ));
        assert!(matches!(
            Snapshot::from_json("   "),
            Err(SnapshotError::EmptyDocument)
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            Snapshot::from_json("{ not json"),
            Err(SnapshotError::Json(_))
        ));
    }
}

//! Data models for radio-browser API responses
//!
//! Upstream records are opaque: each one wraps the JSON value the mirror sent
//! and is written back byte-for-byte equivalent. Nulls stay null, absent keys
//! stay absent. The accessors only read the few fields the facade sorts or
//! de-duplicates on and never fail on an unexpected type.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reads a count leniently: integers, floats and numeric strings are
/// accepted, anything else counts as 0.
fn count_field(record: &Value, key: &str) -> i64 {
    match record.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<f64>().map(|f| f as i64).unwrap_or(0),
        _ => 0,
    }
}

macro_rules! upstream_record {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Value);

        impl $name {
            /// Raw upstream field
            pub fn get(&self, key: &str) -> Option<&Value> {
                self.0.get(key)
            }

            /// String field, `None` when absent, null or not a string
            pub fn get_str(&self, key: &str) -> Option<&str> {
                self.0.get(key).and_then(Value::as_str)
            }

            pub fn as_value(&self) -> &Value {
                &self.0
            }

            pub fn into_value(self) -> Value {
                self.0
            }
        }

        impl From<Value> for $name {
            fn from(value: Value) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Value {
            fn from(record: $name) -> Self {
                record.0
            }
        }
    };
}

// ============================================================================
// Upstream records
// ============================================================================

upstream_record!(
    /// A radio station as returned by `/json/stations/*`
    Station
);

impl Station {
    /// Unique station identifier
    pub fn uuid(&self) -> Option<&str> {
        self.get_str("stationuuid")
    }

    pub fn name(&self) -> Option<&str> {
        self.get_str("name")
    }

    /// Upstream popularity, 0 when absent or unreadable
    pub fn clickcount(&self) -> i64 {
        count_field(&self.0, "clickcount")
    }

    /// Tags as a list, trimmed, empty entries dropped
    pub fn tag_list(&self) -> Vec<&str> {
        self.get_str("tags")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }

    pub fn is_hls(&self) -> bool {
        count_field(&self.0, "hls") != 0
    }

    pub fn last_check_ok(&self) -> bool {
        count_field(&self.0, "lastcheckok") != 0
    }
}

upstream_record!(
    /// A country entry from `/json/countries`
    Country
);

upstream_record!(
    /// A language entry from `/json/languages`
    Language
);

upstream_record!(
    /// A tag entry from `/json/tags`
    Tag
);

macro_rules! catalog_accessors {
    ($($name:ident),*) => {$(
        impl $name {
            pub fn name(&self) -> Option<&str> {
                self.get_str("name")
            }

            pub fn stationcount(&self) -> i64 {
                count_field(&self.0, "stationcount")
            }
        }
    )*};
}

catalog_accessors!(Country, Language, Tag);

// ============================================================================
// Facade models
// ============================================================================

/// A curated genre shown to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
pub struct Genre {
    pub name: String,
    pub slug: String,
    pub icon: String,
}

/// `{"stations": [...]}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationsResponse {
    pub stations: Vec<Station>,
}

/// `{"station": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationResponse {
    pub station: Station,
}

/// `{"countries": [...]}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountriesResponse {
    pub countries: Vec<Country>,
}

/// `{"languages": [...]}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguagesResponse {
    pub languages: Vec<Language>,
}

/// `{"tags": [...]}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagsResponse {
    pub tags: Vec<Tag>,
}

/// `{"genres": [...]}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
pub struct GenresResponse {
    pub genres: Vec<Genre>,
}

/// Outcome of a click registration, never an HTTP error
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
pub struct ClickResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClickResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// `{"message": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
pub struct MessageResponse {
    pub message: String,
}

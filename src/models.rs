//! Data models for one decoded CloudWatcher report.

use serde::Serialize;

// ---

/// Position of the station's roof/relay switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchState {
    #[default]
    Closed,
    Open,
}

impl SwitchState {
    /// Zero is closed, anything else is open.
    pub fn from_raw(v: bool) -> Self {
        if v {
            SwitchState::Open
        } else {
            SwitchState::Closed
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            SwitchState::Closed => 0.0,
            SwitchState::Open => 1.0,
        }
    }
}

/// Mandatory report fields, in validation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Date,
    CwInfo,
    Clouds,
    LightMpsas,
    Temp,
}

impl Field {
    /// Wire key of the field.
    pub fn key(&self) -> &'static str {
        match self {
            Field::Date => "dataGMTTime",
            Field::CwInfo => "cwinfo",
            Field::Clouds => "clouds",
            Field::LightMpsas => "lightmpsas",
            Field::Temp => "temp",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Validated snapshot of one station report.
///
/// Built only through [`crate::decoder::decode`], so every mandatory field is
/// guaranteed to be present. Optional measurements are `None` when the report
/// did not carry them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    // ---
    pub date: String,
    pub cwinfo: String,
    pub switch: SwitchState,
    pub safe: bool,
    pub clouds: f64,
    pub temp: f64,
    pub lightmpsas: f64,
    pub rawir: Option<f64>,
    pub wind: Option<f64>,
    pub gust: Option<f64>,
    pub rain: Option<f64>,
    pub hum: Option<f64>,
    pub dewp: Option<f64>,
    pub abspress: Option<f64>,
    pub relpress: Option<f64>,
}

impl Reading {
    /// Safety flag as published to the host (1 = safe).
    pub fn safe_value(&self) -> f64 {
        if self.safe {
            1.0
        } else {
            0.0
        }
    }
}

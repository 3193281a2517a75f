use std::{fmt, str::FromStr};

use serde::Serialize;

/// The metered quantity a reading or forecast refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalType {
    Current,
    Voltage,
    Power,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown signal type '{0}', expected current, voltage or power")]
pub struct UnknownSignal(pub String);

impl SignalType {
    pub const ALL: [SignalType; 3] = [SignalType::Current, SignalType::Voltage, SignalType::Power];

    pub fn as_str(self) -> &'static str {
        match self {
            SignalType::Current => "current",
            SignalType::Voltage => "voltage",
            SignalType::Power => "power",
        }
    }

    /// Table holding the raw readings for this signal.
    pub fn readings_table(self) -> &'static str {
        match self {
            SignalType::Current => "current_readings",
            SignalType::Voltage => "voltage_readings",
            SignalType::Power => "power_readings",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the short names as well as the `forecast-<x>-data` names used by
/// the forecast endpoint. `kilowatt` is an alias for power.
impl FromStr for SignalType {
    type Err = UnknownSignal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let name = normalized
            .strip_prefix("forecast-")
            .and_then(|rest| rest.strip_suffix("-data"))
            .unwrap_or(normalized.as_str());

        match name {
            "current" => Ok(SignalType::Current),
            "voltage" => Ok(SignalType::Voltage),
            "power" | "kilowatt" => Ok(SignalType::Power),
            _ => Err(UnknownSignal(s.to_string())),
        }
    }
}

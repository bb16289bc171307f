//! Weather classification derived from planet positions.
//!
//! Every day falls into exactly one [`WeatherState`]: the first two states
//! split the planets-aligned case on whether the sun joins the line, and rain
//! is only possible when the planets form a proper triangle.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{are_aligned_within, in_triangle};
use crate::world::OrbitalSystem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherState {
    Drought,
    OptimumTemperaturePressure,
    RainSeason,
    Other,
}

impl WeatherState {
    pub const ALL: [WeatherState; 4] = [
        WeatherState::Drought,
        WeatherState::OptimumTemperaturePressure,
        WeatherState::RainSeason,
        WeatherState::Other,
    ];

    pub fn is_drought(self) -> bool {
        self == WeatherState::Drought
    }

    pub fn is_optimum_temperature_pressure(self) -> bool {
        self == WeatherState::OptimumTemperaturePressure
    }

    pub fn is_rain_season(self) -> bool {
        self == WeatherState::RainSeason
    }

    /// Rebuilds a state from stored flags. When more than one flag is set,
    /// rain wins over optimum conditions, which win over drought.
    pub fn from_flags(drought: bool, optimum: bool, rain: bool) -> Self {
        if rain {
            WeatherState::RainSeason
        } else if optimum {
            WeatherState::OptimumTemperaturePressure
        } else if drought {
            WeatherState::Drought
        } else {
            WeatherState::Other
        }
    }

    /// Label served by the query API.
    pub fn label(self) -> &'static str {
        match self {
            WeatherState::Drought => "sequía",
            WeatherState::OptimumTemperaturePressure => "OTPC",
            WeatherState::RainSeason => "lluvia",
            WeatherState::Other => "otro",
        }
    }
}

impl fmt::Display for WeatherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WeatherState::Drought => "drought",
            WeatherState::OptimumTemperaturePressure => "optimum temperature and pressure",
            WeatherState::RainSeason => "rain season",
            WeatherState::Other => "other",
        };
        f.write_str(name)
    }
}

pub fn classify(system: &OrbitalSystem) -> WeatherState {
    classify_with(system, 0.0)
}

/// Classifies with a collinearity tolerance on the signed triangle area.
/// A tolerance of zero is an exact test.
pub fn classify_with(system: &OrbitalSystem, alignment_tolerance: f64) -> WeatherState {
    let [p1, p2, p3] = system.positions();
    let sun = system.sun();

    let planets_aligned = are_aligned_within(p1, p2, p3, alignment_tolerance);
    let sun_aligned = are_aligned_within(p1, p2, sun, alignment_tolerance);

    match (planets_aligned, sun_aligned) {
        (true, true) => WeatherState::Drought,
        (true, false) => WeatherState::OptimumTemperaturePressure,
        (false, _) if in_triangle(sun, p1, p2, p3) => WeatherState::RainSeason,
        (false, _) => WeatherState::Other,
    }
}

/// Running tally of classified days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WeatherCounter {
    pub days: u32,
    pub drought: u32,
    pub optimum_temperature_pressure: u32,
    pub rain_season: u32,
    pub other: u32,
}

impl WeatherCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, state: WeatherState) {
        self.days += 1;
        match state {
            WeatherState::Drought => self.drought += 1,
            WeatherState::OptimumTemperaturePressure => self.optimum_temperature_pressure += 1,
            WeatherState::RainSeason => self.rain_season += 1,
            WeatherState::Other => self.other += 1,
        }
    }

    pub fn count(&self, state: WeatherState) -> u32 {
        match state {
            WeatherState::Drought => self.drought,
            WeatherState::OptimumTemperaturePressure => self.optimum_temperature_pressure,
            WeatherState::RainSeason => self.rain_season,
            WeatherState::Other => self.other,
        }
    }

    pub fn classified_days(&self) -> u32 {
        self.drought + self.optimum_temperature_pressure + self.rain_season + self.other
    }
}

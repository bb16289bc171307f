use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

fn default_name() -> String {
    "vulcan_system".to_string()
}

fn default_horizon_days() -> u32 {
    20 * 365
}

fn default_initial_angle_deg() -> f64 {
    90.0
}

fn default_ferengi() -> PlanetConfig {
    PlanetConfig {
        angular_speed_deg: 1.0,
        distance_from_sun: 500.0,
    }
}

fn default_betasoide() -> PlanetConfig {
    PlanetConfig {
        angular_speed_deg: 3.0,
        distance_from_sun: 2000.0,
    }
}

fn default_vulcano() -> PlanetConfig {
    PlanetConfig {
        angular_speed_deg: -5.0,
        distance_from_sun: 1000.0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
    #[serde(default = "default_initial_angle_deg")]
    pub initial_angle_deg: f64,
    /// Largest signed triangle area still treated as collinear. Zero keeps
    /// the exact comparison; anything else changes which days are counted as
    /// drought or optimum conditions.
    #[serde(default)]
    pub alignment_tolerance: f64,
    #[serde(default)]
    pub planets: PlanetsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetsConfig {
    #[serde(default = "default_ferengi")]
    pub ferengi: PlanetConfig,
    #[serde(default = "default_betasoide")]
    pub betasoide: PlanetConfig,
    #[serde(default = "default_vulcano")]
    pub vulcano: PlanetConfig,
}

impl Default for PlanetsConfig {
    fn default() -> Self {
        Self {
            ferengi: default_ferengi(),
            betasoide: default_betasoide(),
            vulcano: default_vulcano(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetConfig {
    /// Degrees per day; the sign gives the direction of revolution.
    pub angular_speed_deg: f64,
    pub distance_from_sun: f64,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: default_name(),
            description: None,
            horizon_days: default_horizon_days(),
            initial_angle_deg: default_initial_angle_deg(),
            alignment_tolerance: 0.0,
            planets: PlanetsConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("scenario validation error: {0}")]
    Validation(String),
}

impl Scenario {
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !self.initial_angle_deg.is_finite() {
            return Err(ScenarioError::Validation(
                "initial_angle_deg must be finite".into(),
            ));
        }
        if !self.alignment_tolerance.is_finite() || self.alignment_tolerance < 0.0 {
            return Err(ScenarioError::Validation(format!(
                "alignment_tolerance must be a non-negative number, got {}",
                self.alignment_tolerance
            )));
        }

        let planets = [
            ("ferengi", &self.planets.ferengi),
            ("betasoide", &self.planets.betasoide),
            ("vulcano", &self.planets.vulcano),
        ];
        for (name, planet) in planets {
            if !planet.angular_speed_deg.is_finite() {
                return Err(ScenarioError::Validation(format!(
                    "{name}: angular_speed_deg must be finite"
                )));
            }
            if !planet.distance_from_sun.is_finite() || planet.distance_from_sun <= 0.0 {
                return Err(ScenarioError::Validation(format!(
                    "{name}: distance_from_sun must be positive, got {}",
                    planet.distance_from_sun
                )));
            }
        }
        Ok(())
    }

    pub fn horizon(&self, override_days: Option<u32>) -> u32 {
        override_days.unwrap_or(self.horizon_days)
    }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario
            .validate()
            .with_context(|| format!("Invalid scenario {}", path.display()))?;
        Ok(scenario)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let scenario: Scenario = serde_yaml::from_str("{}").unwrap();
        assert_eq!(scenario, Scenario::default());
        assert_eq!(scenario.horizon_days, 7300);
        assert_eq!(scenario.planets.vulcano.angular_speed_deg, -5.0);
    }

    #[test]
    fn partial_planets_keep_remaining_defaults() {
        let yaml = "
name: fast_ferengi
alignment_tolerance: 0.5
planets:
  ferengi:
    angular_speed_deg: 2.0
    distance_from_sun: 750.0
";
        let scenario: Scenario = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(scenario.name, "fast_ferengi");
        assert_eq!(scenario.alignment_tolerance, 0.5);
        assert_eq!(scenario.planets.ferengi.distance_from_sun, 750.0);
        assert_eq!(scenario.planets.betasoide, default_betasoide());
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_distance() {
        let mut scenario = Scenario::default();
        scenario.planets.betasoide.distance_from_sun = 0.0;
        let err = scenario.validate().unwrap_err();
        assert!(err.to_string().contains("betasoide"));
    }

    #[test]
    fn rejects_negative_tolerance() {
        let scenario = Scenario {
            alignment_tolerance: -1.0,
            ..Scenario::default()
        };
        assert!(scenario.validate().is_err());
    }

    #[test]
    fn horizon_override_wins() {
        let scenario = Scenario::default();
        assert_eq!(scenario.horizon(None), 7300);
        assert_eq!(scenario.horizon(Some(10)), 10);
    }
}

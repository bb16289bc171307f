use serde::{Deserialize, Serialize};

use crate::geometry::Vector2;
use crate::scenario::{PlanetConfig, Scenario};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanetId {
    Ferengi,
    Betasoide,
    Vulcano,
}

impl PlanetId {
    pub const ALL: [PlanetId; 3] = [PlanetId::Ferengi, PlanetId::Betasoide, PlanetId::Vulcano];

    pub fn name(self) -> &'static str {
        match self {
            PlanetId::Ferengi => "Ferengi",
            PlanetId::Betasoide => "Betasoide",
            PlanetId::Vulcano => "Vulcano",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Planet {
    angular_speed: f64,
    distance_from_sun: f64,
    angle: f64,
    position: Vector2,
}

impl Planet {
    /// `angular_speed_deg` is signed; negative values revolve clockwise.
    pub fn new(angular_speed_deg: f64, distance_from_sun: f64, initial_angle_deg: f64) -> Self {
        Self {
            angular_speed: angular_speed_deg.to_radians(),
            distance_from_sun,
            angle: initial_angle_deg.to_radians(),
            position: Vector2::from_polar_degrees(distance_from_sun, initial_angle_deg),
        }
    }

    pub fn from_config(config: &PlanetConfig, initial_angle_deg: f64) -> Self {
        Self::new(
            config.angular_speed_deg,
            config.distance_from_sun,
            initial_angle_deg,
        )
    }

    pub fn angular_speed(&self) -> f64 {
        self.angular_speed
    }

    pub fn distance_from_sun(&self) -> f64 {
        self.distance_from_sun
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn position(&self) -> Vector2 {
        self.position
    }

    fn advance(&mut self) {
        self.angle += self.angular_speed;
        self.position = Vector2::from_polar(self.distance_from_sun, self.angle);
    }
}

/// The sun at the origin and the three planets orbiting it.
///
/// Ferengi and Betasoide are the pair checked against the sun; Vulcano only
/// takes part in the three-planet tests.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitalSystem {
    day: u32,
    sun: Vector2,
    ferengi: Planet,
    betasoide: Planet,
    vulcano: Planet,
}

impl OrbitalSystem {
    pub fn new(ferengi: Planet, betasoide: Planet, vulcano: Planet) -> Self {
        Self {
            day: 0,
            sun: Vector2::ORIGIN,
            ferengi,
            betasoide,
            vulcano,
        }
    }

    pub fn from_scenario(scenario: &Scenario) -> Self {
        let angle = scenario.initial_angle_deg;
        let planets = &scenario.planets;
        Self::new(
            Planet::from_config(&planets.ferengi, angle),
            Planet::from_config(&planets.betasoide, angle),
            Planet::from_config(&planets.vulcano, angle),
        )
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn sun(&self) -> Vector2 {
        self.sun
    }

    pub fn ferengi(&self) -> &Planet {
        &self.ferengi
    }

    pub fn betasoide(&self) -> &Planet {
        &self.betasoide
    }

    pub fn vulcano(&self) -> &Planet {
        &self.vulcano
    }

    pub fn planet(&self, id: PlanetId) -> &Planet {
        match id {
            PlanetId::Ferengi => &self.ferengi,
            PlanetId::Betasoide => &self.betasoide,
            PlanetId::Vulcano => &self.vulcano,
        }
    }

    /// Positions in ferengi, betasoide, vulcano order.
    pub fn positions(&self) -> [Vector2; 3] {
        [
            self.ferengi.position,
            self.betasoide.position,
            self.vulcano.position,
        ]
    }

    pub fn advance(&mut self) {
        self.day += 1;
        self.ferengi.advance();
        self.betasoide.advance();
        self.vulcano.advance();
    }
}

impl Default for OrbitalSystem {
    fn default() -> Self {
        Self::from_scenario(&Scenario::default())
    }
}

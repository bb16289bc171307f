pub mod engine;
pub mod geometry;
pub mod scenario;
pub mod store;
pub mod weather;
pub mod web;
pub mod world;

pub use engine::{SimulationRunner, SimulationSettings};
pub use scenario::Scenario;
pub use weather::{classify, WeatherCounter, WeatherState};
pub use world::OrbitalSystem;

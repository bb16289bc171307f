use thiserror::Error;

use crate::scenario::Scenario;
use crate::store::{DayRecord, StoreError, WeatherStore};
use crate::weather::{classify_with, WeatherCounter};
use crate::world::OrbitalSystem;

#[derive(Debug, Clone)]
pub struct SimulationSettings {
    pub scenario_name: String,
    pub alignment_tolerance: f64,
    /// Classify and count without touching the store.
    pub dry_run: bool,
}

impl SimulationSettings {
    pub fn from_scenario(scenario: &Scenario) -> Self {
        Self {
            scenario_name: scenario.name.clone(),
            alignment_tolerance: scenario.alignment_tolerance,
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self::from_scenario(&Scenario::default())
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to store weather totals: {0}")]
    SaveCounter(#[source] StoreError),
}

/// Walks the orbital system forward one day at a time, classifying each day
/// before the planets move.
pub struct SimulationRunner<S> {
    system: OrbitalSystem,
    counter: WeatherCounter,
    store: S,
    settings: SimulationSettings,
    failed_saves: u32,
}

impl<S: WeatherStore> SimulationRunner<S> {
    pub fn new(system: OrbitalSystem, store: S, settings: SimulationSettings) -> Self {
        Self {
            system,
            counter: WeatherCounter::new(),
            store,
            settings,
            failed_saves: 0,
        }
    }

    pub fn from_scenario(scenario: &Scenario, store: S) -> Self {
        Self::new(
            OrbitalSystem::from_scenario(scenario),
            store,
            SimulationSettings::from_scenario(scenario),
        )
    }

    /// Classifies the next `horizon_days` days. Each call starts a fresh
    /// tally; the orbital system keeps its position from the previous call.
    pub fn run(&mut self, horizon_days: u32) -> Result<WeatherCounter, RunError> {
        self.run_with_hook(horizon_days, |_| {})
    }

    pub fn run_with_hook<F>(
        &mut self,
        horizon_days: u32,
        mut hook: F,
    ) -> Result<WeatherCounter, RunError>
    where
        F: FnMut(&DayRecord),
    {
        self.counter = WeatherCounter::new();
        self.failed_saves = 0;

        log::info!(
            "Simulating '{}' for {} days starting at day {}",
            self.settings.scenario_name,
            horizon_days,
            self.system.day()
        );

        for _ in 0..horizon_days {
            let state = classify_with(&self.system, self.settings.alignment_tolerance);
            let record = DayRecord::capture(&self.system, state);
            self.counter.record(state);

            if !self.settings.dry_run {
                if let Err(err) = self.store.save(&record) {
                    self.failed_saves += 1;
                    log::warn!("Failed to store day {}: {err}", record.day);
                }
            }
            hook(&record);

            self.system.advance();
        }

        if !self.settings.dry_run {
            self.store
                .save_counter(&self.counter)
                .map_err(RunError::SaveCounter)?;
        }

        log::info!("Days: {}", self.counter.days);
        log::info!("Others: {}", self.counter.other);
        log::info!("Drought: {}", self.counter.drought);
        log::info!(
            "OptimumTemperaturePressure: {}",
            self.counter.optimum_temperature_pressure
        );
        log::info!("RainSeason: {}", self.counter.rain_season);
        if self.failed_saves > 0 {
            log::warn!("{} daily records could not be stored", self.failed_saves);
        }

        Ok(self.counter)
    }

    pub fn counter(&self) -> &WeatherCounter {
        &self.counter
    }

    pub fn system(&self) -> &OrbitalSystem {
        &self.system
    }

    pub fn failed_saves(&self) -> u32 {
        self.failed_saves
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

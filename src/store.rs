//! Persistence for classified days and run totals.

use std::{
    collections::BTreeMap,
    fs::{self, File, OpenOptions},
    io::{BufRead, BufReader, ErrorKind, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::weather::{WeatherCounter, WeatherState};
use crate::world::OrbitalSystem;

const RECORDS_FILE: &str = "records.jsonl";
const COUNTER_FILE: &str = "counter.json";

/// One classified day, as handed to a [`WeatherStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    pub day: u32,
    pub is_drought: bool,
    pub is_optimum_temperature_pressure: bool,
    pub is_rain_season: bool,
    pub ferengi_location: String,
    pub betasoide_location: String,
    pub vulcano_location: String,
}

impl DayRecord {
    pub fn capture(system: &OrbitalSystem, state: WeatherState) -> Self {
        Self {
            day: system.day(),
            is_drought: state.is_drought(),
            is_optimum_temperature_pressure: state.is_optimum_temperature_pressure(),
            is_rain_season: state.is_rain_season(),
            ferengi_location: system.ferengi().position().to_location_string(),
            betasoide_location: system.betasoide().position().to_location_string(),
            vulcano_location: system.vulcano().position().to_location_string(),
        }
    }

    pub fn weather(&self) -> WeatherState {
        WeatherState::from_flags(
            self.is_drought,
            self.is_optimum_temperature_pressure,
            self.is_rain_season,
        )
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("no weather record for day {0}")]
    NotFound(u32),
    #[error("no weather totals have been stored")]
    MissingCounter,
    #[error("store lock poisoned")]
    Poisoned,
}

pub trait WeatherStore: Send + Sync {
    fn save(&self, record: &DayRecord) -> Result<(), StoreError>;
    fn get_by_day(&self, day: u32) -> Result<DayRecord, StoreError>;
    fn save_counter(&self, counter: &WeatherCounter) -> Result<(), StoreError>;
    fn get_counter(&self) -> Result<WeatherCounter, StoreError>;
}

impl<T: WeatherStore + ?Sized> WeatherStore for Arc<T> {
    fn save(&self, record: &DayRecord) -> Result<(), StoreError> {
        (**self).save(record)
    }

    fn get_by_day(&self, day: u32) -> Result<DayRecord, StoreError> {
        (**self).get_by_day(day)
    }

    fn save_counter(&self, counter: &WeatherCounter) -> Result<(), StoreError> {
        (**self).save_counter(counter)
    }

    fn get_counter(&self) -> Result<WeatherCounter, StoreError> {
        (**self).get_counter()
    }
}

#[derive(Default)]
struct MemoryContents {
    records: BTreeMap<u32, DayRecord>,
    counter: Option<WeatherCounter>,
}

/// Keeps everything in process memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryContents>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        let guard = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.records.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl WeatherStore for MemoryStore {
    fn save(&self, record: &DayRecord) -> Result<(), StoreError> {
        let mut guard = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        guard.records.insert(record.day, record.clone());
        Ok(())
    }

    fn get_by_day(&self, day: u32) -> Result<DayRecord, StoreError> {
        let guard = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        guard
            .records
            .get(&day)
            .cloned()
            .ok_or(StoreError::NotFound(day))
    }

    fn save_counter(&self, counter: &WeatherCounter) -> Result<(), StoreError> {
        let mut guard = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        guard.counter = Some(*counter);
        Ok(())
    }

    fn get_counter(&self) -> Result<WeatherCounter, StoreError> {
        let guard = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        guard.counter.ok_or(StoreError::MissingCounter)
    }
}

/// Append handle on the records file. `torn` is set when the file does not
/// end in a newline, so the next record starts on a line of its own.
struct RecordWriter {
    file: File,
    torn: bool,
}

impl RecordWriter {
    fn open(path: &Path) -> Result<Self, StoreError> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        let torn = if file.metadata()?.len() > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1))?;
            file.read_exact(&mut last)?;
            last[0] != b'\n'
        } else {
            false
        };
        Ok(Self { file, torn })
    }

    fn append(&mut self, line: &str) -> Result<(), StoreError> {
        if self.torn {
            self.file.write_all(b"\n")?;
            self.torn = false;
        }
        if let Err(err) = self.file.write_all(line.as_bytes()) {
            self.torn = true;
            return Err(err.into());
        }
        Ok(())
    }
}

/// Stores records as JSON lines and the totals as a single JSON document
/// inside one directory.
///
/// Lookups go through an index built from the records file on the first
/// `get_by_day`; records appended later by this store are added to it, but
/// writes from other processes are not picked up until the store is reopened.
pub struct FileStore {
    dir: PathBuf,
    writer: Mutex<Option<RecordWriter>>,
    index: Mutex<Option<BTreeMap<u32, DayRecord>>>,
}

impl FileStore {
    /// Opens `dir`, keeping whatever a previous run left there.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            writer: Mutex::new(None),
            index: Mutex::new(None),
        })
    }

    /// Opens `dir` and discards any previous records and totals.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = Self::open(dir)?;
        for file in [RECORDS_FILE, COUNTER_FILE] {
            match fs::remove_file(store.dir.join(file)) {
                Err(err) if err.kind() != ErrorKind::NotFound => return Err(err.into()),
                _ => {}
            }
        }
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn records_path(&self) -> PathBuf {
        self.dir.join(RECORDS_FILE)
    }

    fn counter_path(&self) -> PathBuf {
        self.dir.join(COUNTER_FILE)
    }

    /// Reads every parseable record; a later line for the same day replaces
    /// an earlier one. Unreadable lines are logged and skipped.
    fn load_index(&self) -> Result<BTreeMap<u32, DayRecord>, StoreError> {
        let path = self.records_path();
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(err.into()),
        };

        let mut records = BTreeMap::new();
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<DayRecord>(&line) {
                Ok(record) => {
                    records.insert(record.day, record);
                }
                Err(err) => {
                    log::warn!(
                        "Skipping unreadable record at {}:{}: {err}",
                        path.display(),
                        number + 1
                    );
                }
            }
        }
        Ok(records)
    }
}

impl WeatherStore for FileStore {
    fn save(&self, record: &DayRecord) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut guard = self.writer.lock().map_err(|_| StoreError::Poisoned)?;
        let writer = match guard.take() {
            Some(writer) => writer,
            None => RecordWriter::open(&self.records_path())?,
        };
        guard.insert(writer).append(&line)?;

        let mut index = self.index.lock().map_err(|_| StoreError::Poisoned)?;
        if let Some(records) = index.as_mut() {
            records.insert(record.day, record.clone());
        }
        Ok(())
    }

    fn get_by_day(&self, day: u32) -> Result<DayRecord, StoreError> {
        let mut guard = self.index.lock().map_err(|_| StoreError::Poisoned)?;
        let records = match guard.take() {
            Some(records) => records,
            None => self.load_index()?,
        };
        guard
            .insert(records)
            .get(&day)
            .cloned()
            .ok_or(StoreError::NotFound(day))
    }

    fn save_counter(&self, counter: &WeatherCounter) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(counter)?;
        fs::write(self.counter_path(), json)?;
        Ok(())
    }

    fn get_counter(&self) -> Result<WeatherCounter, StoreError> {
        let data = match fs::read_to_string(self.counter_path()) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StoreError::MissingCounter)
            }
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_str(&data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(day: u32, state: WeatherState) -> DayRecord {
        DayRecord {
            day,
            is_drought: state.is_drought(),
            is_optimum_temperature_pressure: state.is_optimum_temperature_pressure(),
            is_rain_season: state.is_rain_season(),
            ferengi_location: "0.000000,500.000000".into(),
            betasoide_location: "0.000000,2000.000000".into(),
            vulcano_location: "0.000000,1000.000000".into(),
        }
    }

    #[test]
    fn capture_formats_day_zero() {
        let system = OrbitalSystem::default();
        let captured = DayRecord::capture(&system, WeatherState::Drought);
        assert_eq!(captured, record(0, WeatherState::Drought));
        assert_eq!(captured.weather(), WeatherState::Drought);
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(matches!(store.get_by_day(3), Err(StoreError::NotFound(3))));
        assert!(matches!(store.get_counter(), Err(StoreError::MissingCounter)));

        store.save(&record(3, WeatherState::RainSeason)).unwrap();
        let counter = WeatherCounter {
            days: 1,
            rain_season: 1,
            ..WeatherCounter::default()
        };
        store.save_counter(&counter).unwrap();

        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(
            store.get_by_day(3).unwrap().weather(),
            WeatherState::RainSeason
        );
        assert_eq!(store.get_counter().unwrap(), counter);
    }

    #[test]
    fn file_store_survives_reopen() {
        let temp = tempdir().unwrap();
        {
            let store = FileStore::create(temp.path()).unwrap();
            store.save(&record(0, WeatherState::Drought)).unwrap();
            store.save(&record(1, WeatherState::Other)).unwrap();
            store
                .save_counter(&WeatherCounter {
                    days: 2,
                    drought: 1,
                    other: 1,
                    ..WeatherCounter::default()
                })
                .unwrap();
        }

        let store = FileStore::open(temp.path()).unwrap();
        assert_eq!(store.get_by_day(1).unwrap(), record(1, WeatherState::Other));
        assert!(matches!(store.get_by_day(7), Err(StoreError::NotFound(7))));
        assert_eq!(store.get_counter().unwrap().days, 2);
    }

    #[test]
    fn file_store_create_discards_previous_run() {
        let temp = tempdir().unwrap();
        {
            let store = FileStore::create(temp.path()).unwrap();
            store.save(&record(0, WeatherState::Drought)).unwrap();
            store.save_counter(&WeatherCounter::default()).unwrap();
        }
        let store = FileStore::create(temp.path()).unwrap();
        assert!(matches!(store.get_by_day(0), Err(StoreError::NotFound(0))));
        assert!(matches!(store.get_counter(), Err(StoreError::MissingCounter)));
    }

    #[test]
    fn later_record_for_same_day_wins() {
        let temp = tempdir().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        store.save(&record(4, WeatherState::Other)).unwrap();
        store.save(&record(4, WeatherState::RainSeason)).unwrap();
        assert_eq!(
            store.get_by_day(4).unwrap().weather(),
            WeatherState::RainSeason
        );
    }

    #[test]
    fn poisoned_memory_store_reports_error() {
        let store = Arc::new(MemoryStore::new());
        let holder = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.inner.lock().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        assert!(matches!(store.len(), Err(StoreError::Poisoned)));
        assert!(matches!(store.get_by_day(0), Err(StoreError::Poisoned)));
    }

    fn append_raw(dir: &Path, text: &str) {
        let mut file = OpenOptions::new()
            .append(true)
            .open(dir.join(RECORDS_FILE))
            .unwrap();
        file.write_all(text.as_bytes()).unwrap();
    }

    #[test]
    fn truncated_line_does_not_hide_earlier_days() {
        let temp = tempdir().unwrap();
        {
            let store = FileStore::create(temp.path()).unwrap();
            for day in 0..3 {
                store.save(&record(day, WeatherState::Other)).unwrap();
            }
        }
        append_raw(temp.path(), "{\"day\":3,\"is_dro");

        let store = FileStore::open(temp.path()).unwrap();
        assert_eq!(store.get_by_day(0).unwrap(), record(0, WeatherState::Other));
        assert_eq!(store.get_by_day(2).unwrap().day, 2);
        assert!(matches!(store.get_by_day(3), Err(StoreError::NotFound(3))));
    }

    #[test]
    fn append_after_truncated_line_starts_fresh() {
        let temp = tempdir().unwrap();
        {
            let store = FileStore::create(temp.path()).unwrap();
            store.save(&record(0, WeatherState::Drought)).unwrap();
        }
        append_raw(temp.path(), "{\"day\":1,\"is_dro");

        {
            let store = FileStore::open(temp.path()).unwrap();
            store.save(&record(1, WeatherState::RainSeason)).unwrap();
            store.save(&record(2, WeatherState::Other)).unwrap();
        }

        let store = FileStore::open(temp.path()).unwrap();
        assert_eq!(store.get_by_day(0).unwrap().weather(), WeatherState::Drought);
        assert_eq!(
            store.get_by_day(1).unwrap().weather(),
            WeatherState::RainSeason
        );
        assert_eq!(store.get_by_day(2).unwrap().day, 2);
    }

    #[test]
    fn lookups_see_records_saved_after_first_read() {
        let temp = tempdir().unwrap();
        let store = FileStore::create(temp.path()).unwrap();
        store.save(&record(0, WeatherState::Drought)).unwrap();
        assert!(store.get_by_day(0).is_ok());
        assert!(matches!(store.get_by_day(1), Err(StoreError::NotFound(1))));

        store.save(&record(1, WeatherState::Other)).unwrap();
        assert_eq!(store.get_by_day(1).unwrap().day, 1);
    }
}

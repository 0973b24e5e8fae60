//! Settings shared between the app and the widget.
//!
//! Both surfaces open the same named scope (a flat string-keyed store) and
//! read it independently. The contract at this boundary is last write wins:
//! every write is flushed before `set` returns, and readers always see the
//! latest flushed value. Writes of several keys are not transactional; a
//! reader racing a writer may see one key updated and the other stale.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fd_lock::RwLock as FileLock;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::SettingsError;
use crate::units::TemperatureUnit;

pub const KEY_TEMPERATURE_UNIT: &str = "temperatureUnit";
pub const KEY_IS_CELSIUS: &str = "isCelsius";
pub const KEY_CURRENT_LOCATION_LAT: &str = "currentLocationLat";
pub const KEY_CURRENT_LOCATION_LON: &str = "currentLocationLon";

/// A value in the shared scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Float(f64),
    String(String),
}

impl SettingValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Flat key-value scope readable by every Furcast surface.
pub trait SharedDefaults: Send + Sync {
    fn get(&self, key: &str) -> Option<SettingValue>;

    /// Store a value. Returns once the value is visible to other readers.
    fn set(&self, key: &str, value: SettingValue) -> Result<(), SettingsError>;

    /// Store several values. Implementations may write them in one go, but
    /// callers must not rely on it.
    fn set_many(&self, entries: &[(&str, SettingValue)]) -> Result<(), SettingsError> {
        for (key, value) in entries {
            self.set(key, value.clone())?;
        }
        Ok(())
    }
}

/// In-process scope, for tests and single-surface runs.
#[derive(Debug, Default)]
pub struct MemoryDefaults {
    values: Mutex<HashMap<String, SettingValue>>,
}

impl MemoryDefaults {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SharedDefaults for MemoryDefaults {
    fn get(&self, key: &str) -> Option<SettingValue> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: SettingValue) -> Result<(), SettingsError> {
        self.values.lock().insert(key.to_string(), value);
        Ok(())
    }
}

/// Scope persisted as a JSON object in a file that several processes share.
///
/// Reads go to disk every time so writes from another process are picked up.
/// Writers take an advisory lock on a sibling `.lock` file for the whole
/// read-modify-write, then replace the file through a uniquely named temp
/// file and a rename, so readers only ever see complete files.
#[derive(Debug)]
pub struct FileDefaults {
    path: PathBuf,
}

impl FileDefaults {
    /// Open (or lazily create) the scope at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".lock");
        PathBuf::from(name)
    }

    fn read_all(&self) -> HashMap<String, SettingValue> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                tracing::warn!("Failed to read settings at {:?}: {}", self.path, e);
                return HashMap::new();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!("Ignoring malformed settings at {:?}: {}", self.path, e);
                HashMap::new()
            }
        }
    }

    fn write_all(&self, values: &HashMap<String, SettingValue>) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(values)?;
        let mut tmp = NamedTempFile::new_in(self.dir())?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl SharedDefaults for FileDefaults {
    fn get(&self, key: &str) -> Option<SettingValue> {
        self.read_all().remove(key)
    }

    fn set(&self, key: &str, value: SettingValue) -> Result<(), SettingsError> {
        self.set_many(&[(key, value)])
    }

    fn set_many(&self, entries: &[(&str, SettingValue)]) -> Result<(), SettingsError> {
        fs::create_dir_all(self.dir())?;
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(self.lock_path())?;
        let mut lock = FileLock::new(lock_file);
        let _guard = lock.write()?;

        let mut values = self.read_all();
        for (key, value) in entries {
            values.insert((*key).to_string(), value.clone());
        }
        self.write_all(&values)
    }
}

/// Typed access to the shared settings scope.
///
/// Injected into every surface that needs the unit preference or the last
/// location fix; there is no process-wide instance.
#[derive(Clone)]
pub struct SettingsStore {
    defaults: Arc<dyn SharedDefaults>,
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore").finish_non_exhaustive()
    }
}

impl SettingsStore {
    pub fn new(defaults: Arc<dyn SharedDefaults>) -> Self {
        Self { defaults }
    }

    /// Current unit preference.
    ///
    /// Prefers the string key, then the boolean key. With neither present
    /// this is the first access: Celsius is written under both keys.
    pub fn unit(&self) -> TemperatureUnit {
        if let Some(unit) = self
            .defaults
            .get(KEY_TEMPERATURE_UNIT)
            .and_then(|v| v.as_str().and_then(|s| s.parse().ok()))
        {
            return unit;
        }

        if let Some(is_celsius) = self.defaults.get(KEY_IS_CELSIUS).and_then(|v| v.as_bool()) {
            return TemperatureUnit::from_is_celsius(is_celsius);
        }

        let unit = TemperatureUnit::default();
        if let Err(e) = self.set_unit(unit) {
            tracing::warn!("Failed to store default temperature unit: {}", e);
        }
        unit
    }

    /// Store `unit` under both representations.
    pub fn set_unit(&self, unit: TemperatureUnit) -> Result<(), SettingsError> {
        self.defaults.set_many(&[
            (KEY_TEMPERATURE_UNIT, SettingValue::String(unit.as_str().to_string())),
            (KEY_IS_CELSIUS, SettingValue::Bool(unit.is_celsius())),
        ])?;
        tracing::debug!("Temperature unit set to {}", unit);
        Ok(())
    }

    /// Flip the unit and return the new value.
    pub fn toggle(&self) -> Result<TemperatureUnit, SettingsError> {
        let unit = self.unit().toggled();
        self.set_unit(unit)?;
        Ok(unit)
    }

    /// Last stored location fix as `(latitude, longitude)`.
    pub fn current_location(&self) -> Option<(f64, f64)> {
        let lat = self.defaults.get(KEY_CURRENT_LOCATION_LAT)?.as_f64()?;
        let lon = self.defaults.get(KEY_CURRENT_LOCATION_LON)?.as_f64()?;
        Some((lat, lon))
    }

    pub fn set_current_location(&self, latitude: f64, longitude: f64) -> Result<(), SettingsError> {
        self.defaults.set_many(&[
            (KEY_CURRENT_LOCATION_LAT, SettingValue::Float(latitude)),
            (KEY_CURRENT_LOCATION_LON, SettingValue::Float(longitude)),
        ])
    }
}

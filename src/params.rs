// Parameter Store Module - Per-preset HSV bounds persisted as plain text
//
// Each preset lives in `<preset>-params.txt`: six lines in the order
// hue_min, hue_max, sat_min, sat_max, val_min, val_max. The vision process
// reads the same files, so the layout is fixed.
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::StoreError;
use crate::types::{HsvParams, Preset};

pub struct ParamStore {
    dir: PathBuf,
    // Serializes file access within this process
    lock: Mutex<()>,
}

impl ParamStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self, preset: Preset) -> PathBuf {
        self.dir.join(preset.file_name())
    }

    /// Read a preset's six values. Extra lines are ignored.
    pub fn load(&self, preset: Preset) -> Result<HsvParams, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        read_params(&self.path(preset))
    }

    /// Like `load`, but a missing file yields the full-range defaults
    pub fn load_or_default(&self, preset: Preset) -> Result<HsvParams, StoreError> {
        match self.load(preset) {
            Err(StoreError::Missing { .. }) => Ok(HsvParams::full_range()),
            other => other,
        }
    }

    /// Overwrite a preset's file with `params` in canonical order.
    pub fn save(&self, preset: Preset, params: &HsvParams) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let path = self.path(preset);
        write_params(&path, params)?;
        tracing::info!(preset = %preset, values = ?params.values(), "saved parameters");
        Ok(())
    }

    /// Write full-range defaults for every preset that has no file yet.
    pub fn ensure_defaults(&self) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;

        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        for preset in Preset::ALL {
            let path = self.path(preset);
            if !path.exists() {
                write_params(&path, &HsvParams::full_range())?;
                tracing::info!("Created default parameter file {}", path.display());
            }
        }
        Ok(())
    }
}

fn read_params(path: &Path) -> Result<HsvParams, StoreError> {
    let contents = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    let lines: Vec<&str> = contents.lines().collect();

    if lines.len() < HsvParams::FIELDS.len() {
        return Err(StoreError::ShortFile {
            path: path.to_path_buf(),
            found: lines.len(),
        });
    }

    let mut values = [0u16; 6];
    for (i, &field) in HsvParams::FIELDS.iter().enumerate() {
        let raw = lines[i].trim();
        values[i] = raw.parse().map_err(|_| StoreError::BadValue {
            path: path.to_path_buf(),
            line: i + 1,
            field,
            value: raw.to_string(),
        })?;
    }

    Ok(HsvParams::from_values(values))
}

fn write_params(path: &Path, params: &HsvParams) -> Result<(), StoreError> {
    let mut contents = String::new();
    for value in params.values() {
        contents.push_str(&value.to_string());
        contents.push('\n');
    }
    write_atomic(path, &contents)
}

/// Write to a sibling `.tmp` file, flush it to disk, and rename it over
/// `path`, so the vision process never reads a truncated file.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<(), StoreError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut file = File::create(&tmp).map_err(|e| StoreError::io(&tmp, e))?;
    file.write_all(contents.as_bytes())
        .and_then(|_| file.sync_all())
        .map_err(|e| StoreError::io(&tmp, e))?;
    drop(file);

    std::fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))?;
    Ok(())
}

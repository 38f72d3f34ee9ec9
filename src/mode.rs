// Mode Store Module - Run/tune/restart switch shared with the vision process
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::StoreError;
use crate::params::write_atomic;
use crate::types::Mode;

struct ModeState {
    mode: Mode,
    // Bumped on every transition so a pending restart can tell it was superseded
    generation: u64,
}

/// The current mode, held in memory and mirrored to the `mode` file.
///
/// All writes go through this store; the in-memory value is only updated
/// once the file write has succeeded.
pub struct ModeStore {
    path: PathBuf,
    state: Mutex<ModeState>,
}

impl ModeStore {
    /// Adopt the mode already on disk, or start in `run` and persist it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let mode = match read_mode(&path) {
            Ok(mode) => mode,
            Err(StoreError::Missing { .. }) => {
                write_mode(&path, Mode::Run)?;
                Mode::Run
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable mode file: {}", e);
                write_mode(&path, Mode::Run)?;
                Mode::Run
            }
        };

        Ok(Self {
            path,
            state: Mutex::new(ModeState { mode, generation: 0 }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> Mode {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).mode
    }

    pub fn set(&self, mode: Mode) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        self.transition(&mut state, mode)?;
        Ok(())
    }

    /// Read the mode straight from the file, trimmed.
    pub fn read_persisted(&self) -> Result<Mode, StoreError> {
        read_mode(&self.path)
    }

    /// Enter `restart` now and return to `run` after `delay`.
    ///
    /// The return to `run` happens on a spawned task; it is skipped if any
    /// other transition lands first. Must be called inside a tokio runtime.
    pub fn restart(self: &Arc<Self>, delay: Duration) -> Result<(), StoreError> {
        let generation = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            self.transition(&mut state, Mode::Restart)?
        };

        let store = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = store.finish_restart(generation) {
                tracing::error!("Failed to leave restart mode: {}", e);
            }
        });

        Ok(())
    }

    fn finish_restart(&self, generation: u64) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.generation != generation {
            tracing::debug!("Restart superseded (mode = {})", state.mode);
            return Ok(());
        }
        self.transition(&mut state, Mode::Run)?;
        Ok(())
    }

    fn transition(&self, state: &mut ModeState, mode: Mode) -> Result<u64, StoreError> {
        write_mode(&self.path, mode)?;
        if state.mode != mode {
            tracing::info!("Mode {} -> {}", state.mode, mode);
        }
        state.mode = mode;
        state.generation += 1;
        Ok(state.generation)
    }
}

fn read_mode(path: &Path) -> Result<Mode, StoreError> {
    let contents = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    contents.parse()
}

fn write_mode(path: &Path, mode: Mode) -> Result<(), StoreError> {
    write_atomic(path, &format!("{}\n", mode))
}

//! User settings persisted between sessions.
//!
//! Every field is optional: a value present here overrides the scenario file
//! when a scenario is built, an absent one falls back to it. Reset to defaults
//! clears the file, keeping only the theme.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bevy::log::debug;
use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulation_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_fps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rod_length1: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rod_length2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bob1_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bob2_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dark_mode: Option<bool>,
}

/// Where settings are read from and written to
#[derive(Resource, Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored settings; a missing file means nothing was saved yet
    pub fn load(&self) -> Result<Settings> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_yaml::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Settings::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        let text = serde_yaml::to_string(settings)?;
        fs::write(&self.path, text)?;
        debug!("saved settings to {}", self.path.display());
        Ok(())
    }

    /// Forget everything that was saved
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// src/config.rs

use crate::physics::spots::Spot;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

// --- Diffraction image output ---

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotConfig {
  /// Pixels along x and y
  pub shape: [usize; 2],
  pub spot: Spot,
}

impl Default for SpotConfig {
  fn default() -> Self {
    Self {
      shape: [256, 256],
      spot: Spot::Delta,
    }
  }
}

// --- Main Config Struct ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
  /// Probe wave number
  pub k: f64,
  /// Divisions of the detector half-width
  pub ndiv: usize,
  /// K-space step; the slab half-thickness is |dk| / 2
  pub dk: f64,
  /// Length scale applied to the box and particle positions
  pub scale: f64,
  /// Lattice vectors as columns, written row by row
  pub box_matrix: [[f64; 3]; 3],
  pub spot: SpotConfig,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      k: 1800.0,
      ndiv: 16,
      dk: 0.01,
      scale: 1.0,
      box_matrix: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
      spot: SpotConfig::default(),
    }
  }
}

impl Config {
  /// Loads config from standard OS location (e.g., ~/.config/kspace/settings.json)
  pub fn load() -> (Self, String) {
    Self::load_from(&Self::get_path())
  }

  /// Saves config to standard OS location
  pub fn save(&self) -> String {
    self.save_to(&Self::get_path())
  }

  /// Falls back to defaults on any error; the message says what happened
  pub fn load_from(path: &Path) -> (Self, String) {
    if path.exists() {
      match File::open(path) {
        Ok(file) => {
          let reader = BufReader::new(file);
          match serde_json::from_reader(reader) {
            Ok(cfg) => (cfg, format!("Config loaded from {:?}", path)),
            Err(e) => (Self::default(), format!("Error parsing config: {}", e)),
          }
        }
        Err(e) => (Self::default(), format!("Error opening config: {}", e)),
      }
    } else {
      (
        Self::default(),
        "No config found. Using defaults.".to_string(),
      )
    }
  }

  pub fn save_to(&self, path: &Path) -> String {
    if let Some(parent) = path.parent() {
      let _ = fs::create_dir_all(parent);
    }

    match File::create(path) {
      Ok(file) => {
        let writer = BufWriter::new(file);
        match serde_json::to_writer_pretty(writer, self) {
          Ok(_) => format!("Config saved to {:?}", path),
          Err(e) => format!("Failed to save config: {}", e),
        }
      }
      Err(e) => format!("Could not create config file: {}", e),
    }
  }

  fn get_path() -> PathBuf {
    if let Some(proj) = ProjectDirs::from("com", "example", "kspace") {
      proj.config_dir().join("settings.json")
    } else {
      PathBuf::from("settings.json")
    }
  }
}

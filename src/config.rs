//! Machine specification
//!
//! Describes the physical machine a program is compiled for. Loaded from JSON
//! or built in code; every field has the default of a common V-bed machine.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MachineError, Result};

/// Default number of needles on each bed
pub const DEFAULT_NEEDLE_COUNT: usize = 250;

/// Default maximum racking
pub const DEFAULT_MAX_RACK: f64 = 4.25;

/// Default number of yarn carriers
pub const DEFAULT_CARRIER_COUNT: usize = 10;

/// Default number of needles blocked by the yarn inserting hook
pub const DEFAULT_HOOK_SIZE: usize = 5;

/// Physical parameters of a V-bed knitting machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineSpec {
    /// Needles on each bed
    pub needle_count: usize,
    /// Largest allowed racking, in needles
    pub max_rack: f64,
    /// Carriers available, numbered from 1
    pub carrier_count: usize,
    /// Needles blocked by the yarn inserting hook
    pub hook_size: usize,
}

impl Default for MachineSpec {
    fn default() -> Self {
        Self {
            needle_count: DEFAULT_NEEDLE_COUNT,
            max_rack: DEFAULT_MAX_RACK,
            carrier_count: DEFAULT_CARRIER_COUNT,
            hook_size: DEFAULT_HOOK_SIZE,
        }
    }
}

impl MachineSpec {
    pub fn new(needle_count: usize, max_rack: f64, carrier_count: usize, hook_size: usize) -> Self {
        Self {
            needle_count,
            max_rack,
            carrier_count,
            hook_size,
        }
    }

    /// Check that the specification describes a buildable machine
    pub fn validate(&self) -> Result<()> {
        if self.needle_count == 0 {
            return Err(MachineError::InvalidMachineSpec {
                reason: "needle_count must be greater than 0".to_string(),
            });
        }
        if self.carrier_count == 0 {
            return Err(MachineError::InvalidMachineSpec {
                reason: "carrier_count must be greater than 0".to_string(),
            });
        }
        if !self.max_rack.is_finite() || self.max_rack < 0.0 {
            return Err(MachineError::InvalidMachineSpec {
                reason: format!("max_rack must be a non-negative number, got {}", self.max_rack),
            });
        }
        Ok(())
    }

    /// Parse and validate a JSON specification
    pub fn from_json_str(json: &str) -> Result<Self> {
        let spec: MachineSpec = serde_json::from_str(json)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Load and validate a JSON specification file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let spec: MachineSpec = serde_json::from_reader(reader)?;
        spec.validate()?;
        Ok(spec)
    }
}

//! Yarn carrier state machine
//!
//! ```text
//!            bring_in                      out
//! Inactive ───────────▶ ActiveUnhooked ──────────▶ Inactive
//!    │                    ▲        │ outhook (cuts yarn)
//!    │ inhook             │        └──────────────▶ Inactive
//!    ▼                    │ releasehook
//! ActiveHooked ───────────┘
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MachineError, Result};
use crate::knit_graph::YarnId;

/// Carrier number as written in knitout (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CarrierId(pub usize);

impl CarrierId {
    pub fn new(id: usize) -> Self {
        Self(id)
    }
}

impl fmt::Display for CarrierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Observable state of a carrier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CarrierState {
    /// Parked on the grippers
    #[default]
    Inactive,
    /// In service, yarn no longer held by the inserting hook
    ActiveUnhooked,
    /// In service, yarn held by the inserting hook
    ActiveHooked,
}

impl fmt::Display for CarrierState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CarrierState::Inactive => write!(f, "Inactive"),
            CarrierState::ActiveUnhooked => write!(f, "Active"),
            CarrierState::ActiveHooked => write!(f, "Active (hooked)"),
        }
    }
}

/// A yarn carrier on the machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carrier {
    id: CarrierId,
    yarn: YarnId,
    is_active: bool,
    is_hooked: bool,
    loops_since_release: usize,
}

impl Carrier {
    /// Create an inactive carrier with a fresh yarn
    pub fn new(id: CarrierId) -> Self {
        Self {
            id,
            yarn: YarnId::new(id),
            is_active: false,
            is_hooked: false,
            loops_since_release: 0,
        }
    }

    pub fn id(&self) -> CarrierId {
        self.id
    }

    /// The yarn segment currently fed by this carrier
    pub fn yarn(&self) -> YarnId {
        self.yarn
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_hooked(&self) -> bool {
        self.is_hooked
    }

    /// True while the carrier is parked on the grippers
    pub fn on_gripper(&self) -> bool {
        !self.is_active
    }

    /// Loops made since the yarn was last released from (or put on) the hook
    pub fn loops_since_release(&self) -> usize {
        self.loops_since_release
    }

    pub fn state(&self) -> CarrierState {
        match (self.is_active, self.is_hooked) {
            (false, _) => CarrierState::Inactive,
            (true, false) => CarrierState::ActiveUnhooked,
            (true, true) => CarrierState::ActiveHooked,
        }
    }

    /// Record an `in` operation
    pub fn bring_in(&mut self) -> Result<()> {
        if self.is_active {
            return Err(MachineError::CarrierAlreadyActive { carrier: self.id });
        }
        self.is_active = true;
        debug!(carrier = %self.id, "carrier brought in");
        Ok(())
    }

    /// Record an `inhook` operation
    pub fn inhook(&mut self) -> Result<()> {
        if self.is_active {
            return Err(MachineError::CarrierAlreadyActive { carrier: self.id });
        }
        if self.is_hooked {
            return Err(MachineError::CarrierStillHooked { carrier: self.id });
        }
        self.is_active = true;
        self.is_hooked = true;
        self.loops_since_release = 0;
        debug!(carrier = %self.id, "carrier inhooked");
        Ok(())
    }

    /// Record a `releasehook` operation
    pub fn releasehook(&mut self) -> Result<()> {
        if !self.is_hooked {
            return Err(MachineError::CarrierNotHooked { carrier: self.id });
        }
        self.is_hooked = false;
        self.loops_since_release = 0;
        debug!(carrier = %self.id, "carrier released from hook");
        Ok(())
    }

    /// Record an `out` operation
    pub fn out(&mut self) -> Result<()> {
        self.check_can_leave()?;
        self.is_active = false;
        debug!(carrier = %self.id, "carrier taken out");
        Ok(())
    }

    /// Record an `outhook` operation, cutting the yarn
    pub fn outhook(&mut self) -> Result<()> {
        self.check_can_leave()?;
        self.is_active = false;
        self.yarn = self.yarn.cut();
        self.loops_since_release = 0;
        debug!(carrier = %self.id, yarn = %self.yarn, "carrier outhooked, yarn cut");
        Ok(())
    }

    fn check_can_leave(&self) -> Result<()> {
        if !self.is_active {
            return Err(MachineError::CarrierNotActive { carrier: self.id });
        }
        if self.is_hooked {
            return Err(MachineError::CarrierStillHooked { carrier: self.id });
        }
        Ok(())
    }

    /// Count a loop made with this carrier
    pub fn count_loop(&mut self) {
        self.loops_since_release += 1;
    }
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.yarn)
    }
}

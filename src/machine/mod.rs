//! Machine Module
//!
//! Needles, beds, sheet addressing and the [`MachineState`] orchestrator
//! that validates and performs every knitting operation.

mod bed;
mod needle;
mod needle_sets;
mod pass_direction;
mod peel;
mod sheet;
mod state;

pub use bed::{LoopSource, MachineBed};
pub use needle::{Needle, Side};
pub use needle_sets::{NeedleSet, SheetScope};
pub use pass_direction::PassDirection;
pub use sheet::{check_gauge, check_sheet, SheetIdentifier, SheetNeedle, MAX_GAUGE};
pub use state::{LoopPresence, MachineState};

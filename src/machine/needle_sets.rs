//! Named needle sets
//!
//! The standard groups of needles a program iterates over, evaluated against
//! the machine for all needles, the current sheet, or an explicit sheet.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::needle::{Needle, Side};
use super::sheet::check_sheet;
use super::state::MachineState;
use crate::error::{MachineError, Result};

/// Which physical positions a needle set covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetScope {
    /// Every position on the bed
    All,
    /// The current sheet at the current gauge
    #[default]
    Current,
    /// A specific sheet at a specific gauge
    Sheet { sheet: usize, gauge: usize },
}

/// The standard needle sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NeedleSet {
    Needles,
    FrontNeedles,
    BackNeedles,
    Sliders,
    FrontSliders,
    BackSliders,
    Loops,
    FrontLoops,
    BackLoops,
    SliderLoops,
    FrontSliderLoops,
    BackSliderLoops,
}

impl NeedleSet {
    pub const ALL: [NeedleSet; 12] = [
        NeedleSet::Needles,
        NeedleSet::FrontNeedles,
        NeedleSet::BackNeedles,
        NeedleSet::Sliders,
        NeedleSet::FrontSliders,
        NeedleSet::BackSliders,
        NeedleSet::Loops,
        NeedleSet::FrontLoops,
        NeedleSet::BackLoops,
        NeedleSet::SliderLoops,
        NeedleSet::FrontSliderLoops,
        NeedleSet::BackSliderLoops,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            NeedleSet::Needles => "Needles",
            NeedleSet::FrontNeedles => "Front_Needles",
            NeedleSet::BackNeedles => "Back_Needles",
            NeedleSet::Sliders => "Sliders",
            NeedleSet::FrontSliders => "Front_Sliders",
            NeedleSet::BackSliders => "Back_Sliders",
            NeedleSet::Loops => "Loops",
            NeedleSet::FrontLoops => "Front_Loops",
            NeedleSet::BackLoops => "Back_Loops",
            NeedleSet::SliderLoops => "Slider_Loops",
            NeedleSet::FrontSliderLoops => "Front_Slider_Loops",
            NeedleSet::BackSliderLoops => "Back_Slider_Loops",
        }
    }

    /// Beds covered, front first
    fn sides(&self) -> &'static [Side] {
        match self {
            NeedleSet::FrontNeedles
            | NeedleSet::FrontSliders
            | NeedleSet::FrontLoops
            | NeedleSet::FrontSliderLoops => &[Side::Front],
            NeedleSet::BackNeedles
            | NeedleSet::BackSliders
            | NeedleSet::BackLoops
            | NeedleSet::BackSliderLoops => &[Side::Back],
            NeedleSet::Needles | NeedleSet::Sliders | NeedleSet::Loops | NeedleSet::SliderLoops => {
                &[Side::Front, Side::Back]
            }
        }
    }

    fn is_slider(&self) -> bool {
        matches!(
            self,
            NeedleSet::Sliders
                | NeedleSet::FrontSliders
                | NeedleSet::BackSliders
                | NeedleSet::SliderLoops
                | NeedleSet::FrontSliderLoops
                | NeedleSet::BackSliderLoops
        )
    }

    fn loops_only(&self) -> bool {
        matches!(
            self,
            NeedleSet::Loops
                | NeedleSet::FrontLoops
                | NeedleSet::BackLoops
                | NeedleSet::SliderLoops
                | NeedleSet::FrontSliderLoops
                | NeedleSet::BackSliderLoops
        )
    }
}

impl FromStr for NeedleSet {
    type Err = MachineError;

    fn from_str(name: &str) -> Result<Self> {
        NeedleSet::ALL
            .iter()
            .copied()
            .find(|set| set.name() == name)
            .ok_or_else(|| MachineError::UnknownNeedleSet {
                name: name.to_string(),
            })
    }
}

impl fmt::Display for NeedleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl MachineState {
    fn scoped_positions(&self, scope: SheetScope) -> Result<Vec<usize>> {
        let (sheet, gauge) = match scope {
            SheetScope::All => return Ok((0..self.needle_count()).collect()),
            SheetScope::Current => (self.sheet(), self.gauge()),
            SheetScope::Sheet { sheet, gauge } => (sheet, gauge),
        };
        check_sheet(sheet, gauge)?;
        let count = self.sheet_needle_count(Some(gauge))?;
        Ok((0..count).map(|sheet_pos| sheet + gauge * sheet_pos).collect())
    }

    /// Evaluate a needle set; front needles precede back needles, each in position order
    pub fn needle_set(&self, set: NeedleSet, scope: SheetScope) -> Result<Vec<Needle>> {
        let positions = self.scoped_positions(scope)?;
        let mut needles = Vec::new();
        for &side in set.sides() {
            for &position in &positions {
                let needle = Needle::new(side, position, set.is_slider());
                if !set.loops_only() || self.has_loops(needle)? {
                    needles.push(needle);
                }
            }
        }
        Ok(needles)
    }

    pub fn front_needles(&self, scope: SheetScope) -> Result<Vec<Needle>> {
        self.needle_set(NeedleSet::FrontNeedles, scope)
    }

    pub fn back_needles(&self, scope: SheetScope) -> Result<Vec<Needle>> {
        self.needle_set(NeedleSet::BackNeedles, scope)
    }

    pub fn front_sliders(&self, scope: SheetScope) -> Result<Vec<Needle>> {
        self.needle_set(NeedleSet::FrontSliders, scope)
    }

    pub fn back_sliders(&self, scope: SheetScope) -> Result<Vec<Needle>> {
        self.needle_set(NeedleSet::BackSliders, scope)
    }

    pub fn front_loops(&self, scope: SheetScope) -> Result<Vec<Needle>> {
        self.needle_set(NeedleSet::FrontLoops, scope)
    }

    pub fn back_loops(&self, scope: SheetScope) -> Result<Vec<Needle>> {
        self.needle_set(NeedleSet::BackLoops, scope)
    }

    pub fn front_slider_loops(&self, scope: SheetScope) -> Result<Vec<Needle>> {
        self.needle_set(NeedleSet::FrontSliderLoops, scope)
    }

    pub fn back_slider_loops(&self, scope: SheetScope) -> Result<Vec<Needle>> {
        self.needle_set(NeedleSet::BackSliderLoops, scope)
    }

    /// All needles ordered for a machine pass
    pub fn all_needles(&self, scope: SheetScope) -> Result<Vec<Needle>> {
        self.needle_set(NeedleSet::Needles, scope)
    }

    pub fn all_sliders(&self, scope: SheetScope) -> Result<Vec<Needle>> {
        self.needle_set(NeedleSet::Sliders, scope)
    }

    pub fn all_loops(&self, scope: SheetScope) -> Result<Vec<Needle>> {
        self.needle_set(NeedleSet::Loops, scope)
    }

    pub fn all_slider_loops(&self, scope: SheetScope) -> Result<Vec<Needle>> {
        self.needle_set(NeedleSet::SliderLoops, scope)
    }
}

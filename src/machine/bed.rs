//! Machine Bed
//!
//! One bed (front or back) of needles and sliders. Each needle holds the ids
//! of its loops; the loops themselves live in the [`KnitGraph`].

use tracing::trace;

use super::needle::{Needle, Side};
use crate::error::{MachineError, Result};
use crate::knit_graph::{KnitGraph, LoopId, PullDirection, YarnId};

/// Where the loops placed on a needle come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopSource {
    /// Make one new loop from each yarn
    New(Vec<YarnId>),
    /// Move loops that already exist (transfer)
    Existing(Vec<LoopId>),
}

/// The needles and sliders of one bed
#[derive(Debug, Clone)]
pub struct MachineBed {
    side: Side,
    needles: Vec<Vec<LoopId>>,
    sliders: Vec<Vec<LoopId>>,
}

impl MachineBed {
    pub fn new(side: Side, needle_count: usize) -> Self {
        Self {
            side,
            needles: vec![Vec::new(); needle_count],
            sliders: vec![Vec::new(); needle_count],
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn is_front(&self) -> bool {
        self.side == Side::Front
    }

    pub fn needle_count(&self) -> usize {
        self.needles.len()
    }

    fn slots(&self, is_slider: bool) -> &Vec<Vec<LoopId>> {
        if is_slider {
            &self.sliders
        } else {
            &self.needles
        }
    }

    fn slot(&self, needle: Needle) -> Result<&Vec<LoopId>> {
        let needle_count = self.needle_count();
        self.slots(needle.is_slider)
            .get(needle.position)
            .ok_or(MachineError::NeedleOutOfRange {
                position: needle.position as i64,
                needle_count,
            })
    }

    fn slot_mut(&mut self, needle: Needle) -> Result<&mut Vec<LoopId>> {
        let needle_count = self.needle_count();
        let slots = if needle.is_slider {
            &mut self.sliders
        } else {
            &mut self.needles
        };
        slots
            .get_mut(needle.position)
            .ok_or(MachineError::NeedleOutOfRange {
                position: needle.position as i64,
                needle_count,
            })
    }

    /// Check that a needle addresses a position on this bed
    pub fn check(&self, needle: Needle) -> Result<()> {
        self.slot(needle).map(|_| ())
    }

    /// Loops held by a needle
    pub fn at(&self, needle: Needle) -> Result<&[LoopId]> {
        self.slot(needle).map(|loops| loops.as_slice())
    }

    pub fn has_loops(&self, needle: Needle) -> Result<bool> {
        self.slot(needle).map(|loops| !loops.is_empty())
    }

    /// A needle is clear when it is a slider or its slider holds no loops
    pub fn is_clear(&self, needle: Needle) -> Result<bool> {
        if needle.is_slider {
            self.check(needle)?;
            return Ok(true);
        }
        self.slot(needle.slider()).map(|loops| loops.is_empty())
    }

    /// True if no slider on this bed holds loops
    pub fn sliders_are_clear(&self) -> bool {
        self.sliders.iter().all(|loops| loops.is_empty())
    }

    /// Place loops on a needle
    ///
    /// With [`LoopSource::New`] a loop is made from each yarn; when
    /// `drop_prior` is set the loops already on the needle are dropped and
    /// become the parents of the new loops. With [`LoopSource::Existing`] the
    /// given loops are moved onto the needle.
    pub fn add_loops(
        &mut self,
        needle: Needle,
        source: LoopSource,
        drop_prior: bool,
        graph: &mut KnitGraph,
    ) -> Result<Vec<LoopId>> {
        self.check(needle)?;
        let pull_direction = if self.is_front() {
            PullDirection::FrontToBack
        } else {
            PullDirection::BackToFront
        };
        let slot = self.slot_mut(needle)?;
        let prior = if drop_prior {
            std::mem::take(slot)
        } else {
            Vec::new()
        };

        let added = match source {
            LoopSource::New(yarns) => {
                let mut made = Vec::with_capacity(yarns.len());
                for yarn in yarns {
                    let child = graph.new_loop(yarn);
                    for &parent in &prior {
                        graph.connect(parent, child, pull_direction)?;
                    }
                    made.push(child);
                }
                made
            }
            LoopSource::Existing(loops) => loops,
        };

        slot.extend(added.iter().copied());
        trace!(needle = %needle, loops = ?added, dropped = ?prior, "loops added");
        Ok(added)
    }

    /// Remove and return every loop on a needle
    pub fn drop(&mut self, needle: Needle) -> Result<Vec<LoopId>> {
        let loops = std::mem::take(self.slot_mut(needle)?);
        trace!(needle = %needle, loops = ?loops, "loops dropped");
        Ok(loops)
    }

    /// The needle or slider on this bed holding a loop
    pub fn get_needle_of_loop(&self, loop_id: LoopId) -> Option<Needle> {
        let find = |slots: &Vec<Vec<LoopId>>, is_slider: bool| {
            slots
                .iter()
                .position(|loops| loops.contains(&loop_id))
                .map(|position| Needle::new(self.side, position, is_slider))
        };
        find(&self.needles, false).or_else(|| find(&self.sliders, true))
    }

    /// Ordinary needles in position order
    pub fn needles(&self) -> impl Iterator<Item = Needle> + '_ {
        (0..self.needles.len()).map(move |position| Needle::new(self.side, position, false))
    }

    /// Sliders in position order
    pub fn sliders(&self) -> impl Iterator<Item = Needle> + '_ {
        (0..self.sliders.len()).map(move |position| Needle::new(self.side, position, true))
    }

    /// Total loops held on the bed, sliders included
    pub fn loop_count(&self) -> usize {
        self.needles
            .iter()
            .chain(self.sliders.iter())
            .map(|loops| loops.len())
            .sum()
    }
}

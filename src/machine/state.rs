//! Machine State
//!
//! The orchestrator that owns both beds, the carriers, the knit graph and the
//! sheet bookkeeping of one compiled program. Every primitive operation
//! validates all of its preconditions before it mutates anything, so a failed
//! call leaves the machine exactly as it was.

use tracing::{debug, trace};

use super::bed::{LoopSource, MachineBed};
use super::needle::{Needle, Side};
use super::pass_direction::PassDirection;
use super::sheet::{check_gauge, check_sheet, SheetNeedle};
use crate::carriers::{CarrierId, CarrierSet, CarrierSystem};
use crate::config::MachineSpec;
use crate::error::{MachineError, Result};
use crate::knit_graph::{KnitGraph, LoopId};

/// Whether the front and back needles of a position hold loops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopPresence {
    pub front: bool,
    pub back: bool,
}

impl LoopPresence {
    pub fn new(front: bool, back: bool) -> Self {
        Self { front, back }
    }

    pub fn any(&self) -> bool {
        self.front || self.back
    }
}

/// The current state of a whole V-bed knitting machine
#[derive(Debug, Clone)]
pub struct MachineState {
    spec: MachineSpec,
    /// R = front position - back position of aligned needles
    racking: f64,
    front_bed: MachineBed,
    back_bed: MachineBed,
    last_carriage_direction: PassDirection,
    carriers: CarrierSystem,
    knit_graph: KnitGraph,
    gauge: usize,
    sheet: usize,
    /// Loop presence per position as of the last recorded operation
    pub(super) loop_record: Box<[LoopPresence]>,
    /// Layer of each position; lower values are closer to the front
    pub(super) layer_positions: Box<[usize]>,
}

impl Default for MachineState {
    fn default() -> Self {
        Self::build(MachineSpec::default())
    }
}

impl MachineState {
    /// Create an empty machine at gauge 1, sheet 0, racking 0
    pub fn new(spec: MachineSpec) -> Result<Self> {
        spec.validate()?;
        Ok(Self::build(spec))
    }

    fn build(spec: MachineSpec) -> Self {
        let needle_count = spec.needle_count;
        Self {
            racking: 0.0,
            front_bed: MachineBed::new(Side::Front, needle_count),
            back_bed: MachineBed::new(Side::Back, needle_count),
            last_carriage_direction: PassDirection::LeftToRight,
            carriers: CarrierSystem::new(spec.carrier_count, spec.hook_size),
            knit_graph: KnitGraph::new(),
            gauge: 1,
            sheet: 0,
            loop_record: vec![LoopPresence::default(); needle_count].into_boxed_slice(),
            layer_positions: vec![0; needle_count].into_boxed_slice(),
            spec,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn spec(&self) -> &MachineSpec {
        &self.spec
    }

    /// Needles on either bed
    pub fn needle_count(&self) -> usize {
        self.spec.needle_count
    }

    pub fn max_rack(&self) -> f64 {
        self.spec.max_rack
    }

    pub fn racking(&self) -> f64 {
        self.racking
    }

    pub fn front_bed(&self) -> &MachineBed {
        &self.front_bed
    }

    pub fn back_bed(&self) -> &MachineBed {
        &self.back_bed
    }

    pub fn bed(&self, side: Side) -> &MachineBed {
        match side {
            Side::Front => &self.front_bed,
            Side::Back => &self.back_bed,
        }
    }

    fn bed_and_graph(&mut self, side: Side) -> (&mut MachineBed, &mut KnitGraph) {
        match side {
            Side::Front => (&mut self.front_bed, &mut self.knit_graph),
            Side::Back => (&mut self.back_bed, &mut self.knit_graph),
        }
    }

    pub fn carriers(&self) -> &CarrierSystem {
        &self.carriers
    }

    pub fn knit_graph(&self) -> &KnitGraph {
        &self.knit_graph
    }

    pub fn last_carriage_direction(&self) -> PassDirection {
        self.last_carriage_direction
    }

    /// Flip the recorded carriage direction
    pub fn switch_carriage_direction(&mut self) {
        self.last_carriage_direction = self.last_carriage_direction.opposite();
    }

    /// Loops currently held on both beds, sliders included
    pub fn held_loop_count(&self) -> usize {
        self.front_bed.loop_count() + self.back_bed.loop_count()
    }

    // ========================================================================
    // Gauge and Sheet
    // ========================================================================

    /// Number of sheets interleaved on the beds
    pub fn gauge(&self) -> usize {
        self.gauge
    }

    /// Change the gauge
    ///
    /// A new gauge re-seeds every position's layer to its own sheet index.
    /// The current sheet is kept if it still exists, otherwise sheet 0 is used.
    pub fn set_gauge(&mut self, gauge: usize) -> Result<()> {
        check_gauge(gauge)?;
        if self.needle_count() % gauge != 0 {
            return Err(MachineError::UnevenGauge {
                gauge,
                needle_count: self.needle_count(),
            });
        }
        if gauge != self.gauge {
            self.gauge = gauge;
            for (position, layer) in self.layer_positions.iter_mut().enumerate() {
                *layer = position % gauge;
            }
            if self.sheet >= gauge {
                self.sheet = 0;
            }
            debug!(gauge, sheet = self.sheet, "gauge changed, layers reset");
        }
        Ok(())
    }

    /// The sheet currently being worked
    pub fn sheet(&self) -> usize {
        self.sheet
    }

    /// Select the sheet to work; does not move any loops
    pub fn set_sheet(&mut self, sheet: usize) -> Result<()> {
        check_sheet(sheet, self.gauge)?;
        self.sheet = sheet;
        debug!(sheet, gauge = self.gauge, "sheet selected");
        Ok(())
    }

    /// Needles per sheet at `gauge` (current gauge if `None`)
    pub fn sheet_needle_count(&self, gauge: Option<usize>) -> Result<usize> {
        let gauge = gauge.unwrap_or(self.gauge);
        check_gauge(gauge)?;
        if self.needle_count() % gauge != 0 {
            return Err(MachineError::UnevenGauge {
                gauge,
                needle_count: self.needle_count(),
            });
        }
        Ok(self.needle_count() / gauge)
    }

    /// Physical needle of a sheet position (current sheet and gauge by default)
    pub fn needle(
        &self,
        side: Side,
        sheet_pos: usize,
        sheet: Option<usize>,
        gauge: Option<usize>,
    ) -> Result<Needle> {
        let sheet_needle = SheetNeedle::new(
            side,
            sheet_pos,
            sheet.unwrap_or(self.sheet),
            gauge.unwrap_or(self.gauge),
        )?;
        if sheet_needle.checked_position().is_none() {
            return Err(MachineError::NeedleOutOfRange {
                position: i64::MAX,
                needle_count: self.needle_count(),
            });
        }
        let needle = sheet_needle.needle();
        self.check_needle(needle)?;
        Ok(needle)
    }

    /// Sheet a physical needle belongs to at the current gauge
    pub fn sheet_of(&self, needle: Needle) -> usize {
        needle.position % self.gauge
    }

    /// Layer of the position of a physical needle
    pub fn layer_of(&self, needle: Needle) -> Result<usize> {
        self.layer_position(needle.position)
    }

    // ========================================================================
    // Layer Ordering
    // ========================================================================

    fn check_position(&self, position: usize) -> Result<()> {
        if position >= self.needle_count() {
            return Err(MachineError::NeedleOutOfRange {
                position: position as i64,
                needle_count: self.needle_count(),
            });
        }
        Ok(())
    }

    /// Layer value of a position
    pub fn layer_position(&self, position: usize) -> Result<usize> {
        self.check_position(position)?;
        Ok(self.layer_positions[position])
    }

    /// Assign a layer value to a position
    pub fn set_layer_position(&mut self, position: usize, layer: usize) -> Result<()> {
        self.check_position(position)?;
        if layer >= self.gauge {
            return Err(MachineError::LayerOutOfRange {
                layer,
                gauge: self.gauge,
            });
        }
        self.layer_positions[position] = layer;
        trace!(position, layer, "layer set");
        Ok(())
    }

    /// Move a position back by `layers`, wrapping from the back layer to the front
    pub fn push_layer_backward(&mut self, position: usize, layers: i64) -> Result<()> {
        let shift = layers.rem_euclid(self.gauge as i64) as usize;
        self.shift_layer(position, shift)
    }

    /// Move a position forward by `layers`, wrapping from the front layer to the back
    pub fn push_layer_forward(&mut self, position: usize, layers: i64) -> Result<()> {
        let back = layers.rem_euclid(self.gauge as i64) as usize;
        self.shift_layer(position, (self.gauge - back) % self.gauge)
    }

    /// Move a position `shift < gauge` layers toward the back, wrapping
    fn shift_layer(&mut self, position: usize, shift: usize) -> Result<()> {
        let current = self.layer_position(position)?;
        if shift == 0 {
            return Ok(());
        }
        self.set_layer_position(position, (current + shift) % self.gauge)
    }

    pub fn set_layer_to_front(&mut self, position: usize) -> Result<()> {
        self.set_layer_position(position, 0)
    }

    pub fn set_layer_to_back(&mut self, position: usize) -> Result<()> {
        self.set_layer_position(position, self.gauge - 1)
    }

    // ========================================================================
    // Needle Queries
    // ========================================================================

    /// Fail unless the needle addresses a position on the beds
    pub fn check_needle(&self, needle: Needle) -> Result<()> {
        self.bed(needle.side).check(needle)
    }

    /// Loops held by a needle
    pub fn at(&self, needle: Needle) -> Result<&[LoopId]> {
        self.bed(needle.side).at(needle)
    }

    pub fn has_loops(&self, needle: Needle) -> Result<bool> {
        self.bed(needle.side).has_loops(needle)
    }

    /// A needle is clear for transfer when its slider holds no loops
    pub fn is_clear(&self, needle: Needle) -> Result<bool> {
        self.bed(needle.side).is_clear(needle)
    }

    /// True if no slider on either bed holds loops
    pub fn sliders_are_clear(&self) -> bool {
        self.front_bed.sliders_are_clear() && self.back_bed.sliders_are_clear()
    }

    /// The needle holding a loop, or `None` if the loop is not on the machine
    pub fn get_needle_of_loop(&self, loop_id: LoopId) -> Result<Option<Needle>> {
        let front = self.front_bed.get_needle_of_loop(loop_id);
        let back = self.back_bed.get_needle_of_loop(loop_id);
        match (front, back) {
            (Some(front), Some(back)) => Err(MachineError::LoopOnBothBeds {
                loop_id,
                front,
                back,
            }),
            (front, back) => Ok(front.or(back)),
        }
    }

    /// Loop presence recorded for a position
    pub fn loop_record(&self, position: usize) -> Result<LoopPresence> {
        self.check_position(position)?;
        Ok(self.loop_record[position])
    }

    /// Current loop presence at a position
    pub fn loop_presence(&self, position: usize) -> Result<LoopPresence> {
        Ok(LoopPresence::new(
            self.has_loops(Needle::front(position))?,
            self.has_loops(Needle::back(position))?,
        ))
    }

    /// Record whether the front and back needles at a position hold loops
    pub fn record_needle_position(&mut self, position: usize) -> Result<()> {
        let presence = self.loop_presence(position)?;
        self.loop_record[position] = presence;
        Ok(())
    }

    // ========================================================================
    // Carriers
    // ========================================================================

    pub fn bring_in(&mut self, carrier: CarrierId) -> Result<()> {
        self.carriers.bring_in(carrier)
    }

    pub fn inhook(&mut self, carrier: CarrierId) -> Result<()> {
        self.carriers.inhook(carrier)
    }

    pub fn releasehook(&mut self, carrier: CarrierId) -> Result<()> {
        self.carriers.releasehook(carrier)
    }

    pub fn out(&mut self, carrier: CarrierId) -> Result<()> {
        self.carriers.out(carrier)
    }

    pub fn outhook(&mut self, carrier: CarrierId) -> Result<()> {
        self.carriers.outhook(carrier)
    }

    // ========================================================================
    // Racking
    // ========================================================================

    /// Racking needed to align a front position with a back position
    pub fn get_rack(front_pos: usize, back_pos: usize) -> f64 {
        front_pos as f64 - back_pos as f64
    }

    /// True if the current racking aligns the two positions
    pub fn valid_rack(&self, front_pos: usize, back_pos: usize) -> bool {
        self.racking == Self::get_rack(front_pos, back_pos)
    }

    /// Set the racking directly; returns true if it changed
    pub fn set_racking(&mut self, racking: f64) -> Result<bool> {
        if !racking.is_finite() || racking.abs() > self.spec.max_rack {
            return Err(MachineError::RackingOutOfRange {
                racking,
                max_rack: self.spec.max_rack,
            });
        }
        let changed = self.racking != racking;
        self.racking = racking;
        if changed {
            debug!(racking, "racking changed");
        }
        Ok(changed)
    }

    /// Rack to align `front_pos` with `back_pos`; returns true if the racking changed
    pub fn update_rack(&mut self, front_pos: usize, back_pos: usize) -> Result<bool> {
        self.set_racking(Self::get_rack(front_pos, back_pos))
    }

    /// Needle on the opposite bed that `needle` can transfer to at the current racking
    pub fn xfer_needle_at_racking(&self, needle: Needle, slider: bool) -> Result<Needle> {
        let offset = self.racking.floor() as i64;
        let position = if needle.is_front() {
            needle.position as i64 - offset
        } else {
            needle.position as i64 + offset
        };
        if position < 0 || position >= self.needle_count() as i64 {
            return Err(MachineError::NeedleOutOfRange {
                position,
                needle_count: self.needle_count(),
            });
        }
        Ok(Needle::new(
            needle.side.opposite(),
            position as usize,
            slider,
        ))
    }

    // ========================================================================
    // Validation
    // ========================================================================

    fn check_not_slider(operation: &'static str, needle: Needle) -> Result<()> {
        if needle.is_slider {
            return Err(MachineError::SliderOperation { operation, needle });
        }
        Ok(())
    }

    fn check_sliders_clear(&self, operation: &'static str) -> Result<()> {
        if !self.sliders_are_clear() {
            return Err(MachineError::SlidersInUse { operation });
        }
        Ok(())
    }

    fn validate_loop_making(
        &self,
        operation: &'static str,
        needle: Needle,
        carriers: &CarrierSet,
    ) -> Result<()> {
        self.check_needle(needle)?;
        Self::check_not_slider(operation, needle)?;
        self.check_sliders_clear(operation)?;
        self.carriers.check_in_service(carriers)
    }

    fn validate_xfer(&self, start: Needle, target: Needle) -> Result<()> {
        self.check_needle(start)?;
        self.check_needle(target)?;
        if start.side == target.side {
            return Err(MachineError::SameBedTransfer { start, target });
        }
        if !self.is_clear(target)? {
            return Err(MachineError::NeedleNotClear { needle: target });
        }
        if !self.is_clear(start)? {
            return Err(MachineError::NeedleNotClear { needle: start });
        }
        let (front, back) = if start.is_front() {
            (start, target)
        } else {
            (target, start)
        };
        if !self.valid_rack(front.position, back.position) {
            return Err(MachineError::RackingMismatch {
                racking: self.racking,
                front,
                back,
            });
        }
        Ok(())
    }

    fn record_if(&mut self, record: bool, positions: &[usize]) -> Result<()> {
        if record {
            for &position in positions {
                self.record_needle_position(position)?;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Primitive Operations
    // ========================================================================

    fn make_loops(
        &mut self,
        needle: Needle,
        carriers: &CarrierSet,
        drop_prior: bool,
    ) -> Result<Vec<LoopId>> {
        let yarns = self.carriers.make_loop(carriers)?;
        let (bed, graph) = self.bed_and_graph(needle.side);
        bed.add_loops(needle, LoopSource::New(yarns), drop_prior, graph)
    }

    /// Knit a new loop on `needle`, pulled through the loops it held
    pub fn knit(&mut self, needle: Needle, carriers: &CarrierSet) -> Result<Vec<LoopId>> {
        self.knit_with(needle, carriers, true)
    }

    pub(crate) fn knit_with(
        &mut self,
        needle: Needle,
        carriers: &CarrierSet,
        record: bool,
    ) -> Result<Vec<LoopId>> {
        self.validate_loop_making("knit", needle, carriers)?;
        let loops = self.make_loops(needle, carriers, true)?;
        self.record_if(record, &[needle.position])?;
        trace!(needle = %needle, carriers = %carriers, "knit");
        Ok(loops)
    }

    /// Tuck a new loop on `needle`, keeping the loops it held
    pub fn tuck(&mut self, needle: Needle, carriers: &CarrierSet) -> Result<Vec<LoopId>> {
        self.tuck_with(needle, carriers, true)
    }

    pub(crate) fn tuck_with(
        &mut self,
        needle: Needle,
        carriers: &CarrierSet,
        record: bool,
    ) -> Result<Vec<LoopId>> {
        self.validate_loop_making("tuck", needle, carriers)?;
        let loops = self.make_loops(needle, carriers, false)?;
        self.record_if(record, &[needle.position])?;
        trace!(needle = %needle, carriers = %carriers, "tuck");
        Ok(loops)
    }

    /// Drop every loop held by `needle`
    pub fn drop(&mut self, needle: Needle) -> Result<Vec<LoopId>> {
        self.drop_with(needle, true)
    }

    pub(crate) fn drop_with(&mut self, needle: Needle, record: bool) -> Result<Vec<LoopId>> {
        self.check_needle(needle)?;
        Self::check_not_slider("drop", needle)?;
        self.check_sliders_clear("drop")?;
        let (bed, _) = self.bed_and_graph(needle.side);
        let loops = bed.drop(needle)?;
        self.record_if(record, &[needle.position])?;
        trace!(needle = %needle, "drop");
        Ok(loops)
    }

    /// Move the loops on `start` to `target` on the opposite bed
    ///
    /// Returns the loops that moved.
    pub fn xfer(&mut self, start: Needle, target: Needle) -> Result<Vec<LoopId>> {
        self.xfer_with(start, target, true)
    }

    pub(crate) fn xfer_with(
        &mut self,
        start: Needle,
        target: Needle,
        record: bool,
    ) -> Result<Vec<LoopId>> {
        self.validate_xfer(start, target)?;
        let loops = self.move_loops(start, target)?;
        self.record_if(record, &[start.position, target.position])?;
        trace!(start = %start, target = %target, "xfer");
        Ok(loops)
    }

    fn move_loops(&mut self, start: Needle, target: Needle) -> Result<Vec<LoopId>> {
        let (start_bed, _) = self.bed_and_graph(start.side);
        let loops = start_bed.drop(start)?;
        if !loops.is_empty() {
            let (target_bed, graph) = self.bed_and_graph(target.side);
            target_bed.add_loops(target, LoopSource::Existing(loops.clone()), false, graph)?;
        }
        Ok(loops)
    }

    /// Transfer `start` to `target` and knit a new loop on the vacated `start`
    pub fn split(
        &mut self,
        start: Needle,
        target: Needle,
        carriers: &CarrierSet,
    ) -> Result<Vec<LoopId>> {
        self.split_with(start, target, carriers, true)
    }

    pub(crate) fn split_with(
        &mut self,
        start: Needle,
        target: Needle,
        carriers: &CarrierSet,
        record: bool,
    ) -> Result<Vec<LoopId>> {
        self.validate_xfer(start, target)?;
        self.validate_loop_making("split", start, carriers)?;
        if target.is_slider && self.has_loops(start)? {
            return Err(MachineError::SlidersInUse { operation: "split" });
        }
        self.move_loops(start, target)?;
        let loops = self.make_loops(start, carriers, true)?;
        self.record_if(record, &[start.position, target.position])?;
        trace!(start = %start, target = %target, carriers = %carriers, "split");
        Ok(loops)
    }
}

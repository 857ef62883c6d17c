//! Sheet peeling and reset
//!
//! At gauge > 1 several sheets share each gauge group at different layer
//! depths. Before a sheet is worked, loops of other sheets that sit in its
//! path are transferred to the opposite bed ("peeled"); resetting a sheet
//! returns its loops to the front/back configuration recorded when they were
//! last worked.
//!
//! Every operation here is computed as a plan, validated against the loop
//! presence the plan would leave behind, and only then executed.

use tracing::debug;

use super::needle::Needle;
use super::sheet::check_sheet;
use super::state::{LoopPresence, MachineState};
use crate::error::{MachineError, Result};
use crate::knit_graph::LoopId;
use crate::knitout::{Instruction, KnitoutLine};

/// Transfers that move blocking loops out of the active sheets' path
#[derive(Debug, Default)]
struct PeelPlan {
    /// Needles to transfer to their opposite, grouped by owning sheet
    by_sheet: Vec<Vec<Needle>>,
    /// Positions whose layer equals the active sheet's layer
    same_layer: Vec<usize>,
}

impl PeelPlan {
    fn new(gauge: usize) -> Self {
        Self {
            by_sheet: vec![Vec::new(); gauge],
            same_layer: Vec::new(),
        }
    }

    fn transfers(&self) -> impl Iterator<Item = Needle> + '_ {
        self.by_sheet.iter().flatten().copied()
    }
}

/// A transfer returning loops to their recorded side
#[derive(Debug, Clone, Copy)]
struct ReturnTransfer {
    start: Needle,
    target: Needle,
}

impl ReturnTransfer {
    fn comment(&self, loops: &[LoopId]) -> String {
        let verb = if self.target.is_front() {
            "Return"
        } else {
            "return"
        };
        format!(
            "{} loops {} on {} to {}",
            verb,
            format_loops(loops),
            self.start,
            self.target
        )
    }
}

fn format_loops(loops: &[LoopId]) -> String {
    let ids: Vec<String> = loops.iter().map(|id| id.to_string()).collect();
    format!("[{}]", ids.join(", "))
}

impl MachineState {
    /// The needle at `position` that blocks a sheet at `active_layer`, if any
    fn blocking_needle(
        position: usize,
        presence: LoopPresence,
        layer: usize,
        active_layer: usize,
    ) -> Option<Needle> {
        if layer < active_layer && presence.back {
            Some(Needle::back(position))
        } else if layer > active_layer && presence.front {
            Some(Needle::front(position))
        } else {
            None
        }
    }

    fn plan_peel_for_sheet(&self, active_sheet: usize) -> Result<PeelPlan> {
        let gauge = self.gauge();
        check_sheet(active_sheet, gauge)?;
        let mut plan = PeelPlan::new(gauge);
        for position in 0..self.needle_count() {
            let presence = self.loop_presence(position)?;
            let sheet = position % gauge;
            if !presence.any() || sheet == active_sheet {
                continue;
            }
            let layer = self.layer_positions[position];
            let active_layer = self.layer_positions[(position / gauge) * gauge + active_sheet];
            if layer == active_layer {
                plan.same_layer.push(position);
            }
            if let Some(needle) = Self::blocking_needle(position, presence, layer, active_layer) {
                plan.by_sheet[sheet].push(needle);
            }
        }
        Ok(plan)
    }

    fn plan_peel_for_sheets(&self, active_sheets: &[usize]) -> Result<PeelPlan> {
        let gauge = self.gauge();
        if active_sheets.is_empty() {
            return Err(MachineError::NoActiveSheets);
        }
        for &sheet in active_sheets {
            check_sheet(sheet, gauge)?;
        }
        let mut plan = PeelPlan::new(gauge);
        for position in 0..self.needle_count() {
            let presence = self.loop_presence(position)?;
            let sheet = position % gauge;
            if !presence.any() || active_sheets.contains(&sheet) {
                continue;
            }
            let group = (position / gauge) * gauge;
            let mut layers = active_sheets
                .iter()
                .map(|&active| self.layer_positions[group + active]);
            let active_layer = layers.next().unwrap_or_default();
            if layers.any(|other| other != active_layer) {
                return Err(MachineError::InconsistentSheetLayering {
                    sheets: active_sheets.to_vec(),
                    position,
                });
            }
            let layer = self.layer_positions[position];
            if layer == active_layer {
                return Err(MachineError::UnseparableSheets {
                    sheet,
                    sheets: active_sheets.to_vec(),
                    position,
                });
            }
            if let Some(needle) = Self::blocking_needle(position, presence, layer, active_layer) {
                plan.by_sheet[sheet].push(needle);
            }
        }
        Ok(plan)
    }

    /// Fail unless every planned transfer is between clear needles
    fn check_transfers_clear(&self, transfers: impl Iterator<Item = (Needle, Needle)>) -> Result<()> {
        for (start, target) in transfers {
            for needle in [start, target] {
                if !self.is_clear(needle)? {
                    return Err(MachineError::NeedleNotClear { needle });
                }
            }
        }
        Ok(())
    }

    /// Loop presence per position once `plan` has been carried out
    fn project_peel(&self, plan: &PeelPlan) -> Result<Vec<LoopPresence>> {
        let mut projected = (0..self.needle_count())
            .map(|position| self.loop_presence(position))
            .collect::<Result<Vec<_>>>()?;
        for needle in plan.transfers() {
            let presence = &mut projected[needle.position];
            if needle.is_front() {
                presence.front = false;
                presence.back = true;
            } else {
                presence.back = false;
                presence.front = true;
            }
        }
        Ok(projected)
    }

    /// Transfers that restore the recorded presence of the selected positions
    fn plan_returns(
        &self,
        projected: &[LoopPresence],
        selected: impl Fn(usize) -> bool,
    ) -> Result<Vec<ReturnTransfer>> {
        let mut returns = Vec::new();
        for (position, current) in projected.iter().enumerate() {
            if !selected(position) {
                continue;
            }
            let front = Needle::front(position);
            let back = Needle::back(position);
            let recorded = self.loop_record[position];
            match (recorded.front, recorded.back) {
                (true, true) => {
                    if !(current.front && current.back) {
                        return Err(MachineError::UnseparatedLoops { front, back });
                    }
                }
                (true, false) => match (current.front, current.back) {
                    (true, true) => {
                        return Err(MachineError::BlockedReturn {
                            target: front,
                            blocking: back,
                        })
                    }
                    (true, false) => {}
                    (false, true) => returns.push(ReturnTransfer {
                        start: back,
                        target: front,
                    }),
                    (false, false) => return Err(MachineError::LostLoops { needle: front }),
                },
                (false, true) => match (current.front, current.back) {
                    (true, true) => {
                        return Err(MachineError::BlockedReturn {
                            target: back,
                            blocking: front,
                        })
                    }
                    (false, true) => {}
                    (true, false) => returns.push(ReturnTransfer {
                        start: front,
                        target: back,
                    }),
                    (false, false) => return Err(MachineError::LostLoops { needle: back }),
                },
                (false, false) => {}
            }
        }
        Ok(returns)
    }

    /// Rack to 0 ahead of same-position transfers
    fn align_for_transfers(&mut self, lines: &mut Vec<KnitoutLine>) -> Result<()> {
        if self.set_racking(0.0)? {
            lines.push(KnitoutLine::rack(0.0));
        }
        Ok(())
    }

    fn execute(
        &mut self,
        plan: &PeelPlan,
        header: impl Fn(usize) -> String,
        returns: &[ReturnTransfer],
    ) -> Result<Vec<KnitoutLine>> {
        let mut lines = Vec::new();
        if plan.transfers().next().is_some() || !returns.is_empty() {
            self.align_for_transfers(&mut lines)?;
        }
        for (sheet, needles) in plan.by_sheet.iter().enumerate() {
            lines.push(KnitoutLine::comment(header(sheet)));
            for &needle in needles {
                let target = needle.opposite();
                self.xfer_with(needle, target, false)?;
                lines.push(KnitoutLine::xfer(needle, target));
            }
        }
        for transfer in returns {
            let comment = transfer.comment(self.at(transfer.start)?);
            self.xfer_with(transfer.start, transfer.target, true)?;
            lines.push(KnitoutLine::with_comment(
                Instruction::Xfer {
                    start: transfer.start,
                    target: transfer.target,
                },
                comment,
            ));
        }
        Ok(lines)
    }

    fn peel_transfer_pairs(plan: &PeelPlan) -> impl Iterator<Item = (Needle, Needle)> + '_ {
        plan.transfers().map(|needle| (needle, needle.opposite()))
    }

    /// Move loops of other sheets out of the way of `active_sheet`
    ///
    /// Returns the knitout of the transfers, one comment line per sheet, and
    /// the positions of other sheets that share the active sheet's layer.
    pub fn peel_sheet_relative_to_active_sheet(
        &mut self,
        active_sheet: usize,
    ) -> Result<(Vec<KnitoutLine>, Vec<usize>)> {
        let plan = self.plan_peel_for_sheet(active_sheet)?;
        self.check_transfers_clear(Self::peel_transfer_pairs(&plan))?;
        let lines = self.execute(
            &plan,
            |sheet| format!(" Peel sheet {} relative to {}", sheet, active_sheet),
            &[],
        )?;
        debug!(active_sheet, same_layer = ?plan.same_layer, "peeled sheets");
        Ok((lines, plan.same_layer))
    }

    /// Move loops of inactive sheets out of the way of several active sheets
    pub fn peel_sheet_relative_to_active_sheets(
        &mut self,
        active_sheets: &[usize],
    ) -> Result<Vec<KnitoutLine>> {
        let plan = self.plan_peel_for_sheets(active_sheets)?;
        self.check_transfers_clear(Self::peel_transfer_pairs(&plan))?;
        let lines = self.execute(
            &plan,
            |sheet| format!(" Peel sheet {} relative to {:?}", sheet, active_sheets),
            &[],
        )?;
        debug!(?active_sheets, "peeled sheets");
        Ok(lines)
    }

    /// Peel relative to `sheet`, then return its loops to their recorded sides
    pub fn reset_sheet(&mut self, sheet: usize) -> Result<Vec<KnitoutLine>> {
        let plan = self.plan_peel_for_sheet(sheet)?;
        let projected = self.project_peel(&plan)?;
        let gauge = self.gauge();
        let mut same_layer = vec![false; self.needle_count()];
        for &position in &plan.same_layer {
            same_layer[position] = true;
        }
        let returns = self.plan_returns(&projected, |position| {
            position % gauge == sheet || same_layer[position]
        })?;
        self.check_transfers_clear(
            Self::peel_transfer_pairs(&plan).chain(returns.iter().map(|r| (r.start, r.target))),
        )?;
        let lines = self.execute(
            &plan,
            |peeled| format!(" Peel sheet {} relative to {}", peeled, sheet),
            &returns,
        )?;
        debug!(sheet, returned = returns.len(), "sheet reset");
        Ok(lines)
    }

    /// Peel relative to `sheets`, then return their loops to their recorded sides
    pub fn reset_sheets(&mut self, sheets: &[usize]) -> Result<Vec<KnitoutLine>> {
        let plan = self.plan_peel_for_sheets(sheets)?;
        let projected = self.project_peel(&plan)?;
        let gauge = self.gauge();
        let returns =
            self.plan_returns(&projected, |position| sheets.contains(&(position % gauge)))?;
        self.check_transfers_clear(
            Self::peel_transfer_pairs(&plan).chain(returns.iter().map(|r| (r.start, r.target))),
        )?;
        let lines = self.execute(
            &plan,
            |peeled| format!(" Peel sheet {} relative to {:?}", peeled, sheets),
            &returns,
        )?;
        debug!(?sheets, returned = returns.len(), "sheets reset");
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carriers::{CarrierId, CarrierSet};
    use crate::config::MachineSpec;
    use crate::knitout::render;
    use pretty_assertions::assert_eq;

    fn gauged(gauge: usize) -> (MachineState, CarrierSet) {
        let mut state = MachineState::new(MachineSpec::new(12, 4.0, 2, 5)).unwrap();
        state.set_gauge(gauge).unwrap();
        state.bring_in(CarrierId::new(1)).unwrap();
        (state, CarrierSet::single(CarrierId::new(1)))
    }

    #[test]
    fn test_peel_moves_front_blocking_loops_back() {
        let (mut state, c) = gauged(2);
        // sheet 1 sits behind sheet 0, so its front loops block sheet 0
        state.knit(Needle::front(1), &c).unwrap();
        let (lines, same_layer) = state.peel_sheet_relative_to_active_sheet(0).unwrap();
        assert_eq!(
            render(&lines),
            "; Peel sheet 0 relative to 0\n; Peel sheet 1 relative to 0\nxfer f1 b1\n"
        );
        assert!(same_layer.is_empty());
        assert!(state.has_loops(Needle::back(1)).unwrap());
        // peel transfers do not touch the record
        assert_eq!(state.loop_record(1).unwrap(), LoopPresence::new(true, false));
    }

    #[test]
    fn test_peel_without_conflicts_emits_only_comments() {
        let (mut state, c) = gauged(2);
        state.knit(Needle::front(0), &c).unwrap();
        let (lines, _) = state.peel_sheet_relative_to_active_sheet(1).unwrap();
        assert_eq!(
            render(&lines),
            "; Peel sheet 0 relative to 1\n; Peel sheet 1 relative to 1\n"
        );
    }

    #[test]
    fn test_same_layer_positions_reported() {
        let (mut state, c) = gauged(2);
        state.knit(Needle::front(2), &c).unwrap();
        state.set_layer_position(3, 0).unwrap();
        let (lines, same_layer) = state.peel_sheet_relative_to_active_sheet(1).unwrap();
        assert_eq!(same_layer, vec![2]);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_reset_returns_peeled_loops() {
        let (mut state, c) = gauged(2);
        let made = state.knit(Needle::front(1), &c).unwrap();
        state.peel_sheet_relative_to_active_sheet(0).unwrap();
        let lines = state.reset_sheet(1).unwrap();
        assert_eq!(
            render(&lines),
            format!(
                "; Peel sheet 0 relative to 1\n; Peel sheet 1 relative to 1\nxfer b1 f1;Return loops [{}] on b1 to f1\n",
                made[0]
            )
        );
        assert_eq!(state.at(Needle::front(1)).unwrap(), made.as_slice());
    }

    #[test]
    fn test_peel_racks_to_zero_first() {
        let (mut state, c) = gauged(2);
        state.knit(Needle::front(1), &c).unwrap();
        state.update_rack(3, 1).unwrap();
        let (lines, _) = state.peel_sheet_relative_to_active_sheet(0).unwrap();
        assert_eq!(lines[0], KnitoutLine::rack(0.0));
        assert_eq!(state.racking(), 0.0);
    }

    #[test]
    fn test_reset_returns_only_same_layer_positions_of_other_sheets() {
        let (mut state, c) = gauged(2);
        state.knit(Needle::front(1), &c).unwrap();
        state.knit(Needle::front(3), &c).unwrap();
        state.peel_sheet_relative_to_active_sheet(0).unwrap();
        state.set_layer_position(1, 0).unwrap();

        let lines = state.reset_sheet(0).unwrap();
        assert_eq!(
            render(&lines),
            "; Peel sheet 0 relative to 0\n; Peel sheet 1 relative to 0\n\
             xfer b1 f1;Return loops [0] on b1 to f1\n"
        );
        assert!(state.has_loops(Needle::front(1)).unwrap());
        assert!(state.has_loops(Needle::back(3)).unwrap());
        assert!(!state.has_loops(Needle::front(3)).unwrap());
    }

    #[test]
    fn test_reset_detects_lost_loops() {
        let (mut state, c) = gauged(2);
        state.knit(Needle::front(0), &c).unwrap();
        state.drop_with(Needle::front(0), false).unwrap();
        let err = state.reset_sheet(0).unwrap_err();
        assert_eq!(err.error_code(), "LOST_LOOPS");
        assert!(err.is_internal());
    }

    #[test]
    fn test_reset_detects_blocked_return() {
        let (mut state, c) = gauged(2);
        state.knit(Needle::front(0), &c).unwrap();
        state.knit_with(Needle::back(0), &c, false).unwrap();
        let err = state.reset_sheet(0).unwrap_err();
        assert_eq!(err.error_code(), "BLOCKED_RETURN");
    }

    #[test]
    fn test_failed_reset_leaves_machine_untouched() {
        let (mut state, c) = gauged(2);
        state.knit(Needle::front(1), &c).unwrap();
        state.knit(Needle::front(0), &c).unwrap();
        state.drop_with(Needle::front(0), false).unwrap();
        // peeling sheet 1 out of sheet 0's way is planned, but the lost loop on f0 aborts first
        let err = state.reset_sheet(0).unwrap_err();
        assert_eq!(err.error_code(), "LOST_LOOPS");
        assert!(state.has_loops(Needle::front(1)).unwrap());
        assert!(!state.has_loops(Needle::back(1)).unwrap());
    }

    #[test]
    fn test_multi_sheet_peel() {
        let (mut state, c) = gauged(3);
        // sheets 0 and 1 share layer 0, sheet 2 stays at layer 2
        for group in 0..4 {
            state.set_layer_position(group * 3 + 1, 0).unwrap();
        }
        state.knit(Needle::front(2), &c).unwrap();
        let lines = state.peel_sheet_relative_to_active_sheets(&[0, 1]).unwrap();
        assert_eq!(
            render(&lines),
            "; Peel sheet 0 relative to [0, 1]\n; Peel sheet 1 relative to [0, 1]\n; Peel sheet 2 relative to [0, 1]\nxfer f2 b2\n"
        );
    }

    #[test]
    fn test_multi_sheet_errors() {
        let (mut state, c) = gauged(3);
        state.knit(Needle::front(2), &c).unwrap();
        assert_eq!(
            state
                .peel_sheet_relative_to_active_sheets(&[])
                .unwrap_err()
                .error_code(),
            "NO_ACTIVE_SHEETS"
        );
        assert_eq!(
            state
                .peel_sheet_relative_to_active_sheets(&[0, 1])
                .unwrap_err()
                .error_code(),
            "INCONSISTENT_SHEET_LAYERING"
        );
        state.set_layer_position(1, 0).unwrap();
        state.set_layer_position(2, 0).unwrap();
        assert_eq!(
            state
                .peel_sheet_relative_to_active_sheets(&[0, 1])
                .unwrap_err()
                .error_code(),
            "UNSEPARABLE_SHEETS"
        );
        assert_eq!(
            state
                .peel_sheet_relative_to_active_sheets(&[3])
                .unwrap_err()
                .error_code(),
            "SHEET_OUT_OF_RANGE"
        );
        assert!(state.has_loops(Needle::front(2)).unwrap());
    }

    #[test]
    fn test_reset_sheets() {
        let (mut state, c) = gauged(3);
        for group in 0..4 {
            state.set_layer_position(group * 3 + 1, 0).unwrap();
        }
        let made = state.knit(Needle::front(2), &c).unwrap();
        state.peel_sheet_relative_to_active_sheets(&[0, 1]).unwrap();
        assert!(state.has_loops(Needle::back(2)).unwrap());
        let lines = state.reset_sheets(&[2]).unwrap();
        assert_eq!(
            lines.last().unwrap().to_string(),
            format!("xfer b2 f2;Return loops [{}] on b2 to f2\n", made[0])
        );
        assert!(state.has_loops(Needle::front(2)).unwrap());
    }
}

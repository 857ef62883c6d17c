//! Program Module
//!
//! A program is a serde-described list of machine operations. Replaying it
//! mutates a [`MachineState`] and produces the knitout for every operation
//! that succeeded; the first failing operation stops the run.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::carriers::{CarrierId, CarrierSet};
use crate::config::MachineSpec;
use crate::error::Result;
use crate::knitout::{Instruction, KnitoutLine};
use crate::machine::{MachineState, Needle, PassDirection};

/// One operation applied to the machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    In {
        carrier: CarrierId,
    },
    Inhook {
        carrier: CarrierId,
    },
    Releasehook {
        carrier: CarrierId,
    },
    Out {
        carrier: CarrierId,
    },
    Outhook {
        carrier: CarrierId,
    },
    Knit {
        needle: Needle,
        carriers: CarrierSet,
        #[serde(default)]
        direction: Option<PassDirection>,
    },
    Tuck {
        needle: Needle,
        carriers: CarrierSet,
        #[serde(default)]
        direction: Option<PassDirection>,
    },
    Split {
        start: Needle,
        target: Needle,
        carriers: CarrierSet,
        #[serde(default)]
        direction: Option<PassDirection>,
    },
    Drop {
        needle: Needle,
    },
    Xfer {
        start: Needle,
        target: Needle,
    },
    /// Rack to align a front position with a back position
    Align {
        front: usize,
        back: usize,
    },
    Rack {
        racking: f64,
    },
    SwitchDirection,
    Gauge {
        gauge: usize,
    },
    Sheet {
        sheet: usize,
    },
    SetLayer {
        position: usize,
        layer: usize,
    },
    PushLayerBackward {
        position: usize,
        layers: i64,
    },
    PushLayerForward {
        position: usize,
        layers: i64,
    },
    LayerToFront {
        position: usize,
    },
    LayerToBack {
        position: usize,
    },
    Peel {
        sheet: usize,
    },
    PeelSheets {
        sheets: Vec<usize>,
    },
    Reset {
        sheet: usize,
    },
    ResetSheets {
        sheets: Vec<usize>,
    },
    Comment {
        text: String,
    },
}

impl Operation {
    /// Apply to the machine, returning the knitout it produced
    pub fn apply(&self, state: &mut MachineState) -> Result<Vec<KnitoutLine>> {
        let direction_or_last =
            |direction: &Option<PassDirection>, state: &MachineState| {
                direction.unwrap_or_else(|| state.last_carriage_direction())
            };
        let line = |instruction: Instruction| vec![KnitoutLine::instruction(instruction)];

        let lines = match self {
            Operation::In { carrier } => {
                state.bring_in(*carrier)?;
                line(Instruction::In {
                    carriers: CarrierSet::single(*carrier),
                })
            }
            Operation::Inhook { carrier } => {
                state.inhook(*carrier)?;
                line(Instruction::Inhook {
                    carriers: CarrierSet::single(*carrier),
                })
            }
            Operation::Releasehook { carrier } => {
                state.releasehook(*carrier)?;
                line(Instruction::Releasehook {
                    carriers: CarrierSet::single(*carrier),
                })
            }
            Operation::Out { carrier } => {
                state.out(*carrier)?;
                line(Instruction::Out {
                    carriers: CarrierSet::single(*carrier),
                })
            }
            Operation::Outhook { carrier } => {
                state.outhook(*carrier)?;
                line(Instruction::Outhook {
                    carriers: CarrierSet::single(*carrier),
                })
            }
            Operation::Knit {
                needle,
                carriers,
                direction,
            } => {
                let direction = direction_or_last(direction, state);
                state.knit(*needle, carriers)?;
                line(Instruction::Knit {
                    direction,
                    needle: *needle,
                    carriers: carriers.clone(),
                })
            }
            Operation::Tuck {
                needle,
                carriers,
                direction,
            } => {
                let direction = direction_or_last(direction, state);
                state.tuck(*needle, carriers)?;
                line(Instruction::Tuck {
                    direction,
                    needle: *needle,
                    carriers: carriers.clone(),
                })
            }
            Operation::Split {
                start,
                target,
                carriers,
                direction,
            } => {
                let direction = direction_or_last(direction, state);
                state.split(*start, *target, carriers)?;
                line(Instruction::Split {
                    direction,
                    start: *start,
                    target: *target,
                    carriers: carriers.clone(),
                })
            }
            Operation::Drop { needle } => {
                state.drop(*needle)?;
                line(Instruction::Drop { needle: *needle })
            }
            Operation::Xfer { start, target } => {
                state.xfer(*start, *target)?;
                line(Instruction::Xfer {
                    start: *start,
                    target: *target,
                })
            }
            Operation::Align { front, back } => {
                if state.update_rack(*front, *back)? {
                    vec![KnitoutLine::rack(state.racking())]
                } else {
                    Vec::new()
                }
            }
            Operation::Rack { racking } => {
                if state.set_racking(*racking)? {
                    vec![KnitoutLine::rack(*racking)]
                } else {
                    Vec::new()
                }
            }
            Operation::SwitchDirection => {
                state.switch_carriage_direction();
                Vec::new()
            }
            Operation::Gauge { gauge } => {
                state.set_gauge(*gauge)?;
                Vec::new()
            }
            Operation::Sheet { sheet } => {
                state.set_sheet(*sheet)?;
                Vec::new()
            }
            Operation::SetLayer { position, layer } => {
                state.set_layer_position(*position, *layer)?;
                Vec::new()
            }
            Operation::PushLayerBackward { position, layers } => {
                state.push_layer_backward(*position, *layers)?;
                Vec::new()
            }
            Operation::PushLayerForward { position, layers } => {
                state.push_layer_forward(*position, *layers)?;
                Vec::new()
            }
            Operation::LayerToFront { position } => {
                state.set_layer_to_front(*position)?;
                Vec::new()
            }
            Operation::LayerToBack { position } => {
                state.set_layer_to_back(*position)?;
                Vec::new()
            }
            Operation::Peel { sheet } => state.peel_sheet_relative_to_active_sheet(*sheet)?.0,
            Operation::PeelSheets { sheets } => {
                state.peel_sheet_relative_to_active_sheets(sheets)?
            }
            Operation::Reset { sheet } => state.reset_sheet(*sheet)?,
            Operation::ResetSheets { sheets } => state.reset_sheets(sheets)?,
            Operation::Comment { text } => vec![KnitoutLine::comment(text.clone())],
        };
        Ok(lines)
    }
}

/// A machine specification and the operations to replay on it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub machine: Option<MachineSpec>,
    pub operations: Vec<Operation>,
}

impl Program {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self {
            machine: None,
            operations,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Build the machine this program is written for, falling back to `default`
    pub fn machine_state(&self, default: &MachineSpec) -> Result<MachineState> {
        let spec = self.machine.clone().unwrap_or_else(|| default.clone());
        MachineState::new(spec)
    }

    /// Replay every operation in order
    pub fn run(&self, state: &mut MachineState) -> Result<Vec<KnitoutLine>> {
        let mut lines = Vec::new();
        for (index, operation) in self.operations.iter().enumerate() {
            debug!(index, ?operation, "applying operation");
            lines.extend(operation.apply(state)?);
        }
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knitout::render;
    use pretty_assertions::assert_eq;

    fn c(id: usize) -> CarrierSet {
        CarrierSet::single(CarrierId::new(id))
    }

    #[test]
    fn test_parse_operations() {
        let program = Program::from_json_str(
            r#"{
                "machine": {"needle_count": 20},
                "operations": [
                    {"op": "in", "carrier": 1},
                    {"op": "knit", "needle": "f2", "carriers": [1], "direction": "-"},
                    {"op": "align", "front": 2, "back": 1},
                    {"op": "switch_direction"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(program.machine.as_ref().unwrap().needle_count, 20);
        assert_eq!(
            program.operations[1],
            Operation::Knit {
                needle: Needle::front(2),
                carriers: c(1),
                direction: Some(PassDirection::RightToLeft),
            }
        );
        assert_eq!(program.operations[3], Operation::SwitchDirection);
    }

    #[test]
    fn test_run_emits_lines() {
        let program = Program::new(vec![
            Operation::In {
                carrier: CarrierId::new(1),
            },
            Operation::Knit {
                needle: Needle::front(2),
                carriers: c(1),
                direction: None,
            },
            Operation::Align { front: 2, back: 1 },
            Operation::Xfer {
                start: Needle::front(2),
                target: Needle::back(1),
            },
            Operation::Align { front: 2, back: 1 },
            Operation::Out {
                carrier: CarrierId::new(1),
            },
        ]);
        let mut state = program.machine_state(&MachineSpec::default()).unwrap();
        let lines = program.run(&mut state).unwrap();
        assert_eq!(
            render(&lines),
            "in 1\nknit + f2 1\nrack 1\nxfer f2 b1\nout 1\n"
        );
        assert!(state.has_loops(Needle::back(1)).unwrap());
    }

    #[test]
    fn test_run_stops_at_first_error() {
        let program = Program::new(vec![
            Operation::Knit {
                needle: Needle::front(0),
                carriers: c(1),
                direction: None,
            },
            Operation::Comment {
                text: "unreachable".to_string(),
            },
        ]);
        let mut state = MachineState::default();
        let err = program.run(&mut state).unwrap_err();
        assert_eq!(err.error_code(), "CARRIER_NOT_IN_SERVICE");
        assert_eq!(state.knit_graph().loop_count(), 0);
    }

    #[test]
    fn test_unknown_operation_rejected() {
        let err = Program::from_json_str(r#"{"operations": [{"op": "purl"}]}"#).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }
}

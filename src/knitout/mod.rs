//! Knitout lines
//!
//! Textual form of the instructions produced by the simulator. One line per
//! instruction; comments start with `;` and every line ends with a newline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::carriers::CarrierSet;
use crate::machine::{Needle, PassDirection};

/// Knitout version written in the version line
pub const KNITOUT_VERSION: u32 = 2;

/// A single knitout operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    Knit {
        direction: PassDirection,
        needle: Needle,
        carriers: CarrierSet,
    },
    Tuck {
        direction: PassDirection,
        needle: Needle,
        carriers: CarrierSet,
    },
    Split {
        direction: PassDirection,
        start: Needle,
        target: Needle,
        carriers: CarrierSet,
    },
    Drop {
        needle: Needle,
    },
    Xfer {
        start: Needle,
        target: Needle,
    },
    Rack {
        racking: f64,
    },
    In {
        carriers: CarrierSet,
    },
    Inhook {
        carriers: CarrierSet,
    },
    Releasehook {
        carriers: CarrierSet,
    },
    Out {
        carriers: CarrierSet,
    },
    Outhook {
        carriers: CarrierSet,
    },
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Knit {
                direction,
                needle,
                carriers,
            } => write!(f, "knit {} {} {}", direction, needle, carriers),
            Instruction::Tuck {
                direction,
                needle,
                carriers,
            } => write!(f, "tuck {} {} {}", direction, needle, carriers),
            Instruction::Split {
                direction,
                start,
                target,
                carriers,
            } => write!(f, "split {} {} {} {}", direction, start, target, carriers),
            Instruction::Drop { needle } => write!(f, "drop {}", needle),
            Instruction::Xfer { start, target } => write!(f, "xfer {} {}", start, target),
            Instruction::Rack { racking } => write!(f, "rack {}", racking),
            Instruction::In { carriers } => write!(f, "in {}", carriers),
            Instruction::Inhook { carriers } => write!(f, "inhook {}", carriers),
            Instruction::Releasehook { carriers } => write!(f, "releasehook {}", carriers),
            Instruction::Out { carriers } => write!(f, "out {}", carriers),
            Instruction::Outhook { carriers } => write!(f, "outhook {}", carriers),
        }
    }
}

/// One line of knitout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KnitoutLine {
    /// `;!knitout-N`
    Version(u32),
    /// `;text`
    Comment(String),
    /// An instruction with an optional trailing comment
    Instruction {
        instruction: Instruction,
        comment: Option<String>,
    },
}

impl KnitoutLine {
    pub fn version() -> Self {
        KnitoutLine::Version(KNITOUT_VERSION)
    }

    pub fn comment(text: impl Into<String>) -> Self {
        KnitoutLine::Comment(text.into())
    }

    pub fn instruction(instruction: Instruction) -> Self {
        KnitoutLine::Instruction {
            instruction,
            comment: None,
        }
    }

    pub fn with_comment(instruction: Instruction, comment: impl Into<String>) -> Self {
        KnitoutLine::Instruction {
            instruction,
            comment: Some(comment.into()),
        }
    }

    pub fn xfer(start: Needle, target: Needle) -> Self {
        Self::instruction(Instruction::Xfer { start, target })
    }

    pub fn rack(racking: f64) -> Self {
        Self::instruction(Instruction::Rack { racking })
    }

    /// The instruction on this line, if any
    pub fn as_instruction(&self) -> Option<&Instruction> {
        match self {
            KnitoutLine::Instruction { instruction, .. } => Some(instruction),
            _ => None,
        }
    }

    pub fn has_comment(&self) -> bool {
        match self {
            KnitoutLine::Version(_) => false,
            KnitoutLine::Comment(_) => true,
            KnitoutLine::Instruction { comment, .. } => comment.is_some(),
        }
    }
}

fn comment_str(comment: Option<&str>) -> String {
    match comment {
        Some(comment) => format!(";{}\n", comment),
        None => "\n".to_string(),
    }
}

impl fmt::Display for KnitoutLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnitoutLine::Version(version) => write!(f, ";!knitout-{}\n", version),
            KnitoutLine::Comment(text) => write!(f, "{}", comment_str(Some(text))),
            KnitoutLine::Instruction {
                instruction,
                comment,
            } => write!(f, "{}{}", instruction, comment_str(comment.as_deref())),
        }
    }
}

/// Concatenate lines into knitout text
pub fn render(lines: &[KnitoutLine]) -> String {
    lines.iter().map(|line| line.to_string()).collect()
}

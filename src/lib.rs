//! Knit Machine - V-bed Knitting Machine State Simulator
//!
//! Tracks the full physical state of a V-bed knitting machine while a program
//! is compiled to knitout: the loops held on every needle and slider, the
//! stitch graph those loops form, the yarn carriers and the interleaved
//! sheets used for multi-layer fabric.
//!
//! # Architecture
//!
//! - [`machine::MachineState`] owns everything and validates each operation
//!   before it mutates anything
//! - [`knit_graph::KnitGraph`] is the arena of loops; needles hold loop ids
//! - [`carriers::CarrierSystem`] runs the carrier life-cycle and yarn cuts
//! - [`knitout`] renders the instruction lines produced along the way

pub mod carriers;
pub mod cli;
pub mod config;
pub mod error;
pub mod knit_graph;
pub mod knitout;
pub mod machine;
pub mod program;

pub use carriers::{CarrierId, CarrierSet};
pub use config::MachineSpec;
pub use error::{ErrorKind, MachineError, Result};
pub use knit_graph::{KnitGraph, LoopId};
pub use knitout::KnitoutLine;
pub use machine::{MachineState, Needle, NeedleSet, PassDirection, SheetScope, Side};
pub use program::{Operation, Program};

//! Error handling for the knitting machine simulator
//!
//! Every precondition the machine checks is reported as a typed variant so
//! callers (the knit script evaluator, the CLI) can branch on the kind of
//! violation. Internal-consistency faults are kept apart from user errors.

use thiserror::Error;

use crate::carriers::CarrierId;
use crate::knit_graph::LoopId;
use crate::machine::Needle;

/// Result type alias for machine operations
pub type Result<T> = std::result::Result<T, MachineError>;

/// Broad classification of a [`MachineError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Carrier used out of protocol order (in/out/hook)
    CarrierProtocol,
    /// Needle operation that the machine cannot physically perform
    NeedleLegality,
    /// Gauge, sheet or layer addressing violation
    GaugeSheet,
    /// The simulator reached a state that proper sequencing cannot produce
    InternalConsistency,
    /// Bad machine specification or unreadable input
    Configuration,
}

/// Main error type for machine operations
#[derive(Error, Debug)]
pub enum MachineError {
    // Carrier Protocol Errors
    #[error("Carrier {carrier} is already active")]
    CarrierAlreadyActive { carrier: CarrierId },

    #[error("Carrier {carrier} is not active")]
    CarrierNotActive { carrier: CarrierId },

    #[error("Carrier {carrier} is not on the yarn inserting hook")]
    CarrierNotHooked { carrier: CarrierId },

    #[error("Carrier {carrier} is not in service")]
    CarrierNotInService { carrier: CarrierId },

    #[error("Carrier {carrier} does not exist on a machine with {carrier_count} carriers")]
    UnknownCarrier {
        carrier: CarrierId,
        carrier_count: usize,
    },

    #[error("Cannot inhook carrier {carrier}: the yarn inserting hook holds carrier {hooked}")]
    HookInUse {
        carrier: CarrierId,
        hooked: CarrierId,
    },

    // Needle Legality Errors
    #[error("{needle} is not clear for transfer")]
    NeedleNotClear { needle: Needle },

    #[error("Racking {racking} does not match {front} to {back}")]
    RackingMismatch {
        racking: f64,
        front: Needle,
        back: Needle,
    },

    #[error("Cannot {operation} while sliders hold loops")]
    SlidersInUse { operation: &'static str },

    #[error("Cannot {operation} on slider {needle}")]
    SliderOperation {
        operation: &'static str,
        needle: Needle,
    },

    #[error("Cannot transfer from {start} to {target} on the same bed")]
    SameBedTransfer { start: Needle, target: Needle },

    #[error("Needle position {position} is outside a bed of {needle_count} needles")]
    NeedleOutOfRange { position: i64, needle_count: usize },

    #[error("Racking {racking} exceeds the maximum racking {max_rack}")]
    RackingOutOfRange { racking: f64, max_rack: f64 },

    // Gauge and Sheet Errors
    #[error("Gauge {gauge} must be between 1 and {max_gauge}")]
    GaugeOutOfRange { gauge: usize, max_gauge: usize },

    #[error("Gauge {gauge} does not evenly divide {needle_count} needles")]
    UnevenGauge { gauge: usize, needle_count: usize },

    #[error("Sheet {sheet} must be between 0 and the gauge {gauge}")]
    SheetOutOfRange { sheet: usize, gauge: usize },

    #[error("Layer {layer} must be between 0 and the gauge {gauge}")]
    LayerOutOfRange { layer: usize, gauge: usize },

    #[error("Cannot work sheets {sheets:?} with different layers at needle {position}")]
    InconsistentSheetLayering { sheets: Vec<usize>, position: usize },

    #[error("Cannot separate sheet {sheet} from sheets {sheets:?} sharing a layer at needle {position}")]
    UnseparableSheets {
        sheet: usize,
        sheets: Vec<usize>,
        position: usize,
    },

    #[error("No active sheets were given")]
    NoActiveSheets,

    // Internal Consistency Faults
    #[error("Loops recorded on {needle} have been lost")]
    LostLoops { needle: Needle },

    #[error("Loops recorded on {front} and {back} cannot be returned to a separated state")]
    UnseparatedLoops { front: Needle, back: Needle },

    #[error("Cannot return loops to {target} because loops remain on {blocking}")]
    BlockedReturn { target: Needle, blocking: Needle },

    #[error("Loop {loop_id} cannot be on {front} and {back}")]
    LoopOnBothBeds {
        loop_id: LoopId,
        front: Needle,
        back: Needle,
    },

    #[error("Loop {loop_id} is not in the knit graph")]
    UnknownLoop { loop_id: LoopId },

    #[error("Carrier {carrier} is still on the yarn inserting hook")]
    CarrierStillHooked { carrier: CarrierId },

    // Configuration Errors
    #[error("Invalid machine specification: {reason}")]
    InvalidMachineSpec { reason: String },

    #[error("Cannot parse needle '{text}'")]
    InvalidNeedle { text: String },

    #[error("Cannot parse sheet '{text}'")]
    InvalidSheet { text: String },

    #[error("Unknown needle set '{name}'")]
    UnknownNeedleSet { name: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MachineError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            MachineError::CarrierAlreadyActive { .. }
            | MachineError::CarrierNotActive { .. }
            | MachineError::CarrierNotHooked { .. }
            | MachineError::CarrierNotInService { .. }
            | MachineError::UnknownCarrier { .. }
            | MachineError::HookInUse { .. } => ErrorKind::CarrierProtocol,

            MachineError::NeedleNotClear { .. }
            | MachineError::RackingMismatch { .. }
            | MachineError::SlidersInUse { .. }
            | MachineError::SliderOperation { .. }
            | MachineError::SameBedTransfer { .. }
            | MachineError::NeedleOutOfRange { .. }
            | MachineError::RackingOutOfRange { .. } => ErrorKind::NeedleLegality,

            MachineError::GaugeOutOfRange { .. }
            | MachineError::UnevenGauge { .. }
            | MachineError::SheetOutOfRange { .. }
            | MachineError::LayerOutOfRange { .. }
            | MachineError::InconsistentSheetLayering { .. }
            | MachineError::UnseparableSheets { .. }
            | MachineError::NoActiveSheets => ErrorKind::GaugeSheet,

            MachineError::LostLoops { .. }
            | MachineError::UnseparatedLoops { .. }
            | MachineError::BlockedReturn { .. }
            | MachineError::LoopOnBothBeds { .. }
            | MachineError::UnknownLoop { .. }
            | MachineError::CarrierStillHooked { .. } => ErrorKind::InternalConsistency,

            MachineError::InvalidMachineSpec { .. }
            | MachineError::InvalidNeedle { .. }
            | MachineError::InvalidSheet { .. }
            | MachineError::UnknownNeedleSet { .. }
            | MachineError::Io(_)
            | MachineError::Serialization(_) => ErrorKind::Configuration,
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            MachineError::CarrierAlreadyActive { .. } => "CARRIER_ALREADY_ACTIVE",
            MachineError::CarrierNotActive { .. } => "CARRIER_NOT_ACTIVE",
            MachineError::CarrierNotHooked { .. } => "CARRIER_NOT_HOOKED",
            MachineError::CarrierNotInService { .. } => "CARRIER_NOT_IN_SERVICE",
            MachineError::UnknownCarrier { .. } => "UNKNOWN_CARRIER",
            MachineError::HookInUse { .. } => "HOOK_IN_USE",
            MachineError::NeedleNotClear { .. } => "NEEDLE_NOT_CLEAR",
            MachineError::RackingMismatch { .. } => "RACKING_MISMATCH",
            MachineError::SlidersInUse { .. } => "SLIDERS_IN_USE",
            MachineError::SliderOperation { .. } => "SLIDER_OPERATION",
            MachineError::SameBedTransfer { .. } => "SAME_BED_TRANSFER",
            MachineError::NeedleOutOfRange { .. } => "NEEDLE_OUT_OF_RANGE",
            MachineError::RackingOutOfRange { .. } => "RACKING_OUT_OF_RANGE",
            MachineError::GaugeOutOfRange { .. } => "GAUGE_OUT_OF_RANGE",
            MachineError::UnevenGauge { .. } => "UNEVEN_GAUGE",
            MachineError::SheetOutOfRange { .. } => "SHEET_OUT_OF_RANGE",
            MachineError::LayerOutOfRange { .. } => "LAYER_OUT_OF_RANGE",
            MachineError::InconsistentSheetLayering { .. } => "INCONSISTENT_SHEET_LAYERING",
            MachineError::UnseparableSheets { .. } => "UNSEPARABLE_SHEETS",
            MachineError::NoActiveSheets => "NO_ACTIVE_SHEETS",
            MachineError::LostLoops { .. } => "LOST_LOOPS",
            MachineError::UnseparatedLoops { .. } => "UNSEPARATED_LOOPS",
            MachineError::BlockedReturn { .. } => "BLOCKED_RETURN",
            MachineError::LoopOnBothBeds { .. } => "LOOP_ON_BOTH_BEDS",
            MachineError::UnknownLoop { .. } => "UNKNOWN_LOOP",
            MachineError::CarrierStillHooked { .. } => "CARRIER_STILL_HOOKED",
            MachineError::InvalidMachineSpec { .. } => "INVALID_MACHINE_SPEC",
            MachineError::InvalidNeedle { .. } => "INVALID_NEEDLE",
            MachineError::InvalidSheet { .. } => "INVALID_SHEET",
            MachineError::UnknownNeedleSet { .. } => "UNKNOWN_NEEDLE_SET",
            MachineError::Io(_) => "IO_ERROR",
            MachineError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// True for faults that indicate a sequencing bug rather than a user error
    pub fn is_internal(&self) -> bool {
        self.kind() == ErrorKind::InternalConsistency
    }

    /// Check if the caller can catch this error and keep using the machine
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::CarrierProtocol | ErrorKind::NeedleLegality | ErrorKind::GaugeSheet
        )
    }

    /// Get a short hint for fixing the offending program
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            MachineError::CarrierNotInService { .. } => {
                Some("Bring the carrier in with 'in' or 'inhook' before knitting with it.")
            }
            MachineError::CarrierStillHooked { .. } => {
                Some("Release the yarn inserting hook before taking the carrier out.")
            }
            MachineError::RackingMismatch { .. } => {
                Some("Rack the machine to align the transfer needles first.")
            }
            MachineError::SlidersInUse { .. } => {
                Some("Transfer loops off the sliders before knitting, tucking or dropping.")
            }
            MachineError::UnevenGauge { .. } => {
                Some("Choose a gauge that divides the machine's needle count.")
            }
            MachineError::UnseparableSheets { .. } => {
                Some("Move one of the sheets to a different layer before working them.")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = MachineError::CarrierNotInService {
            carrier: CarrierId::new(3),
        };
        assert_eq!(err.error_code(), "CARRIER_NOT_IN_SERVICE");
        assert_eq!(err.kind(), ErrorKind::CarrierProtocol);
        assert!(err.recovery_suggestion().is_some());
    }

    #[test]
    fn test_internal_faults_are_not_recoverable() {
        let err = MachineError::LostLoops {
            needle: Needle::front(4),
        };
        assert!(err.is_internal());
        assert!(!err.is_recoverable());
        assert_eq!(err.to_string(), "Loops recorded on f4 have been lost");
    }

    #[test]
    fn test_racking_mismatch_message() {
        let err = MachineError::RackingMismatch {
            racking: 1.0,
            front: Needle::front(2),
            back: Needle::back(2),
        };
        assert_eq!(err.kind(), ErrorKind::NeedleLegality);
        assert_eq!(err.to_string(), "Racking 1 does not match f2 to b2");
    }
}

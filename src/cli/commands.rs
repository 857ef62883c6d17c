//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;

use log::info;

use crate::config::MachineSpec;
use crate::error::Result;
use crate::knitout::{render, KnitoutLine};
use crate::machine::{MachineState, MAX_GAUGE};
use crate::program::Program;

/// Load a machine specification, or the defaults when no path is given.
pub fn load_spec(machine: Option<&Path>) -> Result<MachineSpec> {
    match machine {
        Some(path) => {
            info!("Loading machine specification: {}", path.display());
            MachineSpec::from_json_file(path)
        }
        None => Ok(MachineSpec::default()),
    }
}

/// Print the machine specification and the sheet sizes it supports.
pub fn info(machine: Option<&Path>) -> Result<()> {
    let spec = load_spec(machine)?;
    let state = MachineState::new(spec)?;

    println!("=== Machine ===");
    println!("Needles per bed: {}", state.needle_count());
    println!("Max racking: {}", state.max_rack());
    println!("Carriers: {}", state.carriers().carrier_count());
    println!("Hook size: {}", state.carriers().hook_size());
    println!();
    println!("Gauge | Sheet needles");
    println!("{:-<22}", "");
    for gauge in 1..=MAX_GAUGE {
        if let Ok(count) = state.sheet_needle_count(Some(gauge)) {
            println!("{:>5} | {}", gauge, count);
        }
    }

    Ok(())
}

/// Replay a program file and return its knitout text.
///
/// A machine file given here takes precedence over the program's own
/// specification.
pub fn run_program(program: &Path, machine: Option<&Path>) -> Result<String> {
    info!("Running program: {}", program.display());

    let program = Program::from_json_file(program)?;
    let mut state = match machine {
        Some(_) => MachineState::new(load_spec(machine)?)?,
        None => program.machine_state(&MachineSpec::default())?,
    };

    let mut lines = vec![KnitoutLine::version()];
    lines.extend(program.run(&mut state)?);

    info!(
        "Program complete: {} operations, {} loops made",
        program.operations.len(),
        state.knit_graph().loop_count()
    );
    Ok(render(&lines))
}

/// Replay a program file and print its knitout.
pub fn run(program: &Path, machine: Option<&Path>) -> Result<()> {
    let knitout = run_program(program, machine)?;
    print!("{}", knitout);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_json(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", json).unwrap();
        file
    }

    #[test]
    fn test_run_program() {
        let program = write_json(
            r#"{"operations": [
                {"op": "in", "carrier": 2},
                {"op": "tuck", "needle": "b3", "carriers": [2]},
                {"op": "drop", "needle": "b3"}
            ]}"#,
        );
        let knitout = run_program(program.path(), None).unwrap();
        assert_eq!(knitout, ";!knitout-2\nin 2\ntuck + b3 2\ndrop b3\n");
    }

    #[test]
    fn test_machine_file_overrides_program() {
        let program = write_json(
            r#"{"machine": {"needle_count": 100},
                "operations": [{"op": "in", "carrier": 1}, {"op": "knit", "needle": "f50", "carriers": [1]}]}"#,
        );
        let machine = write_json(r#"{"needle_count": 10}"#);
        let err = run_program(program.path(), Some(machine.path())).unwrap_err();
        assert_eq!(err.error_code(), "NEEDLE_OUT_OF_RANGE");
        assert!(run_program(program.path(), None).is_ok());
    }

    #[test]
    fn test_load_spec_defaults() {
        assert_eq!(load_spec(None).unwrap(), MachineSpec::default());
    }
}

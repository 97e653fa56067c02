//! MOVE Transpilation Demo
//!
//! Routes a circuit through the computational resonator of a star
//! architecture, validates the result and strips the MOVEs again.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use iqm_compile::{
    ExistingMoveHandling, MoveGateValidationMode, check_remove_moves_precondition,
    simplified_architecture, transpile_insert_moves, transpile_remove_moves,
    validate_circuit_moves,
};
use iqm_demos::samples::{ghz_circuit, star_architecture};
use iqm_demos::{init_logging, load_json, print_header, print_result, print_section, print_success};
use iqm_ir::{Circuit, DynamicQuantumArchitecture};

#[derive(Parser, Debug)]
#[command(name = "demo-move-transpile")]
#[command(about = "Insert and remove MOVE gates for a resonator architecture")]
struct Args {
    /// Circuit JSON file (default: GHZ circuit on the sample architecture)
    #[arg(short, long)]
    circuit: Option<PathBuf>,

    /// Dynamic quantum architecture JSON file (default: star architecture)
    #[arg(short, long)]
    architecture: Option<PathBuf>,

    /// Number of qubits of the built-in samples
    #[arg(short = 'n', long, default_value = "4", value_parser = clap::value_parser!(u16).range(1..))]
    qubits: u16,

    /// What to do with MOVEs already in the circuit: keep, trust or remove
    #[arg(long)]
    existing_moves: Option<ExistingMoveHandling>,

    /// Print the transpiled circuit as JSON
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    print_header("MOVE Transpilation Demo");

    let architecture: DynamicQuantumArchitecture = match &args.architecture {
        Some(path) => load_json(path)?,
        None => star_architecture(args.qubits.into()),
    };
    let circuit: Circuit = match &args.circuit {
        Some(path) => load_json(path)?,
        None => ghz_circuit(args.qubits.into())?,
    };

    print_section("Input");
    print_result("Circuit", circuit.name());
    print_result("Instructions", circuit.instructions().len());
    print_result("Qubits", architecture.qubits.len());
    print_result("Resonators", architecture.computational_resonators.join(", "));

    let simplified = simplified_architecture(&architecture);
    print_result("Gates without resonators", simplified.gates.len());

    print_section("Insert MOVEs");
    let routed = transpile_insert_moves(&circuit, &architecture, args.existing_moves, None)?;
    let moves = routed.instructions().iter().filter(|i| i.is_move()).count();
    print_result("Instructions", routed.instructions().len());
    print_result("MOVE gates", moves);
    validate_circuit_moves(&architecture, &routed, None, MoveGateValidationMode::Strict)?;
    print_success("Transpiled circuit passes strict MOVE validation");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&routed)?);
    }

    print_section("Remove MOVEs");
    check_remove_moves_precondition(&routed)?;
    let stripped = transpile_remove_moves(&routed)?;
    print_result("Instructions", stripped.instructions().len());
    info!("Removed {} MOVE gates from '{}'", moves, stripped.name());
    print_success("Done");
    Ok(())
}

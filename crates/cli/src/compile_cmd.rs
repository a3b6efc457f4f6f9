//! `svcmap-compile`: compile service maps into a generated lookup module.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use svcmap_compiler::codegen::{self, Provenance};
use svcmap_compiler::{CompileOptions, CompiledIndex, Compiler, Hierarchy};

use crate::load::{load_hierarchy, load_services};
use crate::{output, positive_step};

/// Compile command line arguments.
#[derive(Parser, Debug)]
#[command(name = "svcmap-compile")]
#[command(about = "Compile wildcard service maps into a self-contained Rust lookup module")]
#[command(version)]
pub struct CompileArgs {
	/// Service map files; later files override earlier ones
	#[arg(long, value_name = "PATH", num_args = 1.., required = true)]
	pub services: Vec<PathBuf>,

	/// Hierarchy file with regions, prefectures, dimensions and positions
	#[arg(long, value_name = "PATH")]
	pub hierarchy: Option<PathBuf>,

	/// Generated module path (stdout if omitted)
	#[arg(long, value_name = "PATH")]
	pub out: Option<PathBuf>,

	/// Round weights to multiples of STEP
	#[arg(long, value_name = "STEP", value_parser = positive_step)]
	pub qfloat: Option<f64>,

	/// Print compilation statistics as JSON to stderr
	#[arg(long)]
	pub stats: bool,

	/// Verbose logging
	#[arg(short, long)]
	pub verbose: bool,
}

/// Loads the inputs and compiles them. Returns the index and the merged pattern count.
pub fn compile(args: &CompileArgs) -> anyhow::Result<(CompiledIndex, usize)> {
	let hierarchy = match &args.hierarchy {
		Some(path) => load_hierarchy(path)?,
		None => Hierarchy::default(),
	};
	let (services, diagnostics) = load_services(&args.services)?;
	let compiler = Compiler::new().options(CompileOptions {
		qfloat: args.qfloat,
		input_files: args.services.clone(),
	});
	let index = compiler.compile_with_diagnostics(&services, &hierarchy, diagnostics);
	Ok((index, services.len()))
}

pub fn run(args: &CompileArgs) -> anyhow::Result<()> {
	let (index, pattern_count) = compile(args)?;
	let source = codegen::render(&index, &Provenance::now(pattern_count));
	output::emit(args.out.as_deref(), &source).context("failed to write generated module")?;

	let stats = index.get_compilation_stats();
	tracing::info!(
		services = stats.total_services,
		generic = stats.generic_patterns,
		skipped = stats.skipped_entries,
		fingerprint = %stats.fingerprint,
		"compiled"
	);
	if args.stats {
		eprintln!("{}", serde_json::to_string_pretty(stats).context("failed to render stats")?);
	}
	Ok(())
}

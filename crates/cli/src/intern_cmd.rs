//! `svcmap-intern`: canonicalize a document through the intern pool.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use svcmap_intern::{InternPool, InternStats};

use crate::load::load_value;
use crate::{output, positive_step};

/// Intern command line arguments.
#[derive(Parser, Debug)]
#[command(name = "svcmap-intern")]
#[command(about = "Canonicalize a JSON or YAML document: sorted keys, shared subtrees, quantized floats")]
#[command(version)]
pub struct InternArgs {
	/// Document to intern (.json, .yaml or .yml)
	#[arg(long, value_name = "PATH")]
	pub input: PathBuf,

	/// Output path (stdout if omitted)
	#[arg(long, value_name = "PATH")]
	pub out: Option<PathBuf>,

	/// Round floats to multiples of STEP
	#[arg(long, value_name = "STEP", value_parser = positive_step)]
	pub qfloat: Option<f64>,

	/// Print pool statistics to stderr
	#[arg(long)]
	pub stats: bool,

	/// Verbose logging
	#[arg(short, long)]
	pub verbose: bool,
}

/// Rendered output of one intern run.
#[derive(Debug)]
pub struct Interned {
	pub json: String,
	pub stats: Option<InternStats>,
}

/// Loads, interns, and renders `args.input` without writing anything.
pub fn intern(args: &InternArgs) -> anyhow::Result<Interned> {
	let document = load_value(&args.input)?;
	let pool = if args.stats {
		InternPool::with_stats()
	} else {
		InternPool::new()
	};
	let canonical = pool.intern(&document, args.qfloat);
	let thawed = serde_json::Value::from(canonical.thaw());
	let mut json = serde_json::to_string_pretty(&thawed).context("failed to render JSON")?;
	json.push('\n');
	Ok(Interned {
		json,
		stats: pool.stats(),
	})
}

pub fn run(args: &InternArgs) -> anyhow::Result<()> {
	let Interned { json, stats } = intern(args)?;
	output::emit(args.out.as_deref(), &json).context("failed to write output")?;
	if let Some(stats) = stats {
		eprintln!("{stats}");
	}
	Ok(())
}

//! Compiles service maps into a generated Rust lookup module.

use clap::Parser;
use svcmap_cli::compile_cmd::{self, CompileArgs};
use svcmap_cli::logging;

fn main() -> anyhow::Result<()> {
	let args = CompileArgs::parse();
	logging::init(args.verbose);
	compile_cmd::run(&args)
}

//! Canonicalizes a JSON or YAML document through the intern pool.

use clap::Parser;
use svcmap_cli::intern_cmd::{self, InternArgs};
use svcmap_cli::logging;

fn main() -> anyhow::Result<()> {
	let args = InternArgs::parse();
	logging::init(args.verbose);
	intern_cmd::run(&args)
}

//! Tracing setup for the binaries.

/// Installs a stderr `fmt` subscriber; `verbose` lowers the level from warnings to debug.
pub fn init(verbose: bool) {
	tracing_subscriber::fmt()
		.with_max_level(if verbose {
			tracing::Level::DEBUG
		} else {
			tracing::Level::WARN
		})
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();
}

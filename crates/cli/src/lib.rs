//! Shared plumbing for the `svcmap-intern` and `svcmap-compile` binaries.

pub mod compile_cmd;
pub mod intern_cmd;
pub mod load;
pub mod logging;
pub mod output;

pub use load::LoadError;

/// Parses a quantization step: a finite number greater than zero.
pub fn positive_step(s: &str) -> Result<f64, String> {
	let step: f64 = s.parse().map_err(|e| format!("{e}"))?;
	if step.is_finite() && step > 0.0 {
		Ok(step)
	} else {
		Err(format!("step must be a positive finite number, got {s}"))
	}
}

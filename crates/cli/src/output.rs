//! Output sinks.

use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Writes `contents` to `path` through a temp file in the same directory, then renames it into
/// place. Readers never observe a partial file.
pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
	let dir = match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	};
	let mut file = NamedTempFile::new_in(dir)?;
	file.write_all(contents.as_bytes())?;
	file.as_file().sync_all()?;
	file.persist(path).map_err(|e| e.error)?;
	tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote output");
	Ok(())
}

/// Writes to `path` if given, else to stdout.
pub fn emit(path: Option<&Path>, contents: &str) -> io::Result<()> {
	match path {
		Some(path) => write_atomic(path, contents),
		None => {
			let mut stdout = io::stdout().lock();
			stdout.write_all(contents.as_bytes())?;
			stdout.flush()
		}
	}
}

#[cfg(test)]
mod tests {
	use std::fs;

	use super::*;

	#[test]
	fn replaces_existing_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("out.json");
		fs::write(&path, "old").unwrap();

		write_atomic(&path, "new").unwrap();
		assert_eq!(fs::read_to_string(&path).unwrap(), "new");
		assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
	}

	#[test]
	fn missing_directory_is_an_error() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nope").join("out.json");
		assert!(write_atomic(&path, "x").is_err());
		assert!(!path.exists());
	}
}

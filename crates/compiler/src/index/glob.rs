//! Glob matching for listing queries.

use regex::Regex;

/// Anchored glob: `.` is literal, `*` matches any run of non-`.` characters.
#[derive(Debug, Clone)]
pub struct Glob {
	regex: Regex,
}

impl Glob {
	pub fn new(glob: &str) -> Result<Self, regex::Error> {
		let mut source = String::with_capacity(glob.len() + 8);
		source.push('^');
		for (i, literal) in glob.split('*').enumerate() {
			if i > 0 {
				source.push_str("[^.]*");
			}
			source.push_str(&regex::escape(literal));
		}
		source.push('$');
		Ok(Self {
			regex: Regex::new(&source)?,
		})
	}

	#[inline]
	pub fn is_match(&self, name: &str) -> bool {
		self.regex.is_match(name)
	}
}

#[cfg(test)]
mod tests {
	use super::Glob;

	#[test]
	fn star_stays_within_a_segment() {
		let g = Glob::new("edge.*.gateway").unwrap();
		assert!(g.is_match("edge.tokyo.gateway"));
		assert!(!g.is_match("edge.tokyo.west.gateway"));
		assert!(!g.is_match("xedge.tokyo.gateway"));
		assert!(!g.is_match("edge.tokyo.gateway2"));
	}

	#[test]
	fn star_matches_partial_segments() {
		let g = Glob::new("service-*.kan*").unwrap();
		assert!(g.is_match("service-hub.kanto"));
		assert!(g.is_match("service-.kan"));
		assert!(!g.is_match("service-hub.osaka"));
	}

	#[test]
	fn dot_is_literal() {
		let g = Glob::new("a.b").unwrap();
		assert!(g.is_match("a.b"));
		assert!(!g.is_match("axb"));
	}
}

use std::{fs, path::PathBuf};

use tracing::debug;

use crate::args::Domain;

/// Megabytes in the override file scale by this to become bytes.
const MEGABYTE: u64 = 1_000_000;

/// Per-domain quota overrides: one `domain:megabytes` per line, `#`
/// starts a comment, blank lines are fine.
///
/// The file is read fresh on every lookup, so edits take effect without
/// a restart. There is no failure mode: an unreadable file or a
/// malformed line only ever means the default applies.
#[derive(Clone, Debug)]
pub struct LimitTable {
	path: PathBuf,
	default: u64,
}

impl LimitTable {
	pub fn new<P: Into<PathBuf>>(path: P, default: u64) -> Self {
		Self {
			path: path.into(),
			default,
		}
	}

	pub fn default_limit(&self) -> u64 {
		self.default
	}

	/// The effective byte ceiling for one domain. The first matching
	/// line wins; the comparison ignores case.
	pub fn limit_for(&self, domain: &Domain) -> u64 {
		let contents = match fs::read_to_string(&self.path) {
			Ok(contents) => contents,
			Err(err) => {
				debug!(
					"quota override file {} unreadable ({}), using default",
					self.path.display(),
					err
				);
				return self.default;
			}
		};

		for line in contents.lines() {
			// everything after a # is commentary
			let line = match line.split_once('#') {
				Some((before, _)) => before,
				None => line,
			}
			.trim();

			if line.is_empty() {
				continue;
			}

			let (name, megabytes) = match line.rsplit_once(':') {
				Some(split) => split,
				None => continue,
			};

			let megabytes: u64 = match megabytes.trim().parse() {
				Ok(megabytes) => megabytes,
				Err(_) => continue,
			};

			if name.trim().eq_ignore_ascii_case(domain.as_str()) {
				return megabytes * MEGABYTE;
			}
		}

		self.default
	}
}

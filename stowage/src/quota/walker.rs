use std::{
	fs,
	path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::warn;

/// Outcome of a bounded size walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Walk {
	/// Every entry was visited; the total is exact.
	Complete(u64),
	/// The running total went strictly over the ceiling and the walk
	/// stopped without visiting the remaining entries. Carries the
	/// partial total at the point it stopped, ancestor frames included,
	/// which is therefore always greater than the ceiling.
	StoppedEarly(u64),
}

#[derive(Error, Debug)]
pub enum WalkError {
	#[error("cannot access mailbox directory {0}")]
	Missing(PathBuf),
	#[error("{0} is not a directory")]
	NotADirectory(PathBuf),
}

/// Sums file sizes under `root`, depth first, giving up the moment the
/// running total goes strictly over `ceiling`.
///
/// A missing or non-directory root is the only error; it means the
/// answer is unknown, not that the mailbox is over quota. Entries that
/// cannot be listed or stat'd are skipped, counted as zero and logged.
/// Symlinks are not followed; the link's own length is counted.
pub fn walk(root: &Path, ceiling: u64) -> Result<Walk, WalkError> {
	match fs::metadata(root) {
		Err(_) => Err(WalkError::Missing(root.to_owned())),
		Ok(meta) if !meta.is_dir() => Err(WalkError::NotADirectory(root.to_owned())),
		Ok(_) => Ok(walk_dir(root, ceiling, 0)),
	}
}

// `counted` carries everything already summed in ancestor frames, so the
// ceiling check always sees the whole running total.
fn walk_dir(dir: &Path, ceiling: u64, counted: u64) -> Walk {
	let entries = match fs::read_dir(dir) {
		Ok(entries) => entries,
		Err(err) => {
			warn!("skipping unreadable directory {}: {}", dir.display(), err);
			return Walk::Complete(0);
		}
	};

	let mut here: u64 = 0;
	for entry in entries {
		let entry = match entry {
			Ok(entry) => entry,
			Err(err) => {
				warn!("skipping unreadable entry in {}: {}", dir.display(), err);
				continue;
			}
		};

		// DirEntry::metadata does not traverse symlinks
		let meta = match entry.metadata() {
			Ok(meta) => meta,
			Err(err) => {
				warn!("skipping {}: {}", entry.path().display(), err);
				continue;
			}
		};

		if meta.is_dir() {
			match walk_dir(&entry.path(), ceiling, counted + here) {
				Walk::Complete(below) => here += below,
				stopped => return stopped,
			}
		} else {
			here += meta.len();
		}

		if counted + here > ceiling {
			return Walk::StoppedEarly(counted + here);
		}
	}

	Walk::Complete(here)
}

#[cfg(test)]
mod test {
	use std::fs::File;
	use std::io::Write;

	use super::*;

	fn file(dir: &Path, name: &str, len: usize) {
		let mut file = File::create(dir.join(name)).unwrap();
		file.write_all(&vec![0u8; len]).unwrap();
	}

	#[test]
	fn exact_total_under_ceiling() {
		let root = tempfile::tempdir().unwrap();
		file(root.path(), "a", 100);
		file(root.path(), "b", 250);

		let sub = root.path().join("cur");
		fs::create_dir(&sub).unwrap();
		file(&sub, "c", 400);

		assert_eq!(walk(root.path(), 1_000).unwrap(), Walk::Complete(750));
	}

	#[test]
	fn empty_directory_is_zero() {
		let root = tempfile::tempdir().unwrap();
		assert_eq!(walk(root.path(), 1_000).unwrap(), Walk::Complete(0));
	}

	#[test]
	fn total_equal_to_ceiling_completes() {
		// only *strictly* over stops the walk
		let root = tempfile::tempdir().unwrap();
		file(root.path(), "a", 500);
		file(root.path(), "b", 500);

		assert_eq!(walk(root.path(), 1_000).unwrap(), Walk::Complete(1_000));
	}

	#[test]
	fn over_ceiling_stops_with_partial_total() {
		let root = tempfile::tempdir().unwrap();
		for name in ["a", "b", "c"] {
			file(root.path(), name, 1_000);
		}

		match walk(root.path(), 2_500) {
			Ok(Walk::StoppedEarly(partial)) => assert!(partial > 2_500),
			other => panic!("expected an early stop, got {:?}", other),
		}
	}

	#[test]
	fn stops_after_the_first_oversized_entry() {
		// every file alone is over the ceiling, so whatever order the
		// directory lists in, the walk must stop after one entry
		let root = tempfile::tempdir().unwrap();
		for name in ["a", "b", "c", "d"] {
			file(root.path(), name, 1_000);
		}

		assert_eq!(walk(root.path(), 500).unwrap(), Walk::StoppedEarly(1_000));
	}

	#[test]
	fn ancestor_bytes_count_toward_the_ceiling() {
		// neither level is over the ceiling on its own
		let root = tempfile::tempdir().unwrap();
		file(root.path(), "a", 600);
		file(root.path(), "b", 600);

		let sub = root.path().join("new");
		fs::create_dir(&sub).unwrap();
		file(&sub, "c", 600);
		file(&sub, "d", 600);

		match walk(root.path(), 2_000) {
			Ok(Walk::StoppedEarly(partial)) => {
				assert!(partial > 2_000);
				assert!(partial <= 2_400);
			}
			other => panic!("expected an early stop, got {:?}", other),
		}
	}

	#[test]
	fn missing_root_errors() {
		let root = tempfile::tempdir().unwrap();
		let gone = root.path().join("nope");

		assert!(matches!(walk(&gone, 1_000), Err(WalkError::Missing(_))));
	}

	#[test]
	fn file_root_errors() {
		let root = tempfile::tempdir().unwrap();
		file(root.path(), "plain", 10);

		assert!(matches!(
			walk(&root.path().join("plain"), 1_000),
			Err(WalkError::NotADirectory(_))
		));
	}
}

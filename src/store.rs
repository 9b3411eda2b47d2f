//! Artifact naming contract and built-in artifact stores.
//!
//! Every artifact of a run is named `<yyyyMMddHHmm>-<prefix>[.<extension>]` from the run's
//! [`ReferenceInstant`], so names sort chronologically to the minute and runs in different
//! minutes never collide. A second write with the same prefix inside the same minute
//! replaces the first one.

pub mod file;
pub mod memory;

pub use file::FileArtifactStore;
pub use memory::MemoryArtifactStore;

// std
use std::borrow::Borrow;
// self
use crate::{_prelude::*, ticket::ReferenceInstant};

/// Extension appended when the prefix carries none.
pub const DEFAULT_EXTENSION: &str = "xml";

/// Boxed future returned by [`ArtifactStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for run artifacts.
pub trait ArtifactStore
where
	Self: Send + Sync,
{
	/// Writes `content` under the name derived from `prefix`, `instant`, and `extension`,
	/// replacing any artifact of the same name.
	fn persist<'a>(
		&'a self,
		content: &'a [u8],
		prefix: &'a str,
		instant: ReferenceInstant,
		extension: &'a str,
	) -> StoreFuture<'a, ArtifactName>;

	/// Reads back a previously persisted artifact.
	fn read<'a>(&'a self, name: &'a ArtifactName) -> StoreFuture<'a, Vec<u8>>;

	/// Persists `content` with the default `xml` extension.
	fn persist_xml<'a>(
		&'a self,
		content: &'a [u8],
		prefix: &'a str,
		instant: ReferenceInstant,
	) -> StoreFuture<'a, ArtifactName> {
		self.persist(content, prefix, instant, DEFAULT_EXTENSION)
	}
}

/// Error type produced by [`ArtifactStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum StoreError {
	/// The logical prefix cannot form a file name.
	#[error("Invalid artifact prefix `{prefix}`: {reason}.")]
	InvalidPrefix {
		/// Rejected prefix.
		prefix: String,
		/// Why it was rejected.
		reason: &'static str,
	},
	/// No artifact exists under the requested name.
	#[error("Artifact {name} does not exist.")]
	NotFound {
		/// Requested name.
		name: String,
	},
	/// Backend-level failure (permission denied, disk full).
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Deterministic file name of a persisted artifact.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArtifactName(String);
impl ArtifactName {
	/// Derives the name for `prefix` at `instant`.
	///
	/// The extension is appended only when the prefix does not already end in one, so
	/// `out.csv` stays `out.csv` while `report` becomes `report.xml`.
	pub fn new(
		prefix: &str,
		instant: ReferenceInstant,
		extension: &str,
	) -> Result<Self, StoreError> {
		validate_prefix(prefix)?;

		let stamp = instant.artifact_stamp();
		let name = if has_extension(prefix) || extension.is_empty() {
			format!("{stamp}-{prefix}")
		} else {
			format!("{stamp}-{prefix}.{extension}")
		};

		Ok(Self(name))
	}

	/// Returns the name as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for ArtifactName {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for ArtifactName {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl AsRef<Path> for ArtifactName {
	fn as_ref(&self) -> &Path {
		Path::new(&self.0)
	}
}
impl Display for ArtifactName {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// True when `prefix` ends in `.` followed by one or more ASCII alphanumerics.
fn has_extension(prefix: &str) -> bool {
	prefix
		.rsplit_once('.')
		.is_some_and(|(_, ext)| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
}

fn validate_prefix(prefix: &str) -> Result<(), StoreError> {
	let reject = |reason| Err(StoreError::InvalidPrefix { prefix: prefix.to_owned(), reason });

	if prefix.is_empty() {
		return reject("prefix is empty");
	}
	if prefix.contains(['/', '\\']) {
		return reject("prefix contains a path separator");
	}
	if prefix.contains('\0') {
		return reject("prefix contains a NUL byte");
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	fn instant() -> ReferenceInstant {
		ReferenceInstant::from(datetime!(2024-03-05 14:07:00 UTC))
	}

	#[test]
	fn names_are_stamped_to_the_minute() {
		let name = ArtifactName::new("report", instant(), DEFAULT_EXTENSION)
			.expect("Plain prefixes should be accepted.");

		assert_eq!(name.as_str(), "202403051407-report.xml");
	}

	#[test]
	fn existing_extensions_are_kept() {
		let csv = ArtifactName::new("out.csv", instant(), DEFAULT_EXTENSION)
			.expect("Prefixes with extensions should be accepted.");
		let cms = ArtifactName::new("loginTicketRequest", instant(), "cms")
			.expect("Custom extensions should be accepted.");
		let dotted = ArtifactName::new("v1.2-draft", instant(), DEFAULT_EXTENSION)
			.expect("Dots inside the prefix should be accepted.");
		let trailing = ArtifactName::new("notes.", instant(), DEFAULT_EXTENSION)
			.expect("Trailing dots should be accepted.");

		assert_eq!(csv.as_str(), "202403051407-out.csv");
		assert_eq!(cms.as_str(), "202403051407-loginTicketRequest.cms");
		assert_eq!(dotted.as_str(), "202403051407-v1.2-draft.xml");
		assert_eq!(trailing.as_str(), "202403051407-notes..xml");
	}

	#[test]
	fn names_are_stable_within_a_minute_and_distinct_across_minutes() {
		let early = ReferenceInstant::from(datetime!(2024-03-05 14:07:01 UTC));
		let late = ReferenceInstant::from(datetime!(2024-03-05 14:07:59 UTC));
		let next = ReferenceInstant::from(datetime!(2024-03-05 14:08:00 UTC));
		let name = |at| {
			ArtifactName::new("report", at, DEFAULT_EXTENSION).expect("Prefix should be valid.")
		};

		assert_eq!(name(early), name(late));
		assert_ne!(name(late), name(next));
		assert!(name(late) < name(next));
	}

	#[test]
	fn unsafe_prefixes_are_rejected() {
		for prefix in ["", "../escape", "dir\\file", "nul\0byte"] {
			assert!(
				matches!(
					ArtifactName::new(prefix, instant(), DEFAULT_EXTENSION),
					Err(StoreError::InvalidPrefix { .. })
				),
				"Prefix {prefix:?} should be rejected.",
			);
		}
	}
}

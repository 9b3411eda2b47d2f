//! Thread-safe in-memory [`ArtifactStore`] for tests and dry runs.

// self
use crate::{
	_prelude::*,
	store::{ArtifactName, ArtifactStore, StoreError, StoreFuture},
	ticket::ReferenceInstant,
};

type ArtifactMap = Arc<RwLock<HashMap<ArtifactName, Vec<u8>>>>;

/// Storage backend that keeps artifacts in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryArtifactStore(ArtifactMap);
impl MemoryArtifactStore {
	/// Names of every stored artifact, sorted (and therefore roughly chronological).
	pub fn names(&self) -> Vec<ArtifactName> {
		let mut names: Vec<_> = self.0.read().keys().cloned().collect();

		names.sort();

		names
	}

	/// Returns the stored bytes for `name`, if present.
	pub fn get(&self, name: &str) -> Option<Vec<u8>> {
		self.0.read().get(name).cloned()
	}

	/// Number of stored artifacts.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing has been persisted.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn persist_now(
		map: ArtifactMap,
		content: &[u8],
		prefix: &str,
		instant: ReferenceInstant,
		extension: &str,
	) -> Result<ArtifactName, StoreError> {
		let name = ArtifactName::new(prefix, instant, extension)?;

		map.write().insert(name.clone(), content.to_vec());

		Ok(name)
	}

	fn read_now(map: ArtifactMap, name: &ArtifactName) -> Result<Vec<u8>, StoreError> {
		map.read().get(name).cloned().ok_or_else(|| StoreError::NotFound { name: name.to_string() })
	}
}
impl ArtifactStore for MemoryArtifactStore {
	fn persist<'a>(
		&'a self,
		content: &'a [u8],
		prefix: &'a str,
		instant: ReferenceInstant,
		extension: &'a str,
	) -> StoreFuture<'a, ArtifactName> {
		let map = self.0.clone();

		Box::pin(async move { Self::persist_now(map, content, prefix, instant, extension) })
	}

	fn read<'a>(&'a self, name: &'a ArtifactName) -> StoreFuture<'a, Vec<u8>> {
		let map = self.0.clone();

		Box::pin(async move { Self::read_now(map, name) })
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	use tokio::runtime::Runtime;
	// self
	use super::*;

	#[test]
	fn persist_is_idempotent() {
		let store = MemoryArtifactStore::default();
		let rt = Runtime::new().expect("Failed to build Tokio runtime for memory store test.");
		let instant = ReferenceInstant::from(datetime!(2024-03-05 14:07:30 UTC));
		let first = rt
			.block_on(store.persist(b"<doc/>", "report", instant, "xml"))
			.expect("First write should succeed.");
		let second = rt
			.block_on(store.persist(b"<doc/>", "report", instant, "xml"))
			.expect("Second write should succeed.");

		assert_eq!(first, second);
		assert_eq!(store.len(), 1);
		assert_eq!(store.get("202403051407-report.xml"), Some(b"<doc/>".to_vec()));
	}

	#[test]
	fn invalid_prefixes_store_nothing() {
		let store = MemoryArtifactStore::default();
		let rt = Runtime::new().expect("Failed to build Tokio runtime for memory store test.");
		let instant = ReferenceInstant::from(datetime!(2024-03-05 14:07:30 UTC));

		assert!(rt.block_on(store.persist_xml(b"<doc/>", "a/b", instant)).is_err());
		assert!(store.is_empty());
	}
}

//! Directory-backed [`ArtifactStore`] that writes each artifact to its own file.

// std
use std::{
	fs::{self, File},
	io::{ErrorKind as IoErrorKind, Write},
};
// self
use crate::{
	_prelude::*,
	store::{ArtifactName, ArtifactStore, StoreError, StoreFuture},
	ticket::ReferenceInstant,
};

/// Persists artifacts as files inside a single directory.
///
/// Writes go through a sibling temporary file that is synced and renamed into place, so a
/// crash mid-write never leaves a truncated artifact under its final name.
#[derive(Clone, Debug)]
pub struct FileArtifactStore {
	dir: PathBuf,
}
impl FileArtifactStore {
	/// Opens (or creates) the artifact directory.
	pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let dir = dir.into();

		if !dir.as_os_str().is_empty() {
			fs::create_dir_all(&dir).map_err(|e| StoreError::Backend {
				message: format!("Failed to create artifact directory {}: {e}", dir.display()),
			})?;
		}

		Ok(Self { dir })
	}

	/// Directory artifacts are written to.
	pub fn dir(&self) -> &Path {
		&self.dir
	}

	/// Full path of the artifact called `name`.
	pub fn path_of(&self, name: &ArtifactName) -> PathBuf {
		self.dir.join(name.as_str())
	}

	fn write_now(&self, name: &ArtifactName, content: &[u8]) -> Result<(), StoreError> {
		let path = self.path_of(name);
		let tmp_path = self.dir.join(format!(".{name}.tmp"));

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(content).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", path.display()),
		})
	}

	fn read_now(&self, name: &ArtifactName) -> Result<Vec<u8>, StoreError> {
		let path = self.path_of(name);

		fs::read(&path).map_err(|e| match e.kind() {
			IoErrorKind::NotFound => StoreError::NotFound { name: name.to_string() },
			_ => StoreError::Backend { message: format!("Failed to read {}: {e}", path.display()) },
		})
	}
}
impl ArtifactStore for FileArtifactStore {
	fn persist<'a>(
		&'a self,
		content: &'a [u8],
		prefix: &'a str,
		instant: ReferenceInstant,
		extension: &'a str,
	) -> StoreFuture<'a, ArtifactName> {
		Box::pin(async move {
			let name = ArtifactName::new(prefix, instant, extension)?;

			self.write_now(&name, content)?;

			#[cfg(feature = "tracing")]
			tracing::info!(artifact = %name, bytes = content.len(), "artifact saved");

			Ok(name)
		})
	}

	fn read<'a>(&'a self, name: &'a ArtifactName) -> StoreFuture<'a, Vec<u8>> {
		Box::pin(async move { self.read_now(name) })
	}
}

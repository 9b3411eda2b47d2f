//! CMS signing through the `openssl` command-line tool.

// std
use std::{fs, process::Command};
// crates.io
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	error::SigningError,
	sign::{SignedPayload, Signer, SigningIdentity},
};

/// Signs documents by invoking `openssl cms -sign` followed by `openssl base64`.
///
/// Each run writes three files to the work directory, named after a digest of the
/// document: `<stem>.xml`, `<stem>.xml.cms.der`, and `<stem>.xml.cms`. They are left in
/// place for inspection. Arguments are passed to the program directly, never through a
/// shell.
#[derive(Clone, Debug)]
pub struct ProcessSigner {
	program: PathBuf,
	work_dir: PathBuf,
}
impl ProcessSigner {
	const DEFAULT_PROGRAM: &'static str = "openssl";

	/// Creates a signer that keeps its scratch files under `work_dir`.
	pub fn new(work_dir: impl Into<PathBuf>) -> Self {
		Self { program: PathBuf::from(Self::DEFAULT_PROGRAM), work_dir: work_dir.into() }
	}

	/// Overrides the `openssl` executable.
	pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
		self.program = program.into();

		self
	}

	/// Executable invoked for both steps.
	pub fn program(&self) -> &Path {
		&self.program
	}

	fn input_path(&self, document: &[u8]) -> PathBuf {
		let digest = Sha256::digest(document);
		let stem: String = digest.iter().take(8).map(|byte| format!("{byte:02x}")).collect();

		self.work_dir.join(format!("loginTicketRequest-{stem}.xml"))
	}

	fn run(
		&self,
		command: &mut Command,
		stage: fn(String) -> SigningError,
	) -> Result<(), SigningError> {
		let output = command.output().map_err(|e| {
			stage(format!("cannot launch {}: {e}", self.program.display()))
		})?;

		if output.status.success() {
			return Ok(());
		}

		Err(stage(format!(
			"{} exited with {}: {}",
			self.program.display(),
			output.status,
			String::from_utf8_lossy(&output.stderr).trim(),
		)))
	}
}
impl Signer for ProcessSigner {
	fn sign(
		&self,
		document: &[u8],
		identity: &SigningIdentity,
	) -> Result<SignedPayload, SigningError> {
		fs::create_dir_all(&self.work_dir)?;

		let input = self.input_path(document);
		let der = input.with_extension("xml.cms.der");
		let encoded = input.with_extension("xml.cms");

		fs::write(&input, document)?;

		self.run(
			Command::new(&self.program)
				.args(["cms", "-sign", "-binary", "-nodetach", "-outform", "der", "-in"])
				.arg(&input)
				.arg("-signer")
				.arg(&identity.certificate_path)
				.arg("-inkey")
				.arg(&identity.private_key_path)
				.arg("-out")
				.arg(&der),
			|message| SigningError::Sign { message },
		)?;
		self.run(
			Command::new(&self.program).arg("base64").arg("-in").arg(&der).arg("-out").arg(&encoded),
			|message| SigningError::Encode { message },
		)?;

		let text = fs::read_to_string(&encoded)?;

		Ok(SignedPayload::from_encoded(text.trim()))
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// self
	use super::*;

	fn temp_dir() -> PathBuf {
		env::temp_dir().join(format!(
			"wsaa_client_process_signer_{}_{}",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		))
	}

	#[test]
	fn scratch_names_follow_the_document_digest() {
		let signer = ProcessSigner::new("/work");
		let first = signer.input_path(b"<loginTicketRequest/>");
		let second = signer.input_path(b"<loginTicketRequest/>");
		let other = signer.input_path(b"<loginTicketRequest></loginTicketRequest>");

		assert_eq!(first, second);
		assert_ne!(first, other);
		assert!(first.starts_with("/work"));
		assert_eq!(first.with_extension("xml.cms").extension().and_then(|e| e.to_str()), Some("cms"));
	}

	#[test]
	fn missing_program_is_a_signing_failure() {
		let dir = temp_dir();
		let signer = ProcessSigner::new(&dir).with_program("wsaa-client-no-such-openssl");
		let identity = SigningIdentity::new(dir.join("cert.pem"), dir.join("key.pem"));
		let err = signer
			.sign(b"<loginTicketRequest/>", &identity)
			.expect_err("Signing must fail when the program cannot be launched.");

		assert!(matches!(err, SigningError::Sign { ref message } if message.contains("cannot launch")));

		fs::remove_dir_all(&dir).unwrap_or_else(|e| {
			panic!("Failed to remove temporary signer directory {}: {e}", dir.display())
		});
	}
}

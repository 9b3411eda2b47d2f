//! CMS signing capability and the transport-ready payload it produces.
//!
//! [`Signer`] is the crate's only dependency on a cryptographic stack. Two implementations
//! ship with the crate: [`NativeSigner`] (feature `openssl`) signs in-process, while
//! [`ProcessSigner`] drives the `openssl` command-line tool for hosts where linking the
//! library is not an option. Both embed the signed document in the CMS structure so the
//! gateway can recover it from the payload alone.

#[cfg(feature = "openssl")] pub mod native;
pub mod process;

#[cfg(feature = "openssl")] pub use native::NativeSigner;
pub use process::ProcessSigner;

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
// self
use crate::{
	_prelude::*,
	error::{ConfigError, SigningError},
};

/// Certificate and private key used to sign login-ticket requests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningIdentity {
	/// PEM certificate registered with the gateway.
	pub certificate_path: PathBuf,
	/// PEM private key matching the certificate.
	pub private_key_path: PathBuf,
}
impl SigningIdentity {
	/// Pairs a certificate with its private key.
	pub fn new(certificate_path: impl Into<PathBuf>, private_key_path: impl Into<PathBuf>) -> Self {
		Self { certificate_path: certificate_path.into(), private_key_path: private_key_path.into() }
	}
}

/// Base64 text of a DER-encoded CMS `SignedData` structure.
///
/// The payload is bound to the validity window of the request it was produced from and
/// must not be reused across runs.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedPayload(String);
impl SignedPayload {
	/// Encodes raw DER bytes with the standard base64 alphabet.
	pub fn from_der(der: &[u8]) -> Self {
		Self(STANDARD.encode(der))
	}

	/// Wraps text that is already base64 encoded (line wrapping is tolerated).
	pub fn from_encoded(text: impl Into<String>) -> Self {
		Self(text.into())
	}

	/// Returns the encoded text sent to the gateway.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Decodes the payload back into DER bytes.
	pub fn decode(&self) -> Result<Vec<u8>, SigningError> {
		let compact: String = self.0.chars().filter(|c| !c.is_ascii_whitespace()).collect();

		STANDARD.decode(compact).map_err(|e| SigningError::Encode { message: e.to_string() })
	}
}
impl AsRef<str> for SignedPayload {
	fn as_ref(&self) -> &str {
		self.as_str()
	}
}
impl Debug for SignedPayload {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SignedPayload").field("encoded_len", &self.0.len()).finish()
	}
}

/// Produces a [`SignedPayload`] from a request document and a signing identity.
///
/// Implementations must be `Send + Sync` so a single signer can be shared behind `Arc`.
/// Failures are never transient; callers surface them without retrying.
pub trait Signer
where
	Self: Send + Sync,
{
	/// Signs `document` with `identity`, embedding the document in the CMS structure.
	fn sign(
		&self,
		document: &[u8],
		identity: &SigningIdentity,
	) -> Result<SignedPayload, SigningError>;
}

/// Signing implementation selected through configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignerBackend {
	/// In-process signing through the `openssl` crate.
	Native,
	/// Signing through the `openssl` command-line tool.
	Process,
}
impl SignerBackend {
	/// Returns a stable label suitable for configuration values.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Native => "native",
			Self::Process => "process",
		}
	}

	/// Instantiates the backend; `work_dir` receives the process backend's scratch files.
	pub fn build(
		self,
		program: impl Into<PathBuf>,
		work_dir: impl Into<PathBuf>,
	) -> Result<Arc<dyn Signer>, ConfigError> {
		match self {
			#[cfg(feature = "openssl")]
			Self::Native => Ok(Arc::new(NativeSigner)),
			#[cfg(not(feature = "openssl"))]
			Self::Native => {
				let _ = (program, work_dir);

				Err(ConfigError::UnavailableSigner { backend: Self::Native.as_str() })
			},
			Self::Process => Ok(Arc::new(ProcessSigner::new(work_dir).with_program(program))),
		}
	}
}
impl Default for SignerBackend {
	fn default() -> Self {
		if cfg!(feature = "openssl") { Self::Native } else { Self::Process }
	}
}
impl Display for SignerBackend {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for SignerBackend {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"native" => Ok(Self::Native),
			"process" => Ok(Self::Process),
			other => Err(ConfigError::Invalid {
				setting: "WSAA_SIGNER",
				reason: format!("expected `native` or `process`, got `{other}`"),
			}),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn payload_decoding_tolerates_line_wrapping() {
		let payload = SignedPayload::from_der(b"0\x82\x01\x00der-bytes");
		let wrapped = SignedPayload::from_encoded(format!(
			"{}\n{}\n",
			&payload.as_str()[..8],
			&payload.as_str()[8..]
		));

		assert_eq!(
			wrapped.decode().expect("Wrapped payload should decode."),
			b"0\x82\x01\x00der-bytes"
		);
		assert!(SignedPayload::from_encoded("not base64!").decode().is_err());
	}

	#[test]
	fn payload_debug_hides_content() {
		let payload = SignedPayload::from_encoded("TUlJ");

		assert_eq!(format!("{payload:?}"), "SignedPayload { encoded_len: 4 }");
	}

	#[test]
	fn backends_parse_case_insensitively() {
		assert_eq!("Native".parse::<SignerBackend>().ok(), Some(SignerBackend::Native));
		assert_eq!(" process ".parse::<SignerBackend>().ok(), Some(SignerBackend::Process));
		assert!(matches!(
			"hsm".parse::<SignerBackend>(),
			Err(ConfigError::Invalid { setting: "WSAA_SIGNER", .. })
		));
	}
}

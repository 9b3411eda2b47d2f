//! Error taxonomy shared by every pipeline stage.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by the issuance pipeline.
///
/// Each variant maps to exactly one pipeline concern so callers can branch on
/// [`Error::kind`] without inspecting messages.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Required settings are missing or malformed; the pipeline never started.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The request document could not be signed or encoded.
	#[error(transparent)]
	Signing(#[from] SigningError),
	/// The remote `loginCms` exchange failed.
	#[error(transparent)]
	Exchange(#[from] ExchangeError),
	/// An artifact could not be written or read back.
	#[error("{0}")]
	Persistence(
		#[from]
		#[source]
		crate::store::StoreError,
	),
}
impl Error {
	/// Returns the coarse failure category.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Config(_) => ErrorKind::Configuration,
			Self::Signing(_) => ErrorKind::Signing,
			Self::Exchange(_) => ErrorKind::Exchange,
			Self::Persistence(_) => ErrorKind::Persistence,
		}
	}
}

/// Failure category attached to every [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
	/// Missing or invalid configuration.
	Configuration,
	/// Signing capability failure.
	Signing,
	/// Transport or remote application failure.
	Exchange,
	/// Storage-layer failure.
	Persistence,
}
impl ErrorKind {
	/// Returns a stable label suitable for log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Configuration => "configuration",
			Self::Signing => "signing",
			Self::Exchange => "exchange",
			Self::Persistence => "persistence",
		}
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Configuration failures raised before any component is constructed.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// One or more required settings were absent or blank.
	#[error("Missing required settings: {}.", .settings.join(", "))]
	Missing {
		/// Names of every missing setting, in declaration order.
		settings: Vec<&'static str>,
	},
	/// A setting was present but could not be parsed.
	#[error("Setting {setting} is invalid: {reason}.")]
	Invalid {
		/// Setting name.
		setting: &'static str,
		/// Human-readable parsing failure.
		reason: String,
	},
	/// The WSDL URL cannot be parsed.
	#[error("Setting WSDL_URL is not a valid URL.")]
	InvalidUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The service identifier failed validation.
	#[error("Setting SERVICE_ID is invalid.")]
	InvalidServiceId(#[from] crate::ticket::IdentifierError),
	/// The requested signer backend is not compiled into this build.
	#[error("Signer backend `{backend}` is not available in this build.")]
	UnavailableSigner {
		/// Backend label.
		backend: &'static str,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Signing failures; never transient, so they are surfaced without retry.
#[derive(Debug, ThisError)]
pub enum SigningError {
	/// A certificate or key file could not be read.
	#[error("Failed to read {}: {source}.", .path.display())]
	Read {
		/// Offending path.
		path: PathBuf,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// The signing identity could not be loaded (malformed PEM, wrong key type).
	#[error("Signing identity is unusable: {message}.")]
	Identity {
		/// Capability diagnostic.
		message: String,
	},
	/// The CMS signing step did not complete.
	#[error("CMS signing failed: {message}.")]
	Sign {
		/// Capability diagnostic.
		message: String,
	},
	/// The base64 encoding step did not complete.
	#[error("CMS encoding failed: {message}.")]
	Encode {
		/// Capability diagnostic.
		message: String,
	},
	/// A signature did not verify against the supplied certificate.
	#[error("CMS verification failed: {message}.")]
	Verify {
		/// Capability diagnostic.
		message: String,
	},
	/// The external signing process could not be launched or written to.
	#[error("Signing process I/O failed.")]
	Io(#[from] std::io::Error),
}

/// Exchange failures; the raw transport diagnostic is carried without interpretation.
#[derive(Debug, ThisError)]
pub enum ExchangeError {
	/// Network failure (DNS, TCP, TLS) while reaching the WSDL or the endpoint.
	#[error("Network error occurred while calling {url}.")]
	Transport {
		/// URL being requested.
		url: String,
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// The endpoint answered with a non-success status and no SOAP fault.
	#[error("{url} answered with HTTP status {status}.")]
	Status {
		/// URL being requested.
		url: String,
		/// HTTP status code.
		status: u16,
	},
	/// The interface description does not describe a usable endpoint.
	#[error("Service description is unusable: {message}.")]
	InvalidDescription {
		/// Parser diagnostic.
		message: String,
	},
	/// The remote operation reported an application-level fault.
	#[error("Remote fault {code}: {message}.")]
	Fault {
		/// Raw `faultcode` value.
		code: String,
		/// Raw `faultstring` value.
		message: String,
	},
	/// The response could not be parsed as a SOAP envelope.
	#[error("Response is malformed: {message}.")]
	Malformed {
		/// Parser diagnostic.
		message: String,
	},
	/// The response carried no `loginCmsReturn` credential.
	#[error("Response lacks the loginCmsReturn credential.")]
	MissingCredential,
}
impl ExchangeError {
	/// Wraps a transport-specific network error.
	pub fn transport(url: &Url, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport { url: url.to_string(), source: Box::new(src) }
	}
}

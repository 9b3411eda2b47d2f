//! Process configuration, validated once before any pipeline component is built.
//!
//! Five settings are required: [`CERT_PATH`], [`PRIVATE_KEY_PATH`], [`SERVICE_ID`],
//! [`WSDL_URL`], and [`XML_FILE`]. Blank values count as missing, and every missing setting
//! is reported at once. The remaining settings are optional and fall back to defaults.

// crates.io
use time::macros::format_description;
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	issuer::RESPONSE_PREFIX,
	sign::{SignerBackend, SigningIdentity},
	store::{ArtifactName, DEFAULT_EXTENSION},
	ticket::{ReferenceInstant, ServiceId},
};

/// PEM certificate registered with the gateway.
pub const CERT_PATH: &str = "CERT_PATH";
/// PEM private key matching the certificate.
pub const PRIVATE_KEY_PATH: &str = "PRIVATE_KEY_PATH";
/// Business service the ticket is requested for.
pub const SERVICE_ID: &str = "SERVICE_ID";
/// Service description of the authentication endpoint.
pub const WSDL_URL: &str = "WSDL_URL";
/// Logical prefix of the request artifact.
pub const XML_FILE: &str = "XML_FILE";
/// Directory receiving artifacts (optional, defaults to the working directory).
pub const ARTIFACT_DIR: &str = "ARTIFACT_DIR";
/// Signer backend, `native` or `process` (optional).
pub const WSAA_SIGNER: &str = "WSAA_SIGNER";
/// `openssl` executable used by the process signer (optional).
pub const OPENSSL_BIN: &str = "OPENSSL_BIN";
/// Offset used to render request timestamps, `±HH:MM` (optional, defaults to UTC).
pub const WSAA_UTC_OFFSET: &str = "WSAA_UTC_OFFSET";

/// Every setting name, required ones first.
pub const SETTINGS: [&str; 9] = [
	CERT_PATH,
	PRIVATE_KEY_PATH,
	SERVICE_ID,
	WSDL_URL,
	XML_FILE,
	ARTIFACT_DIR,
	WSAA_SIGNER,
	OPENSSL_BIN,
	WSAA_UTC_OFFSET,
];

const REQUIRED: usize = 5;
const WORK_DIR: &str = ".work";

/// Validated configuration for one issuance run.
#[derive(Clone, Debug)]
pub struct Config {
	/// Certificate and key used for signing.
	pub identity: SigningIdentity,
	/// Target business service.
	pub service_id: ServiceId,
	/// WSDL of the authentication endpoint.
	pub wsdl_url: Url,
	/// Logical prefix of the request artifact.
	pub artifact_prefix: String,
	/// Directory receiving artifacts.
	pub artifact_dir: PathBuf,
	/// Signing implementation.
	pub signer: SignerBackend,
	/// `openssl` executable for the process signer.
	pub openssl_program: PathBuf,
	/// Offset used to render request timestamps and artifact names.
	pub utc_offset: UtcOffset,
}
impl Config {
	/// Returns an empty builder.
	pub fn builder() -> ConfigBuilder {
		ConfigBuilder::default()
	}

	/// Reads every setting from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		ConfigBuilder::from_env().build()
	}

	/// Scratch directory for signer intermediates, kept out of the artifact listing.
	pub fn work_dir(&self) -> PathBuf {
		self.artifact_dir.join(WORK_DIR)
	}

	/// Captures the current instant at the configured offset.
	pub fn now(&self) -> ReferenceInstant {
		ReferenceInstant::now_at(self.utc_offset)
	}
}

/// Collects raw setting values; [`build`](ConfigBuilder::build) validates them.
#[derive(Clone, Debug, Default)]
pub struct ConfigBuilder {
	values: HashMap<&'static str, String>,
}
impl ConfigBuilder {
	/// Starts from the process environment.
	pub fn from_env() -> Self {
		Self::default().overlay(|name| std::env::var(name).ok())
	}

	/// Sets every setting for which `lookup` returns a non-blank value, keeping the current
	/// value otherwise.
	pub fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
		for name in SETTINGS {
			if let Some(value) = lookup(name).filter(|value| !value.trim().is_empty()) {
				self.values.insert(name, value);
			}
		}

		self
	}

	/// Sets the certificate path.
	pub fn certificate_path(self, value: impl Into<String>) -> Self {
		self.set(CERT_PATH, value)
	}

	/// Sets the private key path.
	pub fn private_key_path(self, value: impl Into<String>) -> Self {
		self.set(PRIVATE_KEY_PATH, value)
	}

	/// Sets the service identifier.
	pub fn service_id(self, value: impl Into<String>) -> Self {
		self.set(SERVICE_ID, value)
	}

	/// Sets the WSDL URL.
	pub fn wsdl_url(self, value: impl Into<String>) -> Self {
		self.set(WSDL_URL, value)
	}

	/// Sets the request artifact prefix.
	pub fn artifact_prefix(self, value: impl Into<String>) -> Self {
		self.set(XML_FILE, value)
	}

	/// Sets the artifact directory.
	pub fn artifact_dir(self, value: impl Into<String>) -> Self {
		self.set(ARTIFACT_DIR, value)
	}

	/// Selects the signer backend (`native` or `process`).
	pub fn signer(self, value: impl Into<String>) -> Self {
		self.set(WSAA_SIGNER, value)
	}

	/// Sets the `openssl` executable.
	pub fn openssl_program(self, value: impl Into<String>) -> Self {
		self.set(OPENSSL_BIN, value)
	}

	/// Sets the rendering offset (`±HH:MM`).
	pub fn utc_offset(self, value: impl Into<String>) -> Self {
		self.set(WSAA_UTC_OFFSET, value)
	}

	/// Validates the collected values.
	pub fn build(mut self) -> Result<Config, ConfigError> {
		self.values.retain(|_, value| !value.trim().is_empty());

		let missing: Vec<&'static str> = SETTINGS[..REQUIRED]
			.iter()
			.copied()
			.filter(|name| !self.values.contains_key(name))
			.collect();

		if !missing.is_empty() {
			return Err(ConfigError::Missing { settings: missing });
		}

		let mut take = |name: &'static str| self.values.remove(name);
		let certificate_path = take(CERT_PATH).unwrap_or_default();
		let private_key_path = take(PRIVATE_KEY_PATH).unwrap_or_default();
		let service_id = ServiceId::new(take(SERVICE_ID).unwrap_or_default())?;
		let wsdl_url = Url::parse(take(WSDL_URL).unwrap_or_default().trim())
			.map_err(|source| ConfigError::InvalidUrl { source })?;
		let artifact_prefix = take(XML_FILE).unwrap_or_default();
		let artifact_dir = take(ARTIFACT_DIR).unwrap_or_else(|| ".".into());
		let signer = take(WSAA_SIGNER)
			.map(|raw| raw.parse::<SignerBackend>())
			.transpose()?
			.unwrap_or_default();
		let openssl_program = take(OPENSSL_BIN).unwrap_or_else(|| "openssl".into());
		let utc_offset = take(WSAA_UTC_OFFSET)
			.map(|raw| parse_offset(&raw))
			.transpose()?
			.unwrap_or(UtcOffset::UTC);

		validate_prefix(&artifact_prefix)?;

		Ok(Config {
			identity: SigningIdentity::new(certificate_path, private_key_path),
			service_id,
			wsdl_url,
			artifact_prefix,
			artifact_dir: PathBuf::from(artifact_dir),
			signer,
			openssl_program: PathBuf::from(openssl_program),
			utc_offset,
		})
	}

	fn set(mut self, name: &'static str, value: impl Into<String>) -> Self {
		self.values.insert(name, value.into());

		self
	}
}

fn validate_prefix(prefix: &str) -> Result<(), ConfigError> {
	let invalid = |reason: String| ConfigError::Invalid { setting: XML_FILE, reason };
	let at = ReferenceInstant::now();
	let request = ArtifactName::new(prefix, at, DEFAULT_EXTENSION)
		.map_err(|e| invalid(e.to_string()))?;
	let response = ArtifactName::new(RESPONSE_PREFIX, at, DEFAULT_EXTENSION)
		.map_err(|e| invalid(e.to_string()))?;

	if request == response {
		return Err(invalid(format!("`{prefix}` would overwrite the response artifact")));
	}

	Ok(())
}

fn parse_offset(raw: &str) -> Result<UtcOffset, ConfigError> {
	UtcOffset::parse(raw.trim(), format_description!("[offset_hour sign:mandatory]:[offset_minute]"))
		.map_err(|e| ConfigError::Invalid { setting: WSAA_UTC_OFFSET, reason: e.to_string() })
}

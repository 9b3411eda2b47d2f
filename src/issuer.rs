//! Issuance pipeline: build, sign, exchange, persist.
//!
//! [`TicketIssuer::issue`] runs the four stages strictly in order against a single
//! [`ReferenceInstant`]. Every artifact written before a failure stays on disk; nothing is
//! rolled back and nothing is retried.

// self
use crate::{
	_prelude::*,
	config::Config,
	exchange::{TicketExchangeClient, TicketResponse},
	http::RpcTransport,
	obs::{RunObserver, Stage},
	request::TicketRequest,
	sign::{Signer, SigningIdentity},
	store::{ArtifactName, ArtifactStore},
	ticket::{ReferenceInstant, ServiceId},
};
#[cfg(feature = "reqwest")]
use crate::{exchange::ReqwestExchangeClient, http::ReqwestHttpClient, store::FileArtifactStore};

/// Issuer specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestTicketIssuer = TicketIssuer<ReqwestHttpClient>;

/// Logical prefix of the persisted response artifact.
pub const RESPONSE_PREFIX: &str = "loginTicketResponse";
/// Extension appended to the request prefix to name the signed payload.
pub const PAYLOAD_EXTENSION: &str = "cms";

/// Names of the artifacts written by one successful run, plus the response itself.
#[derive(Clone, Debug)]
pub struct IssuedTicket {
	/// Instant the run was stamped with.
	pub instant: ReferenceInstant,
	/// Unsigned request document.
	pub request_artifact: ArtifactName,
	/// Base64 CMS payload sent to the gateway.
	pub payload_artifact: ArtifactName,
	/// `loginCmsReturn` document received from the gateway.
	pub response_artifact: ArtifactName,
	/// Response as received.
	pub response: TicketResponse,
}

/// Runs the issuance pipeline with injected signing, transport, and storage capabilities.
pub struct TicketIssuer<T>
where
	T: ?Sized + RpcTransport,
{
	/// Signing capability.
	pub signer: Arc<dyn Signer>,
	/// Artifact sink.
	pub store: Arc<dyn ArtifactStore>,
	/// Remote `loginCms` client.
	pub exchange: TicketExchangeClient<T>,
	/// Certificate and key handed to the signer.
	pub identity: SigningIdentity,
	/// Service the ticket is requested for.
	pub service: ServiceId,
	/// WSDL of the authentication endpoint.
	pub wsdl_url: Url,
	/// Logical prefix of the request artifact.
	pub request_prefix: String,
	/// Offset used by [`issue_now`](Self::issue_now).
	pub utc_offset: UtcOffset,
}
impl<T> TicketIssuer<T>
where
	T: ?Sized + RpcTransport,
{
	/// Wires an issuer from its collaborators.
	pub fn new(
		signer: Arc<dyn Signer>,
		store: Arc<dyn ArtifactStore>,
		exchange: TicketExchangeClient<T>,
		identity: SigningIdentity,
		service: ServiceId,
		wsdl_url: Url,
		request_prefix: impl Into<String>,
	) -> Self {
		Self {
			signer,
			store,
			exchange,
			identity,
			service,
			wsdl_url,
			request_prefix: request_prefix.into(),
			utc_offset: UtcOffset::UTC,
		}
	}

	/// Wires an issuer from a validated [`Config`] and caller-provided collaborators.
	pub fn with_config(
		config: &Config,
		signer: Arc<dyn Signer>,
		store: Arc<dyn ArtifactStore>,
		exchange: TicketExchangeClient<T>,
	) -> Self {
		Self::new(
			signer,
			store,
			exchange,
			config.identity.clone(),
			config.service_id.clone(),
			config.wsdl_url.clone(),
			config.artifact_prefix.clone(),
		)
		.with_utc_offset(config.utc_offset)
	}

	/// Sets the offset used to stamp runs started through [`issue_now`](Self::issue_now).
	pub fn with_utc_offset(mut self, offset: UtcOffset) -> Self {
		self.utc_offset = offset;

		self
	}

	/// Runs the pipeline stamped with the current instant.
	pub async fn issue_now(&self) -> Result<IssuedTicket> {
		self.issue(ReferenceInstant::now_at(self.utc_offset)).await
	}

	/// Runs the pipeline stamped with `instant`.
	pub async fn issue(&self, instant: ReferenceInstant) -> Result<IssuedTicket> {
		let run = RunObserver::new(&instant.minute_key(), &self.service);
		let request =
			run.stage(Stage::Build, || Ok::<_, Error>(TicketRequest::build(&self.service, instant)))?;
		let document = request.to_xml();
		let request_artifact = run
			.persist(
				Stage::PersistRequest,
				self.store.persist_xml(document.as_bytes(), &self.request_prefix, instant),
			)
			.await?;
		let payload =
			run.stage(Stage::Sign, || self.signer.sign(document.as_bytes(), &self.identity))?;
		let payload_prefix = self.payload_prefix();
		let payload_artifact = run
			.persist(
				Stage::PersistPayload,
				self.store.persist(
					payload.as_str().as_bytes(),
					&payload_prefix,
					instant,
					PAYLOAD_EXTENSION,
				),
			)
			.await?;
		let response = run
			.stage_async(Stage::Exchange, self.exchange.exchange(&self.wsdl_url, &payload))
			.await?;
		let response_artifact = run
			.persist(
				Stage::PersistResponse,
				self.store.persist_xml(response.credential().as_bytes(), RESPONSE_PREFIX, instant),
			)
			.await?;

		run.issued();

		Ok(IssuedTicket { instant, request_artifact, payload_artifact, response_artifact, response })
	}

	// `<prefix>.cms` always carries an extension, so the payload never takes the request's name.
	fn payload_prefix(&self) -> String {
		format!("{}.{PAYLOAD_EXTENSION}", self.request_prefix)
	}
}
#[cfg(feature = "reqwest")]
impl TicketIssuer<ReqwestHttpClient> {
	/// Builds every default collaborator from `config`: the configured signer backend (scratch
	/// files under [`Config::work_dir`]), a [`FileArtifactStore`] rooted at the artifact
	/// directory, and a reqwest transport.
	pub fn from_config(config: &Config) -> Result<Self> {
		let store = FileArtifactStore::open(&config.artifact_dir)?;
		let signer = config.signer.build(&config.openssl_program, config.work_dir())?;
		let exchange = ReqwestExchangeClient::with_reqwest()?;

		Ok(Self::with_config(config, signer, Arc::new(store), exchange))
	}
}
impl<T> Clone for TicketIssuer<T>
where
	T: ?Sized + RpcTransport,
{
	fn clone(&self) -> Self {
		Self {
			signer: Arc::clone(&self.signer),
			store: Arc::clone(&self.store),
			exchange: self.exchange.clone(),
			identity: self.identity.clone(),
			service: self.service.clone(),
			wsdl_url: self.wsdl_url.clone(),
			request_prefix: self.request_prefix.clone(),
			utc_offset: self.utc_offset,
		}
	}
}
impl<T> Debug for TicketIssuer<T>
where
	T: ?Sized + RpcTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TicketIssuer")
			.field("service", &self.service)
			.field("wsdl_url", &self.wsdl_url.as_str())
			.field("request_prefix", &self.request_prefix)
			.finish()
	}
}

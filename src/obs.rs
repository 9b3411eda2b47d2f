//! Run-scoped instrumentation for the issuance pipeline.
//!
//! # Feature Flags
//!
//! - `tracing`: every run opens a `wsaa_client.issue` span carrying `unique_id` and `service`.
//!   The span also records the `request`, `payload` and `response` artifact names as they are
//!   written. Each stage runs inside a child `wsaa_client.stage` span.
//! - `metrics`: every stage outcome increments `wsaa_client_stage_total` (labels `stage` and
//!   `outcome`, plus `kind` on failure). Stage latency feeds `wsaa_client_stage_seconds`.

// std
use std::time::Instant;
// self
use crate::{_prelude::*, error::ErrorKind, store::ArtifactName};

/// Pipeline stages, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
	/// Request document construction.
	Build,
	/// Request document written to the store.
	PersistRequest,
	/// CMS signing of the request document.
	Sign,
	/// Signed payload written to the store.
	PersistPayload,
	/// Remote `loginCms` exchange.
	Exchange,
	/// Credential document written to the store.
	PersistResponse,
}
impl Stage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Stage::Build => "build",
			Stage::PersistRequest => "persist_request",
			Stage::Sign => "sign",
			Stage::PersistPayload => "persist_payload",
			Stage::Exchange => "exchange",
			Stage::PersistResponse => "persist_response",
		}
	}

	/// Span field that receives the artifact written by this stage, if any.
	pub const fn artifact_field(self) -> Option<&'static str> {
		match self {
			Stage::PersistRequest => Some("request"),
			Stage::PersistPayload => Some("payload"),
			Stage::PersistResponse => Some("response"),
			Stage::Build | Stage::Sign | Stage::Exchange => None,
		}
	}
}
impl Display for Stage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Observes one issuance run.
#[derive(Clone, Debug)]
pub struct RunObserver {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RunObserver {
	/// Opens the run span for the request identified by `unique_id`.
	pub fn new(unique_id: &str, service: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"wsaa_client.issue",
				unique_id,
				service,
				request = tracing::field::Empty,
				payload = tracing::field::Empty,
				response = tracing::field::Empty,
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (unique_id, service);

			Self {}
		}
	}

	/// Runs a synchronous stage.
	pub fn stage<R, E>(&self, stage: Stage, run: impl FnOnce() -> Result<R, E>) -> Result<R>
	where
		Error: From<E>,
	{
		let started = Instant::now();

		#[cfg(feature = "tracing")]
		let result = {
			let _entered = self.stage_span(stage).entered();

			run()
		};
		#[cfg(not(feature = "tracing"))]
		let result = run();

		self.finish(stage, started, result.map_err(Error::from))
	}

	/// Runs an asynchronous stage; no span guard is held across `.await` points.
	pub async fn stage_async<R, E>(
		&self,
		stage: Stage,
		fut: impl Future<Output = Result<R, E>>,
	) -> Result<R>
	where
		Error: From<E>,
	{
		let started = Instant::now();

		#[cfg(feature = "tracing")]
		let result = {
			use tracing::Instrument;

			fut.instrument(self.stage_span(stage)).await
		};
		#[cfg(not(feature = "tracing"))]
		let result = fut.await;

		self.finish(stage, started, result.map_err(Error::from))
	}

	/// Runs a persistence stage and records the written name on the run span.
	pub async fn persist(
		&self,
		stage: Stage,
		fut: impl Future<Output = Result<ArtifactName, crate::store::StoreError>>,
	) -> Result<ArtifactName> {
		let name = self.stage_async(stage, fut).await?;

		#[cfg(feature = "tracing")]
		if let Some(field) = stage.artifact_field() {
			self.span.record(field, name.as_str());
		}

		Ok(name)
	}

	/// Logs the completed run.
	pub fn issued(&self) {
		#[cfg(feature = "tracing")]
		self.span.in_scope(|| tracing::info!("login ticket issued"));
	}

	#[cfg(feature = "tracing")]
	fn stage_span(&self, stage: Stage) -> tracing::Span {
		tracing::info_span!(parent: &self.span, "wsaa_client.stage", stage = stage.as_str())
	}

	fn finish<R>(&self, stage: Stage, started: Instant, result: Result<R>) -> Result<R> {
		let elapsed = started.elapsed();

		match &result {
			Ok(_) => record_stage(stage, None, elapsed),
			Err(e) => {
				record_stage(stage, Some(e.kind()), elapsed);

				#[cfg(feature = "tracing")]
				self.span.in_scope(|| {
					tracing::warn!(
						stage = stage.as_str(),
						kind = e.kind().as_str(),
						error = %e,
						"stage failed"
					)
				});
			},
		}

		result
	}
}

/// Records one stage outcome via the global metrics recorder (when enabled).
///
/// `failure` is `None` for a successful stage.
pub fn record_stage(stage: Stage, failure: Option<ErrorKind>, elapsed: std::time::Duration) {
	#[cfg(feature = "metrics")]
	{
		match failure {
			None => metrics::counter!(
				"wsaa_client_stage_total",
				"stage" => stage.as_str(),
				"outcome" => "success"
			)
			.increment(1),
			Some(kind) => metrics::counter!(
				"wsaa_client_stage_total",
				"stage" => stage.as_str(),
				"outcome" => "failure",
				"kind" => kind.as_str()
			)
			.increment(1),
		}

		metrics::histogram!("wsaa_client_stage_seconds", "stage" => stage.as_str())
			.record(elapsed.as_secs_f64());
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (stage, failure, elapsed);
	}
}

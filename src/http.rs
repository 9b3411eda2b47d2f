//! Transport primitives for the `loginCms` exchange.
//!
//! [`RpcTransport`] is the exchange client's only dependency on an HTTP stack: it fetches
//! the service description and posts SOAP envelopes, nothing more. The crate ships a
//! reqwest-backed implementation behind the `reqwest` feature; downstream crates can plug
//! in any other client by implementing the trait.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::CONTENT_TYPE;
// self
use crate::_prelude::*;
#[cfg(feature = "reqwest")] use crate::error::ConfigError;

/// Boxed future returned by [`RpcTransport`] methods.
pub type TransportFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + 'a + Send>>;

/// Status and body of a completed HTTP exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpReply {
	/// HTTP status code.
	pub status: u16,
	/// Response body decoded as text.
	pub body: String,
}
impl HttpReply {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Abstraction over HTTP transports capable of carrying SOAP 1.1 calls.
///
/// Implementations must be `Send + Sync + 'static` so they can be shared behind `Arc`, and
/// the futures they return must be `Send`. Non-success statuses are returned as replies, not
/// errors: SOAP faults travel in 500 responses and must reach the envelope parser.
pub trait RpcTransport
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Fetches a document (the service description) with `GET`.
	fn get<'a>(&'a self, url: &'a Url) -> TransportFuture<'a, HttpReply, Self::TransportError>;

	/// Posts a SOAP envelope with the given `SOAPAction`.
	fn post_xml<'a>(
		&'a self,
		url: &'a Url,
		soap_action: &'a str,
		envelope: String,
	) -> TransportFuture<'a, HttpReply, Self::TransportError>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The client's defaults (connection pooling, redirect policy, timeouts) are used as-is; the
/// exchange adds no retry or timeout of its own.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds a client identifying itself as this crate.
	pub fn try_new() -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
			.build()
			.map_err(ConfigError::http_client_build)?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl RpcTransport for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn get<'a>(&'a self, url: &'a Url) -> TransportFuture<'a, HttpReply, Self::TransportError> {
		Box::pin(async move {
			let response = self.0.get(url.clone()).send().await?;
			let status = response.status().as_u16();
			let body = response.text().await?;

			Ok(HttpReply { status, body })
		})
	}

	fn post_xml<'a>(
		&'a self,
		url: &'a Url,
		soap_action: &'a str,
		envelope: String,
	) -> TransportFuture<'a, HttpReply, Self::TransportError> {
		Box::pin(async move {
			let response = self
				.0
				.post(url.clone())
				.header(CONTENT_TYPE, "text/xml; charset=utf-8")
				.header("SOAPAction", format!("\"{soap_action}\""))
				.body(envelope)
				.send()
				.await?;
			let status = response.status().as_u16();
			let body = response.text().await?;

			Ok(HttpReply { status, body })
		})
	}
}

//! Remote `loginCms` exchange.
//!
//! [`TicketExchangeClient::exchange`] resolves the service description, invokes the single
//! `loginCms` operation with the signed payload as its only argument, and hands the raw
//! result back. Exactly one call is made per exchange: no retries, no pipelining, and no
//! timeout beyond what the transport enforces. Faults are surfaced verbatim; deciding
//! whether a fault such as "already authenticated" is recoverable is the caller's business.

mod soap;

// self
use crate::{
	_prelude::*,
	error::ExchangeError,
	http::RpcTransport,
	sign::SignedPayload,
	ticket::{LoginTicket, LoginTicketError},
	xml,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Exchange client specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestExchangeClient = TicketExchangeClient<ReqwestHttpClient>;

/// Endpoint and namespace extracted from a WSDL document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescription {
	/// SOAP address the operation is posted to.
	pub endpoint: Url,
	/// Target namespace qualifying the operation element.
	pub namespace: String,
}
impl ServiceDescription {
	/// Reads the target namespace and the first SOAP address from `wsdl`.
	///
	/// Relative addresses are resolved against `base`.
	pub fn parse(wsdl: &str, base: &Url) -> Result<Self, ExchangeError> {
		let invalid = |message: String| ExchangeError::InvalidDescription { message };
		let namespace = xml::find_attribute(wsdl, "definitions", "targetNamespace")
			.map_err(|e| invalid(e.0))?
			.filter(|value| !value.is_empty())
			.ok_or_else(|| invalid("definitions carry no targetNamespace".into()))?;
		let location = xml::find_attribute(wsdl, "address", "location")
			.map_err(|e| invalid(e.0))?
			.ok_or_else(|| invalid("no service port declares an address".into()))?;
		let endpoint = base
			.join(&location)
			.map_err(|e| invalid(format!("address `{location}` is not a URL: {e}")))?;

		Ok(Self { endpoint, namespace })
	}
}

/// Raw result of a successful `loginCms` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketResponse {
	credential: String,
}
impl TicketResponse {
	/// Wraps a `loginCmsReturn` document.
	pub fn new(credential: impl Into<String>) -> Self {
		Self { credential: credential.into() }
	}

	/// The `loginCmsReturn` document exactly as returned by the gateway.
	pub fn credential(&self) -> &str {
		&self.credential
	}

	/// Parses the credential into a [`LoginTicket`].
	pub fn login_ticket(&self) -> Result<LoginTicket, LoginTicketError> {
		LoginTicket::parse(&self.credential)
	}

	/// Consumes the response, returning the credential document.
	pub fn into_credential(self) -> String {
		self.credential
	}
}

/// Submits signed login-ticket requests to the gateway.
pub struct TicketExchangeClient<T>
where
	T: ?Sized + RpcTransport,
{
	transport: Arc<T>,
}
impl<T> TicketExchangeClient<T>
where
	T: ?Sized + RpcTransport,
{
	/// Remote operation invoked by [`exchange`](Self::exchange).
	pub const OPERATION: &'static str = "loginCms";
	/// Element carrying the operation's result.
	pub const RETURN_ELEMENT: &'static str = "loginCmsReturn";

	/// Creates a client over the provided transport.
	pub fn new(transport: impl Into<Arc<T>>) -> Self {
		Self { transport: transport.into() }
	}

	/// Fetches and parses the service description at `wsdl`.
	pub async fn resolve(&self, wsdl: &Url) -> Result<ServiceDescription, ExchangeError> {
		let reply = self
			.transport
			.get(wsdl)
			.await
			.map_err(|e| ExchangeError::transport(wsdl, e))?;

		if !reply.is_success() {
			return Err(ExchangeError::Status { url: wsdl.to_string(), status: reply.status });
		}

		ServiceDescription::parse(&reply.body, wsdl)
	}

	/// Invokes `loginCms` on an already resolved service.
	pub async fn invoke(
		&self,
		service: &ServiceDescription,
		payload: &SignedPayload,
	) -> Result<TicketResponse, ExchangeError> {
		let envelope = soap::envelope(&service.namespace, Self::OPERATION, payload.as_str());
		let reply = self
			.transport
			.post_xml(&service.endpoint, "", envelope)
			.await
			.map_err(|e| ExchangeError::transport(&service.endpoint, e))?;
		let status_error =
			|| ExchangeError::Status { url: service.endpoint.to_string(), status: reply.status };

		match soap::read_reply(&reply.body, Self::RETURN_ELEMENT) {
			Ok(soap::SoapReply::Fault { code, message }) => Err(ExchangeError::Fault { code, message }),
			Ok(_) if !reply.is_success() => Err(status_error()),
			Ok(soap::SoapReply::Return(Some(credential))) => Ok(TicketResponse::new(credential)),
			Ok(soap::SoapReply::Return(None)) => Err(ExchangeError::MissingCredential),
			Err(_) if !reply.is_success() => Err(status_error()),
			Err(e) => Err(ExchangeError::Malformed { message: e.0 }),
		}
	}

	/// Resolves `wsdl` and performs exactly one `loginCms` call with `payload`.
	pub async fn exchange(
		&self,
		wsdl: &Url,
		payload: &SignedPayload,
	) -> Result<TicketResponse, ExchangeError> {
		let service = self.resolve(wsdl).await?;

		self.invoke(&service, payload).await
	}
}
#[cfg(feature = "reqwest")]
impl TicketExchangeClient<ReqwestHttpClient> {
	/// Creates a client over a fresh [`ReqwestHttpClient`].
	pub fn with_reqwest() -> Result<Self, crate::error::ConfigError> {
		Ok(Self::new(ReqwestHttpClient::try_new()?))
	}
}
impl<T> Clone for TicketExchangeClient<T>
where
	T: ?Sized + RpcTransport,
{
	fn clone(&self) -> Self {
		Self { transport: Arc::clone(&self.transport) }
	}
}
impl<T> Debug for TicketExchangeClient<T>
where
	T: ?Sized + RpcTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TicketExchangeClient").field("operation", &Self::OPERATION).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn base() -> Url {
		Url::parse("https://wsaahomo.example.gov/ws/services/LoginCms?wsdl")
			.expect("Fixture URL should parse.")
	}

	#[test]
	fn description_reads_namespace_and_address() {
		let wsdl = r#"<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
            xmlns:wsdlsoap="http://schemas.xmlsoap.org/wsdl/soap/"
            targetNamespace="http://wsaa.view.sua.dvadac.desein.afip.gov">
            <wsdl:service name="LoginCMSService">
                <wsdl:port binding="impl:LoginCmsSoapBinding" name="LoginCms">
                    <wsdlsoap:address location="https://wsaahomo.example.gov/ws/services/LoginCms"/>
                </wsdl:port>
            </wsdl:service>
        </wsdl:definitions>"#;
		let description =
			ServiceDescription::parse(wsdl, &base()).expect("Fixture WSDL should parse.");

		assert_eq!(description.namespace, "http://wsaa.view.sua.dvadac.desein.afip.gov");
		assert_eq!(description.endpoint.as_str(), "https://wsaahomo.example.gov/ws/services/LoginCms");
	}

	#[test]
	fn relative_addresses_resolve_against_the_wsdl_url() {
		let wsdl = r#"<definitions targetNamespace="urn:wsaa"><service><port>
            <address location="/ws/services/LoginCms"/></port></service></definitions>"#;
		let description =
			ServiceDescription::parse(wsdl, &base()).expect("Relative address should resolve.");

		assert_eq!(description.endpoint.as_str(), "https://wsaahomo.example.gov/ws/services/LoginCms");
	}

	#[test]
	fn descriptions_without_address_are_rejected() {
		let err = ServiceDescription::parse(
			r#"<definitions targetNamespace="urn:wsaa"/>"#,
			&base(),
		)
		.expect_err("Descriptions without an address must be rejected.");

		assert!(matches!(err, ExchangeError::InvalidDescription { .. }));
		assert!(
			ServiceDescription::parse("<definitions><address location=\"x\"/></definitions>", &base())
				.is_err()
		);
	}
}

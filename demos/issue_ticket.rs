//! Runs one issuance against a mocked gateway with the default reqwest transport and the
//! in-memory artifact store, then prints the archived artifacts and the ticket's expiry.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use wsaa_client::{
	error::SigningError,
	exchange::TicketExchangeClient,
	http::ReqwestHttpClient,
	issuer::TicketIssuer,
	sign::{SignedPayload, Signer, SigningIdentity},
	store::MemoryArtifactStore,
	ticket::{ServiceId, local_timestamp},
};

/// Stands in for a real CMS signer so the demo needs no certificate.
struct UnsignedPayload;
impl Signer for UnsignedPayload {
	fn sign(
		&self,
		document: &[u8],
		_: &SigningIdentity,
	) -> std::result::Result<SignedPayload, SigningError> {
		Ok(SignedPayload::from_der(document))
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let wsdl = format!(
		"<definitions targetNamespace=\"http://wsaa.view.sua.dvadac.desein.afip.gov\">\
		 <service><port><address location=\"{}\"/></port></service></definitions>",
		server.url("/ws/services/LoginCms")
	);
	let ticket = "<loginTicketResponse><header><source>CN=wsaa-demo</source>\
	              <destination>CN=demo-client</destination><uniqueId>1</uniqueId>\
	              <generationTime>2030-01-01T00:00:00-03:00</generationTime>\
	              <expirationTime>2030-01-01T12:00:00-03:00</expirationTime></header>\
	              <credentials><token>demo-token</token><sign>demo-sign</sign></credentials>\
	              </loginTicketResponse>";
	let reply = format!(
		"<soapenv:Envelope xmlns:soapenv=\"http://schemas.xmlsoap.org/soap/envelope/\">\
		 <soapenv:Body><loginCmsResponse><loginCmsReturn>{}</loginCmsReturn></loginCmsResponse>\
		 </soapenv:Body></soapenv:Envelope>",
		ticket.replace('<', "&lt;").replace('>', "&gt;")
	);
	let _wsdl_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/ws/services/LoginCms");
			then.status(200).header("content-type", "text/xml").body(wsdl);
		})
		.await;
	let login_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/ws/services/LoginCms");
			then.status(200).header("content-type", "text/xml").body(reply);
		})
		.await;
	let store = MemoryArtifactStore::default();
	let issuer = TicketIssuer::new(
		Arc::new(UnsignedPayload),
		Arc::new(store.clone()),
		<TicketExchangeClient<ReqwestHttpClient>>::new(ReqwestHttpClient::try_new()?),
		SigningIdentity::new("demo.crt", "demo.key"),
		ServiceId::new("wsfe")?,
		Url::parse(&server.url("/ws/services/LoginCms?wsdl"))?,
		"loginTicketRequest",
	);
	let issued = issuer.issue_now().await?;
	let ticket = issued.response.login_ticket()?;

	for name in store.names() {
		println!("Archived {name}.");
	}

	println!("Ticket {} expires at {}.", ticket.unique_id, local_timestamp(ticket.expiration_time));

	login_mock.assert_async().await;

	Ok(())
}

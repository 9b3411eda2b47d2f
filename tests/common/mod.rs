//! Shared fixtures for integration tests.

#![allow(dead_code)]

// std
use std::{env, fs, path::PathBuf, process};
// self
use wsaa_client::{
	error::SigningError,
	sign::{SignedPayload, Signer, SigningIdentity},
	time::OffsetDateTime,
};

pub const NAMESPACE: &str = "http://wsaa.view.sua.dvadac.desein.afip.gov";
pub const WSDL_PATH: &str = "/ws/services/LoginCms";
pub const ENDPOINT_PATH: &str = "/ws/services/LoginCms/endpoint";

/// Signer that base64-encodes the document instead of signing it.
#[derive(Clone, Copy, Debug, Default)]
pub struct FakeSigner;
impl Signer for FakeSigner {
	fn sign(
		&self,
		document: &[u8],
		_: &SigningIdentity,
	) -> Result<SignedPayload, SigningError> {
		Ok(SignedPayload::from_der(document))
	}
}

/// Fresh directory path under the system temp dir; not created.
pub fn temp_dir(label: &str) -> PathBuf {
	env::temp_dir().join(format!(
		"wsaa-client-{label}-{}-{}",
		process::id(),
		OffsetDateTime::now_utc().unix_timestamp_nanos(),
	))
}

#[cfg(feature = "reqwest")]
pub fn reqwest_exchange() -> wsaa_client::exchange::ReqwestExchangeClient {
	// self
	use wsaa_client::{exchange::ReqwestExchangeClient, http::ReqwestHttpClient};

	ReqwestExchangeClient::new(
		ReqwestHttpClient::try_new().expect("Reqwest client should build for tests."),
	)
}

pub fn wsdl(endpoint: &str) -> String {
	format!(
		r#"<?xml version="1.0" encoding="UTF-8"?>
<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
    xmlns:wsdlsoap="http://schemas.xmlsoap.org/wsdl/soap/"
    xmlns:impl="{NAMESPACE}"
    targetNamespace="{NAMESPACE}">
    <wsdl:binding name="LoginCmsSoapBinding" type="impl:LoginCMS">
        <wsdlsoap:binding style="document" transport="http://schemas.xmlsoap.org/soap/http"/>
    </wsdl:binding>
    <wsdl:service name="LoginCMSService">
        <wsdl:port binding="impl:LoginCmsSoapBinding" name="LoginCms">
            <wsdlsoap:address location="{endpoint}"/>
        </wsdl:port>
    </wsdl:service>
</wsdl:definitions>"#
	)
}

pub fn login_ticket_response(expiration_time: &str) -> String {
	format!(
		r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<loginTicketResponse version="1.0">
    <header>
        <source>CN=wsaahomo, O=AFIP, C=AR, SERIALNUMBER=CUIT 33693450239</source>
        <destination>SERIALNUMBER=CUIT 20190178154, CN=test</destination>
        <uniqueId>2311142213</uniqueId>
        <generationTime>2023-11-14T19:03:20.123-03:00</generationTime>
        <expirationTime>{expiration_time}</expirationTime>
    </header>
    <credentials>
        <token>PD94bWwgdmVyc2lvbj0iMS4wIj8+</token>
        <sign>c2lnbmF0dXJl</sign>
    </credentials>
</loginTicketResponse>"#
	)
}

pub fn login_cms_reply(credential: &str) -> String {
	format!(
		r#"<?xml version="1.0" encoding="utf-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
    <soapenv:Body>
        <loginCmsResponse xmlns="{NAMESPACE}">
            <loginCmsReturn>{}</loginCmsReturn>
        </loginCmsResponse>
    </soapenv:Body>
</soapenv:Envelope>"#,
		credential.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;"),
	)
}

pub fn fault_reply(code: &str, message: &str) -> String {
	format!(
		r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
    <soapenv:Body>
        <soapenv:Fault>
            <faultcode xmlns:ns1="http://xml.apache.org/axis/">{code}</faultcode>
            <faultstring>{message}</faultstring>
        </soapenv:Fault>
    </soapenv:Body>
</soapenv:Envelope>"#
	)
}

/// Writes a throwaway self-signed certificate and its RSA key into `dir`.
#[cfg(feature = "openssl")]
pub fn mint_identity(dir: &std::path::Path, common_name: &str) -> SigningIdentity {
	// self
	use wsaa_client::openssl::{
		asn1::Asn1Time,
		bn::BigNum,
		hash::MessageDigest,
		pkey::PKey,
		rsa::Rsa,
		x509::{X509Builder, X509NameBuilder},
	};

	fs::create_dir_all(dir).expect("Identity directory should be creatable.");

	let key = PKey::from_rsa(Rsa::generate(2048).expect("RSA key generation should succeed."))
		.expect("RSA key should convert into a PKey.");
	let mut name = X509NameBuilder::new().expect("Name builder should initialize.");

	name.append_entry_by_text("CN", common_name).expect("Common name should be accepted.");

	let name = name.build();
	let serial = BigNum::from_u32(1)
		.and_then(|serial| serial.to_asn1_integer())
		.expect("Serial number should encode.");
	let not_before = Asn1Time::days_from_now(0).expect("Validity start should encode.");
	let not_after = Asn1Time::days_from_now(1).expect("Validity end should encode.");
	let mut builder = X509Builder::new().expect("Certificate builder should initialize.");

	builder.set_version(2).expect("Certificate version should be accepted.");
	builder.set_serial_number(&serial).expect("Serial number should be accepted.");
	builder.set_subject_name(&name).expect("Subject should be accepted.");
	builder.set_issuer_name(&name).expect("Issuer should be accepted.");
	builder.set_pubkey(&key).expect("Public key should be accepted.");
	builder.set_not_before(&not_before).expect("Validity start should be accepted.");
	builder.set_not_after(&not_after).expect("Validity end should be accepted.");
	builder.sign(&key, MessageDigest::sha256()).expect("Certificate should self-sign.");

	let certificate = builder.build();
	let certificate_path = dir.join(format!("{common_name}.crt"));
	let private_key_path = dir.join(format!("{common_name}.key"));

	fs::write(&certificate_path, certificate.to_pem().expect("Certificate should encode."))
		.expect("Certificate should be writable.");
	fs::write(
		&private_key_path,
		key.private_key_to_pem_pkcs8().expect("Private key should encode."),
	)
	.expect("Private key should be writable.");

	SigningIdentity::new(certificate_path, private_key_path)
}

//! SOAP 1.1 envelope rendering and response classification.

// self
use crate::{
	_prelude::*,
	xml::{self, XmlError},
};

const ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Outcome of reading a SOAP response body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum SoapReply {
	/// The body carries a `Fault`.
	Fault { code: String, message: String },
	/// The body carries the named return element (possibly empty).
	Return(Option<String>),
}

/// Renders a document/literal call with a single `in0` argument.
pub(crate) fn envelope(namespace: &str, operation: &str, argument: &str) -> String {
	format!(
		"<soapenv:Envelope xmlns:soapenv=\"{ENVELOPE_NS}\" xmlns:op=\"{}\">\
		 <soapenv:Header/><soapenv:Body><op:{operation}><op:in0>{}</op:in0></op:{operation}>\
		 </soapenv:Body></soapenv:Envelope>",
		xml::escape(namespace),
		xml::escape(argument),
	)
}

/// Classifies a response body; `return_element` is the operation's result element.
pub(crate) fn read_reply(body: &str, return_element: &str) -> Result<SoapReply, XmlError> {
	let mut found =
		xml::scan_elements(body, &["Fault", "faultcode", "faultstring", return_element])?;

	if found.contains_key("Fault") {
		return Ok(SoapReply::Fault {
			code: found.remove("faultcode").unwrap_or_default(),
			message: found.remove("faultstring").unwrap_or_default(),
		});
	}

	Ok(SoapReply::Return(found.remove(return_element).filter(|value| !value.is_empty())))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn envelope_wraps_the_argument() {
		let rendered = envelope("urn:wsaa", "loginCms", "TUlJ+a/b=");

		assert!(rendered.starts_with("<soapenv:Envelope"));
		assert!(rendered.contains("xmlns:op=\"urn:wsaa\""));
		assert!(rendered.contains("<op:loginCms><op:in0>TUlJ+a/b=</op:in0></op:loginCms>"));
		xml::scan_elements(&rendered, &["in0"]).expect("Rendered envelope should be well-formed.");
	}

	#[test]
	fn faults_keep_raw_code_and_string() {
		let body = "<soapenv:Envelope xmlns:soapenv=\"http://schemas.xmlsoap.org/soap/envelope/\">\
		            <soapenv:Body><soapenv:Fault><faultcode xmlns:ns1=\"urn:x\">ns1:coe.alreadyAuthenticated</faultcode>\
		            <faultstring>El CEE ya posee un TA valido para el acceso al WSN solicitado</faultstring>\
		            </soapenv:Fault></soapenv:Body></soapenv:Envelope>";

		assert_eq!(
			read_reply(body, "loginCmsReturn").expect("Fault fixture should parse."),
			SoapReply::Fault {
				code: "ns1:coe.alreadyAuthenticated".into(),
				message: "El CEE ya posee un TA valido para el acceso al WSN solicitado".into(),
			},
		);
	}

	#[test]
	fn empty_return_counts_as_absent() {
		let body = "<Envelope><Body><loginCmsResponse><loginCmsReturn>  </loginCmsReturn>\
		            </loginCmsResponse></Body></Envelope>";

		assert_eq!(
			read_reply(body, "loginCmsReturn").expect("Fixture should parse."),
			SoapReply::Return(None)
		);
	}
}

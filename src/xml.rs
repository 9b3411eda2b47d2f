//! Minimal element scanning shared by the SOAP and login-ticket parsers.

// std
use std::collections::HashSet;
// crates.io
use quick_xml::{events::Event, reader::Reader};
// self
use crate::_prelude::*;

/// Parser diagnostic produced while scanning a document.
#[derive(Debug, ThisError)]
#[error("{0}")]
pub(crate) struct XmlError(pub(crate) String);

/// Collects the text content of the first occurrence of each `wanted` element.
///
/// Elements are matched by local name, so namespace prefixes are ignored. Every wanted
/// element that appears is present in the result, with an empty string when it carries no
/// text. Entity references are resolved; CDATA sections are taken verbatim.
pub(crate) fn scan_elements(
	doc: &str,
	wanted: &[&str],
) -> Result<HashMap<String, String>, XmlError> {
	let mut reader = Reader::from_str(doc);
	let mut found = HashMap::new();
	let mut closed = HashSet::new();
	// Stack of local names currently open; text is appended to every open wanted element.
	let mut open: Vec<String> = Vec::new();

	loop {
		match reader.read_event().map_err(|e| XmlError(e.to_string()))? {
			Event::Start(e) => {
				let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();

				if wanted.contains(&name.as_str()) && !found.contains_key(&name) {
					found.insert(name.clone(), String::new());
				}

				open.push(name);
			},
			Event::Empty(e) => {
				let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();

				if wanted.contains(&name.as_str()) && !found.contains_key(&name) {
					closed.insert(name.clone());
					found.insert(name, String::new());
				}
			},
			Event::End(_) =>
				if let Some(name) = open.pop() {
					closed.insert(name);
				},
			Event::Text(t) => {
				let text = t.unescape().map_err(|e| XmlError(e.to_string()))?;

				append_text(&mut found, &closed, &open, &text);
			},
			Event::CData(c) => {
				let raw = c.into_inner();
				let text = String::from_utf8_lossy(&raw);

				append_text(&mut found, &closed, &open, &text);
			},
			Event::Eof => break,
			_ => (),
		}
	}

	if let Some(name) = open.last() {
		return Err(XmlError(format!("element `{name}` is never closed")));
	}

	for value in found.values_mut() {
		*value = value.trim().to_owned();
	}

	Ok(found)
}

/// Returns the value of the first attribute named `attribute` (local name) on the first
/// element named `element` (local name).
pub(crate) fn find_attribute(
	doc: &str,
	element: &str,
	attribute: &str,
) -> Result<Option<String>, XmlError> {
	let mut reader = Reader::from_str(doc);

	loop {
		match reader.read_event().map_err(|e| XmlError(e.to_string()))? {
			Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == element.as_bytes() => {
				for attr in e.attributes() {
					let attr = attr.map_err(|e| XmlError(e.to_string()))?;

					if attr.key.local_name().as_ref() == attribute.as_bytes() {
						let value = attr.unescape_value().map_err(|e| XmlError(e.to_string()))?;

						return Ok(Some(value.into_owned()));
					}
				}
			},
			Event::Eof => return Ok(None),
			_ => (),
		}
	}
}

/// Escapes text for inclusion in element content.
pub(crate) fn escape(text: &str) -> String {
	quick_xml::escape::escape(text).into_owned()
}

fn append_text(
	found: &mut HashMap<String, String>,
	closed: &HashSet<String>,
	open: &[String],
	text: &str,
) {
	for name in open {
		if closed.contains(name) {
			continue;
		}
		if let Some(buf) = found.get_mut(name) {
			buf.push_str(text);
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn scan_ignores_prefixes_and_resolves_entities() {
		let doc = "<soap:Envelope xmlns:soap=\"urn:x\"><soap:Body><r>&lt;a&gt;1&lt;/a&gt;</r>\
		           <e/></soap:Body></soap:Envelope>";
		let found = scan_elements(doc, &["r", "e", "missing"]).expect("Fixture should parse.");

		assert_eq!(found.get("r").map(String::as_str), Some("<a>1</a>"));
		assert_eq!(found.get("e").map(String::as_str), Some(""));
		assert!(!found.contains_key("missing"));
	}

	#[test]
	fn scan_keeps_first_occurrence() {
		let doc = "<root><v>first</v><v>second</v></root>";
		let found = scan_elements(doc, &["v"]).expect("Fixture should parse.");

		assert_eq!(found.get("v").map(String::as_str), Some("first"));
	}

	#[test]
	fn scan_reports_mismatched_tags() {
		assert!(scan_elements("<a><b></a>", &["a"]).is_err());
		assert!(scan_elements("<a><b>", &["a"]).is_err());
	}

	#[test]
	fn attributes_are_found_by_local_name() {
		let doc = "<wsdl:definitions targetNamespace=\"urn:svc\"><soap:address \
		           location=\"https://example.com/ws\"/></wsdl:definitions>";

		assert_eq!(
			find_attribute(doc, "definitions", "targetNamespace")
				.expect("Fixture should parse.")
				.as_deref(),
			Some("urn:svc"),
		);
		assert_eq!(
			find_attribute(doc, "address", "location").expect("Fixture should parse.").as_deref(),
			Some("https://example.com/ws"),
		);
		assert_eq!(find_attribute(doc, "address", "binding").expect("Fixture should parse."), None);
	}
}

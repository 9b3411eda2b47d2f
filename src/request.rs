//! Login-ticket request construction.
//!
//! A [`TicketRequest`] is derived entirely from a [`ServiceId`] and a [`ReferenceInstant`]:
//! the unique id is the instant truncated to the minute and the validity window spans
//! ten minutes on either side of it. Rendering is deterministic, so identical inputs always
//! serialize to identical bytes.

// self
use crate::{
	_prelude::*,
	ticket::{ReferenceInstant, ServiceId, local_timestamp},
	xml,
};

/// Half-width of the validity window around the reference instant.
pub const VALIDITY_MARGIN: Duration = Duration::minutes(10);

/// Immutable login-ticket request document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRequest {
	unique_id: String,
	generation_time: OffsetDateTime,
	expiration_time: OffsetDateTime,
	service: ServiceId,
	reference: ReferenceInstant,
}
impl TicketRequest {
	/// Builds the request for `service` centred on `instant`.
	///
	/// The instant is not checked against any clock; skew tolerance belongs to the gateway.
	pub fn build(service: &ServiceId, instant: ReferenceInstant) -> Self {
		let reference = instant.as_offset_date_time();

		Self {
			unique_id: instant.minute_key(),
			generation_time: reference - VALIDITY_MARGIN,
			expiration_time: reference + VALIDITY_MARGIN,
			service: service.clone(),
			reference: instant,
		}
	}

	/// Nonce derived from the reference instant (`yyMMddHHmm`).
	pub fn unique_id(&self) -> &str {
		&self.unique_id
	}

	/// Start of the validity window.
	pub fn generation_time(&self) -> OffsetDateTime {
		self.generation_time
	}

	/// End of the validity window.
	pub fn expiration_time(&self) -> OffsetDateTime {
		self.expiration_time
	}

	/// Target service.
	pub fn service(&self) -> &ServiceId {
		&self.service
	}

	/// Instant the request was derived from.
	pub fn reference(&self) -> ReferenceInstant {
		self.reference
	}

	/// Renders the canonical `loginTicketRequest` document.
	pub fn to_xml(&self) -> String {
		format!(
			"<loginTicketRequest>\n    <header>\n        <uniqueId>{}</uniqueId>\n        \
			 <generationTime>{}</generationTime>\n        \
			 <expirationTime>{}</expirationTime>\n    </header>\n    \
			 <service>{}</service>\n</loginTicketRequest>",
			self.unique_id,
			local_timestamp(self.generation_time),
			local_timestamp(self.expiration_time),
			xml::escape(&self.service),
		)
	}
}

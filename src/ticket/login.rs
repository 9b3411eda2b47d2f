//! Parsed view of the `loginTicketResponse` document returned by the gateway.

// crates.io
use time::{PrimitiveDateTime, format_description::well_known::Rfc3339, macros::format_description};
// self
use crate::{_prelude::*, xml};

/// Current lifecycle status for an issued ticket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
	/// The generation instant is still in the future.
	Pending,
	/// The ticket may be presented to business services.
	Active,
	/// The ticket exceeded its expiration instant.
	Expired,
}

/// Errors produced while reading a `loginTicketResponse` document.
#[derive(Debug, ThisError)]
pub enum LoginTicketError {
	/// The document is not well-formed XML.
	#[error("Login ticket document is malformed: {message}.")]
	Malformed {
		/// Parser diagnostic.
		message: String,
	},
	/// A required element is absent or empty.
	#[error("Login ticket document lacks `{field}`.")]
	MissingField {
		/// Element name.
		field: &'static str,
	},
	/// A timestamp element cannot be parsed.
	#[error("Login ticket `{field}` is not a valid timestamp.")]
	InvalidTime {
		/// Element name.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: time::error::Parse,
	},
}

/// Credential issued by the gateway in exchange for a signed login-ticket request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginTicket {
	/// Gateway-assigned identifier of the ticket.
	pub unique_id: String,
	/// Distinguished name of the issuing authority.
	pub source: String,
	/// Distinguished name of the subject the ticket was issued to.
	pub destination: String,
	/// Instant the gateway generated the ticket.
	pub generation_time: OffsetDateTime,
	/// Instant after which business services reject the ticket.
	pub expiration_time: OffsetDateTime,
	/// Token and signature presented to business services.
	pub credentials: Credentials,
}
impl LoginTicket {
	const FIELDS: [&'static str; 7] = [
		"uniqueId",
		"source",
		"destination",
		"generationTime",
		"expirationTime",
		"token",
		"sign",
	];

	/// Parses a `loginTicketResponse` document.
	pub fn parse(document: &str) -> Result<Self, LoginTicketError> {
		let mut fields = xml::scan_elements(document, &Self::FIELDS)
			.map_err(|e| LoginTicketError::Malformed { message: e.0 })?;
		let mut take = |field: &'static str| {
			fields
				.remove(field)
				.filter(|value| !value.is_empty())
				.ok_or(LoginTicketError::MissingField { field })
		};
		let unique_id = take("uniqueId")?;
		let source = take("source")?;
		let destination = take("destination")?;
		let generation_time = take("generationTime")?;
		let expiration_time = take("expirationTime")?;
		let token = take("token")?;
		let sign = take("sign")?;

		Ok(Self {
			unique_id,
			source,
			destination,
			generation_time: parse_time("generationTime", &generation_time)?,
			expiration_time: parse_time("expirationTime", &expiration_time)?,
			credentials: Credentials { token, sign },
		})
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TicketStatus {
		if instant < self.generation_time {
			return TicketStatus::Pending;
		}
		if instant >= self.expiration_time {
			return TicketStatus::Expired;
		}

		TicketStatus::Active
	}

	/// Convenience helper that checks the status using the current UTC instant.
	pub fn status(&self) -> TicketStatus {
		self.status_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` if the ticket has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), TicketStatus::Expired)
	}

	/// Returns `true` if the ticket is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		matches!(self.status(), TicketStatus::Expired)
	}

	/// Time left before expiry, clamped at zero.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		let remaining = self.expiration_time - instant;

		if remaining.is_negative() { Duration::ZERO } else { remaining }
	}
}
/// The `token`/`sign` pair a business service expects in its authentication header.
///
/// `Debug` reports lengths only, so tickets can be logged without leaking either value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
	token: String,
	sign: String,
}
impl Credentials {
	/// Access token; never log it.
	pub fn token(&self) -> &str {
		&self.token
	}

	/// Signature over the token; never log it.
	pub fn sign(&self) -> &str {
		&self.sign
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("token", &format_args!("<{} bytes>", self.token.len()))
			.field("sign", &format_args!("<{} bytes>", self.sign.len()))
			.finish()
	}
}

impl FromStr for LoginTicket {
	type Err = LoginTicketError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

// Gateways emit RFC 3339 with an offset; offset-less values are read as UTC.
fn parse_time(field: &'static str, raw: &str) -> Result<OffsetDateTime, LoginTicketError> {
	if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
		return Ok(value);
	}

	PrimitiveDateTime::parse(
		raw,
		format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
	)
	.or_else(|_| {
		PrimitiveDateTime::parse(
			raw,
			format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
		)
	})
	.map(PrimitiveDateTime::assume_utc)
	.map_err(|source| LoginTicketError::InvalidTime { field, source })
}

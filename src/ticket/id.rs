//! Strongly typed identifiers used by ticket requests.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier.
		kind: &'static str,
	},
}

/// Identifier of the business service a ticket is requested for (e.g. `wsfe`).
///
/// Only emptiness is rejected. Whitespace, length, and charset are left to the gateway,
/// which is the only party that knows which services exist.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceId(String);
impl ServiceId {
	const KIND: &'static str = "Service";

	/// Creates a new identifier after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		validate_view(Self::KIND, view)?;

		Ok(Self(view.to_owned()))
	}
}
impl Deref for ServiceId {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for ServiceId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<ServiceId> for String {
	fn from(value: ServiceId) -> Self {
		value.0
	}
}
impl TryFrom<String> for ServiceId {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(Self::KIND, &value)?;

		Ok(Self(value))
	}
}
impl Borrow<str> for ServiceId {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl Debug for ServiceId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Service({})", self.0)
	}
}
impl Display for ServiceId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for ServiceId {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}

	Ok(())
}

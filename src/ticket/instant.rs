//! The single instant every timestamp of a run is derived from.

// crates.io
use time::{format_description::BorrowedFormatItem, macros::format_description};
// self
use crate::_prelude::*;

const MINUTE_KEY: &[BorrowedFormatItem] =
	format_description!("[year repr:last_two][month][day][hour][minute]");
const ARTIFACT_STAMP: &[BorrowedFormatItem] =
	format_description!("[year][month][day][hour][minute]");
const LOCAL_TIMESTAMP: &[BorrowedFormatItem] =
	format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// Point in time captured once per run.
///
/// The instant keeps its UTC offset: ticket headers and artifact names are rendered as
/// wall-clock values in that offset, without an offset suffix. Capture it with [`now`] (UTC)
/// or [`now_at`] when the gateway expects a specific local time.
///
/// [`now`]: ReferenceInstant::now
/// [`now_at`]: ReferenceInstant::now_at
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReferenceInstant(OffsetDateTime);
impl ReferenceInstant {
	/// Captures the current instant in UTC.
	pub fn now() -> Self {
		Self(OffsetDateTime::now_utc())
	}

	/// Captures the current instant rendered at `offset`.
	pub fn now_at(offset: UtcOffset) -> Self {
		Self(OffsetDateTime::now_utc().to_offset(offset))
	}

	/// Builds a UTC instant from milliseconds since the Unix epoch.
	pub fn from_unix_millis(millis: i64) -> Result<Self, time::error::ComponentRange> {
		OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).map(Self)
	}

	/// Returns the same instant rendered at `offset`.
	pub fn to_offset(self, offset: UtcOffset) -> Self {
		Self(self.0.to_offset(offset))
	}

	/// Returns the underlying timestamp.
	pub fn as_offset_date_time(&self) -> OffsetDateTime {
		self.0
	}

	/// Compact `yyMMddHHmm` form, coarse-grained to the minute.
	pub fn minute_key(&self) -> String {
		render(self.0, MINUTE_KEY)
	}

	/// Compact `yyyyMMddHHmm` form used as the artifact name prefix.
	pub fn artifact_stamp(&self) -> String {
		render(self.0, ARTIFACT_STAMP)
	}
}
impl From<OffsetDateTime> for ReferenceInstant {
	fn from(value: OffsetDateTime) -> Self {
		Self(value)
	}
}
impl Display for ReferenceInstant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&local_timestamp(self.0))
	}
}

/// Renders `yyyy-MM-ddTHH:mm:ss` in the value's own offset, without the offset itself.
pub fn local_timestamp(value: OffsetDateTime) -> String {
	render(value, LOCAL_TIMESTAMP)
}

// Every component named above exists on `OffsetDateTime`, so formatting cannot fail.
fn render(value: OffsetDateTime, description: &[BorrowedFormatItem]) -> String {
	value.format(description).unwrap_or_default()
}

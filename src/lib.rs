//! Login-ticket issuance client for WSAA-style authentication gateways: build a time-boxed
//! request, CMS-sign it, exchange it over SOAP, and archive every artifact for audit.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod config;
pub mod error;
pub mod exchange;
pub mod http;
pub mod issuer;
pub mod obs;
pub mod request;
pub mod sign;
pub mod store;
pub mod ticket;

mod xml;

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		path::{Path, PathBuf},
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime, UtcOffset};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "openssl")] pub use openssl;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use time;
pub use url;
#[cfg(feature = "cli")]
use {clap as _, dotenvy as _, serde_json as _, tokio as _, tracing_subscriber as _};
#[cfg(test)] use {color_eyre as _, httpmock as _};

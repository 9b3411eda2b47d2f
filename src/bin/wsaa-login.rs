//! `wsaa-login`: issue one login ticket and archive its artifacts.
//!
//! Settings come from the process environment (a `.env` file is loaded first) and can be
//! overridden on the command line. Diagnostics go to stderr; the artifact summary goes to
//! stdout.

// std
use std::{error::Error as _, process::ExitCode};
// crates.io
use clap::{Parser, ValueEnum};
use serde_json::json;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
// self
use wsaa_client::{
	config::{self, Config, ConfigBuilder},
	error::{Error, Result},
	issuer::{IssuedTicket, TicketIssuer},
	store::ArtifactName,
	ticket::local_timestamp,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
	Text,
	Json,
}

/// Request a login ticket from a WSAA-style authentication gateway.
#[derive(Debug, Parser)]
#[command(name = "wsaa-login", version, about)]
struct Cli {
	/// PEM certificate registered with the gateway
	#[arg(long, env = config::CERT_PATH)]
	cert_path: Option<String>,
	/// PEM private key matching the certificate
	#[arg(long, env = config::PRIVATE_KEY_PATH)]
	private_key_path: Option<String>,
	/// Business service the ticket is requested for
	#[arg(long, env = config::SERVICE_ID)]
	service_id: Option<String>,
	/// WSDL of the authentication endpoint
	#[arg(long, env = config::WSDL_URL)]
	wsdl_url: Option<String>,
	/// Logical prefix of the request artifact
	#[arg(long, env = config::XML_FILE)]
	xml_file: Option<String>,
	/// Directory receiving artifacts [default: .]
	#[arg(long, env = config::ARTIFACT_DIR)]
	artifact_dir: Option<String>,
	/// Signer backend: native or process
	#[arg(long, env = config::WSAA_SIGNER)]
	signer: Option<String>,
	/// openssl executable used by the process signer [default: openssl]
	#[arg(long, env = config::OPENSSL_BIN)]
	openssl_bin: Option<String>,
	/// Offset used to render timestamps, as ±HH:MM [default: +00:00]
	#[arg(long, env = config::WSAA_UTC_OFFSET)]
	utc_offset: Option<String>,
	/// Summary format
	#[arg(long, default_value = "text", value_enum)]
	output: OutputFormat,
}
impl Cli {
	fn setting(&self, name: &str) -> Option<String> {
		let value = match name {
			config::CERT_PATH => &self.cert_path,
			config::PRIVATE_KEY_PATH => &self.private_key_path,
			config::SERVICE_ID => &self.service_id,
			config::WSDL_URL => &self.wsdl_url,
			config::XML_FILE => &self.xml_file,
			config::ARTIFACT_DIR => &self.artifact_dir,
			config::WSAA_SIGNER => &self.signer,
			config::OPENSSL_BIN => &self.openssl_bin,
			config::WSAA_UTC_OFFSET => &self.utc_offset,
			_ => return None,
		};

		value.clone()
	}
}

#[tokio::main]
async fn main() -> ExitCode {
	let _ = dotenvy::dotenv();
	let cli = Cli::parse();

	init_tracing();

	match run(&cli).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("{}", diagnostic(&e));

			ExitCode::FAILURE
		},
	}
}

async fn run(cli: &Cli) -> Result<()> {
	let config = ConfigBuilder::default().overlay(|name| cli.setting(name)).build()?;
	let issuer = TicketIssuer::from_config(&config)?;
	let issued = issuer.issue(config.now()).await?;

	report(&config, &issued, cli.output);

	Ok(())
}

fn report(config: &Config, issued: &IssuedTicket, format: OutputFormat) {
	let path = |name: &ArtifactName| config.artifact_dir.join(name).display().to_string();
	let expires = match issued.response.login_ticket() {
		Ok(ticket) => Some(local_timestamp(ticket.expiration_time.to_offset(config.utc_offset))),
		Err(e) => {
			tracing::warn!(error = %e, "credential is not a readable login ticket");

			None
		},
	};

	match format {
		OutputFormat::Text => {
			println!("request:  {}", path(&issued.request_artifact));
			println!("payload:  {}", path(&issued.payload_artifact));
			println!("response: {}", path(&issued.response_artifact));
			println!("expires:  {}", expires.as_deref().unwrap_or("unknown"));
		},
		OutputFormat::Json => {
			let summary = json!({
				"unique_id": issued.instant.minute_key(),
				"request": path(&issued.request_artifact),
				"payload": path(&issued.payload_artifact),
				"response": path(&issued.response_artifact),
				"expires": expires,
			});

			println!("{summary}");
		},
	}
}

// One line: the error followed by every cause its message does not already include.
fn diagnostic(e: &Error) -> String {
	let mut line = format!("error: {e}");
	let mut cause = e.source();

	while let Some(current) = cause {
		let text = current.to_string();

		if !line.contains(&text) {
			line.push_str(" Caused by: ");
			line.push_str(&text);
		}

		cause = current.source();
	}

	line
}

fn init_tracing() {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	let _ = tracing_subscriber::registry()
		.with(filter)
		.with(fmt::layer().with_writer(std::io::stderr).with_target(false))
		.try_init();
}

#![cfg(feature = "openssl")]

mod common;

// std
use std::{fs, process::Command};
// self
use common::*;
use wsaa_client::sign::{NativeSigner, ProcessSigner, Signer};

fn openssl_available() -> bool {
	Command::new("openssl").arg("version").output().is_ok_and(|output| output.status.success())
}

#[test]
fn process_payload_verifies_like_a_native_one() {
	if !openssl_available() {
		eprintln!("openssl executable not found; skipping.");

		return;
	}

	let dir = temp_dir("process-round-trip");
	let identity = mint_identity(&dir.join("identity"), "process");
	let document = b"<loginTicketRequest><service>wsfe</service></loginTicketRequest>";
	let payload = ProcessSigner::new(dir.join("work"))
		.sign(document, &identity)
		.expect("openssl cms should sign the document.");
	let recovered = NativeSigner::verify(&payload, &identity.certificate_path)
		.expect("Process payload should verify against the certificate.");

	assert_eq!(recovered, document);

	let _ = fs::remove_dir_all(&dir);
}

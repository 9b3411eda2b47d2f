#![cfg(feature = "openssl")]

mod common;

// std
use std::fs;
// self
use common::*;
use wsaa_client::{
	error::SigningError,
	request::TicketRequest,
	sign::{NativeSigner, SignedPayload, Signer, SigningIdentity},
	ticket::{ReferenceInstant, ServiceId},
};

fn document() -> String {
	let service = ServiceId::new("wsfe").expect("Service identifier fixture should be valid.");
	let instant = ReferenceInstant::from_unix_millis(1_700_000_000_000)
		.expect("Fixture instant should be representable.");

	TicketRequest::build(&service, instant).to_xml()
}

#[test]
fn signed_payload_round_trips_through_verification() {
	let dir = temp_dir("native-round-trip");
	let identity = mint_identity(&dir, "round-trip");
	let document = document();
	let payload =
		NativeSigner.sign(document.as_bytes(), &identity).expect("Native signing should succeed.");
	let recovered = NativeSigner::verify(&payload, &identity.certificate_path)
		.expect("Payload should verify against its own certificate.");

	assert_eq!(recovered, document.as_bytes());

	// Line-wrapped copies, as produced by `openssl base64`, verify the same way.
	let lines: Vec<String> = payload
		.as_str()
		.as_bytes()
		.chunks(64)
		.map(|line| String::from_utf8_lossy(line).into_owned())
		.collect();
	let wrapped = SignedPayload::from_encoded(lines.join("\n"));

	assert_eq!(
		NativeSigner::verify(&wrapped, &identity.certificate_path)
			.expect("Wrapped payload should verify."),
		document.as_bytes()
	);

	let _ = fs::remove_dir_all(&dir);
}

#[test]
fn payload_does_not_verify_against_another_certificate() {
	let dir = temp_dir("native-foreign-cert");
	let signer_identity = mint_identity(&dir, "signer");
	let other_identity = mint_identity(&dir, "other");
	let payload = NativeSigner
		.sign(document().as_bytes(), &signer_identity)
		.expect("Native signing should succeed.");
	let err = NativeSigner::verify(&payload, &other_identity.certificate_path)
		.expect_err("A foreign certificate must not verify the payload.");

	assert!(matches!(err, SigningError::Verify { .. }));

	let _ = fs::remove_dir_all(&dir);
}

#[test]
fn mismatched_key_is_a_signing_error() {
	let dir = temp_dir("native-mismatch");
	let first = mint_identity(&dir, "first");
	let second = mint_identity(&dir, "second");
	let crossed = SigningIdentity::new(&first.certificate_path, &second.private_key_path);
	let err = NativeSigner
		.sign(document().as_bytes(), &crossed)
		.expect_err("A key that does not match the certificate must be rejected.");

	assert!(matches!(err, SigningError::Sign { .. }));

	let _ = fs::remove_dir_all(&dir);
}

#[test]
fn unreadable_identity_files_are_reported_with_their_path() {
	let dir = temp_dir("native-missing");
	let identity = SigningIdentity::new(dir.join("absent.crt"), dir.join("absent.key"));
	let err = NativeSigner
		.sign(document().as_bytes(), &identity)
		.expect_err("Missing identity files must be rejected.");

	match err {
		SigningError::Read { path, .. } => assert_eq!(path, dir.join("absent.crt")),
		other => panic!("Unexpected error: {other:?}."),
	}

	fs::create_dir_all(&dir).expect("Fixture directory should be creatable.");
	fs::write(dir.join("absent.crt"), "not a certificate").expect("Fixture should be writable.");

	assert!(matches!(
		NativeSigner.sign(document().as_bytes(), &identity),
		Err(SigningError::Identity { .. })
	));

	let _ = fs::remove_dir_all(&dir);
}

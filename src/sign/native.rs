//! In-process CMS signing backed by the `openssl` crate.

// std
use std::fs;
// crates.io
use openssl::{
	cms::{CMSOptions, CmsContentInfo},
	pkey::{PKey, Private},
	stack::Stack,
	x509::X509,
};
// self
use crate::{
	_prelude::*,
	error::SigningError,
	sign::{SignedPayload, Signer, SigningIdentity},
};

/// Signs documents in-process, embedding the content in a binary-mode CMS `SignedData`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeSigner;
impl NativeSigner {
	/// Verifies `payload` against the certificate at `certificate_path` and returns the
	/// embedded document.
	///
	/// Only the signature is checked: the certificate chain is not validated, since the
	/// gateway's issuing authority is rarely installed locally.
	pub fn verify(
		payload: &SignedPayload,
		certificate_path: &Path,
	) -> Result<Vec<u8>, SigningError> {
		let der = payload.decode()?;
		let mut cms = CmsContentInfo::from_der(&der)
			.map_err(|e| SigningError::Verify { message: e.to_string() })?;
		let certificate = load_certificate(certificate_path)?;
		let mut certs =
			Stack::new().map_err(|e| SigningError::Verify { message: e.to_string() })?;

		certs.push(certificate).map_err(|e| SigningError::Verify { message: e.to_string() })?;

		let mut content = Vec::new();

		cms.verify(
			Some(&*certs),
			None,
			None,
			Some(&mut content),
			CMSOptions::BINARY | CMSOptions::NOINTERN | CMSOptions::NO_SIGNER_CERT_VERIFY,
		)
		.map_err(|e| SigningError::Verify { message: e.to_string() })?;

		Ok(content)
	}
}
impl Signer for NativeSigner {
	fn sign(
		&self,
		document: &[u8],
		identity: &SigningIdentity,
	) -> Result<SignedPayload, SigningError> {
		let certificate = load_certificate(&identity.certificate_path)?;
		let key = load_private_key(&identity.private_key_path)?;
		let cms = CmsContentInfo::sign(
			Some(&*certificate),
			Some(&*key),
			None,
			Some(document),
			CMSOptions::BINARY,
		)
		.map_err(|e| SigningError::Sign { message: e.to_string() })?;
		let der = cms.to_der().map_err(|e| SigningError::Encode { message: e.to_string() })?;

		Ok(SignedPayload::from_der(&der))
	}
}

fn read(path: &Path) -> Result<Vec<u8>, SigningError> {
	fs::read(path).map_err(|source| SigningError::Read { path: path.to_owned(), source })
}

fn load_certificate(path: &Path) -> Result<X509, SigningError> {
	X509::from_pem(&read(path)?).map_err(|e| SigningError::Identity {
		message: format!("certificate {} is not valid PEM: {e}", path.display()),
	})
}

fn load_private_key(path: &Path) -> Result<PKey<Private>, SigningError> {
	PKey::private_key_from_pem(&read(path)?).map_err(|e| SigningError::Identity {
		message: format!("private key {} is not valid PEM: {e}", path.display()),
	})
}

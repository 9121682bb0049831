//! Certificate building for CertDepot
//!
//! Validates structured certificate requests and produces
//! password-protected PKCS#12 archives containing a freshly generated
//! RSA-2048 key and a matching self-signed X.509 certificate.

pub mod builder;
pub mod request;

pub use builder::{build, BuildError, BuiltCertificate};
pub use request::{CertificateRequest, CertificateRequestInput, ExpirationInput, ValidationErrors};

//! PKCS#12 certificate construction
//!
//! Takes a validated [`CertificateRequest`] and produces the archive
//! bytes: a fresh RSA-2048 key pair, a self-signed X.509 certificate
//! carrying the owner's distinguished name, and a password-encrypted
//! PKCS#12 bundle of the two.

use p12_keystore::{Certificate as KeyStoreCertificate, KeyStore, KeyStoreEntry, PrivateKeyChain};
use rand::rngs::OsRng;
use rand::RngCore;
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair, SerialNumber, PKCS_RSA_SHA256};
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::RsaPrivateKey;
use thiserror::Error;
use time::{Duration, OffsetDateTime};

use crate::request::CertificateRequest;

/// Key size for generated certificates.
const RSA_KEY_BITS: usize = 2048;

/// Error types for certificate construction
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Failed to generate RSA key pair: {0}")]
    KeyGeneration(String),

    #[error("Failed to encode private key: {0}")]
    KeyEncoding(String),

    #[error("Failed to build certificate: {0}")]
    Certificate(#[from] rcgen::Error),

    #[error("Failed to package PKCS#12 archive: {0}")]
    Packaging(String),
}

/// A finished certificate bundle, ready for a single store insert.
#[derive(Debug, Clone)]
pub struct BuiltCertificate {
    /// Requested name with the `.p12` extension appended
    pub filename: String,
    /// PKCS#12 archive bytes, encrypted with the request password
    pub payload: Vec<u8>,
}

/// Generate the key pair and self-signed certificate described by
/// `request` and package them as a password-protected PKCS#12 archive.
///
/// The only side effect is CPU time for the RSA key generation;
/// persisting the result is the caller's job.
pub fn build(request: &CertificateRequest) -> Result<BuiltCertificate, BuildError> {
    tracing::debug!(
        filename = %request.filename,
        expiration_days = request.expiration,
        "Building certificate"
    );

    let private_key = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS)
        .map_err(|e| BuildError::KeyGeneration(e.to_string()))?;

    let key_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| BuildError::KeyEncoding(e.to_string()))?;
    let key_der = private_key
        .to_pkcs8_der()
        .map_err(|e| BuildError::KeyEncoding(e.to_string()))?;

    // rcgen signs with the imported RSA key; it cannot generate one itself.
    let key_pair = KeyPair::from_pem_and_sign_algo(&key_pem, &PKCS_RSA_SHA256)?;

    let mut params = CertificateParams::default();
    params.distinguished_name = subject_dn(request);
    let not_before = OffsetDateTime::now_utc();
    params.not_before = not_before;
    params.not_after = not_before + Duration::days(request.expiration);
    params.serial_number = Some(SerialNumber::from(random_serial()));

    let certificate = params.self_signed(&key_pair)?;

    let payload = package_pkcs12(
        key_der.as_bytes(),
        certificate.der(),
        &request.full_name,
        &request.password,
    )?;

    Ok(BuiltCertificate {
        filename: format!("{}.p12", request.filename),
        payload,
    })
}

/// Subject distinguished name: C/ST/L/O/OU/CN from the owner fields.
/// The certificate is self-signed, so the issuer is the same name.
fn subject_dn(request: &CertificateRequest) -> DistinguishedName {
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CountryName, request.country_code.to_uppercase());
    dn.push(DnType::StateOrProvinceName, &request.region);
    dn.push(DnType::LocalityName, &request.city);
    dn.push(DnType::OrganizationName, &request.organization);
    dn.push(DnType::OrganizationalUnitName, &request.department);
    dn.push(DnType::CommonName, &request.full_name);
    dn
}

fn random_serial() -> Vec<u8> {
    let mut serial = [0u8; 16];
    OsRng.fill_bytes(&mut serial);
    serial.to_vec()
}

fn package_pkcs12(
    key_der: &[u8],
    cert_der: &[u8],
    alias: &str,
    password: &str,
) -> Result<Vec<u8>, BuildError> {
    let certificate = KeyStoreCertificate::from_der(cert_der)
        .map_err(|e| BuildError::Packaging(e.to_string()))?;

    let mut local_key_id = [0u8; 20];
    OsRng.fill_bytes(&mut local_key_id);

    let key_chain = PrivateKeyChain::new(key_der.to_vec(), local_key_id.to_vec(), vec![certificate]);

    let mut keystore = KeyStore::new();
    keystore.add_entry(alias, KeyStoreEntry::PrivateKeyChain(key_chain));

    keystore
        .writer(password)
        .write()
        .map_err(|e| BuildError::Packaging(e.to_string()))
}

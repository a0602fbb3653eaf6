//! TLS acceptor/connector setup for ADCS/NMDCS (§4.2.4, feature `tls`).
//!
//! Unlike a web client, a DC hub or C-C peer has no CA-issued
//! certificate to check against: identity is established by the
//! protocol (CID handshake, hub fingerprint pinning) rather than by the
//! TLS layer, so the client connector accepts any certificate the peer
//! presents. The server (C-C listener) side presents a long-lived
//! self-signed certificate that the caller loads from disk; generating
//! and persisting that certificate is outside this crate.

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, ServerConfig, SignatureScheme};
use std::io;
use std::path::Path;
use std::sync::Arc;
use tokio_rustls::{TlsAcceptor, TlsConnector};

/// Accepts any certificate chain and signature without verification.
///
/// DC TLS does not rely on a certificate authority; callers that need
/// peer authentication do it above this layer (CID handshake, hub
/// fingerprint pinning, §4.2.4).
#[derive(Debug)]
struct AcceptAnyCertificate;

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::ED25519,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
        ]
    }
}

/// Builds the [`TlsConnector`] used for outgoing ADCS/NMDCS connections
/// (hub connects and active C-C dials), which trusts whatever
/// certificate the peer presents.
#[must_use]
pub fn connector() -> TlsConnector {
    let config = ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate))
        .with_no_client_auth();
    TlsConnector::from(Arc::new(config))
}

/// Builds the [`TlsAcceptor`] used for the incoming C-C listener, from a
/// PEM certificate chain and private key on disk.
///
/// # Errors
///
/// Returns an I/O error if the files can't be read or parsed, or a
/// `rustls` configuration error if the key doesn't match a supported
/// scheme.
pub async fn acceptor(cert_path: &Path, key_path: &Path) -> io::Result<TlsAcceptor> {
    let cert_bytes = tokio::fs::read(cert_path).await?;
    let key_bytes = tokio::fs::read(key_path).await?;

    let mut cert_reader = io::BufReader::new(cert_bytes.as_slice());
    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut cert_reader)
        .collect::<Result<_, _>>()
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;

    let mut key_reader = io::BufReader::new(key_bytes.as_slice());
    let key: PrivateKeyDer<'static> = rustls_pemfile::private_key(&mut key_reader)?
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "no private key found"))?;

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}

/// Installs the process-wide default `rustls` crypto provider.
///
/// `rustls` 0.23 resolves `ClientConfig`/`ServerConfig` builders against
/// whatever provider was installed process-wide; exactly one call must
/// succeed before [`connector`] or [`acceptor`] run. The app entry point
/// calls this once at start-up. A second call (e.g. in a test that
/// shares the process with others) is tolerated and simply ignored.
pub fn install_default_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

/// Builds an empty [`RootCertStore`] for callers that want the stricter,
/// CA-validated [`ClientConfig`] path instead of [`connector`] (e.g. a
/// hub operator's own pinned CA bundle). Unused by the default DC
/// handshake, which has no CA infrastructure to validate against.
#[must_use]
pub fn empty_root_store() -> RootCertStore {
    RootCertStore::empty()
}

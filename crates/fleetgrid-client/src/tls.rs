//! TLS client configuration.
//!
//! Trusts the Mozilla root store, optionally extended with a PEM bundle for
//! services that present a private CA. Verification can be switched off for
//! self-signed service certificates; that path always logs a warning.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use crate::error::{ClientError, ClientResult};

/// Configuration for TLS connections.
#[derive(Clone)]
pub struct TlsConfig {
    /// Pre-built `rustls` client configuration.
    pub client_config: Arc<rustls::ClientConfig>,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig").finish_non_exhaustive()
    }
}

impl TlsConfig {
    /// Mozilla roots, plus the certificates in `ca_bundle` if given.
    pub fn with_roots(ca_bundle: Option<&Path>) -> ClientResult<Self> {
        let mut root_store = rustls::RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        if let Some(path) = ca_bundle {
            let file = File::open(path).map_err(|source| ClientError::File {
                path: path.display().to_string(),
                source,
            })?;
            let mut reader = BufReader::new(file);
            for cert in rustls_pemfile::certs(&mut reader) {
                let cert = cert.map_err(|source| ClientError::File {
                    path: path.display().to_string(),
                    source,
                })?;
                root_store
                    .add(cert)
                    .map_err(|e| ClientError::Tls(format!("bad certificate in {}: {e}", path.display())))?;
            }
        }

        let config = rustls::ClientConfig::builder_with_provider(
            rustls::crypto::ring::default_provider().into(),
        )
        .with_safe_default_protocol_versions()
        .map_err(|e| ClientError::Tls(format!("tls protocol version error: {e}")))?
        .with_root_certificates(root_store)
        .with_no_client_auth();

        Ok(Self {
            client_config: Arc::new(config),
        })
    }

    /// Accept any server certificate.
    pub fn without_verification() -> ClientResult<Self> {
        warn!("tls certificate verification disabled");

        let config = rustls::ClientConfig::builder_with_provider(
            rustls::crypto::ring::default_provider().into(),
        )
        .with_safe_default_protocol_versions()
        .map_err(|e| ClientError::Tls(format!("tls protocol version error: {e}")))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(danger::NoVerifier))
        .with_no_client_auth();

        Ok(Self {
            client_config: Arc::new(config),
        })
    }

    /// Pick the configuration matching the service settings.
    pub fn for_service(verify_certificates: bool, ca_bundle: Option<&Path>) -> ClientResult<Self> {
        if verify_certificates {
            Self::with_roots(ca_bundle)
        } else {
            Self::without_verification()
        }
    }
}

mod danger {
    use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
    use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
    use rustls::{DigitallySignedStruct, Error, SignatureScheme};

    #[derive(Debug)]
    pub struct NoVerifier;

    impl ServerCertVerifier for NoVerifier {
        fn verify_server_cert(
            &self,
            _end_entity: &CertificateDer<'_>,
            _intermediates: &[CertificateDer<'_>],
            _server_name: &ServerName<'_>,
            _ocsp_response: &[u8],
            _now: UnixTime,
        ) -> Result<ServerCertVerified, Error> {
            Ok(ServerCertVerified::assertion())
        }

        fn verify_tls12_signature(
            &self,
            _message: &[u8],
            _cert: &CertificateDer<'_>,
            _dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, Error> {
            Ok(HandshakeSignatureValid::assertion())
        }

        fn verify_tls13_signature(
            &self,
            _message: &[u8],
            _cert: &CertificateDer<'_>,
            _dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, Error> {
            Ok(HandshakeSignatureValid::assertion())
        }

        fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
            rustls::crypto::ring::default_provider()
                .signature_verification_algorithms
                .supported_schemes()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_roots_build() {
        assert!(TlsConfig::with_roots(None).is_ok());
    }

    #[test]
    fn unverified_config_builds() {
        assert!(TlsConfig::for_service(false, None).is_ok());
    }

    #[test]
    fn missing_ca_bundle_is_reported() {
        let err = TlsConfig::with_roots(Some(Path::new("/nonexistent/ca.pem"))).unwrap_err();
        assert!(matches!(err, ClientError::File { .. }));
    }

    #[test]
    fn empty_ca_bundle_adds_nothing() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(TlsConfig::with_roots(Some(file.path())).is_ok());
    }
}

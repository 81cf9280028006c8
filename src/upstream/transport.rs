//! Outbound transport construction.
//!
//! # Responsibilities
//! - Build one pooled HTTP(S) client per upstream
//! - Apply the upstream's certificate trust policy
//! - Apply pool limits, idle reclamation and connect timeout
//!
//! # Design Decisions
//! - Each upstream owns its client; pools are never shared across origins
//! - Skipping verification is opt-in per upstream and logged at startup
//! - HTTP/1.1 only towards upstreams

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::{TokioExecutor, TokioTimer};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{aws_lc_rs, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};

use crate::config::{UpstreamConfig, UpstreamTrust};
use crate::upstream::RegistryError;

/// Pooled client used to reach one upstream.
pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Build the pooled client for an upstream.
pub fn build_client(config: &UpstreamConfig) -> Result<UpstreamClient, RegistryError> {
    let tls = client_tls_config(&config.name, config.trust)?;

    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(Duration::from_secs(config.connect_timeout_secs)));

    let connector = HttpsConnectorBuilder::new()
        .with_tls_config(tls)
        .https_or_http()
        .enable_http1()
        .wrap_connector(http);

    Ok(Client::builder(TokioExecutor::new())
        .pool_max_idle_per_host(config.max_idle_connections)
        .pool_idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .pool_timer(TokioTimer::new())
        .build(connector))
}

/// rustls client configuration for the given trust policy.
pub fn client_tls_config(name: &str, trust: UpstreamTrust) -> Result<ClientConfig, RegistryError> {
    let provider = Arc::new(aws_lc_rs::default_provider());
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|source| RegistryError::Tls {
            name: name.to_string(),
            source,
        })?;

    let config = match trust {
        UpstreamTrust::Verify => builder
            .with_root_certificates(native_roots(name))
            .with_no_client_auth(),
        UpstreamTrust::SkipVerify => {
            tracing::warn!(upstream = %name, "Certificate verification disabled for upstream");
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(SkipServerVerification::new(provider)))
                .with_no_client_auth()
        }
    };
    Ok(config)
}

fn native_roots(name: &str) -> RootCertStore {
    let mut roots = RootCertStore::empty();
    let native = rustls_native_certs::load_native_certs();
    for err in &native.errors {
        tracing::warn!(upstream = %name, error = %err, "Failed to load a platform root certificate");
    }
    let (added, ignored) = roots.add_parsable_certificates(native.certs);
    tracing::debug!(upstream = %name, added, ignored, "Loaded platform trust store");
    roots
}

/// Accepts any server certificate while still checking handshake signatures.
#[derive(Debug)]
pub struct SkipServerVerification(Arc<CryptoProvider>);

impl SkipServerVerification {
    pub fn new(provider: Arc<CryptoProvider>) -> Self {
        Self(provider)
    }
}

impl ServerCertVerifier for SkipServerVerification {
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
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

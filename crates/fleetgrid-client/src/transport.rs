//! Blocking HTTP/1.1 transport.
//!
//! Opens one connection per request (plain TCP or rustls) and drives hyper
//! on a private current-thread runtime. Must not be called from inside an
//! async context.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use bytes::Bytes;
use http::{header, HeaderValue, Method, Request, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::debug;

use fleet_core::ServiceConfig;

use crate::error::{ClientError, ClientResult};
use crate::tls::TlsConfig;

const USER_AGENT: &str = concat!("fleetgrid/", env!("CARGO_PKG_VERSION"));

/// Request body variants the service accepts.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(Vec<u8>),
    /// `application/x-www-form-urlencoded` pairs.
    Form(Vec<(String, String)>),
}

/// Connection details resolved from the service URL.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Endpoint {
    https: bool,
    host: String,
    port: u16,
    /// Path prefix without a trailing slash ("" or "/cyclecloud").
    base_path: String,
}

impl Endpoint {
    fn parse(url: &str) -> ClientResult<Self> {
        let invalid = |reason: &str| ClientError::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let uri: Uri = url.trim().parse().map_err(|_| invalid("not a valid URI"))?;
        let https = match uri.scheme_str() {
            Some("https") => true,
            Some("http") => false,
            Some(_) => return Err(invalid("scheme must be http or https")),
            None => return Err(invalid("missing scheme")),
        };
        let host = uri
            .host()
            .ok_or_else(|| invalid("missing host"))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let port = uri.port_u16().unwrap_or(if https { 443 } else { 80 });
        let base_path = uri.path().trim_end_matches('/').to_string();

        Ok(Self {
            https,
            host,
            port,
            base_path,
        })
    }

    fn host_header(&self) -> String {
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        let default_port = if self.https { 443 } else { 80 };
        if self.port == default_port {
            host
        } else {
            format!("{host}:{}", self.port)
        }
    }
}

/// Sends authenticated requests to one service endpoint.
pub struct Transport {
    endpoint: Endpoint,
    authorization: HeaderValue,
    tls: Option<TlsConfig>,
    timeout: Duration,
    runtime: tokio::runtime::Runtime,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("endpoint", &self.endpoint)
            .field("tls", &self.tls.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Transport {
    pub fn new(config: &ServiceConfig) -> ClientResult<Self> {
        let endpoint = Endpoint::parse(&config.url)?;
        let password = config
            .password
            .as_deref()
            .ok_or_else(|| ClientError::MissingPassword(config.username.clone()))?;

        let credentials = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{password}", config.username));
        let mut authorization = HeaderValue::from_str(&format!("Basic {credentials}"))
            .map_err(|e| ClientError::InvalidUrl {
                url: config.url.clone(),
                reason: format!("unusable credentials: {e}"),
            })?;
        authorization.set_sensitive(true);

        let tls = if endpoint.https {
            Some(TlsConfig::for_service(
                config.verify_certificates,
                config.ca_cert.as_deref(),
            )?)
        } else {
            None
        };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ClientError::Runtime)?;

        Ok(Self {
            endpoint,
            authorization,
            tls,
            timeout: config.request_timeout()?,
            runtime,
        })
    }

    pub fn get(&self, path: &str, query: &[(&str, String)]) -> ClientResult<Bytes> {
        self.send(Method::GET, path, query, RequestBody::Empty)
    }

    pub fn post(&self, path: &str, query: &[(&str, String)], body: RequestBody) -> ClientResult<Bytes> {
        self.send(Method::POST, path, query, body)
    }

    fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: RequestBody,
    ) -> ClientResult<Bytes> {
        let target = self.target(path, query);
        debug!(%method, %target, "sending request");

        let request = self.build_request(method.clone(), &target, body)?;
        let (status, bytes) = self
            .runtime
            .block_on(async { tokio::time::timeout(self.timeout, self.exchange(request)).await })
            .map_err(|_| ClientError::Timeout(target.clone()))??;

        debug!(%method, %target, status = status.as_u16(), bytes = bytes.len(), "response received");

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).trim().to_string(),
            });
        }
        Ok(bytes)
    }

    /// Origin-form request target: base path, path, encoded query.
    fn target(&self, path: &str, query: &[(&str, String)]) -> String {
        let mut target = format!("{}{}", self.endpoint.base_path, path);
        if !query.is_empty() {
            target.push('?');
            target.push_str(&encode_pairs(query.iter().map(|(k, v)| (*k, v.as_str()))));
        }
        target
    }

    fn build_request(
        &self,
        method: Method,
        target: &str,
        body: RequestBody,
    ) -> ClientResult<Request<Full<Bytes>>> {
        let builder = Request::builder()
            .method(method)
            .uri(target)
            .header(header::HOST, self.endpoint.host_header())
            .header(header::AUTHORIZATION, self.authorization.clone())
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, USER_AGENT);

        let request = match body {
            RequestBody::Empty => builder.body(Full::new(Bytes::new()))?,
            RequestBody::Json(bytes) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Full::new(Bytes::from(bytes)))?,
            RequestBody::Form(pairs) => builder
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Full::new(Bytes::from(encode_pairs(
                    pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
                ))))?,
        };
        Ok(request)
    }

    async fn exchange(&self, request: Request<Full<Bytes>>) -> ClientResult<(StatusCode, Bytes)> {
        let addr = format!("{}:{}", self.endpoint.host, self.endpoint.port);
        let tcp = TcpStream::connect((self.endpoint.host.as_str(), self.endpoint.port))
            .await
            .map_err(|source| ClientError::Connect {
                addr: addr.clone(),
                source,
            })?;
        let _ = tcp.set_nodelay(true);

        match &self.tls {
            Some(tls) => {
                let server_name =
                    rustls::pki_types::ServerName::try_from(self.endpoint.host.clone())
                        .map_err(|e| {
                            ClientError::Tls(format!("invalid server name '{}': {e}", self.endpoint.host))
                        })?;
                let connector = tokio_rustls::TlsConnector::from(Arc::clone(&tls.client_config));
                let stream = connector
                    .connect(server_name, tcp)
                    .await
                    .map_err(|source| ClientError::Connect { addr, source })?;
                roundtrip(stream, request).await
            }
            None => roundtrip(tcp, request).await,
        }
    }
}

async fn roundtrip<S>(stream: S, request: Request<Full<Bytes>>) -> ClientResult<(StatusCode, Bytes)>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let io = TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;

    // Drive the connection in the background.
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!(error = %e, "connection closed with error");
        }
    });

    let response = sender.send_request(request).await?;
    let status = response.status();
    let body = response.into_body().collect().await?.to_bytes();
    Ok((status, body))
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
pub fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

fn encode_pairs<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    pairs
        .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
        .collect::<Vec<_>>()
        .join("&")
}

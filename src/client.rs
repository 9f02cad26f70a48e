//! Status client for the supervisord unix socket.
//!
//! One call to [`StatusClient::get_stats`] performs exactly one HTTP/1.0
//! request/response exchange over a freshly dialed socket and decodes the
//! body into [`ProcessRecord`]s. There is no retry, pooling, or backoff here;
//! the caller decides what to do with a failed cycle.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::{debug, error, instrument};

use crate::config::Config;
use crate::error::{ClientError, ConfigError};
use crate::stats::{parse_status_response, ProcessRecord};

/// Initial size of the per-client response buffer.
const INITIAL_BUFFER_BYTES: usize = 64 * 1024;

/// Responses larger than this are rejected instead of growing the buffer further.
const MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Extracts the socket path from a `unix://` or `unix:` endpoint.
pub fn socket_path_from_endpoint(endpoint: &str) -> Result<PathBuf, ConfigError> {
    let path = endpoint
        .strip_prefix("unix")
        .and_then(|rest| rest.strip_prefix("://").or_else(|| rest.strip_prefix(':')))
        .ok_or_else(|| ConfigError::MissingUnixPrefix(endpoint.to_string()))?;

    if path.is_empty() {
        return Err(ConfigError::EmptySocketPath(endpoint.to_string()));
    }
    Ok(PathBuf::from(path))
}

/// Verifies that the socket path exists and can be stat'ed.
pub fn check_socket_reachable(path: &Path) -> Result<(), ConfigError> {
    std::fs::metadata(path)
        .map(|_| ())
        .map_err(|e| ConfigError::UnreachableSocket {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}

/// Client owning the connection settings and scratch buffer for one scraper.
pub struct StatusClient {
    host: String,
    socket_path: PathBuf,
    status_path: String,
    authorization: Option<String>,
    timeout: Duration,
    max_response_bytes: usize,
    buffer: Vec<u8>,
}

impl StatusClient {
    /// Creates a client for the endpoint in `cfg`.
    ///
    /// Fails when the endpoint lacks the `unix` prefix or the socket path
    /// cannot be reached.
    pub fn new(cfg: &Config) -> Result<Self, ConfigError> {
        let socket_path = socket_path_from_endpoint(cfg.endpoint())?;
        check_socket_reachable(&socket_path)?;

        let authorization = cfg
            .credentials()
            .map(|(user, pass)| format!("Basic {}", BASE64.encode(format!("{user}:{pass}"))));

        debug!(
            "Status client created for {} (auth: {})",
            socket_path.display(),
            authorization.is_some()
        );

        Ok(Self {
            host: cfg.endpoint().to_string(),
            socket_path,
            status_path: cfg.status_path().to_string(),
            authorization,
            timeout: cfg.request_timeout(),
            max_response_bytes: MAX_RESPONSE_BYTES,
            buffer: Vec::with_capacity(INITIAL_BUFFER_BYTES),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Current capacity of the scratch buffer.
    pub fn buffer_capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Fetches and decodes the status of every supervised process.
    #[instrument(skip(self), fields(host = %self.host))]
    pub async fn get_stats(&mut self) -> Result<Vec<ProcessRecord>, ClientError> {
        let outcome = tokio::time::timeout(self.timeout, self.exchange()).await;
        let result = match outcome {
            Ok(result) => result,
            Err(_) => Err(ClientError::Transport {
                host: self.host.clone(),
                reason: format!("request timed out after {:?}", self.timeout),
            }),
        }
        .and_then(|body| parse_status_response(&self.buffer[body]));

        match &result {
            Ok(records) => debug!("Received {} process records", records.len()),
            Err(e) => error!(host = %self.host, reason = %e, "supervisord status request failed"),
        }
        result
    }

    /// Sends the request and reads the full response into the scratch buffer.
    /// Returns the byte range of the body on a 2xx response.
    async fn exchange(&mut self) -> Result<Range<usize>, ClientError> {
        let transport = |e: std::io::Error| ClientError::Transport {
            host: self.host.clone(),
            reason: e.to_string(),
        };

        let mut stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(transport)?;
        stream
            .write_all(self.request().as_bytes())
            .await
            .map_err(transport)?;

        self.buffer.clear();
        let limit = (self.max_response_bytes + 1) as u64;
        (&mut stream)
            .take(limit)
            .read_to_end(&mut self.buffer)
            .await
            .map_err(transport)?;

        if self.buffer.len() > self.max_response_bytes {
            return Err(ClientError::MalformedResponse {
                host: self.host.clone(),
                reason: format!("response exceeds {} bytes", self.max_response_bytes),
            });
        }

        let (status, body) =
            parse_http_response(&self.buffer).map_err(|reason| ClientError::MalformedResponse {
                host: self.host.clone(),
                reason,
            })?;

        if !(200..300).contains(&status) {
            return Err(ClientError::Status {
                host: self.host.clone(),
                status,
            });
        }
        Ok(body)
    }

    fn request(&self) -> String {
        let mut req = format!(
            "GET {} HTTP/1.0\r\nHost: localhost\r\nUser-Agent: {}\r\nAccept: text/xml\r\nConnection: close\r\n",
            self.status_path, USER_AGENT
        );
        if let Some(auth) = &self.authorization {
            req.push_str("Authorization: ");
            req.push_str(auth);
            req.push_str("\r\n");
        }
        req.push_str("\r\n");
        req
    }
}

/// Splits a raw HTTP/1.x response into its status code and body range.
fn parse_http_response(buf: &[u8]) -> Result<(u16, Range<usize>), String> {
    let head_end = buf
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .ok_or_else(|| "response has no header terminator".to_string())?;
    let head = std::str::from_utf8(&buf[..head_end])
        .map_err(|_| "response headers are not valid UTF-8".to_string())?;

    let mut lines = head.split("\r\n");
    let status_line = lines.next().unwrap_or_default();
    let mut parts = status_line.split_whitespace();
    match parts.next() {
        Some(version) if version.starts_with("HTTP/1.") => {}
        _ => return Err(format!("invalid status line '{}'", status_line)),
    }
    let status = parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| format!("invalid status line '{}'", status_line))?;

    let body_start = head_end + 4;
    let mut body_end = buf.len();

    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-length") {
            let len: usize = value
                .parse()
                .map_err(|_| format!("invalid Content-Length '{}'", value))?;
            body_end = body_start
                .checked_add(len)
                .filter(|&end| end <= buf.len())
                .ok_or_else(|| {
                    format!(
                        "body truncated: expected {} bytes, got {}",
                        len,
                        buf.len() - body_start
                    )
                })?;
        } else if name.eq_ignore_ascii_case("transfer-encoding")
            && !value.eq_ignore_ascii_case("identity")
        {
            return Err(format!("unsupported transfer encoding '{}'", value));
        }
    }

    Ok((status, body_start..body_end))
}

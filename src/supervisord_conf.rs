//! Import of connection settings from supervisord's own configuration file.
//!
//! Only the keys the exporter needs are read: `serverurl`, `username` and
//! `password` from `[supervisorctl]`, falling back to `file`, `username` and
//! `password` from `[unix_http_server]`. Everything else in the file is
//! ignored.

use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::ConfigError;

/// Connection settings found in a supervisord.conf.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupervisordConf {
    pub endpoint: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Default)]
struct Section {
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

/// Reads and parses the supervisord.conf at `path`.
pub fn read_supervisord_conf(path: &Path) -> Result<SupervisordConf, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let conf = parse_supervisord_conf(&content);
    debug!(
        "Imported from {}: endpoint={:?} credentials={}",
        path.display(),
        conf.endpoint,
        conf.username.is_some()
    );
    Ok(conf)
}

/// Parses INI-style supervisord configuration text.
pub fn parse_supervisord_conf(content: &str) -> SupervisordConf {
    let mut ctl = Section::default();
    let mut server = Section::default();
    let mut current: Option<&str> = None;

    for raw in content.lines() {
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            current = Some(match name.trim() {
                "supervisorctl" => "supervisorctl",
                "unix_http_server" => "unix_http_server",
                _ => "",
            });
            continue;
        }

        let Some(idx) = line.find(['=', ':']) else {
            continue;
        };
        let key = line[..idx].trim();
        let value = line[idx + 1..].trim().to_string();
        if value.is_empty() {
            continue;
        }

        let section = match current {
            Some("supervisorctl") => &mut ctl,
            Some("unix_http_server") => &mut server,
            _ => continue,
        };
        match (current, key) {
            (Some("supervisorctl"), "serverurl") => {
                if value.starts_with("unix:") {
                    section.url = Some(value);
                } else {
                    warn!("Ignoring non-unix serverurl '{}' in supervisord config", value);
                }
            }
            (Some("unix_http_server"), "file") => section.url = Some(format!("unix://{}", value)),
            (_, "username") => section.username = Some(value),
            (_, "password") => section.password = Some(value),
            _ => {}
        }
    }

    // A hashed password on the server side is useless to a client.
    if server
        .password
        .as_deref()
        .is_some_and(|p| p.starts_with("{SHA}"))
    {
        server.password = None;
    }

    let (username, password) = match (ctl.username, ctl.password) {
        (Some(u), Some(p)) => (Some(u), Some(p)),
        _ => match (server.username, server.password) {
            (Some(u), Some(p)) => (Some(u), Some(p)),
            _ => (None, None),
        },
    };

    SupervisordConf {
        endpoint: ctl.url.or(server.url),
        username,
        password,
    }
}

/// Drops a full-line comment or an inline ` ;` comment.
fn strip_comment(line: &str) -> &str {
    let trimmed = line.trim_start();
    if trimmed.starts_with(';') || trimmed.starts_with('#') {
        return "";
    }
    match line.find(" ;") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

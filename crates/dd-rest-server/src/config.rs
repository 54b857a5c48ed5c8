// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Server configuration

use std::net::SocketAddr;

/// Server configuration
///
/// Built once at startup (from CLI flags and environment) and passed by
/// reference into the components that need it; core logic reads no
/// ambient environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,

    /// Shared secret expected in the `x-api-key` header. When unset,
    /// every deploy request is rejected.
    pub api_key: Option<String>,

    /// Upper bound on request body size
    pub max_body_bytes: usize,

    /// Reconcile the working copy once at startup (non-fatal)
    pub warm_start: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:4000".parse().unwrap(),
            api_key: None,
            max_body_bytes: 50 * 1024 * 1024,
            warm_start: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        fs::{File, metadata},
        io::Write,
        path::PathBuf,
    };

    struct TestLog {
        path: PathBuf,
        file: File,
    }

    impl TestLog {
        fn new(name: &str) -> Self {
            let mut path = std::env::temp_dir();
            path.push(format!("dd-rest-server-{}-{}.log", name, std::process::id()));
            let file = File::create(&path).expect("create log file");
            Self { path, file }
        }

        fn record(&mut self, msg: &str) {
            writeln!(self.file, "{}", msg).expect("write log line");
        }
    }

    impl Drop for TestLog {
        fn drop(&mut self) {
            if std::thread::panicking() {
                if let Ok(meta) = metadata(&self.path) {
                    eprintln!(
                        "test log available at {} ({} bytes)",
                        self.path.display(),
                        meta.len()
                    );
                } else {
                    eprintln!("test log available at {}", self.path.display());
                }
            }
        }
    }

    #[test]
    fn server_config_defaults() {
        let mut log = TestLog::new("server_config_defaults");
        let config = ServerConfig::default();
        log.record(&format!("defaults: {:?}", config));

        assert_eq!(config.bind_addr, "0.0.0.0:4000".parse().unwrap());
        assert!(
            config.api_key.is_none(),
            "no key is configured until the operator provides one"
        );
        assert_eq!(config.max_body_bytes, 50 * 1024 * 1024);
        assert!(config.warm_start);
    }
}

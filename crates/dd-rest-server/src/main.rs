// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! drydock deploy-receiver server binary

use anyhow::Context;
use clap::Parser;
use dd_logging::{CliLogLevel, Level, LogFormat};
use dd_repo::{RemoteTarget, RepoConfig};
use dd_rest_server::{Server, ServerConfig};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Listen port
    #[arg(long, env = "PORT", default_value_t = 4000)]
    port: u16,

    /// Shared secret expected in the x-api-key header
    #[arg(long, env = "SITE_B_API_KEY")]
    api_key: Option<String>,

    /// Access token embedded into the remote URL for push access
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Remote repository in owner/name form
    #[arg(long, env = "GIT_REPO")]
    git_repo: Option<String>,

    /// Full remote URL, overriding --git-repo/--github-token (self-hosted
    /// or local remotes)
    #[arg(long, env = "GIT_REMOTE_URL")]
    remote_url: Option<String>,

    /// Target branch
    #[arg(long, env = "GIT_BRANCH", default_value = "main")]
    git_branch: String,

    /// Remote name
    #[arg(long, env = "GIT_REMOTE", default_value = "origin")]
    git_remote: String,

    /// Local working-copy path
    #[arg(long, env = "REPO_PATH", default_value = "/tmp/repo")]
    repo_path: PathBuf,

    /// Fixed label prefixed to every deploy commit message
    #[arg(long, env = "COMMIT_LABEL", default_value = "AI auto-update")]
    commit_label: String,

    /// Commit author name
    #[arg(long, env = "GIT_AUTHOR_NAME", default_value = "drydock")]
    author_name: String,

    /// Commit author email
    #[arg(long, env = "GIT_AUTHOR_EMAIL", default_value = "deploy@drydock.invalid")]
    author_email: String,

    /// Timeout for network-bound git operations, in seconds
    #[arg(long, env = "GIT_NETWORK_TIMEOUT_SECS", default_value_t = 60)]
    network_timeout_secs: u64,

    /// Log level
    #[arg(short, long, value_enum, default_value_t = CliLogLevel::Info)]
    log_level: CliLogLevel,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Plaintext)]
    log_format: LogFormat,
}

impl Args {
    fn remote_target(&self) -> anyhow::Result<RemoteTarget> {
        if let Some(url) = &self.remote_url {
            return Ok(RemoteTarget::url(url.clone()));
        }
        let repo = self
            .git_repo
            .clone()
            .context("GIT_REPO (owner/name form) is required")?;
        let token = self.github_token.clone().context("GITHUB_TOKEN is required")?;
        Ok(RemoteTarget::github(repo, token))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level: Level = args.log_level.into();
    dd_logging::init("dd-rest-server", default_level, args.log_format)?;

    tracing::info!("Starting drydock deploy-receiver");

    // SITE_B_API_KEY, with API_KEY as the documented fallback name
    let api_key = args.api_key.clone().or_else(|| std::env::var("API_KEY").ok());
    if api_key.is_none() {
        tracing::warn!("no API key configured; every deploy request will be rejected");
    }

    let mut repo_config = RepoConfig::new(&args.repo_path, args.remote_target()?);
    repo_config.remote_name = args.git_remote.clone();
    repo_config.branch = args.git_branch.clone();
    repo_config.commit_label = args.commit_label.clone();
    repo_config.author_name = args.author_name.clone();
    repo_config.author_email = args.author_email.clone();
    repo_config.network_timeout = Duration::from_secs(args.network_timeout_secs);

    let config = ServerConfig {
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), args.port),
        api_key,
        ..Default::default()
    };

    // Create and start server
    let server = Server::new(config, repo_config);
    server.run().await?;

    Ok(())
}

//! Command-line and environment configuration.
//!
//! Every option has an environment fallback so the binary can run unattended.
//! Hook tuning starts from [`HookConfig::from_env`] and is then overridden by
//! any flag given explicitly.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;

use bitbucket::{BitbucketClient, Credentials};
use discovery::TraitSpec;
use hooks::HookConfig;
use scm::{is_cloud_url, CredentialsId};

/// Where the Bitbucket instance lives and how to authenticate.
#[derive(Debug, Clone, Args)]
pub struct ConnectionArgs {
    /// Bitbucket Server base URL; Bitbucket Cloud when omitted
    #[arg(long, env = "BITBUCKET_SERVER_URL", global = true)]
    pub server_url: Option<String>,

    /// User name for basic authentication
    #[arg(long, env = "BITBUCKET_USERNAME", global = true, requires = "password")]
    pub username: Option<String>,

    /// Password or app password for basic authentication
    #[arg(long, env = "BITBUCKET_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Access token for bearer authentication
    #[arg(long, env = "BITBUCKET_TOKEN", global = true, hide_env_values = true, conflicts_with = "username")]
    pub token: Option<String>,

    /// Credential id recorded as the default checkout credential
    #[arg(long, env = "BITBUCKET_CREDENTIALS_ID", global = true)]
    pub credentials_id: Option<String>,
}

impl ConnectionArgs {
    fn credentials(&self) -> Option<Credentials> {
        match (&self.username, &self.password, &self.token) {
            (Some(username), Some(password), _) => Some(Credentials::Basic {
                username: username.clone(),
                password: password.clone(),
            }),
            (_, _, Some(token)) => Some(Credentials::Bearer(token.clone())),
            _ => None,
        }
    }

    pub fn api_credentials_id(&self) -> Option<CredentialsId> {
        self.credentials_id.clone().and_then(CredentialsId::new)
    }

    pub fn client(&self) -> Result<BitbucketClient> {
        let client = match self.server_url.as_deref() {
            Some(url) if !is_cloud_url(url) => BitbucketClient::server(url, self.credentials()),
            _ => BitbucketClient::cloud(self.credentials()),
        };
        client.context("creating the Bitbucket client")
    }
}

/// Overrides for hook processing.
#[derive(Debug, Clone, Args)]
pub struct HookArgs {
    /// Re-index the repository when a push carries no changes
    #[arg(long)]
    pub scan_on_empty_changes: Option<bool>,

    /// Seconds to wait before emitted events fire
    #[arg(long)]
    pub event_delay: Option<u64>,
}

impl HookArgs {
    pub fn hook_config(&self) -> Result<HookConfig> {
        let mut config = HookConfig::from_env().context("reading hook configuration")?;
        if let Some(scan) = self.scan_on_empty_changes {
            config.scan_on_empty_changes = scan;
        }
        if let Some(seconds) = self.event_delay {
            config.event_delay = Duration::from_secs(seconds);
        }
        Ok(config)
    }
}

/// Discovery trait selection.
#[derive(Debug, Clone, Args)]
pub struct TraitArgs {
    /// JSON file holding a list of trait specifications
    #[arg(long, conflicts_with_all = ["branch_strategy", "ssh_credentials_id"])]
    pub traits: Option<PathBuf>,

    /// Branch discovery strategy: 0 none, 1 exclude PR branches, 2 only PR branches, 3 all
    #[arg(long, env = "BITBUCKET_BRANCH_STRATEGY", default_value_t = 1)]
    pub branch_strategy: u8,

    /// Check out over SSH with this credential ("" for the agent's default key)
    #[arg(long, env = "BITBUCKET_SSH_CREDENTIALS_ID")]
    pub ssh_credentials_id: Option<String>,
}

impl TraitArgs {
    pub fn specs(&self) -> Result<Vec<TraitSpec>> {
        if let Some(path) = &self.traits {
            return read_specs(path);
        }
        let mut specs = vec![TraitSpec::BranchDiscovery {
            strategy_id: self.branch_strategy,
        }];
        if let Some(credentials_id) = &self.ssh_credentials_id {
            specs.push(TraitSpec::SshCheckout {
                credentials_id: Some(credentials_id.clone()),
            });
        }
        Ok(specs)
    }
}

fn read_specs(path: &Path) -> Result<Vec<TraitSpec>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading trait file {}", path.display()))?;
    let specs: Vec<TraitSpec> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing trait file {}", path.display()))?;
    if specs.is_empty() {
        bail!("trait file {} lists no traits", path.display());
    }
    Ok(specs)
}

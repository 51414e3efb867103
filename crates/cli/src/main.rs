//! `bitbucket-source` command-line entry point.
//!
//! This binary is the composition root: it parses configuration, wires
//! tracing, builds the REST client and hands it to the library crates.
//!
//! | Command | What it does |
//! |---------|--------------|
//! | `replay` | Feeds a saved webhook payload through the listener and prints the resulting head events and re-index requests |
//! | `repositories` | Lists an owner's repositories, unregistered ones first |
//! | `heads` | Runs head discovery for one repository and prints the heads found |
//!
//! Command output goes to stdout as JSON lines; logs go to stderr.

mod config;
mod telemetry;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};

use discovery::{build_traits, SourceScanner};
use hooks::HookDispatcher;
use listener::{
    Acknowledgement, ChannelReindexer, DelayedNotifier, HookListener, WebhookDelivery,
    BITBUCKET_TYPE_HEADER, EVENT_KEY_HEADER,
};
use navigator::{visit_repositories, NavigatorRequest, RegisteredSources};
use scm::{BitbucketApi, OwnerName, Repository, RepositoryName};

use crate::config::{ConnectionArgs, HookArgs, TraitArgs};

#[derive(Debug, Parser)]
#[command(name = "bitbucket-source", version, about = "Bitbucket webhook and discovery tooling")]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replay a saved webhook delivery
    Replay {
        /// Value of the X-Event-Key header, e.g. repo:push
        #[arg(long)]
        event_key: String,

        /// File holding the delivery body
        #[arg(long)]
        payload: PathBuf,

        /// Description of the sender recorded on emitted events
        #[arg(long, default_value = "replay")]
        origin: String,

        /// Value of the X-Bitbucket-Type header
        #[arg(long)]
        bitbucket_type: Option<String>,

        #[command(flatten)]
        hooks: HookArgs,
    },

    /// List the repositories of an owner
    Repositories {
        /// Workspace (Cloud) or project key (Server)
        #[arg(long)]
        owner: String,

        /// Repository names that already have a source
        #[arg(long, value_delimiter = ',')]
        registered: Vec<String>,
    },

    /// Discover the heads of a repository
    Heads {
        #[arg(long)]
        owner: String,

        #[arg(long)]
        repository: String,

        /// Also print how the repository would be checked out
        #[arg(long)]
        checkout: bool,

        #[command(flatten)]
        traits: TraitArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let _telemetry = telemetry::init_tracing(cli.json, level)?;

    match cli.command {
        Command::Replay {
            event_key,
            payload,
            origin,
            bitbucket_type,
            hooks,
        } => {
            replay(
                &cli.connection,
                &event_key,
                &payload,
                origin,
                bitbucket_type.as_deref(),
                &hooks,
            )
            .await
        }
        Command::Repositories { owner, registered } => {
            repositories(&cli.connection, &owner, registered).await
        }
        Command::Heads {
            owner,
            repository,
            checkout,
            traits,
        } => heads(&cli.connection, &owner, &repository, checkout, &traits).await,
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn replay(
    connection: &ConnectionArgs,
    event_key: &str,
    payload: &Path,
    origin: String,
    bitbucket_type: Option<&str>,
    hook_args: &HookArgs,
) -> Result<()> {
    let body = std::fs::read_to_string(payload)
        .with_context(|| format!("reading payload {}", payload.display()))?;

    let mut delivery = WebhookDelivery::new(origin)
        .with_header(EVENT_KEY_HEADER, event_key)
        .with_body(body);
    if let Some(kind) = bitbucket_type {
        delivery = delivery.with_header(BITBUCKET_TYPE_HEADER, kind);
    }
    if let Some(url) = &connection.server_url {
        delivery = delivery.with_server_url(url.clone());
    }

    let (notifier, mut events) =
        DelayedNotifier::channel().context("starting the event notifier")?;
    let (reindexer, mut requests) = ChannelReindexer::channel();
    let listener = HookListener::new(Arc::new(HookDispatcher::new(
        Arc::new(notifier),
        Arc::new(reindexer),
        hook_args.hook_config()?,
    )));

    let acknowledgement = listener.receive(&delivery);
    info!(?acknowledgement, "Delivery replayed");
    // Releases the senders so both channels close once pending events fire.
    drop(listener);

    if acknowledgement == Acknowledgement::Ignored {
        bail!("event key {event_key:?} was not processed");
    }

    while let Some(request) = requests.recv().await {
        print_line(&Output::Reindex(&request))?;
    }
    while let Some(event) = events.recv().await {
        print_line(&Output::Event(&event))?;
    }
    Ok(())
}

async fn repositories(
    connection: &ConnectionArgs,
    owner: &str,
    registered: Vec<String>,
) -> Result<()> {
    let owner = OwnerName::new(owner).context("owner must not be empty")?;
    let client = connection.client()?;

    let observer = RegisteredSources::new(registered.into_iter().filter_map(RepositoryName::new));
    let mut request = NavigatorRequest::new(Arc::new(observer));
    let visited = visit_repositories(&client, &owner, &mut request)
        .await
        .with_context(|| format!("listing repositories of {owner}"))?;

    for repository in &visited {
        print_line(&Output::Repository(repository))?;
    }
    Ok(())
}

async fn heads(
    connection: &ConnectionArgs,
    owner: &str,
    repository: &str,
    checkout: bool,
    trait_args: &TraitArgs,
) -> Result<()> {
    let owner = OwnerName::new(owner).context("owner must not be empty")?;
    let client = connection.client()?;
    let traits = build_traits(&trait_args.specs()?)?;

    // Resolve through the owner listing so the clone links are populated.
    let mut request = NavigatorRequest::new(Arc::new(RegisteredSources::default()));
    visit_repositories(&client, &owner, &mut request)
        .await
        .with_context(|| format!("listing repositories of {owner}"))?;
    let Some(target) = request.repository(repository).cloned() else {
        bail!("repository {owner}/{repository} not found");
    };

    let api: Arc<dyn BitbucketApi> = Arc::new(client);
    let scanner = SourceScanner::new(api, traits);
    for head in scanner.scan(&target).await? {
        print_line(&Output::Head(&head))?;
    }

    if checkout {
        let spec = scanner.checkout(&target, connection.api_credentials_id())?;
        print_line(&Output::Checkout(&spec))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
enum Output<'a> {
    Event(&'a hooks::HeadEvent),
    Reindex(&'a hooks::ReindexRequest),
    Repository(&'a Repository),
    Head(&'a discovery::DiscoveredHead),
    Checkout(&'a discovery::CheckoutSpec),
}

fn print_line(output: &Output<'_>) -> Result<()> {
    println!("{}", serde_json::to_string(output)?);
    Ok(())
}

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use reqwest::Client;
use sitescout::config::{ConfigError, default_domains};
use sitescout::llm::OpenAiClient;
use sitescout::provider::FirecrawlClient;
use sitescout::server::{self, AppState};
use sitescout::websearch::{AllowedDomain, answer_query};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const HTTP_TIMEOUT: Duration = Duration::from_secs(90);
const MAX_REDIRECTS: usize = 5;

#[derive(Parser)]
#[command(
    name = "sitescout",
    version,
    about = "Answers questions from pages on an allow-list of sites"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API.
    Serve {
        #[arg(long, default_value = "0.0.0.0:8080")]
        addr: SocketAddr,

        #[command(flatten)]
        domains: DomainArgs,

        /// Per-request deadline.
        #[arg(long, value_name = "SECS", default_value_t = 120)]
        request_timeout: u64,
    },
    /// Answer one query and print the result.
    Ask {
        query: String,

        #[command(flatten)]
        domains: DomainArgs,
    },
}

#[derive(Args)]
struct DomainArgs {
    /// Site the search may use, as NAME=URL. Repeatable; replaces the built-in list.
    #[arg(long = "domain", value_name = "NAME=URL")]
    domain: Vec<AllowedDomain>,
}

impl DomainArgs {
    fn resolve(self) -> Vec<AllowedDomain> {
        if self.domain.is_empty() {
            default_domains()
        } else {
            self.domain
        }
    }
}

struct Clients {
    llm: OpenAiClient,
    provider: FirecrawlClient,
}

fn clients() -> Result<Clients, ConfigError> {
    let http = Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(HTTP_TIMEOUT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()?;
    Ok(Clients {
        llm: OpenAiClient::from_env(http.clone())?,
        provider: FirecrawlClient::from_env(http)?,
    })
}

fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl-C: {e}");
            return;
        }
        info!("Ctrl-C received, shutting down");
        token.cancel();
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sitescout=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let Clients { llm, provider } =
        clients().inspect_err(|e| tracing::error!("configuration error: {e}"))?;
    let shutdown = CancellationToken::new();
    cancel_on_ctrl_c(shutdown.clone());

    match cli.command {
        Command::Serve {
            addr,
            domains,
            request_timeout,
        } => {
            let domains = domains.resolve();
            info!(model = llm.model(), domains = domains.len(), "starting sitescout server");
            let state = AppState::new(
                llm,
                provider,
                domains,
                shutdown,
                Duration::from_secs(request_timeout),
            );
            server::serve(addr, state).await?;
        }
        Command::Ask { query, domains } => {
            let domains = domains.resolve();
            let answer = answer_query(&llm, &provider, &domains, &query, &shutdown).await?;
            println!("{answer}");
        }
    }
    Ok(())
}

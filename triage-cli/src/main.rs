use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::task::LocalSet;
use tracing_subscriber::EnvFilter;
use triage_core::{ClientConfig, HttpIncidentApi, TriageController};

mod session;

#[derive(Debug, Parser)]
#[command(
    name = "triage",
    about = "Drive an incident-triage session against the postmortem backend"
)]
struct Cli {
    /// Backend base URL. Overrides TRIAGE_API_BASE.
    #[arg(long, global = true)]
    api_base: Option<String>,
    /// Per-request timeout in milliseconds. Overrides TRIAGE_REQUEST_TIMEOUT_MS.
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Command {
    /// Aggregate metrics.
    Kpis,
    /// Incident list, optionally filtered.
    Incidents {
        #[arg(long)]
        failed: bool,
        #[arg(long)]
        search: Option<String>,
    },
    /// Detail and message timeline of one incident.
    Show { order_id: String },
    /// Cached or regenerated postmortem of one incident.
    Postmortem {
        order_id: String,
        #[arg(long)]
        regenerate: bool,
    },
    /// Re-ingest upstream data, then reload KPIs and the list.
    Refresh,
    /// Mount, open the first failed incident and fetch its postmortem.
    Demo,
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::from_env();
        if let Some(base) = &self.api_base {
            config.base_url = base.clone();
        }
        if let Some(ms) = self.timeout_ms {
            config.request_timeout_ms = Some(ms);
        }
        config
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = cli.client_config();
    let api = HttpIncidentApi::new(&config).context("invalid client configuration")?;
    tracing::info!(base_url = %api.base_url(), "triage session started");
    let controller = TriageController::new(api);

    let succeeded = LocalSet::new()
        .run_until(session::run(&controller, cli.command))
        .await?;
    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_incident_filters() {
        let cli = Cli::try_parse_from(["triage", "incidents", "--failed", "--search", " ord "])
            .expect("parse");
        assert_eq!(
            cli.command,
            Command::Incidents {
                failed: true,
                search: Some(" ord ".into()),
            }
        );
    }

    #[test]
    fn flags_override_environment_config() {
        let cli = Cli::try_parse_from([
            "triage",
            "postmortem",
            "ORD-1",
            "--regenerate",
            "--api-base",
            "http://10.1.2.3:9001",
            "--timeout-ms",
            "750",
        ])
        .expect("parse");
        let config = cli.client_config();
        assert_eq!(config.base_url, "http://10.1.2.3:9001");
        assert_eq!(config.request_timeout_ms, Some(750));
        assert_eq!(
            cli.command,
            Command::Postmortem {
                order_id: "ORD-1".into(),
                regenerate: true,
            }
        );
    }
}

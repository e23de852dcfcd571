//! `rca`: operator CLI over a file-backed workflow service
//!
//! Every command prints pretty JSON on stdout. Logs go to stderr.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use rca_artifact::{OwnerId, PeriodKey, Stage};
use rca_core::{Locator, RcaConfig, TurnRequest, WorkflowService};
use rca_oracle::{HistoryTurn, HttpOracle, Oracle, ScriptedOracle};
use rca_store::FileStore;
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rca")]
#[command(about = "Guided root-cause analysis workflow", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Store file (overrides the config's store path)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Config file (.toml, .yaml or .yml)
    #[arg(long, global = true, env = "RCA_CONFIG", default_value = "rca.toml")]
    config: PathBuf,

    /// Owner of the analysis
    #[arg(long, global = true, env = "RCA_OWNER", default_value = "default")]
    owner: String,

    /// Period key (defaults to the current month)
    #[arg(long, global = true)]
    period: Option<String>,

    /// Conversation reference recorded on writes
    #[arg(long, global = true)]
    conversation: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show pipeline position for the period
    Status,

    /// Read or write a stage draft
    #[command(subcommand)]
    State(StateCommand),

    /// Validate a stage draft and write its final artifact
    Validate(StageArgs),

    /// Run one guided turn
    Turn(TurnArgs),
}

#[derive(Subcommand)]
enum StateCommand {
    /// Print the addressed draft
    Get(StageArgs),

    /// Merge a JSON patch into the addressed draft
    Put(PutArgs),
}

#[derive(Args)]
struct StageArgs {
    /// Stage index (0-6)
    #[arg(long, value_parser = parse_stage)]
    stage: Stage,
}

#[derive(Args)]
struct PutArgs {
    #[command(flatten)]
    target: StageArgs,

    /// Patch file, or `-` for stdin
    #[arg(long)]
    patch: String,
}

#[derive(Args)]
struct TurnArgs {
    #[command(flatten)]
    target: StageArgs,

    /// What the student said
    #[arg(long)]
    message: String,

    /// Replay oracle responses from a JSON array instead of calling the endpoint
    #[arg(long)]
    script: Option<PathBuf>,

    /// Earlier turns as a JSON array of `{speaker, text}`
    #[arg(long)]
    history: Option<PathBuf>,
}

fn parse_stage(raw: &str) -> Result<Stage, String> {
    let index: u8 = raw.parse().map_err(|_| format!("not a stage index: {raw}"))?;
    Stage::from_index(index).ok_or_else(|| format!("stage index out of range: {index}"))
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_patch(source: &str) -> Result<serde_json::Value> {
    let text = if source == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("reading patch {source}"))?
    };
    serde_json::from_str(&text).context("patch is not valid JSON")
}

async fn oracle_for(config: &RcaConfig, script: Option<&Path>) -> Result<Arc<dyn Oracle>> {
    if let Some(path) = script {
        let scripted = ScriptedOracle::from_file(path).await?;
        tracing::info!("Using scripted oracle from {}", path.display());
        return Ok(Arc::new(scripted));
    }
    let Some(endpoint) = config.oracle.endpoint.as_deref() else {
        bail!("no oracle endpoint configured; set oracle.endpoint or pass --script");
    };
    let mut oracle = HttpOracle::new(endpoint)?;
    if let Some(var) = &config.oracle.token_env {
        let token = std::env::var(var).with_context(|| format!("reading oracle token from ${var}"))?;
        oracle = oracle.with_bearer_token(token);
    }
    Ok(Arc::new(oracle))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    let mut config = RcaConfig::load(&cli.config)?;
    if let Some(store) = &cli.store {
        config = config.with_store_path(store);
    }
    let owner = OwnerId::new(cli.owner.as_str())?;
    let period = match &cli.period {
        Some(raw) => PeriodKey::new(raw.as_str())?,
        None => PeriodKey::for_date(Utc::now().date_naive()),
    };
    let locator = |stage: Stage| {
        let locator = Locator::new(owner.clone(), stage).with_period(period.clone());
        match &cli.conversation {
            Some(conversation) => locator.with_conversation(conversation.as_str()),
            None => locator,
        }
    };

    let script = match &cli.command {
        Commands::Turn(args) => args.script.as_deref(),
        _ => None,
    };
    let oracle: Arc<dyn Oracle> = match &cli.command {
        Commands::Turn(_) => oracle_for(&config, script).await?,
        _ => Arc::new(ScriptedOracle::default()),
    };
    let store = FileStore::new(&config.store.path);
    let service = WorkflowService::new(store, oracle, &config)?;

    match &cli.command {
        Commands::Status => print_json(&service.status(&owner, &period).await?),
        Commands::State(StateCommand::Get(args)) => print_json(&service.get_state(&locator(args.stage)).await?),
        Commands::State(StateCommand::Put(args)) => {
            let patch = read_patch(&args.patch)?;
            print_json(&service.save_state(&locator(args.target.stage), patch).await?)
        }
        Commands::Validate(args) => {
            let response = service.validate(&locator(args.stage)).await?;
            print_json(&response)?;
            if !response.valid {
                std::process::exit(2);
            }
            Ok(())
        }
        Commands::Turn(args) => {
            let history: Vec<HistoryTurn> = match &args.history {
                Some(path) => {
                    let text = std::fs::read_to_string(path)
                        .with_context(|| format!("reading history {}", path.display()))?;
                    serde_json::from_str(&text).context("history is not a JSON array of turns")?
                }
                None => Vec::new(),
            };
            let request = TurnRequest::new(locator(args.target.stage), args.message.as_str()).with_history(history);
            print_json(&service.turn(request).await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_argument_accepts_indices() {
        assert_eq!(parse_stage("4"), Ok(Stage::CauseTree));
        assert!(parse_stage("7").is_err());
        assert!(parse_stage("tree").is_err());
    }

    #[test]
    fn cli_parses_turn() {
        let cli = Cli::try_parse_from([
            "rca", "--owner", "ana", "turn", "--stage", "3", "--message", "more ideas", "--script", "s.json",
        ])
        .unwrap();
        assert_eq!(cli.owner, "ana");
        let Commands::Turn(args) = cli.command else {
            panic!("expected turn");
        };
        assert_eq!(args.target.stage, Stage::Ideas);
        assert_eq!(args.script, Some(PathBuf::from("s.json")));
    }

    #[test]
    fn cli_parses_state_put() {
        let cli = Cli::try_parse_from(["rca", "state", "put", "--stage", "0", "--patch", "-"]).unwrap();
        assert!(matches!(cli.command, Commands::State(StateCommand::Put(PutArgs { ref patch, .. })) if patch == "-"));
    }
}

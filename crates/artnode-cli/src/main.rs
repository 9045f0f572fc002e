use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use artnode_core::{
    InputPortOptions, InputStats, Node, NodeError, NodeOptions, NodeStats, OutputPortOptions,
    OutputStats, open_node,
};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("ARTNODE_BUILD_COMMIT"),
    " ",
    env!("ARTNODE_BUILD_DATE"),
    ")"
);

const CONFIG_HINT: &str = "expected a JSON file with \"node\", \"inputs\" and \"outputs\" keys";

#[derive(Parser, Debug)]
#[command(name = "artnode")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Art-Net node: receives DMX over UDP and routes it to local output ports.",
    long_about = None,
    after_help = "Examples:\n  artnode run --config node.json\n  artnode run --config node.json --port 6455 --stats-interval 5\n  artnode check --config node.json --pretty"
)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the node and run the receive and input loops until killed.
    Run {
        /// Node configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Override the UDP listen port from the configuration
        #[arg(long)]
        port: Option<u16>,

        /// Print node statistics as JSON to stdout every N seconds
        #[arg(long, value_name = "SECONDS")]
        stats_interval: Option<u64>,
    },
    /// Validate a configuration and print the resulting port layout as JSON.
    Check {
        /// Node configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let result = match cli.command {
        Commands::Run {
            config,
            port,
            stats_interval,
        } => cmd_run(&config, port, stats_interval),
        Commands::Check { config, pretty } => cmd_check(&config, pretty),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{:#}", err), None)
    }
}

impl From<NodeError> for CliError {
    fn from(err: NodeError) -> Self {
        let hint = match &err {
            NodeError::InvalidAddress { .. } => {
                Some("the node address holds net + sub-net only; clear the low 4 bits".to_string())
            }
            NodeError::TooManyInputs { max, .. } | NodeError::TooManyOutputs { max, .. } => {
                Some(format!("at most {} ports of each kind are supported", max))
            }
            NodeError::InputsFull { .. } | NodeError::OutputsFull { .. } => {
                Some("raise node.inputs / node.outputs or remove ports".to_string())
            }
            NodeError::AddressMismatch { .. } => {
                Some("input addresses must share the node's net + sub-net".to_string())
            }
            NodeError::InvalidIndex { .. } => Some("output indexes must be 0-15".to_string()),
            NodeError::Bind { .. } => Some("choose another port with --port".to_string()),
        };
        CliError::new(err.to_string(), hint)
    }
}

/// On-disk node configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Config {
    node: NodeOptions,
    inputs: Vec<InputPortOptions>,
    outputs: Vec<OutputPortOptions>,
}

#[derive(Debug, Serialize)]
struct CheckSummary {
    node: NodeOptions,
    inputs: Vec<InputPortOptions>,
    outputs: Vec<OutputPortOptions>,
    poll_replies: usize,
}

#[derive(Debug, Serialize)]
struct StatsSnapshot {
    time: String,
    node: NodeStats,
    inputs: Vec<InputStats>,
    outputs: Vec<OutputStats>,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: &Path) -> Result<Config, CliError> {
    if !path.is_file() {
        return Err(CliError::new(
            format!("config file not found: {}", path.display()),
            Some(CONFIG_HINT.to_string()),
        ));
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    serde_json::from_str(&text).map_err(|err| {
        CliError::new(
            format!("invalid config {}: {}", path.display(), err),
            Some(CONFIG_HINT.to_string()),
        )
    })
}

fn build_node(config: &Config) -> Result<Node, CliError> {
    let mut node = open_node(config.node.clone())?;
    for input in &config.inputs {
        node.add_input_port(*input)?;
    }
    for output in &config.outputs {
        node.add_output_port(output.clone())?;
    }
    Ok(node)
}

fn cmd_check(config_path: &Path, pretty: bool) -> Result<(), CliError> {
    let mut config = load_config(config_path)?;
    // validate without taking the configured port
    config.node.port = 0;
    let node = build_node(&config)?;

    let summary = CheckSummary {
        node: node.options(),
        inputs: (0..node.input_count())
            .filter_map(|index| node.input_options(index))
            .collect(),
        outputs: (0..node.output_count())
            .filter_map(|index| node.output_options(index))
            .collect(),
        poll_replies: node.poll_replies().len(),
    };
    let json = if pretty {
        serde_json::to_string_pretty(&summary)
    } else {
        serde_json::to_string(&summary)
    }
    .context("JSON serialization failed")?;
    println!("{}", json);
    Ok(())
}

fn cmd_run(
    config_path: &Path,
    port: Option<u16>,
    stats_interval: Option<u64>,
) -> Result<(), CliError> {
    let mut config = load_config(config_path)?;
    if let Some(port) = port {
        config.node.port = port;
    }
    let node = Arc::new(build_node(&config)?);
    if let Ok(addr) = node.local_addr() {
        info!(%addr, "listening");
    }

    for index in 0..node.output_count() {
        let Some(queue) = node.output_queue(index) else {
            continue;
        };
        spawn(format!("artnode-output-{index}"), move || {
            loop {
                if let Some(frame) = queue.read(Some(Duration::from_secs(1))) {
                    debug!(
                        output = index,
                        seq = frame.seq,
                        len = frame.len(),
                        sync = frame.sync_mode,
                        "frame"
                    );
                }
            }
        })?;
    }

    if node.inputs_enabled() {
        let inputs = Arc::clone(&node);
        spawn("artnode-inputs".to_string(), move || inputs.inputs_main())?;
    }

    let listener = Arc::clone(&node);
    let listen = spawn("artnode-listen".to_string(), move || listener.listen_main())?;

    match stats_interval {
        Some(seconds) => {
            let interval = Duration::from_secs(seconds.max(1));
            loop {
                thread::sleep(interval);
                print_stats(&node)?;
            }
        }
        None => listen
            .join()
            .map_err(|_| CliError::new("listen thread panicked", None)),
    }
}

fn spawn<F>(name: String, f: F) -> Result<thread::JoinHandle<()>, CliError>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name.clone())
        .spawn(f)
        .with_context(|| format!("Failed to spawn thread {}", name))
        .map_err(Into::into)
}

fn print_stats(node: &Node) -> Result<(), CliError> {
    let time = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("Failed to format timestamp")?;
    let snapshot = StatsSnapshot {
        time,
        node: node.stats(),
        inputs: (0..node.input_count())
            .filter_map(|index| node.input_stats(index))
            .collect(),
        outputs: (0..node.output_count())
            .filter_map(|index| node.output_stats(index))
            .collect(),
    };
    if snapshot.node.errors.count > 0 {
        warn!(errors = snapshot.node.errors.count, "packet errors");
    }
    let json = serde_json::to_string(&snapshot).context("JSON serialization failed")?;
    println!("{}", json);
    Ok(())
}

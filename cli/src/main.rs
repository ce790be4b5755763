use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use ifcpipe::{load_config, write_csv_report, Config, IfcPipe, TaskState};
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ifcpipe")]
#[command(author, version, about = "Extract property tables and relationship graphs from IFC models")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (JSON)
    #[arg(short, long, env = "IFCPIPE_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Seconds to wait for each parse
    #[arg(long, default_value = "300")]
    timeout: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse models and write the combined property table
    Run {
        /// IFC files to ingest
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Combined CSV report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Build the relationship graph of one model and print it as JSON
    Graph {
        file: PathBuf,

        /// Write the graph here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print per-file element counts as JSON
    Counts {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

fn load(path: Option<&Path>) -> Result<Config, String> {
    let config = match path {
        Some(path) => load_config(path).map_err(|e| e.to_string())?,
        None => Config::default(),
    };
    config
        .ensure_directories()
        .map_err(|e| format!("Cannot initialize storage: {}", e))?;
    Ok(config)
}

/// Submits every file and waits for all of them. Returns the ids of the
/// files that completed.
fn ingest(pipe: &IfcPipe, files: &[PathBuf], timeout: Duration) -> Vec<String> {
    let mut ids = Vec::new();
    for file in files {
        match pipe.submit(file) {
            Ok(id) => ids.push(id),
            Err(e) => error!("Could not submit {}: {}", file.display(), e),
        }
    }

    let mut completed = Vec::new();
    for id in ids {
        match pipe.wait_for(&id, timeout) {
            Ok(status) if status.state == TaskState::Completed => {
                info!(file = %status.filename, "Parsed");
                completed.push(id);
            }
            Ok(status) => warn!(
                file = %status.filename,
                error = status.error.as_deref().unwrap_or(""),
                "Parse failed"
            ),
            Err(e) => error!("{}", e),
        }
    }
    completed
}

fn write_json(value: &serde_json::Value, output: Option<&Path>) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    match output {
        Some(path) => std::fs::write(path, text)
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e)),
        None => {
            println!("{}", text);
            Ok(())
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config = load(cli.config.as_deref())?;
    let timeout = Duration::from_secs(cli.timeout);
    let pipe = IfcPipe::new(config).map_err(|e| e.to_string())?;

    let result = match &cli.command {
        Command::Run { files, output } => {
            let ids = ingest(&pipe, files, timeout);
            let table = pipe.extract_table(&ids);
            info!("{}", table.message());
            for status in pipe.statuses() {
                println!(
                    "{}\t{}\t{}",
                    status.file_id,
                    status.state,
                    status.filename
                );
            }
            match output {
                Some(path) => write_csv_report(&table, path).map_err(|e| e.to_string()),
                None => Ok(()),
            }
        }
        Command::Graph { file, output } => {
            let ids = ingest(&pipe, std::slice::from_ref(file), timeout);
            match ids.first() {
                Some(id) => {
                    let build = pipe.render_graph(id).map_err(|e| e.to_string())?;
                    info!(
                        nodes = build.graph.node_count(),
                        edges = build.graph.edge_count(),
                        elapsed_ms = build.elapsed.as_millis() as u64,
                        "Graph ready"
                    );
                    let value =
                        serde_json::to_value(build.graph.to_export()).map_err(|e| e.to_string())?;
                    write_json(&value, output.as_deref())
                }
                None => Err(format!("{} could not be parsed", file.display())),
            }
        }
        Command::Counts { files } => {
            let ids = ingest(&pipe, files, timeout);
            let counts = pipe.entity_counts(&ids);
            let value = serde_json::to_value(counts).map_err(|e| e.to_string())?;
            write_json(&value, None)
        }
    };

    pipe.close();
    result
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_json);
    log::debug!("ifcpipe v{}", env!("CARGO_PKG_VERSION"));

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use schemaboard::config::PlannerConfig;
use schemaboard::persist::{export_file_name, export_json, merge_json, to_json};
use schemaboard::state::DiagramState;
use schemaboard::svg::SvgRenderer;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schemaboard", version, about = "Schema diagram tools for saved editor state")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a saved state to SVG
    Render {
        input: PathBuf,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Add relationships inferred from matching columns
    Autolink {
        input: PathBuf,
        /// Output file (default: overwrite input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print routed relationship geometry as JSON
    Routes {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write a dated export document
    Export {
        input: PathBuf,
        /// Directory for the export file
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_state(path: &Path, config: &PlannerConfig) -> Result<DiagramState> {
    let input = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut state = config.configure(DiagramState::default());
    merge_json(&mut state, &input).with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(state)
}

fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            print!("{}", content);
            Ok(())
        }
    }
}

/// Where `autolink` writes its result. An unchanged input file is left alone,
/// but an explicit output is always written.
fn autolink_destination<'a>(input: &'a Path, output: Option<&'a Path>, added: usize) -> Option<&'a Path> {
    match output {
        Some(path) => Some(path),
        None if added > 0 => Some(input),
        None => None,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => PlannerConfig::load(path)?,
        None => PlannerConfig::default(),
    };
    let engine = config.layout_engine();

    match cli.command {
        Command::Render { input, output } => {
            let state = read_state(&input, &config)?;
            let layout = state.layout(&engine);
            let svg = SvgRenderer::new(config.geometry).render(&state, &layout);
            write_output(output.as_deref(), &svg)?;
        }
        Command::Autolink { input, output } => {
            let mut state = read_state(&input, &config)?;
            let added = state.relink();
            info!(added, "auto-link finished");
            if let Some(target) = autolink_destination(&input, output.as_deref(), added) {
                write_output(Some(target), &to_json(&state)?)?;
            }
        }
        Command::Routes { input, output } => {
            let state = read_state(&input, &config)?;
            let layout = state.layout(&engine);
            let json = serde_json::to_string_pretty(&layout.edges)?;
            write_output(output.as_deref(), &json)?;
        }
        Command::Export { input, dir } => {
            let state = read_state(&input, &config)?;
            let now = chrono::Utc::now();
            let path = dir.join(export_file_name(now.date_naive()));
            write_output(Some(&path), &export_json(&state, now)?)?;
            info!(path = %path.display(), "exported schema");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_autolink_destination() {
        let input = Path::new("state.json");
        let output = Path::new("linked.json");

        assert_eq!(autolink_destination(input, None, 2), Some(input));
        assert_eq!(autolink_destination(input, None, 0), None);
        assert_eq!(autolink_destination(input, Some(output), 2), Some(output));
        assert_eq!(autolink_destination(input, Some(output), 0), Some(output));
    }
}

use anyhow::Context;
use clap::{Parser, Subcommand};
use palmscan::replay::{run_replay, RecordedInference, ReplayScript, ReplaySummary};
use palmscan::{init_logging, Config, JsonLinesSink, Session, BUILD_DATE, VERSION};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "palmscan", version, about = "Incremental palm-tree survey sessions")]
struct Cli {
    /// Configuration file (.toml or .json); defaults to the platform config dir
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded session and print the final metrics
    Replay {
        /// Recorded session file (JSON)
        script: PathBuf,

        /// Persist detections to this JSON-lines file
        #[arg(long)]
        sink: Option<PathBuf>,

        /// Also print the prediction overlay as GeoJSON
        #[arg(long)]
        overlay: bool,
    },
    /// Write a default configuration file
    Config {
        /// Destination (.toml or .json)
        #[arg(long)]
        write: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { write } = &cli.command {
        Config::default()
            .save_to_file(write)
            .with_context(|| format!("Failed to write {}", write.display()))?;
        println!("Wrote default configuration to {}", write.display());
        return Ok(());
    }

    let config = Config::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    init_logging(&config.logging)?;
    info!("palmscan {} (built {})", VERSION, BUILD_DATE);

    if let Commands::Replay {
        script,
        sink,
        overlay,
    } = cli.command
    {
        replay(&config, &script, sink, overlay)?;
    }

    Ok(())
}

fn replay(
    config: &Config,
    script: &Path,
    sink: Option<PathBuf>,
    overlay: bool,
) -> anyhow::Result<()> {
    let script = ReplayScript::load(script)?;
    let pipeline = RecordedInference::from_recordings(&script.recordings)
        .context("Replay script holds an invalid recording")?
        .with_confidence_threshold(config.inference.confidence_threshold);

    let sink_path = sink.or_else(|| {
        config
            .persistence
            .enabled
            .then(|| config.persistence.output_path.clone())
    });
    let layer_name = &config.map_ui.layergroup_name;
    let style = &config.map_ui.prediction;

    let (summary, layer) = match sink_path {
        Some(path) => {
            let sink = JsonLinesSink::open(&path)
                .with_context(|| format!("Failed to open sink {}", path.display()))?;
            info!(path = %path.display(), "Persisting detections");
            let mut session = Session::with_sink(pipeline, sink);
            let summary = run_replay(&mut session, &script.snapshots);
            (summary, session.overlay(layer_name, style))
        }
        None => {
            let mut session = Session::new(pipeline);
            let summary = run_replay(&mut session, &script.snapshots);
            (summary, session.overlay(layer_name, style))
        }
    };

    print_summary(&summary);
    if overlay {
        println!("{}", serde_json::to_string_pretty(&layer.to_geojson())?);
    }
    Ok(())
}

fn print_summary(summary: &ReplaySummary) {
    let metrics = &summary.metrics;
    println!(
        "{} cycles: {} processed, {} no-op, {} reset, {} failed",
        summary.cycles, summary.processed, summary.no_ops, summary.resets, summary.failed
    );
    if summary.persistence_failures > 0 {
        println!("{} regions could not be persisted", summary.persistence_failures);
    }
    println!("Total area: {:.2} km²", metrics.area_km2());
    println!("Total count: {}", metrics.total_count);
    println!("Density: {:.2} per km²", metrics.density_per_km2());
}

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use stillcut::config::MuxConfig;
use stillcut::ebml::{self, ProbeNode};
use stillcut::{Document, FrameCollector, FrameInput};

#[derive(Parser, Debug)]
#[command(author, version, about = "Mux still WebP frames into a WebM video")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mux a directory of WebP frames into a WebM file
    Mux {
        /// Path to config file (TOML format)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory of .webp frames (overrides config file)
        #[arg(short, long)]
        input_dir: Option<PathBuf>,

        /// Frames per second (overrides config file)
        #[arg(short, long)]
        fps: Option<f64>,

        /// Output WebM path (overrides config file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the EBML element tree of a WebM file
    Probe {
        /// WebM file to inspect
        file: PathBuf,

        /// Print JSON instead of an indented tree
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match args.command {
        Command::Mux {
            config,
            input_dir,
            fps,
            output,
        } => {
            let mut mux_config = match config {
                Some(path) => MuxConfig::load(&path).map_err(anyhow::Error::msg)?,
                None => MuxConfig::default(),
            };
            if input_dir.is_some() {
                mux_config.input_dir = input_dir;
            }
            if let Some(fps) = fps {
                mux_config.frame_rate = fps;
                mux_config.frame_durations_ms = None;
            }
            if let Some(output) = output {
                mux_config.output = output;
            }
            mux_config.validate().map_err(anyhow::Error::msg)?;
            mux(&mux_config)
        }
        Command::Probe { file, json } => probe(&file, json),
    }
}

/// List `.webp` files in `dir`, sorted by file name.
fn list_frames(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut frames = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        let is_webp = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("webp"));
        if path.is_file() && is_webp {
            frames.push(path);
        }
    }
    frames.sort();
    Ok(frames)
}

fn mux(config: &MuxConfig) -> anyhow::Result<()> {
    let Some(input_dir) = &config.input_dir else {
        bail!("input_dir is required");
    };
    let paths = list_frames(input_dir)?;
    if paths.is_empty() {
        warn!("No .webp frames found in {}", input_dir.display());
    }

    let durations = config.frame_durations_ms.as_deref();
    if let Some(durations) = durations {
        if durations.len() != paths.len() {
            bail!(
                "{} frame durations configured but {} frames found",
                durations.len(),
                paths.len()
            );
        }
    }

    let mut collector = match durations {
        Some(_) => FrameCollector::new(None)?,
        None => FrameCollector::new(Some(config.frame_rate))?,
    };
    for (i, path) in paths.iter().enumerate() {
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let duration = durations.map(|d| d[i]);
        collector
            .add(FrameInput::webp(bytes), duration)
            .with_context(|| format!("adding {}", path.display()))?;
    }

    let document: Document = collector.compile()?;
    if let Some(parent) = config.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&config.output, &document.bytes)
        .with_context(|| format!("writing {}", config.output.display()))?;
    info!(
        "Wrote {} frames to {} ({} bytes, {})",
        paths.len(),
        config.output.display(),
        document.len(),
        document.mime_type
    );
    Ok(())
}

fn probe(file: &Path, json: bool) -> anyhow::Result<()> {
    let bytes = fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let tree = ebml::decode(&bytes).with_context(|| format!("decoding {}", file.display()))?;
    let nodes: Vec<ProbeNode> = tree.iter().map(ProbeNode::from).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&nodes)?);
    } else {
        for node in &nodes {
            print_node(node, 0);
        }
    }
    Ok(())
}

fn print_node(node: &ProbeNode, depth: usize) {
    let indent = "  ".repeat(depth);
    match (&node.value, node.size) {
        (Some(value), _) => println!("{}{} ({}): {}", indent, node.name, node.id, value),
        (None, Some(size)) => println!("{}{} ({}): {} bytes", indent, node.name, node.id, size),
        (None, None) => println!("{}{} ({})", indent, node.name, node.id),
    }
    for child in &node.children {
        print_node(child, depth + 1);
    }
}

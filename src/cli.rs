//! `floorplan` command line: document inspection and page export.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use floorplan::designer::{encode_png, flatten_page};
use floorplan::{Config, Document, Layer, LayerSet, Marker, BUILD_DATE, VERSION};

#[derive(Debug, Parser)]
#[command(name = "floorplan", version, about = "Floorplan annotation tools")]
pub struct Cli {
    /// Config file (JSON or TOML); defaults to the user config location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the page count and page sizes of a document
    Info { document: PathBuf },
    /// Flatten one page and its markers into a PNG
    Export {
        document: PathBuf,
        #[arg(long, default_value_t = 0)]
        page: u32,
        /// JSON array of marker records
        #[arg(long)]
        markers: PathBuf,
        /// JSON array of layer records
        #[arg(long)]
        layers: Option<PathBuf>,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 1.0)]
        scale: f64,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    tracing::debug!("floorplan {} (built {})", VERSION, BUILD_DATE);
    match cli.command {
        Command::Info { document } => {
            print!("{}", describe(&load_document(&document)?)?);
            Ok(())
        }
        Command::Export {
            document,
            page,
            markers,
            layers,
            out,
            scale,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let document = load_document(&document)?;
            let markers: Vec<Marker> = read_json(&markers)?;
            let layers: Vec<Layer> = match layers {
                Some(path) => read_json(&path)?,
                None => Vec::new(),
            };
            let bytes = export(&document, page, scale, &markers, layers, &config)?;
            fs::write(&out, &bytes).with_context(|| format!("writing {}", out.display()))?;
            tracing::info!("Wrote page {} to {} ({} bytes)", page, out.display(), bytes.len());
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => Config::default_path()?,
    };
    Ok(Config::load_or_default(&path)?)
}

fn load_document(path: &Path) -> anyhow::Result<Document> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Document::from_bytes(&bytes).with_context(|| format!("loading {}", path.display()))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn describe(document: &Document) -> anyhow::Result<String> {
    let mut text = format!("pages: {}\n", document.page_count());
    for page in 0..document.page_count() {
        let (width, height) = document.page_size(page)?;
        text.push_str(&format!(
            "  {}: {}x{} ({})\n",
            page,
            width,
            height,
            document.page_name(page)?
        ));
    }
    Ok(text)
}

fn export(
    document: &Document,
    page: u32,
    scale: f64,
    markers: &[Marker],
    layers: Vec<Layer>,
    config: &Config,
) -> anyhow::Result<Vec<u8>> {
    if !(scale.is_finite() && scale > 0.0) {
        bail!("scale must be a positive number, got {}", scale);
    }
    let mut layer_set = LayerSet::new();
    layer_set.replace_all(layers);
    let image = flatten_page(document, page, scale, markers, &layer_set, &config.style)?;
    Ok(encode_png(image)?)
}

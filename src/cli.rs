//! Command-line interface over observation table files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::data::loader::{load_colors, load_file};
use crate::data::model::SeriesData;
use crate::data::writer::{save_colors, save_file};
use crate::state::{colors_key, AnnotationState};

/// Merge, map and filter categorical cell-state annotations.
#[derive(Debug, Parser)]
#[command(name = "lineage-labels", version, about)]
pub struct Cli {
    /// JSON config file (defaults apply to anything it leaves out)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Observation table (.parquet, .json or .csv)
    #[arg(long, short, global = true)]
    pub input: Option<PathBuf>,

    /// Color sidecar with `<column>_colors` lists
    #[arg(long, global = true)]
    pub colors: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where results are written.
#[derive(Debug, clap::Args)]
pub struct OutputArgs {
    /// Output table (.csv or .json)
    #[arg(long, short)]
    pub output: PathBuf,

    /// Output color sidecar
    #[arg(long)]
    pub colors_out: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List columns, their categories and stored colors
    Inspect,

    /// Fill column OLD with the non-missing labels of column NEW
    Merge {
        #[arg(long)]
        old: String,
        #[arg(long)]
        new: String,
        /// Prefer the colors of NEW for categories present in both
        #[arg(long)]
        overwrite_colors: bool,
        #[command(flatten)]
        out: OutputArgs,
    },

    /// Name the categories of QUERY after the REFERENCE categories they overlap most
    Map {
        #[arg(long)]
        reference: String,
        #[arg(long)]
        query: String,
        /// Column receiving the mapped names (defaults to QUERY)
        #[arg(long)]
        target: Option<String>,
        /// Entropy above which a category is called unknown
        #[arg(long)]
        entropy_cutoff: Option<f64>,
        #[command(flatten)]
        out: OutputArgs,
    },

    /// Keep categories of KEY, joining comma-separated groups ("b, a")
    Process {
        #[arg(long)]
        key: String,
        /// Category group to keep; repeat for several groups. Without
        /// `--keys` the column is copied, a bare `--keys` keeps nothing
        #[arg(long, num_args = 0..)]
        keys: Option<Vec<String>>,
        /// Column receiving the result (defaults to KEY)
        #[arg(long)]
        target: Option<String>,
        #[command(flatten)]
        out: OutputArgs,
    },
}

/// Execute a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    let input = cli.input.as_deref().context("--input is required")?;
    let obs = load_file(input)?;
    let colors = match cli.colors.as_deref() {
        Some(path) => load_colors(path)?,
        None => BTreeMap::new(),
    };

    match cli.command {
        Commands::Inspect => {
            inspect(&AnnotationState::new(obs, colors, config));
            Ok(())
        }
        Commands::Merge {
            old,
            new,
            overwrite_colors,
            out,
        } => {
            config.color_overwrite |= overwrite_colors;
            let mut state = AnnotationState::new(obs, colors, config);
            state.make_categorical(&old)?;
            state.make_categorical(&new)?;
            state.merge_columns(&old, &new)?;
            write_outputs(&state, &out)
        }
        Commands::Map {
            reference,
            query,
            target,
            entropy_cutoff,
            out,
        } => {
            if entropy_cutoff.is_some() {
                config.en_cutoff = entropy_cutoff;
            }
            let mut state = AnnotationState::new(obs, colors, config);
            state.make_categorical(&reference)?;
            state.make_categorical(&query)?;
            let target = target.unwrap_or_else(|| query.clone());
            state.map_columns(&reference, &query, &target)?;
            write_outputs(&state, &out)
        }
        Commands::Process {
            key,
            keys,
            target,
            out,
        } => {
            let mut state = AnnotationState::new(obs, colors, config);
            state.make_categorical(&key)?;
            let target = target.unwrap_or_else(|| key.clone());
            state.restrict_column(&key, keys.as_deref(), &target)?;
            write_outputs(&state, &out)
        }
    }
}

fn write_outputs(state: &AnnotationState, out: &OutputArgs) -> Result<()> {
    save_file(&state.obs, &out.output)?;
    if let Some(path) = &out.colors_out {
        save_colors(&state.colors, path)?;
    }
    Ok(())
}

fn inspect(state: &AnnotationState) {
    println!("{} observations", state.obs.len());
    for (name, series) in state.obs.columns() {
        match series.data() {
            SeriesData::Categorical(cat) => {
                println!("{name}: categorical, {} categories", cat.categories().len());
                let colors = state.colors.get(&colors_key(name));
                for (i, (category, count)) in cat.value_counts().into_iter().enumerate() {
                    let color = colors
                        .and_then(|c| c.get(i))
                        .map(String::as_str)
                        .unwrap_or("-");
                    println!("  {category:<24} {count:>8}  {color}");
                }
            }
            SeriesData::Values(_) => println!("{name}: {}", series.dtype()),
        }
    }
}

/// Parse `args` as a command line and run it.
pub fn main_with_args<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    run(Cli::try_parse_from(args)?)
}

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::index::SeqIndex;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Plain,
    Csv,
    Json,
}

/// range() for floats
#[derive(Parser, Debug)]
#[command(name = "frange")]
pub struct Options {
    /// STOP, START STOP or START STOP STEP
    #[arg(num_args = 0..=3, allow_negative_numbers = true)]
    pub bounds: Vec<f64>,

    /// JSON file listing named ranges
    #[arg(short, long)]
    pub config: Option<String>,

    /// Element index (`-1`) or slice (`2:5`, `::2`)
    #[arg(short, long, allow_hyphen_values = true)]
    pub index: Option<SeqIndex>,

    #[arg(long, allow_negative_numbers = true)]
    pub contains: Option<f64>,

    #[arg(long)]
    pub len: bool,

    #[arg(long)]
    pub repr: bool,

    /// Count, sum, min and max computed in parallel
    #[arg(long)]
    pub stats: bool,

    #[arg(short, long, value_enum)]
    pub format: Option<Format>,

    #[arg(short, long, default_value_t = 0)]
    pub threads: usize,

    #[arg(short, long)]
    pub verbose: bool,
}

impl Options {
    /// True when no query flag was given and the values should be listed.
    pub fn lists_values(&self) -> bool {
        !(self.len || self.repr || self.stats || self.contains.is_some() || self.index.is_some())
    }
}

pub fn get_opts() -> Options {
    let mut args = Options::parse();

    if args.threads == 0 {
        args.threads = rayon::current_num_threads();
    }

    args
}

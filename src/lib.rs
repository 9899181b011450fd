pub mod args;
pub mod config;
pub mod error;
pub mod float_range;
pub mod index;
pub mod run;

use std::{fs, path::Path};

pub use error::{RangeError, Result};
pub use float_range::{FloatRange, Iter, frange, try_frange};
pub use index::{Indexed, SeqIndex, Slice};

pub fn read_file(fp: &str) -> std::result::Result<String, Box<dyn std::error::Error>> {
    let path = Path::new(fp);
    let contents = fs::read_to_string(path)?;
    Ok(contents)
}

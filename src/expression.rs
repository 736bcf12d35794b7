//! Composition expression files.
//!
//! One feature name per line. The first line is the first (innermost) layer
//! the engine composes.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// File extension used for expression files.
pub const EXTENSION: &str = "expression";

/// Write `features` to `path`, replacing any existing file.
pub fn write<S: AsRef<str>>(features: &[S], path: &Path) -> io::Result<()> {
    let mut writer = BufWriter::new(fs::File::create(path)?);
    for feature in features {
        writeln!(writer, "{}", feature.as_ref())?;
    }
    writer.flush()
}

/// Read an expression file back into its feature list.
pub fn read(path: &Path) -> io::Result<Vec<String>> {
    Ok(fs::read_to_string(path)?
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect())
}

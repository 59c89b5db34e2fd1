//! Human-readable confirmation of a provisioning run.

use std::io::{self, Write};

use crate::db::Provisioned;

/// Writes the three confirmation lines for a finished run.
pub fn write_summary<W: Write>(mut out: W, run: &Provisioned) -> io::Result<()> {
    writeln!(out, "Initialized database {} for job scraping", run.database)?;
    writeln!(out, "Database: {}", run.database)?;
    writeln!(
        out,
        "Collection: {} ({} indexes)",
        run.collection,
        run.indices.len()
    )?;
    out.flush()
}

//! JSON-lines persistence for episode records

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use rna_design_core::Result;

use crate::episode::EpisodeRecord;

/// Write one JSON object per record, replacing any existing file
///
/// # Errors
/// I/O and serialization failures.
pub fn write_jsonl(path: impl AsRef<Path>, records: &[EpisodeRecord]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    tracing::debug!(path = %path.as_ref().display(), count = records.len(), "wrote episode records");
    Ok(())
}

/// Read records written by [`write_jsonl`], skipping blank lines
///
/// # Errors
/// I/O failures and lines that are not valid records.
pub fn read_jsonl(path: impl AsRef<Path>) -> Result<Vec<EpisodeRecord>> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}

//! CLI `inspect` command — show an output file without the embedding payloads.

use std::path::Path;

use anyhow::Result;

use clipscout::output;

/// Print the summary form of every record in `path`.
pub fn inspect(path: &Path) -> Result<()> {
    let records = output::read_records(path)?;

    if records.is_empty() {
        println!("{} contains no records.", path.display());
        return Ok(());
    }

    let dims = &records[0];
    println!(
        "{} record(s) in {} (video_emb: {} dims, description_emb: {} dims)\n",
        records.len(),
        path.display(),
        dims.video_emb.len(),
        dims.description_emb.len(),
    );

    for (i, record) in records.iter().enumerate() {
        println!("  {}. {}", i + 1, record.to_summary());
    }

    Ok(())
}

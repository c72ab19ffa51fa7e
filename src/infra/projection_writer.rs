// ============================================================
// Layer 6 — Projection CSV Writer
// ============================================================
// Writes projected outputs to a CSV file, one row per batch
// element, for later analysis and plotting.
//
// Example output (nz = 3):
//   batch,z0,z1,z2
//   0,-0.412000,1.000000,0.083000
//   1,0.250000,-1.000000,-0.610000
//
// The file is rewritten on every call: one CSV holds the
// output of one prediction run.

use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::PathBuf,
};

use crate::domain::projection::ProjectedBatch;
use crate::domain::traits::ProjectionSink;

pub struct CsvProjectionWriter {
    csv_path: PathBuf,
}

impl CsvProjectionWriter {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let csv_path = path.into();
        if let Some(parent) = csv_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { csv_path })
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

impl ProjectionSink for CsvProjectionWriter {
    fn write(&self, batch: &ProjectedBatch) -> Result<()> {
        let file = File::create(&self.csv_path)
            .with_context(|| format!("Cannot create '{}'", self.csv_path.display()))?;
        let mut f = BufWriter::new(file);

        let header: Vec<String> = (0..batch.nz()).map(|i| format!("z{i}")).collect();
        writeln!(f, "batch,{}", header.join(","))?;

        for (index, row) in batch.rows().iter().enumerate() {
            let values: Vec<String> = row.iter().map(|v| format!("{v:.6}")).collect();
            writeln!(f, "{},{}", index, values.join(","))?;
        }
        f.flush()?;

        tracing::debug!(
            "Wrote {} projected rows to '{}'",
            batch.len(), self.csv_path.display()
        );
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_header_and_rows() {
        let tmp    = tempfile::tempdir().unwrap();
        let path   = tmp.path().join("out").join("predictions.csv");
        let writer = CsvProjectionWriter::new(&path).unwrap();

        let batch = ProjectedBatch::new(vec![vec![0.5, -1.0], vec![0.0, 0.25]]);
        writer.write(&batch).unwrap();

        let text  = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "batch,z0,z1");
        assert_eq!(lines[1], "0,0.500000,-1.000000");
        assert_eq!(lines[2], "1,0.000000,0.250000");
    }
}

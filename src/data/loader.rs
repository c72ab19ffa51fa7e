// ============================================================
// Layer 4 — JSON Sequence Loader
// ============================================================
// Reads one input window from a JSON file holding a nested
// array shaped [seq_len][batch][features]:
//
//   [
//     [[0.1, 0.2, ...], [0.3, 0.4, ...]],   ← time step 0, two series
//     [[0.5, 0.6, ...], [0.7, 0.8, ...]],   ← time step 1
//     ...
//   ]
//
// Shape validation happens in SequenceWindow's deserializer,
// so a ragged file fails here with a descriptive message.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::domain::sequence::SequenceWindow;
use crate::domain::traits::SequenceSource;

pub struct JsonSequenceLoader {
    path: PathBuf,
}

impl JsonSequenceLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SequenceSource for JsonSequenceLoader {
    fn load(&self) -> Result<SequenceWindow> {
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read sequence file '{}'", self.path.display()))?;

        let window: SequenceWindow = serde_json::from_str(&json)
            .with_context(|| format!("Invalid sequence in '{}'", self.path.display()))?;

        tracing::debug!(
            "Loaded window {:?} from '{}'",
            window.dims(), self.path.display()
        );
        Ok(window)
    }
}

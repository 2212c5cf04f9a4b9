//! Local result file written after a successful save.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::models::RecordId;

/// Contents of `resultado_processamento_<timestamp>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultFile {
    pub arquivo_processado: String,
    pub total_perguntas: usize,
    pub total_membros: usize,
    pub questionario_id: Option<RecordId>,
    pub timestamp: DateTime<Local>,
    pub usuario: String,
    pub status: String,
}

impl ResultFile {
    pub fn file_name(&self) -> String {
        format!(
            "resultado_processamento_{}.json",
            self.timestamp.format("%Y%m%d_%H%M%S")
        )
    }
}

/// Write bytes atomically (write to temp, then rename).
async fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Write the result file into `dir` and return its path.
pub async fn write_result_file(dir: &Path, result: &ResultFile) -> Result<PathBuf> {
    let path = dir.join(result.file_name());
    let bytes = serde_json::to_vec_pretty(result)?;
    write_bytes(&path, &bytes).await?;
    log::info!("Result written to {}", path.display());
    Ok(path)
}

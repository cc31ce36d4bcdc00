//! Saved podcast scripts, so audio can be regenerated without new LLM calls.

use crate::content::types::PodcastScript;
use crate::error::{PodcastError, Result};
use std::path::{Path, PathBuf};

pub const SCRIPT_FILE: &str = "podcast_script.json";
pub const TRANSLATED_SCRIPT_FILE: &str = "podcast_script_translated.json";

pub fn script_path(output_dir: &Path) -> PathBuf {
    output_dir.join(SCRIPT_FILE)
}

pub fn translated_script_path(output_dir: &Path) -> PathBuf {
    output_dir.join(TRANSLATED_SCRIPT_FILE)
}

/// Write `script` as pretty JSON, creating parent directories.
pub fn save(path: &Path, script: &PodcastScript) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(script)?;
    std::fs::write(path, json)?;
    tracing::info!(path = %path.display(), topics = script.topics.len(), "Saved script");
    Ok(())
}

pub fn load(path: &Path) -> Result<PodcastScript> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PodcastError::configuration(
                "skip_content",
                format!(
                    "no saved script at {} (run once without --skip-content)",
                    path.display()
                ),
            )
        } else {
            e.into()
        }
    })?;
    let script: PodcastScript = serde_json::from_str(&contents)?;
    if script.topics.is_empty() {
        return Err(PodcastError::configuration(
            "skip_content",
            format!("saved script {} has no topics", path.display()),
        ));
    }
    Ok(script)
}

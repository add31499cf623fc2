//! Analysis adapter that journals prompts instead of calling a live model.
//!
//! With a path, each prompt is appended to the journal as one line
//! prefixed by a timestamp. Without one, prompts go to the log.

use crate::domain::error::PaperTraderError;
use crate::ports::analysis_port::AnalysisPort;
use crate::ports::config_port::ConfigPort;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

pub struct PromptJournalAdapter {
    path: Option<PathBuf>,
}

impl PromptJournalAdapter {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// `[analysis] journal`, when set.
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let path = config
            .get_string("analysis", "journal")
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);
        Self { path }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

impl AnalysisPort for PromptJournalAdapter {
    fn request_analysis(&self, prompt: &str) -> Result<(), PaperTraderError> {
        let Some(path) = &self.path else {
            info!(prompt, "analysis requested");
            return Ok(());
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| PaperTraderError::Analysis {
                reason: format!("cannot open journal {}: {}", path.display(), e),
            })?;
        let stamp = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S");
        writeln!(file, "{stamp}\t{}", prompt.replace('\n', " ")).map_err(|e| {
            PaperTraderError::Analysis {
                reason: e.to_string(),
            }
        })?;
        Ok(())
    }
}

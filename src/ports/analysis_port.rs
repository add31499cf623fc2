//! Chat/analysis provider port.

use crate::domain::error::PaperTraderError;

pub trait AnalysisPort {
    /// Submit a prompt for analysis. The response stream belongs to the
    /// provider; the engine only needs to know whether the request went out.
    fn request_analysis(&self, prompt: &str) -> Result<(), PaperTraderError>;
}

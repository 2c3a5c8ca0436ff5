use std::sync::Arc;

use crate::config::Settings;
use crate::generation::generator::TextGenerator;
use crate::layout::FontResolver;

/// Shared application state handed to the generation pipeline.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable text generator. Default: `CoverLetterGenerator` over `LlmClient`.
    pub generator: Arc<dyn TextGenerator>,
    /// Font lookup used by the renderer on the blocking worker.
    pub font_resolver: Arc<dyn FontResolver>,
    pub settings: Settings,
}

//! Cover-letter pipeline.
//!
//! Flow: extract sources → generate letter → render PDF on a blocking
//!       worker → generate filename → write `<output_dir>/<stem>.pdf`.
//!
//! Nothing is written unless every earlier step succeeded.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Settings;
use crate::errors::AppError;
use crate::generation::extract::extract_text;
use crate::generation::filename::with_pdf_extension;
use crate::layout::{render_letter_pdf, FontResolver, PageSize, StyleContext, DEFAULT_MARGIN};
use crate::state::AppState;

/// Inputs for one letter.
#[derive(Debug, Clone)]
pub struct LetterRequest {
    pub resume_path: PathBuf,
    pub sample_path: Option<PathBuf>,
    pub job_description: String,
    /// Directory the PDF is written to. Defaults to `Settings::output_path`.
    pub output_dir: Option<PathBuf>,
}

/// Runs the whole pipeline and returns the path of the saved PDF.
pub async fn generate_cover_letter_pdf(
    state: &AppState,
    request: LetterRequest,
) -> Result<PathBuf, AppError> {
    if request.job_description.trim().is_empty() {
        return Err(AppError::Input("Please provide a job description".to_string()));
    }

    // Step 1: Extract resume and optional sample (blocking file + PDF parsing)
    let resume_path = request.resume_path.clone();
    let sample_path = request.sample_path.clone();
    let (resume_text, sample_text) = tokio::task::spawn_blocking(move || {
        let resume = extract_text(&resume_path)?;
        let sample = sample_path.as_deref().map(extract_text).transpose()?;
        Ok::<_, AppError>((resume, sample))
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Extraction worker failed: {e}")))??;

    if resume_text.trim().is_empty() {
        return Err(AppError::Input(format!(
            "No text could be extracted from {}",
            request.resume_path.display()
        )));
    }

    // Step 2: Generate the letter
    let letter = state
        .generator
        .generate(&resume_text, &request.job_description, sample_text.as_deref())
        .await?;

    // Step 3: Render to PDF bytes off the async runtime
    let pdf = render_on_worker(letter, &state.settings, Arc::clone(&state.font_resolver)).await?;

    // Step 4: Filename, then write
    let stem = state
        .generator
        .generate_filename(&request.job_description)
        .await;
    let output_dir = request
        .output_dir
        .unwrap_or_else(|| state.settings.output_path.clone());
    let path = output_dir.join(with_pdf_extension(&stem));

    write_pdf_file(&path, &pdf).await?;
    info!("Cover letter saved to {}", path.display());
    Ok(path)
}

/// Renders `text` with the font settings on a blocking worker.
pub async fn render_on_worker(
    text: String,
    settings: &Settings,
    resolver: Arc<dyn FontResolver>,
) -> Result<Vec<u8>, AppError> {
    let style = StyleContext::new(settings.font_name.clone(), settings.font_size);
    let bytes = tokio::task::spawn_blocking(move || {
        render_letter_pdf(&text, &style, PageSize::LETTER, DEFAULT_MARGIN, resolver.as_ref())
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Render worker failed: {e}")))??;
    Ok(bytes)
}

/// Creates the parent directory if needed, writes `<path>.part` and renames
/// it over `path`. A failed write leaves no file behind.
pub async fn write_pdf_file(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    let write_err = |source: std::io::Error| AppError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let partial = partial_path(path);
    let result = match tokio::fs::write(&partial, bytes).await {
        Ok(()) => tokio::fs::rename(&partial, path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
            debug!("No partial file to remove at {}: {cleanup}", partial.display());
        }
        return Err(write_err(e));
    }
    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

mod config;
mod errors;
mod generation;
mod layout;
mod llm_client;
mod session;
mod state;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::io::AsyncReadExt;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, SettingsOverrides, DEFAULT_SETTINGS_FILE};
use crate::errors::AppError;
use crate::generation::filename::with_pdf_extension;
use crate::generation::generator::CoverLetterGenerator;
use crate::generation::pipeline::{
    generate_cover_letter_pdf, render_on_worker, write_pdf_file, LetterRequest,
};
use crate::layout::SystemFontResolver;
use crate::llm_client::{LlmClient, SUPPORTED_MODELS};
use crate::session::{SessionState, DEFAULT_STATE_FILE};
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "coverletter")]
#[command(about = "Generate a tailored cover letter PDF from a resume and a job description")]
#[command(version)]
struct Cli {
    /// Also write logs to this file (no colours)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a cover letter with the LLM and save it as PDF
    Generate {
        /// Resume (PDF or text). Defaults to the last resume used
        #[arg(short, long)]
        resume: Option<PathBuf>,

        /// Sample cover letter used as a style reference
        #[arg(short, long)]
        sample: Option<PathBuf>,

        /// Job description file, or `-` for stdin (the default)
        #[arg(short, long)]
        job: Option<PathBuf>,

        /// Directory to write the PDF into
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        #[command(flatten)]
        style: StyleArgs,

        /// Persist the effective settings back to the settings file
        #[arg(long)]
        save_settings: bool,

        /// Open the PDF in the system viewer when done
        #[arg(long)]
        open: bool,
    },

    /// Render an existing letter text file to PDF without calling the LLM
    Render {
        /// Letter text
        #[arg(short, long)]
        input: PathBuf,

        /// Output PDF path. Defaults to COVER_LETTER_OUTPUT or cover_letter.pdf
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        style: StyleArgs,

        #[arg(long)]
        open: bool,
    },
}

#[derive(Args)]
struct StyleArgs {
    /// Font family (Helvetica, Times-Roman, Courier or an installed TTF/OTF/TTC family)
    #[arg(long)]
    font: Option<String>,

    /// Font size in points
    #[arg(long)]
    font_size: Option<f32>,

    /// Settings file
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    settings: PathBuf,
}

impl StyleArgs {
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            font_name: self.font.clone(),
            font_size: self.font_size,
            ..SettingsOverrides::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first so RUST_LOG from .env applies to logging
    let config = Config::from_env()?;

    // Initialize structured logging
    let file_layer = match &cli.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Unable to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    info!("Starting coverletter v{}", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Commands::Generate {
            resume,
            sample,
            job,
            output_dir,
            style,
            save_settings,
            open,
        } => {
            cmd_generate(
                &config,
                GenerateArgs {
                    resume,
                    sample,
                    job,
                    output_dir,
                    style,
                    save_settings,
                },
            )
            .await
            .map(|p| (p, open))
        }
        Commands::Render {
            input,
            output,
            style,
            open,
        } => cmd_render(&config, input, output, style).await.map(|p| (p, open)),
    };

    match result {
        Ok((path, open)) => {
            println!("{}", path.display());
            if open {
                open_in_viewer(&path);
            }
            Ok(())
        }
        Err(e) => {
            error!(code = e.code(), "{e}");
            std::process::exit(e.exit_code());
        }
    }
}

struct GenerateArgs {
    resume: Option<PathBuf>,
    sample: Option<PathBuf>,
    job: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    style: StyleArgs,
    save_settings: bool,
}

async fn cmd_generate(config: &Config, args: GenerateArgs) -> Result<PathBuf, AppError> {
    let settings = config.settings(&args.style.settings, &args.style.overrides())?;
    for model in [&settings.cover_letter_model, &settings.filename_model] {
        if !SUPPORTED_MODELS.contains(&model.as_str()) {
            warn!("Model '{model}' is not in the supported list; sending it anyway");
        }
    }
    if args.save_settings {
        settings.save(&args.style.settings)?;
        info!("Settings saved to {}", args.style.settings.display());
    }

    let state_file = Path::new(DEFAULT_STATE_FILE);
    let mut session = SessionState::load(state_file);

    let resume_path = args
        .resume
        .or_else(|| session.resume_path.clone())
        .ok_or_else(|| AppError::Input("Please select a resume file (--resume)".to_string()))?;
    let job_description = read_job_description(args.job.as_deref()).await?;

    let mut llm = LlmClient::new(config.require_api_key()?)?;
    if let Some(base_url) = &config.openai_base_url {
        llm = llm.with_base_url(base_url);
    }
    info!("LLM client initialized (model: {})", settings.cover_letter_model);

    let state = AppState {
        generator: Arc::new(CoverLetterGenerator::new(llm, settings.clone())),
        font_resolver: Arc::new(SystemFontResolver::new()),
        settings,
    };

    let path = generate_cover_letter_pdf(
        &state,
        LetterRequest {
            resume_path: resume_path.clone(),
            sample_path: args.sample.clone(),
            job_description,
            output_dir: args.output_dir,
        },
    )
    .await?;

    session.remember(&resume_path, args.sample.as_deref());
    if let Err(e) = session.save(state_file) {
        warn!("Unable to save session state: {e}");
    }
    Ok(path)
}

async fn cmd_render(
    config: &Config,
    input: PathBuf,
    output: Option<PathBuf>,
    style: StyleArgs,
) -> Result<PathBuf, AppError> {
    let settings = config.settings(&style.settings, &style.overrides())?;
    let text = tokio::fs::read_to_string(&input)
        .await
        .map_err(|e| AppError::Input(format!("Unable to read {}: {e}", input.display())))?;

    let path = output.unwrap_or_else(|| {
        settings
            .output_path
            .join(with_pdf_extension(&config.default_output_name))
    });
    let bytes = render_on_worker(text, &settings, Arc::new(SystemFontResolver::new())).await?;
    write_pdf_file(&path, &bytes).await?;
    info!("Rendered {} to {}", input.display(), path.display());
    Ok(path)
}

/// Reads the job description from `path`, or stdin when absent or `-`.
async fn read_job_description(path: Option<&Path>) -> Result<String, AppError> {
    let text = match path {
        Some(p) if p != Path::new("-") => tokio::fs::read_to_string(p)
            .await
            .map_err(|e| AppError::Input(format!("Unable to read {}: {e}", p.display())))?,
        _ => {
            info!("Reading job description from stdin");
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .map_err(|e| AppError::Input(format!("Unable to read stdin: {e}")))?;
            buf
        }
    };
    if text.trim().is_empty() {
        return Err(AppError::Input("Please provide a job description".to_string()));
    }
    Ok(text)
}

/// Launches the platform PDF viewer. Failure only logs a warning.
fn open_in_viewer(path: &Path) {
    let mut command = if cfg!(target_os = "macos") {
        std::process::Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut c = std::process::Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else {
        std::process::Command::new("xdg-open")
    };
    if let Err(e) = command.arg(path).spawn() {
        warn!("Unable to open {}: {e}", path.display());
    }
}

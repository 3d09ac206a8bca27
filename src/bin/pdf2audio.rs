//! CLI binary for pdf2audio-client.
//!
//! A thin shim over the library crate: every invocation signs in, runs one
//! command against the conversion backend, and exits. Nothing is stored
//! between runs.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf2audio_client::{
    ArtifactAccess, ClientConfig, ConversionJob, ConversionWorkflow, DocumentFile, FirebaseConfig,
    FirebaseIdentityProvider, GuardDecision, HttpBackend, IdentityGate, JobDirectory, JobId,
    Language, Navigator, Notice, Route, RouteGuard, SubmitOutcome, ViewObserver, ViewScope,
    WorkflowState,
};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Terminal observer: a spinner while a conversion is in flight, and a line
/// per notice.
struct CliObserver {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl CliObserver {
    fn new(quiet: bool) -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
            quiet,
        })
    }

    fn finish(&self) {
        if let Some(bar) = self.bar.lock().ok().and_then(|mut b| b.take()) {
            bar.finish_and_clear();
        }
    }
}

impl ViewObserver for CliObserver {
    fn on_workflow_state(&self, state: &WorkflowState) {
        match state {
            WorkflowState::Submitting if !self.quiet => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(
                    ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner())
                        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
                );
                bar.set_prefix("Converting");
                bar.set_message("upload, OCR and speech synthesis…");
                bar.enable_steady_tick(Duration::from_millis(80));
                if let Ok(mut slot) = self.bar.lock() {
                    *slot = Some(bar);
                }
            }
            WorkflowState::Ready { job_id } => {
                self.finish();
                if !self.quiet {
                    eprintln!("{} conversion {} ready", green("✔"), bold(job_id.as_str()));
                }
            }
            WorkflowState::Failed { .. } => self.finish(),
            _ => {}
        }
    }

    fn on_notice(&self, notice: &Notice) {
        self.finish();
        match notice {
            Notice::Inline { field, message } => eprintln!("{} {}: {}", red("✗"), field, message),
            Notice::Toast { message } | Notice::Alert { message } => {
                eprintln!("{} {}", red("✘"), message)
            }
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Create an account
  pdf2audio --email me@example.com --password 'Secret1' register

  # Convert a PDF to French audio and download it
  pdf2audio convert report.pdf --language fr -o report.wav

  # List, fetch and delete conversions
  pdf2audio list
  pdf2audio download 7 -o report.wav
  pdf2audio delete 7

  # Show supported languages
  pdf2audio languages

ENVIRONMENT VARIABLES:
  PDF2AUDIO_BASE_URL          Conversion backend (default http://localhost:8000)
  PDF2AUDIO_FIREBASE_API_KEY  Firebase web API key
  PDF2AUDIO_EMAIL             Account email
  PDF2AUDIO_PASSWORD          Account password
  PDF2AUDIO_GOOGLE_ID_TOKEN   Google id token for federated sign-in
"#;

/// Convert PDF documents to audio through a remote conversion service.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2audio",
    version,
    about = "Convert PDF documents to audio through a remote conversion service",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Conversion backend base URL.
    #[arg(long, global = true, env = "PDF2AUDIO_BASE_URL", default_value = "http://localhost:8000")]
    base_url: String,

    /// Firebase web API key used for sign-in.
    #[arg(long, global = true, env = "PDF2AUDIO_FIREBASE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Account email.
    #[arg(long, global = true, env = "PDF2AUDIO_EMAIL")]
    email: Option<String>,

    /// Account password.
    #[arg(long, global = true, env = "PDF2AUDIO_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Sign in with Google using this id token instead of a password.
    #[arg(long, global = true, env = "PDF2AUDIO_GOOGLE_ID_TOKEN", hide_env_values = true)]
    google_id_token: Option<String>,

    /// Timeout for list/delete/download requests, in seconds.
    #[arg(long, global = true, env = "PDF2AUDIO_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Timeout for a conversion request, in seconds.
    #[arg(long, global = true, env = "PDF2AUDIO_UPLOAD_TIMEOUT", default_value_t = 600)]
    upload_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF2AUDIO_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, global = true, env = "PDF2AUDIO_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account with --email and --password.
    Register,

    /// Upload a PDF and convert it to audio.
    Convert {
        /// PDF file to convert.
        file: PathBuf,

        /// Target language code (see `pdf2audio languages`).
        #[arg(short, long, default_value = "en")]
        language: String,

        /// Also download the produced audio to this path.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List your conversions.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Delete a conversion.
    Delete { id: String },

    /// Download the audio of a conversion.
    Download {
        id: String,

        /// Destination file. Default: `<id>.wav`.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the download link of a conversion.
    Locate { id: String },

    /// List supported target languages.
    Languages,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = ClientConfig::builder()
        .base_url(cli.base_url.clone())
        .request_timeout_secs(cli.timeout)
        .upload_timeout_secs(cli.upload_timeout)
        .build()
        .context("Invalid configuration")?;

    match cli.command {
        Command::Languages => {
            for l in Language::ALL {
                println!("{:<6} {}", l.code(), l);
            }
            return Ok(());
        }
        Command::Locate { ref id } => {
            println!(
                "{}",
                pdf2audio_client::locate(&config.download_base(), &JobId::new(id.as_str()))
            );
            return Ok(());
        }
        Command::Register => {
            let gate = start_gate(&cli).await?;
            let (email, password) = credentials(&cli)?;
            let session = gate
                .register(email, password)
                .await
                .context("Registration failed")?;
            eprintln!(
                "{} Registration complete: {}",
                green("✔"),
                bold(session.email().unwrap_or(email))
            );
            return Ok(());
        }
        _ => {}
    }

    // ── Protected commands ───────────────────────────────────────────────
    let gate = sign_in(&cli).await?;
    let mut navigator = Navigator::new();
    navigator.push(Route::Dashboard.path());
    let mut guard = RouteGuard::new();
    match guard.evaluate(&gate.session(), Route::Dashboard.path(), &mut navigator) {
        GuardDecision::Admit => {}
        GuardDecision::Waiting => bail!("Identity provider did not answer"),
        GuardDecision::Redirected { .. } => bail!("Sign in required"),
    }

    let backend = Arc::new(HttpBackend::new(config.clone()).context("HTTP client setup failed")?);
    let observer = CliObserver::new(cli.quiet);
    let scope = ViewScope::new();
    let directory = Arc::new(
        JobDirectory::new(backend.clone(), gate.subscribe())
            .with_scope(scope.clone())
            .with_observer(observer.clone()),
    );
    let artifacts = ArtifactAccess::new(config.download_base(), Arc::clone(&directory));

    match cli.command {
        Command::Convert {
            ref file,
            ref language,
            ref output,
        } => {
            let workflow = ConversionWorkflow::with_view(
                backend.clone(),
                gate.subscribe(),
                &config,
                scope.clone(),
                observer.clone(),
            );
            let doc = DocumentFile::from_path(file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            workflow.select_file(doc)?;
            workflow.choose_language(language.as_str())?;

            let job_id = match workflow.submit().await.context("Conversion failed")? {
                SubmitOutcome::Submitted { job_id } => job_id,
                SubmitOutcome::AlreadySubmitting => bail!("A conversion is already running"),
            };
            directory
                .reconcile(&job_id)
                .await
                .context("Failed to refresh conversions")?;
            println!("{}", artifacts.locate(&job_id));

            if let Some(path) = output {
                let bytes = artifacts
                    .download(&job_id, path)
                    .await
                    .context("Download failed")?;
                if !cli.quiet {
                    eprintln!("{} {} bytes → {}", green("✔"), bytes, bold(&path.display().to_string()));
                }
            }
        }
        Command::List { json } => {
            let jobs = directory.list().await.context("Failed to list conversions")?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&jobs).context("Failed to serialise conversions")?
                );
            } else {
                print_jobs(&jobs, &artifacts);
            }
        }
        Command::Delete { ref id } => {
            let id = JobId::new(id.as_str());
            if !artifacts.delete(&id).await.context("Delete failed")? {
                eprintln!("{} no conversion {} (nothing to delete)", dim("·"), id);
            } else if !cli.quiet {
                eprintln!("{} deleted conversion {}", green("✔"), bold(id.as_str()));
            }
        }
        Command::Download { ref id, ref output } => {
            let id = JobId::new(id.as_str());
            let path = output
                .clone()
                .unwrap_or_else(|| PathBuf::from(format!("{id}.wav")));
            let bytes = artifacts
                .download(&id, &path)
                .await
                .context("Download failed")?;
            if !cli.quiet {
                eprintln!("{} {} bytes → {}", green("✔"), bytes, bold(&path.display().to_string()));
            }
        }
        Command::Register | Command::Locate { .. } | Command::Languages => {}
    }

    scope.unmount();
    gate.sign_out().await;
    Ok(())
}

fn firebase_config(cli: &Cli) -> Result<FirebaseConfig> {
    let Some(ref key) = cli.api_key else {
        bail!("A Firebase API key is required (--api-key or PDF2AUDIO_FIREBASE_API_KEY)");
    };
    let mut config = FirebaseConfig::new(key.clone());
    if let Some(ref token) = cli.google_id_token {
        config.federated_provider = Some("google.com".to_string());
        config.federated_id_token = Some(token.clone());
    }
    Ok(config)
}

fn credentials(cli: &Cli) -> Result<(&str, &str)> {
    match (cli.email.as_deref(), cli.password.as_deref()) {
        (Some(e), Some(p)) => Ok((e, p)),
        _ => bail!("--email and --password are required"),
    }
}

/// Start the identity gate and wait for the provider's first report.
async fn start_gate(cli: &Cli) -> Result<IdentityGate> {
    let provider = FirebaseIdentityProvider::new(firebase_config(cli)?)
        .context("Identity provider setup failed")?;
    let gate = IdentityGate::start(Arc::new(provider));
    gate.wait_resolved().await?;
    Ok(gate)
}

async fn sign_in(cli: &Cli) -> Result<IdentityGate> {
    let gate = start_gate(cli).await?;
    if cli.google_id_token.is_some() && cli.password.is_none() {
        gate.authenticate_with_federated_provider()
            .await
            .context("Google sign-in failed")?;
    } else {
        let (email, password) = credentials(cli)?;
        gate.authenticate(email, password)
            .await
            .context("Sign-in failed")?;
    }
    Ok(gate)
}

fn print_jobs(jobs: &[ConversionJob], artifacts: &ArtifactAccess) {
    if jobs.is_empty() {
        eprintln!("{}", dim("No conversions yet."));
        return;
    }
    for job in jobs {
        println!(
            "{:>6}  {:<40}  {:<16}  {:<9}  {}",
            job.id(),
            job.filename(),
            job.language().language().to_string(),
            job.status().as_str(),
            artifacts.link_for(job).unwrap_or_else(|| dim("—")),
        );
    }
}

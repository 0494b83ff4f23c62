//! Command-line interface for callqa.
//!
//! Provides commands for watching an analysis until it settles, submitting
//! transcripts, uploading call audio, and showing the resolved configuration.

use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};

use crate::adapters::{AnalysisApiClient, DEFAULT_AGENT_ID};
use crate::config::{self, ResolvedConfig};
use crate::core::{AnalysisStatusResolver, DemoCatalog, PollProfile};
use crate::domain::{ResolutionOutcome, ResolutionUpdate};

pub mod render;

/// callqa - Call QA analysis client
#[derive(Parser, Debug)]
#[command(name = "callqa")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Wait for a call's analysis to settle and show it
    Watch {
        /// Call ID (e.g. call_3f9a1c2e)
        call_id: String,

        /// Polling budget to use
        #[arg(short, long, value_enum, default_value = "live")]
        profile: ProfileArg,

        /// Demo data file consulted when the call is not found
        #[arg(long)]
        demo: Option<PathBuf>,

        /// Print the full analysis payload and transcript
        #[arg(long)]
        json: bool,
    },

    /// Submit a transcript for analysis
    Analyze {
        /// Transcript file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Call ID to use (the service generates one if omitted)
        #[arg(long)]
        call_id: Option<String>,

        /// Print the call ID and exit without waiting
        #[arg(long)]
        no_wait: bool,
    },

    /// Upload call audio for transcription and analysis
    Upload {
        /// Audio file (wav, mp3, m4a, ...)
        audio: PathBuf,

        /// Agent who handled the call
        #[arg(long, default_value = DEFAULT_AGENT_ID)]
        agent_id: String,

        /// Print the call ID and exit without waiting
        #[arg(long)]
        no_wait: bool,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Polling profile for CLI (maps to PollProfile)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProfileArg {
    /// Transcript from a live call (short budget)
    Live,

    /// Uploaded recording (long budget)
    Upload,
}

impl From<ProfileArg> for PollProfile {
    fn from(p: ProfileArg) -> Self {
        match p {
            ProfileArg::Live => PollProfile::Live,
            ProfileArg::Upload => PollProfile::Upload,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Watch {
                call_id,
                profile,
                demo,
                json,
            } => watch(&call_id, profile.into(), demo, json).await,
            Commands::Analyze {
                input,
                call_id,
                no_wait,
            } => analyze(input, call_id, no_wait).await,
            Commands::Upload {
                audio,
                agent_id,
                no_wait,
            } => upload(&audio, &agent_id, no_wait).await,
            Commands::Config => show_config(),
        }
    }
}

/// Watch a call and exit non-zero on failure or timeout
async fn watch(
    call_id: &str,
    profile: PollProfile,
    demo: Option<PathBuf>,
    full_json: bool,
) -> Result<()> {
    let config = config::config()?;
    let demo = demo_data(demo, config);

    let outcome = watch_call(config, call_id, profile, demo.as_deref()).await?;
    finish(call_id, outcome, full_json)
}

/// Submit a transcript, then watch it with the live budget
async fn analyze(input_file: Option<PathBuf>, call_id: Option<String>, no_wait: bool) -> Result<()> {
    let transcript = if let Some(path) = input_file {
        std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read transcript file: {}", path.display()))?
    } else if !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        buffer
    } else {
        anyhow::bail!("No transcript provided. Use --input <file> or pipe to stdin");
    };

    let config = config::config()?;
    let client = AnalysisApiClient::from_settings(&config.api)?;
    let submitted = client
        .submit_transcript(&transcript, call_id.as_deref())
        .await?;

    eprintln!("[Queued {} ({})]", submitted.call_id, submitted.status);
    if no_wait {
        println!("{}", submitted.call_id);
        return Ok(());
    }

    let demo = demo_data(None, config);
    let outcome = watch_call(
        config,
        &submitted.call_id,
        PollProfile::Live,
        demo.as_deref(),
    )
    .await?;
    finish(&submitted.call_id, outcome, false)
}

/// Upload audio, then watch it with the upload budget
async fn upload(audio: &Path, agent_id: &str, no_wait: bool) -> Result<()> {
    let config = config::config()?;
    let client = AnalysisApiClient::from_settings(&config.api)?;
    let submitted = client.upload_audio(audio, agent_id).await?;

    eprintln!("[Uploaded {} as {}]", audio.display(), submitted.call_id);
    if no_wait {
        println!("{}", submitted.call_id);
        return Ok(());
    }

    let demo = demo_data(None, config);
    let outcome = watch_call(
        config,
        &submitted.call_id,
        PollProfile::Upload,
        demo.as_deref(),
    )
    .await?;
    finish(&submitted.call_id, outcome, false)
}

/// Demo catalog for a watch: the `--demo` flag wins over config and env
fn demo_data(flag: Option<PathBuf>, config: &ResolvedConfig) -> Option<PathBuf> {
    flag.or_else(|| config.demo_data.clone())
}

/// Waiting line; `attempt` counts every request, including not-found ones
fn progress_line(attempt: u32) -> String {
    format!(
        "[{}] Analyzing call intelligence... (attempt {})",
        Utc::now().format("%H:%M:%S"),
        attempt
    )
}

/// Resolve one call, printing a waiting line per attempt.
///
/// Returns `None` if the user interrupted with Ctrl-C.
pub async fn watch_call(
    config: &ResolvedConfig,
    call_id: &str,
    profile: PollProfile,
    demo: Option<&Path>,
) -> Result<Option<ResolutionOutcome>> {
    let client = AnalysisApiClient::from_settings(&config.api)?;
    let policy = config.policy(profile);
    let mut resolver = AnalysisStatusResolver::new(Arc::new(client), policy);

    if let Some(path) = demo {
        let catalog = DemoCatalog::from_file(path)?;
        tracing::debug!(entries = catalog.len(), path = %path.display(), "Loaded demo data");
        resolver = resolver.with_fallback(catalog);
    }

    let mut handle = resolver.resolve(call_id);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            update = handle.next() => match update {
                Some(ResolutionUpdate::Polling { attempt }) => {
                    eprintln!("{}", progress_line(attempt));
                }
                Some(ResolutionUpdate::Settled(outcome)) => return Ok(Some(outcome)),
                None => anyhow::bail!("Invalid call ID: '{}'", call_id),
            },
            _ = &mut ctrl_c => {
                handle.cancel();
                eprintln!("\n[Cancelled]");
                return Ok(None);
            }
        }
    }
}

/// Print the outcome; failures and timeouts exit with status 1
fn finish(call_id: &str, outcome: Option<ResolutionOutcome>, full_json: bool) -> Result<()> {
    let Some(outcome) = outcome else {
        std::process::exit(130);
    };

    let rendered = render::render_outcome(call_id, &outcome, full_json);
    if outcome.is_error() {
        eprint!("{}", rendered);
        std::process::exit(1);
    }

    print!("{}", rendered);
    Ok(())
}

/// Show resolved configuration
fn show_config() -> Result<()> {
    let config = config::reload_config()?;

    println!("Config file: {}", display_opt(config.config_file.as_deref()));
    println!("API base URL: {}", config.api.base_url);
    println!("Request timeout: {}s", config.api.request_timeout_seconds);
    println!("Poll interval: {}ms", config.polling.interval_ms);
    println!("Not-found budget: {}", config.polling.not_found_retry_budget);
    for profile in [PollProfile::Live, PollProfile::Upload] {
        let policy = config.policy(profile);
        println!(
            "Profile {:?}: {} attempts (max wait {:?})",
            profile,
            policy.max_attempts,
            policy.max_wait()
        );
    }
    println!("Demo data: {}", display_opt(config.demo_data.as_deref()));

    Ok(())
}

fn display_opt(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none)".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_watch_command() {
        let cli = Cli::try_parse_from([
            "callqa", "watch", "call_42", "--profile", "upload", "--json",
        ])
        .unwrap();

        match cli.command {
            Commands::Watch {
                call_id,
                profile,
                json,
                ..
            } => {
                assert_eq!(call_id, "call_42");
                assert_eq!(PollProfile::from(profile), PollProfile::Upload);
                assert!(json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_upload_defaults_agent_id() {
        let cli = Cli::try_parse_from(["callqa", "upload", "call.wav"]).unwrap();
        match cli.command {
            Commands::Upload {
                agent_id, no_wait, ..
            } => {
                assert_eq!(agent_id, "agent_007");
                assert!(!no_wait);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    fn config_with_demo(demo: Option<&str>) -> ResolvedConfig {
        ResolvedConfig {
            api: Default::default(),
            polling: Default::default(),
            demo_data: demo.map(PathBuf::from),
            config_file: None,
        }
    }

    #[test]
    fn test_configured_demo_data_applies_without_flag() {
        let config = config_with_demo(Some("/srv/callqa/demo_calls.yaml"));
        assert_eq!(
            demo_data(None, &config),
            Some(PathBuf::from("/srv/callqa/demo_calls.yaml"))
        );
    }

    #[test]
    fn test_demo_flag_overrides_config() {
        let config = config_with_demo(Some("/srv/callqa/demo_calls.yaml"));
        assert_eq!(
            demo_data(Some(PathBuf::from("local.yaml")), &config),
            Some(PathBuf::from("local.yaml"))
        );
        assert_eq!(demo_data(None, &config_with_demo(None)), None);
    }

    #[test]
    fn test_progress_line_shows_attempt_without_budget() {
        let line = progress_line(7);
        assert!(line.ends_with("(attempt 7)"));
        assert!(!line.contains('/'));
    }
}

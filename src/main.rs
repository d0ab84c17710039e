use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use reachy_bridge::config::TtsProviderKind;
use reachy_bridge::{
    ActionCommand, ActionGate, Announcer, Config, DaemonRobot, LoggingRobot, Robot,
    SpeechSynthesizer, TextToSpeech,
};

/// How long a normal exit waits for announcements still speaking
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Reachy Bridge - Drive Reachy Mini from perception action commands
#[derive(Parser)]
#[command(name = "reachy-bridge", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file (defaults to ~/.config/reachy-bridge/config.toml)
    #[arg(long, env = "REACHY_BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Robot daemon URL
    #[arg(long)]
    robot_url: Option<String>,

    /// Log directives instead of driving a robot
    #[arg(long)]
    no_robot: bool,

    /// Disable spoken announcements
    #[arg(long)]
    no_announce: bool,

    /// Media backend the bridge expects, advisory ("default", "gstreamer", "webrtc")
    #[arg(long)]
    media_backend: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Execute newline-delimited JSON commands from stdin
    Run,
    /// Execute a single action
    Execute {
        /// Action tag (e.g. "acknowledge")
        action: String,
        /// Emotion label passed with the action
        #[arg(short, long)]
        emotion: Option<String>,
    },
    /// List recorded moves available on the robot
    Moves,
    /// List supported action tags
    Actions,
    /// Speak one emotion announcement
    Say {
        /// Emotion label to announce
        emotion: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,reachy_bridge=info",
        1 => "info,reachy_bridge=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(url) = &cli.robot_url {
        config.robot.url = url
            .parse()
            .with_context(|| format!("invalid --robot-url {url}"))?;
    }
    if let Some(backend) = cli.media_backend {
        config.robot.media_backend = backend;
    }
    if cli.no_announce {
        config.announce.enabled = false;
    }
    tracing::debug!(?config, "loaded configuration");

    let mut gate = build_gate(&config, cli.no_robot)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Actions => {
            for action in gate.supported_actions() {
                println!("{action}");
            }
            Ok(())
        }
        Command::Moves => {
            connect(&mut gate).await?;
            let moves = gate.list_moves().await;
            gate.disconnect().await;
            for name in moves? {
                println!("{name}");
            }
            Ok(())
        }
        Command::Execute { action, emotion } => {
            connect(&mut gate).await?;
            let mut command = ActionCommand::new(action);
            if let Some(emotion) = emotion {
                command = command.with_emotion(emotion);
            }
            let success = gate.execute(&command).await;
            gate.shutdown(FLUSH_TIMEOUT).await;
            anyhow::ensure!(success, "action {} failed", command.action_type);
            Ok(())
        }
        Command::Say { emotion } => {
            connect(&mut gate).await?;
            let spoken = gate.announce_now(&emotion).await;
            gate.disconnect().await;
            if !spoken? {
                tracing::info!("nothing to announce");
            }
            Ok(())
        }
        Command::Run => {
            connect(&mut gate).await?;
            let outcome = process_stdin(&mut gate).await;
            // Ctrl-C abandons announcements, end of input lets them finish
            if matches!(outcome, Ok(false)) {
                gate.shutdown(FLUSH_TIMEOUT).await;
            } else {
                gate.disconnect().await;
            }
            outcome.map(|_| ())
        }
    }
}

/// Assemble the gate from configuration
fn build_gate(config: &Config, no_robot: bool) -> anyhow::Result<ActionGate> {
    let robot: Arc<dyn Robot> = if no_robot {
        tracing::info!("running without robot, directives are logged only");
        Arc::new(LoggingRobot::new())
    } else {
        Arc::new(DaemonRobot::new(
            config.robot.url.clone(),
            config.robot.moves_dataset.clone(),
            config.robot.media_backend.clone(),
            config.robot.request_timeout,
        )?)
    };

    let mut gate = ActionGate::new(robot)
        .with_action_interval(config.actions.interval)
        .with_extra_actions(&config.actions.extra);

    if config.announce.enabled {
        let announce = &config.announce;
        let synthesizer: Arc<dyn SpeechSynthesizer> = match announce.provider {
            TtsProviderKind::Google => Arc::new(TextToSpeech::new_google()),
            TtsProviderKind::OpenAi => Arc::new(TextToSpeech::new_openai(
                announce.openai_api_key.clone().unwrap_or_default(),
                announce.voice.clone(),
                announce.speed,
                announce.model.clone(),
            )?),
        };
        let announcer = Announcer::new(synthesizer)
            .with_language(announce.language.clone())
            .with_template(announce.template.clone());
        gate = gate.with_announcer(announcer, announce.interval);
    }

    Ok(gate)
}

async fn connect(gate: &mut ActionGate) -> anyhow::Result<()> {
    anyhow::ensure!(gate.connect().await, "could not connect to robot");
    Ok(())
}

/// Execute commands from stdin until EOF or Ctrl-C
///
/// Returns `true` when stopped by Ctrl-C.
async fn process_stdin(gate: &mut ActionGate) -> anyhow::Result<bool> {
    tracing::info!(
        announce = gate.announcements_enabled(),
        "reading action commands from stdin"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    loop {
        let line = tokio::select! {
            _ = &mut interrupt => {
                tracing::info!("interrupted, shutting down");
                return Ok(true);
            }
            line = lines.next_line() => line.context("failed to read stdin")?,
        };

        let Some(line) = line else {
            tracing::info!("input closed, shutting down");
            return Ok(false);
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match ActionCommand::from_json(line) {
            Ok(command) => {
                let success = gate.execute(&command).await;
                tracing::info!(
                    action = %command.action_type,
                    emotion = command.emotion(),
                    success,
                    "command processed"
                );
            }
            Err(e) => tracing::warn!(error = %e, "skipping malformed command"),
        }
    }
}

//! chatbox CLI: voice-enabled chat with a remote assistant

mod logging;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chatbox_engine::{
    synthesizer_from_config, AssistantClient, Config, ConversationController, Effect,
    HttpAssistant, SpeechEvent,
};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{debug, warn};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Chat with a remote assistant and hear its replies
#[derive(Parser)]
#[command(name = "chatbox")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: <config dir>/chatbox/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Assistant endpoint URL
    #[arg(long, global = true, value_name = "URL")]
    endpoint: Option<String>,

    /// Key sent with every request
    #[arg(long, global = true, value_name = "KEY", env = "CHATBOX_API_KEY")]
    api_key: Option<String>,

    /// Start with voice replies turned off
    #[arg(long, global = true)]
    no_voice: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chat UI (default when no command specified)
    Tui,

    /// Send one message and print the reply
    Ask {
        /// Message to send
        message: String,

        /// Read the reply aloud
        #[arg(long)]
        speak: bool,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration as JSON
    Config,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        None | Some(Commands::Tui) => {
            logging::setup_logging_for_terminal_ui(cli.verbose);
            let config = effective_config(&cli)?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(cmd_tui(config))
        }
        Some(Commands::Ask {
            ref message,
            speak,
        }) => {
            logging::setup_logging(cli.verbose);
            let config = effective_config(&cli)?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(cmd_ask(config, message, speak))
        }
        Some(Commands::Init { force }) => {
            logging::setup_logging(cli.verbose);
            cmd_init(cli.config.as_deref(), force)
        }
        Some(Commands::Config) => {
            logging::setup_logging(cli.verbose);
            let config = effective_config(&cli)?;
            cmd_config(&config)
        }
    }
}

/// Config file path from the flag or the platform default.
fn config_path(flag: Option<&Path>) -> Option<PathBuf> {
    flag.map(Path::to_path_buf).or_else(Config::default_path)
}

/// Load the config file and apply command-line overrides.
fn effective_config(cli: &Cli) -> CliResult<Config> {
    let mut config = match config_path(cli.config.as_deref()) {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            Config::load_or_default(&path)?
        }
        None => Config::default(),
    };
    apply_overrides(&mut config, cli);
    Ok(config)
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint.clone_from(endpoint);
    }
    if let Some(key) = &cli.api_key {
        config.api_key = Some(key.clone());
    }
    if cli.no_voice {
        config.auto_speak = false;
    }
}

async fn cmd_tui(config: Config) -> CliResult<()> {
    let assistant: Arc<dyn AssistantClient> = Arc::new(HttpAssistant::from_config(&config));
    let (speech_tx, speech_rx) = mpsc::unbounded_channel();
    let speech = synthesizer_from_config(&config.speech, speech_tx);
    chatbox_tui::run_tui(&config, assistant, speech, speech_rx).await
}

async fn cmd_ask(config: Config, message: &str, speak: bool) -> CliResult<()> {
    let assistant = HttpAssistant::from_config(&config);
    let (speech_tx, mut speech_rx) = mpsc::unbounded_channel();
    let mut speech = synthesizer_from_config(&config.speech, speech_tx);
    let mut controller = ConversationController::new(speak);

    let mut effects = controller.submit(message);
    if effects.is_empty() {
        return Err("message is empty".into());
    }

    while !effects.is_empty() {
        let mut next = Vec::new();
        for effect in effects {
            match effect {
                Effect::RequestReply(request) => {
                    let result = assistant.send(request).await;
                    next.extend(controller.receive_reply(result));
                }
                Effect::Notify(notification) if notification.is_error() => {
                    return Err(notification.description.into());
                }
                Effect::Notify(notification) => {
                    debug!(title = %notification.title, "notification");
                }
                Effect::CancelSpeech => speech.cancel(),
                Effect::Speak { id, text } => {
                    if let Some(reply) = controller.conversation().last() {
                        println!("{}", reply.text());
                    }
                    if let Err(e) = speech.speak(id, &text) {
                        warn!(error = %e, "speech playback failed");
                        continue;
                    }
                    wait_for_speech(&mut speech_rx, &mut controller, id).await;
                }
            }
        }
        effects = next;
    }

    // Nothing was spoken, so the reply has not been printed yet.
    if !speak {
        if let Some(reply) = controller.conversation().last() {
            println!("{}", reply.text());
        }
    }
    Ok(())
}

/// Block until utterance `id` ends or fails.
async fn wait_for_speech(
    events: &mut chatbox_engine::SpeechEventReceiver,
    controller: &mut ConversationController,
    id: chatbox_engine::UtteranceId,
) {
    while let Some(event) = events.recv().await {
        controller.speech_event(event);
        match event {
            SpeechEvent::Ended(done) if done == id => break,
            SpeechEvent::Failed(done) if done == id => {
                warn!(%id, "speech playback failed");
                break;
            }
            _ => {}
        }
    }
}

fn cmd_init(flag: Option<&Path>, force: bool) -> CliResult<()> {
    let path = config_path(flag).ok_or("could not determine a config directory; use --config")?;

    if path.exists() && !force {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }

    Config::default().save(&path)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

fn cmd_config(config: &Config) -> CliResult<()> {
    let mut shown = config.clone();
    if shown.api_key.is_some() {
        shown.api_key = Some("********".into());
    }
    println!("{}", serde_json::to_string_pretty(&shown)?);
    Ok(())
}

//! Text chat with a bot from the terminal.
//!
//! Usage:
//!   BOT_APP_KEY=... cargo run --example console -- --language en --start-message "#intro"
//!
//! Lines are sent as text turns. `/pause`, `/resume`, `/stop` and `/quit` control the session.

use std::sync::Arc;

use anyhow::Context;
use bot_session::types::SessionStatus;
use bot_session::{
    AudioSource, BotError, BotMessage, Completion, Config, MessageKind, SessionClient, SessionHandler, SessionOptions,
    Sound, SpeechSetup, TextInputOptions,
};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Clone)]
#[command(author, version, about = "Chat with a bot from the terminal")]
struct Args {
    /// Conversation language
    #[arg(short, long, default_value = "en")]
    language: String,

    /// Message sent when the session starts
    #[arg(short, long)]
    start_message: Option<String>,

    /// Send the start message as soon as the server is ready
    #[arg(long)]
    auto_start: bool,

    /// Ask the server for synthesized speech
    #[arg(long)]
    tts: bool,
}

struct ConsoleHandler;

impl SessionHandler for ConsoleHandler {
    fn set_status(&self, status: SessionStatus) {
        println!("[{}]", status);
    }

    fn add_message(&self, message: BotMessage) {
        let who = match message.kind {
            MessageKind::Sent => "you",
            MessageKind::Received => "bot",
        };
        if !message.text.is_empty() {
            println!("{}: {}", who, message.text);
        }
        if let Some(image) = message.image {
            println!("{}: <image {}>", who, image);
        }
    }

    fn add_video(&self, url: &str, done: Completion) {
        println!("bot: <video {}>", url);
        done.done();
    }

    fn play_audio(&self, audio: AudioSource, done: Completion) {
        match audio {
            AudioSource::Uri(uri) => println!("bot: <audio {}>", uri),
            AudioSource::Frame(frame) => println!("bot: <audio {} bytes>", frame.len()),
        }
        done.done();
    }

    fn play_sound(&self, sound: Sound) {
        tracing::debug!("sound {}", sound.name());
    }

    fn handle_command(&self, command: &str, payload: Option<&serde_json::Value>) {
        println!("bot: #{} {}", command, payload.map(|p| p.to_string()).unwrap_or_default());
    }

    fn on_error(&self, error: &BotError) {
        eprintln!("error: {}", error);
    }

    fn on_end(&self) {
        println!("(session went to sleep, type to wake it up)");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::from_env().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level().as_str()))
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    let mut options = SessionOptions::new(config.app_key())
        .with_language(&args.language)
        .with_input_audio(false)
        .with_output_audio(args.tts)
        .with_tts(args.tts)
        .with_auto_start(args.auto_start);
    if let Some(message) = &args.start_message {
        options = options.with_start_message(message);
    }

    let client = SessionClient::init(config, options, Arc::new(ConsoleHandler), SpeechSetup::text_only())
        .await
        .context("failed to start session")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" => break,
            "/pause" => client.pause()?,
            "/resume" => client.resume()?,
            "/stop" => client.on_stop_click()?,
            text => client.handle_on_text_input(text, false, TextInputOptions::default())?,
        }
    }

    client.shutdown().await?;
    Ok(())
}

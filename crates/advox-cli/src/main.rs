//! advox CLI — standalone advisor TTS server.
//!
//! ```text
//! advox serve [--port 8001] [--host 0.0.0.0] [--breadcrumb-log <path>]
//! advox speak "hello world" [--voice en-US-GuyNeural] [--advisor zen] [--output out.mp3]
//! advox voices / health [--server ...]
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use advox_lib::breadcrumb::Trail;
use advox_lib::edge::EdgeEngine;
use advox_lib::server::{AppState, router};

/// advox — advisor text-to-speech server
#[derive(Parser)]
#[command(name = "advox", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the advox TTS server
    Serve {
        /// Listen port
        #[arg(long, default_value = "8001")]
        port: u16,
        /// Listen host
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Breadcrumb trail file
        #[arg(long, default_value = "breadcrumb-debug.log")]
        breadcrumb_log: PathBuf,
        /// Disable the breadcrumb trail file (tracing only)
        #[arg(long)]
        no_breadcrumb_file: bool,
    },
    /// Synthesize text through a running server and save the audio
    Speak {
        /// Text to synthesize
        text: String,
        /// Explicit voice (ignored when --advisor is set)
        #[arg(long)]
        voice: Option<String>,
        /// Advisor id to route through
        #[arg(long)]
        advisor: Option<String>,
        /// Output file
        #[arg(long, default_value = "speech.mp3")]
        output: PathBuf,
        /// Server URL
        #[arg(long, default_value = "http://localhost:8001")]
        server: String,
    },
    /// List available voices
    Voices {
        #[arg(long, default_value = "http://localhost:8001")]
        server: String,
    },
    /// Check server health
    Health {
        #[arg(long, default_value = "http://localhost:8001")]
        server: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            port,
            host,
            breadcrumb_log,
            no_breadcrumb_file,
        } => {
            let log_file = (!no_breadcrumb_file).then_some(breadcrumb_log);
            let trail = Arc::new(Trail::new("EdgeTTSService", log_file));
            let state = AppState::new(Arc::new(EdgeEngine::new()), trail);
            let app = router(state);

            let addr = format!("{host}:{port}");
            info!("advox listening on {addr}");

            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .expect("failed to bind");

            axum::serve(listener, app).await.expect("server error");
        }

        Command::Speak {
            text,
            voice,
            advisor,
            output,
            server,
        } => {
            let client = reqwest::Client::new();
            let response = match advisor {
                Some(id) => client
                    .post(format!("{server}/synthesize/advisor/{id}"))
                    .json(&serde_json::json!({ "text": text }))
                    .send()
                    .await
                    .expect("request failed"),
                None => client
                    .post(format!("{server}/synthesize"))
                    .json(&serde_json::json!({ "text": text, "voice": voice }))
                    .send()
                    .await
                    .expect("request failed"),
            };

            if !response.status().is_success() {
                eprintln!(
                    "synthesis failed ({}): {}",
                    response.status(),
                    response.text().await.unwrap_or_default()
                );
                std::process::exit(1);
            }

            let audio = response.bytes().await.expect("failed to read audio");
            std::fs::write(&output, &audio).expect("failed to write output");
            println!("wrote {} bytes to {}", audio.len(), output.display());
        }

        Command::Voices { server } => get_json(&server, "voices").await,
        Command::Health { server } => get_json(&server, "health").await,
    }
}

async fn get_json(server: &str, endpoint: &str) {
    let response = reqwest::Client::new()
        .get(format!("{server}/{endpoint}"))
        .send()
        .await
        .expect("request failed");
    println!("{}", response.text().await.unwrap_or_default());
}

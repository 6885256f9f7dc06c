use std::path::PathBuf;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use serde_json::{Value, json};
use tracing::info;
use tracing_subscriber::EnvFilter;

use watson_sdk::core::conversation::{Conversation, ListParams, MessageParams};
use watson_sdk::core::discovery::{Discovery, QueryParams};
use watson_sdk::core::speech_to_text::{
    RecognitionOptions, RecognizeParams, RecognizeStreamParams, SpeechToText,
};
use watson_sdk::{SdkConfig, ServiceKind};

/// Audio is streamed over the WebSocket in chunks of this size.
const STREAM_CHUNK_SIZE: usize = 8192;

/// Watson CLI - call Conversation, Discovery and Speech-to-Text from the shell
#[derive(Parser, Debug)]
#[command(name = "watson")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List Speech-to-Text models
    Models,

    /// Transcribe an audio file
    Recognize {
        /// Audio file to transcribe
        file: PathBuf,

        /// Audio MIME type, e.g. audio/wav or audio/flac
        #[arg(short = 't', long = "content-type", default_value = "audio/wav")]
        content_type: String,

        /// Recognition model
        #[arg(short = 'm', long)]
        model: Option<String>,

        /// Stream over the WebSocket interface and print final transcripts
        #[arg(long)]
        stream: bool,
    },

    /// List asynchronous recognition jobs, or show one
    Jobs {
        /// Job id
        id: Option<String>,
    },

    /// List Conversation workspaces
    Workspaces {
        #[arg(long)]
        page_limit: Option<u32>,
    },

    /// Send one message to a Conversation workspace
    Message {
        #[arg(short = 'w', long)]
        workspace_id: String,

        /// User input text
        text: String,
    },

    /// List Discovery environments
    Environments,

    /// Query a Discovery collection
    Query {
        #[arg(short = 'e', long)]
        environment_id: String,

        #[arg(short = 'C', long)]
        collection_id: String,

        /// Natural language query
        #[arg(short = 'q', long)]
        query: Option<String>,

        #[arg(short = 'f', long)]
        filter: Option<String>,

        #[arg(long, default_value_t = 10)]
        count: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Must be installed before any TLS connection is attempted
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    let config = if let Some(config_path) = cli.config {
        info!("Loading configuration from {}", config_path.display());
        SdkConfig::from_file(&config_path).map_err(|e| anyhow!(e.to_string()))?
    } else {
        SdkConfig::from_env().map_err(|e| anyhow!(e.to_string()))?
    };

    let output = match cli.command {
        Commands::Models => {
            let stt = SpeechToText::new(config.service(ServiceKind::SpeechToText).clone())?;
            stt.get_models().await?
        }
        Commands::Recognize {
            file,
            content_type,
            model,
            stream,
        } => {
            let stt = SpeechToText::new(config.service(ServiceKind::SpeechToText).clone())?;
            let options = RecognitionOptions {
                model,
                ..Default::default()
            };
            if stream {
                stream_file(&stt, file, content_type, options).await?
            } else {
                stt.recognize(&RecognizeParams {
                    audio: file.into(),
                    content_type,
                    options,
                    ..Default::default()
                })
                .await?
            }
        }
        Commands::Jobs { id } => {
            let stt = SpeechToText::new(config.service(ServiceKind::SpeechToText).clone())?;
            match id {
                Some(id) => stt.get_recognition_job(&id).await?,
                None => stt.get_recognition_jobs().await?,
            }
        }
        Commands::Workspaces { page_limit } => {
            let conversation = Conversation::new(config.service(ServiceKind::Conversation).clone())?;
            conversation
                .list_workspaces(&ListParams {
                    page_limit,
                    ..Default::default()
                })
                .await?
        }
        Commands::Message { workspace_id, text } => {
            let conversation = Conversation::new(config.service(ServiceKind::Conversation).clone())?;
            conversation
                .message(&MessageParams {
                    workspace_id,
                    input: Some(json!({ "text": text })),
                    ..Default::default()
                })
                .await?
        }
        Commands::Environments => {
            let discovery = Discovery::new(config.service(ServiceKind::Discovery).clone())?;
            discovery.get_environments(None).await?
        }
        Commands::Query {
            environment_id,
            collection_id,
            query,
            filter,
            count,
        } => {
            let discovery = Discovery::new(config.service(ServiceKind::Discovery).clone())?;
            discovery
                .query(&QueryParams {
                    environment_id,
                    collection_id,
                    natural_language_query: query,
                    filter,
                    count: Some(count),
                    ..Default::default()
                })
                .await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Push a file through the WebSocket interface and collect final transcripts.
async fn stream_file(
    stt: &SpeechToText,
    file: PathBuf,
    content_type: String,
    options: RecognitionOptions,
) -> anyhow::Result<Value> {
    let audio = tokio::fs::read(&file)
        .await
        .map_err(|e| anyhow!("Failed to read {}: {}", file.display(), e))?;

    let mut stream = stt
        .recognize_stream(RecognizeStreamParams {
            options,
            ..RecognizeStreamParams::new(content_type)
        })
        .await?;

    for chunk in audio.chunks(STREAM_CHUNK_SIZE) {
        stream.send_audio(chunk.to_vec()).await?;
    }
    stream.finish().await?;

    let mut transcripts = Box::pin(stream.transcripts());
    let mut results = Vec::new();
    while let Some(transcript) = transcripts.next().await {
        let transcript = transcript?;
        info!(transcript = %transcript, "Final transcript");
        results.push(transcript);
    }

    Ok(json!({ "transcripts": results }))
}

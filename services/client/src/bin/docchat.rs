//! services/client/src/bin/docchat.rs

use client_lib::{
    adapters::HttpBackend,
    config::Config,
    error::ClientError,
    views::{ChatView, ClientApp, ClientState, SubmitOutcome},
};
use docchat_core::domain::{format_file_size, CandidateFile, PageCursor, Role, SummaryRequest};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "Commands: /summary [page], /page <current> <count>, /document, /new <file>, /quit. Anything else is a question.";

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded. Backend at {}", config.backend_url);

    // --- 2. Build the Backend Adapter & Shared State ---
    let backend = HttpBackend::from_config(&config)?;
    let app = ClientApp::new(ClientState::with_http_backend(config.clone(), backend));

    // --- 3. Upload the Initial Document ---
    let path = std::env::args()
        .nth(1)
        .ok_or_else(|| ClientError::Internal("usage: docchat <file>".to_string()))?;
    let mut chat = Some(intake(&app, &config, &path).await?);
    println!("{}", HELP);

    // --- 4. Conversation Loop ---
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let mut words = line.split_whitespace();
        match words.next() {
            Some("/quit") => break,
            Some("/new") => {
                app.start_new_upload();
                chat = None;
                match words.next() {
                    Some(path) => match intake(&app, &config, path).await {
                        Ok(view) => chat = Some(view),
                        Err(e) => error!("Upload failed: {}", e),
                    },
                    None => println!("Usage: /new <file>"),
                }
            }
            _ => match chat.as_mut() {
                Some(view) => handle_line(view, line).await,
                None => {
                    if let Err(route) = app.open_chat() {
                        println!("No document is active ({:?}). Use /new <file> first.", route);
                    }
                }
            },
        }
    }

    info!("Goodbye.");
    Ok(())
}

/// Selects, uploads, and opens the chat view for one file, printing progress as it goes.
async fn intake(app: &ClientApp, config: &Config, path: &str) -> Result<ChatView, ClientError> {
    let bytes = tokio::fs::read(path).await?;
    let filename = Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    let file = CandidateFile::new(filename, mime_for(path), bytes);
    println!("{} ({})", file.filename, format_file_size(file.byte_size()));

    if let Err(e) = app.select_file(file) {
        println!("{}", e);
        return Err(e.into());
    }

    let upload = app.upload();
    tokio::pin!(upload);
    let mut ticks = tokio::time::interval(config.progress.tick);
    let result = loop {
        tokio::select! {
            result = &mut upload => break result,
            _ = ticks.tick() => {
                eprint!("\rUploading... {}%", app.intake().progress_percent);
            }
        }
    };
    eprintln!();

    match result {
        Ok(document) => {
            let chunks = document
                .chunk_count
                .map(|n| format!(", {} chunks indexed", n))
                .unwrap_or_default();
            println!("Uploaded successfully{}.", chunks);
        }
        Err(e) => {
            if let Some(message) = app.intake().error_message {
                println!("{}", message);
            }
            return Err(e.into());
        }
    }

    app.open_chat()
        .map_err(|route| ClientError::Internal(format!("chat view refused, redirected to {:?}", route)))
}

async fn handle_line(chat: &mut ChatView, line: &str) {
    let mut words = line.split_whitespace();
    match words.next() {
        Some("/summary") => {
            let summary = match words.next().map(str::parse::<u32>) {
                Some(Ok(page)) => match chat.summarize_page(page).await {
                    Ok(summary) => summary,
                    Err(e) => return println!("{}", e),
                },
                Some(Err(_)) => return println!("Usage: /summary [page]"),
                None => chat.summarize_document().await,
            };
            print_summary(&summary);
        }
        Some("/page") => {
            let parsed = (
                words.next().and_then(|w| w.parse::<u32>().ok()),
                words.next().and_then(|w| w.parse::<u32>().ok()),
            );
            match parsed {
                (Some(current), Some(count)) if current >= 1 && current <= count => {
                    chat.set_page_cursor(PageCursor { current, count });
                    if let Some(summary) = chat.summarize_current_page().await {
                        print_summary(&summary);
                    }
                }
                _ => println!("Usage: /page <current> <count>"),
            }
        }
        Some("/document") => match chat.fetch_document().await {
            Ok(bytes) => println!("Fetched {}.", format_file_size(bytes.len() as u64)),
            Err(e) => println!("Could not fetch the document: {}", e),
        },
        _ => match chat.ask(line).await {
            SubmitOutcome::Answered => {
                if let Some(answer) = chat.thread().messages().last().filter(|m| m.role == Role::Assistant) {
                    println!("{}", answer.text);
                    if !answer.sources.is_empty() {
                        println!("  Sources: {}", answer.sources.join(", "));
                    }
                    if let Some(confidence) = answer.confidence {
                        println!("  Confidence: {:.1}%", confidence * 100.0);
                    }
                }
            }
            SubmitOutcome::Failed => {
                if let Some(message) = chat.thread().error() {
                    println!("{}", message);
                }
            }
            SubmitOutcome::Ignored => {}
        },
    }
}

fn print_summary(summary: &SummaryRequest) {
    println!("[{}] {}", summary.scope, summary.text.as_deref().unwrap_or(""));
}

fn mime_for(path: &str) -> &'static str {
    match Path::new(path).extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => "application/pdf",
        Some(ext) if ext.eq_ignore_ascii_case("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

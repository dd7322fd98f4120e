use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use dashmap::DashMap;
use serde_json::json;

use crate::api::dto::{AnalyzeResponse, CommandReq, FixResponse, SourceParams};
use crate::application::{FileOutcome, FixUsecase, Mode, SourceFile};
use crate::domain::analyzers::Analyzer;
use crate::domain::fix::FixOptions;
use crate::infrastructure::CSharpParser;

/// Shared by every connection.
pub struct ServerState {
    analyzers: Vec<Box<dyn Analyzer>>,
    options: FixOptions,
    /// Last known text per document uri.
    documents: DashMap<String, String>,
    shutdown: AtomicBool,
}

impl ServerState {
    pub fn new(analyzers: Vec<Box<dyn Analyzer>>, options: FixOptions) -> Self {
        Self {
            analyzers,
            options,
            documents: DashMap::new(),
            shutdown: AtomicBool::new(false),
        }
    }
}

pub struct Server {
    listener: TcpListener,
    state: Arc<ServerState>,
}

impl Server {
    pub fn bind(address: &str, state: ServerState) -> Result<Self> {
        let listener = TcpListener::bind(address)
            .with_context(|| format!("Failed to bind to {}", address))?;
        Ok(Self {
            listener,
            state: Arc::new(state),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until a client sends `SHUTDOWN`.
    pub fn run(self) -> Result<()> {
        let address = self.local_addr()?;
        tracing::info!(%address, "API server listening");

        for stream in self.listener.incoming() {
            if self.state.shutdown.load(Ordering::SeqCst) {
                break;
            }
            match stream {
                Ok(stream) => {
                    let state = Arc::clone(&self.state);
                    thread::spawn(move || {
                        if let Err(e) = handle_connection(stream, &state, address) {
                            tracing::warn!("connection error: {e:#}");
                        }
                    });
                }
                Err(e) => tracing::warn!("accept error: {e}"),
            }
        }
        tracing::info!("API server stopped");
        Ok(())
    }
}

pub fn start_server(port: u16, state: ServerState) -> Result<()> {
    Server::bind(&format!("127.0.0.1:{}", port), state)?.run()
}

fn handle_connection(mut stream: TcpStream, state: &ServerState, address: SocketAddr) -> Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let (response, shutdown) = match process_command(trimmed, state) {
            Ok((data, shutdown)) => (
                json!({
                    "status": "success",
                    "data": data
                }),
                shutdown,
            ),
            Err(e) => (
                json!({
                    "status": "error",
                    "message": format!("{e:#}")
                }),
                false,
            ),
        };

        let response_str = serde_json::to_string(&response)?;
        stream.write_all(response_str.as_bytes())?;
        stream.write_all(b"\n")?;

        if shutdown {
            tracing::info!("shutdown requested");
            state.shutdown.store(true, Ordering::SeqCst);
            // Wake the accept loop so it observes the flag.
            let _ = TcpStream::connect(address);
            break;
        }
    }
    Ok(())
}

/// Returns the response payload and whether the server should stop.
fn process_command(json_str: &str, state: &ServerState) -> Result<(serde_json::Value, bool)> {
    let req: CommandReq = serde_json::from_str(json_str).context("Invalid JSON format")?;

    match req.command.as_str() {
        "PING" => Ok((json!("PONG"), false)),
        "ANALYZE" => {
            let outcome = run(state, req.params, Mode::Analyze)?;
            Ok((serde_json::to_value(AnalyzeResponse::from(outcome))?, false))
        }
        "FIX" => {
            let outcome = run(state, req.params, Mode::Fix)?;
            if let Some(text) = &outcome.rewritten {
                state
                    .documents
                    .insert(outcome.path.display().to_string(), text.clone());
            }
            Ok((serde_json::to_value(FixResponse::from(outcome))?, false))
        }
        "SHUTDOWN" => Ok((json!("Shutting down..."), true)),
        _ => anyhow::bail!("Unknown command: {}", req.command),
    }
}

fn run(state: &ServerState, params: Option<serde_json::Value>, mode: Mode) -> Result<FileOutcome> {
    let params: SourceParams = match params {
        Some(value) => serde_json::from_value(value).context("Invalid params")?,
        None => anyhow::bail!("Missing params"),
    };
    let file = resolve_source(state, &params)?;

    let mut options = state.options.clone();
    if let Some(policy) = params.member_policy {
        options.member_policy = policy;
    }
    let usecase = FixUsecase {
        parser: &CSharpParser,
        analyzers: &state.analyzers,
        options,
        mode,
    };
    let outcome = usecase.process(&file);
    if let Some(error) = &outcome.error {
        anyhow::bail!("{}", error);
    }
    Ok(outcome)
}

fn resolve_source(state: &ServerState, params: &SourceParams) -> Result<SourceFile> {
    let uri = params
        .uri
        .clone()
        .or_else(|| params.path.as_ref().map(|p| p.display().to_string()))
        .unwrap_or_else(|| "untitled.cs".to_string());

    let text = if let Some(text) = &params.text {
        state.documents.insert(uri.clone(), text.clone());
        text.clone()
    } else if let Some(cached) = state.documents.get(&uri) {
        cached.value().clone()
    } else if let Some(path) = &params.path {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file {}", path.display()))?
    } else {
        anyhow::bail!("Unknown document '{}': send 'text' or 'path'", uri);
    };

    Ok(SourceFile {
        path: PathBuf::from(uri),
        text,
    })
}

//! carto-server: JSON-RPC 2.0 server for carto (stdio transport).
//!
//! Methods: `initialize` (set the project root), `addFile` (stream one
//! file into the store), `resolve` (map caller-supplied locations to
//! node ranges), `crud` (full structural report via the semantic
//! analyzer), `ping`.
//!
//! Transport: newline-delimited JSON-RPC messages over stdio. All
//! logging goes to stderr; stdout is reserved for JSON-RPC only.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use carto_core::{CartoError, Range};
use carto_syntax::{Location, SourceStore};

pub mod analyzer;
pub mod assemble;

pub use analyzer::{worklist_of, NullAnalyzer, SemanticAnalyzer};

// ── JSON-RPC Types ──────────────────────────────────────────────────────────

/// JSON-RPC 2.0 request.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    /// Absent for notifications (no response expected).
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

impl JsonRpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

// ── Request/Response Params ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitializeParams {
    root_path: String,
}

#[derive(Debug, Deserialize)]
struct AddFileParams {
    path: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ResolveParams {
    locations: Vec<Location>,
}

/// One entry of the `resolve` response: the input location and its
/// resolved range, or `null` when it matched no node of its category.
#[derive(Debug, Serialize)]
struct ResolvedLocation {
    offset: usize,
    target: carto_syntax::TargetKind,
    range: Option<Range>,
}

// ── Server ──────────────────────────────────────────────────────────────────

/// The analysis server. Holds the current source store behind a
/// swappable handle and the semantic-analyzer collaborator.
///
/// `initialize` installs a fresh store; queries in flight against a
/// superseded store keep their own `Arc` and are unaffected.
pub struct Server {
    store: Mutex<Option<Arc<SourceStore>>>,
    analyzer: Box<dyn SemanticAnalyzer>,
}

impl Server {
    pub fn new(analyzer: Box<dyn SemanticAnalyzer>) -> Self {
        Self {
            store: Mutex::new(None),
            analyzer,
        }
    }

    /// Run the server. Reads newline-delimited JSON-RPC from stdin,
    /// writes responses to stdout. Blocks until stdin is closed.
    pub fn run(&self) -> io::Result<()> {
        tracing::info!("carto {} listening on stdio", env!("CARGO_PKG_VERSION"));

        let stdin = io::stdin();
        let stdout = io::stdout();
        let mut stdout = stdout.lock();

        for line in stdin.lock().lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let request: JsonRpcRequest = match serde_json::from_str(&line) {
                Ok(req) => req,
                Err(e) => {
                    let resp =
                        JsonRpcResponse::error(Value::Null, -32700, format!("Parse error: {e}"));
                    write_response(&mut stdout, &resp)?;
                    continue;
                }
            };

            // Notifications (no id) don't get a response.
            if request.id.is_none() {
                tracing::debug!("notification: {}", request.method);
                continue;
            }

            let id = request.id.unwrap();
            let response = self.handle_request(&request.method, request.params.as_ref(), id);
            write_response(&mut stdout, &response)?;
        }

        Ok(())
    }

    pub fn handle_request(
        &self,
        method: &str,
        params: Option<&Value>,
        id: Value,
    ) -> JsonRpcResponse {
        let result = match method {
            "initialize" => self.rpc_initialize(params),
            "addFile" => self.rpc_add_file(params),
            "resolve" => self.rpc_resolve(params),
            "crud" => self.rpc_crud(),
            "ping" => Ok(json!({})),
            _ => {
                return JsonRpcResponse::error(id, -32601, format!("Method not found: {method}"))
            }
        };

        match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => {
                tracing::warn!("{method} failed: {e}");
                JsonRpcResponse::error(id, error_code(&e), e.to_string())
            }
        }
    }

    /// The current store handle, cloned out of the state mutex so the
    /// lock is never held across parsing or analysis.
    fn current_store(&self) -> Result<Arc<SourceStore>, CartoError> {
        self.store
            .lock()
            .unwrap()
            .clone()
            .ok_or(CartoError::NotInitialized)
    }

    fn rpc_initialize(&self, params: Option<&Value>) -> Result<Value, CartoError> {
        let p: InitializeParams = parse_params(params)?;
        let fresh = Arc::new(SourceStore::new(PathBuf::from(&p.root_path)));
        *self.store.lock().unwrap() = Some(fresh);
        tracing::info!("initialized project root {}", p.root_path);
        Ok(json!("ok"))
    }

    fn rpc_add_file(&self, params: Option<&Value>) -> Result<Value, CartoError> {
        let p: AddFileParams = parse_params(params)?;
        self.current_store()?.put_file(&p.path, p.content)?;
        Ok(json!("ok"))
    }

    fn rpc_resolve(&self, params: Option<&Value>) -> Result<Value, CartoError> {
        let p: ResolveParams = parse_params(params)?;
        let snapshot = self.current_store()?.snapshot()?;
        let resolution = carto_syntax::resolve(&snapshot, &p.locations);

        let locations: Vec<ResolvedLocation> = p
            .locations
            .iter()
            .map(|&l| ResolvedLocation {
                offset: l.offset,
                target: l.target,
                range: resolution.get(l).and_then(|s| snapshot.table().range(s)),
            })
            .collect();

        Ok(json!({ "locations": locations }))
    }

    fn rpc_crud(&self) -> Result<Value, CartoError> {
        let snapshot = self.current_store()?.snapshot()?;
        let summary = self.analyzer.analyze(&snapshot)?;
        let resolution = carto_syntax::resolve(&snapshot, &worklist_of(&summary));
        let report = assemble::assemble(&summary, &resolution, snapshot.table());
        Ok(serde_json::to_value(report)?)
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Option<&Value>) -> Result<T, CartoError> {
    let value = params.cloned().unwrap_or(Value::Null);
    Ok(serde_json::from_value(value)?)
}

fn error_code(err: &CartoError) -> i64 {
    match err {
        CartoError::InvalidPath { .. } | CartoError::Json(_) => -32602,
        _ => -32603,
    }
}

fn write_response(out: &mut impl Write, response: &JsonRpcResponse) -> io::Result<()> {
    let json = serde_json::to_string(response)?;
    writeln!(out, "{json}")?;
    out.flush()
}

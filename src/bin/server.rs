//! HTTP boundary for the NLQ engine.
//!
//! Hand-rolled HTTP over tokio TCP: a request line, a handful of routes, JSON
//! bodies in and out, permissive CORS for the UI. The analytic answer arrives
//! from the orchestrator as a provenance-tagged string; this layer parses the
//! tag back out and shapes the envelope the frontend expects.

use nlq_engine::config::Config;
use nlq_engine::dashboard;
use nlq_engine::invoice_suite::{self, InvoiceClient};
use nlq_engine::llm::{AzureOpenAiClient, TextCompletion};
use nlq_engine::processor::NlqProcessor;
use nlq_engine::renderer;
use nlq_engine::warehouse::SnowflakeClient;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info};

const MAX_REQUEST_BYTES: usize = 65536;

struct AppState {
    processor: NlqProcessor,
    completion: Arc<dyn TextCompletion>,
    invoice_client: InvoiceClient,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    config.warn_on_missing_credentials();

    let completion: Arc<dyn TextCompletion> = Arc::new(AzureOpenAiClient::from_config(&config));
    let warehouse = Arc::new(SnowflakeClient::from_config(&config));
    let state = Arc::new(AppState {
        processor: NlqProcessor::new(completion.clone(), warehouse),
        completion,
        invoice_client: InvoiceClient::from_config(&config),
    });

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("NLQ server listening on {}", addr);

    loop {
        let (stream, _addr) = listener.accept().await?;
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            handle_connection(stream, state).await;
        });
    }
}

async fn handle_connection(mut stream: TcpStream, state: Arc<AppState>) {
    match read_request(&mut stream).await {
        Ok(request) => {
            let response = handle_request(&state, &request).await;
            if let Err(e) = stream.write_all(response.as_bytes()).await {
                error!("Failed to write response: {}", e);
            }
        }
        Err(e) => {
            error!("Failed to read from stream: {}", e);
        }
    }
}

/// Read a full request: headers, then as many body bytes as Content-Length
/// announces, capped to keep a bad client from holding the buffer open.
async fn read_request(stream: &mut TcpStream) -> std::io::Result<String> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let size = stream.read(&mut chunk).await?;
        if size == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..size]);

        if let Some(header_end) = find_header_end(&buffer) {
            let headers = String::from_utf8_lossy(&buffer[..header_end]);
            let content_length = headers
                .lines()
                .find_map(|line| {
                    let (key, value) = line.split_once(':')?;
                    if key.trim().eq_ignore_ascii_case("content-length") {
                        value.trim().parse::<usize>().ok()
                    } else {
                        None
                    }
                })
                .unwrap_or(0);
            if buffer.len() >= header_end + 4 + content_length {
                break;
            }
        }

        if buffer.len() > MAX_REQUEST_BYTES {
            break;
        }
    }

    Ok(String::from_utf8_lossy(&buffer).to_string())
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|w| w == b"\r\n\r\n")
}

async fn handle_request(state: &AppState, request: &str) -> String {
    let request_line = request.lines().next().unwrap_or("");
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() < 2 {
        return create_response(400, "Bad Request", "{}");
    }

    let method = parts[0];
    let (path, query_params) = split_path(parts[1]);

    info!("{} {}", method, path);

    match (method, path.as_str()) {
        ("POST", "/api/process-nlq") => handle_process_nlq(state, request).await,
        ("GET", "/health") => create_response(
            200,
            "OK",
            r#"{"status":"healthy","service":"nlq-processor"}"#,
        ),
        ("GET", "/api/dashboard/chat-history") => {
            let limit = query_params
                .get("limit")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10);
            let body = dashboard::chat_history(limit);
            create_response(200, "OK", &body.to_string())
        }
        ("GET", "/api/dashboard/chat-metrics") => {
            create_response(200, "OK", &dashboard::chat_metrics().to_string())
        }
        ("OPTIONS", _) => create_response(200, "OK", ""),
        _ => create_response(
            404,
            "Not Found",
            &serde_json::json!({"error": format!("Endpoint not found: {} {}", method, path)})
                .to_string(),
        ),
    }
}

fn split_path(raw: &str) -> (String, HashMap<String, String>) {
    let (path, query) = raw.split_once('?').unwrap_or((raw, ""));

    let mut path = path.trim_end_matches('/').to_string();
    if path.is_empty() {
        path = "/".to_string();
    }

    let params = query
        .split('&')
        .filter_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            Some((k.to_string(), v.to_string()))
        })
        .collect();

    (path, params)
}

fn request_body(request: &str) -> &str {
    request
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.trim())
        .unwrap_or("")
}

async fn handle_process_nlq(state: &AppState, request: &str) -> String {
    let body = request_body(request);
    let nlq = body
        .find('{')
        .and_then(|start| serde_json::from_str::<serde_json::Value>(&body[start..]).ok())
        .and_then(|json| json.get("query").and_then(|v| v.as_str()).map(String::from))
        .unwrap_or_default();

    if nlq.is_empty() {
        let envelope = serde_json::json!({
            "error": "Missing query parameter",
            "query": "",
            "sql": "",
            "results": []
        });
        return create_response(400, "Bad Request", &envelope.to_string());
    }

    info!("Processing NLQ via API: {}", nlq);
    let result = state.processor.process(&nlq).await;
    info!("Raw NLQ result: {}", result);

    // Invoice suite redirects: enrich with live collaborator data.
    if result == "genai_invoice_suite" {
        let summary = invoice_suite::accounts_payable_summary(
            state.completion.as_ref(),
            &state.invoice_client,
            &nlq,
        )
        .await;
        let envelope = serde_json::json!({
            "query": nlq,
            "message": "genai_invoice_suite",
            "summary": summary,
            "sql": "",
            "results": []
        });
        return create_response(200, "OK", &envelope.to_string());
    }

    if result == "genai_ar_suite" {
        let summary = invoice_suite::accounts_receivable_summary(
            state.completion.as_ref(),
            &state.invoice_client,
            &nlq,
        )
        .await;
        let envelope = serde_json::json!({
            "query": nlq,
            "message": "genai_ar_suite",
            "summary": summary,
            "sql": "",
            "results": []
        });
        return create_response(200, "OK", &envelope.to_string());
    }

    // Dashboard redirects are resolved by the frontend; acknowledge only.
    if result == "powerbi_financial_dashboard" {
        let envelope = serde_json::json!({
            "query": nlq,
            "message": "powerbi_financial_dashboard",
            "summary": "Processing your financial report...",
            "sql": "",
            "results": []
        });
        return create_response(200, "OK", &envelope.to_string());
    }

    if result == "powerbi_medical_dashboard" {
        let envelope = serde_json::json!({
            "query": nlq,
            "message": "powerbi_medical_dashboard",
            "summary": "Processing your medical report...",
            "sql": "",
            "results": []
        });
        return create_response(200, "OK", &envelope.to_string());
    }

    if result.contains("Error:") {
        let envelope = serde_json::json!({
            "error": result,
            "query": nlq,
            "sql": "",
            "results": []
        });
        return create_response(500, "Internal Server Error", &envelope.to_string());
    }

    // Structured answers: recover the deterministic value, add conversational
    // polish, and shape tabular rows for the frontend.
    if result.contains("(Source: Structured - financial_transactions)")
        || result.contains("(Source: Structured - medical_records)")
    {
        let results_text = result
            .find(" (Source: Structured -")
            .map(|idx| result[..idx].trim().to_string())
            .unwrap_or_else(|| result.clone());

        let summary = renderer::create_human_readable_summary(
            state.completion.as_ref(),
            &nlq,
            &results_text,
        )
        .await;

        let formatted_results = format_structured_results(&results_text);

        let envelope = serde_json::json!({
            "query": nlq,
            "sql": "Generated SQL query",
            "results": formatted_results,
            "summary": summary,
            "message": result
        });
        return create_response(200, "OK", &envelope.to_string());
    }

    if result.contains("Analysis (Source: PDF Documents)") {
        let analysis_text = result
            .split_once("Analysis (Source: PDF Documents): ")
            .map(|(_, text)| text.to_string())
            .unwrap_or_else(|| result.clone());
        let envelope = serde_json::json!({
            "query": nlq,
            "sql": "",
            "results": [],
            "summary": analysis_text,
            "message": result
        });
        return create_response(200, "OK", &envelope.to_string());
    }

    if result.contains("Summary (Source: Unstructured") {
        let summary_text = result
            .split_once("): ")
            .map(|(_, text)| text.to_string())
            .unwrap_or_else(|| result.clone());
        let envelope = serde_json::json!({
            "query": nlq,
            "sql": "",
            "results": [],
            "summary": summary_text,
            "message": result
        });
        return create_response(200, "OK", &envelope.to_string());
    }

    let envelope = serde_json::json!({
        "query": nlq,
        "sql": "",
        "results": [],
        "message": result
    });
    create_response(200, "OK", &envelope.to_string())
}

/// Shape a deterministic result for the frontend: pipe-delimited lines become
/// column objects, everything else a single value.
fn format_structured_results(results_text: &str) -> serde_json::Value {
    if results_text.contains('\n') {
        let rows: Vec<serde_json::Value> = results_text
            .trim()
            .lines()
            .map(|line| {
                if line.contains('|') {
                    let mut row = serde_json::Map::new();
                    for (i, part) in line.split('|').enumerate() {
                        row.insert(
                            format!("column_{}", i),
                            serde_json::Value::String(part.trim().to_string()),
                        );
                    }
                    serde_json::Value::Object(row)
                } else {
                    serde_json::json!({"value": line.trim()})
                }
            })
            .collect();
        serde_json::Value::Array(rows)
    } else {
        serde_json::json!([{"value": results_text}])
    }
}

fn create_response(status: u16, status_text: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {} {}\r\n\
         Content-Type: application/json\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Access-Control-Allow-Methods: GET, POST, PUT, DELETE, OPTIONS\r\n\
         Access-Control-Allow-Headers: Content-Type\r\n\
         Content-Length: {}\r\n\
         \r\n\
         {}",
        status,
        status_text,
        body.len(),
        body
    )
}

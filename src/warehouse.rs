//! Warehouse execution adapter.
//!
//! The core only depends on the [`SqlExecutor`] capability: validated SQL in,
//! ordered rows of loosely-typed values out. The concrete client speaks the
//! Snowflake SQL REST API over HTTPS; a connection-free protocol means each
//! call stands alone and nothing leaks between requests.

use crate::config::Config;
use crate::error::{NlqError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// One column value in a result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Int(i) => write!(f, "{}", i),
            SqlValue::Float(x) => write!(f, "{}", x),
            SqlValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// An ordered, fixed-arity result row.
pub type Row = Vec<SqlValue>;

/// Run-SQL-get-rows capability consumed by the orchestrator.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<Vec<Row>>;
}

/// Snowflake SQL REST API client.
#[derive(Debug, Clone)]
pub struct SnowflakeClient {
    account: String,
    user: String,
    token: String,
    warehouse: String,
    database: String,
    schema: String,
}

impl SnowflakeClient {
    pub fn from_config(config: &Config) -> Self {
        Self {
            account: config.snowflake_account.clone(),
            user: config.snowflake_user.clone(),
            token: config.snowflake_token.clone(),
            warehouse: config.snowflake_warehouse.clone(),
            database: config.snowflake_database.clone(),
            schema: config.snowflake_schema.clone(),
        }
    }

    fn statements_url(&self) -> String {
        format!(
            "https://{}.snowflakecomputing.com/api/v2/statements",
            self.account
        )
    }
}

#[async_trait]
impl SqlExecutor for SnowflakeClient {
    async fn execute(&self, sql: &str) -> Result<Vec<Row>> {
        if self.account.is_empty() || self.token.is_empty() {
            return Err(NlqError::Execution(
                "No authentication credentials provided".to_string(),
            ));
        }

        // One client per statement; the REST protocol has no session to pool.
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NlqError::Execution(format!("Failed to build HTTP client: {}", e)))?;

        let body = serde_json::json!({
            "statement": sql,
            "timeout": 60,
            "warehouse": self.warehouse,
            "database": self.database,
            "schema": self.schema,
            "parameters": {"BINARY_OUTPUT_FORMAT": "HEX"}
        });

        let response = client
            .post(self.statements_url())
            .bearer_auth(&self.token)
            .header("X-Snowflake-Authorization-Token-Type", "OAUTH")
            .header("User-Agent", format!("nlq-engine/{}", env!("CARGO_PKG_VERSION")))
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| NlqError::Execution(format!("Warehouse request failed: {}", e)))?;

        let status = response.status();
        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| NlqError::Execution(format!("Failed to parse warehouse response: {}", e)))?;

        if !status.is_success() {
            let message = payload["message"].as_str().unwrap_or("unknown error");
            return Err(NlqError::Execution(format!(
                "Warehouse returned {}: {}",
                status, message
            )));
        }

        parse_result_rows(&payload)
    }
}

/// Decode the REST API result envelope into typed rows. Snowflake serializes
/// every cell as a string; column metadata drives the coercion.
fn parse_result_rows(payload: &serde_json::Value) -> Result<Vec<Row>> {
    let row_type = payload["resultSetMetaData"]["rowType"]
        .as_array()
        .cloned()
        .unwrap_or_default();

    let data = payload["data"].as_array().ok_or_else(|| {
        let message = payload["message"].as_str().unwrap_or("no result data");
        NlqError::Execution(message.to_string())
    })?;

    let mut rows = Vec::with_capacity(data.len());
    for raw_row in data {
        let cells = raw_row
            .as_array()
            .ok_or_else(|| NlqError::Execution("Malformed result row".to_string()))?;
        let mut row = Vec::with_capacity(cells.len());
        for (idx, cell) in cells.iter().enumerate() {
            row.push(coerce_cell(cell, row_type.get(idx)));
        }
        rows.push(row);
    }
    Ok(rows)
}

fn coerce_cell(cell: &serde_json::Value, column: Option<&serde_json::Value>) -> SqlValue {
    let text = match cell {
        serde_json::Value::Null => return SqlValue::Null,
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let column_type = column
        .and_then(|c| c["type"].as_str())
        .unwrap_or("text")
        .to_lowercase();
    let scale = column.and_then(|c| c["scale"].as_i64()).unwrap_or(0);

    match column_type.as_str() {
        "fixed" if scale == 0 => text
            .parse::<i64>()
            .map(SqlValue::Int)
            .unwrap_or_else(|_| coerce_float_or_text(text)),
        "fixed" | "real" | "float" | "double" => coerce_float_or_text(text),
        _ => SqlValue::Text(text),
    }
}

fn coerce_float_or_text(text: String) -> SqlValue {
    text.parse::<f64>()
        .map(SqlValue::Float)
        .unwrap_or(SqlValue::Text(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_result_rows() {
        let payload = serde_json::json!({
            "resultSetMetaData": {
                "rowType": [
                    {"name": "PATIENT_ID", "type": "fixed", "scale": 0},
                    {"name": "TOTAL_COST", "type": "fixed", "scale": 2},
                    {"name": "DIAGNOSIS", "type": "text"}
                ]
            },
            "data": [
                ["101", "2400.50", "Hypertension"],
                ["102", "800.00", null]
            ]
        });

        let rows = parse_result_rows(&payload).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], SqlValue::Int(101));
        assert_eq!(rows[0][1], SqlValue::Float(2400.50));
        assert_eq!(rows[0][2], SqlValue::Text("Hypertension".to_string()));
        assert_eq!(rows[1][2], SqlValue::Null);
    }

    #[test]
    fn test_error_payload_surfaces_message() {
        let payload = serde_json::json!({"message": "SQL compilation error"});
        let err = parse_result_rows(&payload).unwrap_err();
        assert!(err.to_string().contains("SQL compilation error"));
    }
}

//! Result rendering.
//!
//! Two independent paths: deterministic formatting of warehouse rows (no
//! model in the loop, numeric answers must never be paraphrased) and
//! model-backed summarization for report/document content. A third,
//! presentation-only path wraps an already-final deterministic value in
//! conversational prose for the HTTP layer; it may decorate the number but
//! never recomputes it.

use crate::error::{NlqError, Result};
use crate::llm::TextCompletion;
use crate::prompts;
use crate::warehouse::{Row, SqlValue};
use tracing::warn;

/// Aggregation vocabulary that switches on exact scalar rendering.
pub const AGGREGATION_KEYWORDS: &[&str] =
    &["total", "sum", "count", "maximum", "minimum", "max", "min"];

/// Render warehouse rows as exact text.
///
/// A single-cell result for an aggregation query renders as the bare scalar:
/// integral values without a decimal point, fractional values with exactly
/// two decimals, null as `"0"`. Small result sets render as pipe-delimited
/// lines; large ones as a count plus a raw preview.
pub fn enforce_deterministic_results(rows: &[Row], nlq: &str) -> String {
    if rows.is_empty() {
        return "No results found".to_string();
    }

    let nlq_lower = nlq.to_lowercase();
    let is_aggregation = AGGREGATION_KEYWORDS.iter().any(|w| nlq_lower.contains(w));

    if is_aggregation && rows.len() == 1 && rows[0].len() == 1 {
        return render_scalar(&rows[0][0]);
    }

    if rows.len() <= 5 {
        return rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .collect::<Vec<_>>()
            .join("\n");
    }

    format!("Found {} results. First few: {:?}", rows.len(), &rows[..3])
}

fn render_scalar(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "0".to_string(),
        SqlValue::Int(i) => i.to_string(),
        SqlValue::Float(x) if x.fract() == 0.0 => format!("{}", *x as i64),
        SqlValue::Float(x) => format!("{:.2}", x),
        SqlValue::Text(s) => s.clone(),
    }
}

/// Summarize report or document content into at most four short bullets.
pub async fn summarize_unstructured(
    completion: &dyn TextCompletion,
    content: &str,
    summary_prompt: &str,
) -> Result<String> {
    let user_prompt = prompts::summarize_user_prompt(summary_prompt, content);
    let response = completion
        .complete(prompts::SUMMARIZER_SYSTEM_PROMPT, &user_prompt, 0.2, 1500)
        .await
        .map_err(|e| match e {
            NlqError::Completion(msg) => NlqError::Rendering(msg),
            other => other,
        })?;

    Ok(format_insights(&response))
}

/// Normalize a summarization response to at most 4 non-empty bulleted lines.
/// The model is asked for bullets, but the format is enforced here rather
/// than trusted.
pub fn format_insights(response: &str) -> String {
    let mut formatted = Vec::new();
    for line in response.lines() {
        let line = line.trim();
        if line.is_empty() || formatted.len() >= 4 {
            continue;
        }
        if line.starts_with('-') {
            formatted.push(line.to_string());
        } else {
            formatted.push(format!("- {}", line));
        }
    }
    formatted.join("\n")
}

/// Wrap a deterministic result in conversational prose for the UI.
///
/// Falls back to a locally formatted sentence when the completion service is
/// unavailable; the underlying value is passed through verbatim either way.
pub async fn create_human_readable_summary(
    completion: &dyn TextCompletion,
    query: &str,
    results_text: &str,
) -> String {
    let results_context = build_results_context(results_text);
    let user_prompt = prompts::conversational_user_prompt(query, &results_context);

    match completion
        .complete(prompts::CONVERSATIONAL_SYSTEM_PROMPT, &user_prompt, 0.7, 200)
        .await
    {
        Ok(response) => response.trim().to_string(),
        Err(e) => {
            warn!("conversational rendering failed, using local fallback: {}", e);
            match parse_numeric(results_text) {
                Some(value) => format!(
                    "Based on your query, the result is {}.",
                    format_currency(value)
                ),
                None => format!("Based on your query, the result is {}.", results_text),
            }
        }
    }
}

/// Reshape a deterministic result into prompt context: year-by-year tables
/// become labeled lines, scalars become currency.
fn build_results_context(results_text: &str) -> String {
    if results_text.contains('\n') {
        let lines: Vec<&str> = results_text.trim().lines().collect();
        if lines.len() > 1 && results_text.contains('|') {
            let mut formatted = String::new();
            for line in &lines {
                if let Some((left, right)) = line.split_once('|') {
                    let label = left.trim();
                    let amount = right.trim();
                    if label.len() == 4 && label.chars().all(|c| c.is_ascii_digit()) {
                        formatted.push_str(&format!("Year {}: ${}\n", label, amount));
                    } else {
                        formatted.push_str(&format!("{}: ${}\n", label, amount));
                    }
                }
            }
            return format!("Multi-year data:\n{}", formatted);
        }
        return format!("Results: {}", results_text);
    }

    match parse_numeric(results_text) {
        Some(value) => format!("Result: {}", format_currency(value)),
        None => format!("Result: {}", results_text),
    }
}

fn parse_numeric(text: &str) -> Option<f64> {
    text.trim().replace(',', "").parse::<f64>().ok()
}

/// `$1,234,567.89` style formatting, sign in front of the symbol.
pub fn format_currency(value: f64) -> String {
    let negative = value < 0.0;
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((&formatted, "00"));

    let mut grouped = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();

    if negative {
        format!("-${}.{}", grouped, frac_part)
    } else {
        format!("${}.{}", grouped, frac_part)
    }
}

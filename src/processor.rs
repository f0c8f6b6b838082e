//! NLQ Orchestrator
//!
//! Sequences classification, SQL synthesis, execution and rendering for one
//! query, and owns the outermost error boundary: [`NlqProcessor::process`]
//! never fails, it returns a tagged error string instead. Every analytic
//! answer carries exactly one provenance tag so the HTTP layer can recover
//! the backend that produced it.

use crate::classifier::{self, Category, Quarter};
use crate::error::Result;
use crate::llm::TextCompletion;
use crate::prompts;
use crate::renderer;
use crate::sql_generator;
use crate::warehouse::{Row, SqlExecutor};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

// Document retrieval for the medical PDF path bypasses synthesis: the
// relevant filters are fixed content predicates, not model output.
const MEDICAL_ANNUAL_SUMMARY_SQL: &str = "SELECT report_data:content::string as content \
FROM medical_reports \
WHERE report_data:content::string ILIKE '%ANNUAL%' \
AND report_data:content::string ILIKE '%SUMMARY%' \
LIMIT 1";

const MEDICAL_DOCUMENT_SAMPLE_SQL: &str = "SELECT report_data:content::string as content \
FROM medical_reports \
WHERE report_data:content::string IS NOT NULL \
LIMIT 5";

const MEDICAL_CONSOLIDATED_SQL: &str = "SELECT report_data:content::string AS content \
FROM medical_reports \
WHERE report_data:content::string IS NOT NULL \
ORDER BY report_data:report_date::string";

/// Which backend produced an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    Structured { table: &'static str },
    Unstructured {
        report_type: &'static str,
        consolidated: Option<i32>,
    },
    PdfDocuments,
    Redirect(Category),
    None,
}

/// Outcome of one orchestrated query: the wire-format answer plus the
/// structured facts the boundary layer may want without re-parsing it.
#[derive(Debug, Clone)]
pub struct NlqOutcome {
    pub answer: String,
    pub provenance: Provenance,
    pub sql: Option<String>,
}

/// The orchestrator. Holds the injected completion and warehouse
/// capabilities; no other state, so instances are cheap and share-nothing.
pub struct NlqProcessor {
    completion: Arc<dyn TextCompletion>,
    warehouse: Arc<dyn SqlExecutor>,
}

impl NlqProcessor {
    pub fn new(completion: Arc<dyn TextCompletion>, warehouse: Arc<dyn SqlExecutor>) -> Self {
        Self {
            completion,
            warehouse,
        }
    }

    /// Process a query end to end. Always returns a string: either a
    /// short-circuit tag, a provenance-tagged answer, or an error string of
    /// the form `Error: <message> (Source: N/A)`.
    pub async fn process(&self, nlq: &str) -> String {
        self.process_detailed(nlq).await.answer
    }

    /// Like [`process`](Self::process), but keeps the provenance and the
    /// executed SQL alongside the answer.
    pub async fn process_detailed(&self, nlq: &str) -> NlqOutcome {
        let query_id = Uuid::new_v4();
        info!("[{}] processing query: {}", query_id, nlq);

        let category = classifier::classify(nlq);
        info!("[{}] classified as: {}", query_id, category);

        if category.is_short_circuit() {
            return NlqOutcome {
                answer: category.tag().to_string(),
                provenance: Provenance::Redirect(category),
                sql: None,
            };
        }

        match self.run_analytic(nlq, category).await {
            Ok(outcome) => outcome,
            Err(e) => NlqOutcome {
                answer: format!("Error: {} (Source: N/A)", e),
                provenance: Provenance::None,
                sql: None,
            },
        }
    }

    async fn run_analytic(&self, nlq: &str, category: Category) -> Result<NlqOutcome> {
        match category {
            Category::Pdf => self.answer_from_documents(nlq).await,
            Category::Unstructured => self.answer_from_reports(nlq).await,
            _ => self.answer_from_warehouse(nlq).await,
        }
    }

    /// Structured path: synthesize, gate, execute, render deterministically.
    async fn answer_from_warehouse(&self, nlq: &str) -> Result<NlqOutcome> {
        let sql = sql_generator::nlq_to_sql(self.completion.as_ref(), nlq).await?;
        let rows = self.warehouse.execute(&sql).await?;

        let table = if classifier::is_medical_query(nlq) {
            "medical_records"
        } else {
            "financial_transactions"
        };

        let answer = if rows.is_empty() {
            format!("No results found for: {} (Source: Structured - {})", nlq, table)
        } else {
            let exact = renderer::enforce_deterministic_results(&rows, nlq);
            info!("deterministic result: {}", exact);
            format!("{} (Source: Structured - {})", exact, table)
        };

        Ok(NlqOutcome {
            answer,
            provenance: Provenance::Structured { table },
            sql: Some(sql),
        })
    }

    /// PDF path: retrieve extracted document content, then summarize it
    /// against the question.
    async fn answer_from_documents(&self, nlq: &str) -> Result<NlqOutcome> {
        let sql = if classifier::is_medical_query(nlq) {
            let nlq_lower = nlq.to_lowercase();
            if nlq_lower.contains("annual") || nlq_lower.contains("summary") {
                MEDICAL_ANNUAL_SUMMARY_SQL.to_string()
            } else {
                MEDICAL_DOCUMENT_SAMPLE_SQL.to_string()
            }
        } else {
            sql_generator::nlq_to_sql(self.completion.as_ref(), nlq).await?
        };

        let rows = self.warehouse.execute(&sql).await?;

        if rows.is_empty() {
            return Ok(NlqOutcome {
                answer: format!("No PDF content found for: {} (Source: PDF Documents)", nlq),
                provenance: Provenance::PdfDocuments,
                sql: Some(sql),
            });
        }

        let content = document_content(&rows[0]);
        let analysis = renderer::summarize_unstructured(
            self.completion.as_ref(),
            &content,
            &prompts::pdf_question_prompt(nlq),
        )
        .await?;

        Ok(NlqOutcome {
            answer: format!("Analysis (Source: PDF Documents): {}", analysis),
            provenance: Provenance::PdfDocuments,
            sql: Some(sql),
        })
    }

    /// Unstructured path: consolidated (all reports for the year) or a
    /// single quarter. Warehouse failures here downgrade to tagged error
    /// strings instead of propagating.
    async fn answer_from_reports(&self, nlq: &str) -> Result<NlqOutcome> {
        let year = classifier::extract_year(nlq);
        let medical = classifier::is_medical_query(nlq);
        let report_type = if medical {
            "medical_reports"
        } else {
            "financial_reports"
        };

        if classifier::wants_consolidation(nlq) {
            self.answer_consolidated(nlq, year, medical, report_type).await
        } else {
            self.answer_single_quarter(nlq, year, medical, report_type).await
        }
    }

    async fn answer_consolidated(
        &self,
        nlq: &str,
        year: i32,
        medical: bool,
        report_type: &'static str,
    ) -> Result<NlqOutcome> {
        let report_sql = if medical {
            MEDICAL_CONSOLIDATED_SQL.to_string()
        } else {
            format!(
                "SELECT report_data:content::string AS content \
                 FROM financial_reports \
                 WHERE YEAR(TO_DATE(report_data:report_date::string)) = {} \
                 ORDER BY TO_DATE(report_data:report_date::string)",
                year
            )
        };
        info!("consolidated report SQL: {}", report_sql);

        let provenance = Provenance::Unstructured {
            report_type,
            consolidated: Some(year),
        };

        let answer = match self.warehouse.execute(&report_sql).await {
            Ok(rows) if !rows.is_empty() => {
                let contents: Vec<String> = rows.iter().filter_map(cell_text).collect();
                let combined = contents.join("\n\n");
                info!("combined {} reports, total length {}", contents.len(), combined.len());

                let summary = renderer::summarize_unstructured(
                    self.completion.as_ref(),
                    &combined,
                    &prompts::consolidation_prompt(year, nlq),
                )
                .await?;
                format!(
                    "Summary (Source: Unstructured - {}, Consolidated {}): {}",
                    report_type, year, summary
                )
            }
            Ok(_) => format!(
                "No report data found for year {} (Source: Unstructured - {}, Consolidated {}).",
                year, report_type, year
            ),
            Err(e) => format!(
                "Error retrieving consolidated report data: {} (Source: Unstructured - {}, Consolidated {})",
                e, report_type, year
            ),
        };

        Ok(NlqOutcome {
            answer,
            provenance,
            sql: Some(report_sql),
        })
    }

    async fn answer_single_quarter(
        &self,
        nlq: &str,
        year: i32,
        medical: bool,
        report_type: &'static str,
    ) -> Result<NlqOutcome> {
        let quarter = Quarter::from_query(nlq);
        let quarter_date = quarter.unwrap_or(Quarter::Q1).report_date(year);

        let report_sql = if medical {
            let quarter_text = quarter.map(|q| q.label()).unwrap_or("Q1");
            let quarter_key = quarter.map(|q| q.key()).unwrap_or("q1");
            format!(
                "SELECT report_data:content::string \
                 FROM medical_reports \
                 WHERE (report_data:content::string ILIKE '%{qt}%' \
                 OR report_data:content::string ILIKE '%{qt} {year}%' \
                 OR report_data:file_name::string ILIKE '%{qk}_%{year}%') \
                 AND report_data:content::string IS NOT NULL",
                qt = quarter_text,
                qk = quarter_key,
                year = year
            )
        } else {
            format!(
                "SELECT report_data:content::string FROM financial_reports WHERE report_data:report_date::date = '{}'",
                quarter_date
            )
        };
        info!("quarter report SQL: {}", report_sql);

        let provenance = Provenance::Unstructured {
            report_type,
            consolidated: None,
        };

        let answer = match self.warehouse.execute(&report_sql).await {
            Ok(rows) => match rows.first().and_then(cell_text) {
                Some(content) => {
                    let summary = renderer::summarize_unstructured(
                        self.completion.as_ref(),
                        &content,
                        nlq,
                    )
                    .await?;
                    format!("Summary (Source: Unstructured - {}): {}", report_type, summary)
                }
                None => {
                    let quarter_label = quarter.map(|q| q.label()).unwrap_or("quarter");
                    format!(
                        "No report data found for {} (Source: Unstructured - {}).",
                        quarter_label, report_type
                    )
                }
            },
            Err(e) => format!(
                "Error retrieving report data: {} (Source: Unstructured - {})",
                e, report_type
            ),
        };

        Ok(NlqOutcome {
            answer,
            provenance,
            sql: Some(report_sql),
        })
    }
}

/// First cell of a row as non-empty text.
fn cell_text(row: &Row) -> Option<String> {
    let value = row.first()?;
    if value.is_null() {
        return None;
    }
    let text = value.to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Extract document content from a retrieval row: single column is the
/// content, two columns are filename + content, anything wider ends with the
/// content.
fn document_content(row: &Row) -> String {
    let value = match row.len() {
        0 => None,
        1 => row.first(),
        2 => row.get(1),
        _ => row.last(),
    };

    match value {
        Some(v) if !v.is_null() && !v.to_string().is_empty() => v.to_string(),
        _ => "No content found".to_string(),
    }
}

//! SQL Synthesizer
//!
//! Turns a natural-language query into a candidate Snowflake SELECT via the
//! completion service, then repairs and validates it:
//!
//! 1. strip markdown code fences the model may emit despite instructions;
//! 2. auto-inject a `YEAR(...)` constraint when the statement touches a
//!    transactional table without any recognizable year scoping;
//! 3. re-parse any statement the injector modified, rejecting malformed
//!    splices;
//! 4. run the safety gate.
//!
//! No retries here: a transport failure or empty completion surfaces as a
//! synthesis error to the caller.

use crate::classifier::extract_year;
use crate::error::{NlqError, Result};
use crate::llm::TextCompletion;
use crate::prompts;
use crate::sql_safety;
use sqlparser::dialect::SnowflakeDialect;
use sqlparser::parser::Parser;
use tracing::{debug, info};

/// Generate, repair and validate SQL for a natural-language query.
pub async fn nlq_to_sql(completion: &dyn TextCompletion, nlq: &str) -> Result<String> {
    let prompt = prompts::sql_generation_prompt(nlq);

    let raw = completion
        .complete(prompts::SQL_GENERATOR_SYSTEM_PROMPT, &prompt, 0.0, 2000)
        .await
        .map_err(|e| match e {
            NlqError::Completion(msg) => NlqError::Synthesis(msg),
            other => other,
        })?;

    let sql = strip_code_fences(&raw);
    if sql.is_empty() {
        return Err(NlqError::Synthesis(
            "Completion service returned no SQL".to_string(),
        ));
    }

    let (sql, injected) = inject_year_constraint(&sql, nlq);
    if injected {
        debug!("injected year constraint: {}", sql);
        check_parses(&sql)?;
    }

    sql_safety::validate(&sql, nlq)?;

    info!("synthesized SQL: {}", sql);
    Ok(sql)
}

/// Remove residual markdown fence markers from a completion.
pub fn strip_code_fences(text: &str) -> String {
    text.trim()
        .replace("```sql", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Splice a `YEAR(<date_col>) = <year>` predicate into a statement over
/// `FINANCIAL_TRANSACTIONS` or `MEDICAL_RECORDS` that carries no
/// recognizable year filter. Returns the (possibly rewritten) statement and
/// whether it was modified.
///
/// When a `WHERE` clause exists the predicate is ANDed in front of the
/// existing condition; otherwise a new clause is placed before `GROUP BY`,
/// then `ORDER BY`, then at the end of the statement.
pub fn inject_year_constraint(sql: &str, nlq: &str) -> (String, bool) {
    let sql_upper = sql.to_uppercase();

    let references_financial = sql_upper.contains("FINANCIAL_TRANSACTIONS");
    let references_medical = sql_upper.contains("MEDICAL_RECORDS");
    if !references_financial && !references_medical {
        return (sql.to_string(), false);
    }

    let year = extract_year(nlq);
    let year_marker = format!("= {}", year);
    let has_year_filter = sql_upper.contains("YEAR(")
        || sql_upper.contains(&year_marker)
        || sql_upper.contains("TRANSACTION_DATE")
        || sql_upper.contains("VISIT_DATE");
    if has_year_filter {
        return (sql.to_string(), false);
    }

    let date_column = if references_financial {
        "transaction_date"
    } else {
        "visit_date"
    };
    let constraint = format!("YEAR({}) = {}", date_column, year);

    let rewritten = if sql_upper.contains("WHERE") {
        sql.replacen(" WHERE ", &format!(" WHERE {} AND ", constraint), 1)
            .replacen(" where ", &format!(" WHERE {} AND ", constraint), 1)
    } else if sql_upper.contains("GROUP BY") {
        sql.replacen(" GROUP BY", &format!(" WHERE {} GROUP BY", constraint), 1)
            .replacen(" group by", &format!(" WHERE {} GROUP BY", constraint), 1)
    } else if sql_upper.contains("ORDER BY") {
        sql.replacen(" ORDER BY", &format!(" WHERE {} ORDER BY", constraint), 1)
            .replacen(" order by", &format!(" WHERE {} ORDER BY", constraint), 1)
    } else {
        format!("{} WHERE {}", sql.trim_end_matches(';'), constraint)
    };

    let modified = rewritten != sql;
    (rewritten, modified)
}

/// Syntactic sanity check on a rewritten statement. The splice heuristics
/// above can misfire on unusual clause layouts; a statement that no longer
/// parses must not reach the warehouse.
fn check_parses(sql: &str) -> Result<()> {
    Parser::parse_sql(&SnowflakeDialect {}, sql).map_err(|e| {
        NlqError::Security(format!(
            "SECURITY ERROR: year constraint injection produced invalid SQL ({})",
            e
        ))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(
            strip_code_fences("```sql\nSELECT 1\n```"),
            "SELECT 1"
        );
        assert_eq!(strip_code_fences("  SELECT 1  "), "SELECT 1");
    }

    #[test]
    fn test_injects_into_existing_where() {
        let (sql, modified) = inject_year_constraint(
            "SELECT SUM(amount) FROM FINANCIAL_TRANSACTIONS WHERE amount > 0",
            "total revenue in 2026",
        );
        assert!(modified);
        assert_eq!(
            sql,
            "SELECT SUM(amount) FROM FINANCIAL_TRANSACTIONS WHERE YEAR(transaction_date) = 2026 AND amount > 0"
        );
    }

    #[test]
    fn test_injects_before_group_by() {
        let (sql, modified) = inject_year_constraint(
            "SELECT category, SUM(amount) FROM FINANCIAL_TRANSACTIONS GROUP BY category",
            "revenue by category",
        );
        assert!(modified);
        assert_eq!(
            sql,
            "SELECT category, SUM(amount) FROM FINANCIAL_TRANSACTIONS WHERE YEAR(transaction_date) = 2025 GROUP BY category"
        );
    }

    #[test]
    fn test_injects_before_order_by() {
        let (sql, modified) = inject_year_constraint(
            "SELECT amount FROM FINANCIAL_TRANSACTIONS ORDER BY amount DESC",
            "largest amounts",
        );
        assert!(modified);
        assert!(sql.contains("WHERE YEAR(transaction_date) = 2025 ORDER BY"));
    }

    #[test]
    fn test_appends_where_and_strips_semicolon() {
        let (sql, modified) =
            inject_year_constraint("SELECT SUM(amount) FROM FINANCIAL_TRANSACTIONS;", "sum");
        assert!(modified);
        assert_eq!(
            sql,
            "SELECT SUM(amount) FROM FINANCIAL_TRANSACTIONS WHERE YEAR(transaction_date) = 2025"
        );
    }

    #[test]
    fn test_medical_uses_visit_date() {
        let (sql, modified) = inject_year_constraint(
            "SELECT COUNT(*) FROM MEDICAL_RECORDS",
            "patient count",
        );
        assert!(modified);
        assert!(sql.ends_with("WHERE YEAR(visit_date) = 2025"));
    }

    #[test]
    fn test_no_injection_when_already_scoped() {
        let original =
            "SELECT SUM(amount) FROM FINANCIAL_TRANSACTIONS WHERE YEAR(transaction_date) = 2025";
        let (sql, modified) = inject_year_constraint(original, "total revenue");
        assert!(!modified);
        assert_eq!(sql, original);
    }

    #[test]
    fn test_no_injection_for_report_tables() {
        let original = "SELECT report_data FROM FINANCIAL_REPORTS";
        let (sql, modified) = inject_year_constraint(original, "q2 summary");
        assert!(!modified);
        assert_eq!(sql, original);
    }

    #[test]
    fn test_injected_statements_parse() {
        let (sql, modified) = inject_year_constraint(
            "SELECT category, SUM(amount) FROM FINANCIAL_TRANSACTIONS GROUP BY category ORDER BY category",
            "revenue by category",
        );
        assert!(modified);
        assert!(check_parses(&sql).is_ok());
    }
}

//! Prompt templates for SQL synthesis, summarization and conversational
//! rendering.
//!
//! The SQL generation prompt embeds the whitelisted warehouse schema and a
//! curated set of exemplar NL-to-SQL mappings for both domains. Exemplars are
//! load-bearing: they steer the model toward year-scoped, whitelist-only
//! SELECTs that the safety gate will accept.

/// System prompt for SQL generation.
pub const SQL_GENERATOR_SYSTEM_PROMPT: &str = "You are a helpful SQL generator for Snowflake.";

/// System prompt for report/document summarization.
pub const SUMMARIZER_SYSTEM_PROMPT: &str = "You are a concise financial analyst. Provide only the 3-4 most important insights. Keep each point short and digestible. Use simple bullet points. Be extremely concise - each point should be maximum 15 words.";

/// System prompt for the conversational presentation layer.
pub const CONVERSATIONAL_SYSTEM_PROMPT: &str = "You are a professional AI assistant helping with financial and medical data analysis. Generate natural, conversational responses that are well-structured and visually appealing. Use bullet points, numbered lists, and clear formatting when presenting data. Always be helpful, concise, and provide insights. Format currency properly for financial data and medical costs. Be conversational but professional. Structure your responses with:\n\n\u{2022} Key findings as bullet points\n\u{2022} Clear insights and analysis\n\u{2022} Easy-to-scan formatting\n\u{2022} Professional but friendly tone\n\nMake the data easy to understand and visually appealing.";

/// System prompt for concise accounts-payable invoice listings.
pub const AP_VIEW_SYSTEM_PROMPT: &str = r#"You are an AI assistant for invoice information. Provide CONCISE responses.

FORMAT:
**Status**: **Count** totaling **$Amount**
• **Vendor** - **Invoice ID** - **$Amount** - Due: Date

View details in GenAI Suite dashboard below."#;

/// System prompt for concise accounts-receivable invoice listings.
pub const AR_VIEW_SYSTEM_PROMPT: &str = r#"You are an AI assistant for accounts receivable information. Provide CONCISE responses.

FORMAT:
**Status**: **Count** totaling **$Amount**
• **Customer** - **Invoice ID** - **$Amount** - Due: Date

View details in GenAI Suite dashboard below."#;

/// User prompt for the SQL generator: schema, exemplars, then the query.
pub fn sql_generation_prompt(nlq: &str) -> String {
    format!(
        r#"You are a SQL expert for Snowflake. Convert this natural language query to a valid Snowflake SQL query.

Data sources available:
- FINANCIAL_TRANSACTIONS: columns transaction_id (INTEGER), transaction_date (DATE), amount (DECIMAL(10,2)), category (VARCHAR), description (VARCHAR)
- FINANCIAL_REPORTS: column report_data (VARIANT with report_id, report_date, content, file_name, source_type) - includes both quarterly reports AND extracted PDF content
- MEDICAL_RECORDS: columns patient_id (INTEGER), visit_date (DATE), diagnosis (VARCHAR), treatment_cost (DECIMAL(10,2)), notes (VARCHAR)
- MEDICAL_REPORTS: column report_data (VARIANT with report_id, report_date, content) - includes both medical reports AND extracted PDF/JSON content

For structured calculations, use FINANCIAL_TRANSACTIONS (IGNORE company names in queries - data doesn't filter by company):
- Revenue growth: SELECT YEAR(transaction_date) as year, SUM(amount) as revenue FROM FINANCIAL_TRANSACTIONS WHERE amount > 0 GROUP BY YEAR(transaction_date) ORDER BY year
- Total revenue 2025: SELECT SUM(amount) FROM FINANCIAL_TRANSACTIONS WHERE amount > 0 AND YEAR(transaction_date) = 2025
- Total expenses 2025: SELECT SUM(ABS(amount)) FROM FINANCIAL_TRANSACTIONS WHERE amount < 0 AND YEAR(transaction_date) = 2025
- Investment total: SELECT SUM(amount) FROM FINANCIAL_TRANSACTIONS WHERE category = 'Investment' AND YEAR(transaction_date) = 2025
- Services revenue: SELECT SUM(amount) FROM FINANCIAL_TRANSACTIONS WHERE amount > 0 AND (description ILIKE '%service%' OR description ILIKE '%consulting%')
- Products sold revenue: SELECT SUM(amount) FROM FINANCIAL_TRANSACTIONS WHERE amount > 0 AND (description ILIKE '%product%' OR category ILIKE '%product%')
- Services in 2025: SELECT SUM(amount) FROM FINANCIAL_TRANSACTIONS WHERE amount > 0 AND YEAR(transaction_date) = 2025 AND (description ILIKE '%service%' OR description ILIKE '%consulting%')
- Revenue by category: SELECT category, SUM(amount) as total FROM FINANCIAL_TRANSACTIONS WHERE amount > 0 GROUP BY category ORDER BY total DESC

CRITICAL: NEVER filter by company names like "Global Revenue Corp" - use ALL transaction data regardless of company mentions.

For broad searches (services, products, consulting), use ILIKE with wildcards and check both description and category columns.

For medical structured queries, use MEDICAL_RECORDS:
- Patient cost summary: SELECT patient_id, SUM(treatment_cost) as total_cost FROM MEDICAL_RECORDS WHERE YEAR(visit_date) = 2025 GROUP BY patient_id ORDER BY total_cost DESC
- Diagnosis trends: SELECT diagnosis, COUNT(*) as count FROM MEDICAL_RECORDS WHERE YEAR(visit_date) = 2025 GROUP BY diagnosis ORDER BY count DESC
- Monthly medical costs: SELECT MONTH(visit_date) as month, SUM(treatment_cost) as monthly_cost FROM MEDICAL_RECORDS WHERE YEAR(visit_date) = 2025 GROUP BY MONTH(visit_date) ORDER BY month
- Patient visits by diagnosis: SELECT diagnosis, patient_id, visit_date, treatment_cost FROM MEDICAL_RECORDS WHERE diagnosis ILIKE '%keyword%' AND YEAR(visit_date) = 2025

For medical PDF/JSON document queries, use MEDICAL_REPORTS:
- Medical report content: SELECT report_data:content::string FROM MEDICAL_REPORTS WHERE report_data:report_id::string = 'specific_id'
- All medical reports: SELECT report_data:report_id::string, report_data:content::string FROM MEDICAL_REPORTS
- Report by date: SELECT report_data:content::string FROM MEDICAL_REPORTS WHERE report_data:report_date::string LIKE '%2025%'

For PDF document queries (annual report, invoice data, document content), use FINANCIAL_REPORTS with source_type = 'PDF':
- Annual report content: SELECT report_data:content::string FROM FINANCIAL_REPORTS WHERE report_data:source_type::string = 'PDF' AND report_data:file_name::string LIKE '%annual%'
- Q4 invoice content: SELECT report_data:content::string FROM FINANCIAL_REPORTS WHERE report_data:source_type::string = 'PDF' AND report_data:file_name::string LIKE '%invoice%'
- All PDF documents: SELECT report_data:file_name::string, report_data:content::string FROM FINANCIAL_REPORTS WHERE report_data:source_type::string = 'PDF'
- Document search: SELECT report_data:content::string FROM FINANCIAL_REPORTS WHERE report_data:source_type::string = 'PDF' AND report_data:file_name::string LIKE '%keyword%'

IMPORTANT: For PDF content queries, ALWAYS use FINANCIAL_REPORTS with source_type = 'PDF' to get actual document content, not just filenames.

For report summaries, use FINANCIAL_REPORTS or MEDICAL_REPORTS respectively.

Query: {nlq}
Return only the SQL query, no explanations, and do not include markdown formatting (e.g., no ```sql"#,
        nlq = nlq
    )
}

/// User prompt for summarization: the question plus the raw content.
pub fn summarize_user_prompt(question: &str, content: &str) -> String {
    format!(
        "Question: {}\n\nData: {}\n\nGive me ONLY the 3-4 most critical insights. Each point must be very short (max 15 words). Focus on the most important numbers and trends only. Be extremely concise and presentable.",
        question, content
    )
}

/// Summarization question for the consolidated report path.
pub fn consolidation_prompt(year: i32, nlq: &str) -> String {
    format!(
        "Consolidate highlights across all {} quarterly reports for: {}. Focus on totals/trends and provide clear actionable insights. Avoid per-quarter repetition.",
        year, nlq
    )
}

/// Summarization question for the document-content path.
pub fn pdf_question_prompt(nlq: &str) -> String {
    format!("Answer this question based on the PDF content: {}", nlq)
}

/// User prompt for the conversational presentation layer.
pub fn conversational_user_prompt(query: &str, results_context: &str) -> String {
    format!(
        "User asked: '{}'\n\nData found: {}\n\nPlease provide a natural, conversational response explaining this result. Keep it concise but informative, and make it sound like you're having a friendly conversation about the data.",
        query, results_context
    )
}

/// System prompt for accounts-payable approval confirmations.
pub fn ap_action_system_prompt(today: &str) -> String {
    format!(
        r#"You are an AI assistant for accounts payable. For approval requests, provide a detailed success confirmation.

FORMAT FOR APPROVAL CONFIRMATION:
Show approval success details professionally with all relevant information.

EXAMPLE:
**Invoice Approved Successfully ✓**

**Invoice ID**: INV-24-5848 (Tech Solutions Ltd.)
**Status Changed**: Pending Approval → APPROVED
**Invoice Amount**: $15,800.00
**Approval Method**: Manager Approval
**Approval Date**: {today}

**Payment Update**: Invoice has been queued for payment processing. Payment will be processed within 2-3 business days. Vendor notification email sent automatically.

View complete details in GenAI Suite dashboard below."#,
        today = today
    )
}

/// System prompt for accounts-receivable status-change confirmations.
pub fn ar_action_system_prompt(today: &str) -> String {
    format!(
        r#"You are an AI assistant for accounts receivable. For status change requests, provide a detailed success confirmation.

FORMAT FOR STATUS CHANGE CONFIRMATION:
Show payment success details professionally with all relevant information.

EXAMPLE:
**Payment Status Updated Successfully ✓**

**Invoice ID**: INV-AR-24-2848 (Manufacturing Plus)
**Status Changed**: Overdue → PAID
**Payment Amount**: $18,900.00
**Payment Method**: Wire Transfer
**Payment Date**: {today}

**Account Update**: Manufacturing Plus account balance is now $0.00. Customer maintains excellent payment rating. Automatic thank you email sent to customer contact.

View complete details in GenAI Suite dashboard below."#,
        today = today
    )
}

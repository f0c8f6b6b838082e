//! Query Classifier
//!
//! Maps raw natural-language query text onto a closed set of routing
//! categories. The cascade is an ordered decision table: predicates are
//! evaluated top to bottom and the first match wins. The ordering is part of
//! the routing contract because the keyword vocabularies overlap (approval
//! language beats analytic language, report language beats aggregation
//! language).
//!
//! Everything here is a pure function of the lower-cased query text so the
//! whole table is testable without network access.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Routing category for a query. Exactly one per query; classification is
/// total (unmatched queries fall through to `Structured`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Structured,
    Unstructured,
    Pdf,
    InvoiceSuite,
    ArSuite,
    FinancialDashboard,
    MedicalDashboard,
}

impl Category {
    /// Wire tag consumed by the HTTP layer for short-circuit categories.
    pub fn tag(&self) -> &'static str {
        match self {
            Category::Structured => "structured",
            Category::Unstructured => "unstructured",
            Category::Pdf => "pdf",
            Category::InvoiceSuite => "genai_invoice_suite",
            Category::ArSuite => "genai_ar_suite",
            Category::FinancialDashboard => "powerbi_financial_dashboard",
            Category::MedicalDashboard => "powerbi_medical_dashboard",
        }
    }

    /// True for the categories the orchestrator returns verbatim instead of
    /// running the analytic pipeline.
    pub fn is_short_circuit(&self) -> bool {
        matches!(
            self,
            Category::InvoiceSuite
                | Category::ArSuite
                | Category::FinancialDashboard
                | Category::MedicalDashboard
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Fiscal quarter referenced by a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    /// Lower-cased token as it appears in query text.
    pub fn key(&self) -> &'static str {
        match self {
            Quarter::Q1 => "q1",
            Quarter::Q2 => "q2",
            Quarter::Q3 => "q3",
            Quarter::Q4 => "q4",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Quarter::Q1 => "Q1",
            Quarter::Q2 => "Q2",
            Quarter::Q3 => "Q3",
            Quarter::Q4 => "Q4",
        }
    }

    /// Closing report date for the quarter in the given year.
    pub fn report_date(&self, year: i32) -> String {
        match self {
            Quarter::Q1 => format!("{}-03-31", year),
            Quarter::Q2 => format!("{}-06-30", year),
            Quarter::Q3 => format!("{}-09-30", year),
            Quarter::Q4 => format!("{}-12-31", year),
        }
    }

    /// First quarter token mentioned in the query, if any.
    pub fn from_query(nlq: &str) -> Option<Quarter> {
        let nlq_lower = nlq.to_lowercase();
        Quarter::ALL
            .iter()
            .copied()
            .find(|q| nlq_lower.contains(q.key()))
    }
}

// Accounts-payable approval workflows and AP-side tooling.
const AP_STRONG_INDICATORS: &[&str] = &[
    "approve invoice",
    "approve the invoice",
    "pending approval",
    "awaiting approval",
    "reject invoice",
    "reject the invoice",
    "accounts payable",
    "ap automation",
    "vendor invoice",
    "invoice processing",
    "invoice automation",
    "ap dashboard",
];

// Vendors that send invoices to us.
const AP_VENDOR_INDICATORS: &[&str] = &[
    "tech solutions",
    "global tech",
    "office supplies co",
    "cloud services inc",
    "consulting partners",
];

// Receivable-side tooling and collection language.
const AR_STRONG_INDICATORS: &[&str] = &[
    "accounts receivable",
    "ar automation",
    "customer invoice",
    "receivable",
    "receivables",
    "collection",
    "customer payment",
    "ar dashboard",
    "invoice sent to",
    "invoice to",
];

// Customers we send invoices to.
const AR_CUSTOMER_INDICATORS: &[&str] = &[
    "manufacturing plus",
    "techcorp",
    "global retailers",
    "service dynamics",
];

// Status mutations are a receivable-side workflow in this product.
const STATUS_ACTION_INDICATORS: &[&str] = &[
    "change status",
    "update status",
    "mark as",
    "set status",
    "change the status",
    "update the status",
    "mark it as",
    "set it to",
];

// Generic invoice nouns: could be AP or AR, payable is the product default.
const GENERAL_INVOICE_INDICATORS: &[&str] = &[
    "invoice",
    "invoices",
    "which invoices",
    "show invoices",
    "invoice status",
];

const FINANCIAL_DASHBOARD_INDICATORS: &[&str] = &[
    "financial dashboard",
    "finance dashboard",
    "financial analytics",
    "finance report",
    "financial report",
    "show financial",
    "open financial",
];

const MEDICAL_DASHBOARD_INDICATORS: &[&str] = &[
    "medical dashboard",
    "medical analytics",
    "medical report",
    "show medical",
    "open medical",
    "healthcare dashboard",
];

const PDF_INDICATORS: &[&str] = &[
    "annual report",
    "pdf",
    "document",
    "invoice",
    "q4 invoice",
    "uploaded",
    "file",
    "files",
    "annual medical summary",
    "medical report content",
    "show me the medical report",
    "content of medical report",
];

const UNSTRUCTURED_KEYWORDS: &[&str] = &[
    "summary",
    "report",
    "update",
    "highlight",
    "highlights",
    "overview",
    "annual",
    "ytd",
    "medical report",
    "medical summary",
];

const STRUCTURED_INDICATORS: &[&str] = &[
    "total",
    "sum",
    "maximum",
    "minimum",
    "max",
    "min",
    "count",
    "which month",
    "what month",
    "expense",
    "revenue",
    "amount",
    "transaction",
    "calculate",
    "find",
    "show me",
    "financials",
    "performance",
    "sold",
    "services",
    "products",
    "consulting",
    "patient",
    "diagnosis",
    "treatment",
    "cost",
    "medical",
    "visit",
    "diagnosis trends",
    "patient cost",
    "treatment cost",
    "medical cost",
];

const MEDICAL_KEYWORDS: &[&str] = &[
    "patient",
    "diagnosis",
    "treatment",
    "medical",
    "visit",
    "medical cost",
    "treatment cost",
    "patient cost",
    "diagnosis trends",
    "medical record",
    "medical report",
    "medical summary",
];

const CONSOLIDATION_KEYWORDS: &[&str] = &[
    "all",
    "overall",
    "full year",
    "annual",
    "ytd",
    "entire",
    "consolidated",
    "highlights",
    "overview",
    "reports",
    "year",
];

lazy_static! {
    static ref YEAR_RE: Regex = Regex::new(r"\b(20\d{2})\b").unwrap();
}

/// Default year applied when a query names none. Unscoped queries over
/// multi-year tables return wrong aggregates instead of erroring, so every
/// query gets pinned to some year.
pub const DEFAULT_YEAR: i32 = 2025;

fn contains_any(nlq_lower: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| nlq_lower.contains(p))
}

fn is_accounts_payable(nlq_lower: &str) -> bool {
    contains_any(nlq_lower, AP_STRONG_INDICATORS)
        || contains_any(nlq_lower, AP_VENDOR_INDICATORS)
}

fn is_accounts_receivable(nlq_lower: &str) -> bool {
    contains_any(nlq_lower, AR_STRONG_INDICATORS)
        || contains_any(nlq_lower, AR_CUSTOMER_INDICATORS)
        || contains_any(nlq_lower, STATUS_ACTION_INDICATORS)
}

fn is_generic_invoice(nlq_lower: &str) -> bool {
    contains_any(nlq_lower, GENERAL_INVOICE_INDICATORS)
}

fn is_financial_dashboard(nlq_lower: &str) -> bool {
    contains_any(nlq_lower, FINANCIAL_DASHBOARD_INDICATORS)
}

fn is_medical_dashboard(nlq_lower: &str) -> bool {
    contains_any(nlq_lower, MEDICAL_DASHBOARD_INDICATORS)
}

fn is_generic_power_bi(nlq_lower: &str) -> bool {
    nlq_lower.contains("power bi") || nlq_lower.contains("powerbi")
}

fn is_pdf_request(nlq_lower: &str) -> bool {
    contains_any(nlq_lower, PDF_INDICATORS)
}

fn is_report_request(nlq_lower: &str) -> bool {
    contains_any(nlq_lower, UNSTRUCTURED_KEYWORDS)
        || Quarter::ALL.iter().any(|q| nlq_lower.contains(q.key()))
}

fn is_aggregate_request(nlq_lower: &str) -> bool {
    contains_any(nlq_lower, STRUCTURED_INDICATORS)
}

/// The routing decision table. First matching predicate wins; the final
/// catch-all makes classification total.
const ROUTING_RULES: &[(fn(&str) -> bool, Category)] = &[
    (is_accounts_payable, Category::InvoiceSuite),
    (is_accounts_receivable, Category::ArSuite),
    (is_generic_invoice, Category::InvoiceSuite),
    (is_financial_dashboard, Category::FinancialDashboard),
    (is_medical_dashboard, Category::MedicalDashboard),
    (is_generic_power_bi, Category::FinancialDashboard),
    (is_pdf_request, Category::Pdf),
    (is_report_request, Category::Unstructured),
    (is_aggregate_request, Category::Structured),
    (|_| true, Category::Structured),
];

/// Classify a query. Deterministic and side-effect-free.
pub fn classify(nlq: &str) -> Category {
    let nlq_lower = nlq.to_lowercase();
    ROUTING_RULES
        .iter()
        .find(|(predicate, _)| predicate(&nlq_lower))
        .map(|(_, category)| *category)
        .unwrap_or(Category::Structured)
}

/// Detect whether a query targets the medical domain.
pub fn is_medical_query(nlq: &str) -> bool {
    let nlq_lower = nlq.to_lowercase();
    contains_any(&nlq_lower, MEDICAL_KEYWORDS)
}

/// True when the query asks for a cross-period view (all reports of the
/// year) rather than a single quarter. A named quarter always wins over
/// consolidation vocabulary.
pub fn wants_consolidation(nlq: &str) -> bool {
    let nlq_lower = nlq.to_lowercase();
    let has_consolidation = contains_any(&nlq_lower, CONSOLIDATION_KEYWORDS);
    has_consolidation && Quarter::from_query(nlq).is_none()
}

/// First four-digit 20xx token in the query, defaulting to [`DEFAULT_YEAR`].
pub fn extract_year(nlq: &str) -> i32 {
    YEAR_RE
        .captures(nlq)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(DEFAULT_YEAR)
}

//! Mocked dashboard feeds and keyword sentiment tagging.
//!
//! Supports the admin dashboard widgets only; no analytic logic lives here.
//! Data is synthesized per request, there is no store behind it.

use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn label(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

const POSITIVE_KEYWORDS: &[&str] = &[
    "great", "love", "perfect", "excellent", "good", "thank you", "helpful", "awesome",
];

const NEGATIVE_KEYWORDS: &[&str] = &[
    "terrible", "hate", "bad", "poor", "buggy", "slow", "not working", "issue", "problem",
    "difficult",
];

const AVATARS: &[&str] = &["👨‍💼", "👩‍💼", "👨‍💻", "👩‍🔬", "👨‍🎨", "👩‍🎨", "👨‍🏫", "👩‍🏫"];

const USERS: &[&str] = &[
    "John D.", "Sarah M.", "Mike R.", "Emma W.", "David L.", "Lisa K.", "Tom B.", "Anna S.",
];

const SAMPLE_QUERIES: &[&str] = &[
    "What's the status of invoice #12345?",
    "Can you approve my expense report?",
    "Show me pending invoices for this month",
    "How do I submit a new invoice?",
    "What's the approval workflow?",
    "Check vendor payment status",
    "Update invoice details",
    "Generate financial report",
    "This is great! Thank you for the help",
    "I love how easy this is to use",
    "The system is not working properly",
    "This is terrible, I can't find anything",
    "Perfect! Exactly what I needed",
    "The interface is slow and buggy",
];

/// Keyword-based sentiment tag for a query.
pub fn analyze_sentiment(query: &str) -> Sentiment {
    let query_lower = query.to_lowercase();
    if POSITIVE_KEYWORDS.iter().any(|k| query_lower.contains(k)) {
        Sentiment::Positive
    } else if NEGATIVE_KEYWORDS.iter().any(|k| query_lower.contains(k)) {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Mocked recent-chat feed.
pub fn chat_history(limit: usize) -> serde_json::Value {
    let mut rng = rand::thread_rng();
    let count = limit.min(SAMPLE_QUERIES.len());

    let chats: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            let query = SAMPLE_QUERIES[i % SAMPLE_QUERIES.len()];
            let response_time = (rng.gen_range(0.5..3.0) * 10.0_f64).round() / 10.0;
            json!({
                "id": i + 1,
                "user": USERS.choose(&mut rng).unwrap_or(&USERS[0]),
                "avatar": AVATARS.choose(&mut rng).unwrap_or(&AVATARS[0]),
                "query": query,
                "timestamp": format!("{} min ago", rng.gen_range(1..=30)),
                "responseTime": response_time,
                "sentiment": analyze_sentiment(query).label(),
            })
        })
        .collect();

    json!({ "chats": chats })
}

/// Mocked response-time/volume series plus sentiment percentages computed
/// over the sample queries.
pub fn chat_metrics() -> serde_json::Value {
    let response_time_data = json!([
        {"time": "9 AM", "responseTime": 1.5},
        {"time": "10 AM", "responseTime": 1.3},
        {"time": "11 AM", "responseTime": 1.1},
        {"time": "12 PM", "responseTime": 1.0},
        {"time": "1 PM", "responseTime": 1.2},
        {"time": "2 PM", "responseTime": 0.9},
    ]);

    let query_volume_data = json!([
        {"hour": "9 AM", "queries": 45},
        {"hour": "10 AM", "queries": 67},
        {"hour": "11 AM", "queries": 89},
        {"hour": "12 PM", "queries": 56},
        {"hour": "1 PM", "queries": 78},
        {"hour": "2 PM", "queries": 92},
    ]);

    let sentiments: Vec<Sentiment> = SAMPLE_QUERIES.iter().map(|q| analyze_sentiment(q)).collect();
    let total = sentiments.len() as f64;
    let percentage = |s: Sentiment| {
        let count = sentiments.iter().filter(|&&x| x == s).count() as f64;
        (count / total * 1000.0).round() / 10.0
    };

    json!({
        "avgResponseTime": 1.2,
        "responseTimeData": response_time_data,
        "queryVolumeData": query_volume_data,
        "sentimentPercentages": {
            "positive": percentage(Sentiment::Positive),
            "neutral": percentage(Sentiment::Neutral),
            "negative": percentage(Sentiment::Negative),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_keywords() {
        assert_eq!(analyze_sentiment("This is great! Thank you"), Sentiment::Positive);
        assert_eq!(analyze_sentiment("The interface is slow and buggy"), Sentiment::Negative);
        assert_eq!(analyze_sentiment("Show me pending invoices"), Sentiment::Neutral);
    }

    #[test]
    fn test_chat_history_respects_limit() {
        let feed = chat_history(5);
        assert_eq!(feed["chats"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn test_chat_metrics_percentages_sum() {
        let metrics = chat_metrics();
        let p = &metrics["sentimentPercentages"];
        let sum = p["positive"].as_f64().unwrap()
            + p["neutral"].as_f64().unwrap()
            + p["negative"].as_f64().unwrap();
        assert!((sum - 100.0).abs() < 0.5);
    }
}

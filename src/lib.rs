pub mod classifier;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod invoice_suite;
pub mod llm;
pub mod processor;
pub mod prompts;
pub mod renderer;
pub mod sql_generator;
pub mod sql_safety;
pub mod warehouse;

use anyhow::Result;
use clap::Parser;
use nlq_engine::config::Config;
use nlq_engine::llm::AzureOpenAiClient;
use nlq_engine::processor::NlqProcessor;
use nlq_engine::warehouse::SnowflakeClient;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "nlq-engine")]
#[command(about = "Natural-language analytics over financial and medical warehouse data")]
struct Args {
    /// The natural-language query; omit to start an interactive prompt
    query: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let config = Config::from_env();
    config.warn_on_missing_credentials();

    let completion = Arc::new(AzureOpenAiClient::from_config(&config));
    let warehouse = Arc::new(SnowflakeClient::from_config(&config));
    let processor = NlqProcessor::new(completion, warehouse);

    match args.query {
        Some(query) => {
            info!("Processing query: {}", query);
            let result = processor.process(&query).await;
            println!("{}", result);
        }
        None => {
            let stdin = io::stdin();
            loop {
                print!("\nEnter your NLQ (or 'exit' to quit): ");
                io::stdout().flush()?;

                let mut line = String::new();
                if stdin.lock().read_line(&mut line)? == 0 {
                    break;
                }
                let query = line.trim();
                if query.eq_ignore_ascii_case("exit") {
                    break;
                }
                if query.is_empty() {
                    continue;
                }

                let result = processor.process(query).await;
                println!("Result: {}", result);
            }
        }
    }

    Ok(())
}

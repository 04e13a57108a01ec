//! A terminal front end for the admissions router.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;

use concierge::profile::admissions_profile;
use concierge_anthropic_model::{AnthropicConfigBuilder, AnthropicProvider};
use concierge_core::{Invocation, RouterBuilder};
use concierge_model::ChatMessage;
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Ok(api_key) = env::var("ANTHROPIC_API_KEY") else {
        eprintln!("ANTHROPIC_API_KEY environment variable is not set");
        return;
    };
    let mut config = AnthropicConfigBuilder::with_api_key(api_key);
    if let Ok(base_url) = env::var("ANTHROPIC_BASE_URL") {
        config = config.with_base_url(base_url);
    }
    let provider = AnthropicProvider::new(config.build());

    let mut builder = RouterBuilder::new(provider, admissions_profile());
    if let Ok(model) = env::var("CONCIERGE_MODEL") {
        builder = builder.with_model(model);
    }
    let router = builder.build();

    let mut history: Vec<ChatMessage> = Vec::new();
    loop {
        print!("> ");
        std::io::stdout().flush().unwrap();

        let Some(line) = read_line().await else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        history.push(ChatMessage::user(format!("<Customer>{line}</Customer>")));

        match router.invoke(&history).await {
            Invocation::Decided {
                decision,
                raw_response,
            } => {
                // Keep the raw markup in the history so the model sees its
                // own previous turns the way it produced them.
                history.push(ChatMessage::assistant(raw_response));

                println!(
                    "{} {}",
                    format!("[{}]", decision.action.tool).bright_cyan().bold(),
                    decision.action.argument.bright_white(),
                );
                debug!("thought: {}", decision.thought);

                if decision.action.tool == "Done" {
                    break;
                }
            }
            Invocation::Exhausted { fallback } => {
                println!(
                    "{} {}",
                    format!("[{}]", fallback.tool).bright_yellow().bold(),
                    fallback.argument.bright_white(),
                );
            }
        }
    }
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}

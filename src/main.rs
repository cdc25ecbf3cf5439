//! Docent CLI binary entry point.

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use docent::assistant::{Assistant, AskReply};
use docent::cli::{ChatArgs, Cli, Commands};
use docent::config::DocentConfig;
use docent::provider::AzureOpenAiProvider;
use docent::search::{AzureContentIndex, BingWebSearch, ContentIndex, Unavailable, WebSearch};
use docent::session::{FileRecordStore, Sweeper};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docent=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Chat(chat_args) => handle_chat(chat_args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn handle_chat(args: ChatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = DocentConfig::from_env()?;
    let provider = Arc::new(AzureOpenAiProvider::from_endpoints(&config.endpoints)?);

    let index: Arc<dyn ContentIndex> =
        match AzureContentIndex::from_endpoints(&config.endpoints, &config.search) {
            Ok(index) => Arc::new(index),
            Err(e) => {
                if config.search.local_enabled() {
                    warn!(error = %e, "content index unavailable");
                }
                Arc::new(Unavailable::new("content index"))
            }
        };
    let web: Arc<dyn WebSearch> = match BingWebSearch::from_endpoints(&config.endpoints) {
        Ok(web) => Arc::new(web),
        Err(e) => {
            if config.search.internet_enabled() {
                warn!(error = %e, "web search unavailable");
            }
            Arc::new(Unavailable::new("web search"))
        }
    };
    let records = Arc::new(FileRecordStore::new(config.storage.data_dir.clone()));

    let assistant = Assistant::from_config(&config, provider, index, web, records)?;
    let sweeper = Sweeper::spawn(assistant.sessions().clone());

    let language = args
        .language
        .unwrap_or_else(|| config.localization.default_language.clone());
    let client_id = assistant.sessions().create_session(&args.access_token);

    let outcome = match args.prompt {
        Some(prompt) => {
            let reply = assistant
                .ask(&args.access_token, &client_id, &prompt, &language)
                .await;
            reply.map(|r| print_reply(&r))
        }
        None => interactive(&assistant, &args.access_token, &client_id, &language).await,
    };

    if let Err(e) = assistant
        .sessions()
        .close_session(&args.access_token, &client_id)
    {
        warn!(error = %e, "closing session failed");
    }
    let report = sweeper.shutdown().await;
    if report.failures > 0 {
        eprintln!("warning: {} session(s) could not be saved", report.failures);
    }

    outcome.map_err(Into::into)
}

async fn interactive(
    assistant: &Assistant,
    access_token: &str,
    client_id: &str,
    language: &str,
) -> Result<(), docent::error::DocentError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprint!("> ");
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            eprint!("> ");
            continue;
        }
        let reply = assistant.ask(access_token, client_id, &line, language).await?;
        print_reply(&reply);
        eprint!("> ");
    }
    Ok(())
}

fn print_reply(reply: &AskReply) {
    println!("{}", reply.assistant_text);
    for image in &reply.images {
        println!("  [image] {image}");
    }
}

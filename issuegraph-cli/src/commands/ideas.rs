use std::io::{BufRead, Write};

use clap::Args;

use issuegraph_core::config::Settings;
use issuegraph_core::github::GitHubClient;
use issuegraph_core::llm::OpenAiClient;
use issuegraph_core::pipeline;
use issuegraph_core::session::{CardId, IdeaCard, IdeaSession};

#[derive(Args, Debug)]
pub struct IdeasArgs {
    /// Repository owner (user or organization)
    #[arg(long)]
    pub owner: String,

    /// Repository name
    #[arg(long)]
    pub repo: String,

    /// GitHub token (falls back to the settings file)
    #[arg(long, env = "GITHUB_TOKEN")]
    pub token: Option<String>,

    /// Completion-service API key (falls back to the settings file)
    #[arg(long, env = "OPENAI_API_KEY")]
    pub api_key: Option<String>,

    /// Completion-service model
    #[arg(long)]
    pub model: Option<String>,

    /// Number of generation rounds; between rounds you can discard
    /// cards so the next prompt avoids them
    #[arg(long, default_value = "1")]
    pub rounds: u32,

    /// Persist the provided credentials to the settings file
    #[arg(long)]
    pub save_settings: bool,
}

pub async fn run(args: IdeasArgs) -> anyhow::Result<()> {
    let settings_path = super::default_settings_path();
    let mut settings = Settings::load(&settings_path)?;

    let token = args
        .token
        .clone()
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| settings.github_token.clone());
    let api_key = args
        .api_key
        .clone()
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| settings.openai_api_key.clone());
    let model = args
        .model
        .clone()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| settings.model.clone());

    pipeline::validate_inputs(&[("token", &token), ("api-key", &api_key)])?;

    if args.save_settings {
        settings.github_token.clone_from(&token);
        settings.openai_api_key.clone_from(&api_key);
        settings.model.clone_from(&model);
        settings.save(&settings_path)?;
    }

    let github = GitHubClient::new(token);
    let llm = OpenAiClient::new(api_key);
    let mut session = IdeaSession::new();

    for round in 1..=args.rounds.max(1) {
        if args.rounds > 1 {
            eprintln!("── Round {round} ──");
        }

        let spinner = super::loading_spinner("Generating ideas...");
        let result = pipeline::generate_ideas(
            &github,
            &llm,
            &model,
            &args.owner,
            &args.repo,
            &mut session,
            |card| {
                spinner.suspend(|| print_card(card, &args.owner, &args.repo));
            },
        )
        .await;
        spinner.finish_and_clear();
        let emitted = result?;

        if emitted == 0 {
            eprintln!("No ideas were generated this round.");
        }

        if round < args.rounds {
            discard_prompt(&mut session)?;
        }
    }

    Ok(())
}

fn print_card(card: &IdeaCard, owner: &str, repo: &str) {
    let sources = card
        .source_ids
        .iter()
        .map(|id| format!("#{id}"))
        .collect::<Vec<_>>()
        .join(", ");

    println!("[{}] {}", card.id.0, card.title);
    if !card.description.is_empty() {
        println!("    {}", card.description);
    }
    if !sources.is_empty() {
        println!("    sources: {sources} (https://github.com/{owner}/{repo}/issues)");
    }
    println!();
}

/// Ask which cards to discard before the next round. Discarded cards
/// are hidden but remembered so the next prompt steers away from them.
fn discard_prompt(session: &mut IdeaSession) -> anyhow::Result<()> {
    eprint!("Card numbers to discard (comma-separated, blank for none): ");
    std::io::stderr().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;

    for token in line.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match token.parse::<u64>() {
            Ok(n) if session.discard(CardId(n)) => {}
            _ => eprintln!("Ignoring unknown card: {token}"),
        }
    }

    Ok(())
}

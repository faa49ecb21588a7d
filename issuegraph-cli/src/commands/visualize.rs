use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use issuegraph_core::config::Settings;
use issuegraph_core::github::GitHubClient;
use issuegraph_core::pipeline;

#[derive(Args, Debug)]
pub struct VisualizeArgs {
    /// Repository owner (user or organization)
    #[arg(long)]
    pub owner: String,

    /// Repository name
    #[arg(long)]
    pub repo: String,

    /// GitHub token (falls back to the settings file)
    #[arg(long, env = "GITHUB_TOKEN")]
    pub token: Option<String>,

    /// Write the graph JSON here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Persist the provided token to the settings file
    #[arg(long)]
    pub save_settings: bool,
}

pub async fn run(args: VisualizeArgs) -> anyhow::Result<()> {
    let settings_path = super::default_settings_path();
    let mut settings = Settings::load(&settings_path)?;

    let token = args
        .token
        .clone()
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| settings.github_token.clone());
    pipeline::validate_inputs(&[("token", &token)])?;

    if args.save_settings {
        settings.github_token.clone_from(&token);
        settings.save(&settings_path)?;
    }

    let client = GitHubClient::new(token);

    let spinner = super::loading_spinner("Fetching issues...");
    let result = pipeline::visualize(&client, &args.owner, &args.repo).await;
    spinner.finish_and_clear();
    let graph = result?;

    let json = serde_json::to_string_pretty(&graph)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Cannot write graph to {}", path.display()))?;
            eprintln!(
                "Wrote {} nodes, {} links to {}",
                graph.nodes.len(),
                graph.links.len(),
                path.display()
            );
        }
        None => println!("{json}"),
    }

    Ok(())
}

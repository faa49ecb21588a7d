//! Orchestration of the two user-facing operations: graph
//! visualization and streamed idea generation.

use tracing::{info, instrument};

use crate::error::{IssueGraphError, Result};
use crate::github::{IssuePageSource, fetch_all_issues};
use crate::graph::{IssueGraph, build_graph};
use crate::llm::CompletionProvider;
use crate::prompt::{build_idea_prompt, serialize_graph};
use crate::session::{IdeaCard, IdeaSession};
use crate::stream::reduce_idea_stream;

/// Check that every required input is non-empty, before any I/O.
pub fn validate_inputs(fields: &[(&str, &str)]) -> Result<()> {
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(IssueGraphError::Validation(format!(
                "Please fill in all fields (missing: {name})."
            )));
        }
    }
    Ok(())
}

/// Fetch a repository's open issues and assemble the issue graph.
#[instrument(skip(source))]
pub async fn visualize(
    source: &dyn IssuePageSource,
    owner: &str,
    repo: &str,
) -> Result<IssueGraph> {
    validate_inputs(&[("owner", owner), ("repo", repo)])?;

    let issues = fetch_all_issues(source, owner, repo).await?;
    Ok(build_graph(&issues, &format!("{owner}/{repo}")))
}

/// Run one idea-generation round.
///
/// The paginated fetch and the completion-client preparation run
/// concurrently; both must succeed before the prompt is built, so a
/// failure on either side surfaces before any partial output. Each
/// idea decoded off the stream is added to `session` (so the next
/// round's exclusion lists see it) and handed to `on_card` as it
/// arrives. Returns the number of ideas emitted this round.
#[instrument(skip(source, llm, session, on_card))]
pub async fn generate_ideas<F>(
    source: &dyn IssuePageSource,
    llm: &dyn CompletionProvider,
    model: &str,
    owner: &str,
    repo: &str,
    session: &mut IdeaSession,
    mut on_card: F,
) -> Result<usize>
where
    F: FnMut(&IdeaCard),
{
    validate_inputs(&[("owner", owner), ("repo", repo)])?;

    let (issues, ()) = tokio::try_join!(fetch_all_issues(source, owner, repo), llm.prepare())?;

    let graph = build_graph(&issues, &format!("{owner}/{repo}"));
    let backlog = serialize_graph(&graph.nodes);
    let prompt = {
        let accepted: Vec<&IdeaCard> = session.accepted().collect();
        let discarded: Vec<&IdeaCard> = session.discarded().collect();
        build_idea_prompt(&backlog, &accepted, &discarded)
    };

    let events = llm.stream_response(model, &prompt).await?;
    let emitted = reduce_idea_stream(events, |draft| {
        let id = session.add(draft);
        if let Some(card) = session.card(id) {
            on_card(card);
        }
    })
    .await;

    info!(emitted, total = session.len(), "Idea generation round complete");
    Ok(emitted)
}

// ── Tests ───────────────────────────────────────────────────────────

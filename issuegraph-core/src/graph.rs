//! Graph builder: turns raw issue records into a deduplicated
//! node/link/legend graph for the force-directed renderer.
//!
//! Pure and deterministic — no I/O, no input mutation. Node and link
//! order follow input order; the legend is a mapping, so its key order
//! is not significant.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::github::IssueRecord;

/// Display color for issues without labels, and for the synthetic
/// `unlabeled` legend entry.
pub const FALLBACK_COLOR: &str = "#6e7781";

/// Legend key for issues without labels.
pub const UNLABELED_KEY: &str = "unlabeled";

/// One node per distinct open issue.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GraphNode {
    /// Issue number — the unique node key.
    pub id: u64,
    pub title: String,
    pub url: String,
    pub labels: Vec<NodeLabel>,
    /// First label's color, or [`FALLBACK_COLOR`] when unlabeled.
    pub color: String,
}

/// Label attached to a node: lowercased name, `#`-prefixed hex color.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NodeLabel {
    pub name: String,
    pub color: String,
}

/// A cross-reference edge. Directional — `source` mentions `target` —
/// though the renderer draws it undirected.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct GraphLink {
    pub source: u64,
    pub target: u64,
}

/// The assembled issue graph.
#[derive(Debug, Clone, Serialize)]
pub struct IssueGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
    /// Lowercased label name → display color. Always contains
    /// [`UNLABELED_KEY`]. Last writer wins if a label name ever maps
    /// to two different colors.
    #[serde(rename = "legendData")]
    pub legend: HashMap<String, String>,
}

/// Build the issue graph for one repository.
///
/// Two passes: all nodes first, so link validation can check membership
/// against the full set of fetched issue numbers. A link is emitted for
/// a cross-reference event on issue `I` iff the event's source is an
/// issue `S` in `full_repo_name` (cross-repo references are dropped),
/// `S` was fetched, and `S != I`.
pub fn build_graph(issues: &[IssueRecord], full_repo_name: &str) -> IssueGraph {
    let mut nodes = Vec::with_capacity(issues.len());
    let mut known_numbers = HashSet::new();
    let mut legend = HashMap::new();

    for issue in issues {
        if !known_numbers.insert(issue.number) {
            continue;
        }

        let labels: Vec<NodeLabel> = issue
            .labels
            .nodes
            .iter()
            .map(|l| NodeLabel {
                name: l.name.to_lowercase(),
                color: format!("#{}", l.color),
            })
            .collect();

        for label in &labels {
            legend.insert(label.name.clone(), label.color.clone());
        }

        let color = labels
            .first()
            .map_or_else(|| FALLBACK_COLOR.to_string(), |l| l.color.clone());

        nodes.push(GraphNode {
            id: issue.number,
            title: issue.title.clone(),
            url: issue.url.clone(),
            labels,
            color,
        });
    }

    let mut links = Vec::new();
    for issue in issues {
        for item in &issue.timeline_items.nodes {
            let Some(source) = &item.source else {
                continue;
            };
            let (Some(number), Some(repo)) = (source.number, &source.repository) else {
                continue;
            };
            if repo.name_with_owner != full_repo_name {
                continue;
            }
            if number == issue.number || !known_numbers.contains(&number) {
                continue;
            }
            links.push(GraphLink {
                source: number,
                target: issue.number,
            });
        }
    }

    legend.insert(UNLABELED_KEY.to_string(), FALLBACK_COLOR.to_string());

    debug!(
        nodes = nodes.len(),
        links = links.len(),
        labels = legend.len(),
        "Issue graph built"
    );

    IssueGraph {
        nodes,
        links,
        legend,
    }
}

// ── Tests ───────────────────────────────────────────────────────────

//! Prompt construction for the idea-generation request: the serialized
//! backlog plus exclusion lists built from the session state.

use std::fmt::Write;

use crate::graph::GraphNode;
use crate::session::IdeaCard;

/// Serialize the issue graph into the backlog block fed to the model.
///
/// One block per node: `#<id> <title>` followed by a `type:` line with
/// the comma-joined label names.
pub fn serialize_graph(nodes: &[GraphNode]) -> String {
    nodes
        .iter()
        .map(|node| {
            let labels = node
                .labels
                .iter()
                .map(|l| l.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            format!("#{} {}\ntype: {}", node.id, node.title, labels)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn exclusion_list(cards: &[&IdeaCard]) -> String {
    cards
        .iter()
        .map(|card| {
            let sources = card
                .source_ids
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            format!("- {} ({sources})", card.title)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the full idea-generation prompt.
///
/// The accepted and discarded sections steer the model away from
/// repeating prior suggestions; each is omitted when its list is empty.
pub fn build_idea_prompt(backlog: &str, accepted: &[&IdeaCard], discarded: &[&IdeaCard]) -> String {
    let mut prompt = format!(
        "Generate innovative and inspiring ideas based on the content in the backlog:\n\n\
         ```backlog\n{backlog}\n```\n"
    );

    if !accepted.is_empty() {
        let _ = write!(
            prompt,
            "\nThe user already considered the following ideas as good. \
             Make sure your new ideas are meaningfully different from these:\n{}\n",
            exclusion_list(accepted)
        );
    }

    if !discarded.is_empty() {
        let _ = write!(
            prompt,
            "\nThe user already discarded the following ideas. \
             Do not suggest these or close variations again:\n{}\n",
            exclusion_list(discarded)
        );
    }

    prompt.push_str(
        "\nRespond 7 ideas in this JSON format:\n\
         type Response {\n\
         \x20 ideas: {\n\
         \x20   title: string;\n\
         \x20   description: string;\n\
         \x20   sourceIds: number[];\n\
         \x20 }[]\n\
         }\n",
    );

    prompt
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphNode, NodeLabel};
    use crate::session::{IdeaDraft, IdeaSession};

    fn node(id: u64, title: &str, labels: &[&str]) -> GraphNode {
        GraphNode {
            id,
            title: title.to_string(),
            url: format!("https://github.com/o/r/issues/{id}"),
            labels: labels
                .iter()
                .map(|name| NodeLabel {
                    name: (*name).to_string(),
                    color: "#d73a4a".to_string(),
                })
                .collect(),
            color: "#d73a4a".to_string(),
        }
    }

    #[test]
    fn backlog_serialization_shape() {
        let nodes = vec![
            node(1, "Crash on resize", &["bug", "ui"]),
            node(2, "Add dark mode", &[]),
        ];
        let backlog = serialize_graph(&nodes);
        assert_eq!(
            backlog,
            "#1 Crash on resize\ntype: bug, ui\n\n#2 Add dark mode\ntype: "
        );
    }

    #[test]
    fn prompt_without_history_has_no_exclusion_sections() {
        let prompt = build_idea_prompt("#1 A\ntype: bug", &[], &[]);
        assert!(prompt.contains("```backlog\n#1 A\ntype: bug\n```"));
        assert!(!prompt.contains("already considered"));
        assert!(!prompt.contains("already discarded"));
        assert!(prompt.contains("Respond 7 ideas in this JSON format:"));
        assert!(prompt.contains("sourceIds: number[];"));
    }

    #[test]
    fn prompt_lists_accepted_and_discarded_separately() {
        let mut session = IdeaSession::new();
        session.add(IdeaDraft {
            title: "Dark mode".to_string(),
            description: String::new(),
            source_ids: vec![1, 2],
        });
        let doomed = session.add(IdeaDraft {
            title: "Blockchain issues".to_string(),
            description: String::new(),
            source_ids: vec![3],
        });
        session.discard(doomed);

        let accepted: Vec<_> = session.accepted().collect();
        let discarded: Vec<_> = session.discarded().collect();
        let prompt = build_idea_prompt("#1 A\ntype: bug", &accepted, &discarded);

        assert!(prompt.contains("already considered the following ideas as good"));
        assert!(prompt.contains("- Dark mode (1, 2)"));
        assert!(prompt.contains("already discarded the following ideas"));
        assert!(prompt.contains("- Blockchain issues (3)"));
    }
}

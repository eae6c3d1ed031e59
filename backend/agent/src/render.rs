use std::fmt::Write;

use parley_core::CompletionMetadata;

/// Render a reply addressed to `user`, with any recalled references and a
/// context/history footer.
pub fn render_response(user: &str, response: &str, metadata: &CompletionMetadata, history: usize) -> String {
    let mut out = format!("<@{user}> {response}\n\n");
    if !metadata.context_titles.is_empty() {
        out.push_str("*References:*\n");
        for title in &metadata.context_titles {
            let _ = writeln!(out, "> {title}");
        }
    }
    let _ = write!(out, "> (contexts: {}, history: {})", metadata.contexts, history);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_response() {
        let rendered = render_response("U123", "Hi there", &CompletionMetadata::default(), 3);
        assert_eq!(rendered, "<@U123> Hi there\n\n> (contexts: 0, history: 3)");
    }

    #[test]
    fn test_references_are_listed() {
        let metadata = CompletionMetadata {
            context_titles: vec!["conversation with U1".into(), "conversation with U2".into()],
            contexts: 2,
            ..Default::default()
        };
        let rendered = render_response("U9", "Sure.", &metadata, 1);
        assert_eq!(
            rendered,
            "<@U9> Sure.\n\n*References:*\n> conversation with U1\n> conversation with U2\n> (contexts: 2, history: 1)"
        );
    }
}

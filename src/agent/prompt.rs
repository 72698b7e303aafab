//! System prompt assembly for the decision engine.

/// Behavioral instructions for the answering model.
///
/// The retrieval-vs-direct decision is delegated to the model; the prompt
/// constrains it to corpus-specific questions, one search per query, and
/// answers without meta-commentary about the retrieval process.
pub const SYSTEM_PROMPT: &str = "\
You are an assistant that answers questions about a collection of course \
materials.

Tool use:
- Use the course content search tool only for questions about specific \
course content or lesson details.
- Use at most one search per question. If the search returns nothing \
useful, answer from what you know without searching again.
- Answer general-knowledge questions directly, without searching.

Answers:
- Be concise and factual.
- Do not mention the search process, the tool, or your reasoning about \
whether to search.
- If neither the search results nor your own knowledge answer the \
question, say so briefly.";

/// Build the system prompt for one generation call.
pub fn build_system_prompt() -> String {
    SYSTEM_PROMPT.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_constrains_tool_use() {
        let prompt = build_system_prompt();
        assert!(prompt.contains("at most one search"));
        assert!(prompt.contains("Do not mention the search process"));
    }
}

//! Answer prompt template.
//!
//! The prompt is a constant template with two placeholders, `{context}`
//! and `{question}`. [`compose`] substitutes them in a single left-to-right
//! pass, so placeholder-like text inside the context or the question is
//! copied through untouched.

/// The instruction template sent to the generation model.
pub const ANSWER_TEMPLATE: &str = "\
You are a document analysis assistant. Using the document excerpts below, \
format your response clearly and neatly.

Context: {context}

Question: {question}

Guidelines:
- Keep the answer clear, concise, and fact-based.
- Write in plain, uniformly formatted text with normal spacing between words.
- If the documents do not contain the information needed, say so explicitly.
- If the answer contains numerical data, present it as a table with headers.
- If asked to summarize, give a brief overview followed by key bullet points.
- If the question follows up on an earlier one, refer to the previous answers first.
- If the question is ambiguous, politely ask the user for clarification before answering.
";

const CONTEXT_SLOT: &str = "{context}";
const QUESTION_SLOT: &str = "{question}";

/// Build the answer prompt for `question` grounded in `context`.
pub fn compose(context: &str, question: &str) -> String {
    render(ANSWER_TEMPLATE, context, question)
}

fn render(template: &str, context: &str, question: &str) -> String {
    let mut out = String::with_capacity(template.len() + context.len() + question.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        if let Some(after) = tail.strip_prefix(CONTEXT_SLOT) {
            out.push_str(context);
            rest = after;
        } else if let Some(after) = tail.strip_prefix(QUESTION_SLOT) {
            out.push_str(question);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

//! Prompt shared by every LLM-backed classifier.

use super::ClassificationRequest;

/// System message for providers that accept one separately.
pub const SYSTEM_PROMPT: &str =
    "You are a web UX expert classifying the purpose of sections of web pages. \
     Always answer with a single JSON object.";

/// Build the user prompt for a classification request.
pub fn build_prompt(request: &ClassificationRequest) -> String {
    let mut prompt = String::from(
        "You are analyzing one section of a webpage. Decide what this section is for.\n\n",
    );

    prompt.push_str("Section:\n");
    prompt.push_str(request.content.trim());
    prompt.push_str("\n\n");

    let context = &request.context;
    let mut context_lines = Vec::new();
    if let Some(url) = &context.url {
        context_lines.push(format!("- Page URL: {}", url));
    }
    if let Some(title) = &context.page_title {
        context_lines.push(format!("- Page title: {}", title));
    }
    if let Some(parent) = &context.parent {
        context_lines.push(format!("- Enclosing section: {}", parent));
    }
    for neighbor in &context.neighbors {
        context_lines.push(format!("- Nearby section: {}", neighbor));
    }
    if !context_lines.is_empty() {
        prompt.push_str("Context:\n");
        prompt.push_str(&context_lines.join("\n"));
        prompt.push_str("\n\n");
    }

    prompt.push_str(
        "Use a short, lowercase category label that describes the section's purpose \
         (for example \"navigation\", \"search\", \"article\", \"footer\"). You are not \
         limited to these examples.\n\n\
         Respond in JSON format:\n\
         {\n  \"label\": \"category\",\n  \"confidence\": 0.0-1.0,\n  \
         \"rationale\": \"Which features led to this conclusion\"\n}",
    );

    prompt
}

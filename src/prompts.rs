//! Prompt templates.

use crate::retrieval::RetrievedDocument;
use crate::types::Message;

pub const SYSTEM_INSTRUCTION: &str = "You are a supply chain planning assistant for an online retailer. \
Ground every recommendation in the sales history and policy excerpts you are given. \
If the data is insufficient, say so instead of guessing.";

/// Render retrieved documents as a numbered reference list.
pub fn context_block(docs: &[RetrievedDocument]) -> String {
    if docs.is_empty() {
        return "(no reference material)".to_string();
    }
    docs.iter()
        .enumerate()
        .map(|(i, d)| format!("[{}] {}: {}", i + 1, d.document.title, d.document.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Messages asking for a single JSON reorder plan for `product_id`.
pub fn reorder_plan_messages(
    product_id: &str,
    snapshot: &str,
    context: &[RetrievedDocument],
) -> Vec<Message> {
    let user = format!(
        "Create a reorder plan for product {product_id}.\n\n\
         Sales history summary:\n{snapshot}\n\n\
         Inventory policy references:\n{context}\n\n\
         Respond with ONLY a JSON object, no prose, with these fields:\n\
         {{\n  \"product_id\": string (must be \"{product_id}\"),\n  \
         \"reorder_point\": integer units >= 0,\n  \
         \"reorder_quantity\": integer units >= 0,\n  \
         \"safety_stock\": integer units >= 0,\n  \
         \"lead_time_days\": integer days >= 0,\n  \
         \"confidence\": number between 0 and 1,\n  \
         \"rationale\": short string explaining the numbers\n}}",
        context = context_block(context),
    );
    vec![Message::system(SYSTEM_INSTRUCTION), Message::user(user)]
}

/// Messages asking a free-form question, answered in Markdown.
pub fn question_messages(
    question: &str,
    context: &[RetrievedDocument],
    dataset_overview: &str,
) -> Vec<Message> {
    let user = format!(
        "Question: {question}\n\n\
         Dataset overview: {dataset_overview}\n\n\
         Reference material:\n{context}\n\n\
         Answer in concise Markdown. Cite reference numbers like [1] where they apply.",
        context = context_block(context),
    );
    vec![Message::system(SYSTEM_INSTRUCTION), Message::user(user)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::Document;
    use crate::types::MessageRole;

    fn hit(title: &str) -> RetrievedDocument {
        RetrievedDocument {
            document: Document::new(title, title, format!("{title} text")),
            score: 0.9,
        }
    }

    #[test]
    fn test_context_block_numbering() {
        let block = context_block(&[hit("EOQ"), hit("Lead time")]);
        assert_eq!(block, "[1] EOQ: EOQ text\n[2] Lead time: Lead time text");
        assert_eq!(context_block(&[]), "(no reference material)");
    }

    #[test]
    fn test_reorder_prompt_mentions_product_and_schema() {
        let msgs = reorder_plan_messages("85123A", "total_units=16", &[hit("Safety stock")]);
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, MessageRole::System);
        let body = &msgs[1].content;
        assert!(body.contains("product 85123A"));
        assert!(body.contains("total_units=16"));
        assert!(body.contains("\"reorder_quantity\""));
        assert!(body.contains("[1] Safety stock"));
    }

    #[test]
    fn test_question_prompt() {
        let msgs = question_messages("What is EOQ?", &[], "5 records");
        assert!(msgs[1].content.starts_with("Question: What is EOQ?"));
        assert!(msgs[1].content.contains("Dataset overview: 5 records"));
    }
}

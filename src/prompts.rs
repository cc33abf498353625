//! Prompt construction for narrative generation.
//!
//! The texts here are part of the crate's observable behavior (the welcome
//! message is stored verbatim in every new conversation), so they are fixed
//! constants rather than configuration.

use crate::analysis::AnalysisReport;
use crate::conversations::{Message, Role};
use crate::narrative::{PromptMessage, PromptRole};

/// Assistant message seeded into every new conversation.
pub const WELCOME_MESSAGE: &str = "Hello! I'm here to help you analyze your requirements and design documents. Feel free to ask questions about the analysis, gaps, or recommendations.";

/// System prompt for conversational turns.
pub const CHAT_SYSTEM_PROMPT: &str = "You are a helpful assistant for software requirements and design analysis. You have access to the current analysis context and can answer questions about requirements, design, and recommendations.";

/// System prompt for the one-shot feedback generation.
pub const FEEDBACK_SYSTEM_PROMPT: &str = "You are a software architecture expert specializing in requirements analysis and design validation.";

/// The five asks appended to every feedback prompt.
const FEEDBACK_ASKS: &str = r#"Based on the semantic analysis above, provide:

1. **Executive Summary**: Brief overview of the alignment quality
2. **Detailed Gap Analysis**: Specific requirements that are missing or poorly addressed in the design
3. **Design Coverage**: Which design elements effectively address which requirements
4. **Priority Recommendations**:
   - High priority: Critical missing requirements
   - Medium priority: Requirements with partial coverage
   - Low priority: Minor gaps or improvements
5. **Actionable Next Steps**: Specific recommendations for design improvements

Format your response in a clear, structured way with actionable insights. Use markdown formatting for better readability."#;

fn pretty_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

/// Build the structured feedback prompt over a finished analysis.
pub fn build_feedback_prompt(
    report: &AnalysisReport,
    requirements: &[String],
    design: &[String],
) -> String {
    let detailed: Vec<serde_json::Value> = report
        .verdicts
        .iter()
        .map(|verdict| {
            serde_json::json!({
                "requirement": verdict.requirement,
                "status": verdict.coverage,
                "similarity_score": verdict.similarity_score,
                "matched_design_items": verdict.matched_design_items,
                "issue": verdict.issue,
            })
        })
        .collect();

    format!(
        "You are an expert software architect analyzing the alignment between requirements and design documents.\n\
         \n\
         SUMMARY:\n\
         - Total Requirements: {total_requirements}\n\
         - Total Design Items: {total_design_items}\n\
         - Requirements Covered: {covered}\n\
         - Requirements Missing: {missing}\n\
         - Coverage Percentage: {percent:.1}%\n\
         \n\
         PARSED REQUIREMENTS:\n\
         {requirements}\n\
         \n\
         PARSED DESIGN ELEMENTS:\n\
         {design}\n\
         \n\
         SEMANTIC ANALYSIS RESULTS:\n\
         {analysis}\n\
         \n\
         {asks}",
        total_requirements = report.summary.total_requirements,
        total_design_items = report.summary.total_design_items,
        covered = report.summary.covered_requirements,
        missing = report.summary.missing_requirements,
        percent = report.summary.coverage_percent,
        requirements = pretty_json(&requirements),
        design = pretty_json(&design),
        analysis = pretty_json(&detailed),
        asks = FEEDBACK_ASKS,
    )
}

/// Assemble the wire messages for one conversational turn: system prompt,
/// the windowed prior history, then the user text (with the analysis
/// context appended when one is attached to the conversation).
pub fn build_chat_messages(
    prior: &[Message],
    user_text: &str,
    context: Option<&serde_json::Value>,
) -> Vec<PromptMessage> {
    let mut messages = Vec::with_capacity(prior.len() + 2);
    messages.push(PromptMessage {
        role: PromptRole::System,
        content: CHAT_SYSTEM_PROMPT.to_string(),
    });

    for message in prior {
        messages.push(PromptMessage {
            role: match message.role {
                Role::User => PromptRole::User,
                Role::Assistant => PromptRole::Assistant,
            },
            content: message.content.clone(),
        });
    }

    let content = match context {
        Some(ctx) => format!(
            "{}\nCurrent Analysis Context: {}",
            user_text,
            pretty_json(ctx)
        ),
        None => user_text.to_string(),
    };
    messages.push(PromptMessage {
        role: PromptRole::User,
        content,
    });

    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use chrono::Utc;

    fn owned(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn chat_messages_start_with_system_and_end_with_user() {
        let prior = vec![
            Message {
                role: Role::Assistant,
                content: WELCOME_MESSAGE.to_string(),
                timestamp: Utc::now(),
            },
            Message {
                role: Role::User,
                content: "What gaps exist?".to_string(),
                timestamp: Utc::now(),
            },
        ];
        let messages = build_chat_messages(&prior, "Tell me more", None);

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, PromptRole::System);
        assert_eq!(messages[0].content, CHAT_SYSTEM_PROMPT);
        assert_eq!(messages[1].role, PromptRole::Assistant);
        assert_eq!(messages[2].role, PromptRole::User);
        assert_eq!(messages[3].role, PromptRole::User);
        assert_eq!(messages[3].content, "Tell me more");
    }

    #[test]
    fn context_is_appended_to_the_user_text() {
        let context = serde_json::json!({"covered_requirements": 3});
        let messages = build_chat_messages(&[], "How is coverage?", Some(&context));

        let user = &messages.last().unwrap().content;
        assert!(user.starts_with("How is coverage?\nCurrent Analysis Context: "));
        assert!(user.contains("\"covered_requirements\": 3"));
    }

    #[test]
    fn feedback_prompt_carries_summary_and_verdicts() {
        let requirements = owned(&["encrypt stored data"]);
        let design = owned(&["render dashboard"]);
        let report = analyze(&requirements, &design, 0.3).unwrap();
        let prompt = build_feedback_prompt(&report, &requirements, &design);

        assert!(prompt.contains("- Total Requirements: 1"));
        assert!(prompt.contains("- Total Design Items: 1"));
        assert!(prompt.contains("- Coverage Percentage: 0.0%"));
        assert!(prompt.contains("PARSED REQUIREMENTS:"));
        assert!(prompt.contains("\"status\": \"Missing\""));
        assert!(prompt.contains("\"issue\": \"Requirement not found in design\""));
        assert!(prompt.contains("1. **Executive Summary**"));
        assert!(prompt.contains("5. **Actionable Next Steps**"));
    }
}

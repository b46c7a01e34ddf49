use crate::error::{CourseError, CourseResult};
use crate::models::course::{ChatMessage, Module};

const ROLE_PREAMBLE: &str = "You are an expert educational AI assistant. Your task is to create a personalized learning path and ask relevant follow-up questions to improve it.";

const RESPONSE_SCHEMA: &str = r#"Format your response as a JSON object with the following structure:
{
  "estimatedTotalHours": "Total estimated hours to complete the entire course",
  "modules": [
    {
      "title": "Module title",
      "description": "Module description",
      "estimatedHours": "Estimated hours to complete this module",
      "resources": [
        {
          "type": "article/video/book/exercise",
          "title": "Resource title",
          "url": "optional url",
          "description": "Why this resource is helpful",
          "estimatedMinutes": "Estimated minutes to complete this resource"
        }
      ],
      "assessment": {
        "questions": [
          {
            "question": "Assessment question?",
            "options": ["option1", "option2", "option3", "option4"],
            "correctAnswer": "correct option"
          }
        ]
      }
    }
  ],
  "followUpQuestion": "Your specific question to help personalize the content further"
}"#;

const EDIT_RULES: &str = "IMPORTANT: When generating your response:
1. If the user asks to add a new module, add it as an additional module AFTER the existing ones
2. Do NOT replace any existing modules
3. Only add new content based on the user's latest request
4. Never modify a module whose isFinalized is true. You may modify the other modules according to the request.";

/// Build the system instruction for a generation call.
///
/// When the learner already has a draft, the modules are embedded as pretty
/// JSON together with the append-only and finalize-protection rules.
pub fn compose_system_prompt(
    target_skill: &str,
    current_modules: Option<&[Module]>,
) -> CourseResult<String> {
    let mut prompt = format!(
        "{ROLE_PREAMBLE}\n\nThe learner wants to build the skill: {target_skill}.\nFirst, generate a learning path for that skill. Then, ask ONE specific question that will help you better personalize the content.\n"
    );

    if let Some(modules) = current_modules {
        let snapshot = serde_json::to_string_pretty(modules).map_err(|e| {
            CourseError::UnknownFailure(format!("Failed to serialize current modules: {}", e))
        })?;
        prompt.push_str("\nNote: The user has modified the modules. Here are the current modules:\n");
        prompt.push_str(&snapshot);
        prompt.push_str("\n\n");
        prompt.push_str(EDIT_RULES);
        prompt.push('\n');
    }

    prompt.push('\n');
    prompt.push_str(RESPONSE_SCHEMA);
    Ok(prompt)
}

/// Prepend the system instruction to the learner's conversation.
pub fn build_conversation(system_prompt: String, conversation: &[ChatMessage]) -> Vec<ChatMessage> {
    std::iter::once(ChatMessage::system(system_prompt))
        .chain(conversation.iter().cloned())
        .collect()
}

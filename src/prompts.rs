//! Prompt construction for packaging recommendations
//!
//! Builds the initial recommendation prompt from the user's packaging
//! parameters and the follow-up prompt for questions about a recommendation.

use serde::{Deserialize, Serialize};

use crate::conversation::Conversation;

pub const DEFAULT_LANGUAGE: &str = "English";

/// Question/answer pairs carried into a follow-up prompt
pub const FOLLOW_UP_CONTEXT_EXCHANGES: usize = 3;

const HINDI_FORMAT_PREFIX: &str = "निम्नलिखित प्रारूप में उत्तर दें:\n\n";

/// Packaging parameters submitted from the recommendation form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub product_category: String,
    #[serde(default)]
    pub printing_type: String,
    #[serde(default)]
    pub layer_structure: String,
    #[serde(default)]
    pub custom_requirements: String,
    #[serde(default)]
    pub language: Option<String>,
}

impl RecommendationRequest {
    /// First required field that is blank, if any
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("product_category", &self.product_category),
            ("printing_type", &self.printing_type),
            ("layer_structure", &self.layer_structure),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }

    pub fn language(&self) -> &str {
        language_or_default(self.language.as_deref())
    }
}

/// Follow-up question about an earlier recommendation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FollowUpRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub language: Option<String>,
}

impl FollowUpRequest {
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.question.trim().is_empty() {
            Some("question")
        } else if self.session_id.trim().is_empty() {
            Some("session_id")
        } else {
            None
        }
    }
}

fn language_or_default(language: Option<&str>) -> &str {
    match language.map(str::trim) {
        Some(lang) if !lang.is_empty() => lang,
        _ => DEFAULT_LANGUAGE,
    }
}

/// Session key for a recommendation: identical parameters share a session
pub fn session_id_for(params: &RecommendationRequest) -> String {
    format!(
        "{}_{}_{}",
        params.product_category.trim(),
        params.printing_type.trim(),
        params.layer_structure.trim()
    )
}

pub fn recommendation_prompt(params: &RecommendationRequest) -> String {
    let language = params.language();
    let lang_prefix = if language.eq_ignore_ascii_case("hindi") {
        HINDI_FORMAT_PREFIX
    } else {
        ""
    };
    let category = params.product_category.trim();

    format!(
        "Suggest the best flexible packaging material structure for a {category} product \
using {printing} printing with {layers} layers.

Additional requirements: {requirements}.

{lang_prefix}Format your response in clearly marked sections with emojis:

🔹 **RECOMMENDED STRUCTURE:**
[Provide a detailed layer-by-layer structure with specific materials]

🔹 **MATERIALS DESCRIPTION:**
[Describe each material used in the structure with their specific properties]

🔹 **KEY PROPERTIES:**
[List the key properties of this structure as bullet points]

🔹 **BENEFITS FOR THIS APPLICATION:**
[Explain 3-5 specific benefits for this {category} application]

Make sure sections are clearly separated with line breaks and headings are bold.
Provide the response in {language}.
",
        printing = params.printing_type.trim(),
        layers = params.layer_structure.trim(),
        requirements = params.custom_requirements.trim(),
    )
}

pub fn follow_up_prompt(conversation: &Conversation, question: &str, language: Option<&str>) -> String {
    let params = &conversation.params;
    let language = match language.map(str::trim) {
        Some(lang) if !lang.is_empty() => lang,
        _ => params.language(),
    };

    let mut history = String::new();
    let recent = conversation.recent_exchanges(FOLLOW_UP_CONTEXT_EXCHANGES);
    if !recent.is_empty() {
        history.push_str("Earlier in this conversation:\n");
        for (asked, answered) in recent {
            history.push_str(&format!("Q: {}\nA: {}\n\n", asked.trim(), answered.trim()));
        }
    }

    format!(
        "You're a flexible packaging material expert. The user previously received a recommendation for:
- Product category: {category}
- Printing type: {printing}
- Layer structure: {layers}
- Custom requirements: {requirements}

{history}Now they have a follow-up question: \"{question}\"

Answer the question specifically about the packaging recommendation you previously gave, \
considering all the technical details of the materials, structure, and application.

Format your answer with:
🔹 **ANSWER:**
[Your detailed, technically accurate answer]

Be concise but thorough. Provide specific technical information when relevant.
Respond in {language}.
",
        category = params.product_category.trim(),
        printing = params.printing_type.trim(),
        layers = params.layer_structure.trim(),
        requirements = params.custom_requirements.trim(),
        question = question.trim(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(language: Option<&str>) -> RecommendationRequest {
        RecommendationRequest {
            product_category: "Snacks".to_string(),
            printing_type: "Rotogravure".to_string(),
            layer_structure: "3".to_string(),
            custom_requirements: "High oxygen barrier".to_string(),
            language: language.map(str::to_string),
        }
    }

    #[test]
    fn test_session_id_format() {
        assert_eq!(session_id_for(&params(None)), "Snacks_Rotogravure_3");
    }

    #[test]
    fn test_missing_field() {
        assert_eq!(params(None).missing_field(), None);

        let blank = RecommendationRequest {
            printing_type: "  ".to_string(),
            ..params(None)
        };
        assert_eq!(blank.missing_field(), Some("printing_type"));

        let follow_up = FollowUpRequest {
            question: "Is it recyclable?".to_string(),
            ..Default::default()
        };
        assert_eq!(follow_up.missing_field(), Some("session_id"));
    }

    #[test]
    fn test_recommendation_prompt_contents() {
        let prompt = recommendation_prompt(&params(None));
        assert!(prompt.contains("for a Snacks product using Rotogravure printing with 3 layers"));
        assert!(prompt.contains("Additional requirements: High oxygen barrier."));
        assert!(prompt.contains("🔹 **RECOMMENDED STRUCTURE:**"));
        assert!(prompt.contains("🔹 **BENEFITS FOR THIS APPLICATION:**"));
        assert!(prompt.contains("Provide the response in English."));
        assert!(!prompt.contains(HINDI_FORMAT_PREFIX));
    }

    #[test]
    fn test_hindi_prompt_has_prefix() {
        let prompt = recommendation_prompt(&params(Some("Hindi")));
        assert!(prompt.contains(&format!("{}Format your response", HINDI_FORMAT_PREFIX)));
        assert!(prompt.contains("Provide the response in Hindi."));
    }

    #[test]
    fn test_follow_up_prompt_includes_context() {
        let mut conversation = Conversation::new(params(Some("Hindi")), "initial".to_string());
        conversation.record_exchange("Which adhesive?", "Solventless PU.");

        let prompt = follow_up_prompt(&conversation, "Is it retortable?", None);
        assert!(prompt.contains("- Product category: Snacks"));
        assert!(prompt.contains("- Custom requirements: High oxygen barrier"));
        assert!(prompt.contains("Q: Which adhesive?\nA: Solventless PU."));
        assert!(prompt.contains("follow-up question: \"Is it retortable?\""));
        assert!(prompt.contains("Respond in Hindi."));

        let prompt = follow_up_prompt(&conversation, "Is it retortable?", Some("English"));
        assert!(prompt.contains("Respond in English."));
    }

    #[test]
    fn test_follow_up_prompt_without_history() {
        let conversation = Conversation::new(params(None), "initial".to_string());
        let prompt = follow_up_prompt(&conversation, "Why PET?", None);
        assert!(!prompt.contains("Earlier in this conversation"));
    }
}

//! Prompt construction for the header-size oracle.

use serde_json::json;

use crate::profile::FontProfile;

/// Everything an oracle backend needs for one consultation.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleRequest {
    /// Rendered font report (see [`FontProfile::render_report`]).
    pub report: String,
    pub body_size: f32,
}

impl OracleRequest {
    pub fn new(profile: &FontProfile, body_size: f32) -> Self {
        Self {
            report: profile.render_report(),
            body_size,
        }
    }

    /// Full instruction text sent to the model.
    pub fn prompt(&self) -> String {
        let body = self.body_size;
        let report = &self.report;
        format!(
            r#"You are a Document Layout Engineer.
I need to split this PDF into "Study Topics".

Here is the Font Analysis of the document:
-----------------------------------------
{report}
-----------------------------------------

TASK:
Select the list of font sizes that represent **Topic Headers**.

LOGIC RULES:
1. **Exclude Body Text:** Do not select Size {body:.1}.
2. **Include Hierarchy:** Select BOTH the main Chapter titles AND the Sub-section titles (e.g. 1.1, 1.2).
3. **Read the Samples:** "Chapter 1", "1. Introduction", "Summary" look like headers. "Page 1 of 5", "Copyright", URLs are junk. Full sentences are body text.
4. **Ignore Junk:** Do not select tiny fonts or running headers (often smaller than body).
5. Never select a size smaller than {body:.1}.

OUTPUT:
Return ONLY a JSON object, no markdown:
{{"target_font_sizes": [<float>, ...], "reasoning": "<why, citing the samples>"}}"#
        )
    }

    /// JSON schema of the expected reply, for backends that constrain output.
    pub fn reply_schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "target_font_sizes": {
                    "type": "array",
                    "items": { "type": "number" },
                    "description": "All font sizes that represent topic headers."
                },
                "reasoning": {
                    "type": "string",
                    "description": "Why, citing text patterns found in the samples."
                }
            },
            "required": ["target_font_sizes", "reasoning"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Line, Word};

    fn line(text: &str, size: f32) -> Line {
        Line {
            words: vec![Word::new(text, size, 100.0)],
            text: text.to_string(),
            size,
            top: 100.0,
            page_height: 800.0,
            page: 0,
        }
    }

    #[test]
    fn prompt_embeds_report_and_body_size() {
        let lines = [line("Chapter 1", 24.0), line("body", 11.0), line("body", 11.0)];
        let profile = FontProfile::from_lines(&lines, 3, 100);
        let request = OracleRequest::new(&profile, profile.body_size());

        let prompt = request.prompt();
        assert!(prompt.contains("DETECTED BODY TEXT SIZE: 11.0 pt"));
        assert!(prompt.contains("Do not select Size 11.0"));
        assert!(prompt.contains("\"target_font_sizes\""));
    }

    #[test]
    fn schema_requires_both_fields() {
        let schema = OracleRequest::reply_schema();
        assert_eq!(schema["required"], json!(["target_font_sizes", "reasoning"]));
    }
}

//! Prompt template for the generative structured-extraction call
//!
//! The model itself lives outside this crate; implementations of
//! `StructuredExtractor` are expected to send something like this template
//! and deserialize the JSON reply into `StructuredResume`.

/// Parameters for prompt template substitution
#[derive(Debug, Clone)]
pub struct PromptParams {
    pub resume_text: String,
    pub detected_sections: Vec<String>,
}

/// Render the extraction prompt for a resume text.
pub fn render_extraction_prompt(params: &PromptParams) -> String {
    EXTRACTION_TEMPLATE
        .replace("{resume}", &params.resume_text)
        .replace("{sections}", &params.detected_sections.join(", "))
}

const EXTRACTION_TEMPLATE: &str = r#"TASK: Extract the resume below into structured JSON.

<RESUME>
{resume}
</RESUME>

Detected sections: {sections}

Return a single JSON object with these keys (omit anything not present, never
invent values):

{
  "contact": {"name", "email", "phone", "city", "state", "country", "linkedin", "github", "website"},
  "summary": "...",
  "experience": [{"company", "role", "location", "start_date", "end_date", "description", "is_current"}],
  "education": [{"institution", "degree", "field_of_study", "location", "start_date", "end_date", "gpa"}],
  "skills": [{"category", "keywords": ["..."]}],
  "projects": [{"name", "description", "url", "start_date", "end_date"}],
  "certifications": [{"name", "issuer", "date", "url"}],
  "involvement": [{"organization", "role", "start_date", "end_date", "description"}],
  "coursework": [{"name", "institution", "date", "description"}],
  "publications": [{"title", "publisher", "date", "url", "description"}],
  "awards": [{"title", "issuer", "date", "description"}],
  "languages": [{"language", "proficiency"}]
}

IMPORTANT: Copy values verbatim from the resume text. Dates stay in their
original format. Respond with the JSON object only."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_resume_and_sections() {
        let params = PromptParams {
            resume_text: "Jane Doe, engineer".to_string(),
            detected_sections: vec!["Summary".to_string(), "Skills".to_string()],
        };
        let prompt = render_extraction_prompt(&params);
        assert!(prompt.contains("Jane Doe, engineer"));
        assert!(prompt.contains("Summary, Skills"));
        assert!(!prompt.contains("{resume}"));
    }
}

//! Built-in prompt template library.
//!
//! Templates use `{{variable}}` placeholders. Rendering substitutes the
//! declared variables only; a missing value renders as `[variable]` so the
//! gap is visible instead of silently dropped.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A single prompt template.
#[derive(Debug, Clone, Serialize)]
pub struct PromptTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub template: &'static str,
    pub variables: &'static [&'static str],
    pub system_prompt: &'static str,
    pub category: &'static str,
    pub example_values: BTreeMap<&'static str, &'static str>,
}

/// Catalog of the built-in templates, in a fixed presentation order.
pub struct TemplateLibrary {
    templates: Vec<PromptTemplate>,
    by_id: HashMap<&'static str, usize>,
}

#[allow(clippy::too_many_arguments)]
fn tpl(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    template: &'static str,
    variables: &'static [&'static str],
    system_prompt: &'static str,
    category: &'static str,
    example_values: &[(&'static str, &'static str)],
) -> PromptTemplate {
    PromptTemplate {
        id,
        name,
        description,
        template,
        variables,
        system_prompt,
        category,
        example_values: example_values.iter().copied().collect(),
    }
}

impl TemplateLibrary {
    /// The standard ten-template catalog.
    pub fn builtin() -> Self {
        let templates = vec![
            tpl(
                "code_generation",
                "Code Generation",
                "Generate code in any programming language",
                "Write a {{language}} function that {{task}}. Include docstrings and type hints.",
                &["language", "task"],
                "You are an expert programmer who writes clean, efficient, well-documented code.",
                "coding",
                &[("language", "Python"), ("task", "calculates fibonacci numbers")],
            ),
            tpl(
                "data_extraction",
                "Data Extraction",
                "Extract structured data from unstructured text",
                "Extract {{fields}} from the following text in JSON format:\n\n{{text}}",
                &["fields", "text"],
                "You are a data extraction specialist. Always respond with valid JSON.",
                "extraction",
                &[
                    ("fields", "name, email, phone number"),
                    ("text", "Contact John Doe at john@example.com or call 555-1234"),
                ],
            ),
            tpl(
                "creative_writing",
                "Creative Writing",
                "Generate creative content in various styles",
                "Write a {{length}} {{style}} about {{topic}}.",
                &["length", "style", "topic"],
                "You are a creative writer with mastery of various literary styles.",
                "creative",
                &[
                    ("length", "short story"),
                    ("style", "sci-fi thriller"),
                    ("topic", "time travel paradox"),
                ],
            ),
            tpl(
                "summarization",
                "Text Summarization",
                "Summarize text in specified format",
                "Summarize the following text in {{format}}, focusing on {{focus}}:\n\n{{text}}",
                &["format", "focus", "text"],
                "You are an expert at distilling complex information into clear summaries.",
                "analysis",
                &[
                    ("format", "3 bullet points"),
                    ("focus", "key takeaways"),
                    ("text", "[Insert article or document here]"),
                ],
            ),
            tpl(
                "translation",
                "Translation",
                "Translate text between languages",
                "Translate the following {{from_lang}} text to {{to_lang}}:\n\n{{text}}",
                &["from_lang", "to_lang", "text"],
                "You are a professional translator who maintains tone and context.",
                "language",
                &[
                    ("from_lang", "English"),
                    ("to_lang", "Spanish"),
                    ("text", "Hello, how are you today?"),
                ],
            ),
            tpl(
                "qa_answering",
                "Question Answering",
                "Answer questions with specified detail level",
                "Answer the following question with {{detail_level}} detail:\n\n{{question}}",
                &["detail_level", "question"],
                "You are a knowledgeable assistant who provides accurate, well-structured answers.",
                "qa",
                &[
                    ("detail_level", "comprehensive"),
                    ("question", "How does photosynthesis work?"),
                ],
            ),
            tpl(
                "code_review",
                "Code Review",
                "Review code for quality and issues",
                "Review this {{language}} code for {{focus}}:\n\n```{{language}}\n{{code}}\n```",
                &["language", "focus", "code"],
                "You are a senior code reviewer focused on best practices and code quality.",
                "coding",
                &[
                    ("language", "python"),
                    ("focus", "bugs, performance, and readability"),
                    ("code", "def fib(n):\n    if n <= 1: return n\n    return fib(n-1) + fib(n-2)"),
                ],
            ),
            tpl(
                "brainstorming",
                "Brainstorming",
                "Generate creative ideas",
                "Generate {{count}} creative ideas for {{topic}}. Focus on {{criteria}}.",
                &["count", "topic", "criteria"],
                "You are a creative brainstorming partner who thinks outside the box.",
                "creative",
                &[
                    ("count", "5"),
                    ("topic", "a mobile app for pet owners"),
                    ("criteria", "unique features and monetization"),
                ],
            ),
            tpl(
                "email_generation",
                "Email Generation",
                "Write professional emails",
                "Write a {{tone}} email to {{recipient}} about {{subject}}.",
                &["tone", "recipient", "subject"],
                "You are a professional communication specialist.",
                "writing",
                &[
                    ("tone", "formal and friendly"),
                    ("recipient", "a potential client"),
                    ("subject", "proposal for web development project"),
                ],
            ),
            tpl(
                "explain_concept",
                "Concept Explanation",
                "Explain complex concepts simply",
                "Explain {{concept}} to a {{audience}} using {{approach}}.",
                &["concept", "audience", "approach"],
                "You are an expert educator who excels at making complex topics accessible.",
                "education",
                &[
                    ("concept", "quantum entanglement"),
                    ("audience", "high school student"),
                    ("approach", "everyday analogies"),
                ],
            ),
        ];
        let by_id = templates
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id, i))
            .collect();
        Self { templates, by_id }
    }

    /// Look up a template by id.
    pub fn get(&self, id: &str) -> Option<&PromptTemplate> {
        self.by_id.get(id).map(|&i| &self.templates[i])
    }

    /// All templates in presentation order.
    pub fn all(&self) -> &[PromptTemplate] {
        &self.templates
    }

    /// Templates belonging to one category, in presentation order.
    pub fn by_category(&self, category: &str) -> Vec<&PromptTemplate> {
        self.templates
            .iter()
            .filter(|t| t.category == category)
            .collect()
    }

    /// Distinct categories, sorted.
    pub fn categories(&self) -> Vec<&'static str> {
        let set: BTreeSet<&'static str> =
            self.templates.iter().map(|t| t.category).collect();
        set.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for TemplateLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Substitute a template's declared variables into its text.
///
/// Values for undeclared variables are ignored; placeholders the template
/// text carries beyond the declared list are left verbatim.
pub fn render(template: &PromptTemplate, values: &HashMap<String, String>) -> String {
    let mut prompt = template.template.to_string();
    for var in template.variables {
        let placeholder = format!("{{{{{var}}}}}");
        let value = match values.get(*var) {
            Some(v) => v.clone(),
            None => format!("[{var}]"),
        };
        prompt = prompt.replace(&placeholder, &value);
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_builtin_library_has_ten_templates() {
        let lib = TemplateLibrary::builtin();
        assert_eq!(lib.len(), 10);
        for id in [
            "code_generation",
            "data_extraction",
            "creative_writing",
            "summarization",
            "translation",
            "qa_answering",
            "code_review",
            "brainstorming",
            "email_generation",
            "explain_concept",
        ] {
            assert!(lib.get(id).is_some(), "missing builtin template {id}");
        }
    }

    #[test]
    fn test_get_unknown_template_is_none() {
        let lib = TemplateLibrary::builtin();
        assert!(lib.get("haiku_writer").is_none());
    }

    #[test]
    fn test_render_fills_all_variables() {
        let lib = TemplateLibrary::builtin();
        let t = lib.get("code_generation").unwrap();
        let rendered = render(
            t,
            &values(&[("language", "Rust"), ("task", "reverses a string")]),
        );
        assert_eq!(
            rendered,
            "Write a Rust function that reverses a string. Include docstrings and type hints."
        );
    }

    #[test]
    fn test_render_missing_value_uses_bracket_placeholder() {
        let lib = TemplateLibrary::builtin();
        let t = lib.get("code_generation").unwrap();
        let rendered = render(t, &values(&[("language", "Go")]));
        assert!(rendered.contains("Go"));
        assert!(rendered.contains("[task]"));
    }

    #[test]
    fn test_render_repeated_placeholder_fills_every_occurrence() {
        let lib = TemplateLibrary::builtin();
        // code_review uses {{language}} twice (prose and fence)
        let t = lib.get("code_review").unwrap();
        let rendered = render(
            t,
            &values(&[("language", "rust"), ("focus", "safety"), ("code", "fn x() {}")]),
        );
        assert_eq!(rendered.matches("rust").count(), 2);
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn test_render_leaves_undeclared_placeholders_verbatim() {
        let custom = tpl(
            "custom",
            "Custom",
            "test template",
            "Hello {{name}}, {{unbound}} stays",
            &["name"],
            "",
            "test",
            &[],
        );
        let rendered = render(&custom, &values(&[("name", "World"), ("unbound", "nope")]));
        assert_eq!(rendered, "Hello World, {{unbound}} stays");
    }

    #[test]
    fn test_example_values_render_without_leftover_placeholders() {
        let lib = TemplateLibrary::builtin();
        for t in lib.all() {
            let vals: HashMap<String, String> = t
                .example_values
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            let rendered = render(t, &vals);
            assert!(
                !rendered.contains("{{"),
                "template {} left unfilled placeholders: {rendered}",
                t.id
            );
        }
    }

    #[test]
    fn test_by_category_coding_has_generation_and_review() {
        let lib = TemplateLibrary::builtin();
        let coding: Vec<&str> = lib.by_category("coding").iter().map(|t| t.id).collect();
        assert_eq!(coding, vec!["code_generation", "code_review"]);
        assert!(lib.by_category("nonexistent").is_empty());
    }

    #[test]
    fn test_categories_sorted_distinct() {
        let lib = TemplateLibrary::builtin();
        assert_eq!(
            lib.categories(),
            vec![
                "analysis",
                "coding",
                "creative",
                "education",
                "extraction",
                "language",
                "qa",
                "writing"
            ]
        );
    }

    #[test]
    fn test_every_template_declares_its_placeholders() {
        let lib = TemplateLibrary::builtin();
        for t in lib.all() {
            for var in t.variables {
                assert!(
                    t.template.contains(&format!("{{{{{var}}}}}")),
                    "template {} declares unused variable {var}",
                    t.id
                );
                assert!(
                    t.example_values.contains_key(var),
                    "template {} lacks example value for {var}",
                    t.id
                );
            }
        }
    }
}

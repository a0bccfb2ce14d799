use std::fmt;

/// Summary language a sender can pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    English,
    Hebrew,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::Hebrew];

    /// Parse a user supplied language name, ignoring case and surrounding whitespace.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL
            .into_iter()
            .find(|lang| lang.tag().eq_ignore_ascii_case(tag))
    }

    /// Lowercase tag, e.g. `"hebrew"`.
    pub fn tag(self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Hebrew => "hebrew",
        }
    }

    /// Capitalized name shown to users, e.g. `"Hebrew"`.
    pub fn display_name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hebrew => "Hebrew",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

const ENGLISH_INSTRUCTIONS: &str = "Summarize the article in 3–5 short bullet points. \
Use simple Markdown formatting (like **bold**).\n\
Start each bullet with a dash (-) or an emoji that varies based on the content of that bullet";

const HEBREW_INSTRUCTIONS: &str = "סכם את המאמר ב-3 עד 5 נקודות קצרות. \
עצב את הפלט עם Markdown פשוט (כמו **bold**).\n\
תתחיל כל בולט במקף (-) או באימוג׳י שמשתנה בהתאם לתוכן של אותו הבולט";

/// Build the summarization prompt for `body_text` in `language`.
///
/// The instructions are followed by a blank line and the article text verbatim.
pub fn build_prompt(body_text: &str, language: Language) -> String {
    let instructions = match language {
        Language::Hebrew => HEBREW_INSTRUCTIONS,
        Language::English => ENGLISH_INSTRUCTIONS,
    };
    format!("{}\n\n{}", instructions, body_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tags_case_insensitively() {
        assert_eq!(Language::from_tag("Hebrew"), Some(Language::Hebrew));
        assert_eq!(Language::from_tag("  HEBREW "), Some(Language::Hebrew));
        assert_eq!(Language::from_tag("english"), Some(Language::English));
        assert_eq!(Language::from_tag("french"), None);
        assert_eq!(Language::from_tag(""), None);
    }

    #[test]
    fn default_language_is_english() {
        assert_eq!(Language::default(), Language::English);
        assert_eq!(Language::Hebrew.to_string(), "Hebrew");
    }

    #[test]
    fn english_prompt_wraps_article() {
        let prompt = build_prompt("Body of the article.", Language::English);
        assert!(prompt.starts_with("Summarize the article in 3–5 short bullet points."));
        assert!(prompt.contains("**bold**"));
        assert!(prompt.contains("dash (-) or an emoji"));
        assert!(prompt.ends_with("\n\nBody of the article."));
    }

    #[test]
    fn hebrew_prompt_is_selected_only_for_hebrew() {
        let hebrew = build_prompt("text", Language::Hebrew);
        let english = build_prompt("text", Language::English);

        assert!(hebrew.starts_with("סכם את המאמר"));
        assert!(hebrew.contains("**bold**"));
        assert!(hebrew.ends_with("\n\ntext"));
        assert_ne!(hebrew, english);
    }

    #[test]
    fn prompt_is_deterministic() {
        let body = "Same input twice. ".repeat(20);
        assert_eq!(
            build_prompt(&body, Language::Hebrew),
            build_prompt(&body, Language::Hebrew)
        );
        assert_eq!(
            build_prompt(&body, Language::English),
            build_prompt(&body, Language::English)
        );
    }
}

/*!
 * Prompt construction for batch translation.
 *
 * The user prompt names the target languages, shows the expected JSON
 * shape, and ends with the texts as a JSON array on its own line.
 */

use serde::{Deserialize, Serialize};

use crate::language_utils::describe_language;

/// System prompt shared by every batch call
pub const SYSTEM_PROMPT: &str = "You are a professional software localization translator. \
Translate user interface strings faithfully and concisely. \
Keep punctuation, numbers, placeholders and surrounding whitespace as they are. \
Return only valid JSON with no commentary.";

/// Marker line preceding the JSON array of texts
const TEXTS_MARKER: &str = "Texts:";

/// Marker preceding the comma-separated language codes
const LANGUAGES_MARKER: &str = "Target languages:";

/// One batch request: texts to translate into every language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationPrompt {
    /// Texts in chunk order
    pub texts: Vec<String>,
    /// Language codes expected as payload keys
    pub languages: Vec<String>,
}

impl TranslationPrompt {
    /// Create a prompt for a chunk
    pub fn new(texts: &[String], languages: &[String]) -> Self {
        Self {
            texts: texts.to_vec(),
            languages: languages.to_vec(),
        }
    }

    /// Render the user prompt
    pub fn render(&self) -> String {
        let described: Vec<String> = self.languages.iter().map(|l| describe_language(l)).collect();
        let example = self.example_payload();
        let texts = serde_json::to_string(&self.texts).unwrap_or_else(|_| "[]".to_string());

        format!(
            "Translate every item of the list below into: {}.\n\
             {} {}\n\
             Answer with a JSON object that has one key per language code, each holding \
             an array with exactly {} translation(s) in the same order as the input, \
             for example:\n```json\n{}\n```\n\
             {}\n{}",
            described.join(", "),
            LANGUAGES_MARKER,
            self.languages.join(","),
            self.texts.len(),
            example,
            TEXTS_MARKER,
            texts
        )
    }

    fn example_payload(&self) -> String {
        let entries: Vec<String> = self
            .languages
            .iter()
            .map(|language| format!("\"{}\": [\"...\"]", language))
            .collect();
        format!("{{ {} }}", entries.join(", "))
    }

    /// Recover the prompt's inputs from rendered text
    pub fn parse(rendered: &str) -> Option<Self> {
        let languages = rendered
            .lines()
            .find_map(|line| line.strip_prefix(LANGUAGES_MARKER))?
            .split(',')
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();

        let (_, after) = rendered.split_once(&format!("\n{}\n", TEXTS_MARKER))?;
        let texts = serde_json::from_str(after.trim()).ok()?;

        Some(Self { texts, languages })
    }
}

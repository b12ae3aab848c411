use crate::assistant::Assistant;
use crate::llm::LlmError;

pub fn translate_prompt(text: &str, target_language: &str, source_language: Option<&str>) -> String {
    match source_language {
        Some(source) if !source.eq_ignore_ascii_case("auto") =>
            format!("Translate this text from {} to {}:\n\n{}", source, target_language, text),
        _ => format!("Translate this text to {}:\n\n{}", target_language, text),
    }
}

pub fn detect_language_prompt(text: &str) -> String {
    format!("What language is this text written in? Respond with just the language name.\n\nText: {}", text)
}

pub fn contextual_translation_prompt(text: &str, target_language: &str, context: &str) -> String {
    format!(
        "Context: {}\n\nTranslate this text to {}, considering the context:\n{}",
        context,
        target_language,
        text
    )
}

pub struct Translator {
    assistant: Assistant,
}

impl Translator {
    pub fn new(assistant: Assistant) -> Self {
        Self { assistant }
    }

    pub async fn translate(
        &self,
        text: &str,
        target_language: &str,
        source_language: Option<&str>
    ) -> Result<String, LlmError> {
        self.assistant.ask(&translate_prompt(text, target_language, source_language)).await
    }

    pub async fn detect_language(&self, text: &str) -> Result<String, LlmError> {
        let reply = self.assistant.ask(&detect_language_prompt(text)).await?;
        Ok(reply.trim().to_string())
    }

    pub async fn translate_with_context(
        &self,
        text: &str,
        target_language: &str,
        context: &str
    ) -> Result<String, LlmError> {
        self.assistant.ask(&contextual_translation_prompt(text, target_language, context)).await
    }

    /// One call per language, in the given order; failures become `Error: ...` text.
    pub async fn translate_many(&self, text: &str, languages: &[&str]) -> Vec<(String, String)> {
        let mut translations = Vec::with_capacity(languages.len());
        for lang in languages {
            log::info!("Translating to {}...", lang);
            let outcome = crate::assistant::render_outcome(self.translate(text, lang, None).await);
            translations.push((lang.to_string(), outcome));
        }
        translations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockChatClient;
    use std::sync::Arc;

    #[test]
    fn auto_source_omits_from_clause() {
        assert_eq!(
            translate_prompt("Hello", "Spanish", None),
            "Translate this text to Spanish:\n\nHello"
        );
        assert_eq!(translate_prompt("Hello", "Spanish", Some("auto")), translate_prompt("Hello", "Spanish", None));
        assert_eq!(
            translate_prompt("Hallo", "English", Some("German")),
            "Translate this text from German to English:\n\nHallo"
        );
    }

    #[tokio::test]
    async fn context_comes_before_instruction() {
        assert_eq!(
            contextual_translation_prompt("I'm feeling blue", "Spanish", "Casual chat between friends"),
            "Context: Casual chat between friends\n\nTranslate this text to Spanish, considering the context:\nI'm feeling blue"
        );

        let mock = Arc::new(MockChatClient::new(vec!["Me siento triste"]));
        let translator = Translator::new(Assistant::new(mock.clone()));
        let reply = translator
            .translate_with_context("I'm feeling blue", "Spanish", "Casual chat").await
            .unwrap();
        assert_eq!(reply, "Me siento triste");
        assert!(mock.requests()[0].last_text().starts_with("Context: Casual chat\n\n"));
    }

    #[tokio::test]
    async fn translate_many_keeps_language_order() {
        let translator = Translator::new(
            Assistant::new(Arc::new(MockChatClient::new(vec!["¡Buenos días!", "Bonjour !"])))
        );
        let out = translator.translate_many("Good morning!", &["Spanish", "French"]).await;
        assert_eq!(
            out,
            vec![
                ("Spanish".to_string(), "¡Buenos días!".to_string()),
                ("French".to_string(), "Bonjour !".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn detect_language_trims_reply() {
        let translator = Translator::new(Assistant::new(Arc::new(MockChatClient::new(vec![" French\n"]))));
        assert_eq!(translator.detect_language("Bonjour").await.unwrap(), "French");
    }
}

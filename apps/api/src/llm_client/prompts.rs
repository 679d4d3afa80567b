// Prompt builders for text generation.

/// Asks for a creative story based on a document title.
pub fn story_prompt(title: &str) -> String {
    format!("Escribe una historia creativa basada en el título: '{title}'.")
}

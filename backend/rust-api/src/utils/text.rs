use html_escape::decode_html_entities;

/// Question banks store prompts and answers HTML-escaped (`&quot;`, `&#039;`).
/// Decodes them for display only; scoring always uses the stored string.
pub fn display_text(stored: &str) -> String {
    decode_html_entities(stored).into_owned()
}

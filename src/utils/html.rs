// src/utils/html.rs

/// Clean teacher feedback, which clients render as HTML, with ammonia.
///
/// Whitelist-based: safe tags like <b> and <p> survive, <script>/<iframe>
/// and event-handler attributes are stripped. Student answers are stored
/// as sent and never pass through here.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Cleans an optional field, keeping `None` as `None`.
pub fn clean_optional(input: Option<String>) -> Option<String> {
    input.map(|text| clean_html(&text))
}

use regex::Regex;
use std::sync::OnceLock;

pub const CSRF_FIELD: &str = "csrfmiddlewaretoken";
pub const CSRF_HEADER: &str = "X-CSRFToken";

fn input_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?is)<input\b[^>]*>").expect("valid input tag regex"))
}

fn attribute_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)([a-z_:-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
            .expect("valid attribute regex")
    })
}

/// Reads the value of the `csrfmiddlewaretoken` hidden field. Returns an empty
/// string when the document has no such field.
pub fn csrf_token(html: &str) -> String {
    for tag in input_tag_pattern().find_iter(html) {
        let mut name = None;
        let mut value = None;
        for caps in attribute_pattern().captures_iter(tag.as_str()) {
            let attr = caps[1].to_ascii_lowercase();
            let content = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            match attr.as_str() {
                "name" => name = Some(content),
                "value" => value = Some(content),
                _ => {}
            }
        }
        if name.as_deref() == Some(CSRF_FIELD) {
            return value.unwrap_or_default();
        }
    }
    String::new()
}

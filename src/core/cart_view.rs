//! Reads the cart page the server renders: the badge count and one subtotal
//! fragment per line item.

use crate::domain::model::CartLine;
use crate::utils::csrf::csrf_token;
use crate::utils::currency::parse_currency;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

pub const BADGE_ID: &str = "carrito-badge";
pub const SUBTOTAL_CLASS: &str = "subtotal";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartView {
    pub badge_count: Option<u32>,
    pub lines: Vec<CartLine>,
    pub csrf_token: String,
}

fn element_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"<([a-zA-Z][a-zA-Z0-9]*)\b([^>]*)>([^<]*)").expect("valid element regex")
    })
}

fn attribute_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)([a-z_:-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
            .expect("valid attribute regex")
    })
}

fn attributes(raw: &str) -> HashMap<String, String> {
    attribute_pattern()
        .captures_iter(raw)
        .map(|caps| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            (caps[1].to_ascii_lowercase(), value)
        })
        .collect()
}

impl CartView {
    pub fn parse(html: &str) -> Self {
        let mut view = CartView {
            csrf_token: csrf_token(html),
            ..Default::default()
        };

        for caps in element_pattern().captures_iter(html) {
            let attrs = attributes(&caps[2]);
            let text = caps[3].trim();

            if attrs.get("id").map(String::as_str) == Some(BADGE_ID) {
                view.badge_count = text.parse().ok();
                continue;
            }

            let is_subtotal = attrs
                .get("class")
                .map(|class| class.split_whitespace().any(|c| c == SUBTOTAL_CLASS))
                .unwrap_or(false);
            if !is_subtotal {
                continue;
            }
            let (Some(item_id), Some(subtotal)) = (attrs.get("data-item-id"), parse_currency(text))
            else {
                tracing::debug!("Skipping unreadable subtotal fragment {:?}", text);
                continue;
            };
            view.lines.push(CartLine {
                item_id: item_id.clone(),
                subtotal,
            });
        }

        view
    }
}

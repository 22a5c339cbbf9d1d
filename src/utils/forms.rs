//! Checkout and registration form helpers.

use regex::Regex;
use std::sync::OnceLock;

pub const REQUIRED_MESSAGE: &str = "Este campo es obligatorio";
pub const EMAIL_MESSAGE: &str = "Ingresa un email válido";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Phone,
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub name: String,
    pub value: String,
    pub kind: FieldKind,
    pub required: bool,
}

impl FormField {
    pub fn new(name: &str, value: &str, kind: FieldKind, required: bool) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            kind,
            required,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: &'static str,
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

/// Returns one error per invalid field; an empty list means the form may be
/// submitted.
pub fn validate_form(fields: &[FormField]) -> Vec<FieldError> {
    let mut errors = Vec::new();
    for field in fields {
        if field.required && field.value.trim().is_empty() {
            errors.push(FieldError {
                field: field.name.clone(),
                message: REQUIRED_MESSAGE,
            });
            continue;
        }
        if field.kind == FieldKind::Email && !field.value.is_empty() && !is_valid_email(&field.value)
        {
            errors.push(FieldError {
                field: field.name.clone(),
                message: EMAIL_MESSAGE,
            });
        }
    }
    errors
}

/// `3001234567` -> `300 123 4567`. Extra digits past ten are dropped.
pub fn format_phone(input: &str) -> String {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.len() {
        0..=3 => digits,
        4..=6 => format!("{} {}", &digits[..3], &digits[3..]),
        _ => {
            let end = digits.len().min(10);
            format!("{} {} {}", &digits[..3], &digits[3..6], &digits[6..end])
        }
    }
}

/// Groups card digits in blocks of four.
pub fn format_card_number(input: &str) -> String {
    let digits: Vec<char> = input.chars().filter(|c| c.is_ascii_digit()).collect();
    digits
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

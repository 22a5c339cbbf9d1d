use crate::core::notifier::Notifier;
use crate::domain::model::{CartSummary, Severity};
use crate::domain::ports::{CartRenderer, Confirmer};
use crate::utils::currency::format_currency;
use async_trait::async_trait;
use std::io::{BufRead, Write};

/// Prints every cart change to stdout.
#[derive(Debug, Clone, Default)]
pub struct TerminalRenderer;

impl CartRenderer for TerminalRenderer {
    fn render_badge(&self, count: u32) {
        println!("🛒 Carrito: {}", count);
    }

    fn pulse_badge(&self) {
        tracing::trace!("badge pulse");
    }

    fn render_line_subtotal(&self, item_id: &str, formatted: &str) {
        println!("   item {}: {}", item_id, formatted);
    }

    fn remove_line(&self, item_id: &str) {
        println!("   item {} eliminado", item_id);
    }

    fn render_summary(&self, summary: &CartSummary) {
        println!(
            "   Subtotal: {}  IVA (19%): {}  Total: {}",
            format_currency(summary.subtotal),
            format_currency(summary.tax),
            format_currency(summary.total)
        );
    }

    fn reload(&self) {
        println!("🔄 El carrito quedó vacío, recarga la vista del carrito");
    }
}

pub fn print_notifications(notifier: &Notifier) {
    for notification in notifier.visible() {
        let marker = match notification.severity {
            Severity::Success => "✅",
            Severity::Error => "❌",
            Severity::Warning => "⚠️",
            Severity::Info => "ℹ️",
        };
        match notification.severity {
            Severity::Error | Severity::Warning => eprintln!("{} {}", marker, notification.message),
            _ => println!("{} {}", marker, notification.message),
        }
    }
}

/// Asks on the terminal; anything but an explicit yes declines.
#[derive(Debug, Clone, Default)]
pub struct StdinConfirmer;

pub fn is_affirmative(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "s" | "si" | "sí" | "y" | "yes"
    )
}

#[async_trait]
impl Confirmer for StdinConfirmer {
    async fn confirm(&self, prompt: &str) -> bool {
        let prompt = prompt.to_string();
        let answer = tokio::task::spawn_blocking(move || {
            print!("{} [s/N] ", prompt);
            std::io::stdout().flush().ok();
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map(|_| line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => is_affirmative(&line),
            Ok(Err(e)) => {
                tracing::warn!("Could not read confirmation: {}", e);
                false
            }
            Err(e) => {
                tracing::warn!("Confirmation prompt aborted: {}", e);
                false
            }
        }
    }
}

/// `--yes` on the command line.
#[derive(Debug, Clone, Default)]
pub struct AssumeYes;

#[async_trait]
impl Confirmer for AssumeYes {
    async fn confirm(&self, prompt: &str) -> bool {
        tracing::debug!("Auto-confirming: {}", prompt);
        true
    }
}

/// Picks the prompt or the auto-confirmation at runtime.
pub enum TerminalConfirmer {
    Prompt(StdinConfirmer),
    AssumeYes(AssumeYes),
}

impl TerminalConfirmer {
    pub fn new(assume_yes: bool) -> Self {
        if assume_yes {
            TerminalConfirmer::AssumeYes(AssumeYes)
        } else {
            TerminalConfirmer::Prompt(StdinConfirmer)
        }
    }
}

#[async_trait]
impl Confirmer for TerminalConfirmer {
    async fn confirm(&self, prompt: &str) -> bool {
        match self {
            TerminalConfirmer::Prompt(inner) => inner.confirm(prompt).await,
            TerminalConfirmer::AssumeYes(inner) => inner.confirm(prompt).await,
        }
    }
}

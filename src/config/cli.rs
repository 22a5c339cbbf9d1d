use clap::Subcommand;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Subcommand)]
pub enum Command {
    /// Add a book to the cart
    Add {
        item_id: String,
        #[arg(long, short, default_value = "1")]
        quantity: u32,
    },
    /// Change the quantity of a cart line; below 1 removes it
    Update {
        item_id: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a cart line
    Remove {
        item_id: String,
        #[arg(long, short, help = "Do not ask for confirmation")]
        yes: bool,
    },
    /// Show the cart item count
    Badge,
    /// Show the cart lines and totals
    Cart,
}

use clap::Parser;
use std::sync::Arc;
use venta_cart::adapters::terminal::print_notifications;
use venta_cart::config::cli::Command;
use venta_cart::domain::model::ActionOutcome;
use venta_cart::domain::ports::ConfigProvider;
use venta_cart::utils::currency::format_currency;
use venta_cart::utils::logger;
use venta_cart::{
    CartDispatcher, CliConfig, Control, HttpCartApi, Notifier, TerminalConfirmer,
    TerminalRenderer,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    if config.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }
    tracing::info!("Starting venta-cart");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    let settings = match config.resolve() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let provider: &dyn ConfigProvider = &settings;
    let api = HttpCartApi::from_config(provider, settings.endpoints.clone())?;

    let assume_yes = matches!(config.command, Command::Remove { yes: true, .. });
    let notifier = Arc::new(Notifier::new(provider.notification_ttl()));
    let dispatcher = CartDispatcher::new(
        api,
        TerminalRenderer,
        TerminalConfirmer::new(assume_yes),
        Arc::clone(&notifier),
    )
    .with_success_revert(provider.success_revert());

    // the cart page seeds the local cart and carries the CSRF field
    match dispatcher.load_cart_view().await {
        Ok(view) => {
            if provider.csrf_token().is_none() {
                dispatcher.api().set_csrf_token(view.csrf_token);
            }
        }
        Err(e) => tracing::warn!("Could not load cart view: {}", e),
    }

    let result = match &config.command {
        Command::Add { item_id, quantity } => {
            let control = Control::new("Agregar al carrito");
            dispatcher.add(item_id, *quantity, &control).await.map(Some)
        }
        Command::Update { item_id, quantity } => {
            let control = Control::new(quantity.to_string());
            dispatcher.update(item_id, *quantity, &control).await.map(Some)
        }
        Command::Remove { item_id, .. } => {
            let control = Control::new("Eliminar");
            dispatcher.remove(item_id, &control).await.map(Some)
        }
        Command::Badge => {
            let count = dispatcher.refresh_badge_count().await.unwrap_or(0);
            println!("{}", count);
            Ok(None)
        }
        Command::Cart => {
            for line in dispatcher.lines() {
                println!("   item {}: {}", line.item_id, format_currency(line.subtotal));
            }
            let summary = dispatcher.summary();
            println!("   Total: {}", format_currency(summary.total));
            Ok(None)
        }
    };

    print_notifications(&notifier);
    notifier.shutdown();

    match result {
        Ok(Some(ActionOutcome::Declined)) => {
            tracing::info!("Operation cancelled by the user");
        }
        Ok(outcome) => {
            tracing::debug!("Outcome: {:?}", outcome);
        }
        Err(e) => {
            tracing::error!("❌ Cart operation failed: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

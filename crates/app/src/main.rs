use std::io;

use anyhow::Context;
use uuid::Uuid;

use pocketshop_app::{AppConfig, ProductManager, terminal};

fn main() -> anyhow::Result<()> {
    pocketshop_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let session_id = Uuid::now_v7();
    let span = tracing::info_span!("session", %session_id);
    let _guard = span.enter();

    tracing::info!(
        max_products = config.max_products,
        notification_timeout_ms = config.notification_timeout.num_milliseconds(),
        "starting product manager"
    );

    let mut manager = ProductManager::new(&config);
    terminal::run(&mut manager, io::stdin().lock(), io::stdout().lock())?;

    tracing::info!(products = manager.store().len(), "session ended");
    Ok(())
}

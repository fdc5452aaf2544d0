use tracing::warn;

use crate::controllers::paste::{self, SweepPolicy};
use crate::App;

pub async fn run(app: App) -> anyhow::Result<()> {
    if !app.config.expiry.enabled {
        warn!("expiry is disabled, doing nothing");
        return Ok(());
    }

    let count = paste::sweep(&app, SweepPolicy::from(&app.config.expiry)).await?;
    println!("deleted {count} pastes");

    Ok(())
}

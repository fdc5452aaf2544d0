use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::models::{Paste, DEFAULT_HEADING};
use crate::{ApiError, App};

/// Thresholds for deleting pastes nobody looked at.
#[derive(Debug, Clone, Copy)]
pub struct SweepPolicy {
    pub min_opens: i64,
    pub min_age: Duration,
}

impl From<&crate::config::Expiry> for SweepPolicy {
    fn from(expiry: &crate::config::Expiry) -> Self {
        SweepPolicy {
            min_opens: expiry.min_opens,
            min_age: Duration::from_secs(expiry.min_age_secs),
        }
    }
}

pub async fn create(
    app: &App,
    data: &str,
    heading: Option<&str>,
    ip_address: &str,
) -> crate::ApiResult<Paste> {
    if data.trim().is_empty() {
        return Err(ApiError::EmptyData);
    }

    let heading = match heading.map(str::trim) {
        Some(heading) if !heading.is_empty() => heading,
        _ => DEFAULT_HEADING,
    };

    let attempts = app.config.keys.max_attempts;
    for attempt in 1..=attempts {
        let key = app.keys.generate();
        let inserted = app
            .database
            .insert_paste(&key, data, heading, ip_address, Utc::now())
            .await?;

        match inserted {
            Some(paste) => {
                info!(
                    "new paste: key='{key}', size={size}, ip='{ip_address}'",
                    size = data.len()
                );
                return Ok(paste);
            }
            None => warn!("key collision on '{key}' (attempt {attempt}/{attempts})"),
        }
    }

    Err(ApiError::KeySpaceExhausted { attempts })
}

/// Fetch a paste, counting the fetch as an open.
pub async fn open(app: &App, key: &str) -> crate::ApiResult<Paste> {
    app.database.open_paste(key).await
}

pub async fn sweep(app: &App, policy: SweepPolicy) -> crate::ApiResult<u64> {
    // an age too large to represent can never be exceeded
    let Ok(min_age) = chrono::Duration::from_std(policy.min_age) else {
        return Ok(0);
    };
    let Some(cutoff) = Utc::now().checked_sub_signed(min_age) else {
        return Ok(0);
    };

    let count = app
        .database
        .delete_stale_pastes(policy.min_opens, cutoff)
        .await?;

    info!(
        "deleted {count} pastes with fewer than {} opens created before {cutoff}",
        policy.min_opens
    );

    Ok(count)
}

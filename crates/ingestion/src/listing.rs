//! Time-window discovery of remote keys.
//!
//! Level II archives are a date tree (`YYYY/MM/DD/SITE/`), walked one
//! calendar day at a time with a timestamp filter on each key. Level III
//! archives are flat; keys are found with hour-bucket prefix queries per
//! product code, and the bucket itself pins the time.

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use radar_common::{IngestWindow, RadarResult};
use storage::RemoteStore;

use crate::filename::{base_name, level2_timestamp, level3_site, Level3Key};
use crate::outcome::ItemOutcome;

/// A listed key that survived filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub key: String,
    pub timestamp: DateTime<Utc>,
}

/// Suffix rules for Level II volume keys.
#[derive(Debug, Clone)]
pub struct VolumeSuffixes {
    /// Suffix every volume key ends with
    pub volume: String,
    /// Suffix of metadata-only companions to leave out
    pub exclude: String,
}

impl Default for VolumeSuffixes {
    fn default() -> Self {
        Self {
            volume: "V06".to_string(),
            exclude: "_MDM".to_string(),
        }
    }
}

/// Prefix of one day's Level II volumes for a site.
pub fn level2_prefix(date: chrono::NaiveDate, site: &str) -> String {
    format!("{}/{}/", date.format("%Y/%m/%d"), site)
}

/// Prefix of one hour's Level III products for a site and code.
pub fn level3_prefix(site: &str, code: &str, hour: DateTime<Utc>) -> String {
    format!("{}_{}_{}", level3_site(site), code, hour.format("%Y_%m_%d_%H"))
}

/// List Level II volumes for `window`.
///
/// Keys whose timestamp cannot be parsed are reported as skipped; keys
/// outside the window are dropped silently.
#[instrument(skip(store, suffixes), fields(site = %window.site))]
pub async fn list_level2(
    store: &dyn RemoteStore,
    window: &IngestWindow,
    suffixes: &VolumeSuffixes,
) -> RadarResult<Vec<ItemOutcome<Candidate>>> {
    let mut outcomes = Vec::new();

    for date in window.dates() {
        let prefix = level2_prefix(date, &window.site);
        let keys = store.list_all(&prefix).await?;
        debug!(prefix = %prefix, count = keys.len(), "Listed day");

        for key in keys {
            let name = base_name(&key);
            if !name.ends_with(&suffixes.volume) || name.ends_with(&suffixes.exclude) {
                continue;
            }

            match level2_timestamp(&key) {
                Ok(timestamp) if window.contains(timestamp) => {
                    outcomes.push(ItemOutcome::Done(Candidate { key, timestamp }));
                }
                Ok(timestamp) => {
                    debug!(key = %key, %timestamp, "Outside window");
                }
                Err(e) => {
                    warn!(key = %key, stage = "parse", error = %e, "Skipping unparseable key");
                    outcomes.push(ItemOutcome::skipped(key, e.to_string()));
                }
            }
        }
    }

    info!(
        candidates = outcomes.iter().filter(|o| o.is_done()).count(),
        "Level II discovery complete"
    );
    Ok(outcomes)
}

/// List Level III products for `window` and each of `codes`.
///
/// Every hour bucket from the window start (truncated to the hour) through
/// the window end is queried, draining pagination before moving on.
#[instrument(skip(store, codes), fields(site = %window.site))]
pub async fn list_level3(
    store: &dyn RemoteStore,
    window: &IngestWindow,
    codes: &[String],
) -> RadarResult<Vec<ItemOutcome<Candidate>>> {
    let mut outcomes = Vec::new();
    let hours = window.hours();

    for code in codes {
        let before = outcomes.len();
        for &hour in &hours {
            let prefix = level3_prefix(&window.site, code, hour);
            let keys = store.list_all(&prefix).await?;

            for key in keys {
                match Level3Key::parse(&key) {
                    Ok(parsed) => outcomes.push(ItemOutcome::Done(Candidate {
                        key,
                        timestamp: parsed.timestamp,
                    })),
                    Err(e) => {
                        warn!(key = %key, stage = "parse", "Skipping key with unexpected pattern");
                        outcomes.push(ItemOutcome::skipped(key, e.to_string()));
                    }
                }
            }
        }
        debug!(code = %code, count = outcomes.len() - before, "Listed product code");
    }

    info!(
        candidates = outcomes.iter().filter(|o| o.is_done()).count(),
        codes = codes.len(),
        "Level III discovery complete"
    );
    Ok(outcomes)
}

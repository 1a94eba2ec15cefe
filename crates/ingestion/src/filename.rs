//! Filename conventions of the NEXRAD archives.
//!
//! Level II volumes are keyed `YYYY/MM/DD/SITE/SITEYYYYMMDD_HHMMSS_V06`.
//! Level III products are keyed `SSS_PPP_YYYY_MM_DD_HH_MM_SS` where `SSS`
//! is the three-letter site and `PPP` the product code.
//!
//! Both families normalize to one identifier per file, used as the manifest
//! key and as the base name of every artifact derived from the file:
//! - Level II: the uppercase base name, e.g. `KPDT20240501_091522_V06`
//! - Level III: `K` + site + date, time, code, e.g. `KPDT20240501_091522_HHC`

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use radar_common::{ProductFamily, RadarError, RadarResult};

static LEVEL3_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<site>[A-Z]{3})_(?P<product>[A-Z0-9]{3})_(?P<year>\d{4})_(?P<month>\d{2})_(?P<day>\d{2})_(?P<hour>\d{2})_(?P<minute>\d{2})_(?P<second>\d{2})$",
    )
    .expect("level 3 key regex compiles")
});

static LEVEL3_IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^K(?P<site>[A-Z]{3})(?P<date>\d{8})_(?P<time>\d{6})_(?P<product>[A-Z0-9]{3})$")
        .expect("level 3 identifier regex compiles")
});

/// Final path segment of an object key.
pub fn base_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Three-letter Level III site for a four-letter ICAO site (`KPDT` -> `PDT`).
pub fn level3_site(site: &str) -> &str {
    if site.len() == 4 && site.is_ascii() {
        &site[1..]
    } else {
        site
    }
}

/// Timestamp of a Level II volume.
///
/// The first underscore-delimited segment carries the site followed by the
/// date; the second carries the time.
pub fn level2_timestamp(key: &str) -> RadarResult<DateTime<Utc>> {
    let name = base_name(key);
    let mut parts = name.split('_');
    let head = parts.next().unwrap_or_default();
    let time = parts
        .next()
        .ok_or_else(|| RadarError::Parse(name.to_string()))?;
    let date = head
        .get(4..)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| RadarError::Parse(name.to_string()))?;

    let naive = NaiveDateTime::parse_from_str(&format!("{}_{}", date, time), "%Y%m%d_%H%M%S")
        .map_err(|e| RadarError::Parse(format!("{}: {}", name, e)))?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// A parsed Level III key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level3Key {
    /// Three-letter site
    pub site: String,
    /// Three-character product code
    pub product: String,
    pub timestamp: DateTime<Utc>,
}

impl Level3Key {
    /// Parse a raw archive key, e.g. `PDT_HHC_2024_05_01_09_15_22`.
    pub fn parse(key: &str) -> RadarResult<Self> {
        let name = base_name(key);
        let caps = LEVEL3_KEY
            .captures(name)
            .ok_or_else(|| RadarError::Parse(name.to_string()))?;

        let invalid = || RadarError::Parse(format!("{}: invalid date or time", name));
        let field = |group: &str| caps[group].parse::<u32>().map_err(|_| invalid());

        let year = caps["year"].parse::<i32>().map_err(|_| invalid())?;
        let naive = NaiveDate::from_ymd_opt(year, field("month")?, field("day")?)
            .and_then(|d| d.and_hms_opt(field("hour").ok()?, field("minute").ok()?, field("second").ok()?))
            .ok_or_else(invalid)?;

        Ok(Self {
            site: caps["site"].to_string(),
            product: caps["product"].to_string(),
            timestamp: Utc.from_utc_datetime(&naive),
        })
    }

    /// Parse either the raw key shape or the identifier shape, any casing.
    pub fn parse_any(name: &str) -> RadarResult<Self> {
        let upper = base_name(name).to_ascii_uppercase();
        if let Ok(key) = Self::parse(&upper) {
            return Ok(key);
        }

        let caps = LEVEL3_IDENTIFIER
            .captures(&upper)
            .ok_or_else(|| RadarError::Parse(name.to_string()))?;
        let naive = NaiveDateTime::parse_from_str(
            &format!("{}_{}", &caps["date"], &caps["time"]),
            "%Y%m%d_%H%M%S",
        )
        .map_err(|e| RadarError::Parse(format!("{}: {}", name, e)))?;

        Ok(Self {
            site: caps["site"].to_string(),
            product: caps["product"].to_string(),
            timestamp: Utc.from_utc_datetime(&naive),
        })
    }

    /// Canonical identifier, e.g. `KPDT20240501_091522_HHC`.
    pub fn identifier(&self) -> String {
        format!(
            "K{}{}_{}",
            self.site,
            self.timestamp.format("%Y%m%d_%H%M%S"),
            self.product
        )
    }
}

/// Timestamp of a Level III product key.
pub fn level3_timestamp(key: &str) -> RadarResult<DateTime<Utc>> {
    Level3Key::parse(key).map(|k| k.timestamp)
}

/// Product code of a Level III identifier (its last three characters).
pub fn level3_code(identifier: &str) -> Option<&str> {
    let len = identifier.len();
    if len < 3 || !identifier.is_ascii() {
        return None;
    }
    Some(&identifier[len - 3..])
}

/// Manifest identifier for a key of the given family.
pub fn normalize(family: ProductFamily, key: &str) -> RadarResult<String> {
    match family {
        ProductFamily::Level2 => {
            let name = base_name(key).trim();
            if name.is_empty() {
                return Err(RadarError::Parse(key.to_string()));
            }
            Ok(name.to_ascii_uppercase())
        }
        ProductFamily::Level3 => Level3Key::parse_any(key).map(|k| k.identifier()),
    }
}

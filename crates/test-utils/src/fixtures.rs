//! Common test fixtures for radar ingestion tests.
//!
//! Site locations and filenames follow the conventions of the public
//! NEXRAD archives.

/// Radar site locations as (lon, lat) in degrees.
pub mod sites {
    /// Pendleton, Oregon
    pub const KPDT: (f64, f64) = (-118.8529, 45.6906);

    /// Oklahoma City (Twin Lakes)
    pub const KTLX: (f64, f64) = (-97.2778, 35.3331);

    /// Sydney (Terrey Hills), southern and eastern hemispheres
    pub const SYDNEY: (f64, f64) = (151.2094, -33.7008);

    /// A site on the equator at the prime meridian
    pub const NULL_ISLAND: (f64, f64) = (0.0, 0.0);
}

/// Representative object keys for both product families.
pub mod keys {
    /// Level II volume key for 2024-05-01 09:15:22 UTC
    pub const LEVEL2_VOLUME: &str = "2024/05/01/KPDT/KPDT20240501_091522_V06";

    /// Metadata-only companion of a Level II volume
    pub const LEVEL2_MDM: &str = "2024/05/01/KPDT/KPDT20240501_091522_V06_MDM";

    /// Level III hydrometeor classification key for 2024-05-01 09:15:22 UTC
    pub const LEVEL3_PRODUCT: &str = "PDT_HHC_2024_05_01_09_15_22";

    /// Level III identifier in artifact form
    pub const LEVEL3_IDENTIFIER: &str = "KPDT20240501_091522_HHC";
}

/// Build a Level II key for a site and `YYYYMMDD`/`HHMMSS` stamp.
pub fn level2_key(site: &str, date: &str, time: &str) -> String {
    format!(
        "{}/{}/{}/{}/{}{}_{}_V06",
        &date[0..4],
        &date[4..6],
        &date[6..8],
        site,
        site,
        date,
        time
    )
}

/// Build a Level III key from its six numeric fields.
pub fn level3_key(site: &str, code: &str, stamp: [u32; 6]) -> String {
    format!(
        "{}_{}_{:04}_{:02}_{:02}_{:02}_{:02}_{:02}",
        site, code, stamp[0], stamp[1], stamp[2], stamp[3], stamp[4], stamp[5]
    )
}

/// Temporary directory removed on drop.
pub fn temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

//! Product families and their naming conventions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two NEXRAD product conventions handled by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductFamily {
    /// Multi-sweep volume scans keyed as `YYYY/MM/DD/SITE/SITEYYYYMMDD_HHMMSS_V06`.
    Level2,
    /// Single-product files keyed as `SITE_CODE_YYYY_MM_DD_HH_MM_SS`.
    Level3,
}

impl ProductFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductFamily::Level2 => "level2",
            ProductFamily::Level3 => "level3",
        }
    }
}

impl fmt::Display for ProductFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

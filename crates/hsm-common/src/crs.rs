//! Coordinate Reference System codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// CRS codes the pipeline knows how to transform between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CrsCode {
    /// WGS84 Geographic (lon/lat in degrees). The display CRS.
    Epsg4326,
    /// Web Mercator (meters)
    Epsg3857,
    /// OSGB36 / British National Grid (meters)
    Epsg27700,
    /// WGS84 / UTM zone (EPSG 326xx north, 327xx south)
    Utm { zone: u8, north: bool },
}

impl CrsCode {
    /// The CRS every geospatial layer is reprojected to before display.
    pub const DISPLAY: CrsCode = CrsCode::Epsg4326;

    /// Resolve a numeric EPSG code.
    pub fn from_epsg(code: u32) -> Result<Self, CrsParseError> {
        match code {
            4326 => Ok(CrsCode::Epsg4326),
            3857 | 900913 => Ok(CrsCode::Epsg3857),
            27700 => Ok(CrsCode::Epsg27700),
            32601..=32660 => Ok(CrsCode::Utm {
                zone: (code - 32600) as u8,
                north: true,
            }),
            32701..=32760 => Ok(CrsCode::Utm {
                zone: (code - 32700) as u8,
                north: false,
            }),
            _ => Err(CrsParseError::UnsupportedCrs(format!("EPSG:{}", code))),
        }
    }

    /// Numeric EPSG code for this CRS.
    pub fn epsg(&self) -> u32 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg3857 => 3857,
            CrsCode::Epsg27700 => 27700,
            CrsCode::Utm { zone, north: true } => 32600 + *zone as u32,
            CrsCode::Utm { zone, north: false } => 32700 + *zone as u32,
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326)
    }
}

impl FromStr for CrsCode {
    type Err = CrsParseError;

    /// Accepts "EPSG:27700", "epsg:4326", "OGC:CRS84", "CRS:84" and bare codes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();

        match normalized.as_str() {
            "OGC:CRS84" | "CRS:84" | "CRS84" => return Ok(CrsCode::Epsg4326),
            _ => {}
        }

        let digits = normalized.strip_prefix("EPSG:").unwrap_or(&normalized);
        let code: u32 = digits
            .parse()
            .map_err(|_| CrsParseError::UnsupportedCrs(s.to_string()))?;
        CrsCode::from_epsg(code)
    }
}

impl TryFrom<String> for CrsCode {
    type Error = CrsParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CrsCode> for String {
    fn from(code: CrsCode) -> Self {
        code.to_string()
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crs() {
        assert_eq!("EPSG:4326".parse::<CrsCode>().unwrap(), CrsCode::Epsg4326);
        assert_eq!("epsg:27700".parse::<CrsCode>().unwrap(), CrsCode::Epsg27700);
        assert_eq!("OGC:CRS84".parse::<CrsCode>().unwrap(), CrsCode::Epsg4326);
        assert_eq!("3857".parse::<CrsCode>().unwrap(), CrsCode::Epsg3857);
        assert!("EPSG:99999".parse::<CrsCode>().is_err());
        assert!("not a crs".parse::<CrsCode>().is_err());
    }

    #[test]
    fn test_utm_codes() {
        let code = CrsCode::from_epsg(32630).unwrap();
        assert_eq!(code, CrsCode::Utm { zone: 30, north: true });
        assert_eq!(code.epsg(), 32630);
        assert_eq!(CrsCode::from_epsg(32733).unwrap().epsg(), 32733);
    }

    #[test]
    fn test_display_round_trip() {
        for code in [CrsCode::Epsg4326, CrsCode::Epsg3857, CrsCode::Epsg27700] {
            assert_eq!(code.to_string().parse::<CrsCode>().unwrap(), code);
        }
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&CrsCode::Epsg27700).unwrap();
        assert_eq!(json, "\"EPSG:27700\"");
        let back: CrsCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, CrsCode::Epsg27700);
    }
}

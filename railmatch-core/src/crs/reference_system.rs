use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::RailMatchError;

/// coordinate reference systems understood by the coordinate normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Crs {
    /// geographic WGS84 longitude/latitude in degrees (EPSG:4326)
    Wgs84,
    /// Swiss CH1903+ / LV95 easting/northing in meters (EPSG:2056)
    Lv95,
    /// WGS84 / UTM northern hemisphere zone, easting/northing in meters (EPSG:326xx)
    UtmNorth(u8),
}

impl Crs {
    pub fn epsg_code(&self) -> u32 {
        match self {
            Crs::Wgs84 => 4326,
            Crs::Lv95 => 2056,
            Crs::UtmNorth(zone) => 32600 + *zone as u32,
        }
    }

    /// true for reference systems with metric (projected) coordinates, where
    /// euclidean distance is meaningful.
    pub fn is_projected(&self) -> bool {
        !matches!(self, Crs::Wgs84)
    }

    pub fn from_epsg(code: u32) -> Result<Crs, RailMatchError> {
        match code {
            4326 => Ok(Crs::Wgs84),
            2056 => Ok(Crs::Lv95),
            32601..=32660 => Ok(Crs::UtmNorth((code - 32600) as u8)),
            _ => Err(RailMatchError::UnsupportedCrs(format!("EPSG:{code}"))),
        }
    }
}

impl Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EPSG:{}", self.epsg_code())
    }
}

impl FromStr for Crs {
    type Err = RailMatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let code_str = match trimmed.split_once(':') {
            Some((authority, code)) if authority.eq_ignore_ascii_case("epsg") => code,
            Some(_) => return Err(RailMatchError::UnsupportedCrs(trimmed.to_string())),
            None => trimmed,
        };
        let code = code_str
            .trim()
            .parse::<u32>()
            .map_err(|_| RailMatchError::UnsupportedCrs(trimmed.to_string()))?;
        Crs::from_epsg(code)
    }
}

impl TryFrom<String> for Crs {
    type Error = RailMatchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Crs::from_str(&value)
    }
}

impl From<Crs> for String {
    fn from(value: Crs) -> Self {
        value.to_string()
    }
}

// Data structures shared by the dealer API client, the inventory controller and the pages

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

// Listing status of a car, as reported by the dealer API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarStatus {
    #[serde(alias = "Available", alias = "AVAILABLE")]
    Available,
    #[serde(alias = "Sold", alias = "SOLD")]
    Sold,
    #[serde(alias = "Reserved", alias = "RESERVED")]
    Reserved,
}

impl CarStatus {
    pub const ALL: [CarStatus; 3] = [CarStatus::Available, CarStatus::Sold, CarStatus::Reserved];

    /// Token used in URLs and API payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            CarStatus::Available => "available",
            CarStatus::Sold => "sold",
            CarStatus::Reserved => "reserved",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CarStatus::Available => "Available",
            CarStatus::Sold => "Sold",
            CarStatus::Reserved => "Reserved",
        }
    }
}

impl FromStr for CarStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "available" => Ok(CarStatus::Available),
            "sold" => Ok(CarStatus::Sold),
            "reserved" => Ok(CarStatus::Reserved),
            other => Err(format!("unknown car status '{}'", other)),
        }
    }
}

// Display language of the site. Only affects formatting, never filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    En,
    #[default]
    #[serde(rename = "mm")]
    Mm,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrandRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelRef {
    pub name: String,
    pub brand: Option<BrandRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Showroom {
    pub name: String,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColorRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CarImage {
    pub storage_base_key: Option<String>,
    pub url_main: Option<String>,
    pub url_thumb: Option<String>,
}

impl CarImage {
    pub fn main_url(&self) -> &str {
        self.url_main
            .as_deref()
            .or(self.storage_base_key.as_deref())
            .unwrap_or("")
    }

    pub fn thumb_url(&self) -> &str {
        self.url_thumb
            .as_deref()
            .or(self.storage_base_key.as_deref())
            .unwrap_or("")
    }
}

// A car as returned by /api/cars/search (items) and /api/cars/:id
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CarRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub price: f64, // Lakhs
    pub year: Option<i32>,
    pub mileage: Option<u32>,
    pub fuel: Option<String>,
    pub transmission: Option<String>,
    pub status: Option<CarStatus>,
    pub description: Option<String>,
    pub model: Option<ModelRef>,
    pub showroom: Option<Showroom>,
    pub color: Option<ColorRef>,
    pub images: Vec<CarImage>,
}

impl CarRecord {
    pub fn brand_name(&self) -> &str {
        self.model
            .as_ref()
            .and_then(|m| m.brand.as_ref())
            .map_or("", |b| b.name.as_str())
    }

    pub fn model_name(&self) -> &str {
        self.model.as_ref().map_or("", |m| m.name.as_str())
    }

    /// "Brand Model", trimmed when either part is missing.
    pub fn title(&self) -> String {
        format!("{} {}", self.brand_name(), self.model_name())
            .trim()
            .to_string()
    }

    pub fn cover_image(&self) -> &str {
        self.images.first().map_or("", CarImage::main_url)
    }
}

// Response of GET /api/cars/search
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchPage {
    pub items: Vec<CarRecord>,
    pub total: u64,
}

// Response of GET /api/cars/filters
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterMetadata {
    pub brands_with_models: Option<BTreeMap<String, Vec<String>>>,
}

// Ids come back as strings from some endpoints and as numbers from others
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

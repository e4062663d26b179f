// Brand/model metadata used by the filter panel, with the bundled fallback list

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::dealer_api::{ApiError, CarSource};
use crate::models::FilterMetadata;

pub const FUEL_TYPES: &[&str] = &["Diesel", "Electric", "Hybrid", "Petrol"];
pub const TRANSMISSIONS: &[&str] = &["Automatic", "Manual"];

// Used whenever the filters endpoint has nothing to offer
static FALLBACK_BRAND_MODELS: Lazy<BTreeMap<String, Vec<String>>> = Lazy::new(|| {
    [
        ("Toyota", &["Crown", "Mark II", "Ractis", "Camry", "Vitz"][..]),
        ("Honda", &["Civic", "CR-V", "Accord", "Fit"][..]),
        ("Nissan", &["Altima", "X-Trail", "March"][..]),
        ("Mazda", &["CX-5", "Axela", "Demio"][..]),
        ("BMW", &["3 Series", "X3"][..]),
        ("Hyundai", &["Tucson", "Elantra"][..]),
        ("Kia", &["Optima", "Sportage"][..]),
    ]
    .into_iter()
    .map(|(brand, models)| {
        (
            brand.to_string(),
            models.iter().map(|m| m.to_string()).collect(),
        )
    })
    .collect()
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandCatalog {
    brands_with_models: BTreeMap<String, Vec<String>>,
}

impl BrandCatalog {
    pub fn fallback() -> Self {
        BrandCatalog {
            brands_with_models: FALLBACK_BRAND_MODELS.clone(),
        }
    }

    /// Server metadata wins unless it is missing or empty.
    pub fn from_metadata(metadata: FilterMetadata) -> Self {
        match metadata.brands_with_models {
            Some(map) if !map.is_empty() => BrandCatalog {
                brands_with_models: map,
            },
            _ => {
                tracing::debug!("Filter metadata has no brands, using the bundled brand list");
                Self::fallback()
            }
        }
    }

    /// Fetch metadata from the dealer API. Transport or status errors are
    /// returned to the caller; an empty answer degrades to the fallback.
    pub async fn load<S>(source: &S) -> Result<Self, ApiError>
    where
        S: CarSource + ?Sized,
    {
        let metadata = source.filters().await?;
        Ok(Self::from_metadata(metadata))
    }

    pub fn brands(&self) -> impl Iterator<Item = &str> {
        self.brands_with_models.keys().map(String::as_str)
    }

    /// Models offered by `brand`; empty for no brand or an unknown brand.
    pub fn models_for(&self, brand: &str) -> &[String] {
        self.brands_with_models
            .get(brand)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn offers(&self, brand: &str, model: &str) -> bool {
        self.models_for(brand).iter().any(|m| m == model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_metadata_falls_back_to_bundled_list() {
        let empty = FilterMetadata {
            brands_with_models: Some(BTreeMap::new()),
        };
        assert_eq!(BrandCatalog::from_metadata(empty), BrandCatalog::fallback());
        assert_eq!(
            BrandCatalog::from_metadata(FilterMetadata::default()),
            BrandCatalog::fallback()
        );
    }

    #[test]
    fn server_metadata_replaces_fallback() {
        let mut map = BTreeMap::new();
        map.insert("Suzuki".to_string(), vec!["Swift".to_string()]);
        let catalog = BrandCatalog::from_metadata(FilterMetadata {
            brands_with_models: Some(map),
        });

        assert_eq!(catalog.brands().collect::<Vec<_>>(), vec!["Suzuki"]);
        assert!(catalog.offers("Suzuki", "Swift"));
        assert!(!catalog.offers("Toyota", "Camry"));
    }

    #[test]
    fn unknown_brand_has_no_models() {
        let catalog = BrandCatalog::fallback();
        assert!(catalog.models_for("").is_empty());
        assert!(catalog.models_for("Lada").is_empty());
        assert_eq!(catalog.models_for("BMW"), ["3 Series", "X3"]);
    }
}

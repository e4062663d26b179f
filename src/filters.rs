// The user's car-search filter selection

use chrono::Datelike;
use serde::Serialize;

use crate::catalog::BrandCatalog;
use crate::models::CarStatus;

pub const MIN_YEAR: i32 = 1980;
pub const DEFAULT_PRICE_RANGE: (u32, u32) = (0, 5000); // Lakhs
pub const DEFAULT_MILEAGE_RANGE: (u32, u32) = (0, 200_000);

pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub brand: String,
    pub model: String,
    pub price_range: (u32, u32),
    pub year_range: (i32, i32),
    // Not carried in the URL or the search query yet
    pub mileage_range: (u32, u32),
    pub fuel_types: Vec<String>,
    pub transmissions: Vec<String>,
    // Not carried in the URL or the search query yet
    pub body_types: Vec<String>,
    pub status: Vec<CarStatus>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::defaults_for_year(current_year())
    }
}

impl FilterState {
    /// Defaults relative to `current_year`; the year range runs up to next year.
    pub fn defaults_for_year(current_year: i32) -> Self {
        FilterState {
            brand: String::new(),
            model: String::new(),
            price_range: DEFAULT_PRICE_RANGE,
            year_range: (MIN_YEAR, current_year + 1),
            mileage_range: DEFAULT_MILEAGE_RANGE,
            fuel_types: Vec::new(),
            transmissions: Vec::new(),
            body_types: Vec::new(),
            status: Vec::new(),
        }
    }

    pub fn clear(&mut self, defaults: &FilterState) {
        self.clone_from(defaults);
    }

    /// Switches brand, keeping the model only if the new brand offers it.
    pub fn set_brand(&mut self, brand: &str, catalog: &BrandCatalog) {
        if !catalog.offers(brand, &self.model) {
            self.model.clear();
        }
        self.brand = brand.to_string();
    }

    /// Drops a model the selected brand does not offer. Returns whether it did.
    pub fn reconcile_model(&mut self, catalog: &BrandCatalog) -> bool {
        if self.brand.is_empty() || self.model.is_empty() {
            return false;
        }
        if catalog.offers(&self.brand, &self.model) {
            return false;
        }
        tracing::debug!(brand = %self.brand, model = %self.model, "Dropping model not offered by brand");
        self.model.clear();
        true
    }

    /// Rejects a range with `min > max`, leaving the selection unchanged.
    pub fn set_price_range(&mut self, min: u32, max: u32) -> bool {
        if min > max {
            return false;
        }
        self.price_range = (min, max);
        true
    }

    /// Like `set_price_range`, and both ends must also lie within `bounds`.
    pub fn set_year_range(&mut self, min: i32, max: i32, bounds: (i32, i32)) -> bool {
        if min > max || min < bounds.0 || max > bounds.1 {
            return false;
        }
        self.year_range = (min, max);
        true
    }

    // Fuel and transmission are single-select: picking another replaces,
    // picking the same one clears.
    pub fn toggle_fuel(&mut self, fuel: &str) {
        toggle_single(&mut self.fuel_types, fuel);
    }

    pub fn toggle_transmission(&mut self, transmission: &str) {
        toggle_single(&mut self.transmissions, transmission);
    }

    pub fn toggle_status(&mut self, status: CarStatus) {
        if let Some(pos) = self.status.iter().position(|s| *s == status) {
            self.status.remove(pos);
        } else {
            self.status.push(status);
        }
    }

    pub fn fuel(&self) -> Option<&str> {
        self.fuel_types.first().map(String::as_str)
    }

    pub fn transmission(&self) -> Option<&str> {
        self.transmissions.first().map(String::as_str)
    }

    /// Equality over the fields the URL can express.
    pub fn url_equivalent(&self, other: &FilterState) -> bool {
        self.brand == other.brand
            && self.model == other.model
            && self.price_range == other.price_range
            && self.year_range == other.year_range
            && self.fuel() == other.fuel()
            && self.transmission() == other.transmission()
            && self.status == other.status
    }
}

fn toggle_single(selection: &mut Vec<String>, value: &str) {
    if selection.iter().any(|v| v == value) {
        selection.clear();
    } else {
        *selection = vec![value.to_string()];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn defaults() -> FilterState {
        FilterState::defaults_for_year(2024)
    }

    #[test]
    fn defaults_span_up_to_next_year() {
        let f = defaults();
        assert_eq!(f.brand, "");
        assert_eq!(f.price_range, (0, 5000));
        assert_eq!(f.year_range, (1980, 2025));
        assert_eq!(f.mileage_range, (0, 200_000));
        assert!(f.fuel_types.is_empty() && f.transmissions.is_empty() && f.status.is_empty());
    }

    #[test]
    fn clear_restores_defaults() {
        let mut f = defaults();
        f.brand = "Honda".to_string();
        f.toggle_status(CarStatus::Sold);
        f.set_price_range(10, 20);
        f.clear(&defaults());
        assert_eq!(f, defaults());
    }

    #[test]
    fn brand_change_clears_model_the_new_brand_lacks() {
        let catalog = BrandCatalog::fallback();
        let mut f = defaults();
        f.brand = "Toyota".to_string();
        f.model = "Camry".to_string();

        f.set_brand("Honda", &catalog);

        assert_eq!(f.brand, "Honda");
        assert_eq!(f.model, "");
    }

    #[test]
    fn brand_change_keeps_model_the_new_brand_offers() {
        let mut map = std::collections::BTreeMap::new();
        map.insert("Toyota".to_string(), vec!["Crown".to_string()]);
        map.insert("Toyota Japan".to_string(), vec!["Crown".to_string()]);
        let catalog = BrandCatalog::from_metadata(crate::models::FilterMetadata {
            brands_with_models: Some(map),
        });
        let mut f = defaults();
        f.brand = "Toyota".to_string();
        f.model = "Crown".to_string();

        f.set_brand("Toyota Japan", &catalog);

        assert_eq!(f.model, "Crown");
    }

    #[test]
    fn clearing_brand_clears_model() {
        let mut f = defaults();
        f.brand = "Toyota".to_string();
        f.model = "Vitz".to_string();
        f.set_brand("", &BrandCatalog::fallback());
        assert_eq!(f.model, "");
    }

    #[test]
    fn reconcile_drops_inconsistent_model_only() {
        let catalog = BrandCatalog::fallback();
        let mut f = defaults();
        f.brand = "Toyota".to_string();
        f.model = "Civic".to_string();
        assert!(f.reconcile_model(&catalog));
        assert_eq!(f.model, "");

        f.model = "Vitz".to_string();
        assert!(!f.reconcile_model(&catalog));

        // A model without a brand is left for the search API to interpret
        let mut loose = defaults();
        loose.model = "Civic".to_string();
        assert!(!loose.reconcile_model(&catalog));
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        let mut f = defaults();
        assert!(!f.set_price_range(60, 50));
        assert_eq!(f.price_range, (0, 5000));
        assert!(!f.set_year_range(2020, 2010, (1980, 2025)));
        assert!(!f.set_year_range(1970, 2010, (1980, 2025)));
        assert!(f.set_year_range(2010, 2020, (1980, 2025)));
        assert_eq!(f.year_range, (2010, 2020));
    }

    #[test]
    fn fuel_is_single_select() {
        let mut f = defaults();
        f.toggle_fuel("Petrol");
        f.toggle_fuel("Hybrid");
        assert_eq!(f.fuel_types, vec!["Hybrid"]);
        f.toggle_fuel("Hybrid");
        assert!(f.fuel_types.is_empty());
    }

    #[test]
    fn transmission_is_single_select() {
        let mut f = defaults();
        f.toggle_transmission("Manual");
        f.toggle_transmission("Automatic");
        assert_eq!(f.transmissions, vec!["Automatic"]);
        assert_eq!(f.transmission(), Some("Automatic"));
        f.toggle_transmission("Automatic");
        assert!(f.transmissions.is_empty());
    }

    #[test]
    fn status_toggles_keep_insertion_order() {
        let mut f = defaults();
        f.toggle_status(CarStatus::Sold);
        f.toggle_status(CarStatus::Available);
        f.toggle_status(CarStatus::Reserved);
        f.toggle_status(CarStatus::Available);
        assert_eq!(f.status, vec![CarStatus::Sold, CarStatus::Reserved]);
    }

    #[test]
    fn url_equivalence_ignores_unencoded_fields() {
        let mut a = defaults();
        let mut b = defaults();
        a.mileage_range = (0, 1000);
        b.body_types.push("SUV".to_string());
        assert!(a.url_equivalent(&b));

        b.toggle_transmission("Manual");
        assert!(!a.url_equivalent(&b));
    }
}

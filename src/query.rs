// Parameters for GET /api/cars/search

use serde::Serialize;

use crate::filters::FilterState;

pub const PAGE_SIZE: u32 = 9;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_min: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_max: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transmission: Option<String>,
    pub page: u32,
    pub limit: u32,
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl SearchQuery {
    /// Price and year bounds are always sent. The free-text term only fills
    /// brand/model when no explicit selection exists for them.
    pub fn build(filters: &FilterState, search: &str, page: u32) -> Self {
        let term = non_empty(search);
        SearchQuery {
            model: non_empty(&filters.model).or_else(|| term.clone()),
            brand: non_empty(&filters.brand).or(term),
            price_min: Some(filters.price_range.0),
            price_max: Some(filters.price_range.1),
            year_min: Some(filters.year_range.0),
            year_max: Some(filters.year_range.1),
            fuel: filters.fuel().map(str::to_string),
            transmission: filters.transmission().map(str::to_string),
            page,
            limit: PAGE_SIZE,
        }
    }

    /// Stable identity of the request, used to key cached responses.
    pub fn cache_key(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

/// Number of pages for `total` results, never less than one.
pub fn total_pages(total: u64, limit: u32) -> u32 {
    let limit = u64::from(limit.max(1));
    let pages = total.div_ceil(limit).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn defaults() -> FilterState {
        FilterState::defaults_for_year(2024)
    }

    #[test]
    fn search_term_fills_brand_and_model() {
        let query = SearchQuery::build(&defaults(), "Camry", 1);
        assert_eq!(query.model.as_deref(), Some("Camry"));
        assert_eq!(query.brand.as_deref(), Some("Camry"));
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 9);
        assert_eq!(query.fuel, None);
        assert_eq!(query.transmission, None);
    }

    #[test]
    fn search_term_never_overrides_explicit_selection() {
        let mut f = defaults();
        f.brand = "Toyota".to_string();
        let query = SearchQuery::build(&f, "Camry", 2);
        assert_eq!(query.brand.as_deref(), Some("Toyota"));
        assert_eq!(query.model.as_deref(), Some("Camry"));
    }

    #[test]
    fn ranges_are_always_sent() {
        let query = SearchQuery::build(&defaults(), "", 1);
        assert_eq!(
            query,
            SearchQuery {
                model: None,
                brand: None,
                price_min: Some(0),
                price_max: Some(5000),
                year_min: Some(1980),
                year_max: Some(2025),
                fuel: None,
                transmission: None,
                page: 1,
                limit: 9,
            }
        );
    }

    #[test]
    fn single_fuel_and_transmission_are_sent() {
        let mut f = defaults();
        f.toggle_fuel("Petrol");
        f.toggle_transmission("Manual");
        f.toggle_transmission("Automatic");
        let query = SearchQuery::build(&f, "", 1);
        assert_eq!(query.fuel.as_deref(), Some("Petrol"));
        assert_eq!(query.transmission.as_deref(), Some("Manual"));
    }

    #[test]
    fn serializes_with_api_field_names() {
        let query = SearchQuery::build(&defaults(), "Camry", 1);
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value["priceMin"], 0);
        assert_eq!(value["yearMax"], 2025);
        assert!(value.get("fuel").is_none());
    }

    #[test]
    fn page_count_has_a_floor_of_one() {
        assert_eq!(total_pages(0, PAGE_SIZE), 1);
        assert_eq!(total_pages(9, PAGE_SIZE), 1);
        assert_eq!(total_pages(10, PAGE_SIZE), 2);
        assert_eq!(total_pages(27, PAGE_SIZE), 3);
    }
}

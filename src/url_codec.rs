// Two-way mapping between the filter selection and the inventory page's query string

use std::collections::BTreeMap;

use serde::Serialize;

use crate::filters::FilterState;
use crate::models::CarStatus;

pub type QueryParams = BTreeMap<String, String>;

pub const BRAND: &str = "brand";
pub const MODEL: &str = "model";
pub const PRICE_MIN: &str = "priceMin";
pub const PRICE_MAX: &str = "priceMax";
pub const YEAR_MIN: &str = "yearMin";
pub const YEAR_MAX: &str = "yearMax";
pub const FUEL: &str = "fuel";
pub const TRANSMISSION: &str = "transmission";
pub const STATUS: &str = "status";
pub const SEARCH: &str = "q";
pub const PAGE: &str = "page";

// Order keys appear in generated query strings
const KEY_ORDER: [&str; 11] = [
    BRAND,
    MODEL,
    PRICE_MIN,
    PRICE_MAX,
    YEAR_MIN,
    YEAR_MAX,
    FUEL,
    TRANSMISSION,
    STATUS,
    SEARCH,
    PAGE,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlState {
    pub filters: FilterState,
    pub search: String,
    pub page: u32,
}

/// Collects raw query pairs. The first occurrence of a key wins, except for
/// `status` where repeated values (one per checkbox) are comma-joined.
pub fn params_from_pairs<I>(pairs: I) -> QueryParams
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut params = QueryParams::new();
    for (key, value) in pairs {
        match params.get_mut(&key) {
            Some(existing) if key == STATUS => {
                if !value.is_empty() {
                    if !existing.is_empty() {
                        existing.push(',');
                    }
                    existing.push_str(&value);
                }
            }
            Some(_) => {}
            None => {
                params.insert(key, value);
            }
        }
    }
    params
}

// Empty values count as absent
fn get<'a>(params: &'a QueryParams, key: &str) -> Option<&'a str> {
    params.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

fn parse_or<T: std::str::FromStr + Copy>(params: &QueryParams, key: &str, default: T) -> T {
    get(params, key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Never fails: anything missing or malformed falls back to its default.
pub fn decode(params: &QueryParams, defaults: &FilterState) -> UrlState {
    let mut filters = defaults.clone();

    filters.brand = get(params, BRAND).unwrap_or_default().to_string();
    filters.model = get(params, MODEL).unwrap_or_default().to_string();

    let price_min = parse_or(params, PRICE_MIN, defaults.price_range.0);
    let price_max = parse_or(params, PRICE_MAX, defaults.price_range.1);
    if !filters.set_price_range(price_min, price_max) {
        tracing::debug!(price_min, price_max, "Ignoring inverted price range from URL");
    }

    let bounds = defaults.year_range;
    let in_bounds = |year: i32| year >= bounds.0 && year <= bounds.1;
    let year_min = Some(parse_or(params, YEAR_MIN, bounds.0))
        .filter(|y| in_bounds(*y))
        .unwrap_or(bounds.0);
    let year_max = Some(parse_or(params, YEAR_MAX, bounds.1))
        .filter(|y| in_bounds(*y))
        .unwrap_or(bounds.1);
    if !filters.set_year_range(year_min, year_max, bounds) {
        tracing::debug!(year_min, year_max, "Ignoring inverted year range from URL");
    }

    filters.fuel_types = get(params, FUEL).map(str::to_string).into_iter().collect();
    filters.transmissions = get(params, TRANSMISSION)
        .map(str::to_string)
        .into_iter()
        .collect();

    filters.status = Vec::new();
    for token in get(params, STATUS).unwrap_or_default().split(',') {
        let Ok(status) = token.trim().parse::<CarStatus>() else {
            continue;
        };
        if !filters.status.contains(&status) {
            filters.status.push(status);
        }
    }

    let search = get(params, SEARCH).unwrap_or_default().to_string();
    let page = parse_or(params, PAGE, 1u32).max(1);

    UrlState {
        filters,
        search,
        page,
    }
}

/// Emits only what differs from `defaults`; `page` is always present.
pub fn encode(filters: &FilterState, search: &str, page: u32, defaults: &FilterState) -> QueryParams {
    let mut params = QueryParams::new();
    let mut put = |key: &str, value: String| {
        params.insert(key.to_string(), value);
    };

    if !filters.brand.is_empty() {
        put(BRAND, filters.brand.clone());
    }
    if !filters.model.is_empty() {
        put(MODEL, filters.model.clone());
    }
    if filters.price_range != defaults.price_range {
        put(PRICE_MIN, filters.price_range.0.to_string());
        put(PRICE_MAX, filters.price_range.1.to_string());
    }
    if filters.year_range != defaults.year_range {
        put(YEAR_MIN, filters.year_range.0.to_string());
        put(YEAR_MAX, filters.year_range.1.to_string());
    }
    if let Some(fuel) = filters.fuel() {
        put(FUEL, fuel.to_string());
    }
    if let Some(transmission) = filters.transmission() {
        put(TRANSMISSION, transmission.to_string());
    }
    if !filters.status.is_empty() {
        let joined = filters
            .status
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(",");
        put(STATUS, joined);
    }
    if !search.is_empty() {
        put(SEARCH, search.to_string());
    }
    put(PAGE, page.to_string());

    params
}

/// Form-urlencoded query string with keys in a stable order.
pub fn to_query_string(params: &QueryParams) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for key in KEY_ORDER {
        if let Some(value) = params.get(key) {
            serializer.append_pair(key, value);
        }
    }
    serializer.finish()
}

// HTML pages: the inventory browser and the car details view

use askama::Template;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};

use crate::{
    catalog::{BrandCatalog, FUEL_TYPES, TRANSMISSIONS},
    dealer_api::{ApiError, CarSource},
    error::AppResult,
    filters::FilterState,
    inventory::{browse, Browse, FetchState, InventoryController},
    models::{CarRecord, CarStatus, Language},
    price::format_price_lakhs,
    url_codec::params_from_pairs,
    AppState,
};

// Characters escaped inside a single path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

pub struct Chip {
    pub label: String,
    pub href: String,
    pub active: bool,
}

pub struct CarCard {
    pub href: String,
    pub title: String,
    pub price: String,
    pub year: String,
    pub mileage: String,
    pub fuel: String,
    pub transmission: String,
    pub status_label: String,
    pub status_class: String,
    pub image: String,
}

pub struct ImageView {
    pub main: String,
    pub thumb: String,
}

#[derive(Template)]
#[template(path = "inventory.html")]
struct InventoryTemplate {
    search: String,
    brands: Vec<SelectOption>,
    models: Vec<SelectOption>,
    model_disabled: bool,
    price_min: u32,
    price_max: u32,
    price_min_label: String,
    price_max_label: String,
    years_from: Vec<SelectOption>,
    years_to: Vec<SelectOption>,
    // Hidden form fields so submitting the form keeps chip selections
    fuel: String,
    transmission: String,
    status: String,
    filters_error: Option<String>,
    brand_chips: Vec<Chip>,
    fuel_chips: Vec<Chip>,
    transmission_chips: Vec<Chip>,
    status_chips: Vec<Chip>,
    clear_href: String,
    cars: Vec<CarCard>,
    available_count: usize,
    sold_count: usize,
    total: u64,
    page: u32,
    total_pages: u32,
    showing_from: u64,
    showing_to: u64,
    prev_href: Option<String>,
    next_href: Option<String>,
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "car_details.html")]
struct CarDetailsTemplate {
    title: String,
    price: String,
    status_label: String,
    status_class: String,
    year: String,
    mileage: String,
    fuel: String,
    transmission: String,
    color: Option<String>,
    showroom: Option<String>,
    description: String,
    images: Vec<ImageView>,
}

#[derive(Template)]
#[template(path = "not_found.html")]
struct NotFoundTemplate;

fn inventory_href(controller: &InventoryController) -> String {
    format!("/cars?{}", controller.query_string())
}

fn status_view(status: Option<CarStatus>) -> (String, String) {
    match status {
        Some(s) => (s.label().to_string(), format!("status-{}", s.as_str())),
        None => ("Unknown".to_string(), "status-unknown".to_string()),
    }
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn car_path(id: &str) -> String {
    format!("/cars/{}", utf8_percent_encode(id, PATH_SEGMENT))
}

fn car_card(car: &CarRecord, language: Language) -> CarCard {
    let (status_label, status_class) = status_view(car.status);
    CarCard {
        href: car_path(&car.id),
        title: car.title(),
        price: format_price_lakhs(car.price, language),
        year: or_dash(car.year),
        mileage: or_dash(car.mileage.map(|m| format!("{} km", m))),
        fuel: or_dash(car.fuel.as_deref()),
        transmission: or_dash(car.transmission.as_deref()),
        status_label,
        status_class,
        image: car.cover_image().to_string(),
    }
}

// Link to the view with `edit` applied to the filters
fn chip(controller: &InventoryController, label: &str, active: bool, edit: impl FnOnce(&mut FilterState)) -> Chip {
    let mut next = controller.clone();
    let mut filters = next.filters().clone();
    edit(&mut filters);
    next.update_filters(filters);
    Chip {
        label: label.to_string(),
        href: inventory_href(&next),
        active,
    }
}

fn year_options(bounds: (i32, i32), selected: i32) -> Vec<SelectOption> {
    (bounds.0..=bounds.1)
        .map(|year| SelectOption {
            value: year.to_string(),
            label: year.to_string(),
            selected: year == selected,
        })
        .collect()
}

fn inventory_template(
    controller: &InventoryController,
    catalog: Option<&BrandCatalog>,
    language: Language,
) -> InventoryTemplate {
    let filters = controller.filters();
    let view = controller.view();

    // Selects fall back to the bundled list when metadata failed to load
    let fallback = BrandCatalog::fallback();
    let options = catalog.unwrap_or(&fallback);

    let brands = options
        .brands()
        .map(|b| SelectOption {
            value: b.to_string(),
            label: b.to_string(),
            selected: b == filters.brand,
        })
        .collect();
    let models = options
        .models_for(&filters.brand)
        .iter()
        .map(|m| SelectOption {
            value: m.clone(),
            label: m.clone(),
            selected: *m == filters.model,
        })
        .collect();

    let brand_chips = options
        .brands()
        .map(|b| {
            let mut next = controller.clone();
            next.set_brand(b, options);
            Chip {
                label: b.to_string(),
                href: inventory_href(&next),
                active: b == filters.brand,
            }
        })
        .collect();
    let fuel_chips = FUEL_TYPES
        .iter()
        .map(|f| chip(controller, f, filters.fuel() == Some(*f), |s| s.toggle_fuel(f)))
        .collect();
    let transmission_chips = TRANSMISSIONS
        .iter()
        .map(|t| chip(controller, t, filters.transmission() == Some(*t), |s| s.toggle_transmission(t)))
        .collect();
    let status_chips = CarStatus::ALL
        .iter()
        .map(|st| {
            let active = filters.status.contains(st);
            chip(controller, st.label(), active, |s| s.toggle_status(*st))
        })
        .collect();

    let mut cleared = controller.clone();
    cleared.clear_filters();

    let page_href = |page: u32| {
        let mut next = controller.clone();
        next.set_page(page);
        inventory_href(&next)
    };

    let bounds = controller.defaults().year_range;
    InventoryTemplate {
        search: controller.search().to_string(),
        brands,
        models,
        model_disabled: filters.brand.is_empty(),
        price_min: filters.price_range.0,
        price_max: filters.price_range.1,
        price_min_label: format_price_lakhs(f64::from(filters.price_range.0), language),
        price_max_label: format_price_lakhs(f64::from(filters.price_range.1), language),
        years_from: year_options(bounds, filters.year_range.0),
        years_to: year_options(bounds, filters.year_range.1),
        fuel: filters.fuel().unwrap_or_default().to_string(),
        transmission: filters.transmission().unwrap_or_default().to_string(),
        status: filters
            .status
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(","),
        filters_error: catalog.is_none().then(|| "Failed to load filters".to_string()),
        brand_chips,
        fuel_chips,
        transmission_chips,
        status_chips,
        clear_href: inventory_href(&cleared),
        cars: view.items.iter().map(|c| car_card(c, language)).collect(),
        available_count: view.available_count,
        sold_count: view.sold_count,
        total: view.total,
        page: view.page,
        total_pages: view.total_pages,
        showing_from: view.showing_from,
        showing_to: view.showing_to,
        prev_href: view.has_prev.then(|| page_href(view.page - 1)),
        next_href: view.has_next.then(|| page_href(view.page + 1)),
        error: view.error.as_ref().map(|_| "Failed to load cars".to_string()),
    }
}

// GET /cars
pub async fn inventory_page(
    State(app_state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> AppResult<Response> {
    let params = params_from_pairs(pairs);
    tracing::info!(?params, "Inventory page requested");

    let result = match browse(app_state.dealer_api.as_ref(), &params, FilterState::default()).await {
        Browse::Redirect(query) => {
            tracing::debug!(%query, "Redirecting to canonical inventory URL");
            return Ok(Redirect::to(&format!("/cars?{}", query)).into_response());
        }
        Browse::Ready(result) => result,
    };

    let template = inventory_template(
        &result.controller,
        result.catalog.as_ref(),
        app_state.settings.language,
    );
    let html = template.render()?;

    let status = match result.controller.fetch_state() {
        FetchState::Failed { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::OK,
    };
    Ok((status, Html(html)).into_response())
}

// GET /cars/:id
pub async fn car_details_page(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    tracing::info!(%id, "Car details requested");

    let car = match app_state.dealer_api.car(&id).await {
        Ok(car) => car,
        Err(ApiError::NotFound(_)) => {
            tracing::info!(%id, "Car not found");
            let html = NotFoundTemplate.render()?;
            return Ok((StatusCode::NOT_FOUND, Html(html)).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let language = app_state.settings.language;
    let (status_label, status_class) = status_view(car.status);
    let template = CarDetailsTemplate {
        title: car.title(),
        price: format_price_lakhs(car.price, language),
        status_label,
        status_class,
        year: or_dash(car.year),
        mileage: or_dash(car.mileage.map(|m| format!("{} km", m))),
        fuel: or_dash(car.fuel.as_deref()),
        transmission: or_dash(car.transmission.as_deref()),
        color: car.color.as_ref().map(|c| c.name.clone()),
        showroom: car.showroom.as_ref().map(|s| s.name.clone()),
        description: car
            .description
            .clone()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "description not available".to_string()),
        images: car
            .images
            .iter()
            .map(|img| ImageView {
                main: img.main_url().to_string(),
                thumb: img.thumb_url().to_string(),
            })
            .collect(),
    };

    Ok(Html(template.render()?).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url_codec::params_from_pairs;
    use pretty_assertions::assert_eq;

    fn controller_for(pairs: &[(&str, &str)]) -> InventoryController {
        let params = params_from_pairs(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        InventoryController::from_url(&params, FilterState::defaults_for_year(2024))
    }

    fn chip_href<'a>(chips: &'a [Chip], label: &str) -> (&'a str, bool) {
        let chip = chips.iter().find(|c| c.label == label).unwrap();
        (chip.href.as_str(), chip.active)
    }

    #[test]
    fn transmission_chips_switch_the_selection() {
        let controller = controller_for(&[("transmission", "Manual"), ("page", "1")]);
        let template = inventory_template(&controller, None, Language::En);

        assert_eq!(
            chip_href(&template.transmission_chips, "Automatic"),
            ("/cars?transmission=Automatic&page=1", false)
        );
        assert_eq!(
            chip_href(&template.transmission_chips, "Manual"),
            ("/cars?page=1", true)
        );
    }

    #[test]
    fn every_chip_links_somewhere_else() {
        let controller = controller_for(&[
            ("brand", "Toyota"),
            ("fuel", "Petrol"),
            ("transmission", "Automatic"),
            ("status", "sold"),
            ("page", "1"),
        ]);
        let current = inventory_href(&controller);
        let template = inventory_template(&controller, None, Language::En);

        for chips in [
            &template.fuel_chips,
            &template.transmission_chips,
            &template.status_chips,
        ] {
            for chip in chips.iter() {
                assert_ne!(chip.href, current, "chip {}", chip.label);
            }
        }
    }

    #[test]
    fn car_path_escapes_ids_as_a_path_segment() {
        assert_eq!(car_path("42"), "/cars/42");
        assert_eq!(car_path("abc 1"), "/cars/abc%201");
        assert_eq!(car_path("a+b/c"), "/cars/a+b%2Fc");
    }
}

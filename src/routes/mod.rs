// Route definitions

use axum::{response::Redirect, routing::get, Router};

use crate::AppState;

mod api;
mod pages;

pub fn create_router(app_state: AppState) -> Router {
    // JSON endpoints for script clients
    let api_router = Router::new()
        .route("/inventory", get(api::inventory))
        .with_state(app_state.clone());

    Router::new()
        .route("/", get(|| async { Redirect::permanent("/cars") }))
        .route("/cars", get(pages::inventory_page))
        .route("/cars/:id", get(pages::car_details_page))
        .nest("/api", api_router)
        .with_state(app_state)
}

// JSON view of the inventory browser

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
};
use serde::Serialize;

use crate::{
    catalog::BrandCatalog,
    filters::FilterState,
    inventory::{browse, Browse, FetchState, InventoryView},
    url_codec::params_from_pairs,
    AppState,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InventoryResponse {
    filters: FilterState,
    search: String,
    // Canonical query string for this state, shareable as a deep link
    query: String,
    catalog: Option<BrandCatalog>,
    #[serde(flatten)]
    view: InventoryView,
}

// GET /api/inventory
pub async fn inventory(
    State(app_state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let params = params_from_pairs(pairs);
    tracing::info!(?params, "[HANDLER] /api/inventory - Request received.");

    let result = match browse(app_state.dealer_api.as_ref(), &params, FilterState::default()).await {
        Browse::Redirect(query) => {
            return Redirect::to(&format!("/api/inventory?{}", query)).into_response();
        }
        Browse::Ready(result) => *result,
    };

    let controller = result.controller;
    let status = match controller.fetch_state() {
        FetchState::Failed { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::OK,
    };
    let body = InventoryResponse {
        filters: controller.filters().clone(),
        search: controller.search().to_string(),
        query: controller.query_string(),
        catalog: result.catalog,
        view: controller.view(),
    };
    tracing::info!(total = body.view.total, page = body.view.page, "[HANDLER] /api/inventory - Returning inventory view.");

    (status, Json(body)).into_response()
}

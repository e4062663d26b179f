// Inventory browser state: filters, search term and page, kept in step with the
// URL and the dealer API.
//
// Two directions of sync exist. URL -> state (`sync_from_url`) overwrites the
// local state when the decoded URL differs from it. State -> URL
// (`pending_url_write`) yields the encoded state only when it differs from the
// last URL seen. Both compare before writing, so neither can trigger the other
// forever.

use serde::Serialize;

use crate::catalog::BrandCatalog;
use crate::dealer_api::{ApiError, CarSource};
use crate::filters::FilterState;
use crate::models::{CarRecord, CarStatus, SearchPage};
use crate::query::{total_pages, SearchQuery, PAGE_SIZE};
use crate::url_codec::{self, QueryParams};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum FetchState {
    Idle,
    Ready,
    Failed { message: String },
}

#[derive(Clone)]
pub struct InventoryController {
    defaults: FilterState,
    filters: FilterState,
    search: String,
    page: u32,
    // Last URL written or observed
    last_url: Option<QueryParams>,
    // Kept while a newer fetch is in flight or after it fails
    result: Option<SearchPage>,
    fetch_state: FetchState,
}

impl InventoryController {
    pub fn new(defaults: FilterState) -> Self {
        InventoryController {
            filters: defaults.clone(),
            defaults,
            search: String::new(),
            page: 1,
            last_url: None,
            result: None,
            fetch_state: FetchState::Idle,
        }
    }

    /// Seeds state from the URL the view was opened with.
    pub fn from_url(params: &QueryParams, defaults: FilterState) -> Self {
        let mut controller = Self::new(defaults);
        controller.sync_from_url(params);
        controller
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn defaults(&self) -> &FilterState {
        &self.defaults
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn fetch_state(&self) -> &FetchState {
        &self.fetch_state
    }

    pub fn result(&self) -> Option<&SearchPage> {
        self.result.as_ref()
    }

    /// URL wins: overwrites whatever differs. Does not reset the page, the URL
    /// carries its own. Returns whether anything changed.
    pub fn sync_from_url(&mut self, params: &QueryParams) -> bool {
        self.last_url = Some(params.clone());
        let decoded = url_codec::decode(params, &self.defaults);

        let mut changed = false;
        if !decoded.filters.url_equivalent(&self.filters) {
            self.filters = decoded.filters;
            changed = true;
        }
        if decoded.search != self.search {
            self.search = decoded.search;
            changed = true;
        }
        if decoded.page != self.page {
            self.page = decoded.page;
            changed = true;
        }
        changed
    }

    pub fn url_params(&self) -> QueryParams {
        url_codec::encode(&self.filters, &self.search, self.page, &self.defaults)
    }

    pub fn query_string(&self) -> String {
        url_codec::to_query_string(&self.url_params())
    }

    /// The URL to write, if the state has moved away from the last one seen.
    pub fn pending_url_write(&self) -> Option<QueryParams> {
        let encoded = self.url_params();
        if self.last_url.as_ref() == Some(&encoded) {
            None
        } else {
            Some(encoded)
        }
    }

    /// Replaces the filter selection; a real change sends the view back to page 1.
    pub fn update_filters(&mut self, filters: FilterState) -> bool {
        if filters == self.filters {
            return false;
        }
        self.filters = filters;
        self.page = 1;
        true
    }

    pub fn set_brand(&mut self, brand: &str, catalog: &BrandCatalog) -> bool {
        let mut next = self.filters.clone();
        next.set_brand(brand, catalog);
        self.update_filters(next)
    }

    pub fn reconcile_model(&mut self, catalog: &BrandCatalog) -> bool {
        let mut next = self.filters.clone();
        next.reconcile_model(catalog) && self.update_filters(next)
    }

    pub fn set_search(&mut self, term: &str) -> bool {
        if term == self.search {
            return false;
        }
        self.search = term.to_string();
        self.page = 1;
        true
    }

    pub fn set_page(&mut self, page: u32) -> bool {
        let page = page.max(1);
        if page == self.page {
            return false;
        }
        self.page = page;
        true
    }

    /// "Clear All": defaults and page 1, search term untouched.
    pub fn clear_filters(&mut self) {
        let defaults = self.defaults.clone();
        self.filters.clear(&defaults);
        self.page = 1;
    }

    pub fn search_query(&self) -> SearchQuery {
        SearchQuery::build(&self.filters, &self.search, self.page)
    }

    /// Fetches the current page. If the result set turned out shorter than the
    /// current page, clamps the page to the last one and fetches again. On
    /// failure the previous result and the filters are left as they were.
    pub async fn refresh<S>(&mut self, source: &S) -> Result<(), ApiError>
    where
        S: CarSource + ?Sized,
    {
        loop {
            let query = self.search_query();
            match source.search(&query).await {
                Ok(page) => {
                    let last_page = total_pages(page.total, query.limit);
                    self.result = Some(page);
                    if self.page > last_page {
                        tracing::info!(page = self.page, last_page, "Page beyond results, clamping");
                        self.page = last_page;
                        continue;
                    }
                    self.fetch_state = FetchState::Ready;
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(error = %e, page = self.page, "Search request failed");
                    self.fetch_state = FetchState::Failed {
                        message: e.to_string(),
                    };
                    return Err(e);
                }
            }
        }
    }

    pub fn view(&self) -> InventoryView {
        let items = self.result().map_or(&[][..], |r| r.items.as_slice());
        let total = self.result().map_or(0, |r| r.total);
        let total_pages = total_pages(total, PAGE_SIZE);
        let count = |status: CarStatus| items.iter().filter(|c| c.status == Some(status)).count();

        InventoryView {
            items: items.to_vec(),
            available_count: count(CarStatus::Available),
            sold_count: count(CarStatus::Sold),
            total,
            page: self.page,
            total_pages,
            showing_from: u64::from(self.page - 1) * u64::from(PAGE_SIZE) + 1,
            showing_to: (u64::from(self.page) * u64::from(PAGE_SIZE)).min(total),
            has_prev: self.page > 1,
            has_next: self.page < total_pages,
            error: match &self.fetch_state {
                FetchState::Failed { message } => Some(message.clone()),
                _ => None,
            },
        }
    }
}

// What the inventory page renders for the current state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryView {
    pub items: Vec<CarRecord>,
    pub available_count: usize,
    pub sold_count: usize,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
    pub showing_from: u64,
    pub showing_to: u64,
    pub has_prev: bool,
    pub has_next: bool,
    pub error: Option<String>,
}

pub enum Browse {
    /// The request URL is not the canonical form of the state; go here instead.
    Redirect(String),
    Ready(Box<BrowseResult>),
}

pub struct BrowseResult {
    pub controller: InventoryController,
    // None when filter metadata failed to load
    pub catalog: Option<BrandCatalog>,
}

/// Drives one inventory page view: decode the URL, fetch filter metadata and
/// search results together, then decide whether the URL has to change.
pub async fn browse<S>(source: &S, params: &QueryParams, defaults: FilterState) -> Browse
where
    S: CarSource + ?Sized,
{
    let mut controller = InventoryController::from_url(params, defaults);
    if let Some(canonical) = controller.pending_url_write() {
        return Browse::Redirect(url_codec::to_query_string(&canonical));
    }

    let (catalog, searched) =
        futures::join!(BrandCatalog::load(source), controller.refresh(source));

    let catalog = match catalog {
        Ok(catalog) => Some(catalog),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load filter metadata");
            None
        }
    };
    if let Err(e) = searched {
        tracing::debug!(error = %e, "Rendering inventory with error state");
    }

    if let Some(catalog) = &catalog {
        controller.reconcile_model(catalog);
    }
    if let Some(next) = controller.pending_url_write() {
        return Browse::Redirect(url_codec::to_query_string(&next));
    }

    Browse::Ready(Box::new(BrowseResult { controller, catalog }))
}

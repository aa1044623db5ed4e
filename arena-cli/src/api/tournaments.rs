use super::ApiClient;
use crate::error::ApiResult;
use arena_core::{
    common::{Page, Tournament, TournamentQuery},
    pagination::{PageControls, Pagination},
};
use reqwest::Method;

/// The tournament listing
pub const TOURNAMENTS_PATH: &str = "/api/tournaments/tournaments/";

/// One page of tournaments and where it sits in the listing
#[derive(Debug, Clone, PartialEq)]
pub struct TournamentListing {
    /// The tournaments on this page
    pub tournaments: Vec<Tournament>,
    /// Position in the listing
    pub pagination: Pagination,
}

impl TournamentListing {
    fn new(query: &TournamentQuery, page: Page<Tournament>) -> Self {
        Self {
            pagination: Pagination::new(query.page, query.page_size, page.count),
            tournaments: page.results,
        }
    }

    /// Nothing to show: render the empty state instead
    pub fn is_empty(&self) -> bool {
        self.tournaments.is_empty()
    }

    /// Pagination controls, never shown for an empty page
    pub fn controls(&self) -> Option<PageControls> {
        if self.is_empty() {
            return None;
        }
        self.pagination.controls()
    }
}

impl ApiClient {
    /// Fetch one page of tournaments
    pub async fn tournaments(&self, query: &TournamentQuery) -> ApiResult<TournamentListing> {
        let had_session = self.session.is_authenticated();
        let response = self
            .server_request(Method::GET, TOURNAMENTS_PATH)
            .query(query)
            .send()
            .await?;

        let page: Page<Tournament> = self
            .expect_authorized(response, had_session)
            .await?
            .json()
            .await?;
        tracing::debug!(count = page.count, page = query.page, "Fetched tournaments");

        Ok(TournamentListing::new(query, page))
    }
}

//! Example consumer: wires the four Movieship screens to the SDK and
//! drives the Explore screen against a running backend.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Configure the backend with `MOVIESHIP_API_BASE_URL` /
//! `MOVIESHIP_API_ROOT_URL` (defaults target a local dev server).

mod screens;

use movieship_sdk::{Environment, ResourceController, RouteParams};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("movieship_sdk=info")),
        )
        .init();

    let environment = Environment::from_env();

    // Explore: initial activation lists the catalog.
    let mut explore =
        ResourceController::with_defaults(screens::explore_schema(), environment.clone())?;
    explore.activate().await?;
    let count = explore.listing().map(|l| l.len()).unwrap_or(0);
    tracing::info!(count, "initial explore page loaded");

    // A burst of keystrokes coalesces into one refresh.
    if let Some(criterion) = explore.search_criterion("primaryTitle") {
        for value in ["m", "ma", "matrix"] {
            let mut edit = criterion.clone();
            edit.value = value.into();
            explore.edit_search(edit);
        }
    }
    if let Some(update) = explore.next_search_refresh().await {
        explore.fetch_listing(Some(update)).await?;
    }
    for title in explore.listing().unwrap_or(&[]) {
        tracing::info!(title = %title["primaryTitle"], "match");
    }

    // Infinite scroll: same query, next cursor page.
    if explore.cursor().is_some() {
        explore.fetch_listing(None).await?;
        let count = explore.listing().map(|l| l.len()).unwrap_or(0);
        tracing::info!(count, "after one scroll page");
    }

    // Profile is a singleton; a missing one flips the screen into create
    // mode.
    let mut profile =
        ResourceController::with_defaults(screens::profile_schema(), environment.clone())?;
    profile.activate().await?;
    tracing::info!(state = ?profile.state(), "profile screen");

    // Watchlists list on activation.
    let mut watchlist =
        ResourceController::with_defaults(screens::watchlist_schema(), environment.clone())?;
    watchlist.activate().await?;
    tracing::info!(count = watchlist.listing().map(|l| l.len()).unwrap_or(0), "watchlists");

    // Reviews hang off a title's detail route.
    let imdb_id = "tt0133093".to_string();
    let mut review =
        ResourceController::with_defaults(screens::review_schema(imdb_id.clone()), environment)?;
    let route: RouteParams = [("imdb_id".to_string(), imdb_id)].into_iter().collect();
    review.set_route_params(route);
    review.activate().await?;
    tracing::info!(state = ?review.state(), "review screen");

    Ok(())
}

//! Movie metadata lookup.
//!
//! Resolves a cleaned title to a release year and, when the movie belongs to
//! a franchise, the collection name. The TMDb client is the production
//! implementation of [`MetadataSource`]; anything that can answer
//! title-to-metadata questions can stand in for it.
//!
//! Lookup failures never propagate: every transport or parse error is logged
//! and reported as [`Resolution::NotFound`], so one bad title cannot stop a
//! batch.
use serde::Deserialize;
use std::thread;
use std::time::{Duration, Instant};

/// Default TMDb API root.
pub const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Default delay enforced between successive lookups.
pub const DEFAULT_API_DELAY: Duration = Duration::from_millis(250);

/// Normalized metadata for one movie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Title as reported by the service.
    pub title: String,
    /// Four-digit release year.
    pub year: String,
    /// Franchise collection, if the movie belongs to one.
    pub collection: Option<String>,
}

/// Outcome of resolving a title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(Metadata),
    NotFound,
}

impl Resolution {
    /// Returns the metadata if the title was resolved.
    pub fn metadata(&self) -> Option<&Metadata> {
        match self {
            Resolution::Found(metadata) => Some(metadata),
            Resolution::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

/// A source of movie metadata.
pub trait MetadataSource {
    /// Resolves a title. Implementations must not fail: errors map to
    /// [`Resolution::NotFound`].
    fn resolve(&self, title: &str) -> Resolution;
}

/// Errors raised while talking to TMDb. These stay inside the resolver.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One entry of a `/search/movie` response.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

/// The subset of `/movie/{id}` this tool needs.
#[derive(Debug, Clone, Deserialize)]
pub struct MovieDetails {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub belongs_to_collection: Option<CollectionRef>,
}

/// Collection reference embedded in movie details.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionRef {
    pub name: String,
}

/// Picks the first search result with a non-empty release date, keeping the
/// service's own ordering.
pub fn select_first_dated(results: &[SearchResult]) -> Option<&SearchResult> {
    results.iter().find(|movie| {
        movie
            .release_date
            .as_deref()
            .is_some_and(|date| !date.trim().is_empty())
    })
}

/// Extracts the year from a `YYYY-MM-DD` release date.
pub fn release_year(release_date: &str) -> Option<String> {
    let year = release_date.trim().get(..4)?;
    year.chars()
        .all(|c| c.is_ascii_digit())
        .then(|| year.to_string())
}

/// Converts movie details into [`Metadata`]. Returns `None` when the details
/// carry no usable release date.
pub fn metadata_from_details(details: MovieDetails, fallback_title: &str) -> Option<Metadata> {
    let year = release_year(details.release_date.as_deref()?)?;
    let collection = details
        .belongs_to_collection
        .map(|c| c.name.trim().to_string())
        .filter(|name| !name.is_empty());

    Some(Metadata {
        title: details
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| fallback_title.to_string()),
        year,
        collection,
    })
}

/// Blocking TMDb client.
pub struct TmdbClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    /// Creates a client. The credential is passed in explicitly and held for
    /// the lifetime of the client.
    pub fn new(
        api_key: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, MetadataError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self::with_client(http, api_key, base_url))
    }

    /// Creates a client on top of a preconfigured HTTP client.
    pub fn with_client(
        http: reqwest::blocking::Client,
        api_key: impl Into<String>,
        base_url: &str,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Runs the search query and returns raw results in service order.
    pub fn search(&self, title: &str) -> Result<Vec<SearchResult>, MetadataError> {
        let url = format!("{}/search/movie", self.base_url);
        let text = self.get(&url, &[("query", title)])?;
        let response: SearchResponse = serde_json::from_str(&text)?;
        Ok(response.results)
    }

    /// Fetches full details, including the collection association.
    pub fn details(&self, id: u64) -> Result<MovieDetails, MetadataError> {
        let url = format!("{}/movie/{}", self.base_url, id);
        let text = self.get(&url, &[])?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Search, select, then fetch details. `Ok(None)` means no result
    /// qualified.
    pub fn lookup(&self, title: &str) -> Result<Option<Metadata>, MetadataError> {
        let results = self.search(title)?;
        let Some(movie) = select_first_dated(&results) else {
            log::debug!("No dated TMDb result for '{title}' ({} results)", results.len());
            return Ok(None);
        };

        log::debug!(
            "Selected TMDb id {} ({}) for '{title}'",
            movie.id,
            movie.title.as_deref().unwrap_or("untitled")
        );
        let details = self.details(movie.id)?;
        Ok(metadata_from_details(details, title))
    }

    fn get(&self, url: &str, params: &[(&str, &str)]) -> Result<String, MetadataError> {
        log::debug!("GET {url}");

        let mut query: Vec<(&str, &str)> = vec![("api_key", self.api_key.as_str())];
        query.extend_from_slice(params);

        let resp = self.http.get(url).query(&query).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(MetadataError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(resp.text()?)
    }
}

impl MetadataSource for TmdbClient {
    fn resolve(&self, title: &str) -> Resolution {
        match self.lookup(title) {
            Ok(Some(metadata)) => Resolution::Found(metadata),
            Ok(None) => Resolution::NotFound,
            Err(e) => {
                log::warn!("TMDb error for '{title}': {e}");
                Resolution::NotFound
            }
        }
    }
}

/// Enforces a minimum interval between successive lookups.
///
/// There is never more than one request in flight; the throttle simply sleeps
/// until the interval since the previous call has elapsed.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Blocks until the next request may be issued, then marks it issued.
    pub fn wait(&mut self) {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                thread::sleep(self.interval - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

//! Reddit Search Finder - paginated image search
//!
//! Queries Reddit's subreddit search endpoint and turns image posts into
//! candidates.
//!
//! ## Request
//! `GET {base_url}/r/{sub1}+{sub2}/search.json?sort=..&restrict_sr=..&t=..&limit=..&q=(..)&after=..`
//!
//! - Every parameter value is URL-encoded on its own
//! - The free-text query gets one outer pair of parentheses before encoding,
//!   so `a OR b` reaches the search grammar as a single clause
//! - `after` is only sent for a non-blank cursor
//!
//! ## Response
//! Only a 200 is accepted. A body without `data.children` means zero results.
//! Posts whose `post_hint` is not `image` (self posts, videos, galleries) are
//! dropped, keeping the original order of the rest.

use crate::error::{FinderError, Result};
use crate::traits::Finder;
use crate::types::{Candidate, IMAGE_HINT};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_BASE_URL: &str = "https://www.reddit.com";
pub const DEFAULT_SUBREDDITS: [&str; 2] = ["wallpaper", "wallpapers"];
pub const DEFAULT_SORT: &str = "new";
pub const DEFAULT_TIME: &str = "all";
pub const DEFAULT_LIMIT: u32 = 100;
pub const DEFAULT_RESTRICT_SR: &str = "on";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("wallshuffle/", env!("CARGO_PKG_VERSION"));

/// Settings for a [`RedditSearchFinder`].
///
/// Every field is optional when deserializing; blank or zero values fall back
/// to the defaults instead of producing a broken query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditSearchConfig {
    pub subreddits: Vec<String>,
    pub sort: String,
    pub time: String,
    pub limit: u32,
    pub restrict_sr: String,
    pub query: Option<String>,
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for RedditSearchConfig {
    fn default() -> Self {
        Self {
            subreddits: DEFAULT_SUBREDDITS.iter().map(|s| s.to_string()).collect(),
            sort: DEFAULT_SORT.to_string(),
            time: DEFAULT_TIME.to_string(),
            limit: DEFAULT_LIMIT,
            restrict_sr: DEFAULT_RESTRICT_SR.to_string(),
            query: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl RedditSearchConfig {
    pub fn with_subreddits<I, S>(mut self, subreddits: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subreddits = subreddits.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = sort.into();
        self
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = time.into();
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Replace blank or zero fields with their defaults.
    pub fn normalized(self) -> Self {
        let defaults = Self::default();
        let or_default = |value: String, fallback: String| {
            if value.trim().is_empty() {
                fallback
            } else {
                value
            }
        };

        let subreddits: Vec<String> = self
            .subreddits
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            subreddits: if subreddits.is_empty() {
                defaults.subreddits
            } else {
                subreddits
            },
            sort: or_default(self.sort, defaults.sort),
            time: or_default(self.time, defaults.time),
            limit: if self.limit == 0 {
                defaults.limit
            } else {
                self.limit
            },
            restrict_sr: or_default(self.restrict_sr, defaults.restrict_sr),
            query: self.query.filter(|q| !q.trim().is_empty()),
            base_url: or_default(self.base_url, defaults.base_url),
            user_agent: or_default(self.user_agent, defaults.user_agent),
            timeout_secs: if self.timeout_secs == 0 {
                defaults.timeout_secs
            } else {
                self.timeout_secs
            },
        }
    }
}

/// Paginated finder backed by Reddit's search API.
pub struct RedditSearchFinder {
    name: String,
    config: RedditSearchConfig,
    client: reqwest::Client,
}

impl RedditSearchFinder {
    /// Create a finder; the HTTP client is built once and reused for every page.
    pub fn new(config: RedditSearchConfig) -> Result<Self> {
        let config = config.normalized();
        let name = format!("reddit:{}", config.subreddits.join("+"));

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|source| FinderError::Transport {
                finder: name.clone(),
                source,
            })?;

        Ok(Self {
            name,
            config,
            client,
        })
    }

    pub fn config(&self) -> &RedditSearchConfig {
        &self.config
    }

    /// Build the request path and query string for one page.
    pub fn search_path(&self, cursor: Option<&str>) -> String {
        let config = &self.config;
        let mut path = format!(
            "/r/{}/search.json?sort={}&restrict_sr={}&t={}&limit={}",
            config.subreddits.join("+"),
            urlencoding::encode(&config.sort),
            urlencoding::encode(&config.restrict_sr),
            urlencoding::encode(&config.time),
            config.limit,
        );

        if let Some(query) = &config.query {
            path.push_str("&q=");
            path.push_str(&urlencoding::encode(&format!("({query})")));
        }

        if let Some(after) = cursor.map(str::trim).filter(|c| !c.is_empty()) {
            path.push_str("&after=");
            path.push_str(&urlencoding::encode(after));
        }

        path
    }

    /// Full URL for one page.
    pub fn search_url(&self, cursor: Option<&str>) -> String {
        format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            self.search_path(cursor)
        )
    }
}

#[async_trait]
impl Finder for RedditSearchFinder {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self))]
    async fn list_available_wallpapers(&self, cursor: Option<&str>) -> Result<Vec<Candidate>> {
        info!(
            "Searching reddit with params: [SUBS] [{}] [SORT] {} [TIME] {} [LIMIT] {} [AFTER] {} [QUERY] {}",
            self.config.subreddits.join(","),
            self.config.sort,
            self.config.time,
            self.config.limit,
            cursor.unwrap_or("0"),
            self.config.query.as_deref().unwrap_or("")
        );

        let url = self.search_url(cursor);
        let transport = |source| FinderError::Transport {
            finder: self.name.clone(),
            source,
        };

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!("Search request answered with status {}", status);
            return Err(FinderError::Status {
                finder: self.name.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(transport)?;
        parse_listing(&self.name, &body)
    }
}

/// Top-level search response. Anything that is not an object shaped like a
/// listing is tolerated and read as an empty page.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    Listing(Listing),
    Other(serde::de::IgnoredAny),
}

#[derive(Debug, Default, Deserialize)]
struct Listing {
    #[serde(default)]
    data: Option<ListingData>,
}

#[derive(Debug, Default, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Option<Vec<Child>>,
}

#[derive(Debug, Deserialize)]
struct Child {
    #[serde(default)]
    data: Option<Post>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Post {
    name: Option<String>,
    title: Option<String>,
    subreddit: Option<String>,
    url: Option<String>,
    post_hint: Option<String>,
}

impl Post {
    fn into_candidate(self) -> Option<Candidate> {
        let id = self.name.filter(|id| !id.is_empty())?;
        let url = self.url.filter(|url| !url.trim().is_empty())?;
        Some(Candidate {
            id,
            title: self.title.unwrap_or_default(),
            source_tag: self.subreddit.unwrap_or_default(),
            url,
            kind: IMAGE_HINT.to_string(),
        })
    }
}

/// Parse a search listing body into image candidates.
///
/// Invalid JSON is an error; a well-formed body without `data.children` is
/// treated as an empty page.
pub fn parse_listing(finder: &str, body: &str) -> Result<Vec<Candidate>> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|source| FinderError::Parse {
            finder: finder.to_string(),
            source,
        })?;

    let children = match response {
        SearchResponse::Listing(Listing {
            data: Some(ListingData {
                children: Some(children),
            }),
        }) => children,
        _ => {
            warn!("{}: response carried no data.children, treating as empty", finder);
            return Ok(Vec::new());
        }
    };

    let total = children.len();
    let candidates: Vec<Candidate> = children
        .into_iter()
        .filter_map(|child| child.data)
        .filter(|post| post.post_hint.as_deref() == Some(IMAGE_HINT))
        .filter_map(|post| {
            let candidate = post.into_candidate();
            if candidate.is_none() {
                debug!("{}: dropping image post without name or url", finder);
            }
            candidate
        })
        .collect();

    debug!("{}: kept {} of {} posts", finder, candidates.len(), total);
    Ok(candidates)
}

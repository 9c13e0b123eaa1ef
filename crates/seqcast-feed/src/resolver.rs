//! Feed URL → newest playable episode, with caching, timeout, and cancellation.

use std::time::Duration;

use seqcast_core::{Error, HttpError, Result};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, ResolutionCache, DEFAULT_TTL};
use crate::client::{FetchResponse, Transport};
use crate::parser::{extract_latest_episode, FeedEpisode};
use crate::rewrite::UrlTransform;

/// Number of leading feed items inspected for a playable URL.
pub const DEFAULT_MAX_ITEMS: usize = 5;

/// Deadline for a single feed fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Tunables for [`FeedResolver`].
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub max_items_scanned: usize,
    /// `None` leaves timing entirely to the transport.
    pub fetch_timeout: Option<Duration>,
    pub rewrite: UrlTransform,
    pub cache_ttl: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_items_scanned: DEFAULT_MAX_ITEMS,
            fetch_timeout: Some(DEFAULT_FETCH_TIMEOUT),
            rewrite: UrlTransform::identity(),
            cache_ttl: DEFAULT_TTL,
        }
    }
}

impl ResolverConfig {
    #[must_use]
    pub const fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items_scanned = max_items;
        self
    }

    #[must_use]
    pub const fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_rewrite(mut self, rewrite: UrlTransform) -> Self {
        self.rewrite = rewrite;
        self
    }

    #[must_use]
    pub const fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }
}

/// Resolves feed URLs to their newest playable episode.
pub struct FeedResolver<T> {
    transport: T,
    cache: ResolutionCache,
    config: ResolverConfig,
}

impl<T: Transport> FeedResolver<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ResolverConfig::default())
    }

    pub fn with_config(transport: T, config: ResolverConfig) -> Self {
        Self {
            transport,
            cache: ResolutionCache::new(config.cache_ttl),
            config,
        }
    }

    pub const fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub const fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Resolve a feed, serving a live cache entry without touching the network.
    pub async fn resolve_feed(&self, feed_url: &str) -> Result<FeedEpisode> {
        self.resolve_feed_with(feed_url, &CancellationToken::new())
            .await
    }

    /// Like [`resolve_feed`](Self::resolve_feed), abandoning the fetch with
    /// [`Error::Cancelled`] once `cancel` fires.
    ///
    /// Only successful resolutions are cached.
    pub async fn resolve_feed_with(
        &self,
        feed_url: &str,
        cancel: &CancellationToken,
    ) -> Result<FeedEpisode> {
        if let Some(entry) = self.cache.get(feed_url) {
            debug!("Cache hit for {feed_url}");
            return Ok(entry.episode());
        }

        let target = self.config.rewrite.apply(feed_url);
        info!("Fetching feed {feed_url}");

        let response = self.fetch(&target, cancel).await?;
        if !response.is_success() {
            warn!("Feed {feed_url} returned status {}", response.status);
            return Err(HttpError::StatusError {
                status: response.status,
                message: feed_url.to_string(),
            }
            .into());
        }

        let episode = extract_latest_episode(&response.body, self.config.max_items_scanned)?;
        info!(
            "Resolved {feed_url} to {} ({:?})",
            episode.audio_url, episode.episode_title
        );

        self.cache
            .put(feed_url, CacheEntry::new(episode.clone(), Instant::now()));
        Ok(episode)
    }

    async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<FetchResponse> {
        let request = self.transport.fetch(url);
        let fetched = async {
            match self.config.fetch_timeout {
                Some(limit) => tokio::time::timeout(limit, request)
                    .await
                    .unwrap_or_else(|_| Err(Error::FeedTimeout(limit))),
                None => request.await,
            }
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("Fetch of {url} cancelled");
                Err(Error::Cancelled)
            }
            result = fetched => result,
        }
    }
}

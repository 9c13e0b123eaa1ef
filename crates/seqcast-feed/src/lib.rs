//! # seqcast-feed
//!
//! Turns playlist entries into playable audio URLs.
//!
//! Direct audio links pass straight through. Feed entries are fetched through
//! an injectable [`Transport`], parsed, and reduced to their newest playable
//! episode, with results memoized in a [`ResolutionCache`].

pub mod cache;
pub mod client;
pub mod parser;
pub mod resolver;
pub mod rewrite;
pub mod track;

pub use cache::{CacheEntry, ResolutionCache, DEFAULT_TTL};
pub use client::{FetchResponse, HttpTransport, HttpTransportBuilder, Transport};
pub use parser::{extract_latest_episode, FeedEpisode};
pub use resolver::{FeedResolver, ResolverConfig};
pub use rewrite::UrlTransform;
pub use track::{TrackResolver, SHOW_TITLE_PLACEHOLDER};

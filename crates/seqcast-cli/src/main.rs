//! # Seqcast
//!
//! Manage the playlist and resolve entries to playable audio URLs from the
//! terminal.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use seqcast_core::{classify, EntryKind, Playlist, PlaylistEntry};
use seqcast_feed::{FeedResolver, HttpTransport, ResolverConfig, TrackResolver, UrlTransform};
use seqcast_store::PlaylistStore;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "seqcast", version, about = "Sequential audio and podcast player")]
struct Cli {
    /// Playlist file (defaults to the platform data directory)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Proxy prefix for feed fetches; the feed URL is appended percent-encoded
    #[arg(long, global = true)]
    proxy: Option<String>,

    /// Feed fetch timeout in seconds (0 disables it)
    #[arg(long, global = true, default_value_t = 20)]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List playlist entries
    List,
    /// Append an entry
    Add {
        /// Audio file or feed URL
        url: String,
        #[arg(short, long, default_value = "")]
        title: String,
        /// audio, feed, or auto
        #[arg(short, long, default_value = "auto")]
        kind: EntryKind,
    },
    /// Remove an entry (1-based)
    Remove { number: usize },
    /// Restore the default playlist
    Reset,
    /// Resolve one entry (1-based) or all entries to playable URLs
    Resolve { number: Option<usize> },
    /// Resolve a feed URL to its newest episode
    Feed { url: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays pipeable
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seqcast=info,seqcast_feed=info,seqcast_store=info".into()),
        )
        .init();

    let cli = Cli::parse();
    info!("Starting Seqcast v{}", env!("CARGO_PKG_VERSION"));

    let store = match &cli.store {
        Some(path) => PlaylistStore::at_path(path),
        None => PlaylistStore::new().context("Failed to open playlist store")?,
    };

    match cli.command {
        Command::List => {
            print_playlist(&store.load());
        }
        Command::Add {
            ref url,
            ref title,
            kind,
        } => {
            let mut playlist = store.load();
            playlist.add_with_kind(title, url, kind)?;
            store.save(&playlist)?;
            print_playlist(&playlist);
        }
        Command::Remove { number } => {
            let mut playlist = store.load();
            let index = to_index(number, &playlist)?;
            let removed = playlist.remove(index).context("No such entry")?;
            store.save(&playlist)?;
            println!("Removed {}", removed.list_title(index));
        }
        Command::Reset => {
            let playlist = Playlist::with_defaults();
            store.save(&playlist)?;
            print_playlist(&playlist);
        }
        Command::Resolve { number } => {
            let playlist = store.load();
            let resolver = TrackResolver::with_config(HttpTransport::new()?, resolver_config(&cli));

            let indices: Vec<usize> = match number {
                Some(number) => vec![to_index(number, &playlist)?],
                None => (0..playlist.len()).collect(),
            };

            for index in indices {
                let Some(entry) = playlist.get(index) else {
                    continue;
                };
                match resolver.resolve_track(entry).await {
                    Ok(track) => {
                        println!("{}. {}", index + 1, track.display_text);
                        println!("   {}", track.audio_url);
                    }
                    Err(e) => println!("{}. {} [error: {e}]", index + 1, entry.list_title(index)),
                }
            }
        }
        Command::Feed { ref url } => {
            let resolver = FeedResolver::with_config(HttpTransport::new()?, resolver_config(&cli));
            let episode = resolver
                .resolve_feed(url.trim())
                .await
                .with_context(|| format!("Failed to resolve {url}"))?;
            println!("{}", episode.episode_title);
            println!("{}", episode.audio_url);
        }
    }

    Ok(())
}

fn resolver_config(cli: &Cli) -> ResolverConfig {
    let timeout = (cli.timeout > 0).then(|| Duration::from_secs(cli.timeout));
    let rewrite = cli
        .proxy
        .as_deref()
        .map_or_else(UrlTransform::identity, UrlTransform::proxy_prefix);

    ResolverConfig::default()
        .with_fetch_timeout(timeout)
        .with_rewrite(rewrite)
}

/// Convert a 1-based entry number into an index.
fn to_index(number: usize, playlist: &Playlist) -> Result<usize> {
    if number == 0 || number > playlist.len() {
        bail!("Entry number must be between 1 and {}", playlist.len());
    }
    Ok(number - 1)
}

fn print_playlist(playlist: &Playlist) {
    for (index, entry) in playlist.entries().iter().enumerate() {
        println!(
            "{:>3}. {} [{}]",
            index + 1,
            entry.list_title(index),
            describe_kind(entry)
        );
        println!("     {}", entry.url);
    }
}

fn describe_kind(entry: &PlaylistEntry) -> String {
    match entry.kind {
        EntryKind::Auto => format!("auto: {}", classify(entry)),
        kind => kind.to_string(),
    }
}

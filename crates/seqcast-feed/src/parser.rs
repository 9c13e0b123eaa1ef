//! Newest-episode extraction from RSS/Atom documents.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use seqcast_core::{looks_like_audio, Error, Result};
use tracing::debug;

/// The playable episode picked out of a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEpisode {
    pub audio_url: String,
    /// Trimmed `<title>` of the item, empty if it had none.
    pub episode_title: String,
}

/// Parse `xml` and return the first of the leading `max_items` items that
/// carries a playable URL.
///
/// Items are taken in document order, which for practically every feed means
/// newest first. Within an item the URL sources are tried in this order:
/// `<enclosure url>`, `<media:content url>`, `<link rel="enclosure" href>`,
/// and finally a bare `<link>` whose text looks like an audio file.
pub fn extract_latest_episode(xml: &str, max_items: usize) -> Result<FeedEpisode> {
    let scan = scan_items(xml, max_items)?;

    if scan.items_seen == 0 {
        return Err(Error::EmptyFeed);
    }

    let scanned = scan.candidates.len();
    scan.candidates
        .into_iter()
        .find_map(ItemScan::into_episode)
        .ok_or_else(|| {
            debug!("No playable URL in {scanned} of {} items", scan.items_seen);
            Error::NoEnclosure { scanned }
        })
}

/// Result of one pass over the document.
struct DocumentScan {
    /// Every `<item>`/`<entry>` in the document.
    items_seen: usize,
    /// The leading items that were inspected.
    candidates: Vec<ItemScan>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Capture {
    Title,
    Link,
}

/// URL sources and title collected from a single item.
#[derive(Default)]
struct ItemScan {
    depth: usize,
    enclosure: Option<String>,
    media_content: Option<String>,
    link_enclosure: Option<String>,
    link_text: Option<String>,
    title: Option<String>,
    capture: Option<(Capture, usize)>,
}

impl ItemScan {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            ..Self::default()
        }
    }

    fn open(&mut self, e: &BytesStart<'_>, depth: usize, is_empty: bool) {
        match e.name().as_ref() {
            b"enclosure" => {
                if self.enclosure.is_none() {
                    self.enclosure = attribute(e, b"url");
                }
            }
            b"media:content" => {
                if self.media_content.is_none() {
                    self.media_content = attribute(e, b"url");
                }
            }
            b"link" | b"atom:link" => {
                let rel = attribute(e, b"rel");
                if rel.as_deref() == Some("enclosure") {
                    if self.link_enclosure.is_none() {
                        self.link_enclosure = attribute(e, b"href");
                    }
                } else if !is_empty
                    && depth == self.depth + 1
                    && self.link_text.is_none()
                    && e.name().as_ref() == b"link"
                {
                    self.link_text = Some(String::new());
                    self.capture = Some((Capture::Link, depth));
                }
            }
            b"title" if !is_empty && depth == self.depth + 1 && self.title.is_none() => {
                self.title = Some(String::new());
                self.capture = Some((Capture::Title, depth));
            }
            _ => {}
        }
    }

    fn close(&mut self, depth: usize) {
        if self.capture.is_some_and(|(_, d)| d == depth) {
            self.capture = None;
        }
    }

    fn text(&mut self, text: &str) {
        let target = match self.capture {
            Some((Capture::Title, _)) => self.title.as_mut(),
            Some((Capture::Link, _)) => self.link_text.as_mut(),
            None => None,
        };
        if let Some(target) = target {
            target.push_str(text);
        }
    }

    fn into_episode(self) -> Option<FeedEpisode> {
        let bare_link = self
            .link_text
            .map(|link| link.trim().to_string())
            .filter(|link| looks_like_audio(link));

        let audio_url = self
            .enclosure
            .or(self.media_content)
            .or(self.link_enclosure)
            .or(bare_link)?;

        Some(FeedEpisode {
            audio_url,
            episode_title: self.title.map(|t| t.trim().to_string()).unwrap_or_default(),
        })
    }
}

fn is_item(name: &[u8]) -> bool {
    matches!(name, b"item" | b"entry")
}

/// Look up an attribute by qualified name, trimmed; empty values count as absent.
fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.trim().to_string()))
        .filter(|v| !v.is_empty())
}

fn scan_items(xml: &str, max_items: usize) -> Result<DocumentScan> {
    let mut reader = Reader::from_str(xml);
    // Keep whitespace so titles split across text and CDATA keep their spacing
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut saw_root = false;
    let mut items_seen = 0usize;
    let mut current: Option<ItemScan> = None;
    let mut candidates = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                depth += 1;
                saw_root = true;

                if let Some(item) = current.as_mut() {
                    item.open(&e, depth, false);
                } else if is_item(e.name().as_ref()) {
                    items_seen += 1;
                    if candidates.len() < max_items {
                        current = Some(ItemScan::new(depth));
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                saw_root = true;

                if let Some(item) = current.as_mut() {
                    item.open(&e, depth + 1, true);
                } else if is_item(e.name().as_ref()) {
                    items_seen += 1;
                    if candidates.len() < max_items {
                        candidates.push(ItemScan::new(depth + 1));
                    }
                }
            }
            Ok(Event::End(_)) => {
                if let Some(mut item) = current.take() {
                    if item.depth == depth {
                        candidates.push(item);
                    } else {
                        item.close(depth);
                        current = Some(item);
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Text(e)) => {
                if let Some(item) = current.as_mut() {
                    let text = e
                        .unescape()
                        .map(|t| t.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&e).into_owned());
                    item.text(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(item) = current.as_mut() {
                    item.text(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                debug!("XML parse error: {e}");
                return Err(Error::FeedParse(e.to_string()));
            }
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(Error::FeedParse("document has no root element".into()));
    }
    if depth != 0 {
        return Err(Error::FeedParse(format!(
            "unexpected end of document with {depth} unclosed element(s)"
        )));
    }

    Ok(DocumentScan {
        items_seen,
        candidates,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn rss(items: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
              <channel>
                <title>Show</title>
                <link>https://show.example.com/</link>
                {items}
              </channel>
            </rss>"#
        )
    }

    #[test]
    fn test_first_item_with_url_wins() {
        let xml = rss(
            r#"
            <item><title>Announcement</title><description>No audio</description></item>
            <item><title>Ep2</title><enclosure url="x.mp3" type="audio/mpeg"/></item>
            <item><title>Ep1</title><enclosure url="y.mp3" type="audio/mpeg"/></item>
            "#,
        );

        let episode = extract_latest_episode(&xml, 5).unwrap();
        assert_eq!(episode.audio_url, "x.mp3");
        assert_eq!(episode.episode_title, "Ep2");
    }

    #[test]
    fn test_lookahead_is_bounded() {
        let mut items = "<item><title>text</title></item>".repeat(5);
        items.push_str(r#"<item><title>late</title><enclosure url="late.mp3"/></item>"#);
        let xml = rss(&items);

        let err = extract_latest_episode(&xml, 5).unwrap_err();
        assert!(matches!(err, Error::NoEnclosure { scanned: 5 }));

        let episode = extract_latest_episode(&xml, 6).unwrap();
        assert_eq!(episode.audio_url, "late.mp3");
    }

    #[test]
    fn test_source_priority_within_item() {
        let xml = rss(
            r#"<item>
                 <title>Ep</title>
                 <link>https://cdn.example.com/bare.mp3</link>
                 <link rel="enclosure" href="https://cdn.example.com/atom.mp3"/>
                 <media:content url="https://cdn.example.com/media.mp3"/>
                 <enclosure url="https://cdn.example.com/enclosure.mp3"/>
               </item>"#,
        );
        let episode = extract_latest_episode(&xml, 5).unwrap();
        assert_eq!(episode.audio_url, "https://cdn.example.com/enclosure.mp3");
    }

    #[test]
    fn test_media_content_inside_group() {
        let xml = rss(
            r#"<item>
                 <title>Ep</title>
                 <media:group>
                   <media:content url="https://cdn.example.com/media.m4a"/>
                 </media:group>
               </item>"#,
        );
        let episode = extract_latest_episode(&xml, 5).unwrap();
        assert_eq!(episode.audio_url, "https://cdn.example.com/media.m4a");
    }

    #[test]
    fn test_bare_link_must_look_like_audio() {
        let xml = rss(
            r#"<item><title>Post</title><link>https://blog.example.com/post</link></item>
               <item><title>Ep</title><link> https://cdn.example.com/ep.ogg?dl=1 </link></item>"#,
        );
        let episode = extract_latest_episode(&xml, 5).unwrap();
        assert_eq!(episode.audio_url, "https://cdn.example.com/ep.ogg?dl=1");
        assert_eq!(episode.episode_title, "Ep");
    }

    #[test]
    fn test_atom_entries() {
        let xml = r#"<?xml version="1.0"?>
            <feed xmlns="http://www.w3.org/2005/Atom">
              <title>Atom Show</title>
              <entry>
                <title type="text">Atom Ep</title>
                <link rel="alternate" href="https://show.example.com/ep"/>
                <link rel="enclosure" type="audio/mpeg" href="https://cdn.example.com/atom.mp3"/>
              </entry>
            </feed>"#;
        let episode = extract_latest_episode(xml, 5).unwrap();
        assert_eq!(episode.audio_url, "https://cdn.example.com/atom.mp3");
        assert_eq!(episode.episode_title, "Atom Ep");
    }

    #[test]
    fn test_title_entities_and_cdata() {
        let xml = rss(
            r#"<item>
                 <title><![CDATA[  Q&A <live> ]]></title>
                 <itunes:title>Ignored</itunes:title>
                 <enclosure url="https://cdn.example.com/a.mp3?x=1&amp;y=2"/>
               </item>
               <item><title>Rock &amp; Roll</title><enclosure url="b.mp3"/></item>"#,
        );
        let episode = extract_latest_episode(&xml, 5).unwrap();
        assert_eq!(episode.episode_title, "Q&A <live>");
        assert_eq!(episode.audio_url, "https://cdn.example.com/a.mp3?x=1&y=2");
    }

    #[test]
    fn test_missing_title_is_empty() {
        let xml = rss(r#"<item><enclosure url="a.mp3"/></item>"#);
        let episode = extract_latest_episode(&xml, 5).unwrap();
        assert_eq!(episode.episode_title, "");
    }

    #[test]
    fn test_empty_feed() {
        let xml = rss("");
        assert!(matches!(
            extract_latest_episode(&xml, 5),
            Err(Error::EmptyFeed)
        ));
    }

    #[test]
    fn test_malformed_xml() {
        assert!(matches!(
            extract_latest_episode("<rss><channel><item></channel></rss>", 5),
            Err(Error::FeedParse(_))
        ));
        assert!(matches!(
            extract_latest_episode("<rss><channel><item>", 5),
            Err(Error::FeedParse(_))
        ));
        assert!(matches!(
            extract_latest_episode("not xml at all", 5),
            Err(Error::FeedParse(_))
        ));
        assert!(matches!(
            extract_latest_episode("", 5),
            Err(Error::FeedParse(_))
        ));
    }
}

//! RSS 2.0 / RSS 1.0 (RDF) / Atom parsing into [`RawFeedItem`]s.
//!
//! A streaming `quick-xml` pass that records, per `<item>`/`<entry>`, the raw
//! value of every field an adapter may read. Nothing is interpreted here:
//! dates stay strings, HTML bodies stay HTML. Atom `type="xhtml"` bodies are
//! inline markup rather than escaped text; they are kept as serialized markup.

use crate::models::{FeedMeta, MediaRef, RawCategory, RawFeedItem};
use quick_xml::escape::{escape, resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("XML parse error at byte {position}: {message}")]
    Xml { position: u64, message: String },
    #[error("document is neither RSS nor Atom")]
    NotAFeed,
}

/// A fetched and parsed feed.
#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    pub meta: FeedMeta,
    /// In document order (publishers list newest first).
    pub items: Vec<RawFeedItem>,
}

/// Parse an RSS or Atom document.
pub fn parse_feed(xml: &str) -> Result<ParsedFeed, FeedError> {
    let mut reader = Reader::from_reader(xml.as_bytes());

    let mut feed = ParsedFeed::default();
    let mut saw_root = false;
    let mut buf = Vec::new();

    let mut current: Option<ItemBuilder> = None;
    let mut path: Vec<String> = Vec::new();
    let mut text = String::new();

    let mut xhtml: Option<XhtmlCapture> = None;

    loop {
        buf.clear();
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(e) => {
                return Err(FeedError::Xml {
                    position: reader.error_position(),
                    message: e.to_string(),
                });
            }
        };

        if let Some(capture) = xhtml.as_mut() {
            if matches!(event, Event::Eof) {
                break;
            }
            if capture.push(&event) {
                if let (Some(done), Some(item)) = (xhtml.take(), current.as_mut()) {
                    item.close(&done.field, done.markup.trim());
                }
                path.pop();
                text.clear();
            }
            continue;
        }

        match event {
            Event::Start(e) => {
                let name = qname(&e);
                if matches!(name.as_str(), "rss" | "feed" | "rdf:RDF") {
                    saw_root = true;
                }
                if matches!(name.as_str(), "item" | "entry") {
                    current = Some(ItemBuilder::default());
                } else if let Some(item) = current.as_mut() {
                    item.open(&name, &e, false);
                    if is_xhtml_body(&name, &e) {
                        xhtml = Some(XhtmlCapture::new(&name));
                    }
                } else if name == "link" && path.last().map(String::as_str) == Some("feed") {
                    feed.meta.link = feed.meta.link.take().or_else(|| atom_href(&e));
                }
                path.push(name);
                text.clear();
            }
            Event::Empty(e) => {
                let name = qname(&e);
                if let Some(item) = current.as_mut() {
                    item.open(&name, &e, true);
                } else if name == "link" && path.last().map(String::as_str) == Some("feed") {
                    feed.meta.link = feed.meta.link.take().or_else(|| atom_href(&e));
                }
            }
            Event::Text(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::GeneralRef(e) => {
                let entity = String::from_utf8_lossy(&e).to_string();
                if let Ok(Some(ch)) = e.resolve_char_ref() {
                    text.push(ch);
                } else if let Some(resolved) = resolve_predefined_entity(&entity) {
                    text.push_str(resolved);
                } else {
                    text.push('&');
                    text.push_str(&entity);
                    text.push(';');
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                path.pop();

                if matches!(name.as_str(), "item" | "entry") {
                    if let Some(builder) = current.take() {
                        feed.items.push(builder.build());
                    }
                } else if let Some(item) = current.as_mut() {
                    item.close(&name, text.trim());
                } else if is_channel_field(&path) {
                    let value = text.trim();
                    if !value.is_empty() {
                        match name.as_str() {
                            "title" if feed.meta.title.is_none() => {
                                feed.meta.title = Some(value.to_string())
                            }
                            "link" if feed.meta.link.is_none() => {
                                feed.meta.link = Some(value.to_string())
                            }
                            _ => {}
                        }
                    }
                }
                text.clear();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(FeedError::NotAFeed);
    }
    Ok(feed)
}

/// True when the element just closed was a direct child of `<channel>` or `<feed>`.
fn is_channel_field(path: &[String]) -> bool {
    matches!(path.last().map(String::as_str), Some("channel" | "feed"))
}

fn qname(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

fn attributes(e: &BytesStart<'_>) -> BTreeMap<String, String> {
    e.attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let raw = String::from_utf8_lossy(&attr.value).to_string();
            let value = unescape(&raw).map(|v| v.into_owned()).unwrap_or(raw);
            (key, value)
        })
        .collect()
}

/// `href` of an Atom `<link>` that points at the article itself.
fn atom_href(e: &BytesStart<'_>) -> Option<String> {
    let attrs = attributes(e);
    let rel_ok = attrs
        .get("rel")
        .is_none_or(|rel| rel == "alternate");
    attrs
        .get("href")
        .filter(|href| rel_ok && !href.trim().is_empty())
        .map(|href| href.trim().to_string())
}

/// Atom `<content>`/`<summary>` whose body is inline XHTML.
fn is_xhtml_body(name: &str, e: &BytesStart<'_>) -> bool {
    matches!(name, "content" | "summary")
        && attributes(e).get("type").is_some_and(|t| t == "xhtml")
}

/// Re-serializes the markup inside an XHTML body until its element closes.
struct XhtmlCapture {
    field: String,
    depth: usize,
    markup: String,
}

impl XhtmlCapture {
    fn new(field: &str) -> Self {
        Self {
            field: field.to_string(),
            depth: 0,
            markup: String::new(),
        }
    }

    /// Append one event; true once the capturing element itself closes.
    fn push(&mut self, event: &Event<'_>) -> bool {
        match event {
            Event::Start(e) => {
                self.depth += 1;
                self.markup.push('<');
                self.markup.push_str(&String::from_utf8_lossy(e));
                self.markup.push('>');
            }
            Event::Empty(e) => {
                self.markup.push('<');
                self.markup.push_str(&String::from_utf8_lossy(e));
                self.markup.push_str("/>");
            }
            Event::End(e) => {
                if self.depth == 0 {
                    return true;
                }
                self.depth -= 1;
                self.markup.push_str("</");
                self.markup.push_str(&String::from_utf8_lossy(e.name().as_ref()));
                self.markup.push('>');
            }
            Event::Text(e) => self.markup.push_str(&String::from_utf8_lossy(e)),
            Event::CData(e) => self.markup.push_str(&escape(String::from_utf8_lossy(e))),
            Event::GeneralRef(e) => {
                self.markup.push('&');
                self.markup.push_str(&String::from_utf8_lossy(e));
                self.markup.push(';');
            }
            _ => {}
        }
        false
    }
}

#[derive(Default)]
struct ItemBuilder {
    item: RawFeedItem,
    /// Attributes of the `<category>` currently open.
    category_attrs: Option<BTreeMap<String, String>>,
}

impl ItemBuilder {
    fn open(&mut self, name: &str, e: &BytesStart<'_>, empty: bool) {
        match name {
            "link" => {
                if self.item.link.is_none() {
                    self.item.link = atom_href(e);
                }
            }
            "media:content" | "media:thumbnail" => {
                let url = attributes(e).remove("url").filter(|u| !u.trim().is_empty());
                if let Some(url) = url {
                    let media = MediaRef { url: Some(url) };
                    if name == "media:content" {
                        self.item.media_content.push(media);
                    } else {
                        self.item.media_thumbnail.push(media);
                    }
                }
            }
            "category" => {
                let attrs = attributes(e);
                if empty {
                    if !attrs.is_empty() {
                        self.item.categories.push(fields(attrs));
                    }
                } else {
                    self.category_attrs = Some(attrs);
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &str, value: &str) {
        if name == "category" {
            let attrs = self.category_attrs.take().unwrap_or_default();
            if attrs.is_empty() {
                if !value.is_empty() {
                    self.item.categories.push(RawCategory::Text(value.to_string()));
                }
            } else {
                let mut attrs = attrs;
                if !value.is_empty() {
                    attrs.insert("#text".to_string(), value.to_string());
                }
                self.item.categories.push(fields(attrs));
            }
            return;
        }

        if value.is_empty() {
            return;
        }
        let slot = match name {
            "title" => &mut self.item.title,
            "link" => &mut self.item.link,
            "pubDate" => &mut self.item.pub_date,
            "dc:date" => &mut self.item.iso_date,
            "published" => &mut self.item.published,
            "updated" | "atom:updated" => &mut self.item.updated,
            "content:encoded" => &mut self.item.content_encoded,
            "content" => &mut self.item.content,
            "description" => &mut self.item.description,
            "summary" => &mut self.item.summary,
            _ => return,
        };
        if slot.is_none() {
            *slot = Some(value.to_string());
        }
    }

    fn build(self) -> RawFeedItem {
        self.item
    }
}

fn fields(attrs: BTreeMap<String, String>) -> RawCategory {
    RawCategory::Fields(
        attrs
            .into_iter()
            .map(|(k, v)| (k, serde_json::Value::String(v)))
            .collect(),
    )
}

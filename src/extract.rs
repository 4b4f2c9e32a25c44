//! Declarative field extraction.
//!
//! Every piece of data the stages pull out of a page is a [`Field`]: a
//! semantic name, a compiled CSS selector and an [`Extractor`] saying what to
//! read from the matched node. [`CompiledSelectors`] turns a
//! [`SourceConfig`]'s selector strings into fields once, when an adapter is
//! built, so a bad selector fails construction instead of a stage call.

use crate::config::{SourceConfig, SummarySelectors};
use crate::error::{Result, SourceError};
use crate::models::ListingSummary;
use crate::utils::{clean_text, normalize_url};
use scraper::{ElementRef, Node, Selector};
use tracing::debug;

/// Image attributes tried in order; lazy-loading sites keep the real URL in `data-*`.
const IMAGE_ATTRS: [&str; 3] = ["src", "data-src", "data-lazy-src"];

/// Elements whose boundaries separate words in rendered text.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
    "nav", "ol", "p", "pre", "section", "table", "tbody", "td", "tfoot", "th", "thead", "tr",
    "ul",
];

/// What to read from a matched node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    /// Whitespace-collapsed text content; blank text counts as missing.
    Text,
    /// `href`, resolved against the page URL.
    Link,
    /// First resolvable image attribute (`src`, `data-src`, `data-lazy-src`).
    Image,
}

impl Extractor {
    /// Apply to one node. `base` is the URL of the page the node came from.
    pub fn apply(self, element: ElementRef<'_>, base: &str) -> Option<String> {
        match self {
            Self::Text => clean_text(&rendered_text(element)),
            Self::Link => normalize_url(element.value().attr("href"), base),
            Self::Image => IMAGE_ATTRS
                .iter()
                .find_map(|attr| normalize_url(element.value().attr(attr), base)),
        }
    }
}

/// Text content with a space at every `<br>` and block boundary, so
/// `<p>a.</p><p>b.</p>` reads "a. b." rather than "a.b.".
fn rendered_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    push_text(element, &mut out);
    out
}

fn push_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if el.name() == "br" => out.push(' '),
            Node::Element(el) => {
                let block = BLOCK_ELEMENTS.contains(&el.name());
                if block {
                    out.push(' ');
                }
                if let Some(child) = ElementRef::wrap(child) {
                    push_text(child, out);
                }
                if block {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

/// A named selector plus extractor.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    selector: Selector,
    extractor: Extractor,
}

impl Field {
    /// Compile `selector` for the field called `name`.
    pub fn new(name: impl Into<String>, selector: &str, extractor: Extractor) -> Result<Self> {
        let name = name.into();
        let selector = compile(&name, selector)?;
        Ok(Self {
            name,
            selector,
            extractor,
        })
    }

    fn optional(name: &str, selector: Option<&String>, extractor: Extractor) -> Result<Option<Self>> {
        selector
            .map(|s| Self::new(name, s, extractor))
            .transpose()
    }

    /// Value of the first match under `scope`.
    ///
    /// Only the first match is consulted: if it yields nothing the field is
    /// missing, later matches are not tried.
    pub fn first(&self, scope: ElementRef<'_>, base: &str) -> Option<String> {
        scope
            .select(&self.selector)
            .next()
            .and_then(|el| self.extractor.apply(el, base))
    }

    /// Values of every match under `scope`, skipping matches that yield nothing.
    pub fn all(&self, scope: ElementRef<'_>, base: &str) -> Vec<String> {
        scope
            .select(&self.selector)
            .filter_map(|el| self.extractor.apply(el, base))
            .collect()
    }
}

/// Compile a selector, naming the config field on failure.
pub fn compile(field: &str, selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| SourceError::InvalidSelector {
        field: field.to_string(),
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Fields of one result list (search page or listing page).
#[derive(Debug, Clone)]
pub struct SummaryFields {
    pub item: Selector,
    pub title: Field,
    pub link: Field,
    pub poster: Option<Field>,
    pub latest_chapter: Option<Field>,
}

impl SummaryFields {
    fn compile(prefix: &str, selectors: &SummarySelectors) -> Result<Self> {
        Ok(Self {
            item: compile(&format!("{prefix}.item"), &selectors.item)?,
            title: Field::new(format!("{prefix}.title_link"), &selectors.title_link, Extractor::Text)?,
            link: Field::new(format!("{prefix}.title_link"), &selectors.title_link, Extractor::Link)?,
            poster: Field::optional(&format!("{prefix}.poster"), selectors.poster.as_ref(), Extractor::Image)?,
            latest_chapter: Field::optional(
                &format!("{prefix}.latest_chapter"),
                selectors.latest_chapter.as_ref(),
                Extractor::Text,
            )?,
        })
    }

    /// Extract one summary per `item` node of `root`, in document order.
    ///
    /// Items without a title or a resolvable link are dropped; the second
    /// value of the tuple counts them.
    pub fn extract(&self, root: ElementRef<'_>, base: &str) -> (Vec<ListingSummary>, usize) {
        let mut dropped = 0;
        let summaries: Vec<ListingSummary> = root
            .select(&self.item)
            .filter_map(|item| {
                let title = self.title.first(item, base);
                let url = self.link.first(item, base);
                match (title, url) {
                    (Some(title), Some(url)) => Some(ListingSummary {
                        title,
                        url,
                        poster_url: self.poster.as_ref().and_then(|f| f.first(item, base)),
                        latest_chapter: self
                            .latest_chapter
                            .as_ref()
                            .and_then(|f| f.first(item, base)),
                    }),
                    (title, url) => {
                        debug!(
                            field = %self.title.name,
                            ?title,
                            ?url,
                            "Dropping result without title or link"
                        );
                        dropped += 1;
                        None
                    }
                }
            })
            .collect();
        (summaries, dropped)
    }
}

/// Fields of a detail page.
#[derive(Debug, Clone)]
pub struct DetailFields {
    pub title: Field,
    pub author: Option<Field>,
    pub poster: Option<Field>,
    pub synopsis: Option<Field>,
    pub tags: Option<Field>,
    pub status: Option<Field>,
    pub chapter: Selector,
    pub chapter_date: Option<Field>,
    pub bundle_link: Selector,
}

/// Every selector of a [`SourceConfig`], compiled.
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub search: SummaryFields,
    pub listing: SummaryFields,
    pub detail: DetailFields,
    pub content: Selector,
    pub next_page: Option<Selector>,
    pub exclusions: Vec<Selector>,
}

impl CompiledSelectors {
    pub fn compile(config: &SourceConfig) -> Result<Self> {
        let s = &config.selectors;
        let d = &s.detail;
        let detail = DetailFields {
            title: Field::new("detail.title", &d.title, Extractor::Text)?,
            author: Field::optional("detail.author", d.author.as_ref(), Extractor::Text)?,
            poster: Field::optional("detail.poster", d.poster.as_ref(), Extractor::Image)?,
            synopsis: Field::optional("detail.synopsis", d.synopsis.as_ref(), Extractor::Text)?,
            tags: Field::optional("detail.tags", d.tags.as_ref(), Extractor::Text)?,
            status: Field::optional("detail.status", d.status.as_ref(), Extractor::Text)?,
            chapter: compile("detail.chapter", &d.chapter)?,
            chapter_date: Field::optional("detail.chapter_date", d.chapter_date.as_ref(), Extractor::Text)?,
            bundle_link: compile("detail.bundle_link", &d.bundle_link)?,
        };

        let exclusions = config
            .content_exclusion_selectors
            .iter()
            .map(|sel| compile("content_exclusion_selectors", sel))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            search: SummaryFields::compile("search", &s.search)?,
            listing: SummaryFields::compile("listing", &s.listing)?,
            detail,
            content: compile("content", &s.content)?,
            next_page: s
                .next_page
                .as_deref()
                .map(|sel| compile("next_page", sel))
                .transpose()?,
            exclusions,
        })
    }
}

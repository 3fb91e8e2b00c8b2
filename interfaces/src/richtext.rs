//! Structured rich text as stored by the content store, and its two
//! conversions: plain text (for word counting) and HTML (for display).
//!
//! Both conversions are pure functions of the block sequence.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RichTextBlock {
    #[serde(rename = "heading1")]
    Heading1(TextBlock),
    #[serde(rename = "heading2")]
    Heading2(TextBlock),
    #[serde(rename = "heading3")]
    Heading3(TextBlock),
    #[serde(rename = "heading4")]
    Heading4(TextBlock),
    #[serde(rename = "heading5")]
    Heading5(TextBlock),
    #[serde(rename = "heading6")]
    Heading6(TextBlock),
    #[serde(rename = "paragraph")]
    Paragraph(TextBlock),
    #[serde(rename = "preformatted")]
    Preformatted(TextBlock),
    #[serde(rename = "list-item")]
    ListItem(TextBlock),
    #[serde(rename = "o-list-item")]
    OrderedListItem(TextBlock),
    #[serde(rename = "image")]
    Image(ImageBlock),
    #[serde(rename = "embed")]
    Embed(EmbedBlock),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
}

impl TextBlock {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), spans: Vec::new() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageBlock {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub copyright: Option<String>,
    #[serde(default, rename = "linkTo")]
    pub link_to: Option<LinkData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedBlock {
    #[serde(default)]
    pub oembed: Oembed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Oembed {
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub embed_url: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub provider_name: Option<String>,
}

/// Inline formatting applied to `start..end` of a text block. Offsets count
/// UTF-16 code units, as written by the store's editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: SpanKind,
    #[serde(default)]
    pub data: Option<LinkData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink,
    Label,
    #[serde(other)]
    Unknown,
}

/// Link target of a hyperlink span or image, also carries the label name of label spans.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkData {
    #[serde(default)]
    pub link_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default, rename = "type")]
    pub document_type: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

/// Turns a link into an `href`. Returning `None` renders the span's text unlinked.
pub trait LinkResolver {
    fn resolve(&self, link: &LinkData) -> Option<String>;
}

/// Resolves web and media links by their URL; document links have no route.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebLinkResolver;

impl LinkResolver for WebLinkResolver {
    fn resolve(&self, link: &LinkData) -> Option<String> {
        link.url.clone()
    }
}

impl RichTextBlock {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph(TextBlock::plain(text))
    }

    pub fn text_block(&self) -> Option<&TextBlock> {
        match self {
            Self::Heading1(block)
            | Self::Heading2(block)
            | Self::Heading3(block)
            | Self::Heading4(block)
            | Self::Heading5(block)
            | Self::Heading6(block)
            | Self::Paragraph(block)
            | Self::Preformatted(block)
            | Self::ListItem(block)
            | Self::OrderedListItem(block) => Some(block),
            Self::Image(_) | Self::Embed(_) | Self::Unknown => None,
        }
    }
}

/// Flattens blocks to plain text, joining text blocks with a single space.
pub fn as_text(blocks: &[RichTextBlock]) -> String {
    blocks
        .iter()
        .filter_map(RichTextBlock::text_block)
        .map(|block| block.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders blocks to HTML. Consecutive list items are grouped into one list.
pub fn as_html(blocks: &[RichTextBlock], resolver: &dyn LinkResolver) -> String {
    let mut html = String::new();
    let mut open_list: Option<&'static str> = None;

    for block in blocks {
        let list_tag = match block {
            RichTextBlock::ListItem(_) => Some("ul"),
            RichTextBlock::OrderedListItem(_) => Some("ol"),
            _ => None,
        };

        if open_list != list_tag {
            if let Some(tag) = open_list {
                html.push_str(&format!("</{tag}>"));
            }
            if let Some(tag) = list_tag {
                html.push_str(&format!("<{tag}>"));
            }
            open_list = list_tag;
        }

        html.push_str(&block_html(block, resolver));
    }

    if let Some(tag) = open_list {
        html.push_str(&format!("</{tag}>"));
    }

    html
}

fn block_html(block: &RichTextBlock, resolver: &dyn LinkResolver) -> String {
    match block {
        RichTextBlock::Heading1(text) => wrap("h1", text, resolver),
        RichTextBlock::Heading2(text) => wrap("h2", text, resolver),
        RichTextBlock::Heading3(text) => wrap("h3", text, resolver),
        RichTextBlock::Heading4(text) => wrap("h4", text, resolver),
        RichTextBlock::Heading5(text) => wrap("h5", text, resolver),
        RichTextBlock::Heading6(text) => wrap("h6", text, resolver),
        RichTextBlock::Paragraph(text) => wrap("p", text, resolver),
        RichTextBlock::Preformatted(text) => wrap("pre", text, resolver),
        RichTextBlock::ListItem(text) | RichTextBlock::OrderedListItem(text) => wrap("li", text, resolver),
        RichTextBlock::Image(image) => image_html(image, resolver),
        RichTextBlock::Embed(embed) => embed_html(embed),
        RichTextBlock::Unknown => String::new(),
    }
}

fn wrap(tag: &str, block: &TextBlock, resolver: &dyn LinkResolver) -> String {
    format!("<{tag}>{}</{tag}>", spans_html(&block.text, &block.spans, resolver))
}

fn image_html(image: &ImageBlock, resolver: &dyn LinkResolver) -> String {
    let mut img = format!(
        "<img src=\"{}\" alt=\"{}\"",
        escape_html(&image.url),
        escape_html(image.alt.as_deref().unwrap_or(""))
    );
    if let Some(copyright) = &image.copyright {
        img.push_str(&format!(" copyright=\"{}\"", escape_html(copyright)));
    }
    img.push_str(" />");

    let inner = match image.link_to.as_ref().and_then(|link| resolver.resolve(link)) {
        Some(href) => format!("<a href=\"{}\">{img}</a>", escape_html(&href)),
        None => img,
    };
    format!("<p class=\"block-img\">{inner}</p>")
}

fn embed_html(embed: &EmbedBlock) -> String {
    let oembed = &embed.oembed;
    let mut attributes = String::new();
    if let Some(url) = &oembed.embed_url {
        attributes.push_str(&format!(" data-oembed=\"{}\"", escape_html(url)));
    }
    if let Some(kind) = &oembed.kind {
        attributes.push_str(&format!(" data-oembed-type=\"{}\"", escape_html(kind)));
    }
    if let Some(provider) = &oembed.provider_name {
        attributes.push_str(&format!(" data-oembed-provider=\"{}\"", escape_html(provider)));
    }
    // oEmbed html comes from the trusted store and is emitted as is.
    format!("<div{attributes}>{}</div>", oembed.html.as_deref().unwrap_or(""))
}

struct Bounded<'a> {
    start: usize,
    end: usize,
    span: &'a Span,
}

fn spans_html(text: &str, spans: &[Span], resolver: &dyn LinkResolver) -> String {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    let bounded: Vec<Bounded<'_>> = spans
        .iter()
        .filter(|span| span.kind != SpanKind::Unknown)
        .map(|span| Bounded {
            start: char_index(&chars, span.start),
            end: char_index(&chars, span.end),
            span,
        })
        .filter(|span| span.start < span.end)
        .collect();

    let mut points: Vec<usize> = vec![0, len];
    for span in &bounded {
        points.push(span.start);
        points.push(span.end);
    }
    points.sort_unstable();
    points.dedup();

    let mut html = String::new();
    let mut open: Vec<&Bounded<'_>> = Vec::new();

    for window in points.windows(2) {
        let (from, to) = (window[0], window[1]);
        close_ended(&mut open, from, &mut html, resolver);

        let mut starting: Vec<&Bounded<'_>> = bounded.iter().filter(|span| span.start == from).collect();
        // Longer spans open first so they enclose shorter ones.
        starting.sort_by(|a, b| b.end.cmp(&a.end));
        for span in starting {
            html.push_str(&open_tag(span.span, resolver));
            open.push(span);
        }

        let segment: String = chars[from..to].iter().collect();
        html.push_str(&escape_text(&segment));
    }

    while let Some(span) = open.pop() {
        html.push_str(close_tag(span.span, resolver));
    }

    html
}

/// Converts a UTF-16 code unit offset into an index into `chars`. Offsets past
/// the end clamp to the text length; an offset inside a surrogate pair moves
/// to the next character.
fn char_index(chars: &[char], utf16_offset: usize) -> usize {
    let mut units = 0;
    for (index, c) in chars.iter().enumerate() {
        if units >= utf16_offset {
            return index;
        }
        units += c.len_utf16();
    }
    chars.len()
}

/// Closes every open span ending at `at`, reopening the spans that were
/// closed only to keep the markup well nested.
fn close_ended(open: &mut Vec<&Bounded<'_>>, at: usize, html: &mut String, resolver: &dyn LinkResolver) {
    if !open.iter().any(|span| span.end <= at) {
        return;
    }

    let mut reopen = Vec::new();
    while let Some(span) = open.pop() {
        html.push_str(close_tag(span.span, resolver));
        if span.end > at {
            reopen.push(span);
        }
        if !open.iter().any(|span| span.end <= at) {
            break;
        }
    }

    for span in reopen.into_iter().rev() {
        html.push_str(&open_tag(span.span, resolver));
        open.push(span);
    }
}

fn open_tag(span: &Span, resolver: &dyn LinkResolver) -> String {
    match span.kind {
        SpanKind::Strong => "<strong>".to_string(),
        SpanKind::Em => "<em>".to_string(),
        SpanKind::Hyperlink => match link_href(span, resolver) {
            Some(href) => {
                let target = span
                    .data
                    .as_ref()
                    .and_then(|data| data.target.as_deref())
                    .map(|target| format!(" target=\"{}\" rel=\"noopener\"", escape_html(target)))
                    .unwrap_or_default();
                format!("<a href=\"{}\"{target}>", escape_html(&href))
            }
            None => String::new(),
        },
        SpanKind::Label => {
            let label = span.data.as_ref().and_then(|data| data.label.as_deref()).unwrap_or("");
            format!("<span class=\"{}\">", escape_html(label))
        }
        SpanKind::Unknown => String::new(),
    }
}

fn close_tag(span: &Span, resolver: &dyn LinkResolver) -> &'static str {
    match span.kind {
        SpanKind::Strong => "</strong>",
        SpanKind::Em => "</em>",
        SpanKind::Hyperlink if link_href(span, resolver).is_some() => "</a>",
        SpanKind::Hyperlink => "",
        SpanKind::Label => "</span>",
        SpanKind::Unknown => "",
    }
}

fn link_href(span: &Span, resolver: &dyn LinkResolver) -> Option<String> {
    span.data.as_ref().and_then(|data| resolver.resolve(data))
}

fn escape_text(text: &str) -> String {
    escape_html(text).replace('\n', "<br />")
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

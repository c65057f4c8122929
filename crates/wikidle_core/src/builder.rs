//! crates/wikidle_core/src/builder.rs
//!
//! Builds the immutable [`Article`] for one game-day from raw article markup: strips
//! structural noise, obscures the body, adds the title banner and produces the
//! obscured and fully revealed renderings.

use crate::domain::{Article, DayKey};
use crate::markup::{escape_text, segments, Segment, StartTag, TagParser};
use crate::normalize::{is_excluded, normalize};
use crate::obscure::{mask, Obscurer};
use crate::ports::PortError;
use scraper::{Html, Selector};
use std::collections::HashSet;

/// Elements removed before tokenization. None of them belong to the article body.
const STRIPPED_SELECTORS: &[&str] = &[
    "audio",
    "video",
    "script",
    "style",
    "title",
    "meta",
    "link",
    "base",
    ".vcard",
    ".mw-authority-control",
];

/// Attributes removed from every tag of both renderings. Parsoid puts page and file
/// names in `about` and `resource`.
const SCRUBBED_ATTRS: &[&str] = &["id", "data-mw", "about", "resource"];

const DEFAULT_IMAGE_SIZE: &str = "400";
const INERT_HREF: &str = "javascript:void(0);";

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Article title is empty")]
    EmptyTitle,
    #[error("No queued article title is available")]
    EmptyQueue,
    #[error("Failed to fetch article '{title}': {source}")]
    Fetch {
        title: String,
        #[source]
        source: PortError,
    },
    #[error("Failed to store article: {0}")]
    Store(#[source] PortError),
}

/// Turns markup into articles. Holds its compiled patterns; build it once and reuse it.
#[derive(Debug, Clone)]
pub struct ArticleBuilder {
    obscurer: Obscurer,
    tags: TagParser,
    stripped: Vec<Selector>,
}

impl Default for ArticleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArticleBuilder {
    pub fn new() -> Self {
        let stripped = STRIPPED_SELECTORS
            .iter()
            .map(|s| Selector::parse(s).expect("stripped selectors are valid"))
            .collect();

        Self {
            obscurer: Obscurer::new(),
            tags: TagParser::new(),
            stripped,
        }
    }

    /// Builds the article for `day`. `related` titles become clues when they do not
    /// give the title away.
    pub fn build(
        &self,
        day: DayKey,
        title: &str,
        raw_markup: &str,
        related: &[String],
    ) -> Result<Article, BuildError> {
        let title = title.replace('_', " ").trim().to_string();
        if title.is_empty() {
            return Err(BuildError::EmptyTitle);
        }

        let body = self.scrub_attributes(&self.strip_structural(raw_markup));
        let obscured = self.obscurer.obscure(&body);

        let title_words: Vec<&str> = title.split_whitespace().collect();
        let title_tokens: Vec<String> = title_words.iter().map(|w| normalize(w)).collect();

        let unobscured_html = insert_banner(&body, &revealed_banner(&title));
        let obscured_html = self.disarm(&insert_banner(
            &obscured.html,
            &obscured_banner(&title_words),
        ));

        Ok(Article {
            id: day,
            clues: select_clues(&title_tokens, related),
            title,
            title_tokens,
            tokens: obscured.tokens,
            words: obscured.words,
            obscured_html,
            unobscured_html,
        })
    }

    fn strip_structural(&self, markup: &str) -> String {
        let mut document = Html::parse_document(markup);
        let doomed: Vec<_> = self
            .stripped
            .iter()
            .flat_map(|selector| document.select(selector).map(|el| el.id()).collect::<Vec<_>>())
            .collect();

        for id in doomed {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
            }
        }

        document.html()
    }

    fn scrub_attributes(&self, html: &str) -> String {
        self.rewrite_tags(html, |tag| {
            let before = tag.attrs.len();
            for attr in SCRUBBED_ATTRS {
                tag.remove_attr(attr);
            }
            tag.attrs.len() != before
        })
    }

    /// Makes links inert and swaps images for same-sized placeholders so hidden
    /// attributes cannot give words away.
    fn disarm(&self, html: &str) -> String {
        self.rewrite_tags(html, |tag| match tag.name.as_str() {
            "a" => {
                tag.set_attr("href", INERT_HREF);
                tag.remove_attr("title");
                true
            }
            "img" => {
                let width = tag.attr("width").unwrap_or(DEFAULT_IMAGE_SIZE).to_string();
                let height = tag.attr("height").unwrap_or(DEFAULT_IMAGE_SIZE).to_string();
                tag.set_attr("src", format!("https://placehold.co/{width}x{height}?text=?"));
                tag.remove_attr("srcset");
                tag.remove_attr("alt");
                tag.attrs.retain(|(name, _)| !name.starts_with("data-file"));
                true
            }
            _ => false,
        })
    }

    /// Applies `edit` to every start tag; tags it leaves alone are copied verbatim.
    fn rewrite_tags(&self, html: &str, edit: impl Fn(&mut StartTag) -> bool) -> String {
        let mut out = String::with_capacity(html.len());
        for segment in segments(html) {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Tag(raw) => match self.tags.parse(raw) {
                    Some(mut tag) => {
                        if edit(&mut tag) {
                            out.push_str(&tag.render());
                        } else {
                            out.push_str(raw);
                        }
                    }
                    None => out.push_str(raw),
                },
            }
        }
        out
    }
}

fn obscured_banner(title_words: &[&str]) -> String {
    let words: Vec<String> = title_words
        .iter()
        .enumerate()
        .map(|(position, word)| {
            let key = normalize(word);
            if key.is_empty() || is_excluded(&key) {
                escape_text(word)
            } else {
                format!(
                    r#"<span class="obscured title-word" id="title-{}">{}</span>"#,
                    position,
                    mask(word)
                )
            }
        })
        .collect();
    format!(r#"<h1 class="article-title">{}</h1>"#, words.join(" "))
}

fn revealed_banner(title: &str) -> String {
    format!(r#"<h1 class="article-title">{}</h1>"#, escape_text(title))
}

/// Places the banner before the first section, else at the top of the body.
fn insert_banner(html: &str, banner: &str) -> String {
    let at = html
        .find("<section")
        .or_else(|| {
            html.find("<body")
                .and_then(|start| html[start..].find('>').map(|end| start + end + 1))
        })
        .unwrap_or(0);

    let mut out = String::with_capacity(html.len() + banner.len());
    out.push_str(&html[..at]);
    out.push_str(banner);
    out.push_str(&html[at..]);
    out
}

/// Keeps related titles that share no scoring word with the title itself.
fn select_clues(title_tokens: &[String], related: &[String]) -> Vec<String> {
    let answer: HashSet<&str> = title_tokens
        .iter()
        .map(String::as_str)
        .filter(|t| !t.is_empty() && !is_excluded(t))
        .collect();

    related
        .iter()
        .map(|r| r.replace('_', " ").trim().to_string())
        .filter(|r| !r.is_empty())
        .filter(|r| !r.split_whitespace().any(|w| answer.contains(normalize(w).as_str())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> DayKey {
        "20240301".parse().unwrap()
    }

    #[test]
    fn builds_the_sun_article() {
        let article = ArticleBuilder::new()
            .build(day(), "Sol", "<p>El <b>Sol</b> es una estrella.</p>", &[])
            .unwrap();

        assert_eq!(article.id, day());
        assert_eq!(article.title_tokens, vec!["sol"]);
        assert_eq!(article.tokens["sol"], vec![0]);
        assert_eq!(article.tokens["estrella"], vec![1]);
        assert_eq!(article.words[&0], "Sol");
        for stop in ["el", "es", "una"] {
            assert!(!article.tokens.contains_key(stop));
        }

        assert!(article.obscured_html.contains(r#"<b><span class="obscured" id="obscured-0">###</span></b>"#));
        assert!(article.obscured_html.contains(r#"id="title-0">###</span>"#));
        assert!(article.unobscured_html.contains("<b>Sol</b> es una estrella."));
        assert!(article.unobscured_html.contains(r#"<h1 class="article-title">Sol</h1>"#));
        assert!(!article.unobscured_html.contains("obscured"));
    }

    #[test]
    fn underscores_in_title_become_spaces() {
        let article = ArticleBuilder::new()
            .build(day(), "Segunda_Guerra_Mundial", "<section><p>Texto</p></section>", &[])
            .unwrap();
        assert_eq!(article.title, "Segunda Guerra Mundial");
        assert_eq!(article.title_tokens, vec!["segunda", "guerra", "mundial"]);
        let banner = article.obscured_html.find("article-title").unwrap();
        let section = article.obscured_html.find("<section").unwrap();
        assert!(banner < section);
    }

    #[test]
    fn title_banner_words_are_not_body_spans() {
        let article = ArticleBuilder::new()
            .build(day(), "Guerra de Troya", "<p>Nada</p>", &[])
            .unwrap();
        assert_eq!(article.title_tokens, vec!["guerra", "de", "troya"]);
        assert!(!article.tokens.contains_key("guerra"));
        assert_eq!(article.words.len(), 1);
        assert!(!article.obscured_html.contains(r#"id="title-1""#));
        assert!(article.obscured_html.contains(r#"id="title-2">#####</span>"#));
    }

    #[test]
    fn structural_elements_never_contribute_spans() {
        let markup = concat!(
            "<html><head><title>Oculto</title></head><body>",
            r#"<audio src="x.ogg">Audio</audio><div class="vcard">Ficha</div>"#,
            r#"<div class="mw-authority-control">Control</div><p>Visible</p>"#,
            "</body></html>"
        );
        let article = ArticleBuilder::new().build(day(), "X", markup, &[]).unwrap();
        assert_eq!(article.words.values().collect::<Vec<_>>(), vec!["Visible"]);
        assert!(!article.unobscured_html.contains("Ficha"));
    }

    #[test]
    fn obscured_rendering_hides_links_and_images() {
        let markup = concat!(
            r#"<p id="p1" data-mw='{"parts":"Sol"}'><a href="./Sol" title="Sol">astro</a></p>"#,
            r#"<img src="sol.png" srcset="sol2.png 2x" width="120" height="80">"#,
            r#"<img src="luna.png">"#
        );
        let article = ArticleBuilder::new().build(day(), "Sol", markup, &[]).unwrap();

        assert!(!article.obscured_html.contains("data-mw"));
        assert!(!article.obscured_html.contains(r#"id="p1""#));
        assert!(article.obscured_html.contains(r#"href="javascript:void(0);""#));
        assert!(!article.obscured_html.contains(r#"title="Sol""#));
        assert!(article.obscured_html.contains("https://placehold.co/120x80?text=?"));
        assert!(article.obscured_html.contains("https://placehold.co/400x400?text=?"));
        assert!(!article.obscured_html.contains("srcset"));

        assert!(article.unobscured_html.contains(r#"href="./Sol""#));
        assert!(article.unobscured_html.contains("sol.png"));
        assert!(!article.unobscured_html.contains("data-mw"));
    }

    #[test]
    fn obscured_rendering_keeps_no_trace_of_the_title() {
        let markup = concat!(
            r#"<html prefix="dc: http://purl.org/dc/terms/"><head>"#,
            r#"<base href="//es.wikipedia.org/wiki/">"#,
            r#"<link rel="dc:isVersionOf" href="//es.wikipedia.org/wiki/Sistema_solar">"#,
            r#"<title>Sistema solar</title></head><body about="./Sistema_solar">"#,
            r#"<section><p>Los planetas orbitan.</p>"#,
            r#"<figure typeof="mw:File/Thumb"><a href="./Archivo:Sistema_solar.jpg">"#,
            r#"<img resource="./Archivo:Sistema_solar.jpg" src="//upload.example/Sistema_solar.jpg" "#,
            r#"data-file-width="800" data-file-height="600" data-file-type="bitmap" width="220" height="165">"#,
            r#"</a><figcaption>Planetas</figcaption></figure></section></body></html>"#
        );
        let article = ArticleBuilder::new()
            .build(day(), "Sistema solar", markup, &[])
            .unwrap();

        let html = article.obscured_html.to_lowercase();
        assert!(!html.contains("sistema"), "{}", article.obscured_html);
        assert!(!html.contains("solar"), "{}", article.obscured_html);
        assert!(!html.contains("data-file"));
        assert!(!html.contains("<link"));
        assert!(!html.contains("<base"));
        assert!(html.contains("https://placehold.co/220x165?text=?"));
    }

    #[test]
    fn clues_never_contain_title_words() {
        let related = vec![
            "Sistema solar".to_string(),
            "Sol de medianoche".to_string(),
            "Eclipse_solar".to_string(),
        ];
        let article = ArticleBuilder::new()
            .build(day(), "Sol", "<p>x</p>", &related)
            .unwrap();
        assert_eq!(article.clues, vec!["Sistema solar", "Eclipse solar"]);
    }

    #[test]
    fn empty_title_is_rejected() {
        let result = ArticleBuilder::new().build(day(), " _ ", "<p>x</p>", &[]);
        assert!(matches!(result, Err(BuildError::EmptyTitle)));
    }
}

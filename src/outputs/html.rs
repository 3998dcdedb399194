//! HTML renderings of the daily snapshot: the email newsletter body and the
//! public web page.
//!
//! Both read the same [`Newsletter`] document and tolerate empty fields. Every
//! article field is HTML-escaped before it lands in markup.
//!
//! ```text
//! html_output_dir/
//! ├── index.html        (web page)
//! └── newsletter.html   (email body)
//! ```

use crate::models::{Article, Newsletter};
use crate::utils::parse_feed_date;
use quick_xml::escape::escape;
use std::error::Error;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

pub const PAGE_FILE: &str = "index.html";
pub const NEWSLETTER_FILE: &str = "newsletter.html";

/// Summaries longer than this are cut on a word boundary.
const SNIPPET_CHARS: usize = 260;

/// Substituted by the broadcast provider at send time.
const UNSUBSCRIBE_PLACEHOLDER: &str = "{{{RESEND_UNSUBSCRIBE_URL}}}";

const FONT_STACK: &str = "-apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, Cantarell, 'Helvetica Neue', Arial, sans-serif";

/// Summary shortened to [`SNIPPET_CHARS`] characters, dropping the partial last
/// word and appending an ellipsis.
pub fn snippet(summary: &str) -> String {
    if summary.chars().count() <= SNIPPET_CHARS {
        return summary.to_string();
    }
    let head: String = summary.chars().take(SNIPPET_CHARS).collect();
    let cut = head.rfind(' ').map(|i| &head[..i]).unwrap_or("");
    format!("{cut}…")
}

/// First category, else the source, else "Tech".
pub fn category_label(article: &Article) -> &str {
    article
        .categories
        .first()
        .map(String::as_str)
        .filter(|c| !c.trim().is_empty())
        .or_else(|| Some(article.source.as_str()).filter(|s| !s.trim().is_empty()))
        .unwrap_or("Tech")
}

/// Short British date (`6 May 2025`); "Today" when the article has no usable date.
pub fn display_date(published_at: Option<&str>) -> String {
    published_at
        .and_then(parse_feed_date)
        .map(|dt| dt.format("%-d %b %Y").to_string())
        .unwrap_or_else(|| "Today".to_string())
}

fn newsletter_item(out: &mut String, article: &Article) {
    let url = escape(article.url.as_str());
    let summary = snippet(&article.summary);

    writeln!(out, r#"<tr><td style="padding: 28px 0; border-bottom: 1px solid #eeeeee;">"#).unwrap();
    writeln!(
        out,
        r#"<h2 style="margin: 0 0 4px 0; font-size: 19px; line-height: 1.35; font-weight: 600;"><a href="{url}" style="color:#111111; text-decoration:none;">{}</a></h2>"#,
        escape(article.title.as_str())
    )
    .unwrap();
    writeln!(
        out,
        r#"<div style="margin: 0 0 14px 0; font-size: 11px; color: #999999; text-transform: uppercase; letter-spacing: 0.12em;">{} &nbsp; | &nbsp; {}</div>"#,
        display_date(article.published_at.as_deref()),
        escape(category_label(article))
    )
    .unwrap();
    if let Some(image) = article.image_url.as_deref().filter(|s| !s.is_empty()) {
        writeln!(
            out,
            r#"<img src="{}" alt="" style="display:block; width:100%; max-width:100%; border-radius:4px; margin:0 0 12px 0;" />"#,
            escape(image)
        )
        .unwrap();
    }
    if !summary.is_empty() {
        writeln!(
            out,
            r#"<p style="margin: 0 0 8px 0; font-size: 13px; line-height: 1.6; color: #333333;">{}</p>"#,
            escape(summary.as_str())
        )
        .unwrap();
    }
    writeln!(
        out,
        r#"<p style="margin: 0; font-size: 12px;"><a href="{url}" style="color:#999999; text-decoration:none; text-transform:uppercase; font-size: 11px;">Read the full article →</a></p>"#
    )
    .unwrap();
    writeln!(out, "</td></tr>").unwrap();
}

/// Email body, laid out with tables and inline styles for mail clients.
pub fn render_newsletter(newsletter: &Newsletter) -> String {
    let mut out = String::new();
    writeln!(out, "<!doctype html>\n<html>\n<head>").unwrap();
    writeln!(out, r#"<meta charset="utf-8" />"#).unwrap();
    writeln!(out, "<title>{}</title>", escape(newsletter.subject.as_str())).unwrap();
    writeln!(out, "</head>").unwrap();
    writeln!(out, r#"<body style="margin:0; padding:0; background:#f5f5f5;">"#).unwrap();
    writeln!(
        out,
        r#"<table width="100%" cellpadding="0" cellspacing="0" style="padding:24px 0;"><tr><td align="center">"#
    )
    .unwrap();
    writeln!(
        out,
        r#"<table width="640" cellpadding="0" cellspacing="0" style="background:#ffffff; border-radius:8px; padding:24px 24px 18px 24px; font-family: {FONT_STACK};"><tr><td>"#
    )
    .unwrap();
    writeln!(
        out,
        r#"<h1 style="font-size:22px; font-weight:600; letter-spacing:0.06em; text-transform:uppercase; margin:0 0 22px 0;">{}</h1>"#,
        escape(newsletter.subject.as_str())
    )
    .unwrap();
    if !newsletter.intro.trim().is_empty() {
        writeln!(
            out,
            r#"<p style="font-size: 14px; line-height: 1.6; color: #333333; margin: 0 0 12px 0;">{}</p>"#,
            escape(newsletter.intro.trim())
        )
        .unwrap();
    }

    writeln!(out, r#"<table width="100%" cellpadding="0" cellspacing="0">"#).unwrap();
    if newsletter.articles.is_empty() {
        writeln!(
            out,
            r#"<tr><td style="padding: 40px 0; text-align: center; color: #555;"><p style="font-size: 14px; margin: 0;">No new articles today.</p></td></tr>"#
        )
        .unwrap();
    }
    for article in &newsletter.articles {
        newsletter_item(&mut out, article);
    }
    writeln!(out, "</table>").unwrap();

    writeln!(
        out,
        r#"<table width="100%" cellpadding="0" cellspacing="0" style="margin-top:24px;"><tr><td style="padding-top:12px; border-top:1px solid #eeeeee; font-size:11px; color:#999999; line-height:1.5;">"#
    )
    .unwrap();
    writeln!(out, "You’re receiving this email because you subscribed to Tech Digest.<br/>").unwrap();
    writeln!(out, "Links go directly to the original publishers.<br/>").unwrap();
    writeln!(
        out,
        r#"<a href="{UNSUBSCRIBE_PLACEHOLDER}" style="color:#999999; text-decoration:underline;">Unsubscribe</a>"#
    )
    .unwrap();
    writeln!(out, "</td></tr></table>").unwrap();
    writeln!(out, "</td></tr></table>\n</td></tr></table>\n</body>\n</html>").unwrap();
    out
}

const PAGE_STYLE: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body { background: #ffffff; font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, Oxygen, Ubuntu, Cantarell, "Helvetica Neue", Arial, sans-serif; }
.container { max-width: 760px; margin: 0 auto; padding: 10px 72px 60px 72px; }
.header { margin-bottom: 40px; padding-bottom: 5px; border-bottom: 1px solid #000; text-align: center; }
.intro { font-size: 14px; line-height: 1.6; color: #333333; margin-bottom: 24px; }
.article-item { border-bottom: 1px solid #eeeeee; padding: 20px 0; }
.article-header { cursor: pointer; }
.article-title { font-size: 18px; font-weight: 600; line-height: 1.35; }
.article-meta { font-size: 11px; color: #999999; letter-spacing: 0.12em; margin-top: 4px; }
.article-content { display: none; padding-top: 14px; }
.article-content.expanded { display: block; }
.article-image { display: block; width: 100%; border-radius: 4px; margin-bottom: 12px; }
.article-snippet { font-size: 14px; line-height: 1.6; color: #333333; margin-bottom: 8px; }
.article-link a { color: #666666; text-decoration: none; text-transform: uppercase; font-size: 12px; }
.no-articles { padding: 40px 0; text-align: center; color: #666666; }
@media (max-width: 680px) { .container { padding: 40px 16px; } .article-title { font-size: 16px; } }
"#;

const PAGE_SCRIPT: &str = r#"
function toggleArticle(index) {
  const content = document.getElementById("article-" + index);
  const open = content.classList.contains("expanded");
  document.querySelectorAll(".article-content").forEach((el) => el.classList.remove("expanded"));
  if (!open) content.classList.add("expanded");
}
"#;

fn page_item(out: &mut String, idx: usize, article: &Article) {
    let summary = snippet(&article.summary);

    writeln!(out, r#"<article class="article-item">"#).unwrap();
    writeln!(out, r#"<div class="article-header" onclick="toggleArticle({idx})">"#).unwrap();
    writeln!(out, r#"<h2 class="article-title">{}</h2>"#, escape(article.title.as_str())).unwrap();
    writeln!(
        out,
        r#"<div class="article-meta">{} &nbsp; | &nbsp; {}</div>"#,
        display_date(article.published_at.as_deref()).to_uppercase(),
        escape(category_label(article).to_uppercase().as_str())
    )
    .unwrap();
    writeln!(out, "</div>").unwrap();
    writeln!(out, r#"<div class="article-content" id="article-{idx}">"#).unwrap();
    if let Some(image) = article.image_url.as_deref().filter(|s| !s.is_empty()) {
        writeln!(out, r#"<img src="{}" alt="" class="article-image" />"#, escape(image)).unwrap();
    }
    if !summary.is_empty() {
        writeln!(out, r#"<p class="article-snippet">{}</p>"#, escape(summary.as_str())).unwrap();
    }
    writeln!(
        out,
        r#"<p class="article-link"><a href="{}" target="_blank" rel="noopener noreferrer">Read the full article →</a></p>"#,
        escape(article.url.as_str())
    )
    .unwrap();
    writeln!(out, "</div>\n</article>").unwrap();
}

/// Public web page; each article expands on click.
pub fn render_page(newsletter: &Newsletter) -> String {
    let mut out = String::new();
    writeln!(out, "<!doctype html>\n<html lang=\"en\">\n<head>").unwrap();
    writeln!(out, r#"<meta charset="utf-8" />"#).unwrap();
    writeln!(out, r#"<meta name="viewport" content="width=device-width, initial-scale=1.0" />"#).unwrap();
    writeln!(out, "<title>{}</title>", escape(newsletter.subject.as_str())).unwrap();
    writeln!(out, "<style>{PAGE_STYLE}</style>\n</head>").unwrap();
    writeln!(out, "<body>\n<div class=\"container\">").unwrap();
    writeln!(
        out,
        r#"<header class="header"><h1>{}</h1><p>{}</p></header>"#,
        escape(newsletter.subject.as_str()),
        escape(newsletter.date.as_str())
    )
    .unwrap();
    if !newsletter.intro.trim().is_empty() {
        writeln!(out, r#"<p class="intro">{}</p>"#, escape(newsletter.intro.trim())).unwrap();
    }

    writeln!(out, "<main>").unwrap();
    if newsletter.articles.is_empty() {
        writeln!(out, r#"<div class="no-articles"><p>No new articles today.</p></div>"#).unwrap();
    }
    for (idx, article) in newsletter.articles.iter().enumerate() {
        page_item(&mut out, idx, article);
    }
    writeln!(out, "</main>\n</div>").unwrap();
    writeln!(out, "<script>{PAGE_SCRIPT}</script>\n</body>\n</html>").unwrap();
    out
}

/// Write `index.html` and `newsletter.html` into `html_output_dir`.
#[instrument(level = "info", skip_all, fields(html_output_dir = %html_output_dir.display()))]
pub async fn write_html(
    newsletter: &Newsletter,
    html_output_dir: &Path,
) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(html_output_dir).await {
        error!(error = %e, "Failed to create HTML dir");
        return Err(e.into());
    }

    let mut written = Vec::new();
    for (file, html) in [
        (PAGE_FILE, render_page(newsletter)),
        (NEWSLETTER_FILE, render_newsletter(newsletter)),
    ] {
        let path = html_output_dir.join(file);
        fs::write(&path, html).await?;
        info!(path = %path.display(), "Wrote HTML file");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> Article {
        Article {
            title: "Robot arm achieves sub-millimeter precision".into(),
            url: "https://spectrum.ieee.org/arm?a=1&b=2".into(),
            summary: "A new arm.".into(),
            image_url: Some("https://spectrum.ieee.org/arm.jpg".into()),
            categories: vec!["Robotics".into()],
            published_at: Some("2025-05-06T14:30:00.000Z".into()),
            source: "IEEE Spectrum — Robotics".into(),
        }
    }

    fn newsletter(articles: Vec<Article>) -> Newsletter {
        Newsletter {
            date: "2025-05-06".into(),
            subject: "Your Tech Digest".into(),
            intro: "Curated news.".into(),
            articles,
        }
    }

    #[test]
    fn test_snippet_cuts_on_word_boundary() {
        assert_eq!(snippet("short"), "short");
        let long = "word ".repeat(60);
        let cut = snippet(&long);
        assert!(cut.ends_with("word…"));
        assert!(cut.chars().count() <= SNIPPET_CHARS + 1);
        assert_eq!(snippet(&"x".repeat(300)), "…");
    }

    #[test]
    fn test_category_label_fallbacks() {
        let mut a = article();
        assert_eq!(category_label(&a), "Robotics");
        a.categories.clear();
        assert_eq!(category_label(&a), "IEEE Spectrum — Robotics");
        a.source.clear();
        assert_eq!(category_label(&a), "Tech");
    }

    #[test]
    fn test_display_date() {
        assert_eq!(display_date(Some("2025-05-06T14:30:00.000Z")), "6 May 2025");
        assert_eq!(display_date(None), "Today");
        assert_eq!(display_date(Some("garbage")), "Today");
    }

    #[test]
    fn test_render_newsletter_escapes_and_skips_missing_image() {
        let mut a = article();
        a.title = "Chips <script>alert(1)</script> & more".into();
        a.image_url = None;
        a.summary.clear();

        let html = render_newsletter(&newsletter(vec![a]));
        assert!(html.contains("Chips &lt;script&gt;alert(1)&lt;/script&gt; &amp; more"));
        assert!(!html.contains("<script>"));
        assert!(html.contains(r#"href="https://spectrum.ieee.org/arm?a=1&amp;b=2""#));
        assert!(!html.contains("<img"));
        assert!(html.contains("6 May 2025 &nbsp; | &nbsp; Robotics"));
        assert!(html.contains(UNSUBSCRIBE_PLACEHOLDER));
    }

    #[test]
    fn test_render_empty_snapshot() {
        let doc = newsletter(vec![]);
        assert!(render_newsletter(&doc).contains("No new articles today."));
        assert!(render_page(&doc).contains("No new articles today."));
    }

    #[test]
    fn test_render_page_uppercases_meta() {
        let mut a = article();
        a.published_at = None;
        let html = render_page(&newsletter(vec![a]));
        assert!(html.contains("TODAY &nbsp; | &nbsp; ROBOTICS"));
        assert!(html.contains(r#"id="article-0""#));
        assert!(html.contains(r#"<img src="https://spectrum.ieee.org/arm.jpg""#));
        assert!(html.contains(r#"<p class="intro">Curated news.</p>"#));
    }

    #[tokio::test]
    async fn test_write_html() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("site");
        let written = write_html(&newsletter(vec![article()]), &dir).await.unwrap();
        assert_eq!(written, vec![dir.join(PAGE_FILE), dir.join(NEWSLETTER_FILE)]);
        for path in written {
            let html = std::fs::read_to_string(path).unwrap();
            assert!(html.contains("Robot arm achieves sub-millimeter precision"));
        }
    }
}

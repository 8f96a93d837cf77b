//! HTML → text helpers shared by the page-loading strategies.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

/// Elements removed by the raw-HTML fallback before collecting text.
pub const FALLBACK_STRIP_TAGS: &[&str] = &["script", "style", "header", "footer", "nav"];

/// Elements whose text content is never visible on the page.
const INVISIBLE_TAGS: &[&str] = &["script", "style", "noscript", "template"];

static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").expect("body selector is valid"));

/// Detaches every element matching any of `selectors` from the tree.
/// Invalid selectors are skipped with a warning. Returns the number of
/// matched elements.
pub fn remove_selectors(document: &mut Html, selectors: &[&str]) -> usize {
    let mut ids = Vec::new();
    for raw in selectors {
        match Selector::parse(raw) {
            Ok(selector) => ids.extend(document.select(&selector).map(|el| el.id())),
            Err(_) => warn!("Skipping invalid CSS selector '{raw}'"),
        }
    }

    let matched = ids.len();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
    matched
}

/// Trimmed, non-empty visible text nodes under `root`, in document order.
pub fn stripped_strings(root: ElementRef<'_>) -> Vec<String> {
    root.descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| INVISIBLE_TAGS.contains(&el.name()))
            });
            let trimmed = text.trim();
            (!hidden && !trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect()
}

/// Parses `html`, removes `selectors`, and returns the body's visible text
/// newline-joined (falls back to the whole document when there is no body).
pub fn visible_text(html: &str, selectors: &[&str]) -> String {
    let mut document = Html::parse_document(html);
    remove_selectors(&mut document, selectors);

    let root = document
        .select(&BODY)
        .next()
        .unwrap_or_else(|| document.root_element());
    stripped_strings(root).join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_text_strips_fallback_tags() {
        let html = "<body><header>X</header><p>Real Content</p></body>";
        assert_eq!(visible_text(html, FALLBACK_STRIP_TAGS), "Real Content");
    }

    #[test]
    fn test_visible_text_skips_scripts_even_without_selectors() {
        let html = "<html><head><title>T</title></head><body>\
            <script>var x = 1;</script><h1> Role </h1><noscript>enable js</noscript>\
            <p>Build   things</p></body></html>";
        assert_eq!(visible_text(html, &[]), "Role\nBuild   things");
    }

    #[test]
    fn test_remove_selectors_by_class_and_id() {
        let mut doc = Html::parse_document(
            r#"<body><div class="cookie-banner">Accept</div><div id="main">Job</div><aside class="ad">Buy</aside></body>"#,
        );
        let removed = remove_selectors(&mut doc, &[".cookie-banner", ".ad"]);
        assert_eq!(removed, 2);
        let body = doc.select(&BODY).next().unwrap();
        assert_eq!(stripped_strings(body), vec!["Job"]);
    }

    #[test]
    fn test_remove_selectors_skips_invalid() {
        let mut doc = Html::parse_document("<body><p>Keep</p></body>");
        assert_eq!(remove_selectors(&mut doc, &["[[[", "footer"]), 0);
        assert_eq!(visible_text("<body><p>Keep</p></body>", &["[[["]), "Keep");
    }

    #[test]
    fn test_nested_matches_are_removed_once() {
        let html = "<body><nav><nav>inner</nav></nav><p>text</p></body>";
        assert_eq!(visible_text(html, &["nav"]), "text");
    }
}

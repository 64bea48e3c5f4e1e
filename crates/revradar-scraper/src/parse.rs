//! Pure extraction of branch cards from directory search HTML.
//!
//! Both resolver strategies — static HTTP bodies and rendered-page
//! snapshots — feed the same HTML through here, so the two paths cannot
//! drift apart and tests never need a browser.

use scraper::{ElementRef, Html, Selector};

use revradar_core::{clean_text, Branch};

use crate::selectors;

/// Parses a CSS selector, degrading to `None` on an invalid expression.
///
/// All selectors in this crate are constants; an invalid one shows up as an
/// empty extraction plus a log line rather than a panic in the middle of a
/// batch.
fn sel(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::error!(css, error = %e, "invalid selector constant");
            None
        }
    }
}

fn first_text(scope: ElementRef<'_>, css: &str) -> Option<String> {
    let selector = sel(css)?;
    let el = scope.select(&selector).next()?;
    Some(el.text().collect::<String>())
}

/// Extracts all branch cards from a directory search page.
///
/// The company display name (and an optional disambiguator span) are read
/// once, from the first card only, and reused for every card in the batch —
/// all cards in one resolution belong to one company. With a disambiguator
/// the company name becomes `"{name}, {disambiguator}"` with the first
/// letter capitalized.
///
/// Cards missing a link or display name are skipped with a warning; a page
/// with no cards yields an empty vec (the caller treats that as "not
/// found", never as a failure).
pub fn extract_branch_cards(html: &str) -> Vec<Branch> {
    let doc = Html::parse_document(html);
    let Some(card_sel) = sel(selectors::BRANCH_CARD) else {
        return Vec::new();
    };

    let mut company_name: Option<String> = None;
    let mut branches = Vec::new();

    for card in doc.select(&card_sel) {
        if company_name.is_none() {
            company_name = Some(company_name_from_card(card));
        }

        let Some(link) = card_link(card) else {
            tracing::warn!("branch card without a deep link — skipping");
            continue;
        };
        let Some(name) = first_text(card, selectors::CARD_BRANCH_NAME) else {
            tracing::warn!(link, "branch card without a display name — skipping");
            continue;
        };

        let id = branch_id_from_link(&link);
        if id.is_empty() {
            tracing::warn!(link, "branch card link has no id segment — skipping");
            continue;
        }

        branches.push(Branch {
            id,
            name: clean_text(&name),
            link,
            company_name: company_name.clone().unwrap_or_default(),
        });
    }

    branches
}

/// True when the page carries the known "no results" marker fragment.
pub fn has_empty_results_marker(html: &str) -> bool {
    let doc = Html::parse_document(html);
    sel(selectors::EMPTY_RESULTS)
        .map(|s| doc.select(&s).next().is_some())
        .unwrap_or(false)
}

/// Company name from the first card: display name plus the optional
/// disambiguator span. A card without a readable company name degrades to
/// an empty string with a warning.
fn company_name_from_card(card: ElementRef<'_>) -> String {
    let Some(name) = first_text(card, selectors::CARD_COMPANY_NAME) else {
        tracing::warn!("first branch card has no company name span");
        return String::new();
    };
    let name = clean_text(&name);

    match first_text(card, selectors::CARD_DISAMBIGUATOR) {
        Some(extra) if !clean_text(&extra).is_empty() => {
            capitalize_first(&format!("{name}, {}", clean_text(&extra)))
        }
        _ => name,
    }
}

/// The branch deep link with any query string stripped.
fn card_link(card: ElementRef<'_>) -> Option<String> {
    let selector = sel(selectors::CARD_LINK)?;
    let anchor = card.select(&selector).next()?;
    let href = anchor.value().attr("href")?;
    Some(href.split('?').next().unwrap_or(href).to_owned())
}

/// Stable upstream branch id: the last path segment of the deep link.
fn branch_id_from_link(link: &str) -> String {
    link.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("")
        .to_owned()
}

/// Uppercases the first letter, leaving the rest untouched.
fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(link: &str, branch_name: &str, company: &str, extra: &str) -> String {
        let extra_span = if extra.is_empty() {
            String::new()
        } else {
            format!(r#"<span class="_oqoid">{extra}</span>"#)
        };
        format!(
            r#"<div class="_1kf6gff">
                 <div><span class="_1al0wlf"><span>{company}</span></span>{extra_span}</div>
                 <div class="_zjunba"><a href="{link}?m=1">go</a></div>
                 <div class="_klarpw"><span class="_1w9o2igt"> {branch_name} </span></div>
               </div>"#
        )
    }

    #[test]
    fn extracts_cards_with_shared_company_name() {
        let html = format!(
            "<html><body>{}{}</body></html>",
            card("/ufa/firm/111", "Acme Pizza Center", "acme pizza", ""),
            card("/ufa/firm/222", "Acme Pizza North", "ignored later", "")
        );
        let branches = extract_branch_cards(&html);
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0].id, "111");
        assert_eq!(branches[1].id, "222");
        // Company name comes from the first card only.
        assert!(branches.iter().all(|b| b.company_name == "acme pizza"));
        assert_eq!(branches[0].link, "/ufa/firm/111");
        assert_eq!(branches[0].name, "Acme Pizza Center");
    }

    #[test]
    fn disambiguator_is_appended_and_capitalized() {
        let html = card("/ufa/firm/333", "Acme", "acme pizza", "delivery");
        let branches = extract_branch_cards(&html);
        assert_eq!(branches[0].company_name, "Acme pizza, delivery");
    }

    #[test]
    fn link_query_string_is_stripped_before_id_extraction() {
        let html = card("/ufa/firm/4567", "Acme", "Acme", "");
        let branches = extract_branch_cards(&html);
        assert_eq!(branches[0].id, "4567");
        assert!(!branches[0].link.contains('?'));
    }

    #[test]
    fn page_without_cards_yields_empty_vec() {
        let branches = extract_branch_cards("<html><body><p>nothing</p></body></html>");
        assert!(branches.is_empty());
    }

    #[test]
    fn card_without_link_is_skipped() {
        let html = r#"<div class="_1kf6gff">
             <div><span class="_1al0wlf"><span>Acme</span></span></div>
             <div class="_klarpw"><span class="_1w9o2igt">No Link Here</span></div>
           </div>"#;
        assert!(extract_branch_cards(html).is_empty());
    }

    #[test]
    fn detects_empty_results_marker() {
        assert!(has_empty_results_marker(
            r#"<div class="_1wpb8t2">nothing found</div>"#
        ));
        assert!(!has_empty_results_marker("<div>results</div>"));
    }

    #[test]
    fn every_branch_has_nonempty_id_and_name() {
        let html = format!(
            "{}{}",
            card("/ufa/firm/1", "A", "Acme", ""),
            card("/ufa/firm/2", "B", "Acme", "")
        );
        for b in extract_branch_cards(&html) {
            assert!(!b.id.is_empty());
            assert!(!b.name.is_empty());
        }
    }
}

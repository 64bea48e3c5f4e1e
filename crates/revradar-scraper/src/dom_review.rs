//! Structural extraction of a single review from a rendered DOM fragment.
//!
//! This path produces the degraded review shape: no `id`, no `rating`.
//! Two comment-text markup variants exist upstream; the primary location is
//! tried first and the secondary used as a fallback. Optional pieces
//! (photos, reply) are probed, never demanded — absence is expected.

use scraper::{ElementRef, Html, Selector};

use revradar_core::{clean_text, Review, Reply};

use crate::error::ScraperError;
use crate::selectors;

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
    Some(clean_text(&el.text().collect::<String>()))
}

/// Extracts one review from a rendered review-card fragment.
///
/// # Errors
///
/// Returns [`ScraperError::StructuralMismatch`] only when the comment text
/// is absent from BOTH known markup locations — every other field degrades
/// to empty/`None`.
pub fn extract_review(fragment_html: &str) -> Result<Review, ScraperError> {
    let doc = Html::parse_document(fragment_html);
    let root = doc.root_element();

    let author = first_text(root, selectors::REVIEW_AUTHOR).unwrap_or_default();
    let date = first_text(root, selectors::REVIEW_DATE).unwrap_or_default();

    let text = first_text(root, selectors::REVIEW_TEXT)
        .or_else(|| first_text(root, selectors::REVIEW_TEXT_FALLBACK))
        .ok_or_else(|| ScraperError::StructuralMismatch {
            what: "review comment text (both markup variants)".to_owned(),
        })?;

    let photos = photo_urls(root);
    let reply = extract_reply(root);

    Ok(Review {
        id: None,
        author,
        date,
        rating: None,
        photos,
        text,
        reply,
    })
}

/// Extracts every review card from a full rendered-page snapshot.
///
/// A card whose comment text is missing is skipped with a warning; one
/// rotted card should not cost the rest of the page.
pub fn extract_reviews(page_html: &str) -> Vec<Review> {
    let doc = Html::parse_document(page_html);
    let Some(card_sel) = sel(selectors::REVIEW_CARD) else {
        return Vec::new();
    };

    let mut reviews = Vec::new();
    for card in doc.select(&card_sel) {
        match extract_review(&card.html()) {
            Ok(review) => reviews.push(review),
            Err(err) => tracing::warn!(error = %err, "review card skipped"),
        }
    }
    reviews
}

/// `src` attributes of uploaded review photos, in document order.
fn photo_urls(root: ElementRef<'_>) -> Vec<String> {
    let Some(selector) = sel(selectors::REVIEW_PHOTO) else {
        return Vec::new();
    };
    root.select(&selector)
        .filter_map(|img| img.value().attr("src"))
        .map(str::to_owned)
        .collect()
}

/// Probes the nested official-reply block. Absence is not an error.
///
/// The reply date span carries trailing annotations after a comma
/// ("12 June 2024, edited"); only the first comma-delimited segment is the
/// date.
fn extract_reply(root: ElementRef<'_>) -> Option<Reply> {
    let block_sel = sel(selectors::REPLY_BLOCK)?;
    let block = root.select(&block_sel).next()?;

    let author = first_text(block, selectors::REPLY_AUTHOR)?;
    let date_raw = first_text(block, selectors::REPLY_DATE)?;
    let text = first_text(block, selectors::REPLY_TEXT)?;

    let date = date_raw
        .split(',')
        .next()
        .unwrap_or(&date_raw)
        .trim()
        .to_owned();

    Some(Reply { author, date, text })
}

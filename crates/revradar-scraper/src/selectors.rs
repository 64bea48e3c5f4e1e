//! CSS selectors observed in the upstream directory's generated markup.
//!
//! The class names are build artifacts of the upstream bundler and change
//! without notice; they are collected here so a markup break is a
//! one-file fix. No stability is guaranteed.

/// One branch "card" in directory search results.
pub const BRANCH_CARD: &str = "div._1kf6gff";
/// Company display name inside the first card.
pub const CARD_COMPANY_NAME: &str = "div span._1al0wlf span";
/// Optional disambiguator span next to the company name.
pub const CARD_DISAMBIGUATOR: &str = "span._oqoid";
/// Anchor carrying the branch deep link.
pub const CARD_LINK: &str = "div._zjunba a";
/// Branch display name.
pub const CARD_BRANCH_NAME: &str = "div._klarpw span._1w9o2igt";
/// Marker fragment present on an exhausted/empty results page.
pub const EMPTY_RESULTS: &str = "div._1wpb8t2";

/// Pagination control strip on rendered search pages.
pub const PAGINATION: &str = "._5ocwns";
/// The "next page" child of the pagination strip.
pub const PAGINATION_NEXT: &str = "._5ocwns > *:nth-child(2)";
/// Class carried by the next-page control while it is clickable.
pub const PAGINATION_ACTIVE_CLASS: &str = "_n5hmn94";

/// Cookie-consent interstitial dismiss control.
pub const INTERSTITIAL_DISMISS: &str = "._euwdl0";
/// "Load more reviews" control on a branch reviews tab.
pub const LOAD_MORE: &str = "._1iczexgz";

/// One review fragment on a rendered reviews tab.
pub const REVIEW_CARD: &str = "._11gvyqv";
/// Review author name.
pub const REVIEW_AUTHOR: &str = "div._1wz5xvq span._16s5yj36";
/// Review date display text.
pub const REVIEW_DATE: &str = "div._4mwq3d";
/// Uploaded review photos.
pub const REVIEW_PHOTO: &str = "img._1env6hv";
/// Review comment text, primary markup variant.
pub const REVIEW_TEXT: &str = "div._49x36f a._ayej9u3";
/// Review comment text, secondary markup variant.
pub const REVIEW_TEXT_FALLBACK: &str = "a._1it5ivp";
/// Official business reply block.
pub const REPLY_BLOCK: &str = "div._sgs1pz";
/// Reply author inside the reply block.
pub const REPLY_AUTHOR: &str = "div._y7bbr0 span";
/// Reply date inside the reply block.
pub const REPLY_DATE: &str = "div._1fw4r5p";
/// Reply text inside the reply block.
pub const REPLY_TEXT: &str = "div._j1il10";

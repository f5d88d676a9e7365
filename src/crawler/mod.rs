//! Network side of the harvester
//!
//! A single rate-limited [`PageFetcher`] is shared by the source clients and
//! the listing walker; [`DelayWindow`] supplies the randomized politeness
//! waits between pages and entities.

pub mod delay;
pub mod fetcher;
pub mod listing;
pub mod source;

pub use delay::DelayWindow;
pub use fetcher::{FetchedPage, PageFetcher};
pub use listing::{ListingWalk, ListingWalker};
pub use source::{HtmlReviewClient, SourceClient, XmlApiClient};

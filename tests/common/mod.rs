//! Common test utilities

#![allow(dead_code)]

use review_harvester::config::Config;
use review_harvester::models::ParentEntity;

/// Long enough for reliable English detection
pub const ENGLISH_REVIEW: &str =
    "The sales team was friendly and honest, and they answered every question we had about the car.";
pub const ENGLISH_COMMENT: &str =
    "This is a wonderful game that my whole family enjoys playing together every weekend.";
pub const FRENCH_COMMENT: &str =
    "Un jeu vraiment excellent que toute la famille adore jouer ensemble chaque semaine.";

/// Configuration pointed at a mock server, without politeness delays
pub fn test_config(server_uri: &str) -> Config {
    let mut config = Config::default();
    config.http.max_requests_per_second = 1000;
    config.http.request_timeout_secs = 5;
    config.delays.page_min_secs = 0.0;
    config.delays.page_max_secs = 0.0;
    config.delays.entity_min_secs = 0.0;
    config.delays.entity_max_secs = 0.0;
    config.html.base_url = server_uri.to_string();
    config.html.listing_url = format!("{server_uri}/directory/");
    config.api.endpoint_template =
        format!("{server_uri}/xmlapi2/thing?id={{id}}&comments=1&page={{page}}");
    config
}

pub fn game(id: &str, name: &str, rank: u64) -> ParentEntity {
    ParentEntity::new(id, name, id, rank)
}

/// `thing` response with the given `(rating, text)` comments
pub fn bgg_page(id: &str, name: &str, page: u32, comments: &[(&str, &str)]) -> String {
    let body: String = comments
        .iter()
        .enumerate()
        .map(|(i, (rating, text))| {
            format!(r#"<comment username="user{i}" rating="{rating}" value="{text}"/>"#)
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<items termsofuse="https://boardgamegeek.com/xmlapi/termsofuse">
  <item type="boardgame" id="{id}">
    <name type="primary" sortindex="1" value="{name}"/>
    <comments page="{page}" totalitems="999">{body}</comments>
  </item>
</items>"#
    )
}

/// Review detail page using the default selectors; `rating` is out of 50
pub fn review_page(name: &str, reviews: &[(u32, &str, &str)], next: Option<&str>) -> String {
    let entries: String = reviews
        .iter()
        .map(|(rating, title, text)| {
            format!(
                r#"<div class="review-entry">
                     <div class="rating-static rating-{rating}"></div>
                     <h3 class="review-title">{title}</h3>
                     <p class="review-content">{text}</p>
                   </div>"#
            )
        })
        .collect();
    let next = next
        .map(|href| format!(r#"<a class="next" href="{href}">Next</a>"#))
        .unwrap_or_default();
    format!("<html><body><h1>{name}</h1>{entries}{next}</body></html>")
}

/// Listing page using the default selectors
pub fn listing_page(entries: &[(&str, &str, &str)], next: Option<&str>) -> String {
    let items: String = entries
        .iter()
        .map(|(name, href, count)| {
            format!(
                r#"<div class="dealer-info">
                     <a class="dealer-name" href="{href}">{name}</a>
                     <span class="review-count">{count}</span>
                   </div>"#
            )
        })
        .collect();
    let next = next
        .map(|href| format!(r#"<a class="next" href="{href}">Next</a>"#))
        .unwrap_or_default();
    format!("<html><body>{items}{next}</body></html>")
}

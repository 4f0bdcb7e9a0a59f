//! Catalog provider for the Marvel SNAP Zone JSON API.
//!
//! Both endpoints answer with `{"success": {"cards": [...]}}`; the locations
//! endpoint reuses the `cards` key for its items.

use crate::catalog::{CatalogEntry, Category};
use crate::error::CatalogError;
use serde::Deserialize;
use tracing::{info, warn};

pub const CARDS_API_URL: &str =
    "https://marvelsnapzone.com/getinfo/?searchtype=cards&searchcardstype=true";
pub const LOCATIONS_API_URL: &str =
    "https://marvelsnapzone.com/getinfo/?searchtype=locations&searchcardstype=true";

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    success: ApiPayload,
}

#[derive(Debug, Default, Deserialize)]
struct ApiPayload {
    #[serde(default)]
    cards: Vec<ApiItem>,
}

#[derive(Debug, Deserialize)]
pub struct ApiItem {
    #[serde(default)]
    art: Option<String>,
    #[serde(default)]
    variants: Vec<ApiVariant>,
}

#[derive(Debug, Deserialize)]
struct ApiVariant {
    #[serde(default)]
    art: Option<String>,
}

pub struct SnapCatalog<'a> {
    client: &'a reqwest::Client,
    cards_url: &'a str,
    locations_url: &'a str,
}

impl<'a> SnapCatalog<'a> {
    pub fn new(client: &'a reqwest::Client, cards_url: &'a str, locations_url: &'a str) -> Self {
        Self {
            client,
            cards_url,
            locations_url,
        }
    }

    /// Fetch both endpoints and flatten them into catalog entries.
    ///
    /// A failing endpoint is logged and contributes no entries.
    pub async fn entries(&self) -> Vec<CatalogEntry> {
        let mut entries = Vec::new();

        match fetch_items(self.client, self.cards_url).await {
            Ok(cards) => entries.extend(card_entries(cards)),
            Err(e) => warn!(url = self.cards_url, "Error retrieving cards: {}", e),
        }

        match fetch_items(self.client, self.locations_url).await {
            Ok(locations) => entries.extend(location_entries(locations)),
            Err(e) => warn!(url = self.locations_url, "Error retrieving locations: {}", e),
        }

        entries
    }
}

async fn fetch_items(client: &reqwest::Client, url: &str) -> Result<Vec<ApiItem>, CatalogError> {
    info!(url, "Retrieving catalog");

    let response = client
        .get(url)
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(|source| CatalogError::Request {
            url: url.to_string(),
            source,
        })?;

    if !response.status().is_success() {
        return Err(CatalogError::Status {
            status: response.status(),
            url: url.to_string(),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|source| CatalogError::Request {
            url: url.to_string(),
            source,
        })?;

    let items = parse_items(&body)?;
    info!(url, count = items.len(), "Finished retrieving catalog");
    Ok(items)
}

pub fn parse_items(json: &str) -> Result<Vec<ApiItem>, CatalogError> {
    let response: ApiResponse = serde_json::from_str(json)?;
    Ok(response.success.cards)
}

/// Card art under `Cards`, variant art under `Variants`, in card order.
pub fn card_entries(cards: Vec<ApiItem>) -> Vec<CatalogEntry> {
    let mut entries = Vec::with_capacity(cards.len());
    for card in cards {
        entries.push(CatalogEntry::new(Category::Cards, usable_art(card.art)));
        entries.extend(
            card.variants
                .into_iter()
                .map(|variant| CatalogEntry::new(Category::Variants, usable_art(variant.art))),
        );
    }
    entries
}

pub fn location_entries(locations: Vec<ApiItem>) -> Vec<CatalogEntry> {
    locations
        .into_iter()
        .map(|location| CatalogEntry::new(Category::Locations, usable_art(location.art)))
        .collect()
}

fn usable_art(art: Option<String>) -> Option<String> {
    art.map(|a| a.trim().to_string()).filter(|a| !a.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CARDS_JSON: &str = r#"{
        "success": {
            "cards": [
                {
                    "name": "Iron Man",
                    "art": "https://static.example/cards/IronMan.webp?v=12",
                    "variants": [
                        {"art": "https://static.example/variants/IronMan_01.webp"},
                        {"art": ""}
                    ]
                },
                {"name": "Hulk", "art": null},
                {"name": "Medusa", "art": "https://static.example/cards/Medusa.webp"}
            ]
        }
    }"#;

    #[test]
    fn test_card_entries_split_cards_and_variants() {
        let entries = card_entries(parse_items(CARDS_JSON).unwrap());

        let cards: Vec<_> = entries
            .iter()
            .filter(|e| e.category == Category::Cards)
            .map(|e| e.url.as_deref())
            .collect();
        assert_eq!(
            cards,
            vec![
                Some("https://static.example/cards/IronMan.webp?v=12"),
                None,
                Some("https://static.example/cards/Medusa.webp"),
            ]
        );

        let variants: Vec<_> = entries
            .iter()
            .filter(|e| e.category == Category::Variants)
            .map(|e| e.url.as_deref())
            .collect();
        assert_eq!(
            variants,
            vec![Some("https://static.example/variants/IronMan_01.webp"), None]
        );
    }

    #[test]
    fn test_missing_success_payload_is_empty() {
        assert!(parse_items(r#"{"error": "nope"}"#).unwrap().is_empty());
        assert!(parse_items("not json").is_err());
    }

    #[tokio::test]
    async fn test_entries_survive_failing_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/getinfo/"))
            .and(query_param("searchtype", "cards"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/getinfo/"))
            .and(query_param("searchtype", "locations"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"success": {"cards": [{"art": "https://static.example/locations/Asgard.webp"}]}}"#,
            ))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let cards_url = format!("{}/getinfo/?searchtype=cards", server.uri());
        let locations_url = format!("{}/getinfo/?searchtype=locations", server.uri());
        let entries = SnapCatalog::new(&client, &cards_url, &locations_url)
            .entries()
            .await;

        assert_eq!(
            entries,
            vec![CatalogEntry::new(
                Category::Locations,
                Some("https://static.example/locations/Asgard.webp".to_string())
            )]
        );
    }
}

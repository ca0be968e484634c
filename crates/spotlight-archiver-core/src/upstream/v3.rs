use log::debug;
use serde::Deserialize;

use super::{decode_items, select_urls};
use crate::error::Result;
use crate::types::{Entry, Orientation};

#[derive(Debug, Default, Deserialize)]
struct Item {
    #[serde(default)]
    ad: Ad,
}

#[derive(Debug, Default, Deserialize)]
struct Ad {
    image_fullscreen_001_landscape: Option<Asset>,
    image_fullscreen_001_portrait: Option<Asset>,
    title_text: Option<Text>,
    copyright_text: Option<Text>,
}

#[derive(Debug, Deserialize)]
struct Asset {
    u: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Text {
    tx: Option<String>,
}

/// Parse a v3 `Delivery/Placement` response body
pub fn parse_entries(body: &str, orientation: Orientation) -> Result<Vec<Entry>> {
    let items: Vec<Item> = decode_items(body)?;

    let entries = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let ad = item.ad;
            let (landscape_url, portrait_url) = select_urls(
                orientation,
                ad.image_fullscreen_001_landscape.and_then(|a| a.u),
                ad.image_fullscreen_001_portrait.and_then(|a| a.u),
            );
            let entry = Entry {
                landscape_url,
                portrait_url,
                title: ad.title_text.and_then(|t| t.tx),
                copyright: ad.copyright_text.and_then(|t| t.tx),
                caption_title: None,
                caption_description: None,
            };
            debug!("Picture metadata {}: {:?}", i + 1, entry);
            entry
        })
        .collect();

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> String {
        let item = serde_json::json!({
            "ad": {
                "image_fullscreen_001_landscape": { "u": "https://img-s.msn.com/tenant/amp/entityid/AAA.img" },
                "image_fullscreen_001_portrait": { "u": "https://img-s.msn.com/tenant/amp/entityid/BBB.img" },
                "title_text": { "tx": "Lake Bled, Slovenia" },
                "copyright_text": { "tx": "© Photographer / Getty Images" }
            }
        });
        serde_json::json!({
            "batchrsp": { "items": [ { "item": item.to_string() } ] }
        })
        .to_string()
    }

    #[test]
    fn parses_landscape_entry() {
        let entries = parse_entries(&body(), Orientation::Landscape).unwrap();
        assert_eq!(entries.len(), 1);

        let entry = &entries[0];
        assert_eq!(
            entry.landscape_url.as_deref(),
            Some("https://img-s.msn.com/tenant/amp/entityid/AAA.img")
        );
        assert_eq!(entry.portrait_url, None);
        assert_eq!(entry.title.as_deref(), Some("Lake Bled, Slovenia"));
        assert_eq!(
            entry.copyright.as_deref(),
            Some("© Photographer / Getty Images")
        );
    }

    #[test]
    fn parses_both_orientations() {
        let entries = parse_entries(&body(), Orientation::Both).unwrap();
        assert!(entries[0].landscape_url.is_some());
        assert!(entries[0].portrait_url.is_some());
    }

    #[test]
    fn missing_fields_stay_empty() {
        let body = serde_json::json!({
            "batchrsp": { "items": [ { "item": "{}" } ] }
        })
        .to_string();

        let entries = parse_entries(&body, Orientation::Both).unwrap();
        assert_eq!(entries, vec![Entry::default()]);
    }
}

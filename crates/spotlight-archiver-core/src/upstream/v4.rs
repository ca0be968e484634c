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
#[serde(rename_all = "camelCase")]
struct Ad {
    landscape_image: Option<Asset>,
    portrait_image: Option<Asset>,
    icon_hover_text: Option<String>,
    copyright: Option<String>,
    title: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Asset {
    asset: Option<String>,
}

/// Parse a v4 `api/selection` response body
pub fn parse_entries(body: &str, orientation: Orientation) -> Result<Vec<Entry>> {
    let items: Vec<Item> = decode_items(body)?;

    let entries = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let ad = item.ad;
            let (landscape_url, portrait_url) = select_urls(
                orientation,
                ad.landscape_image.and_then(|a| a.asset),
                ad.portrait_image.and_then(|a| a.asset),
            );
            let entry = Entry {
                landscape_url,
                portrait_url,
                title: ad.icon_hover_text.as_deref().map(picture_title),
                copyright: ad.copyright,
                caption_title: ad.title,
                caption_description: ad.description,
            };
            debug!("Picture metadata {}: {:?}", i + 1, entry);
            entry
        })
        .collect();

    Ok(entries)
}

/// The hover text carries the title on its first line
fn picture_title(hover: &str) -> String {
    hover.split("\r\n").next().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> String {
        let item = serde_json::json!({
            "ad": {
                "landscapeImage": { "asset": "https://img-prod-cms-rt-microsoft-com.akamaized.net/cms/api/am/imageFileData/L.jpg" },
                "portraitImage": { "asset": "https://img-prod-cms-rt-microsoft-com.akamaized.net/cms/api/am/imageFileData/P.jpg" },
                "iconHoverText": "Moraine Lake, Canada\r\n© Photographer / Getty Images",
                "copyright": "© Photographer / Getty Images",
                "title": "A glacial jewel",
                "description": "Fed by glacier melt, the lake turns turquoise every summer."
            }
        });
        serde_json::json!({
            "batchrsp": { "items": [ { "item": item.to_string() } ] }
        })
        .to_string()
    }

    #[test]
    fn parses_portrait_entry_with_captions() {
        let entries = parse_entries(&body(), Orientation::Portrait).unwrap();
        let entry = &entries[0];

        assert_eq!(entry.landscape_url, None);
        assert!(entry.portrait_url.as_deref().unwrap().ends_with("/P.jpg"));
        assert_eq!(entry.title.as_deref(), Some("Moraine Lake, Canada"));
        assert_eq!(entry.caption_title.as_deref(), Some("A glacial jewel"));
        assert!(entry
            .caption_description
            .as_deref()
            .unwrap()
            .starts_with("Fed by glacier melt"));
    }

    #[test]
    fn hover_text_without_line_break_is_the_title() {
        assert_eq!(picture_title("Just a title"), "Just a title");
        assert_eq!(picture_title("Title\r\nRest"), "Title");
        assert_eq!(picture_title(""), "");
    }
}

//! Spotlight delivery API client
//!
//! Both API versions wrap their payload the same way: `batchrsp.items[].item`
//! is a JSON *string* holding the actual ad description. The per-version
//! modules map that description onto [`Entry`].

mod v3;
mod v4;

use log::debug;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::{ApiVersion, Entry, Orientation};

const V3_ENDPOINT: &str = "https://fd.api.iris.microsoft.com/v3/Delivery/Placement";
const V4_ENDPOINT: &str = "https://fd.api.iris.microsoft.com/v4/api/selection";
const V3_USER_AGENT: &str = "WindowsShellClient/9.0.40929.0 (Windows)";

/// Source of catalog entries for a locale
pub trait EntrySource {
    /// Fetch every entry currently served for `locale`
    ///
    /// Fails on network, HTTP status and payload errors.
    fn fetch_entries(
        &self,
        api_version: ApiVersion,
        locale: &str,
        orientation: Orientation,
    ) -> Result<Vec<Entry>>;
}

/// Blocking client that gives up on connecting after `connect_timeout` and
/// on a whole response, body included, after `deadline`
pub(crate) fn http_client(connect_timeout: Duration, deadline: Duration) -> Result<Client> {
    Ok(Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(deadline.max(connect_timeout))
        .build()?)
}

/// Blocking HTTP client for the delivery API
pub struct SpotlightClient {
    client: Client,
}

impl SpotlightClient {
    pub fn new(connect_timeout: Duration, deadline: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(connect_timeout, deadline)?,
        })
    }
}

impl EntrySource for SpotlightClient {
    fn fetch_entries(
        &self,
        api_version: ApiVersion,
        locale: &str,
        orientation: Orientation,
    ) -> Result<Vec<Entry>> {
        let country = country_code(locale)?;

        let request = match api_version {
            ApiVersion::V3 => self.client.get(V3_ENDPOINT).query(&[
                ("pid", "338387"),
                ("fmt", "json"),
                ("ctry", country),
                ("lc", locale),
                ("ua", V3_USER_AGENT),
                ("bcnt", "3"),
                ("cdm", "1"),
            ]),
            ApiVersion::V4 => self.client.get(V4_ENDPOINT).query(&[
                ("placement", "88000820"),
                ("bcnt", "4"),
                ("country", country),
                ("locale", locale),
                ("fmt", "json"),
            ]),
        };

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        let body = response.text()?;
        let entries = match api_version {
            ApiVersion::V3 => v3::parse_entries(&body, orientation)?,
            ApiVersion::V4 => v4::parse_entries(&body, orientation)?,
        };

        debug!(
            "{} {} returned {} entries",
            api_version,
            locale,
            entries.len()
        );
        Ok(entries)
    }
}

/// `fr-CA` -> `CA`
fn country_code(locale: &str) -> Result<&str> {
    match locale.split_once('-') {
        Some((_, country)) if !country.is_empty() => Ok(country),
        _ => Err(Error::InvalidLocale(locale.to_string())),
    }
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    #[serde(default)]
    batchrsp: BatchRsp,
}

#[derive(Debug, Default, Deserialize)]
struct BatchRsp {
    #[serde(default)]
    items: Vec<BatchItem>,
}

#[derive(Debug, Deserialize)]
struct BatchItem {
    item: String,
}

/// Decode the envelope and each nested item string into `T`
fn decode_items<T: serde::de::DeserializeOwned>(body: &str) -> Result<Vec<T>> {
    let response: BatchResponse = serde_json::from_str(body)?;
    response
        .batchrsp
        .items
        .iter()
        .map(|item| serde_json::from_str(&item.item).map_err(Error::from))
        .collect()
}

/// Keep only the URLs that `orientation` asks for
fn select_urls(
    orientation: Orientation,
    landscape: Option<String>,
    portrait: Option<String>,
) -> (Option<String>, Option<String>) {
    match orientation {
        Orientation::Landscape => (landscape, None),
        Orientation::Portrait => (None, portrait),
        Orientation::Both => (landscape, portrait),
    }
}

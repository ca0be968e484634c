//! Catalog of `xx-XX` locale codes the delivery API is queried with
//!
//! The catalog is cached as a pretty-printed JSON array in
//! `<cache_dir>/locale_cache_<version>.json`. A missing or corrupt cache is
//! regenerated from the built-in list.

use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::ApiVersion;

/// Locales known to receive Spotlight content
const BUILTIN_LOCALES: &[&str] = &[
    "af-ZA", "am-ET", "ar-AE", "ar-BH", "ar-DZ", "ar-EG", "ar-IQ", "ar-JO", "ar-KW", "ar-LB",
    "ar-LY", "ar-MA", "ar-OM", "ar-QA", "ar-SA", "ar-TN", "ar-YE", "az-AZ", "be-BY", "bg-BG",
    "bn-BD", "bn-IN", "bs-BA", "ca-ES", "cs-CZ", "cy-GB", "da-DK", "de-AT", "de-CH", "de-DE",
    "de-LI", "de-LU", "el-GR", "en-AU", "en-CA", "en-GB", "en-HK", "en-IE", "en-IN", "en-MY",
    "en-NG", "en-NZ", "en-PH", "en-SG", "en-US", "en-ZA", "es-AR", "es-BO", "es-CL", "es-CO",
    "es-CR", "es-DO", "es-EC", "es-ES", "es-GT", "es-HN", "es-MX", "es-NI", "es-PA", "es-PE",
    "es-PR", "es-PY", "es-SV", "es-US", "es-UY", "es-VE", "et-EE", "eu-ES", "fa-IR", "fi-FI",
    "fil-PH", "fr-BE", "fr-CA", "fr-CH", "fr-FR", "fr-LU", "fr-MC", "ga-IE", "gl-ES", "gu-IN",
    "he-IL", "hi-IN", "hr-HR", "hu-HU", "hy-AM", "id-ID", "is-IS", "it-CH", "it-IT", "ja-JP",
    "ka-GE", "kk-KZ", "km-KH", "kn-IN", "ko-KR", "lo-LA", "lt-LT", "lv-LV", "mk-MK", "ml-IN",
    "mn-MN", "mr-IN", "ms-BN", "ms-MY", "mt-MT", "nb-NO", "ne-NP", "nl-BE", "nl-NL", "pa-IN",
    "pl-PL", "pt-BR", "pt-PT", "ro-RO", "ru-RU", "si-LK", "sk-SK", "sl-SI", "sq-AL", "sr-RS",
    "sv-FI", "sv-SE", "sw-KE", "ta-IN", "te-IN", "th-TH", "tr-TR", "uk-UA", "ur-PK", "uz-UZ",
    "vi-VN", "zh-CN", "zh-HK", "zh-SG", "zh-TW",
];

/// Ordered, read-only list of locale codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleCatalog {
    codes: Vec<String>,
}

impl LocaleCatalog {
    /// Catalog from an explicit list, keeping its order
    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    /// The built-in catalog, sorted
    pub fn builtin() -> Self {
        let mut codes: Vec<String> = BUILTIN_LOCALES.iter().map(|c| c.to_string()).collect();
        codes.sort();
        Self { codes }
    }

    /// Load the cached catalog for `api_version`, writing it first if needed
    pub fn load(cache_dir: &Path, api_version: ApiVersion) -> Result<Self> {
        let cache_file = cache_file(cache_dir, api_version);

        if cache_file.exists() {
            match fs::read_to_string(&cache_file)
                .map_err(crate::Error::from)
                .and_then(|raw| serde_json::from_str::<Vec<String>>(&raw).map_err(Into::into))
            {
                Ok(codes) if !codes.is_empty() => {
                    debug!(
                        "Loaded {} locales from {}",
                        codes.len(),
                        cache_file.display()
                    );
                    return Ok(Self { codes });
                }
                Ok(_) => warn!("Locale cache {} is empty, regenerating", cache_file.display()),
                Err(e) => warn!(
                    "Locale cache {} is unreadable ({}), regenerating",
                    cache_file.display(),
                    e
                ),
            }
        }

        let catalog = Self::builtin();
        fs::create_dir_all(cache_dir)?;
        fs::write(&cache_file, serde_json::to_string_pretty(&catalog.codes)?)?;
        debug!("Wrote locale cache {}", cache_file.display());

        Ok(catalog)
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Case-insensitive lookup returning the catalog's own spelling
    pub fn resolve(&self, code: &str) -> Option<&str> {
        self.codes
            .iter()
            .find(|c| c.eq_ignore_ascii_case(code))
            .map(String::as_str)
    }
}

/// Whether `locale` requests every locale of the catalog
pub fn is_all(locale: &str) -> bool {
    locale.eq_ignore_ascii_case("all")
}

fn cache_file(cache_dir: &Path, api_version: ApiVersion) -> PathBuf {
    cache_dir.join(format!("locale_cache_{}.json", u8::from(api_version)))
}

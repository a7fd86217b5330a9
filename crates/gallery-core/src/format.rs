// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Display helpers shared by the export and the HTTP surface

use alloy_primitives::Address;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Default POAP family site
pub const DEFAULT_FAMILY_URL: &str = "https://poap.family";

const FULL_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Shorten `address` to roughly `length` characters around an ellipsis
///
/// Addresses shorter than `length` are returned unchanged.
pub fn shrink_address(address: &str, length: usize) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() < length {
        return address.to_string();
    }
    let half = length / 2;
    let tail = half.saturating_sub(1);
    let head: String = chars[..half].iter().collect();
    let end: String = chars[chars.len() - tail..].iter().collect();
    format!("{head}…{end}")
}

/// Whether `value` is missing or only whitespace
pub fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|value| value.trim().is_empty())
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(date.and_utc());
    }
    value
        .parse::<i64>()
        .ok()
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
}

/// Full UTC date, e.g. `Tue, 18 Oct 2022 12:00:00 GMT`
///
/// Unparseable input is passed through as is; `None` renders empty.
pub fn utc_date_full(value: Option<&str>) -> String {
    let Some(value) = value else {
        return String::new();
    };
    parse_date(value).map_or_else(
        || value.to_string(),
        |date| date.format(FULL_DATE_FORMAT).to_string(),
    )
}

/// Link to another site listing an owner's collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PartnerLink {
    /// Site name
    pub name: &'static str,
    /// Collection URL for the owner
    pub url: String,
}

/// Collection links for `owner` on partner sites
pub fn partner_links(owner: Address) -> Vec<PartnerLink> {
    let owner = format!("{owner:#x}");
    vec![
        PartnerLink {
            name: "POAP Explorer",
            url: format!("https://explore.poap.xyz/{owner}"),
        },
        PartnerLink {
            name: "Rainbow",
            url: format!("https://rainbow.me/{owner}?family=POAP"),
        },
        PartnerLink {
            name: "Welook",
            url: format!("https://welook.io/{owner}"),
        },
        PartnerLink {
            name: "POAP.in",
            url: format!("https://poap.in/v/{owner}"),
        },
        PartnerLink {
            name: "Zerion",
            url: format!("https://app.zerion.io/{owner}/nfts?collections=41"),
        },
        PartnerLink {
            name: "Zapper",
            url: format!(
                "https://zapper.xyz/nft/gnosis/0x22c1f6050e56d2876009903609a2cc3fef83b415?collectionOwners%5B%5D={owner}"
            ),
        },
    ]
}

/// Builds links into the POAP app and the family site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryLinks {
    app_url: String,
    family_url: String,
}

impl GalleryLinks {
    /// Links rooted at `app_url`, with the family site defaulting to [`DEFAULT_FAMILY_URL`]
    pub fn new(app_url: impl Into<String>, family_url: Option<String>) -> Self {
        let trim = |url: String| url.trim_end_matches('/').to_string();
        Self {
            app_url: trim(app_url.into()),
            family_url: trim(family_url.unwrap_or_else(|| DEFAULT_FAMILY_URL.to_string())),
        }
    }

    /// Token page in the app
    pub fn token(&self, token_id: u64) -> String {
        format!("{}/token/{token_id}", self.app_url)
    }

    /// Collection page in the app
    pub fn scan(&self, owner: Address) -> String {
        format!("{}/scan/{owner:#x}", self.app_url)
    }

    /// Event page on the family site
    pub fn family_event(&self, event_id: u64) -> String {
        format!("{}/event/{event_id}", self.family_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: &str = "0x7ce8cb0fa8d7d2f3ca78fb4b1e2b3a7d5c2f9e11";

    #[test]
    fn shrinks_long_addresses() {
        assert_eq!(shrink_address(OWNER, 10), "0x7ce…9e11");
        assert_eq!(shrink_address("0x1234", 10), "0x1234");
    }

    #[test]
    fn blank_values() {
        assert!(is_blank(None));
        assert!(is_blank(Some("   ")));
        assert!(!is_blank(Some("devcon")));
    }

    #[test]
    fn full_dates() {
        assert_eq!(
            utc_date_full(Some("2022-10-18T12:00:00Z")),
            "Tue, 18 Oct 2022 12:00:00 GMT"
        );
        assert_eq!(
            utc_date_full(Some("2022-10-18 12:00:00")),
            "Tue, 18 Oct 2022 12:00:00 GMT"
        );
        assert_eq!(utc_date_full(Some("1666094400")), "Tue, 18 Oct 2022 12:00:00 GMT");
        assert_eq!(utc_date_full(Some("yesterday")), "yesterday");
        assert_eq!(utc_date_full(None), "");
    }

    #[test]
    fn partner_links_use_lowercase_owner() {
        let owner: Address = OWNER.parse().unwrap();
        let links = partner_links(owner);
        assert_eq!(links.len(), 6);
        assert_eq!(links[0].url, format!("https://explore.poap.xyz/{OWNER}"));
        assert!(links[5].url.ends_with(OWNER));
    }

    #[test]
    fn gallery_links() {
        let links = GalleryLinks::new("https://app.poap.xyz/", None);
        let owner: Address = OWNER.parse().unwrap();
        assert_eq!(links.token(7), "https://app.poap.xyz/token/7");
        assert_eq!(links.scan(owner), format!("https://app.poap.xyz/scan/{OWNER}"));
        assert_eq!(links.family_event(42), "https://poap.family/event/42");
    }
}

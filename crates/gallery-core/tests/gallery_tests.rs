// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! End-to-end tests of `Gallery` over in-memory sources

use std::sync::{Arc, Mutex};

use alloy_primitives::Address;
use api_client::{
    Account, ActivitySource, ApiClient, ApiError, Event, EventCatalog, EventFilter, EventSource,
    EventTokens, HealthStatus, NameResolver, Page, Token, TopEvents, Transfer,
};
use gallery_core::{
    EnrichmentStatus, Gallery, GalleryError, GalleryLinks, PageCursor, view::IndexView,
};
use serde_json::json;
use shared_types::{ActivityType, Chain};
use tokio::sync::watch;

fn event(id: u64, name: &str) -> Event {
    serde_json::from_value(json!({ "id": id, "name": name, "tokenCount": 1, "transferCount": 1 }))
        .unwrap()
}

fn token(id: u64, owner: u8, owned: u64) -> Token {
    Token {
        id,
        owner: Account {
            id: Address::repeat_byte(owner),
            tokens_owned: owned,
            tokens_minted: 0,
            ens: None,
        },
        created: Some("2022-10-18T12:00:00Z".to_string()),
        transfer_count: 1,
        event_id: Some(42),
    }
}

/// Listing that returns scripted batch sizes, newest ids first
#[derive(Debug)]
struct ScriptedEvents {
    batches: Mutex<Vec<u64>>,
    requests: Arc<Mutex<Vec<(u64, u64)>>>,
}

impl ScriptedEvents {
    fn new(batches: &[u64]) -> Self {
        let mut batches = batches.to_vec();
        batches.reverse();
        Self {
            batches: Mutex::new(batches),
            requests: Arc::default(),
        }
    }
}

impl ApiClient for ScriptedEvents {
    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        Ok(HealthStatus::Up)
    }

    fn name(&self) -> &'static str {
        "scripted-events"
    }
}

impl EventSource for ScriptedEvents {
    async fn fetch_events(
        &self,
        _filter: &EventFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Page<Event>, ApiError> {
        self.requests.lock().unwrap().push((offset, limit));
        let size = self.batches.lock().unwrap().pop().unwrap_or(0);
        Ok(Page {
            items: (offset..offset + size)
                .map(|id| event(id, "listed"))
                .collect(),
            total: 100,
        })
    }
}

/// Catalog with one event (id 42) holding `holders` tokens
#[derive(Debug)]
struct FakeCatalog {
    holders: Vec<Token>,
    transfers: Vec<Transfer>,
    token_offsets: Arc<Mutex<Vec<u64>>>,
}

impl FakeCatalog {
    fn with_holders(holders: Vec<Token>) -> Self {
        Self {
            holders,
            transfers: Vec::new(),
            token_offsets: Arc::default(),
        }
    }
}

impl ApiClient for FakeCatalog {
    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        Ok(HealthStatus::Up)
    }

    fn name(&self) -> &'static str {
        "poap-api"
    }
}

impl EventCatalog for FakeCatalog {
    async fn event(&self, id: u64) -> Result<Option<Event>, ApiError> {
        Ok((id == 42).then(|| event(42, "Devcon")))
    }

    async fn event_tokens(&self, _id: u64, limit: u64, offset: u64) -> Result<EventTokens, ApiError> {
        self.token_offsets.lock().unwrap().push(offset);
        let tokens = self
            .holders
            .iter()
            .skip(usize::try_from(offset).unwrap())
            .take(usize::try_from(limit).unwrap())
            .cloned()
            .collect();
        Ok(EventTokens {
            tokens,
            total: self.holders.len() as u64,
            transfer_count: 77,
        })
    }

    async fn last_transfers(&self, _limit: u64) -> Result<Vec<Transfer>, ApiError> {
        Ok(self.transfers.clone())
    }

    async fn top_events(&self) -> Result<TopEvents, ApiError> {
        Ok(TopEvents {
            most_recent: Some(event(1, "Recent")),
            upcoming: None,
            most_claimed: Some(event(2, "Claimed")),
        })
    }
}

#[derive(Debug)]
struct FakeChain {
    chain: Chain,
    timestamps: Vec<i64>,
    down: bool,
}

impl ApiClient for FakeChain {
    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        if self.down {
            Ok(HealthStatus::Down {
                reason: "unreachable".to_string(),
            })
        } else {
            Ok(HealthStatus::Up)
        }
    }

    fn name(&self) -> &'static str {
        match self.chain {
            Chain::Mainnet => "mainnet-subgraph",
            Chain::Xdai => "xdai-subgraph",
        }
    }
}

impl ActivitySource for FakeChain {
    fn chain(&self) -> Chain {
        self.chain
    }

    async fn recent_transfers(&self, _limit: u64) -> Result<Vec<Transfer>, ApiError> {
        if self.down {
            return Err(ApiError::Http {
                message: "connection refused".to_string(),
            });
        }
        Ok(self
            .timestamps
            .iter()
            .map(|ts| {
                Transfer::new(
                    1,
                    Address::ZERO,
                    Address::repeat_byte(9),
                    *ts,
                    self.chain,
                )
            })
            .collect())
    }
}

#[derive(Debug)]
struct FakeEns;

impl ApiClient for FakeEns {
    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        Ok(HealthStatus::Up)
    }

    fn name(&self) -> &'static str {
        "ens"
    }
}

impl NameResolver for FakeEns {
    async fn resolve_names(&self, addresses: &[Address]) -> Result<Vec<String>, ApiError> {
        Ok(addresses
            .iter()
            .map(|address| {
                if address[0] == 2 {
                    String::new()
                } else {
                    format!("owner{}.eth", address[0])
                }
            })
            .collect())
    }
}

type TestGallery = Gallery<ScriptedEvents, FakeCatalog, FakeChain, FakeEns>;

fn links() -> GalleryLinks {
    GalleryLinks::new("https://app.poap.xyz", None)
}

#[tokio::test]
async fn short_batches_fill_one_page() {
    let events = ScriptedEvents::new(&[12, 8]);
    let requests = Arc::clone(&events.requests);
    let gallery: TestGallery =
        Gallery::new(events, FakeCatalog::with_holders(Vec::new()), links());

    let page = gallery
        .index_page(&EventFilter::default(), PageCursor::default())
        .await
        .unwrap();

    assert_eq!(page.items.len(), 20);
    assert_eq!(page.cursor.offset, 20);
    assert_eq!(*requests.lock().unwrap(), vec![(0, 20), (12, 8)]);
}

#[tokio::test]
async fn view_applies_gallery_pages() {
    let gallery: TestGallery = Gallery::new(
        ScriptedEvents::new(&[20, 5]),
        FakeCatalog::with_holders(Vec::new()),
        links(),
    );
    let mut view = IndexView::new();

    let request = view.reload();
    let result = gallery.index_page(&request.filter, request.cursor).await;
    assert!(view.apply(request.ticket, result));
    assert_eq!(view.events().len(), 20);

    let request = view.load_more();
    let result = gallery.index_page(&request.filter, request.cursor).await;
    assert!(view.apply(request.ticket, result));
    assert_eq!(view.events().len(), 25);
    assert_eq!(view.cursor().offset, 25);
}

#[tokio::test]
async fn event_page_uses_listing_counters() {
    let gallery: TestGallery = Gallery::new(
        ScriptedEvents::new(&[]),
        FakeCatalog::with_holders(vec![token(5, 1, 1), token(3, 1, 1), token(5, 1, 1)]),
        links(),
    );

    let page = gallery.event_page(42).await.unwrap();
    assert_eq!(page.event.token_count, 3);
    assert_eq!(page.event.transfer_count, 77);
    assert_eq!(page.tokens.iter().map(|t| t.id).collect::<Vec<_>>(), vec![3, 5]);
    assert_eq!(page.family_url, "https://poap.family/event/42");

    assert!(matches!(
        gallery.event_page(7).await,
        Err(GalleryError::EventNotFound { id: 7 })
    ));
}

#[tokio::test]
async fn top_events_skip_missing_slots() {
    let gallery: TestGallery = Gallery::new(
        ScriptedEvents::new(&[]),
        FakeCatalog::with_holders(Vec::new()),
        links(),
    );
    let top = gallery.top_events().await.unwrap();
    assert_eq!(
        top.iter().map(|h| h.heading).collect::<Vec<_>>(),
        vec!["Most Recent", "Most Claimed Token"]
    );
}

#[tokio::test]
async fn activity_merges_and_reports_partial() {
    let gallery: TestGallery = Gallery::new(
        ScriptedEvents::new(&[]),
        FakeCatalog::with_holders(Vec::new()),
        links(),
    )
    .with_activity(
        Some(FakeChain {
            chain: Chain::Mainnet,
            timestamps: vec![],
            down: true,
        }),
        Some(FakeChain {
            chain: Chain::Xdai,
            timestamps: vec![10, 30, 20],
            down: false,
        }),
    );

    let activity = gallery.activity(None).await.unwrap();
    assert!(activity.is_partial());
    assert_eq!(
        activity.transfers.iter().map(|t| t.timestamp).collect::<Vec<_>>(),
        vec![30, 20, 10]
    );

    let reports = gallery.health().await;
    let mainnet = reports
        .iter()
        .find(|report| report.source == "mainnet-subgraph")
        .unwrap();
    assert!(mainnet.status.is_down());
    assert!(reports.iter().any(|report| report.source == "ens" && report.status == HealthStatus::Disabled));
}

#[tokio::test]
async fn activity_falls_back_to_catalog() {
    let mut catalog = FakeCatalog::with_holders(Vec::new());
    catalog.transfers = vec![Transfer::new(
        1,
        Address::repeat_byte(1),
        Address::repeat_byte(2),
        5,
        Chain::Xdai,
    )];
    let gallery: TestGallery = Gallery::new(ScriptedEvents::new(&[]), catalog, links());

    let activity = gallery.activity(Some(15)).await.unwrap();
    assert_eq!(activity.transfers.len(), 1);
    assert!(!activity.is_partial());
    assert!(matches!(
        gallery.activity(Some(0)).await,
        Err(GalleryError::InvalidRequest { .. })
    ));
}

#[tokio::test]
async fn catalog_activity_is_sorted_and_reclassified() {
    let mut catalog = FakeCatalog::with_holders(Vec::new());
    let mut claim = Transfer::new(1, Address::ZERO, Address::repeat_byte(2), 100, Chain::Xdai);
    // mislabelled by the server
    claim.activity_type = ActivityType::Burn;
    let newer = Transfer::new(2, Address::repeat_byte(1), Address::repeat_byte(2), 200, Chain::Mainnet);
    let newest = Transfer::new(3, Address::repeat_byte(1), Address::ZERO, 300, Chain::Mainnet);
    catalog.transfers = vec![claim, newest, newer];
    let gallery: TestGallery = Gallery::new(ScriptedEvents::new(&[]), catalog, links());

    let activity = gallery.activity(Some(15)).await.unwrap();
    assert_eq!(
        activity.transfers.iter().map(|t| t.timestamp).collect::<Vec<_>>(),
        vec![300, 200, 100]
    );
    assert_eq!(
        activity.transfers.iter().map(|t| t.activity_type).collect::<Vec<_>>(),
        vec![ActivityType::Burn, ActivityType::Transfer, ActivityType::Claim]
    );

    let activity = gallery.activity(Some(2)).await.unwrap();
    assert_eq!(
        activity.transfers.iter().map(|t| t.timestamp).collect::<Vec<_>>(),
        vec![300, 200]
    );
    assert!(matches!(
        gallery.activity(Some(1001)).await,
        Err(GalleryError::InvalidRequest { .. })
    ));
}

#[tokio::test]
async fn csv_export_reads_each_token_page_once() {
    let holders: Vec<Token> = (1..=250).map(|id| token(id, 1, 1)).collect();
    let catalog = FakeCatalog::with_holders(holders);
    let offsets = Arc::clone(&catalog.token_offsets);
    let gallery: TestGallery = Gallery::new(ScriptedEvents::new(&[]), catalog, links());

    let export = gallery.export_csv(42, None).await.unwrap();
    assert_eq!(export.rows, 250);

    let mut offsets = offsets.lock().unwrap().clone();
    offsets.sort_unstable();
    assert_eq!(offsets, vec![0, 100, 200]);
}

#[tokio::test]
async fn csv_export_with_names() {
    let holders = vec![token(3, 3, 3), token(1, 1, 5), token(2, 2, 0)];
    let gallery: TestGallery = Gallery::new(
        ScriptedEvents::new(&[]),
        FakeCatalog::with_holders(holders),
        links(),
    )
    .with_resolver(Some(FakeEns));

    let (tx, rx) = watch::channel(EnrichmentStatus::NoData);
    let export = gallery.export_csv(42, Some(tx)).await.unwrap();

    assert_eq!(export.status, EnrichmentStatus::Ready);
    assert_eq!(*rx.borrow(), EnrichmentStatus::Ready);
    assert_eq!(export.power, 8);
    assert_eq!(export.filename, "Devcon.csv");
    assert_eq!(export.label, "Download CSV");

    let lines: Vec<&str> = export.body.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("1,") && lines[1].contains("owner1.eth"));
    assert!(lines[2].starts_with("2,") && lines[2].contains(",,"));
    assert!(lines[3].starts_with("3,") && lines[3].contains("owner3.eth"));
}

#[tokio::test]
async fn csv_export_without_resolver() {
    let gallery: TestGallery = Gallery::new(
        ScriptedEvents::new(&[]),
        FakeCatalog::with_holders(vec![token(1, 1, 2)]),
        links(),
    );
    let export = gallery.export_csv(42, None).await.unwrap();
    assert_eq!(export.status, EnrichmentStatus::ReadyWithoutEnrichment);
    assert_eq!(export.label, "Download CSV (without ENS)");
}

//! In-memory `CardLookup` used by unit tests.

use crate::card::{CardCode, CardRecord, CardStatus};
use crate::error::{RegistryError, RegistryResult};
use crate::lookup::CardLookup;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub(crate) struct FakeLookup {
    cards: HashMap<CardCode, RegistryResult<Option<CardRecord>>>,
    calls: AtomicUsize,
}

impl FakeLookup {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_card(self, code: &str, status: CardStatus) -> Self {
        let code = CardCode::parse(code).expect("test code");
        let record = CardRecord::new(code.clone(), status);
        self.with_record(code, Some(record))
    }

    pub(crate) fn with_expired(self, code: &str, date: &str) -> Self {
        let code = CardCode::parse(code).expect("test code");
        let record = CardRecord::new(code.clone(), CardStatus::Expired).with_expiration_date(date);
        self.with_record(code, Some(record))
    }

    pub(crate) fn failing(mut self, code: &str) -> Self {
        let code = CardCode::parse(code).expect("test code");
        self.cards.insert(
            code,
            Err(RegistryError::HttpStatus {
                status: 503,
                body: "upstream down".into(),
            }),
        );
        self
    }

    fn with_record(mut self, code: CardCode, record: Option<CardRecord>) -> Self {
        self.cards.insert(code, Ok(record));
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CardLookup for FakeLookup {
    async fn fetch_card(&self, code: &CardCode) -> RegistryResult<Option<CardRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.cards.get(code).cloned().unwrap_or(Ok(None))
    }

    fn source_name(&self) -> &'static str {
        "fake"
    }
}

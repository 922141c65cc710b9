//! Converter state that survives between sessions

use crate::core::cache::KeyValueStore;
use crate::core::currency::CurrencySelection;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateField {
    From,
    To,
    Amount,
    Converted,
}

impl StateField {
    pub fn key(&self) -> &'static str {
        match self {
            StateField::From => "from_currency",
            StateField::To => "to_currency",
            StateField::Amount => "last_amount",
            StateField::Converted => "last_converted",
        }
    }
}

/// Where [`AppState`] loads from and saves to.
#[async_trait]
pub trait StatePersistence: Send + Sync {
    async fn load_field(&self, field: StateField) -> Result<Option<String>>;
    async fn save_field(&self, field: StateField, value: &str) -> Result<()>;
}

/// Persists state fields as individual keys of a [`KeyValueStore`].
pub struct StorePersistence {
    store: Arc<dyn KeyValueStore>,
}

impl StorePersistence {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StatePersistence for StorePersistence {
    async fn load_field(&self, field: StateField) -> Result<Option<String>> {
        self.store.get(field.key()).await
    }

    async fn save_field(&self, field: StateField, value: &str) -> Result<()> {
        self.store.set(field.key(), value).await
    }
}

/// The user's current selection, last amount and last result.
///
/// Every mutation is saved immediately. Persistence failures are logged and
/// otherwise ignored: the in-memory state is still updated.
pub struct AppState {
    persistence: Arc<dyn StatePersistence>,
    from: CurrencySelection,
    to: CurrencySelection,
    amount: String,
    converted: String,
}

impl AppState {
    pub async fn load(persistence: Arc<dyn StatePersistence>) -> Self {
        let from = load_selection(persistence.as_ref(), StateField::From)
            .await
            .unwrap_or_else(|| CurrencySelection::from_code("USD"));
        let to = load_selection(persistence.as_ref(), StateField::To)
            .await
            .unwrap_or_else(|| CurrencySelection::from_code("EUR"));
        let amount = load_text(persistence.as_ref(), StateField::Amount)
            .await
            .unwrap_or_default();
        let converted = load_text(persistence.as_ref(), StateField::Converted)
            .await
            .unwrap_or_default();

        debug!(from = %from.code, to = %to.code, "Loaded app state");
        Self {
            persistence,
            from,
            to,
            amount,
            converted,
        }
    }

    pub fn from(&self) -> &CurrencySelection {
        &self.from
    }

    pub fn to(&self) -> &CurrencySelection {
        &self.to
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn converted(&self) -> &str {
        &self.converted
    }

    pub async fn select_from(&mut self, currency: CurrencySelection) {
        self.from = currency;
        self.save_selection(StateField::From).await;
    }

    pub async fn select_to(&mut self, currency: CurrencySelection) {
        self.to = currency;
        self.save_selection(StateField::To).await;
    }

    pub async fn swap(&mut self) {
        std::mem::swap(&mut self.from, &mut self.to);
        self.save_selection(StateField::From).await;
        self.save_selection(StateField::To).await;
    }

    /// Records a successful conversion of `amount` into `converted`.
    pub async fn record_conversion(&mut self, amount: &str, converted: &str) {
        self.amount = amount.to_string();
        self.converted = converted.to_string();
        self.save(StateField::Amount, amount).await;
        self.save(StateField::Converted, converted).await;
    }

    async fn save_selection(&self, field: StateField) {
        let selection = match field {
            StateField::From => &self.from,
            _ => &self.to,
        };
        match serde_json::to_string(selection) {
            Ok(json) => self.save(field, &json).await,
            Err(e) => warn!(field = field.key(), error = %e, "Failed to encode selection"),
        }
    }

    async fn save(&self, field: StateField, value: &str) {
        if let Err(e) = self.persistence.save_field(field, value).await {
            warn!(field = field.key(), error = %e, "Failed to persist state");
        }
    }
}

async fn load_text(persistence: &dyn StatePersistence, field: StateField) -> Option<String> {
    match persistence.load_field(field).await {
        Ok(value) => value,
        Err(e) => {
            warn!(field = field.key(), error = %e, "Failed to load state");
            None
        }
    }
}

async fn load_selection(
    persistence: &dyn StatePersistence,
    field: StateField,
) -> Option<CurrencySelection> {
    let raw = load_text(persistence, field).await?;
    match serde_json::from_str(&raw) {
        Ok(selection) => Some(selection),
        Err(e) => {
            warn!(field = field.key(), error = %e, "Ignoring unreadable selection");
            None
        }
    }
}

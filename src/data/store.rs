//! Load Store
//! Per-dataset slots that replace their contents wholesale when a load completes and
//! ignore results from loads that have been superseded or detached.

use super::catalog::DatasetId;
use super::record::Dataset;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, warn};

/// Handed out when a load starts; presented again when it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// One dataset's most recently completed load.
#[derive(Debug)]
pub struct LoadSlot<T> {
    generation: u64,
    status: LoadStatus,
    data: Arc<T>,
}

impl<T: Default> Default for LoadSlot<T> {
    fn default() -> Self {
        Self {
            generation: 0,
            status: LoadStatus::Idle,
            data: Arc::new(T::default()),
        }
    }
}

impl<T: Default> LoadSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a load. Any load already in flight becomes stale. The previous data
    /// stays visible until this one completes.
    pub fn begin(&mut self) -> LoadTicket {
        self.generation += 1;
        self.status = LoadStatus::Loading;
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Apply a finished load. Returns `false` and changes nothing when the ticket is
    /// stale. A failure leaves empty data plus the error message.
    pub fn complete<E: Display>(&mut self, ticket: LoadTicket, result: Result<T, E>) -> bool {
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale load"
            );
            return false;
        }

        match result {
            Ok(data) => {
                self.data = Arc::new(data);
                self.status = LoadStatus::Ready;
            }
            Err(e) => {
                warn!(error = %e, "load failed");
                self.data = Arc::new(T::default());
                self.status = LoadStatus::Failed(e.to_string());
            }
        }
        true
    }

    /// Invalidate any load in flight without starting a new one.
    pub fn detach(&mut self) {
        self.generation += 1;
        if self.status == LoadStatus::Loading {
            self.status = LoadStatus::Idle;
        }
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            LoadStatus::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn data(&self) -> Arc<T> {
        Arc::clone(&self.data)
    }
}

/// Load slots for every chart dataset. Slots are fully independent.
#[derive(Debug, Default)]
pub struct DatasetStore {
    slots: BTreeMap<DatasetId, LoadSlot<Dataset>>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, id: DatasetId) -> LoadTicket {
        self.slots.entry(id).or_default().begin()
    }

    pub fn complete<E: Display>(
        &mut self,
        id: DatasetId,
        ticket: LoadTicket,
        result: Result<Dataset, E>,
    ) -> bool {
        match self.slots.get_mut(&id) {
            Some(slot) => slot.complete(ticket, result),
            None => false,
        }
    }

    pub fn detach(&mut self, id: DatasetId) {
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.detach();
        }
    }

    pub fn slot(&self, id: DatasetId) -> Option<&LoadSlot<Dataset>> {
        self.slots.get(&id)
    }

    pub fn any_loading(&self) -> bool {
        self.slots.values().any(LoadSlot::is_loading)
    }
}

//! Loads the reference data a booking form needs.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::ports::{CatalogRepository, PetRepository};
use crate::domain::{
    AvailableSlot, CatalogKind, CatalogLoadError, CatalogSnapshot, Pet, Service, SlotLabelFormat,
    UserId, bookable_in_order,
};

/// Fetches services, available slots and the owner's pets.
pub struct CatalogLoader<C, P> {
    catalog: Arc<C>,
    pets: Arc<P>,
    label_format: SlotLabelFormat,
}

impl<C, P> Clone for CatalogLoader<C, P> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            pets: Arc::clone(&self.pets),
            label_format: self.label_format.clone(),
        }
    }
}

impl<C, P> CatalogLoader<C, P> {
    /// Build a loader that labels slots with `label_format`.
    pub fn new(catalog: Arc<C>, pets: Arc<P>, label_format: SlotLabelFormat) -> Self {
        Self {
            catalog,
            pets,
            label_format,
        }
    }

    /// Patterns used to label slots.
    pub fn label_format(&self) -> &SlotLabelFormat {
        &self.label_format
    }
}

impl<C, P> CatalogLoader<C, P>
where
    C: CatalogRepository,
    P: PetRepository,
{
    /// All services, in table order.
    pub async fn load_services(&self) -> Result<Vec<Service>, CatalogLoadError> {
        let services = self.catalog.list_services().await.map_err(|source| {
            warn!(catalog = %CatalogKind::Services, error = %source, "catalog load failed");
            CatalogLoadError::new(CatalogKind::Services, source.to_string())
        })?;
        debug!(count = services.len(), "services loaded");
        Ok(services)
    }

    /// Bookable slots sorted by date then start time, each with its label.
    ///
    /// Rows the adapter returns as unavailable are dropped here as well.
    pub async fn load_available_slots(&self) -> Result<Vec<AvailableSlot>, CatalogLoadError> {
        let rows = self.catalog.list_available_slots().await.map_err(|source| {
            warn!(catalog = %CatalogKind::Slots, error = %source, "catalog load failed");
            CatalogLoadError::new(CatalogKind::Slots, source.to_string())
        })?;
        let fetched = rows.len();
        let slots: Vec<AvailableSlot> = bookable_in_order(rows)
            .into_iter()
            .map(|slot| self.label_format.decorate(slot))
            .collect();
        debug!(fetched, offered = slots.len(), "available slots loaded");
        Ok(slots)
    }

    /// Pets owned by `owner`.
    pub async fn load_pets(&self, owner: &UserId) -> Result<Vec<Pet>, CatalogLoadError> {
        self.pets.list_for_owner(owner).await.map_err(|source| {
            warn!(catalog = %CatalogKind::Pets, user_id = %owner, error = %source, "catalog load failed");
            CatalogLoadError::new(CatalogKind::Pets, source.to_string())
        })
    }

    /// Services and slots, fetched concurrently.
    ///
    /// A failed catalog is recorded in the snapshot and the other is kept.
    pub async fn load_catalog(&self) -> CatalogSnapshot {
        let (services, slots) = tokio::join!(self.load_services(), self.load_available_slots());
        let mut snapshot = CatalogSnapshot::default();
        absorb(&mut snapshot.services, &mut snapshot.failures, services);
        absorb(&mut snapshot.slots, &mut snapshot.failures, slots);
        snapshot
    }

    /// Everything the booking form shows for `owner`: services, slots and
    /// the owner's pets, all fetched concurrently.
    pub async fn load_form(&self, owner: &UserId) -> CatalogSnapshot {
        let (services, slots, pets) = tokio::join!(
            self.load_services(),
            self.load_available_slots(),
            self.load_pets(owner)
        );
        let mut snapshot = CatalogSnapshot::default();
        absorb(&mut snapshot.services, &mut snapshot.failures, services);
        absorb(&mut snapshot.slots, &mut snapshot.failures, slots);
        absorb(&mut snapshot.pets, &mut snapshot.failures, pets);
        snapshot
    }
}

fn absorb<T>(
    target: &mut Vec<T>,
    failures: &mut Vec<CatalogLoadError>,
    loaded: Result<Vec<T>, CatalogLoadError>,
) {
    match loaded {
        Ok(items) => *target = items,
        Err(err) => failures.push(err),
    }
}

#[cfg(test)]
#[path = "catalog_service_tests.rs"]
mod tests;

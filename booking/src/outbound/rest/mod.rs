//! REST adapters for a Supabase-style backend.
//!
//! Every adapter shares one [`RestClient`], so the session issued at sign-in
//! authorises the table requests that follow.

mod appointment_repository;
mod catalog_repository;
mod client;
mod dto;
mod pet_repository;
mod profile_repository;
mod session_store;
mod slot_repository;

use std::sync::Arc;

pub use appointment_repository::RestAppointmentRepository;
pub use catalog_repository::RestCatalogRepository;
pub use client::RestClient;
pub use pet_repository::RestPetRepository;
pub use profile_repository::RestProfileRepository;
pub use session_store::RestSessionStore;
pub use slot_repository::RestSlotRepository;

use crate::config::BackendConfig;
use crate::domain::{BookingWorkflow, CatalogLoader, IdentityResolver, SessionManager};

/// All REST adapters for one backend project.
#[derive(Clone)]
pub struct RestBackend {
    /// GoTrue session authority.
    pub session_store: Arc<RestSessionStore>,
    /// `users` profile rows.
    pub profiles: Arc<RestProfileRepository>,
    /// `pets` rows.
    pub pets: Arc<RestPetRepository>,
    /// Services and open slots.
    pub catalog: Arc<RestCatalogRepository>,
    /// Slot availability writes.
    pub slots: Arc<RestSlotRepository>,
    /// Appointment inserts.
    pub appointments: Arc<RestAppointmentRepository>,
    config: BackendConfig,
}

impl RestBackend {
    /// Build every adapter over one shared client.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn connect(config: BackendConfig) -> Result<Self, reqwest::Error> {
        let client = RestClient::new(&config)?;
        Ok(Self {
            session_store: Arc::new(RestSessionStore::new(client.clone())),
            profiles: Arc::new(RestProfileRepository::new(client.clone())),
            pets: Arc::new(RestPetRepository::new(client.clone())),
            catalog: Arc::new(RestCatalogRepository::new(client.clone())),
            slots: Arc::new(RestSlotRepository::new(client.clone())),
            appointments: Arc::new(RestAppointmentRepository::new(
                client,
                config.appointments_table.clone(),
            )),
            config,
        })
    }

    /// Session manager over the shared session.
    pub fn session_manager(&self) -> SessionManager<RestSessionStore, RestProfileRepository> {
        SessionManager::new(IdentityResolver::new(
            Arc::clone(&self.session_store),
            Arc::clone(&self.profiles),
        ))
    }

    /// Catalog loader with the configured slot labels.
    pub fn catalog_loader(&self) -> CatalogLoader<RestCatalogRepository, RestPetRepository> {
        CatalogLoader::new(
            Arc::clone(&self.catalog),
            Arc::clone(&self.pets),
            self.config.label_format.clone(),
        )
    }

    /// Booking workflow in the configured mode.
    pub fn booking_workflow(
        &self,
    ) -> BookingWorkflow<RestAppointmentRepository, RestSlotRepository> {
        BookingWorkflow::new(
            Arc::clone(&self.appointments),
            Arc::clone(&self.slots),
            self.config.booking_mode,
        )
    }
}

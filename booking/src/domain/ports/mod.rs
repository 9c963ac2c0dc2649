//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod appointment_repository;
mod catalog_repository;
mod pet_repository;
mod profile_repository;
mod session_store;
mod slot_repository;

#[cfg(test)]
pub use appointment_repository::MockAppointmentRepository;
pub use appointment_repository::{AppointmentRepository, AppointmentRepositoryError};
#[cfg(test)]
pub use catalog_repository::MockCatalogRepository;
pub use catalog_repository::{CatalogRepository, CatalogRepositoryError};
#[cfg(test)]
pub use pet_repository::MockPetRepository;
pub use pet_repository::{PetRepository, PetRepositoryError};
#[cfg(test)]
pub use profile_repository::MockProfileRepository;
pub use profile_repository::{
    ProfileProjection, ProfileRecord, ProfileRepository, ProfileRepositoryError,
};
#[cfg(test)]
pub use session_store::MockSessionStore;
pub use session_store::{SessionStore, SessionStoreError};
#[cfg(test)]
pub use slot_repository::MockSlotRepository;
pub use slot_repository::{SlotRepository, SlotRepositoryError};

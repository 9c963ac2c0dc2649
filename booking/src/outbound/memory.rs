//! In-memory backend implementing every port.
//!
//! Mirrors the observable behaviour of the REST adapters closely enough for
//! end-to-end scenarios: one held session, foreign-key checks on insert and
//! availability filtering on slot reads. Any operation can be made to fail
//! with [`InMemoryBackend::fail`].

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::ports::{
    AppointmentRepository, AppointmentRepositoryError, CatalogRepository, CatalogRepositoryError,
    PetRepository, PetRepositoryError, ProfileProjection, ProfileRecord, ProfileRepository,
    ProfileRepositoryError, SessionStore, SessionStoreError, SlotRepository, SlotRepositoryError,
};
use crate::domain::{
    AccessToken, Appointment, AppointmentId, BookingMode, BookingWorkflow, CatalogLoader,
    Credentials, DisplayName, IdentityResolver, NewAppointment, Pet, Role, Service,
    SessionManager, Session, SessionUser, Slot, SlotId, SlotLabelFormat, UserId,
};

/// Port operations that can be counted and made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// [`SessionStore::current_session`].
    CurrentSession,
    /// [`SessionStore::sign_in`].
    SignIn,
    /// [`SessionStore::sign_up`].
    SignUp,
    /// [`SessionStore::sign_out`].
    SignOut,
    /// [`ProfileRepository::fetch_profile`].
    FetchProfile,
    /// [`PetRepository::list_for_owner`].
    ListPets,
    /// [`CatalogRepository::list_services`].
    ListServices,
    /// [`CatalogRepository::list_available_slots`].
    ListSlots,
    /// [`SlotRepository::mark_unavailable`].
    MarkUnavailable,
    /// [`SlotRepository::claim_if_available`].
    ClaimSlot,
    /// [`AppointmentRepository::insert`].
    InsertAppointment,
}

struct Account {
    user: SessionUser,
    password: Zeroizing<String>,
}

struct Profile {
    role: Role,
    display_name: Option<DisplayName>,
}

#[derive(Default)]
struct State {
    session: Option<Session>,
    accounts: Vec<Account>,
    profiles: HashMap<UserId, Profile>,
    pets: Vec<Pet>,
    services: Vec<Service>,
    slots: BTreeMap<SlotId, Slot>,
    appointments: Vec<Appointment>,
    issued_tokens: u64,
    failures: HashMap<Operation, String>,
    calls: HashMap<Operation, usize>,
}

impl State {
    /// Count the call and return the injected failure, if any.
    fn enter(&mut self, operation: Operation) -> Option<String> {
        *self.calls.entry(operation).or_default() += 1;
        self.failures.get(&operation).cloned()
    }

    fn pets_of(&self, owner: &UserId) -> Vec<Pet> {
        let mut pets: Vec<Pet> = self
            .pets
            .iter()
            .filter(|pet| &pet.owner_id == owner)
            .cloned()
            .collect();
        pets.sort_by_key(|pet| pet.id);
        pets
    }

    fn add_account(&mut self, credentials: &Credentials) -> SessionUser {
        let user = SessionUser {
            id: UserId::random(),
            email: Some(credentials.email().clone()),
        };
        self.accounts.push(Account {
            user: user.clone(),
            password: Zeroizing::new(credentials.password().to_owned()),
        });
        user
    }

    fn issue_session(&mut self, user: SessionUser) -> Session {
        self.issued_tokens += 1;
        let session = Session {
            user,
            access_token: AccessToken::new(format!("memory-token-{}", self.issued_tokens)),
        };
        self.session = Some(session.clone());
        session
    }
}

/// Shared in-memory tables and session.
///
/// Clones share state, so one instance can back every port at once.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<State>>,
}

impl InMemoryBackend {
    /// Empty backend with no accounts, rows or session.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create an account that can sign in with `credentials`.
    ///
    /// No profile row is created; see [`Self::set_profile`].
    pub fn register_account(&self, credentials: &Credentials) -> SessionUser {
        self.lock().add_account(credentials)
    }

    /// Insert or replace the profile row for `user_id`.
    pub fn set_profile(&self, user_id: &UserId, role: Role, display_name: Option<DisplayName>) {
        self.lock()
            .profiles
            .insert(user_id.clone(), Profile { role, display_name });
    }

    /// Append a pet row.
    pub fn add_pet(&self, pet: Pet) {
        self.lock().pets.push(pet);
    }

    /// Append a service row.
    pub fn add_service(&self, service: Service) {
        self.lock().services.push(service);
    }

    /// Insert or replace a slot.
    pub fn add_slot(&self, slot: Slot) {
        self.lock().slots.insert(slot.id, slot);
    }

    /// Hold a session for `user` as if they had signed in earlier.
    pub fn start_session(&self, user: SessionUser) -> Session {
        self.lock().issue_session(user)
    }

    /// Current state of a slot row, booked or not.
    pub fn slot(&self, slot_id: SlotId) -> Option<Slot> {
        self.lock().slots.get(&slot_id).cloned()
    }

    /// Every inserted appointment, in insertion order.
    pub fn appointments(&self) -> Vec<Appointment> {
        self.lock().appointments.clone()
    }

    /// Number of times `operation` was invoked, failed calls included.
    pub fn calls(&self, operation: Operation) -> usize {
        self.lock().calls.get(&operation).copied().unwrap_or_default()
    }

    /// Make every later `operation` fail with `message` until recovered.
    pub fn fail(&self, operation: Operation, message: impl Into<String>) {
        self.lock().failures.insert(operation, message.into());
    }

    /// Clear a failure injected with [`Self::fail`].
    pub fn recover(&self, operation: Operation) {
        self.lock().failures.remove(&operation);
    }

    /// Session manager backed by this store.
    pub fn session_manager(&self) -> SessionManager<Self, Self> {
        let shared = Arc::new(self.clone());
        SessionManager::new(IdentityResolver::new(Arc::clone(&shared), shared))
    }

    /// Catalog loader using the default slot labels.
    pub fn catalog_loader(&self) -> CatalogLoader<Self, Self> {
        let shared = Arc::new(self.clone());
        CatalogLoader::new(Arc::clone(&shared), shared, SlotLabelFormat::default())
    }

    /// Booking workflow running in `mode`.
    pub fn booking_workflow(&self, mode: BookingMode) -> BookingWorkflow<Self, Self> {
        let shared = Arc::new(self.clone());
        BookingWorkflow::new(Arc::clone(&shared), shared, mode)
    }
}

#[async_trait]
impl SessionStore for InMemoryBackend {
    async fn current_session(&self) -> Result<Option<Session>, SessionStoreError> {
        let mut state = self.lock();
        if let Some(message) = state.enter(Operation::CurrentSession) {
            return Err(SessionStoreError::connection(message));
        }
        Ok(state.session.clone())
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, SessionStoreError> {
        let mut state = self.lock();
        if let Some(message) = state.enter(Operation::SignIn) {
            return Err(SessionStoreError::connection(message));
        }
        let user = state
            .accounts
            .iter()
            .find(|account| {
                account.user.email.as_ref() == Some(credentials.email())
                    && account.password.as_str() == credentials.password()
            })
            .map(|account| account.user.clone())
            .ok_or_else(|| SessionStoreError::rejected("Invalid login credentials"))?;
        Ok(state.issue_session(user))
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<SessionUser, SessionStoreError> {
        let mut state = self.lock();
        if let Some(message) = state.enter(Operation::SignUp) {
            return Err(SessionStoreError::connection(message));
        }
        let taken = state
            .accounts
            .iter()
            .any(|account| account.user.email.as_ref() == Some(credentials.email()));
        if taken {
            return Err(SessionStoreError::rejected("User already registered"));
        }
        // Accounts await confirmation, so no session is issued.
        Ok(state.add_account(credentials))
    }

    async fn sign_out(&self) -> Result<(), SessionStoreError> {
        let mut state = self.lock();
        if let Some(message) = state.enter(Operation::SignOut) {
            return Err(SessionStoreError::connection(message));
        }
        if state.session.take().is_none() {
            debug!("no held session to sign out");
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryBackend {
    async fn fetch_profile(
        &self,
        user_id: &UserId,
        projection: ProfileProjection,
    ) -> Result<Option<ProfileRecord>, ProfileRepositoryError> {
        let mut state = self.lock();
        if let Some(message) = state.enter(Operation::FetchProfile) {
            return Err(ProfileRepositoryError::query(message));
        }
        let Some(profile) = state.profiles.get(user_id) else {
            return Ok(None);
        };
        let record = match projection {
            ProfileProjection::Full => ProfileRecord {
                role: profile.role.clone(),
                display_name: profile.display_name.clone(),
                pets: state.pets_of(user_id),
            },
            ProfileProjection::RoleOnly => ProfileRecord {
                role: profile.role.clone(),
                display_name: None,
                pets: Vec::new(),
            },
        };
        Ok(Some(record))
    }
}

#[async_trait]
impl PetRepository for InMemoryBackend {
    async fn list_for_owner(&self, owner: &UserId) -> Result<Vec<Pet>, PetRepositoryError> {
        let mut state = self.lock();
        if let Some(message) = state.enter(Operation::ListPets) {
            return Err(PetRepositoryError::query(message));
        }
        Ok(state.pets_of(owner))
    }
}

#[async_trait]
impl CatalogRepository for InMemoryBackend {
    async fn list_services(&self) -> Result<Vec<Service>, CatalogRepositoryError> {
        let mut state = self.lock();
        if let Some(message) = state.enter(Operation::ListServices) {
            return Err(CatalogRepositoryError::query(message));
        }
        Ok(state.services.clone())
    }

    async fn list_available_slots(&self) -> Result<Vec<Slot>, CatalogRepositoryError> {
        let mut state = self.lock();
        if let Some(message) = state.enter(Operation::ListSlots) {
            return Err(CatalogRepositoryError::query(message));
        }
        let mut slots: Vec<Slot> = state
            .slots
            .values()
            .filter(|slot| slot.is_available)
            .cloned()
            .collect();
        slots.sort_by_key(Slot::starts_at);
        Ok(slots)
    }
}

#[async_trait]
impl SlotRepository for InMemoryBackend {
    async fn mark_unavailable(&self, slot_id: SlotId) -> Result<(), SlotRepositoryError> {
        let mut state = self.lock();
        if let Some(message) = state.enter(Operation::MarkUnavailable) {
            return Err(SlotRepositoryError::query(message));
        }
        // A filter matching no row updates nothing and is not an error.
        if let Some(slot) = state.slots.get_mut(&slot_id) {
            slot.is_available = false;
        }
        Ok(())
    }

    async fn claim_if_available(&self, slot_id: SlotId) -> Result<bool, SlotRepositoryError> {
        let mut state = self.lock();
        if let Some(message) = state.enter(Operation::ClaimSlot) {
            return Err(SlotRepositoryError::query(message));
        }
        match state.slots.get_mut(&slot_id) {
            Some(slot) if slot.is_available => {
                slot.is_available = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryBackend {
    async fn insert(
        &self,
        appointment: &NewAppointment,
    ) -> Result<Appointment, AppointmentRepositoryError> {
        let mut state = self.lock();
        if let Some(message) = state.enter(Operation::InsertAppointment) {
            return Err(AppointmentRepositoryError::query(message));
        }
        if !state.pets.iter().any(|pet| pet.id == appointment.pet_id) {
            return Err(foreign_key_violation("pets_id"));
        }
        if !state
            .services
            .iter()
            .any(|service| service.id == appointment.service_id)
        {
            return Err(foreign_key_violation("services_id"));
        }
        if !state.slots.contains_key(&appointment.slot_id) {
            return Err(foreign_key_violation("slot_id"));
        }

        let next_id = i64::try_from(state.appointments.len())
            .map_or(i64::MAX, |count| count.saturating_add(1));
        let stored = Appointment {
            id: AppointmentId::new(next_id),
            pet_id: appointment.pet_id,
            service_id: appointment.service_id,
            slot_id: appointment.slot_id,
        };
        state.appointments.push(stored.clone());
        Ok(stored)
    }
}

fn foreign_key_violation(column: &str) -> AppointmentRepositoryError {
    AppointmentRepositoryError::query(format!(
        "insert violates foreign key constraint on {column}"
    ))
}

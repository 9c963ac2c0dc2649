//! Wire shapes for the auth and table endpoints.
//!
//! Responses decode into these DTOs first and are then mapped into domain
//! records in one pass; mapping failures are reported as strings and turned
//! into decode errors by the caller.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::domain::ports::ProfileRecord;
use crate::domain::{
    AccessToken, Appointment, AppointmentId, DisplayName, Email, NewAppointment, Pet, PetId,
    Role, Service, ServiceId, Session, SessionUser, Slot, SlotId, UserId,
};

/// Error payloads from either endpoint family.
///
/// GoTrue uses `error_description` or `msg`; PostgREST uses `message`.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorBodyDto {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBodyDto {
    pub(super) fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
            .filter(|message| !message.trim().is_empty())
    }
}

#[derive(Debug, Serialize)]
pub(super) struct PasswordGrantDto<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct AuthUserDto {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl AuthUserDto {
    pub(super) fn into_session_user(self) -> Result<SessionUser, String> {
        let id = UserId::new(&self.id).map_err(|err| format!("user id {}: {err}", self.id))?;
        let email = self
            .email
            .filter(|email| !email.trim().is_empty())
            .map(Email::issued);
        Ok(SessionUser { id, email })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct TokenResponseDto {
    access_token: String,
    user: AuthUserDto,
}

impl TokenResponseDto {
    pub(super) fn into_session(self) -> Result<Session, String> {
        Ok(Session {
            user: self.user.into_session_user()?,
            access_token: AccessToken::new(self.access_token),
        })
    }
}

/// Sign-up replies with a session when no confirmation is required, and with
/// the bare or wrapped user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum SignUpResponseDto {
    Session(TokenResponseDto),
    Wrapped { user: AuthUserDto },
    Bare(AuthUserDto),
}

#[derive(Debug, Deserialize)]
pub(super) struct RoleNameDto {
    name: String,
}

/// One row of the `users` profile table.
///
/// The role is read from the `role` column; a `roles(name)` join is
/// accepted as the same field. A row with neither is rejected. Names are
/// copied through unchanged.
#[derive(Debug, Deserialize)]
pub(super) struct ProfileRowDto {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    roles: Option<RoleNameDto>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    pets: Option<Vec<PetRowDto>>,
}

impl ProfileRowDto {
    pub(super) fn into_record(self) -> Result<ProfileRecord, String> {
        let role = self
            .role
            .or(self.roles.map(|roles| roles.name))
            .filter(|role| !role.trim().is_empty())
            .map(Role::from)
            .ok_or_else(|| "profile row has no role".to_owned())?;
        let display_name = self
            .name
            .filter(|name| !name.trim().is_empty())
            .map(DisplayName::stored);
        let pets = self
            .pets
            .unwrap_or_default()
            .into_iter()
            .map(PetRowDto::into_pet)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ProfileRecord {
            role,
            display_name,
            pets,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct PetRowDto {
    id: i64,
    owner_id: String,
    name: String,
    #[serde(default)]
    species: Option<String>,
}

impl PetRowDto {
    pub(super) fn into_pet(self) -> Result<Pet, String> {
        let owner_id = UserId::new(&self.owner_id)
            .map_err(|err| format!("pet {} owner {}: {err}", self.id, self.owner_id))?;
        Ok(Pet {
            id: PetId::new(self.id),
            owner_id,
            name: self.name,
            species: self.species,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ServiceRowDto {
    id: i64,
    description: String,
}

impl From<ServiceRowDto> for Service {
    fn from(row: ServiceRowDto) -> Self {
        Self {
            id: ServiceId::new(row.id),
            description: row.description,
        }
    }
}

fn available_by_default() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub(super) struct SlotRowDto {
    id: i64,
    date: NaiveDate,
    start_time: NaiveTime,
    #[serde(default = "available_by_default")]
    is_available: bool,
}

impl From<SlotRowDto> for Slot {
    fn from(row: SlotRowDto) -> Self {
        Self {
            id: SlotId::new(row.id),
            date: row.date,
            start_time: row.start_time,
            is_available: row.is_available,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct SlotAvailabilityDto {
    pub(super) is_available: bool,
}

/// Insert payload; column names follow the table's `pets_id` and
/// `services_id` foreign keys.
#[derive(Debug, Serialize)]
pub(super) struct NewAppointmentDto {
    pets_id: i64,
    services_id: i64,
    slot_id: i64,
}

impl From<&NewAppointment> for NewAppointmentDto {
    fn from(row: &NewAppointment) -> Self {
        Self {
            pets_id: row.pet_id.get(),
            services_id: row.service_id.get(),
            slot_id: row.slot_id.get(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct AppointmentRowDto {
    id: i64,
    pets_id: i64,
    services_id: i64,
    slot_id: i64,
}

impl From<AppointmentRowDto> for Appointment {
    fn from(row: AppointmentRowDto) -> Self {
        Self {
            id: AppointmentId::new(row.id),
            pet_id: PetId::new(row.pets_id),
            service_id: ServiceId::new(row.services_id),
            slot_id: SlotId::new(row.slot_id),
        }
    }
}

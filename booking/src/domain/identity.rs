//! The enriched identity of the signed-in user.
//!
//! An [`Identity`] is always the merge of two sources: the session authority
//! supplies `id` and `email`; the `users` profile row supplies role, display
//! name and the owned pets. Nothing else writes these fields.

use crate::domain::ports::ProfileRecord;
use crate::domain::{DisplayName, Email, PetId, Role, SessionUser, UserId};

/// A pet owned by a user. Read-only from the booking core's perspective.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pet {
    /// Row id in `pets`.
    pub id: PetId,
    /// User who owns the pet.
    pub owner_id: UserId,
    /// Name shown in the pet picker.
    pub name: String,
    /// Free-text species, when recorded.
    pub species: Option<String>,
}

/// How much of the profile was loaded into an [`Identity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileDepth {
    /// Role, display name and pets were all read.
    Full,
    /// Only the role was read, straight after interactive sign-in.
    RoleOnly,
}

/// Enriched representation of the authenticated user.
///
/// ## Invariants
/// - `id` and `email` come from the session authority only.
/// - `role`, `display_name` and `pets` come from the profile lookup only.
/// - A [`ProfileDepth::RoleOnly`] identity has no pets and no display name;
///   callers needing pets must run a full resolve first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    id: UserId,
    email: Option<Email>,
    role: Role,
    display_name: Option<DisplayName>,
    pets: Vec<Pet>,
    depth: ProfileDepth,
}

impl Identity {
    /// Merge a session user with a full profile row.
    pub fn from_profile(user: SessionUser, profile: ProfileRecord) -> Self {
        let SessionUser { id, email } = user;
        let ProfileRecord {
            role,
            display_name,
            pets,
        } = profile;
        Self {
            id,
            email,
            role,
            display_name,
            pets,
            depth: ProfileDepth::Full,
        }
    }

    /// Build the narrower identity produced right after sign-in.
    pub fn role_only(user: SessionUser, role: Role) -> Self {
        let SessionUser { id, email } = user;
        Self {
            id,
            email,
            role,
            display_name: None,
            pets: Vec::new(),
            depth: ProfileDepth::RoleOnly,
        }
    }

    /// Identifier issued by the session authority.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Email issued by the session authority, when the account has one.
    pub fn email(&self) -> Option<&Email> {
        self.email.as_ref()
    }

    /// Role from the profile row.
    pub fn role(&self) -> &Role {
        &self.role
    }

    /// Display name from the profile row.
    pub fn display_name(&self) -> Option<&DisplayName> {
        self.display_name.as_ref()
    }

    /// Owned pets in profile order. Empty for role-only identities.
    pub fn pets(&self) -> &[Pet] {
        &self.pets
    }

    /// How much of the profile backs this identity.
    pub fn depth(&self) -> ProfileDepth {
        self.depth
    }

    /// Whether the pet list has not been loaded yet.
    pub fn is_partial(&self) -> bool {
        self.depth == ProfileDepth::RoleOnly
    }
}

/// Identity as published to consumers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IdentityState {
    /// No resolution has completed yet.
    #[default]
    Unknown,
    /// Resolution completed without a usable identity.
    SignedOut,
    /// A user is signed in.
    SignedIn(Identity),
}

impl IdentityState {
    /// The signed-in identity, if any.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::SignedIn(identity) => Some(identity),
            Self::Unknown | Self::SignedOut => None,
        }
    }
}

impl From<Option<Identity>> for IdentityState {
    fn from(value: Option<Identity>) -> Self {
        value.map_or(Self::SignedOut, Self::SignedIn)
    }
}

//! Domain types for CHOIR account attributes.
//!
//! [`AccountDetails`] is the attribute bag shared by the cache, the storage
//! provider and the remote participant record. Every attribute is optional:
//! `None` is unset, `Some(String::new())` is present but empty.
//!
//! A bag never changes once handed out. Updates go through the consuming
//! `with_*` builders or produce a new bag ([`AccountDetails::merged`],
//! [`AccountDetails::restricted_to`], [`AccountDetails::applying`]).

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Opaque identifier of one account / study participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Descriptor of a single account attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKey {
    /// The owner id of the bag. Always kept by [`AccountDetails::restricted_to`].
    UserId,
    Name,
    Email,
    PhoneNumber,
    Organization,
    AddressStreet,
    AddressCity,
    AddressState,
    AddressPostalCode,
    PreferredCommunication,
}

impl AccountKey {
    pub const ALL: [AccountKey; 10] = [
        AccountKey::UserId,
        AccountKey::Name,
        AccountKey::Email,
        AccountKey::PhoneNumber,
        AccountKey::Organization,
        AccountKey::AddressStreet,
        AccountKey::AddressCity,
        AccountKey::AddressState,
        AccountKey::AddressPostalCode,
        AccountKey::PreferredCommunication,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKey::UserId => "user_id",
            AccountKey::Name => "name",
            AccountKey::Email => "email",
            AccountKey::PhoneNumber => "phone_number",
            AccountKey::Organization => "organization",
            AccountKey::AddressStreet => "address_street",
            AccountKey::AddressCity => "address_city",
            AccountKey::AddressState => "address_state",
            AccountKey::AddressPostalCode => "address_postal_code",
            AccountKey::PreferredCommunication => "preferred_communication",
        }
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of attribute descriptors a caller declared interest in.
pub type KeySet = BTreeSet<AccountKey>;

/// How a participant prefers to be contacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunicationPreference {
    Email,
    Phone,
    Text,
    Mail,
}

impl fmt::Display for CommunicationPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommunicationPreference::Email => write!(f, "email"),
            CommunicationPreference::Phone => write!(f, "phone"),
            CommunicationPreference::Text => write!(f, "text"),
            CommunicationPreference::Mail => write!(f, "mail"),
        }
    }
}

// ---------------------------------------------------------------------------
// Attribute bag
// ---------------------------------------------------------------------------

/// Given and family name of a participant.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersonName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
}

impl PersonName {
    pub fn new(given_name: Option<String>, family_name: Option<String>) -> Self {
        Self {
            given_name,
            family_name,
        }
    }

    /// `"Given Family"`, skipping missing or empty parts.
    pub fn formatted(&self) -> String {
        [self.given_name.as_deref(), self.family_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Sparse, typed record of account attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<PersonName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    address_street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    address_city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    address_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    address_postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    preferred_communication: Option<CommunicationPreference>,
}

impl AccountDetails {
    pub fn new() -> Self {
        Self::default()
    }

    /// Placeholder written when a refresh fails: only the owner id is set.
    pub fn degraded(account_id: &AccountId) -> Self {
        Self::new().with_user_id(account_id.as_str())
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn name(&self) -> Option<&PersonName> {
        self.name.as_ref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }

    pub fn organization(&self) -> Option<&str> {
        self.organization.as_deref()
    }

    pub fn address_street(&self) -> Option<&str> {
        self.address_street.as_deref()
    }

    pub fn address_city(&self) -> Option<&str> {
        self.address_city.as_deref()
    }

    pub fn address_state(&self) -> Option<&str> {
        self.address_state.as_deref()
    }

    pub fn address_postal_code(&self) -> Option<&str> {
        self.address_postal_code.as_deref()
    }

    pub fn preferred_communication(&self) -> Option<CommunicationPreference> {
        self.preferred_communication
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_name(mut self, name: PersonName) -> Self {
        self.name = Some(name);
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = Some(phone_number.into());
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn with_address_street(mut self, street: impl Into<String>) -> Self {
        self.address_street = Some(street.into());
        self
    }

    pub fn with_address_city(mut self, city: impl Into<String>) -> Self {
        self.address_city = Some(city.into());
        self
    }

    pub fn with_address_state(mut self, state: impl Into<String>) -> Self {
        self.address_state = Some(state.into());
        self
    }

    pub fn with_address_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.address_postal_code = Some(postal_code.into());
        self
    }

    pub fn with_preferred_communication(mut self, preference: CommunicationPreference) -> Self {
        self.preferred_communication = Some(preference);
        self
    }

    /// Returns the bag with `key` unset.
    pub fn without(mut self, key: AccountKey) -> Self {
        match key {
            AccountKey::UserId => self.user_id = None,
            AccountKey::Name => self.name = None,
            AccountKey::Email => self.email = None,
            AccountKey::PhoneNumber => self.phone_number = None,
            AccountKey::Organization => self.organization = None,
            AccountKey::AddressStreet => self.address_street = None,
            AccountKey::AddressCity => self.address_city = None,
            AccountKey::AddressState => self.address_state = None,
            AccountKey::AddressPostalCode => self.address_postal_code = None,
            AccountKey::PreferredCommunication => self.preferred_communication = None,
        }
        self
    }

    pub fn is_set(&self, key: AccountKey) -> bool {
        match key {
            AccountKey::UserId => self.user_id.is_some(),
            AccountKey::Name => self.name.is_some(),
            AccountKey::Email => self.email.is_some(),
            AccountKey::PhoneNumber => self.phone_number.is_some(),
            AccountKey::Organization => self.organization.is_some(),
            AccountKey::AddressStreet => self.address_street.is_some(),
            AccountKey::AddressCity => self.address_city.is_some(),
            AccountKey::AddressState => self.address_state.is_some(),
            AccountKey::AddressPostalCode => self.address_postal_code.is_some(),
            AccountKey::PreferredCommunication => self.preferred_communication.is_some(),
        }
    }

    /// Keys that are set in this bag.
    pub fn keys(&self) -> KeySet {
        AccountKey::ALL
            .into_iter()
            .filter(|key| self.is_set(*key))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }

    /// Overlay `other` onto this bag; values set in `other` win.
    pub fn merged(mut self, other: &AccountDetails) -> Self {
        for key in other.keys() {
            self.adopt(other, key);
        }
        self
    }

    /// Projection onto `keys`. The owner id is always carried over.
    pub fn restricted_to(&self, keys: &KeySet) -> Self {
        let mut projected = Self::new();
        projected.adopt(self, AccountKey::UserId);
        for key in keys {
            projected.adopt(self, *key);
        }
        projected
    }

    /// Apply `modifications`: overlay the modified values, then unset removed keys.
    pub fn applying(self, modifications: &AccountModifications) -> Self {
        let merged = self.merged(&modifications.modified);
        modifications
            .removed
            .iter()
            .fold(merged, |details, key| details.without(*key))
    }

    fn adopt(&mut self, other: &AccountDetails, key: AccountKey) {
        match key {
            AccountKey::UserId => self.user_id = other.user_id.clone(),
            AccountKey::Name => self.name = other.name.clone(),
            AccountKey::Email => self.email = other.email.clone(),
            AccountKey::PhoneNumber => self.phone_number = other.phone_number.clone(),
            AccountKey::Organization => self.organization = other.organization.clone(),
            AccountKey::AddressStreet => self.address_street = other.address_street.clone(),
            AccountKey::AddressCity => self.address_city = other.address_city.clone(),
            AccountKey::AddressState => self.address_state = other.address_state.clone(),
            AccountKey::AddressPostalCode => {
                self.address_postal_code = other.address_postal_code.clone()
            }
            AccountKey::PreferredCommunication => {
                self.preferred_communication = other.preferred_communication
            }
        }
    }
}

/// A partial update: values to overlay plus keys to unset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountModifications {
    #[serde(default)]
    pub modified: AccountDetails,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub removed: KeySet,
}

impl AccountModifications {
    pub fn new(modified: AccountDetails) -> Self {
        Self {
            modified,
            removed: KeySet::new(),
        }
    }

    pub fn removing(mut self, key: AccountKey) -> Self {
        self.removed.insert(key);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.modified.is_empty() && self.removed.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

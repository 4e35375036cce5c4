//! The remote participant record and its mapping to [`AccountDetails`].

use serde::{Deserialize, Serialize};

use crate::types::{AccountDetails, PersonName};

/// Participant record as exchanged with the CHOIR site (camelCase JSON).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_phone: Option<String>,
}

impl Participant {
    /// Project the remote record into an attribute bag.
    ///
    /// The phone attribute prefers the mobile number and falls back to the
    /// home number. The owner id is not part of the remote record.
    pub fn to_account_details(&self) -> AccountDetails {
        let mut details = AccountDetails::new();
        if self.first_name.is_some() || self.last_name.is_some() {
            details = details.with_name(PersonName::new(
                self.first_name.clone(),
                self.last_name.clone(),
            ));
        }
        if let Some(email) = &self.email {
            details = details.with_email(email.clone());
        }
        if let Some(phone) = self.mobile_phone.as_ref().or(self.home_phone.as_ref()) {
            details = details.with_phone_number(phone.clone());
        }
        details
    }

    /// Build the record pushed on store. Missing attributes are sent as empty
    /// strings; the phone number is sent as the mobile number.
    pub fn from_account_details(details: &AccountDetails) -> Self {
        let name = details.name();
        Self {
            first_name: Some(
                name.and_then(|n| n.given_name.clone())
                    .unwrap_or_default(),
            ),
            last_name: Some(
                name.and_then(|n| n.family_name.clone())
                    .unwrap_or_default(),
            ),
            email: Some(details.email().unwrap_or_default().to_owned()),
            mobile_phone: Some(details.phone_number().unwrap_or_default().to_owned()),
            home_phone: None,
        }
    }
}

//! Addresses and requester contact details carried by tasks.

use super::LocationId;
use serde::{Deserialize, Serialize};

/// A pickup or dropoff address, usually one of the saved locations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Location identifier in the remote store.
    pub id: LocationId,
    /// Display name for saved locations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// First address line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line1: Option<String>,
    /// Second address line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    /// Electoral ward.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ward: Option<String>,
    /// Town or city.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub town: Option<String>,
    /// County.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    /// Country.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Postal code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
}

impl Location {
    /// Creates a location with only a display name set.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Person who requested the delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequesterContact {
    /// Requester name; may be empty while the task is being filled in.
    pub name: String,
    /// Requester telephone number; may be empty.
    pub telephone_number: String,
}

impl RequesterContact {
    /// Creates a requester contact.
    #[must_use]
    pub fn new(name: impl Into<String>, telephone_number: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            telephone_number: telephone_number.into(),
        }
    }
}

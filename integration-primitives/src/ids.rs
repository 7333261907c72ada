//! Identifier types.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

const MAX_SERVICE_ID_LEN: usize = 128;

/// Unique identifier of a service within the registry.
///
/// Service ids are caller-chosen strings (tool ids are reused verbatim), so
/// validation only rejects blank values, surrounding whitespace, and
/// overlong identifiers.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceId(String);

impl ServiceId {
    /// Creates a service identifier after validating it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidServiceId`] if the identifier is empty, padded
    /// with whitespace, or longer than 128 bytes.
    pub fn new(id: impl Into<String>) -> Result<Self, Error> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::InvalidServiceId {
                id,
                reason: "identifier cannot be empty".into(),
            });
        }
        if id.trim() != id {
            return Err(Error::InvalidServiceId {
                id,
                reason: "identifier cannot start or end with whitespace".into(),
            });
        }
        if id.len() > MAX_SERVICE_ID_LEN {
            return Err(Error::InvalidServiceId {
                id,
                reason: format!("identifier length must be <= {MAX_SERVICE_ID_LEN}"),
            });
        }
        Ok(Self(id))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ServiceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ServiceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ServiceId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ServiceId> for String {
    fn from(value: ServiceId) -> Self {
        value.0
    }
}

impl FromStr for ServiceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a random identifier.
            #[must_use]
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            #[must_use]
            pub const fn as_uuid(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::random()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::parse_str(s).map_err(Error::from)?;
                Ok(Self::from_uuid(uuid))
            }
        }
    };
}

uuid_id!(
    /// Unique identifier of a published event.
    EventId
);

uuid_id!(
    /// Unique identifier of an event bus subscription.
    SubscriptionId
);

uuid_id!(
    /// Unique identifier of a recorded metric sample.
    SampleId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_event_id() {
        let id = EventId::random();
        let parsed = id.to_string().parse::<EventId>().expect("parse");
        assert_eq!(id, parsed);
    }

    #[test]
    fn rejects_blank_service_id() {
        let err = ServiceId::new("  ").expect_err("blank id");
        assert!(matches!(err, Error::InvalidServiceId { .. }));

        let err = ServiceId::new(" padded").expect_err("padded id");
        assert!(matches!(err, Error::InvalidServiceId { .. }));
    }

    #[test]
    fn service_id_deserialization_validates() {
        let id: ServiceId = serde_json::from_str("\"search-service\"").unwrap();
        assert_eq!(id.as_str(), "search-service");

        assert!(serde_json::from_str::<ServiceId>("\"\"").is_err());
    }
}

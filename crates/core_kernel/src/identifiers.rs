//! Strongly-typed identifiers for domain entities
//!
//! Every aggregate and child row gets its own newtype around a UUID so an
//! invoice id can never be handed to an order lookup. Display renders a short
//! prefix (`ORD-…`, `INV-…`) that `FromStr` accepts back, along with bare UUIDs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates a new time-ordered identifier (v7)
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Strip prefix if present
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

// Party domain identifiers
define_id!(CustomerId, "CUS");
define_id!(UserId, "USR");

// Catalog domain identifiers
define_id!(ProductId, "PRD");

// Sales domain identifiers
define_id!(OrderId, "ORD");
define_id!(OrderLineId, "ORDL");

// Billing domain identifiers
define_id!(InvoiceId, "INV");
define_id!(InvoiceLineId, "INVL");
define_id!(PaymentId, "PAY");
define_id!(PaymentApplicationId, "PAPP");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_display() {
        let id = OrderId::new();
        assert!(id.to_string().starts_with("ORD-"));
    }

    #[test]
    fn test_line_prefix_does_not_shadow_parent() {
        let id = OrderLineId::new_v7();
        let display = id.to_string();
        assert!(display.starts_with("ORDL-"));
        assert!(display.parse::<OrderId>().is_err());
    }

    #[test]
    fn test_id_parsing_accepts_bare_uuid() {
        let uuid = Uuid::now_v7();
        let parsed: InvoiceId = uuid.to_string().parse().unwrap();
        assert_eq!(parsed.as_uuid(), &uuid);
    }

    #[test]
    fn test_id_parsing_round_trip() {
        let original = PaymentApplicationId::new_v7();
        let parsed: PaymentApplicationId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_uuid_conversion() {
        let uuid = Uuid::new_v4();
        let customer_id = CustomerId::from(uuid);
        let back: Uuid = customer_id.into();
        assert_eq!(uuid, back);
    }
}

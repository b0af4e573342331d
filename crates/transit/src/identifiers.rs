//! Identifiers for vehicles, stops and routes as the location service names
//! them. Backed by `Arc<str>`, so snapshots can clone them freely.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

macro_rules! impl_identifier {
    ($name:ident) => {
        #[derive(Clone, Debug)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(s: impl AsRef<str>) -> Self {
                Self(s.as_ref().into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.0.hash(state);
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                self.0.cmp(&other.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        // Hash, Eq and Ord all defer to the string, so lookups by `&str` agree.
        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }
    };
}

impl_identifier!(VehicleIdentifier);
impl_identifier!(StopIdentifier);
impl_identifier!(RouteNumber);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_equality() {
        let id1 = VehicleIdentifier::new("bus1");
        let id2 = VehicleIdentifier::new("bus1");
        let id3 = id1.clone();

        assert_eq!(id1, id2);
        assert_eq!(id1, id3);
        assert!(Arc::ptr_eq(&id1.0, &id3.0)); // Clone shares Arc
        assert_ne!(id1, VehicleIdentifier::new("bus2"));
    }

    #[test]
    fn test_lookup_by_str() {
        use std::collections::HashMap;

        let mut positions = HashMap::new();
        positions.insert(VehicleIdentifier::new("bus1"), (18.71, -76.01));

        assert_eq!(positions.get("bus1"), Some(&(18.71, -76.01)));
        assert_eq!(positions.get(&VehicleIdentifier::new("bus1")), Some(&(18.71, -76.01)));
        assert!(!positions.contains_key("bus2"));
    }

    #[test]
    fn test_identifier_ordering() {
        let mut ids = vec![VehicleIdentifier::new("b"), VehicleIdentifier::new("a")];
        ids.sort();
        assert_eq!(ids[0].as_str(), "a");
    }

    #[test]
    fn test_identifier_display() {
        let id = RouteNumber::new("R001");
        assert_eq!(format!("{}", id), "R001");
    }

    #[test]
    fn test_identifier_conversions() {
        let from_str: StopIdentifier = "HWT-001".into();
        let from_string: StopIdentifier = String::from("HWT-001").into();
        assert_eq!(from_str, from_string);
        assert_eq!(from_str.as_ref(), "HWT-001");
    }
}

use serde::{Deserialize, Serialize};

macro_rules! impl_uuid {
    ($struct_name:ty) => {
        impl $struct_name {
            pub fn now_v7() -> Self {
                Self {
                    inner: uuid::Uuid::now_v7(),
                }
            }

            pub fn is_nil(&self) -> bool {
                self.inner.is_nil()
            }
        }

        impl From<uuid::Uuid> for $struct_name {
            fn from(value: uuid::Uuid) -> Self {
                Self { inner: value }
            }
        }

        impl std::fmt::Display for $struct_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.inner.fmt(f)
            }
        }
    };
}

/// Identity of a model element.
#[derive(Clone, Copy, Debug, Hash, PartialOrd, Ord, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelUuid {
    inner: uuid::Uuid,
}

impl_uuid!(ModelUuid);

/// Identity of a presentation (diagram item, property page, ...).
#[derive(Clone, Copy, Debug, Hash, PartialOrd, Ord, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewUuid {
    inner: uuid::Uuid,
}

impl_uuid!(ViewUuid);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_uuids_differ() {
        let a = ModelUuid::now_v7();
        let b = ModelUuid::now_v7();
        assert_ne!(a, b);
        assert!(!a.is_nil());
    }

    #[test]
    fn display_matches_inner() {
        let inner = uuid::Uuid::nil();
        let v = ViewUuid::from(inner);
        assert!(v.is_nil());
        assert_eq!(v.to_string(), inner.to_string());
    }
}

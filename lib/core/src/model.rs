use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

/// Short stable code identifying a trait
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraitId(String);

/// Short stable code identifying an item
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

macro_rules! string_id {
    ($ty:ident) => {
        impl $ty {
            #[inline]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Borrow<str> for $ty {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $ty {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $ty {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(TraitId);
string_id!(ItemId);

/// A single askable attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trait {
    pub id: TraitId,
    /// Human readable prompt, e.g. "Chekhovs Gun"
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
}

impl Trait {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<TraitId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            url: String::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

/// A recommendable film, book or show
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub trait_ids: BTreeSet<TraitId>,
}

impl Item {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: String::new(),
            trait_ids: BTreeSet::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_trait(mut self, trait_id: impl Into<TraitId>) -> Self {
        self.trait_ids.insert(trait_id.into());
        self
    }

    #[must_use]
    pub fn with_traits<I, T>(mut self, trait_ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TraitId>,
    {
        self.trait_ids.extend(trait_ids.into_iter().map(Into::into));
        self
    }

    #[inline]
    pub fn has_trait(&self, trait_id: &str) -> bool {
        self.trait_ids.contains(trait_id)
    }
}

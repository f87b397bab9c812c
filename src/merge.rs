//! Keyed merge of search results.
//!
//! [`ResultSet`] holds at most one entity per unique key. Entries keep the
//! position of their first insertion; a later insert with the same key
//! replaces the stored value (last write wins).

use std::collections::HashMap;

use crate::models::{Organization, User};

/// An entity with an identity used for deduplication.
pub trait Keyed {
    fn unique_key(&self) -> &str;
}

impl Keyed for Organization {
    fn unique_key(&self) -> &str {
        &self.org_id
    }
}

impl Keyed for User {
    fn unique_key(&self) -> &str {
        &self.email_address
    }
}

/// Insertion-ordered map from unique key to entity.
#[derive(Debug, Clone)]
pub struct ResultSet<T> {
    index: HashMap<String, usize>,
    items: Vec<T>,
}

impl<T: Keyed> ResultSet<T> {
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            items: Vec::new(),
        }
    }

    /// Insert or replace by unique key.
    pub fn insert(&mut self, item: T) {
        let existing = self.index.get(item.unique_key()).copied();
        match existing {
            Some(pos) => self.items[pos] = item,
            None => {
                self.index
                    .insert(item.unique_key().to_string(), self.items.len());
                self.items.push(item);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: Keyed> Default for ResultSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Keyed> Extend<T> for ResultSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}

impl<T: Keyed> FromIterator<T> for ResultSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = ResultSet::new();
        set.extend(iter);
        set
    }
}

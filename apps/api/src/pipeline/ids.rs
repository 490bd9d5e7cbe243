//! Id allocation for backend-produced lists.
//!
//! The backend is asked for ids but may omit or repeat them. An `IdAllocator` is created
//! per pipeline run and shared (cheaply cloned) by every stage of that run; its counter
//! is monotonic, so ids it issues never repeat within the run.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::models::{CareerPath, DevelopmentAction};

/// Something in a list that must carry a unique id.
pub trait Identified {
    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    /// Human-readable basis for a generated id.
    fn id_label(&self) -> &str;
}

impl Identified for CareerPath {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn id_label(&self) -> &str {
        &self.title
    }
}

impl Identified for DevelopmentAction {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn id_label(&self) -> &str {
        self.action_type.label()
    }
}

#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: Arc<AtomicU64>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    fn issue(&self, label: &str) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{}", slugify(label), n)
    }

    /// Gives every item with a blank or repeated id a freshly issued one.
    /// Returns how many ids were replaced.
    pub fn backfill<T: Identified>(&self, items: &mut [T]) -> usize {
        let mut seen: HashSet<String> = HashSet::new();
        let mut replaced = 0;

        for item in items.iter_mut() {
            let current = item.id().trim().to_string();
            if !current.is_empty() && seen.insert(current) {
                continue;
            }

            let mut fresh = self.issue(item.id_label());
            while !seen.insert(fresh.clone()) {
                fresh = self.issue(item.id_label());
            }
            item.set_id(fresh);
            replaced += 1;
        }

        replaced
    }
}

/// Lowercase ASCII alphanumerics joined by single dashes. Falls back to `item`.
pub fn slugify(label: &str) -> String {
    let slug = label
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        "item".to_string()
    } else {
        slug
    }
}

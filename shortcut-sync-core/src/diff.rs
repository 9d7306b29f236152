//! Set difference between the shortcuts the catalog asks for and the ones the lake already has.

use std::collections::HashSet;
use std::fmt;

use crate::contract::{ExistingShortcut, NormalizedShortcutRequest};

/// Path-qualified shortcut identity: `Tables/{schema}/{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShortcutKey(String);

impl ShortcutKey {
    pub fn new(path: &str, name: &str) -> Self {
        Self(format!("{}/{}", path.trim_end_matches('/'), name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShortcutKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&ExistingShortcut> for ShortcutKey {
    fn from(s: &ExistingShortcut) -> Self {
        ShortcutKey::new(&s.path, &s.name)
    }
}

impl From<&NormalizedShortcutRequest> for ShortcutKey {
    fn from(r: &NormalizedShortcutRequest) -> Self {
        ShortcutKey::new(&r.target_path, &r.desired_name)
    }
}

/// Snapshot of the shortcuts present in the lakehouse at the start of a run.
#[derive(Debug, Clone, Default)]
pub struct ShortcutSet {
    keys: HashSet<ShortcutKey>,
}

impl ShortcutSet {
    pub fn contains(&self, key: &ShortcutKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<'a> FromIterator<&'a ExistingShortcut> for ShortcutSet {
    fn from_iter<I: IntoIterator<Item = &'a ExistingShortcut>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().map(ShortcutKey::from).collect(),
        }
    }
}

impl FromIterator<ShortcutKey> for ShortcutSet {
    fn from_iter<I: IntoIterator<Item = ShortcutKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Create,
    SkipExisting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub request: NormalizedShortcutRequest,
    pub decision: Decision,
}

impl WorkItem {
    pub fn key(&self) -> ShortcutKey {
        ShortcutKey::from(&self.request)
    }
}

/// Disjoint split of the requests, each side in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub to_create: Vec<NormalizedShortcutRequest>,
    pub to_skip: Vec<NormalizedShortcutRequest>,
}

impl Partition {
    /// Every request tagged with its decision, creations first.
    pub fn into_work_items(self) -> Vec<WorkItem> {
        let create = self.to_create.into_iter().map(|request| WorkItem {
            request,
            decision: Decision::Create,
        });
        let skip = self.to_skip.into_iter().map(|request| WorkItem {
            request,
            decision: Decision::SkipExisting,
        });
        create.chain(skip).collect()
    }
}

/// Incremental form of [`decide`]: remembers which keys have already been claimed.
#[derive(Debug)]
pub struct Decider<'a> {
    existing: &'a ShortcutSet,
    claimed: HashSet<ShortcutKey>,
}

impl<'a> Decider<'a> {
    pub fn new(existing: &'a ShortcutSet) -> Self {
        Self {
            existing,
            claimed: HashSet::new(),
        }
    }

    pub fn decide(&mut self, request: NormalizedShortcutRequest) -> WorkItem {
        let key = ShortcutKey::from(&request);
        let decision = if self.existing.contains(&key) || !self.claimed.insert(key) {
            Decision::SkipExisting
        } else {
            Decision::Create
        };
        WorkItem { request, decision }
    }
}

/// Tags each request, keeping input order. A request is `Create` when its key is not in
/// `existing`; a key requested twice is created once and later duplicates are skipped.
pub fn decide(requests: Vec<NormalizedShortcutRequest>, existing: &ShortcutSet) -> Vec<WorkItem> {
    let mut decider = Decider::new(existing);
    requests
        .into_iter()
        .map(|request| decider.decide(request))
        .collect()
}

pub fn diff(requests: Vec<NormalizedShortcutRequest>, existing: &ShortcutSet) -> Partition {
    let mut partition = Partition::default();
    for item in decide(requests, existing) {
        match item.decision {
            Decision::Create => partition.to_create.push(item.request),
            Decision::SkipExisting => partition.to_skip.push(item.request),
        }
    }
    partition
}

use std::collections::{HashMap, HashSet, VecDeque};

use crate::types::{ItemData, ItemKind, PropertyClass};

/// A read-only index over the items of one package.
///
/// The index is not a store: it borrows the validated item payloads and
/// answers lookups by identifier, by kind, and along `specializes` chains.
///
/// Items are indexed by `id`. When two items share an id, the first one wins
/// for lookups and the clash is recorded in [`GraphIndex::duplicates`].
#[derive(Debug, Default)]
pub struct GraphIndex<'a> {
    items: Vec<&'a ItemData>,
    by_id: HashMap<&'a str, usize>,
    duplicates: Vec<Duplicate>,
}

/// Two items sharing one identifier; positions are in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicate {
    pub id: String,
    pub first: usize,
    pub second: usize,
}

impl<'a> GraphIndex<'a> {
    pub fn new(items: impl IntoIterator<Item = &'a ItemData>) -> Self {
        let mut index = Self::default();
        for data in items {
            index.add(data);
        }
        index
    }

    fn add(&mut self, data: &'a ItemData) {
        let position = self.items.len();
        self.items.push(data);
        let Some(ident) = data.identifiable() else {
            return;
        };
        match self.by_id.get(ident.id.as_str()) {
            Some(&first) => self.duplicates.push(Duplicate {
                id: ident.id.clone(),
                first,
                second: position,
            }),
            None => {
                self.by_id.insert(&ident.id, position);
            }
        }
    }

    /// Retrieve an item by id.
    pub fn get(&self, id: &str) -> Option<&'a ItemData> {
        self.by_id.get(id).map(|&i| self.items[i])
    }

    /// Retrieve an item by id, only if it is of `kind`.
    pub fn get_kind(&self, id: &str, kind: ItemKind) -> Option<&'a ItemData> {
        self.get(id).filter(|d| d.kind() == kind)
    }

    pub fn property_class(&self, id: &str) -> Option<&'a PropertyClass> {
        match self.get(id) {
            Some(ItemData::PropertyClass(p)) => Some(p),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Every indexed item, in insertion order.
    pub fn items(&self) -> impl Iterator<Item = &'a ItemData> + '_ {
        self.items.iter().copied()
    }

    /// All items of a given kind, in insertion order.
    pub fn by_kind(&self, kind: ItemKind) -> Vec<&'a ItemData> {
        self.items().filter(|d| d.kind() == kind).collect()
    }

    pub fn duplicates(&self) -> &[Duplicate] {
        &self.duplicates
    }

    /// The classes `id` specializes, nearest first. Stops at the first
    /// unresolved parent or at the first repeat.
    pub fn ancestors(&self, id: &str) -> Vec<&'a ItemData> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut result = Vec::new();
        visited.insert(id);
        let mut current = self.get(id);
        while let Some(parent_id) = current
            .and_then(ItemData::identifiable)
            .and_then(|i| i.specializes.as_deref())
        {
            if !visited.insert(parent_id) {
                break;
            }
            let Some(parent) = self.get(parent_id) else {
                break;
            };
            result.push(parent);
            current = Some(parent);
        }
        result
    }

    /// `id` followed by the ids of its ancestors.
    pub fn lineage(&self, id: &str) -> Vec<&'a str> {
        let mut ids: Vec<&'a str> = Vec::new();
        if let Some(ident) = self.get(id).and_then(ItemData::identifiable) {
            ids.push(&ident.id);
        }
        ids.extend(
            self.ancestors(id)
                .into_iter()
                .filter_map(ItemData::identifiable)
                .map(|i| i.id.as_str()),
        );
        ids
    }

    /// Whether `class` is `ancestor` or specializes it transitively.
    pub fn is_a(&self, class: &str, ancestor: &str) -> bool {
        class == ancestor || self.lineage(class).contains(&ancestor)
    }

    /// Follow `id`'s `specializes` chain; if it comes back to `id`, return
    /// the path including the closing repeat, e.g. `[a, b, a]`.
    pub fn specialization_cycle(&self, id: &str) -> Option<Vec<String>> {
        let mut path = vec![id.to_string()];
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(id);
        let mut current = id;
        loop {
            let parent = self
                .get(current)?
                .identifiable()?
                .specializes
                .as_deref()?;
            path.push(parent.to_string());
            if parent == id {
                return Some(path);
            }
            if !visited.insert(parent) {
                // A cycle further up the chain; reported from its own members.
                return None;
            }
            current = parent;
        }
    }

    /// First value `f` yields along `id`'s lineage: the item itself, then its
    /// ancestors nearest first.
    pub fn inherited<T>(&self, id: &str, f: impl Fn(&'a ItemData) -> Option<T>) -> Option<T> {
        self.get(id)
            .into_iter()
            .chain(self.ancestors(id))
            .find_map(f)
    }

    /// Classes that specialize `id`, transitively, breadth first.
    pub fn descendants(&self, id: &str) -> Vec<&'a ItemData> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        let mut result: Vec<&'a ItemData> = Vec::new();

        visited.insert(id);
        queue.push_back(id);
        while let Some(current) = queue.pop_front() {
            for child in self.children(current) {
                let Some(ident) = child.identifiable() else {
                    continue;
                };
                if visited.insert(ident.id.as_str()) {
                    queue.push_back(&ident.id);
                    result.push(child);
                }
            }
        }
        result
    }

    fn children(&self, id: &str) -> impl Iterator<Item = &'a ItemData> + '_ {
        let id = id.to_string();
        self.items().filter(move |d| {
            d.identifiable()
                .and_then(|i| i.specializes.as_deref())
                .is_some_and(|parent| parent == id)
        })
    }

    /// Individuals whose class is `class` or one of its descendants.
    pub fn instances_of(&self, class: &str) -> Vec<&'a ItemData> {
        self.items()
            .filter(|d| d.kind().is_individual())
            .filter(|d| d.has_class().is_some_and(|c| self.is_a(c, class)))
            .collect()
    }
}

// --- tests -------------------------------------------------------------------

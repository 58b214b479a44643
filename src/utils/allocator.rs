use serde::{Deserialize, Serialize};

/// Slot index plus the generation the slot had when the id was handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct GenerationalId {
    pub index: usize,
    pub generation: u32,
}

impl GenerationalId {
    pub fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }
}

/// Handle of a body inside a dynamics world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct EntityId(pub GenerationalId);

impl EntityId {
    pub fn new(index: usize, generation: u32) -> Self {
        Self(GenerationalId::new(index, generation))
    }

    /// First-generation handle for slot `index`.
    pub fn from_index(index: u32) -> Self {
        Self::new(index as usize, 0)
    }

    pub fn index(&self) -> usize {
        self.0.index
    }

    pub fn generation(&self) -> u32 {
        self.0.generation
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self(GenerationalId::new(usize::MAX, 0))
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    item: Option<T>,
}

/// Run-scoped store handing out generational ids.
///
/// Bodies are only ever added during setup and dropped all at once, so slots
/// are refilled in order after a [`clear`](Self::clear). Clearing bumps every
/// slot generation: ids of a previous run never resolve in the next one.
#[derive(Debug)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    /// Number of occupied slots; all of them precede every vacant one.
    occupied: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            occupied: 0,
        }
    }

    pub fn insert(&mut self, item: T) -> EntityId {
        let index = self.occupied;
        self.occupied += 1;
        match self.slots.get_mut(index) {
            Some(slot) => {
                slot.item = Some(item);
                EntityId::new(index, slot.generation)
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    item: Some(item),
                });
                EntityId::new(index, 0)
            }
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.item.as_ref())
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.item.as_mut())
    }

    /// Drops every item and invalidates all outstanding ids.
    pub fn clear(&mut self) {
        for slot in &mut self.slots[..self.occupied] {
            slot.item = None;
            slot.generation = slot.generation.wrapping_add(1);
        }
        self.occupied = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.slots[..self.occupied]
            .iter()
            .filter_map(|slot| slot.item.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.slots[..self.occupied]
            .iter_mut()
            .filter_map(|slot| slot.item.as_mut())
    }

    pub fn len(&self) -> usize {
        self.occupied
    }

    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }
}

#[cfg(feature = "parallel")]
impl<T: Send> Arena<T> {
    /// Parallel mutable iteration over occupied slots.
    pub fn par_iter_mut(&mut self) -> impl rayon::iter::ParallelIterator<Item = &mut T> + '_ {
        use rayon::prelude::*;
        self.slots[..self.occupied]
            .par_iter_mut()
            .filter_map(|slot| slot.item.as_mut())
    }
}

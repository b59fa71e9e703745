//! Generational slot storage for circuit entities.
//!
//! Removing an entry bumps its slot's generation before the slot is
//! reused, so an id minted for the old occupant never resolves to the new
//! one.

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Vector of generational slots with a free list.
pub(crate) struct Slots<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T> Slots<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Insert the value built by `make(index, generation)` and return its
    /// `(index, generation)`.
    pub(crate) fn insert_with(&mut self, make: impl FnOnce(u32, u32) -> T) -> (u32, u32) {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    value: None,
                });
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.value = Some(make(index, slot.generation));
        self.live += 1;
        (index, slot.generation)
    }

    pub(crate) fn get(&self, index: u32, generation: u32) -> Option<&T> {
        self.slots
            .get(index as usize)
            .filter(|slot| slot.generation == generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub(crate) fn remove(&mut self, index: u32, generation: u32) -> Option<T> {
        let slot = self.slots.get_mut(index as usize)?;
        if slot.generation != generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index);
        self.live -= 1;
        Some(value)
    }

    pub(crate) fn len(&self) -> usize {
        self.live
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|slot| slot.value.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let mut slots = Slots::new();
        let (i, g) = slots.insert_with(|i, g| (i, g, "a"));
        assert_eq!(slots.get(i, g), Some(&(0, 0, "a")));
        assert_eq!(slots.len(), 1);
    }

    #[test]
    fn stale_generation_does_not_alias_reused_slot() {
        let mut slots = Slots::new();
        let (i, g) = slots.insert_with(|_, _| "old");
        assert_eq!(slots.remove(i, g), Some("old"));
        let (i2, g2) = slots.insert_with(|_, _| "new");
        assert_eq!(i2, i);
        assert_ne!(g2, g);
        assert_eq!(slots.get(i, g), None);
        assert_eq!(slots.remove(i, g), None);
        assert_eq!(slots.get(i2, g2), Some(&"new"));
    }

    #[test]
    fn double_remove_is_none() {
        let mut slots = Slots::new();
        let (i, g) = slots.insert_with(|_, _| 1);
        assert!(slots.remove(i, g).is_some());
        assert!(slots.remove(i, g).is_none());
        assert_eq!(slots.len(), 0);
    }

    #[test]
    fn values_skip_vacant_slots() {
        let mut slots = Slots::new();
        let (a, ga) = slots.insert_with(|_, _| 1);
        slots.insert_with(|_, _| 2);
        slots.remove(a, ga);
        assert_eq!(slots.values().copied().collect::<Vec<_>>(), vec![2]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn removed_ids_never_resolve_again(
                ops in proptest::collection::vec(any::<bool>(), 1..64),
            ) {
                let mut slots = Slots::new();
                let mut live: Vec<(u32, u32)> = Vec::new();
                let mut dead: Vec<(u32, u32)> = Vec::new();
                for (n, insert) in ops.into_iter().enumerate() {
                    if insert || live.is_empty() {
                        live.push(slots.insert_with(|_, _| n));
                    } else {
                        let (i, g) = live.remove(n % live.len());
                        prop_assert!(slots.remove(i, g).is_some());
                        dead.push((i, g));
                    }
                }
                prop_assert_eq!(slots.len(), live.len());
                for &(i, g) in &live {
                    prop_assert!(slots.get(i, g).is_some());
                }
                for &(i, g) in &dead {
                    prop_assert!(slots.get(i, g).is_none());
                }
            }
        }
    }
}

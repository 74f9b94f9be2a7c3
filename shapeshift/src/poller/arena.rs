/// Stable handle of a tracked item.
///
/// A handle names one slot at one generation: once the item is removed the handle
/// goes stale for good, even if the slot is later reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TrackingHandle {
    index: usize,
    generation: u64,
}

#[derive(Debug)]
struct Slot<T> {
    generation: u64,
    value: Option<T>,
}

/// Slots are cleared on removal, never shifted, so live handles keep pointing at their item.
#[derive(Debug)]
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self { slots: Vec::new(), free: Vec::new(), len: 0 }
    }
}

impl<T> Arena<T> {
    pub(crate) fn insert(&mut self, value: T) -> TrackingHandle {
        self.len += 1;
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.generation += 1;
                slot.value = Some(value);
                TrackingHandle { index, generation: slot.generation }
            }
            None => {
                self.slots.push(Slot { generation: 0, value: Some(value) });
                TrackingHandle { index: self.slots.len() - 1, generation: 0 }
            }
        }
    }

    pub(crate) fn get_mut(&mut self, handle: TrackingHandle) -> Option<&mut T> {
        self.slots.get_mut(handle.index).filter(|slot| slot.generation == handle.generation).and_then(|slot| slot.value.as_mut())
    }

    pub(crate) fn get(&self, handle: TrackingHandle) -> Option<&T> {
        self.slots.get(handle.index).filter(|slot| slot.generation == handle.generation).and_then(|slot| slot.value.as_ref())
    }

    pub(crate) fn remove(&mut self, handle: TrackingHandle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index).filter(|slot| slot.generation == handle.generation)?;
        let value = slot.value.take()?;
        self.free.push(handle.index);
        self.len -= 1;
        Some(value)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (TrackingHandle, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            let generation = slot.generation;
            slot.value.as_mut().map(|value| (TrackingHandle { index, generation }, value))
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn drain(&mut self) -> Vec<T> {
        let mut values = Vec::with_capacity(self.len);
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(value) = slot.value.take() {
                self.free.push(index);
                values.push(value);
            }
        }
        self.len = 0;
        values
    }
}

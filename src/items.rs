use std::collections::HashMap;

use crate::types::{ItemKind, Vec2};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub kind: ItemKind,
    pub location: Vec2,
    consumed: bool,
}

impl Item {
    pub fn is_consumed(&self) -> bool {
        self.consumed
    }
}

/// A consumption notification, delivered to every subscriber of the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemEvent {
    pub kind: ItemKind,
    pub location: Vec2,
}

/// Receives consumption notifications stamped with the engine clock.
pub trait ItemEventListener {
    fn on_item_consumed(&mut self, event: &ItemEvent, now_ms: u64);
}

/// Who gets told when an item of a registry is eaten.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Subscriber {
    Player,
    Monster(usize),
}

/// All items of one kind. Records survive consumption so the full history
/// stays queryable.
#[derive(Clone, Debug)]
pub struct ItemRegistry {
    kind: ItemKind,
    items: Vec<Item>,
    by_cell: HashMap<Vec2, usize>,
    subscribers: Vec<Subscriber>,
}

impl ItemRegistry {
    pub fn new(kind: ItemKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
            by_cell: HashMap::new(),
            subscribers: Vec::new(),
        }
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Places an item; a cell holds at most one item of a kind, so placing
    /// twice on the same cell is ignored.
    pub fn place(&mut self, location: Vec2) -> bool {
        if self.by_cell.contains_key(&location) {
            return false;
        }
        self.by_cell.insert(location, self.items.len());
        self.items.push(Item {
            kind: self.kind,
            location,
            consumed: false,
        });
        true
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.items.iter().filter(|item| !item.consumed).count()
    }

    pub fn locations(&self) -> Vec<Vec2> {
        self.items.iter().map(|item| item.location).collect()
    }

    pub fn get(&self, location: Vec2) -> Option<&Item> {
        self.by_cell.get(&location).map(|&idx| &self.items[idx])
    }

    pub fn has_uneaten_at(&self, location: Vec2) -> bool {
        self.get(location).is_some_and(|item| !item.consumed)
    }

    pub fn consume_at(&mut self, location: Vec2) -> Option<ItemEvent> {
        let idx = *self.by_cell.get(&location)?;
        let item = &mut self.items[idx];
        if item.consumed {
            return None;
        }
        item.consumed = true;
        Some(ItemEvent {
            kind: item.kind,
            location,
        })
    }

    pub fn subscribe(&mut self, subscriber: Subscriber) {
        if !self.subscribers.contains(&subscriber) {
            self.subscribers.push(subscriber);
        }
    }

    pub fn subscribers(&self) -> &[Subscriber] {
        &self.subscribers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consuming_twice_yields_one_event() {
        let mut gold = ItemRegistry::new(ItemKind::Gold);
        assert!(gold.place(Vec2::new(2, 3)));
        assert!(!gold.place(Vec2::new(2, 3)));
        let event = gold.consume_at(Vec2::new(2, 3)).expect("first bite");
        assert_eq!(event.kind, ItemKind::Gold);
        assert_eq!(event.location, Vec2::new(2, 3));
        assert_eq!(gold.consume_at(Vec2::new(2, 3)), None);
        assert_eq!(gold.consume_at(Vec2::new(0, 0)), None);
    }

    #[test]
    fn consumed_items_keep_their_record() {
        let mut pills = ItemRegistry::new(ItemKind::Pill);
        pills.place(Vec2::new(0, 0));
        pills.place(Vec2::new(1, 0));
        pills.consume_at(Vec2::new(0, 0));
        assert_eq!(pills.len(), 2);
        assert_eq!(pills.remaining(), 1);
        assert!(pills.get(Vec2::new(0, 0)).is_some_and(Item::is_consumed));
        assert!(!pills.has_uneaten_at(Vec2::new(0, 0)));
        assert!(pills.has_uneaten_at(Vec2::new(1, 0)));
    }

    #[test]
    fn subscribers_are_registered_once_in_order() {
        let mut ice = ItemRegistry::new(ItemKind::Ice);
        ice.subscribe(Subscriber::Player);
        ice.subscribe(Subscriber::Monster(1));
        ice.subscribe(Subscriber::Player);
        assert_eq!(
            ice.subscribers(),
            &[Subscriber::Player, Subscriber::Monster(1)]
        );
    }
}

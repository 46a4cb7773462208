//! Persistent player profile
//!
//! Cash, lives, score and inventory survive across missions. Every setter
//! notifies subscribed observers synchronously. Observers only ever see the
//! change value, so they cannot reach back into a running simulation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single profile mutation, as seen by observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileChange {
    Cash(u64),
    Lives(u32),
    Score(u64),
    SelectedItem(String),
    Ammo { name: String, count: u32 },
}

/// Change callback
pub type ProfileObserver = Box<dyn Fn(&ProfileChange)>;

#[derive(Serialize, Deserialize, Default)]
pub struct PlayerProfile {
    pub name: String,
    cash: u64,
    lives: u32,
    score: u64,
    selected_item: String,
    ammo: BTreeMap<String, u32>,
    owned_items: Vec<String>,
    #[serde(skip)]
    observers: Vec<ProfileObserver>,
}

impl fmt::Debug for PlayerProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerProfile")
            .field("name", &self.name)
            .field("cash", &self.cash)
            .field("lives", &self.lives)
            .field("score", &self.score)
            .field("selected_item", &self.selected_item)
            .field("ammo", &self.ammo)
            .field("owned_items", &self.owned_items)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl PlayerProfile {
    /// Profile owning a single starting item
    pub fn new(name: impl Into<String>, lives: u32, starting_item: impl Into<String>) -> Self {
        let item = starting_item.into();
        Self {
            name: name.into(),
            lives,
            selected_item: item.clone(),
            owned_items: vec![item],
            ..Default::default()
        }
    }

    /// Register a change observer
    pub fn subscribe(&mut self, observer: impl Fn(&ProfileChange) + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn notify(&self, change: ProfileChange) {
        for observer in &self.observers {
            observer(&change);
        }
    }

    pub fn cash(&self) -> u64 {
        self.cash
    }

    pub fn set_cash(&mut self, cash: u64) {
        self.cash = cash;
        self.notify(ProfileChange::Cash(cash));
    }

    pub fn add_cash(&mut self, amount: u64) {
        self.set_cash(self.cash.saturating_add(amount));
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn set_lives(&mut self, lives: u32) {
        self.lives = lives;
        self.notify(ProfileChange::Lives(lives));
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn set_score(&mut self, score: u64) {
        self.score = score;
        self.notify(ProfileChange::Score(score));
    }

    pub fn add_score(&mut self, points: u64) {
        self.set_score(self.score.saturating_add(points));
    }

    pub fn selected_item(&self) -> &str {
        &self.selected_item
    }

    /// Select an owned item; returns false if the item is not owned
    pub fn select_item(&mut self, name: &str) -> bool {
        if !self.owns(name) {
            return false;
        }
        self.selected_item = name.to_string();
        self.notify(ProfileChange::SelectedItem(self.selected_item.clone()));
        true
    }

    pub fn owned_items(&self) -> &[String] {
        &self.owned_items
    }

    pub fn owns(&self, name: &str) -> bool {
        self.owned_items.iter().any(|item| item == name)
    }

    /// Add an item to the inventory (no-op if already owned)
    pub fn grant_item(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.owns(&name) {
            self.owned_items.push(name);
        }
    }

    /// Select the next (or previous) owned item, wrapping around
    pub fn cycle_item(&mut self, forward: bool) -> Option<&str> {
        let count = self.owned_items.len();
        if count < 2 {
            return None;
        }
        let current = self
            .owned_items
            .iter()
            .position(|item| *item == self.selected_item)
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % count
        } else {
            (current + count - 1) % count
        };
        let name = self.owned_items[next].clone();
        self.select_item(&name);
        Some(self.selected_item())
    }

    pub fn ammo(&self, name: &str) -> u32 {
        self.ammo.get(name).copied().unwrap_or(0)
    }

    pub fn set_ammo(&mut self, name: &str, count: u32) {
        self.ammo.insert(name.to_string(), count);
        self.notify(ProfileChange::Ammo {
            name: name.to_string(),
            count,
        });
    }

    /// Use one unit of ammunition; false if none was left
    pub fn consume_ammo(&mut self, name: &str) -> bool {
        match self.ammo(name) {
            0 => false,
            count => {
                self.set_ammo(name, count - 1);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_observers_see_changes() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut profile = PlayerProfile::new("ace", 3, "pistol");
        let sink = Rc::clone(&seen);
        profile.subscribe(move |change| sink.borrow_mut().push(change.clone()));

        profile.add_score(100);
        profile.add_cash(50);
        profile.set_lives(2);

        assert_eq!(
            *seen.borrow(),
            vec![
                ProfileChange::Score(100),
                ProfileChange::Cash(50),
                ProfileChange::Lives(2)
            ]
        );
    }

    #[test]
    fn test_consume_ammo() {
        let mut profile = PlayerProfile::new("ace", 3, "pistol");
        assert!(!profile.consume_ammo("9mm"));
        profile.set_ammo("9mm", 2);
        assert!(profile.consume_ammo("9mm"));
        assert!(profile.consume_ammo("9mm"));
        assert!(!profile.consume_ammo("9mm"));
        assert_eq!(profile.ammo("9mm"), 0);
    }

    #[test]
    fn test_cycle_items() {
        let mut profile = PlayerProfile::new("ace", 3, "pistol");
        assert_eq!(profile.cycle_item(true), None);
        profile.grant_item("uzi");
        profile.grant_item("frag");
        profile.grant_item("uzi");
        assert_eq!(profile.owned_items().len(), 3);

        assert_eq!(profile.cycle_item(true), Some("uzi"));
        assert_eq!(profile.cycle_item(true), Some("frag"));
        assert_eq!(profile.cycle_item(true), Some("pistol"));
        assert_eq!(profile.cycle_item(false), Some("frag"));
    }

    #[test]
    fn test_select_requires_ownership() {
        let mut profile = PlayerProfile::new("ace", 3, "pistol");
        assert!(!profile.select_item("rpg"));
        assert_eq!(profile.selected_item(), "pistol");
    }
}

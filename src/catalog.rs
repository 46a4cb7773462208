//! Weapon, ammunition and grenade catalog
//!
//! Static data shared by every mission. Lookups by name are strict: a name
//! the catalog does not know means the game data is corrupt.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// How a weapon fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponCategory {
    /// One bullet per trigger press
    Pistol,
    /// Repeats while the trigger is held
    Automatic,
    /// Fires a rocket that detonates on contact
    Rpg,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponDescriptor {
    pub name: String,
    pub category: WeaponCategory,
    /// Name of the ammunition it consumes
    pub ammunition: String,
    /// Minimum ms between automatic shots
    #[serde(default)]
    pub fire_interval_ms: f64,
    #[serde(default)]
    pub price: u64,
    #[serde(default)]
    pub sound: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmmunitionDescriptor {
    pub name: String,
    /// Travel distance in px
    pub range: f64,
    /// px per ms
    pub speed: f64,
    /// Explodes where it stops
    #[serde(default)]
    pub explosive: bool,
    #[serde(default)]
    pub price: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrenadeDescriptor {
    pub name: String,
    pub movement_distance: f64,
    pub movement_speed: f64,
    #[serde(default)]
    pub price: u64,
    #[serde(default)]
    pub sound: String,
}

/// One catalog file entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CatalogRecord {
    Weapon(WeaponDescriptor),
    Ammunition(AmmunitionDescriptor),
    Grenade(GrenadeDescriptor),
}

/// A selectable inventory item
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Item<'a> {
    Weapon(&'a WeaponDescriptor),
    Grenade(&'a GrenadeDescriptor),
}

impl Item<'_> {
    /// Name of the ammo counter this item draws from
    pub fn ammo_name(&self) -> &str {
        match self {
            Item::Weapon(weapon) => &weapon.ammunition,
            Item::Grenade(grenade) => &grenade.name,
        }
    }

    pub fn sound(&self) -> &str {
        match self {
            Item::Weapon(weapon) => &weapon.sound,
            Item::Grenade(grenade) => &grenade.sound,
        }
    }

    pub fn is_automatic(&self) -> bool {
        matches!(self, Item::Weapon(w) if w.category == WeaponCategory::Automatic)
    }
}

/// Every known weapon, ammunition and grenade, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub weapons: BTreeMap<String, WeaponDescriptor>,
    pub ammunition: BTreeMap<String, AmmunitionDescriptor>,
    pub grenades: BTreeMap<String, GrenadeDescriptor>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: CatalogRecord) {
        match record {
            CatalogRecord::Weapon(w) => {
                self.weapons.insert(w.name.clone(), w);
            }
            CatalogRecord::Ammunition(a) => {
                self.ammunition.insert(a.name.clone(), a);
            }
            CatalogRecord::Grenade(g) => {
                self.grenades.insert(g.name.clone(), g);
            }
        }
    }

    pub fn with(mut self, record: CatalogRecord) -> Self {
        self.insert(record);
        self
    }

    /// Build from a JSON array of records
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let records: Vec<CatalogRecord> = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for record in records {
            catalog.insert(record);
        }
        Ok(catalog)
    }

    /// Load one record per `*.json` file in `dir`.
    ///
    /// A malformed record is logged and skipped; an unreadable directory
    /// fails the whole load.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|source| CatalogError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut catalog = Self::new();
        for path in paths {
            let record = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|json| serde_json::from_str::<CatalogRecord>(&json).map_err(|e| e.to_string()));
            match record {
                Ok(record) => catalog.insert(record),
                Err(err) => log::warn!("Skipping catalog record {}: {}", path.display(), err),
            }
        }

        log::info!(
            "Loaded catalog: {} weapons, {} ammunition, {} grenades",
            catalog.weapons.len(),
            catalog.ammunition.len(),
            catalog.grenades.len()
        );
        Ok(catalog)
    }

    pub fn weapon(&self, name: &str) -> Result<&WeaponDescriptor, CatalogError> {
        self.weapons
            .get(name)
            .ok_or_else(|| CatalogError::not_found("weapon", name))
    }

    pub fn ammunition(&self, name: &str) -> Result<&AmmunitionDescriptor, CatalogError> {
        self.ammunition
            .get(name)
            .ok_or_else(|| CatalogError::not_found("ammunition", name))
    }

    pub fn grenade(&self, name: &str) -> Result<&GrenadeDescriptor, CatalogError> {
        self.grenades
            .get(name)
            .ok_or_else(|| CatalogError::not_found("grenade", name))
    }

    /// Look up a selectable item (weapon or grenade)
    pub fn item(&self, name: &str) -> Result<Item<'_>, CatalogError> {
        if let Some(weapon) = self.weapons.get(name) {
            return Ok(Item::Weapon(weapon));
        }
        if let Some(grenade) = self.grenades.get(name) {
            return Ok(Item::Grenade(grenade));
        }
        Err(CatalogError::not_found("item", name))
    }

    /// Check that an item and whatever it fires are both known
    pub fn validate_item(&self, name: &str) -> Result<(), CatalogError> {
        if let Item::Weapon(weapon) = self.item(name)? {
            self.ammunition(&weapon.ammunition)?;
        }
        Ok(())
    }
}

//! Named, reusable checklists (packing lists, release steps, weekly review).
//! Items are addressed by their 1-based position.

use crate::error::{LifeError, Result};
use crate::store::{self, Document, IdSeq};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checklist {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub items: Vec<Item>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_at: Option<DateTime<Utc>>,
}

impl Checklist {
    pub fn done_count(&self) -> usize {
        self.items.iter().filter(|i| i.done).count()
    }

    pub fn is_complete(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(|i| i.done)
    }

    fn item_mut(&mut self, position: usize) -> Result<&mut Item> {
        let len = self.items.len();
        if position == 0 || position > len {
            return Err(LifeError::InvalidInput(format!(
                "no item {position} in '{}': expected 1 to {len}",
                self.name
            )));
        }
        Ok(&mut self.items[position - 1])
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Checklists {
    #[serde(default)]
    pub next_id: IdSeq,
    #[serde(default)]
    pub lists: Vec<Checklist>,
}

impl Document for Checklists {
    const FILE: &'static str = "checklists.json";
}

impl Checklists {
    pub fn create(&mut self, name: &str, items: &[String]) -> Result<&Checklist> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LifeError::InvalidInput("checklist name cannot be empty".into()));
        }
        if self.lists.iter().any(|l| l.name.eq_ignore_ascii_case(name)) {
            return Err(LifeError::exists("checklist", name));
        }
        let id = self.next_id.next(self.lists.iter().map(|l| l.id));
        self.lists.push(Checklist {
            id,
            name: name.to_string(),
            items: items
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(|t| Item {
                    text: t.to_string(),
                    done: false,
                })
                .collect(),
            created_at: Utc::now(),
            reset_at: None,
        });
        Ok(&self.lists[self.lists.len() - 1])
    }

    /// Look up by case-insensitive name or numeric id.
    pub fn get(&self, key: &str) -> Result<&Checklist> {
        let idx = self.index_of(key)?;
        Ok(&self.lists[idx])
    }

    fn get_mut(&mut self, key: &str) -> Result<&mut Checklist> {
        let idx = self.index_of(key)?;
        Ok(&mut self.lists[idx])
    }

    fn index_of(&self, key: &str) -> Result<usize> {
        let key = key.trim();
        self.lists
            .iter()
            .position(|l| l.name.eq_ignore_ascii_case(key))
            .or_else(|| {
                let id = key.parse::<u64>().ok()?;
                self.lists.iter().position(|l| l.id == id)
            })
            .ok_or_else(|| LifeError::not_found("checklist", key))
    }

    /// Append an item. Returns its 1-based position.
    pub fn add_item(&mut self, key: &str, text: &str) -> Result<usize> {
        let text = text.trim();
        if text.is_empty() {
            return Err(LifeError::InvalidInput("item text cannot be empty".into()));
        }
        let list = self.get_mut(key)?;
        list.items.push(Item {
            text: text.to_string(),
            done: false,
        });
        Ok(list.items.len())
    }

    pub fn set_done(&mut self, key: &str, position: usize, done: bool) -> Result<&Checklist> {
        let list = self.get_mut(key)?;
        list.item_mut(position)?.done = done;
        Ok(&*list)
    }

    pub fn remove_item(&mut self, key: &str, position: usize) -> Result<Item> {
        let list = self.get_mut(key)?;
        list.item_mut(position)?;
        Ok(list.items.remove(position - 1))
    }

    /// Uncheck every item so the list can be run again.
    pub fn reset(&mut self, key: &str) -> Result<usize> {
        let list = self.get_mut(key)?;
        let was_done = list.done_count();
        for item in &mut list.items {
            item.done = false;
        }
        list.reset_at = Some(Utc::now());
        Ok(was_done)
    }

    /// New unchecked list with the same items.
    pub fn copy(&mut self, src: &str, dst: &str) -> Result<&Checklist> {
        let items: Vec<String> = self
            .get(src)?
            .items
            .iter()
            .map(|i| i.text.clone())
            .collect();
        self.create(dst, &items)
    }

    pub fn delete(&mut self, key: &str) -> Result<Checklist> {
        let idx = self.index_of(key)?;
        Ok(self.lists.remove(idx))
    }
}

pub fn load(home: &Path) -> Result<Checklists> {
    store::load(home)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn items(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn create_check_and_complete() {
        let mut c = Checklists::default();
        c.create("Packing", &items(&["passport", "charger"])).unwrap();
        c.set_done("packing", 1, true).unwrap();
        assert!(!c.get("packing").unwrap().is_complete());
        c.set_done("PACKING", 2, true).unwrap();
        assert!(c.get("1").unwrap().is_complete());
    }

    #[test]
    fn positions_are_one_based_and_checked() {
        let mut c = Checklists::default();
        c.create("x", &items(&["a"])).unwrap();
        assert!(c.set_done("x", 0, true).is_err());
        assert!(c.set_done("x", 2, true).is_err());
        assert_eq!(c.add_item("x", "b").unwrap(), 2);
        let removed = c.remove_item("x", 1).unwrap();
        assert_eq!(removed.text, "a");
        assert_eq!(c.get("x").unwrap().items[0].text, "b");
    }

    #[test]
    fn names_unique_case_insensitive() {
        let mut c = Checklists::default();
        c.create("Weekly Review", &[]).unwrap();
        assert!(matches!(
            c.create("weekly review", &[]),
            Err(LifeError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn reset_and_copy() {
        let mut c = Checklists::default();
        c.create("release", &items(&["tag", "publish"])).unwrap();
        c.set_done("release", 1, true).unwrap();
        let copy = c.copy("release", "release-2").unwrap();
        assert_eq!(copy.items.len(), 2);
        assert!(copy.items.iter().all(|i| !i.done));
        assert_eq!(c.reset("release").unwrap(), 1);
        assert_eq!(c.get("release").unwrap().done_count(), 0);
    }

    #[test]
    fn delete_unknown() {
        let mut c = Checklists::default();
        assert!(matches!(c.delete("nope"), Err(LifeError::NotFound { .. })));
    }
}

//! User health profiles, one CSV row per user keyed by name.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::storage::{self, StoreError};

pub const USER_COLUMNS: &[&str] = &[
    "name",
    "date_of_birth",
    "gender",
    "condition",
    "food_allergies",
    "specific_diet",
    "chronic_illnesses",
    "symptoms",
    "food_preferences",
    "medication",
];

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub date_of_birth: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub food_allergies: Option<String>,
    #[serde(default)]
    pub specific_diet: Option<String>,
    #[serde(default)]
    pub chronic_illnesses: Option<String>,
    #[serde(default)]
    pub symptoms: Option<String>,
    #[serde(default)]
    pub food_preferences: Option<String>,
    #[serde(default)]
    pub medication: Option<String>,
}

impl UserProfile {
    pub fn new(name: impl Into<String>, date_of_birth: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            date_of_birth: date_of_birth.into(),
            ..Default::default()
        }
    }

    /// Health and diet attributes that carry a value, labelled by column name.
    pub fn health_parameters(&self) -> Vec<(&'static str, &str)> {
        [
            ("gender", &self.gender),
            ("condition", &self.condition),
            ("food_allergies", &self.food_allergies),
            ("specific_diet", &self.specific_diet),
            ("chronic_illnesses", &self.chronic_illnesses),
            ("symptoms", &self.symptoms),
            ("food_preferences", &self.food_preferences),
            ("medication", &self.medication),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (label, v))
        })
        .collect()
    }
}

#[derive(Debug)]
pub struct UserStore {
    path: PathBuf,
    users: Vec<UserProfile>,
}

impl UserStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        storage::ensure_table(&path, USER_COLUMNS)?;
        let users: Vec<UserProfile> = storage::read_rows(&path)?;
        info!(path = %path.display(), count = users.len(), "user profiles loaded");
        Ok(Self { path, users })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list(&self) -> &[UserProfile] {
        &self.users
    }

    pub fn get(&self, name: &str) -> Option<&UserProfile> {
        self.users.iter().find(|user| user.name == name)
    }

    fn save(&self) -> Result<(), StoreError> {
        storage::write_rows(&self.path, USER_COLUMNS, &self.users)
    }

    pub fn create(&mut self, user: UserProfile) -> Result<(), StoreError> {
        if self.get(&user.name).is_some() {
            return Err(StoreError::AlreadyExists {
                kind: "user",
                name: user.name,
            });
        }
        info!(user = %user.name, "creating user");
        self.users.push(user);
        if let Err(err) = self.save() {
            self.users.pop();
            return Err(err);
        }
        Ok(())
    }

    /// Replaces the profile stored under `name`. Returns 0 when there is none.
    pub fn replace(&mut self, name: &str, user: UserProfile) -> Result<usize, StoreError> {
        let Some(index) = self.users.iter().position(|u| u.name == name) else {
            return Ok(0);
        };
        if user.name != name && self.get(&user.name).is_some() {
            return Err(StoreError::AlreadyExists {
                kind: "user",
                name: user.name,
            });
        }
        let previous = std::mem::replace(&mut self.users[index], user);
        if let Err(err) = self.save() {
            self.users[index] = previous;
            return Err(err);
        }
        info!(user = name, "user updated");
        Ok(1)
    }

    /// Removes the profile stored under `name`. Returns 0 when there is none.
    pub fn delete(&mut self, name: &str) -> Result<usize, StoreError> {
        let Some(index) = self.users.iter().position(|u| u.name == name) else {
            return Ok(0);
        };
        let removed = self.users.remove(index);
        if let Err(err) = self.save() {
            self.users.insert(index, removed);
            return Err(err);
        }
        info!(user = name, "user deleted");
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn alice() -> UserProfile {
        UserProfile {
            food_allergies: Some("peanut".to_string()),
            specific_diet: Some("vegetarian".to_string()),
            ..UserProfile::new("alice", "1990-04-01")
        }
    }

    #[test]
    fn test_create_get_and_reload() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let mut store = UserStore::open(dir.path().join("users.csv"))?;
        store.create(alice())?;

        let reloaded = UserStore::open(store.path())?;
        assert_eq!(reloaded.get("alice"), Some(&alice()));
        assert_eq!(reloaded.list().len(), 1);
        Ok(())
    }

    #[test]
    fn test_create_rejects_existing_name() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let mut store = UserStore::open(dir.path().join("users.csv"))?;
        store.create(alice())?;

        let result = store.create(UserProfile::new("alice", "2000-01-01"));
        assert!(matches!(result, Err(StoreError::AlreadyExists { kind: "user", .. })));
        Ok(())
    }

    #[test]
    fn test_replace_and_delete_report_rows_affected() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let mut store = UserStore::open(dir.path().join("users.csv"))?;
        store.create(alice())?;

        let mut changed = alice();
        changed.medication = Some("metformin".to_string());
        assert_eq!(store.replace("alice", changed.clone())?, 1);
        assert_eq!(store.replace("bob", UserProfile::new("bob", "1980-01-01"))?, 0);
        assert_eq!(UserStore::open(store.path())?.get("alice"), Some(&changed));

        assert_eq!(store.delete("bob")?, 0);
        assert_eq!(store.delete("alice")?, 1);
        assert!(UserStore::open(store.path())?.list().is_empty());
        Ok(())
    }

    #[test]
    fn test_health_parameters_skip_blank_values() {
        let mut user = alice();
        user.symptoms = Some("  ".to_string());
        assert_eq!(
            user.health_parameters(),
            vec![("food_allergies", "peanut"), ("specific_diet", "vegetarian")]
        );
    }
}

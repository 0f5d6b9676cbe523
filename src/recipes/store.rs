use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::filter::{self, Ranked, SearchTerms};
use super::model::{Ingredient, MalformedRecipeError, Recipe, RecipePatch};
use crate::storage::{self, StoreError};

pub const RECIPE_COLUMNS: &[&str] = &[
    "name",
    "review",
    "rating",
    "meta",
    "ingredients",
    "steps",
    "cooks_note",
    "editors_note",
    "nutrition_facts",
    "url",
];

/// One line of the recipe table. The ingredient list lives in a single cell
/// as a JSON array.
#[derive(Debug, Serialize, Deserialize)]
struct RecipeRow {
    name: String,
    review: Option<String>,
    rating: Option<f64>,
    #[serde(default)]
    meta: String,
    #[serde(default)]
    ingredients: String,
    #[serde(default)]
    steps: String,
    cooks_note: Option<String>,
    editors_note: Option<String>,
    nutrition_facts: Option<String>,
    url: Option<String>,
}

impl RecipeRow {
    fn into_recipe(self, row: usize) -> Result<Recipe, StoreError> {
        let ingredients: Vec<Ingredient> = if self.ingredients.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&self.ingredients).map_err(|source| StoreError::Json { row, source })?
        };
        Ok(Recipe {
            name: self.name,
            review: self.review,
            rating: self.rating,
            meta: self.meta,
            ingredients,
            steps: self.steps,
            cooks_note: self.cooks_note,
            editors_note: self.editors_note,
            nutrition_facts: self.nutrition_facts,
            url: self.url,
        })
    }

    fn from_recipe(recipe: &Recipe, row: usize) -> Result<Self, StoreError> {
        let ingredients =
            serde_json::to_string(&recipe.ingredients).map_err(|source| StoreError::Json { row, source })?;
        Ok(Self {
            name: recipe.name.clone(),
            review: recipe.review.clone(),
            rating: recipe.rating,
            meta: recipe.meta.clone(),
            ingredients,
            steps: recipe.steps.clone(),
            cooks_note: recipe.cooks_note.clone(),
            editors_note: recipe.editors_note.clone(),
            nutrition_facts: recipe.nutrition_facts.clone(),
            url: recipe.url.clone(),
        })
    }
}

/// The recipe catalog: an in-memory collection mirrored to a CSV file.
///
/// Collection order is insertion order, which is also the tie-break order
/// used when ranking search results.
#[derive(Debug)]
pub struct RecipeStore {
    path: PathBuf,
    recipes: Vec<Recipe>,
}

impl RecipeStore {
    /// Loads the catalog, creating an empty table if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        storage::ensure_table(&path, RECIPE_COLUMNS)?;

        let rows: Vec<RecipeRow> = storage::read_rows(&path)?;
        let recipes = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| row.into_recipe(index + 1))
            .collect::<Result<Vec<_>, _>>()?;

        let mut seen = HashSet::new();
        for recipe in &recipes {
            if !seen.insert(recipe.name.as_str()) {
                warn!(recipe = %recipe.name, "duplicate recipe name in catalog");
            }
        }
        info!(path = %path.display(), count = recipes.len(), "recipe catalog loaded");
        Ok(Self { path, recipes })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the whole catalog in collection order.
    pub fn all(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn get(&self, name: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|recipe| recipe.name == name)
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    fn save(&self) -> Result<(), StoreError> {
        let rows = self
            .recipes
            .iter()
            .enumerate()
            .map(|(index, recipe)| RecipeRow::from_recipe(recipe, index + 1))
            .collect::<Result<Vec<_>, _>>()?;
        storage::write_rows(&self.path, RECIPE_COLUMNS, &rows)
    }

    /// Appends a recipe. Names are unique: adding an existing name fails.
    pub fn add(&mut self, mut recipe: Recipe) -> Result<(), StoreError> {
        recipe.normalize();
        recipe.validate()?;
        if self.contains(&recipe.name) {
            return Err(StoreError::AlreadyExists {
                kind: "recipe",
                name: recipe.name,
            });
        }
        info!(recipe = %recipe.name, "adding recipe");
        self.recipes.push(recipe);
        if let Err(err) = self.save() {
            self.recipes.pop();
            return Err(err);
        }
        Ok(())
    }

    /// Merges `patch` into every recipe called `name`.
    ///
    /// Returns the number of recipes changed; zero means nothing matched and
    /// the file was left alone.
    pub fn update(&mut self, name: &str, patch: RecipePatch) -> Result<usize, StoreError> {
        let positions: Vec<usize> = self
            .recipes
            .iter()
            .enumerate()
            .filter(|(_, recipe)| recipe.name == name)
            .map(|(index, _)| index)
            .collect();
        if positions.is_empty() {
            return Ok(0);
        }

        if let Some(new_name) = patch.name.as_deref().map(str::trim) {
            if new_name != name && self.contains(new_name) {
                return Err(StoreError::AlreadyExists {
                    kind: "recipe",
                    name: new_name.to_string(),
                });
            }
        }

        let mut updated = Vec::with_capacity(positions.len());
        for &index in &positions {
            let mut recipe = self.recipes[index].clone();
            recipe.apply(patch.clone());
            recipe.normalize();
            recipe.validate()?;
            updated.push(recipe);
        }

        let previous: Vec<Recipe> = positions
            .iter()
            .zip(updated)
            .map(|(&index, recipe)| std::mem::replace(&mut self.recipes[index], recipe))
            .collect();
        if let Err(err) = self.save() {
            for (&index, recipe) in positions.iter().zip(previous) {
                self.recipes[index] = recipe;
            }
            return Err(err);
        }
        info!(recipe = name, rows = positions.len(), "recipe updated");
        Ok(positions.len())
    }

    /// Removes every recipe called `name`, returning how many were removed.
    pub fn delete(&mut self, name: &str) -> Result<usize, StoreError> {
        let before = self.recipes.len();
        let previous = self.recipes.clone();
        self.recipes.retain(|recipe| recipe.name != name);
        let removed = before - self.recipes.len();
        if removed == 0 {
            return Ok(0);
        }
        if let Err(err) = self.save() {
            self.recipes = previous;
            return Err(err);
        }
        info!(recipe = name, rows = removed, "recipe deleted");
        Ok(removed)
    }

    /// Recipes that avoid every `negative` term, ranked by `positive` matches.
    pub fn filter<P, N>(&self, positive: P, negative: N) -> Result<Vec<&Recipe>, MalformedRecipeError>
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        N: IntoIterator,
        N::Item: AsRef<str>,
    {
        filter::filter_and_rank(&self.recipes, positive, negative)
    }

    pub fn rank(&self, terms: &SearchTerms) -> Result<Vec<Ranked<'_>>, MalformedRecipeError> {
        filter::rank(&self.recipes, terms)
    }
}

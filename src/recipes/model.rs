use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

/// Raised when a recipe record cannot be used for matching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRecipeError {
    #[error("recipe name is blank")]
    BlankName,
    #[error("recipe '{recipe}': ingredient at index {index} has no name")]
    MissingIngredientName { recipe: String, index: usize },
}

/// Ingredient amount. Stored data mixes numbers (`2`) and free text (`"1/2"`, `"a pinch"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Amount(f64),
    Text(String),
}

impl Default for Quantity {
    fn default() -> Self {
        Quantity::Text(String::new())
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::Amount(value) => write!(f, "{}", value),
            Quantity::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub quantity: Quantity,
    #[serde(default, deserialize_with = "null_as_default")]
    pub unit: String,
}

// Hand-edited catalogs write `null` for empty cells; treat it like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Ingredient {
    pub fn new(name: impl Into<String>, quantity: Quantity, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit: unit.into(),
        }
    }

    /// Shorthand for an ingredient with no amount, mostly useful in tests and fixtures.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, Quantity::default(), "")
    }

    /// Identity used when matching against search terms: trimmed and lower-cased.
    pub fn key(&self) -> String {
        self.name.trim().to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    #[serde(default)]
    pub review: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub meta: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ingredients: Vec<Ingredient>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub steps: String,
    #[serde(default)]
    pub cooks_note: Option<String>,
    #[serde(default)]
    pub editors_note: Option<String>,
    #[serde(default)]
    pub nutrition_facts: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Recipe {
    pub fn new(name: impl Into<String>, ingredients: Vec<Ingredient>, steps: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ingredients,
            steps: steps.into(),
            ..Default::default()
        }
    }

    /// Trims the identity fields so that stored names compare the way users type
    /// them. Blank optional text becomes `None`, which is how the CSV reads it back.
    pub fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        for ingredient in &mut self.ingredients {
            ingredient.name = ingredient.name.trim().to_string();
            ingredient.unit = ingredient.unit.trim().to_string();
        }
        for field in [
            &mut self.review,
            &mut self.cooks_note,
            &mut self.editors_note,
            &mut self.nutrition_facts,
            &mut self.url,
        ] {
            *field = field.take().and_then(non_blank);
        }
    }

    pub fn validate(&self) -> Result<(), MalformedRecipeError> {
        if self.name.trim().is_empty() {
            return Err(MalformedRecipeError::BlankName);
        }
        self.ingredient_keys().map(|_| ())
    }

    /// Lower-cased ingredient names in recipe order.
    ///
    /// Fails on the first ingredient without a name instead of skipping it, so
    /// that bad rows in the catalog surface as soon as they are searched.
    pub fn ingredient_keys(&self) -> Result<Vec<String>, MalformedRecipeError> {
        self.ingredients
            .iter()
            .enumerate()
            .map(|(index, ingredient)| {
                let key = ingredient.key();
                if key.is_empty() {
                    Err(MalformedRecipeError::MissingIngredientName {
                        recipe: self.name.clone(),
                        index,
                    })
                } else {
                    Ok(key)
                }
            })
            .collect()
    }

    pub fn apply(&mut self, patch: RecipePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(review) = patch.review {
            self.review = non_blank(review);
        }
        if let Some(rating) = patch.rating {
            self.rating = Some(rating);
        }
        if let Some(meta) = patch.meta {
            self.meta = meta;
        }
        if let Some(ingredients) = patch.ingredients {
            self.ingredients = ingredients;
        }
        if let Some(steps) = patch.steps {
            self.steps = steps;
        }
        if let Some(note) = patch.cooks_note {
            self.cooks_note = non_blank(note);
        }
        if let Some(note) = patch.editors_note {
            self.editors_note = non_blank(note);
        }
        if let Some(facts) = patch.nutrition_facts {
            self.nutrition_facts = non_blank(facts);
        }
        if let Some(url) = patch.url {
            self.url = non_blank(url);
        }
    }
}

/// Partial update for a recipe. Absent fields are left untouched; an empty
/// string clears an optional text field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipePatch {
    pub name: Option<String>,
    pub review: Option<String>,
    pub rating: Option<f64>,
    pub meta: Option<String>,
    pub ingredients: Option<Vec<Ingredient>>,
    pub steps: Option<String>,
    pub cooks_note: Option<String>,
    pub editors_note: Option<String>,
    pub nutrition_facts: Option<String>,
    pub url: Option<String>,
}

impl RecipePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

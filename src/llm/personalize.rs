use serde::{Deserialize, Serialize};
use std::fmt::Write;

use super::PromptTemplate;
use crate::recipes::Recipe;
use crate::users::UserProfile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalizedRecipe {
    pub recipe_name: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: String,
}

/// Asks the model to rewrite one catalog recipe around a user's preferences
/// and restrictions.
#[derive(Debug, Clone)]
pub struct PersonalizeRequest {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
    pub specific_diet: Option<String>,
    pub chronic_illnesses: Option<String>,
    pub recipe: Recipe,
}

impl PersonalizeRequest {
    pub fn for_user(user: &UserProfile, recipe: Recipe, positive: Vec<String>, negative: Vec<String>) -> Self {
        Self {
            positive,
            negative,
            specific_diet: user.specific_diet.clone(),
            chronic_illnesses: user.chronic_illnesses.clone(),
            recipe,
        }
    }

    fn recipe_block(&self) -> String {
        let recipe = &self.recipe;
        let mut block = format!("name: {}\ningredients:\n", recipe.name);
        for ingredient in &recipe.ingredients {
            let amount = format!("{} {}", ingredient.quantity, ingredient.unit);
            let amount = amount.trim();
            if amount.is_empty() {
                let _ = writeln!(block, "  - {}", ingredient.name);
            } else {
                let _ = writeln!(block, "  - {} ({})", ingredient.name, amount);
            }
        }
        let _ = writeln!(block, "steps: {}", recipe.steps);
        if let Some(note) = &recipe.cooks_note {
            let _ = writeln!(block, "cook's note: {}", note);
        }
        if let Some(facts) = &recipe.nutrition_facts {
            let _ = writeln!(block, "nutrition facts: {}", facts);
        }
        block
    }
}

impl PromptTemplate for PersonalizeRequest {
    type Output = PersonalizedRecipe;

    fn render(&self) -> String {
        format!(
            r#"Hello, I need help rewriting a recipe so it suits me better. Here is some important information about me:

- products I prefer: {positive}
- ingredients I am allergic to or must avoid: {negative}
- specific diet type: {diet}
- chronic illnesses or conditions: {illnesses}

The recipe to personalize:
{recipe}
Please suggest a version of this recipe that matches my preferences and health conditions. If relevant, consider conditions like diabetes or heart health and adjust accordingly.

Format the output as JSON:

<start>
{{
    "recipe_name": "Recipe Name",
    "ingredients": ["Ingredient1", "Ingredient2"],
    "instructions": "Step-by-step cooking instructions."
}}
<end>

Only output the JSON within <start> and <end> tags.
"#,
            positive = self.positive.join(", "),
            negative = self.negative.join(", "),
            diet = self.specific_diet.as_deref().unwrap_or(""),
            illnesses = self.chronic_illnesses.as_deref().unwrap_or(""),
            recipe = self.recipe_block(),
        )
    }
}

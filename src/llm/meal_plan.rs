use serde::{Deserialize, Serialize};
use std::fmt::Write;

use super::PromptTemplate;
use crate::recipes::Recipe;
use crate::users::UserProfile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub dish_name: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub portion_size: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealSchedule {
    pub breakfast: Meal,
    pub lunch: Meal,
    pub dinner: Meal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    pub meal_plan: MealSchedule,
}

/// One day of meals for a user, optionally steered towards catalog recipes
/// that already passed the user's ingredient filter.
#[derive(Debug, Clone)]
pub struct MealPlanRequest {
    pub user: UserProfile,
    pub candidates: Vec<Recipe>,
}

impl MealPlanRequest {
    pub fn new(user: UserProfile, candidates: Vec<Recipe>) -> Self {
        Self { user, candidates }
    }

    fn health_block(&self) -> String {
        let lines: Vec<String> = self
            .user
            .health_parameters()
            .into_iter()
            .map(|(key, value)| format!("{}: {}", key, value))
            .collect();
        format!("{{\n{}\n}}", lines.join("\n"))
    }

    fn candidates_block(&self) -> String {
        let mut block = String::new();
        for recipe in &self.candidates {
            let ingredients: Vec<&str> = recipe.ingredients.iter().map(|i| i.name.as_str()).collect();
            let _ = writeln!(block, "- {} (ingredients: {})", recipe.name, ingredients.join(", "));
        }
        block
    }
}

impl PromptTemplate for MealPlanRequest {
    type Output = MealPlan;

    fn render(&self) -> String {
        let mut prompt = format!(
            "Hi, I'd like your help generating a personalized meal plan. Here are my diet and health parameters:\n{}\n\n",
            self.health_block()
        );
        if !self.candidates.is_empty() {
            prompt.push_str("These recipes from my collection already fit my restrictions, prefer them where sensible:\n");
            prompt.push_str(&self.candidates_block());
            prompt.push('\n');
        }
        prompt.push_str(
            r#"Please create a meal plan that includes "breakfast", "lunch" and "dinner" with specific dish names, ingredients and portion sizes for each meal.
Consider nutrient balance (carbs, protein, fats) and avoid ingredients that conflict with my diet and health restrictions.

Return the result as JSON, strictly structured as follows:

<start>
{
    "meal_plan": {
        "breakfast": {"dish_name": "Example Dish", "ingredients": ["Ingredient1", "Ingredient2"], "portion_size": "Example portion size"},
        "lunch": {"dish_name": "Example Dish", "ingredients": ["Ingredient1", "Ingredient2"], "portion_size": "Example portion size"},
        "dinner": {"dish_name": "Example Dish", "ingredients": ["Ingredient1", "Ingredient2"], "portion_size": "Example portion size"}
    }
}
<end>

Only output the JSON within <start> and <end> tags.
If you don't have enough information, answer with a standard healthy meal plan in the same format.
"#,
        );
        prompt
    }
}

pub mod filter;
pub mod model;
pub mod store;

pub use filter::{filter_and_rank, rank, tokenize, Ranked, SearchTerms};
pub use model::{Ingredient, MalformedRecipeError, Quantity, Recipe, RecipePatch};
pub use store::RecipeStore;

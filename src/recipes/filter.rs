//! Ingredient-based recipe selection.
//!
//! A recipe is dropped when any negative term names one of its ingredients
//! exactly, or occurs anywhere in its steps or name. Ingredient matching is
//! exact so that `"nut"` does not reject `"nutmeg"`; free text is matched by
//! substring so that prose mentions ("sprinkle with sugar") are still caught.
//! When positive terms are given, survivors must contain at least one of them
//! and are ordered by how many they contain.

use rayon::prelude::*;

use super::model::{MalformedRecipeError, Recipe};

/// Normalized positive and negative term sets.
///
/// Terms are trimmed and lower-cased, blank terms are dropped and duplicates
/// collapse to their first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchTerms {
    positive: Vec<String>,
    negative: Vec<String>,
}

impl SearchTerms {
    pub fn new<P, N>(positive: P, negative: N) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        N: IntoIterator,
        N::Item: AsRef<str>,
    {
        Self {
            positive: normalize_terms(positive),
            negative: normalize_terms(negative),
        }
    }

    /// Builds terms from free text such as `"garlic, onion ginger"`.
    pub fn from_text(positive: &str, negative: &str) -> Self {
        Self::new(tokenize(positive), tokenize(negative))
    }

    pub fn positive(&self) -> &[String] {
        &self.positive
    }

    pub fn negative(&self) -> &[String] {
        &self.negative
    }

    pub fn is_empty(&self) -> bool {
        self.positive.is_empty() && self.negative.is_empty()
    }
}

/// Splits free text on whitespace and commas.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_terms<I>(terms: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for term in terms {
        let term = term.as_ref().trim().to_lowercase();
        if !term.is_empty() && !normalized.contains(&term) {
            normalized.push(term);
        }
    }
    normalized
}

/// A surviving recipe together with its transient ranking score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked<'a> {
    pub recipe: &'a Recipe,
    /// Number of distinct positive terms found among the ingredient names.
    pub positive_count: usize,
}

/// Returns the recipes that avoid every negative term, most relevant first.
///
/// # Arguments
/// * `recipes`: the catalog snapshot to search.
/// * `positive`: ingredients to favor. Empty means no inclusion filtering.
/// * `negative`: ingredients or keywords that must not appear.
///
/// # Returns
/// The surviving recipes ordered by descending positive count, ties in
/// catalog order. An empty result is not an error.
pub fn filter_and_rank<'a, P, N>(
    recipes: &'a [Recipe],
    positive: P,
    negative: N,
) -> Result<Vec<&'a Recipe>, MalformedRecipeError>
where
    P: IntoIterator,
    P::Item: AsRef<str>,
    N: IntoIterator,
    N::Item: AsRef<str>,
{
    let terms = SearchTerms::new(positive, negative);
    Ok(rank(recipes, &terms)?
        .into_iter()
        .map(|ranked| ranked.recipe)
        .collect())
}

/// Same selection as [`filter_and_rank`], keeping the score of each survivor.
pub fn rank<'a>(
    recipes: &'a [Recipe],
    terms: &SearchTerms,
) -> Result<Vec<Ranked<'a>>, MalformedRecipeError> {
    // Evaluated in parallel, but errors are resolved in catalog order so the
    // reported record does not depend on scheduling.
    let verdicts: Vec<Result<Option<usize>, MalformedRecipeError>> = recipes
        .par_iter()
        .map(|recipe| evaluate(recipe, terms))
        .collect();
    let verdicts = verdicts.into_iter().collect::<Result<Vec<_>, _>>()?;

    let mut ranked: Vec<Ranked<'a>> = recipes
        .iter()
        .zip(verdicts)
        .filter_map(|(recipe, verdict)| {
            verdict.map(|positive_count| Ranked {
                recipe,
                positive_count,
            })
        })
        .collect();

    // sort_by is stable: equal scores keep catalog order.
    ranked.sort_by(|a, b| b.positive_count.cmp(&a.positive_count));
    Ok(ranked)
}

/// `Ok(None)` when the recipe is filtered out, otherwise its positive count.
fn evaluate(recipe: &Recipe, terms: &SearchTerms) -> Result<Option<usize>, MalformedRecipeError> {
    let ingredient_keys = recipe.ingredient_keys()?;

    if is_excluded(recipe, &ingredient_keys, terms.negative()) {
        return Ok(None);
    }

    let positive_count = terms
        .positive()
        .iter()
        .filter(|term| ingredient_keys.contains(term))
        .count();

    if !terms.positive().is_empty() && positive_count == 0 {
        return Ok(None);
    }
    Ok(Some(positive_count))
}

fn is_excluded(recipe: &Recipe, ingredient_keys: &[String], negative: &[String]) -> bool {
    if negative.is_empty() {
        return false;
    }
    let steps = recipe.steps.to_lowercase();
    let name = recipe.name.to_lowercase();

    negative.iter().any(|term| {
        ingredient_keys.contains(term) || steps.contains(term.as_str()) || name.contains(term.as_str())
    })
}

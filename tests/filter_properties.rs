use nutri_assist::recipes::{filter_and_rank, rank, Ingredient, Recipe, SearchTerms};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const PANTRY: &[&str] = &[
    "garlic", "onion", "tomato", "basil", "sugar", "flour", "butter", "ginger", "rice", "lentils", "peanut", "egg",
];
const WORDS: &[&str] = &["chop", "stir", "bake", "simmer", "fry", "rest", "serve", "whisk"];

fn random_catalog(rng: &mut StdRng, size: usize) -> Vec<Recipe> {
    (0..size)
        .map(|i| {
            let count = rng.gen_range(0..5);
            let ingredients = PANTRY
                .choose_multiple(rng, count)
                .map(|name| Ingredient::named(*name))
                .collect();
            let steps = (0..rng.gen_range(1..4))
                .map(|_| *WORDS.choose(rng).unwrap())
                .collect::<Vec<_>>()
                .join(" then ");
            Recipe::new(format!("Dish {}", i), ingredients, steps)
        })
        .collect()
}

fn random_terms(rng: &mut StdRng, max: usize) -> Vec<String> {
    let pool: Vec<&str> = PANTRY.iter().chain(WORDS).copied().collect();
    let count = rng.gen_range(0..=max);
    pool.choose_multiple(rng, count).map(|t| t.to_string()).collect()
}

fn excluded_by(recipe: &Recipe, term: &str) -> bool {
    recipe.ingredients.iter().any(|i| i.key() == term)
        || recipe.steps.to_lowercase().contains(term)
        || recipe.name.to_lowercase().contains(term)
}

#[test]
fn test_no_survivor_matches_a_negative_term() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let catalog = random_catalog(&mut rng, 25);
        let positive = random_terms(&mut rng, 3);
        let negative = random_terms(&mut rng, 3);

        let survivors = filter_and_rank(&catalog, &positive, &negative).unwrap();
        for recipe in survivors {
            for term in &negative {
                assert!(!excluded_by(recipe, term), "{} survived exclusion of {}", recipe.name, term);
            }
        }
    }
}

#[test]
fn test_empty_positive_preserves_catalog_order() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..200 {
        let catalog = random_catalog(&mut rng, 25);
        let negative = random_terms(&mut rng, 2);

        let survivors = filter_and_rank(&catalog, Vec::<String>::new(), &negative).unwrap();
        let expected: Vec<&Recipe> = catalog
            .iter()
            .filter(|r| !negative.iter().any(|t| excluded_by(r, t)))
            .collect();
        assert_eq!(survivors, expected);
    }
}

#[test]
fn test_counts_never_increase_and_ties_keep_catalog_order() {
    let mut rng = StdRng::seed_from_u64(23);
    for _ in 0..200 {
        let catalog = random_catalog(&mut rng, 30);
        let terms = SearchTerms::new(random_terms(&mut rng, 4), random_terms(&mut rng, 2));

        let ranked = rank(&catalog, &terms).unwrap();
        let position = |recipe: &Recipe| catalog.iter().position(|r| r.name == recipe.name).unwrap();
        for pair in ranked.windows(2) {
            assert!(pair[0].positive_count >= pair[1].positive_count);
            if pair[0].positive_count == pair[1].positive_count {
                assert!(position(pair[0].recipe) < position(pair[1].recipe));
            }
        }
        if !terms.positive().is_empty() {
            assert!(ranked.iter().all(|r| r.positive_count >= 1));
        }
    }
}

#[test]
fn test_repeated_calls_give_identical_results() {
    let mut rng = StdRng::seed_from_u64(31);
    for _ in 0..100 {
        let catalog = random_catalog(&mut rng, 200);
        let positive = random_terms(&mut rng, 3);
        let negative = random_terms(&mut rng, 2);

        let first = filter_and_rank(&catalog, &positive, &negative).unwrap();
        let second = filter_and_rank(&catalog, &positive, &negative).unwrap();
        assert_eq!(first, second);
        assert!(first.iter().zip(&second).all(|(a, b)| std::ptr::eq(*a, *b)));
    }
}

#[test]
fn test_filtered_output_is_a_fixed_point() {
    let mut rng = StdRng::seed_from_u64(37);
    for _ in 0..100 {
        let catalog = random_catalog(&mut rng, 25);
        let positive = random_terms(&mut rng, 3);
        let negative = random_terms(&mut rng, 2);

        let first: Vec<Recipe> = filter_and_rank(&catalog, &positive, &negative)
            .unwrap()
            .into_iter()
            .cloned()
            .collect();
        let second = filter_and_rank(&first, &positive, &negative).unwrap();
        assert_eq!(second.len(), first.len());
        assert!(second.iter().zip(&first).all(|(a, b)| *a == b));
    }
}

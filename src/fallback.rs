//! Local plan generation used when the AI path is unavailable.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalogue::{sample_meals, MealCatalogue};
use crate::data_types::{
    plan_total_cost, Meal, MealGenerationResponse, MealPlanRequest, NutritionalInfo,
};
use crate::shopping_list::derive_shopping_list;

const DEFAULT_FALLBACK_CUISINE: &str = "Healthy";

const FALLBACK_VITAMINS: [&str; 3] = ["Vitamin C", "Vitamin B12", "Vitamin D"];
const FALLBACK_MINERALS: [&str; 3] = ["Iron", "Calcium", "Potassium"];
const FALLBACK_HEALTH_BENEFITS: [&str; 3] = [
    "Rich in essential nutrients",
    "Supports immune system",
    "Good source of energy",
];
const FALLBACK_COOKING_TIPS: [&str; 3] = [
    "Prep ingredients ahead of time",
    "Season to taste",
    "Serve fresh for best flavor",
];

const FALLBACK_INSIGHTS: [&str; 3] = [
    "Balanced nutrition across all meals",
    "Variety of cuisines and cooking methods",
    "Budget-conscious ingredient selection",
];
const OFFLINE_INSIGHTS: [&str; 2] = ["Balanced offline meal selection", "Local ingredient focus"];

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Draws `count` meals. Each pass over the pool is a fresh shuffle, so no meal
/// repeats until every meal has been used once.
fn draw_meals<R: Rng + ?Sized>(pool: &[Meal], count: usize, rng: &mut R) -> Vec<Meal> {
    let mut drawn = Vec::with_capacity(count);
    while drawn.len() < count {
        let mut pass: Vec<&Meal> = pool.iter().collect();
        pass.shuffle(rng);
        let needed = count - drawn.len();
        drawn.extend(pass.into_iter().take(needed).cloned());
    }
    drawn
}

fn randomized_nutrition<R: Rng + ?Sized>(rng: &mut R) -> NutritionalInfo {
    NutritionalInfo {
        calories: 350.0 + rng.gen_range(0..300) as f64,
        protein: 20.0 + rng.gen_range(0..30) as f64,
        carbohydrates: 30.0 + rng.gen_range(0..40) as f64,
        fat: 10.0 + rng.gen_range(0..20) as f64,
        fiber: 5.0 + rng.gen_range(0..15) as f64,
        sugar: 5.0 + rng.gen_range(0..20) as f64,
        sodium: 400.0 + rng.gen_range(0..800) as f64,
        cholesterol: None,
        vitamins: owned(&FALLBACK_VITAMINS),
        minerals: owned(&FALLBACK_MINERALS),
    }
}

fn stamp_meal<R: Rng + ?Sized>(mut meal: Meal, index: usize, request: &MealPlanRequest, rng: &mut R) -> Meal {
    let preferences = &request.preferences;
    let budget = preferences.budget_range;

    meal.id = format!("fallback_{}", index + 1);
    meal.cuisine_type = preferences
        .cuisine_types
        .first()
        .cloned()
        .unwrap_or_else(|| DEFAULT_FALLBACK_CUISINE.to_string());
    meal.servings = preferences.number_of_people.max(1);
    meal.estimated_cost_per_serving = if budget.max > budget.min {
        rng.gen_range(budget.min..=budget.max)
    } else {
        budget.min
    };
    meal.nutritional_info = randomized_nutrition(rng);
    meal.health_benefits = owned(&FALLBACK_HEALTH_BENEFITS);
    meal.cooking_tips = owned(&FALLBACK_COOKING_TIPS);
    meal
}

/// Builds a complete plan of `duration × mealsPerDay` meals from the catalogue.
///
/// `offline` only changes the summary and insight texts. This path has no
/// failure mode: an empty catalogue falls back to the built-in sample meals.
pub fn generate_fallback_plan<R: Rng + ?Sized>(
    request: &MealPlanRequest,
    catalogue: &MealCatalogue,
    offline: bool,
    rng: &mut R,
) -> MealGenerationResponse {
    let builtin;
    let pool = if catalogue.is_empty() {
        builtin = sample_meals();
        &builtin[..]
    } else {
        catalogue.all()
    };

    let meals: Vec<Meal> = draw_meals(pool, request.total_meals(), rng)
        .into_iter()
        .enumerate()
        .map(|(index, meal)| stamp_meal(meal, index, request, rng))
        .collect();

    let mut nutritional_summary = NutritionalInfo::sum(meals.iter().map(|m| &m.nutritional_info));
    nutritional_summary.vitamins = vec!["Multiple vitamins".to_string()];
    nutritional_summary.minerals = vec!["Multiple minerals".to_string()];

    let people = request.preferences.number_of_people;
    let (plan_summary, health_insights) = if offline {
        (format!("Offline meal plan for {} people", people), owned(&OFFLINE_INSIGHTS))
    } else {
        (
            format!(
                "Fallback meal plan for {} people with {} goals",
                people,
                request.preferences.dietary_goal.to_string().to_lowercase()
            ),
            owned(&FALLBACK_INSIGHTS),
        )
    };

    log::info!("Generated {} plan with {} meals", if offline { "offline" } else { "fallback" }, meals.len());

    MealGenerationResponse {
        total_cost: plan_total_cost(&meals),
        nutritional_summary,
        shopping_list: request.generate_shopping_list.then(|| derive_shopping_list(&meals)),
        plan_summary,
        health_insights,
        is_partial: false,
        meals,
    }
}

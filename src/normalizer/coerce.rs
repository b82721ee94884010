//! Builds a strict [`Meal`] out of whatever JSON the model produced.
//!
//! Every field has its own default rule and a bad field never rejects the
//! rest of the object. A field counts as missing when it is absent, `null`,
//! of the wrong JSON type, a negative number, or (for names and ids) blank.
//! Valid zero values are kept, so a meal that is already complete comes back
//! unchanged.

use serde_json::{Map, Value};

use crate::data_types::{Dessert, Difficulty, Ingredient, Meal, MealType, NutritionalInfo};

pub const DEFAULT_CUISINE: &str = "Australian";
pub const DEFAULT_PREP_TIME: u32 = 5;
pub const DEFAULT_COOKING_TIME: u32 = 10;
pub const DEFAULT_SERVINGS: u32 = 2;
pub const DEFAULT_COST_PER_SERVING: f64 = 5.0;
pub const DEFAULT_INGREDIENT_COST: f64 = 1.0;
pub const DEFAULT_QUANTITY: &str = "1";

/// Read-only view over a JSON object that tolerates camelCase and snake_case keys.
struct Fields<'a> {
    map: Option<&'a Map<String, Value>>,
}

impl<'a> Fields<'a> {
    fn of(value: &'a Value) -> Self {
        Self { map: value.as_object() }
    }

    fn get(&self, keys: &[&str]) -> Option<&'a Value> {
        let map = self.map?;
        keys.iter().filter_map(|key| map.get(*key)).find(|value| !value.is_null())
    }

    fn text(&self, keys: &[&str]) -> Option<String> {
        self.get(keys).and_then(as_text)
    }

    fn non_blank(&self, keys: &[&str]) -> Option<String> {
        self.text(keys).filter(|s| !s.trim().is_empty())
    }

    fn number(&self, keys: &[&str]) -> Option<f64> {
        self.get(keys).and_then(as_number)
    }

    fn minutes(&self, keys: &[&str]) -> Option<u32> {
        self.number(keys).map(to_whole)
    }

    fn list(&self, keys: &[&str]) -> Option<Vec<String>> {
        self.get(keys).and_then(as_string_list)
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (n.is_finite() && n >= 0.0).then_some(n)
}

fn to_whole(n: f64) -> u32 {
    n.round().min(u32::MAX as f64) as u32
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Only string elements survive; anything else in the array is dropped.
fn as_string_list(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    Some(items.iter().filter_map(|item| item.as_str().map(str::to_string)).collect())
}

fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items.into_iter().filter(|item| seen.insert(item.clone())).collect()
}

fn coerce_ingredient(raw: &Value, index: usize) -> Ingredient {
    if let Value::String(name) = raw {
        if !name.trim().is_empty() {
            return Ingredient {
                name: name.clone(),
                quantity: DEFAULT_QUANTITY.to_string(),
                unit: String::new(),
                estimated_cost: DEFAULT_INGREDIENT_COST,
                is_optional: false,
                substitutes: Vec::new(),
            };
        }
    }

    let fields = Fields::of(raw);
    Ingredient {
        name: fields
            .non_blank(&["name", "ingredient", "item"])
            .unwrap_or_else(|| format!("Ingredient {}", index + 1)),
        quantity: fields
            .non_blank(&["quantity", "amount"])
            .unwrap_or_else(|| DEFAULT_QUANTITY.to_string()),
        unit: fields.text(&["unit"]).unwrap_or_default(),
        estimated_cost: fields
            .number(&["estimatedCost", "estimated_cost", "cost"])
            .unwrap_or(DEFAULT_INGREDIENT_COST),
        is_optional: fields
            .get(&["isOptional", "is_optional", "optional"])
            .and_then(as_bool)
            .unwrap_or(false),
        substitutes: fields.list(&["substitutes"]).unwrap_or_default(),
    }
}

fn coerce_nutrition(raw: Option<&Value>) -> NutritionalInfo {
    let defaults = NutritionalInfo::default();
    let Some(raw) = raw.filter(|v| v.is_object()) else {
        return defaults;
    };
    let fields = Fields::of(raw);
    NutritionalInfo {
        calories: fields.number(&["calories", "kcal"]).unwrap_or(defaults.calories),
        protein: fields.number(&["protein"]).unwrap_or(defaults.protein),
        carbohydrates: fields
            .number(&["carbohydrates", "carbs"])
            .unwrap_or(defaults.carbohydrates),
        fat: fields.number(&["fat"]).unwrap_or(defaults.fat),
        fiber: fields.number(&["fiber", "fibre"]).unwrap_or(defaults.fiber),
        sugar: fields.number(&["sugar", "sugars"]).unwrap_or(defaults.sugar),
        sodium: fields.number(&["sodium"]).unwrap_or(defaults.sodium),
        cholesterol: fields.number(&["cholesterol"]),
        vitamins: fields.list(&["vitamins"]).unwrap_or_default(),
        minerals: fields.list(&["minerals"]).unwrap_or_default(),
    }
}

/// Accepts `{name, description, ingredients}`, a bare string naming the
/// dessert, or nothing.
fn coerce_dessert(raw: Option<&Value>) -> Dessert {
    match raw {
        Some(value) if value.is_object() => {
            let fields = Fields::of(value);
            Dessert {
                name: fields
                    .non_blank(&["name"])
                    .unwrap_or_else(|| Dessert::default().name),
                description: fields.text(&["description"]).unwrap_or_default(),
                ingredients: fields.list(&["ingredients"]).unwrap_or_default(),
            }
        }
        Some(Value::String(name)) if !name.trim().is_empty() => Dessert {
            name: name.clone(),
            ..Dessert::default()
        },
        _ => Dessert::default(),
    }
}

fn coerce_instructions(fields: &Fields<'_>) -> Vec<String> {
    match fields.get(&["instructions", "steps"]) {
        Some(Value::Array(_)) => fields.list(&["instructions", "steps"]).unwrap_or_default(),
        Some(Value::String(single)) if !single.trim().is_empty() => vec![single.clone()],
        _ => fields
            .non_blank(&["preparation", "method"])
            .map(|text| vec![text])
            .unwrap_or_default(),
    }
}

/// Coerces one loosely-typed meal object. `index` is the meal's position in
/// the plan and decides the meal type (and id) when the object has none.
/// Never fails.
pub fn coerce_meal(raw: &Value, index: usize) -> Meal {
    let fields = Fields::of(raw);
    let slot_type = MealType::for_position(index);

    let prep_time = fields.minutes(&["prepTime", "prep_time"]).unwrap_or(DEFAULT_PREP_TIME);
    let cooking_time = fields
        .minutes(&["cookingTime", "cooking_time", "cookTime"])
        .unwrap_or(DEFAULT_COOKING_TIME);
    let total_time = fields
        .minutes(&["totalTime", "total_time"])
        .unwrap_or(prep_time.saturating_add(cooking_time));

    let ingredients = match fields.get(&["ingredients"]) {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| coerce_ingredient(item, i))
            .collect(),
        _ => Vec::new(),
    };

    Meal {
        id: fields
            .non_blank(&["id"])
            .unwrap_or_else(|| format!("{}_{}", slot_type.as_str().to_lowercase(), index)),
        meal_type: fields
            .text(&["mealType", "meal_type", "type"])
            .and_then(|raw| MealType::parse(&raw))
            .unwrap_or(slot_type),
        name: fields
            .non_blank(&["name", "title"])
            .unwrap_or_else(|| slot_type.as_str().to_string()),
        cuisine_type: fields
            .non_blank(&["cuisineType", "cuisine_type", "cuisine"])
            .unwrap_or_else(|| DEFAULT_CUISINE.to_string()),
        description: fields.text(&["description"]).unwrap_or_default(),
        prep_time,
        cooking_time,
        total_time,
        servings: fields
            .number(&["servings"])
            .map(to_whole)
            .filter(|servings| *servings >= 1)
            .unwrap_or(DEFAULT_SERVINGS),
        difficulty: fields
            .text(&["difficulty"])
            .and_then(|raw| Difficulty::parse(&raw))
            .unwrap_or_default(),
        ingredients,
        instructions: coerce_instructions(&fields),
        nutritional_info: coerce_nutrition(fields.get(&["nutritionalInfo", "nutritional_info", "nutrition"])),
        estimated_cost_per_serving: fields
            .number(&["estimatedCostPerServing", "estimated_cost_per_serving", "costPerServing"])
            .unwrap_or(DEFAULT_COST_PER_SERVING),
        health_benefits: fields.list(&["healthBenefits", "health_benefits"]).unwrap_or_default(),
        cooking_tips: fields.list(&["cookingTips", "cooking_tips"]).unwrap_or_default(),
        tags: dedup_preserving_order(fields.list(&["tags"]).unwrap_or_default()),
        dessert: coerce_dessert(fields.get(&["dessert"])),
        image_url: fields.non_blank(&["imageUrl", "image_url"]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::sample_meals;
    use serde_json::json;

    #[test]
    fn test_complete_meals_pass_through_unchanged() {
        for (index, meal) in sample_meals().into_iter().enumerate() {
            let raw = serde_json::to_value(&meal).unwrap();
            assert_eq!(coerce_meal(&raw, index), meal, "meal {} changed", meal.id);
        }
    }

    #[test]
    fn test_empty_object_gets_every_default() {
        let meal = coerce_meal(&json!({}), 1);
        assert_eq!(meal.id, "lunch_1");
        assert_eq!(meal.meal_type, MealType::Lunch);
        assert_eq!(meal.name, "Lunch");
        assert_eq!(meal.cuisine_type, "Australian");
        assert_eq!(meal.prep_time, 5);
        assert_eq!(meal.cooking_time, 10);
        assert_eq!(meal.total_time, 15);
        assert_eq!(meal.servings, 2);
        assert_eq!(meal.difficulty, Difficulty::Beginner);
        assert!(meal.ingredients.is_empty());
        assert!(meal.instructions.is_empty());
        assert_eq!(meal.nutritional_info, NutritionalInfo::default());
        assert_eq!(meal.estimated_cost_per_serving, 5.0);
        assert_eq!(meal.dessert, Dessert::default());
        assert_eq!(meal.image_url, None);
    }

    #[test]
    fn test_non_object_input_still_produces_a_meal() {
        let meal = coerce_meal(&json!("just a string"), 2);
        assert_eq!(meal.meal_type, MealType::Dinner);
        assert_eq!(meal.id, "dinner_2");
    }

    #[test]
    fn test_bad_fields_degrade_individually() {
        let raw = json!({
            "mealType": "Breakfast|Lunch|Dinner",
            "name": "Porridge",
            "prepTime": -3,
            "cookingTime": "12",
            "servings": 0,
            "difficulty": "Medium",
            "ingredients": "oats and milk",
            "instructions": [ "Boil", 4, "Serve" ],
            "nutritionalInfo": { "calories": "250", "protein": "lots", "cholesterol": 15 },
            "estimatedCostPerServing": "cheap",
            "tags": ["warm", "warm", "quick"],
            "dessert": "Stewed apple"
        });
        let meal = coerce_meal(&raw, 0);
        assert_eq!(meal.meal_type, MealType::Breakfast);
        assert_eq!(meal.name, "Porridge");
        assert_eq!(meal.prep_time, 5);
        assert_eq!(meal.cooking_time, 12);
        assert_eq!(meal.total_time, 17);
        assert_eq!(meal.servings, 2);
        assert_eq!(meal.difficulty, Difficulty::Intermediate);
        assert!(meal.ingredients.is_empty());
        assert_eq!(meal.instructions, vec!["Boil".to_string(), "Serve".to_string()]);
        assert_eq!(meal.nutritional_info.calories, 250.0);
        assert_eq!(meal.nutritional_info.protein, 20.0);
        assert_eq!(meal.nutritional_info.cholesterol, Some(15.0));
        assert_eq!(meal.estimated_cost_per_serving, 5.0);
        assert_eq!(meal.tags, vec!["warm".to_string(), "quick".to_string()]);
        assert_eq!(meal.dessert.name, "Stewed apple");
        assert!(meal.dessert.ingredients.is_empty());
    }

    #[test]
    fn test_ingredient_coercion() {
        let raw = json!({
            "ingredients": [
                { "name": "eggs", "quantity": 2, "unit": "large" },
                "spinach",
                { "quantity": "1", "isOptional": "yes", "substitutes": ["kale", 3] },
                42
            ]
        });
        let meal = coerce_meal(&raw, 0);
        assert_eq!(meal.ingredients.len(), 4);
        assert_eq!(meal.ingredients[0].quantity, "2");
        assert_eq!(meal.ingredients[0].estimated_cost, 1.0);
        assert_eq!(meal.ingredients[1].name, "spinach");
        assert_eq!(meal.ingredients[2].name, "Ingredient 3");
        assert!(meal.ingredients[2].is_optional);
        assert_eq!(meal.ingredients[2].substitutes, vec!["kale".to_string()]);
        assert_eq!(meal.ingredients[3].name, "Ingredient 4");
    }

    #[test]
    fn test_instructions_fall_back_to_preparation_text() {
        let meal = coerce_meal(&json!({ "preparation": "Toss everything together." }), 0);
        assert_eq!(meal.instructions, vec!["Toss everything together.".to_string()]);

        let meal = coerce_meal(&json!({ "instructions": "One step only" }), 0);
        assert_eq!(meal.instructions, vec!["One step only".to_string()]);
    }

    #[test]
    fn test_dessert_object_with_gaps() {
        let meal = coerce_meal(&json!({ "dessert": { "description": "Sweet" } }), 0);
        assert_eq!(meal.dessert.name, "Dessert");
        assert_eq!(meal.dessert.description, "Sweet");
    }

    #[test]
    fn test_supplied_total_time_is_kept() {
        let meal = coerce_meal(&json!({ "prepTime": 10, "cookingTime": 20, "totalTime": 45 }), 0);
        assert_eq!(meal.total_time, 45);
        let meal = coerce_meal(&json!({ "prepTime": 10, "cookingTime": 0 }), 0);
        assert_eq!(meal.cooking_time, 0);
        assert_eq!(meal.total_time, 10);
    }
}

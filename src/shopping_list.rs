use std::collections::BTreeMap;

use crate::data_types::{Meal, ShoppingListItem};

pub const OTHER_CATEGORY: &str = "Other";

/// Cost used for an item whose ingredient carries no price.
pub const DEFAULT_ITEM_COST: f64 = 2.0;

/// Checked in order; the first category with a keyword contained in the
/// lowercased ingredient name wins.
pub const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Produce",
        &["bell peppers", "cucumber", "asparagus", "lemon", "banana", "mixed berries", "tomato", "onion", "garlic"],
    ),
    (
        "Protein",
        &["salmon fillets", "chickpeas", "protein powder", "chicken", "beef", "eggs", "tofu"],
    ),
    (
        "Pantry",
        &["quinoa", "tahini", "olive oil", "honey", "garlic", "herbs", "rice", "pasta"],
    ),
    ("Dairy", &["almond milk", "milk", "cheese", "yogurt"]),
];

pub fn category_for_ingredient(name: &str) -> &'static str {
    let lowered = name.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|(category, _)| *category)
        .unwrap_or(OTHER_CATEGORY)
}

fn display_quantity(quantity: &str, unit: &str) -> String {
    format!("{} {}", quantity.trim(), unit.trim()).trim().to_string()
}

/// One entry per ingredient per meal, numbered from 1 in plan order.
///
/// Repeated ingredients across meals are kept as separate entries so each
/// one stays tied to the meal that needs it.
pub fn derive_shopping_list(meals: &[Meal]) -> Vec<ShoppingListItem> {
    let mut items = Vec::new();
    for meal in meals {
        for ingredient in &meal.ingredients {
            let name = ingredient.name.trim();
            if name.is_empty() {
                continue;
            }
            let estimated_cost = if ingredient.estimated_cost > 0.0 {
                ingredient.estimated_cost
            } else {
                DEFAULT_ITEM_COST
            };
            items.push(ShoppingListItem {
                id: (items.len() + 1).to_string(),
                name: name.to_string(),
                quantity: display_quantity(&ingredient.quantity, &ingredient.unit),
                category: category_for_ingredient(name).to_string(),
                checked: false,
                estimated_cost,
                meal_ids: vec![meal.id.clone()],
            });
        }
    }
    items
}

/// Flips the checked flag. Returns the new state, or `None` for an unknown id.
pub fn toggle_item(items: &mut [ShoppingListItem], id: &str) -> Option<bool> {
    let item = items.iter_mut().find(|item| item.id == id)?;
    item.checked = !item.checked;
    Some(item.checked)
}

pub fn completion_percentage(items: &[ShoppingListItem]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    let checked = items.iter().filter(|item| item.checked).count();
    checked as f64 / items.len() as f64 * 100.0
}

pub fn items_for_meal<'a>(items: &'a [ShoppingListItem], meal_id: &str) -> Vec<&'a ShoppingListItem> {
    items
        .iter()
        .filter(|item| item.meal_ids.iter().any(|id| id == meal_id))
        .collect()
}

pub fn group_by_category(items: &[ShoppingListItem]) -> BTreeMap<String, Vec<&ShoppingListItem>> {
    let mut groups: BTreeMap<String, Vec<&ShoppingListItem>> = BTreeMap::new();
    for item in items {
        groups.entry(item.category.clone()).or_default().push(item);
    }
    groups
}

pub fn total_estimated_cost(items: &[ShoppingListItem]) -> f64 {
    items.iter().map(|item| item.estimated_cost).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::sample_meals;

    #[test]
    fn test_category_derivation() {
        assert_eq!(category_for_ingredient("Bell Peppers"), "Produce");
        assert_eq!(category_for_ingredient("Salmon Fillets"), "Protein");
        assert_eq!(category_for_ingredient("Quinoa"), "Pantry");
        assert_eq!(category_for_ingredient("Almond Milk"), "Dairy");
        assert_eq!(category_for_ingredient("Xyzzium Powder"), "Other");
    }

    #[test]
    fn test_first_matching_category_wins() {
        // "garlic" is listed under both Produce and Pantry.
        assert_eq!(category_for_ingredient("Garlic cloves"), "Produce");
        assert_eq!(category_for_ingredient("CHICKEN BREAST"), "Protein");
    }

    #[test]
    fn test_derive_keeps_duplicates_and_meal_ids() {
        let meals = sample_meals();
        let expected: usize = meals.iter().map(|m| m.ingredients.len()).sum();
        let doubled = [meals[0].clone(), meals[0].clone()];

        let items = derive_shopping_list(&meals);
        assert_eq!(items.len(), expected);
        assert_eq!(items[0].id, "1");
        assert_eq!(items.last().unwrap().id, expected.to_string());
        assert!(items.iter().all(|item| item.meal_ids.len() == 1 && !item.checked));

        let repeated = derive_shopping_list(&doubled);
        assert_eq!(repeated.len(), meals[0].ingredients.len() * 2);
        assert_eq!(repeated[0].name, repeated[meals[0].ingredients.len()].name);
    }

    #[test]
    fn test_quantity_display_and_cost() {
        let mut meal = sample_meals().remove(0);
        meal.ingredients.truncate(1);
        meal.ingredients[0].quantity = "2".to_string();
        meal.ingredients[0].unit = "cups".to_string();
        meal.ingredients[0].estimated_cost = 0.0;

        let items = derive_shopping_list(&[meal]);
        assert_eq!(items[0].quantity, "2 cups");
        assert_eq!(items[0].estimated_cost, DEFAULT_ITEM_COST);
    }

    #[test]
    fn test_helpers() {
        let meals = sample_meals();
        let mut items = derive_shopping_list(&meals[..2]);
        assert_eq!(completion_percentage(&items), 0.0);
        assert_eq!(completion_percentage(&[]), 0.0);

        assert_eq!(toggle_item(&mut items, "1"), Some(true));
        assert_eq!(toggle_item(&mut items, "missing"), None);
        let expected = 100.0 / items.len() as f64;
        assert!((completion_percentage(&items) - expected).abs() < 1e-9);
        assert_eq!(toggle_item(&mut items, "1"), Some(false));

        let first_meal = items_for_meal(&items, &meals[0].id);
        assert_eq!(first_meal.len(), meals[0].ingredients.len());

        let groups = group_by_category(&items);
        let grouped: usize = groups.values().map(Vec::len).sum();
        assert_eq!(grouped, items.len());
        assert!(groups.keys().all(|k| ["Produce", "Protein", "Pantry", "Dairy", "Other"].contains(&k.as_str())));
    }
}

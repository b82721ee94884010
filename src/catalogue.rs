use rand::seq::SliceRandom;
use rand::Rng;

use crate::data_types::{Dessert, Difficulty, Ingredient, Meal, MealType, NutritionalInfo};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn ingredient(name: &str, quantity: &str, unit: &str, cost: f64, optional: bool, substitutes: &[&str]) -> Ingredient {
    Ingredient {
        name: name.to_string(),
        quantity: quantity.to_string(),
        unit: unit.to_string(),
        estimated_cost: cost,
        is_optional: optional,
        substitutes: strings(substitutes),
    }
}

#[allow(clippy::too_many_arguments)]
fn nutrition(
    calories: f64,
    protein: f64,
    carbohydrates: f64,
    fat: f64,
    fiber: f64,
    sugar: f64,
    sodium: f64,
    vitamins: &[&str],
    minerals: &[&str],
) -> NutritionalInfo {
    NutritionalInfo {
        calories,
        protein,
        carbohydrates,
        fat,
        fiber,
        sugar,
        sodium,
        cholesterol: None,
        vitamins: strings(vitamins),
        minerals: strings(minerals),
    }
}

fn dessert(name: &str, description: &str, ingredients: &[&str]) -> Dessert {
    Dessert {
        name: name.to_string(),
        description: description.to_string(),
        ingredients: strings(ingredients),
    }
}

/// The built-in meals used for offline and fallback plans.
pub fn sample_meals() -> Vec<Meal> {
    vec![
        Meal {
            id: "1".to_string(),
            meal_type: MealType::Lunch,
            name: "Mediterranean Quinoa Bowl".to_string(),
            cuisine_type: "Mediterranean".to_string(),
            description: "A nutritious bowl packed with quinoa, roasted vegetables, chickpeas, and a creamy tahini dressing. Perfect for a healthy lunch or light dinner.".to_string(),
            prep_time: 10,
            cooking_time: 25,
            total_time: 35,
            servings: 2,
            difficulty: Difficulty::Beginner,
            ingredients: vec![
                ingredient("quinoa", "1", "cup", 3.50, false, &["brown rice", "couscous"]),
                ingredient("chickpeas", "1", "can", 1.80, false, &["black beans", "lentils"]),
                ingredient("red bell pepper", "1", "large", 2.50, false, &["yellow pepper"]),
                ingredient("cucumber", "1", "medium", 1.50, false, &["zucchini"]),
                ingredient("tahini", "3", "tbsp", 2.00, false, &["almond butter"]),
                ingredient("lemon", "1", "whole", 0.80, false, &["lime"]),
                ingredient("olive oil", "2", "tbsp", 0.50, false, &[]),
                ingredient("fresh parsley", "1/4", "cup", 1.20, true, &["cilantro"]),
            ],
            instructions: strings(&[
                "Rinse quinoa thoroughly and cook according to package instructions (usually 15 minutes in boiling water)",
                "Drain and rinse chickpeas, then roast in oven at 200°C for 15 minutes until crispy",
                "Dice bell pepper and cucumber into bite-sized pieces",
                "Mix tahini, lemon juice, olive oil, salt, and pepper in a small bowl for dressing",
                "Combine cooked quinoa, vegetables, and chickpeas in serving bowls",
                "Drizzle with tahini dressing and garnish with fresh parsley",
            ]),
            nutritional_info: nutrition(
                420.0, 18.0, 58.0, 14.0, 12.0, 8.0, 380.0,
                &["Vitamin C", "Vitamin K", "Folate"],
                &["Iron", "Magnesium", "Phosphorus"],
            ),
            estimated_cost_per_serving: 7.40,
            health_benefits: strings(&[
                "High in plant-based protein and fiber",
                "Rich in antioxidants from colorful vegetables",
                "Heart-healthy fats from tahini and olive oil",
                "Supports digestive health",
            ]),
            cooking_tips: strings(&[
                "Toast quinoa in a dry pan before cooking for extra flavor",
                "Add a pinch of cumin to the tahini dressing for depth",
                "Meal prep friendly - stores well for 3-4 days",
            ]),
            tags: strings(&["healthy", "vegetarian", "high-protein", "mediterranean", "meal-prep"]),
            dessert: dessert(
                "Greek Yogurt with Honey",
                "Light and creamy Greek yogurt drizzled with local honey",
                &["Greek yogurt", "honey", "nuts"],
            ),
            image_url: None,
        },
        Meal {
            id: "2".to_string(),
            meal_type: MealType::Dinner,
            name: "Garlic Herb Salmon with Asparagus".to_string(),
            cuisine_type: "Australian".to_string(),
            description: "Pan-seared salmon fillet seasoned with fresh herbs and garlic, served with roasted asparagus. A protein-rich, low-carb dinner option using local Australian salmon.".to_string(),
            prep_time: 15,
            cooking_time: 20,
            total_time: 35,
            servings: 2,
            difficulty: Difficulty::Intermediate,
            ingredients: vec![
                ingredient("salmon fillets", "2", "pieces (200g each)", 16.00, false, &["barramundi", "kingfish"]),
                ingredient("garlic cloves", "4", "cloves", 0.50, false, &["garlic powder"]),
                ingredient("fresh dill", "2", "tbsp", 2.50, false, &["dried dill", "parsley"]),
                ingredient("asparagus", "500", "g", 4.50, false, &["broccolini", "green beans"]),
                ingredient("olive oil", "3", "tbsp", 0.75, false, &["avocado oil"]),
                ingredient("lemon", "1", "whole", 0.80, false, &["lime"]),
                ingredient("butter", "2", "tbsp", 1.00, true, &["olive oil"]),
            ],
            instructions: strings(&[
                "Preheat oven to 220°C",
                "Season salmon fillets with salt, pepper, and minced garlic",
                "Heat olive oil in oven-safe pan over medium-high heat",
                "Sear salmon skin-side up for 3-4 minutes until golden",
                "Flip salmon and add herbs and butter to pan",
                "Toss asparagus with olive oil, salt, and pepper on separate baking sheet",
                "Place both salmon pan and asparagus in oven for 8-10 minutes",
                "Serve immediately with lemon wedges",
            ]),
            nutritional_info: nutrition(
                380.0, 42.0, 8.0, 20.0, 4.0, 4.0, 290.0,
                &["Vitamin D", "Vitamin B12", "Vitamin K"],
                &["Selenium", "Potassium", "Phosphorus"],
            ),
            estimated_cost_per_serving: 12.55,
            health_benefits: strings(&[
                "Excellent source of omega-3 fatty acids",
                "High-quality complete protein",
                "Supports heart and brain health",
                "Low in carbohydrates, suitable for keto diet",
            ]),
            cooking_tips: strings(&[
                "Don't move the salmon while searing for best crust",
                "Check doneness - salmon should flake easily with a fork",
                "Choose thick asparagus spears for better texture",
            ]),
            tags: strings(&["seafood", "low-carb", "high-protein", "gluten-free", "australian"]),
            dessert: dessert(
                "Lemon Sorbet",
                "Refreshing lemon sorbet with mint garnish",
                &["lemon sorbet", "mint leaves", "lemon zest"],
            ),
            image_url: None,
        },
        Meal {
            id: "3".to_string(),
            meal_type: MealType::Breakfast,
            name: "Aussie Berry Protein Smoothie".to_string(),
            cuisine_type: "Australian".to_string(),
            description: "A refreshing and energizing smoothie with native Australian berries, protein powder, and locally-sourced ingredients. Perfect for breakfast or post-workout recovery.".to_string(),
            prep_time: 5,
            cooking_time: 0,
            total_time: 5,
            servings: 1,
            difficulty: Difficulty::Beginner,
            ingredients: vec![
                ingredient("frozen mixed berries", "1", "cup", 3.00, false, &["fresh berries"]),
                ingredient("vanilla protein powder", "1", "scoop (30g)", 2.50, false, &["pea protein"]),
                ingredient("almond milk", "1", "cup", 1.50, false, &["oat milk", "coconut milk"]),
                ingredient("banana", "1/2", "medium", 0.75, false, &["mango"]),
                ingredient("Australian honey", "1", "tbsp", 1.00, true, &["maple syrup"]),
                ingredient("almond butter", "1", "tbsp", 1.25, true, &["peanut butter"]),
                ingredient("chia seeds", "1", "tsp", 0.50, true, &["flax seeds"]),
            ],
            instructions: strings(&[
                "Add all liquid ingredients to blender first",
                "Add frozen berries, banana, and protein powder",
                "Add honey and almond butter if using",
                "Blend on high speed for 60-90 seconds until completely smooth",
                "Add more almond milk if needed for desired consistency",
                "Pour into glass and top with chia seeds",
                "Serve immediately for best texture and taste",
            ]),
            nutritional_info: nutrition(
                320.0, 28.0, 38.0, 8.0, 8.0, 28.0, 180.0,
                &["Vitamin C", "Vitamin E", "Vitamin B6"],
                &["Potassium", "Magnesium", "Calcium"],
            ),
            estimated_cost_per_serving: 10.50,
            health_benefits: strings(&[
                "High in antioxidants from Australian berries",
                "Excellent post-workout recovery drink",
                "Supports muscle protein synthesis",
                "Boosts energy and mental clarity",
            ]),
            cooking_tips: strings(&[
                "Use frozen berries for thicker consistency",
                "Add ingredients gradually for better blending",
                "Pre-soak chia seeds for easier digestion",
            ]),
            tags: strings(&["smoothie", "protein", "quick", "dairy-free", "australian", "post-workout"]),
            dessert: dessert(
                "Fresh Fruit Salad",
                "Seasonal Australian fruits with honey drizzle",
                &["mixed berries", "banana", "honey", "mint"],
            ),
            image_url: None,
        },
        Meal {
            id: "4".to_string(),
            meal_type: MealType::Dinner,
            name: "Vietnamese Pho-Inspired Chicken Soup".to_string(),
            cuisine_type: "Vietnamese".to_string(),
            description: "A simplified, family-friendly version of traditional Vietnamese pho with aromatic herbs, tender chicken, and rice noodles. Adapted for Australian kitchens.".to_string(),
            prep_time: 20,
            cooking_time: 45,
            total_time: 65,
            servings: 4,
            difficulty: Difficulty::Intermediate,
            ingredients: vec![
                ingredient("chicken thighs", "800", "g boneless", 12.00, false, &["chicken breast"]),
                ingredient("rice noodles", "400", "g dried", 3.50, false, &["ramen noodles"]),
                ingredient("beef stock", "2", "litres", 4.00, false, &["chicken stock"]),
                ingredient("onion", "1", "large", 1.50, false, &[]),
                ingredient("ginger", "50", "g fresh", 2.00, false, &["ground ginger"]),
                ingredient("star anise", "3", "whole", 1.50, false, &["five spice"]),
                ingredient("fish sauce", "3", "tbsp", 1.00, false, &["soy sauce"]),
                ingredient("bean sprouts", "200", "g", 2.50, true, &[]),
                ingredient("fresh herbs", "1", "bunch mixed", 4.00, false, &[]),
            ],
            instructions: strings(&[
                "Char onion and ginger over open flame or under grill until fragrant",
                "Bring stock to boil, add charred vegetables and star anise",
                "Add chicken thighs and simmer for 25 minutes until tender",
                "Remove chicken, shred when cool, strain and return broth to pot",
                "Season broth with fish sauce and sugar to taste",
                "Cook rice noodles according to package directions",
                "Divide noodles between bowls, top with shredded chicken",
                "Ladle hot broth over and serve with herbs and bean sprouts",
            ]),
            nutritional_info: nutrition(
                420.0, 35.0, 45.0, 12.0, 3.0, 6.0, 1200.0,
                &["Vitamin B6", "Niacin", "Vitamin C"],
                &["Iron", "Zinc", "Selenium"],
            ),
            estimated_cost_per_serving: 7.63,
            health_benefits: strings(&[
                "Comforting and hydrating",
                "Rich in protein and B vitamins",
                "Anti-inflammatory ginger and herbs",
                "Supports immune system",
            ]),
            cooking_tips: strings(&[
                "Charring vegetables adds authentic smoky flavor",
                "Skim foam from broth for clearer soup",
                "Serve garnishes on the side for customization",
            ]),
            tags: strings(&["vietnamese", "soup", "comfort-food", "gluten-free", "family-friendly"]),
            dessert: dessert(
                "Vietnamese Coffee",
                "Strong Vietnamese coffee with condensed milk",
                &["vietnamese coffee", "condensed milk", "ice"],
            ),
            image_url: None,
        },
        Meal {
            id: "5".to_string(),
            meal_type: MealType::Dinner,
            name: "Mexican-Style Black Bean Quesadillas".to_string(),
            cuisine_type: "Mexican".to_string(),
            description: "Crispy whole wheat tortillas filled with seasoned black beans, cheese, and vegetables. A budget-friendly, protein-rich meal that's perfect for busy weeknights.".to_string(),
            prep_time: 15,
            cooking_time: 20,
            total_time: 35,
            servings: 4,
            difficulty: Difficulty::Beginner,
            ingredients: vec![
                ingredient("black beans", "2", "cans (400g each)", 3.60, false, &["kidney beans"]),
                ingredient("whole wheat tortillas", "8", "large", 4.50, false, &["corn tortillas"]),
                ingredient("cheese", "200", "g grated", 6.00, false, &["vegan cheese"]),
                ingredient("red capsicum", "1", "large", 2.50, false, &["yellow capsicum"]),
                ingredient("red onion", "1", "medium", 1.50, false, &["white onion"]),
                ingredient("cumin", "1", "tsp", 0.20, false, &[]),
                ingredient("paprika", "1", "tsp", 0.20, false, &[]),
                ingredient("olive oil", "2", "tbsp", 0.50, false, &[]),
                ingredient("avocado", "1", "large", 2.50, true, &[]),
            ],
            instructions: strings(&[
                "Drain and rinse black beans, mash lightly with fork",
                "Dice capsicum and onion finely",
                "Heat 1 tbsp oil in pan, sauté vegetables until soft",
                "Add mashed beans, cumin, paprika, salt and pepper",
                "Cook for 5 minutes until mixture thickens",
                "Spread bean mixture on half of each tortilla",
                "Top with cheese and fold tortillas over",
                "Cook quesadillas in dry pan for 2-3 minutes each side until crispy",
                "Serve with sliced avocado and salsa",
            ]),
            nutritional_info: nutrition(
                380.0, 18.0, 48.0, 14.0, 12.0, 6.0, 680.0,
                &["Folate", "Vitamin C", "Vitamin K"],
                &["Iron", "Magnesium", "Potassium"],
            ),
            estimated_cost_per_serving: 5.23,
            health_benefits: strings(&[
                "High in plant-based protein and fiber",
                "Rich in folate and iron",
                "Heart-healthy monounsaturated fats",
                "Budget-friendly complete meal",
            ]),
            cooking_tips: strings(&[
                "Don't overfill quesadillas or they'll be messy",
                "Use a pizza cutter to slice into triangles",
                "Make extra bean mixture for meal prep",
            ]),
            tags: strings(&["mexican", "vegetarian", "budget-friendly", "family-friendly", "quick"]),
            dessert: dessert(
                "Mexican Flan",
                "Creamy caramel flan with vanilla",
                &["eggs", "milk", "sugar", "vanilla"],
            ),
            image_url: None,
        },
    ]
}

/// In-memory meal store backing the fallback generator.
#[derive(Debug, Clone)]
pub struct MealCatalogue {
    meals: Vec<Meal>,
}

impl Default for MealCatalogue {
    fn default() -> Self {
        Self::new(sample_meals())
    }
}

impl MealCatalogue {
    pub fn new(meals: Vec<Meal>) -> Self {
        Self { meals }
    }

    pub fn all(&self) -> &[Meal] {
        &self.meals
    }

    pub fn len(&self) -> usize {
        self.meals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meals.is_empty()
    }

    pub fn by_id(&self, id: &str) -> Option<&Meal> {
        self.meals.iter().find(|meal| meal.id == id)
    }

    /// Case-insensitive substring match over name, description and tags.
    pub fn search(&self, query: &str) -> Vec<&Meal> {
        let term = query.to_lowercase();
        self.meals
            .iter()
            .filter(|meal| {
                meal.name.to_lowercase().contains(&term)
                    || meal.description.to_lowercase().contains(&term)
                    || meal.tags.iter().any(|tag| tag.to_lowercase().contains(&term))
            })
            .collect()
    }

    pub fn by_tag(&self, tag: &str) -> Vec<&Meal> {
        self.meals.iter().filter(|meal| meal.has_tag(tag)).collect()
    }

    pub fn by_cuisine(&self, cuisine: &str) -> Vec<&Meal> {
        self.meals.iter().filter(|meal| meal.cuisine_type == cuisine).collect()
    }

    pub fn by_difficulty(&self, difficulty: Difficulty) -> Vec<&Meal> {
        self.meals.iter().filter(|meal| meal.difficulty == difficulty).collect()
    }

    /// Meals whose total time fits within `max_minutes`.
    pub fn by_max_time(&self, max_minutes: u32) -> Vec<&Meal> {
        self.meals.iter().filter(|meal| meal.total_time <= max_minutes).collect()
    }

    pub fn by_max_cost(&self, max_cost: f64) -> Vec<&Meal> {
        self.meals
            .iter()
            .filter(|meal| meal.estimated_cost_per_serving <= max_cost)
            .collect()
    }

    /// Up to `count` distinct meals in random order.
    pub fn random<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<Meal> {
        self.meals.choose_multiple(rng, count).cloned().collect()
    }

    pub fn add(&mut self, meal: Meal) {
        self.meals.push(meal);
    }

    /// Applies `edit` to the meal with `id`. Returns false when no such meal exists.
    pub fn update(&mut self, id: &str, edit: impl FnOnce(&mut Meal)) -> bool {
        match self.meals.iter_mut().find(|meal| meal.id == id) {
            Some(meal) => {
                edit(meal);
                true
            }
            None => false,
        }
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.meals.len();
        self.meals.retain(|meal| meal.id != id);
        self.meals.len() != before
    }

    /// Sums nutrition over the given ids; unknown ids are ignored.
    pub fn nutritional_summary(&self, ids: &[&str]) -> NutritionalInfo {
        NutritionalInfo::sum(ids.iter().filter_map(|id| self.by_id(id)).map(|meal| &meal.nutritional_info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_sample_meals_are_complete() {
        let meals = sample_meals();
        assert_eq!(meals.len(), 5);
        for meal in &meals {
            assert!(meal.is_usable(), "{} has no ingredients or instructions", meal.name);
            assert_eq!(meal.total_time, meal.prep_time + meal.cooking_time, "{}", meal.name);
            assert!(meal.servings >= 1);
        }
    }

    #[test]
    fn test_queries() {
        let catalogue = MealCatalogue::default();
        assert_eq!(catalogue.by_id("2").map(|m| m.name.as_str()), Some("Garlic Herb Salmon with Asparagus"));
        assert!(catalogue.by_id("missing").is_none());
        assert_eq!(catalogue.by_cuisine("Australian").len(), 2);
        assert_eq!(catalogue.by_tag("VEGETARIAN").len(), 2);
        assert_eq!(catalogue.by_max_time(5).len(), 1);
        assert_eq!(catalogue.by_max_cost(7.5).len(), 2);
        assert_eq!(catalogue.by_difficulty(Difficulty::Intermediate).len(), 2);

        let salmon: Vec<_> = catalogue.search("salmon").iter().map(|m| m.id.clone()).collect();
        assert_eq!(salmon, vec!["2".to_string()]);
        assert_eq!(catalogue.search("family-friendly").len(), 2);
    }

    #[test]
    fn test_random_is_distinct_and_capped() {
        let catalogue = MealCatalogue::default();
        let mut rng = StdRng::seed_from_u64(7);
        let picked = catalogue.random(3, &mut rng);
        assert_eq!(picked.len(), 3);
        let ids: HashSet<_> = picked.iter().map(|m| m.id.clone()).collect();
        assert_eq!(ids.len(), 3);

        assert_eq!(catalogue.random(50, &mut rng).len(), 5);
    }

    #[test]
    fn test_mutations() {
        let mut catalogue = MealCatalogue::default();
        assert!(catalogue.update("1", |meal| meal.servings = 6));
        assert_eq!(catalogue.by_id("1").unwrap().servings, 6);
        assert!(!catalogue.update("nope", |meal| meal.servings = 1));

        assert!(catalogue.delete("1"));
        assert!(!catalogue.delete("1"));
        assert_eq!(catalogue.len(), 4);

        let mut extra = sample_meals().remove(0);
        extra.id = "99".to_string();
        catalogue.add(extra);
        assert!(catalogue.by_id("99").is_some());
    }

    #[test]
    fn test_nutritional_summary_ignores_unknown_ids() {
        let catalogue = MealCatalogue::default();
        let summary = catalogue.nutritional_summary(&["1", "2", "unknown"]);
        assert_eq!(summary.calories, 800.0);
        assert_eq!(summary.protein, 60.0);
        assert_eq!(summary.sodium, 670.0);
    }
}

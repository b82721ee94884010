use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealType {
    pub const ALL: [MealType; 3] = [MealType::Breakfast, MealType::Lunch, MealType::Dinner];

    /// Slot guess for a meal at `index` in a plan. Anything past the third
    /// slot is treated as another breakfast.
    pub fn for_position(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or(MealType::Breakfast)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "breakfast" => Some(MealType::Breakfast),
            "lunch" => Some(MealType::Lunch),
            "dinner" => Some(MealType::Dinner),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "beginner" | "easy" => Some(Difficulty::Beginner),
            "intermediate" | "medium" => Some(Difficulty::Intermediate),
            "advanced" | "hard" => Some(Difficulty::Advanced),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub name: String,
    /// Free-text magnitude such as "1/2" or "200".
    pub quantity: String,
    pub unit: String,
    pub estimated_cost: f64,
    pub is_optional: bool,
    pub substitutes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionalInfo {
    pub calories: f64,
    pub protein: f64,
    pub carbohydrates: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sugar: f64,
    /// Milligrams.
    pub sodium: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cholesterol: Option<f64>,
    #[serde(default)]
    pub vitamins: Vec<String>,
    #[serde(default)]
    pub minerals: Vec<String>,
}

impl Default for NutritionalInfo {
    fn default() -> Self {
        NutritionalInfo {
            calories: 400.0,
            protein: 20.0,
            carbohydrates: 40.0,
            fat: 10.0,
            fiber: 5.0,
            sugar: 5.0,
            sodium: 300.0,
            cholesterol: None,
            vitamins: Vec::new(),
            minerals: Vec::new(),
        }
    }
}

impl NutritionalInfo {
    pub fn zero() -> Self {
        NutritionalInfo {
            calories: 0.0,
            protein: 0.0,
            carbohydrates: 0.0,
            fat: 0.0,
            fiber: 0.0,
            sugar: 0.0,
            sodium: 0.0,
            cholesterol: None,
            vitamins: Vec::new(),
            minerals: Vec::new(),
        }
    }

    /// Field-wise sum of the numeric values. Cholesterol is only summed when
    /// at least one input reports it.
    pub fn sum<'a>(infos: impl IntoIterator<Item = &'a NutritionalInfo>) -> Self {
        infos.into_iter().fold(Self::zero(), |mut acc, info| {
            acc.calories += info.calories;
            acc.protein += info.protein;
            acc.carbohydrates += info.carbohydrates;
            acc.fat += info.fat;
            acc.fiber += info.fiber;
            acc.sugar += info.sugar;
            acc.sodium += info.sodium;
            if let Some(cholesterol) = info.cholesterol {
                acc.cholesterol = Some(acc.cholesterol.unwrap_or(0.0) + cholesterol);
            }
            acc
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dessert {
    pub name: String,
    pub description: String,
    pub ingredients: Vec<String>,
}

impl Default for Dessert {
    fn default() -> Self {
        Dessert {
            name: "Dessert".to_string(),
            description: String::new(),
            ingredients: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub id: String,
    pub meal_type: MealType,
    pub name: String,
    pub cuisine_type: String,
    pub description: String,
    pub prep_time: u32,
    pub cooking_time: u32,
    pub total_time: u32,
    pub servings: u32,
    pub difficulty: Difficulty,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    pub nutritional_info: NutritionalInfo,
    /// AUD.
    pub estimated_cost_per_serving: f64,
    pub health_benefits: Vec<String>,
    pub cooking_tips: Vec<String>,
    pub tags: Vec<String>,
    pub dessert: Dessert,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Meal {
    pub fn is_usable(&self) -> bool {
        !self.ingredients.is_empty() && !self.instructions.is_empty()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListItem {
    pub id: String,
    pub name: String,
    /// Quantity and unit joined for display.
    pub quantity: String,
    pub category: String,
    pub checked: bool,
    pub estimated_cost: f64,
    pub meal_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DietaryGoal {
    #[serde(rename = "Weight Loss")]
    WeightLoss,
    #[serde(rename = "Muscle Building")]
    MuscleBuilding,
    #[default]
    #[serde(rename = "Family Nutrition")]
    FamilyNutrition,
    #[serde(rename = "Budget-Friendly")]
    BudgetFriendly,
}

impl fmt::Display for DietaryGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DietaryGoal::WeightLoss => "Weight Loss",
            DietaryGoal::MuscleBuilding => "Muscle Building",
            DietaryGoal::FamilyNutrition => "Family Nutrition",
            DietaryGoal::BudgetFriendly => "Budget-Friendly",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MealComplexity {
    Simple,
    #[default]
    Moderate,
    Complex,
}

impl fmt::Display for MealComplexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MealComplexity::Simple => "Simple",
            MealComplexity::Moderate => "Moderate",
            MealComplexity::Complex => "Complex",
        };
        f.write_str(label)
    }
}

/// Per-person budget band in AUD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub cuisine_types: Vec<String>,
    pub dietary_goal: DietaryGoal,
    pub number_of_people: u32,
    pub planning_days: u32,
    pub budget_range: BudgetRange,
    pub dietary_restrictions: Vec<String>,
    pub allergies: Vec<String>,
    pub cooking_skill_level: Difficulty,
    /// Minutes per day available for cooking.
    pub time_constraints: u32,
    pub preferred_meal_complexity: MealComplexity,
    pub kitchen_equipment: Vec<String>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        UserPreferences {
            cuisine_types: Vec::new(),
            dietary_goal: DietaryGoal::FamilyNutrition,
            number_of_people: 2,
            planning_days: 7,
            budget_range: BudgetRange { min: 20.0, max: 35.0 },
            dietary_restrictions: Vec::new(),
            allergies: Vec::new(),
            cooking_skill_level: Difficulty::Intermediate,
            time_constraints: 30,
            preferred_meal_complexity: MealComplexity::Moderate,
            kitchen_equipment: vec!["Basic cooking equipment".to_string()],
        }
    }
}

pub const MAX_PEOPLE: u32 = 8;
pub const MAX_PLAN_DAYS: u32 = 7;
pub const MAX_MEALS_PER_DAY: u32 = 6;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("number of people must be between 1 and 8, got {0}")]
    PeopleOutOfRange(u32),
    #[error("plan duration must be between 1 and 7 days, got {0}")]
    DurationOutOfRange(u32),
    #[error("meals per day must be between 1 and 6, got {0}")]
    MealsPerDayOutOfRange(u32),
    #[error("invalid budget range {min}..{max}")]
    InvalidBudget { min: f64, max: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanRequest {
    pub preferences: UserPreferences,
    /// Days.
    pub duration: u32,
    pub meals_per_day: u32,
    pub generate_shopping_list: bool,
}

impl Default for MealPlanRequest {
    fn default() -> Self {
        MealPlanRequest {
            preferences: UserPreferences::default(),
            duration: 7,
            meals_per_day: 3,
            generate_shopping_list: true,
        }
    }
}

impl MealPlanRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        let people = self.preferences.number_of_people;
        if !(1..=MAX_PEOPLE).contains(&people) {
            return Err(RequestError::PeopleOutOfRange(people));
        }
        if !(1..=MAX_PLAN_DAYS).contains(&self.duration) {
            return Err(RequestError::DurationOutOfRange(self.duration));
        }
        if !(1..=MAX_MEALS_PER_DAY).contains(&self.meals_per_day) {
            return Err(RequestError::MealsPerDayOutOfRange(self.meals_per_day));
        }
        let BudgetRange { min, max } = self.preferences.budget_range;
        if !min.is_finite() || !max.is_finite() || min < 0.0 || min > max {
            return Err(RequestError::InvalidBudget { min, max });
        }
        Ok(())
    }

    pub fn total_meals(&self) -> usize {
        self.duration as usize * self.meals_per_day as usize
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealGenerationResponse {
    pub meals: Vec<Meal>,
    pub total_cost: f64,
    pub nutritional_summary: NutritionalInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shopping_list: Option<Vec<ShoppingListItem>>,
    pub plan_summary: String,
    pub health_insights: Vec<String>,
    /// Set when the meals were salvaged from a malformed AI response.
    #[serde(default)]
    pub is_partial: bool,
}

/// Σ cost per serving × servings over all meals.
pub fn plan_total_cost(meals: &[Meal]) -> f64 {
    meals
        .iter()
        .map(|m| m.estimated_cost_per_serving * m.servings as f64)
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStage {
    Analyzing,
    Finding,
    Optimizing,
    Finalizing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationProgress {
    pub stage: ProgressStage,
    pub message: String,
    /// 0-100.
    pub progress: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meal_type_position_guess() {
        assert_eq!(MealType::for_position(0), MealType::Breakfast);
        assert_eq!(MealType::for_position(1), MealType::Lunch);
        assert_eq!(MealType::for_position(2), MealType::Dinner);
        assert_eq!(MealType::for_position(7), MealType::Breakfast);
    }

    #[test]
    fn test_enum_parsing_is_case_insensitive() {
        assert_eq!(MealType::parse(" dinner "), Some(MealType::Dinner));
        assert_eq!(MealType::parse("Brunch"), None);
        assert_eq!(Difficulty::parse("HARD"), Some(Difficulty::Advanced));
        assert_eq!(Difficulty::parse("intermediate"), Some(Difficulty::Intermediate));
    }

    #[test]
    fn test_request_validation() {
        let mut request = MealPlanRequest::default();
        assert!(request.validate().is_ok());
        assert_eq!(request.total_meals(), 21);

        request.preferences.number_of_people = 9;
        assert_eq!(request.validate(), Err(RequestError::PeopleOutOfRange(9)));

        request.preferences.number_of_people = 1;
        request.preferences.budget_range = BudgetRange { min: 40.0, max: 10.0 };
        assert!(matches!(request.validate(), Err(RequestError::InvalidBudget { .. })));

        request.preferences.budget_range = BudgetRange { min: 10.0, max: 10.0 };
        request.duration = 0;
        assert_eq!(request.validate(), Err(RequestError::DurationOutOfRange(0)));
    }

    #[test]
    fn test_meals_per_day_bounds() {
        let mut request = MealPlanRequest::default();
        request.meals_per_day = 0;
        assert_eq!(request.validate(), Err(RequestError::MealsPerDayOutOfRange(0)));

        request.meals_per_day = u32::MAX;
        assert_eq!(request.validate(), Err(RequestError::MealsPerDayOutOfRange(u32::MAX)));

        request.meals_per_day = MAX_MEALS_PER_DAY;
        request.duration = MAX_PLAN_DAYS;
        assert!(request.validate().is_ok());
        assert_eq!(request.total_meals(), 42);

        // Unvalidated input must not overflow.
        request.duration = u32::MAX;
        request.meals_per_day = u32::MAX;
        assert_eq!(request.total_meals(), u32::MAX as usize * u32::MAX as usize);
    }

    #[test]
    fn test_nutrition_sum() {
        let a = NutritionalInfo::default();
        let b = NutritionalInfo {
            cholesterol: Some(30.0),
            ..NutritionalInfo::default()
        };
        let total = NutritionalInfo::sum([&a, &b]);
        assert_eq!(total.calories, 800.0);
        assert_eq!(total.sodium, 600.0);
        assert_eq!(total.cholesterol, Some(30.0));
    }

    #[test]
    fn test_dietary_goal_wire_names() {
        let json = serde_json::to_string(&DietaryGoal::BudgetFriendly).unwrap();
        assert_eq!(json, "\"Budget-Friendly\"");
        let goal: DietaryGoal = serde_json::from_str("\"Weight Loss\"").unwrap();
        assert_eq!(goal, DietaryGoal::WeightLoss);
    }
}

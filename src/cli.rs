use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::data_types::{
    BudgetRange, DietaryGoal, Difficulty, MealComplexity, MealPlanRequest, UserPreferences,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "AI-assisted weekly meal planner", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a meal plan
    Plan(PlanArgs),
    /// Manage the stored OpenAI API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
    /// Ask for help customising a meal or the whole plan
    Chat(ChatArgs),
}

#[derive(Subcommand, Debug)]
pub enum KeyAction {
    Set { value: String },
    Remove,
    Status,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum GoalArg {
    WeightLoss,
    MuscleBuilding,
    FamilyNutrition,
    BudgetFriendly,
}

impl From<GoalArg> for DietaryGoal {
    fn from(arg: GoalArg) -> Self {
        match arg {
            GoalArg::WeightLoss => DietaryGoal::WeightLoss,
            GoalArg::MuscleBuilding => DietaryGoal::MuscleBuilding,
            GoalArg::FamilyNutrition => DietaryGoal::FamilyNutrition,
            GoalArg::BudgetFriendly => DietaryGoal::BudgetFriendly,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum SkillArg {
    Beginner,
    Intermediate,
    Advanced,
}

impl From<SkillArg> for Difficulty {
    fn from(arg: SkillArg) -> Self {
        match arg {
            SkillArg::Beginner => Difficulty::Beginner,
            SkillArg::Intermediate => Difficulty::Intermediate,
            SkillArg::Advanced => Difficulty::Advanced,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ComplexityArg {
    Simple,
    Moderate,
    Complex,
}

impl From<ComplexityArg> for MealComplexity {
    fn from(arg: ComplexityArg) -> Self {
        match arg {
            ComplexityArg::Simple => MealComplexity::Simple,
            ComplexityArg::Moderate => MealComplexity::Moderate,
            ComplexityArg::Complex => MealComplexity::Complex,
        }
    }
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[arg(short, long, default_value_t = 2)]
    pub people: u32,
    /// Plan length in days (1-7)
    #[arg(short, long, default_value_t = 1)]
    pub days: u32,
    #[arg(long, default_value_t = 3)]
    pub meals_per_day: u32,
    /// Minimum cost per serving (AUD)
    #[arg(long, default_value_t = 20.0)]
    pub budget_min: f64,
    /// Maximum cost per serving (AUD)
    #[arg(long, default_value_t = 35.0)]
    pub budget_max: f64,
    #[arg(long, value_enum, default_value_t = GoalArg::FamilyNutrition)]
    pub goal: GoalArg,
    #[arg(long = "cuisine")]
    pub cuisines: Vec<String>,
    #[arg(long = "restriction")]
    pub restrictions: Vec<String>,
    #[arg(long = "allergy")]
    pub allergies: Vec<String>,
    #[arg(long, value_enum, default_value_t = SkillArg::Intermediate)]
    pub skill: SkillArg,
    /// Minutes available for cooking per day
    #[arg(long, default_value_t = 30)]
    pub time: u32,
    #[arg(long, value_enum, default_value_t = ComplexityArg::Moderate)]
    pub complexity: ComplexityArg,
    #[arg(long = "equipment")]
    pub equipment: Vec<String>,
    /// Skip the AI service and use the built-in meals
    #[arg(long)]
    pub offline: bool,
    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
    #[arg(long)]
    pub no_shopping_list: bool,
}

impl PlanArgs {
    pub fn to_request(&self) -> MealPlanRequest {
        let defaults = UserPreferences::default();
        MealPlanRequest {
            preferences: UserPreferences {
                cuisine_types: self.cuisines.clone(),
                dietary_goal: self.goal.into(),
                number_of_people: self.people,
                planning_days: self.days,
                budget_range: BudgetRange {
                    min: self.budget_min,
                    max: self.budget_max,
                },
                dietary_restrictions: self.restrictions.clone(),
                allergies: self.allergies.clone(),
                cooking_skill_level: self.skill.into(),
                time_constraints: self.time,
                preferred_meal_complexity: self.complexity.into(),
                kitchen_equipment: if self.equipment.is_empty() {
                    defaults.kitchen_equipment
                } else {
                    self.equipment.clone()
                },
            },
            duration: self.days,
            meals_per_day: self.meals_per_day,
            generate_shopping_list: !self.no_shopping_list,
        }
    }
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Catalogue meal id to customise; omit to discuss the whole plan
    #[arg(short, long)]
    pub meal: Option<String>,
    pub message: Vec<String>,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

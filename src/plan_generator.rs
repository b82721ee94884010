use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::api_connection::{ApiConnectionError, ChatClient, ChatMessage};
use crate::config::AppConfig;
use crate::data_types::{GenerationProgress, MealGenerationResponse, MealPlanRequest, ProgressStage};
use crate::normalizer::{normalize_response, NormalizeError};
use crate::shopping_list::derive_shopping_list;

pub const MEAL_PLAN_SYSTEM_PROMPT: &str = "You are a professional nutritionist and chef specializing in creating personalized meal plans. You MUST generate the exact number of meals requested and always respond with valid JSON that matches the exact structure requested. Do not skip any meals or days. Do NOT wrap your response in code blocks or markdown.";

const RESPONSE_STRUCTURE: &str = r#"{
  "meals": [
    {
      "mealType": "Breakfast|Lunch|Dinner",
      "name": "...",
      "description": "...",
      "ingredients": [
        { "name": "...", "quantity": "...", "unit": "..." }
      ],
      "instructions": ["...", "..."],
      "dessert": { "name": "...", "description": "...", "ingredients": ["..."] }
    }
  ],
  "planSummary": "..."
}"#;

/// Callback receiving progress updates while a plan is generated.
pub type ProgressFn<'a> = &'a (dyn Fn(GenerationProgress) + Send + Sync);

#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Api(#[from] ApiConnectionError),
    #[error(transparent)]
    Format(#[from] NormalizeError),
}

impl PlanError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, PlanError::Api(e) if e.is_rate_limited())
    }
}

#[async_trait]
pub trait MealPlanGenerator: Send + Sync {
    async fn generate(
        &self,
        request: &MealPlanRequest,
        progress: ProgressFn<'_>,
    ) -> Result<MealGenerationResponse, PlanError>;
}

pub fn progress_event(stage: ProgressStage) -> GenerationProgress {
    let (message, progress) = match stage {
        ProgressStage::Analyzing => ("Analyzing your preferences...", 20),
        ProgressStage::Finding => ("Finding meal suggestions...", 50),
        ProgressStage::Optimizing => ("Optimizing nutrition and budget...", 80),
        ProgressStage::Finalizing => ("Meal plan ready!", 100),
    };
    GenerationProgress {
        stage,
        message: message.to_string(),
        progress,
    }
}

fn list_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}

pub fn build_meal_plan_prompt(request: &MealPlanRequest) -> String {
    let prefs = &request.preferences;
    format!(
        "Generate a meal plan for 1 day with EXACTLY 3 meals: Breakfast, Lunch, and Dinner. Each meal MUST include a dessert. Respond ONLY with valid JSON (no markdown, no code blocks). Use this structure:
{structure}
Household preferences:
- People: {people}
- Dietary goal: {goal}
- Cuisines: {cuisines}
- Dietary restrictions: {restrictions}
- Allergies: {allergies}
- Budget per serving: ${min:.2} to ${max:.2} AUD
- Cooking skill: {skill}
- Time available per day: {minutes} minutes
- Preferred complexity: {complexity}
- Kitchen equipment: {equipment}
All meals must be practical, use Australian ingredients, and be achievable for a home cook. Do not include any extra text.",
        structure = RESPONSE_STRUCTURE,
        people = prefs.number_of_people,
        goal = prefs.dietary_goal,
        cuisines = list_or(&prefs.cuisine_types, "any"),
        restrictions = list_or(&prefs.dietary_restrictions, "none"),
        allergies = list_or(&prefs.allergies, "none"),
        min = prefs.budget_range.min,
        max = prefs.budget_range.max,
        skill = prefs.cooking_skill_level,
        minutes = prefs.time_constraints,
        complexity = prefs.preferred_meal_complexity,
        equipment = list_or(&prefs.kitchen_equipment, "basic"),
    )
}

/// Generates plans through the chat-completion API.
pub struct AiMealPlanner {
    client: ChatClient,
    temperature: f32,
    max_tokens: u32,
    progress_delay: Duration,
}

impl AiMealPlanner {
    pub fn new(client: ChatClient, config: &AppConfig) -> Self {
        Self {
            client,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            progress_delay: config.progress_delay,
        }
    }

    async fn pause(&self) {
        if !self.progress_delay.is_zero() {
            tokio::time::sleep(self.progress_delay).await;
        }
    }
}

#[async_trait]
impl MealPlanGenerator for AiMealPlanner {
    async fn generate(
        &self,
        request: &MealPlanRequest,
        progress: ProgressFn<'_>,
    ) -> Result<MealGenerationResponse, PlanError> {
        if !self.client.is_configured() {
            return Err(ApiConnectionError::MissingApiKey.into());
        }

        progress(progress_event(ProgressStage::Analyzing));
        self.pause().await;
        progress(progress_event(ProgressStage::Finding));

        let chat_request = self.client.request(
            vec![
                ChatMessage::system(MEAL_PLAN_SYSTEM_PROMPT),
                ChatMessage::user(build_meal_plan_prompt(request)),
            ],
            self.temperature,
            self.max_tokens,
        );
        let raw = self.client.complete_text(chat_request).await?;
        log::debug!("Raw meal plan response from {}:\n---\n{}\n---", self.client.model(), raw);

        progress(progress_event(ProgressStage::Optimizing));
        let plan = normalize_response(&raw)?;
        self.pause().await;

        let mut response = plan.into_response();
        response.shopping_list = request
            .generate_shopping_list
            .then(|| derive_shopping_list(&response.meals));
        log::info!(
            "AI plan normalized: {} meal(s){}",
            response.meals.len(),
            if response.is_partial { " (partial)" } else { "" }
        );
        progress(progress_event(ProgressStage::Finalizing));
        Ok(response)
    }
}

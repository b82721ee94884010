//! Free-form chat for adjusting a single meal or a whole plan.
//!
//! Both entry points always produce a reply for the user: canned guidance
//! when no API key is configured, and a short apology when the call fails.

use crate::api_connection::{ChatClient, ChatMessage};
use crate::data_types::Meal;

pub const CHAT_MAX_TOKENS: u32 = 1000;
pub const CHAT_TEMPERATURE: f32 = 0.7;

pub const CHAT_ERROR_REPLY: &str = "Sorry, there was an error with the AI service. Please try again.";
pub const CHAT_EMPTY_REPLY: &str = "Sorry, I could not generate a response.";

const PLAN_SYSTEM_PROMPT: &str = "You are a helpful meal planning assistant. Help users customize their meal plans based on their preferences and requirements. Provide practical, actionable advice.";

const OFFLINE_KEY_NOTE: &str = "*Note: Add your OpenAI API key in settings for AI-powered customization.*";

pub fn meal_system_prompt(meal: &Meal) -> String {
    let ingredients = meal
        .ingredients
        .iter()
        .map(|i| format!("{} ({} {})", i.name, i.quantity, i.unit))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "You are a helpful cooking assistant. The user wants to customize a meal called \"{}\".\n\n\
         Current meal details:\n\
         - Description: {}\n\
         - Ingredients: {}\n\
         - Instructions: {}\n\n\
         Provide helpful suggestions for customization based on the user's request. Be specific and practical.",
        meal.name,
        meal.description,
        ingredients,
        meal.instructions.join("; ")
    )
}

pub fn meal_guidance_without_key(meal: &Meal) -> String {
    format!(
        "I can help you customize \"{}\"! Here are some suggestions:\n\n\
         • **Vegetarian version**: Replace meat with tofu or tempeh\n\
         • **Lower carb**: Use cauliflower rice instead of regular rice\n\
         • **Spicier**: Add chili flakes or hot sauce\n\
         • **Budget-friendly**: Use seasonal vegetables and bulk grains\n\n\
         What specific changes would you like to make?\n\n{}",
        meal.name, OFFLINE_KEY_NOTE
    )
}

pub fn plan_guidance_without_key() -> String {
    format!(
        "I'd be happy to help you customize your meal plan! Based on your preferences, I can:\n\n\
         • Adjust portion sizes for different dietary needs\n\
         • Suggest ingredient substitutions\n\
         • Modify cooking methods\n\
         • Add or remove specific ingredients\n\
         • Optimize for your budget\n\n\
         What would you like to change about your meal plan?\n\n{}",
        OFFLINE_KEY_NOTE
    )
}

async fn chat(client: &ChatClient, system_prompt: String, history: &[ChatMessage]) -> String {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(history.iter().cloned());

    let request = client.request(messages, CHAT_TEMPERATURE, CHAT_MAX_TOKENS);
    match client.call_chat_completion(request).await {
        Ok(response) => response
            .first_content()
            .map(str::to_string)
            .unwrap_or_else(|| CHAT_EMPTY_REPLY.to_string()),
        Err(e) => {
            log::error!("Customisation chat failed: {}", e);
            CHAT_ERROR_REPLY.to_string()
        }
    }
}

pub async fn customize_meal(client: &ChatClient, meal: &Meal, history: &[ChatMessage]) -> String {
    if !client.is_configured() {
        return meal_guidance_without_key(meal);
    }
    chat(client, meal_system_prompt(meal), history).await
}

pub async fn customize_plan(client: &ChatClient, history: &[ChatMessage]) -> String {
    if !client.is_configured() {
        return plan_guidance_without_key();
    }
    chat(client, PLAN_SYSTEM_PROMPT.to_string(), history).await
}

pub mod coerce;
pub mod recovery;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::data_types::{plan_total_cost, Meal, MealGenerationResponse, NutritionalInfo};

pub use coerce::coerce_meal;
pub use recovery::{recover_meals, ObjectScanner, MAX_RECOVERED_MEALS};

pub const PARTIAL_PLAN_NOTICE: &str = "Incomplete meal plan: showing up to 3 available meals only.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("Invalid response format from AI service")]
    InvalidFormat,
}

/// Meals pulled out of one AI response, before plan totals are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPlan {
    pub meals: Vec<Meal>,
    pub plan_summary: String,
    pub health_insights: Vec<String>,
    pub total_cost: Option<f64>,
    pub is_partial: bool,
}

impl NormalizedPlan {
    pub fn into_response(self) -> MealGenerationResponse {
        let total_cost = self.total_cost.unwrap_or_else(|| plan_total_cost(&self.meals));
        let nutritional_summary = NutritionalInfo::sum(self.meals.iter().map(|m| &m.nutritional_info));
        MealGenerationResponse {
            meals: self.meals,
            total_cost,
            nutritional_summary,
            shopping_list: None,
            plan_summary: self.plan_summary,
            health_insights: self.health_insights,
            is_partial: self.is_partial,
        }
    }
}

/// Removes a leading ```` ```lang ```` fence and a trailing ```` ``` ````.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
        text = rest.trim_start();
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest.trim_end();
    }
    text
}

fn plan_from_document(document: &Map<String, Value>, meals: &[Value]) -> NormalizedPlan {
    NormalizedPlan {
        meals: meals
            .iter()
            .enumerate()
            .map(|(index, raw)| coerce_meal(raw, index))
            .collect(),
        plan_summary: document
            .get("planSummary")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        health_insights: document
            .get("healthInsights")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(|i| i.as_str().map(str::to_string)).collect())
            .unwrap_or_default(),
        total_cost: document
            .get("totalCost")
            .and_then(Value::as_f64)
            .filter(|cost| cost.is_finite() && *cost >= 0.0),
        is_partial: false,
    }
}

/// Turns raw model output into typed meals.
///
/// A well-formed document has every element of its `meals` array coerced. If
/// the text does not parse (or has no usable `meals` array), the recovery
/// scanner salvages up to three complete meal objects and the plan is
/// flagged partial. Fails only when nothing at all can be recovered.
pub fn normalize_response(raw: &str) -> Result<NormalizedPlan, NormalizeError> {
    let cleaned = strip_code_fences(raw);

    match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Object(document)) => match document.get("meals") {
            Some(Value::Array(meals)) if !meals.is_empty() => {
                return Ok(plan_from_document(&document, meals));
            }
            _ => log::debug!("AI response parsed but has no usable \"meals\" array"),
        },
        Ok(Value::Array(meals)) if !meals.is_empty() => {
            return Ok(plan_from_document(&Map::new(), &meals));
        }
        Ok(_) => log::debug!("AI response parsed to an unexpected JSON shape"),
        Err(e) => log::warn!("AI response is not valid JSON ({}), attempting recovery", e),
    }

    let meals = recover_meals(cleaned);
    if meals.is_empty() {
        log::error!("Failed to parse AI response: {}", raw);
        return Err(NormalizeError::InvalidFormat);
    }

    log::warn!("Recovered {} meal(s) from a malformed AI response", meals.len());
    Ok(NormalizedPlan {
        meals,
        plan_summary: PARTIAL_PLAN_NOTICE.to_string(),
        health_insights: vec![PARTIAL_PLAN_NOTICE.to_string()],
        total_cost: None,
        is_partial: true,
    })
}

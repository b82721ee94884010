use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use meal_planner::api_connection::{ChatClient, ChatMessage};
use meal_planner::catalogue::MealCatalogue;
use meal_planner::cli::{parse_args, ChatArgs, Command, KeyAction, PlanArgs};
use meal_planner::config::{AppConfig, API_KEY_ENV_VAR};
use meal_planner::credentials::{CredentialStore, FileCredentialStore, InMemoryCredentialStore, API_KEY_NAME};
use meal_planner::customize::{customize_meal, customize_plan};
use meal_planner::data_types::{GenerationProgress, MealGenerationResponse, MealPlanRequest, MealType};
use meal_planner::plan_generator::{AiMealPlanner, MealPlanGenerator, PlanError, ProgressFn};
use meal_planner::plan_session::{NetworkMonitor, NetworkStatus, PlanSession, SessionSnapshot};
use meal_planner::shopping_list::{completion_percentage, group_by_category, total_estimated_cost};

/// Echoes progress events to stderr before forwarding them.
struct ConsoleProgress<G> {
    inner: G,
}

#[async_trait]
impl<G: MealPlanGenerator> MealPlanGenerator for ConsoleProgress<G> {
    async fn generate(
        &self,
        request: &MealPlanRequest,
        progress: ProgressFn<'_>,
    ) -> Result<MealGenerationResponse, PlanError> {
        let echo = |event: GenerationProgress| {
            eprintln!("[{:>3}%] {}", event.progress, event.message);
            progress(event);
        };
        self.inner.generate(request, &echo).await
    }
}

/// An `OPENAI_API_KEY` in the environment takes precedence over the stored key.
fn credential_store(config: &AppConfig) -> Arc<dyn CredentialStore> {
    match std::env::var(API_KEY_ENV_VAR) {
        Ok(key) if !key.trim().is_empty() => Arc::new(InMemoryCredentialStore::with_value(API_KEY_NAME, &key)),
        _ => Arc::new(FileCredentialStore::new(&config.credentials_path)),
    }
}

fn print_plan(snapshot: &SessionSnapshot) {
    if let Some(banner) = &snapshot.banner {
        println!("! {}\n", banner.message);
    }
    let Some(plan) = &snapshot.plan else {
        println!("No meal plan generated.");
        return;
    };

    println!("{}", plan.plan_summary);
    println!("Total cost: ${:.2}\n", plan.total_cost);

    // Only the first meal of each type is shown.
    for meal_type in MealType::ALL {
        if let Some(meal) = plan.meals.iter().find(|m| m.meal_type == meal_type) {
            println!("{}: {} ({} min, ${:.2}/serving)", meal_type, meal.name, meal.total_time, meal.estimated_cost_per_serving);
            println!("    Dessert: {}", meal.dessert.name);
        }
    }
    if plan.meals.len() > MealType::ALL.len() {
        println!("... {} meals in total", plan.meals.len());
    }

    let summary = &plan.nutritional_summary;
    println!(
        "\nNutrition: {:.0} kcal, {:.0} g protein, {:.0} g carbs, {:.0} g fat",
        summary.calories, summary.protein, summary.carbohydrates, summary.fat
    );
    for insight in &plan.health_insights {
        println!("  * {}", insight);
    }

    let wants_list = snapshot
        .last_request
        .as_ref()
        .is_some_and(|request| request.generate_shopping_list);
    if wants_list && !snapshot.shopping_list.is_empty() {
        println!(
            "\nShopping list ({} items, ~${:.2}, {:.0}% checked):",
            snapshot.shopping_list.len(),
            total_estimated_cost(&snapshot.shopping_list),
            completion_percentage(&snapshot.shopping_list)
        );
        for (category, items) in group_by_category(&snapshot.shopping_list) {
            println!("  {}", category);
            for item in items {
                println!("    [ ] {} - {}", item.name, item.quantity);
            }
        }
    }
}

async fn run_plan(args: PlanArgs, config: &AppConfig, credentials: Arc<dyn CredentialStore>) -> Result<()> {
    let request = args.to_request();
    let monitor = NetworkMonitor::new(if args.offline {
        NetworkStatus::Offline
    } else {
        NetworkStatus::Online
    });

    let client = ChatClient::new(config, credentials);
    let planner = ConsoleProgress {
        inner: AiMealPlanner::new(client, config),
    };
    let session = PlanSession::new(planner, MealCatalogue::default(), monitor.subscribe());

    let snapshot = session.submit(request).await.context("Could not generate a meal plan")?;
    if args.json {
        let body = serde_json::to_string_pretty(&snapshot).context("Failed to serialize meal plan")?;
        println!("{}", body);
    } else {
        print_plan(&snapshot);
    }
    Ok(())
}

fn run_key(action: KeyAction, config: &AppConfig) -> Result<()> {
    let store = FileCredentialStore::new(&config.credentials_path);
    match action {
        KeyAction::Set { value } => {
            store
                .set(API_KEY_NAME, &value)
                .with_context(|| format!("Failed to save API key to '{}'", store.path().display()))?;
            println!("API key saved to {}", store.path().display());
        }
        KeyAction::Remove => {
            store
                .remove(API_KEY_NAME)
                .with_context(|| format!("Failed to remove API key from '{}'", store.path().display()))?;
            println!("API key removed");
        }
        KeyAction::Status => {
            let from_env = std::env::var(API_KEY_ENV_VAR).is_ok_and(|k| !k.trim().is_empty());
            if from_env {
                println!("API key configured via {}", API_KEY_ENV_VAR);
            } else if store.contains(API_KEY_NAME) {
                println!("API key configured in {}", store.path().display());
            } else {
                println!("API key not set. AI features will fall back to built-in meals.");
            }
        }
    }
    Ok(())
}

async fn run_chat(args: ChatArgs, config: &AppConfig, credentials: Arc<dyn CredentialStore>) -> Result<()> {
    let message = args.message.join(" ");
    if message.trim().is_empty() {
        bail!("Please provide a message, e.g. `chat --meal 2 make it dairy free`");
    }
    let client = ChatClient::new(config, credentials);
    let history = [ChatMessage::user(message)];

    let reply = match args.meal {
        Some(id) => {
            let catalogue = MealCatalogue::default();
            let meal = catalogue
                .by_id(&id)
                .with_context(|| format!("No meal with id '{}' in the catalogue", id))?;
            customize_meal(&client, meal, &history).await
        }
        None => customize_plan(&client, &history).await,
    };
    println!("{}", reply);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    pretty_env_logger::init();

    let cli = parse_args();
    let config = AppConfig::from_env();
    log::debug!("Using model {} at {}", config.model, config.api_url);

    match cli.command {
        Command::Plan(args) => run_plan(args, &config, credential_store(&config)).await,
        Command::Key { action } => run_key(action, &config),
        Command::Chat(args) => run_chat(args, &config, credential_store(&config)).await,
    }
}

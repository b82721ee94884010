//! Request lifecycle for one user session.
//!
//! ```text
//! Idle -> Requesting -> Populated -> (refresh) Requesting -> ...
//!                  \-> fallback on AI failure or offline
//! ```
//! At most one request is in flight. A second submission while
//! `Requesting` is rejected with [`SessionError::RequestInFlight`].

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;

use crate::catalogue::MealCatalogue;
use crate::data_types::{
    GenerationProgress, Meal, MealGenerationResponse, MealPlanRequest, RequestError, ShoppingListItem,
};
use crate::fallback::generate_fallback_plan;
use crate::plan_generator::{MealPlanGenerator, PlanError};
use crate::shopping_list::{derive_shopping_list, toggle_item};

pub const OFFLINE_BANNER: &str = "You're offline. Using cached meal recommendations.";
pub const RATE_LIMIT_BANNER: &str =
    "AI service temporarily unavailable (rate limit). Using fallback meal plan. Try again later.";
pub const UNEXPECTED_BANNER: &str = "An unexpected error occurred. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkStatus {
    Online,
    Offline,
}

/// Publishes connectivity changes to every session subscribed to it.
#[derive(Debug)]
pub struct NetworkMonitor {
    tx: watch::Sender<NetworkStatus>,
}

impl NetworkMonitor {
    pub fn new(initial: NetworkStatus) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn set(&self, status: NetworkStatus) {
        self.tx.send_replace(status);
    }

    pub fn status(&self) -> NetworkStatus {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<NetworkStatus> {
        self.tx.subscribe()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RequestState {
    Idle,
    Requesting { progress: Option<GenerationProgress> },
    Populated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PlanSource {
    Ai,
    AiPartial,
    Fallback,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BannerKind {
    Offline,
    AiFallback,
    Unexpected,
}

/// Dismissible notice shown above the plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
    /// Offers a retry action that returns to the request form.
    pub retryable: bool,
}

impl Banner {
    fn offline() -> Self {
        Banner {
            kind: BannerKind::Offline,
            message: OFFLINE_BANNER.to_string(),
            retryable: false,
        }
    }

    fn ai_fallback(error: &PlanError) -> Self {
        let message = if error.is_rate_limited() {
            RATE_LIMIT_BANNER.to_string()
        } else {
            format!("AI service error: {}. Using fallback meal plan.", error)
        };
        Banner {
            kind: BannerKind::AiFallback,
            message,
            retryable: false,
        }
    }

    fn unexpected() -> Self {
        Banner {
            kind: BannerKind::Unexpected,
            message: UNEXPECTED_BANNER.to_string(),
            retryable: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a meal plan request is already in progress")]
    RequestInFlight,
    #[error("there is no previous request to refresh")]
    NoPreviousRequest,
    #[error("invalid meal plan request: {0}")]
    InvalidRequest(#[from] RequestError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub state: RequestState,
    pub last_request: Option<MealPlanRequest>,
    pub plan: Option<MealGenerationResponse>,
    pub source: Option<PlanSource>,
    pub shopping_list: Vec<ShoppingListItem>,
    pub previous_meals: Vec<Meal>,
    pub show_comparison: bool,
    pub banner: Option<Banner>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        SessionSnapshot {
            state: RequestState::Idle,
            last_request: None,
            plan: None,
            source: None,
            shopping_list: Vec::new(),
            previous_meals: Vec::new(),
            show_comparison: false,
            banner: None,
        }
    }
}

/// Returns the session to a settled state if a request future is dropped
/// before it completes.
struct InFlightGuard<'a> {
    state: &'a Mutex<SessionSnapshot>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(state.state, RequestState::Requesting { .. }) {
            log::warn!("Meal plan request dropped before completion");
            state.state = if state.plan.is_some() {
                RequestState::Populated
            } else {
                RequestState::Idle
            };
        }
    }
}

pub struct PlanSession<G> {
    generator: G,
    catalogue: MealCatalogue,
    network: watch::Receiver<NetworkStatus>,
    state: Mutex<SessionSnapshot>,
}

impl<G: MealPlanGenerator> PlanSession<G> {
    pub fn new(generator: G, catalogue: MealCatalogue, network: watch::Receiver<NetworkStatus>) -> Self {
        Self {
            generator,
            catalogue,
            network,
            state: Mutex::new(SessionSnapshot::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionSnapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().clone()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.lock().state, RequestState::Requesting { .. })
    }

    pub fn network_status(&self) -> NetworkStatus {
        *self.network.borrow()
    }

    /// Runs one request to completion and returns the populated session.
    ///
    /// AI and format failures never surface here: they are replaced by a
    /// fallback plan and a banner. Only an overlapping submission or an
    /// invalid request returns `Err`.
    pub async fn submit(&self, request: MealPlanRequest) -> Result<SessionSnapshot, SessionError> {
        let _guard = self.begin(&request)?;

        let offline = self.network_status() == NetworkStatus::Offline;
        let (plan, source, banner) = if offline {
            log::info!("Offline: skipping AI request");
            (self.fallback_plan(&request, true), PlanSource::Offline, Some(Banner::offline()))
        } else {
            let on_progress = |progress: GenerationProgress| {
                let mut state = self.lock();
                if let RequestState::Requesting { progress: slot } = &mut state.state {
                    *slot = Some(progress);
                }
            };
            match self.generator.generate(&request, &on_progress).await {
                Ok(plan) => {
                    let source = if plan.is_partial { PlanSource::AiPartial } else { PlanSource::Ai };
                    (plan, source, None)
                }
                Err(e) => {
                    log::warn!("AI generation failed, using fallback plan: {}", e);
                    let banner = Banner::ai_fallback(&e);
                    (self.fallback_plan(&request, false), PlanSource::Fallback, Some(banner))
                }
            }
        };

        Ok(self.populate(&request, plan, source, banner))
    }

    /// Re-submits the last request, keeping the current meals for comparison.
    pub async fn refresh(&self) -> Result<SessionSnapshot, SessionError> {
        let request = {
            let mut state = self.lock();
            if matches!(state.state, RequestState::Requesting { .. }) {
                return Err(SessionError::RequestInFlight);
            }
            let request = state.last_request.clone().ok_or(SessionError::NoPreviousRequest)?;
            let current = state.plan.as_ref().map(|p| p.meals.clone()).unwrap_or_default();
            if !current.is_empty() {
                state.previous_meals = current;
                state.show_comparison = true;
            }
            state.shopping_list.clear();
            request
        };
        self.submit(request).await
    }

    pub fn toggle_shopping_item(&self, id: &str) -> Option<bool> {
        toggle_item(&mut self.lock().shopping_list, id)
    }

    pub fn dismiss_banner(&self) {
        self.lock().banner = None;
    }

    /// Clears the banner and goes back to the request form.
    pub fn retry(&self) {
        let mut state = self.lock();
        state.banner = None;
        if !matches!(state.state, RequestState::Requesting { .. }) {
            state.state = RequestState::Idle;
        }
    }

    fn begin(&self, request: &MealPlanRequest) -> Result<InFlightGuard<'_>, SessionError> {
        let mut state = self.lock();
        if matches!(state.state, RequestState::Requesting { .. }) {
            return Err(SessionError::RequestInFlight);
        }
        if let Err(e) = request.validate() {
            log::error!("Rejected meal plan request: {}", e);
            state.banner = Some(Banner::unexpected());
            return Err(e.into());
        }
        state.last_request = Some(request.clone());
        state.banner = None;
        state.state = RequestState::Requesting { progress: None };
        log::info!(
            "Meal plan requested: {} day(s) x {} meal(s) for {} people",
            request.duration,
            request.meals_per_day,
            request.preferences.number_of_people
        );
        Ok(InFlightGuard { state: &self.state })
    }

    fn fallback_plan(&self, request: &MealPlanRequest, offline: bool) -> MealGenerationResponse {
        let mut rng = rand::thread_rng();
        generate_fallback_plan(request, &self.catalogue, offline, &mut rng)
    }

    /// The session list is always derived. The plan's own list follows the
    /// request flag, whichever generator produced it.
    fn populate(
        &self,
        request: &MealPlanRequest,
        mut plan: MealGenerationResponse,
        source: PlanSource,
        banner: Option<Banner>,
    ) -> SessionSnapshot {
        let items = derive_shopping_list(&plan.meals);
        plan.shopping_list = if request.generate_shopping_list {
            plan.shopping_list.take().or_else(|| Some(items.clone()))
        } else {
            None
        };
        let mut state = self.lock();
        state.shopping_list = items;
        state.plan = Some(plan);
        state.source = Some(source);
        state.banner = banner;
        state.state = RequestState::Populated;
        state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_monitor_broadcasts() {
        let monitor = NetworkMonitor::new(NetworkStatus::Online);
        let rx = monitor.subscribe();
        monitor.set(NetworkStatus::Offline);
        assert_eq!(*rx.borrow(), NetworkStatus::Offline);
        assert_eq!(monitor.status(), NetworkStatus::Offline);
    }

    #[test]
    fn test_banner_texts() {
        use crate::api_connection::ApiConnectionError;
        use reqwest::StatusCode;

        let limited = PlanError::Api(ApiConnectionError::ApiError {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: "Rate limit reached".to_string(),
        });
        assert_eq!(Banner::ai_fallback(&limited).message, RATE_LIMIT_BANNER);

        let empty = PlanError::Api(ApiConnectionError::EmptyResponse);
        assert_eq!(
            Banner::ai_fallback(&empty).message,
            "AI service error: No response from OpenAI. Using fallback meal plan."
        );
        assert!(Banner::unexpected().retryable);
        assert!(!Banner::offline().retryable);
    }
}

//! crates/lifedeal_core/src/controller.rs
//!
//! The dashboard controller: owns the canonical deal and category collections,
//! the filter criteria and the editor state, and routes every mutation through
//! the entity stores.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{Category, Deal, DealPatch, Notification, RecordId};
use crate::ports::{DescriptionGenerationService, Notifier, PortError, RecordBackend};
use crate::store::{CategoryStore, DealStore, StoreError, StoreResult};
use crate::validation::{CategoryForm, DealForm, ValidationErrors};
use crate::views::{self, DealFilter, DealStats, StatusFilter};

const LOAD_FAILED: &str = "Failed to load deals. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("The dashboard has not finished loading")]
    NotReady,
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Description generation is not configured")]
    DescriptionUnavailable,
    #[error("Description generation failed: {0}")]
    Description(PortError),
}

pub type ControllerResult<T> = Result<T, ControllerError>;

/// Which deal, if any, the create/edit modal is working on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditorState {
    #[default]
    Closed,
    Creating,
    Editing(RecordId),
}

/// Everything the dashboard renders once loaded.
#[derive(Debug, Clone, Default)]
pub struct DashboardData {
    pub deals: Vec<Deal>,
    pub categories: Vec<Category>,
    pub filter: DealFilter,
    pub editor: EditorState,
}

#[derive(Debug, Clone)]
pub enum DashboardState {
    Loading,
    Ready(DashboardData),
    /// Terminal until `retry` re-enters `Loading`.
    Error(String),
}

//=========================================================================================
// The Controller
//=========================================================================================

pub struct DashboardController {
    deals: DealStore,
    categories: CategoryStore,
    notifier: Arc<dyn Notifier>,
    describer: Option<Arc<dyn DescriptionGenerationService>>,
    state: DashboardState,
}

impl DashboardController {
    /// Creates a controller in the `Loading` state. Call `load` next.
    pub fn new(backend: Arc<dyn RecordBackend>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            deals: DealStore::new(backend.clone(), notifier.clone()),
            categories: CategoryStore::new(backend, notifier.clone()),
            notifier,
            describer: None,
            state: DashboardState::Loading,
        }
    }

    pub fn with_description_service(
        mut self,
        describer: Arc<dyn DescriptionGenerationService>,
    ) -> Self {
        self.describer = Some(describer);
        self
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn deal_store(&self) -> &DealStore {
        &self.deals
    }

    fn ready(&self) -> ControllerResult<&DashboardData> {
        match &self.state {
            DashboardState::Ready(data) => Ok(data),
            _ => Err(ControllerError::NotReady),
        }
    }

    fn ready_mut(&mut self) -> ControllerResult<&mut DashboardData> {
        match &mut self.state {
            DashboardState::Ready(data) => Ok(data),
            _ => Err(ControllerError::NotReady),
        }
    }

    // --- Loading ---

    /// Fetches deals and categories concurrently and settles into `Ready` or
    /// `Error`. Filter criteria survive a reload.
    pub async fn load(&mut self) -> &DashboardState {
        let filter = self.ready().map(|d| d.filter.clone()).unwrap_or_default();
        self.state = DashboardState::Loading;

        let (deals, categories) =
            futures::join!(self.deals.fetch_all(), self.categories.fetch_all());

        self.state = match (deals, categories) {
            (Ok(deals), Ok(categories)) => {
                info!(
                    "Dashboard loaded with {} deals and {} categories",
                    deals.len(),
                    categories.len()
                );
                DashboardState::Ready(DashboardData {
                    deals,
                    categories,
                    filter,
                    editor: EditorState::Closed,
                })
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!("Dashboard load failed: {}", e);
                DashboardState::Error(LOAD_FAILED.to_string())
            }
        };
        &self.state
    }

    pub async fn retry(&mut self) -> &DashboardState {
        self.load().await
    }

    // --- Filters and derived views ---

    pub fn filter(&self) -> ControllerResult<&DealFilter> {
        Ok(&self.ready()?.filter)
    }

    pub fn set_filter(&mut self, filter: DealFilter) -> ControllerResult<()> {
        self.ready_mut()?.filter = filter;
        Ok(())
    }

    pub fn set_search(&mut self, search: impl Into<String>) -> ControllerResult<()> {
        self.ready_mut()?.filter.search = search.into();
        Ok(())
    }

    pub fn set_category_filter(&mut self, category: impl Into<String>) -> ControllerResult<()> {
        self.ready_mut()?.filter.category = category.into();
        Ok(())
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) -> ControllerResult<()> {
        self.ready_mut()?.filter.status = status;
        Ok(())
    }

    /// All canonical deals, unfiltered.
    pub fn deals(&self) -> ControllerResult<&[Deal]> {
        Ok(&self.ready()?.deals)
    }

    /// Deals passing the current filter, in canonical order.
    pub fn visible_deals(&self) -> ControllerResult<Vec<&Deal>> {
        let data = self.ready()?;
        Ok(views::filter_deals(&data.deals, &data.filter))
    }

    /// Statistics over the unfiltered collection.
    pub fn stats(&self) -> ControllerResult<DealStats> {
        Ok(views::compute_stats(&self.ready()?.deals))
    }

    /// Categories with `deal_count` projected from the canonical deals.
    pub fn categories(&self) -> ControllerResult<Vec<Category>> {
        let data = self.ready()?;
        Ok(views::category_deal_counts(&data.categories, &data.deals))
    }

    // --- Editor ---

    pub fn editor(&self) -> ControllerResult<EditorState> {
        Ok(self.ready()?.editor)
    }

    pub fn open_create(&mut self) -> ControllerResult<()> {
        self.ready_mut()?.editor = EditorState::Creating;
        Ok(())
    }

    /// Opens the editor on a deal and returns the prefilled form.
    pub fn open_edit(&mut self, id: RecordId) -> ControllerResult<DealForm> {
        let data = self.ready_mut()?;
        let deal = data
            .deals
            .iter()
            .find(|d| d.id == id)
            .ok_or(StoreError::NotFound {
                entity: "Deal",
                id,
            })?;
        let form = DealForm::from_deal(deal);
        data.editor = EditorState::Editing(id);
        Ok(form)
    }

    pub fn close_editor(&mut self) -> ControllerResult<()> {
        self.ready_mut()?.editor = EditorState::Closed;
        Ok(())
    }

    /// Submits the editor: updates the deal being edited, or creates one.
    pub async fn save(&mut self, form: &DealForm) -> ControllerResult<Deal> {
        let editor = self.ready()?.editor;
        let saved = match editor {
            EditorState::Editing(id) => self.update_deal(id, form).await?,
            EditorState::Closed | EditorState::Creating => self.create_deal(form).await?,
        };
        self.ready_mut()?.editor = EditorState::Closed;
        Ok(saved)
    }

    // --- Deal mutations ---

    pub async fn create_deal(&mut self, form: &DealForm) -> ControllerResult<Deal> {
        let payload = form
            .validate_against(&self.ready()?.categories)
            .map_err(ControllerError::Validation)?;

        match self.deals.create(&payload).await {
            Ok(deal) => {
                self.ready_mut()?.deals.push(deal.clone());
                self.notifier
                    .notify(Notification::success("Deal added successfully!"));
                Ok(deal)
            }
            Err(e) => Err(self.mutation_failed("Failed to save deal. Please try again.", e)),
        }
    }

    pub async fn update_deal(&mut self, id: RecordId, form: &DealForm) -> ControllerResult<Deal> {
        let payload = form
            .validate_against(&self.ready()?.categories)
            .map_err(ControllerError::Validation)?;

        match self.deals.update(id, &DealPatch::from(payload)).await {
            Ok(deal) => {
                self.replace(deal.clone())?;
                self.notifier
                    .notify(Notification::success("Deal updated successfully!"));
                Ok(deal)
            }
            Err(e) => Err(self.mutation_failed("Failed to save deal. Please try again.", e)),
        }
    }

    pub async fn delete_deal(&mut self, id: RecordId) -> ControllerResult<()> {
        self.ready()?;

        match self.deals.delete(id).await {
            Ok(_) => {
                let data = self.ready_mut()?;
                data.deals.retain(|d| d.id != id);
                if data.editor == EditorState::Editing(id) {
                    data.editor = EditorState::Closed;
                }
                self.notifier
                    .notify(Notification::success("Deal deleted successfully!"));
                Ok(())
            }
            Err(e) => Err(self.mutation_failed("Failed to delete deal. Please try again.", e)),
        }
    }

    /// Flips a deal's usage flag against its persisted state.
    ///
    /// The current flag is read from the store, not from canonical state, so two
    /// rapid toggles always alternate. `last_accessed` is stamped only when the
    /// deal becomes used and never moves backwards.
    pub async fn toggle_usage(&mut self, id: RecordId) -> ControllerResult<Deal> {
        self.ready()?;

        let result: StoreResult<Deal> = async {
            let current = self.deals.get_by_id(id).await?;
            let now_used = !current.is_used;
            let patch = DealPatch {
                is_used: Some(now_used),
                last_accessed: now_used.then(|| {
                    let now = Utc::now();
                    current.last_accessed.map_or(now, |previous| previous.max(now))
                }),
                ..DealPatch::default()
            };
            self.deals.update(id, &patch).await
        }
        .await;

        match result {
            Ok(deal) => {
                self.replace(deal.clone())?;
                let status = if deal.is_used { "used" } else { "unused" };
                self.notifier
                    .notify(Notification::success(format!("Deal marked as {status}!")));
                Ok(deal)
            }
            Err(e) => Err(self.mutation_failed(
                "Failed to update deal status. Please try again.",
                e,
            )),
        }
    }

    fn replace(&mut self, deal: Deal) -> ControllerResult<()> {
        let data = self.ready_mut()?;
        match data.deals.iter_mut().find(|d| d.id == deal.id) {
            Some(slot) => *slot = deal,
            // Canonical state was stale; the store is authoritative.
            None => data.deals.push(deal),
        }
        Ok(())
    }

    /// Raises the user-facing toast unless the store already reported `err`.
    fn mutation_failed(&self, message: &str, err: StoreError) -> ControllerError {
        warn!("{}: {}", message, err);
        if !err.is_reported() {
            self.notifier.notify(Notification::error(message));
        }
        ControllerError::Store(err)
    }

    // --- Category mutations ---

    pub async fn add_category(&mut self, form: &CategoryForm) -> ControllerResult<Category> {
        let payload = form
            .validate(&self.ready()?.categories)
            .map_err(ControllerError::Validation)?;

        match self.categories.create(&payload).await {
            Ok(mut category) => {
                let data = self.ready_mut()?;
                category.deal_count = data
                    .deals
                    .iter()
                    .filter(|d| d.category == category.name)
                    .count();
                data.categories.push(category.clone());
                self.notifier
                    .notify(Notification::success("Category added successfully!"));
                Ok(category)
            }
            Err(e) => Err(self.mutation_failed("Failed to save category. Please try again.", e)),
        }
    }

    /// Removes a category. Deals filed under it keep their category name.
    pub async fn delete_category(&mut self, id: RecordId) -> ControllerResult<()> {
        self.ready()?;

        match self.categories.delete(id).await {
            Ok(_) => {
                self.ready_mut()?.categories.retain(|c| c.id != id);
                self.notifier
                    .notify(Notification::success("Category deleted successfully!"));
                Ok(())
            }
            Err(e) => Err(self.mutation_failed(
                "Failed to delete category. Please try again.",
                e,
            )),
        }
    }

    // --- Description generation ---

    /// A handle for description generation that does not borrow the controller.
    pub fn description_generator(&self) -> DescriptionGenerator {
        DescriptionGenerator {
            describer: self.describer.clone(),
            notifier: Arc::clone(&self.notifier),
        }
    }

    /// Asks the description service for a blurb. Independent of dashboard state.
    pub async fn generate_description(&self, deal_name: &str) -> ControllerResult<String> {
        self.description_generator().generate(deal_name).await
    }
}

//=========================================================================================
// Description Generation
//=========================================================================================

/// Generates deal descriptions outside the controller, so a slow model call
/// holds no lock on dashboard state.
#[derive(Clone)]
pub struct DescriptionGenerator {
    describer: Option<Arc<dyn DescriptionGenerationService>>,
    notifier: Arc<dyn Notifier>,
}

impl DescriptionGenerator {
    pub async fn generate(&self, deal_name: &str) -> ControllerResult<String> {
        let describer = self
            .describer
            .as_ref()
            .ok_or(ControllerError::DescriptionUnavailable)?;

        let name = deal_name.trim();
        if name.is_empty() {
            return Err(ControllerError::Validation(ValidationErrors::required_field(
                "name",
                "Enter a deal name first",
            )));
        }

        describer.generate_description(name).await.map_err(|e| {
            warn!("Description generation failed for '{}': {}", name, e);
            self.notifier
                .notify(Notification::error("Failed to generate description"));
            ControllerError::Description(e)
        })
    }
}

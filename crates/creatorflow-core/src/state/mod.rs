//! Application state: the single mutable source of truth for tasks,
//! products, channels, categories, and settings.
//!
//! Every mutation goes through an [`AppState`] method and is mirrored to the
//! [`KeyValueStore`] right away. Persistence is fire-and-forget: a failed
//! write is logged and the in-memory state stays authoritative.

mod channels;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, warn};

use creatorflow_store::KeyValueStore;
use creatorflow_store::collections;
use creatorflow_store::models::{
    CategoryMap, ChannelMap, ChannelName, ChannelNameError, Product, Settings, Task, Theme,
    default_categories, default_channels, new_id,
};

use crate::clock::{Clock, DEFAULT_UTC_OFFSET_HOURS, local_today};

/// Caller errors raised by state mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("task {0:?} not found")]
    TaskNotFound(String),

    #[error("product {0:?} not found")]
    ProductNotFound(String),

    #[error("product {0:?} already exists")]
    DuplicateProduct(String),

    #[error("channel {0:?} does not exist")]
    UnknownChannel(String),

    #[error("channel {0:?} already exists")]
    ChannelExists(String),

    #[error(transparent)]
    InvalidChannelName(#[from] ChannelNameError),

    #[error("new channel name is identical to the old one")]
    SameName,

    #[error("cannot delete the last remaining channel")]
    LastChannel,

    #[error("channel {channel:?} is still used by {tasks} task(s) and {products} product(s)")]
    ChannelInUse {
        channel: String,
        tasks: usize,
        products: usize,
    },

    #[error("sub-category name must not be empty")]
    BlankSubCategory,

    #[error("sub-category {name:?} already exists under {channel:?}")]
    SubCategoryExists { channel: String, name: String },

    #[error("sub-category {name:?} not found under {channel:?}")]
    SubCategoryNotFound { channel: String, name: String },
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// Screen the user is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Dashboard,
    Calendar,
    Reports,
    Settings,
    Notes,
    Inventory,
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Dashboard => "dashboard",
            Self::Calendar => "calendar",
            Self::Reports => "reports",
            Self::Settings => "settings",
            Self::Notes => "notes",
            Self::Inventory => "inventory",
        };
        f.write_str(s)
    }
}

impl FromStr for ViewMode {
    type Err = ViewModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dashboard" => Ok(Self::Dashboard),
            "calendar" => Ok(Self::Calendar),
            "reports" => Ok(Self::Reports),
            "settings" => Ok(Self::Settings),
            "notes" => Ok(Self::Notes),
            "inventory" => Ok(Self::Inventory),
            other => Err(ViewModeParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`ViewMode`] string.
#[derive(Debug, Clone)]
pub struct ViewModeParseError(pub String);

impl fmt::Display for ViewModeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid view mode: {:?}", self.0)
    }
}

impl std::error::Error for ViewModeParseError {}

/// Active screen and the day the calendar is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    pub mode: ViewMode,
    pub calendar_date: NaiveDate,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// In-memory collections plus their persisted mirror.
pub struct AppState {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    tasks: Vec<Task>,
    products: Vec<Product>,
    channels: ChannelMap,
    categories: CategoryMap,
    settings: Settings,
    theme: Theme,
    pub view: ViewState,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("tasks", &self.tasks.len())
            .field("products", &self.products.len())
            .field("channels", &self.channels.len())
            .field("view", &self.view)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Load every collection from `store`.
    ///
    /// Missing channels or categories are seeded with the defaults (and the
    /// seed is persisted). A document that exists but does not decode is an
    /// error. The calendar starts on today at the default UTC offset.
    pub fn load(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Result<Self> {
        Self::load_at(store, clock, DEFAULT_UTC_OFFSET_HOURS)
    }

    /// Like [`AppState::load`], with the calendar starting on today at
    /// `utc_offset_hours`.
    pub fn load_at(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        utc_offset_hours: i32,
    ) -> Result<Self> {
        let tasks = collections::load_tasks(store.as_ref()).context("failed to load tasks")?;
        let products =
            collections::load_products(store.as_ref()).context("failed to load products")?;

        let (channels, seeded_channels) =
            match collections::load_channels(store.as_ref()).context("failed to load channels")? {
                Some(channels) => (channels, false),
                None => (default_channels(), true),
            };
        let (categories, seeded_categories) = match collections::load_categories(store.as_ref())
            .context("failed to load categories")?
        {
            Some(categories) => (categories, false),
            None => (default_categories(), true),
        };

        let settings = collections::load_settings(store.as_ref())?;
        let theme = collections::load_theme(store.as_ref())?.unwrap_or_default();
        let calendar_date = local_today(clock.now(), utc_offset_hours);

        let state = Self {
            store,
            clock,
            tasks,
            products,
            channels,
            categories,
            settings,
            theme,
            view: ViewState {
                mode: ViewMode::default(),
                calendar_date,
            },
        };

        if seeded_channels {
            info!("no channels stored, seeding defaults");
            state.persist_channels();
        }
        if seeded_categories {
            state.persist_categories();
        }

        debug!(
            tasks = state.tasks.len(),
            products = state.products.len(),
            channels = state.channels.len(),
            "state loaded"
        );
        Ok(state)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn channels(&self) -> &ChannelMap {
        &self.channels
    }

    pub fn categories(&self) -> &CategoryMap {
        &self.categories
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Whether `name` is in the live channel set.
    pub fn has_channel(&self, name: &ChannelName) -> bool {
        self.channels.contains_key(name)
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    /// Insert or replace a task by id and return the stored record.
    ///
    /// An empty id is replaced with a fresh one. The task's channel must be
    /// live. A referenced product gets `last_scheduled_at` set to now.
    pub fn save_task(&mut self, mut task: Task) -> Result<Task, StateError> {
        self.ensure_channel(&task.channel)?;
        if task.id.trim().is_empty() {
            task.id = new_id();
        }

        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task.clone(),
            None => self.tasks.push(task.clone()),
        }
        debug!(task_id = %task.id, date = %task.date, "task saved");

        if self.stamp_products(task.product_id.iter()) {
            self.persist_products();
        }
        self.persist_tasks();
        Ok(task)
    }

    /// Append a batch of new tasks through the task-save path.
    ///
    /// All-or-nothing: if any task names a channel that is not live, nothing
    /// is added. Every task gets a fresh id when its own is empty.
    pub fn append_tasks(&mut self, batch: Vec<Task>) -> Result<Vec<Task>, StateError> {
        if let Some(bad) = batch.iter().find(|t| !self.has_channel(&t.channel)) {
            return Err(StateError::UnknownChannel(bad.channel.to_string()));
        }

        let mut added = Vec::with_capacity(batch.len());
        for mut task in batch {
            if task.id.trim().is_empty() {
                task.id = new_id();
            }
            added.push(task);
        }
        self.tasks.extend(added.iter().cloned());

        if self.stamp_products(added.iter().filter_map(|t| t.product_id.as_ref())) {
            self.persist_products();
        }
        self.persist_tasks();
        info!(count = added.len(), "tasks appended");
        Ok(added)
    }

    /// Remove a task by id.
    pub fn delete_task(&mut self, id: &str) -> Result<Task, StateError> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| StateError::TaskNotFound(id.to_owned()))?;
        let removed = self.tasks.remove(idx);
        self.persist_tasks();
        debug!(task_id = %id, "task deleted");
        Ok(removed)
    }

    /// Flip a task's completion flag and return the new value. No other field
    /// changes and no product is stamped.
    pub fn toggle_completion(&mut self, id: &str) -> Result<bool, StateError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StateError::TaskNotFound(id.to_owned()))?;
        task.is_completed = !task.is_completed;
        let completed = task.is_completed;
        self.persist_tasks();
        Ok(completed)
    }

    /// Set `last_scheduled_at = now` on every referenced product. Returns
    /// whether any product changed.
    fn stamp_products<'a>(&mut self, ids: impl Iterator<Item = &'a String>) -> bool {
        let now = self.clock.now();
        let mut stamped = false;
        for id in ids {
            match self.products.iter_mut().find(|p| &p.id == id) {
                Some(product) => {
                    product.last_scheduled_at = Some(now);
                    stamped = true;
                }
                None => debug!(product_id = %id, "task references unknown product"),
            }
        }
        stamped
    }

    // -----------------------------------------------------------------------
    // Products
    // -----------------------------------------------------------------------

    /// Add a product. An empty id is replaced with a fresh one.
    pub fn add_product(&mut self, mut product: Product) -> Result<Product, StateError> {
        self.ensure_channel(&product.channel)?;
        if product.id.trim().is_empty() {
            product.id = new_id();
        }
        if self.product(&product.id).is_some() {
            return Err(StateError::DuplicateProduct(product.id));
        }
        self.products.push(product.clone());
        self.persist_products();
        Ok(product)
    }

    /// Replace an existing product by id.
    pub fn update_product(&mut self, product: Product) -> Result<(), StateError> {
        self.ensure_channel(&product.channel)?;
        let existing = self
            .products
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or_else(|| StateError::ProductNotFound(product.id.clone()))?;
        *existing = product;
        self.persist_products();
        Ok(())
    }

    /// Remove a product by id. Tasks that referenced it keep their
    /// `product_id`.
    pub fn delete_product(&mut self, id: &str) -> Result<Product, StateError> {
        let idx = self
            .products
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| StateError::ProductNotFound(id.to_owned()))?;
        let removed = self.products.remove(idx);
        self.persist_products();
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Settings and view
    // -----------------------------------------------------------------------

    /// Store the integration token and database id. Never transmitted.
    pub fn save_settings(&mut self, notion_key: &str, notion_db: &str) {
        self.settings = Settings {
            notion_key: notion_key.to_owned(),
            notion_db: notion_db.to_owned(),
        };
        if let Err(e) = collections::save_settings(self.store.as_ref(), &self.settings) {
            warn!(error = %format!("{e:#}"), "failed to persist settings");
        }
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        if let Err(e) = collections::save_theme(self.store.as_ref(), theme) {
            warn!(error = %format!("{e:#}"), "failed to persist theme");
        }
    }

    /// Switch to the calendar showing `date`.
    pub fn show_calendar(&mut self, date: NaiveDate) {
        self.view = ViewState {
            mode: ViewMode::Calendar,
            calendar_date: date,
        };
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    fn ensure_channel(&self, name: &ChannelName) -> Result<(), StateError> {
        if self.has_channel(name) {
            Ok(())
        } else {
            Err(StateError::UnknownChannel(name.to_string()))
        }
    }

    fn persist_tasks(&self) {
        if let Err(e) = collections::save_tasks(self.store.as_ref(), &self.tasks) {
            warn!(error = %format!("{e:#}"), "failed to persist tasks");
        }
    }

    fn persist_products(&self) {
        if let Err(e) = collections::save_products(self.store.as_ref(), &self.products) {
            warn!(error = %format!("{e:#}"), "failed to persist products");
        }
    }

    fn persist_channels(&self) {
        if let Err(e) = collections::save_channels(self.store.as_ref(), &self.channels) {
            warn!(error = %format!("{e:#}"), "failed to persist channels");
        }
    }

    fn persist_categories(&self) {
        if let Err(e) = collections::save_categories(self.store.as_ref(), &self.categories) {
            warn!(error = %format!("{e:#}"), "failed to persist categories");
        }
    }
}

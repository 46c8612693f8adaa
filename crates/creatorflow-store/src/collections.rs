//! Typed load/save helpers for the persisted collections.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::models::{CategoryMap, ChannelMap, Product, Settings, Task, Theme};
use crate::store::KeyValueStore;

/// Store keys, one per collection or settings string.
pub mod keys {
    pub const TASKS: &str = "creatorflow_tasks";
    pub const PRODUCTS: &str = "creatorflow_products";
    pub const CHANNELS: &str = "creatorflow_channels";
    pub const CATEGORIES: &str = "creatorflow_categories";
    pub const NOTION_KEY: &str = "notion_key";
    pub const NOTION_DB: &str = "notion_db";
    pub const THEME: &str = "theme";
}

/// Load and decode the document under `key`. `None` when absent.
pub fn load_collection<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>> {
    let Some(value) = store.load(key)? else {
        return Ok(None);
    };
    let decoded = serde_json::from_value(value)
        .with_context(|| format!("stored document {key:?} has an unexpected shape"))?;
    Ok(Some(decoded))
}

/// Encode and save `value` under `key`.
pub fn save_collection<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let encoded =
        serde_json::to_value(value).with_context(|| format!("failed to encode {key:?}"))?;
    store
        .save(key, &encoded)
        .with_context(|| format!("failed to save {key:?}"))
}

pub fn load_tasks(store: &dyn KeyValueStore) -> Result<Vec<Task>> {
    Ok(load_collection(store, keys::TASKS)?.unwrap_or_default())
}

pub fn save_tasks(store: &dyn KeyValueStore, tasks: &[Task]) -> Result<()> {
    save_collection(store, keys::TASKS, tasks)
}

pub fn load_products(store: &dyn KeyValueStore) -> Result<Vec<Product>> {
    Ok(load_collection(store, keys::PRODUCTS)?.unwrap_or_default())
}

pub fn save_products(store: &dyn KeyValueStore, products: &[Product]) -> Result<()> {
    save_collection(store, keys::PRODUCTS, products)
}

/// Channels, or `None` when nothing has been persisted yet.
pub fn load_channels(store: &dyn KeyValueStore) -> Result<Option<ChannelMap>> {
    load_collection(store, keys::CHANNELS)
}

pub fn save_channels(store: &dyn KeyValueStore, channels: &ChannelMap) -> Result<()> {
    save_collection(store, keys::CHANNELS, channels)
}

/// Categories, or `None` when nothing has been persisted yet.
pub fn load_categories(store: &dyn KeyValueStore) -> Result<Option<CategoryMap>> {
    load_collection(store, keys::CATEGORIES)
}

pub fn save_categories(store: &dyn KeyValueStore, categories: &CategoryMap) -> Result<()> {
    save_collection(store, keys::CATEGORIES, categories)
}

fn load_string(store: &dyn KeyValueStore, key: &str) -> Result<Option<String>> {
    match store.load(key)? {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => anyhow::bail!("stored document {key:?} is not a string: {other}"),
    }
}

/// Both settings strings, empty when unset.
pub fn load_settings(store: &dyn KeyValueStore) -> Result<Settings> {
    Ok(Settings {
        notion_key: load_string(store, keys::NOTION_KEY)?.unwrap_or_default(),
        notion_db: load_string(store, keys::NOTION_DB)?.unwrap_or_default(),
    })
}

pub fn save_settings(store: &dyn KeyValueStore, settings: &Settings) -> Result<()> {
    store
        .save(keys::NOTION_KEY, &Value::String(settings.notion_key.clone()))
        .context("failed to save notion key")?;
    store
        .save(keys::NOTION_DB, &Value::String(settings.notion_db.clone()))
        .context("failed to save notion database id")?;
    Ok(())
}

/// Theme flag, or `None` when the user never chose one.
pub fn load_theme(store: &dyn KeyValueStore) -> Result<Option<Theme>> {
    match load_string(store, keys::THEME)? {
        None => Ok(None),
        Some(raw) => Ok(Some(
            raw.parse()
                .with_context(|| format!("stored theme {raw:?} is invalid"))?,
        )),
    }
}

pub fn save_theme(store: &dyn KeyValueStore, theme: Theme) -> Result<()> {
    store
        .save(keys::THEME, &Value::String(theme.to_string()))
        .context("failed to save theme")
}

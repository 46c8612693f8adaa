//! Channel and sub-category mutations.
//!
//! A channel name is the identity every task, product, and category entry
//! refers to, so renaming one rewrites all of them in a single step.

use tracing::info;

use creatorflow_store::models::{Channel, ChannelName, DEFAULT_CHANNEL_TARGET};

use super::{AppState, StateError};

impl AppState {
    /// Create a channel with the next style in the rotation, the default
    /// target, and an empty sub-category list.
    pub fn add_channel(&mut self, raw: &str) -> Result<ChannelName, StateError> {
        let name = ChannelName::parse(raw)?;
        if self.has_channel(&name) {
            return Err(StateError::ChannelExists(name.to_string()));
        }
        let style_index = self.channels.len();
        self.channels.insert(
            name.clone(),
            Channel::styled(name.clone(), style_index, DEFAULT_CHANNEL_TARGET),
        );
        self.categories.insert(name.clone(), Vec::new());

        self.persist_channels();
        self.persist_categories();
        info!(channel = %name, "channel added");
        Ok(name)
    }

    /// Rename a channel and rewrite every reference to it.
    ///
    /// The channel keeps its style and target. Products and tasks on the old
    /// name move to the new one, as does the sub-category list.
    pub fn rename_channel(&mut self, old: &str, new: &str) -> Result<ChannelName, StateError> {
        let new = ChannelName::parse(new)?;
        let old = ChannelName::parse(old)?;
        if old == new {
            return Err(StateError::SameName);
        }
        if self.has_channel(&new) {
            return Err(StateError::ChannelExists(new.to_string()));
        }
        let mut channel = self
            .channels
            .remove(&old)
            .ok_or_else(|| StateError::UnknownChannel(old.to_string()))?;

        channel.name = new.clone();
        self.channels.insert(new.clone(), channel);

        let subs = self.categories.remove(&old).unwrap_or_default();
        self.categories.insert(new.clone(), subs);

        let mut products = 0usize;
        for product in self.products.iter_mut().filter(|p| p.channel == old) {
            product.channel = new.clone();
            products += 1;
        }
        let mut tasks = 0usize;
        for task in self.tasks.iter_mut().filter(|t| t.channel == old) {
            task.channel = new.clone();
            tasks += 1;
        }

        self.persist_channels();
        self.persist_categories();
        self.persist_products();
        self.persist_tasks();
        info!(from = %old, to = %new, products, tasks, "channel renamed");
        Ok(new)
    }

    /// Delete a channel and its sub-category list.
    ///
    /// Refused for the last channel, and for any channel a task or product
    /// still names. Move or delete those first (or rename the channel).
    pub fn delete_channel(&mut self, raw: &str) -> Result<Channel, StateError> {
        let name = ChannelName::parse(raw)?;
        if !self.has_channel(&name) {
            return Err(StateError::UnknownChannel(name.to_string()));
        }
        if self.channels.len() <= 1 {
            return Err(StateError::LastChannel);
        }
        let tasks = self.tasks.iter().filter(|t| t.channel == name).count();
        let products = self.products.iter().filter(|p| p.channel == name).count();
        if tasks > 0 || products > 0 {
            return Err(StateError::ChannelInUse {
                channel: name.to_string(),
                tasks,
                products,
            });
        }
        let removed = self
            .channels
            .remove(&name)
            .ok_or_else(|| StateError::UnknownChannel(name.to_string()))?;
        self.categories.remove(&name);

        self.persist_channels();
        self.persist_categories();
        info!(channel = %name, "channel deleted");
        Ok(removed)
    }

    pub fn set_channel_target(&mut self, raw: &str, target: u32) -> Result<(), StateError> {
        let name = ChannelName::parse(raw)?;
        let channel = self
            .channels
            .get_mut(&name)
            .ok_or_else(|| StateError::UnknownChannel(name.to_string()))?;
        channel.target = target;
        self.persist_channels();
        Ok(())
    }

    /// Append a sub-category to a channel's list.
    pub fn add_sub_category(&mut self, channel: &str, sub: &str) -> Result<(), StateError> {
        let channel = ChannelName::parse(channel)?;
        self.ensure_channel(&channel)?;
        let sub = sub.trim();
        if sub.is_empty() {
            return Err(StateError::BlankSubCategory);
        }

        let subs = self.categories.entry(channel.clone()).or_default();
        if subs.iter().any(|s| s == sub) {
            return Err(StateError::SubCategoryExists {
                channel: channel.to_string(),
                name: sub.to_owned(),
            });
        }
        subs.push(sub.to_owned());
        self.persist_categories();
        Ok(())
    }

    /// Rename a sub-category in place, keeping its position, and move
    /// products filed under it.
    pub fn rename_sub_category(
        &mut self,
        channel: &str,
        old: &str,
        new: &str,
    ) -> Result<(), StateError> {
        let channel = ChannelName::parse(channel)?;
        self.ensure_channel(&channel)?;
        let new = new.trim();
        if new.is_empty() {
            return Err(StateError::BlankSubCategory);
        }
        if old == new {
            return Err(StateError::SameName);
        }

        let subs = self.categories.entry(channel.clone()).or_default();
        if subs.iter().any(|s| s == new) {
            return Err(StateError::SubCategoryExists {
                channel: channel.to_string(),
                name: new.to_owned(),
            });
        }
        let slot = subs
            .iter_mut()
            .find(|s| s.as_str() == old)
            .ok_or_else(|| StateError::SubCategoryNotFound {
                channel: channel.to_string(),
                name: old.to_owned(),
            })?;
        *slot = new.to_owned();

        let mut moved = false;
        for product in self
            .products
            .iter_mut()
            .filter(|p| p.channel == channel && p.sub_category.as_deref() == Some(old))
        {
            product.sub_category = Some(new.to_owned());
            moved = true;
        }

        self.persist_categories();
        if moved {
            self.persist_products();
        }
        Ok(())
    }
}

//! Per-field override resolution.

use crate::key::ConfigKey;
use crate::properties::{ConfigurationFragment, ConfigurationMap, Overlay};

/// The fragments that apply to one client, most specific first.
///
/// Resolution is per field: a specific fragment that sets only `region`
/// still inherits `client` tuning from `default`.
#[derive(Debug, Clone)]
pub struct OverrideChain<'a> {
    levels: Vec<(String, &'a ConfigurationFragment)>,
}

impl<'a> OverrideChain<'a> {
    pub fn new(map: &'a ConfigurationMap, key: &ConfigKey, default_async: bool) -> Self {
        let levels = key
            .lookup_chain(default_async)
            .into_iter()
            .filter_map(|name| map.get(&name).map(|fragment| (name, fragment)))
            .collect();
        Self { levels }
    }

    /// Keys that contributed a fragment, most specific first.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.levels.iter().map(|(name, _)| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// First value the accessor finds, walking from the most specific level.
    pub fn resolve<T>(&self, accessor: impl Fn(&'a ConfigurationFragment) -> Option<T>) -> Option<T> {
        self.levels.iter().find_map(|(_, fragment)| accessor(*fragment))
    }

    /// Like [`resolve`](Self::resolve) but also returns the key it came from.
    pub fn resolve_with_key<T>(
        &self,
        accessor: impl Fn(&'a ConfigurationFragment) -> Option<T>,
    ) -> Option<(&str, T)> {
        self.levels
            .iter()
            .find_map(|(name, fragment)| accessor(*fragment).map(|value| (name.as_str(), value)))
    }

    /// Merge a nested block across all levels, field by field.
    pub fn resolve_merged<T>(&self, accessor: impl Fn(&'a ConfigurationFragment) -> Option<&'a T>) -> Option<T>
    where
        T: Overlay + Clone + 'a,
    {
        let mut blocks = self.levels.iter().filter_map(|(_, fragment)| accessor(*fragment));
        let mut merged = blocks.next()?.clone();
        for fallback in blocks {
            merged.overlay(fallback);
        }
        Some(merged)
    }
}

//! FILENAME: app/report-session/src/lookup.rs
//! Dimension option lookup and the one-shot per-field option cache.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use report_engine::SelectOption;

/// Supplies the selectable values for a dimension filter.
#[async_trait]
pub trait DimensionLookup: Send + Sync {
    async fn load_options(&self, field: &str) -> Vec<SelectOption>;
}

/// Fixed option lists served after a simulated latency.
#[derive(Debug, Clone, Default)]
pub struct StaticLookup {
    options: HashMap<String, Vec<SelectOption>>,
    latency: Duration,
}

impl StaticLookup {
    pub fn new(latency: Duration) -> Self {
        StaticLookup {
            options: HashMap::new(),
            latency,
        }
    }

    pub fn with_values(mut self, field: &str, values: &[&str]) -> Self {
        self.options.insert(
            field.to_string(),
            values.iter().map(|v| SelectOption::new(v)).collect(),
        );
        self
    }
}

#[async_trait]
impl DimensionLookup for StaticLookup {
    async fn load_options(&self, field: &str) -> Vec<SelectOption> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.options.get(field).cloned().unwrap_or_default()
    }
}

/// Load state of one field's option list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OptionLoad {
    #[default]
    NotRequested,
    Pending,
    Loaded(Vec<SelectOption>),
}

#[derive(Debug, Clone, Default)]
pub struct OptionCache {
    states: HashMap<String, OptionLoad>,
}

impl OptionCache {
    pub fn new() -> Self {
        OptionCache::default()
    }

    pub fn state(&self, field: &str) -> &OptionLoad {
        static NOT_REQUESTED: OptionLoad = OptionLoad::NotRequested;
        self.states.get(field).unwrap_or(&NOT_REQUESTED)
    }

    /// Marks the field pending. False when a load is already pending or done.
    pub fn begin(&mut self, field: &str) -> bool {
        if !matches!(self.state(field), OptionLoad::NotRequested) {
            return false;
        }
        self.states.insert(field.to_string(), OptionLoad::Pending);
        true
    }

    pub fn finish(&mut self, field: &str, options: Vec<SelectOption>) {
        self.states.insert(field.to_string(), OptionLoad::Loaded(options));
    }

    pub fn invalidate(&mut self, field: &str) {
        self.states.remove(field);
    }

    pub fn options(&self, field: &str) -> Option<&[SelectOption]> {
        match self.state(field) {
            OptionLoad::Loaded(options) => Some(options),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_is_one_shot() {
        let mut cache = OptionCache::new();
        assert!(cache.begin("category"));
        assert!(!cache.begin("category"));
        cache.finish("category", vec![SelectOption::new("Home")]);
        assert!(!cache.begin("category"));
        assert_eq!(cache.options("category").map(|o| o.len()), Some(1));

        cache.invalidate("category");
        assert_eq!(cache.state("category"), &OptionLoad::NotRequested);
        assert!(cache.begin("category"));
    }

    #[tokio::test]
    async fn test_static_lookup_unknown_field_is_empty() {
        let lookup = StaticLookup::new(Duration::ZERO).with_values("category", &["Home"]);
        assert_eq!(lookup.load_options("category").await, vec![SelectOption::new("Home")]);
        assert!(lookup.load_options("state").await.is_empty());
    }
}

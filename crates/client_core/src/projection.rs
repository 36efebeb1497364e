use shared::domain::CatalogEntry;

/// Read-only view over loaded entries: case-insensitive title filter plus an
/// optional A–Z sort. Never touches the list it is applied to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListProjection {
    pub filter_text: String,
    pub sorted: bool,
}

impl ListProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter_text: impl Into<String>) -> Self {
        self.filter_text = filter_text.into();
        self
    }

    pub fn with_sort(mut self, sorted: bool) -> Self {
        self.sorted = sorted;
        self
    }

    pub fn toggle_sort(&mut self) {
        self.sorted = !self.sorted;
    }

    pub fn matches(&self, entry: &CatalogEntry) -> bool {
        self.filter_text.is_empty()
            || entry
                .title
                .to_lowercase()
                .contains(&self.filter_text.to_lowercase())
    }

    pub fn apply(&self, entries: &[CatalogEntry]) -> Vec<CatalogEntry> {
        let mut visible: Vec<CatalogEntry> = entries
            .iter()
            .filter(|entry| self.matches(entry))
            .cloned()
            .collect();

        if self.sorted {
            // Stable: equal titles keep arrival order.
            visible.sort_by_cached_key(|entry| entry.title.to_lowercase());
        }
        visible
    }
}

#[cfg(test)]
#[path = "tests/projection_tests.rs"]
mod tests;

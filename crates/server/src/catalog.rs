use std::{fs, path::Path};

use anyhow::Context;
use chrono::NaiveDate;
use shared::{
    domain::CatalogEntry,
    error::ApiException,
    protocol::{PageCursor, PageResponse, FIRST_PAGE},
};

const SEED_TITLES: &[&str] = &[
    "Alphaville",
    "Brazil",
    "Chinatown",
    "Days of Heaven",
    "Eraserhead",
    "Fitzcarraldo",
    "Gattaca",
    "Harakiri",
    "Ikiru",
    "Jaws",
    "Koyaanisqatsi",
    "La Jetée",
    "Metropolis",
    "Nashville",
    "Oldboy",
    "Playtime",
    "Ran",
    "Stalker",
    "The Third Man",
    "Ugetsu",
    "Vertigo",
    "Wings of Desire",
    "Yojimbo",
    "Zodiac",
];

/// Static, in-memory catalog served one page at a time.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    page_size: usize,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>, page_size: usize) -> Self {
        Self {
            entries,
            page_size: page_size.max(1),
        }
    }

    /// Generated catalog of `count` entries cycling through the seed titles.
    pub fn seeded(count: usize, page_size: usize) -> Self {
        let entries = (0..count)
            .map(|idx| {
                let base = SEED_TITLES[idx % SEED_TITLES.len()];
                let round = idx / SEED_TITLES.len();
                let title = if round == 0 {
                    base.to_string()
                } else {
                    format!("{base} {}", round + 1)
                };
                let mut entry = CatalogEntry::new(idx as i64 + 1, title);
                if let Some(date) = NaiveDate::from_ymd_opt(1950 + (idx % 70) as i32, 1, 1) {
                    entry = entry.with_release_date(date);
                }
                entry
            })
            .collect();
        Self::new(entries, page_size)
    }

    /// Reads a JSON array of entries.
    pub fn from_file(path: &Path, page_size: usize) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog file '{}'", path.display()))?;
        let entries: Vec<CatalogEntry> = serde_json::from_str(&raw)
            .with_context(|| format!("invalid catalog file '{}'", path.display()))?;
        Ok(Self::new(entries, page_size))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_pages(&self) -> u32 {
        self.entries.len().div_ceil(self.page_size) as u32
    }

    /// One-based page lookup. Pages past the end are empty and final.
    pub fn page(&self, page: u32) -> Result<PageResponse, ApiException> {
        if page < FIRST_PAGE {
            return Err(ApiException::invalid_cursor(&page.to_string()));
        }

        let start = (page as usize - 1).saturating_mul(self.page_size);
        let end = start.saturating_add(self.page_size).min(self.entries.len());
        let entries = self
            .entries
            .get(start..end)
            .map(<[CatalogEntry]>::to_vec)
            .unwrap_or_default();
        let has_more = end < self.entries.len();

        Ok(PageResponse {
            entries,
            next_cursor: has_more.then(|| PageCursor::Page(page + 1)),
            has_more,
        })
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::CatalogEntry;

pub const CATALOG_ROUTE: &str = "/catalog";
pub const FIRST_PAGE: u32 = 1;

/// Where the next fetch resumes. Servers hand out either page numbers or
/// opaque continuation tokens; both travel as plain JSON scalars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageCursor {
    Page(u32),
    Token(String),
}

impl PageCursor {
    pub fn initial() -> Self {
        Self::Page(FIRST_PAGE)
    }

    /// The page that follows this one, when the cursor is numeric.
    pub fn successor(&self) -> Option<Self> {
        match self {
            Self::Page(page) => page.checked_add(1).map(Self::Page),
            Self::Token(_) => None,
        }
    }

    /// Query parameter carrying this cursor on a catalog request.
    pub fn query_pair(&self) -> (&'static str, String) {
        match self {
            Self::Page(page) => ("page", page.to_string()),
            Self::Token(token) => ("cursor", token.clone()),
        }
    }
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(page) => write!(f, "page {page}"),
            Self::Token(token) => write!(f, "token {token}"),
        }
    }
}

/// Body of a `GET /catalog` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse {
    #[serde(alias = "results")]
    pub entries: Vec<CatalogEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<PageCursor>,
    pub has_more: bool,
}

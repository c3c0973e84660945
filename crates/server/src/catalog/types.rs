//! Catalog request types.
//!
//! Provides the typed surface between raw query-string parameters and the
//! query builder: sort keys, directions, filter predicates, and the
//! interpretation step that either yields a buildable selection or aborts
//! with a user-facing message.

use serde::Deserialize;

use super::query::CatalogQuery;

/// Default listing page size.
pub const DEFAULT_PER_PAGE: u32 = 24;

/// Upper bound on caller-supplied page size.
pub const MAX_PER_PAGE: u32 = 100;

/// Message shown when a search is submitted without criteria.
pub const EMPTY_SEARCH_MESSAGE: &str = "You didn't enter any search criteria!";

/// Raw listing parameters, all optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogParams {
    /// Sort key: "name", "category", "price", "rating", "sku", "created".
    pub sort: Option<String>,

    /// Sort direction: "asc" (default) or "desc".
    pub direction: Option<String>,

    /// Comma-separated category machine names.
    pub category: Option<String>,

    /// Free-text search term.
    pub q: Option<String>,

    /// Page number (1-indexed).
    pub page: Option<u32>,

    /// Items per page.
    pub per_page: Option<u32>,
}

/// Recognized sort keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Case-insensitive ordering on the product name.
    Name,
    /// Ordering on the joined category name, not the category id.
    Category,
    Price,
    Rating,
    Sku,
    Created,
}

impl SortKey {
    /// Parse a sort parameter. Unknown keys yield `None` and apply no
    /// ordering, though the raw value is still echoed in the sort label.
    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "name" => Some(Self::Name),
            "category" => Some(Self::Category),
            "price" => Some(Self::Price),
            "rating" => Some(Self::Rating),
            "sku" => Some(Self::Sku),
            "created" => Some(Self::Created),
            _ => None,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Parse a direction parameter; anything but "desc" is ascending.
    pub fn from_param(value: &str) -> Self {
        if value == "desc" { Self::Desc } else { Self::Asc }
    }
}

/// A sort key with its direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    pub key: SortKey,
    pub direction: SortDirection,
}

/// Typed filter predicates accumulated before compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Joined category name is a member of the set.
    CategoryNameIn(Vec<String>),
    /// Name OR description contains the needle, case-insensitively.
    TextContains(String),
}

/// Outcome of interpreting listing parameters.
#[derive(Debug)]
pub enum Selection {
    /// Parameters are valid; run the compiled query.
    Proceed(CatalogSelection),
    /// Parameters are a user error; drop everything and redirect.
    Abort(SelectionAbort),
}

/// A buildable selection plus the metadata echoed back to the template.
#[derive(Debug)]
pub struct CatalogSelection {
    pub query: CatalogQuery,

    /// Requested category machine names, for active-filter resolution.
    pub category_names: Vec<String>,

    /// The search term as entered, if any.
    pub search_term: Option<String>,

    /// Composite sort label, e.g. "name_desc"; "None_None" when unsorted.
    pub current_sorting: String,
}

/// An aborted selection: user-facing message plus redirect destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionAbort {
    pub message: String,
    pub redirect_to: String,
}

/// Interpret raw listing parameters into a selection outcome.
///
/// Predicates and the ordering are accumulated into a [`CatalogQuery`] and
/// compiled later in one pass. A present-but-blank `q` aborts the whole
/// selection, discarding any predicates accumulated earlier in the same
/// interpretation, and redirects to the unfiltered listing.
pub fn interpret_params(params: &CatalogParams) -> Selection {
    let mut query = CatalogQuery::new();

    if let Some(sort) = params.sort.as_deref()
        && let Some(key) = SortKey::from_param(sort)
    {
        let direction = params
            .direction
            .as_deref()
            .map(SortDirection::from_param)
            .unwrap_or_default();
        query.order_by(Ordering { key, direction });
    }

    let mut category_names = Vec::new();
    if let Some(category) = params.category.as_deref() {
        category_names = category
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        if !category_names.is_empty() {
            query.filter(Predicate::CategoryNameIn(category_names.clone()));
        }
    }

    let mut search_term = None;
    if let Some(q) = params.q.as_deref() {
        if q.trim().is_empty() {
            return Selection::Abort(SelectionAbort {
                message: EMPTY_SEARCH_MESSAGE.to_string(),
                redirect_to: "/".to_string(),
            });
        }
        search_term = Some(q.to_string());
        query.filter(Predicate::TextContains(q.to_string()));
    }

    let page = params.page.unwrap_or(1).max(1);
    let per_page = params
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);
    query.paginate(page, per_page);

    let current_sorting = sort_label(params.sort.as_deref(), params.direction.as_deref());

    Selection::Proceed(CatalogSelection {
        query,
        category_names,
        search_term,
        current_sorting,
    })
}

/// Compose the sort label from the raw request values.
///
/// Absent values degrade to the "None" sentinel, so an unsorted listing
/// reports "None_None".
pub fn sort_label(sort: Option<&str>, direction: Option<&str>) -> String {
    format!(
        "{}_{}",
        sort.unwrap_or("None"),
        direction.unwrap_or("None")
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn sort_key_parsing() {
        assert_eq!(SortKey::from_param("name"), Some(SortKey::Name));
        assert_eq!(SortKey::from_param("category"), Some(SortKey::Category));
        assert_eq!(SortKey::from_param("price"), Some(SortKey::Price));
        assert_eq!(SortKey::from_param("popularity"), None);
    }

    #[test]
    fn direction_defaults_to_ascending() {
        assert_eq!(SortDirection::from_param("desc"), SortDirection::Desc);
        assert_eq!(SortDirection::from_param("asc"), SortDirection::Asc);
        assert_eq!(SortDirection::from_param("sideways"), SortDirection::Asc);
        assert_eq!(SortDirection::default(), SortDirection::Asc);
    }

    #[test]
    fn sort_label_composition() {
        assert_eq!(sort_label(Some("name"), Some("desc")), "name_desc");
        assert_eq!(sort_label(Some("price"), None), "price_None");
        assert_eq!(sort_label(None, None), "None_None");
    }

    #[test]
    fn category_param_splits_on_commas() {
        let params = CatalogParams {
            category: Some("toys, food,,kitchen_dining".to_string()),
            ..Default::default()
        };

        let Selection::Proceed(selection) = interpret_params(&params) else {
            panic!("expected proceed");
        };

        assert_eq!(selection.category_names, vec!["toys", "food", "kitchen_dining"]);
    }

    #[test]
    fn blank_search_aborts_selection() {
        for q in ["", "   ", "\t"] {
            let params = CatalogParams {
                q: Some(q.to_string()),
                ..Default::default()
            };

            let Selection::Abort(abort) = interpret_params(&params) else {
                panic!("expected abort for {q:?}");
            };

            assert_eq!(abort.message, EMPTY_SEARCH_MESSAGE);
            assert_eq!(abort.redirect_to, "/");
        }
    }

    #[test]
    fn blank_search_discards_earlier_filters() {
        // Category and sort arrive alongside the blank q; the abort wins.
        let params = CatalogParams {
            sort: Some("name".to_string()),
            category: Some("toys".to_string()),
            q: Some("  ".to_string()),
            ..Default::default()
        };

        assert!(matches!(interpret_params(&params), Selection::Abort(_)));
    }

    #[test]
    fn search_term_is_echoed_verbatim() {
        let params = CatalogParams {
            q: Some("chess set".to_string()),
            ..Default::default()
        };

        let Selection::Proceed(selection) = interpret_params(&params) else {
            panic!("expected proceed");
        };

        assert_eq!(selection.search_term.as_deref(), Some("chess set"));
    }

    #[test]
    fn unknown_sort_key_is_echoed_but_not_applied() {
        let params = CatalogParams {
            sort: Some("popularity".to_string()),
            direction: Some("desc".to_string()),
            ..Default::default()
        };

        let Selection::Proceed(selection) = interpret_params(&params) else {
            panic!("expected proceed");
        };

        assert_eq!(selection.current_sorting, "popularity_desc");
        assert!(!selection.query.has_ordering());
    }

    #[test]
    fn page_bounds_are_clamped() {
        let params = CatalogParams {
            page: Some(0),
            per_page: Some(10_000),
            ..Default::default()
        };

        let Selection::Proceed(selection) = interpret_params(&params) else {
            panic!("expected proceed");
        };

        assert_eq!(selection.query.page(), 1);
        assert_eq!(selection.query.per_page(), MAX_PER_PAGE);
    }
}

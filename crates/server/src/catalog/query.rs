//! Catalog query builder using SeaQuery.
//!
//! Accumulates typed predicates and at most one ordering, then compiles
//! everything into a single SELECT (plus a COUNT variant) against the
//! `product` table, joining `category` only when a predicate or ordering
//! needs it.

use sea_query::extension::postgres::PgExpr;
use sea_query::{
    Asterisk, Cond, Expr, ExprTrait, Func, Iden, Order, PostgresQueryBuilder, Query,
    SelectStatement,
};

use super::types::{Ordering, Predicate, SortDirection, SortKey};

/// `product` table identifiers.
#[derive(Iden)]
enum Product {
    Table,
    Name,
    Description,
    CategoryId,
    PriceCents,
    Rating,
    Sku,
    Created,
}

/// `category` table identifiers.
#[derive(Iden)]
enum Category {
    Table,
    Id,
    Name,
}

/// Accumulating query builder for the product listing.
#[derive(Debug, Default)]
pub struct CatalogQuery {
    predicates: Vec<Predicate>,
    ordering: Option<Ordering>,
    page: u32,
    per_page: u32,
}

impl CatalogQuery {
    /// Create an empty query: unfiltered, unordered, unpaginated.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter predicate.
    pub fn filter(&mut self, predicate: Predicate) -> &mut Self {
        self.predicates.push(predicate);
        self
    }

    /// Set the ordering. At most one ordering applies; the last call wins.
    pub fn order_by(&mut self, ordering: Ordering) -> &mut Self {
        self.ordering = Some(ordering);
        self
    }

    /// Set pagination (1-indexed page).
    pub fn paginate(&mut self, page: u32, per_page: u32) -> &mut Self {
        self.page = page;
        self.per_page = per_page;
        self
    }

    /// Whether an ordering has been set.
    pub fn has_ordering(&self) -> bool {
        self.ordering.is_some()
    }

    /// Current page (1-indexed).
    pub fn page(&self) -> u32 {
        self.page.max(1)
    }

    /// Current page size.
    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Compile the SELECT query.
    pub fn compile(&self) -> String {
        let mut query = Query::select();

        query.column((Product::Table, Asterisk));
        query.from(Product::Table);

        self.add_category_join(&mut query);
        self.add_predicates(&mut query);
        self.add_ordering(&mut query);

        if self.per_page > 0 {
            let offset = u64::from(self.page().saturating_sub(1)) * u64::from(self.per_page);
            query.limit(u64::from(self.per_page));
            query.offset(offset);
        }

        query.to_string(PostgresQueryBuilder)
    }

    /// Compile the COUNT query for pager metadata.
    pub fn compile_count(&self) -> String {
        let mut query = Query::select();

        query.expr(Expr::col(Asterisk).count());
        query.from(Product::Table);

        self.add_category_join(&mut query);
        self.add_predicates(&mut query);

        query.to_string(PostgresQueryBuilder)
    }

    /// Join `category` when a predicate or the ordering reaches through it.
    fn add_category_join(&self, query: &mut SelectStatement) {
        if !self.needs_category_join() {
            return;
        }

        query.left_join(
            Category::Table,
            Expr::col((Product::Table, Product::CategoryId))
                .equals((Category::Table, Category::Id)),
        );
    }

    fn needs_category_join(&self) -> bool {
        let ordering_needs = matches!(
            self.ordering,
            Some(Ordering {
                key: SortKey::Category,
                ..
            })
        );
        let predicate_needs = self
            .predicates
            .iter()
            .any(|p| matches!(p, Predicate::CategoryNameIn(_)));

        ordering_needs || predicate_needs
    }

    /// Add WHERE conditions from the accumulated predicates.
    fn add_predicates(&self, query: &mut SelectStatement) {
        for predicate in &self.predicates {
            match predicate {
                Predicate::CategoryNameIn(names) => {
                    query.and_where(
                        Expr::col((Category::Table, Category::Name)).is_in(names.clone()),
                    );
                }
                Predicate::TextContains(needle) => {
                    let pattern = format!("%{}%", escape_like_wildcards(needle));
                    query.cond_where(
                        Cond::any()
                            .add(
                                Expr::col((Product::Table, Product::Name))
                                    .ilike(pattern.as_str()),
                            )
                            .add(
                                Expr::col((Product::Table, Product::Description))
                                    .ilike(pattern.as_str()),
                            ),
                    );
                }
            }
        }
    }

    /// Add the ORDER BY clause.
    fn add_ordering(&self, query: &mut SelectStatement) {
        let Some(ordering) = &self.ordering else {
            return;
        };

        let order = match ordering.direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        };

        match ordering.key {
            // Lowercased key so "apple" and "Banana" interleave correctly.
            SortKey::Name => {
                query.order_by_expr(
                    Func::lower(Expr::col((Product::Table, Product::Name))).into(),
                    order,
                );
            }
            // The category's name, not the foreign key on the product row.
            SortKey::Category => {
                query.order_by((Category::Table, Category::Name), order);
            }
            SortKey::Price => {
                query.order_by((Product::Table, Product::PriceCents), order);
            }
            SortKey::Rating => {
                query.order_by((Product::Table, Product::Rating), order);
            }
            SortKey::Sku => {
                query.order_by((Product::Table, Product::Sku), order);
            }
            SortKey::Created => {
                query.order_by((Product::Table, Product::Created), order);
            }
        }
    }
}

/// Escape SQL LIKE wildcard characters (`%`, `_`, `\`) in a value.
fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn unfiltered_query_selects_all_products() {
        let query = CatalogQuery::new();
        let sql = query.compile();

        assert!(sql.contains(r#"FROM "product""#), "{sql}");
        assert!(!sql.contains("JOIN"), "no join without category use: {sql}");
        assert!(!sql.contains("ORDER BY"), "{sql}");
        assert!(!sql.contains("WHERE"), "{sql}");
    }

    #[test]
    fn name_sort_uses_lowercased_key() {
        let mut query = CatalogQuery::new();
        query.order_by(Ordering {
            key: SortKey::Name,
            direction: SortDirection::Asc,
        });
        let sql = query.compile();

        assert!(
            sql.contains(r#"ORDER BY LOWER("product"."name") ASC"#),
            "name sort must be case-insensitive: {sql}"
        );
    }

    #[test]
    fn category_sort_orders_by_joined_name() {
        let mut query = CatalogQuery::new();
        query.order_by(Ordering {
            key: SortKey::Category,
            direction: SortDirection::Asc,
        });
        let sql = query.compile();

        assert!(
            sql.contains(r#"LEFT JOIN "category""#),
            "category sort needs the join: {sql}"
        );
        assert!(
            sql.contains(r#"ORDER BY "category"."name" ASC"#),
            "sort by the category name, not its id: {sql}"
        );
    }

    #[test]
    fn descending_direction_reverses_ordering() {
        let mut asc = CatalogQuery::new();
        asc.order_by(Ordering {
            key: SortKey::Price,
            direction: SortDirection::Asc,
        });
        let mut desc = CatalogQuery::new();
        desc.order_by(Ordering {
            key: SortKey::Price,
            direction: SortDirection::Desc,
        });

        let asc_sql = asc.compile();
        let desc_sql = desc.compile();

        assert!(asc_sql.contains(r#""product"."price_cents" ASC"#), "{asc_sql}");
        assert!(desc_sql.contains(r#""product"."price_cents" DESC"#), "{desc_sql}");
        // Identical ordering key, only the direction flips.
        assert_eq!(asc_sql.replace(" ASC", " DESC"), desc_sql);
    }

    #[test]
    fn category_filter_compiles_to_set_membership() {
        let mut query = CatalogQuery::new();
        query.filter(Predicate::CategoryNameIn(vec![
            "toys".to_string(),
            "food".to_string(),
        ]));
        let sql = query.compile();

        assert!(sql.contains(r#"LEFT JOIN "category""#), "{sql}");
        assert!(
            sql.contains(r#""category"."name" IN ('toys', 'food')"#),
            "{sql}"
        );
    }

    #[test]
    fn text_filter_matches_name_or_description() {
        let mut query = CatalogQuery::new();
        query.filter(Predicate::TextContains("chess".to_string()));
        let sql = query.compile();

        assert!(sql.contains("ILIKE"), "{sql}");
        assert!(sql.contains("%chess%"), "{sql}");
        assert!(sql.contains(r#""product"."name""#), "{sql}");
        assert!(sql.contains(r#""product"."description""#), "{sql}");
        assert!(sql.contains("OR"), "name OR description: {sql}");
    }

    #[test]
    fn text_filter_escapes_like_wildcards() {
        let mut query = CatalogQuery::new();
        query.filter(Predicate::TextContains("100%_done".to_string()));
        let sql = query.compile();

        assert!(
            !sql.contains("%100%_done%"),
            "raw wildcard chars must not appear unescaped: {sql}"
        );
    }

    #[test]
    fn combined_filters_are_conjoined() {
        let mut query = CatalogQuery::new();
        query.filter(Predicate::CategoryNameIn(vec!["toys".to_string()]));
        query.filter(Predicate::TextContains("ball".to_string()));
        query.order_by(Ordering {
            key: SortKey::Name,
            direction: SortDirection::Desc,
        });
        let sql = query.compile();

        assert!(sql.contains(r#""category"."name" IN ('toys')"#), "{sql}");
        assert!(sql.contains("ILIKE"), "{sql}");
        assert!(sql.contains("AND"), "{sql}");
        assert!(sql.contains(r#"LOWER("product"."name") DESC"#), "{sql}");
    }

    #[test]
    fn pagination_compiles_limit_and_offset() {
        let mut query = CatalogQuery::new();
        query.paginate(1, 24);
        assert!(query.compile().contains("LIMIT 24"));
        assert!(query.compile().contains("OFFSET 0"));

        let mut page3 = CatalogQuery::new();
        page3.paginate(3, 24);
        assert!(page3.compile().contains("OFFSET 48"));
    }

    #[test]
    fn count_query_has_no_ordering_or_paging() {
        let mut query = CatalogQuery::new();
        query.filter(Predicate::TextContains("chess".to_string()));
        query.order_by(Ordering {
            key: SortKey::Name,
            direction: SortDirection::Asc,
        });
        query.paginate(2, 24);

        let sql = query.compile_count();

        assert!(sql.contains("COUNT(*)"), "{sql}");
        assert!(sql.contains("ILIKE"), "filters still apply: {sql}");
        assert!(!sql.contains("ORDER BY"), "{sql}");
        assert!(!sql.contains("LIMIT"), "{sql}");
    }

    #[test]
    fn escape_like_wildcards_function() {
        assert_eq!(escape_like_wildcards("hello"), "hello");
        assert_eq!(escape_like_wildcards("100%"), "100\\%");
        assert_eq!(escape_like_wildcards("a_b"), "a\\_b");
        assert_eq!(escape_like_wildcards("a\\b"), "a\\\\b");
    }
}

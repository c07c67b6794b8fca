//! Shared list query handling: lenient page/limit parsing, case-insensitive
//! search, name relevance ranking and page fetching.

use sea_orm::{
    sea_query::{Expr, Func, SimpleExpr},
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, FromQueryResult, Order,
    PaginatorTrait, QueryFilter, QueryOrder, Select,
};
use serde::Deserialize;
use utoipa::IntoParams;

/// Upper bound for `limit` on every list endpoint.
pub const MAX_LIMIT: u64 = 100;

/// Upper bound for `page`. Keeps `(page - 1) * limit` well inside the
/// offset range of every backend.
pub const MAX_PAGE: u64 = 1_000_000;

/// Query parameters common to every list endpoint.
///
/// Values are taken as text so that malformed numbers fall back to the
/// defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Page number, starting at 1
    pub page: Option<String>,
    /// Page size, at most 100
    pub limit: Option<String>,
    /// Case-insensitive partial match on the resource's text columns
    pub search: Option<String>,
    /// `asc` or `desc`
    pub order: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl From<SortOrder> for Order {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

/// Normalized list parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub page: u64,
    pub limit: u64,
    /// Lower-cased, trimmed search term. `None` when empty.
    pub search: Option<String>,
    pub order: SortOrder,
}

fn positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|value| *value > 0)
        .map(|value| value as u64)
}

impl ListQuery {
    pub fn resolve(&self, default_limit: u64, default_order: SortOrder) -> ListParams {
        let page = positive(self.page.as_deref()).unwrap_or(1).min(MAX_PAGE);
        let limit = positive(self.limit.as_deref())
            .unwrap_or(default_limit)
            .min(MAX_LIMIT);
        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase);
        let order = match self.order.as_deref().map(|o| o.trim().to_ascii_lowercase()) {
            Some(o) if o == "asc" => SortOrder::Asc,
            Some(o) if o == "desc" => SortOrder::Desc,
            _ => default_order,
        };

        ListParams {
            page,
            limit,
            search,
            order,
        }
    }
}

/// `LOWER(col) LIKE %term%` over any of `columns`.
pub fn search_filter<C>(term: &str, columns: &[C]) -> Condition
where
    C: ColumnTrait,
{
    let pattern = format!("%{term}%");
    columns.iter().fold(Condition::any(), |condition, column| {
        condition.add(Expr::expr(Func::lower(Expr::col(*column))).like(pattern.clone()))
    })
}

/// Ranks rows by how well `column` matches `term`: exact match first, then
/// prefix matches, then everything else.
pub fn relevance<C>(column: C, term: &str) -> SimpleExpr
where
    C: ColumnTrait,
{
    let column = column.as_str();
    Expr::cust_with_values(
        format!("CASE WHEN LOWER({column}) = ? THEN 3 WHEN LOWER({column}) LIKE ? THEN 2 ELSE 1 END"),
        [term.to_string(), format!("{term}%")],
    )
}

/// Applies search and ordering. With a search term and a relevance column,
/// relevance wins over the requested order; `sort` then breaks ties.
pub fn apply_list_params<E, C>(
    mut select: Select<E>,
    params: &ListParams,
    search_columns: &[C],
    relevance_column: Option<C>,
    sort: C,
) -> Select<E>
where
    E: EntityTrait,
    C: ColumnTrait,
{
    if let Some(term) = params.search.as_ref().filter(|_| !search_columns.is_empty()) {
        select = select.filter(search_filter(term, search_columns));
        if let Some(column) = relevance_column {
            select = select.order_by(relevance(column, term), Order::Desc);
        }
    }
    select.order_by(sort, params.order.into())
}

/// Runs the select for one page. Returns the page rows and the total count.
pub async fn fetch_page<E, M, C>(
    select: Select<E>,
    db: &C,
    params: &ListParams,
) -> Result<(Vec<M>, u64), DbErr>
where
    E: EntityTrait<Model = M>,
    M: FromQueryResult + Sized + Send + Sync + 'static,
    C: ConnectionTrait,
{
    let paginator = select.paginate(db, params.limit);
    let total = paginator.num_items().await?;
    let rows = paginator.fetch_page(params.page - 1).await?;
    Ok((rows, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, limit: Option<&str>, search: Option<&str>, order: Option<&str>) -> ListQuery {
        ListQuery {
            page: page.map(String::from),
            limit: limit.map(String::from),
            search: search.map(String::from),
            order: order.map(String::from),
        }
    }

    #[test]
    fn test_defaults_apply_to_missing_or_bad_values() {
        let params = query(None, None, None, None).resolve(10, SortOrder::Desc);
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 10);
        assert_eq!(params.search, None);
        assert_eq!(params.order, SortOrder::Desc);

        let params = query(Some("-3"), Some("abc"), Some("   "), Some("sideways")).resolve(20, SortOrder::Asc);
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 20);
        assert_eq!(params.search, None);
        assert_eq!(params.order, SortOrder::Asc);

        let params = query(Some("0"), Some("0"), None, None).resolve(20, SortOrder::Asc);
        assert_eq!((params.page, params.limit), (1, 20));
    }

    #[test]
    fn test_values_are_normalized() {
        let params = query(Some("9223372036854775807"), None, None, None).resolve(10, SortOrder::Desc);
        assert_eq!(params.page, MAX_PAGE);

        let params = query(Some("3"), Some("500"), Some("  Smith "), Some("ASC")).resolve(10, SortOrder::Desc);
        assert_eq!(params.page, 3);
        assert_eq!(params.limit, MAX_LIMIT);
        assert_eq!(params.search.as_deref(), Some("smith"));
        assert_eq!(params.order, SortOrder::Asc);
    }
}

//! Zube query parameters and their canonical query-string encoding.
//!
//! Zube list endpoints accept Rails-style bracketed parameters for pagination,
//! ordering, filtering and column selection. `Query::encode` flattens a `Query`
//! into that format deterministically, so the same query always produces the
//! same URL (and therefore the same cache key).
//!
//! # Example
//!
//! ```ignore
//! let query = Query::new()
//!     .filter("project_id", 42)
//!     .filter("assignee_ids", vec!["1", "2"])
//!     .select(["number", "title"]);
//!
//! assert_eq!(
//!     query.encode(),
//!     "order%5Bby%5D=&order%5Bdirection%5D=&page=&per_page=\
//!      &select%5B%5D=number&select%5B%5D=title\
//!      &where%5Bassignee_ids%5D%5B%5D=1%2C2&where%5Bproject_id%5D=42"
//! );
//! ```

use std::collections::BTreeMap;
use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Bytes left as-is in keys and values, everything else is percent-encoded.
/// Same set as Go's `url.QueryEscape`, which the Zube CLI has always used.
const QUERY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
  .remove(b'-')
  .remove(b'_')
  .remove(b'.')
  .remove(b'~');

/// Which results page to fetch and how large pages are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pagination {
  pub page: Option<u32>,
  /// Zube defaults to 30 when unset
  pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  Asc,
  Desc,
}

impl Direction {
  pub fn as_str(&self) -> &'static str {
    match self {
      Direction::Asc => "asc",
      Direction::Desc => "desc",
    }
  }
}

impl fmt::Display for Direction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Order {
  pub by: Option<String>,
  pub direction: Option<Direction>,
}

/// Value of a single `where` filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhereValue {
  /// Encoded as `where[field]=value`
  Scalar(String),
  /// Encoded as a single comma-joined `where[field][]=a,b,c`
  List(Vec<String>),
}

impl From<&str> for WhereValue {
  fn from(value: &str) -> Self {
    WhereValue::Scalar(value.to_string())
  }
}

impl From<String> for WhereValue {
  fn from(value: String) -> Self {
    WhereValue::Scalar(value)
  }
}

impl From<bool> for WhereValue {
  fn from(value: bool) -> Self {
    WhereValue::Scalar(value.to_string())
  }
}

macro_rules! where_value_from_int {
  ($($t:ty),*) => {
    $(
      impl From<$t> for WhereValue {
        fn from(value: $t) -> Self {
          WhereValue::Scalar(value.to_string())
        }
      }
    )*
  };
}

where_value_from_int!(i32, i64, u32, u64);

impl From<Vec<String>> for WhereValue {
  fn from(values: Vec<String>) -> Self {
    WhereValue::List(values)
  }
}

impl From<Vec<&str>> for WhereValue {
  fn from(values: Vec<&str>) -> Self {
    WhereValue::List(values.into_iter().map(String::from).collect())
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
  /// Field name to filter value. Keyed by field so output order never
  /// depends on insertion order.
  pub r#where: BTreeMap<String, WhereValue>,
  /// Attributes to select, emitted in the given order
  pub select: Vec<String>,
}

/// All parameters Zube list endpoints understand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
  pub pagination: Pagination,
  pub order: Order,
  pub filter: Filter,
  /// Free text search, undocumented by Zube but honored on `/cards`
  pub search: String,
}

impl Query {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn page(mut self, page: u32) -> Self {
    self.pagination.page = Some(page);
    self
  }

  pub fn per_page(mut self, per_page: u32) -> Self {
    self.pagination.per_page = Some(per_page);
    self
  }

  pub fn order_by(mut self, by: impl Into<String>) -> Self {
    self.order.by = Some(by.into());
    self
  }

  pub fn direction(mut self, direction: Direction) -> Self {
    self.order.direction = Some(direction);
    self
  }

  /// Add (or replace) a `where` filter on `field`.
  pub fn filter(mut self, field: impl Into<String>, value: impl Into<WhereValue>) -> Self {
    self.filter.r#where.insert(field.into(), value.into());
    self
  }

  pub fn select<I, S>(mut self, columns: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.filter.select = columns.into_iter().map(Into::into).collect();
    self
  }

  pub fn search(mut self, text: impl Into<String>) -> Self {
    self.search = text.into();
    self
  }

  /// Encode into a flat query string.
  ///
  /// Pagination and order keys are always present, even when empty, so the
  /// output is stable for fixtures. Pairs are sorted by key; repeated keys
  /// (`select[]`) keep their insertion order.
  pub fn encode(&self) -> String {
    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut add = |key: String, value: String| params.entry(key).or_default().push(value);

    add("page".into(), opt_to_string(self.pagination.page));
    add("per_page".into(), opt_to_string(self.pagination.per_page));
    add(
      "order[by]".into(),
      self.order.by.clone().unwrap_or_default(),
    );
    add(
      "order[direction]".into(),
      opt_to_string(self.order.direction),
    );

    for (field, value) in &self.filter.r#where {
      match value {
        WhereValue::Scalar(v) => add(format!("where[{}]", field), v.clone()),
        WhereValue::List(values) => add(format!("where[{}][]", field), values.join(",")),
      }
    }

    if !self.search.is_empty() {
      add("search".into(), self.search.clone());
    }

    for column in &self.filter.select {
      add("select[]".into(), column.clone());
    }

    let mut pairs = Vec::new();
    for (key, values) in &params {
      for value in values {
        pairs.push(format!("{}={}", query_escape(key), query_escape(value)));
      }
    }
    pairs.join("&")
  }
}

/// Percent-encode `s`, with spaces as `+`.
fn query_escape(s: &str) -> String {
  // A literal '%' is itself escaped, so every "%20" here came from a space
  utf8_percent_encode(s, QUERY_ESCAPE)
    .to_string()
    .replace("%20", "+")
}

fn opt_to_string<T: ToString>(value: Option<T>) -> String {
  value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_query_emits_pagination_and_order_only() {
    assert_eq!(
      Query::new().encode(),
      "order%5Bby%5D=&order%5Bdirection%5D=&page=&per_page="
    );
  }

  #[test]
  fn test_page_and_order_by() {
    let query = Query::new().page(1).order_by("id");
    assert_eq!(
      query.encode(),
      "order%5Bby%5D=id&order%5Bdirection%5D=&page=1&per_page="
    );
  }

  #[test]
  fn test_order_direction() {
    let query = Query::new().order_by("title").direction(Direction::Asc);
    assert_eq!(
      query.encode(),
      "order%5Bby%5D=title&order%5Bdirection%5D=asc&page=&per_page="
    );
  }

  #[test]
  fn test_where_and_select() {
    let query = Query::new().filter("id", 123).select(["id", "title"]);
    assert_eq!(
      query.encode(),
      "order%5Bby%5D=&order%5Bdirection%5D=&page=&per_page=&select%5B%5D=id&select%5B%5D=title&where%5Bid%5D=123"
    );
  }

  #[test]
  fn test_list_filter_is_comma_joined() {
    let query = Query::new().filter("assignee_ids", vec!["1", "2", "3"]);
    assert_eq!(
      query.encode(),
      "order%5Bby%5D=&order%5Bdirection%5D=&page=&per_page=&where%5Bassignee_ids%5D%5B%5D=1%2C2%2C3"
    );
  }

  #[test]
  fn test_search() {
    let query = Query::new().search("mysearch");
    assert_eq!(
      query.encode(),
      "order%5Bby%5D=&order%5Bdirection%5D=&page=&per_page=&search=mysearch"
    );
  }

  #[test]
  fn test_empty_search_is_omitted() {
    assert!(!Query::new().search("").encode().contains("search"));
  }

  #[test]
  fn test_filter_order_does_not_matter() {
    let a = Query::new()
      .filter("status", "open")
      .filter("project_id", 7)
      .filter("category_name", "In Progress");
    let b = Query::new()
      .filter("category_name", "In Progress")
      .filter("project_id", 7)
      .filter("status", "open");

    assert_eq!(a.encode(), b.encode());
    assert_eq!(
      a.encode(),
      "order%5Bby%5D=&order%5Bdirection%5D=&page=&per_page=\
       &where%5Bcategory_name%5D=In+Progress&where%5Bproject_id%5D=7&where%5Bstatus%5D=open"
    );
  }

  #[test]
  fn test_select_keeps_column_order() {
    let query = Query::new().select(["title", "number"]);
    assert!(query
      .encode()
      .ends_with("select%5B%5D=title&select%5B%5D=number"));
  }

  #[test]
  fn test_values_are_escaped() {
    let query = Query::new().search("a&b=c");
    assert!(query.encode().ends_with("search=a%26b%3Dc"));
  }

  #[test]
  fn test_tilde_kept_and_asterisk_escaped() {
    assert_eq!(
      Query::new().search("a~b*c").encode(),
      "order%5Bby%5D=&order%5Bdirection%5D=&page=&per_page=&search=a~b%2Ac"
    );
  }

  #[test]
  fn test_escaping_of_spaces_percent_and_unicode() {
    let query = Query::new().filter("title", "50% done").search("größe 1+1");
    assert_eq!(
      query.encode(),
      "order%5Bby%5D=&order%5Bdirection%5D=&page=&per_page=\
       &search=gr%C3%B6%C3%9Fe+1%2B1&where%5Btitle%5D=50%25+done"
    );
  }
}

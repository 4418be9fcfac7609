//! The datagrid: filters, input values and a pager bound to one query.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::DatagridConfig;
use crate::error::{DatagridError, Result};
use crate::filter::{Filter, FilterData, FilterFactory, FilterOptions};
use crate::pager::Pager;
use crate::query::{qualify, ProxyQuery, SortOrder};

/// Input key selecting the page.
pub const PAGE: &str = "_page";
/// Input key selecting the page size.
pub const PER_PAGE: &str = "_per_page";
/// Input key selecting the sort field.
pub const SORT_BY: &str = "_sort_by";
/// Input key selecting the sort direction.
pub const SORT_ORDER: &str = "_sort_order";

/// Raw datagrid input keyed by filter name or one of the `_` keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatagridValues(BTreeMap<String, serde_json::Value>);

fn int_value(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    }
}

/// Splits `name[a][b]` into `name` and `["a", "b"]`.
fn split_key(key: &str) -> (&str, Vec<&str>) {
    let Some(open) = key.find('[') else {
        return (key, Vec::new());
    };
    let (base, mut rest) = key.split_at(open);
    let mut segments = Vec::new();
    while let Some(inner) = rest.strip_prefix('[') {
        let Some(close) = inner.find(']') else {
            return (key, Vec::new());
        };
        segments.push(&inner[..close]);
        rest = &inner[close + 1..];
    }
    if rest.is_empty() && !base.is_empty() {
        (base, segments)
    } else {
        (key, Vec::new())
    }
}

fn insert_nested(target: &mut serde_json::Value, segments: &[&str], value: String) {
    let Some((segment, rest)) = segments.split_first() else {
        *target = serde_json::Value::String(value);
        return;
    };

    if segment.is_empty() {
        if !target.is_array() {
            *target = serde_json::Value::Array(Vec::new());
        }
        if let serde_json::Value::Array(items) = target {
            items.push(serde_json::Value::Null);
            if let Some(last) = items.last_mut() {
                insert_nested(last, rest, value);
            }
        }
        return;
    }

    if !target.is_object() {
        *target = serde_json::Value::Object(serde_json::Map::new());
    }
    if let serde_json::Value::Object(map) = target {
        let slot = map
            .entry((*segment).to_string())
            .or_insert(serde_json::Value::Null);
        insert_nested(slot, rest, value);
    }
}

impl DatagridValues {
    /// Creates empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds input from decoded query-string pairs.
    ///
    /// Bracketed keys nest: `status[type]=2&status[value]=draft` yields
    /// `{"status": {"type": "2", "value": "draft"}}`, and `tags[]=a&tags[]=b`
    /// yields an array.
    pub fn from_query_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut values = Self::new();
        for (key, value) in pairs {
            let (base, segments) = split_key(key.as_ref());
            let slot = values
                .0
                .entry(base.to_string())
                .or_insert(serde_json::Value::Null);
            insert_nested(slot, &segments, value.into());
        }
        values
    }

    /// Sets a raw value.
    pub fn set_value(&mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Returns a raw value.
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.0.get(name)
    }

    /// Returns true if a value is set for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Returns true when no value is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the raw values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the requested page.
    pub fn page(&self) -> Option<i64> {
        self.get(PAGE).and_then(int_value)
    }

    /// Returns the requested page size.
    pub fn per_page(&self) -> Option<i64> {
        self.get(PER_PAGE).and_then(int_value)
    }

    /// Returns the requested sort field.
    pub fn sort_by(&self) -> Option<&str> {
        self.get(SORT_BY)
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Returns the requested sort direction, if it is a valid one.
    pub fn sort_order(&self) -> Option<SortOrder> {
        self.get(SORT_ORDER)
            .and_then(serde_json::Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    /// Returns the input for the filter `name`.
    pub fn filter_data(&self, name: &str) -> Option<FilterData> {
        self.get(name).and_then(FilterData::from_json)
    }
}

impl<K: Into<String>, V: Into<serde_json::Value>> FromIterator<(K, V)> for DatagridValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Whether a datagrid has applied its filters yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindState {
    /// Filters not yet applied; input and filters may change.
    #[default]
    Unbound,
    /// Filters applied and pager initialised. Terminal.
    Bound,
}

/// A list view: a query, the filters that narrow it and the pager that
/// slices it.
///
/// The first call to [`build_pager`](Self::build_pager) (or anything that
/// needs results) applies every filter once, in registration order, then
/// sorts and pages the query. Later calls are no-ops.
pub struct Datagrid<Q: ProxyQuery> {
    query: Option<Q>,
    filters: Vec<Box<dyn Filter>>,
    pager: Pager<Q>,
    config: DatagridConfig,
    values: DatagridValues,
    state: BindState,
    active: Vec<String>,
}

impl<Q: ProxyQuery> fmt::Debug for Datagrid<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.filters.iter().map(|f| f.name()).collect();
        f.debug_struct("Datagrid")
            .field("filters", &names)
            .field("values", &self.values)
            .field("state", &self.state)
            .field("pager", &self.pager)
            .finish_non_exhaustive()
    }
}

impl<Q: ProxyQuery> Datagrid<Q> {
    /// Creates a datagrid over `query`.
    pub fn new(query: Q, pager: Pager<Q>, config: DatagridConfig, values: DatagridValues) -> Self {
        Self {
            query: Some(query),
            filters: Vec::new(),
            pager,
            config,
            values,
            state: BindState::Unbound,
            active: Vec::new(),
        }
    }

    // -- filters -------------------------------------------------------------

    /// Registers a filter under its name.
    ///
    /// A filter with the same name is replaced in place.
    pub fn add_filter<F: Filter + 'static>(&mut self, filter: F) {
        self.add_boxed_filter(Box::new(filter));
    }

    /// Registers an already boxed filter.
    pub fn add_boxed_filter(&mut self, filter: Box<dyn Filter>) {
        if self.state == BindState::Bound {
            warn!(filter = filter.name(), "filter added after the datagrid was bound");
        }
        match self.filters.iter_mut().find(|f| f.name() == filter.name()) {
            Some(slot) => *slot = filter,
            None => self.filters.push(filter),
        }
    }

    /// Returns true if a filter named `name` is registered.
    pub fn has_filter(&self, name: &str) -> bool {
        self.filters.iter().any(|f| f.name() == name)
    }

    /// Returns the filter named `name`.
    pub fn filter(&self, name: &str) -> Option<&dyn Filter> {
        self.filters
            .iter()
            .find(|f| f.name() == name)
            .map(AsRef::as_ref)
    }

    /// Unregisters and returns the filter named `name`.
    pub fn remove_filter(&mut self, name: &str) -> Option<Box<dyn Filter>> {
        let index = self.filters.iter().position(|f| f.name() == name)?;
        Some(self.filters.remove(index))
    }

    /// Moves the named filters to the front, in the given order.
    ///
    /// Unknown names are ignored; unlisted filters keep their relative order.
    pub fn reorder_filters(&mut self, names: &[&str]) {
        let mut rest = std::mem::take(&mut self.filters);
        for name in names {
            if let Some(index) = rest.iter().position(|f| f.name() == *name) {
                self.filters.push(rest.remove(index));
            }
        }
        self.filters.append(&mut rest);
    }

    /// Returns the filters in application order.
    pub fn filters(&self) -> impl Iterator<Item = &dyn Filter> {
        self.filters.iter().map(AsRef::as_ref)
    }

    /// Returns true if any filter has non-empty input.
    pub fn has_active_filters(&self) -> bool {
        self.filters.iter().any(|f| {
            self.values
                .filter_data(f.name())
                .is_some_and(|data| !data.is_empty())
        })
    }

    /// Returns the names of the filters that changed the query when bound.
    pub fn applied_filters(&self) -> &[String] {
        &self.active
    }

    // -- input ---------------------------------------------------------------

    /// Returns the input values.
    pub fn values(&self) -> &DatagridValues {
        &self.values
    }

    /// Sets one input value.
    ///
    /// Has no effect on a bound datagrid's results.
    pub fn set_value(&mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) {
        let name = name.into();
        if self.state == BindState::Bound {
            warn!(key = %name, "value set after the datagrid was bound");
        }
        self.values.set_value(name, value);
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DatagridConfig {
        &self.config
    }

    // -- binding -------------------------------------------------------------

    /// Returns the bind state.
    pub fn state(&self) -> BindState {
        self.state
    }

    /// Returns true once filters have been applied.
    pub fn is_bound(&self) -> bool {
        self.state == BindState::Bound
    }

    /// Applies filters, sorting and paging to the query, once.
    pub fn build_pager(&mut self) -> Result<()> {
        if self.state == BindState::Bound {
            return Ok(());
        }
        let mut query = self.query.take().ok_or(DatagridError::MissingQuery)?;

        self.active.clear();
        for filter in &self.filters {
            let data = self.values.filter_data(filter.name());
            if filter.apply(&mut query, data.as_ref()) {
                debug!(filter = filter.name(), "filter applied");
                self.active.push(filter.name().to_string());
            }
        }
        self.state = BindState::Bound;

        self.apply_sort(&mut query);

        if let Some(per_page) = self.values.per_page() {
            self.pager
                .set_max_per_page(self.config.resolve_per_page(Some(per_page)));
        }
        self.pager.set_page(self.values.page().unwrap_or(1));
        self.pager.set_query(query);
        self.pager.init()
    }

    fn apply_sort(&self, query: &mut Q) {
        let requested = self.values.sort_by().and_then(|field| {
            if self.config.is_sortable(field) {
                Some((field, self.values.sort_order().unwrap_or_default()))
            } else {
                warn!(field, "ignoring sort on a field that is not sortable");
                None
            }
        });

        let Some((field, order)) = requested.or_else(|| self.config.default_sort_order()) else {
            return;
        };

        let mut path: Vec<String> = field.split('.').map(str::to_string).collect();
        let name = path.pop().unwrap_or_default();
        let qualified = qualify(query, &path, &name);
        debug!(sort_by = %qualified, %order, "sorting datagrid");
        query.set_sort_by(Some(qualified));
        query.set_sort_order(order);
    }

    /// Returns the rows of the current page, binding first if needed.
    pub fn results(&mut self) -> Result<&[Q::Row]> {
        self.build_pager()?;
        self.pager.results()
    }

    /// Returns the pager.
    pub fn pager(&self) -> &Pager<Q> {
        &self.pager
    }

    /// Returns the pager mutably, for cursor and link helpers.
    pub fn pager_mut(&mut self) -> &mut Pager<Q> {
        &mut self.pager
    }

    /// Returns the query; once bound it is owned by the pager.
    pub fn query(&self) -> Option<&Q> {
        self.query.as_ref().or_else(|| self.pager.query())
    }
}

/// Assembles a [`Datagrid`] from configuration and a filter factory.
///
/// # Example
///
/// ```
/// use oxide_datagrid::{DatagridBuilder, DatagridConfig, DatagridValues, FilterOptions};
/// use oxide_datagrid::query::MemoryQuery;
/// use serde_json::json;
///
/// let rows = vec![
///     json!({"id": 1, "status": "active"}),
///     json!({"id": 2, "status": "blocked"}),
/// ];
/// let values = DatagridValues::from_query_pairs([("status", "active")]);
///
/// let mut grid = DatagridBuilder::new(MemoryQuery::new(rows))
///     .config(DatagridConfig::new().max_per_page(10))
///     .values(values)
///     .filter("status", "string", FilterOptions::new())?
///     .build()?;
///
/// assert_eq!(grid.results()?.len(), 1);
/// # Ok::<(), oxide_datagrid::DatagridError>(())
/// ```
pub struct DatagridBuilder<Q: ProxyQuery> {
    query: Q,
    config: DatagridConfig,
    factory: FilterFactory,
    filters: Vec<Box<dyn Filter>>,
    values: DatagridValues,
}

impl<Q: ProxyQuery> DatagridBuilder<Q> {
    /// Starts a datagrid over `query` with the default configuration.
    pub fn new(query: Q) -> Self {
        Self {
            query,
            config: DatagridConfig::default(),
            factory: FilterFactory::new(),
            filters: Vec::new(),
            values: DatagridValues::new(),
        }
    }

    /// Sets the configuration. Filters it declares are built by `build`.
    #[must_use]
    pub fn config(mut self, config: DatagridConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the factory used to resolve filter type keys.
    #[must_use]
    pub fn factory(mut self, factory: FilterFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Sets the input values.
    #[must_use]
    pub fn values(mut self, values: DatagridValues) -> Self {
        self.values = values;
        self
    }

    /// Adds a filter by type key, failing on unknown keys.
    pub fn filter(mut self, name: &str, type_key: &str, options: FilterOptions) -> Result<Self> {
        let filter = self.factory.create_by_key(name, type_key, options)?;
        self.filters.push(filter);
        Ok(self)
    }

    /// Adds a ready-made filter.
    #[must_use]
    pub fn add_filter<F: Filter + 'static>(mut self, filter: F) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Builds the datagrid; configured filters come before added ones.
    pub fn build(self) -> Result<Datagrid<Q>> {
        let pager = self.config.pager();
        let mut filters = Vec::with_capacity(self.config.filters.len() + self.filters.len());
        for definition in &self.config.filters {
            filters.push(self.factory.create_by_key(
                &definition.name,
                &definition.filter_type,
                definition.options.clone(),
            )?);
        }
        filters.extend(self.filters);

        let mut datagrid = Datagrid::new(self.query, pager, self.config, self.values);
        for filter in filters {
            datagrid.add_boxed_filter(filter);
        }
        Ok(datagrid)
    }
}

//! Tests for binding filters, sorting and paging through a datagrid.

mod common;
use common::*;

use std::sync::Arc;

use oxide_datagrid::query::{MemoryQuery, ProxyQuery, SqlAssociation, SqlQuery};
use oxide_datagrid::{
    BindState, Datagrid, DatagridBuilder, DatagridConfig, DatagridError, DatagridValues, Filter,
    FilterFactory, FilterOptions, Pager,
};

fn values(pairs: &[(&str, &str)]) -> DatagridValues {
    DatagridValues::from_query_pairs(pairs.iter().copied())
}

#[test]
fn status_filter_is_applied_once_before_counting() {
    let log = new_log();
    let mut grid = Datagrid::new(
        LoggedQuery::new(users(), log.clone()),
        Pager::new(10),
        DatagridConfig::new(),
        values(&[("status", "active")]),
    );
    grid.add_filter(SpyFilter::new("status", log.clone()));

    grid.build_pager().unwrap();
    assert_eq!(events(&log), vec!["apply status=active", "count"]);
    assert_eq!(grid.pager().nb_results(), 6);
}

#[test]
fn build_pager_twice_applies_filters_once() {
    let log = new_log();
    let mut grid = Datagrid::new(
        LoggedQuery::new(users(), log.clone()),
        Pager::new(10),
        DatagridConfig::new(),
        values(&[("status", "active")]),
    );
    grid.add_filter(SpyFilter::new("status", log.clone()));

    assert_eq!(grid.state(), BindState::Unbound);
    grid.build_pager().unwrap();
    grid.build_pager().unwrap();
    grid.results().unwrap();
    grid.results().unwrap();
    assert!(grid.is_bound());

    let applies = events(&log)
        .iter()
        .filter(|e| e.starts_with("apply"))
        .count();
    assert_eq!(applies, 1);
    assert_eq!(events(&log).iter().filter(|e| *e == "execute").count(), 1);
}

#[test]
fn filters_without_input_are_pass_through() {
    let log = new_log();
    let mut grid = Datagrid::new(
        LoggedQuery::new(users(), log.clone()),
        Pager::new(0),
        DatagridConfig::new(),
        DatagridValues::new(),
    );
    grid.add_filter(SpyFilter::new("status", log.clone()));

    assert!(!grid.has_active_filters());
    assert_eq!(grid.results().unwrap().len(), 12);
    assert!(grid.applied_filters().is_empty());
    assert_eq!(grid.pager().page(), 0);
}

#[test]
fn builder_resolves_type_keys() {
    let mut grid = DatagridBuilder::new(MemoryQuery::new(users()))
        .values(values(&[
            ("status[type]", "not_equal"),
            ("status[value]", "blocked"),
            ("age[type]", "gt"),
            ("age[value]", "24"),
        ]))
        .filter(
            "status",
            "choice",
            FilterOptions::new()
                .choice("active", "Active")
                .choice("blocked", "Blocked")
                .choice("pending", "Pending"),
        )
        .unwrap()
        .filter("age", "number", FilterOptions::new())
        .unwrap()
        .build()
        .unwrap();

    assert!(grid.has_active_filters());
    assert_eq!(ids(grid.results().unwrap()), vec![5, 7, 8, 9, 11, 12]);
    assert_eq!(grid.applied_filters(), ["status".to_string(), "age".to_string()]);
}

#[test]
fn builder_rejects_unknown_type() {
    let err = DatagridBuilder::new(MemoryQuery::new(users()))
        .filter("where", "geo", FilterOptions::new())
        .err()
        .unwrap();
    assert!(matches!(err, DatagridError::UnknownFilterType(_)));
}

#[test]
fn configured_filters_and_custom_factory() {
    let config = DatagridConfig::from_json(
        r#"{
            "max_per_page": 2,
            "filters": [
                {"name": "team", "type": "model", "options": {"association_path": ["team"]}},
                {"name": "name", "type": "string"}
            ]
        }"#,
    )
    .unwrap();

    let mut grid = DatagridBuilder::new(MemoryQuery::new(users()))
        .config(config)
        .values(values(&[("team", "2"), ("name", "user 0"), ("_page", "2")]))
        .build()
        .unwrap();

    let names: Vec<&str> = grid.filters().map(|f| f.name()).collect();
    assert_eq!(names, ["team", "name"]);
    assert_eq!(ids(grid.results().unwrap()), vec![8]);
    assert_eq!(grid.pager().nb_results(), 3);
    assert_eq!(grid.pager().last_page(), 2);

    let factory = FilterFactory::new().register("string", |name, _options| {
        Ok(Box::new(SpyFilter::new(name, new_log())) as Box<dyn Filter>)
    });
    let grid = DatagridBuilder::new(MemoryQuery::new(users()))
        .factory(factory)
        .filter("name", "string", FilterOptions::new())
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(grid.filter("name").map(|f| f.label()), Some("Name".to_string()));
}

#[test]
fn sorting_is_restricted_to_sortable_fields() {
    let config = DatagridConfig::new()
        .max_per_page(3)
        .sortable_fields(&["age", "team.name"])
        .default_sort("-id");

    let mut grid = DatagridBuilder::new(MemoryQuery::new(users()))
        .config(config.clone())
        .values(values(&[("_sort_by", "age"), ("_sort_order", "DESC")]))
        .build()
        .unwrap();
    assert_eq!(ids(grid.results().unwrap()), vec![12, 11, 10]);

    let mut grid = DatagridBuilder::new(MemoryQuery::new(users()))
        .config(config.clone())
        .values(values(&[("_sort_by", "password")]))
        .build()
        .unwrap();
    assert_eq!(ids(grid.results().unwrap()), vec![12, 11, 10]);
    let sort_by = grid.query().and_then(|q| q.sort_by().map(str::to_string));
    assert_eq!(sort_by.as_deref(), Some("o.id"));

    let mut grid = DatagridBuilder::new(MemoryQuery::new(users()))
        .config(config)
        .values(values(&[("_sort_by", "team.name")]))
        .build()
        .unwrap();
    grid.build_pager().unwrap();
    let sort_by = grid.query().and_then(|q| q.sort_by().map(str::to_string));
    assert_eq!(sort_by.as_deref(), Some("team.name"));
    // users without a team sort first
    assert_eq!(ids(grid.results().unwrap()), vec![3, 6, 9]);
}

#[test]
fn per_page_must_be_an_allowed_option() {
    let build = |per_page: &str| {
        let mut grid = DatagridBuilder::new(MemoryQuery::new(users()))
            .config(DatagridConfig::new().max_per_page(5).per_page_options(&[5, 10]))
            .values(values(&[("_per_page", per_page)]))
            .build()
            .unwrap();
        grid.build_pager().unwrap();
        grid.pager().max_per_page()
    };
    assert_eq!(build("10"), 10);
    assert_eq!(build("7"), 5);
    assert_eq!(build("lots"), 5);
}

#[test]
fn filter_registry_operations() {
    let log = new_log();
    let mut grid = Datagrid::new(
        MemoryQuery::new(users()),
        Pager::new(10),
        DatagridConfig::new(),
        DatagridValues::new(),
    );
    grid.add_filter(SpyFilter::new("a", log.clone()));
    grid.add_filter(SpyFilter::new("b", log.clone()));
    grid.add_filter(SpyFilter::new("c", log.clone()));
    grid.add_filter(SpyFilter::new("a", log.clone()));

    let names = |grid: &Datagrid<MemoryQuery<serde_json::Value>>| {
        grid.filters().map(|f| f.name().to_string()).collect::<Vec<_>>()
    };
    assert_eq!(names(&grid), ["a", "b", "c"]);

    grid.reorder_filters(&["c", "missing", "a"]);
    assert_eq!(names(&grid), ["c", "a", "b"]);

    assert!(grid.remove_filter("a").is_some());
    assert!(!grid.has_filter("a"));
    assert!(grid.remove_filter("a").is_none());

    grid.set_value("b", "x");
    assert!(grid.has_active_filters());
    grid.results().unwrap();
    assert_eq!(events(&log), vec!["apply c=", "apply b=x"]);
}

#[test]
fn association_filter_renders_sql() {
    let executor = Arc::new(RecordingExecutor::with_total(42));
    let query = SqlQuery::with_executor(executor.clone(), "users")
        .association("team", SqlAssociation::new("teams", "team_id", "id"));

    let mut grid = DatagridBuilder::new(query)
        .config(DatagridConfig::new().max_per_page(10).sortable_fields(&["team.name"]))
        .values(values(&[
            ("team_name", "core"),
            ("_sort_by", "team.name"),
            ("_page", "3"),
        ]))
        .filter(
            "team_name",
            "string",
            FilterOptions::new().association_path(&["team"]).field_name("name"),
        )
        .unwrap()
        .build()
        .unwrap();
    grid.results().unwrap();

    assert_eq!(
        executor.statements(),
        vec![
            "SELECT COUNT(DISTINCT o.id) FROM users o \
             LEFT JOIN teams s_team ON o.team_id = s_team.id \
             WHERE LOWER(s_team.name) LIKE ?"
                .to_string(),
            "SELECT DISTINCT o.* FROM users o \
             LEFT JOIN teams s_team ON o.team_id = s_team.id \
             WHERE LOWER(s_team.name) LIKE ? \
             ORDER BY s_team.name ASC LIMIT 10 OFFSET 20"
                .to_string(),
        ]
    );
    assert_eq!(grid.pager().last_page(), 5);
    assert_eq!(grid.pager_mut().links(Some(3)), vec![2, 3, 4]);
}

#[test]
fn huge_page_input_does_not_overflow() {
    let page = i64::MAX.to_string();

    let mut grid = DatagridBuilder::new(MemoryQuery::<serde_json::Value>::new(Vec::new()))
        .values(values(&[("_page", page.as_str())]))
        .build()
        .unwrap();
    assert!(grid.results().unwrap().is_empty());
    assert_eq!(grid.pager().page(), 1);
    assert_eq!(grid.pager().first_indice(), 1);
    assert_eq!(grid.pager().last_indice(), 0);

    let mut grid = DatagridBuilder::new(MemoryQuery::new(users()))
        .config(DatagridConfig::new().max_per_page(5).simple_pager(1))
        .values(values(&[("_page", "1e30")]))
        .build()
        .unwrap();
    assert!(grid.results().unwrap().is_empty());
    assert_eq!(grid.pager().nb_results(), 0);
    assert_eq!(grid.pager().last_indice(), 0);
}

use std::collections::BTreeSet;

use chrono::Utc;
use debug_log::filter::{accept, passes_filters};
use debug_log::{Config, Event, Filters, Level, Location};
use proptest::prelude::*;

const MODULES: [&str; 3] = ["app::net", "app::db", "app::ui"];
const FUNCTIONS: [&str; 3] = ["connect", "query", "render"];
const TAGS: [&str; 4] = ["a", "b", "c", "d"];

fn level() -> impl Strategy<Value = Level> {
    prop::sample::select(Level::ALL.to_vec())
}

fn subset(items: &'static [&'static str]) -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set(prop::sample::select(items.to_vec()), 0..=items.len())
        .prop_map(|set| set.into_iter().map(str::to_string).collect())
}

fn filters() -> impl Strategy<Value = Filters> {
    (
        prop::collection::btree_set(level(), 0..=3),
        subset(&MODULES),
        subset(&FUNCTIONS),
        subset(&TAGS),
    )
        .prop_map(|(levels, modules, functions, tags)| Filters {
            levels,
            modules,
            functions,
            tags,
        })
}

fn event() -> impl Strategy<Value = Event> {
    (
        level(),
        prop::sample::select(MODULES.to_vec()),
        prop::sample::select(FUNCTIONS.to_vec()),
        subset(&TAGS),
    )
        .prop_map(|(level, module, function, tags)| Event {
            timestamp: Utc::now(),
            level,
            message: "m".to_string(),
            tags,
            location: Location::new("src/app.rs", 1, module, function),
            stack: None,
        })
}

proptest! {
    #[test]
    fn accepts_iff_every_active_dimension_matches(ev in event(), f in filters()) {
        let (event, filters) = (ev, f);
        let expected = (filters.levels.is_empty() || filters.levels.contains(&event.level))
            && (filters.modules.is_empty() || filters.modules.contains(event.location.module))
            && (filters.functions.is_empty() || filters.functions.contains(event.location.function))
            && (filters.tags.is_empty() || event.tags.iter().any(|t| filters.tags.contains(t)));

        prop_assert_eq!(passes_filters(&event, &filters), expected);

        let config = Config { filters: filters.clone(), ..Config::default() };
        prop_assert_eq!(accept(&event, &config), expected);
    }

    #[test]
    fn empty_filters_accept_all(ev in event()) {
        prop_assert!(accept(&ev, &Config::default()));
    }
}

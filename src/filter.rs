use crate::config::{Config, Filters};
use crate::event::Event;

/// Decide whether `event` proceeds to formatting and the sinks.
///
/// Pure: no side effects, never fails. The event's tags are expected to be
/// merged with the configured default tags already.
pub fn accept(event: &Event, config: &Config) -> bool {
    config.enabled_levels.contains(&event.level)
        && (config.whitelist.is_empty() || config.whitelist.contains(event.location.module))
        && passes_filters(event, &config.filters)
}

/// Every non-empty dimension must match.
pub fn passes_filters(event: &Event, filters: &Filters) -> bool {
    (filters.levels.is_empty() || filters.levels.contains(&event.level))
        && (filters.modules.is_empty() || filters.modules.contains(event.location.module))
        && (filters.functions.is_empty() || filters.functions.contains(event.location.function))
        && (filters.tags.is_empty() || !filters.tags.is_disjoint(&event.tags))
}

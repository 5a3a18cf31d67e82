//! Relationship analysis for layout computation.

use std::collections::BTreeMap;

use crate::model::TableMap;

/// Relationship depth per table: referenced tables sit at level 0 and each
/// referencing table one level below the deepest table it references.
///
/// Self references are ignored. Cycles cannot push a level past
/// `tables.len() - 1`, so the relaxation always terminates.
pub fn build_table_levels(tables: &TableMap) -> BTreeMap<&str, usize> {
    let mut levels: BTreeMap<&str, usize> = tables.keys().map(|k| (k.as_str(), 0)).collect();
    let cap = tables.len().saturating_sub(1);

    for _ in 0..tables.len() {
        let mut changed = false;

        for table in tables.values() {
            let mut level = levels[table.name.as_str()];
            for target in table.referenced_tables() {
                if target == table.name {
                    continue;
                }
                if let Some(&target_level) = levels.get(target) {
                    level = level.max((target_level + 1).min(cap));
                }
            }
            if level != levels[table.name.as_str()] {
                levels.insert(table.name.as_str(), level);
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }

    levels
}

/// Group table names by level. Both levels and members come out sorted.
pub fn group_by_level<'a>(
    levels: &BTreeMap<&'a str, usize>,
    include: impl Fn(&str) -> bool,
) -> BTreeMap<usize, Vec<&'a str>> {
    let mut grouped: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
    for (&name, &level) in levels {
        if include(name) {
            grouped.entry(level).or_default().push(name);
        }
    }
    grouped
}

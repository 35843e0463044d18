//! Read-side projection of the cache: role filter, username search and sort.
//!
//! Nothing here mutates the cache. The visible rows are recomputed from the
//! cached records and the current `ViewParams` on every call.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::api::{Role, User};

/// Column the table is sorted by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    Username,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortSpec {
    pub column: SortColumn,
    pub order: SortOrder,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            column: SortColumn::Id,
            order: SortOrder::Ascending,
        }
    }
}

impl SortSpec {
    /// Header click: the active column flips direction, another column starts ascending.
    pub fn click(&mut self, column: SortColumn) {
        if self.column == column {
            self.order = self.order.flipped();
        } else {
            self.column = column;
            self.order = SortOrder::Ascending;
        }
    }
}

/// Transient filter, search and sort state for the table.
#[derive(Clone, Debug, Default)]
pub struct ViewParams {
    pub roles: BTreeSet<Role>,
    pub query: String,
    pub sort: SortSpec,
}

impl ViewParams {
    /// Add `role` to the selected set, or remove it if already selected.
    pub fn toggle_role(&mut self, role: Role) {
        if !self.roles.remove(&role) {
            self.roles.insert(role);
        }
    }

    pub fn clear_roles(&mut self) {
        self.roles.clear();
    }

    pub fn clear_query(&mut self) {
        self.query.clear();
    }

    /// Role filter: an empty selection lets everything through.
    pub fn role_matches(&self, user: &User) -> bool {
        self.roles.is_empty() || self.roles.contains(&user.role)
    }

    /// Username search: case-sensitive substring containment.
    pub fn query_matches(&self, user: &User) -> bool {
        user.username.contains(self.query.as_str())
    }
}

/// Records that pass the role filter and then the search, in display order.
pub fn visible<'a>(records: &'a [User], params: &ViewParams) -> Vec<&'a User> {
    let mut rows: Vec<&User> = records
        .iter()
        .filter(|u| params.role_matches(u))
        .filter(|u| params.query_matches(u))
        .collect();
    sort_rows(&mut rows, params.sort);
    rows
}

/// Stable sort so equal keys keep their cache order.
pub fn sort_rows(rows: &mut [&User], sort: SortSpec) {
    rows.sort_by(|a, b| {
        let ord = match sort.column {
            SortColumn::Id => a.id.cmp(&b.id),
            SortColumn::Username => locale_cmp(&a.username, &b.username),
        };
        match sort.order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    });
}

/// Dictionary-style comparison: case folds first, exact bytes break ties.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}

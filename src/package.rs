//! The package record data model (§3 PackageRecord) and the fixed category
//! name table carried over from the registry's `CategoryID` enumeration.
use std::cmp::Ordering;

/// Index into `CATEGORY_NAMES`; `CategoryID` on the wire is 1-based, so slot
/// `0` is an unused placeholder (the original's `aur_cat[]` table keeps a
/// `NULL` there for the same reason) and `CATEGORY_NAMES[v] == aur_cat[v]`
/// for every valid `v`. Out-of-range collapses to `"None"`.
pub const CATEGORY_NAMES: &[&str] = &[
    "None",
    "None",
    "daemons",
    "devel",
    "editors",
    "emulators",
    "games",
    "gnome",
    "i18n",
    "kde",
    "lib",
    "modules",
    "multimedia",
    "network",
    "office",
    "science",
    "system",
    "x11",
    "xfce",
    "kernels",
];

pub fn category_name(category_id: i64) -> &'static str {
    CATEGORY_NAMES
        .get(category_id as usize)
        .copied()
        .unwrap_or("None")
}

/// One registry record, as assembled by the streaming JSON sink (C2) or by
/// the local-DB adapter's `Installed` lookup. List fields are only populated
/// when `extendedInfo` triggers a recipe fetch (§4.1/§4.3).
#[derive(Clone, Debug, Default)]
pub struct PackageRecord {
    pub id: i64,
    pub name: String,
    pub version: String,
    pub category_id: i64,
    pub description: String,
    pub url: String,
    pub url_path: String,
    pub license: String,
    pub maintainer: Option<String>,
    pub num_votes: i64,
    pub out_of_date: bool,
    pub first_submitted: i64,
    pub last_modified: i64,

    pub depends: Vec<String>,
    pub makedepends: Vec<String>,
    pub optdepends: Vec<String>,
    pub provides: Vec<String>,
    pub conflicts: Vec<String>,
    pub replaces: Vec<String>,
}

impl PackageRecord {
    pub fn category_name(&self) -> &'static str {
        category_name(self.category_id)
    }

    pub fn maintainer_display(&self) -> &str {
        self.maintainer.as_deref().unwrap_or("(orphan)")
    }

    /// `name` is compared byte-for-byte, matching the registry's ASCII
    /// `strcmp` insertion order (C2) and the aggregator's final sort (C8).
    pub fn cmp_by_name(&self, other: &PackageRecord) -> Ordering {
        self.name.as_bytes().cmp(other.name.as_bytes())
    }

    /// Insert into a list kept sorted by `cmp_by_name`, as the streaming
    /// sink does on every inner-object-end (§3 Parser state, §4.2).
    pub fn insert_sorted(list: &mut Vec<PackageRecord>, record: PackageRecord) {
        let pos = list
            .binary_search_by(|probe| probe.cmp_by_name(&record))
            .unwrap_or_else(|pos| pos);
        list.insert(pos, record);
    }
}

//! Result aggregator (C8): joins every worker's partial record list,
//! narrows it by each search target's regex in turn, sorts by name, and
//! coalesces equal-name duplicates.
use crate::package::PackageRecord;
use crate::search::compile_filter;

/// Concatenate `partials`, then for a `search` op narrow the list once per
/// entry in `search_targets`, in order — each target's regex is applied
/// against whatever survived the previous one, rather than each target
/// filtering the original list independently (the source behavior: a
/// multi-target search is a conjunction, not a union). Finally sort by name
/// and drop any record whose name equals its predecessor's.
pub fn aggregate(partials: Vec<Vec<PackageRecord>>, search_targets: &[String]) -> Vec<PackageRecord> {
    let mut all: Vec<PackageRecord> = partials.into_iter().flatten().collect();

    for target in search_targets {
        match compile_filter(target) {
            Some(re) => all.retain(|pkg| re.is_match(&pkg.name) || re.is_match(&pkg.description)),
            // A target that fails to compile silently drops its records
            // (§4.9, §9): the source behavior, preserved rather than
            // promoted to a hard error.
            None => all.clear(),
        }
    }

    all.sort_by(|a, b| a.cmp_by_name(b));
    all.dedup_by(|a, b| a.name == b.name);
    all
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(name: &str, description: &str) -> PackageRecord {
        PackageRecord {
            name: name.to_string(),
            description: description.to_string(),
            ..PackageRecord::default()
        }
    }

    #[test]
    fn joins_sorts_and_dedupes() {
        let partials = vec![
            vec![pkg("zeta", ""), pkg("alpha", "")],
            vec![pkg("alpha", ""), pkg("beta", "")],
        ];
        let out = aggregate(partials, &[]);
        let names: Vec<&str> = out.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta", "zeta"]);
    }

    #[test]
    fn search_filter_checks_name_and_description() {
        let partials = vec![vec![
            pkg("firefox", "a web browser"),
            pkg("thunderbird", "an email client"),
        ]];
        let out = aggregate(partials, &["browser".to_string()]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "firefox");
    }

    #[test]
    fn multiple_search_targets_narrow_cumulatively() {
        let partials = vec![vec![
            pkg("firefox-nightly", "a web browser"),
            pkg("firefox-esr", "a stable web browser"),
            pkg("thunderbird", "an email client"),
        ]];
        let out = aggregate(partials, &["firefox".to_string(), "nightly".to_string()]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "firefox-nightly");
    }

    #[test]
    fn invalid_search_regex_drops_everything() {
        let partials = vec![vec![pkg("firefox", "")]];
        let out = aggregate(partials, &["a(b".to_string()]);
        assert!(out.is_empty());
    }
}

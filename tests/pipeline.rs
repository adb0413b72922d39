//! End-to-end exercise of the non-networked parts of the pipeline: a
//! registry JSON response feeds the streaming sink, the resulting records
//! run through the aggregator, and a PKGBUILD body feeds the recipe
//! parser, same as a worker would chain them internally.
use corral::aggregate::aggregate;
use corral::json_sink::{JsonScanner, PackageListBuilder};
use corral::recipe::parse_recipe;

#[test]
fn search_response_survives_aggregation() {
    let body = r#"{"type":"search","resultcount":2,"results":[
        {"ID":2,"Name":"zeta-tool","Version":"2.0-1","CategoryID":15,
         "Description":"a zeta utility","URL":"https://example.com/zeta",
         "URLPath":"/packages/ze/zeta-tool/zeta-tool.tar.gz","License":"GPL",
         "Maintainer":"carol","NumVotes":3,"OutOfDate":0,
         "FirstSubmitted":100,"LastModified":200},
        {"ID":1,"Name":"alpha-tool","Version":"1.0-1","CategoryID":2,
         "Description":"an alpha utility","URL":"https://example.com/alpha",
         "URLPath":"/packages/al/alpha-tool/alpha-tool.tar.gz","License":"MIT",
         "Maintainer":"","NumVotes":10,"OutOfDate":1,
         "FirstSubmitted":50,"LastModified":150}
    ]}"#;

    let mut scanner = JsonScanner::new();
    let mut builder = PackageListBuilder::new(false);
    scanner.feed(body.as_bytes(), &mut builder).unwrap();
    scanner.finish(&mut builder).unwrap();
    assert!(!builder.is_error_doc());

    let records = aggregate(vec![builder.into_packages()], &[]);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "alpha-tool");
    assert_eq!(records[0].maintainer_display(), "(orphan)");
    assert!(records[0].out_of_date);
    assert_eq!(records[1].name, "zeta-tool");
    assert_eq!(records[1].category_name(), "science");
}

#[test]
fn recipe_dependencies_feed_download_followup() {
    let pkgbuild = r#"
pkgname=zeta-tool
pkgver=2.0
pkgrel=1
depends=('glibc' 'zeta-lib>=2.0')
makedepends=('cmake' 'ninja')
optdepends=('zeta-plugins: extra format support')
"#;
    let fields = parse_recipe(pkgbuild);
    assert_eq!(fields.depends, vec!["glibc", "zeta-lib>=2.0"]);
    assert_eq!(fields.makedepends, vec!["cmake", "ninja"]);
    assert_eq!(fields.optdepends, vec!["zeta-plugins: extra format support"]);
}

#[test]
fn error_document_is_flagged_and_empty() {
    let body = r#"{"type":"error","error":"Incorrect request type specified."}"#;
    let mut scanner = JsonScanner::new();
    let mut builder = PackageListBuilder::new(false);
    scanner.feed(body.as_bytes(), &mut builder).unwrap();
    scanner.finish(&mut builder).unwrap();
    assert!(builder.is_error_doc());
    assert!(builder.into_packages().is_empty());
}

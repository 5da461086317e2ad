use sieve_core::ReviewConfig;
use sieve_difflens::filter::{PathFilter, SkipReason};
use sieve_difflens::parser::parse_unified_diff;

const FIXTURE: &str = include_str!("fixtures/two_files.diff");

#[test]
fn fixture_splits_into_files_with_own_text() {
    let files = parse_unified_diff(FIXTURE).unwrap();
    assert_eq!(files.len(), 2);

    let db = &files[0];
    assert_eq!(db.path(), "app/db.py");
    assert_eq!(db.added_lines(), vec![4, 5]);
    assert!(db.text.contains("+    return conn.execute(query)"));
    assert!(!db.text.contains("poetry.lock"));

    assert_eq!(files[1].path(), "poetry.lock");
}

#[test]
fn filter_keeps_only_reviewable_sources() {
    let files = parse_unified_diff(FIXTURE).unwrap();
    let filter = PathFilter::from_config(&ReviewConfig {
        target_extensions: vec!["py".into()],
        ..ReviewConfig::default()
    });

    let kept: Vec<&str> = files
        .iter()
        .filter(|f| filter.should_review(f.path()))
        .map(|f| f.path())
        .collect();
    assert_eq!(kept, vec!["app/db.py"]);
    assert_eq!(filter.check("poetry.lock"), Some(SkipReason::LockFile));
}

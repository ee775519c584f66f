use chrono::{Duration, TimeZone, Utc};
use mdq::query::coerce::parse_duration;
use mdq::query::{parse, tokenize, DateRange, Evaluator, Token, TokenKind};
use mdq::value::DynamicValue;
use mdq::{vault, Note};
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use std::thread;

fn fields(pairs: Vec<(&str, DynamicValue)>) -> HashMap<String, DynamicValue> {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

// ============================================================================
// Lexing
// ============================================================================

#[test]
fn test_tokenize_equality() {
    assert_eq!(
        tokenize(r#"status = "draft""#),
        vec![
            Token::new(TokenKind::Identifier, "status", 0),
            Token::new(TokenKind::Operator, "=", 7),
            Token::new(TokenKind::String, "draft", 9),
            Token::new(TokenKind::Eof, "", 16),
        ]
    );
}

#[test]
fn test_tokenize_contains() {
    assert_eq!(
        tokenize(r#"tags contains "urgent""#),
        vec![
            Token::new(TokenKind::Identifier, "tags", 0),
            Token::new(TokenKind::Keyword, "contains", 5),
            Token::new(TokenKind::String, "urgent", 14),
            Token::new(TokenKind::Eof, "", 22),
        ]
    );
}

// ============================================================================
// Precedence
// ============================================================================

#[test]
fn test_and_binds_tighter_than_or() {
    let expr = parse(r#"status = "draft" OR priority > 5 AND tags contains "urgent""#).unwrap();
    let fm = fields(vec![
        ("status", "published".into()),
        ("priority", DynamicValue::Integer(3)),
        ("tags", vec!["urgent"].into()),
    ]);
    assert!(!expr.evaluate(&fm));
}

#[test]
fn test_not_binds_tighter_than_and() {
    let expr = parse(r#"NOT status = "archived" AND priority > 3"#).unwrap();
    let fm = fields(vec![("status", "draft".into()), ("priority", DynamicValue::Integer(5))]);
    assert!(expr.evaluate(&fm));
}

#[test]
fn test_parentheses_override_precedence() {
    let expr = parse(r#"(priority > 3 OR status = "urgent") AND tags contains "active""#).unwrap();
    let fm = fields(vec![
        ("priority", DynamicValue::Integer(5)),
        ("status", "draft".into()),
        ("tags", vec!["active", "work"].into()),
    ]);
    assert!(expr.evaluate(&fm));
}

#[test]
fn test_reparsing_is_stable() {
    let queries = [
        r#"status = "draft" OR priority > 5 AND tags contains "urgent""#,
        r#"NOT NOT done"#,
        r#"created between "2024-01-01,2024-12-31" AND title starts_with "a""#,
    ];
    let fixtures = [
        fields(vec![("status", "draft".into())]),
        fields(vec![("done", DynamicValue::Boolean(false))]),
        fields(vec![("created", "2024-05-05".into()), ("title", "Alpha".into())]),
    ];
    let evaluator = Evaluator::at(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());

    for query in queries {
        let first = parse(query).unwrap();
        let second = parse(query).unwrap();
        assert_eq!(first, second);
        for fm in &fixtures {
            assert_eq!(evaluator.evaluate(&first, fm), evaluator.evaluate(&second, fm));
        }
    }
}

// ============================================================================
// Evaluation
// ============================================================================

#[test]
fn test_field_existence() {
    let present = fields(vec![("title", "".into())]);
    let absent = fields(vec![]);
    let expr = parse("title").unwrap();
    assert!(expr.evaluate(&present));
    assert!(!expr.evaluate(&absent));
}

#[test]
fn test_date_comparison() {
    let expr = parse(r#"created after "2024-01-01""#).unwrap();
    assert!(expr.evaluate(&fields(vec![("created", "2024-06-15".into())])));
    assert!(!expr.evaluate(&fields(vec![("created", "2023-06-15".into())])));
}

#[test]
fn test_between_inclusive() {
    let expr = parse(r#"priority between "1,5""#).unwrap();
    for (priority, expected) in [(1, true), (5, true), (3, true), (7, false)] {
        let fm = fields(vec![("priority", DynamicValue::Integer(priority))]);
        assert_eq!(expr.evaluate(&fm), expected, "priority = {}", priority);
    }
}

#[test]
fn test_duration_parsing() {
    assert_eq!(parse_duration("30 minutes"), Ok(Duration::minutes(30)));
    assert_eq!(parse_duration("2 hours"), Ok(Duration::hours(2)));
    assert_eq!(parse_duration("7 days"), Ok(Duration::hours(7 * 24)));
    assert_eq!(
        parse_duration("2h30m"),
        Ok(Duration::hours(2) + Duration::minutes(30))
    );
    assert!(parse_duration("invalid").is_err());
}

#[test]
fn test_two_within_forms_differ() {
    let now = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
    let evaluator = Evaluator::at(now);
    let query = parse(r#"created within "2 days""#).unwrap();
    let range = DateRange::new("created").within(Duration::days(2));

    let tomorrow = fields(vec![("created", "2024-06-16".into())]);
    assert!(evaluator.evaluate(&query, &tomorrow));
    assert!(range.matches(&tomorrow, now));

    let next_week = fields(vec![("created", "2024-06-22".into())]);
    assert!(evaluator.evaluate(&query, &next_week));
    assert!(!range.matches(&next_week, now));

    let three_days_ago = fields(vec![("created", "2024-06-12".into())]);
    assert!(!evaluator.evaluate(&query, &three_days_ago));
    assert!(!range.matches(&three_days_ago, now));
}

#[test]
fn test_shared_tree_across_threads() {
    let expr = Arc::new(parse(r#"priority >= 3 AND tags contains "rust""#).unwrap());
    let fm = Arc::new(fields(vec![
        ("priority", DynamicValue::Integer(4)),
        ("tags", vec!["Rust", "cli"].into()),
    ]));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let expr = Arc::clone(&expr);
            let fm = Arc::clone(&fm);
            thread::spawn(move || (0..100).all(|_| expr.evaluate(&*fm)))
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

// ============================================================================
// Notes on disk
// ============================================================================

#[test]
fn test_filter_vault() {
    let dir = tempfile::tempdir().unwrap();
    let write = |name: &str, content: &str| fs::write(dir.path().join(name), content).unwrap();
    write("a.md", "---\nstatus: draft\npriority: 4\ntags: [urgent]\n---\n# A\n");
    write("b.md", "---\nstatus: published\npriority: 9\n---\n# B\n");
    write("c.md", "# No frontmatter\n");

    let files = vault::collect_markdown_files(dir.path(), &[]).unwrap();
    assert_eq!(files.len(), 3);
    let notes: Vec<Note> = files
        .iter()
        .filter_map(|path| Note::load(path).unwrap())
        .collect();
    assert_eq!(notes.len(), 2);

    let expr = parse(r#"status = "draft" AND tags contains "URGENT" OR priority > 8"#).unwrap();
    let mut matched: Vec<String> = notes
        .iter()
        .filter(|note| expr.evaluate(*note))
        .map(|note| note.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    matched.sort();
    assert_eq!(matched, vec!["a.md", "b.md"]);
}

/*!
 * Tests for extraction and the global text pool across units
 */

use lingosplice::extraction::{JsLiteralScanner, ReplacementMark, TargetScript, TextExtractor};
use lingosplice::translation::TextPool;

fn extract(path: &str, source: &str) -> Vec<ReplacementMark> {
    TextExtractor::new(TargetScript::han(), "$t")
        .extract_source(&JsLiteralScanner::new(), path, source)
        .unwrap()
}

/// Test that a text shared by two units gets one id
#[test]
fn test_pool_withSharedTextAcrossUnits_shouldAssignOneId() {
    let first = extract("a.js", r#"alert("确定"); title = '你好';"#);
    let second = extract("b.js", r#"confirm(`确定`);"#);

    let mut pool = TextPool::new();
    pool.add_marks(&first);
    pool.add_marks(&second);
    assert_eq!(pool.first_seen(), &["确定".to_string(), "你好".to_string()]);

    let pool = pool.canonicalize();
    assert_eq!(pool.len(), 2);
    assert_eq!(pool.placeholder_id(&first[0].segments[0]).unwrap(), pool.placeholder_id(&second[0].segments[0]).unwrap());
}

/// Test that ids follow code-point order, not discovery order
#[test]
fn test_canonicalize_shouldNumberTextsByCodePoint() {
    let marks = extract("a.js", r#"x("你好"); y("世界");"#);
    let mut pool = TextPool::new();
    pool.add_marks(&marks);
    let pool = pool.canonicalize();

    // U+4E16 sorts before U+4F60
    assert_eq!(pool.placeholder_id("世界").unwrap(), "t_0");
    assert_eq!(pool.placeholder_id("你好").unwrap(), "t_1");
}

/// Test that adding files in another order keeps the same fingerprint
#[test]
fn test_fingerprint_withDifferentDiscoveryOrder_shouldMatch() {
    let a = extract("a.js", r#"x("一"); y("二");"#);
    let b = extract("b.js", r#"z("三");"#);

    let mut forward = TextPool::new();
    forward.add_marks(a.iter().chain(b.iter()));
    let mut backward = TextPool::new();
    backward.add_marks(b.iter().chain(a.iter()));

    assert_eq!(forward.canonicalize().fingerprint(), backward.canonicalize().fingerprint());
}

/// Test that mixed literals split into several runs with matching slots
#[test]
fn test_extract_withMixedLiteral_shouldProduceOneSlotPerRun() {
    let marks = extract("a.js", r#"msg = "共3条,已选择12项";"#);

    assert_eq!(marks.len(), 1);
    assert_eq!(marks[0].segments, vec!["共", "条", "已选择", "项"]);
    assert_eq!(marks[0].template.slot_count(), 4);
}

/// Test that literals without Han text produce no marks
#[test]
fn test_extract_withAsciiOnlySource_shouldProduceNothing() {
    let marks = extract("a.js", r#"const a = "hello"; const b = `x${y}z`;"#);
    assert!(marks.is_empty());
}

/*!
 * End-to-end tests of the translation pipeline
 */

use std::collections::BTreeMap;
use std::sync::Arc;

use lingosplice::errors::AppError;
use lingosplice::extraction::{JsLiteralScanner, TargetScript, TextExtractor};
use lingosplice::translation::cache::CACHE_FILE_NAME;
use lingosplice::translation::{PipelineOutput, TextPool, TranslationPipeline};

use crate::common::{fake_translation, pipeline_options, strings, texts_in_key_order, ScriptedCapability};

fn sources(items: &[(&str, &str)]) -> BTreeMap<String, String> {
    items
        .iter()
        .map(|(path, text)| (path.to_string(), text.to_string()))
        .collect()
}

fn asset(output: &PipelineOutput, language: &str) -> BTreeMap<String, String> {
    let file = output
        .asset_files
        .iter()
        .find(|asset| asset.language == language)
        .unwrap_or_else(|| panic!("no asset for {}", language));
    serde_json::from_str(&file.content).unwrap()
}

/// Test the full flow for two texts into English
#[tokio::test]
async fn test_run_withTwoTexts_shouldRewriteAndEmitAssets() {
    let dir = tempfile::tempdir().unwrap();
    let capability = Arc::new(ScriptedCapability::working());
    let pipeline = TranslationPipeline::new(pipeline_options(dir.path(), &["en"]), capability.clone());

    let output = pipeline
        .run(sources(&[("index.js", r#"const a = "你好"; const b = '世界';"#)]))
        .await
        .unwrap();

    assert_eq!(capability.call_count(), 1);
    assert_eq!(
        output.updated_sources["index.js"],
        r#"const a = `${$t("t_1")}`; const b = `${$t("t_0")}`;"#
    );

    let zh = asset(&output, "zh");
    assert_eq!(zh["t_0"], "世界");
    assert_eq!(zh["t_1"], "你好");
    let en = asset(&output, "en");
    assert_eq!(en["t_0"], fake_translation("en", "世界"));
    assert_eq!(en["t_1"], fake_translation("en", "你好"));

    let names: Vec<&str> = output.asset_files.iter().map(|a| a.file_name.as_str()).collect();
    assert!(names.contains(&format!("local_en_{}.json", output.fingerprint).as_str()));
    assert!(names.contains(&format!("local_zh_{}.json", output.fingerprint).as_str()));
    assert!(dir.path().join(CACHE_FILE_NAME).exists());
}

/// Test that rewritten output contains no source-script text in any literal
#[tokio::test]
async fn test_run_thenReextract_shouldFindNothing() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = TranslationPipeline::new(pipeline_options(dir.path(), &["en"]), Arc::new(ScriptedCapability::working()));

    let source = r#"
        // 注释不会被处理
        export default {
            title: "标题",
            render(n) { return `共${n}条记录，已选择${list.filter(x => x.ok).length}项`; },
            hint: cond ? '确定删除吗？' : "取消",
            label: "Name: 名字 (required)",
        };
    "#;
    let output = pipeline.run(sources(&[("app.js", source)])).await.unwrap();
    let rewritten = &output.updated_sources["app.js"];

    let marks = TextExtractor::new(TargetScript::han(), "$t")
        .extract_source(&JsLiteralScanner::new(), "app.js", rewritten)
        .unwrap();
    assert!(marks.is_empty(), "left over: {:?}", marks);
    assert!(rewritten.contains("注释不会被处理"));
    assert!(rewritten.contains("${n}"));
    assert!(rewritten.contains("list.filter(x => x.ok).length"));
}

/// Test that many marks in one unit keep every offset valid
#[tokio::test]
async fn test_run_withManyMarksInOneUnit_shouldApplyAll() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = TranslationPipeline::new(pipeline_options(dir.path(), &["en"]), Arc::new(ScriptedCapability::working()));

    let numerals = ["一", "二", "三", "四", "五", "六", "七"];
    let source: String = (0..50).map(|i| format!("f(\"第{}项\");", numerals[i % 7])).collect();
    let output = pipeline.run(sources(&[("many.js", &source)])).await.unwrap();
    let rewritten = &output.updated_sources["many.js"];

    assert_eq!(output.stats.marks, 50);
    assert_eq!(output.stats.texts, 7);
    assert_eq!(rewritten.matches("${$t(\"t_").count(), 50);
    assert!(rewritten.starts_with("f(`${$t(\"t_0\")}`);"));
    assert!(!rewritten.contains('第'));
}

/// Test that the rewrite only changes mark ranges and shifts lengths exactly
#[tokio::test]
async fn test_run_withMixedMarks_shouldPreserveBytesOutsideRanges() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = TranslationPipeline::new(pipeline_options(dir.path(), &["en"]), Arc::new(ScriptedCapability::working()));

    let source = concat!(
        "var a=\"是\",b='请输入用户名称',c=\"Name: 名字 (必填) ok\";\n",
        "f(`共${n}条记录，第${p}页`, \"x\", '错误:\\n请重试');\n",
        "if(e)/\"/.test(t);g(\"保存成功，3秒后返回\", `纯文本`);"
    );
    let output = pipeline.run(sources(&[("mixed.js", source)])).await.unwrap();
    let rewritten = &output.updated_sources["mixed.js"];

    let mut marks = TextExtractor::new(TargetScript::han(), "$t")
        .extract_source(&JsLiteralScanner::new(), "mixed.js", source)
        .unwrap();
    marks.sort_by_key(|mark| mark.start);
    assert!(marks.iter().any(|mark| mark.segments.len() > 1));

    let mut pool = TextPool::new();
    pool.add_marks(&marks);
    let pool = pool.canonicalize();
    let replacements: Vec<String> = marks
        .iter()
        .map(|mark| {
            let ids: Vec<String> = mark.segments.iter().map(|text| pool.placeholder_id(text).unwrap()).collect();
            mark.replacement(&ids)
        })
        .collect();

    let spans: usize = marks.iter().map(|mark| mark.end - mark.start).sum();
    let added: usize = replacements.iter().map(String::len).sum();
    assert_eq!(rewritten.len(), source.len() - spans + added);

    let mut from = 0;
    let mut to = 0;
    for (mark, replacement) in marks.iter().zip(&replacements) {
        let kept = &source[from..mark.start];
        assert_eq!(&rewritten[to..to + kept.len()], kept);
        to += kept.len();
        assert_eq!(&rewritten[to..to + replacement.len()], replacement.as_str());
        to += replacement.len();
        from = mark.end;
    }
    assert_eq!(&rewritten[to..], &source[from..]);
}

/// Test that a second run only asks for texts absent from the cache
#[tokio::test]
async fn test_run_secondTimeWithNewText_shouldOnlyTranslateNewText() {
    let dir = tempfile::tempdir().unwrap();

    let first = Arc::new(ScriptedCapability::working());
    TranslationPipeline::new(pipeline_options(dir.path(), &["en", "fr"]), first.clone())
        .run(sources(&[("a.js", r#"x("你好"); y("世界");"#)]))
        .await
        .unwrap();
    assert_eq!(first.call_count(), 1);

    let second = Arc::new(ScriptedCapability::working());
    let output = TranslationPipeline::new(pipeline_options(dir.path(), &["en", "fr"]), second.clone())
        .run(sources(&[("a.js", r#"x("你好"); y("世界"); z("再见");"#)]))
        .await
        .unwrap();

    assert_eq!(second.texts_sent(), vec!["再见"]);
    assert_eq!(second.recorded()[0].languages, strings(&["en", "fr"]));
    assert_eq!(output.stats.partial_languages, strings(&["en", "fr"]));

    // 世界 < 你好 < 再见 by code point
    let fr = asset(&output, "fr");
    assert_eq!(fr["t_0"], fake_translation("fr", "世界"));
    assert_eq!(fr["t_2"], fake_translation("fr", "再见"));
}

/// Test that adding a language translates the whole pool into it only
#[tokio::test]
async fn test_run_withNewLanguage_shouldTranslateFullPoolForIt() {
    let dir = tempfile::tempdir().unwrap();
    let source = sources(&[("a.js", r#"x("你好"); y("世界");"#)]);

    TranslationPipeline::new(pipeline_options(dir.path(), &["en"]), Arc::new(ScriptedCapability::working()))
        .run(source.clone())
        .await
        .unwrap();

    let capability = Arc::new(ScriptedCapability::working());
    let output = TranslationPipeline::new(pipeline_options(dir.path(), &["en", "de"]), capability.clone())
        .run(source)
        .await
        .unwrap();

    assert_eq!(capability.call_count(), 1);
    assert_eq!(capability.recorded()[0].languages, strings(&["de"]));
    assert_eq!(capability.recorded()[0].texts, strings(&["世界", "你好"]));
    assert_eq!(output.stats.full_languages, strings(&["de"]));
    assert_eq!(asset(&output, "en")["t_1"], fake_translation("en", "你好"));
}

/// Test that a cached run makes no call and keeps the same fingerprint
#[tokio::test]
async fn test_run_withEverythingCached_shouldNotCall() {
    let dir = tempfile::tempdir().unwrap();
    let source = sources(&[("a.js", r#"x("你好");"#)]);

    let first = TranslationPipeline::new(pipeline_options(dir.path(), &["en"]), Arc::new(ScriptedCapability::working()))
        .run(source.clone())
        .await
        .unwrap();

    let capability = Arc::new(ScriptedCapability::working());
    let second = TranslationPipeline::new(pipeline_options(dir.path(), &["en"]), capability.clone())
        .run(source)
        .await
        .unwrap();

    assert_eq!(capability.call_count(), 0);
    assert_eq!(first.fingerprint, second.fingerprint);
    assert_eq!(first.asset_files, second.asset_files);
}

/// Test that a failed translation leaves no cache behind
#[tokio::test]
async fn test_run_withTranslationFailure_shouldNotWriteCache() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = pipeline_options(dir.path(), &["en"]);
    options.batch.max_attempts = 2;
    let capability = Arc::new(ScriptedCapability::always_failing(500));

    let result = TranslationPipeline::new(options, capability.clone())
        .run(sources(&[("a.js", r#"x("你好");"#)]))
        .await;

    assert!(matches!(result, Err(AppError::Translation(_))));
    assert_eq!(capability.call_count(), 2);
    assert!(!dir.path().join(CACHE_FILE_NAME).exists());
}

/// Test that a failure keeps the previous cache intact
#[tokio::test]
async fn test_run_withFailureAfterSuccessfulRun_shouldKeepPreviousCache() {
    let dir = tempfile::tempdir().unwrap();
    TranslationPipeline::new(pipeline_options(dir.path(), &["en"]), Arc::new(ScriptedCapability::working()))
        .run(sources(&[("a.js", r#"x("你好");"#)]))
        .await
        .unwrap();
    let before = std::fs::read_to_string(dir.path().join(CACHE_FILE_NAME)).unwrap();

    let mut options = pipeline_options(dir.path(), &["en"]);
    options.batch.max_attempts = 1;
    let result = TranslationPipeline::new(options, Arc::new(ScriptedCapability::always_failing(500)))
        .run(sources(&[("a.js", r#"x("你好"); y("新的");"#)]))
        .await;

    assert!(result.is_err());
    let after = std::fs::read_to_string(dir.path().join(CACHE_FILE_NAME)).unwrap();
    assert_eq!(before, after);
}

/// Test that the cache only keeps languages still requested
#[tokio::test]
async fn test_run_withDroppedLanguage_shouldRemoveItFromCache() {
    let dir = tempfile::tempdir().unwrap();
    let source = sources(&[("a.js", r#"x("你好");"#)]);

    TranslationPipeline::new(pipeline_options(dir.path(), &["en", "fr"]), Arc::new(ScriptedCapability::working()))
        .run(source.clone())
        .await
        .unwrap();
    TranslationPipeline::new(pipeline_options(dir.path(), &["en"]), Arc::new(ScriptedCapability::working()))
        .run(source)
        .await
        .unwrap();

    let content = std::fs::read_to_string(dir.path().join(CACHE_FILE_NAME)).unwrap();
    let maps: BTreeMap<String, BTreeMap<String, String>> = serde_json::from_str(&content).unwrap();
    assert_eq!(maps.keys().collect::<Vec<_>>(), vec!["en", "zh"]);
    assert_eq!(texts_in_key_order(&maps["zh"]), vec!["你好"]);
}

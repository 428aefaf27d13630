/*!
 * Controller tests over a build output directory
 */

use std::fs;
use std::sync::Arc;

use lingosplice::app_config::Config;
use lingosplice::Controller;

use crate::common::{self, fake_translation, ScriptedCapability};

fn config() -> Config {
    Config {
        target_language_list: common::strings(&["en"]),
        cache_dir: ".cache".to_string(),
        retry_delay_ms: 0,
        ..Config::default()
    }
}

/// Test a run over nested files, with assets kept out of the scan
#[tokio::test]
async fn test_runWithCapability_shouldRewriteFilesAndWriteAssets() {
    let project = tempfile::tempdir().unwrap();
    let dist = project.path().join("dist");
    common::create_test_file(&dist, "index.js", r#"document.title = "首页";"#).unwrap();
    common::create_test_file(&dist, "chunks/about.mjs", r#"export const t = '关于我们';"#).unwrap();
    common::create_test_file(&dist, "vendor.js", "var x = 1;").unwrap();
    common::create_test_file(&dist, "assets/old.js", r#"var stale = "旧";"#).unwrap();

    let controller = Controller::with_config(config()).unwrap().with_base_dir(project.path());
    let capability = Arc::new(ScriptedCapability::working());
    let summary = controller.run_with_capability(dist.clone(), capability.clone()).await.unwrap();

    assert_eq!(summary.scanned_files, 3);
    assert_eq!(summary.rewritten_files.len(), 2);
    assert_eq!(summary.asset_files.len(), 2);
    assert_eq!(capability.call_count(), 1);

    let index = fs::read_to_string(dist.join("index.js")).unwrap();
    assert!(index.starts_with("document.title = `${$t(\"t_"));
    assert_eq!(fs::read_to_string(dist.join("vendor.js")).unwrap(), "var x = 1;");
    assert_eq!(fs::read_to_string(dist.join("assets/old.js")).unwrap(), r#"var stale = "旧";"#);

    let en_path = dist.join("assets").join(format!("local_en_{}.json", summary.fingerprint));
    let en: std::collections::BTreeMap<String, String> =
        serde_json::from_str(&fs::read_to_string(en_path).unwrap()).unwrap();
    assert!(en.values().any(|text| text == &fake_translation("en", "首页")));
    assert!(project.path().join(".cache").join("lang.json").exists());
}

/// Test that a missing input directory is reported
#[tokio::test]
async fn test_runWithCapability_withMissingDirectory_shouldFail() {
    let project = tempfile::tempdir().unwrap();
    let controller = Controller::with_config(config()).unwrap().with_base_dir(project.path());

    let result = controller
        .run_with_capability(project.path().join("missing"), Arc::new(ScriptedCapability::working()))
        .await;

    assert!(result.is_err());
}

/// Test that a failed run leaves the sources untouched
#[tokio::test]
async fn test_runWithCapability_withFailingProvider_shouldNotTouchSources() {
    let project = tempfile::tempdir().unwrap();
    let dist = project.path().join("dist");
    let original = r#"alert("出错了");"#;
    common::create_test_file(&dist, "index.js", original).unwrap();

    let mut config = config();
    config.max_attempts = 1;
    let controller = Controller::with_config(config).unwrap().with_base_dir(project.path());
    let result = controller
        .run_with_capability(dist.clone(), Arc::new(ScriptedCapability::always_failing(401)))
        .await;

    assert!(result.is_err());
    assert_eq!(fs::read_to_string(dist.join("index.js")).unwrap(), original);
    assert!(!dist.join("assets").exists());
}

/// Test that the full run refuses an incomplete configuration
#[tokio::test]
async fn test_run_withoutApiKey_shouldFailValidation() {
    let project = tempfile::tempdir().unwrap();
    let controller = Controller::with_config(config()).unwrap();

    let error = controller.run(project.path().to_path_buf()).await.unwrap_err();
    assert!(format!("{:#}", error).contains("aiApiKey"));
}

use serde_json::{json, Map, Value};
use std::path::Path;
use std::sync::Arc;
use stencil_context::ErrorReason;
use stencil_core::{ActionContext, ActionRegistry};
use stencil_manifest::{register_manifest_actions, ManifestExecutor, ManifestLoader};
use url::Url;

fn executor(dir: &Path) -> ManifestExecutor {
    let registry = register_manifest_actions(ActionRegistry::with_builtin_actions());
    let base = Url::from_directory_path(dir).unwrap();
    ManifestExecutor::new(ActionContext::new(Arc::new(registry), base).with_execution_id("it"))
}

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn values(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("values must be an object"),
    }
}

#[tokio::test]
async fn test_import_binds_options_and_shares_store() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "main.json",
        r#"{
  "options": {"name": {"type": "string", "required": true}},
  "actions": [
    {"name": "import", "template": "parts/greet.json", "options": {"who": "${input.name}"}},
    {"name": "define", "variables": {"seen": ["${output.greeting}"]}}
  ]
}"#,
    );
    write(
        dir.path(),
        "parts/greet.json",
        r#"{
  options: {who: {type: 'string'}},
  actions: [
    {name: 'define', variables: {'output.greeting': 'hello ${input.who}'}},
  ],
}"#,
    );

    let executor = executor(dir.path());
    let manifest = ManifestLoader::from_file(dir.path().join("main.json")).await.unwrap();
    executor
        .execute(&manifest, &values(json!({"name": "ada"})))
        .await
        .unwrap();

    let context = executor.context();
    assert_eq!(context.get("seen").await.unwrap(), json!("hello ada"));
    assert_eq!(context.get("input.who").await.unwrap(), json!("ada"));
}

#[tokio::test]
async fn test_import_resolves_nested_references_against_imported_manifest() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "main.yaml",
        "actions:\n  - name: import\n    template: nested/first.json\n",
    );
    write(
        dir.path(),
        "nested/first.json",
        r#"{"actions": [{"name": "import", "template": "second.json"}]}"#,
    );
    write(
        dir.path(),
        "nested/second.json",
        r#"{"actions": [{"name": "define", "variables": {"reached": [true]}}]}"#,
    );

    let executor = executor(dir.path());
    let manifest = ManifestLoader::from_file(dir.path().join("main.yaml")).await.unwrap();
    executor.execute(&manifest, &Map::new()).await.unwrap();

    assert_eq!(executor.context().get("reached").await.unwrap(), json!(true));
}

#[tokio::test]
async fn test_import_syntax_error_frame_points_into_imported_document() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "main.json",
        "{\n  \"actions\": [\n    {\"name\": \"import\", \"template\": \"broken.json\"}\n  ]\n}",
    );
    write(dir.path(), "broken.json", "{\n  \"actions\": [\n    {\"name\" \"print\"}\n  ]\n}");

    let executor = executor(dir.path());
    let manifest = ManifestLoader::from_file(dir.path().join("main.json")).await.unwrap();
    let error = executor.execute(&manifest, &Map::new()).await.unwrap_err();

    assert_eq!(error.reason(), ErrorReason::InvalidInput);
    assert_eq!(error.tracing().len(), 1);
    let frame = &error.tracing()[0];
    let source = frame.source.as_ref().unwrap();
    assert_eq!(frame.name, "import");
    assert!(source.url.ends_with("/broken.json"));
    assert_eq!(source.start.line, 3);
}

#[tokio::test]
async fn test_enclosing_steps_keep_their_own_location_over_syntax_errors() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "main.json",
        "{\n  \"actions\": [\n    {\"name\": \"run\", \"actions\": [\n      {\"name\": \"import\", \"template\": \"broken.json\"}\n    ]}\n  ]\n}",
    );
    write(dir.path(), "broken.json", "{\n  \"actions\": [\n    {\"name\" \"print\"}\n  ]\n}");

    let executor = executor(dir.path());
    let manifest = ManifestLoader::from_file(dir.path().join("main.json")).await.unwrap();
    let error = executor.execute(&manifest, &Map::new()).await.unwrap_err();

    let frames: Vec<_> = error
        .tracing()
        .iter()
        .map(|frame| {
            let source = frame.source.as_ref().unwrap();
            let file = source.url.rsplit('/').next().unwrap().to_string();
            (frame.name.clone(), file, source.start.line)
        })
        .collect();

    assert_eq!(
        frames,
        vec![
            ("import".to_string(), "broken.json".to_string(), 3),
            ("run".to_string(), "main.json".to_string(), 3),
        ]
    );
}

#[tokio::test]
async fn test_failure_inside_import_is_traced_through_both_documents() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "main.json",
        "{\n  \"actions\": [\n    {\"name\": \"print\", \"message\": \"start\"},\n    {\"name\": \"import\", \"template\": \"inner.json\"}\n  ]\n}",
    );
    write(
        dir.path(),
        "inner.json",
        "{\"actions\": [\n  {\"name\": \"fail\", \"message\": \"stop\", \"reason\": \"PRECONDITION\"}\n]}",
    );

    let executor = executor(dir.path());
    let manifest = ManifestLoader::from_file(dir.path().join("main.json")).await.unwrap();
    let error = executor.execute(&manifest, &Map::new()).await.unwrap_err();

    assert_eq!(error.reason(), ErrorReason::Precondition);
    let frames: Vec<_> = error
        .tracing()
        .iter()
        .map(|frame| {
            let source = frame.source.as_ref().unwrap();
            let file = source.url.rsplit('/').next().unwrap().to_string();
            (frame.name.clone(), file, source.start.line)
        })
        .collect();

    assert_eq!(
        frames,
        vec![
            ("fail".to_string(), "inner.json".to_string(), 2),
            ("import".to_string(), "main.json".to_string(), 4),
        ]
    );
}

#[tokio::test]
async fn test_missing_template_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "main.json",
        r#"{"actions": [{"name": "import", "template": "missing.json"}]}"#,
    );

    let executor = executor(dir.path());
    let manifest = ManifestLoader::from_file(dir.path().join("main.json")).await.unwrap();
    let error = executor.execute(&manifest, &Map::new()).await.unwrap_err();

    assert_eq!(error.reason(), ErrorReason::NotFound);
}

#[tokio::test]
async fn test_missing_required_option_fails_before_any_step() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "main.json",
        r#"{
  "options": {"name": {"type": "string", "required": true}},
  "actions": [{"name": "define", "variables": {"ran": [true]}}]
}"#,
    );

    let executor = executor(dir.path());
    let manifest = ManifestLoader::from_file(dir.path().join("main.json")).await.unwrap();
    let error = executor.execute(&manifest, &Map::new()).await.unwrap_err();

    assert_eq!(error.reason(), ErrorReason::InvalidInput);
    assert!(error.tracing().is_empty());
    assert!(executor.context().get("ran").await.is_err());
}

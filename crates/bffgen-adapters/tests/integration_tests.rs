//! End-to-end tests: real files in a temp directory, real ledger, built-in
//! renderers.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use bffgen_adapters::{
    BuiltinRenderer, ConfigWatcher, JsonStateStore, LocalFilesystem, WatchSettings,
};
use bffgen_core::domain::{DomainError, HttpMethod, RouteKey};
use bffgen_core::error::BffgenError;
use bffgen_core::prelude::*;
use tempfile::TempDir;

const USERS: &str = r#"
services:
  users:
    baseUrl: http://localhost:4000
    endpoints:
      - name: list-users
        path: /users
        method: GET
        exposeAs: /api/users
"#;

fn regenerator(root: &Path, mode: GenerationMode) -> Regenerator {
    let fs: Arc<dyn Filesystem> = Arc::new(LocalFilesystem::new());
    Regenerator::new(
        ConfigLoader::new(fs.clone()),
        Generator::new(
            fs.clone(),
            root,
            GeneratorOptions {
                mode,
                backup_dir: Some(".bffgen/backup".into()),
                ..GeneratorOptions::default()
            },
        ),
        Box::new(BuiltinRenderer::new()),
        Box::new(JsonStateStore::new(fs, root)),
        RegenerationOptions::default(),
    )
}

fn users_route() -> RouteKey {
    RouteKey::new("users", HttpMethod::Get, "/api/users")
}

#[test]
fn users_scenario_end_to_end() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("bff.config.yaml");
    fs::write(&config, USERS).unwrap();

    // first run creates the files and tracks the route
    let regen = regenerator(dir.path(), GenerationMode::Write);
    let mut state = regen.load_state().unwrap();
    let report = regen.regenerate(&config, &mut state).unwrap();

    assert!(report.is_success());
    assert_eq!(report.new_routes, vec![users_route()]);
    assert!(
        report
            .outcomes
            .iter()
            .all(|o| o.status == FileStatus::Created)
    );
    let main_go = fs::read_to_string(dir.path().join("cmd/server/main.go")).unwrap();
    assert!(main_go.contains(
        "r.Get(\"/api/users\", createProxyHandler(\"http://localhost:4000\", \"/users\"))"
    ));

    // ledger on disk knows the route
    let persisted = regen.load_state().unwrap();
    assert!(persisted.is_route_generated(&users_route()));
    assert!(persisted.is_file_generated("cmd/server/main.go"));

    // second run: nothing changes, nothing new
    let mut state = regen.load_state().unwrap();
    let report = regen.regenerate(&config, &mut state).unwrap();
    assert!(report.new_routes.is_empty());
    assert!(
        report
            .outcomes
            .iter()
            .all(|o| o.status == FileStatus::Unchanged)
    );

    // check mode is clean
    let check = regenerator(dir.path(), GenerationMode::Check);
    let mut state = check.load_state().unwrap();
    assert!(!check.regenerate(&config, &mut state).unwrap().has_pending_changes());

    // a duplicate endpoint is rejected, naming the route
    fs::write(
        &config,
        format!(
            "{USERS}      - name: list-users-again\n        path: /people\n        method: GET\n        exposeAs: /api/users\n"
        ),
    )
    .unwrap();
    let mut state = regen.load_state().unwrap();
    match regen.regenerate(&config, &mut state) {
        Err(BffgenError::Domain(DomainError::DuplicateRoute {
            service,
            method,
            expose_as,
        })) => {
            assert_eq!(
                (service.as_str(), method.as_str(), expose_as.as_str()),
                ("users", "GET", "/api/users")
            );
        }
        other => panic!("expected duplicate route, got {other:?}"),
    }
    assert_eq!(
        fs::read_to_string(dir.path().join("cmd/server/main.go")).unwrap(),
        main_go
    );
}

#[test]
fn user_code_outside_markers_survives_and_old_file_is_backed_up() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("bff.config.yaml");
    fs::write(&config, USERS).unwrap();

    let regen = regenerator(dir.path(), GenerationMode::Write);
    let mut state = regen.load_state().unwrap();
    regen.regenerate(&config, &mut state).unwrap();

    let main_path = dir.path().join("cmd/server/main.go");
    let edited = fs::read_to_string(&main_path)
        .unwrap()
        .replace(
            "\tr.Use(middleware.Recoverer)\n",
            "\tr.Use(middleware.Recoverer)\n\tr.Use(authMiddleware)\n",
        );
    fs::write(&main_path, &edited).unwrap();

    fs::write(
        &config,
        format!(
            "{USERS}      - name: create-user\n        path: /users\n        method: POST\n        exposeAs: /api/users\n"
        ),
    )
    .unwrap();
    let report = regen.regenerate(&config, &mut state).unwrap();

    let after = fs::read_to_string(&main_path).unwrap();
    assert!(after.contains("\tr.Use(authMiddleware)\n"));
    assert!(after.contains("r.Post(\"/api/users\""));
    assert_eq!(
        report.new_routes,
        vec![RouteKey::new("users", HttpMethod::Post, "/api/users")]
    );

    let main_outcome = report
        .outcomes
        .iter()
        .find(|o| o.path.ends_with("main.go"))
        .unwrap();
    let backup = main_outcome.backup.as_ref().unwrap();
    assert_eq!(fs::read_to_string(backup).unwrap(), edited);
}

#[test]
fn corrupted_markers_leave_the_file_untouched() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("bff.config.yaml");
    fs::write(&config, USERS).unwrap();

    let main_path = dir.path().join("cmd/server/main.go");
    fs::create_dir_all(main_path.parent().unwrap()).unwrap();
    let broken = "package main\n// bffgen:begin\nfunc main() {}\n";
    fs::write(&main_path, broken).unwrap();

    let regen = regenerator(dir.path(), GenerationMode::Write);
    let mut state = regen.load_state().unwrap();
    let report = regen.regenerate(&config, &mut state).unwrap();

    assert_eq!(report.failures.len(), 1);
    assert!(matches!(
        report.failures[0].error,
        BffgenError::Domain(DomainError::MarkerCorruption { .. })
    ));
    assert_eq!(fs::read_to_string(&main_path).unwrap(), broken);
    // the services file is independent and still written
    assert!(dir.path().join("internal/services/services.go").exists());
}

#[test]
fn node_project_from_json_config() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("bffgen.config.json");
    fs::write(
        &config,
        r#"{
  "project": { "name": "web-bff" },
  "backends": [
    { "name": "users", "baseUrl": "http://localhost:4000",
      "endpoints": [ { "name": "list", "path": "/users", "method": "GET", "exposeAs": "/api/users" } ] }
  ]
}"#,
    )
    .unwrap();

    let regen = regenerator(dir.path(), GenerationMode::Write);
    let mut state = regen.load_state().unwrap();
    let report = regen.regenerate(&config, &mut state).unwrap();

    assert_eq!(report.project_type, ProjectType::NodeJs);
    let index = fs::read_to_string(dir.path().join("src/index.js")).unwrap();
    assert!(
        index.contains("app.get('/api/users', createProxyHandler(services['users'], '/users'));")
    );
    assert!(dir.path().join(".bffgen/state.json").exists());
}

#[test]
fn os_notifications_reach_the_callback() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("bff.config.yaml");
    fs::write(&config, USERS).unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut watcher = ConfigWatcher::new(
        [&config],
        WatchSettings::default().with_debounce(Duration::from_millis(50)),
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        },
    )
    .unwrap();
    watcher.start().unwrap();

    // an unrelated file in the same directory is ignored
    fs::write(dir.path().join("notes.txt"), "x").unwrap();
    std::thread::sleep(Duration::from_millis(200));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    fs::write(&config, format!("{USERS}\n")).unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while calls.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(20));
    }
    watcher.stop();
    assert!(calls.load(Ordering::SeqCst) >= 1);
}

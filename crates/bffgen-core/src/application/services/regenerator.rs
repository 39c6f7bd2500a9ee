//! Regenerator - one full regeneration cycle.
//!
//! A cycle is:
//! 1. load the config (fatal on error),
//! 2. render the target files for its routes,
//! 3. generate each file, collecting per-file failures instead of
//!    stopping at the first one,
//! 4. in write mode, record routes and files in the ledger and persist it.
//!
//! A route is recorded only after the file that contains it has been written
//! (or found already up to date), so every recorded route is backed by code
//! in some generated file. Check and dry-run cycles never touch the ledger.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::{
    application::{
        ports::{RouteRenderer, StateStore},
        services::{
            config_loader::ConfigLoader,
            generator::{FileOutcome, GenerationMode, Generator},
        },
    },
    domain::{FileDiff, GenerationState, ProjectType, RouteKey},
    error::{BffgenError, BffgenResult},
};

#[derive(Debug, Clone, Copy, Default)]
pub struct RegenerationOptions {
    /// Forget the ledger and treat every route as new.
    pub force: bool,
}

/// A file that could not be generated.
#[derive(Debug, Clone)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: BffgenError,
}

/// What one cycle did (or would do).
#[derive(Debug, Clone)]
pub struct RegenerationReport {
    pub config_path: PathBuf,
    pub project_type: ProjectType,
    pub mode: GenerationMode,
    pub outcomes: Vec<FileOutcome>,
    pub failures: Vec<FileFailure>,
    /// Routes not yet in the ledger (recorded now in write mode).
    pub new_routes: Vec<RouteKey>,
    /// Routes already in the ledger.
    pub known_routes: usize,
    /// Set when the ledger was reset (forced, or project type changed).
    pub ledger_reset: bool,
    /// Ledger persistence failure. Files listed in `outcomes` are on disk.
    pub state_error: Option<BffgenError>,
}

impl RegenerationReport {
    /// Something on disk or in the ledger is out of date.
    pub fn has_pending_changes(&self) -> bool {
        self.outcomes.iter().any(|o| o.status.is_change()) || !self.new_routes.is_empty()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.state_error.is_none()
    }

    pub fn changed_files(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.status.is_change())
    }
}

pub struct Regenerator {
    loader: ConfigLoader,
    generator: Generator,
    renderer: Box<dyn RouteRenderer>,
    store: Box<dyn StateStore>,
    options: RegenerationOptions,
}

impl Regenerator {
    pub fn new(
        loader: ConfigLoader,
        generator: Generator,
        renderer: Box<dyn RouteRenderer>,
        store: Box<dyn StateStore>,
        options: RegenerationOptions,
    ) -> Self {
        Self {
            loader,
            generator,
            renderer,
            store,
            options,
        }
    }

    pub fn mode(&self) -> GenerationMode {
        self.generator.options().mode
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    /// Load the ledger this regenerator persists to.
    pub fn load_state(&self) -> BffgenResult<GenerationState> {
        self.store.load()
    }

    pub fn state_location(&self) -> PathBuf {
        self.store.location()
    }

    /// Run one cycle against `config_path`.
    ///
    /// Returns `Err` only when the config cannot be loaded. Per-file and
    /// ledger failures are reported in the [`RegenerationReport`].
    pub fn regenerate(
        &self,
        config_path: &Path,
        state: &mut GenerationState,
    ) -> BffgenResult<RegenerationReport> {
        self.regenerate_with(config_path, state, &mut |_: &FileDiff| {})
    }

    /// Like [`regenerate`](Self::regenerate), passing each file's diff to
    /// `on_diff` before that file is written.
    #[instrument(skip_all, fields(config = %config_path.display(), mode = %self.mode()))]
    pub fn regenerate_with(
        &self,
        config_path: &Path,
        state: &mut GenerationState,
        on_diff: &mut dyn FnMut(&FileDiff),
    ) -> BffgenResult<RegenerationReport> {
        let model = self.loader.load(config_path)?;
        let mode = self.mode();

        let type_changed = state
            .project_type
            .is_some_and(|recorded| recorded != model.project_type);
        if type_changed {
            warn!(
                recorded = ?state.project_type,
                config = %model.project_type,
                "Project type changed since last generation; starting a fresh ledger"
            );
        }
        let ledger_reset = self.options.force || type_changed;
        if ledger_reset && mode.writes() {
            state.reset();
        }
        let is_known = |route: &RouteKey| !ledger_reset && state.is_route_generated(route);

        let mut report = RegenerationReport {
            config_path: config_path.to_path_buf(),
            project_type: model.project_type,
            mode,
            outcomes: Vec::new(),
            failures: Vec::new(),
            new_routes: Vec::new(),
            known_routes: 0,
            ledger_reset,
            state_error: None,
        };

        // routes whose file made it to disk, paired with that file's outcome index
        let mut settled: Vec<(usize, Vec<RouteKey>)> = Vec::new();

        for target in self.renderer.render(&model) {
            match self.generator.generate_file_with(&target, on_diff) {
                Ok(outcome) => {
                    if let Some(previous) = &outcome.previous_hash {
                        if state.is_modified_since_generation(&outcome.ledger_key(), previous) {
                            info!(
                                path = %outcome.path.display(),
                                "File edited since last generation; code outside markers is kept"
                            );
                        }
                    }
                    settled.push((report.outcomes.len(), target.routes));
                    report.outcomes.push(outcome);
                }
                Err(error) => {
                    warn!(path = %target.path.display(), %error, "File generation failed");
                    report.failures.push(FileFailure {
                        path: target.path,
                        error,
                    });
                }
            }
        }

        for (_, routes) in &settled {
            for route in routes {
                if is_known(route) {
                    report.known_routes += 1;
                } else if !report.new_routes.contains(route) {
                    report.new_routes.push(route.clone());
                }
            }
        }

        if !mode.writes() {
            info!(
                changes = report.changed_files().count(),
                new_routes = report.new_routes.len(),
                "Preview finished; nothing written"
            );
            return Ok(report);
        }

        let now = Utc::now();
        for (idx, routes) in settled {
            let outcome = &report.outcomes[idx];
            state.track_generated_file(
                outcome.ledger_key(),
                outcome.content_hash.clone(),
                outcome.has_markers,
                now,
            );
            for route in routes {
                state.track_route(route);
            }
        }
        state.project_type = Some(model.project_type);
        state.mark_persisted(now);

        if let Err(error) = self.store.persist(state) {
            warn!(
                location = %self.store.location().display(),
                %error,
                "Generated files were written but the ledger could not be saved"
            );
            report.state_error = Some(error);
        }

        info!(
            written = report.outcomes.iter().filter(|o| o.status.is_written()).count(),
            failed = report.failures.len(),
            new_routes = report.new_routes.len(),
            "Regeneration finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::application::{
        ApplicationError,
        ports::{Filesystem, GenerationTarget, output::MockStateStore},
        services::{
            fakes::FakeFilesystem,
            generator::{FileStatus, GeneratorOptions},
        },
    };
    use crate::domain::{CommentStyle, ConfigModel, HttpMethod, Scaffold};

    /// One file per service, one line per route.
    struct LineRenderer;

    impl RouteRenderer for LineRenderer {
        fn render(&self, model: &ConfigModel) -> Vec<GenerationTarget> {
            model
                .services
                .values()
                .map(|svc| GenerationTarget {
                    path: PathBuf::from(format!("{}.go", svc.name)),
                    region: svc
                        .endpoints
                        .iter()
                        .map(|e| format!("{} {}\n", e.method, e.expose_as))
                        .collect(),
                    scaffold: Scaffold::new("package main\n", ""),
                    comment_style: CommentStyle::Slash,
                    routes: svc.endpoints.iter().map(|e| svc.route_key(e)).collect(),
                })
                .collect()
        }
    }

    /// Ledger store that keeps the last persisted state in memory.
    #[derive(Default, Clone)]
    struct SharedStore(Arc<std::sync::Mutex<Option<GenerationState>>>);

    impl StateStore for SharedStore {
        fn load(&self) -> BffgenResult<GenerationState> {
            Ok(self.0.lock().unwrap().clone().unwrap_or_default())
        }
        fn persist(&self, state: &GenerationState) -> BffgenResult<()> {
            *self.0.lock().unwrap() = Some(state.clone());
            Ok(())
        }
        fn location(&self) -> PathBuf {
            PathBuf::from(".bffgen/state.json")
        }
    }

    const USERS: &str = "services:\n  users:\n    baseUrl: http://localhost:4000\n    endpoints:\n      - name: list\n        path: /users\n        method: GET\n        exposeAs: /api/users\n";

    fn regenerator(
        fs: &Arc<FakeFilesystem>,
        store: Box<dyn StateStore>,
        mode: GenerationMode,
        force: bool,
    ) -> Regenerator {
        Regenerator::new(
            ConfigLoader::new(fs.clone()),
            Generator::new(
                fs.clone(),
                "/proj",
                GeneratorOptions {
                    mode,
                    ..Default::default()
                },
            ),
            Box::new(LineRenderer),
            store,
            RegenerationOptions { force },
        )
    }

    fn users_route() -> RouteKey {
        RouteKey::new("users", HttpMethod::Get, "/api/users")
    }

    #[test]
    fn first_run_creates_and_tracks() {
        let fs = Arc::new(FakeFilesystem::default());
        fs.put("/proj/bff.config.yaml", USERS);
        let store = SharedStore::default();
        let regen = regenerator(&fs, Box::new(store.clone()), GenerationMode::Write, false);

        let mut state = regen.load_state().unwrap();
        let report = regen
            .regenerate(Path::new("/proj/bff.config.yaml"), &mut state)
            .unwrap();

        assert_eq!(report.outcomes[0].status, FileStatus::Created);
        assert_eq!(report.new_routes, vec![users_route()]);
        assert!(state.is_route_generated(&users_route()));
        assert!(state.is_file_generated("users.go"));
        assert_eq!(state.project_type, Some(ProjectType::Go));

        let persisted = store.load().unwrap();
        assert_eq!(persisted, state);
    }

    #[test]
    fn second_run_is_a_no_op() {
        let fs = Arc::new(FakeFilesystem::default());
        fs.put("/proj/bff.config.yaml", USERS);
        let regen = regenerator(
            &fs,
            Box::new(SharedStore::default()),
            GenerationMode::Write,
            false,
        );
        let mut state = GenerationState::new();
        regen.regenerate(Path::new("/proj/bff.config.yaml"), &mut state).unwrap();
        let after_first = fs.get("/proj/users.go").unwrap();

        let report = regen
            .regenerate(Path::new("/proj/bff.config.yaml"), &mut state)
            .unwrap();
        assert!(report.new_routes.is_empty());
        assert_eq!(report.known_routes, 1);
        assert_eq!(report.outcomes[0].status, FileStatus::Unchanged);
        assert_eq!(fs.get("/proj/users.go").unwrap(), after_first);

        let check = regenerator(
            &fs,
            Box::new(SharedStore::default()),
            GenerationMode::Check,
            false,
        );
        let report = check
            .regenerate(Path::new("/proj/bff.config.yaml"), &mut state)
            .unwrap();
        assert!(!report.has_pending_changes());
    }

    #[test]
    fn check_mode_leaves_disk_and_ledger_alone() {
        let fs = Arc::new(FakeFilesystem::default());
        fs.put("/proj/bff.config.yaml", USERS);
        let mut store = MockStateStore::new();
        store.expect_persist().never();
        let regen = regenerator(&fs, Box::new(store), GenerationMode::Check, false);

        let mut state = GenerationState::new();
        let report = regen
            .regenerate(Path::new("/proj/bff.config.yaml"), &mut state)
            .unwrap();
        assert!(report.has_pending_changes());
        assert_eq!(report.new_routes, vec![users_route()]);
        assert!(state.is_empty());
        assert!(!fs.exists(Path::new("/proj/users.go")));
    }

    #[test]
    fn failed_file_does_not_stop_batch_or_track_its_routes() {
        let fs = Arc::new(FakeFilesystem::default());
        fs.put(
            "/proj/bff.config.yaml",
            "services:\n  orders:\n    baseUrl: http://o.local\n    endpoints: [ { path: /orders, exposeAs: /api/orders } ]\n  users:\n    baseUrl: http://u.local\n    endpoints: [ { path: /users, exposeAs: /api/users } ]\n",
        );
        fs.put("/proj/orders.go", "package main\n// hand written, no markers\n");
        let regen = regenerator(
            &fs,
            Box::new(SharedStore::default()),
            GenerationMode::Write,
            false,
        );

        let mut state = GenerationState::new();
        let report = regen
            .regenerate(Path::new("/proj/bff.config.yaml"), &mut state)
            .unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, PathBuf::from("orders.go"));
        assert_eq!(report.outcomes.len(), 1);
        let orders = RouteKey::new("orders", HttpMethod::Get, "/api/orders");
        assert!(!state.is_route_generated(&orders));
        assert!(state.is_route_generated(&RouteKey::new("users", HttpMethod::Get, "/api/users")));
        assert_eq!(
            fs.get("/proj/orders.go").unwrap(),
            "package main\n// hand written, no markers\n"
        );
    }

    #[test]
    fn persist_failure_is_reported_not_raised() {
        let fs = Arc::new(FakeFilesystem::default());
        fs.put("/proj/bff.config.yaml", USERS);
        let mut store = MockStateStore::new();
        store.expect_persist().times(1).returning(|_| {
            Err(ApplicationError::StatePersist {
                path: PathBuf::from(".bffgen/state.json"),
                reason: "read-only filesystem".into(),
            }
            .into())
        });
        store
            .expect_location()
            .returning(|| PathBuf::from(".bffgen/state.json"));
        let regen = regenerator(&fs, Box::new(store), GenerationMode::Write, false);

        let mut state = GenerationState::new();
        let report = regen
            .regenerate(Path::new("/proj/bff.config.yaml"), &mut state)
            .unwrap();
        assert!(report.state_error.as_ref().is_some_and(BffgenError::is_state_persist));
        assert!(fs.exists(Path::new("/proj/users.go")));
    }

    #[test]
    fn missing_config_is_fatal() {
        let fs = Arc::new(FakeFilesystem::default());
        let regen = regenerator(
            &fs,
            Box::new(SharedStore::default()),
            GenerationMode::Write,
            false,
        );
        let err = regen
            .regenerate(Path::new("/proj/bff.config.yaml"), &mut GenerationState::new())
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn force_treats_every_route_as_new() {
        let fs = Arc::new(FakeFilesystem::default());
        fs.put("/proj/bff.config.yaml", USERS);
        let mut state = GenerationState::new();
        state.track_route(users_route());
        state.track_route(RouteKey::new("gone", HttpMethod::Get, "/old"));

        let regen = regenerator(&fs, Box::new(SharedStore::default()), GenerationMode::Write, true);
        let report = regen
            .regenerate(Path::new("/proj/bff.config.yaml"), &mut state)
            .unwrap();
        assert!(report.ledger_reset);
        assert_eq!(report.new_routes, vec![users_route()]);
        assert_eq!(state.route_count(), 1);
    }

    #[test]
    fn removed_routes_stay_in_ledger() {
        let fs = Arc::new(FakeFilesystem::default());
        fs.put("/proj/bff.config.yaml", USERS);
        let mut state = GenerationState::new();
        state.project_type = Some(ProjectType::Go);
        state.track_route(RouteKey::new("gone", HttpMethod::Get, "/old"));

        let regen = regenerator(
            &fs,
            Box::new(SharedStore::default()),
            GenerationMode::Write,
            false,
        );
        regen
            .regenerate(Path::new("/proj/bff.config.yaml"), &mut state)
            .unwrap();
        assert_eq!(state.route_count(), 2);
    }

    #[test]
    fn project_type_change_resets_ledger() {
        let fs = Arc::new(FakeFilesystem::default());
        fs.put("/proj/bff.config.yaml", USERS);
        let mut state = GenerationState::new();
        state.project_type = Some(ProjectType::NodeJs);
        state.track_route(users_route());

        let regen = regenerator(
            &fs,
            Box::new(SharedStore::default()),
            GenerationMode::Write,
            false,
        );
        let report = regen
            .regenerate(Path::new("/proj/bff.config.yaml"), &mut state)
            .unwrap();
        assert!(report.ledger_reset);
        assert_eq!(state.project_type, Some(ProjectType::Go));
        assert_eq!(report.new_routes, vec![users_route()]);
    }

    #[test]
    fn diffs_arrive_before_their_files_are_written() {
        let fs = Arc::new(FakeFilesystem::default());
        fs.put("/proj/bff.config.yaml", USERS);
        let regen = Regenerator::new(
            ConfigLoader::new(fs.clone()),
            Generator::new(
                fs.clone(),
                "/proj",
                GeneratorOptions {
                    show_diff: true,
                    ..Default::default()
                },
            ),
            Box::new(LineRenderer),
            Box::new(SharedStore::default()),
            RegenerationOptions::default(),
        );

        let mut shown = Vec::new();
        let report = regen
            .regenerate_with(
                Path::new("/proj/bff.config.yaml"),
                &mut GenerationState::new(),
                &mut |diff: &FileDiff| {
                    assert!(!fs.exists(Path::new("/proj/users.go")));
                    shown.push(diff.path.clone());
                },
            )
            .unwrap();

        assert_eq!(shown, vec!["users.go".to_string()]);
        assert_eq!(report.outcomes[0].status, FileStatus::Created);
        assert!(fs.exists(Path::new("/proj/users.go")));
    }
}

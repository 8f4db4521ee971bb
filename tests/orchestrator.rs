#[cfg(all(test, unix))]
mod tests {
    use async_trait::async_trait;
    use ferry::libs::config::{AppConfig, CatalogConfig, Config, LauncherConfig};
    use ferry::libs::download::{DownloadManager, DownloadProgress};
    use ferry::libs::error::{LauncherError, LauncherResult};
    use ferry::libs::launcher::{LaunchSpec, ProcessLauncher};
    use ferry::libs::messages::Message;
    use ferry::libs::orchestrator::{EventReceiver, FlowOutcome, LauncherEvent, OrchestratorState, Session, StatusEvent};
    use ferry::libs::registry::{PathRegistry, RECORD_FILE_NAME};
    use ferry::libs::self_update::{DisabledSelfUpdater, LauncherRelease, SelfUpdater};
    use semver::Version;
    use serde_json::json;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;
    use test_context::{test_context, AsyncTestContext};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const EXE: &str = "Attrition";
    const RELEASES_PATH: &str = "/repos/acme/rocket/releases";
    const INSTALLER: &str = "Attrition-Setup-1.3.0.exe";

    struct FlowTestContext {
        server: MockServer,
        temp_dir: TempDir,
        install_dir: PathBuf,
    }

    impl AsyncTestContext for FlowTestContext {
        async fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let install_dir = temp_dir.path().join("programs").join(EXE);
            FlowTestContext {
                server: MockServer::start().await,
                temp_dir,
                install_dir,
            }
        }
    }

    impl FlowTestContext {
        fn config(&self) -> Config {
            Config {
                catalog: Some(CatalogConfig {
                    api_url: self.server.uri(),
                    owner: "acme".to_string(),
                    repo: "rocket".to_string(),
                    ..CatalogConfig::default()
                }),
                app: Some(AppConfig {
                    name: EXE.to_string(),
                    executable_name: EXE.to_string(),
                    ..AppConfig::default()
                }),
                launcher: Some(LauncherConfig {
                    self_update: false,
                    settle_delay_ms: 0,
                    auto_launch: false,
                }),
            }
        }

        fn record_path(&self) -> PathBuf {
            self.temp_dir.path().join("data").join(RECORD_FILE_NAME)
        }

        fn download_dir(&self) -> PathBuf {
            self.temp_dir.path().join("downloads")
        }

        fn write_record(&self, json: serde_json::Value) {
            fs::create_dir_all(self.record_path().parent().unwrap()).unwrap();
            fs::write(self.record_path(), json.to_string()).unwrap();
        }

        fn registry(&self) -> PathRegistry {
            PathRegistry::with_candidates(self.record_path(), EXE, vec![self.install_dir.clone()], self.temp_dir.path().join("Game"))
        }

        fn session(&self, self_updater: Box<dyn SelfUpdater>) -> (Session, EventReceiver) {
            let config = self.config();
            let downloader = DownloadManager::new(&config.catalog(), self.download_dir()).unwrap();
            Session::new(&config, self.registry(), downloader, self_updater).unwrap()
        }

        async fn serve_catalog(&self, releases: serde_json::Value) {
            Mock::given(method("GET"))
                .and(path(RELEASES_PATH))
                .respond_with(ResponseTemplate::new(200).set_body_json(releases))
                .mount(&self.server)
                .await;
        }

        /// Installer script padded to exactly 1000 bytes.
        async fn serve_installer(&self, exit_code: i32) {
            let script = format!(
                "#!/bin/sh\nif [ {code} -eq 0 ]; then\n  mkdir -p \"{dir}\"\n  touch \"{dir}/{exe}\"\nfi\nexit {code}\n",
                dir = self.install_dir.display(),
                exe = EXE,
                code = exit_code,
            );
            let padded = format!("{}#{}\n", script, "x".repeat(1000 - script.len() - 2));
            assert_eq!(padded.len(), 1000);

            Mock::given(method("GET"))
                .and(path(format!("/files/{}", INSTALLER)))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(padded.into_bytes()))
                .mount(&self.server)
                .await;
        }

        fn release(&self, tag: &str, asset: Option<&str>) -> serde_json::Value {
            let assets: Vec<_> = asset
                .into_iter()
                .map(|name| {
                    json!({
                        "name": name,
                        "browser_download_url": format!("{}/files/{}", self.server.uri(), name),
                        "size": 1000
                    })
                })
                .collect();
            json!({ "tag_name": tag, "body": "- Balance changes", "assets": assets })
        }
    }

    fn drain(events: &mut EventReceiver) -> Vec<LauncherEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = events.try_recv() {
            drained.push(event);
        }
        drained
    }

    fn statuses(events: &[LauncherEvent]) -> Vec<&StatusEvent> {
        events
            .iter()
            .filter_map(|event| match event {
                LauncherEvent::Status(status) => Some(status),
                LauncherEvent::Ready(_) => None,
            })
            .collect()
    }

    /// Distinct states in the order they were first reported.
    fn states(events: &[LauncherEvent]) -> Vec<OrchestratorState> {
        let mut states: Vec<OrchestratorState> = Vec::new();
        for status in statuses(events) {
            if states.last() != Some(&status.status) {
                states.push(status.status);
            }
        }
        states
    }

    static STALLED_SPAWNS: AtomicUsize = AtomicUsize::new(0);

    fn stalled_spawn(_spec: &LaunchSpec) -> io::Result<u32> {
        STALLED_SPAWNS.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(300));
        Ok(777)
    }

    enum FakeUpdate {
        CheckFails,
        ApplyFails,
        Applies,
    }

    #[async_trait]
    impl SelfUpdater for FakeUpdate {
        async fn check(&self) -> LauncherResult<Option<LauncherRelease>> {
            match self {
                FakeUpdate::CheckFails => Err(LauncherError::Network {
                    message: "connection reset".to_string(),
                }),
                _ => Ok(Some(LauncherRelease {
                    version: Version::new(9, 0, 0),
                    download_url: "https://downloads.example.com/ferry.tar.gz".to_string(),
                    file_name: "ferry.tar.gz".to_string(),
                    size: Some(10),
                })),
            }
        }

        async fn apply(&self, _release: &LauncherRelease, on_progress: &mut (dyn FnMut(DownloadProgress) + Send)) -> LauncherResult<PathBuf> {
            on_progress(DownloadProgress { transferred: 10, total: Some(10) });
            match self {
                FakeUpdate::Applies => Ok(PathBuf::from("/opt/ferry/ferry")),
                _ => Err(LauncherError::Transport {
                    message: "HTTP 404 Not Found".to_string(),
                }),
            }
        }
    }

    #[test_context(FlowTestContext)]
    #[tokio::test]
    async fn test_update_is_downloaded_and_installed(ctx: &mut FlowTestContext) {
        ctx.write_record(json!({ "gameVersion": "1.2.0" }));
        ctx.serve_catalog(json!([
            ctx.release("launcher-v1.2.0", Some("ferry-v1.2.0-x86_64-unknown-linux-musl.tar.gz")),
            ctx.release("v1.3.0", Some(INSTALLER)),
        ]))
        .await;
        ctx.serve_installer(0).await;

        let (mut session, mut events) = ctx.session(Box::new(DisabledSelfUpdater));
        let outcome = session.start().await.unwrap();

        assert_eq!(outcome, FlowOutcome::UpToDate(Version::new(1, 3, 0)));
        assert_eq!(session.state(), OrchestratorState::UpToDate);
        assert_eq!(session.registry().version(), Version::new(1, 3, 0));
        assert_eq!(session.registry().install_path(), Some(ctx.install_dir.as_path()));
        assert!(session.registry().record().last_checked_at.is_some());
        assert!(!ctx.download_dir().join(INSTALLER).exists());

        let events = drain(&mut events);
        assert_eq!(
            states(&events),
            vec![
                OrchestratorState::CheckingSelfUpdate,
                OrchestratorState::CheckingAppUpdate,
                OrchestratorState::DownloadingAppUpdate,
                OrchestratorState::InstallingAppUpdate,
                OrchestratorState::UpToDate,
            ]
        );
        assert_eq!(events.last(), Some(&LauncherEvent::Ready(true)));

        let downloading: Vec<_> = statuses(&events)
            .into_iter()
            .filter(|s| s.status == OrchestratorState::DownloadingAppUpdate)
            .collect();
        let announced = downloading[0].context.as_ref().unwrap();
        assert_eq!(announced.current_version, Version::new(1, 2, 0));
        assert_eq!(announced.latest_version, Version::new(1, 3, 0));
        assert_eq!(announced.file_size, Some(1000));
        assert_eq!(announced.release_notes, "- Balance changes");

        let progress: Vec<u8> = downloading.iter().filter_map(|s| s.progress).collect();
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(progress.last(), Some(&100));
    }

    #[test_context(FlowTestContext)]
    #[tokio::test]
    async fn test_current_version_skips_download(ctx: &mut FlowTestContext) {
        ctx.write_record(json!({ "gameVersion": "2.0.0" }));
        ctx.serve_catalog(json!([ctx.release("v2.0.0", Some("Attrition-Setup-2.0.0.exe"))])).await;
        Mock::given(method("GET"))
            .and(path("/files/Attrition-Setup-2.0.0.exe"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&ctx.server)
            .await;

        let (mut session, mut events) = ctx.session(Box::new(DisabledSelfUpdater));
        let outcome = session.start().await.unwrap();

        assert_eq!(outcome, FlowOutcome::UpToDate(Version::new(2, 0, 0)));
        assert_eq!(
            states(&drain(&mut events)),
            vec![
                OrchestratorState::CheckingSelfUpdate,
                OrchestratorState::CheckingAppUpdate,
                OrchestratorState::UpToDate,
            ]
        );
    }

    #[test_context(FlowTestContext)]
    #[tokio::test]
    async fn test_missing_game_ends_in_error(ctx: &mut FlowTestContext) {
        let stale = ctx.temp_dir.path().join("stale");
        ctx.write_record(json!({ "installPath": stale, "gameVersion": "2.0.0" }));
        ctx.serve_catalog(json!([ctx.release("v2.0.0", None)])).await;

        let (mut session, mut events) = ctx.session(Box::new(DisabledSelfUpdater));
        session.check_for_updates().await.unwrap();
        drain(&mut events);

        let err = session.launch().await.unwrap_err();
        assert!(matches!(err, LauncherError::ExecutableNotFound { .. }));
        assert_eq!(session.state(), OrchestratorState::Error);

        let events = drain(&mut events);
        let last = statuses(&events).pop().unwrap().clone();
        assert_eq!(last.status, OrchestratorState::Error);
        assert_eq!(last.message, Message::ReinstallGuidance.to_string());
    }

    #[test_context(FlowTestContext)]
    #[tokio::test]
    async fn test_launch_requires_up_to_date(ctx: &mut FlowTestContext) {
        let (mut session, mut events) = ctx.session(Box::new(DisabledSelfUpdater));

        let err = session.launch().await.unwrap_err();
        assert!(matches!(err, LauncherError::NotReady { state: OrchestratorState::Idle }));
        assert_eq!(session.state(), OrchestratorState::Idle);
        assert!(drain(&mut events).is_empty());
    }

    #[test_context(FlowTestContext)]
    #[tokio::test]
    async fn test_launch_hands_off_to_game(ctx: &mut FlowTestContext) {
        fs::create_dir_all(&ctx.install_dir).unwrap();
        let exe = ctx.install_dir.join(EXE);
        fs::write(&exe, "#!/bin/sh\nexit 0\n").unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&exe, fs::Permissions::from_mode(0o755)).unwrap();
        }
        ctx.write_record(json!({ "installPath": ctx.install_dir, "gameVersion": "2.0.0" }));
        ctx.serve_catalog(json!([ctx.release("v2.0.0", None)])).await;

        let (mut session, _events) = ctx.session(Box::new(DisabledSelfUpdater));
        session.start().await.unwrap();
        let process = session.launch().await.unwrap();

        assert!(process.pid > 0);
        assert_eq!(session.state(), OrchestratorState::GameLaunched);
        assert!(matches!(session.check_for_updates().await, Err(LauncherError::NotReady { .. })));
    }

    #[test_context(FlowTestContext)]
    #[tokio::test]
    async fn test_catalog_failure_can_be_retried(ctx: &mut FlowTestContext) {
        ctx.write_record(json!({ "gameVersion": "2.0.0" }));
        Mock::given(method("GET"))
            .and(path(RELEASES_PATH))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&ctx.server)
            .await;
        ctx.serve_catalog(json!([ctx.release("v2.0.0", None)])).await;

        let (mut session, mut events) = ctx.session(Box::new(DisabledSelfUpdater));
        let err = session.start().await.unwrap_err();
        assert!(matches!(err, LauncherError::Network { .. }));
        assert_eq!(session.state(), OrchestratorState::Error);
        assert!(session.registry().record().last_checked_at.is_none());
        assert!(!drain(&mut events).contains(&LauncherEvent::Ready(true)));

        assert_eq!(session.check_for_updates().await.unwrap(), Version::new(2, 0, 0));
        assert_eq!(session.state(), OrchestratorState::UpToDate);
    }

    #[test_context(FlowTestContext)]
    #[tokio::test]
    async fn test_failed_install_keeps_previous_version(ctx: &mut FlowTestContext) {
        ctx.write_record(json!({ "gameVersion": "1.2.0" }));
        ctx.serve_catalog(json!([ctx.release("v1.3.0", Some(INSTALLER))])).await;
        ctx.serve_installer(3).await;

        let (mut session, _events) = ctx.session(Box::new(DisabledSelfUpdater));
        let err = session.start().await.unwrap_err();

        assert!(matches!(err, LauncherError::InstallerExit { code: Some(3) }));
        assert_eq!(session.state(), OrchestratorState::Error);
        assert_eq!(session.registry().version(), Version::new(1, 2, 0));
        assert!(ctx.download_dir().join(INSTALLER).exists());
        assert_eq!(session.pending_release().map(|r| r.latest_version.clone()), Some(Version::new(1, 3, 0)));
    }

    #[test_context(FlowTestContext)]
    #[tokio::test]
    async fn test_self_update_failures_do_not_block_the_game(ctx: &mut FlowTestContext) {
        ctx.write_record(json!({ "gameVersion": "2.0.0" }));
        ctx.serve_catalog(json!([ctx.release("v2.0.0", None)])).await;

        let (mut session, mut events) = ctx.session(Box::new(FakeUpdate::CheckFails));
        assert_eq!(session.start().await.unwrap(), FlowOutcome::UpToDate(Version::new(2, 0, 0)));
        assert_eq!(
            states(&drain(&mut events)),
            vec![
                OrchestratorState::CheckingSelfUpdate,
                OrchestratorState::CheckingAppUpdate,
                OrchestratorState::UpToDate,
            ]
        );

        let (mut session, mut events) = ctx.session(Box::new(FakeUpdate::ApplyFails));
        assert_eq!(session.start().await.unwrap(), FlowOutcome::UpToDate(Version::new(2, 0, 0)));
        assert_eq!(
            states(&drain(&mut events)),
            vec![
                OrchestratorState::CheckingSelfUpdate,
                OrchestratorState::DownloadingSelfUpdate,
                OrchestratorState::CheckingAppUpdate,
                OrchestratorState::UpToDate,
            ]
        );
    }

    #[test_context(FlowTestContext)]
    #[tokio::test]
    async fn test_applied_self_update_requests_restart(ctx: &mut FlowTestContext) {
        Mock::given(method("GET"))
            .and(path(RELEASES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&ctx.server)
            .await;

        let (mut session, mut events) = ctx.session(Box::new(FakeUpdate::Applies));
        let outcome = session.start().await.unwrap();

        assert_eq!(outcome, FlowOutcome::Restart(PathBuf::from("/opt/ferry/ferry")));
        assert_eq!(session.state(), OrchestratorState::DownloadingSelfUpdate);
        let events = drain(&mut events);
        assert_eq!(
            states(&events),
            vec![OrchestratorState::CheckingSelfUpdate, OrchestratorState::DownloadingSelfUpdate]
        );
        assert!(statuses(&events).iter().any(|s| s.progress == Some(100)));
    }

    #[test_context(FlowTestContext)]
    #[tokio::test]
    async fn test_spawn_timeout_ends_in_error_without_double_launch(ctx: &mut FlowTestContext) {
        fs::create_dir_all(&ctx.install_dir).unwrap();
        fs::write(ctx.install_dir.join(EXE), "#!/bin/sh\nexit 0\n").unwrap();
        ctx.write_record(json!({ "installPath": ctx.install_dir, "gameVersion": "2.0.0" }));
        ctx.serve_catalog(json!([ctx.release("v2.0.0", None)])).await;

        let (mut session, mut events) = ctx.session(Box::new(DisabledSelfUpdater));
        let app = AppConfig {
            spawn_grace_ms: 50,
            ..ctx.config().app()
        };
        session.set_launcher(ProcessLauncher::from_app(&app).with_spawner(stalled_spawn));
        session.check_for_updates().await.unwrap();
        drain(&mut events);

        let err = session.launch().await.unwrap_err();
        assert!(matches!(err, LauncherError::SpawnTimeout { timeout_ms: 50, .. }));
        assert_eq!(session.state(), OrchestratorState::Error);

        let events_after = drain(&mut events);
        let last = statuses(&events_after).pop().unwrap().clone();
        assert_eq!(last.status, OrchestratorState::Error);
        assert_eq!(last.message, Message::SpawnTimedOut(50).to_string());

        tokio::time::sleep(Duration::from_millis(500)).await;
        session.check_for_updates().await.unwrap();
        let process = session.launch().await.unwrap();

        assert_eq!(process.pid, 777);
        assert_eq!(session.state(), OrchestratorState::GameLaunched);
        assert_eq!(STALLED_SPAWNS.load(Ordering::SeqCst), 1);
    }
}

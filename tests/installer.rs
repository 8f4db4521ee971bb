#[cfg(all(test, unix))]
mod tests {
    use ferry::libs::error::LauncherError;
    use ferry::libs::installer::InstallInvoker;
    use ferry::libs::registry::{PathRegistry, RECORD_FILE_NAME, VERSION_FILE_NAME};
    use semver::Version;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use test_context::{test_context, AsyncTestContext};

    const EXE: &str = "Attrition";

    /// A registry whose only candidate root is where the fake installer installs to.
    struct InstallerTestContext {
        temp_dir: TempDir,
        install_dir: PathBuf,
        installer: PathBuf,
    }

    impl AsyncTestContext for InstallerTestContext {
        async fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let install_dir = temp_dir.path().join("programs").join(EXE);
            let installer = temp_dir.path().join("downloads").join("Attrition-Setup-1.3.0.exe");
            fs::create_dir_all(installer.parent().unwrap()).unwrap();
            InstallerTestContext {
                temp_dir,
                install_dir,
                installer,
            }
        }
    }

    impl InstallerTestContext {
        fn registry(&self) -> PathRegistry {
            PathRegistry::with_candidates(
                self.temp_dir.path().join(RECORD_FILE_NAME),
                EXE,
                vec![self.install_dir.clone()],
                self.temp_dir.path().join("Game"),
            )
        }

        /// Installer script that installs the executable, records its arguments and exits with `code`.
        fn write_installer(&self, code: i32) {
            let args_file = self.temp_dir.path().join("args.txt");
            let script = format!(
                "#!/bin/sh\necho \"$@\" > \"{args}\"\nif [ {code} -eq 0 ]; then\n  mkdir -p \"{dir}\"\n  touch \"{dir}/{exe}\"\nfi\nexit {code}\n",
                args = args_file.display(),
                dir = self.install_dir.display(),
                exe = EXE,
                code = code,
            );
            fs::write(&self.installer, script).unwrap();
        }

        fn recorded_args(&self) -> String {
            fs::read_to_string(self.temp_dir.path().join("args.txt")).unwrap().trim().to_string()
        }
    }

    fn invoker() -> InstallInvoker {
        InstallInvoker::new(vec!["/S".to_string(), "/currentuser".to_string()])
    }

    #[test_context(InstallerTestContext)]
    #[tokio::test]
    async fn test_successful_install_records_version(ctx: &mut InstallerTestContext) {
        ctx.write_installer(0);
        let mut registry = ctx.registry();

        invoker().install(&ctx.installer, &Version::new(1, 3, 0), &mut registry).await.unwrap();

        assert_eq!(ctx.recorded_args(), "/S /currentuser");
        assert!(!ctx.installer.exists(), "installer should be cleaned up");
        assert_eq!(registry.install_path(), Some(ctx.install_dir.as_path()));
        assert!(registry.is_installed());
        assert_eq!(registry.version(), Version::new(1, 3, 0));
        assert_eq!(fs::read_to_string(ctx.install_dir.join(VERSION_FILE_NAME)).unwrap(), "1.3.0");
        assert_eq!(ctx.registry().record().installed_version, "1.3.0");
    }

    #[test_context(InstallerTestContext)]
    #[tokio::test]
    async fn test_failed_install_keeps_version_and_artifact(ctx: &mut InstallerTestContext) {
        let previous = ctx.temp_dir.path().join("previous");
        fs::create_dir_all(&previous).unwrap();
        let mut registry = ctx.registry();
        registry.set_install_path(&previous);
        registry.set_version(&Version::new(1, 2, 0));

        ctx.write_installer(3);
        let err = invoker().install(&ctx.installer, &Version::new(1, 3, 0), &mut registry).await.unwrap_err();

        assert!(matches!(err, LauncherError::InstallerExit { code: Some(3) }));
        assert_eq!(err.to_string(), "Installation failed with exit code: 3");
        assert!(ctx.installer.exists(), "installer should be kept for inspection");
        assert_eq!(registry.version(), Version::new(1, 2, 0));
        assert_eq!(registry.install_path(), Some(previous.as_path()));
    }

    #[test_context(InstallerTestContext)]
    #[tokio::test]
    async fn test_missing_installer(ctx: &mut InstallerTestContext) {
        let mut registry = ctx.registry();
        let err = invoker().install(&ctx.installer, &Version::new(1, 3, 0), &mut registry).await.unwrap_err();

        assert!(matches!(err, LauncherError::InstallerNotFound(_)));
        assert_eq!(registry.version(), Version::new(0, 0, 0));
    }
}

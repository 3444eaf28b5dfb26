//! TestRepo helper for integration tests.
//!
//! Provides a temporary git repository for testing lifeline operations.

use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

use lifeline::NewEvent;

/// A temporary git repository for testing.
///
/// The repository is automatically cleaned up when the TestRepo is dropped.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Create a new git repository on `main` in a temporary directory.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let repo = Self { dir };
        repo.git(&["init", "-q", "-b", "main"]);
        repo.git(&["config", "user.name", "Lifeline Test"]);
        repo.git(&["config", "user.email", "test@example.com"]);
        repo.git(&["config", "commit.gpgsign", "false"]);
        repo
    }

    /// Get the path to the repository root.
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Execute a git command in this repository.
    ///
    /// # Panics
    ///
    /// Panics if the command fails to execute or returns a non-zero exit code.
    pub fn git(&self, args: &[&str]) -> String {
        self.git_with_env(args, &[])
    }

    /// Execute a git command with extra environment variables.
    pub fn git_with_env(&self, args: &[&str], envs: &[(&str, &str)]) -> String {
        let output = Command::new("git")
            .args(args)
            .envs(envs.iter().copied())
            .current_dir(self.path())
            .output()
            .expect("Failed to execute git command");

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            panic!(
                "git {:?} failed with exit code {:?}:\n{}",
                args,
                output.status.code(),
                stderr
            );
        }

        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    /// Write a file in the repository.
    pub fn write_file(&self, name: &str, content: &str) {
        let path = self.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(&path, content).expect("Failed to write file");
    }

    /// Read a file from the repository.
    ///
    /// Returns an empty string if the file does not exist.
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.path().join(name)).unwrap_or_default()
    }

    /// Commit a file directly with git, dated at midnight UTC on `date`.
    pub fn commit_file(&self, name: &str, content: &str, message: &str, date: &str) {
        self.write_file(name, content);
        self.git(&["add", "--", name]);
        let stamp = format!("{date}T00:00:00+00:00");
        self.git_with_env(
            &["commit", "-q", "-m", message],
            &[
                ("GIT_AUTHOR_DATE", stamp.as_str()),
                ("GIT_COMMITTER_DATE", stamp.as_str()),
            ],
        );
    }

    /// Commit subjects on HEAD, oldest first.
    pub fn subjects(&self) -> Vec<String> {
        self.git(&["log", "--reverse", "--format=%s"])
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Commit subjects on `rev`, oldest first.
    pub fn subjects_of(&self, rev: &str) -> Vec<String> {
        self.git(&["log", "--reverse", "--format=%s", rev, "--"])
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Author dates (`YYYY-MM-DD`) on HEAD, oldest first.
    pub fn author_dates(&self) -> Vec<String> {
        self.git(&["log", "--reverse", "--format=%ad", "--date=short"])
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Committer dates (`YYYY-MM-DD`) on HEAD, oldest first.
    pub fn committer_dates(&self) -> Vec<String> {
        self.git(&["log", "--reverse", "--format=%cd", "--date=short"])
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Install an executable hook script, e.g. `pre-commit`.
    pub fn install_hook(&self, name: &str, script: &str) {
        use std::os::unix::fs::PermissionsExt;

        let hooks = PathBuf::from(self.git(&["rev-parse", "--git-path", "hooks"]).trim());
        let hooks = if hooks.is_absolute() { hooks } else { self.path().join(hooks) };
        std::fs::create_dir_all(&hooks).expect("Failed to create hooks directory");
        let hook = hooks.join(name);
        std::fs::write(&hook, script).expect("Failed to write hook");
        std::fs::set_permissions(&hook, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to make hook executable");
    }

    /// Remove a hook installed with [`TestRepo::install_hook`].
    pub fn remove_hook(&self, name: &str) {
        let hooks = PathBuf::from(self.git(&["rev-parse", "--git-path", "hooks"]).trim());
        let hooks = if hooks.is_absolute() { hooks } else { self.path().join(hooks) };
        std::fs::remove_file(hooks.join(name)).expect("Failed to remove hook");
    }

    /// Whether `git status --porcelain` reports nothing.
    pub fn is_clean(&self) -> bool {
        self.git(&["status", "--porcelain"]).trim().is_empty()
    }
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}

/// Input for a `life` event with no description or media.
pub fn event(title: &str, date: &str) -> NewEvent {
    NewEvent {
        title: title.to_string(),
        date: date.to_string(),
        event_type: "life".to_string(),
        description: String::new(),
        media: Vec::new(),
    }
}

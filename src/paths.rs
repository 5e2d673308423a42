//! On-disk layout of snapshots, working files and rendered output.

use std::path::{Path, PathBuf};

pub const DEFAULT_SRC_DIR: &str = "src";
pub const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Debug, Clone)]
pub struct Layout {
    pub src_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            src_dir: PathBuf::from(DEFAULT_SRC_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl Layout {
    pub fn new(src_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            src_dir,
            output_dir,
        }
    }

    /// `<src>/<project>/raw/raw-<project>-sprint-<sprint>.json`
    pub fn raw_snapshot(&self, project: &str, sprint: &str) -> PathBuf {
        self.src_dir
            .join(project)
            .join("raw")
            .join(format!("raw-{project}-sprint-{sprint}.json"))
    }

    pub fn working_dir(&self, project: &str) -> PathBuf {
        self.src_dir.join(project).join("working")
    }

    /// `<src>/<project>/working/working-<project>-sprint-<sprint>-<millis>.json`
    pub fn working_file(&self, project: &str, sprint: &str, timestamp_millis: i64) -> PathBuf {
        self.working_dir(project)
            .join(format!("working-{project}-sprint-{sprint}-{timestamp_millis}.json"))
    }

    /// A `make` input is either a path that already exists or a file name
    /// inside the project's working directory.
    pub fn resolve_working_file(&self, file: &str, project: Option<&str>) -> Option<PathBuf> {
        let direct = Path::new(file);
        if direct.is_file() {
            return Some(direct.to_path_buf());
        }
        project.map(|p| self.working_dir(p).join(file))
    }

    /// `<output>/<project>/Content`
    pub fn html_dir(&self, project: &str) -> PathBuf {
        self.output_dir.join(project).join("Content")
    }
}

/// Lower-cased sprint value with spaces replaced by hyphens.
pub fn sprint_slug(sprint: &str) -> String {
    sprint.replace(' ', "-").to_lowercase()
}

pub fn release_notes_file_name(sprint: &str) -> String {
    format!("latest-release-{}.htm", sprint_slug(sprint))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_paths() {
        let layout = Layout::default();
        assert_eq!(
            layout.raw_snapshot("PROJ", "7"),
            PathBuf::from("src/PROJ/raw/raw-PROJ-sprint-7.json")
        );
        assert_eq!(
            layout.working_file("PROJ", "7", 1700000000000),
            PathBuf::from("src/PROJ/working/working-PROJ-sprint-7-1700000000000.json")
        );
        assert_eq!(layout.html_dir("PROJ"), PathBuf::from("output/PROJ/Content"));
    }

    #[test]
    fn test_sprint_slug() {
        assert_eq!(sprint_slug("Sprint 7"), "sprint-7");
        assert_eq!(sprint_slug("Q3 Release Train"), "q3-release-train");
        assert_eq!(release_notes_file_name("Sprint 7"), "latest-release-sprint-7.htm");
    }

    #[test]
    fn test_resolve_working_file() {
        let layout = Layout::default();
        assert_eq!(
            layout.resolve_working_file("working-x.json", Some("PROJ")),
            Some(PathBuf::from("src/PROJ/working/working-x.json"))
        );
        assert_eq!(layout.resolve_working_file("working-x.json", None), None);

        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("w.json");
        std::fs::write(&existing, "{}").unwrap();
        let file = existing.to_string_lossy().to_string();
        assert_eq!(layout.resolve_working_file(&file, Some("PROJ")), Some(existing));
    }
}

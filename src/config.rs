use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use tracing::{debug, error};

use crate::error::{ReleaseNotesError, Result};

pub const DEFAULT_USER_OPTS_FILE: &str = "user.json";
pub const DEFAULT_APP_FILE: &str = "app.json";
pub const DEFAULT_FORMATTER: &str = "release-notes";

const DEFAULT_FIELDS: [&str; 3] = ["summary", "status", "issuetype"];

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Get,
    Make,
}

/// Named sprint field and the value issues are filtered on.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Sprint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(deserialize_with = "sprint_value")]
    pub value: String,
}

/// Sprint values are often plain numbers in options files.
fn sprint_value<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Value {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(match Value::deserialize(deserializer)? {
        Value::Text(text) => text,
        Value::Integer(n) => n.to_string(),
        Value::Float(n) => n.to_string(),
    })
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JiraOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprint: Option<Sprint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    #[serde(default = "default_fields")]
    pub fields: Vec<String>,
    #[serde(default)]
    pub rendered_fields: bool,
}

impl Default for JiraOptions {
    fn default() -> Self {
        Self {
            project: None,
            sprint: None,
            filter: None,
            resource_name: None,
            fields: default_fields(),
            rendered_fields: false,
        }
    }
}

fn default_fields() -> Vec<String> {
    DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect()
}

fn default_formatter() -> String {
    DEFAULT_FORMATTER.to_string()
}

fn default_user_opts_file() -> String {
    DEFAULT_USER_OPTS_FILE.to_string()
}

fn default_app_file() -> String {
    DEFAULT_APP_FILE.to_string()
}

/// The merged run options. Embedded verbatim as `opts` in every working file,
/// so every field tolerates being absent when a working file is read back.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub jira: JiraOptions,
    #[serde(default = "default_formatter")]
    pub output_formatter: String,
    #[serde(default = "default_user_opts_file")]
    pub user_opts_file: String,
    #[serde(default = "default_app_file")]
    pub app_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira_opts_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            jira: JiraOptions::default(),
            output_formatter: default_formatter(),
            user_opts_file: default_user_opts_file(),
            app_file: default_app_file(),
            jira_opts_file: None,
            file: None,
        }
    }
}

impl Options {
    pub fn sprint_value(&self) -> Option<&str> {
        self.jira.sprint.as_ref().map(|s| s.value.as_str())
    }

    /// Check that the options required by the selected mode are present.
    /// Every missing option is logged before the run is refused.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();

        match self.mode {
            Mode::Get => {
                if self.jira_opts_file.is_none() {
                    missing.push("jiraOptsFile");
                }
                if self.jira.sprint.is_none() {
                    missing.push("jira.sprint");
                }
                if self.jira.project.is_none() {
                    missing.push("jira.project");
                }
                if self.jira.resource_name.is_none() {
                    missing.push("jira.resourceName");
                }
            }
            Mode::Make => {
                if self.file.is_none() {
                    missing.push("file");
                }
            }
        }

        if missing.is_empty() {
            return Ok(());
        }

        for option in &missing {
            error!("No {option} specified");
        }
        Err(ReleaseNotesError::MissingOptions { missing })
    }
}

/// Shape of the JIRA options file. Any key present here replaces the
/// command-line value.
#[derive(Deserialize, Default, Debug)]
#[serde(rename_all = "camelCase")]
struct OptionsOverlay {
    jira: Option<JiraOptions>,
    output_formatter: Option<String>,
    user_opts_file: Option<String>,
    app_file: Option<String>,
    file: Option<String>,
}

impl OptionsOverlay {
    fn apply(self, mut base: Options) -> Options {
        if let Some(jira) = self.jira {
            base.jira = jira;
        }
        if let Some(formatter) = self.output_formatter {
            base.output_formatter = formatter;
        }
        if let Some(user_opts_file) = self.user_opts_file {
            base.user_opts_file = user_opts_file;
        }
        if let Some(app_file) = self.app_file {
            base.app_file = app_file;
        }
        if let Some(file) = self.file {
            base.file = Some(file);
        }
        base
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct AppCredentials {
    #[serde(rename = "appID")]
    pub app_id: String,
    #[serde(rename = "appSecret")]
    pub app_secret: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct AppFile {
    pub app: AppCredentials,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct UserCredentials {
    pub user: String,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub app: AppCredentials,
    pub user: UserCredentials,
}

pub struct Config {
    pub options: Options,
    pub credentials: Credentials,
}

impl Config {
    /// Merge the JIRA options file onto the command-line options, then read
    /// the credential files it names.
    pub fn load(cli_options: Options, opts_dir: &Path) -> Result<Self> {
        let options = match cli_options.jira_opts_file.clone() {
            Some(name) => {
                let overlay: OptionsOverlay = read_options_file(&opts_dir.join(name))?;
                overlay.apply(cli_options)
            }
            None => cli_options,
        };
        debug!(?options, "merged options");

        options.validate()?;

        let user: UserCredentials = read_options_file(&opts_dir.join(&options.user_opts_file))?;
        let app: AppFile = read_options_file(&opts_dir.join(&options.app_file))?;

        Ok(Self {
            options,
            credentials: Credentials { app: app.app, user },
        })
    }

    /// Resolve the options directory: explicit path, then `./opts`, then the
    /// platform config directory.
    pub fn opts_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(dir) = explicit {
            return Ok(dir);
        }

        let local = PathBuf::from("opts");
        if local.is_dir() {
            return Ok(local);
        }

        ProjectDirs::from("", "", "jira-release-notes")
            .map(|dirs| dirs.config_dir().join("opts"))
            .ok_or(ReleaseNotesError::NoOptsDir)
    }
}

/// Read an options file as TOML when it has a `.toml` extension, JSON otherwise.
pub fn read_options_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path).map_err(|e| ReleaseNotesError::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(&contents).map_err(|e| ReleaseNotesError::ConfigParseToml {
            path: path.to_path_buf(),
            source: e,
        })
    } else {
        serde_json::from_str(&contents).map_err(|e| ReleaseNotesError::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

use std::{
    fmt::{Display, Formatter},
    fs,
    path::{Path, PathBuf},
};
use toml::Value;

pub const PRESENTATION_FILE: &str = "presentation.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct PresentationConfig {
    pub name: String,
    pub scene: String,
    pub program: ProgramConfig,
    pub runner: RunnerConfig,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgramConfig {
    /// Seconds.
    pub duration: f64,
    pub start_time: f64,
    pub autoplay: bool,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            duration: 32.0 * 60.0,
            start_time: 0.0,
            autoplay: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunnerConfig {
    pub fps: f64,
    /// Length of a headless run in seconds.
    pub seconds: f64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            fps: 60.0,
            seconds: 10.0,
        }
    }
}

#[derive(Debug)]
pub enum ProjectError {
    Io(std::io::Error),
    ParseToml(toml::de::Error),
    MissingField(&'static str),
    InvalidField(&'static str, String),
    AlreadyExists(PathBuf),
}

impl Display for ProjectError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::ParseToml(err) => write!(f, "{err}"),
            Self::MissingField(field) => write!(f, "missing required field `{field}`"),
            Self::InvalidField(field, reason) => write!(f, "invalid field `{field}`: {reason}"),
            Self::AlreadyExists(path) => {
                write!(f, "presentation directory already exists: {}", path.display())
            }
        }
    }
}

impl std::error::Error for ProjectError {}

impl From<std::io::Error> for ProjectError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::de::Error> for ProjectError {
    fn from(value: toml::de::Error) -> Self {
        Self::ParseToml(value)
    }
}

/// `res://a/b` → `<root>/a/b`. Anything else is returned as given.
pub fn resolve_res_path(input: &str, root: &Path) -> PathBuf {
    match input.strip_prefix("res://") {
        Some(rest) => {
            let rel = rest.trim_start_matches('/');
            if rel.is_empty() {
                root.to_path_buf()
            } else {
                root.join(rel)
            }
        }
        None => PathBuf::from(input),
    }
}

pub fn load_presentation_toml(root: &Path) -> Result<PresentationConfig, ProjectError> {
    let contents = fs::read_to_string(root.join(PRESENTATION_FILE))?;
    parse_presentation_toml(&contents)
}

pub fn parse_presentation_toml(contents: &str) -> Result<PresentationConfig, ProjectError> {
    let value: Value = contents.parse::<Value>()?;
    let project_table = value
        .get("project")
        .and_then(Value::as_table)
        .ok_or(ProjectError::MissingField("project"))?;

    let name = project_table
        .get("name")
        .and_then(Value::as_str)
        .ok_or(ProjectError::MissingField("project.name"))?
        .to_string();

    let scene = project_table
        .get("scene")
        .and_then(Value::as_str)
        .ok_or(ProjectError::MissingField("project.scene"))?
        .to_string();
    validate_res_path("project.scene", &scene)?;

    let program_table = value
        .get("program")
        .and_then(Value::as_table)
        .ok_or(ProjectError::MissingField("program"))?;

    let duration = program_table
        .get("duration")
        .ok_or(ProjectError::MissingField("program.duration"))
        .and_then(|v| number("program.duration", v))?;
    if duration <= 0.0 {
        return Err(ProjectError::InvalidField(
            "program.duration",
            "must be greater than 0".to_string(),
        ));
    }

    let start_time = match program_table.get("start_time") {
        Some(v) => number("program.start_time", v)?,
        None => 0.0,
    };
    if start_time < 0.0 {
        return Err(ProjectError::InvalidField(
            "program.start_time",
            "must not be negative".to_string(),
        ));
    }

    let autoplay = match program_table.get("autoplay") {
        Some(v) => v.as_bool().ok_or(ProjectError::InvalidField(
            "program.autoplay",
            "must be a boolean".to_string(),
        ))?,
        None => true,
    };

    let mut runner = RunnerConfig::default();
    if let Some(runner_table) = value.get("runner").and_then(Value::as_table) {
        if let Some(v) = runner_table.get("fps") {
            runner.fps = number("runner.fps", v)?;
        }
        if let Some(v) = runner_table.get("seconds") {
            runner.seconds = number("runner.seconds", v)?;
        }
    }
    if runner.fps <= 0.0 {
        return Err(ProjectError::InvalidField(
            "runner.fps",
            "must be greater than 0".to_string(),
        ));
    }
    if runner.seconds < 0.0 {
        return Err(ProjectError::InvalidField(
            "runner.seconds",
            "must not be negative".to_string(),
        ));
    }

    Ok(PresentationConfig {
        name,
        scene,
        program: ProgramConfig {
            duration,
            start_time,
            autoplay,
        },
        runner,
    })
}

// TOML integers and floats both count.
fn number(field: &'static str, value: &Value) -> Result<f64, ProjectError> {
    match value {
        Value::Integer(i) => Ok(*i as f64),
        Value::Float(f) if f.is_finite() => Ok(*f),
        _ => Err(ProjectError::InvalidField(field, "must be a number".to_string())),
    }
}

fn validate_res_path(field: &'static str, path: &str) -> Result<(), ProjectError> {
    if path.starts_with("res://") {
        return Ok(());
    }
    Err(ProjectError::InvalidField(
        field,
        "must start with `res://`".to_string(),
    ))
}

/// Creates `root` with a presentation file and an empty scene.
pub fn create_new_presentation(root: &Path, name: &str) -> Result<(), ProjectError> {
    if root.exists() {
        return Err(ProjectError::AlreadyExists(root.to_path_buf()));
    }
    fs::create_dir_all(root.join("res"))?;
    fs::write(root.join(PRESENTATION_FILE), default_presentation_toml(name))?;
    fs::write(root.join("res").join("scene.json"), default_scene_json())?;
    Ok(())
}

pub fn default_presentation_toml(name: &str) -> String {
    format!(
        r#"[project]
name = "{name}"
scene = "res://scene.json"

[program]
duration = 1920.0
start_time = 0.0
autoplay = true

[runner]
fps = 60.0
seconds = 10.0
"#
    )
}

fn default_scene_json() -> String {
    r#"[
    { "type": "PointLight", "name": "sun", "position": [0, 200, 0] },
    { "type": "Axes", "name": "origin", "size": 10 }
]
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_toml_roundtrips_through_parser() {
        let config = parse_presentation_toml(&default_presentation_toml("Imaginarium")).unwrap();
        assert_eq!(config.name, "Imaginarium");
        assert_eq!(config.scene, "res://scene.json");
        assert_eq!(config.program.duration, 1920.0);
        assert!(config.program.autoplay);
        assert_eq!(config.runner, RunnerConfig::default());
    }

    #[test]
    fn integer_duration_and_missing_runner_are_accepted() {
        let config = parse_presentation_toml(
            r#"
            [project]
            name = "Demo"
            scene = "res://s.json"
            [program]
            duration = 600
            "#,
        )
        .unwrap();
        assert_eq!(config.program.duration, 600.0);
        assert_eq!(config.program.start_time, 0.0);
        assert_eq!(config.runner.fps, 60.0);
    }

    #[test]
    fn missing_duration_is_reported() {
        let err = parse_presentation_toml(
            r#"
            [project]
            name = "Demo"
            scene = "res://s.json"
            [program]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ProjectError::MissingField("program.duration")));
    }

    #[test]
    fn non_positive_duration_is_invalid() {
        let err = parse_presentation_toml(
            r#"
            [project]
            name = "Demo"
            scene = "res://s.json"
            [program]
            duration = 0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ProjectError::InvalidField("program.duration", _)));
    }

    #[test]
    fn scene_must_be_res_path() {
        let err = parse_presentation_toml(
            r#"
            [project]
            name = "Demo"
            scene = "/abs/scene.json"
            [program]
            duration = 10
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ProjectError::InvalidField("project.scene", _)));
        assert_eq!(
            err.to_string(),
            "invalid field `project.scene`: must start with `res://`"
        );
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        assert!(matches!(
            parse_presentation_toml("[project"),
            Err(ProjectError::ParseToml(_))
        ));
    }

    #[test]
    fn res_paths_resolve_under_root() {
        let root = Path::new("/show");
        assert_eq!(
            resolve_res_path("res://data/cmp.json", root),
            PathBuf::from("/show/data/cmp.json")
        );
        assert_eq!(resolve_res_path("res://", root), PathBuf::from("/show"));
        assert_eq!(resolve_res_path("other.json", root), PathBuf::from("other.json"));
    }

    #[test]
    fn create_new_presentation_writes_loadable_project() {
        let root = std::env::temp_dir().join(format!("orrery_project_test_{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        create_new_presentation(&root, "Fresh").unwrap();

        let config = load_presentation_toml(&root).unwrap();
        assert_eq!(config.name, "Fresh");
        assert!(resolve_res_path(&config.scene, &root).exists());
        assert!(matches!(
            create_new_presentation(&root, "Fresh"),
            Err(ProjectError::AlreadyExists(_))
        ));
        let _ = fs::remove_dir_all(&root);
    }
}

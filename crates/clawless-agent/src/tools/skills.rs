//! Skill runner — one tool per `internal/skills/<dir>/skill.json` manifest.
//!
//! Manifests are read eagerly when the provider registers; the code behind
//! an `entrypoint` is resolved the first time the skill is called and kept
//! for the life of the process. Skills added after startup are picked up on
//! the next restart.
//!
//! # Entrypoints
//!
//! - `builtin:<id>` — a skill compiled into this binary (see [`BUILTIN_SKILLS`])
//! - `exec:<relative path>` — a program inside the skill directory; receives
//!   the JSON arguments on stdin and must print one JSON value on stdout

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use clawless_core::paths::{PathSandbox, SandboxError};

use super::base::{Tool, ToolArgs};
use super::registry::ToolRegistry;

/// Directory under the internal root holding one subdirectory per skill.
pub const SKILLS_DIR: &str = "skills";

/// Manifest file name inside each skill directory.
pub const MANIFEST_FILE: &str = "skill.json";

/// Upper bound on one `exec:` run.
const EXEC_TIMEOUT_SECS: u64 = 60;

// ─────────────────────────────────────────────
// Built-in skills
// ─────────────────────────────────────────────

/// A statically linked skill implementation.
pub type BuiltinSkill = fn(ToolArgs) -> anyhow::Result<Value>;

/// Skills addressable as `builtin:<id>`.
pub static BUILTIN_SKILLS: &[(&str, BuiltinSkill)] = &[("echo", builtin_echo), ("clock", builtin_clock)];

fn builtin_echo(args: ToolArgs) -> anyhow::Result<Value> {
    Ok(Value::Object(args))
}

fn builtin_clock(_args: ToolArgs) -> anyhow::Result<Value> {
    Ok(json!({
        "local": chrono::Local::now().to_rfc3339(),
        "utc": chrono::Utc::now().to_rfc3339(),
    }))
}

fn find_builtin(id: &str) -> Option<BuiltinSkill> {
    BUILTIN_SKILLS
        .iter()
        .find(|(name, _)| *name == id)
        .map(|(_, skill)| *skill)
}

// ─────────────────────────────────────────────
// Manifest
// ─────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SkillManifest {
    name: Option<String>,
    description: Option<String>,
    entrypoint: Option<String>,
}

/// One skill as declared by its manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkillDefinition {
    pub name: String,
    pub description: String,
    pub entrypoint: String,
    /// The skill's canonical directory inside the internal root; `exec:`
    /// paths resolve against it.
    pub dir: PathBuf,
}

/// Read one manifest. `Ok(None)` means the skill declares no usable name or entrypoint.
fn read_manifest(dir: &Path, dir_name: &str) -> anyhow::Result<Option<SkillDefinition>> {
    let path = dir.join(MANIFEST_FILE);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let manifest: SkillManifest = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let name = manifest.name.unwrap_or_else(|| dir_name.to_string());
    let entrypoint = manifest.entrypoint.unwrap_or_default();
    if name.is_empty() || entrypoint.is_empty() {
        return Ok(None);
    }
    let description = manifest
        .description
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| format!("Skill {name}"));

    Ok(Some(SkillDefinition {
        name,
        description,
        entrypoint,
        dir: dir.to_path_buf(),
    }))
}

// ─────────────────────────────────────────────
// SkillRunner (provider)
// ─────────────────────────────────────────────

pub struct SkillRunner {
    sandbox: Arc<PathSandbox>,
    skills_root: PathBuf,
    exec_timeout: Duration,
}

impl SkillRunner {
    pub fn new(sandbox: Arc<PathSandbox>) -> Result<Self, SandboxError> {
        let skills_root = sandbox.resolve_internal(SKILLS_DIR)?;
        Ok(Self {
            sandbox,
            skills_root,
            exec_timeout: Duration::from_secs(EXEC_TIMEOUT_SECS),
        })
    }

    /// Override the bound on one `exec:` run.
    pub fn with_exec_timeout(mut self, timeout: Duration) -> Self {
        self.exec_timeout = timeout;
        self
    }

    /// Scan skill directories in name order. Broken manifests and
    /// directories that resolve outside the internal root are skipped.
    pub fn load_skills(&self) -> Vec<SkillDefinition> {
        let entries = match std::fs::read_dir(&self.skills_root) {
            Ok(entries) => entries,
            Err(_) => {
                debug!(root = %self.skills_root.display(), "no skills directory");
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();

        let mut skills = Vec::new();
        for name in names {
            let dir = match self.sandbox.resolve_internal(Path::new(SKILLS_DIR).join(&name)) {
                Ok(dir) => dir,
                Err(e) => {
                    warn!(skill_dir = %name, error = %e, "skipping skill outside internal root");
                    continue;
                }
            };
            if !dir.is_dir() || !dir.join(MANIFEST_FILE).is_file() {
                continue;
            }
            match read_manifest(&dir, &name) {
                Ok(Some(skill)) => skills.push(skill),
                Ok(None) => {
                    debug!(dir = %dir.display(), "skill manifest has no name or entrypoint");
                }
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "skipping skill");
                }
            }
        }
        skills
    }

    pub fn register(&self, registry: &mut ToolRegistry) {
        for skill in self.load_skills() {
            info!(skill = %skill.name, entrypoint = %skill.entrypoint, "loaded skill");
            registry.register(Arc::new(SkillTool {
                skill,
                sandbox: self.sandbox.clone(),
                exec_timeout: self.exec_timeout,
                resolved: OnceCell::new(),
            }));
        }
    }
}

// ─────────────────────────────────────────────
// SkillTool
// ─────────────────────────────────────────────

#[derive(Clone, Debug)]
enum Entrypoint {
    Builtin(BuiltinSkill),
    Exec(PathBuf),
}

pub struct SkillTool {
    skill: SkillDefinition,
    sandbox: Arc<PathSandbox>,
    exec_timeout: Duration,
    resolved: OnceCell<Entrypoint>,
}

impl SkillTool {
    fn resolve_entrypoint(&self) -> anyhow::Result<Entrypoint> {
        let entrypoint = self.skill.entrypoint.as_str();
        if let Some(id) = entrypoint.strip_prefix("builtin:") {
            let skill = find_builtin(id.trim())
                .with_context(|| format!("unknown builtin skill: {}", id.trim()))?;
            return Ok(Entrypoint::Builtin(skill));
        }
        if let Some(relative) = entrypoint.strip_prefix("exec:") {
            // The skill directory must still sit inside the internal root.
            let dir = self.sandbox.resolve_internal(&self.skill.dir)?;
            let program = self.sandbox.resolve(&dir, relative.trim())?;
            return Ok(Entrypoint::Exec(program));
        }
        bail!("unsupported entrypoint: {entrypoint}")
    }

    async fn run_exec(&self, program: &Path, args: ToolArgs) -> anyhow::Result<Value> {
        let input = serde_json::to_vec(&Value::Object(args))?;

        let mut child = Command::new(program)
            .current_dir(&self.skill.dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn skill {}", self.skill.name))?;

        // stdin and stdout are serviced together under one timeout; dropping
        // `run` kills the child.
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                // A program that ignores its input may exit before we finish writing.
                if let Err(e) = stdin.write_all(&input).await {
                    debug!(error = %e, "skill closed stdin early");
                }
            }
        };
        let run = async move {
            let ((), output) = tokio::join!(feed, child.wait_with_output());
            output
        };

        let output = tokio::time::timeout(self.exec_timeout, run)
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "skill {} timed out after {}s",
                    self.skill.name,
                    self.exec_timeout.as_secs_f64()
                )
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "skill {} exited with {}: {}",
                self.skill.name,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            );
        }

        serde_json::from_slice(&output.stdout)
            .with_context(|| format!("skill {} did not print valid JSON", self.skill.name))
    }
}

#[async_trait]
impl Tool for SkillTool {
    fn name(&self) -> &str {
        &self.skill.name
    }

    fn description(&self) -> &str {
        &self.skill.description
    }

    fn input_schema(&self) -> Value {
        json!({ "args": "tool-specific args" })
    }

    async fn execute(&self, args: ToolArgs) -> anyhow::Result<Value> {
        let entry = self
            .resolved
            .get_or_try_init(|| async { self.resolve_entrypoint() })
            .await?;
        match entry {
            Entrypoint::Builtin(skill) => skill(args),
            Entrypoint::Exec(program) => self.run_exec(program, args).await,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

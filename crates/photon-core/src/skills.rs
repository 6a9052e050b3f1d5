//! Skill synchronization and loading.
//!
//! A "skill" is a directory somewhere under one of the configured
//! `skill_roots` containing a `SKILL.md` file with `---`-delimited
//! frontmatter. `sync_and_load` walks every root, copies each skill
//! directory it finds into `<project>/.photon/skills/<name>/` (overwriting
//! whatever was there), then loads skills back out of that destination —
//! so the project's working copy is always self-contained and doesn't
//! depend on the original roots still being reachable.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PhotonResult, ResultExt};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub description: String,
    pub content: String,
    pub path: PathBuf,
}

pub struct SkillManager {
    project_root: PathBuf,
    skills: Vec<Skill>,
}

impl SkillManager {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            skills: Vec::new(),
        }
    }

    pub fn skills(&self) -> &[Skill] {
        &self.skills
    }

    pub fn get_skill_content(&self, name: &str) -> Option<&str> {
        self.skills
            .iter()
            .find(|skill| skill.name == name)
            .map(|skill| skill.content.as_str())
    }

    pub fn system_prompt_addition(&self) -> String {
        if self.skills.is_empty() {
            return String::new();
        }
        let mut lines = vec!["Available skills:".to_string()];
        for skill in &self.skills {
            lines.push(format!("- {}: {}", skill.name, skill.description));
        }
        lines.join("\n")
    }

    /// Copies every `SKILL.md`-bearing directory under `roots` into
    /// `<project>/.photon/skills/<name>/`, then loads from there.
    pub fn sync_and_load(&mut self, roots: &[String]) -> PhotonResult<()> {
        let dest_root = self.project_root.join(".photon").join("skills");
        std::fs::create_dir_all(&dest_root)
            .io_context(format!("creating {}", dest_root.display()))?;

        for root in roots {
            let expanded = shellexpand::tilde(root).into_owned();
            let root_path = PathBuf::from(expanded);
            if !root_path.is_dir() {
                continue;
            }
            self.sync_from_root(&root_path, &dest_root)?;
        }

        self.skills.clear();
        load_skills_from(&dest_root, &mut self.skills)?;
        Ok(())
    }

    fn sync_from_root(&self, root: &Path, dest_root: &Path) -> PhotonResult<()> {
        let Ok(entries) = std::fs::read_dir(root) else {
            return Ok(());
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let skill_md = path.join("SKILL.md");
            if skill_md.is_file() {
                let folder_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                let name = std::fs::read_to_string(&skill_md)
                    .ok()
                    .and_then(|content| parse_frontmatter(&content).get("name").cloned())
                    .unwrap_or(folder_name);
                let dest = dest_root.join(&name);
                copy_dir_overwrite(&path, &dest)?;
            } else {
                self.sync_from_root(&path, dest_root)?;
            }
        }
        Ok(())
    }
}

fn copy_dir_overwrite(src: &Path, dest: &Path) -> PhotonResult<()> {
    if dest.exists() {
        std::fs::remove_dir_all(dest).io_context(format!("removing stale {}", dest.display()))?;
    }
    std::fs::create_dir_all(dest).io_context(format!("creating {}", dest.display()))?;
    for entry in std::fs::read_dir(src).io_context(format!("reading {}", src.display()))? {
        let entry = entry.io_context("reading dir entry")?;
        let from = entry.path();
        let to = dest.join(entry.file_name());
        if from.is_dir() {
            copy_dir_overwrite(&from, &to)?;
        } else {
            std::fs::copy(&from, &to).io_context(format!("copying {}", from.display()))?;
        }
    }
    Ok(())
}

fn load_skills_from(dest_root: &Path, out: &mut Vec<Skill>) -> PhotonResult<()> {
    let Ok(entries) = std::fs::read_dir(dest_root) else {
        return Ok(());
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let skill_md = path.join("SKILL.md");
        if !skill_md.is_file() {
            continue;
        }
        let folder_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let content = std::fs::read_to_string(&skill_md)
            .io_context(format!("reading {}", skill_md.display()))?;
        let frontmatter = parse_frontmatter(&content);
        let name = frontmatter
            .get("name")
            .cloned()
            .unwrap_or(folder_name);
        let description = frontmatter
            .get("description")
            .cloned()
            .unwrap_or_else(|| format!("Extended capability for {name}"));
        out.push(Skill {
            name,
            description,
            content,
            path: skill_md,
        });
    }
    Ok(())
}

/// Extracts recognized `key: value` lines (`name`, `description`) from a
/// `---`-delimited frontmatter block at the very start of the document.
/// Unrecognized keys are ignored; a missing frontmatter block yields an
/// empty map.
fn parse_frontmatter(content: &str) -> std::collections::HashMap<String, String> {
    let mut out = std::collections::HashMap::new();
    let Some(trimmed) = content.strip_prefix("---\n") else {
        return out;
    };
    let Some(end) = trimmed.find("\n---") else {
        return out;
    };
    for line in trimmed[..end].lines() {
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            if key == "name" || key == "description" {
                out.insert(key.to_string(), value.trim().trim_matches('"').to_string());
            }
        }
    }
    out
}

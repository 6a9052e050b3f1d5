//! `skill_read` — returns the full content of a synced skill document by
//! name.

use std::sync::Arc;

use async_trait::async_trait;
use photon_core::skills::SkillManager;
use photon_core::tools::{Tool, ToolResult, ToolSchema};
use serde_json::Value;

pub struct SkillReadTool {
    skills: Arc<SkillManager>,
}

impl SkillReadTool {
    pub fn new(skills: Arc<SkillManager>) -> Self {
        Self { skills }
    }
}

#[async_trait]
impl Tool for SkillReadTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("skill_read", "Read the full content of a synced skill by name")
            .with_param("name", "skill name", true)
    }

    async fn execute(&self, arguments: &Value) -> ToolResult {
        let Some(name) = arguments.get("name").and_then(Value::as_str) else {
            return ToolResult::error("skill_read requires a `name` argument");
        };
        match self.skills.get_skill_content(name) {
            Some(content) => ToolResult::text(content.to_string()),
            None => ToolResult::error(format!("no such skill: {name}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_synced_skill() {
        let roots_dir = tempfile::tempdir().unwrap();
        let project_dir = tempfile::tempdir().unwrap();
        let skill_dir = roots_dir.path().join("demo");
        std::fs::create_dir_all(&skill_dir).unwrap();
        std::fs::write(
            skill_dir.join("SKILL.md"),
            "---\ndescription: A demo skill\n---\nBody text\n",
        )
        .unwrap();

        let mut manager = SkillManager::new(project_dir.path());
        manager
            .sync_and_load(&[roots_dir.path().to_string_lossy().to_string()])
            .unwrap();

        let tool = SkillReadTool::new(Arc::new(manager));
        let result = tool.execute(&serde_json::json!({"name": "demo"})).await;
        assert!(result.content[0].text.contains("Body text"));

        let missing = tool.execute(&serde_json::json!({"name": "nope"})).await;
        assert!(missing.is_error());
    }
}

//! Preview tool - renders an animation script to raster frames
//!
//! The orchestration core depends only on the [`PreviewInvoker`] trait; the
//! bundled [`ManimInvoker`] shells out to the `manim` CLI. Tool failures are
//! outcomes, not errors: the failure text is folded back into the
//! conversation so the model can self-correct on the next turn.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use tokio::process::Command;

use crate::core::{Artifact, Config, SceneChatError, ToolDefinition};

/// Name of the single tool advertised to the model.
pub const PREVIEW_TOOL_NAME: &str = "get_preview";

/// Prelude written above the model's script so common imports are in scope.
const SCRIPT_PRELUDE: &str = "from manim import *\nfrom math import *\n\n";

/// Parsed arguments of a `get_preview` call.
#[derive(Debug, Deserialize)]
pub struct PreviewArgs {
    /// The animation script to render.
    pub code: String,
    /// The scene class inside the script to render.
    pub class_name: String,
}

impl PreviewArgs {
    /// Structurally parse the accumulated raw argument JSON.
    pub fn parse(raw: &str) -> Result<Self, SceneChatError> {
        serde_json::from_str(raw).map_err(SceneChatError::from)
    }
}

/// Outcome of one tool invocation.
///
/// Both success and failure produce a summary the model reads; artifacts are
/// present only on success.
#[derive(Debug, Clone)]
pub struct PreviewOutcome {
    /// Textual result surfaced to the model as the tool's answer.
    pub summary: String,
    /// Ordered rendered frames, possibly empty.
    pub artifacts: Vec<Artifact>,
}

impl PreviewOutcome {
    pub fn success(summary: impl Into<String>, artifacts: Vec<Artifact>) -> Self {
        Self {
            summary: summary.into(),
            artifacts,
        }
    }

    pub fn failure(error_text: impl Into<String>) -> Self {
        Self {
            summary: error_text.into(),
            artifacts: Vec::new(),
        }
    }
}

/// External collaborator boundary: execute the preview tool.
#[async_trait]
pub trait PreviewInvoker: Send + Sync {
    async fn execute(&self, script: &str, entry_name: &str) -> PreviewOutcome;
}

/// The tool schema advertised to the model on every request.
pub fn preview_tool_definition() -> ToolDefinition {
    ToolDefinition::function(
        PREVIEW_TOOL_NAME,
        "Get a preview of the video animation before giving it. Use this function always, \
         before giving the final code to the user, to generate frames of the video so you \
         can see it and improve it over time. Before using it, tell the user you will be \
         generating a preview based on the code they see. Always use spaces to maintain \
         the indentation; the code will not work otherwise.",
        serde_json::json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "The code to get the preview of. Take account of the spaces to maintain the indentation."
                },
                "class_name": {
                    "type": "string",
                    "description": "The name of the class to get the preview of. It must match the class name in the code."
                }
            },
            "required": ["code", "class_name"]
        }),
    )
}

/// Renders previews by running the `manim` CLI in a scratch directory.
pub struct ManimInvoker {
    scratch_root: PathBuf,
    frame_stride: usize,
}

impl ManimInvoker {
    pub fn new(scratch_root: impl Into<PathBuf>, frame_stride: usize) -> Self {
        Self {
            scratch_root: scratch_root.into(),
            frame_stride: frame_stride.max(1),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.preview.scratch_dir.clone(),
            config.preview.frame_stride,
        )
    }

    /// Check if the manim CLI is installed.
    pub async fn is_available() -> bool {
        Command::new("manim")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Unique scratch directory per invocation so concurrent loops never
    /// collide.
    fn invocation_dir(&self) -> PathBuf {
        let token: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(12)
            .map(char::from)
            .collect();
        self.scratch_root.join(token)
    }

    /// Collect rendered frames from the scratch directory, keeping every
    /// Nth by frame index, base64-encoded and sorted by ordinal.
    fn collect_frames(&self, dir: &Path) -> std::io::Result<Vec<Artifact>> {
        let mut frames: Vec<(usize, Vec<u8>)> = Vec::new();

        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(index) = frame_index(&name) else {
                continue;
            };
            if index % self.frame_stride != 0 {
                continue;
            }
            frames.push((index, std::fs::read(entry.path())?));
        }

        frames.sort_by_key(|(index, _)| *index);
        Ok(frames
            .into_iter()
            .map(|(index, bytes)| Artifact::new(index, BASE64.encode(bytes)))
            .collect())
    }
}

/// Extract the trailing frame number from a `*<digits>.png` file name.
fn frame_index(file_name: &str) -> Option<usize> {
    let stem = file_name.strip_suffix(".png")?;
    let digits: String = stem
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.chars().rev().collect::<String>().parse().ok()
}

#[async_trait]
impl PreviewInvoker for ManimInvoker {
    async fn execute(&self, script: &str, entry_name: &str) -> PreviewOutcome {
        let dir = self.invocation_dir();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            return PreviewOutcome::failure(format!(
                "Unexpected error: could not create scratch directory: {}",
                e
            ));
        }

        let script_path = dir.join(format!("{}.py", entry_name));
        let contents = format!("{}{}\n", SCRIPT_PRELUDE, script);
        if let Err(e) = std::fs::write(&script_path, contents) {
            let _ = std::fs::remove_dir_all(&dir);
            return PreviewOutcome::failure(format!(
                "Unexpected error: could not write script file: {}",
                e
            ));
        }

        let output = Command::new("manim")
            .arg(&script_path)
            .arg(entry_name)
            .arg("--format=png")
            .arg("--media_dir")
            .arg(&dir)
            .arg("--custom_folders")
            .arg("-ql")
            .arg("--disable_caching")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let outcome = match output {
            Ok(output) if output.status.success() => match self.collect_frames(&dir) {
                Ok(artifacts) if !artifacts.is_empty() => PreviewOutcome::success(
                    "Animation preview generated. Now you will see the image frames in the \
                     next automatic message...",
                    artifacts,
                ),
                Ok(_) => PreviewOutcome::failure(format!(
                    "No preview files generated at expected location: {}",
                    dir.display()
                )),
                Err(e) => {
                    PreviewOutcome::failure(format!("Unexpected error reading frames: {}", e))
                }
            },
            Ok(output) => {
                let combined = format!(
                    "{}{}",
                    String::from_utf8_lossy(&output.stdout),
                    String::from_utf8_lossy(&output.stderr)
                );
                PreviewOutcome::failure(format!(
                    "ERROR. Error generating preview, please think about what could be the \
                     problem, and use `get_preview` to run the code again: exit status {}\n\
                     Command output:\n{}",
                    output.status, combined
                ))
            }
            // The tool could not run at all (missing binary, spawn failure).
            Err(e) => PreviewOutcome::failure(format!(
                "ERROR. The preview renderer could not be started: {}. \
                 Make sure `manim` is installed.",
                e
            )),
        };

        // Frames are already in memory; the scratch area must not leak.
        let _ = std::fs::remove_dir_all(&dir);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_index_parsing() {
        assert_eq!(frame_index("MyScene0042.png"), Some(42));
        assert_eq!(frame_index("frame_8.png"), Some(8));
        assert_eq!(frame_index("no_digits.png"), None);
        assert_eq!(frame_index("0001.jpg"), None);
    }

    #[test]
    fn test_args_parse() {
        let args = PreviewArgs::parse("{\"code\":\"x=1\",\"class_name\":\"Demo\"}").unwrap();
        assert_eq!(args.code, "x=1");
        assert_eq!(args.class_name, "Demo");

        assert!(PreviewArgs::parse("{\"code\":\"x=1\"}").is_err());
        assert!(PreviewArgs::parse("not json").is_err());
    }

    #[test]
    fn test_invocation_dirs_are_unique() {
        let invoker = ManimInvoker::new("/tmp/scenechat-test", 4);
        assert_ne!(invoker.invocation_dir(), invoker.invocation_dir());
    }

    #[test]
    fn test_tool_definition_shape() {
        let def = preview_tool_definition();
        assert_eq!(def.name, PREVIEW_TOOL_NAME);
        assert_eq!(def.parameters["required"][0], "code");
        assert_eq!(def.parameters["required"][1], "class_name");
    }
}

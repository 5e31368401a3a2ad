use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ToolType {
    YtDlp,
    Ffmpeg,
}

impl ToolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "yt-dlp",
            ToolType::Ffmpeg => "ffmpeg",
        }
    }

    /// Environment variable that pins the tool's location
    pub fn env_override(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "YT_MP3_YTDLP",
            ToolType::Ffmpeg => "YT_MP3_FFMPEG",
        }
    }

    /// The override path, if set and pointing at something that exists
    pub fn existing_override(&self) -> Option<String> {
        let path = std::env::var(self.env_override()).ok()?;
        if Path::new(&path).exists() {
            return Some(path);
        }
        tracing::warn!(
            "{} points at {} which does not exist, ignoring it",
            self.env_override(),
            path
        );
        None
    }

    fn version_arg(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "--version",
            ToolType::Ffmpeg => "-version", // ffmpeg uses a single dash
        }
    }

    /// Both tools the pipeline needs, in reporting order
    pub fn required() -> [ToolType; 2] {
        [ToolType::YtDlp, ToolType::Ffmpeg]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub tool_type: ToolType,
    pub version: Option<String>,
    pub path: Option<String>,
    pub is_available: bool,
}

pub struct ToolManager;

impl ToolManager {
    pub fn new() -> Self {
        Self
    }

    pub fn get_tool_info(&self, tool_type: ToolType) -> ToolInfo {
        let name = tool_type.as_str().to_string();
        let path = self.locate(&tool_type);
        let version = path.as_deref().and_then(|p| self.get_version(p, &tool_type));

        ToolInfo {
            name,
            tool_type,
            version,
            is_available: path.is_some(),
            path,
        }
    }

    pub fn get_all_tools(&self) -> Vec<ToolInfo> {
        ToolType::required()
            .into_iter()
            .map(|t| self.get_tool_info(t))
            .collect()
    }

    /// Names of required tools that cannot be found. Empty means ready.
    pub fn missing_tools(&self) -> Vec<&'static str> {
        ToolType::required()
            .iter()
            .filter(|t| self.locate(t).is_none())
            .map(|t| t.as_str())
            .collect()
    }

    /// Resolve a tool to a path: env override, common install paths, then PATH
    pub fn locate(&self, tool_type: &ToolType) -> Option<String> {
        let binary_name = tool_type.as_str();

        if let Some(path) = tool_type.existing_override() {
            return Some(path);
        }

        // 1. Try common paths first
        let common_paths = [
            format!("/opt/homebrew/bin/{}", binary_name),
            format!("/usr/local/bin/{}", binary_name),
            format!("/usr/bin/{}", binary_name),
        ];

        for path in common_paths {
            if Path::new(&path).exists() {
                return Some(path);
            }
        }

        // 2. Try PATH
        let finder = if cfg!(target_os = "windows") { "where" } else { "which" };
        if let Ok(output) = Command::new(finder).arg(binary_name).output() {
            if output.status.success() {
                let stdout = String::from_utf8_lossy(&output.stdout);
                if let Some(path) = stdout.lines().next().map(str::trim).filter(|p| !p.is_empty()) {
                    return Some(path.to_string());
                }
            }
        }

        None
    }

    fn get_version(&self, path: &str, tool_type: &ToolType) -> Option<String> {
        match Command::new(path).arg(tool_type.version_arg()).output() {
            Ok(output) if output.status.success() => {
                // ffmpeg prints a banner; the first line carries the version
                String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .next()
                    .map(|l| l.trim().to_string())
            }
            _ => None,
        }
    }
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Names of the external tools missing from this environment
pub fn detect_missing_tools() -> Vec<&'static str> {
    ToolManager::new().missing_tools()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_order() {
        let names: Vec<_> = ToolType::required().iter().map(|t| t.as_str()).collect();
        assert_eq!(names, vec!["yt-dlp", "ffmpeg"]);
    }

    #[test]
    fn test_missing_tools_agrees_with_tool_info() {
        let manager = ToolManager::new();
        let missing = manager.missing_tools();
        for info in manager.get_all_tools() {
            assert_eq!(missing.iter().any(|m| *m == info.name), !info.is_available);
        }
    }
}

//! Backend commands queued from UI to backend worker.

use shared::domain::FileSource;

pub enum BackendCommand {
    Classify,
    CheckHealth,
    LoadPreview { file_name: String, source: FileSource },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Classify => "classify",
            BackendCommand::CheckHealth => "check_health",
            BackendCommand::LoadPreview { .. } => "load_preview",
        }
    }
}

//! Backend commands queued from UI to backend worker.

pub enum BackendCommand {
    Submit { text: String },
    Shutdown,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Submit { .. } => "submit",
            Self::Shutdown => "shutdown",
        }
    }
}

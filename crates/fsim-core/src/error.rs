use crate::workflow::WorkflowError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("`{command}` exited with code {code:?}: {stderr}")]
    Execution {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out waiting for simulator {device_id} to boot")]
    BootTimeout { device_id: String },

    #[error("no iOS simulator found in device listing")]
    NoDeviceFound,

    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("a streaming session is already active")]
    TransportConflict,

    #[error("no active session matching id {0}")]
    Routing(String),

    #[error("{0}")]
    Workflow(Box<WorkflowError>),

    #[error("invalid tool parameters: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<WorkflowError> for Error {
    fn from(err: WorkflowError) -> Self {
        Error::Workflow(Box::new(err))
    }
}

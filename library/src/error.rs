use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate processor identifier '{0}'")]
    DuplicateIdentifier(String),
    #[error("processor '{0}' not found")]
    ProcessorNotFound(String),
    #[error("port '{0}' not found")]
    PortNotFound(String),
    #[error("property '{0}' not found")]
    PropertyNotFound(String),
    #[error("incompatible ports: {0} -> {1}")]
    IncompatiblePort(String, String),
    #[error("connection {0} -> {1} would create a cycle")]
    CyclicConnection(String, String),
    #[error("inport '{0}' already has a connection")]
    PortOccupied(String),
    #[error("link not allowed: {0} -> {1}")]
    LinkNotAllowed(String, String),
    #[error("property '{0}' is read-only")]
    ReadOnlyProperty(String),
    #[error("processor '{processor}' failed: {message}")]
    Process { processor: String, message: String },
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("conversion error: {0}")]
    Conversion(String),
    #[error("worker pool unavailable: {0}")]
    Pool(String),
    #[error("picking allocation failed: {0}")]
    Picking(String),
}

impl EngineError {
    pub fn process(processor: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Process {
            processor: processor.into(),
            message: message.into(),
        }
    }
}

use thiserror::Error;

/// Domain and infrastructure failures surfaced by the engine.
///
/// Every public operation returns one of these instead of panicking; a
/// failed operation never leaves partially-applied state behind.
#[derive(Error, Debug)]
pub enum GameError {
    #[error("unknown {kind} '{key}'")]
    NotFound { kind: &'static str, key: String },

    #[error("'{0}' is locked until a later era")]
    Locked(String),

    #[error("requires the {required} era")]
    EraRequired { required: String },

    #[error("prerequisite '{tech}' has not been researched")]
    PrerequisiteMissing { tech: String },

    #[error("'{tech}' is already researched")]
    AlreadyResearched { tech: String },

    #[error("'{key}' is already at its maximum count of {max}")]
    MaxCountReached { key: String, max: u32 },

    #[error("{0} is already in progress")]
    AlreadyInProgress(&'static str),

    #[error("no {0} in progress")]
    NothingInProgress(&'static str),

    #[error("insufficient {resource}: need {required:.1}, have {available:.1}")]
    InsufficientResource {
        resource: String,
        required: f64,
        available: f64,
    },

    #[error("not enough idle {workforce}: need {required}, have {available}")]
    InsufficientWorkers {
        workforce: String,
        required: u32,
        available: u32,
    },

    #[error("{workforce} cannot gather {resource}")]
    CannotGather { workforce: String, resource: String },

    #[error("population capacity of {capacity} would be exceeded")]
    PopulationCapacity { capacity: u32 },

    #[error("prestige requires reaching the {required} era")]
    PrestigeUnavailable { required: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("save version {found} is not supported (expected {expected})")]
    SaveVersion { found: u32, expected: u32 },

    #[error("corrupt save: {0}")]
    CorruptSave(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("catalog parse error: {0}")]
    CatalogParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, GameError>;

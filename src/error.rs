use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Please select both model and cloth files.")]
    MissingInput,

    #[error("failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("child process stdout was not captured")]
    StdoutUnavailable,

    #[error("error reading process output: {0}")]
    Io(#[from] io::Error),
}

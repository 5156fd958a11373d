use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("adc returned no data")]
    Empty,
    #[error("adc value not a number: {0:?}")]
    Parse(String),
    #[error("{program} exited with {status}: {stderr}")]
    Command {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("unexpected {program} output: {output:?}")]
    Output { program: String, output: String },
    #[error("sink command thread has stopped")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, HwError>;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error(
        "no configuration file found. Looked for:\n\
        - current directory: fio-balancer.local.yaml, fio-balancer.yaml, .fio-balancer.yaml\n\
        - ~/.config/fio-balancer/config.yaml\n\
        Pass --config or set FIO_BALANCER_CONFIG to point at a file"
    )]
    ConfigFileNotFound,

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration in {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: fiobalance_core::ConfigError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LoadError>;

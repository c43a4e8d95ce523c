use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("no component registered under `{name}`")]
    Resolution { name: String },

    #[error("component `{name}` is a {found}, expected one of: {expected}")]
    TypeConstraint { name: String, found: &'static str, expected: String },

    #[error("malformed component spec: {0}")]
    ConfigurationFormat(String),

    #[error("pipeline is already assembled")]
    AlreadyAssembled,

    #[error("pipeline was not assembled yet; call assemble() first")]
    NotAssembled,

    #[error("component `{component}` does not take a parameter named `{name}`")]
    UnknownParameter { component: String, name: String },

    #[error("override `{name}` does not match any declared parameter")]
    OverrideRouting { name: String },

    #[error("failed to construct `{component}`")]
    Construction {
        component: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Run(#[from] anyhow::Error),
}

use log4rs::config::{Deserializers, RawConfig};

mod default_pattern;

pub fn deserializers() -> Deserializers {
    let mut d = Deserializers::new();
    d.insert("default", default_pattern::DefaultPatternDeserializer);
    d
}

/// Builds the logger configuration from the raw `log` table.
///
/// Unlike [`log4rs::init_raw_config`], this also knows about the custom kinds
/// from [`deserializers`].
pub fn build_config(config: RawConfig) -> anyhow::Result<log4rs::Config> {
    let deserializers = deserializers();
    let (appenders, errors) = config.appenders_lossy(&deserializers);
    if !errors.is_empty() {
        return Err(errors.into());
    }

    let config = log4rs::Config::builder()
        .appenders(appenders)
        .loggers(config.loggers())
        .build(config.root())?;

    Ok(config)
}

/// Installs the global logger.
pub fn init(config: RawConfig) -> anyhow::Result<()> {
    log4rs::init_config(build_config(config)?)?;
    Ok(())
}

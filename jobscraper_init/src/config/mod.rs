use serde::Deserialize;

use crate::db::models::OnConflict;

pub mod setup;

#[derive(Debug, Deserialize)]
pub struct JConfig {
    pub mongodb: JMongoConfig,
    #[serde(default)]
    pub log: log4rs::config::RawConfig,
}

fn default_database() -> String {
    "jobscraper".to_owned()
}

#[derive(Debug, Deserialize)]
pub struct JMongoConfig {
    /// The connection string of the MongoDB deployment.
    pub uri: String,
    /// The database to provision.
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default)]
    pub on_conflict: OnConflict,
}

#[cfg(test)]
mod tests {
    use super::setup::{Builder, Env, TomlText};
    use super::*;

    const DEFAULT_CONFIG: &str = include_str!("../../assets/default_config.toml");

    #[test]
    fn default_config() {
        let config: JConfig = Builder::new()
            .add_layer(TomlText::new(DEFAULT_CONFIG))
            .build()
            .expect("default config must deserialize");

        assert_eq!(config.mongodb.uri, "mongodb://localhost:27017", "uri");
        assert_eq!(config.mongodb.database, "jobscraper", "database");
        assert_eq!(config.mongodb.on_conflict, OnConflict::Fail, "on_conflict");
    }

    #[test]
    fn database_defaults() {
        let config: JConfig = Builder::new()
            .add_layer(TomlText::new("mongodb.uri = \"mongodb://db:27017\""))
            .build()
            .expect("minimal config must deserialize");

        assert_eq!(config.mongodb.database, "jobscraper", "database default");
    }

    #[test]
    fn env_overrides_default() {
        let config: JConfig = Builder::new()
            .add_layer(TomlText::new(DEFAULT_CONFIG))
            .add_layer(Env::from_vars([
                ("JOBSCRAPER__MONGODB__URI", "mongodb://mongo:27017"),
                ("JOBSCRAPER__MONGODB__ON_CONFLICT", "recreate"),
            ]))
            .build()
            .expect("layered config must deserialize");

        assert_eq!(config.mongodb.uri, "mongodb://mongo:27017", "uri from env");
        assert_eq!(config.mongodb.on_conflict, OnConflict::Recreate, "on_conflict from env");
        assert_eq!(config.mongodb.database, "jobscraper", "database kept");
    }

    #[test]
    fn missing_uri() {
        Builder::new()
            .add_layer(TomlText::new("[mongodb]"))
            .build::<JConfig>()
            .expect_err("uri is required");
    }
}

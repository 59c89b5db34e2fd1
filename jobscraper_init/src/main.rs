mod build;
mod config;
mod db;
mod logging;
mod prelude;
mod report;

fn main() -> anyhow::Result<()> {
    use std::borrow::Cow;

    use crate::build::{GIT_HASH, VERSION};
    use crate::config::JConfig;
    use crate::prelude::*;

    return inner();

    // short async fn to reduce `tokio::main` scope
    #[tokio::main]
    async fn inner() -> anyhow::Result<()> {
        // run the program and clean up
        let res = run().await;
        if let Err(why) = &res {
            log::error!("Exiting due to error: {why:?}");
        }

        log::logger().flush();
        res
    }

    // actual main logic
    async fn run() -> Result {
        let config = build_config()?;
        crate::logging::init(config.log)?;

        log::info!(target: "jobscraper_init::version", "jobscraper_init v{VERSION} - {GIT_HASH}");

        let db = crate::db::connect(&config.mongodb).await?;
        log::info!("Provisioning database {}.", db.name());

        let run = crate::db::provision(&db, config.mongodb.on_conflict).await?;
        log::info!(
            "Provisioned {}/{} with {} indices (collection {}).",
            run.database,
            run.collection,
            run.indices.len(),
            if run.created_collection { "created" } else { "existed" },
        );

        crate::report::write_summary(std::io::stdout().lock(), &run)
            .context("cannot write summary to stdout")?;
        Ok(())
    }

    fn profile() -> Result<Cow<'static, str>> {
        use std::env::VarError::NotPresent;
        use std::env::var;

        match var("JOBSCRAPER_PROFILE") {
            Ok(value) => Ok(value.into()),
            Err(NotPresent) => Ok("release".into()),
            Err(err) => Err(err).context("cannot load JOBSCRAPER_PROFILE env variable"),
        }
    }

    fn build_config() -> Result<JConfig> {
        use crate::config::setup::{Builder, Env, File, TomlText};

        let profile = profile()?;
        let profile_config = format!("jobscraper_init.{profile}.toml");
        let default_config = include_str!("../assets/default_config.toml");

        Builder::new()
            .add_layer(TomlText::new(default_config))
            .add_layer(File::new("jobscraper_init.toml").required(false))
            .add_layer(File::new(&profile_config).required(false))
            .add_layer(Env::new())
            .build()
    }
}

use axum::extract::FromRef;
use axum_template::engine::Engine;
use tera::Tera;

use crate::auth::Authenticator;
use crate::config::Config;
use crate::database::Database;
use crate::error::{ApplicationError, LoadTemplatesSnafu};
use crate::prelude::*;
use crate::storage::MediaStore;

const TEMPLATE_GLOB: &str = "templates/**/*.html";

pub type AppEngine = Engine<Tera>;

/// Shared application state. Everything in here is cheap to clone.
#[derive(Clone, new)]
pub struct App {
    pub engine: AppEngine,
    pub database: Database,
    pub media: MediaStore,
    pub auth: Authenticator,
}

pub fn create_app(config: &Config, database: Database) -> Result<App, ApplicationError> {
    let tera = Tera::new(TEMPLATE_GLOB).context(LoadTemplatesSnafu)?;

    Ok(App::new(
        Engine::from(tera),
        database.clone(),
        MediaStore::new(config.media_root.clone()),
        Authenticator::new(config.session_secret.clone(), database),
    ))
}

impl FromRef<App> for AppEngine {
    fn from_ref(app: &App) -> Self {
        app.engine.clone()
    }
}

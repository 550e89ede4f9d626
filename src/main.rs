use dotenvy::dotenv;
use snafu::ResultExt;
use tokio::net::TcpListener;

use benshi::database::Database;
use benshi::error::{
    ApplicationError, BindAddressSnafu, ConnectDatabaseSnafu, SeedAdminSnafu, WebServerSnafu,
};
use benshi::{api, config, logger};

#[tokio::main]
async fn main() -> Result<(), ApplicationError> {
    dotenv().ok();

    let config = config::load()?;

    let _guard = logger::init(&config)?;

    let database = Database::connect(&config.surreal)
        .await
        .context(ConnectDatabaseSnafu)?;

    let app = api::create_app(&config, database)?;

    if let Some(admin) = &config.admin {
        app.auth.seed_admin(admin).await.context(SeedAdminSnafu)?;
    }

    let router = api::create_router(&config, app);

    let listener = TcpListener::bind(config.host)
        .await
        .context(BindAddressSnafu {
            address: config.host,
        })?;

    tracing::info!(address = %config.host, "serving");

    axum::serve(listener, router).await.context(WebServerSnafu)
}

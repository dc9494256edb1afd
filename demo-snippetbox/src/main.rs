use std::time::Duration;

use snippetbox::{ModelError, Models, RequestContext};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEMO_EMAIL: &str = "demo@example.com";
const DEMO_PASSWORD: &str = "demo-password";

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        #[cfg(debug_assertions)]
        {
            format!("snippetbox=debug,{}=debug,info", env!("CARGO_CRATE_NAME")).into()
        }

        #[cfg(not(debug_assertions))]
        {
            "info".into()
        }
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let models = Models::from_env().await?;
    // Every call below gets the same budget a request handler would
    let ctx = || RequestContext::new().with_timeout(Duration::from_secs(5));

    match models
        .users
        .insert(&ctx(), "Demo User", DEMO_EMAIL, DEMO_PASSWORD)
        .await
    {
        Ok(id) => tracing::info!(user_id = id, "Registered demo user"),
        Err(ModelError::DuplicateEmail) => tracing::info!("Demo user already registered"),
        Err(e) => return Err(e.into()),
    }

    let user_id = models
        .users
        .authenticate(&ctx(), DEMO_EMAIL, DEMO_PASSWORD)
        .await?;
    let user = models.users.get(&ctx(), user_id).await?;
    tracing::info!(user_id, name = %user.name, "Logged in");

    let snippet_id = models
        .snippets
        .insert(
            &ctx(),
            "An old silent pond",
            "An old silent pond...\nA frog jumps into the pond,\nsplash! Silence again.",
            7,
        )
        .await?;
    tracing::info!(snippet_id, "Created snippet");

    for snippet in models.snippets.latest(&ctx()).await? {
        println!(
            "#{:<4} {:<32} expires {}",
            snippet.id,
            snippet.title,
            snippet.expires.format("%Y-%m-%d %H:%M UTC")
        );
    }

    Ok(())
}

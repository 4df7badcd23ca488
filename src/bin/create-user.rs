/// Create a board account from the command line
///
/// Usage: create-user --email EMAIL --first-name NAME --last-name NAME --nickname NICK --password PASS
use board_api::{
    models::user::CreateUserRequest,
    services::users::UserService,
};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use validator::Validate;

#[derive(Parser)]
#[command(name = "create-user", about = "Create a user in the board database")]
struct Args {
    #[arg(long)]
    email: String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    nickname: String,
    /// Plaintext password, hashed with bcrypt before storage
    #[arg(long)]
    password: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let req = CreateUserRequest {
        email: args.email,
        first_name: args.first_name,
        last_name: args.last_name,
        nickname: args.nickname,
        password: args.password,
    };
    req.validate()?;

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable not set"))?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await?;
    board_api::db::run_migrations(&pool).await?;

    match UserService::create(&pool, &req).await? {
        Some(user) => tracing::info!("Created user {} ({})", user.email, user.id),
        None => anyhow::bail!("a user with email {} already exists", req.email),
    }
    Ok(())
}

use config::Config;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub type PgPool = Pool<ConnectionManager<PgConnection>>;
pub type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub struct Settings {
    pub database_url: String,
    pub pool_size: u32,
    pub timeout_seconds: u64,
    pub bind_address: String,
}

/// Reads `appsettings.toml`; environment variables loaded via dotenv can
/// override the file through the config crate's environment source.
pub fn load_settings() -> Settings {
    let settings = Config::builder()
        .add_source(config::File::with_name("appsettings"))
        .add_source(config::Environment::with_prefix("CITYSHOP").separator("_"))
        .build()
        .expect("Failed to load configuration");

    Settings {
        database_url: settings
            .get_string("database.url")
            .expect("Database URL not found"),
        pool_size: settings.get_int("database.pool_size").unwrap_or(10) as u32,
        timeout_seconds: settings.get_int("database.timeout_seconds").unwrap_or(30) as u64,
        bind_address: settings
            .get_string("server.bind")
            .unwrap_or_else(|_| "127.0.0.1:3001".to_string()),
    }
}

pub fn init_pool(settings: &Settings) -> PgPool {
    let manager = ConnectionManager::<PgConnection>::new(&settings.database_url);
    Pool::builder()
        .max_size(settings.pool_size)
        .connection_timeout(std::time::Duration::from_secs(settings.timeout_seconds))
        .build(manager)
        .expect("Failed to create pool")
}

pub fn run_migrations(pool: &PgPool) {
    let conn = &mut pool.get().expect("Failed to get connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run migrations");
}

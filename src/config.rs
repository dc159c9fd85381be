use crate::adapters::{LedgerStore, MemoryAdapter, Namespaced};
use crate::error::Error;

pub const ENV_STORE_URL: &str = "REGISTRY_STORE_URL";
pub const ENV_NAMESPACE: &str = "REGISTRY_NAMESPACE";
pub const ENV_MAX_CONNECTIONS: &str = "REGISTRY_MAX_CONNECTIONS";

pub const DEFAULT_STORE_URL: &str = "memory:";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Where the registry keeps its records.
///
/// | URL                        | Store                             |
/// |----------------------------|-----------------------------------|
/// | `memory:`                  | [`MemoryAdapter`]                 |
/// | `sqlite::memory:`          | SQLite, in memory (`sqlite`)      |
/// | `sqlite:<path>`            | SQLite file, created if missing   |
/// | `postgres://…`             | PostgreSQL (`postgres`)           |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub url: String,
    pub namespace: Option<String>,
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_URL)
    }
}

impl StoreConfig {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            namespace: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Read `REGISTRY_STORE_URL`, `REGISTRY_NAMESPACE` and
    /// `REGISTRY_MAX_CONNECTIONS`, falling back to defaults when unset.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = Self::new(
            &lookup(ENV_STORE_URL).unwrap_or_else(|| DEFAULT_STORE_URL.to_string()),
        );

        if let Some(namespace) = lookup(ENV_NAMESPACE).filter(|ns| !ns.is_empty()) {
            config.namespace = Some(namespace);
        }

        if let Some(raw) = lookup(ENV_MAX_CONNECTIONS) {
            config.max_connections = raw.parse().map_err(|_| {
                Error::Config(format!("{} must be a positive integer, got {:?}", ENV_MAX_CONNECTIONS, raw))
            })?;
        }

        if config.max_connections == 0 {
            return Err(Error::Config(format!("{} must be at least 1", ENV_MAX_CONNECTIONS)));
        }

        Ok(config)
    }
}

/// Open the store described by `config`, with its schema initialized.
pub async fn open_store(config: &StoreConfig) -> Result<Box<dyn LedgerStore>, Error> {
    let store = open_backend(config).await?;

    match &config.namespace {
        Some(namespace) => Ok(Box::new(Namespaced::new(store, namespace)?)),
        None => Ok(store),
    }
}

async fn open_backend(config: &StoreConfig) -> Result<Box<dyn LedgerStore>, Error> {
    let url = config.url.as_str();

    if url == "memory:" {
        return Ok(Box::new(MemoryAdapter::new()));
    }

    if url.starts_with("sqlite:") {
        return open_sqlite(url, config.max_connections).await;
    }

    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        return open_postgres(url, config.max_connections).await;
    }

    Err(Error::Config(format!("unsupported store url: {}", url)))
}

#[cfg(feature = "sqlite")]
async fn open_sqlite(url: &str, max_connections: u32) -> Result<Box<dyn LedgerStore>, Error> {
    use crate::adapters::sqlite::SqliteAdapter;

    // Every connection to `sqlite::memory:` opens its own database.
    let adapter = if url == "sqlite::memory:" {
        SqliteAdapter::new_memory().await?
    } else if url.contains('?') {
        SqliteAdapter::connect(url, max_connections).await?
    } else {
        SqliteAdapter::connect(&format!("{}?mode=rwc", url), max_connections).await?
    };
    adapter.init_schema().await?;
    Ok(Box::new(adapter))
}

#[cfg(not(feature = "sqlite"))]
async fn open_sqlite(url: &str, _max_connections: u32) -> Result<Box<dyn LedgerStore>, Error> {
    Err(Error::Config(format!("{} requires the `sqlite` feature", url)))
}

#[cfg(feature = "postgres")]
async fn open_postgres(url: &str, max_connections: u32) -> Result<Box<dyn LedgerStore>, Error> {
    use crate::adapters::postgres::PostgresAdapter;

    let adapter = PostgresAdapter::connect(url, max_connections).await?;
    adapter.init_schema().await?;
    Ok(Box::new(adapter))
}

#[cfg(not(feature = "postgres"))]
async fn open_postgres(_url: &str, _max_connections: u32) -> Result<Box<dyn LedgerStore>, Error> {
    Err(Error::Config(
        "postgres store urls require the `postgres` feature".to_string(),
    ))
}

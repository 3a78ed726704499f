//! Process-lifetime service container.
//!
//! Shared dependencies (database pool, identity-provider client) are built
//! on the first request and never rebuilt. The guard is an
//! initialize-or-await primitive, not a boolean check-then-set: concurrent
//! first requests all wait on a single initialization, a failure is
//! returned to the request that observed it without marking the container
//! ready, and a later request simply retries. Once initialization
//! succeeds, the handles are immutable for the rest of the process's life.

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::info;

use crate::session::{HttpSessionProvider, SessionProvider};
use crate::tenant::postgres::PgTenantStore;
use crate::tenant::store::TenantStore;

/// Immutable bundle of shared dependencies.
pub struct Services {
    pub store: Arc<dyn TenantStore>,
    pub sessions: Arc<dyn SessionProvider>,
    /// Present when the store is database-backed; `/health` pings it.
    pub pool: Option<PgPool>,
}

impl Services {
    /// Connects the production dependencies: Postgres pool plus the
    /// HTTP-backed identity provider client.
    ///
    /// # Errors
    /// Returns an error when the database is unreachable or the provider
    /// client cannot be built.
    pub async fn connect(settings: &ServiceSettings) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(&settings.dsn)
            .await
            .context("Failed to connect to database")?;

        let sessions = HttpSessionProvider::new(&settings.auth_base_url)?;

        info!("Shared services initialized");

        Ok(Self {
            store: Arc::new(PgTenantStore::new(pool.clone())),
            sessions: Arc::new(sessions),
            pool: Some(pool),
        })
    }
}

#[derive(Clone, Debug)]
pub struct ServiceSettings {
    pub dsn: String,
    pub auth_base_url: String,
}

type ServiceFuture = Pin<Box<dyn Future<Output = Result<Arc<Services>>> + Send>>;
type ServiceFactory = Box<dyn Fn() -> ServiceFuture + Send + Sync>;

/// Lazy, once-guarded access to [`Services`].
pub struct ServiceInit {
    factory: ServiceFactory,
    cell: OnceCell<Arc<Services>>,
}

impl ServiceInit {
    /// Standard production wiring from settings.
    #[must_use]
    pub fn new(settings: ServiceSettings) -> Self {
        Self::with_factory(Box::new(move || {
            let settings = settings.clone();
            Box::pin(async move { Services::connect(&settings).await.map(Arc::new) })
        }))
    }

    /// Custom wiring; the factory runs at most once concurrently and only
    /// until it first succeeds.
    #[must_use]
    pub fn with_factory(factory: ServiceFactory) -> Self {
        Self {
            factory,
            cell: OnceCell::new(),
        }
    }

    /// Container that is ready from the start (tests, embedding).
    #[must_use]
    pub fn preset(services: Arc<Services>) -> Self {
        Self {
            factory: Box::new(|| {
                Box::pin(async { Err::<Arc<Services>, _>(anyhow::anyhow!("services were preset")) })
            }),
            cell: OnceCell::new_with(Some(services)),
        }
    }

    /// Returns the shared services, initializing them on first use.
    ///
    /// # Errors
    /// Returns the initialization failure to this caller; the container
    /// stays uninitialized so a later call can retry.
    pub async fn services(&self) -> Result<Arc<Services>> {
        self.cell
            .get_or_try_init(|| (self.factory)())
            .await
            .cloned()
    }

    /// The services, if initialization has already completed.
    #[must_use]
    pub fn ready(&self) -> Option<Arc<Services>> {
        self.cell.get().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionProvider;
    use crate::tenant::store::MemoryTenantStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn memory_services() -> Arc<Services> {
        Arc::new(Services {
            store: Arc::new(MemoryTenantStore::new()),
            sessions: Arc::new(MemorySessionProvider::new()),
            pool: None,
        })
    }

    #[tokio::test]
    async fn concurrent_first_calls_initialize_exactly_once() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let init = Arc::new(ServiceInit::with_factory(Box::new(move || {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(memory_services())
            })
        })));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let init = init.clone();
            handles.push(tokio::spawn(async move { init.services().await.is_ok() }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_initialization_does_not_stick() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let init = ServiceInit::with_factory(Box::new(move || {
            let counter = counter.clone();
            Box::pin(async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(anyhow::anyhow!("database offline"))
                } else {
                    Ok(memory_services())
                }
            })
        }));

        assert!(init.services().await.is_err());
        assert!(init.ready().is_none());

        assert!(init.services().await.is_ok());
        assert!(init.ready().is_some());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);

        // Ready containers never re-run the factory.
        assert!(init.services().await.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn preset_services_are_ready_immediately() {
        let init = ServiceInit::preset(memory_services());
        assert!(init.ready().is_some());
        assert!(init.services().await.is_ok());
    }
}

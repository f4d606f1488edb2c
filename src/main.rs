use fedgatt::ap::Actor;
use fedgatt::collection::Pager;
use fedgatt::config;
use fedgatt::dereference::Dereferencer;
use fedgatt::err::FatalErr;
use fedgatt::inbox::{Authenticator, Federator, StoreProcessor};
use fedgatt::pool::WorkerPool;
use fedgatt::request::Handler;
use fedgatt::signature::LocalKey;
use fedgatt::store::{PgPool, Store};
use fedgatt::transport::{HttpTransport, Transport};

use std::net::SocketAddr;
use std::sync::Arc;

fn main() -> Result<(), FatalErr> {
    config::merge_dotenv()?;
    pretty_env_logger::try_init()?;
    let (postgres_cfg, federation_cfg, deployment_cfg) =
        config::from_env(dotenv::vars().collect())?;

    let base_url = deployment_cfg.base_url();
    let key = Arc::new(LocalKey::new(
        format!("{}/actor#main-key", base_url),
        federation_cfg.instance_key(),
    ));
    let instance_actor = Actor::instance(&base_url, &key)?;

    let store: Arc<dyn Store> = Arc::new(PgPool::new(&postgres_cfg)?);
    let transport: Arc<dyn Transport> =
        Arc::new(HttpTransport::new(key, *federation_cfg.fetch_timeout)?);
    let pool = Arc::new(WorkerPool::new(
        *federation_cfg.workers,
        *federation_cfg.queue_size,
    ));

    let authenticator = Authenticator::new(
        store.clone(),
        Dereferencer::new(store.clone(), transport),
        *federation_cfg.signature_max_age,
    );
    let federator = Federator::new(
        store.clone(),
        authenticator,
        pool.clone(),
        Arc::new(StoreProcessor::new(store.clone())),
    );
    let handler = Handler::new(
        store,
        federator,
        pool.clone(),
        Pager::new(*federation_cfg.page_size),
        instance_actor,
        *federation_cfg.authorized_fetch,
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(serve(handler, pool, deployment_cfg.socket_addr()))
}

/// Serve until Ctrl-C, then let the worker pool drain
async fn serve(handler: Handler, pool: Arc<WorkerPool>, addr: SocketAddr) -> Result<(), FatalErr> {
    start_pool(&pool)?;

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => log::info!("Received Ctrl-C; no longer accepting requests"),
            Err(e) => {
                log::error!("Could not listen for Ctrl-C: {}", e);
                futures::future::pending::<()>().await
            }
        }
    };
    let (addr, server) =
        warp::serve(handler.routes()).try_bind_with_graceful_shutdown(addr, shutdown)?;
    log::info!("Listening on {}", addr);
    server.await;

    log::info!("Draining {} queued activities", pool.queue_depth());
    if !pool.stop().await {
        log::error!("Worker pool was not running at shutdown; queued activities were dropped");
    }
    Ok(())
}

fn start_pool(pool: &WorkerPool) -> Result<(), FatalErr> {
    if pool.start() {
        Ok(())
    } else {
        Err(FatalErr::WorkerPool)
    }
}

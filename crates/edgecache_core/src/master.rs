//! Master process: binds the listener and runs the accept loop.

use std::net::SocketAddr;
use std::sync::Arc;

use edgecache_cache::CacheManager;
use edgecache_config::{EdgeConfig, OriginBaseUrl};
use edgecache_origin::HttpOrigin;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, info, instrument};

use crate::handler::EdgeHandler;
use crate::worker::handle_connection;

pub struct Master {
    cfg: Arc<EdgeConfig>,
    handler: Arc<EdgeHandler<HttpOrigin>>,
}

impl Master {
    /// Wire the shared cache, the origin client and the handler together.
    /// Fails when the configured base URL cannot be parsed; validation
    /// normally catches that earlier.
    pub fn new(cfg: EdgeConfig) -> anyhow::Result<Self> {
        let cfg = Arc::new(cfg);

        let base = OriginBaseUrl::parse(&cfg.origin.base_url)
            .map_err(|reason| anyhow::anyhow!("invalid origin.base_url: {reason}"))?;

        let cache = Arc::new(CacheManager::new(
            cfg.cache.default_ttl(),
            cfg.cache.max_object_bytes(),
        ));
        let origin = HttpOrigin::new(base.clone(), &cfg.origin);
        let handler = Arc::new(EdgeHandler::new(base, cache, origin));

        Ok(Self { cfg, handler })
    }

    /// Starts the master: binds the listener and runs the accept loop until
    /// it fails.
    pub async fn run(self) -> anyhow::Result<()> {
        info!(target: "edgecache::master", "Starting edgecache master");
        info!(
            target: "edgecache::master",
            listen = %self.cfg.server.listen,
            origin_base_url = %self.cfg.origin.base_url,
            max_connections = self.cfg.server.max_connections,
            cache_ttl_secs = self.cfg.cache.default_ttl_secs,
            "Configuration loaded"
        );

        let max_conns = self.cfg.server.max_connections as usize;
        let semaphore = Arc::new(Semaphore::new(max_conns));
        info!(
            target: "edgecache::master",
            max_conns,
            "Global connection semaphore initialized"
        );

        let listener = bind_listener(&self.cfg.server.listen).await?;

        accept_loop(
            listener,
            self.cfg.server.listen.clone(),
            semaphore,
            self.handler,
            self.cfg,
        )
        .await
    }
}

async fn bind_listener(listen_addr: &str) -> anyhow::Result<TcpListener> {
    info!(
        target: "edgecache::master",
        listen = %listen_addr,
        "Binding listener"
    );

    match TcpListener::bind(listen_addr).await {
        Ok(listener) => {
            info!(
                target: "edgecache::master",
                listen = %listen_addr,
                "Bind() successful"
            );
            Ok(listener)
        }
        Err(e) => {
            error!(
                target: "edgecache::master",
                listen = %listen_addr,
                error = ?e,
                "Failed to bind listener"
            );
            Err(e.into())
        }
    }
}

struct AcceptedConn {
    stream: TcpStream,
    addr: SocketAddr,
    permit: OwnedSemaphorePermit,
}

async fn accept_with_permit(
    listener: &TcpListener,
    listen_addr: &str,
    semaphore: &Arc<Semaphore>,
) -> anyhow::Result<AcceptedConn> {
    let (stream, addr) = match listener.accept().await {
        Ok(pair) => pair,
        Err(e) => {
            error!(
                target: "edgecache::master",
                listen = %listen_addr,
                error = ?e,
                "Failed to accept connection"
            );
            return Err(e.into());
        }
    };

    let permit = match semaphore.clone().acquire_owned().await {
        Ok(p) => p,
        Err(e) => {
            error!(
                target: "edgecache::master",
                listen = %listen_addr,
                error = ?e,
                "Failed to acquire connection permit"
            );
            return Err(e.into());
        }
    };

    let available = semaphore.available_permits();
    debug!(
        target: "edgecache::master",
        listen = %listen_addr,
        client_addr = %addr,
        available_permits = available,
        "Connection accepted"
    );

    Ok(AcceptedConn {
        stream,
        addr,
        permit,
    })
}

#[instrument(
    skip(listener, semaphore, handler, cfg),
    fields(
        listen = %listen_addr,
        available_permits = semaphore.available_permits(),
    )
)]
async fn accept_loop(
    listener: TcpListener,
    listen_addr: String,
    semaphore: Arc<Semaphore>,
    handler: Arc<EdgeHandler<HttpOrigin>>,
    cfg: Arc<EdgeConfig>,
) -> anyhow::Result<()> {
    info!(
        target: "edgecache::master",
        listen = %listen_addr,
        "accept_loop started for listening socket"
    );

    loop {
        let AcceptedConn {
            stream,
            addr,
            permit,
        } = accept_with_permit(&listener, &listen_addr, &semaphore).await?;

        let handler_clone = handler.clone();
        let cfg_clone = cfg.clone();
        let listen_for_span = listen_addr.clone();

        tokio::spawn(async move {
            let _permit = permit;
            let span = tracing::info_span!(
                "worker_connection",
                client_addr = %addr,
                listen = %listen_for_span,
            );
            let _enter = span.enter();

            debug!(
                target: "edgecache::worker",
                "Worker spawned for incoming connection"
            );

            if let Err(e) =
                handle_connection(Box::new(stream), addr, handler_clone, cfg_clone).await
            {
                error!(
                    target: "edgecache::worker",
                    client_addr = %addr,
                    error = ?e,
                    "Error while handling connection"
                );
            } else {
                debug!(
                    target: "edgecache::worker",
                    client_addr = %addr,
                    "Connection handled successfully"
                );
            }

            debug!(
                target: "edgecache::master",
                client_addr = %addr,
                "Permit released after connection closed"
            );
        });
    }
}

//! `Server` builder and accept loop.
//!
//! This is the entry point for running a Mulligan server. It ties the
//! layers together: transport → protocol → sessions/lobbies → handlers,
//! with the profile store and game engine plugged in at the seams.

use std::path::PathBuf;
use std::sync::Arc;

use mulligan_events::{EventBus, TraceObserver};
use mulligan_lobby::LobbyRegistry;
use mulligan_session::{ProfileStore, SessionRegistry};
use mulligan_transport::TcpTransport;
use tokio::sync::{Mutex, watch};

use crate::catalog::CardCatalog;
use crate::engine::GameEngine;
use crate::handler::handle_connection;
use crate::ServerError;

/// Server-wide limits, applied by the handlers rather than inside any
/// one registry.
///
/// Create one with `ServerConfig::default()` (everything unlimited) and
/// override the fields you care about.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Maximum concurrent sessions. 0 means unlimited.
    pub max_sessions: usize,

    /// Maximum concurrent lobbies. 0 means unlimited.
    pub max_lobbies: usize,
}

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The two
/// registries sit behind their own `Mutex`es: locking the roster for a
/// broadcast snapshot never touches the lobby table, and vice versa.
pub(crate) struct ServerState<P: ProfileStore, E: GameEngine> {
    pub(crate) sessions: Mutex<SessionRegistry>,
    pub(crate) lobbies: Mutex<LobbyRegistry>,
    pub(crate) events: EventBus,
    pub(crate) profiles: P,
    pub(crate) engine: E,
    pub(crate) catalog: CardCatalog,
    pub(crate) config: ServerConfig,
}

/// Builder for configuring and starting a server.
///
/// # Example
///
/// ```rust,ignore
/// let server = ServerBuilder::new()
///     .bind("0.0.0.0:8888")
///     .catalog_path("data/cards.json")
///     .build(profiles, engine)
///     .await?;
/// server.run().await
/// ```
pub struct ServerBuilder {
    bind_addr: String,
    catalog_path: Option<PathBuf>,
    config: ServerConfig,
}

impl ServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8888".to_string(),
            catalog_path: None,
            config: ServerConfig::default(),
        }
    }

    /// Sets the address to bind the listener to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the card-catalog file to load at startup.
    pub fn catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }

    /// Sets the server-wide session and lobby limits.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds the listener and assembles the server.
    ///
    /// A configured catalog that fails to load is a warning, not an
    /// error: the server starts with an empty catalog and every other
    /// operation works normally.
    pub async fn build<P: ProfileStore, E: GameEngine>(
        self,
        profiles: P,
        engine: E,
    ) -> Result<Server<P, E>, ServerError> {
        let transport = TcpTransport::bind(&self.bind_addr).await?;

        let catalog = match &self.catalog_path {
            Some(path) => match CardCatalog::load_from_file(path) {
                Ok(catalog) => {
                    tracing::info!(
                        path = %path.display(),
                        cards = catalog.len(),
                        "card catalog loaded"
                    );
                    catalog
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "card catalog load failed, continuing with empty catalog"
                    );
                    CardCatalog::new()
                }
            },
            None => CardCatalog::new(),
        };

        let events = EventBus::new();
        events.subscribe(Arc::new(TraceObserver));

        let (shutdown, _) = watch::channel(false);

        Ok(Server {
            transport,
            state: Arc::new(ServerState {
                sessions: Mutex::new(SessionRegistry::new()),
                lobbies: Mutex::new(LobbyRegistry::new()),
                events,
                profiles,
                engine,
                catalog,
                config: self.config,
            }),
            shutdown,
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Stops a running [`Server`] from another task.
#[derive(Clone)]
pub struct ServerHandle {
    shutdown: watch::Sender<bool>,
}

impl ServerHandle {
    /// Flips the running flag. The accept loop observes the change,
    /// closes the listener, and returns; connections already being
    /// handled run until their own streams close.
    pub fn stop(&self) {
        // send_replace stores the flag even when the accept loop hasn't
        // subscribed yet, so a stop issued before run() still lands.
        self.shutdown.send_replace(true);
    }
}

/// A bound Mulligan server, ready to accept connections.
pub struct Server<P: ProfileStore, E: GameEngine> {
    transport: TcpTransport,
    state: Arc<ServerState<P, E>>,
    shutdown: watch::Sender<bool>,
}

impl<P: ProfileStore, E: GameEngine> Server<P, E> {
    /// Creates a new builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns the card catalog loaded at startup.
    pub fn catalog(&self) -> &CardCatalog {
        &self.state.catalog
    }

    /// Returns a handle that can stop this server.
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            shutdown: self.shutdown.clone(),
        }
    }

    /// Runs the accept loop until [`ServerHandle::stop`] is called.
    ///
    /// Each accepted connection gets its own handler task; an accept
    /// failure is logged and the loop keeps serving. Returning drops the
    /// listener, so pending `accept`s end with the socket instead of
    /// blocking forever.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("mulligan server running");
        let mut stopping = self.shutdown.subscribe();

        loop {
            tokio::select! {
                accepted = self.transport.accept() => match accepted {
                    Ok((connection, read_half)) => {
                        self.state.events.notify(
                            &mulligan_events::ServerEvent::Connected {
                                connection: connection.id(),
                                peer: connection.peer(),
                            },
                        );
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(
                                connection, read_half, state,
                            )
                            .await
                            {
                                tracing::debug!(
                                    error = %e,
                                    "connection ended with error"
                                );
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
                _ = stopping.wait_for(|stopped| *stopped) => {
                    tracing::info!("server stopping, closing listener");
                    return Ok(());
                }
            }
        }
    }
}

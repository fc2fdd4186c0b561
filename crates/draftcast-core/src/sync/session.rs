//! Session management and state synchronization
//!
//! A [`MirrorSession`] owns the endpoint lifecycle and the single active
//! channel. Construction registers the process on the rendezvous network;
//! [`MirrorSession::shutdown`] unregisters unconditionally, which implicitly
//! terminates any active channel without a close handshake.
//!
//! The controller listens indefinitely for inbound offers. Each new channel
//! replaces the previous one: only the most-recently-connected display is
//! driven, though displays may dial in sequence. On every board change with
//! an active channel, the whole board goes out as one frame, fire-and-forget.
//! Changes made while no channel is active are dropped, never queued; a
//! display converges via the single snapshot pushed when its channel opens.

use iroh::discovery::static_provider::StaticProvider;
use iroh::endpoint::Connection;
use iroh::protocol::{AcceptError, ProtocolHandler, Router};
use iroh::{Endpoint, EndpointId, SecretKey};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

use crate::board::Board;
use crate::error::{MirrorError, MirrorResult};
use crate::store::BoardStore;
use crate::sync::events::{SessionEvent, SessionPhase};
use crate::sync::protocol::{MirrorMessage, WireMessage, MAX_FRAME_SIZE, MIRROR_ALPN};
use crate::token::ShareToken;

/// Default capacity for the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Accepts inbound mirror offers and hands them to the push pump
#[derive(Debug, Clone)]
struct MirrorAcceptor {
    offer_tx: mpsc::UnboundedSender<Connection>,
}

impl ProtocolHandler for MirrorAcceptor {
    fn accept(
        &self,
        conn: Connection,
    ) -> impl std::future::Future<Output = Result<(), AcceptError>> + Send {
        let offer_tx = self.offer_tx.clone();

        async move {
            let remote = conn.remote_id();
            debug!(peer = %remote, "Inbound mirror offer");

            if offer_tx.send(conn.clone()).is_err() {
                // Session is shutting down; let the connection drop
                return Ok(());
            }

            // Keep the handler alive until the channel dies so the router
            // does not tear the connection down under the pump.
            let reason = conn.closed().await;
            debug!(peer = %remote, ?reason, "Mirror channel ended");
            Ok(())
        }
    }
}

/// An established mirror session, either role
///
/// # Example
///
/// ```ignore
/// use draftcast_core::{BoardStore, MirrorSession, Side};
///
/// let store = BoardStore::with_slots(16);
/// let session = MirrorSession::controller(store.clone()).await?;
/// println!("share: {}", session.share_token().unwrap().encode()?);
///
/// // Every mutation is now pushed to the connected display
/// store.toggle_pick(Side::A, 3)?;
/// ```
#[derive(Debug)]
pub struct MirrorSession {
    endpoint: Endpoint,
    router: Option<Router>,
    share_token: Option<ShareToken>,
    phase_rx: watch::Receiver<SessionPhase>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl MirrorSession {
    /// Start a controller session
    ///
    /// Registers on the rendezvous network (server-assigned identity),
    /// publishes a [`ShareToken`] for out-of-band sharing, listens
    /// indefinitely for inbound offers, and pushes `store` on every change.
    ///
    /// # Errors
    ///
    /// Returns `MirrorError::Network` if the endpoint cannot be bound.
    pub async fn controller(store: BoardStore) -> MirrorResult<Self> {
        let (phase_tx, phase_rx) = watch::channel(SessionPhase::Unregistered);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        phase_tx.send_replace(SessionPhase::Registering);
        let (endpoint, _discovery) = bind_endpoint().await?;
        let endpoint_id = endpoint.id();
        info!(%endpoint_id, "Controller registered");
        phase_tx.send_replace(SessionPhase::Registered);
        let _ = event_tx.send(SessionEvent::Registered { endpoint_id });

        let share_token = ShareToken::from_endpoint_addr(&endpoint.addr());

        let (offer_tx, offer_rx) = mpsc::unbounded_channel();
        let router = Router::builder(endpoint.clone())
            .accept(MIRROR_ALPN, MirrorAcceptor { offer_tx })
            .spawn();

        tokio::spawn(run_push_pump(
            store.watch(),
            offer_rx,
            phase_tx,
            event_tx.clone(),
        ));

        Ok(Self {
            endpoint,
            router: Some(router),
            share_token: Some(share_token),
            phase_rx,
            event_tx,
        })
    }

    /// Start a display session
    ///
    /// Registers on the rendezvous network (identity never published), then
    /// dials the controller named by `token` in the background. The session
    /// is returned immediately; watch the phase or subscribe to events to
    /// observe the dial. Every valid inbound frame replaces `store`
    /// wholesale.
    ///
    /// # Errors
    ///
    /// Returns `MirrorError::Network` if the endpoint cannot be bound, or
    /// `MirrorError::InvalidToken` if the token's address is malformed.
    pub async fn display(token: &ShareToken, store: BoardStore) -> MirrorResult<Self> {
        let (phase_tx, phase_rx) = watch::channel(SessionPhase::Unregistered);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        phase_tx.send_replace(SessionPhase::Registering);
        let (endpoint, discovery) = bind_endpoint().await?;
        let endpoint_id = endpoint.id();
        info!(%endpoint_id, "Display registered");
        phase_tx.send_replace(SessionPhase::Registered);
        let _ = event_tx.send(SessionEvent::Registered { endpoint_id });

        // Seed whatever addresses the token carries so the dial does not
        // depend on global discovery alone.
        let remote_addr = token.to_endpoint_addr()?;
        let remote_id = remote_addr.id;
        discovery.add_endpoint_info(remote_addr);

        tokio::spawn(run_display(
            endpoint.clone(),
            remote_id,
            store,
            phase_tx,
            event_tx.clone(),
        ));

        Ok(Self {
            endpoint,
            router: None,
            share_token: None,
            phase_rx,
            event_tx,
        })
    }

    /// This process's endpoint identity
    pub fn endpoint_id(&self) -> EndpointId {
        self.endpoint.id()
    }

    /// The shareable token (controller sessions only)
    pub fn share_token(&self) -> Option<&ShareToken> {
        self.share_token.as_ref()
    }

    /// The current handshake phase
    pub fn phase(&self) -> SessionPhase {
        *self.phase_rx.borrow()
    }

    /// Watch handshake phase transitions
    pub fn watch_phase(&self) -> watch::Receiver<SessionPhase> {
        self.phase_rx.clone()
    }

    /// Subscribe to session lifecycle and fault events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Unregister from the rendezvous network unconditionally
    ///
    /// Implicitly terminates any active channel; no close handshake is sent
    /// to the peer beforehand.
    pub async fn shutdown(self) {
        if let Some(router) = self.router {
            let _ = router.shutdown().await;
        }
        self.endpoint.close().await;
    }
}

async fn bind_endpoint() -> MirrorResult<(Endpoint, StaticProvider)> {
    let secret_key = SecretKey::generate(&mut rand::rng());
    let static_provider = StaticProvider::new();

    let endpoint = Endpoint::builder()
        .secret_key(secret_key)
        .alpns(vec![MIRROR_ALPN.to_vec()])
        .discovery(static_provider.clone())
        .bind()
        .await
        .map_err(|e| MirrorError::Network(format!("Failed to bind endpoint: {}", e)))?;

    Ok((endpoint, static_provider))
}

/// Controller side: select over board changes and inbound offers
///
/// Board change with an active channel → push the whole board. No channel →
/// the change is dropped, not queued. New offer → replace the active channel
/// and push the current snapshot so the new display converges immediately.
async fn run_push_pump(
    mut board_rx: watch::Receiver<Board>,
    mut offer_rx: mpsc::UnboundedReceiver<Connection>,
    phase_tx: watch::Sender<SessionPhase>,
    event_tx: broadcast::Sender<SessionEvent>,
) {
    let mut active: Option<Connection> = None;

    loop {
        tokio::select! {
            changed = board_rx.changed() => {
                if changed.is_err() {
                    debug!("Board store dropped; push pump exiting");
                    break;
                }
                let board = board_rx.borrow_and_update().clone();
                match active.as_ref() {
                    Some(conn) => push_board(conn, &board, &event_tx).await,
                    None => debug!("No active channel; state change dropped"),
                }
            }

            offer = offer_rx.recv() => {
                let Some(conn) = offer else {
                    debug!("Acceptor gone; push pump exiting");
                    break;
                };
                let peer = conn.remote_id();
                phase_tx.send_replace(SessionPhase::ChannelPending);
                let _ = event_tx.send(SessionEvent::ChannelPending { peer });

                if let Some(prev) = active.take() {
                    // Most-recently-connected display wins; the old channel
                    // is abandoned without a close handshake.
                    debug!(prev = %prev.remote_id(), "Active channel replaced");
                }

                phase_tx.send_replace(SessionPhase::ChannelOpen);
                let _ = event_tx.send(SessionEvent::ChannelOpen { peer });
                info!(%peer, "Display channel open");

                let board = board_rx.borrow().clone();
                push_board(&conn, &board, &event_tx).await;
                active = Some(conn);
            }

            _ = closed(active.as_ref()), if active.is_some() => {
                if let Some(conn) = active.take() {
                    let peer = conn.remote_id();
                    info!(%peer, "Active channel closed");
                    phase_tx.send_replace(SessionPhase::Registered);
                    let _ = event_tx.send(SessionEvent::ChannelClosed { peer });
                }
            }
        }
    }
}

async fn closed(conn: Option<&Connection>) {
    match conn {
        Some(conn) => {
            let reason = conn.closed().await;
            debug!(?reason, "Channel reported closed");
        }
        None => std::future::pending().await,
    }
}

async fn push_board(conn: &Connection, board: &Board, event_tx: &broadcast::Sender<SessionEvent>) {
    // Fire-and-forget: failures are surfaced but never retried
    if let Err(e) = send_board(conn, board).await {
        warn!(error = %e, "Failed to push board");
        let _ = event_tx.send(SessionEvent::SessionError {
            message: e.to_string(),
        });
    }
}

async fn send_board(conn: &Connection, board: &Board) -> MirrorResult<()> {
    let frame = WireMessage::new(MirrorMessage::Board(board.slots().to_vec()));
    let bytes = frame
        .encode()
        .map_err(|e| MirrorError::Serialization(format!("Failed to encode frame: {}", e)))?;

    let mut send = conn
        .open_uni()
        .await
        .map_err(|e| MirrorError::Network(format!("Failed to open stream: {}", e)))?;
    send.write_all(&bytes)
        .await
        .map_err(|e| MirrorError::Network(format!("Failed to write frame: {}", e)))?;
    send.finish()
        .map_err(|e| MirrorError::Network(format!("Failed to finish stream: {}", e)))?;

    debug!(len = bytes.len(), "Board frame sent");
    Ok(())
}

/// Display side: dial the controller, then mirror until the channel dies
async fn run_display(
    endpoint: Endpoint,
    remote_id: EndpointId,
    store: BoardStore,
    phase_tx: watch::Sender<SessionPhase>,
    event_tx: broadcast::Sender<SessionEvent>,
) {
    phase_tx.send_replace(SessionPhase::ChannelPending);
    let _ = event_tx.send(SessionEvent::ChannelPending { peer: remote_id });
    info!(peer = %remote_id, "Dialing controller");

    let conn = match endpoint.connect(remote_id, MIRROR_ALPN).await {
        Ok(conn) => conn,
        Err(e) => {
            warn!(peer = %remote_id, error = %e, "Dial failed");
            phase_tx.send_replace(SessionPhase::Registered);
            let _ = event_tx.send(SessionEvent::DialFailed {
                message: e.to_string(),
            });
            return;
        }
    };

    phase_tx.send_replace(SessionPhase::ChannelOpen);
    let _ = event_tx.send(SessionEvent::ChannelOpen { peer: remote_id });
    info!(peer = %remote_id, "Controller channel open");

    run_recv_loop(&conn, &store, &event_tx).await;

    phase_tx.send_replace(SessionPhase::Registered);
    let _ = event_tx.send(SessionEvent::ChannelClosed { peer: remote_id });
}

/// Accept one frame per uni stream; replace the mirror on every valid one
async fn run_recv_loop(
    conn: &Connection,
    store: &BoardStore,
    event_tx: &broadcast::Sender<SessionEvent>,
) {
    loop {
        let mut recv = match conn.accept_uni().await {
            Ok(recv) => recv,
            Err(e) => {
                debug!(reason = %e, "Mirror channel closed");
                return;
            }
        };

        let bytes = match recv.read_to_end(MAX_FRAME_SIZE).await {
            Ok(bytes) => bytes,
            Err(e) => {
                // Oversized or truncated; drop the frame, keep the channel
                debug!(error = %e, "Dropped unreadable frame");
                let _ = event_tx.send(SessionEvent::InvalidFrame {
                    message: e.to_string(),
                });
                continue;
            }
        };

        match apply_frame(store, &bytes) {
            Ok(len) => debug!(slots = len, "Mirror replaced"),
            Err(e) => {
                // Malformed payloads are dropped without a reply to the peer
                debug!(error = %e, "Dropped malformed frame");
                let _ = event_tx.send(SessionEvent::InvalidFrame {
                    message: e.to_string(),
                });
            }
        }
    }
}

/// Validate one inbound frame and apply it: decode as an ordered sequence,
/// check the length against the mirror, then replace wholesale
fn apply_frame(store: &BoardStore, bytes: &[u8]) -> MirrorResult<usize> {
    let frame = WireMessage::decode(bytes)
        .map_err(|e| MirrorError::MalformedFrame(format!("Undecodable frame: {}", e)))?;
    let MirrorMessage::Board(slots) = frame.into_inner();
    let len = slots.len();
    store.replace(slots)?;
    Ok(len)
}

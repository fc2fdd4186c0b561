//! Mirror protocol integration tests
//!
//! These tests spin up real in-process iroh endpoints and verify the
//! controller/display handshake and state propagation end-to-end:
//!
//! - Local edits with no display connected stay local
//! - A display receives the controller's snapshot when its channel opens
//! - Subsequent edits propagate, entry by entry
//! - A ban emitted over the wire carries a cleared opponent marker
//! - Malformed frames are dropped without disturbing the mirror
//! - When displays dial in sequence, only the newest one is driven

use std::time::Duration;

use anyhow::Result;
use tokio::time::timeout;

use draftcast_core::{
    Board, BoardStore, MirrorMessage, MirrorSession, OpponentRole, SessionPhase, ShareToken,
    Side, Slot, SlotState, WireMessage, MIRROR_ALPN,
};

// ============================================================================
// Test Utilities
// ============================================================================

/// Generous timeout for endpoint establishment on slow CI
const SYNC_WAIT: Duration = Duration::from_secs(30);

/// Wait until the store's board satisfies a predicate
async fn wait_for_board<F>(store: &BoardStore, pred: F) -> Result<()>
where
    F: Fn(&Board) -> bool,
{
    let mut rx = store.watch();
    timeout(SYNC_WAIT, async {
        loop {
            if pred(&rx.borrow_and_update()) {
                return anyhow::Ok(());
            }
            rx.changed().await?;
        }
    })
    .await??;
    Ok(())
}

/// Wait until a session reaches the given phase
async fn wait_for_phase(session: &MirrorSession, phase: SessionPhase) -> Result<()> {
    let mut rx = session.watch_phase();
    timeout(SYNC_WAIT, async {
        loop {
            if *rx.borrow_and_update() == phase {
                return anyhow::Ok(());
            }
            rx.changed().await?;
        }
    })
    .await??;
    Ok(())
}

// ============================================================================
// Local-only behavior
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn local_edit_with_no_display_stays_local() -> Result<()> {
    let store = BoardStore::with_slots(8);
    let session = MirrorSession::controller(store.clone()).await?;

    // Registered, no channel
    assert_eq!(session.phase(), SessionPhase::Registered);
    assert!(session.share_token().is_some());

    store.toggle_pick(Side::A, 3)?;
    assert_eq!(store.snapshot().slots()[3].state, SlotState::PickedByA);
    // Still no channel; the change was dropped, not queued
    assert_eq!(session.phase(), SessionPhase::Registered);

    session.shutdown().await;
    Ok(())
}

// ============================================================================
// Controller ↔ Display propagation
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn display_receives_snapshot_and_subsequent_edits() -> Result<()> {
    let controller_store = BoardStore::with_slots(8);
    let controller = MirrorSession::controller(controller_store.clone()).await?;
    let token = controller.share_token().expect("controller token").clone();

    // Diverge before any display connects
    controller_store.toggle_ban(5)?;

    let display_store = BoardStore::with_slots(8);
    let display = MirrorSession::display(&token, display_store.clone()).await?;

    // Snapshot-on-open: the late display converges without waiting for an edit
    wait_for_board(&display_store, |b| b.slots()[5].state == SlotState::Banned).await?;

    // A subsequent edit propagates; everything else keeps its mirrored value
    controller_store.toggle_pick(Side::A, 3)?;
    wait_for_board(&display_store, |b| {
        b.slots()[3].state == SlotState::PickedByA
    })
    .await?;

    let mirrored = display_store.snapshot();
    assert_eq!(mirrored.slots()[5].state, SlotState::Banned);
    for (i, slot) in mirrored.slots().iter().enumerate() {
        if i != 3 && i != 5 {
            assert_eq!(slot, &Slot::default(), "slot {} should be untouched", i);
        }
    }

    display.shutdown().await;
    controller.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn ban_clears_opponent_over_the_wire() -> Result<()> {
    let controller_store = BoardStore::with_slots(8);
    let controller = MirrorSession::controller(controller_store.clone()).await?;
    let token = controller.share_token().expect("controller token").clone();

    let display_store = BoardStore::with_slots(8);
    let display = MirrorSession::display(&token, display_store.clone()).await?;
    wait_for_phase(&display, SessionPhase::ChannelOpen).await?;

    controller_store.toggle_pick(Side::A, 5)?;
    controller_store.toggle_opponent(5, OpponentRole::Attack)?;
    wait_for_board(&display_store, |b| {
        b.slots()[5].opponent == OpponentRole::Attack
    })
    .await?;

    controller_store.toggle_ban(5)?;
    wait_for_board(&display_store, |b| b.slots()[5].state == SlotState::Banned).await?;

    // The emitted payload showed {state: -2, opponent: 0}
    assert_eq!(
        display_store.snapshot().slots()[5].opponent,
        OpponentRole::None
    );

    display.shutdown().await;
    controller.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn newest_display_wins() -> Result<()> {
    let controller_store = BoardStore::with_slots(8);
    let controller = MirrorSession::controller(controller_store.clone()).await?;
    let token = controller.share_token().expect("controller token").clone();

    // Give the first display a recognizable snapshot to converge on
    controller_store.toggle_ban(0)?;

    let first_store = BoardStore::with_slots(8);
    let first = MirrorSession::display(&token, first_store.clone()).await?;
    wait_for_board(&first_store, |b| b.slots()[0].state == SlotState::Banned).await?;

    let second_store = BoardStore::with_slots(8);
    let second = MirrorSession::display(&token, second_store.clone()).await?;
    // The second display's snapshot proves the controller switched channels
    wait_for_board(&second_store, |b| b.slots()[0].state == SlotState::Banned).await?;

    controller_store.toggle_pick(Side::B, 7)?;
    wait_for_board(&second_store, |b| {
        b.slots()[7].state == SlotState::PickedByB
    })
    .await?;

    // The first display was replaced and no longer receives pushes
    assert_eq!(first_store.snapshot().slots()[7].state, SlotState::Neutral);

    first.shutdown().await;
    second.shutdown().await;
    controller.shutdown().await;
    Ok(())
}

// ============================================================================
// Malformed inbound frames
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn malformed_frames_leave_the_mirror_unchanged() -> Result<()> {
    // A bare endpoint standing in for the controller, so we can write
    // arbitrary bytes onto the mirror channel
    let secret_key = iroh::SecretKey::generate(&mut rand::rng());
    let endpoint = iroh::Endpoint::builder()
        .secret_key(secret_key)
        .alpns(vec![MIRROR_ALPN.to_vec()])
        .bind()
        .await?;
    let token = ShareToken::from_endpoint_addr(&endpoint.addr());

    let display_store = BoardStore::with_slots(4);
    let display = MirrorSession::display(&token, display_store.clone()).await?;

    let incoming = timeout(SYNC_WAIT, endpoint.accept())
        .await?
        .expect("display should dial in");
    let conn = incoming.await?;

    // Not postcard at all
    let mut send = conn.open_uni().await?;
    send.write_all(b"a single object, not a sequence").await?;
    send.finish()?;

    // Decodes, but fails the length check against the 4-slot mirror
    let oversized = WireMessage::new(MirrorMessage::Board(vec![Slot::default(); 9]));
    let mut send = conn.open_uni().await?;
    send.write_all(&oversized.encode()?).await?;
    send.finish()?;

    // A valid frame, to prove the channel survived the garbage
    let mut slots = vec![Slot::default(); 4];
    slots[2].state = SlotState::PickedByB;
    let valid = WireMessage::new(MirrorMessage::Board(slots.clone()));
    let mut send = conn.open_uni().await?;
    send.write_all(&valid.encode()?).await?;
    send.finish()?;

    wait_for_board(&display_store, |b| {
        b.slots()[2].state == SlotState::PickedByB
    })
    .await?;

    // Only the valid frame was applied
    assert_eq!(display_store.snapshot().slots(), slots.as_slice());

    display.shutdown().await;
    endpoint.close().await;
    Ok(())
}

// ============================================================================
// Phase transitions
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn display_phase_walks_the_handshake() -> Result<()> {
    let controller_store = BoardStore::with_slots(8);
    let controller = MirrorSession::controller(controller_store.clone()).await?;
    let token = controller.share_token().expect("controller token").clone();

    let display_store = BoardStore::with_slots(8);
    let display = MirrorSession::display(&token, display_store).await?;

    wait_for_phase(&display, SessionPhase::ChannelOpen).await?;
    wait_for_phase(&controller, SessionPhase::ChannelOpen).await?;

    // Controller teardown terminates the channel; the display observes the
    // close and falls back to Registered without redialing
    controller.shutdown().await;
    wait_for_phase(&display, SessionPhase::Registered).await?;

    display.shutdown().await;
    Ok(())
}

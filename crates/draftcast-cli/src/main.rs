//! Draftcast CLI
//!
//! Thin text-mode presentation layer over draftcast-core.
//!
//! ## Usage
//!
//! ```bash
//! # Host a board as the controller; prints the share URL for displays
//! draftcast host --side-a "Red Team" --side-b "Blue Team"
//!
//! # Mirror a hosted board (token or full share URL)
//! draftcast view draftcast:3xK7hNp...
//! draftcast view "https://board.example/?A=Red&B=Blue#draftcast:3xK7hNp..."
//! ```
//!
//! On `host`, board edits are read line by line from stdin:
//!
//! ```text
//! pick a 3        # toggle side A's pick on slot 3
//! pick b 4        # toggle side B's pick on slot 4
//! ban 5           # toggle a ban on slot 5
//! versus 3 attack # toggle the opposing-role marker on a picked slot
//! order 3 1       # label slot 3 as pick number 1 (0 clears)
//! show            # render the board
//! quit
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::io::AsyncBufReadExt;

use draftcast_core::{
    Board, BoardStore, Launch, MirrorSession, OpponentRole, Role, SessionEvent, ShareToken,
    Side, SideLabels, SlotState, DEFAULT_SLOT_COUNT,
};

/// Draftcast - P2P pick/ban board mirroring
#[derive(Parser)]
#[command(name = "draftcast")]
#[command(version = "0.1.0")]
#[command(about = "Draftcast - P2P pick/ban board mirroring")]
#[command(
    long_about = "Host a draft pick/ban board and mirror it live to display \
                  instances over a peer-to-peer data channel. No server, no \
                  accounts; discovery is a copy/pasted share URL."
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Host a board as the controller and publish a share token
    Host {
        /// Label for side A (shown to displays launched from the share URL)
        #[arg(long, default_value = "")]
        side_a: String,

        /// Label for side B
        #[arg(long, default_value = "")]
        side_b: String,

        /// Number of slots on the board
        #[arg(long, default_value_t = DEFAULT_SLOT_COUNT)]
        slots: usize,

        /// Base URL the share token is embedded into
        #[arg(long, default_value = "https://draftcast.example/")]
        base_url: String,
    },

    /// Mirror a hosted board read-only
    View {
        /// Share token (`draftcast:...`) or full share URL from the controller
        target: String,

        /// Number of slots on the board (must match the controller)
        #[arg(long, default_value_t = DEFAULT_SLOT_COUNT)]
        slots: usize,
    },
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match cli.command {
        Commands::Host {
            side_a,
            side_b,
            slots,
            base_url,
        } => {
            let labels = SideLabels {
                a: side_a,
                b: side_b,
            };
            run_host(labels, slots, &base_url).await
        }
        Commands::View { target, slots } => run_view(&target, slots).await,
    }
}

// ============================================================================
// Controller
// ============================================================================

async fn run_host(labels: SideLabels, slots: usize, base_url: &str) -> Result<()> {
    let store = BoardStore::with_slots(slots);
    let session = MirrorSession::controller(store.clone()).await?;
    let token = session
        .share_token()
        .ok_or_else(|| anyhow::anyhow!("controller session has no share token"))?;

    println!("This instance is the control instance.");
    println!();
    println!("Share token: {}", token.encode()?);
    println!("Share URL:   {}", Launch::share_url(base_url, token)?);
    if !labels.a.is_empty() || !labels.b.is_empty() {
        println!("Sides:       {} vs {}", labels.a, labels.b);
    }
    println!();
    print_host_help();

    // Session events interleave with the prompt; acceptable for a text tool
    let mut events = session.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        match handle_command(&store, &labels, line) {
            Ok(true) => {}
            Ok(false) => print_host_help(),
            Err(e) => eprintln!("error: {}", e),
        }
    }

    session.shutdown().await;
    Ok(())
}

/// Apply one edit command; Ok(false) means "show help"
fn handle_command(store: &BoardStore, labels: &SideLabels, line: &str) -> Result<bool> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        ["pick", side, index] => {
            let side = parse_side(side)?;
            store.toggle_pick(side, parse_index(index)?)?;
        }
        ["ban", index] => {
            store.toggle_ban(parse_index(index)?)?;
        }
        ["versus", index, role] => {
            let role = match *role {
                "attack" => OpponentRole::Attack,
                "defend" => OpponentRole::Defend,
                other => anyhow::bail!("unknown role '{}': expected attack or defend", other),
            };
            store.toggle_opponent(parse_index(index)?, role)?;
        }
        ["order", index, label] => {
            let order: u32 = label
                .parse()
                .map_err(|_| anyhow::anyhow!("order must be a number (0 clears)"))?;
            store.set_order(parse_index(index)?, Some(order))?;
        }
        ["show"] => {
            render_board(&store.snapshot(), labels);
        }
        ["help"] => return Ok(false),
        _ => anyhow::bail!("unrecognized command: {}", line),
    }
    Ok(true)
}

fn parse_side(s: &str) -> Result<Side> {
    match s.to_lowercase().as_str() {
        "a" => Ok(Side::A),
        "b" => Ok(Side::B),
        other => anyhow::bail!("unknown side '{}': expected a or b", other),
    }
}

fn parse_index(s: &str) -> Result<usize> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("slot index must be a number"))
}

fn print_host_help() {
    println!("Commands:");
    println!("  pick a <slot> | pick b <slot>   toggle a side's pick");
    println!("  ban <slot>                      toggle a ban");
    println!("  versus <slot> attack|defend     toggle the opposing-role marker");
    println!("  order <slot> <n>                set the pick order label (0 clears)");
    println!("  show                            render the board");
    println!("  quit                            shut down");
}

// ============================================================================
// Display
// ============================================================================

async fn run_view(target: &str, slots: usize) -> Result<()> {
    let (token, labels) = resolve_target(target)?;
    let store = BoardStore::with_slots(slots);
    let session = MirrorSession::display(&token, store.clone()).await?;

    let mut events = session.subscribe();
    let mut board_rx = store.watch();

    loop {
        tokio::select! {
            changed = board_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let board = board_rx.borrow_and_update().clone();
                render_board(&board, &labels);
            }
            event = events.recv() => {
                match event {
                    Ok(event) => print_event(&event),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    session.shutdown().await;
    Ok(())
}

/// A view target is either a bare token or a full share URL
fn resolve_target(target: &str) -> Result<(ShareToken, SideLabels)> {
    if target.starts_with("draftcast:") {
        return Ok((ShareToken::decode(target)?, SideLabels::default()));
    }

    let launch = Launch::from_url(target)?;
    match launch.role {
        Role::Display { token } => Ok((token, launch.labels)),
        Role::Controller => {
            anyhow::bail!("URL carries no share token in its fragment; nothing to mirror")
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn render_board(board: &Board, labels: &SideLabels) {
    println!();
    if !labels.a.is_empty() {
        println!("=== {} ===", labels.a);
    }
    for (i, slot) in board.slots().iter().enumerate() {
        let state = match slot.state {
            SlotState::Neutral => "-",
            SlotState::PickedByA => "picked by A",
            SlotState::PickedByB => "picked by B",
            SlotState::Banned => "BANNED",
        };
        let order = slot
            .order
            .map(|n| format!("  order {}", n))
            .unwrap_or_default();
        let versus = match slot.opponent {
            OpponentRole::None => "",
            OpponentRole::Attack => "  vs attack",
            OpponentRole::Defend => "  vs defend",
        };
        println!("  {:>3}  {:<12}{}{}", i, state, order, versus);
    }
    if !labels.b.is_empty() {
        println!("=== {} ===", labels.b);
    }
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::Registered { endpoint_id } => {
            println!("[session] registered as {}", endpoint_id);
        }
        SessionEvent::ChannelPending { peer } => {
            println!("[session] connecting to {}", peer);
        }
        SessionEvent::ChannelOpen { peer } => {
            println!("[session] channel open with {}", peer);
        }
        SessionEvent::ChannelClosed { peer } => {
            println!("[session] channel closed: {}", peer);
        }
        SessionEvent::DialFailed { message } => {
            println!("[session] dial failed: {}", message);
        }
        SessionEvent::InvalidFrame { message } => {
            println!("[session] dropped malformed frame: {}", message);
        }
        SessionEvent::SessionError { message } => {
            println!("[session] error: {}", message);
        }
    }
}

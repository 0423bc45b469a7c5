//! Interactive terminal front end for playing against the engine backend.
//!
//! All the game logic lives in the library; this binary only parses
//! commands, prints the board, and reports errors.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use clap::Parser;
use shakmaty::{Chess, File, Move, Square};
use tracing_subscriber::EnvFilter;

use beth_chess::domain::{render, validate};
use beth_chess::{ClientConfig, GameError, GameSession, GameStatus, HttpEngine, ProposedMove};

#[derive(Parser, Debug)]
#[command(author, version, about = "Play chess against a remote Stockfish backend", long_about = None)]
struct Args {
    /// Base URL of the engine backend
    #[arg(long, default_value = "http://localhost:8000")]
    server: String,

    /// ELO strength for new games (can also be given to `start`)
    #[arg(long)]
    elo: Option<u32>,
}

const HELP: &str = "\
commands:
  start [elo]   begin a new game (default strength 1200)
  move <mv>     play a move, e.g. `move e2e4`, `move e7e8q`, or SAN `move Nf3`
  undo          take back the last exchange (your move and the reply)
  board         show the current position
  moves         show the move list
  analysis      ask the backend to explain the position
  reset         abandon the game
  quit          exit";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = ClientConfig::new(args.server.clone());
    let engine = HttpEngine::new(&config)?;
    let mut session = GameSession::new(engine);

    println!("beth-chess - backend at {}", args.server);
    println!("{HELP}");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else { continue };
        let argument = parts.next();

        let result = match command {
            "start" => {
                let rating = match argument {
                    Some(input) => Some(config.rating_from_input(input)),
                    None => args.elo,
                };
                start(&mut session, rating).await
            }
            "move" | "m" => play(&mut session, argument).await,
            "undo" => undo(&mut session).await,
            "board" => show_board(&session),
            "moves" => {
                println!("{}", session.ledger().numbered());
                Ok(())
            }
            "analysis" | "ask" => match session.analysis().await {
                Ok(text) => {
                    println!("{text}");
                    Ok(())
                }
                Err(e) => Err(e),
            },
            "reset" => {
                println!("game reset");
                session.reset().await
            }
            "quit" | "exit" | "q" => {
                session.end().await.ok();
                break;
            }
            "help" => {
                println!("{HELP}");
                Ok(())
            }
            other => {
                println!("unknown command `{other}` (try `help`)");
                Ok(())
            }
        };

        if let Err(e) = result {
            println!("error: {e}");
            if matches!(e, GameError::CorruptLedger { .. }) {
                // Non-recoverable for this session; start fresh.
                println!("the game state is unrecoverable; resetting");
                session.end().await.ok();
            }
        }
    }

    Ok(())
}

async fn start(
    session: &mut GameSession<HttpEngine>,
    rating: Option<u32>,
) -> Result<(), GameError> {
    session.start(rating).await?;
    println!(
        "game started at strength {} - you play White",
        session.rating()
    );
    show_board(session)
}

async fn play(
    session: &mut GameSession<HttpEngine>,
    argument: Option<&str>,
) -> Result<(), GameError> {
    let Some(input) = argument else {
        println!("usage: move <mv>");
        return Ok(());
    };
    if session.status() == GameStatus::NotStarted {
        println!("no game in progress (try `start`)");
        return Ok(());
    }

    let board = session.board()?;
    let Some(proposed) = parse_move(&board, input) else {
        println!("could not read `{input}` as a move");
        return Ok(());
    };

    let outcome = session.apply_user_move(&proposed).await?;
    match &outcome.engine_san {
        Some(reply) => println!("you: {}  engine: {}", outcome.user_san, reply),
        None => println!("you: {}", outcome.user_san),
    }
    show_board(session)?;
    if let GameStatus::Over(reason) = outcome.status {
        println!("game over: {reason}");
    }
    Ok(())
}

async fn undo(session: &mut GameSession<HttpEngine>) -> Result<(), GameError> {
    let removed = session.undo_last_exchange().await?;
    if removed == 0 {
        println!("nothing to undo");
    } else {
        println!(
            "took back {removed} {}",
            if removed == 1 { "ply" } else { "plies" }
        );
        show_board(session)?;
    }
    Ok(())
}

fn show_board(session: &GameSession<HttpEngine>) -> Result<(), GameError> {
    if session.status() == GameStatus::NotStarted {
        println!("no game in progress");
        return Ok(());
    }
    print!("{}", render(&session.board()?));
    Ok(())
}

/// Accept either coordinate notation ("e2e4", "e7e8q") or SAN ("Nf3").
fn parse_move(board: &Chess, input: &str) -> Option<ProposedMove> {
    if let Some(proposed) = ProposedMove::parse(input) {
        return Some(proposed);
    }
    let san: shakmaty::san::SanPlus = input.parse().ok()?;
    let m = san.san.to_move(board).ok()?;
    let proposed = match &m {
        Move::Normal {
            from, to, promotion, ..
        } => ProposedMove {
            from: *from,
            to: *to,
            promotion: *promotion,
        },
        Move::EnPassant { from, to, .. } => ProposedMove::new(*from, *to),
        Move::Castle { king, rook, .. } => {
            let file = if rook.file() == File::H {
                File::G
            } else {
                File::C
            };
            ProposedMove::new(*king, Square::from_coords(file, king.rank()))
        }
        Move::Put { .. } => return None,
    };
    // Round-trip through the validator's own matching so SAN input and
    // coordinate input behave identically.
    validate(board, &proposed).ok()?;
    Some(proposed)
}

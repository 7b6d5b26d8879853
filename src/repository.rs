//! In-memory game store.
//!
//! The map lock is held only to insert or look up. Each session sits behind
//! its own async mutex, so operations on one game serialize while different
//! games run in parallel. Listing reads only what each entry keeps outside
//! the session mutex, so a long autoplay never holds it up.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::board::{Board, BoardSnapshot, GameStatus};
use crate::error::GameError;
use crate::session::GameSession;

pub type SharedSession = Arc<Mutex<GameSession>>;

/// Listing entry for `GET /api/games`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct GameSummary {
    pub game_id: String,
    pub status: GameStatus,
    pub rows: usize,
    pub cols: usize,
}

/// A freshly created game.
#[derive(Clone, Debug)]
pub struct CreatedGame {
    pub game_id: String,
    pub seed: u64,
    pub board: BoardSnapshot,
}

/// Map entry: the session plus what listing needs without locking it.
struct GameEntry {
    session: SharedSession,
    rows: usize,
    cols: usize,
    won: Arc<AtomicBool>,
}

impl GameEntry {
    fn summary(&self, game_id: &str) -> GameSummary {
        let status = if self.won.load(Ordering::Acquire) {
            GameStatus::Victory
        } else {
            GameStatus::InProgress
        };
        GameSummary {
            game_id: game_id.to_string(),
            status,
            rows: self.rows,
            cols: self.cols,
        }
    }
}

#[derive(Default)]
pub struct GameRepository {
    games: RwLock<HashMap<String, GameEntry>>,
}

impl GameRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate and store a random board. `seed` defaults to a fresh random one.
    pub async fn create(
        &self,
        rows: usize,
        cols: usize,
        seed: Option<u64>,
        max_capacity: u32,
    ) -> Result<CreatedGame, GameError> {
        let seed = seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let board = Board::generate(rows, cols, max_capacity, &mut rng)?;
        let snapshot = board.snapshot();
        let game_id = self.insert(board).await;
        info!(game = %game_id, rows, cols, seed, flowers = snapshot.initial_flower_count, "game created");
        Ok(CreatedGame {
            game_id,
            seed,
            board: snapshot,
        })
    }

    /// Store an already built board under a new id.
    pub async fn insert(&self, board: Board) -> String {
        let mut games = self.games.write().await;
        let mut id = new_game_id();
        while games.contains_key(&id) {
            id = new_game_id();
        }
        let (rows, cols) = (board.rows(), board.cols());
        let session = GameSession::new(id.clone(), board);
        let entry = GameEntry {
            won: session.victory_flag(),
            session: Arc::new(Mutex::new(session)),
            rows,
            cols,
        };
        games.insert(id.clone(), entry);
        id
    }

    pub async fn get(&self, game_id: &str) -> Result<SharedSession, GameError> {
        self.games
            .read()
            .await
            .get(game_id)
            .map(|entry| Arc::clone(&entry.session))
            .ok_or_else(|| GameError::NotFound(game_id.to_string()))
    }

    /// All games, sorted by id. Never waits on a session lock.
    pub async fn list(&self) -> Vec<GameSummary> {
        let mut out: Vec<GameSummary> = self
            .games
            .read()
            .await
            .iter()
            .map(|(id, entry)| entry.summary(id))
            .collect();
        out.sort_by(|a, b| a.game_id.cmp(&b.game_id));
        out
    }

    pub async fn len(&self) -> usize {
        self.games.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// 32 lowercase hex characters.
fn new_game_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

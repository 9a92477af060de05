//! 局面（Position）
//!
//! - `pos`: 盤面と状態の保持、引き分け判定
//! - `fen`: FEN の読み書き
//! - `zobrist`: ハッシュキー
//! - `do_move`: 指し手の実行と巻き戻し
//! - `legality`: 疑似合法判定と UCI 指し手の解釈
//! - `see`: 静的交換評価

mod do_move;
mod fen;
mod legality;
mod pos;
mod see;
mod state;
mod zobrist;

pub use fen::STARTPOS_FEN;
pub use pos::{CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, Position};
pub use see::{SEE_VALUES, see_value};
pub use state::UndoRecord;
pub use zobrist::{ZOBRIST, Zobrist, zobrist_castling, zobrist_ep, zobrist_psq, zobrist_side};

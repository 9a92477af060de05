//! rchess コアライブラリ
//!
//! ビットボード盤面、PEXT 利きテーブル、NNUE 評価、置換表、
//! 反復深化 PVS 探索をまとめたチェスエンジン本体。

pub mod bench;
pub mod bitboard;
pub mod error;
pub mod movegen;
pub mod nnue;
pub mod perft;
pub mod position;
pub mod prefetch;
pub mod search;
pub mod tt;
pub mod types;

pub use error::{Error, NetworkError, PositionError, TableError};
pub use position::Position;
pub use types::{Bound, Color, Depth, Move, MoveKind, Piece, PieceType, Square, Value};

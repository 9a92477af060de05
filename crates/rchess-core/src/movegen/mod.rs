//! 指し手生成
//!
//! 疑似合法手を「取る手」と「取らない手」に分けて生成する。
//! 両者は互いに素で、和が全疑似合法手になる。合法性（自玉の王手放置）は
//! `Position::make_move` が判定する。
//!
//! - 取る手: ポーンの取り（成りは Q, R, B, N）→ EP → クイーンへの成り →
//!   N, B, R, Q, K の取り
//! - 取らない手: クイーン以外への成り（R, B, N）→ 1マス・2マス前進 → N, B, R, Q, K → キャスリング

mod generator;
mod movelist;

pub use generator::{
    attackers_to, castle_legal, generate_all, generate_captures, generate_quiets,
    is_square_attacked, king_attacked,
};
pub use movelist::{ExtMove, MoveList};

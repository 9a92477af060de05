//! Perft（指し手生成の検証用ノード数え上げ）
//!
//! 擬似合法手を生成し、`make_move` が受け付けたものだけを数える。

use crate::movegen::{MoveList, generate_all};
use crate::position::Position;
use crate::types::Move;

/// `depth` 手先までの合法手順の数
pub fn perft(pos: &mut Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut list = MoveList::new();
    generate_all(pos, &mut list);

    let mut nodes = 0;
    for mv in list.iter() {
        if !pos.make_move(mv) {
            continue;
        }
        nodes += if depth == 1 { 1 } else { perft(pos, depth - 1) };
        pos.undo_move();
    }
    nodes
}

/// ルートの合法手ごとの perft（UCI 表記順）
pub fn perft_divide(pos: &mut Position, depth: u32) -> Vec<(Move, u64)> {
    let mut list = MoveList::new();
    generate_all(pos, &mut list);

    let mut result = Vec::with_capacity(list.len());
    for mv in list.iter() {
        if !pos.make_move(mv) {
            continue;
        }
        let nodes = if depth <= 1 { 1 } else { perft(pos, depth - 1) };
        pos.undo_move();
        result.push((mv, nodes));
    }
    result.sort_by_key(|(mv, _)| mv.to_uci());
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    const POSITION_3: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
    const POSITION_4: &str = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";
    const POSITION_5: &str = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";

    fn perft_fen(fen: &str, depth: u32) -> u64 {
        let mut pos = Position::from_fen(fen).unwrap();
        perft(&mut pos, depth)
    }

    #[test]
    fn test_perft_startpos_shallow() {
        let mut pos = Position::startpos();
        assert_eq!(perft(&mut pos, 1), 20);
        assert_eq!(perft(&mut pos, 2), 400);
        assert_eq!(perft(&mut pos, 3), 8_902);
    }

    #[test]
    fn test_perft_kiwipete_shallow() {
        assert_eq!(perft_fen(KIWIPETE, 1), 48);
        assert_eq!(perft_fen(KIWIPETE, 2), 2_039);
    }

    #[test]
    fn test_perft_position3_shallow() {
        assert_eq!(perft_fen(POSITION_3, 1), 14);
        assert_eq!(perft_fen(POSITION_3, 2), 191);
        assert_eq!(perft_fen(POSITION_3, 3), 2_812);
    }

    #[test]
    fn test_perft_position4_shallow() {
        assert_eq!(perft_fen(POSITION_4, 1), 6);
        assert_eq!(perft_fen(POSITION_4, 2), 264);
    }

    #[test]
    fn test_perft_position5_shallow() {
        assert_eq!(perft_fen(POSITION_5, 1), 44);
        assert_eq!(perft_fen(POSITION_5, 2), 1_486);
    }

    #[test]
    fn test_perft_restores_position() {
        let mut pos = Position::from_fen(KIWIPETE).unwrap();
        let key = pos.key();
        let fen = pos.to_fen();
        perft(&mut pos, 3);
        assert_eq!(pos.key(), key);
        assert_eq!(pos.to_fen(), fen);
    }

    #[test]
    fn test_perft_divide_sums_to_perft() {
        let mut pos = Position::from_fen(POSITION_5).unwrap();
        let divide = perft_divide(&mut pos, 2);
        assert_eq!(divide.len(), 44);
        let total: u64 = divide.iter().map(|(_, n)| n).sum();
        assert_eq!(total, 1_486);

        let names: Vec<String> = divide.iter().map(|(mv, _)| mv.to_uci()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    #[ignore]
    fn test_perft_startpos_deep() {
        let mut pos = Position::startpos();
        assert_eq!(perft(&mut pos, 5), 4_865_609);
    }

    #[test]
    #[ignore]
    fn test_perft_kiwipete_deep() {
        assert_eq!(perft_fen(KIWIPETE, 3), 97_862);
        assert_eq!(perft_fen(KIWIPETE, 4), 4_085_603);
    }

    #[test]
    #[ignore]
    fn test_perft_position3_deep() {
        assert_eq!(perft_fen(POSITION_3, 5), 674_624);
    }

    #[test]
    #[ignore]
    fn test_perft_position4_deep() {
        assert_eq!(perft_fen(POSITION_4, 4), 422_333);
    }

    #[test]
    #[ignore]
    fn test_perft_position5_deep() {
        assert_eq!(perft_fen(POSITION_5, 3), 62_379);
    }
}

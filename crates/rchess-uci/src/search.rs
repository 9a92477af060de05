use std::thread;

use anyhow::{Context, Result};
use rchess_core::search::{SearchInfo, SearchLimits, SearchResult, TimeControl, TimeManager};
use rchess_core::{Color, Move, Position, Value};

use crate::io::uci_println;
use crate::state::EngineState;

/// 探索スレッドのスタックサイズ
const SEARCH_STACK_SIZE: usize = 64 * 1024 * 1024;

// =============================================================================
// position
// =============================================================================

/// `position [startpos | fen <fen>] [moves ...]` を解釈する
///
/// FEN が不正なら `Err`。不正な指し手があればそこで適用をやめる。
pub fn parse_position(cmd: &str) -> Result<Position> {
    let rest = cmd.strip_prefix("position").unwrap_or(cmd).trim();
    let (setup, moves) = match rest.split_once("moves") {
        Some((s, m)) => (s.trim(), Some(m)),
        None => (rest, None),
    };

    let mut pos = if setup == "startpos" {
        Position::startpos()
    } else if let Some(fen) = setup.strip_prefix("fen") {
        Position::from_fen(fen.trim()).with_context(|| format!("invalid FEN: {}", fen.trim()))?
    } else {
        anyhow::bail!("unknown position command: {cmd}");
    };

    for token in moves.unwrap_or("").split_whitespace() {
        let Some(mv) = pos.parse_uci_move(token) else {
            log::warn!("illegal move in position command: {token}");
            break;
        };
        if !pos.make_move(mv) {
            log::warn!("illegal move in position command: {token}");
            break;
        }
    }
    Ok(pos)
}

pub fn handle_position(cmd: &str, state: &mut EngineState) {
    state.finish_search();
    match parse_position(cmd) {
        Ok(pos) => state.position = pos,
        Err(e) => log::warn!("{e:#}"),
    }
}

// =============================================================================
// go
// =============================================================================

/// `go` の引数
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GoParams {
    pub wtime: Option<i64>,
    pub btime: Option<i64>,
    pub winc: Option<i64>,
    pub binc: Option<i64>,
    pub movestogo: Option<u32>,
    pub movetime: Option<i64>,
    pub depth: Option<i32>,
    pub nodes: Option<u64>,
    pub infinite: bool,
}

pub fn parse_go(cmd: &str) -> GoParams {
    let mut params = GoParams::default();
    let mut tokens = cmd.split_whitespace().skip(1);
    while let Some(tok) = tokens.next() {
        match tok {
            "infinite" => params.infinite = true,
            "wtime" => params.wtime = tokens.next().and_then(|v| v.parse().ok()),
            "btime" => params.btime = tokens.next().and_then(|v| v.parse().ok()),
            "winc" => params.winc = tokens.next().and_then(|v| v.parse().ok()),
            "binc" => params.binc = tokens.next().and_then(|v| v.parse().ok()),
            "movestogo" => params.movestogo = tokens.next().and_then(|v| v.parse().ok()),
            "movetime" => params.movetime = tokens.next().and_then(|v| v.parse().ok()),
            "depth" => params.depth = tokens.next().and_then(|v| v.parse().ok()),
            "nodes" => params.nodes = tokens.next().and_then(|v| v.parse().ok()),
            _ => log::debug!("ignoring go token: {tok}"),
        }
    }
    params
}

/// `go` の引数から探索制限を作る
pub fn limits_for(params: &GoParams, side: Color) -> SearchLimits {
    let mut limits = SearchLimits {
        depth: params.depth,
        nodes: params.nodes,
        ..Default::default()
    };
    if params.infinite {
        return limits;
    }

    let (time, inc) = match side {
        Color::White => (params.wtime, params.winc),
        Color::Black => (params.btime, params.binc),
    };
    if time.is_none() && params.movetime.is_none() {
        return limits;
    }

    let alloc = TimeManager::allocate(TimeControl {
        time_left: time.unwrap_or(0),
        increment: inc.unwrap_or(0),
        moves_to_go: params.movestogo,
        move_time: params.movetime,
    });
    limits.soft_ms = Some(alloc.soft_ms);
    limits.hard_ms = Some(alloc.hard_ms);
    limits
}

/// UCI の score 表記
pub fn format_score(score: Value) -> String {
    match score.mate_moves() {
        Some(n) => format!("mate {n}"),
        None => format!("cp {}", score.raw()),
    }
}

fn format_pv(pv: &[Move]) -> String {
    pv.iter().map(|m| m.to_uci()).collect::<Vec<_>>().join(" ")
}

pub fn format_info(info: &SearchInfo) -> String {
    format!(
        "info depth {} seldepth {} score {} nodes {} nps {} hashfull {} time {} pv {}",
        info.depth,
        info.sel_depth,
        format_score(info.score),
        info.nodes,
        info.nps,
        info.hashfull,
        info.elapsed_ms,
        format_pv(&info.pv)
    )
}

pub fn format_bestmove(result: &SearchResult) -> String {
    if result.best_move.is_none() {
        return "bestmove 0000".to_string();
    }
    match result.ponder_move() {
        Some(p) => format!("bestmove {} ponder {}", result.best_move.to_uci(), p.to_uci()),
        None => format!("bestmove {}", result.best_move.to_uci()),
    }
}

/// 探索スレッドを起動する
///
/// 前の探索が残っていれば止めてから始める。
pub fn handle_go(cmd: &str, state: &mut EngineState) -> Result<()> {
    if state.is_searching() {
        log::debug!("go while searching; stopping the previous search");
    }
    state.finish_search();
    let Some(mut worker) = state.worker.take() else {
        log::warn!("no search worker available");
        return Ok(());
    };

    let params = parse_go(cmd);
    let limits = limits_for(&params, state.position.side_to_move());
    let pos = state.position.clone();
    worker.reset_stop();
    log::debug!("go: {limits:?}");

    let handle = thread::Builder::new()
        .name("search".to_string())
        .stack_size(SEARCH_STACK_SIZE)
        .spawn(move || {
            let result = worker.search(&pos, limits, |info| uci_println(&format_info(info)));
            uci_println(&format_bestmove(&result));
            worker
        })
        .context("failed to spawn search thread")?;
    state.search_handle = Some(handle);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_position_startpos_moves() {
        let pos = parse_position("position startpos moves e2e4 e7e5 g1f3").unwrap();
        assert_eq!(pos.side_to_move(), Color::Black);
        assert_eq!(
            pos.to_fen(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2"
        );
    }

    #[test]
    fn test_parse_position_fen() {
        let fen = "4k3/8/8/8/8/8/8/R3K3 w Q - 0 1";
        let pos = parse_position(&format!("position fen {fen} moves e1c1")).unwrap();
        assert_eq!(pos.to_fen(), "4k3/8/8/8/8/8/8/2KR4 b - - 1 1");
    }

    #[test]
    fn test_parse_position_stops_at_illegal_move() {
        let pos = parse_position("position startpos moves e2e4 e2e4 e7e5").unwrap();
        assert_eq!(pos.side_to_move(), Color::Black);
    }

    #[test]
    fn test_parse_position_rejects_bad_fen() {
        assert!(parse_position("position fen 8/8/8 w - - 0 1").is_err());
        assert!(parse_position("position sideways").is_err());
    }

    #[test]
    fn test_parse_go() {
        let p = parse_go("go wtime 60000 btime 50000 winc 1000 binc 500 movestogo 20");
        assert_eq!(p.wtime, Some(60000));
        assert_eq!(p.binc, Some(500));
        assert_eq!(p.movestogo, Some(20));
        assert!(!p.infinite);

        let p = parse_go("go depth 7 nodes 100000");
        assert_eq!(p.depth, Some(7));
        assert_eq!(p.nodes, Some(100000));

        assert!(parse_go("go infinite").infinite);
    }

    #[test]
    fn test_limits_for_uses_side_to_move_clock() {
        let p = parse_go("go wtime 60030 btime 1030");
        let white = limits_for(&p, Color::White);
        assert_eq!(white.soft_ms, Some(1200));
        assert_eq!(white.hard_ms, Some(6000));
        let black = limits_for(&p, Color::Black);
        assert!(black.hard_ms.unwrap() < white.hard_ms.unwrap());

        let p = parse_go("go movetime 1000");
        assert_eq!(limits_for(&p, Color::White).hard_ms, Some(970));

        let p = parse_go("go infinite wtime 1000");
        assert_eq!(limits_for(&p, Color::White).hard_ms, None);

        let p = parse_go("go depth 5");
        let l = limits_for(&p, Color::White);
        assert_eq!(l.depth, Some(5));
        assert_eq!(l.soft_ms, None);
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(Value::new(35)), "cp 35");
        assert_eq!(format_score(Value::mate_in(3)), "mate 2");
        assert_eq!(format_score(Value::mated_in(2)), "mate -1");
    }

    #[test]
    fn test_format_bestmove() {
        let result = SearchResult {
            best_move: Move::NONE,
            score_cp: 0,
            pv: Vec::new(),
            depth: 0,
            nodes: 0,
        };
        assert_eq!(format_bestmove(&result), "bestmove 0000");
    }

    #[test]
    fn test_go_while_searching_replaces_search() {
        use rchess_core::nnue::Network;
        use rchess_core::search::SearchTuneParams;
        use std::sync::Arc;

        use crate::state::UciOptions;

        let opts = UciOptions {
            hash_mb: 1,
            eval_file: None,
        };
        let net = Arc::new(Network::random(9));
        let mut st = EngineState::new(opts, net, SearchTuneParams::default());
        handle_go("go infinite", &mut st).unwrap();
        assert!(st.is_searching());
        // 無限探索中の go / position も止めてから処理する
        handle_go("go infinite", &mut st).unwrap();
        handle_position("position startpos moves e2e4", &mut st);
        assert!(!st.is_searching());
        assert_eq!(st.position.side_to_move(), Color::Black);

        st.finish_search();
        assert!(st.worker.is_some());
    }
}

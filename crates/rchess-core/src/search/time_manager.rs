//! 持ち時間の配分
//!
//! `go` の時計情報から、反復深化を打ち切る目安（soft）と絶対的な上限（hard）を決める。

/// 通信遅延などのために残しておく時間（ms）
const MOVE_OVERHEAD: i64 = 30;

/// `movestogo` がないときに仮定する残り手数
const DEFAULT_MOVES_TO_GO: i64 = 50;

/// 手番側の時計情報（ms）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeControl {
    pub time_left: i64,
    pub increment: i64,
    pub moves_to_go: Option<u32>,
    pub move_time: Option<i64>,
}

/// 時間配分（ms）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeAllocation {
    /// これを過ぎたら次の反復に入らない
    pub soft_ms: u64,
    /// これを過ぎたら探索を中断する
    pub hard_ms: u64,
}

pub struct TimeManager;

impl TimeManager {
    /// 時計情報から soft / hard を計算する
    pub fn allocate(tc: TimeControl) -> TimeAllocation {
        if let Some(mt) = tc.move_time.filter(|&mt| mt > 0) {
            let t = (mt - MOVE_OVERHEAD).max(1) as u64;
            return TimeAllocation { soft_ms: t, hard_ms: t };
        }
        if tc.time_left <= 0 {
            return TimeAllocation { soft_ms: 1, hard_ms: 2 };
        }

        let t = (tc.time_left - MOVE_OVERHEAD).max(1);
        let inc = tc.increment.max(0);
        let mtg = tc.moves_to_go.filter(|&m| m > 0).map_or(DEFAULT_MOVES_TO_GO, i64::from);

        let mut soft = t / mtg + inc;
        let mut hard = (soft * 5).min(t / 8 + inc).min((t - 50).max(1));
        if hard <= 0 {
            hard = 2;
        }
        if soft > hard {
            soft = (hard - 10).max(1);
        }
        TimeAllocation {
            soft_ms: soft.max(1) as u64,
            hard_ms: hard.max(2) as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_time() {
        let tc = TimeControl { move_time: Some(1000), ..Default::default() };
        assert_eq!(TimeManager::allocate(tc), TimeAllocation { soft_ms: 970, hard_ms: 970 });
        let tiny = TimeControl { move_time: Some(10), ..Default::default() };
        assert_eq!(TimeManager::allocate(tiny), TimeAllocation { soft_ms: 1, hard_ms: 1 });
    }

    #[test]
    fn test_no_time_left() {
        let tc = TimeControl { time_left: 0, increment: 1000, ..Default::default() };
        assert_eq!(TimeManager::allocate(tc), TimeAllocation { soft_ms: 1, hard_ms: 2 });
    }

    #[test]
    fn test_sudden_death() {
        let tc = TimeControl { time_left: 60_030, ..Default::default() };
        // t = 60000, soft = 60000/50 = 1200, hard = min(6000, 7500, 59950)
        assert_eq!(TimeManager::allocate(tc), TimeAllocation { soft_ms: 1200, hard_ms: 6000 });
    }

    #[test]
    fn test_increment_and_moves_to_go() {
        let tc = TimeControl {
            time_left: 10_030,
            increment: 500,
            moves_to_go: Some(10),
            move_time: None,
        };
        // t = 10000, soft = 1000 + 500, hard = min(7500, 1250 + 500, 9950)
        assert_eq!(TimeManager::allocate(tc), TimeAllocation { soft_ms: 1500, hard_ms: 1750 });
    }

    #[test]
    fn test_soft_never_exceeds_hard() {
        let tc = TimeControl {
            time_left: 100,
            increment: 5000,
            moves_to_go: Some(1),
            move_time: None,
        };
        let a = TimeManager::allocate(tc);
        assert!(a.soft_ms <= a.hard_ms);
        assert!(a.hard_ms >= 2);
    }
}

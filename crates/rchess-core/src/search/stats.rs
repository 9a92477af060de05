//! 探索統計（search-stats feature有効時のみ）
//!
//! 探索中の各種枝刈りの発生回数を記録し、チューニングやデバッグに使用する。

/// 深度別統計の最大深度
#[cfg(feature = "search-stats")]
pub(super) const STATS_MAX_DEPTH: usize = 32;

/// 探索統計カウンタ
#[cfg(feature = "search-stats")]
#[derive(Debug, Clone)]
pub struct SearchStats {
    /// 静止探索ノード数
    pub qs_nodes: u64,
    /// TT（置換表）カットオフ回数
    pub tt_cutoff: u64,
    pub razoring_applied: u64,
    /// Reverse futility による枝刈り回数
    pub rfp_cutoff: u64,
    /// NMP（Null Move Pruning）試行回数
    pub nmp_attempted: u64,
    /// NMPによる枝刈り成功回数
    pub nmp_cutoff: u64,
    pub iir_applied: u64,
    /// Move Loop内の枝刈り回数（LMP, Futility, SEE の合計）
    pub move_loop_pruned: u64,
    pub singular_extension: u64,
    pub multi_cut: u64,
    pub check_extension: u64,
    pub lmr_applied: u64,
    /// LMRによる再探索回数
    pub lmr_research: u64,
    /// 静止探索の delta pruning 回数
    pub delta_pruned: u64,
    /// 深度別ノード数
    pub nodes_by_depth: [u64; STATS_MAX_DEPTH],
    /// 深度別カットオフ回数
    pub cutoff_by_depth: [u64; STATS_MAX_DEPTH],
    /// 深度別 first move cutoff 回数（Move Ordering品質）
    pub first_move_cutoff_by_depth: [u64; STATS_MAX_DEPTH],
}

#[cfg(feature = "search-stats")]
impl Default for SearchStats {
    fn default() -> Self {
        Self {
            qs_nodes: 0,
            tt_cutoff: 0,
            razoring_applied: 0,
            rfp_cutoff: 0,
            nmp_attempted: 0,
            nmp_cutoff: 0,
            iir_applied: 0,
            move_loop_pruned: 0,
            singular_extension: 0,
            multi_cut: 0,
            check_extension: 0,
            lmr_applied: 0,
            lmr_research: 0,
            delta_pruned: 0,
            nodes_by_depth: [0; STATS_MAX_DEPTH],
            cutoff_by_depth: [0; STATS_MAX_DEPTH],
            first_move_cutoff_by_depth: [0; STATS_MAX_DEPTH],
        }
    }
}

#[cfg(feature = "search-stats")]
impl SearchStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// 統計をフォーマットして文字列として返す
    pub fn format_report(&self) -> String {
        let mut report = String::new();
        report.push_str("=== Search Statistics ===\n");
        report.push_str(&format!("QSearch nodes:       {:>12}\n", self.qs_nodes));
        report.push_str(&format!("TT cutoffs:          {:>12}\n", self.tt_cutoff));
        report.push_str("--- Pre-Move Pruning ---\n");
        report.push_str(&format!("Razoring:            {:>12}\n", self.razoring_applied));
        report.push_str(&format!("Reverse futility:    {:>12}\n", self.rfp_cutoff));
        report.push_str(&format!("NMP attempted:       {:>12}\n", self.nmp_attempted));
        report.push_str(&format!("NMP cutoffs:         {:>12}\n", self.nmp_cutoff));
        report.push_str(&format!("IIR:                 {:>12}\n", self.iir_applied));
        report.push_str("--- Move Loop ---\n");
        report.push_str(&format!("Move loop pruned:    {:>12}\n", self.move_loop_pruned));
        report.push_str(&format!("LMR applied:         {:>12}\n", self.lmr_applied));
        report.push_str(&format!("LMR re-search:       {:>12}\n", self.lmr_research));
        report.push_str(&format!("Delta pruned (QS):   {:>12}\n", self.delta_pruned));
        report.push_str("--- Extensions ---\n");
        report.push_str(&format!("Singular extension:  {:>12}\n", self.singular_extension));
        report.push_str(&format!("Multi-cut:           {:>12}\n", self.multi_cut));
        report.push_str(&format!("Check extension:     {:>12}\n", self.check_extension));
        report.push_str("--- Nodes by Depth ---\n");
        for (d, &count) in self.nodes_by_depth.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let cuts = self.cutoff_by_depth[d];
            let first = self.first_move_cutoff_by_depth[d];
            let rate = if cuts > 0 { first as f64 / cuts as f64 * 100.0 } else { 0.0 };
            report.push_str(&format!(
                "  depth {:>2}: {:>10} nodes, {:>8} cutoffs ({:>5.1}% first move)\n",
                d, count, cuts, rate
            ));
        }
        report
    }
}

// =============================================================================
// 統計マクロ
// =============================================================================

/// 統計カウンタをインクリメントするマクロ（feature有効時のみ実行）
#[cfg(feature = "search-stats")]
macro_rules! inc_stat {
    ($st:expr, $field:ident) => {
        $st.stats.$field += 1;
    };
}

#[cfg(not(feature = "search-stats"))]
macro_rules! inc_stat {
    ($st:expr, $field:ident) => {};
}

/// 深度別統計をカウントするマクロ（feature有効時のみ実行）
#[cfg(feature = "search-stats")]
macro_rules! inc_stat_by_depth {
    ($st:expr, $field:ident, $depth:expr) => {
        let d = ($depth.max(0) as usize).min($crate::search::stats::STATS_MAX_DEPTH - 1);
        $st.stats.$field[d] += 1;
    };
}

#[cfg(not(feature = "search-stats"))]
macro_rules! inc_stat_by_depth {
    ($st:expr, $field:ident, $depth:expr) => {};
}

pub(super) use inc_stat;
pub(super) use inc_stat_by_depth;

#[cfg(all(test, feature = "search-stats"))]
mod tests {
    use super::*;

    #[test]
    fn test_report_lists_active_depths() {
        let mut stats = SearchStats::default();
        stats.nodes_by_depth[3] = 10;
        stats.cutoff_by_depth[3] = 4;
        stats.first_move_cutoff_by_depth[3] = 3;
        let report = stats.format_report();
        assert!(report.contains("depth  3"));
        assert!(report.contains("75.0% first move"));
        assert!(!report.contains("depth  4"));
        stats.reset();
        assert_eq!(stats.nodes_by_depth[3], 0);
    }
}

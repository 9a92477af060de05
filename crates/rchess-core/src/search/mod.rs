//! 探索モジュール
//!
//! 反復深化 + アスピレーションウィンドウ + PVS。
//!
//! - `alpha_beta`: 探索本体と `SearchWorker`
//! - `qsearch`: 静止探索
//! - `pruning`: Razoring / RFP / NMP / IIR / 指し手ループ内の枝刈り
//! - `movepicker`: 段階的な指し手生成
//! - `history`: history / counter move
//! - `time_manager`: 持ち時間の配分
//! - `tune_params`: 探索パラメータ（UCI オプションで変更可能）

mod alpha_beta;
mod history;
mod movepicker;
mod pruning;
mod qsearch;
mod search_helpers;
mod stats;
mod time_manager;
mod tune_params;
mod types;

pub use alpha_beta::{MAX_DEPTH, SearchWorker};
pub use history::{
    BUTTERFLY_MAX, ButterflyHistory, CONTINUATION_MAX, ContinuationHistory, CounterMoveHistory,
    HistoryTables, PieceToHistory, StatsEntry, stat_bonus,
};
pub use movepicker::{MovePicker, Stage, is_capture, is_capture_stage};
#[cfg(feature = "search-stats")]
pub use stats::SearchStats;
pub use time_manager::{TimeAllocation, TimeControl, TimeManager};
pub use tune_params::{SearchTuneOptionSpec, SearchTuneParams, SearchTuneSetResult};
pub use types::{NodeType, SearchInfo, SearchLimits, SearchResult, Stack};

#[cfg(test)]
mod tests {
    mod alpha_beta;
}

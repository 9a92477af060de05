use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use anyhow::{Context, Result};
use rchess_core::Position;
use rchess_core::bitboard::SliderTable;
use rchess_core::nnue::Network;
use rchess_core::search::{SearchTuneParams, SearchWorker};
use rchess_core::tt::TranspositionTable;

/// `--eval-file` がないときに使う乱数ネットワークのシード
pub const FALLBACK_NETWORK_SEED: u64 = 0x5EED_C4E5;

#[derive(Clone, Debug)]
pub struct UciOptions {
    pub hash_mb: usize,
    pub eval_file: Option<String>,
}

/// フロントエンドの状態
///
/// 探索中は `worker` が探索スレッドに移り、`search_handle` の戻り値で返ってくる。
/// `network` と `tune_params` はワーカーと同じものを持ち、ワーカーの作り直しに使う。
pub struct EngineState {
    pub opts: UciOptions,
    pub position: Position,
    pub network: Arc<Network>,
    pub tune_params: SearchTuneParams,
    pub worker: Option<SearchWorker>,
    pub search_handle: Option<JoinHandle<SearchWorker>>,
    pub stop_flag: Arc<AtomicBool>,
}

impl EngineState {
    pub fn new(opts: UciOptions, network: Arc<Network>, tune_params: SearchTuneParams) -> Self {
        let worker = build_worker(&opts, &network, tune_params);
        let stop_flag = worker.stop_handle();
        Self {
            opts,
            position: Position::startpos(),
            network,
            tune_params,
            worker: Some(worker),
            search_handle: None,
            stop_flag,
        }
    }

    /// 探索中か
    pub fn is_searching(&self) -> bool {
        self.search_handle.is_some()
    }

    /// 探索を止め、スレッドの終了を待ってワーカーを取り戻す
    ///
    /// `go infinite` 中でも戻ってこられるよう、必ず停止フラグを立ててから join する。
    pub fn finish_search(&mut self) {
        let Some(handle) = self.search_handle.take() else {
            return;
        };
        self.stop_flag.store(true, Ordering::Relaxed);
        match handle.join() {
            Ok(worker) => self.worker = Some(worker),
            Err(_) => {
                log::error!("search thread panicked; rebuilding worker");
                let worker = build_worker(&self.opts, &self.network, self.tune_params);
                self.stop_flag = worker.stop_handle();
                self.worker = Some(worker);
            }
        }
    }
}

/// 現在の設定・ネットワーク・パラメータからワーカーを作る
fn build_worker(
    opts: &UciOptions,
    network: &Arc<Network>,
    tune_params: SearchTuneParams,
) -> SearchWorker {
    SearchWorker::new(
        Arc::new(TranspositionTable::new(opts.hash_mb)),
        Arc::clone(network),
        tune_params,
    )
}

/// ネットワークを読み込む
///
/// パスがなければ乱数ネットワークで代用する。指定されたファイルが読めなければエラー。
pub fn load_network(path: Option<&str>) -> Result<Arc<Network>> {
    match path {
        Some(p) => {
            let net = Network::load(p).with_context(|| format!("failed to load network {p}"))?;
            log::info!("loaded network {p}");
            Ok(Arc::new(net))
        }
        None => {
            log::warn!("no eval file given; using random weights");
            Ok(Arc::new(Network::random(FALLBACK_NETWORK_SEED)))
        }
    }
}

/// 利きテーブルをファイルから読み込んでプロセス共有テーブルにする
///
/// 盤面を触る前に呼ぶ。
pub fn install_slider_table(path: &Path) -> Result<()> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read slider table {}", path.display()))?;
    SliderTable::from_bytes(&bytes)
        .and_then(SliderTable::install)
        .with_context(|| format!("invalid slider table {}", path.display()))?;
    log::debug!("slider table installed from {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rchess_core::search::SearchLimits;
    use std::thread;

    fn state() -> EngineState {
        let opts = UciOptions {
            hash_mb: 1,
            eval_file: None,
        };
        let mut tune = SearchTuneParams::default();
        tune.set_from_name("LMRBase100", 90);
        EngineState::new(opts, Arc::new(Network::random(3)), tune)
    }

    #[test]
    fn test_load_network_missing_file_is_error() {
        let err = load_network(Some("/nonexistent/rchess.nnue")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/rchess.nnue"));
        assert!(load_network(None).is_ok());
    }

    #[test]
    fn test_install_slider_table_rejects_bad_file() {
        assert!(install_slider_table(Path::new("/nonexistent/sliders.bin")).is_err());
    }

    #[test]
    fn test_finish_search_stops_infinite_search() {
        let mut st = state();
        let mut worker = st.worker.take().unwrap();
        let pos = st.position.clone();
        worker.reset_stop();
        let handle = thread::Builder::new()
            .stack_size(64 * 1024 * 1024)
            .spawn(move || {
                let _ = worker.search(&pos, SearchLimits::default(), |_| {});
                worker
            })
            .unwrap();
        st.search_handle = Some(handle);
        assert!(st.is_searching());

        st.finish_search();
        assert!(!st.is_searching());
        assert!(st.worker.is_some());
    }

    #[test]
    fn test_panicked_search_keeps_network_and_params() {
        let mut st = state();
        st.worker = None;
        st.search_handle = Some(thread::spawn(|| -> SearchWorker { panic!("search failed") }));

        st.finish_search();
        let worker = st.worker.as_ref().unwrap();
        assert!(Arc::ptr_eq(worker.network(), &st.network));
        assert_eq!(worker.tune_params().get_by_name("LMRBase100"), Some(90));
        assert!(Arc::ptr_eq(&worker.stop_handle(), &st.stop_flag));
    }
}

use std::sync::Arc;

use rchess_core::search::SearchTuneParams;

use crate::io::{info_string, uci_println};
use crate::state::{EngineState, load_network};

/// Hash の上限（MB）
const MAX_HASH_MB: usize = 65536;

pub fn send_id_and_options(state: &EngineState) {
    uci_println(concat!("id name rchess ", env!("CARGO_PKG_VERSION")));
    uci_println("id author rchess developers");

    uci_println(&format!(
        "option name Hash type spin default {} min 1 max {MAX_HASH_MB}",
        state.opts.hash_mb
    ));
    uci_println(&format!(
        "option name EvalFile type string default {}",
        state.opts.eval_file.as_deref().unwrap_or("<empty>")
    ));

    for spec in SearchTuneParams::option_specs() {
        let value = state.tune_params.get_by_name(spec.name).unwrap_or(spec.default);
        uci_println(&format!(
            "option name {} type spin default {} min {} max {}",
            spec.name, value, spec.min, spec.max
        ));
    }
}

/// `setoption name <name> [value <value>]` を分解する
fn parse_setoption(cmd: &str) -> Option<(String, String)> {
    let rest = cmd.strip_prefix("setoption")?.trim_start();
    let rest = rest.strip_prefix("name")?.trim_start();
    match rest.split_once(" value ") {
        Some((name, value)) => Some((name.trim().to_string(), value.trim().to_string())),
        None => Some((rest.trim().to_string(), String::new())),
    }
}

pub fn handle_setoption(cmd: &str, state: &mut EngineState) {
    let Some((name, value)) = parse_setoption(cmd) else {
        log::warn!("malformed setoption: {cmd}");
        return;
    };
    state.finish_search();
    let Some(worker) = state.worker.as_mut() else {
        return;
    };

    match name.as_str() {
        "Hash" => match value.parse::<usize>() {
            Ok(mb) => {
                let mb = mb.clamp(1, MAX_HASH_MB);
                state.opts.hash_mb = mb;
                worker.resize_tt(mb);
            }
            Err(_) => log::warn!("invalid Hash value: {value}"),
        },
        "EvalFile" => {
            let path = if value.is_empty() || value == "<empty>" { None } else { Some(value) };
            match load_network(path.as_deref()) {
                Ok(net) => {
                    worker.set_network(Arc::clone(&net));
                    state.network = net;
                    state.opts.eval_file = path;
                }
                // 読めなければ今のネットワークのまま
                Err(e) => info_string(format!("error: {e:#}")),
            }
        }
        _ => {
            let Ok(v) = value.parse::<i32>() else {
                log::warn!("invalid value for {name}: {value}");
                return;
            };
            match worker.tune_params_mut().set_from_name(&name, v) {
                Some(r) => {
                    state.tune_params = *worker.tune_params();
                    if r.clamped {
                        info_string(format!(
                            "{name} clamped to {} (range {}..={})",
                            r.applied, r.min, r.max
                        ));
                    }
                }
                None => log::warn!("unknown option: {name}"),
            }
        }
    }
}

use std::io::{self, Write};

/// UCI プロトコルに沿って標準出力へ1行出す
pub fn uci_println(s: &str) {
    let mut out = io::stdout().lock();
    // GUI が閉じた後の書き込み失敗は無視する
    let _ = writeln!(out, "{s}");
    let _ = out.flush();
}

/// `info string ...` の出力
pub fn info_string<S: AsRef<str>>(s: S) {
    uci_println(&format!("info string {}", s.as_ref()));
}

//! Integration tests for `kpiboard build`

use std::path::PathBuf;
use std::process::Command;

use kpiboard_core::storage::parse_csv;
use kpiboard_engine::engine::{CellRef, DisplayGrid};

const DASHBOARD: &str = "\
,Reporte TKC
,ESTADO,Cantidad
,Entregada,12
,En distribución,3
,,
Plan $
Distribuidor,SUM of IMPORTE
Norte,1200
";

struct Cleanup(Vec<PathBuf>);

impl Drop for Cleanup {
    fn drop(&mut self) {
        for path in &self.0 {
            let _ = std::fs::remove_file(path);
        }
    }
}

fn temp_path(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("kpiboard_{}_{}.csv", tag, std::process::id()))
}

fn run_build(dashboard: &PathBuf, out: &PathBuf) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_kpiboard"))
        .arg("build")
        .arg("--dashboard")
        .arg(dashboard)
        .arg("--out")
        .arg(out)
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to execute kpiboard");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.code().unwrap_or(-1))
}

#[test]
fn test_build_writes_api_sheet() {
    let dashboard = temp_path("build_dash");
    let out = temp_path("build_api");
    let _cleanup = Cleanup(vec![dashboard.clone(), out.clone()]);
    std::fs::write(&dashboard, DASHBOARD).unwrap();

    let (stdout, stderr, code) = run_build(&dashboard, &out);
    assert_eq!(code, 0, "stderr: {}", stderr);
    assert!(stdout.contains("linked   tkc"), "{}", stdout);
    assert!(stdout.contains("linked   plan"), "{}", stdout);
    assert!(stdout.contains("skipped  pendientes_flota title not found"), "{}", stdout);
    assert!(stdout.contains("13 KPI formulas"), "{}", stdout);

    let api = parse_csv(&out, "API").unwrap();
    let at = |a1: &str| api.display_value(CellRef::from_str(a1).unwrap());
    assert_eq!(at("A1"), "A (Key)");
    assert_eq!(at("B2"), "=NOW()");
    assert_eq!(
        at("V1"),
        "=LET(t,INDIRECT(\"'01 DashBoard'!B2:C4\"),FILTER(t, INDEX(t,,1)<>\"\" ))"
    );
    assert_eq!(
        at("M1"),
        "=LET(t,INDIRECT(\"'01 DashBoard'!A7:B8\"),FILTER(t, INDEX(t,,1)<>\"\" ))"
    );
}

#[test]
fn test_build_missing_input_fails() {
    let dashboard = temp_path("build_missing");
    let out = temp_path("build_missing_out");
    let _cleanup = Cleanup(vec![out.clone()]);

    let (_, stderr, code) = run_build(&dashboard, &out);
    assert_eq!(code, 1);
    assert!(stderr.contains("Error: reading"), "{}", stderr);
}

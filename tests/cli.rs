use assert_cmd::Command;
use predicates::prelude::*;
use rusqlite::Connection;

/// Seed a contabilidad.db in a fresh temp dir and return the dir. The
/// binary resolves the store relative to its working directory when no
/// settings file exists, so each test runs with HOME and cwd pinned there.
fn seeded_dir(with_cxc2023: bool) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let conn = Connection::open(dir.path().join("contabilidad.db")).unwrap();
    conn.execute_batch(
        "CREATE TABLE caja2025 (fecha TEXT, abono REAL, prestamo REAL, detalle TEXT);
         CREATE TABLE socios2024 (nombre TEXT, codigo TEXT);
         CREATE TABLE socios2023 (nombre TEXT, codigo TEXT);
         CREATE TABLE cxc2025 (fecha TEXT, codigo_cliente TEXT, salida TEXT);
         CREATE TABLE cxc2024 (fecha TEXT, socio TEXT, salida TEXT);
         INSERT INTO caja2025 VALUES ('2025-01-10', 100.0, 20.0, 'fertilizer');
         INSERT INTO caja2025 VALUES ('2025-02-05', NULL, 50.0, 'fuel');
         INSERT INTO socios2024 VALUES ('Yamile Vera', 'S01');
         INSERT INTO cxc2025 VALUES ('2025-03-01', 'S01', '1500');
         INSERT INTO cxc2025 VALUES ('2025-04-01', 'S01', '2000');",
    )
    .unwrap();
    if with_cxc2023 {
        conn.execute_batch("CREATE TABLE cxc2023 (fecha TEXT, codigo_cliente TEXT, salida TEXT);")
            .unwrap();
    }
    dir
}

fn agrodash(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("agrodash").unwrap();
    cmd.current_dir(dir.path()).env("HOME", dir.path());
    cmd
}

#[test]
fn report_cash_prints_monthly_totals() {
    let dir = seeded_dir(false);
    agrodash(&dir)
        .args(["report", "cash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2025-01"))
        .stdout(predicate::str::contains("$100.00"))
        .stdout(predicate::str::contains("$50.00"));
}

#[test]
fn report_cash_is_byte_identical_across_runs() {
    let dir = seeded_dir(false);
    let first = agrodash(&dir).args(["report", "cash"]).output().unwrap();
    let second = agrodash(&dir).args(["report", "cash"]).output().unwrap();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn report_expenses_honors_range() {
    let dir = seeded_dir(false);
    agrodash(&dir)
        .args(["report", "expenses", "--from", "2025-01-01", "--to", "2025-01-31"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fertilizer"))
        .stdout(predicate::str::contains("fuel").not());
}

#[test]
fn report_expenses_inverted_range_reports_no_data() {
    let dir = seeded_dir(false);
    agrodash(&dir)
        .args(["report", "expenses", "--from", "2025-12-31", "--to", "2025-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No expenses found"));
}

#[test]
fn report_receivables_all_partners() {
    let dir = seeded_dir(false);
    agrodash(&dir)
        .args(["report", "receivables", "--year", "2025"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Yamile Vera"))
        .stdout(predicate::str::contains("$3,500.00"));
}

#[test]
fn report_receivables_single_partner() {
    let dir = seeded_dir(false);
    agrodash(&dir)
        .args(["report", "receivables", "--year", "2025", "--partner", "Yamile Vera"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2025-03-01"))
        .stdout(predicate::str::contains("$1,500.00"));
}

#[test]
fn report_receivables_unknown_partner_warns() {
    let dir = seeded_dir(false);
    agrodash(&dir)
        .args(["report", "receivables", "--year", "2025", "--partner", "Nobody"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no code found").or(predicate::str::contains("No code found")));
}

#[test]
fn report_receivables_2023_missing_table() {
    let dir = seeded_dir(false);
    agrodash(&dir)
        .args(["report", "receivables", "--year", "2023"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not available"));
}

#[test]
fn report_receivables_unknown_year_fails() {
    let dir = seeded_dir(false);
    agrodash(&dir)
        .args(["report", "receivables", "--year", "2019"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown fiscal year"));
}

#[test]
fn status_lists_tables() {
    let dir = seeded_dir(true);
    agrodash(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("caja2025"))
        .stdout(predicate::str::contains("cxc2023"));
}

#[test]
fn status_without_store_explains() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("agrodash").unwrap();
    cmd.current_dir(dir.path()).env("HOME", dir.path());
    cmd.arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Store file not found"));
}

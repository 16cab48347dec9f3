use chrono::NaiveDate;

use crate::executor::QueryExecutor;

/// The cash journal covers one bookkeeping year.
pub const CASH_TABLE: &str = "caja2025";

/// Date-picker defaults for the expense report: the full fiscal year.
pub const FISCAL_YEAR_START: &str = "2025-01-01";
pub const FISCAL_YEAR_END: &str = "2025-12-31";

/// Sentinel entry in the partner selector.
pub const ALL_PARTNERS: &str = "All partners";

/// Per-year receivables layout. The transaction-side join-key column name
/// changed between exports, and 2023 may be missing its table entirely, so
/// each handler consults this record instead of assuming one schema.
pub struct YearSchema {
    pub year: i32,
    pub receivables_table: &'static str,
    pub partner_table: &'static str,
    /// Column on the receivables side holding the partner code.
    pub partner_code_column: &'static str,
    /// Check sqlite_master before querying the receivables table.
    pub verify_table_exists: bool,
}

// The store has no socios2025 table; the 2025 roster is read from
// socios2024, matching the books as delivered.
pub const FISCAL_YEARS: &[YearSchema] = &[
    YearSchema {
        year: 2025,
        receivables_table: "cxc2025",
        partner_table: "socios2024",
        partner_code_column: "codigo_cliente",
        verify_table_exists: false,
    },
    YearSchema {
        year: 2024,
        receivables_table: "cxc2024",
        partner_table: "socios2024",
        partner_code_column: "socio",
        verify_table_exists: false,
    },
    YearSchema {
        year: 2023,
        receivables_table: "cxc2023",
        partner_table: "socios2023",
        partner_code_column: "codigo_cliente",
        verify_table_exists: true,
    },
];

pub fn year_schema(year: i32) -> Option<&'static YearSchema> {
    FISCAL_YEARS.iter().find(|s| s.year == year)
}

// ---------------------------------------------------------------------------
// Monthly cash flow
// ---------------------------------------------------------------------------

pub struct MonthlyCashRow {
    pub month: String,
    pub total_income: f64,
    pub total_expense: f64,
}

/// Credits and debits summed per calendar month, ascending. Null amounts
/// count as zero.
pub fn monthly_cash(exec: &mut QueryExecutor) -> Vec<MonthlyCashRow> {
    let sql = format!(
        "SELECT substr(fecha, 1, 7) AS month, \
         ROUND(SUM(COALESCE(abono, 0)), 2) AS total_income, \
         ROUND(SUM(COALESCE(prestamo, 0)), 2) AS total_expense \
         FROM {CASH_TABLE} GROUP BY month ORDER BY month"
    );
    let result = exec.execute(&sql, &[]);
    (0..result.rows.len())
        .map(|i| MonthlyCashRow {
            month: result.text(i, 0).to_string(),
            total_income: result.number(i, 1),
            total_expense: result.number(i, 2),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Top expenses
// ---------------------------------------------------------------------------

pub struct ExpenseRow {
    pub concept: String,
    pub total: f64,
}

/// The ten largest expense concepts inside the inclusive date range,
/// descending. An inverted range is passed through as-is; the store simply
/// returns nothing.
pub fn top_expenses(exec: &mut QueryExecutor, from: &str, to: &str) -> Vec<ExpenseRow> {
    let sql = format!(
        "SELECT detalle AS concept, \
         ROUND(SUM(COALESCE(prestamo, 0)), 2) AS total \
         FROM {CASH_TABLE} WHERE fecha BETWEEN ?1 AND ?2 \
         GROUP BY detalle ORDER BY total DESC LIMIT 10"
    );
    let result = exec.execute(&sql, &[from, to]);
    (0..result.rows.len())
        .map(|i| ExpenseRow {
            concept: result.text(i, 0).to_string(),
            total: result.number(i, 1),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Receivables by partner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Partner {
    pub name: String,
    pub code: String,
}

/// Distinct partners for the year, trimmed, blank names dropped.
pub fn partners(exec: &mut QueryExecutor, schema: &YearSchema) -> Vec<Partner> {
    let sql = format!(
        "SELECT DISTINCT TRIM(nombre) AS name, TRIM(codigo) AS code \
         FROM {} WHERE nombre IS NOT NULL AND nombre <> ''",
        schema.partner_table
    );
    let result = exec.execute(&sql, &[]);
    (0..result.rows.len())
        .map(|i| Partner {
            name: result.text(i, 0).to_string(),
            code: result.text(i, 1).to_string(),
        })
        .collect()
}

/// Selector entries: the all-partners sentinel followed by names in
/// default string order.
pub fn partner_options(partners: &[Partner]) -> Vec<String> {
    let mut names: Vec<String> = partners.iter().map(|p| p.name.clone()).collect();
    names.sort();
    let mut options = vec![ALL_PARTNERS.to_string()];
    options.extend(names);
    options
}

pub struct PartnerTotal {
    pub partner: String,
    pub total: f64,
}

/// Positive outflows summed per partner, descending. The outer join keeps
/// every partner in play, but the positivity filter drops those without a
/// single positive receivable row.
pub fn receivables_by_partner(exec: &mut QueryExecutor, schema: &YearSchema) -> Vec<PartnerTotal> {
    let sql = format!(
        "SELECT COALESCE(s.nombre, 'Unidentified partner') AS partner, \
         ROUND(SUM(CAST(c.salida AS FLOAT)), 2) AS total \
         FROM {partners} s \
         LEFT JOIN {receivables} c ON TRIM(s.codigo) = TRIM(c.{code_col}) \
         WHERE CAST(c.salida AS FLOAT) > 0 \
         GROUP BY s.nombre ORDER BY total DESC",
        partners = schema.partner_table,
        receivables = schema.receivables_table,
        code_col = schema.partner_code_column,
    );
    let result = exec.execute(&sql, &[]);
    (0..result.rows.len())
        .map(|i| PartnerTotal {
            partner: result.text(i, 0).to_string(),
            total: result.number(i, 1),
        })
        .collect()
}

pub struct Payment {
    pub date: String,
    pub parsed: Option<NaiveDate>,
    pub amount: f64,
}

pub enum PartnerHistory {
    /// The selected name has no code in the current roster. No store query
    /// is issued on this path.
    CodeNotFound,
    Payments(Vec<Payment>),
}

/// Date-ordered positive outflows for one partner, resolved name → code
/// against the roster already fetched for the selector.
pub fn partner_history(
    exec: &mut QueryExecutor,
    schema: &YearSchema,
    partners: &[Partner],
    name: &str,
) -> PartnerHistory {
    let Some(partner) = partners.iter().find(|p| p.name == name) else {
        return PartnerHistory::CodeNotFound;
    };
    let sql = format!(
        "SELECT fecha AS date, ROUND(CAST(salida AS FLOAT), 2) AS amount \
         FROM {receivables} \
         WHERE TRIM({code_col}) = ?1 AND CAST(salida AS FLOAT) > 0 \
         ORDER BY fecha",
        receivables = schema.receivables_table,
        code_col = schema.partner_code_column,
    );
    let result = exec.execute(&sql, &[partner.code.as_str()]);
    let payments = (0..result.rows.len())
        .map(|i| {
            let date = result.text(i, 0).to_string();
            let parsed = NaiveDate::parse_from_str(&date, "%Y-%m-%d").ok();
            Payment {
                date,
                parsed,
                amount: result.number(i, 1),
            }
        })
        .collect();
    PartnerHistory::Payments(payments)
}

/// Whether the year's receivables table is present. Years without the
/// verify flag are assumed present; a missing table there surfaces as an
/// ordinary degraded query.
pub fn receivables_available(exec: &mut QueryExecutor, schema: &YearSchema) -> bool {
    !schema.verify_table_exists || table_exists(exec, schema.receivables_table)
}

pub fn table_row_count(exec: &mut QueryExecutor, table: &str) -> f64 {
    let result = exec.execute(&format!("SELECT COUNT(*) FROM {table}"), &[]);
    result.number(0, 0)
}

/// Whether a table exists in the store, via sqlite_master.
pub fn table_exists(exec: &mut QueryExecutor, table: &str) -> bool {
    let result = exec.execute(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
        &[table],
    );
    !result.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::QueryExecutor;
    use rusqlite::Connection;
    use std::path::PathBuf;

    fn seeded_store(with_cxc2023: bool) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contabilidad.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE caja2025 (fecha TEXT, abono REAL, prestamo REAL, detalle TEXT);
             CREATE TABLE socios2024 (nombre TEXT, codigo TEXT);
             CREATE TABLE socios2023 (nombre TEXT, codigo TEXT);
             CREATE TABLE cxc2025 (fecha TEXT, codigo_cliente TEXT, salida TEXT);
             CREATE TABLE cxc2024 (fecha TEXT, socio TEXT, salida TEXT);",
        )
        .unwrap();
        if with_cxc2023 {
            conn.execute_batch(
                "CREATE TABLE cxc2023 (fecha TEXT, codigo_cliente TEXT, salida TEXT);",
            )
            .unwrap();
        }
        (dir, path)
    }

    fn exec_for(path: &PathBuf) -> QueryExecutor {
        QueryExecutor::new(path)
    }

    #[test]
    fn test_monthly_cash_groups_and_orders() {
        let (_dir, path) = seeded_store(false);
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "INSERT INTO caja2025 VALUES ('2025-01-10', 60.0, 20.0, 'a');
             INSERT INTO caja2025 VALUES ('2025-01-25', 40.0, NULL, 'b');
             INSERT INTO caja2025 VALUES ('2025-02-05', NULL, 50.0, 'c');",
        )
        .unwrap();
        let mut exec = exec_for(&path);
        let rows = monthly_cash(&mut exec);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].month, "2025-01");
        assert_eq!(rows[0].total_income, 100.0);
        assert_eq!(rows[0].total_expense, 20.0);
        assert_eq!(rows[1].month, "2025-02");
        assert_eq!(rows[1].total_income, 0.0);
        assert_eq!(rows[1].total_expense, 50.0);
    }

    #[test]
    fn test_monthly_cash_empty_journal() {
        let (_dir, path) = seeded_store(false);
        let mut exec = exec_for(&path);
        let rows = monthly_cash(&mut exec);
        assert!(rows.is_empty());
        assert!(exec.take_error().is_none());
    }

    #[test]
    fn test_top_expenses_keeps_ten_largest() {
        let (_dir, path) = seeded_store(false);
        let conn = Connection::open(&path).unwrap();
        for i in 1..=11 {
            conn.execute(
                "INSERT INTO caja2025 VALUES (?1, NULL, ?2, ?3)",
                rusqlite::params![
                    format!("2025-03-{:02}", i),
                    i as f64,
                    format!("concept {i}")
                ],
            )
            .unwrap();
        }
        let mut exec = exec_for(&path);
        let rows = top_expenses(&mut exec, "2025-01-01", "2025-12-31");
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0].total, 11.0);
        assert_eq!(rows[9].total, 2.0);
        assert!(rows.windows(2).all(|w| w[0].total > w[1].total));
        assert!(!rows.iter().any(|r| r.total == 1.0));
    }

    #[test]
    fn test_top_expenses_inverted_range_is_empty_not_error() {
        let (_dir, path) = seeded_store(false);
        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "INSERT INTO caja2025 VALUES ('2025-06-01', NULL, 10.0, 'x')",
            [],
        )
        .unwrap();
        let mut exec = exec_for(&path);
        let rows = top_expenses(&mut exec, "2025-12-31", "2025-01-01");
        assert!(rows.is_empty());
        assert!(exec.take_error().is_none());
    }

    #[test]
    fn test_partners_trimmed_and_blank_dropped() {
        let (_dir, path) = seeded_store(false);
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "INSERT INTO socios2024 VALUES ('  Yamile Vera  ', ' S01 ');
             INSERT INTO socios2024 VALUES ('', 'S02');
             INSERT INTO socios2024 VALUES (NULL, 'S03');
             INSERT INTO socios2024 VALUES ('Andres Rojas', 'S04');",
        )
        .unwrap();
        let mut exec = exec_for(&path);
        let schema = year_schema(2025).unwrap();
        let roster = partners(&mut exec, schema);
        assert_eq!(roster.len(), 2);
        assert!(roster.contains(&Partner {
            name: "Yamile Vera".into(),
            code: "S01".into()
        }));

        let options = partner_options(&roster);
        assert_eq!(options[0], ALL_PARTNERS);
        assert_eq!(options[1], "Andres Rojas");
        assert_eq!(options[2], "Yamile Vera");
    }

    #[test]
    fn test_receivables_excludes_partners_without_positive_rows() {
        let (_dir, path) = seeded_store(false);
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "INSERT INTO socios2024 VALUES ('Yamile Vera', 'S01');
             INSERT INTO socios2024 VALUES ('Andres Rojas', 'S02');
             INSERT INTO socios2024 VALUES ('Marta Quin', 'S03');
             INSERT INTO cxc2025 VALUES ('2025-01-05', 'S01', '1500.0');
             INSERT INTO cxc2025 VALUES ('2025-02-05', 'S01', '2000.0');
             INSERT INTO cxc2025 VALUES ('2025-03-01', 'S02', '0');
             INSERT INTO cxc2025 VALUES ('2025-03-02', 'S02', '-10');",
        )
        .unwrap();
        let mut exec = exec_for(&path);
        let schema = year_schema(2025).unwrap();
        let totals = receivables_by_partner(&mut exec, schema);
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].partner, "Yamile Vera");
        assert_eq!(totals[0].total, 3500.0);
    }

    #[test]
    fn test_receivables_2024_uses_socio_join_column() {
        let (_dir, path) = seeded_store(false);
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "INSERT INTO socios2024 VALUES ('Yamile Vera', 'S01');
             INSERT INTO cxc2024 VALUES ('2024-05-01', 'S01', '3500000');",
        )
        .unwrap();
        let mut exec = exec_for(&path);
        let schema = year_schema(2024).unwrap();
        let totals = receivables_by_partner(&mut exec, schema);
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].total, 3500000.0);
    }

    #[test]
    fn test_partner_history_ordered_and_parsed() {
        let (_dir, path) = seeded_store(false);
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "INSERT INTO socios2024 VALUES ('Yamile Vera', 'S01');
             INSERT INTO cxc2025 VALUES ('2025-03-10', 'S01', '200');
             INSERT INTO cxc2025 VALUES ('2025-01-02', 'S01', '100');
             INSERT INTO cxc2025 VALUES ('2025-02-01', 'S01', '-5');",
        )
        .unwrap();
        let mut exec = exec_for(&path);
        let schema = year_schema(2025).unwrap();
        let roster = partners(&mut exec, schema);
        match partner_history(&mut exec, schema, &roster, "Yamile Vera") {
            PartnerHistory::Payments(rows) => {
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[0].date, "2025-01-02");
                assert_eq!(rows[0].amount, 100.0);
                assert_eq!(
                    rows[0].parsed,
                    NaiveDate::from_ymd_opt(2025, 1, 2)
                );
                assert_eq!(rows[1].date, "2025-03-10");
            }
            PartnerHistory::CodeNotFound => panic!("expected payments"),
        }
    }

    #[test]
    fn test_partner_history_unknown_name_skips_store() {
        let (_dir, path) = seeded_store(false);
        let conn = Connection::open(&path).unwrap();
        conn.execute("INSERT INTO socios2024 VALUES ('Yamile Vera', 'S01')", [])
            .unwrap();
        let mut exec = exec_for(&path);
        let schema = year_schema(2025).unwrap();
        let roster = partners(&mut exec, schema);
        let trips_before = exec.store_round_trips();
        let history = partner_history(&mut exec, schema, &roster, "Nobody At All");
        assert!(matches!(history, PartnerHistory::CodeNotFound));
        assert_eq!(exec.store_round_trips(), trips_before);
    }

    #[test]
    fn test_2023_branch_absent_table_never_queried() {
        let (_dir, path) = seeded_store(false);
        let mut exec = exec_for(&path);
        let schema = year_schema(2023).unwrap();
        assert!(!receivables_available(&mut exec, schema));
        assert!(exec.take_error().is_none());
        assert_eq!(exec.store_round_trips(), 1);
    }

    #[test]
    fn test_2023_branch_present_table_is_available() {
        let (_dir, path) = seeded_store(true);
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "INSERT INTO socios2023 VALUES ('Marta Quin', 'S03');
             INSERT INTO cxc2023 VALUES ('2023-07-01', 'S03', '800');",
        )
        .unwrap();
        let mut exec = exec_for(&path);
        let schema = year_schema(2023).unwrap();
        assert!(receivables_available(&mut exec, schema));
        let totals = receivables_by_partner(&mut exec, schema);
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].partner, "Marta Quin");
        assert_eq!(totals[0].total, 800.0);
    }

    #[test]
    fn test_repeat_invocation_is_idempotent() {
        let (_dir, path) = seeded_store(false);
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "INSERT INTO caja2025 VALUES ('2025-01-10', 100.0, 20.0, 'a');
             INSERT INTO caja2025 VALUES ('2025-02-05', NULL, 50.0, 'b');",
        )
        .unwrap();
        let mut exec = exec_for(&path);
        let first: Vec<(String, f64, f64)> = monthly_cash(&mut exec)
            .into_iter()
            .map(|r| (r.month, r.total_income, r.total_expense))
            .collect();
        let second: Vec<(String, f64, f64)> = monthly_cash(&mut exec)
            .into_iter()
            .map(|r| (r.month, r.total_income, r.total_expense))
            .collect();
        assert_eq!(first, second);
        assert_eq!(exec.store_round_trips(), 1);
    }

    #[test]
    fn test_year_schema_lookup() {
        assert_eq!(year_schema(2024).unwrap().partner_code_column, "socio");
        assert_eq!(
            year_schema(2025).unwrap().partner_code_column,
            "codigo_cliente"
        );
        assert!(year_schema(2022).is_none());
    }
}

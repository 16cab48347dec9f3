use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::{AgroError, Result};
use crate::executor::QueryExecutor;
use crate::fmt::money;
use crate::reports::{self, PartnerHistory};
use crate::settings::get_store_path;

/// Prepend a degraded-query notice when the executor recorded one.
fn with_notice(error: Option<String>, body: String) -> String {
    match error {
        Some(e) => format!("{}\n{body}", e.yellow()),
        None => body,
    }
}

// ---------------------------------------------------------------------------
// Data-fetching + formatting wrappers (used by dispatch)
// ---------------------------------------------------------------------------

pub fn cash() -> Result<String> {
    let mut exec = QueryExecutor::new(&get_store_path());
    let rows = reports::monthly_cash(&mut exec);
    Ok(with_notice(exec.take_error(), format_cash(&rows)))
}

pub fn expenses(from_date: Option<String>, to_date: Option<String>) -> Result<String> {
    let from = from_date.unwrap_or_else(|| reports::FISCAL_YEAR_START.to_string());
    let to = to_date.unwrap_or_else(|| reports::FISCAL_YEAR_END.to_string());
    let mut exec = QueryExecutor::new(&get_store_path());
    let rows = reports::top_expenses(&mut exec, &from, &to);
    Ok(with_notice(exec.take_error(), format_expenses(&from, &to, &rows)))
}

pub fn receivables(year: i32, partner: Option<String>) -> Result<String> {
    let schema = reports::year_schema(year)
        .ok_or_else(|| AgroError::Other(format!("Unknown fiscal year: {year}")))?;
    let mut exec = QueryExecutor::new(&get_store_path());

    if !reports::receivables_available(&mut exec, schema) {
        return Ok(format!(
            "Receivables are not available for {year}: table `{}` is missing from the store.",
            schema.receivables_table
        ));
    }

    match partner {
        None => {
            let totals = reports::receivables_by_partner(&mut exec, schema);
            Ok(with_notice(exec.take_error(), format_receivables(year, &totals)))
        }
        Some(name) => {
            let roster = reports::partners(&mut exec, schema);
            match reports::partner_history(&mut exec, schema, &roster, &name) {
                PartnerHistory::CodeNotFound => Ok(format!(
                    "{}",
                    format!(
                        "Warning: no code found for partner '{name}' in `{}`.",
                        schema.partner_table
                    )
                    .yellow()
                )),
                PartnerHistory::Payments(rows) => Ok(with_notice(
                    exec.take_error(),
                    format_history(year, &name, &rows),
                )),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Pure formatting functions (report data → String)
// ---------------------------------------------------------------------------

pub fn format_cash(rows: &[reports::MonthlyCashRow]) -> String {
    if rows.is_empty() {
        return format!(
            "Monthly Cash Flow\nNo cash movements recorded in `{}`.",
            reports::CASH_TABLE
        );
    }
    let mut table = Table::new();
    table.set_header(vec!["Month", "Income", "Expense"]);
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.month),
            Cell::new(money(row.total_income)),
            Cell::new(money(row.total_expense)),
        ]);
    }
    let total_income: f64 = rows.iter().map(|r| r.total_income).sum();
    let total_expense: f64 = rows.iter().map(|r| r.total_expense).sum();
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(money(total_income)),
        Cell::new(money(total_expense)),
    ]);
    format!("Monthly Cash Flow\n{table}")
}

pub fn format_expenses(from: &str, to: &str, rows: &[reports::ExpenseRow]) -> String {
    let title = format!("Top 10 Expenses \u{2014} {from} to {to}");
    if rows.is_empty() {
        return format!("{title}\nNo expenses found in the selected range.");
    }
    let mut table = Table::new();
    table.set_header(vec!["Concept", "Total"]);
    for row in rows {
        table.add_row(vec![Cell::new(&row.concept), Cell::new(money(row.total))]);
    }
    format!("{title}\n{table}")
}

pub fn format_receivables(year: i32, rows: &[reports::PartnerTotal]) -> String {
    let title = format!("Receivables by Partner \u{2014} {year}");
    if rows.is_empty() {
        return format!("{title}\nNo collections recorded for {year}.");
    }
    let mut table = Table::new();
    table.set_header(vec!["Partner", "Total collected"]);
    for row in rows {
        table.add_row(vec![Cell::new(&row.partner), Cell::new(money(row.total))]);
    }
    format!("{title}\n{table}")
}

pub fn format_history(year: i32, name: &str, rows: &[reports::Payment]) -> String {
    let title = format!("Collections from {name} \u{2014} {year}");
    if rows.is_empty() {
        return format!("{title}\nNo collections recorded for {name} in {year}.");
    }
    let mut table = Table::new();
    table.set_header(vec!["Date", "Amount"]);
    for row in rows {
        table.add_row(vec![Cell::new(&row.date), Cell::new(money(row.amount))]);
    }
    let total: f64 = rows.iter().map(|r| r.amount).sum();
    table.add_row(vec![Cell::new("Total".bold()), Cell::new(money(total))]);
    format!("{title}\n{table}")
}

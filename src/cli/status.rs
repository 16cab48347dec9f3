use crate::error::Result;
use crate::executor::QueryExecutor;
use crate::reports::{self, CASH_TABLE, FISCAL_YEARS};
use crate::settings::get_store_path;

pub fn run() -> Result<()> {
    let store_path = get_store_path();
    println!("Store:      {}", store_path.display());

    if !store_path.exists() {
        println!();
        println!("Store file not found. Place the accounting export at the path above.");
        return Ok(());
    }

    let size = std::fs::metadata(&store_path)?.len();
    println!("Size:       {} bytes", size);
    println!();

    let mut exec = QueryExecutor::new(&store_path);
    let mut tables = vec![CASH_TABLE.to_string()];
    for schema in FISCAL_YEARS {
        if !tables.contains(&schema.partner_table.to_string()) {
            tables.push(schema.partner_table.to_string());
        }
        tables.push(schema.receivables_table.to_string());
    }

    for table in &tables {
        if reports::table_exists(&mut exec, table) {
            let count = reports::table_row_count(&mut exec, table);
            println!("{:<12}{} rows", table, count as i64);
        } else {
            println!("{:<12}missing", table);
        }
    }

    if let Some(e) = exec.take_error() {
        println!();
        println!("{e}");
    }

    Ok(())
}

use comfy_table::{Cell, Table};

use crate::cli::open_db;
use crate::error::Result;
use crate::registry::list_members;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let conn = open_db(&load_settings())?;
    let members = list_members(&conn)?;

    let mut table = Table::new();
    table.set_header(vec![
        "ID",
        "Employee Number",
        "Name",
        "Email",
        "Plan",
        "Department",
        "Coverage",
    ]);
    for m in &members {
        table.add_row(vec![
            Cell::new(&m.id),
            Cell::new(&m.employee_number),
            Cell::new(&m.name),
            Cell::new(&m.email),
            Cell::new(&m.plan_id),
            Cell::new(&m.department),
            Cell::new(format!("{} → {}", m.coverage_start, m.coverage_end)),
        ]);
    }
    println!("Members ({})\n{table}", members.len());
    Ok(())
}

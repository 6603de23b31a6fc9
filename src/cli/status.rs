use crate::db::{get_connection, get_preference};
use crate::error::Result;
use crate::preferences::COLUMN_MAP_KEY;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    println!("Data dir:     {}", settings.data_dir);
    println!("Database:     {}", db_path.display());
    println!("Corporate ID: {}", settings.corporate_id);
    println!(
        "Plan year:    {}{}",
        settings.effective_plan_year(),
        if settings.plan_year.is_none() { " (current year)" } else { "" }
    );
    println!("Upload limit: {} bytes", settings.max_upload_bytes);

    if db_path.exists() {
        let conn = get_connection(&db_path)?;
        let members: i64 = conn.query_row("SELECT count(*) FROM members", [], |r| r.get(0))?;
        let imports: i64 = conn.query_row("SELECT count(*) FROM imports", [], |r| r.get(0))?;
        let mapping = get_preference(&conn, COLUMN_MAP_KEY)?;

        println!();
        println!("Members:        {members}");
        println!("Imports:        {imports}");
        println!(
            "Saved mapping:  {}",
            if mapping.is_some() { "yes" } else { "no" }
        );
    } else {
        println!();
        println!("Database not found. Run `enroll init` to set up.");
    }
    Ok(())
}

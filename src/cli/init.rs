use std::path::PathBuf;

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(data_dir: Option<String>, corporate_id: Option<String>, plan_year: Option<i32>) -> Result<()> {
    let mut settings = load_settings();

    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    if let Some(id) = corporate_id {
        settings.corporate_id = id;
    }
    if plan_year.is_some() {
        settings.plan_year = plan_year;
    }

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&resolved)?;
    std::fs::create_dir_all(resolved.join("rejected"))?;
    save_settings(&settings)?;

    let conn = get_connection(&settings.db_path())?;
    init_db(&conn)?;

    println!("Initialized enroll at {}", resolved.display());
    println!("Corporate ID: {}", settings.corporate_id);
    println!("Plan year:    {}", settings.effective_plan_year());
    Ok(())
}

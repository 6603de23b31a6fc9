use std::path::Path;

use crate::error::Result;
use crate::fields::CanonicalField;

/// Writes a header-only CSV that auto-maps every field.
pub fn write_template(out: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(out)?;
    wtr.write_record(CanonicalField::ALL.iter().map(|f| f.display_name()))?;
    wtr.flush()?;
    Ok(())
}

pub fn run(output: &str) -> Result<()> {
    let out = Path::new(output);
    write_template(out)?;
    println!("Template written to {}", out.display());
    let required: Vec<&str> = CanonicalField::REQUIRED.iter().map(|f| f.display_name()).collect();
    println!("Required columns: {}", required.join(", "));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode_file;
    use crate::mapper::map_headers;

    #[test]
    fn test_template_headers_auto_map_completely() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("template.csv");
        write_template(&out).unwrap();

        let content = std::fs::read_to_string(&out).unwrap();
        assert!(content.starts_with("Employee Number,Full Name,Email"));

        let headers: Vec<String> = content.trim().split(',').map(str::to_string).collect();
        let result = map_headers(&headers);
        assert!(result.unmapped_required.is_empty());
        assert!(result.unmapped_optional.is_empty());
        for (i, field) in CanonicalField::ALL.iter().enumerate() {
            assert_eq!(result.column_map.get(*field), Some(i));
        }
    }

    #[test]
    fn test_template_alone_has_no_rows() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("template.csv");
        write_template(&out).unwrap();
        let rows = decode_file(&out, 1024).unwrap();
        assert_eq!(rows.len(), 1);
    }
}

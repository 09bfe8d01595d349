#[cfg(test)]
mod tests {
    use crate::error::ReportError;
    use crate::parsing::csv_parser::read_raw_table;
    use std::io::Write;
    use std::path::Path;
    use tempfile::NamedTempFile;

    /// Helper to create a temp CSV file
    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", content).unwrap();
        temp_file
    }

    #[test]
    fn test_read_basic_export() {
        let temp_file = create_temp_csv(
            "datetime,sys,dia,bpm\n2025-06-01 08:00,120,80,60\n2025-06-01 08:30,122,81,62\n",
        );
        let table = read_raw_table(temp_file.path()).unwrap();

        assert_eq!(table.headers, vec!["datetime", "sys", "dia", "bpm"]);
        assert_eq!(table.height(), 2);
        assert_eq!(table.rows[0][0].as_deref(), Some("2025-06-01 08:00"));
        assert_eq!(table.rows[1][3].as_deref(), Some("62"));
    }

    #[test]
    fn test_values_stay_textual() {
        // Mixed column content must not be inferred away
        let temp_file =
            create_temp_csv("datetime,sys,dia,bpm\n2025-06-01 08:00,120,80,60\nbad,x,81.5,\n");
        let table = read_raw_table(temp_file.path()).unwrap();

        assert_eq!(table.height(), 2);
        assert_eq!(table.rows[1][0].as_deref(), Some("bad"));
        assert_eq!(table.rows[1][1].as_deref(), Some("x"));
        assert_eq!(table.rows[1][2].as_deref(), Some("81.5"));
        assert_eq!(table.rows[1][3], None);
    }

    #[test]
    fn test_extra_columns_ignored() {
        let temp_file = create_temp_csv(
            "datetime,sys,dia,bpm,mov,ihb\n2025-06-01 08:00,120,80,60,0,1\n",
        );
        let table = read_raw_table(temp_file.path()).unwrap();

        assert_eq!(table.headers.len(), 4);
        assert_eq!(table.rows[0][3].as_deref(), Some("60"));
    }

    #[test]
    fn test_too_few_columns_rejected() {
        let temp_file = create_temp_csv("datetime,sys,dia\n2025-06-01 08:00,120,80\n");
        let result = read_raw_table(temp_file.path());

        match result {
            Err(ReportError::Input { message, .. }) => {
                assert!(message.contains("less than 4 columns"), "{}", message)
            }
            other => panic!("Expected input error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_rejected() {
        let result = read_raw_table(Path::new("/nonexistent/export.csv"));
        assert!(matches!(result, Err(ReportError::Input { .. })));
    }

    #[test]
    fn test_header_only_file_has_no_rows() {
        let temp_file = create_temp_csv("datetime,sys,dia,bpm\n");
        let table = read_raw_table(temp_file.path()).unwrap();
        assert_eq!(table.height(), 0);
    }
}

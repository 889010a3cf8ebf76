//! Minimal delimited-text reading and writing.
//!
//! Fields may be quoted with `"`; a doubled quote inside a quoted field is a
//! literal quote. A quote only opens quoting at the start of a field; inside
//! an unquoted field it is kept as text. Quoted fields may span lines. Blank
//! lines are skipped.

/// Split `text` into records of fields.
pub fn parse_records(text: &str, delimiter: char) -> Vec<Vec<String>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(ch);
            }
            continue;
        }

        match ch {
            '"' if field.is_empty() => in_quotes = true,
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                push_record(&mut records, std::mem::take(&mut record));
            }
            c if c == delimiter => record.push(std::mem::take(&mut field)),
            c => field.push(c),
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        push_record(&mut records, record);
    }
    records
}

fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
    let blank = record.iter().all(|f| f.trim().is_empty());
    if !blank {
        records.push(record);
    }
}

/// Quote a field if it contains the delimiter, a quote or a line break.
pub fn quote_field(value: &str, delimiter: char) -> String {
    if value.contains(delimiter) || value.contains('"') || value.contains('\n') || value.contains('\r')
    {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Join fields into one line (without the trailing newline).
pub fn write_record<S: AsRef<str>>(fields: &[S], delimiter: char) -> String {
    fields
        .iter()
        .map(|f| quote_field(f.as_ref(), delimiter))
        .collect::<Vec<_>>()
        .join(&delimiter.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_and_quoted_fields() {
        let records = parse_records("a,b,c\n\"x,y\",\"say \"\"hi\"\"\",z\n", ',');
        assert_eq!(
            records,
            vec![
                vec!["a", "b", "c"],
                vec!["x,y", "say \"hi\"", "z"],
            ]
        );
    }

    #[test]
    fn test_semicolon_crlf_and_blank_lines() {
        let records = parse_records("Nama_Murid;Kelas\r\n\r\nAhmad;7A\r\n", ';');
        assert_eq!(records, vec![vec!["Nama_Murid", "Kelas"], vec!["Ahmad", "7A"]]);
    }

    #[test]
    fn test_quoted_newline_stays_in_field() {
        let records = parse_records("id,note\n1,\"line one\nline two\"\n", ',');
        assert_eq!(records[1], vec!["1", "line one\nline two"]);
    }

    #[test]
    fn test_json_cell_survives_write_then_parse() {
        let cell = r#"{"Al-Kausar":[1,0,2],"An-Nasr":[0,0,0]}"#;
        let line = write_record(&["1001", cell, "7A"][..], ',');
        assert_eq!(parse_records(&line, ','), vec![vec!["1001", cell, "7A"]]);
    }

    #[test]
    fn test_quote_inside_unquoted_field_is_literal() {
        let records = parse_records("Ahmad \"Abu\" Bakar;7A;123\n", ';');
        assert_eq!(records, vec![vec!["Ahmad \"Abu\" Bakar", "7A", "123"]]);
    }

    #[test]
    fn test_trailing_empty_field_kept() {
        assert_eq!(parse_records("a,b,\n", ','), vec![vec!["a", "b", ""]]);
    }
}

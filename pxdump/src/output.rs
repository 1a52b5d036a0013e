//! Row and schema formatting, and parsing of key literals

use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;
use paradox_engine::{FieldType, TableHeader, Value};
use serde_json::{Map, Value as Json};

/// Parse a command-line key bound as a value of the key column's type
pub fn parse_literal(field_type: FieldType, text: &str) -> Result<Value> {
    let bad = |e: &dyn std::fmt::Display| anyhow!("invalid {} key {:?}: {}", field_type.name(), text, e);
    let value = match field_type {
        FieldType::Short => Value::Short(text.parse().map_err(|e| bad(&e))?),
        FieldType::Long | FieldType::AutoInc => Value::Long(text.parse().map_err(|e| bad(&e))?),
        FieldType::Number | FieldType::Currency => Value::Number(text.parse().map_err(|e| bad(&e))?),
        FieldType::Date => {
            Value::Date(NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|e| bad(&e))?)
        }
        FieldType::Logical => Value::Logical(text.parse().map_err(|e| bad(&e))?),
        FieldType::Alpha => Value::Text(text.to_string()),
        other => bail!("cannot use a {} column as a key", other.name()),
    };
    Ok(value)
}

/// Tab-separated row
pub fn format_text(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("\t")
}

/// One JSON object, keyed by column name
pub fn format_json<S: AsRef<str>>(names: &[S], values: &[Value]) -> serde_json::Result<String> {
    let mut row = Map::new();
    for (i, value) in values.iter().enumerate() {
        let name = names
            .get(i)
            .map(|n| n.as_ref())
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("field{}", i));
        let json = match value {
            Value::Blob(b) | Value::Bytes(b) => Json::from(b.len()),
            other => serde_json::to_value(other)?,
        };
        row.insert(name, json);
    }
    serde_json::to_string(&Json::Object(row))
}

/// Human-readable schema summary
pub fn describe_header(header: &TableHeader) -> String {
    let mut out = String::new();
    out.push_str(&format!("table:       {}\n", header.table_name));
    out.push_str(&format!("file type:   {:?}\n", header.file_type));
    out.push_str(&format!(
        "version:     {} ({})\n",
        header.version,
        header.version_name()
    ));
    out.push_str(&format!("records:     {}\n", header.record_count));
    out.push_str(&format!("record size: {}\n", header.record_size));
    out.push_str(&format!(
        "blocks:      {} x {} KiB\n",
        header.file_blocks, header.max_table_size
    ));
    out.push_str(&format!("key fields:  {}\n", header.primary_key_fields));
    if let Some(ext) = &header.extended {
        out.push_str(&format!("code page:   {}\n", ext.dos_code_page));
    }
    if header.is_encrypted() {
        out.push_str("encrypted:   yes\n");
    }
    for (i, field) in header.fields.iter().enumerate() {
        out.push_str(&format!(
            "  {:>3} {:<24} {:<10} {}\n",
            i,
            header.field_name(i).unwrap_or(""),
            field.field_type.name(),
            field.size
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_parse_literal_by_type() {
        assert_eq!(parse_literal(FieldType::Long, "1750").unwrap(), Value::Long(1750));
        assert_eq!(parse_literal(FieldType::Short, "-4").unwrap(), Value::Short(-4));
        assert_eq!(parse_literal(FieldType::Currency, "2.5").unwrap(), Value::Number(2.5));
        assert_eq!(
            parse_literal(FieldType::Date, "1999-12-31").unwrap(),
            Value::Date(NaiveDate::from_ymd_opt(1999, 12, 31).unwrap())
        );
        assert_eq!(parse_literal(FieldType::Alpha, "Smith").unwrap(), Value::Text("Smith".into()));
    }

    #[test]
    fn test_parse_literal_errors() {
        assert!(parse_literal(FieldType::Long, "abc").is_err());
        assert!(parse_literal(FieldType::Short, "70000").is_err());
        assert!(parse_literal(FieldType::Date, "31/12/1999").is_err());
        assert!(parse_literal(FieldType::Graphic, "x").is_err());
    }

    #[test]
    fn test_format_text() {
        let row = [
            Value::Long(7),
            Value::Null,
            Value::Text("bolt".into()),
            Value::Time(Duration::milliseconds(3_600_000)),
        ];
        assert_eq!(format_text(&row), "7\t\tbolt\t01:00:00.000");
    }

    #[test]
    fn test_format_json() {
        let row = [Value::Long(7), Value::Null, Value::Blob(vec![1, 2, 3]), Value::Logical(true)];
        let json = format_json(&["Id", "Name", "Photo"], &row).unwrap();
        let parsed: Json = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["Id"], 7);
        assert!(parsed["Name"].is_null());
        assert_eq!(parsed["Photo"], 3);
        assert_eq!(parsed["field3"], true);
    }
}

// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

use prettytable::{cell, format::consts::FORMAT_NO_LINESEP, row, Table};
use serde_json::Value;

pub trait ToTable {
    fn to_table(&self) -> Table;
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) if items.is_empty() => String::from("-"),
        Value::Object(_) | Value::Array(_) => value.to_table().to_string(),
        other => other.to_string(),
    }
}

impl ToTable for Value {
    fn to_table(&self) -> Table {
        let mut table = Table::new();

        match self {
            Value::Object(fields) => {
                for (key, val) in fields {
                    table.add_row(row![key, cell_text(val)]);
                }
            }

            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    table.add_row(row![i + 1, cell_text(item)]);
                }
            }

            other => {
                table.add_row(row![cell_text(other)]);
            }
        }

        table.set_format(*FORMAT_NO_LINESEP);
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_field_response() {
        let rendered = json!({"success": true}).to_table().to_string();
        assert!(rendered.contains("success"));
        assert!(rendered.contains("true"));
    }

    #[test]
    fn object_rows() {
        let table = json!({"success": true, "favorite": false}).to_table();
        assert_eq!(table.len(), 2);

        let rendered = table.to_string();
        assert!(rendered.contains("success"));
        assert!(rendered.contains("false"));
    }

    #[test]
    fn nested_values() {
        let value = json!({
            "success": true,
            "movies": [{"title": "Matrix"}, {"title": "El Padrino"}],
        });

        let rendered = value.to_table().to_string();
        assert!(rendered.contains("Matrix"));
        assert!(rendered.contains("El Padrino"));
    }
}

//! Polars interchange for [`SpecTable`].

use std::io::Cursor;

use polars::prelude::{AnyValue, Column, DataFrame, IpcReader, SerReader};

use crate::error::Result;
use crate::spec::{EnumCellValue, SpecTable};

impl SpecTable {
    /// Build a table from a DataFrame; nulls become `Missing`, numbers
    /// `Numeric`, every other value is coerced to text.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let columns: Vec<String> = df
            .get_column_names_str()
            .into_iter()
            .map(ToString::to_string)
            .collect();

        let mut l_rows = vec![Vec::with_capacity(df.width()); df.height()];
        for col in df.get_columns() {
            for (row_idx, row) in l_rows.iter_mut().enumerate() {
                row.push(derive_cell_value_from_any_value(col.get(row_idx)?));
            }
        }

        Self::new(columns, l_rows)
    }

    /// Build a table from Polars IPC-serialized DataFrame bytes.
    pub fn from_ipc_bytes(v_ipc_df: &[u8]) -> Result<Self> {
        let df = IpcReader::new(Cursor::new(v_ipc_df)).finish()?;
        Self::from_dataframe(&df)
    }

    /// Convert to a DataFrame of nullable string columns.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let l_cols: Vec<Column> = self
            .columns()
            .iter()
            .enumerate()
            .map(|(col_idx, c_name)| {
                let l_values: Vec<Option<&str>> = self
                    .rows()
                    .iter()
                    .map(|row| match &row[col_idx] {
                        EnumCellValue::Missing => None,
                        EnumCellValue::Text(val) | EnumCellValue::Numeric(val) => {
                            Some(val.as_str())
                        }
                    })
                    .collect();
                Column::new(c_name.as_str().into(), l_values)
            })
            .collect();
        Ok(DataFrame::new(l_cols)?)
    }
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::Missing,
        AnyValue::String(val) => EnumCellValue::Text(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::Text(val.to_string()),
        AnyValue::Boolean(val) => {
            EnumCellValue::Text(if val { "True" } else { "False" }.to_string())
        }
        AnyValue::Float32(val) => EnumCellValue::from(val as f64),
        AnyValue::Float64(val) => EnumCellValue::from(val),
        _ if value.is_integer() => EnumCellValue::Numeric(value.to_string()),
        _ => EnumCellValue::Text(value.to_string()),
    }
}

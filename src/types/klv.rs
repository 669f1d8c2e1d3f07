#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Row-major numeric payload of a KLV record
///
/// Every numeric GPMF type is widened to `f64`. 32-bit integers, which carry
/// all GPS fields, convert exactly.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NumericArray {
    pub columns: usize,
    pub values: Vec<f64>,
}

impl NumericArray {
    pub fn new(columns: usize, values: Vec<f64>) -> Self {
        Self { columns, values }
    }

    pub fn rows(&self) -> usize {
        if self.columns == 0 {
            0
        } else {
            self.values.len() / self.columns
        }
    }

    /// True when the values fill a whole number of rows
    pub fn is_rectangular(&self) -> bool {
        self.columns > 0 && self.values.len() % self.columns == 0
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        let start = index.checked_mul(self.columns)?;
        self.values.get(start..start + self.columns)
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks_exact(self.columns.max(1))
    }

    pub fn first(&self) -> Option<f64> {
        self.values.first().copied()
    }
}

/// Value carried by a KLV record
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum KlvValue {
    /// Type 0: ordered child records
    Nested(Vec<KlvItem>),
    /// `b B d f j J l L q Q s S ?`
    Numeric(NumericArray),
    /// `c U F`: one string per repeat
    Text(Vec<String>),
    /// `G` and anything kept verbatim
    Bytes(Vec<u8>),
}

/// One key-length-value record from a GPMF stream
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KlvItem {
    pub key: String,
    /// GPMF type character, `0` for nested records
    pub type_code: u8,
    pub struct_size: u8,
    pub repeat: u16,
    pub value: KlvValue,
}

impl KlvItem {
    pub fn nested(key: &str, children: Vec<KlvItem>) -> Self {
        Self {
            key: key.to_string(),
            type_code: 0,
            struct_size: 1,
            repeat: 0,
            value: KlvValue::Nested(children),
        }
    }

    /// In-memory numeric record with `columns` values per row
    pub fn numeric(key: &str, type_code: u8, columns: usize, values: Vec<f64>) -> Self {
        let element_size = crate::parser::klv::element_size(type_code).unwrap_or(4);
        let repeat = if columns == 0 { 0 } else { values.len() / columns };
        Self {
            key: key.to_string(),
            type_code,
            struct_size: (element_size * columns).min(u8::MAX as usize) as u8,
            repeat: repeat.min(u16::MAX as usize) as u16,
            value: KlvValue::Numeric(NumericArray::new(columns, values)),
        }
    }

    pub fn text(key: &str, strings: Vec<String>) -> Self {
        let struct_size = strings.iter().map(|s| s.len()).max().unwrap_or(0);
        Self {
            key: key.to_string(),
            type_code: b'c',
            struct_size: struct_size.min(u8::MAX as usize) as u8,
            repeat: strings.len().min(u16::MAX as usize) as u16,
            value: KlvValue::Text(strings),
        }
    }

    pub fn children(&self) -> Option<&[KlvItem]> {
        match &self.value {
            KlvValue::Nested(children) => Some(children),
            _ => None,
        }
    }

    pub fn as_numeric(&self) -> Option<&NumericArray> {
        match &self.value {
            KlvValue::Numeric(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&[String]> {
        match &self.value {
            KlvValue::Text(strings) => Some(strings),
            _ => None,
        }
    }

    /// Text records joined into a single string
    pub fn text_value(&self) -> Option<String> {
        self.as_text().map(|strings| strings.concat())
    }
}

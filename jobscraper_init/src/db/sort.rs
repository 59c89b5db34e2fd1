use bson::Bson;

/// The sort order for a BSON field within an index key pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sort {
    /// Ascending sort order: `1`
    Asc,
    /// Descending sort order: `-1`
    Desc,
}

impl Sort {
    /// Reads the sort order back from a key pattern value.
    ///
    /// The server keeps whatever numeric type the index was created with, so
    /// indexes created by a shell script usually carry doubles rather than
    /// `Int32` values. Returns [`None`] for non-numeric values, such as
    /// `"text"` or `"2dsphere"` index types.
    pub fn from_bson(value: &Bson) -> Option<Self> {
        let value = match *value {
            Bson::Int32(v) => f64::from(v),
            // only the sign matters
            Bson::Int64(v) => v as f64,
            Bson::Double(v) => v,
            _ => return None,
        };

        if value > 0.0 {
            Some(Self::Asc)
        } else if value < 0.0 {
            Some(Self::Desc)
        } else {
            None
        }
    }

    /// The suffix the server uses for this order in default index names.
    pub const fn name_suffix(self) -> &'static str {
        match self {
            Self::Asc => "1",
            Self::Desc => "-1",
        }
    }
}

impl From<Sort> for Bson {
    fn from(sort: Sort) -> Self {
        match sort {
            Sort::Asc => Self::Int32(1),
            Sort::Desc => Self::Int32(-1),
        }
    }
}

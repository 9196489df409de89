/// Result-set column metadata.
///
/// Optional attributes are `None` when the driver cannot report them. The
/// Postgres driver fills in only the name and type: its row descriptions
/// carry neither nullability nor type modifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnType {
    name: String,
    database_type: String,
    nullable: Option<bool>,
    length: Option<u64>,
    decimal_size: Option<(u64, u64)>,
}

impl ColumnType {
    pub fn new(name: impl Into<String>, database_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            database_type: database_type.into(),
            nullable: None,
            length: None,
            decimal_size: None,
        }
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    pub fn with_length(mut self, length: u64) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_decimal_size(mut self, precision: u64, scale: u64) -> Self {
        self.decimal_size = Some((precision, scale));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Database system type name without length, e.g. `INT4` or `TEXT`.
    /// Empty when the driver does not report one.
    pub fn database_type_name(&self) -> &str {
        &self.database_type
    }

    /// `None` when the driver cannot tell.
    pub fn nullable(&self) -> Option<bool> {
        self.nullable
    }

    /// Length of variable-length text and binary columns.
    pub fn length(&self) -> Option<u64> {
        self.length
    }

    /// Precision and scale of decimal columns.
    pub fn decimal_size(&self) -> Option<(u64, u64)> {
        self.decimal_size
    }
}

use crate::adapter::value::Value;
use crate::adapter::AdapterError;
use std::fmt;

/// Constant names of a caller-defined enumeration, matched case-insensitively.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnumDomain {
    pub name: &'static str,
    pub variants: &'static [&'static str],
}

impl EnumDomain {
    pub const fn new(name: &'static str, variants: &'static [&'static str]) -> Self {
        EnumDomain { name, variants }
    }

    /// Returns the declared constant matching `text` ignoring case.
    pub fn find(&self, text: &str) -> Option<&'static str> {
        self.variants
            .iter()
            .copied()
            .find(|variant| variant.eq_ignore_ascii_case(text))
    }
}

/// Scalar target types with a built-in conversion rule.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKey {
    /// Text, trimmed
    Text,
    /// First character of the text
    Char,
    Bool,
    I8,
    I16,
    I32,
    I64,
    /// Arbitrary-size integer
    BigInt,
    F32,
    F64,
    Decimal,
    /// `YYYY-MM-DD`
    Date,
    /// `HH:MM[:SS[.f]]`
    Time,
    /// `YYYY-MM-DDTHH:MM[:SS[.f]]`
    DateTime,
    /// `YYYY-MM-DD HH:MM:SS[.f]`
    Timestamp,
    /// RFC 3339 instant, normalized to UTC
    Instant,
    /// `--MM-DD`
    MonthDay,
    /// `YYYY-MM`
    YearMonth,
    /// Regular expression
    Pattern,
    /// Name of another type key
    TypeRef,
    Enum(EnumDomain),
}

impl TypeKey {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TypeKey::Text => "text",
            TypeKey::Char => "char",
            TypeKey::Bool => "boolean",
            TypeKey::I8 => "i8",
            TypeKey::I16 => "i16",
            TypeKey::I32 => "i32",
            TypeKey::I64 => "i64",
            TypeKey::BigInt => "biginteger",
            TypeKey::F32 => "f32",
            TypeKey::F64 => "f64",
            TypeKey::Decimal => "decimal",
            TypeKey::Date => "date",
            TypeKey::Time => "time",
            TypeKey::DateTime => "datetime",
            TypeKey::Timestamp => "timestamp",
            TypeKey::Instant => "instant",
            TypeKey::MonthDay => "monthday",
            TypeKey::YearMonth => "yearmonth",
            TypeKey::Pattern => "pattern",
            TypeKey::TypeRef => "type",
            TypeKey::Enum(domain) => domain.name,
        }
    }

    /// Parses a type name, ignoring case. Supports common aliases for each type.
    /// Enumerations have no name of their own and are never returned.
    pub fn parse(name: &str) -> Result<Self, AdapterError> {
        match name.to_ascii_uppercase().as_str() {
            "TEXT" | "STRING" | "VARCHAR" => Ok(Self::Text),
            "CHAR" | "CHARACTER" => Ok(Self::Char),
            "BOOL" | "BOOLEAN" => Ok(Self::Bool),
            "I8" | "BYTE" | "TINYINT" => Ok(Self::I8),
            "I16" | "SHORT" | "SMALLINT" => Ok(Self::I16),
            "I32" | "INT" | "INTEGER" => Ok(Self::I32),
            "I64" | "LONG" | "BIGINT" => Ok(Self::I64),
            "I128" | "BIGINTEGER" => Ok(Self::BigInt),
            "F32" | "FLOAT" | "REAL" => Ok(Self::F32),
            "F64" | "DOUBLE" => Ok(Self::F64),
            "DECIMAL" | "BIGDECIMAL" | "NUMERIC" => Ok(Self::Decimal),
            "DATE" | "LOCALDATE" => Ok(Self::Date),
            "TIME" | "LOCALTIME" => Ok(Self::Time),
            "DATETIME" | "LOCALDATETIME" => Ok(Self::DateTime),
            "TIMESTAMP" => Ok(Self::Timestamp),
            "INSTANT" => Ok(Self::Instant),
            "MONTHDAY" => Ok(Self::MonthDay),
            "YEARMONTH" => Ok(Self::YearMonth),
            "PATTERN" | "REGEX" => Ok(Self::Pattern),
            "TYPE" | "CLASS" => Ok(Self::TypeRef),
            _ => Err(AdapterError::Parse {
                target: "type".to_owned(),
                value: name.to_owned(),
                message: "unknown type name".to_owned(),
            }),
        }
    }

    /// Zero value used for absent or failed elements of primitive arrays.
    /// `None` for types that cannot be primitive array elements.
    pub fn zero(&self) -> Option<Value> {
        match self {
            TypeKey::Bool => Some(Value::Bool(false)),
            TypeKey::Char => Some(Value::Char('\0')),
            TypeKey::I8 => Some(Value::I8(0)),
            TypeKey::I16 => Some(Value::I16(0)),
            TypeKey::I32 => Some(Value::I32(0)),
            TypeKey::I64 => Some(Value::I64(0)),
            TypeKey::BigInt => Some(Value::BigInt(num_bigint::BigInt::default())),
            TypeKey::F32 => Some(Value::F32(0f32)),
            TypeKey::F64 => Some(Value::F64(0f64)),
            _ => None,
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Containers a collection field can be built into.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    List,
    LinkedList,
    Deque,
    Stack,
    /// Set keeping first-insertion order
    OrderedSet,
    HashSet,
    SortedSet,
}

impl ContainerKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ContainerKind::List => "list",
            ContainerKind::LinkedList => "linked list",
            ContainerKind::Deque => "deque",
            ContainerKind::Stack => "stack",
            ContainerKind::OrderedSet => "ordered set",
            ContainerKind::HashSet => "hash set",
            ContainerKind::SortedSet => "sorted set",
        }
    }

    /// Parses a container name, ignoring case.
    pub fn parse(name: &str) -> Result<Self, AdapterError> {
        match name.to_ascii_uppercase().as_str() {
            "LIST" | "COLLECTION" | "ARRAYLIST" | "VEC" | "VECTOR" => Ok(Self::List),
            "LINKEDLIST" => Ok(Self::LinkedList),
            "DEQUE" | "QUEUE" | "ARRAYDEQUE" | "VECDEQUE" => Ok(Self::Deque),
            "STACK" => Ok(Self::Stack),
            "SET" | "ORDEREDSET" | "LINKEDHASHSET" => Ok(Self::OrderedSet),
            "HASHSET" => Ok(Self::HashSet),
            "SORTEDSET" | "TREESET" | "BTREESET" => Ok(Self::SortedSet),
            _ => Err(AdapterError::Unsupported(format!("container '{}'", name))),
        }
    }

    pub const fn is_set(&self) -> bool {
        matches!(self, Self::OrderedSet | Self::HashSet | Self::SortedSet)
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared element type of a collection.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// No element type was declared; elements are read as text.
    Unspecified,
    /// An explicit "any" element type; elements are read as text.
    Wildcard,
    Of(Box<TargetType>),
}

/// The full type of a record field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TargetType {
    Scalar(TypeKey),
    /// Fixed-size array. Primitive arrays hold the zero value where boxed arrays hold `Absent`.
    Array { element: Box<TargetType>, primitive: bool },
    Collection { container: ContainerKind, element: ElementType },
}

impl TargetType {
    pub fn scalar(key: TypeKey) -> Self {
        TargetType::Scalar(key)
    }

    /// Array whose failed or empty elements are `Absent`.
    pub fn array(key: TypeKey) -> Self {
        TargetType::Array { element: Box::new(TargetType::Scalar(key)), primitive: false }
    }

    /// Array whose failed or empty elements are the type's zero value.
    pub fn primitive_array(key: TypeKey) -> Self {
        TargetType::Array { element: Box::new(TargetType::Scalar(key)), primitive: true }
    }

    pub fn collection(container: ContainerKind, key: TypeKey) -> Self {
        TargetType::Collection {
            container,
            element: ElementType::Of(Box::new(TargetType::Scalar(key))),
        }
    }

    /// Collection without a declared element type.
    pub fn untyped_collection(container: ContainerKind) -> Self {
        TargetType::Collection { container, element: ElementType::Unspecified }
    }
}

impl From<TypeKey> for TargetType {
    fn from(key: TypeKey) -> Self {
        TargetType::Scalar(key)
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetType::Scalar(key) => write!(f, "{}", key),
            TargetType::Array { element, primitive: true } => write!(f, "primitive array of {}", element),
            TargetType::Array { element, primitive: false } => write!(f, "array of {}", element),
            TargetType::Collection { container, element: ElementType::Of(element) } => {
                write!(f, "{} of {}", container, element)
            }
            TargetType::Collection { container, element: ElementType::Wildcard } => write!(f, "{} of any", container),
            TargetType::Collection { container, element: ElementType::Unspecified } => write!(f, "{}", container),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names_parse_with_aliases() {
        assert_eq!(TypeKey::parse("int").unwrap(), TypeKey::I32);
        assert_eq!(TypeKey::parse("Integer").unwrap(), TypeKey::I32);
        assert_eq!(TypeKey::parse("BOOLEAN").unwrap(), TypeKey::Bool);
        assert_eq!(TypeKey::parse("bigdecimal").unwrap(), TypeKey::Decimal);
        assert_eq!(TypeKey::parse("LocalDate").unwrap(), TypeKey::Date);
        assert!(matches!(TypeKey::parse("widget"), Err(AdapterError::Parse { .. })));
    }

    #[test]
    fn every_named_key_parses_back_from_its_name() {
        let keys = [
            TypeKey::Text, TypeKey::Char, TypeKey::Bool, TypeKey::I8, TypeKey::I16, TypeKey::I32,
            TypeKey::I64, TypeKey::BigInt, TypeKey::F32, TypeKey::F64, TypeKey::Decimal, TypeKey::Date,
            TypeKey::Time, TypeKey::DateTime, TypeKey::Timestamp, TypeKey::Instant, TypeKey::MonthDay,
            TypeKey::YearMonth, TypeKey::Pattern, TypeKey::TypeRef,
        ];
        for key in keys {
            assert_eq!(TypeKey::parse(key.as_str()).unwrap(), key);
        }
    }

    #[test]
    fn enum_domains_match_ignoring_case() {
        const COLOR: EnumDomain = EnumDomain::new("Color", &["RED", "Green"]);
        assert_eq!(COLOR.find("red"), Some("RED"));
        assert_eq!(COLOR.find("GREEN"), Some("Green"));
        assert_eq!(COLOR.find("blue"), None);
        assert_eq!(TypeKey::Enum(COLOR).to_string(), "Color");
    }

    #[test]
    fn zero_values_exist_for_primitives_only() {
        assert_eq!(TypeKey::Bool.zero(), Some(Value::Bool(false)));
        assert_eq!(TypeKey::I32.zero(), Some(Value::I32(0)));
        assert_eq!(TypeKey::Text.zero(), None);
        assert_eq!(TypeKey::Decimal.zero(), None);
    }

    #[test]
    fn containers_parse_and_display() {
        assert_eq!(ContainerKind::parse("TreeSet").unwrap(), ContainerKind::SortedSet);
        assert_eq!(ContainerKind::parse("vecdeque").unwrap(), ContainerKind::Deque);
        assert!(ContainerKind::parse("map").is_err());
        assert!(ContainerKind::HashSet.is_set());
        assert!(!ContainerKind::Stack.is_set());
        assert_eq!(
            TargetType::collection(ContainerKind::List, TypeKey::I32).to_string(),
            "list of i32"
        );
    }
}

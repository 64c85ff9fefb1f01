//! # Adapters
//!
//! Conversion of raw cell text into typed [`Value`]s. Scalars, enums, arrays
//! and collections have built-in rules selected by [`TargetType`]; callers add
//! their own rules as named [`CustomAdapter`]s in an [`AdapterRegistry`].

mod compound;
mod scalar;
mod types;
mod value;

pub use self::types::ContainerKind;
pub use self::types::ElementType;
pub use self::types::EnumDomain;
pub use self::types::TargetType;
pub use self::types::TypeKey;
pub use self::value::FromValue;
pub use self::value::MonthDay;
pub use self::value::Pattern;
pub use self::value::Value;
pub use self::value::YearMonth;

use std::collections::HashMap;
use std::fmt;
use std::fmt::Display;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;
use tracing::warn;

/// Errors raised while converting a single cell value.
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("No adapter supports {0}")]
    Unsupported(String),

    #[error("Cannot convert \"{value}\" to {target}: {message}")]
    Parse { target: String, value: String, message: String },

    #[error("Custom adapter '{name}' failed: {source}")]
    Custom {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Expected a {expected} value, found {found}")]
    Mismatch { expected: &'static str, found: String },

    #[error("Unknown field '{0}'")]
    UnknownField(String),
}

impl AdapterError {
    pub(crate) fn parse(target: impl Display, value: &str, message: impl Display) -> Self {
        AdapterError::Parse {
            target: target.to_string(),
            value: value.to_owned(),
            message: message.to_string(),
        }
    }

    /// True for errors caused by how a field is declared rather than by the cell text.
    /// These are never suppressed.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            AdapterError::Unsupported(_) | AdapterError::Mismatch { .. } | AdapterError::UnknownField(_)
        )
    }
}

/// A caller-supplied conversion rule.
///
/// It receives the cell text untrimmed and takes precedence over the built-in
/// rule of the field's type. Closures of the matching signature implement it.
pub trait CustomAdapter: Send + Sync {
    fn adapt(&self, raw: &str) -> anyhow::Result<Value>;
}

impl<F> CustomAdapter for F
where
    F: Fn(&str) -> anyhow::Result<Value> + Send + Sync,
{
    fn adapt(&self, raw: &str) -> anyhow::Result<Value> {
        self(raw)
    }
}

type AdapterFactory = Box<dyn Fn() -> Box<dyn CustomAdapter> + Send + Sync>;

/// A registered custom adapter, built on first use and reused afterwards.
struct CustomSlot {
    factory: AdapterFactory,
    instance: OnceLock<Box<dyn CustomAdapter>>,
    /// Called with empty text when the cell is missing.
    adapts_missing: bool,
}

impl CustomSlot {
    fn get(&self, name: &str) -> &dyn CustomAdapter {
        self.instance
            .get_or_init(|| {
                debug!(adapter = name, "building custom adapter");
                (self.factory)()
            })
            .as_ref()
    }
}

/// Built-in conversion rules plus the custom adapters registered by name.
#[derive(Default)]
pub struct AdapterRegistry {
    custom: HashMap<String, CustomSlot>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a custom adapter under `name`. The factory runs once, on first use.
    /// Registering a name again replaces the earlier adapter.
    pub fn register_custom<F, A>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> A + Send + Sync + 'static,
        A: CustomAdapter + 'static,
    {
        self.insert_custom(name.into(), factory, false)
    }

    /// Like [`register_custom`](Self::register_custom), but the adapter is also
    /// called for missing cells, with empty text, so it can supply a default.
    pub fn register_custom_for_missing<F, A>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> A + Send + Sync + 'static,
        A: CustomAdapter + 'static,
    {
        self.insert_custom(name.into(), factory, true)
    }

    fn insert_custom<F, A>(&mut self, name: String, factory: F, adapts_missing: bool) -> &mut Self
    where
        F: Fn() -> A + Send + Sync + 'static,
        A: CustomAdapter + 'static,
    {
        let slot = CustomSlot {
            factory: Box::new(move || Box::new(factory()) as Box<dyn CustomAdapter>),
            instance: OnceLock::new(),
            adapts_missing,
        };
        self.custom.insert(name, slot);
        self
    }

    /// Builder form of [`register_custom`](Self::register_custom).
    pub fn with_custom<F, A>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> A + Send + Sync + 'static,
        A: CustomAdapter + 'static,
    {
        self.register_custom(name, factory);
        self
    }

    /// Builder form of [`register_custom_for_missing`](Self::register_custom_for_missing).
    pub fn with_custom_for_missing<F, A>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> A + Send + Sync + 'static,
        A: CustomAdapter + 'static,
    {
        self.register_custom_for_missing(name, factory);
        self
    }

    pub fn has_custom(&self, name: &str) -> bool {
        self.custom.contains_key(name)
    }

    /// Checks that `target` (or the named custom adapter) can be converted,
    /// without looking at any text.
    pub fn validate(&self, target: &TargetType, custom: Option<&str>) -> Result<(), AdapterError> {
        match custom {
            Some(name) => self.custom_slot(name).map(|_| ()),
            None => resolve(target).map(|_| ()),
        }
    }

    /// Converts raw cell text into a value of `target`.
    ///
    /// Missing or blank text gives `Value::Absent` for scalars and an empty
    /// array or collection otherwise. With a custom adapter named, that adapter
    /// converts any present text, untrimmed. Missing text reaches it only when
    /// it was registered with [`register_custom_for_missing`](Self::register_custom_for_missing).
    pub fn convert(&self, target: &TargetType, raw: Option<&str>, custom: Option<&str>) -> Result<Value, AdapterError> {
        if let Some(name) = custom {
            let slot = self.custom_slot(name)?;
            return match raw {
                None if !slot.adapts_missing => Ok(Value::Absent),
                raw => slot
                    .get(name)
                    .adapt(raw.unwrap_or_default())
                    .map_err(|source| AdapterError::Custom {
                        name: name.to_owned(),
                        source,
                    }),
            };
        }

        let value = match resolve(target)? {
            Rule::Scalar(key) => compound::convert_scalar(key, raw)?,
            Rule::Array { key, zero } => compound::convert_array(key, zero, raw),
            Rule::Collection { container, key } => compound::convert_collection(container, key, raw),
        };
        Ok(value)
    }

    fn custom_slot(&self, name: &str) -> Result<&CustomSlot, AdapterError> {
        self.custom
            .get(name)
            .ok_or_else(|| AdapterError::Unsupported(format!("unregistered custom adapter '{}'", name)))
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.custom.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("AdapterRegistry").field("custom", &names).finish()
    }
}

/// The built-in rule chosen for a target type.
enum Rule {
    Scalar(TypeKey),
    Array { key: TypeKey, zero: Option<Value> },
    Collection { container: ContainerKind, key: TypeKey },
}

fn resolve(target: &TargetType) -> Result<Rule, AdapterError> {
    match target {
        TargetType::Scalar(key) => Ok(Rule::Scalar(*key)),
        TargetType::Array { element, primitive } => match element.as_ref() {
            TargetType::Scalar(key) if !primitive => Ok(Rule::Array { key: *key, zero: None }),
            TargetType::Scalar(key) => match key.zero() {
                Some(zero) => Ok(Rule::Array { key: *key, zero: Some(zero) }),
                None => Err(AdapterError::Unsupported(target.to_string())),
            },
            _ => Err(AdapterError::Unsupported(format!(
                "{} (arrays of arrays or collections need a custom adapter)",
                target
            ))),
        },
        TargetType::Collection { container, element } => match element {
            ElementType::Of(element) => match element.as_ref() {
                TargetType::Scalar(key) => Ok(Rule::Collection { container: *container, key: *key }),
                _ => Err(AdapterError::Unsupported(format!(
                    "{} (nested containers need a custom adapter)",
                    target
                ))),
            },
            ElementType::Unspecified | ElementType::Wildcard => {
                warn!(container = %container, "no element type given for collection, populating it with text");
                Ok(Rule::Collection { container: *container, key: TypeKey::Text })
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    #[test]
    fn scalars_follow_the_absence_law() {
        let registry = AdapterRegistry::new();
        let target = TargetType::scalar(TypeKey::I32);
        for raw in [None, Some(""), Some("   ")] {
            assert_eq!(registry.convert(&target, raw, None).unwrap(), Value::Absent);
        }
        assert_eq!(registry.convert(&target, Some(" 100.75 "), None).unwrap(), Value::I32(100));
    }

    #[test]
    fn arrays_and_collections_follow_the_absence_law() {
        let registry = AdapterRegistry::new();
        for raw in [None, Some(""), Some("   ")] {
            assert_eq!(
                registry.convert(&TargetType::primitive_array(TypeKey::Bool), raw, None).unwrap(),
                Value::Array(Vec::new())
            );
            assert_eq!(
                registry.convert(&TargetType::collection(ContainerKind::Deque, TypeKey::I64), raw, None).unwrap(),
                Value::Collection(ContainerKind::Deque, Vec::new())
            );
        }
    }

    #[test]
    fn untyped_collections_hold_text() {
        let registry = AdapterRegistry::new();
        let target = TargetType::untyped_collection(ContainerKind::List);
        assert_eq!(
            registry.convert(&target, Some("[a, b]"), None).unwrap(),
            Value::Collection(ContainerKind::List, vec![Value::Text("a".into()), Value::Text("b".into())])
        );
        let wildcard = TargetType::Collection { container: ContainerKind::Stack, element: ElementType::Wildcard };
        assert_eq!(
            registry.convert(&wildcard, Some("x"), None).unwrap(),
            Value::Collection(ContainerKind::Stack, vec![Value::Text("x".into())])
        );
    }

    #[test]
    fn nested_containers_are_unsupported() {
        let registry = AdapterRegistry::new();
        let nested_array = TargetType::Array { element: Box::new(TargetType::array(TypeKey::I32)), primitive: false };
        let nested_collection = TargetType::Collection {
            container: ContainerKind::List,
            element: ElementType::Of(Box::new(TargetType::untyped_collection(ContainerKind::List))),
        };
        let primitive_text = TargetType::primitive_array(TypeKey::Text);
        for target in [nested_array, nested_collection, primitive_text] {
            assert!(registry.validate(&target, None).unwrap_err().is_unsupported());
            assert!(registry.convert(&target, Some("a"), None).unwrap_err().is_unsupported());
        }
    }

    #[test]
    fn custom_adapters_get_raw_text_and_are_built_once() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = built.clone();
        let registry = AdapterRegistry::new().with_custom("shout", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            |raw: &str| -> anyhow::Result<Value> { Ok(Value::Text(raw.to_uppercase())) }
        });
        let target = TargetType::scalar(TypeKey::I32);

        assert_eq!(built.load(Ordering::SeqCst), 0);
        assert_eq!(registry.convert(&target, Some(" hi "), Some("shout")).unwrap(), Value::Text(" HI ".into()));
        assert_eq!(registry.convert(&target, Some("x"), Some("shout")).unwrap(), Value::Text("X".into()));
        assert_eq!(registry.convert(&target, None, Some("shout")).unwrap(), Value::Absent);
        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert!(registry.validate(&target, Some("shout")).is_ok());
    }

    #[test]
    fn custom_adapters_can_opt_in_to_missing_cells() {
        let registry = AdapterRegistry::new().with_custom_for_missing("or_unknown", || {
            |raw: &str| -> anyhow::Result<Value> {
                Ok(Value::Text(if raw.is_empty() { "unknown".to_owned() } else { raw.to_owned() }))
            }
        });
        let target = TargetType::scalar(TypeKey::Text);
        assert_eq!(registry.convert(&target, None, Some("or_unknown")).unwrap(), Value::Text("unknown".into()));
        assert_eq!(registry.convert(&target, Some("x"), Some("or_unknown")).unwrap(), Value::Text("x".into()));
    }

    #[test]
    fn custom_adapter_failures_and_unknown_names() {
        let registry = AdapterRegistry::new().with_custom("fail", || {
            |_: &str| -> anyhow::Result<Value> { Err(anyhow::anyhow!("always fails")) }
        });
        let target = TargetType::scalar(TypeKey::Text);
        let error = registry.convert(&target, Some("x"), Some("fail")).unwrap_err();
        assert!(matches!(error, AdapterError::Custom { .. }));
        assert!(!error.is_unsupported());
        assert!(registry.validate(&target, Some("missing")).unwrap_err().is_unsupported());
        assert!(format!("{:?}", registry).contains("fail"));
    }
}

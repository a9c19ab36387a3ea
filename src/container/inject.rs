//! Struct field injection.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::{downcast, ServiceHandle, ServiceKey};
use crate::registration::AnyArc;
use crate::traits::{resolver_key, Resolver};

/// Marker value opting a field into injection with
/// [`FieldInjector::marked`].
pub const INJECT_MARKER: &str = "true";

type Lookup<'a> = dyn Fn(&ServiceKey) -> DiResult<Option<AnyArc>> + 'a;

/// Types whose fields can be populated by
/// [`ResolverExt::inject`](crate::ResolverExt::inject).
///
/// Implementations declare each field once through the [`FieldInjector`].
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, FieldInjector, Injectable, Resolver, ResolverExt};
/// use std::sync::Arc;
///
/// struct Mailer;
/// struct Audit;
///
/// #[derive(Default)]
/// struct Handler {
///     resolver: Option<Arc<dyn Resolver>>,
///     mailer: Option<Arc<Mailer>>,
///     audit: Option<Arc<Audit>>,
/// }
///
/// impl Injectable for Handler {
///     fn inject_fields(&mut self, fields: &mut FieldInjector<'_>) {
///         fields.resolver("resolver", &mut self.resolver);
///         fields.inject("mailer", &mut self.mailer);
///         fields.plain("audit", &mut self.audit);
///     }
/// }
///
/// let container = Container::new();
/// container.add_singleton(Arc::new(Mailer)).unwrap();
/// container.add_singleton(Arc::new(Audit)).unwrap();
///
/// let mut handler = Handler::default();
/// let report = container.inject(&mut handler);
/// assert!(handler.resolver.is_some());
/// assert!(handler.mailer.is_some());
/// // Not opted in.
/// assert!(handler.audit.is_none());
/// assert_eq!(report.skipped, vec!["audit"]);
/// ```
pub trait Injectable: std::any::Any {
    fn inject_fields(&mut self, fields: &mut FieldInjector<'_>);
}

/// What an injection pass did, field by field.
#[derive(Debug, Default)]
pub struct InjectionReport {
    pub injected: Vec<&'static str>,
    /// Opted in, but nothing is bound for the field's type.
    pub missing: Vec<&'static str>,
    /// Already held a value.
    pub preserved: Vec<&'static str>,
    /// Not opted in.
    pub skipped: Vec<&'static str>,
    pub failed: Vec<(&'static str, DiError)>,
    /// Set when the whole target was left alone.
    pub skipped_target: Option<&'static str>,
}

impl InjectionReport {
    pub(crate) fn target_skipped(target: &'static str) -> Self {
        tracing::debug!(target_type = target, "injection target is a container, skipped");
        Self {
            skipped_target: Some(target),
            ..Self::default()
        }
    }

    /// Every opted-in field ended up holding a value.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.failed.is_empty()
    }
}

/// Visitor handed to [`Injectable::inject_fields`].
pub struct FieldInjector<'a> {
    lookup: &'a Lookup<'a>,
    report: InjectionReport,
}

impl<'a> FieldInjector<'a> {
    pub(crate) fn new(lookup: &'a Lookup<'a>) -> Self {
        Self {
            lookup,
            report: InjectionReport::default(),
        }
    }

    pub(crate) fn finish(self) -> InjectionReport {
        self.report
    }

    /// The resolver capability; always injected.
    pub fn resolver(&mut self, name: &'static str, slot: &mut Option<Arc<dyn Resolver>>) {
        self.fill(name, slot);
    }

    /// A field explicitly opted into injection.
    pub fn inject<S: ServiceHandle>(&mut self, name: &'static str, slot: &mut Option<S>) {
        self.fill(name, slot);
    }

    /// A field opted in only when `marker` is [`INJECT_MARKER`].
    pub fn marked<S: ServiceHandle>(&mut self, name: &'static str, slot: &mut Option<S>, marker: &str) {
        if marker == INJECT_MARKER {
            self.fill(name, slot);
        } else {
            self.report.skipped.push(name);
        }
    }

    /// A field that was not opted in. Only filled when it holds the resolver.
    pub fn plain<S: ServiceHandle>(&mut self, name: &'static str, slot: &mut Option<S>) {
        if ServiceKey::of::<S>() == resolver_key() {
            self.fill(name, slot);
        } else {
            self.report.skipped.push(name);
        }
    }

    /// An embedded value; never injected.
    pub fn embedded<T: ?Sized>(&mut self, name: &'static str, _field: &mut T) {
        self.report.skipped.push(name);
    }

    fn fill<S: ServiceHandle>(&mut self, name: &'static str, slot: &mut Option<S>) {
        if slot.is_some() {
            self.report.preserved.push(name);
            return;
        }
        let key = ServiceKey::of::<S>();
        match (self.lookup)(&key).and_then(|found| found.map(|any| downcast::<S>(&any)).transpose()) {
            Ok(Some(service)) => {
                *slot = Some(service);
                self.report.injected.push(name);
            }
            Ok(None) => self.report.missing.push(name),
            Err(err) => {
                tracing::debug!(field = name, service = key.name(), error = %err, "field left empty");
                self.report.failed.push((name, err));
            }
        }
    }
}

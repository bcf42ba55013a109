//! The declared attribute surface each resource kind exposes to the host.
//!
//! For every object kind the backend publishes a static table describing the
//! attributes it recognizes: whether each is required, optional, or computed,
//! whether a change forces replacement, its default, and the normalization
//! applied before the value is stored or compared. The host's diffing runs
//! against this table; the reconcilers themselves work on typed state
//! records.

/// How an attribute participates in the declared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// Must be set in the declared configuration.
    Required,
    /// May be set; the default applies otherwise.
    Optional,
    /// Filled in from the remote catalog on read, never declared.
    Computed,
}

/// A normalization function applied to a raw attribute value before it is
/// stored in state or compared against the remote catalog.
pub type Normalizer = fn(&str) -> String;

/// One attribute in a resource kind's declared surface.
#[derive(Clone, Copy)]
pub struct AttributeSpec {
    /// Attribute name as the host sees it.
    pub name: &'static str,
    /// Required, optional, or computed.
    pub kind: AttributeKind,
    /// A change to this attribute replaces the object instead of mutating it.
    pub force_new: bool,
    /// Default value applied when the attribute is optional and unset.
    pub default: Option<&'static str>,
    /// Normalization applied before storing or comparing the value.
    pub normalize: Option<Normalizer>,
}

impl AttributeSpec {
    /// Run the attribute's normalizer, or pass the value through.
    pub fn normalized(&self, raw: &str) -> String {
        match self.normalize {
            Some(f) => f(raw),
            None => raw.to_owned(),
        }
    }
}

impl std::fmt::Debug for AttributeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeSpec")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("force_new", &self.force_new)
            .field("default", &self.default)
            .field("normalize", &self.normalize.is_some())
            .finish()
    }
}

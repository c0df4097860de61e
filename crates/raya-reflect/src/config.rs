//! Registry configuration

/// What happens when a tag is attached twice to the same holder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagPolicy {
    /// The later value replaces the earlier one
    #[default]
    Override,
    /// The second declaration fails with `DuplicateTag`
    Reject,
}

/// What happens when a base class brings a member whose name the derived
/// class already declared itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InheritPolicy {
    /// The derived declaration stays, regardless of declaration order
    #[default]
    KeepDeclared,
    /// The inherited member replaces it (strict last-writer-wins)
    Replace,
}

/// Options shared by every builder session of a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryConfig {
    /// Duplicate tag handling
    pub tag_policy: TagPolicy,
    /// Inherited member collision handling
    pub inherit_policy: InheritPolicy,
}

impl RegistryConfig {
    /// Default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duplicate tag policy
    pub fn tag_policy(mut self, policy: TagPolicy) -> Self {
        self.tag_policy = policy;
        self
    }

    /// Set the inherited member policy
    pub fn inherit_policy(mut self, policy: InheritPolicy) -> Self {
        self.inherit_policy = policy;
        self
    }
}

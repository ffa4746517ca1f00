//! Capability filtering for the `initialize` response.
//!
//! A language server advertises optional features in
//! `result.capabilities`, most of them as `<name>Provider` fields
//! (`completionProvider`, `codeActionProvider`, ...). The value may be a
//! boolean or a descriptor object. This module decides, per provider name,
//! whether the client gets to see the feature, and overwrites the ones it
//! must not see with `false`.
//!
//! ```json
//! {
//!   "jsonrpc": "2.0",
//!   "id": 0,
//!   "result": {
//!     "capabilities": {
//!       "hoverProvider": true,
//!       "completionProvider": { "triggerCharacters": ["."] },
//!       "textDocumentSync": 2
//!     }
//!   }
//! }
//! ```
//!
//! Only top-level keys of `capabilities` are considered. Keys without the
//! suffix (`textDocumentSync` above) and everything outside `capabilities`
//! pass through untouched.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::error::PolicyError;

/// Suffix marking a filterable capability field.
pub const PROVIDER_SUFFIX: &str = "Provider";

// ============================================================================
// Filter Policy
// ============================================================================

/// How the provider list of a [`FilterPolicy`] is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Only listed providers stay enabled.
    EnableOnly,
    /// Listed providers are disabled, everything else stays enabled.
    DisableOnly,
    /// Nothing is filtered.
    Unfiltered,
}

impl FilterMode {
    /// Label used in log fields.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnableOnly => "enable_only",
            Self::DisableOnly => "disable_only",
            Self::Unfiltered => "unfiltered",
        }
    }
}

impl std::fmt::Display for FilterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which providers the client is allowed to see.
///
/// Immutable once built. The provider list holds bare names (no `Provider`
/// suffix), trimmed, without empty entries or duplicates, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPolicy {
    mode: FilterMode,
    providers: Vec<String>,
}

impl FilterPolicy {
    /// Build a policy from an enable-list and a disable-list.
    ///
    /// At most one list may be non-empty. Both empty yields
    /// [`FilterMode::Unfiltered`].
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Conflict`] when both lists name providers.
    pub fn new<I, J, S, T>(enable: I, disable: J) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let enable = normalize(enable);
        let disable = normalize(disable);

        match (enable.is_empty(), disable.is_empty()) {
            (false, false) => Err(PolicyError::Conflict { enable, disable }),
            (false, true) => Ok(Self {
                mode: FilterMode::EnableOnly,
                providers: enable,
            }),
            (true, false) => Ok(Self {
                mode: FilterMode::DisableOnly,
                providers: disable,
            }),
            (true, true) => Ok(Self::unfiltered()),
        }
    }

    /// Policy that keeps only the given providers.
    pub fn enable_only<I, S>(providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            mode: FilterMode::EnableOnly,
            providers: normalize(providers),
        }
    }

    /// Policy that disables the given providers.
    pub fn disable_only<I, S>(providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            mode: FilterMode::DisableOnly,
            providers: normalize(providers),
        }
    }

    /// Policy that lets everything through.
    #[must_use]
    pub fn unfiltered() -> Self {
        Self {
            mode: FilterMode::Unfiltered,
            providers: Vec::new(),
        }
    }

    /// The filter mode.
    #[must_use]
    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// The provider names the mode applies to.
    #[must_use]
    pub fn providers(&self) -> &[String] {
        &self.providers
    }

    /// Whether a provider (bare name) stays enabled under this policy.
    #[must_use]
    pub fn allows(&self, provider: &str) -> bool {
        let listed = self.providers.iter().any(|p| p == provider);
        match self.mode {
            FilterMode::EnableOnly => listed,
            FilterMode::DisableOnly => !listed,
            FilterMode::Unfiltered => true,
        }
    }
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self::unfiltered()
    }
}

fn normalize<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for name in names {
        let name = name.as_ref().trim();
        if name.is_empty() || out.iter().any(|n| n == name) {
            continue;
        }
        out.push(name.to_string());
    }
    out
}

// ============================================================================
// Capability Fields
// ============================================================================

/// Classification of one key in the `capabilities` object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityField<'a> {
    /// A `<name>Provider` field; `name` is the bare provider name.
    Provider {
        /// The key with the suffix stripped.
        name: &'a str,
    },
    /// Any other field. Never inspected or modified.
    Opaque,
}

impl<'a> CapabilityField<'a> {
    /// Classify a capability key by its suffix.
    #[must_use]
    pub fn classify(key: &'a str) -> Self {
        match key.strip_suffix(PROVIDER_SUFFIX) {
            Some(name) => Self::Provider { name },
            None => Self::Opaque,
        }
    }
}

// ============================================================================
// Filtering
// ============================================================================

/// Provider names resolved by one filter pass, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Providers left as the server advertised them.
    pub enabled: BTreeSet<String>,
    /// Providers overwritten with `false`.
    pub disabled: BTreeSet<String>,
}

impl FilterOutcome {
    /// Sorted enabled names, for log fields.
    #[must_use]
    pub fn enabled_names(&self) -> Vec<&str> {
        self.enabled.iter().map(String::as_str).collect()
    }

    /// Sorted disabled names, for log fields.
    #[must_use]
    pub fn disabled_names(&self) -> Vec<&str> {
        self.disabled.iter().map(String::as_str).collect()
    }
}

/// Apply `policy` to a `capabilities` object in place.
///
/// Every `<name>Provider` key the policy rejects is set to `false`,
/// whatever its previous shape. Nested objects are not searched. Running the
/// filter again on its own output changes nothing.
pub fn filter_capabilities(
    capabilities: &mut Map<String, Value>,
    policy: &FilterPolicy,
) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();

    for (key, value) in capabilities.iter_mut() {
        let CapabilityField::Provider { name } = CapabilityField::classify(key) else {
            continue;
        };

        if policy.allows(name) {
            outcome.enabled.insert(name.to_string());
        } else {
            *value = Value::Bool(false);
            outcome.disabled.insert(name.to_string());
        }
    }

    outcome
}

/// Locate `result.capabilities` in a parsed message.
///
/// Returns `None` unless the message is an object whose `result` is an object
/// whose `capabilities` is an object.
pub fn capabilities_mut(message: &mut Value) -> Option<&mut Map<String, Value>> {
    message
        .as_object_mut()?
        .get_mut("result")?
        .as_object_mut()?
        .get_mut("capabilities")?
        .as_object_mut()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn foo_bar_baz() -> Map<String, Value> {
        match json!({
            "fooProvider": true,
            "barProvider": true,
            "bazProvider": true,
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn names(set: &BTreeSet<String>) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    // ── FilterPolicy ─────────────────────────────────────────────────────

    #[test]
    fn test_policy_enable_list() {
        let policy = FilterPolicy::new(["completion", "codeAction"], Vec::<String>::new()).unwrap();
        assert_eq!(policy.mode(), FilterMode::EnableOnly);
        assert_eq!(policy.providers(), ["completion", "codeAction"]);
    }

    #[test]
    fn test_policy_disable_list() {
        let policy = FilterPolicy::new(Vec::<String>::new(), ["hover"]).unwrap();
        assert_eq!(policy.mode(), FilterMode::DisableOnly);
        assert_eq!(policy.providers(), ["hover"]);
    }

    #[test]
    fn test_policy_both_empty_is_unfiltered() {
        let policy = FilterPolicy::new(Vec::<String>::new(), Vec::<String>::new()).unwrap();
        assert_eq!(policy, FilterPolicy::unfiltered());
    }

    #[test]
    fn test_policy_conflict() {
        let err = FilterPolicy::new(["completion"], ["hover"]).unwrap_err();
        assert_eq!(
            err,
            PolicyError::Conflict {
                enable: vec!["completion".to_string()],
                disable: vec!["hover".to_string()],
            }
        );
        assert_eq!(err.to_string(), "both enable/disable flags given");
    }

    #[test]
    fn test_policy_normalizes_names() {
        let policy = FilterPolicy::enable_only([" hover", "", "hover", "rename ", "  "]);
        assert_eq!(policy.providers(), ["hover", "rename"]);
    }

    #[test]
    fn test_policy_blank_entries_do_not_conflict() {
        let policy = FilterPolicy::new(["", " "], ["hover"]).unwrap();
        assert_eq!(policy.mode(), FilterMode::DisableOnly);
    }

    #[test]
    fn test_allows_decision_table() {
        let enable = FilterPolicy::enable_only(["foo"]);
        assert!(enable.allows("foo"));
        assert!(!enable.allows("bar"));

        let disable = FilterPolicy::disable_only(["foo"]);
        assert!(!disable.allows("foo"));
        assert!(disable.allows("bar"));

        let none = FilterPolicy::unfiltered();
        assert!(none.allows("foo"));
    }

    #[test]
    fn test_empty_lists_by_mode() {
        // EnableOnly with nothing listed passes nothing; DisableOnly passes all.
        assert!(!FilterPolicy::enable_only(Vec::<String>::new()).allows("hover"));
        assert!(FilterPolicy::disable_only(Vec::<String>::new()).allows("hover"));
    }

    // ── CapabilityField ──────────────────────────────────────────────────

    #[test]
    fn test_classify() {
        assert_eq!(
            CapabilityField::classify("hoverProvider"),
            CapabilityField::Provider { name: "hover" }
        );
        assert_eq!(CapabilityField::classify("Provider"), CapabilityField::Provider { name: "" });
        assert_eq!(CapabilityField::classify("textDocumentSync"), CapabilityField::Opaque);
        // Case-sensitive, suffix only.
        assert_eq!(CapabilityField::classify("providerHover"), CapabilityField::Opaque);
        assert_eq!(CapabilityField::classify("hoverprovider"), CapabilityField::Opaque);
    }

    // ── filter_capabilities ──────────────────────────────────────────────

    #[test]
    fn test_enable_only_foo() {
        let mut caps = foo_bar_baz();
        let outcome = filter_capabilities(&mut caps, &FilterPolicy::enable_only(["foo"]));

        assert_eq!(caps["fooProvider"], json!(true));
        assert_eq!(caps["barProvider"], json!(false));
        assert_eq!(caps["bazProvider"], json!(false));
        assert_eq!(names(&outcome.enabled), ["foo"]);
        assert_eq!(names(&outcome.disabled), ["bar", "baz"]);
    }

    #[test]
    fn test_disable_only_bar() {
        let mut caps = foo_bar_baz();
        let outcome = filter_capabilities(&mut caps, &FilterPolicy::disable_only(["bar"]));

        assert_eq!(caps["fooProvider"], json!(true));
        assert_eq!(caps["barProvider"], json!(false));
        assert_eq!(caps["bazProvider"], json!(true));
        assert_eq!(names(&outcome.enabled), ["baz", "foo"]);
        assert_eq!(names(&outcome.disabled), ["bar"]);
    }

    #[test]
    fn test_unfiltered_keeps_everything() {
        let mut caps = foo_bar_baz();
        let outcome = filter_capabilities(&mut caps, &FilterPolicy::unfiltered());

        assert_eq!(caps, foo_bar_baz());
        assert_eq!(names(&outcome.enabled), ["bar", "baz", "foo"]);
        assert!(outcome.disabled.is_empty());
    }

    #[test]
    fn test_descriptor_object_overwritten_with_false() {
        let mut caps = match json!({
            "completionProvider": { "triggerCharacters": ["."], "resolveProvider": true },
            "hoverProvider": true,
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };

        filter_capabilities(&mut caps, &FilterPolicy::enable_only(["hover"]));
        assert_eq!(caps["completionProvider"], json!(false));
        assert_eq!(caps["hoverProvider"], json!(true));
    }

    #[test]
    fn test_non_provider_keys_untouched() {
        let mut caps = match json!({
            "textDocumentSync": { "openClose": true, "change": 2 },
            "workspace": { "fileOperations": { "didCreate": true } },
            "positionEncoding": "utf-16",
            "hoverProvider": true,
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let before = caps.clone();

        let policy = FilterPolicy::enable_only(Vec::<String>::new());
        let outcome = filter_capabilities(&mut caps, &policy);

        assert_eq!(caps["textDocumentSync"], before["textDocumentSync"]);
        assert_eq!(caps["workspace"], before["workspace"]);
        assert_eq!(caps["positionEncoding"], before["positionEncoding"]);
        assert_eq!(caps["hoverProvider"], json!(false));
        assert_eq!(names(&outcome.disabled), ["hover"]);
    }

    #[test]
    fn test_nested_providers_not_inspected() {
        let mut caps = match json!({
            "workspace": { "symbolProvider": true },
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };

        let policy = FilterPolicy::enable_only(Vec::<String>::new());
        let outcome = filter_capabilities(&mut caps, &policy);
        assert_eq!(caps["workspace"]["symbolProvider"], json!(true));
        assert!(outcome.disabled.is_empty());
        assert!(outcome.enabled.is_empty());
    }

    #[test]
    fn test_filter_idempotent() {
        for policy in [
            FilterPolicy::enable_only(["foo"]),
            FilterPolicy::disable_only(["bar"]),
            FilterPolicy::unfiltered(),
        ] {
            let mut caps = foo_bar_baz();
            let first = filter_capabilities(&mut caps, &policy);
            let once = caps.clone();
            let second = filter_capabilities(&mut caps, &policy);

            assert_eq!(caps, once);
            assert_eq!(first, second);
        }
    }

    // ── capabilities_mut ─────────────────────────────────────────────────

    #[test]
    fn test_capabilities_mut_found() {
        let mut msg = json!({
            "jsonrpc": "2.0",
            "id": 0,
            "result": { "capabilities": { "hoverProvider": true } }
        });
        let caps = capabilities_mut(&mut msg).unwrap();
        assert!(caps.contains_key("hoverProvider"));
    }

    #[test]
    fn test_capabilities_mut_shape_mismatch() {
        for mut msg in [
            json!([1, 2, 3]),
            json!("text"),
            json!({"jsonrpc":"2.0","method":"window/logMessage","params":{}}),
            json!({"jsonrpc":"2.0","id":0,"error":{"code":-32600,"message":"bad"}}),
            json!({"jsonrpc":"2.0","id":0,"result":null}),
            json!({"jsonrpc":"2.0","id":0,"result":{"serverInfo":{}}}),
            json!({"jsonrpc":"2.0","id":0,"result":{"capabilities":true}}),
        ] {
            assert!(capabilities_mut(&mut msg).is_none(), "unexpected match: {msg}");
        }
    }
}

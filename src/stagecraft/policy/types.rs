// SPDX-License-Identifier: MIT

//! Policy data types
//!
//! Four layers, broadest first: the global style policy, per-tag policies,
//! per-component policies and per-template inspector filters. All of it is
//! plain serde data loaded once and never mutated.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Additive allow list plus a deny list that always wins
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleLists {
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
}

/// A layer that can only take things away.
///
/// `allow: None` keeps everything the broader layers allow; `Some(set)`
/// keeps only the intersection. `deny` always removes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Narrowing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub deny: BTreeSet<String>,
}

impl Narrowing {
    /// Whether this layer lets `key` through
    pub fn permits(&self, key: &str) -> bool {
        if self.deny.contains(key) {
            return false;
        }
        self.allow.as_ref().map_or(true, |allow| allow.contains(key))
    }
}

/// Kind of value a style key accepts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleValueType {
    /// `12px`, `1.5rem`, `0`, or a keyword from `values`
    Length,
    /// Bare number, possibly as a string
    Number,
    /// `#rgb`, `#rrggbb`, `rgb(..)`, `hsl(..)` or a named color
    Color,
    /// One of `values`
    Enum,
    /// Any string
    String,
    /// No constraint
    #[default]
    Any,
}

/// Per-key metadata used for validation and editor widgets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleKeyMeta {
    #[serde(rename = "type", default)]
    pub value_type: StyleValueType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub presets: Vec<String>,
}

/// Global allow/deny lists with an optional per-tag overlay
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStylePolicy {
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
    #[serde(default)]
    pub per_tag: BTreeMap<String, StyleLists>,
    #[serde(default)]
    pub meta: BTreeMap<String, StyleKeyMeta>,
}

/// Policy for one tag name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagPolicy {
    /// Inspector sections shown for this tag; `None` shows all
    #[serde(default)]
    pub sections: Option<Vec<String>>,
    /// Style keys grouped by inspector group
    #[serde(default)]
    pub style_groups: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub styles: Option<StyleLists>,
    /// Attribute whitelist; `None` allows any
    #[serde(default)]
    pub attributes: Option<Vec<String>>,
    /// Event whitelist; `None` allows any
    #[serde(default)]
    pub events: Option<Vec<String>>,
}

impl TagPolicy {
    pub fn allows_section(&self, section: &str) -> bool {
        self.sections
            .as_ref()
            .map_or(true, |s| s.iter().any(|x| x == section))
    }

    pub fn allows_attribute(&self, attribute: &str) -> bool {
        self.attributes
            .as_ref()
            .map_or(true, |a| a.iter().any(|x| x == attribute))
    }

    pub fn allows_event(&self, event: &str) -> bool {
        self.events
            .as_ref()
            .map_or(true, |e| e.iter().any(|x| x == event))
    }

    /// Every style key named by any group
    pub fn group_keys(&self) -> impl Iterator<Item = &String> {
        self.style_groups.values().flatten()
    }
}

/// Schema of one component property, with optional visibility gates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropSchema {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Every entry must equal the node's live property value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<Map<String, Value>>,
    /// Must evaluate truthy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_expr: Option<String>,
}

/// What a component type declares about itself
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentCapabilities {
    /// Tags the node may render as
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub default_tag: Option<String>,
    #[serde(default)]
    pub can_have_children: bool,
    #[serde(default)]
    pub props: Vec<PropSchema>,
}

/// One `group.control` entry of an inspector overlay
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
}

/// Per-component override policy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentPolicy {
    /// Sparse `group.control` (or bare `group`) visibility overrides
    #[serde(default)]
    pub inspector: BTreeMap<String, OverlayEntry>,
    #[serde(default)]
    pub styles: Option<Narrowing>,
}

/// Per-template allow/deny lists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InspectorFilter {
    #[serde(default)]
    pub styles: Narrowing,
    #[serde(default)]
    pub props: Narrowing,
    /// Action-step kinds (`alert`, `http`, ...)
    #[serde(default)]
    pub actions: Narrowing,
    /// Flow-edge target kinds (`navigate`, `openFragment`, ...)
    #[serde(default)]
    pub flows: Narrowing,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub inspector: InspectorFilter,
}

/// All policy data, keyed by tag, component type and template id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRegistry {
    #[serde(default)]
    pub styles: GlobalStylePolicy,
    #[serde(default)]
    pub tags: BTreeMap<String, TagPolicy>,
    #[serde(default)]
    pub components: BTreeMap<String, ComponentCapabilities>,
    #[serde(default)]
    pub component_policies: BTreeMap<String, ComponentPolicy>,
    #[serde(default)]
    pub templates: BTreeMap<String, TemplateDefinition>,
}

impl PolicyRegistry {
    pub fn tag(&self, name: &str) -> Option<&TagPolicy> {
        self.tags.get(name)
    }

    pub fn capabilities(&self, component: &str) -> Option<&ComponentCapabilities> {
        self.components.get(component)
    }

    pub fn component_policy(&self, component: &str) -> Option<&ComponentPolicy> {
        self.component_policies.get(component)
    }

    pub fn template(&self, id: &str) -> Option<&TemplateDefinition> {
        self.templates.get(id)
    }

    pub fn style_meta(&self, key: &str) -> Option<&StyleKeyMeta> {
        self.styles.meta.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrowing_permits() {
        let open = Narrowing::default();
        assert!(open.permits("color"));

        let narrowed = Narrowing {
            allow: Some(["color".to_string()].into_iter().collect()),
            deny: BTreeSet::new(),
        };
        assert!(narrowed.permits("color"));
        assert!(!narrowed.permits("width"));

        let denied = Narrowing {
            allow: Some(["color".to_string()].into_iter().collect()),
            deny: ["color".to_string()].into_iter().collect(),
        };
        assert!(!denied.permits("color"));
    }

    #[test]
    fn test_tag_whitelists() {
        let tag = TagPolicy {
            attributes: Some(vec!["href".to_string()]),
            ..TagPolicy::default()
        };
        assert!(tag.allows_attribute("href"));
        assert!(!tag.allows_attribute("onclick"));
        assert!(tag.allows_event("click"));
        assert!(tag.allows_section("anything"));
    }

    #[test]
    fn test_registry_deserialize() {
        let yaml = r#"
            styles:
              allow: [color]
              deny: [position]
              perTag:
                img:
                  deny: [fontSize]
              meta:
                width:
                  type: length
                  units: [px, "%"]
                  min: 0
            tags:
              div:
                styleGroups:
                  layout: [width, height]
                events: [click]
            components:
              Button:
                tags: [button, a]
                defaultTag: button
                props:
                  - key: href
                    whenExpr: "node.props.tag == 'a'"
            componentPolicies:
              Button:
                inspector:
                  layout.overflow: { visible: false }
            templates:
              hero:
                name: Hero
                inspector:
                  styles:
                    allow: [color]
        "#;
        let registry: PolicyRegistry = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(registry.styles.allow, vec!["color"]);
        assert_eq!(registry.styles.per_tag["img"].deny, vec!["fontSize"]);
        let width = registry.style_meta("width").unwrap();
        assert_eq!(width.value_type, StyleValueType::Length);
        assert_eq!(width.min, Some(0.0));

        let div = registry.tag("div").unwrap();
        assert_eq!(div.group_keys().count(), 2);
        assert!(div.allows_event("click"));
        assert!(!div.allows_event("submit"));

        let button = registry.capabilities("Button").unwrap();
        assert_eq!(button.default_tag.as_deref(), Some("button"));
        assert_eq!(
            button.props[0].when_expr.as_deref(),
            Some("node.props.tag == 'a'")
        );

        let policy = registry.component_policy("Button").unwrap();
        assert_eq!(policy.inspector["layout.overflow"].visible, Some(false));

        let hero = registry.template("hero").unwrap();
        assert!(hero.inspector.styles.permits("color"));
        assert!(!hero.inspector.styles.permits("width"));
    }
}

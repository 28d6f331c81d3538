// SPDX-License-Identifier: MIT

//! What a node may edit right now
//!
//! Combines the tag, global, component and template layers for one node
//! and editing mode. Broad layers add and deny; the component and template
//! layers can only narrow.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use super::styles::AllowedStyles;
use super::tag::resolve_tag;
use super::visibility::VisibilityTree;
use crate::stagecraft::model::Node;
use crate::stagecraft::policy::{InspectorFilter, Narrowing, PolicyRegistry, TagPolicy};
use crate::stagecraft::style::Declaration;

/// Editing mode of the inspector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InspectorMode {
    /// Every layer applies
    #[default]
    Standard,
    /// Editing a template: component overrides are bypassed
    Template,
    /// Component and template narrowing are bypassed; global and tag
    /// denies still hold
    Expert,
}

impl FromStr for InspectorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "template" => Ok(Self::Template),
            "expert" => Ok(Self::Expert),
            other => Err(format!("unknown inspector mode '{}'", other)),
        }
    }
}

impl InspectorMode {
    fn applies_component_policy(self) -> bool {
        self == InspectorMode::Standard
    }

    fn applies_template_filter(self) -> bool {
        self != InspectorMode::Expert
    }
}

/// Why a style patch entry was rejected
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleViolation {
    pub key: String,
    pub reason: String,
}

/// Resolved capabilities of one node
#[derive(Debug, Clone)]
pub struct Capabilities<'r> {
    tag: String,
    tag_policy: Option<&'r TagPolicy>,
    registry: &'r PolicyRegistry,
    allowed: AllowedStyles,
    visibility: VisibilityTree,
    template: Option<&'r InspectorFilter>,
}

/// Serializable summary for API responses
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityReport {
    pub tag: String,
    pub known_tag: bool,
    pub allowed_styles: AllowedStyles,
    pub visibility: VisibilityTree,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<String>>,
}

impl<'r> Capabilities<'r> {
    pub fn for_node(registry: &'r PolicyRegistry, node: &Node, mode: InspectorMode) -> Self {
        let tag = resolve_tag(registry, node);
        let tag_policy = registry.tag(&tag);

        let component_policy = registry
            .component_policy(&node.component)
            .filter(|_| mode.applies_component_policy());
        let template = node
            .template
            .as_deref()
            .and_then(|id| registry.template(id))
            .map(|t| &t.inspector)
            .filter(|_| mode.applies_template_filter());

        let mut narrowing: Vec<&Narrowing> = Vec::new();
        if let Some(styles) = component_policy.and_then(|p| p.styles.as_ref()) {
            narrowing.push(styles);
        }
        if let Some(filter) = template {
            narrowing.push(&filter.styles);
        }
        let allowed = AllowedStyles::resolve(registry, &tag, &narrowing);

        let mut visibility = VisibilityTree::seed(tag_policy);
        if let Some(policy) = component_policy {
            visibility.apply_overlay(&policy.inspector);
        }

        Self {
            tag,
            tag_policy,
            registry,
            allowed,
            visibility,
            template,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn allowed_styles(&self) -> &AllowedStyles {
        &self.allowed
    }

    pub fn visibility(&self) -> &VisibilityTree {
        &self.visibility
    }

    pub fn is_allowed(&self, style_key: &str) -> bool {
        self.allowed.is_allowed(style_key)
    }

    pub fn is_visible(&self, group: &str, control: &str) -> bool {
        self.visibility.is_visible(group, control)
    }

    /// Unknown tags show no sections
    pub fn is_section_allowed(&self, section: &str) -> bool {
        self.tag_policy
            .map_or(false, |t| t.allows_section(section))
    }

    pub fn allows_attribute(&self, attribute: &str) -> bool {
        self.tag_policy
            .map_or(false, |t| t.allows_attribute(attribute))
    }

    pub fn allows_event(&self, event: &str) -> bool {
        self.tag_policy.map_or(false, |t| t.allows_event(event))
    }

    pub fn allows_prop(&self, key: &str) -> bool {
        self.template.map_or(true, |f| f.props.permits(key))
    }

    /// Whether action steps of `kind` (`alert`, `http`, ...) may be added
    pub fn allows_action_kind(&self, kind: &str) -> bool {
        self.template.map_or(true, |f| f.actions.permits(kind))
    }

    /// Whether flow edges with target `kind` may be added
    pub fn allows_flow_kind(&self, kind: &str) -> bool {
        self.template.map_or(true, |f| f.flows.permits(kind))
    }

    /// Every patch entry that is not allowed or fails key metadata
    pub fn check_style_patch(&self, patch: &Declaration) -> Vec<StyleViolation> {
        patch
            .iter()
            .filter_map(|(key, value)| self.check_style(key, value))
            .collect()
    }

    fn check_style(&self, key: &str, value: &Value) -> Option<StyleViolation> {
        if !self.is_allowed(key) {
            return Some(StyleViolation {
                key: key.to_string(),
                reason: format!("style '{}' is not allowed on <{}>", key, self.tag),
            });
        }
        let meta = self.registry.style_meta(key)?;
        meta.validate(key, value).err().map(|e| StyleViolation {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn report(&self) -> CapabilityReport {
        CapabilityReport {
            tag: self.tag.clone(),
            known_tag: self.tag_policy.is_some(),
            allowed_styles: self.allowed.clone(),
            visibility: self.visibility.clone(),
            sections: self.tag_policy.and_then(|t| t.sections.clone()),
        }
    }
}

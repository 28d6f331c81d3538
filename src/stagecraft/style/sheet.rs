// SPDX-License-Identifier: MIT

//! Rule-sheet cascade
//!
//! A sheet is an ordered list of `(selector, conditions, declaration)`
//! rules. For a node and viewport, rules without a screen condition apply
//! first, then rules for that screen; within each pass later rules win.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::viewport::{as_declaration, merge_into, Declaration, BASE_VIEWPORT};
use crate::stagecraft::model::Node;

/// What a rule applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Selector {
    Node { id: String },
    Class { name: String },
    Component { id: String },
}

impl Selector {
    pub fn matches(&self, node: &Node) -> bool {
        match self {
            Selector::Node { id } => node.id == *id,
            Selector::Class { name } => node.classes.iter().any(|c| c == name),
            Selector::Component { id } => node.component == *id,
        }
    }
}

/// Conditions a rule is scoped to; absent means "any"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConditions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRule {
    pub id: String,
    /// Upsert key, `"<node id>:<viewport>"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub selector: Selector,
    #[serde(default)]
    pub when: RuleConditions,
    #[serde(default)]
    pub declaration: Value,
}

/// What a resolve call asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetQuery<'a> {
    pub viewport: &'a str,
    pub theme: Option<&'a str>,
    pub state: Option<&'a str>,
}

impl<'a> SheetQuery<'a> {
    pub fn viewport(viewport: &'a str) -> Self {
        Self {
            viewport,
            theme: None,
            state: None,
        }
    }
}

/// Breakdown key for rules without a screen condition
pub const ANY_SCREEN: &str = "*";

fn condition_holds(condition: &Option<String>, requested: Option<&str>) -> bool {
    match condition {
        None => true,
        Some(required) => requested == Some(required.as_str()),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleSheet {
    #[serde(default)]
    pub rules: Vec<StyleRule>,
}

impl StyleSheet {
    /// Rules whose selector matches `node`, in sheet order
    pub fn rules_for<'s>(&'s self, node: &'s Node) -> impl Iterator<Item = &'s StyleRule> + 's {
        self.rules.iter().filter(move |r| r.selector.matches(node))
    }

    /// Matching rules whose theme and state conditions hold
    fn applicable<'s>(
        &'s self,
        node: &'s Node,
        theme: Option<&'s str>,
        state: Option<&'s str>,
    ) -> impl Iterator<Item = &'s StyleRule> + 's {
        self.rules_for(node).filter(move |r| {
            condition_holds(&r.when.theme, theme) && condition_holds(&r.when.state, state)
        })
    }

    /// Cascaded declaration for `node` under `query`
    pub fn resolve(&self, node: &Node, query: SheetQuery<'_>) -> Declaration {
        let applicable: Vec<&StyleRule> =
            self.applicable(node, query.theme, query.state).collect();

        let mut effective = Declaration::new();
        for rule in applicable.iter().filter(|r| r.when.screen.is_none()) {
            merge_into(&mut effective, &as_declaration(Some(&rule.declaration)));
        }
        for rule in applicable
            .iter()
            .filter(|r| r.when.screen.as_deref() == Some(query.viewport))
        {
            merge_into(&mut effective, &as_declaration(Some(&rule.declaration)));
        }
        effective
    }

    /// Declarations per screen without cascading, for the given theme and
    /// state. Screen-less rules are reported under [`ANY_SCREEN`].
    pub fn breakdown(
        &self,
        node: &Node,
        theme: Option<&str>,
        state: Option<&str>,
    ) -> BTreeMap<String, Declaration> {
        let mut screens: BTreeMap<String, Declaration> = BTreeMap::new();
        for rule in self.applicable(node, theme, state) {
            let screen = rule
                .when
                .screen
                .clone()
                .unwrap_or_else(|| ANY_SCREEN.to_string());
            merge_into(
                screens.entry(screen).or_default(),
                &as_declaration(Some(&rule.declaration)),
            );
        }
        screens
    }

    /// Create or patch the rule for `(node_id, viewport)`.
    ///
    /// The base viewport (or `None`) maps to a screen-less rule. An existing
    /// rule has `patch` shallow-merged into its declaration.
    pub fn upsert(&mut self, node_id: &str, viewport: Option<&str>, patch: &Declaration) -> &StyleRule {
        let viewport = viewport.unwrap_or(BASE_VIEWPORT);
        let key = format!("{}:{}", node_id, viewport);

        let index = match self
            .rules
            .iter()
            .position(|r| r.key.as_deref() == Some(key.as_str()))
        {
            Some(index) => {
                let rule = &mut self.rules[index];
                let mut declaration = as_declaration(Some(&rule.declaration));
                merge_into(&mut declaration, patch);
                rule.declaration = Value::Object(declaration);
                index
            }
            None => {
                let screen = (viewport != BASE_VIEWPORT).then(|| viewport.to_string());
                self.rules.push(StyleRule {
                    id: uuid::Uuid::new_v4().to_string(),
                    key: Some(key),
                    selector: Selector::Node {
                        id: node_id.to_string(),
                    },
                    when: RuleConditions {
                        screen,
                        ..RuleConditions::default()
                    },
                    declaration: Value::Object(patch.clone()),
                });
                self.rules.len() - 1
            }
        };
        &self.rules[index]
    }

    /// Remove a rule by id; returns whether one was removed
    pub fn remove_rule(&mut self, id: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.id != id);
        self.rules.len() != before
    }
}

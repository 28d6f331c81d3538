// SPDX-License-Identifier: MIT

//! Builtin policy registry used when no policy file is configured

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

use super::types::{
    ComponentCapabilities, ComponentPolicy, GlobalStylePolicy, OverlayEntry, PolicyRegistry,
    PropSchema, StyleKeyMeta, StyleLists, StyleValueType, TagPolicy,
};

static BUILTIN: Lazy<PolicyRegistry> = Lazy::new(build);

/// The default registry, built once per process
pub fn builtin() -> &'static PolicyRegistry {
    &BUILTIN
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn groups(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
    entries
        .iter()
        .map(|(group, keys)| (group.to_string(), strings(keys)))
        .collect()
}

fn meta(value_type: StyleValueType) -> StyleKeyMeta {
    StyleKeyMeta {
        value_type,
        ..StyleKeyMeta::default()
    }
}

fn length(min: Option<f64>, keywords: &[&str]) -> StyleKeyMeta {
    StyleKeyMeta {
        value_type: StyleValueType::Length,
        units: strings(&["px", "%", "em", "rem", "vw", "vh"]),
        min,
        values: strings(keywords),
        ..StyleKeyMeta::default()
    }
}

fn keywords(values: &[&str]) -> StyleKeyMeta {
    StyleKeyMeta {
        value_type: StyleValueType::Enum,
        values: strings(values),
        ..StyleKeyMeta::default()
    }
}

const BOX: &[(&str, &[&str])] = &[
    ("spacing", &["margin", "padding", "gap"]),
    ("background", &["background", "backgroundColor"]),
    ("border", &["border", "borderRadius", "borderColor"]),
];

const TEXT: &[(&str, &[&str])] = &[
    ("typography", &["color", "fontSize", "fontWeight", "lineHeight", "textAlign"]),
    ("spacing", &["margin", "padding"]),
];

fn container(sections: &[&str]) -> TagPolicy {
    TagPolicy {
        sections: Some(strings(sections)),
        style_groups: groups(BOX),
        events: Some(strings(&["click", "mouseenter", "mouseleave"])),
        ..TagPolicy::default()
    }
}

fn text() -> TagPolicy {
    TagPolicy {
        sections: Some(strings(&["content", "style", "actions"])),
        style_groups: groups(TEXT),
        events: Some(strings(&["click"])),
        ..TagPolicy::default()
    }
}

fn build() -> PolicyRegistry {
    let mut styles = GlobalStylePolicy {
        allow: strings(&["width", "height", "display", "overflow", "opacity"]),
        deny: strings(&["behavior", "expression", "mozBinding"]),
        ..GlobalStylePolicy::default()
    };
    styles.per_tag.insert(
        "img".to_string(),
        StyleLists {
            allow: strings(&["objectFit"]),
            deny: strings(&["fontSize", "fontWeight"]),
        },
    );
    for key in ["width", "height", "minWidth", "maxWidth"] {
        styles
            .meta
            .insert(key.to_string(), length(Some(0.0), &["auto"]));
    }
    for key in ["margin", "padding", "gap", "fontSize", "lineHeight", "borderRadius"] {
        styles.meta.insert(key.to_string(), length(None, &[]));
    }
    for key in ["color", "backgroundColor", "borderColor"] {
        styles
            .meta
            .insert(key.to_string(), meta(StyleValueType::Color));
    }
    styles.meta.insert(
        "display".to_string(),
        keywords(&["block", "inline", "inline-block", "flex", "grid", "none"]),
    );
    styles.meta.insert(
        "overflow".to_string(),
        keywords(&["visible", "hidden", "scroll", "auto"]),
    );
    styles.meta.insert(
        "textAlign".to_string(),
        keywords(&["left", "center", "right", "justify"]),
    );
    styles.meta.insert(
        "objectFit".to_string(),
        keywords(&["contain", "cover", "fill", "none"]),
    );
    styles.meta.insert(
        "opacity".to_string(),
        StyleKeyMeta {
            value_type: StyleValueType::Number,
            min: Some(0.0),
            max: Some(1.0),
            ..StyleKeyMeta::default()
        },
    );
    styles.meta.insert(
        "fontWeight".to_string(),
        StyleKeyMeta {
            value_type: StyleValueType::Number,
            min: Some(100.0),
            max: Some(900.0),
            presets: strings(&["normal", "bold"]),
            ..StyleKeyMeta::default()
        },
    );

    let mut tags = BTreeMap::new();
    for tag in ["div", "section", "ul", "li"] {
        tags.insert(tag.to_string(), container(&["layout", "style", "actions"]));
    }
    for tag in ["span", "p", "h1", "h2", "h3"] {
        tags.insert(tag.to_string(), text());
    }
    tags.insert(
        "a".to_string(),
        TagPolicy {
            attributes: Some(strings(&["href", "target", "rel", "title"])),
            ..text()
        },
    );
    tags.insert(
        "button".to_string(),
        TagPolicy {
            sections: Some(strings(&["content", "style", "actions"])),
            style_groups: groups(&[
                ("typography", &["color", "fontSize", "fontWeight"]),
                ("background", &["backgroundColor"]),
                ("border", &["border", "borderRadius"]),
                ("spacing", &["padding"]),
            ]),
            attributes: Some(strings(&["type", "disabled", "title"])),
            events: Some(strings(&["click", "focus", "blur"])),
            ..TagPolicy::default()
        },
    );
    tags.insert(
        "img".to_string(),
        TagPolicy {
            sections: Some(strings(&["layout", "style"])),
            style_groups: groups(&[("border", &["border", "borderRadius"])]),
            styles: Some(StyleLists {
                allow: vec![],
                deny: strings(&["color"]),
            }),
            attributes: Some(strings(&["src", "alt", "loading"])),
            events: Some(strings(&["click", "load", "error"])),
        },
    );
    tags.insert(
        "input".to_string(),
        TagPolicy {
            sections: Some(strings(&["content", "style", "actions"])),
            style_groups: groups(&[
                ("typography", &["color", "fontSize"]),
                ("border", &["border", "borderRadius", "borderColor"]),
                ("spacing", &["padding"]),
            ]),
            attributes: Some(strings(&["type", "name", "placeholder", "value", "disabled"])),
            events: Some(strings(&["input", "change", "focus", "blur"])),
            ..TagPolicy::default()
        },
    );

    let mut components = BTreeMap::new();
    components.insert(
        "Container".to_string(),
        ComponentCapabilities {
            tags: strings(&["div", "section", "ul", "li"]),
            default_tag: Some("div".to_string()),
            can_have_children: true,
            props: vec![],
        },
    );
    components.insert(
        "Text".to_string(),
        ComponentCapabilities {
            tags: strings(&["span", "p", "h1", "h2", "h3"]),
            default_tag: Some("p".to_string()),
            can_have_children: false,
            props: vec![PropSchema {
                key: "text".to_string(),
                label: Some("Text".to_string()),
                ..PropSchema::default()
            }],
        },
    );
    components.insert(
        "Button".to_string(),
        ComponentCapabilities {
            tags: strings(&["button", "a"]),
            default_tag: Some("button".to_string()),
            can_have_children: false,
            props: vec![
                PropSchema {
                    key: "label".to_string(),
                    label: Some("Label".to_string()),
                    ..PropSchema::default()
                },
                PropSchema {
                    key: "href".to_string(),
                    label: Some("Link".to_string()),
                    when: Some(
                        [("tag".to_string(), serde_json::json!("a"))]
                            .into_iter()
                            .collect(),
                    ),
                    ..PropSchema::default()
                },
            ],
        },
    );
    components.insert(
        "Image".to_string(),
        ComponentCapabilities {
            tags: strings(&["img"]),
            default_tag: Some("img".to_string()),
            can_have_children: false,
            props: vec![
                PropSchema {
                    key: "src".to_string(),
                    label: Some("Source".to_string()),
                    ..PropSchema::default()
                },
                PropSchema {
                    key: "alt".to_string(),
                    label: Some("Alt text".to_string()),
                    when_expr: Some("node.props.decorative != true".to_string()),
                    ..PropSchema::default()
                },
            ],
        },
    );

    let mut component_policies = BTreeMap::new();
    component_policies.insert(
        "Image".to_string(),
        ComponentPolicy {
            inspector: [(
                "layout.overflow".to_string(),
                OverlayEntry {
                    visible: Some(false),
                },
            )]
            .into_iter()
            .collect(),
            styles: None,
        },
    );

    PolicyRegistry {
        styles,
        tags,
        components,
        component_policies,
        templates: BTreeMap::new(),
    }
}

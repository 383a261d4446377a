//! Menu Model
//!
//! Categories, menu items and the customization schema attached to an item.
//! The schema is a tagged union on the wire:
//!
//! ```json
//! [
//!   { "id": "size", "name": "Size", "type": "radio",
//!     "options": [{ "id": "small", "name": "Small", "price": -20 },
//!                 { "id": "large", "name": "Large", "price": 30 }] },
//!   { "id": "cheese", "name": "Extra cheese", "type": "checkbox", "price": 5 }
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Menu category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub shop_id: i64,
    pub name: String,
    pub sort_order: i32,
}

/// Menu item (with its customization schema)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub shop_id: i64,
    pub category_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    /// Base price in currency unit
    pub price: f64,
    pub is_available: bool,
    #[serde(default)]
    pub customization_options: Vec<CustomizationOption>,
}

/// A single choice inside a radio option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomizationChoice {
    pub id: String,
    pub name: String,
    /// Price delta in currency unit (may be negative)
    #[serde(rename = "price", default)]
    pub price_delta: f64,
}

/// Mutually exclusive choices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadioOption {
    pub id: String,
    pub name: String,
    #[serde(rename = "options", default)]
    pub choices: Vec<CustomizationChoice>,
}

/// Boolean add-on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckboxOption {
    pub id: String,
    pub name: String,
    /// Price delta in currency unit (may be negative)
    #[serde(rename = "price", default)]
    pub price_delta: f64,
}

/// Customization option declared on a menu item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CustomizationOption {
    Radio(RadioOption),
    Checkbox(CheckboxOption),
}

impl CustomizationOption {
    pub fn id(&self) -> &str {
        match self {
            Self::Radio(o) => &o.id,
            Self::Checkbox(o) => &o.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Radio(o) => &o.name,
            Self::Checkbox(o) => &o.name,
        }
    }
}

/// Customer selection: option id -> choice id (radio) or bool (checkbox).
///
/// `BTreeMap` keeps the key order stable, so the serialized form is canonical
/// and can be compared as a cart merge key.
pub type CustomizationSelection = BTreeMap<String, serde_json::Value>;

/// Check a customization schema before it is accepted.
///
/// Rejects duplicate option ids, radio options without choices, duplicate
/// choice ids within one radio option and non-finite price deltas.
pub fn validate_schema(options: &[CustomizationOption]) -> Result<(), String> {
    let mut seen = HashSet::new();
    for option in options {
        if option.id().trim().is_empty() {
            return Err("customization option id must not be empty".to_string());
        }
        if !seen.insert(option.id()) {
            return Err(format!("duplicate customization option id '{}'", option.id()));
        }
        match option {
            CustomizationOption::Radio(radio) => {
                if radio.choices.is_empty() {
                    return Err(format!("radio option '{}' has no choices", radio.id));
                }
                let mut choice_ids = HashSet::new();
                for choice in &radio.choices {
                    if !choice_ids.insert(choice.id.as_str()) {
                        return Err(format!(
                            "radio option '{}' has duplicate choice '{}'",
                            radio.id, choice.id
                        ));
                    }
                    if !choice.price_delta.is_finite() {
                        return Err(format!(
                            "choice '{}' of '{}' has a non-finite price",
                            choice.id, radio.id
                        ));
                    }
                }
            }
            CustomizationOption::Checkbox(checkbox) => {
                if !checkbox.price_delta.is_finite() {
                    return Err(format!(
                        "checkbox option '{}' has a non-finite price",
                        checkbox.id
                    ));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_wire_format() {
        let json = r#"[
            {"id":"size","name":"Size","type":"radio",
             "options":[{"id":"small","name":"Small","price":-20},{"id":"large","name":"Large","price":30}]},
            {"id":"cheese","name":"Cheese","type":"checkbox","price":5}
        ]"#;
        let options: Vec<CustomizationOption> = serde_json::from_str(json).unwrap();
        assert_eq!(options.len(), 2);
        match &options[0] {
            CustomizationOption::Radio(radio) => {
                assert_eq!(radio.choices[0].price_delta, -20.0);
                assert_eq!(radio.choices[1].id, "large");
            }
            other => panic!("expected radio, got {other:?}"),
        }
        assert!(matches!(
            &options[1],
            CustomizationOption::Checkbox(c) if c.price_delta == 5.0
        ));

        let back = serde_json::to_value(&options[1]).unwrap();
        assert_eq!(back["type"], "checkbox");
        assert_eq!(back["price"], 5.0);
    }

    #[test]
    fn test_unknown_option_type_rejected() {
        let json = r#"[{"id":"x","name":"X","type":"slider"}]"#;
        assert!(serde_json::from_str::<Vec<CustomizationOption>>(json).is_err());
    }

    #[test]
    fn test_validate_schema() {
        let radio = |id: &str, choices: Vec<&str>| {
            CustomizationOption::Radio(RadioOption {
                id: id.to_string(),
                name: id.to_string(),
                choices: choices
                    .into_iter()
                    .map(|c| CustomizationChoice {
                        id: c.to_string(),
                        name: c.to_string(),
                        price_delta: 0.0,
                    })
                    .collect(),
            })
        };

        assert!(validate_schema(&[radio("size", vec!["s", "l"])]).is_ok());
        assert!(validate_schema(&[radio("size", vec![])]).is_err());
        assert!(validate_schema(&[radio("size", vec!["s", "s"])]).is_err());
        assert!(validate_schema(&[radio("size", vec!["s"]), radio("size", vec!["l"])]).is_err());

        let nan = CustomizationOption::Checkbox(CheckboxOption {
            id: "x".to_string(),
            name: "X".to_string(),
            price_delta: f64::NAN,
        });
        assert!(validate_schema(&[nan]).is_err());
    }
}

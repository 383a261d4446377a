//! Customization pricing
//!
//! Pure functions over a menu item's option schema and a customer's
//! selection map (`option id -> choice id` for radio options,
//! `option id -> bool` for checkbox options).

use rust_decimal::Decimal;
use serde_json::Value;
use shared::models::{CustomizationOption, CustomizationSelection};

use super::{to_decimal, to_f64};

/// Price delta contributed by a selection, as Decimal
pub fn customization_delta(
    options: &[CustomizationOption],
    selection: &CustomizationSelection,
) -> Decimal {
    options
        .iter()
        .map(|option| match (option, selection.get(option.id())) {
            (CustomizationOption::Checkbox(checkbox), Some(Value::Bool(true))) => {
                to_decimal(checkbox.price_delta)
            }
            (CustomizationOption::Radio(radio), Some(Value::String(choice_id))) => radio
                .choices
                .iter()
                .find(|c| &c.id == choice_id)
                .map(|c| to_decimal(c.price_delta))
                .unwrap_or_default(),
            _ => Decimal::ZERO,
        })
        .sum()
}

/// Sum of the price deltas a selection adds to the base price.
///
/// Checked checkboxes add their delta, radio options add the delta of the
/// selected choice. Unknown option ids and choices not in the schema
/// contribute nothing.
pub fn customization_price(
    options: &[CustomizationOption],
    selection: &CustomizationSelection,
) -> f64 {
    to_f64(customization_delta(options, selection))
}

/// Whether every known option in the selection carries a well-typed value:
/// radio values must name a declared choice, checkbox values must be bool.
/// `null` counts as "not selected". Unknown option ids are ignored.
pub fn validate_selection(
    options: &[CustomizationOption],
    selection: &CustomizationSelection,
) -> bool {
    options.iter().all(|option| match selection.get(option.id()) {
        None | Some(Value::Null) => true,
        Some(value) => match option {
            CustomizationOption::Checkbox(_) => value.is_boolean(),
            CustomizationOption::Radio(radio) => value
                .as_str()
                .is_some_and(|id| radio.choices.iter().any(|c| c.id == id)),
        },
    })
}

/// `(base_price + customization_price) * quantity`
pub fn item_total(
    base_price: f64,
    quantity: i32,
    options: &[CustomizationOption],
    selection: &CustomizationSelection,
) -> f64 {
    let unit = to_decimal(base_price) + customization_delta(options, selection);
    to_f64(unit * Decimal::from(quantity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{CheckboxOption, CustomizationChoice, RadioOption};

    fn schema() -> Vec<CustomizationOption> {
        vec![
            CustomizationOption::Radio(RadioOption {
                id: "size".into(),
                name: "Size".into(),
                choices: vec![
                    CustomizationChoice {
                        id: "small".into(),
                        name: "Small".into(),
                        price_delta: -20.0,
                    },
                    CustomizationChoice {
                        id: "large".into(),
                        name: "Large".into(),
                        price_delta: 30.0,
                    },
                ],
            }),
            CustomizationOption::Checkbox(CheckboxOption {
                id: "cheese".into(),
                name: "Extra cheese".into(),
                price_delta: 5.5,
            }),
        ]
    }

    fn selection(json: &str) -> CustomizationSelection {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_radio_choice_price() {
        assert_eq!(customization_price(&schema(), &selection(r#"{"size":"large"}"#)), 30.0);
        assert_eq!(customization_price(&schema(), &selection(r#"{"size":"small"}"#)), -20.0);
    }

    #[test]
    fn test_missing_or_unknown_contributes_zero() {
        assert_eq!(customization_price(&schema(), &selection("{}")), 0.0);
        assert_eq!(customization_price(&schema(), &selection(r#"{"size":"huge"}"#)), 0.0);
        assert_eq!(customization_price(&schema(), &selection(r#"{"sauce":"bbq"}"#)), 0.0);
        assert_eq!(customization_price(&schema(), &selection(r#"{"cheese":false}"#)), 0.0);
    }

    #[test]
    fn test_combined_selection() {
        let sel = selection(r#"{"size":"large","cheese":true}"#);
        assert_eq!(customization_price(&schema(), &sel), 35.5);
        assert_eq!(item_total(100.0, 2, &schema(), &sel), 271.0);
        assert_eq!(item_total(100.0, 1, &[], &sel), 100.0);
    }

    #[test]
    fn test_validate_selection() {
        assert!(validate_selection(&schema(), &selection(r#"{"size":"small","cheese":true}"#)));
        assert!(validate_selection(&schema(), &selection(r#"{"size":null,"other":42}"#)));
        assert!(!validate_selection(&schema(), &selection(r#"{"size":"huge"}"#)));
        assert!(!validate_selection(&schema(), &selection(r#"{"size":3}"#)));
        assert!(!validate_selection(&schema(), &selection(r#"{"cheese":"yes"}"#)));
    }
}

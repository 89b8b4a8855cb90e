use super::order::{OrderType, Side};

// ==================================================
// ORDER FORM
// ==================================================

/// Entry state for one limit order.
///
/// Amounts stay as the user typed them; they are only coerced to numbers
/// when an order request is derived.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderForm {
    side: Side,
    base_amount: String,
    quote_amount: String,
    order_type: OrderType,
}

impl Default for OrderForm {
    fn default() -> Self {
        Self {
            side: Side::Buy,
            base_amount: "0".to_string(),
            quote_amount: "0".to_string(),
            order_type: OrderType::Limit,
        }
    }
}

impl OrderForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Quantity in base units, as typed.
    pub fn base_amount(&self) -> &str {
        &self.base_amount
    }

    /// Limit price in quote units, as typed.
    pub fn quote_amount(&self) -> &str {
        &self.quote_amount
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn is_post_only(&self) -> bool {
        self.order_type == OrderType::PostOnly
    }

    pub fn is_ioc(&self) -> bool {
        self.order_type == OrderType::ImmediateOrCancel
    }

    /// Amounts are kept across side changes.
    pub fn select_side(&mut self, side: Side) {
        self.side = side;
    }

    pub fn set_base_amount(&mut self, value: impl Into<String>) {
        self.base_amount = value.into();
    }

    pub fn set_quote_amount(&mut self, value: impl Into<String>) {
        self.quote_amount = value.into();
    }

    pub fn toggle_post_only(&mut self) {
        self.toggle(OrderType::PostOnly);
    }

    pub fn toggle_ioc(&mut self) {
        self.toggle(OrderType::ImmediateOrCancel);
    }

    fn toggle(&mut self, flag: OrderType) {
        self.order_type = if self.order_type == flag {
            OrderType::Limit
        } else {
            flag
        };
    }

    /// Limit price as a number, NaN when the field is not numeric.
    pub fn price(&self) -> f64 {
        coerce_amount(&self.quote_amount)
    }

    /// Order size as a number, NaN when the field is not numeric.
    pub fn size(&self) -> f64 {
        coerce_amount(&self.base_amount)
    }
}

/// Lenient numeric coercion of a text field. Surrounding whitespace is
/// ignored; empty or non-numeric text yields NaN instead of an error.
/// Unsigned `0x`, `0b` and `0o` literals are read in their radix.
pub fn coerce_amount(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if let Some(value) = radix_literal(trimmed) {
        return value;
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => {
            f64::NAN
        }
        _ => trimmed.parse::<f64>().unwrap_or(f64::NAN),
    }
}

fn radix_literal(text: &str) -> Option<f64> {
    let radix = match text.get(..2)? {
        "0x" | "0X" => 16,
        "0b" | "0B" => 2,
        "0o" | "0O" => 8,
        _ => return None,
    };
    let digits = &text[2..];
    if digits.is_empty() {
        return Some(f64::NAN);
    }
    let value = digits
        .chars()
        .try_fold(0f64, |acc, c| {
            c.to_digit(radix).map(|d| acc * radix as f64 + d as f64)
        })
        .unwrap_or(f64::NAN);
    Some(value)
}

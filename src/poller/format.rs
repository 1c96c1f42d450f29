//! Price and utterance formatting.

use serde::{Deserialize, Serialize};

/// Fixed two-decimal dollar string.
///
/// ```
/// use stock_speaker::poller::format_price;
///
/// assert_eq!(format_price(123.4), "$123.40");
/// assert_eq!(format_price(0.005), "$0.01");
/// ```
pub fn format_price(price: f64) -> String {
    format!("${price:.2}")
}

/// Per-digit "read this digit" switches, in display order.
///
/// Digits past the end of the mask are read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DigitMask(Vec<bool>);

impl DigitMask {
    pub fn new(selected: Vec<bool>) -> Self {
        Self(selected)
    }

    /// Whether the `index`-th digit is read.
    pub fn selects(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(true)
    }

    /// Flip digit `index`, growing the mask if needed.
    pub fn toggle(&mut self, index: usize) {
        if index >= self.0.len() {
            self.0.resize(index + 1, true);
        }
        self.0[index] = !self.0[index];
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }
}

/// Text to speak for a displayed price.
///
/// Without a mask, or when the mask keeps every digit, the display string is
/// spoken verbatim.  Otherwise only the selected digits are spoken, one by
/// one, separated by spaces; an empty result means there is nothing to say.
///
/// ```
/// use stock_speaker::poller::{format_utterance, DigitMask};
///
/// assert_eq!(format_utterance("$123.40", None), "$123.40");
///
/// let mask = DigitMask::new(vec![false, false, true, true, true]);
/// assert_eq!(format_utterance("$123.40", Some(&mask)), "3 4 0");
/// ```
pub fn format_utterance(display: &str, mask: Option<&DigitMask>) -> String {
    let Some(mask) = mask else {
        return display.to_string();
    };

    let digits: Vec<char> = display.chars().filter(char::is_ascii_digit).collect();
    if (0..digits.len()).all(|i| mask.selects(i)) {
        return display.to_string();
    }

    digits
        .iter()
        .enumerate()
        .filter(|(i, _)| mask.selects(*i))
        .map(|(_, d)| d.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

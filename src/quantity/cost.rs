use crate::quantity::round_to;

quantity!(
    /// Amount of money in euros.
    Cost,
    "EUR"
);

impl Cost {
    #[must_use]
    pub fn round_to_cents(self) -> Self {
        Self(round_to(self.0, 2))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_round_to_cents() {
        assert_abs_diff_eq!(Cost(1.234).round_to_cents().0, 1.23);
        assert_abs_diff_eq!(Cost(7.5).round_to_cents().0, 7.5);
        assert_abs_diff_eq!(Cost(2.675).round_to_cents().0, 2.67);
    }
}

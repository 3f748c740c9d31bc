use rust_decimal::Decimal;

/// Pricing constants applied to every cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartPricing {
    /// Applied to the subtotal, result is not rounded
    pub tax_rate: Decimal,
    /// Subtotals at or above this ship free
    pub free_shipping_threshold: Decimal,
    pub flat_shipping: Decimal,
}

impl Default for CartPricing {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(7, 2),
            free_shipping_threshold: Decimal::new(1000, 0),
            flat_shipping: Decimal::new(4999, 2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl CartPricing {
    /// Totals for `(unit price, quantity)` lines. Arithmetic saturates at
    /// `Decimal::MAX` instead of overflowing.
    pub fn totals<I>(&self, lines: I) -> CartTotals
    where
        I: IntoIterator<Item = (Decimal, i32)>,
    {
        let mut line_count = 0usize;
        let subtotal: Decimal = lines
            .into_iter()
            .inspect(|_| line_count += 1)
            .map(|(price, quantity)| price.saturating_mul(Decimal::from(quantity)))
            .fold(Decimal::ZERO, Decimal::saturating_add);

        let tax = subtotal.saturating_mul(self.tax_rate);
        let shipping = if line_count == 0 || subtotal >= self.free_shipping_threshold {
            Decimal::ZERO
        } else {
            self.flat_shipping
        };

        CartTotals {
            subtotal,
            tax,
            shipping,
            total: subtotal.saturating_add(tax).saturating_add(shipping),
        }
    }
}

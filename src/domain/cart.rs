use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    Category, OrderDraft, OrderLine, OrderStatus, PaymentMethod, PickupTime, ValidationError,
    checkout::normalize_notes,
};

/// Upper bound for the quantity of a single product in one cart.
pub const MAX_LINE_QUANTITY: i32 = 20;

/// Product values copied into a cart line when it is added.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSnapshot {
    pub product_id: Uuid,
    pub name: String,
    pub price: i64,
    pub category: Category,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub product: ProductSnapshot,
    pub quantity: i32,
}

impl CartLine {
    pub fn product_id(&self) -> Uuid {
        self.product.product_id
    }

    pub fn subtotal(&self) -> Option<i64> {
        self.product.price.checked_mul(i64::from(self.quantity))
    }
}

/// A shopping cart keyed by product, in the order lines were first added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a cart from stored lines. Duplicate products are merged.
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Self {
        let mut cart = Cart::new();
        for line in lines {
            match cart.position(line.product_id()) {
                Some(idx) => cart.lines[idx].quantity += line.quantity,
                None => cart.lines.push(line),
            }
        }
        cart
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, product_id: Uuid) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id() == product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    fn position(&self, product_id: Uuid) -> Option<usize> {
        self.lines.iter().position(|l| l.product_id() == product_id)
    }

    /// Adds `quantity` of a product, merging into an existing line.
    ///
    /// A merge that would push the line past [`MAX_LINE_QUANTITY`] is
    /// rejected and leaves the line as it was.
    pub fn add_line(
        &mut self,
        product: ProductSnapshot,
        quantity: i32,
    ) -> Result<&CartLine, ValidationError> {
        if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
            return Err(ValidationError::InvalidQuantity(quantity));
        }

        let idx = match self.position(product.product_id) {
            Some(idx) => {
                let line = &mut self.lines[idx];
                let merged = line.quantity + quantity;
                if merged > MAX_LINE_QUANTITY {
                    return Err(ValidationError::QuantityLimitExceeded {
                        current: line.quantity,
                        requested: quantity,
                    });
                }
                line.quantity = merged;
                idx
            }
            None => {
                self.lines.push(CartLine { product, quantity });
                self.lines.len() - 1
            }
        };
        Ok(&self.lines[idx])
    }

    pub fn remove_line(&mut self, product_id: Uuid) -> Option<CartLine> {
        let idx = self.position(product_id)?;
        Some(self.lines.remove(idx))
    }

    /// Sets a line's quantity, clamped to `1..=20` and to `stock` when known.
    /// Returns the quantity actually stored.
    pub fn set_quantity(
        &mut self,
        product_id: Uuid,
        quantity: i32,
        stock: Option<i32>,
    ) -> Result<i32, ValidationError> {
        let idx = self
            .position(product_id)
            .ok_or(ValidationError::LineNotFound(product_id))?;

        let mut effective = quantity.clamp(1, MAX_LINE_QUANTITY);
        if let Some(stock) = stock {
            if stock < 1 {
                return Err(ValidationError::OutOfStock(product_id));
            }
            effective = effective.min(stock);
        }
        self.lines[idx].quantity = effective;
        Ok(effective)
    }

    /// Replaces a line's snapshot with current catalog values.
    /// Returns false when the product is not in the cart.
    pub fn refresh_snapshot(&mut self, product: ProductSnapshot) -> bool {
        match self.position(product.product_id) {
            Some(idx) => {
                self.lines[idx].product = product;
                true
            }
            None => false,
        }
    }

    pub fn total(&self) -> Result<i64, ValidationError> {
        self.lines.iter().try_fold(0i64, |acc, line| {
            line.subtotal()
                .and_then(|s| acc.checked_add(s))
                .ok_or(ValidationError::TotalOverflow)
        })
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Turns the cart into an order draft and empties it.
    ///
    /// On any validation failure the cart is left untouched.
    pub fn checkout(
        &mut self,
        payment_method: Option<PaymentMethod>,
        pickup_time: Option<PickupTime>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<OrderDraft, ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyCart);
        }
        let payment_method = payment_method.ok_or(ValidationError::MissingPaymentMethod)?;
        let pickup_time = pickup_time.ok_or(ValidationError::MissingPickupTime)?;
        if let PickupTime::At(at) = pickup_time {
            if at < now {
                return Err(ValidationError::PickupInPast);
            }
        }
        let notes = normalize_notes(notes)?;
        let total_amount = self.total()?;

        let lines = self
            .lines
            .drain(..)
            .map(|line| OrderLine {
                product_id: line.product.product_id,
                name: line.product.name,
                category: line.product.category,
                image: line.product.image,
                quantity: line.quantity,
                price: line.product.price,
            })
            .collect();

        Ok(OrderDraft {
            lines,
            total_amount,
            status: OrderStatus::Pending,
            payment_method,
            pickup_time,
            notes,
            placed_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn snapshot(name: &str, price: i64, category: Category) -> ProductSnapshot {
        ProductSnapshot {
            product_id: Uuid::new_v4(),
            name: name.to_string(),
            price,
            category,
            image: Some(format!("/images/{}.jpg", name.to_lowercase())),
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 4, 0, 0).unwrap()
    }

    #[test]
    fn adding_same_product_merges_quantities() {
        let mut cart = Cart::new();
        let burger = snapshot("Burger", 6000, Category::Food);
        cart.add_line(burger.clone(), 7).unwrap();
        let line = cart.add_line(burger.clone(), 13).unwrap();
        assert_eq!(line.quantity, 20);
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn merge_past_limit_is_rejected_and_line_unchanged() {
        let mut cart = Cart::new();
        let burger = snapshot("Burger", 6000, Category::Food);
        cart.add_line(burger.clone(), 15).unwrap();
        let err = cart.add_line(burger.clone(), 6).unwrap_err();
        assert_eq!(
            err,
            ValidationError::QuantityLimitExceeded {
                current: 15,
                requested: 6
            }
        );
        assert_eq!(cart.line(burger.product_id).unwrap().quantity, 15);
    }

    #[test]
    fn add_rejects_out_of_range_quantities() {
        let mut cart = Cart::new();
        let fries = snapshot("Fries", 4500, Category::Snacks);
        assert_eq!(
            cart.add_line(fries.clone(), 0).unwrap_err(),
            ValidationError::InvalidQuantity(0)
        );
        assert_eq!(
            cart.add_line(fries, 21).unwrap_err(),
            ValidationError::InvalidQuantity(21)
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn set_quantity_clamps_to_stock_before_limit() {
        let mut cart = Cart::new();
        let rice = snapshot("Rice", 5000, Category::Food);
        cart.add_line(rice.clone(), 1).unwrap();

        assert_eq!(cart.set_quantity(rice.product_id, 25, Some(10)), Ok(10));
        assert_eq!(cart.set_quantity(rice.product_id, 25, None), Ok(20));
        assert_eq!(cart.set_quantity(rice.product_id, 0, Some(10)), Ok(1));
        assert_eq!(
            cart.set_quantity(rice.product_id, 3, Some(0)),
            Err(ValidationError::OutOfStock(rice.product_id))
        );
        assert_eq!(cart.line(rice.product_id).unwrap().quantity, 1);
    }

    #[test]
    fn set_quantity_on_missing_line_fails() {
        let mut cart = Cart::new();
        let id = Uuid::new_v4();
        assert_eq!(
            cart.set_quantity(id, 2, None),
            Err(ValidationError::LineNotFound(id))
        );
    }

    #[test]
    fn remove_line_deletes_only_that_product() {
        let mut cart = Cart::new();
        let a = snapshot("Burger", 6000, Category::Food);
        let b = snapshot("Coffee", 4500, Category::Beverages);
        cart.add_line(a.clone(), 1).unwrap();
        cart.add_line(b.clone(), 1).unwrap();

        let removed = cart.remove_line(a.product_id).unwrap();
        assert_eq!(removed.product.name, "Burger");
        assert!(cart.remove_line(a.product_id).is_none());
        assert_eq!(cart.len(), 1);
        assert!(cart.line(b.product_id).is_some());
    }

    #[test]
    fn burger_and_coffee_checkout_totals_165() {
        let mut cart = Cart::new();
        cart.add_line(snapshot("Burger", 6000, Category::Food), 2).unwrap();
        cart.add_line(snapshot("Coffee", 4500, Category::Beverages), 1).unwrap();

        let order = cart
            .checkout(
                Some(PaymentMethod::Cash),
                Some(PickupTime::Now),
                None,
                noon(),
            )
            .unwrap();

        assert_eq!(order.total_amount, 16500);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.lines[0].name, "Burger");
        assert_eq!(order.lines[0].quantity, 2);
        assert!(cart.is_empty());
    }

    #[test]
    fn checkout_total_is_sum_of_line_subtotals() {
        let mut cart = Cart::new();
        let prices = [(1999, 3), (4550, 1), (1, 20), (12345, 7)];
        for (i, (price, qty)) in prices.iter().enumerate() {
            cart.add_line(snapshot(&format!("Item{i}"), *price, Category::Others), *qty)
                .unwrap();
        }
        let order = cart
            .checkout(Some(PaymentMethod::GCash), Some(PickupTime::Now), None, noon())
            .unwrap();
        let expected: i64 = order.lines.iter().map(|l| l.price * l.quantity as i64).sum();
        assert_eq!(order.total_amount, expected);
        assert_eq!(expected, 1999 * 3 + 4550 + 20 + 12345 * 7);
    }

    #[test]
    fn checkout_requires_payment_and_pickup() {
        let mut cart = Cart::new();
        cart.add_line(snapshot("Burger", 6000, Category::Food), 1).unwrap();

        assert_eq!(
            cart.checkout(None, Some(PickupTime::Now), None, noon()),
            Err(ValidationError::MissingPaymentMethod)
        );
        assert_eq!(
            cart.checkout(Some(PaymentMethod::Maya), None, None, noon()),
            Err(ValidationError::MissingPickupTime)
        );
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn checkout_rejects_empty_cart_past_pickup_and_long_notes() {
        let mut empty = Cart::new();
        assert_eq!(
            empty.checkout(Some(PaymentMethod::Cash), Some(PickupTime::Now), None, noon()),
            Err(ValidationError::EmptyCart)
        );

        let mut cart = Cart::new();
        cart.add_line(snapshot("Burger", 6000, Category::Food), 1).unwrap();
        let past = PickupTime::At(noon() - Duration::minutes(1));
        assert_eq!(
            cart.checkout(Some(PaymentMethod::Cash), Some(past), None, noon()),
            Err(ValidationError::PickupInPast)
        );
        assert_eq!(
            cart.checkout(
                Some(PaymentMethod::Cash),
                Some(PickupTime::Now),
                Some("x".repeat(501)),
                noon()
            ),
            Err(ValidationError::NotesTooLong(501))
        );
        assert_eq!(cart.len(), 1);

        let scheduled = PickupTime::At(noon() + Duration::hours(1));
        let order = cart
            .checkout(Some(PaymentMethod::Cash), Some(scheduled), Some("extra rice".into()), noon())
            .unwrap();
        assert_eq!(order.pickup_time, scheduled);
        assert_eq!(order.notes.as_deref(), Some("extra rice"));
    }

    #[test]
    fn refresh_snapshot_uses_current_price() {
        let mut cart = Cart::new();
        let mut burger = snapshot("Burger", 6000, Category::Food);
        cart.add_line(burger.clone(), 2).unwrap();

        burger.price = 6500;
        assert!(cart.refresh_snapshot(burger.clone()));
        assert_eq!(cart.total(), Ok(13000));
        assert!(!cart.refresh_snapshot(snapshot("Other", 1, Category::Others)));
    }

    #[test]
    fn from_lines_merges_duplicates() {
        let burger = snapshot("Burger", 6000, Category::Food);
        let cart = Cart::from_lines([
            CartLine { product: burger.clone(), quantity: 2 },
            CartLine { product: burger.clone(), quantity: 3 },
        ]);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.line(burger.product_id).unwrap().quantity, 5);
    }
}

//! Shopping cart aggregate
//!
//! A cart is an ordered list of lines, at most one per product. Mutations
//! enforce the product stock and never leave a line with a quantity below one.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CartError;
use crate::models::{Deal, Product};
use crate::pricing::{self, CartTotals, DealClock};

/// One product in the cart with its quantity and the deal it was added under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// `None` when the persisted line refers to a product that no longer resolves
    #[serde(default)]
    pub product: Option<Product>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default, alias = "dealInfo")]
    pub deal_info: Option<Deal>,
}

impl CartLine {
    pub fn product_id(&self) -> Option<i64> {
        self.product.as_ref().map(|p| p.id)
    }
}

/// Outcome of a decrement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    Updated(i64),
    Removed,
}

/// Ordered cart lines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cart from persisted lines, merging duplicates and dropping empty lines
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            if line.quantity <= 0 {
                continue;
            }
            match line
                .product_id()
                .and_then(|id| cart.position(id))
            {
                Some(idx) => {
                    let merged = &mut cart.lines[idx].quantity;
                    *merged = merged.saturating_add(line.quantity);
                }
                None => cart.lines.push(line),
            }
        }
        cart
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn quantity_of(&self, product_id: i64) -> i64 {
        self.position(product_id)
            .map(|idx| self.lines[idx].quantity)
            .unwrap_or(0)
    }

    fn position(&self, product_id: i64) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| line.product_id() == Some(product_id))
    }

    /// Add `quantity` units of a product, merging with an existing line
    ///
    /// A deal passed here replaces the one stored on an existing line.
    pub fn add(&mut self, product: Product, quantity: i64, deal: Option<Deal>) -> Result<i64, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        if !product.in_stock() {
            warn!(product_id = product.id, "Rejected add of out-of-stock product");
            return Err(CartError::OutOfStock(product.id));
        }

        let current = self.quantity_of(product.id);
        // Overflow is necessarily beyond any stock level
        let wanted = current.checked_add(quantity).unwrap_or(i64::MAX);
        if wanted > product.stock_quantity {
            warn!(
                product_id = product.id,
                wanted,
                available = product.stock_quantity,
                "Rejected add beyond stock"
            );
            return Err(CartError::StockExceeded {
                product_id: product.id,
                available: product.stock_quantity,
            });
        }

        match self.position(product.id) {
            Some(idx) => {
                let line = &mut self.lines[idx];
                line.quantity = wanted;
                if deal.is_some() {
                    line.deal_info = deal;
                }
                line.product = Some(product);
            }
            None => self.lines.push(CartLine {
                product: Some(product),
                quantity,
                deal_info: deal,
            }),
        }

        debug!(quantity = wanted, "Cart line updated");
        Ok(wanted)
    }

    /// Raise a line by one unit, bounded by the stock of the stored product
    pub fn increment(&mut self, product_id: i64) -> Result<i64, CartError> {
        let idx = self.position(product_id).ok_or(CartError::NotInCart(product_id))?;
        let line = &mut self.lines[idx];
        let available = line.product.as_ref().map(|p| p.stock_quantity).unwrap_or(0);

        if line.quantity >= available {
            warn!(product_id, available, "Rejected increment beyond stock");
            return Err(CartError::StockExceeded { product_id, available });
        }

        line.quantity += 1;
        Ok(line.quantity)
    }

    /// Lower a line by one unit; a line at one unit is removed
    pub fn decrement(&mut self, product_id: i64) -> Result<QuantityChange, CartError> {
        let idx = self.position(product_id).ok_or(CartError::NotInCart(product_id))?;

        if self.lines[idx].quantity <= 1 {
            self.lines.remove(idx);
            return Ok(QuantityChange::Removed);
        }

        self.lines[idx].quantity -= 1;
        Ok(QuantityChange::Updated(self.lines[idx].quantity))
    }

    /// Set a line to an exact quantity; zero removes the line
    pub fn set_quantity(&mut self, product_id: i64, quantity: i64) -> Result<QuantityChange, CartError> {
        if quantity < 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let idx = self.position(product_id).ok_or(CartError::NotInCart(product_id))?;
        if quantity == 0 {
            self.lines.remove(idx);
            return Ok(QuantityChange::Removed);
        }

        let available = self.lines[idx]
            .product
            .as_ref()
            .map(|p| p.stock_quantity)
            .unwrap_or(0);
        if quantity > available {
            return Err(CartError::StockExceeded { product_id, available });
        }

        self.lines[idx].quantity = quantity;
        Ok(QuantityChange::Updated(quantity))
    }

    /// Remove a product's line; removing an absent product is a no-op
    pub fn remove(&mut self, product_id: i64) -> bool {
        match self.position(product_id) {
            Some(idx) => {
                self.lines.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Refresh stored deals from the current deal list
    ///
    /// Lines keep their stored deal when it is still active; otherwise the best
    /// active deal covering the product is attached, or none.
    pub fn attach_deals(&mut self, deals: &[Deal], clock: &DealClock) {
        for line in &mut self.lines {
            let Some(product_id) = line.product_id() else {
                continue;
            };
            let stored_active = line
                .deal_info
                .as_ref()
                .is_some_and(|deal| clock.is_active(deal) && deal.covers(product_id));
            if !stored_active {
                line.deal_info = pricing::best_deal_for(product_id, deals, clock).cloned();
            }
        }
    }

    /// Replace stored products with fresh catalog copies
    ///
    /// Lines whose product is gone are kept with `product: None` so the caller
    /// can report them; they contribute nothing to totals.
    pub fn refresh_products(&mut self, catalog: &[Product]) {
        for line in &mut self.lines {
            if let Some(id) = line.product_id() {
                line.product = catalog.iter().find(|p| p.id == id).cloned();
            }
        }
    }

    pub fn totals(&self, clock: &DealClock) -> CartTotals {
        pricing::cart_totals(&self.lines, clock)
    }
}

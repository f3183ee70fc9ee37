use super::money::{Money, Price};
use super::offering::Offering;
use crate::error::CartError;

/// One selected route in the cart.
///
/// Price and seat ceiling are frozen when the line is created; later catalog
/// changes do not reach it. `1 <= quantity <= seats_available_snapshot`
/// holds for every line the store hands out.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    id: String,
    price_snapshot: Price,
    seats_available_snapshot: u32,
    quantity: u32,
    route: String,
    departure_date: String,
    departure_clock: String,
    operator: String,
}

impl CartLine {
    fn from_offering(offering: &Offering) -> Self {
        Self {
            id: offering.id.clone(),
            price_snapshot: offering.price_per_seat,
            seats_available_snapshot: offering.seats_available,
            quantity: 1,
            route: offering.route_label(),
            departure_date: offering.departure_date().to_string(),
            departure_clock: offering.departure_clock().to_string(),
            operator: offering.operator.clone(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn price_snapshot(&self) -> Price {
        self.price_snapshot
    }

    pub fn seats_available_snapshot(&self) -> u32 {
        self.seats_available_snapshot
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn departure_date(&self) -> &str {
        &self.departure_date
    }

    pub fn departure_clock(&self) -> &str {
        &self.departure_clock
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    pub fn subtotal(&self) -> Money {
        self.price_snapshot * self.quantity
    }

    pub fn is_at_capacity(&self) -> bool {
        self.quantity >= self.seats_available_snapshot
    }
}

/// What an `add_line` call did. Ignoring it gives the silent no-op contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Incremented,
    AtCapacity,
    OutOfStock,
}

impl AddOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, AddOutcome::Added | AddOutcome::Incremented)
    }
}

/// Subtotal, flat service fee and grand total for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderSummary {
    pub items: u64,
    pub subtotal: Money,
    pub service_fee: Money,
    pub total: Money,
}

/// The session's cart.
///
/// An owned value: whoever holds it (usually a `BookingSession`) is the only
/// mutator. Every mutation path clamps quantities to the seat snapshot, so
/// the invariants on [`CartLine`] cannot be broken from outside.
#[derive(Debug, Clone, Default)]
pub struct CartStore {
    lines: Vec<CartLine>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one seat of `offering`.
    ///
    /// A new id starts at quantity 1. An existing line grows by one only
    /// while it is below its seat snapshot; otherwise nothing changes.
    /// Sold-out offerings are never inserted.
    pub fn add_line(&mut self, offering: &Offering) -> AddOutcome {
        if let Some(line) = self.line_mut(&offering.id) {
            if line.quantity < line.seats_available_snapshot {
                line.quantity += 1;
                return AddOutcome::Incremented;
            }
            return AddOutcome::AtCapacity;
        }

        if offering.is_sold_out() {
            return AddOutcome::OutOfStock;
        }

        self.lines.push(CartLine::from_offering(offering));
        AddOutcome::Added
    }

    /// Like [`add_line`](Self::add_line) but reports the rejected cases as errors.
    pub fn try_add_line(&mut self, offering: &Offering) -> Result<AddOutcome, CartError> {
        match self.add_line(offering) {
            AddOutcome::OutOfStock => Err(CartError::OutOfStock {
                id: offering.id.clone(),
            }),
            AddOutcome::AtCapacity => Err(CartError::MaxQuantityReached {
                id: offering.id.clone(),
                available: self
                    .line(&offering.id)
                    .map_or(offering.seats_available, CartLine::seats_available_snapshot),
            }),
            outcome => Ok(outcome),
        }
    }

    /// Removes the line for `id`. Returns whether a line was removed.
    pub fn remove_line(&mut self, id: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.id != id);
        self.lines.len() != before
    }

    /// Sets the quantity for `id`, clamped to the line's seat snapshot.
    ///
    /// `n <= 0` removes the line. Returns the resulting quantity, or `None`
    /// when the line is gone (or never existed).
    pub fn set_quantity(&mut self, id: &str, n: i64) -> Option<u32> {
        if n <= 0 {
            self.remove_line(id);
            return None;
        }

        let line = self.line_mut(id)?;
        let requested = u32::try_from(n).unwrap_or(u32::MAX);
        line.quantity = requested.min(line.seats_available_snapshot);
        Some(line.quantity)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn total_items(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    pub fn total_price(&self) -> Money {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    pub fn summary(&self, service_fee: Money) -> OrderSummary {
        let subtotal = self.total_price();
        OrderSummary {
            items: self.total_items(),
            subtotal,
            service_fee,
            total: subtotal + service_fee,
        }
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.id == id)
    }

    /// Quantity currently selected for `id`, 0 when not in the cart.
    pub fn quantity_of(&self, id: &str) -> u32 {
        self.line(id).map_or(0, CartLine::quantity)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn line_mut(&mut self, id: &str) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| line.id == id)
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use farmlink_core::{
    Aggregate, AggregateId, AggregateRoot, DomainError, DomainResult, Money, Quantity, Unit,
    UserId,
};
use farmlink_events::Event;
use farmlink_products::{LotId, PriceSchedule, ProduceLot};

/// Order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub AggregateId);

impl OrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Order status lifecycle.
///
/// ```text
/// placed ──accept──► accepted ──fulfill──► fulfilled
///    │                   │
///    └──────cancel───────┴──────────────► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Placed,
    Accepted,
    Fulfilled,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Fulfilled | OrderStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Placed => "placed",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Fulfilled => "fulfilled",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate root: Order.
///
/// Quantity and prices are frozen at placement; afterwards only the status and
/// the pickup logistics change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    lot_id: Option<LotId>,
    buyer_id: Option<UserId>,
    farmer_id: Option<UserId>,
    produce_name: String,
    requested_quantity: Quantity,
    resolved_unit_price: Money,
    total_price: Money,
    status: OrderStatus,
    created_at: Option<DateTime<Utc>>,
    pickup_date: Option<NaiveDate>,
    pickup_location: String,
    version: u64,
    created: bool,
}

impl Order {
    /// Create an empty, not-yet-placed aggregate instance.
    pub fn empty(id: OrderId) -> Self {
        Self {
            id,
            lot_id: None,
            buyer_id: None,
            farmer_id: None,
            produce_name: String::new(),
            requested_quantity: Quantity::zero(Unit::Lbs),
            resolved_unit_price: Money::ZERO,
            total_price: Money::ZERO,
            status: OrderStatus::Placed,
            created_at: None,
            pickup_date: None,
            pickup_location: String::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn lot_id(&self) -> Option<LotId> {
        self.lot_id
    }

    pub fn buyer_id(&self) -> Option<UserId> {
        self.buyer_id
    }

    pub fn farmer_id(&self) -> Option<UserId> {
        self.farmer_id
    }

    pub fn produce_name(&self) -> &str {
        &self.produce_name
    }

    pub fn requested_quantity(&self) -> Quantity {
        self.requested_quantity
    }

    pub fn resolved_unit_price(&self) -> Money {
        self.resolved_unit_price
    }

    pub fn total_price(&self) -> Money {
        self.total_price
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn pickup_date(&self) -> Option<NaiveDate> {
        self.pickup_date
    }

    pub fn pickup_location(&self) -> &str {
        &self.pickup_location
    }

    pub fn is_placed(&self) -> bool {
        self.created
    }

    /// `placed` or `accepted`: still holding a ledger reservation.
    pub fn is_open(&self) -> bool {
        self.created && !self.status.is_terminal()
    }

    /// Lot, buyer and farmer of a placed order.
    pub fn parties(&self) -> DomainResult<(LotId, UserId, UserId)> {
        match (self.created, self.lot_id, self.buyer_id, self.farmer_id) {
            (true, Some(lot), Some(buyer), Some(farmer)) => Ok((lot, buyer, farmer)),
            _ => Err(DomainError::not_found()),
        }
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: PlaceOrder.
///
/// Carries the lot's unit and schedule as they were when the buyer ordered;
/// the resolved price is frozen from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub order_id: OrderId,
    pub lot_id: LotId,
    pub buyer_id: UserId,
    pub farmer_id: UserId,
    pub produce_name: String,
    pub unit: Unit,
    pub schedule: PriceSchedule,
    pub requested_quantity: Decimal,
    pub pickup_date: NaiveDate,
    pub pickup_location: String,
    pub occurred_at: DateTime<Utc>,
}

impl PlaceOrder {
    /// Build a placement against a live lot.
    pub fn against(
        lot: &ProduceLot,
        order_id: OrderId,
        buyer_id: UserId,
        requested_quantity: Decimal,
        pickup_date: NaiveDate,
        pickup_location: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            order_id,
            lot_id: lot.id_typed(),
            buyer_id,
            farmer_id: lot.owner()?,
            produce_name: lot.name().to_string(),
            unit: lot.unit(),
            schedule: lot.price_schedule()?.clone(),
            requested_quantity,
            pickup_date,
            pickup_location: pickup_location.into(),
            occurred_at,
        })
    }
}

/// Command: AcceptOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptOrder {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: FulfillOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillOrder {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrder {
    pub order_id: OrderId,
    pub cancelled_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReschedulePickup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReschedulePickup {
    pub order_id: OrderId,
    pub pickup_date: NaiveDate,
    pub pickup_location: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderCommand {
    PlaceOrder(PlaceOrder),
    AcceptOrder(AcceptOrder),
    FulfillOrder(FulfillOrder),
    CancelOrder(CancelOrder),
    ReschedulePickup(ReschedulePickup),
}

/// Event: OrderPlaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub order_id: OrderId,
    pub lot_id: LotId,
    pub buyer_id: UserId,
    pub farmer_id: UserId,
    pub produce_name: String,
    pub quantity: Quantity,
    pub unit_price: Money,
    pub total_price: Money,
    pub pickup_date: NaiveDate,
    pub pickup_location: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderAccepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAccepted {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderFulfilled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFulfilled {
    pub order_id: OrderId,
    pub quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub order_id: OrderId,
    pub cancelled_by: UserId,
    pub released: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PickupRescheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupRescheduled {
    pub order_id: OrderId,
    pub pickup_date: NaiveDate,
    pub pickup_location: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    OrderPlaced(OrderPlaced),
    OrderAccepted(OrderAccepted),
    OrderFulfilled(OrderFulfilled),
    OrderCancelled(OrderCancelled),
    PickupRescheduled(PickupRescheduled),
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced(_) => "sales.order.placed",
            OrderEvent::OrderAccepted(_) => "sales.order.accepted",
            OrderEvent::OrderFulfilled(_) => "sales.order.fulfilled",
            OrderEvent::OrderCancelled(_) => "sales.order.cancelled",
            OrderEvent::PickupRescheduled(_) => "sales.order.pickup_rescheduled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderPlaced(e) => e.occurred_at,
            OrderEvent::OrderAccepted(e) => e.occurred_at,
            OrderEvent::OrderFulfilled(e) => e.occurred_at,
            OrderEvent::OrderCancelled(e) => e.occurred_at,
            OrderEvent::PickupRescheduled(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Order {
    type Command = OrderCommand;
    type Event = OrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            OrderEvent::OrderPlaced(e) => {
                self.id = e.order_id;
                self.lot_id = Some(e.lot_id);
                self.buyer_id = Some(e.buyer_id);
                self.farmer_id = Some(e.farmer_id);
                self.produce_name = e.produce_name.clone();
                self.requested_quantity = e.quantity;
                self.resolved_unit_price = e.unit_price;
                self.total_price = e.total_price;
                self.status = OrderStatus::Placed;
                self.created_at = Some(e.occurred_at);
                self.pickup_date = Some(e.pickup_date);
                self.pickup_location = e.pickup_location.clone();
                self.created = true;
            }
            OrderEvent::OrderAccepted(_) => {
                self.status = OrderStatus::Accepted;
            }
            OrderEvent::OrderFulfilled(_) => {
                self.status = OrderStatus::Fulfilled;
            }
            OrderEvent::OrderCancelled(_) => {
                self.status = OrderStatus::Cancelled;
            }
            OrderEvent::PickupRescheduled(e) => {
                self.pickup_date = Some(e.pickup_date);
                self.pickup_location = e.pickup_location.clone();
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::PlaceOrder(cmd) => self.handle_place(cmd),
            OrderCommand::AcceptOrder(cmd) => self.handle_accept(cmd),
            OrderCommand::FulfillOrder(cmd) => self.handle_fulfill(cmd),
            OrderCommand::CancelOrder(cmd) => self.handle_cancel(cmd),
            OrderCommand::ReschedulePickup(cmd) => self.handle_reschedule(cmd),
        }
    }
}

impl Order {
    fn ensure_order_id(&self, order_id: OrderId) -> Result<(), DomainError> {
        if self.id != order_id {
            return Err(DomainError::invariant("order_id mismatch"));
        }
        Ok(())
    }

    fn ensure_placed(&self, order_id: OrderId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_order_id(order_id)
    }

    fn transition_error(&self, action: &str) -> DomainError {
        DomainError::invalid_transition(self.status.as_str(), action)
    }

    fn handle_place(&self, cmd: &PlaceOrder) -> Result<Vec<OrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("order already exists"));
        }
        self.ensure_order_id(cmd.order_id)?;

        let quantity = Quantity::new(cmd.requested_quantity, cmd.unit)?;
        if quantity.is_zero() {
            return Err(DomainError::validation("requested quantity must be positive"));
        }
        let pickup_location = validate_pickup(
            cmd.pickup_date,
            &cmd.pickup_location,
            cmd.occurred_at,
        )?;
        let quote = cmd.schedule.quote(&quantity)?;

        Ok(vec![OrderEvent::OrderPlaced(OrderPlaced {
            order_id: cmd.order_id,
            lot_id: cmd.lot_id,
            buyer_id: cmd.buyer_id,
            farmer_id: cmd.farmer_id,
            produce_name: cmd.produce_name.clone(),
            quantity,
            unit_price: quote.unit_price,
            total_price: quote.total,
            pickup_date: cmd.pickup_date,
            pickup_location,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_accept(&self, cmd: &AcceptOrder) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_placed(cmd.order_id)?;

        if self.status != OrderStatus::Placed {
            return Err(self.transition_error("accept"));
        }

        Ok(vec![OrderEvent::OrderAccepted(OrderAccepted {
            order_id: cmd.order_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_fulfill(&self, cmd: &FulfillOrder) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_placed(cmd.order_id)?;

        if self.status != OrderStatus::Accepted {
            return Err(self.transition_error("fulfill"));
        }

        Ok(vec![OrderEvent::OrderFulfilled(OrderFulfilled {
            order_id: cmd.order_id,
            quantity: self.requested_quantity,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelOrder) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_placed(cmd.order_id)?;

        if self.status.is_terminal() {
            return Err(self.transition_error("cancel"));
        }

        Ok(vec![OrderEvent::OrderCancelled(OrderCancelled {
            order_id: cmd.order_id,
            cancelled_by: cmd.cancelled_by,
            released: self.requested_quantity,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reschedule(&self, cmd: &ReschedulePickup) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_placed(cmd.order_id)?;

        if self.status.is_terminal() {
            return Err(self.transition_error("reschedule"));
        }
        let pickup_location =
            validate_pickup(cmd.pickup_date, &cmd.pickup_location, cmd.occurred_at)?;

        Ok(vec![OrderEvent::PickupRescheduled(PickupRescheduled {
            order_id: cmd.order_id,
            pickup_date: cmd.pickup_date,
            pickup_location,
            occurred_at: cmd.occurred_at,
        })])
    }
}

fn validate_pickup(
    pickup_date: NaiveDate,
    pickup_location: &str,
    now: DateTime<Utc>,
) -> Result<String, DomainError> {
    let location = pickup_location.trim();
    if location.is_empty() {
        return Err(DomainError::validation("pickup location cannot be empty"));
    }
    if pickup_date < now.date_naive() {
        return Err(DomainError::validation(format!(
            "pickup date {pickup_date} is in the past"
        )));
    }
    Ok(location.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use farmlink_products::PriceTier;
    use rust_decimal_macros::dec;

    fn test_order_id() -> OrderId {
        OrderId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn tomorrow() -> NaiveDate {
        (Utc::now() + Duration::days(1)).date_naive()
    }

    fn schedule() -> PriceSchedule {
        PriceSchedule::validate(vec![
            PriceTier::new(1, Money::new(dec!(10)).unwrap()),
            PriceTier::new(10, Money::new(dec!(8)).unwrap()),
            PriceTier::new(50, Money::new(dec!(6)).unwrap()),
        ])
        .unwrap()
    }

    fn place_cmd(order_id: OrderId, unit: Unit, qty: Decimal) -> PlaceOrder {
        PlaceOrder {
            order_id,
            lot_id: LotId::new(AggregateId::new()),
            buyer_id: UserId::new(),
            farmer_id: UserId::new(),
            produce_name: "Butter Lettuce".to_string(),
            unit,
            schedule: schedule(),
            requested_quantity: qty,
            pickup_date: tomorrow(),
            pickup_location: "North gate".to_string(),
            occurred_at: test_time(),
        }
    }

    fn placed_order(qty: Decimal) -> Order {
        let order_id = test_order_id();
        let mut order = Order::empty(order_id);
        order
            .execute(&OrderCommand::PlaceOrder(place_cmd(order_id, Unit::Heads, qty)))
            .unwrap();
        order
    }

    fn accept(order: &mut Order) -> DomainResult<Vec<OrderEvent>> {
        let order_id = order.id_typed();
        order.execute(&OrderCommand::AcceptOrder(AcceptOrder {
            order_id,
            occurred_at: test_time(),
        }))
    }

    fn fulfill(order: &mut Order) -> DomainResult<Vec<OrderEvent>> {
        let order_id = order.id_typed();
        order.execute(&OrderCommand::FulfillOrder(FulfillOrder {
            order_id,
            occurred_at: test_time(),
        }))
    }

    fn cancel(order: &mut Order) -> DomainResult<Vec<OrderEvent>> {
        let order_id = order.id_typed();
        order.execute(&OrderCommand::CancelOrder(CancelOrder {
            order_id,
            cancelled_by: UserId::new(),
            occurred_at: test_time(),
        }))
    }

    #[test]
    fn place_freezes_tier_price_and_total() {
        let order = placed_order(dec!(12));
        assert_eq!(order.status(), OrderStatus::Placed);
        assert_eq!(order.resolved_unit_price().amount(), dec!(8));
        assert_eq!(order.total_price().amount(), dec!(96));
        assert_eq!(order.requested_quantity().unit(), Unit::Heads);
        assert!(order.is_open());
    }

    #[test]
    fn place_rejects_fractional_heads() {
        let order_id = test_order_id();
        let order = Order::empty(order_id);
        let err = order
            .handle(&OrderCommand::PlaceOrder(place_cmd(order_id, Unit::Heads, dec!(1.5))))
            .unwrap_err();
        assert!(matches!(err, DomainError::FractionalQuantityNotAllowed { .. }));
    }

    #[test]
    fn place_rejects_quantity_below_floor() {
        let order_id = test_order_id();
        let order = Order::empty(order_id);
        let err = order
            .handle(&OrderCommand::PlaceOrder(place_cmd(order_id, Unit::Lbs, dec!(0.5))))
            .unwrap_err();
        assert!(matches!(err, DomainError::NoApplicableTier { floor: 1, .. }));
    }

    #[test]
    fn place_rejects_zero_quantity_and_blank_location() {
        let order_id = test_order_id();
        let order = Order::empty(order_id);
        let err = order
            .handle(&OrderCommand::PlaceOrder(place_cmd(order_id, Unit::Lbs, dec!(0))))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let mut cmd = place_cmd(order_id, Unit::Lbs, dec!(3));
        cmd.pickup_location = "  ".to_string();
        let err = order.handle(&OrderCommand::PlaceOrder(cmd)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn place_rejects_pickup_in_the_past() {
        let order_id = test_order_id();
        let order = Order::empty(order_id);
        let mut cmd = place_cmd(order_id, Unit::Lbs, dec!(3));
        cmd.pickup_date = (Utc::now() - Duration::days(2)).date_naive();
        let err = order.handle(&OrderCommand::PlaceOrder(cmd)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn happy_path_placed_accepted_fulfilled() {
        let mut order = placed_order(dec!(5));
        accept(&mut order).unwrap();
        assert_eq!(order.status(), OrderStatus::Accepted);

        let events = fulfill(&mut order).unwrap();
        assert_eq!(order.status(), OrderStatus::Fulfilled);
        assert!(!order.is_open());
        match &events[0] {
            OrderEvent::OrderFulfilled(e) => assert_eq!(e.quantity.value(), dec!(5)),
            _ => panic!("Expected OrderFulfilled event"),
        }
    }

    #[test]
    fn fulfill_requires_acceptance() {
        let mut order = placed_order(dec!(5));
        let err = fulfill(&mut order).unwrap_err();
        assert_eq!(err, DomainError::invalid_transition("placed", "fulfill"));
    }

    #[test]
    fn cancel_allowed_from_placed_and_accepted() {
        let mut placed = placed_order(dec!(5));
        let events = cancel(&mut placed).unwrap();
        match &events[0] {
            OrderEvent::OrderCancelled(e) => assert_eq!(e.released.value(), dec!(5)),
            _ => panic!("Expected OrderCancelled event"),
        }

        let mut accepted = placed_order(dec!(5));
        accept(&mut accepted).unwrap();
        cancel(&mut accepted).unwrap();
        assert_eq!(accepted.status(), OrderStatus::Cancelled);
    }

    #[test]
    fn cancel_after_fulfill_is_invalid() {
        let mut order = placed_order(dec!(5));
        accept(&mut order).unwrap();
        fulfill(&mut order).unwrap();
        let before = order.clone();

        let err = cancel(&mut order).unwrap_err();
        assert_eq!(err, DomainError::invalid_transition("fulfilled", "cancel"));
        assert_eq!(order, before);
    }

    #[test]
    fn terminal_states_reject_every_transition() {
        let mut order = placed_order(dec!(5));
        cancel(&mut order).unwrap();

        assert!(matches!(cancel(&mut order), Err(DomainError::InvalidTransition { .. })));
        assert!(matches!(accept(&mut order), Err(DomainError::InvalidTransition { .. })));
        assert!(matches!(fulfill(&mut order), Err(DomainError::InvalidTransition { .. })));
    }

    #[test]
    fn reschedule_changes_only_logistics() {
        let mut order = placed_order(dec!(5));
        let price = order.total_price();
        let order_id = order.id_typed();
        let new_date = tomorrow() + Duration::days(3);

        order
            .execute(&OrderCommand::ReschedulePickup(ReschedulePickup {
                order_id,
                pickup_date: new_date,
                pickup_location: " Farm stand ".to_string(),
                occurred_at: test_time(),
            }))
            .unwrap();

        assert_eq!(order.pickup_date(), Some(new_date));
        assert_eq!(order.pickup_location(), "Farm stand");
        assert_eq!(order.total_price(), price);
        assert_eq!(order.status(), OrderStatus::Placed);
    }

    #[test]
    fn transitions_on_unplaced_order_are_not_found() {
        let mut order = Order::empty(test_order_id());
        assert_eq!(accept(&mut order).unwrap_err(), DomainError::NotFound);
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 300,
                ..ProptestConfig::default()
            })]

            /// Property: the frozen total equals the tier price times quantity.
            #[test]
            fn total_is_tier_price_times_quantity(qty in 1u32..500) {
                let order = placed_order(Decimal::from(qty));
                let expected = schedule()
                    .compute_total(&Quantity::new(Decimal::from(qty), Unit::Heads).unwrap())
                    .unwrap();
                prop_assert_eq!(order.total_price(), expected);
            }
        }
    }
}

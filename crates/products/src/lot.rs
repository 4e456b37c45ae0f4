use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use farmlink_core::{
    Aggregate, AggregateId, AggregateRoot, DomainError, DomainResult, Quantity, Unit, UserId,
};
use farmlink_events::Event;

use crate::schedule::{PriceSchedule, PriceTier};

/// Produce lot identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LotId(pub AggregateId);

impl LotId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for LotId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Aggregate root: ProduceLot.
///
/// `available_quantity` is the lot's nominal stock. How much of it is still
/// orderable is tracked by the inventory ledger, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProduceLot {
    id: LotId,
    owner_id: Option<UserId>,
    name: String,
    unit: Unit,
    available_quantity: Quantity,
    schedule: Option<PriceSchedule>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
    removed: bool,
}

impl ProduceLot {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: LotId) -> Self {
        Self {
            id,
            owner_id: None,
            name: String::new(),
            unit: Unit::Lbs,
            available_quantity: Quantity::zero(Unit::Lbs),
            schedule: None,
            created_at: None,
            updated_at: None,
            version: 0,
            created: false,
            removed: false,
        }
    }

    pub fn id_typed(&self) -> LotId {
        self.id
    }

    pub fn owner_id(&self) -> Option<UserId> {
        self.owner_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn available_quantity(&self) -> Quantity {
        self.available_quantity
    }

    pub fn schedule(&self) -> Option<&PriceSchedule> {
        self.schedule.as_ref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn is_live(&self) -> bool {
        self.created && !self.removed
    }

    /// Owner of a live lot.
    pub fn owner(&self) -> DomainResult<UserId> {
        self.ensure_live()?;
        self.owner_id.ok_or_else(DomainError::not_found)
    }

    /// Price schedule of a live lot.
    pub fn price_schedule(&self) -> DomainResult<&PriceSchedule> {
        self.ensure_live()?;
        self.schedule.as_ref().ok_or_else(DomainError::not_found)
    }

    /// Interpret a raw amount in this lot's unit.
    pub fn quantity_of(&self, value: Decimal) -> DomainResult<Quantity> {
        Quantity::new(value, self.unit)
    }
}

impl AggregateRoot for ProduceLot {
    type Id = LotId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateLot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateLot {
    pub lot_id: LotId,
    pub owner_id: UserId,
    pub name: String,
    pub unit: Unit,
    pub available_quantity: Decimal,
    /// Candidate tiers in any order; validated and sorted on creation.
    pub tiers: Vec<PriceTier>,
    pub occurred_at: DateTime<Utc>,
}

/// Fields a farmer may change on a lot. `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotPatch {
    pub name: Option<String>,
    pub unit: Option<Unit>,
    pub available_quantity: Option<Decimal>,
    /// Replaces the whole schedule (no merging with existing tiers).
    pub tiers: Option<Vec<PriceTier>>,
}

impl LotPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.unit.is_none()
            && self.available_quantity.is_none()
            && self.tiers.is_none()
    }
}

/// Command: UpdateLot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateLot {
    pub lot_id: LotId,
    pub patch: LotPatch,
    /// Orders still `placed` or `accepted` against this lot.
    pub open_orders: usize,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DrawDownStock (a reservation was fulfilled).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawDownStock {
    pub lot_id: LotId,
    pub quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveLot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveLot {
    pub lot_id: LotId,
    pub open_orders: usize,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LotCommand {
    CreateLot(CreateLot),
    UpdateLot(UpdateLot),
    DrawDownStock(DrawDownStock),
    RemoveLot(RemoveLot),
}

/// Event: LotCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotCreated {
    pub lot_id: LotId,
    pub owner_id: UserId,
    pub name: String,
    pub available_quantity: Quantity,
    pub schedule: PriceSchedule,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LotUpdated (carries the full post-update listing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotUpdated {
    pub lot_id: LotId,
    pub name: String,
    pub available_quantity: Quantity,
    pub schedule: PriceSchedule,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockDrawnDown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDrawnDown {
    pub lot_id: LotId,
    pub quantity: Quantity,
    pub remaining: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LotRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotRemoved {
    pub lot_id: LotId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LotEvent {
    LotCreated(LotCreated),
    LotUpdated(LotUpdated),
    StockDrawnDown(StockDrawnDown),
    LotRemoved(LotRemoved),
}

impl Event for LotEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LotEvent::LotCreated(_) => "products.lot.created",
            LotEvent::LotUpdated(_) => "products.lot.updated",
            LotEvent::StockDrawnDown(_) => "products.lot.stock_drawn_down",
            LotEvent::LotRemoved(_) => "products.lot.removed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LotEvent::LotCreated(e) => e.occurred_at,
            LotEvent::LotUpdated(e) => e.occurred_at,
            LotEvent::StockDrawnDown(e) => e.occurred_at,
            LotEvent::LotRemoved(e) => e.occurred_at,
        }
    }
}

impl Aggregate for ProduceLot {
    type Command = LotCommand;
    type Event = LotEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            LotEvent::LotCreated(e) => {
                self.id = e.lot_id;
                self.owner_id = Some(e.owner_id);
                self.name = e.name.clone();
                self.unit = e.available_quantity.unit();
                self.available_quantity = e.available_quantity;
                self.schedule = Some(e.schedule.clone());
                self.created_at = Some(e.occurred_at);
                self.updated_at = Some(e.occurred_at);
                self.created = true;
            }
            LotEvent::LotUpdated(e) => {
                self.name = e.name.clone();
                self.unit = e.available_quantity.unit();
                self.available_quantity = e.available_quantity;
                self.schedule = Some(e.schedule.clone());
                self.updated_at = Some(e.occurred_at);
            }
            LotEvent::StockDrawnDown(e) => {
                self.available_quantity = e.remaining;
                self.updated_at = Some(e.occurred_at);
            }
            LotEvent::LotRemoved(e) => {
                self.removed = true;
                self.updated_at = Some(e.occurred_at);
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            LotCommand::CreateLot(cmd) => self.handle_create(cmd),
            LotCommand::UpdateLot(cmd) => self.handle_update(cmd),
            LotCommand::DrawDownStock(cmd) => self.handle_draw_down(cmd),
            LotCommand::RemoveLot(cmd) => self.handle_remove(cmd),
        }
    }
}

impl ProduceLot {
    fn ensure_live(&self) -> Result<(), DomainError> {
        if !self.is_live() {
            return Err(DomainError::not_found());
        }
        Ok(())
    }

    fn ensure_lot_id(&self, lot_id: LotId) -> Result<(), DomainError> {
        if self.id != lot_id {
            return Err(DomainError::invariant("lot_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateLot) -> Result<Vec<LotEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("lot already exists"));
        }
        self.ensure_lot_id(cmd.lot_id)?;

        let name = validate_name(&cmd.name)?;
        let available_quantity = Quantity::new(cmd.available_quantity, cmd.unit)?;
        let schedule = PriceSchedule::validate(cmd.tiers.iter().copied())?;

        Ok(vec![LotEvent::LotCreated(LotCreated {
            lot_id: cmd.lot_id,
            owner_id: cmd.owner_id,
            name,
            available_quantity,
            schedule,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(&self, cmd: &UpdateLot) -> Result<Vec<LotEvent>, DomainError> {
        self.ensure_live()?;
        self.ensure_lot_id(cmd.lot_id)?;

        let patch = &cmd.patch;
        if patch.is_empty() {
            return Err(DomainError::validation("update must change at least one field"));
        }

        let unit = patch.unit.unwrap_or(self.unit);
        if unit != self.unit && cmd.open_orders > 0 {
            // Open orders were priced and reserved in the old unit.
            return Err(DomainError::LotInUse {
                open_orders: cmd.open_orders,
            });
        }

        let name = match &patch.name {
            Some(name) => validate_name(name)?,
            None => self.name.clone(),
        };
        let raw_quantity = patch
            .available_quantity
            .unwrap_or(self.available_quantity.value());
        let available_quantity = Quantity::new(raw_quantity, unit)?;
        let schedule = match &patch.tiers {
            Some(tiers) => PriceSchedule::validate(tiers.iter().copied())?,
            None => self.price_schedule()?.clone(),
        };

        Ok(vec![LotEvent::LotUpdated(LotUpdated {
            lot_id: cmd.lot_id,
            name,
            available_quantity,
            schedule,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_draw_down(&self, cmd: &DrawDownStock) -> Result<Vec<LotEvent>, DomainError> {
        self.ensure_live()?;
        self.ensure_lot_id(cmd.lot_id)?;

        if cmd.quantity.is_zero() {
            return Err(DomainError::validation("draw-down quantity must be positive"));
        }
        cmd.quantity.ensure_unit(self.unit)?;

        let remaining = self.available_quantity.checked_sub(&cmd.quantity).map_err(|_| {
            DomainError::InsufficientQuantity {
                requested: cmd.quantity.value(),
                available: self.available_quantity.value(),
            }
        })?;

        Ok(vec![LotEvent::StockDrawnDown(StockDrawnDown {
            lot_id: cmd.lot_id,
            quantity: cmd.quantity,
            remaining,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove(&self, cmd: &RemoveLot) -> Result<Vec<LotEvent>, DomainError> {
        self.ensure_live()?;
        self.ensure_lot_id(cmd.lot_id)?;

        if cmd.open_orders > 0 {
            return Err(DomainError::LotInUse {
                open_orders: cmd.open_orders,
            });
        }

        Ok(vec![LotEvent::LotRemoved(LotRemoved {
            lot_id: cmd.lot_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

fn validate_name(name: &str) -> Result<String, DomainError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(trimmed.to_string())
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use farmlink_core::{Aggregate, AggregateRoot, DomainError, Quantity};
use farmlink_events::Event;
use farmlink_products::LotId;

/// Aggregate root: LedgerEntry (one per produce lot).
///
/// ```text
/// ┌──────────────────────── total ────────────────────────┐
/// ┌──── reserved (open orders) ────┬──── available ───────┐
/// ```
///
/// Invariant: `0 <= reserved <= total`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    lot_id: LotId,
    total: Quantity,
    reserved: Quantity,
    version: u64,
    opened: bool,
}

impl LedgerEntry {
    /// Create an empty, not-yet-opened ledger entry.
    pub fn empty(lot_id: LotId) -> Self {
        let total = Quantity::zero(farmlink_core::Unit::Lbs);
        Self {
            lot_id,
            total,
            reserved: total,
            version: 0,
            opened: false,
        }
    }

    pub fn lot_id(&self) -> LotId {
        self.lot_id
    }

    pub fn total(&self) -> Quantity {
        self.total
    }

    pub fn reserved(&self) -> Quantity {
        self.reserved
    }

    /// Quantity currently orderable: `total - reserved`.
    pub fn available(&self) -> Quantity {
        // Invariant guarantees this never goes negative.
        self.total
            .checked_sub(&self.reserved)
            .unwrap_or_else(|_| Quantity::zero(self.total.unit()))
    }

    pub fn is_open(&self) -> bool {
        self.opened
    }
}

impl AggregateRoot for LedgerEntry {
    type Id = LotId;

    fn id(&self) -> &Self::Id {
        &self.lot_id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: OpenLedger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenLedger {
    pub lot_id: LotId,
    pub total: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Reserve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reserve {
    pub lot_id: LotId,
    pub quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Release (an order was cancelled).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub lot_id: LotId,
    pub quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Commit (an order was fulfilled).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub lot_id: LotId,
    pub quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AdjustTotal (the farmer restocked or corrected the lot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustTotal {
    pub lot_id: LotId,
    pub total: Quantity,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerCommand {
    OpenLedger(OpenLedger),
    Reserve(Reserve),
    Release(Release),
    Commit(Commit),
    AdjustTotal(AdjustTotal),
}

/// Event: LedgerOpened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerOpened {
    pub lot_id: LotId,
    pub total: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Event: QuantityReserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityReserved {
    pub lot_id: LotId,
    pub quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ReservationReleased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationReleased {
    pub lot_id: LotId,
    pub quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ReservationCommitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationCommitted {
    pub lot_id: LotId,
    pub quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TotalAdjusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalAdjusted {
    pub lot_id: LotId,
    pub total: Quantity,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    LedgerOpened(LedgerOpened),
    QuantityReserved(QuantityReserved),
    ReservationReleased(ReservationReleased),
    ReservationCommitted(ReservationCommitted),
    TotalAdjusted(TotalAdjusted),
}

impl Event for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::LedgerOpened(_) => "inventory.ledger.opened",
            LedgerEvent::QuantityReserved(_) => "inventory.ledger.reserved",
            LedgerEvent::ReservationReleased(_) => "inventory.ledger.released",
            LedgerEvent::ReservationCommitted(_) => "inventory.ledger.committed",
            LedgerEvent::TotalAdjusted(_) => "inventory.ledger.total_adjusted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LedgerEvent::LedgerOpened(e) => e.occurred_at,
            LedgerEvent::QuantityReserved(e) => e.occurred_at,
            LedgerEvent::ReservationReleased(e) => e.occurred_at,
            LedgerEvent::ReservationCommitted(e) => e.occurred_at,
            LedgerEvent::TotalAdjusted(e) => e.occurred_at,
        }
    }
}

impl Aggregate for LedgerEntry {
    type Command = LedgerCommand;
    type Event = LedgerEvent;
    type Error = DomainError;

    // Quantities in events were validated by `handle`; the fallbacks below
    // only guard replays of foreign data.
    fn apply(&mut self, event: &Self::Event) {
        match event {
            LedgerEvent::LedgerOpened(e) => {
                self.lot_id = e.lot_id;
                self.total = e.total;
                self.reserved = Quantity::zero(e.total.unit());
                self.opened = true;
            }
            LedgerEvent::QuantityReserved(e) => {
                self.reserved = self.reserved.checked_add(&e.quantity).unwrap_or(self.reserved);
            }
            LedgerEvent::ReservationReleased(e) => {
                self.reserved = self.reserved.checked_sub(&e.quantity).unwrap_or(self.reserved);
            }
            LedgerEvent::ReservationCommitted(e) => {
                self.reserved = self.reserved.checked_sub(&e.quantity).unwrap_or(self.reserved);
                self.total = self.total.checked_sub(&e.quantity).unwrap_or(self.total);
            }
            LedgerEvent::TotalAdjusted(e) => {
                if e.total.unit() != self.reserved.unit() {
                    self.reserved = Quantity::zero(e.total.unit());
                }
                self.total = e.total;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            LedgerCommand::OpenLedger(cmd) => self.handle_open(cmd),
            LedgerCommand::Reserve(cmd) => self.handle_reserve(cmd),
            LedgerCommand::Release(cmd) => self.handle_release(cmd),
            LedgerCommand::Commit(cmd) => self.handle_commit(cmd),
            LedgerCommand::AdjustTotal(cmd) => self.handle_adjust(cmd),
        }
    }
}

impl LedgerEntry {
    fn ensure_open(&self, lot_id: LotId) -> Result<(), DomainError> {
        if !self.opened {
            return Err(DomainError::not_found());
        }
        if self.lot_id != lot_id {
            return Err(DomainError::invariant("lot_id mismatch"));
        }
        Ok(())
    }

    fn ensure_positive(quantity: &Quantity) -> Result<(), DomainError> {
        if quantity.is_zero() {
            return Err(DomainError::validation("quantity must be positive"));
        }
        Ok(())
    }

    fn handle_open(&self, cmd: &OpenLedger) -> Result<Vec<LedgerEvent>, DomainError> {
        if self.opened {
            return Err(DomainError::conflict("ledger already open for this lot"));
        }
        if self.lot_id != cmd.lot_id {
            return Err(DomainError::invariant("lot_id mismatch"));
        }

        Ok(vec![LedgerEvent::LedgerOpened(LedgerOpened {
            lot_id: cmd.lot_id,
            total: cmd.total,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reserve(&self, cmd: &Reserve) -> Result<Vec<LedgerEvent>, DomainError> {
        self.ensure_open(cmd.lot_id)?;
        Self::ensure_positive(&cmd.quantity)?;
        cmd.quantity.ensure_unit(self.total.unit())?;

        let available = self.available();
        if cmd.quantity.value() > available.value() {
            return Err(DomainError::InsufficientQuantity {
                requested: cmd.quantity.value(),
                available: available.value(),
            });
        }

        Ok(vec![LedgerEvent::QuantityReserved(QuantityReserved {
            lot_id: cmd.lot_id,
            quantity: cmd.quantity,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_release(&self, cmd: &Release) -> Result<Vec<LedgerEvent>, DomainError> {
        self.ensure_open(cmd.lot_id)?;
        Self::ensure_positive(&cmd.quantity)?;
        cmd.quantity.ensure_unit(self.total.unit())?;

        if cmd.quantity.value() > self.reserved.value() {
            return Err(DomainError::invariant(format!(
                "cannot release {} with only {} reserved",
                cmd.quantity, self.reserved
            )));
        }

        Ok(vec![LedgerEvent::ReservationReleased(ReservationReleased {
            lot_id: cmd.lot_id,
            quantity: cmd.quantity,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_commit(&self, cmd: &Commit) -> Result<Vec<LedgerEvent>, DomainError> {
        self.ensure_open(cmd.lot_id)?;
        Self::ensure_positive(&cmd.quantity)?;
        cmd.quantity.ensure_unit(self.total.unit())?;

        if cmd.quantity.value() > self.reserved.value() {
            return Err(DomainError::invariant(format!(
                "cannot commit {} with only {} reserved",
                cmd.quantity, self.reserved
            )));
        }

        Ok(vec![LedgerEvent::ReservationCommitted(ReservationCommitted {
            lot_id: cmd.lot_id,
            quantity: cmd.quantity,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_adjust(&self, cmd: &AdjustTotal) -> Result<Vec<LedgerEvent>, DomainError> {
        self.ensure_open(cmd.lot_id)?;

        if cmd.total.unit() != self.total.unit() && !self.reserved.is_zero() {
            return Err(DomainError::validation(format!(
                "cannot change unit while {} is reserved",
                self.reserved
            )));
        }
        if cmd.total.unit() == self.reserved.unit() && cmd.total.value() < self.reserved.value() {
            return Err(DomainError::validation(format!(
                "available quantity cannot drop below the {} already reserved",
                self.reserved
            )));
        }

        Ok(vec![LedgerEvent::TotalAdjusted(TotalAdjusted {
            lot_id: cmd.lot_id,
            total: cmd.total,
            occurred_at: cmd.occurred_at,
        })])
    }
}

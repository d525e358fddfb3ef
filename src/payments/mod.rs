pub mod ledger;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{PoolError, Result};
use crate::events::Event;
use crate::types::{ConfirmingParty, MemberId, PaymentCategory, PaymentId, PaymentStatus, VehicleId};

pub use ledger::{LedgerAggregator, LedgerEntry, VehicleLedgerSummary};

/// request to record a payment made by a member towards a vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPayment {
    pub payer: MemberId,
    pub vehicle_id: VehicleId,
    pub amount: Money,
    pub category: PaymentCategory,
}

impl RecordPayment {
    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_positive() {
            return Err(PoolError::InvalidPaymentAmount { amount: self.amount });
        }
        Ok(())
    }
}

/// a payment that settles only once driver and owner both confirm it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub payer: MemberId,
    pub vehicle_id: VehicleId,
    pub amount: Money,
    pub category: PaymentCategory,
    pub driver_confirmed: bool,
    pub owner_confirmed: bool,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn new(
        payer: MemberId,
        vehicle_id: VehicleId,
        amount: Money,
        category: PaymentCategory,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            payer,
            vehicle_id,
            amount,
            category,
            driver_confirmed: false,
            owner_confirmed: false,
            status: PaymentStatus::Pending,
            created_at,
            confirmed_at: None,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == PaymentStatus::Confirmed
    }

    pub fn is_confirmed_by(&self, party: ConfirmingParty) -> bool {
        match party {
            ConfirmingParty::Driver => self.driver_confirmed,
            ConfirmingParty::Owner => self.owner_confirmed,
        }
    }

    /// set one party's flag; flags never go back to false
    pub fn confirm(&mut self, party: ConfirmingParty, overridden: bool, now: DateTime<Utc>) -> Vec<Event> {
        let mut effects = Vec::new();

        if !self.is_confirmed_by(party) {
            match party {
                ConfirmingParty::Driver => self.driver_confirmed = true,
                ConfirmingParty::Owner => self.owner_confirmed = true,
            }
            effects.push(Event::PaymentPartyConfirmed {
                payment_id: self.id,
                party,
                overridden,
                timestamp: now,
            });
        }

        if self.refresh_status(now) {
            effects.push(Event::PaymentConfirmed {
                payment_id: self.id,
                amount: self.amount,
                timestamp: now,
            });
        }

        effects
    }

    /// promote to confirmed once both flags are set, returns true on promotion
    pub fn refresh_status(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == PaymentStatus::Pending && self.driver_confirmed && self.owner_confirmed {
            self.status = PaymentStatus::Confirmed;
            self.confirmed_at = Some(now);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn payment() -> Payment {
        Payment::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Money::from_major(45),
            PaymentCategory::Cash,
            Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_record_payment_validation() {
        let request = RecordPayment {
            payer: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            amount: Money::ZERO,
            category: PaymentCategory::Fuel,
        };
        assert!(matches!(request.validate(), Err(PoolError::InvalidPaymentAmount { .. })));
    }

    #[test]
    fn test_single_confirmation_stays_pending() {
        let mut payment = payment();
        let now = Utc.with_ymd_and_hms(2025, 6, 3, 8, 0, 0).unwrap();

        let effects = payment.confirm(ConfirmingParty::Driver, false, now);

        assert_eq!(effects.len(), 1);
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(payment.confirmed_at.is_none());
    }

    #[test]
    fn test_dual_confirmation() {
        let mut payment = payment();
        let now = Utc.with_ymd_and_hms(2025, 6, 3, 8, 0, 0).unwrap();

        payment.confirm(ConfirmingParty::Owner, false, now);
        let effects = payment.confirm(ConfirmingParty::Driver, false, now);

        assert_eq!(payment.status, PaymentStatus::Confirmed);
        assert_eq!(payment.confirmed_at, Some(now));
        assert!(matches!(effects.last(), Some(Event::PaymentConfirmed { .. })));
    }

    #[test]
    fn test_repeat_confirmation_is_noop() {
        let mut payment = payment();
        let now = Utc.with_ymd_and_hms(2025, 6, 3, 8, 0, 0).unwrap();

        payment.confirm(ConfirmingParty::Driver, false, now);
        payment.confirm(ConfirmingParty::Owner, false, now);
        let effects = payment.confirm(ConfirmingParty::Owner, false, now);

        assert!(effects.is_empty());
        assert!(payment.is_confirmed());
    }
}

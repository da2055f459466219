//! Catalog domain types.

use chrono::{DateTime, Utc};
use inventra_shared::types::PartId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::CatalogError;

/// Where a part's current cost came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostSource {
    /// Entered by hand.
    #[default]
    Manual,
    /// Set by receiving a direct purchase order.
    DpoReceived,
    /// Set by receiving a purchase order.
    PoReceived,
}

impl CostSource {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::DpoReceived => "dpo_received",
            Self::PoReceived => "po_received",
        }
    }
}

/// Selling price tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTier {
    /// Walk-in customers.
    Retail,
    /// Trade customers buying in bulk.
    Wholesale,
    /// Authorised dealers.
    Dealer,
}

/// The three selling prices carried by every part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTiers {
    pub retail: Decimal,
    pub wholesale: Decimal,
    pub dealer: Decimal,
}

impl PriceTiers {
    /// Price charged for `tier`.
    #[must_use]
    pub const fn price_for(&self, tier: PriceTier) -> Decimal {
        match tier {
            PriceTier::Retail => self.retail,
            PriceTier::Wholesale => self.wholesale,
            PriceTier::Dealer => self.dealer,
        }
    }
}

/// Fields needed to create or update a part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartInput {
    pub part_no: String,
    pub description: String,
    pub cost: Decimal,
    pub prices: PriceTiers,
}

impl PartInput {
    /// Checks the part number and every amount.
    ///
    /// Returns the input with its part number trimmed.
    pub fn validated(mut self) -> Result<Self, CatalogError> {
        self.part_no = normalize_part_no(&self.part_no)?;
        for (field, amount) in [
            ("cost", self.cost),
            ("retail_price", self.prices.retail),
            ("wholesale_price", self.prices.wholesale),
            ("dealer_price", self.prices.dealer),
        ] {
            if amount < Decimal::ZERO {
                return Err(CatalogError::Validation {
                    field,
                    reason: "must not be negative",
                });
            }
        }
        Ok(self)
    }
}

/// Trims surrounding whitespace. Part numbers compare case-sensitively.
pub fn normalize_part_no(raw: &str) -> Result<String, CatalogError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::Validation {
            field: "part_no",
            reason: "must not be empty",
        });
    }
    Ok(trimmed.to_string())
}

/// Cost-relevant state of a part at the moment a document is processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartSnapshot {
    pub part_id: PartId,
    pub part_no: String,
    /// Current average/landed unit cost.
    pub cost: Decimal,
    /// Signed sum of the part's stock movements.
    pub on_hand: i64,
}

/// A part row as loaded from a legacy import, duplicates included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyPart {
    pub id: PartId,
    pub part_no: String,
    pub description: String,
    pub cost: Decimal,
    pub cost_source: CostSource,
    pub cost_updated_at: Option<DateTime<Utc>>,
    pub prices: PriceTiers,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input(part_no: &str, cost: Decimal) -> PartInput {
        PartInput {
            part_no: part_no.to_string(),
            description: "Oil filter".to_string(),
            cost,
            prices: PriceTiers {
                retail: dec!(150),
                wholesale: dec!(130),
                dealer: dec!(120),
            },
        }
    }

    #[test]
    fn test_validated_trims_part_no() {
        let part = input("  6C0570 ", dec!(100)).validated().unwrap();
        assert_eq!(part.part_no, "6C0570");
    }

    #[test]
    fn test_validated_rejects_blank_part_no() {
        assert!(matches!(
            input("   ", dec!(1)).validated(),
            Err(CatalogError::Validation { field: "part_no", .. })
        ));
    }

    #[test]
    fn test_validated_rejects_negative_amounts() {
        assert!(matches!(
            input("X1", dec!(-1)).validated(),
            Err(CatalogError::Validation { field: "cost", .. })
        ));

        let mut bad = input("X1", dec!(1));
        bad.prices.dealer = dec!(-0.01);
        assert!(matches!(
            bad.validated(),
            Err(CatalogError::Validation { field: "dealer_price", .. })
        ));
    }

    #[test]
    fn test_price_for_tier() {
        let prices = input("X1", dec!(1)).prices;
        assert_eq!(prices.price_for(PriceTier::Retail), dec!(150));
        assert_eq!(prices.price_for(PriceTier::Wholesale), dec!(130));
        assert_eq!(prices.price_for(PriceTier::Dealer), dec!(120));
    }

    #[test]
    fn test_cost_source_serde() {
        assert_eq!(
            serde_json::to_string(&CostSource::DpoReceived).unwrap(),
            "\"dpo_received\""
        );
        assert_eq!(CostSource::PoReceived.as_str(), "po_received");
    }
}

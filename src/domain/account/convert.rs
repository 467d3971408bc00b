//! Conversion: position wire entries → `Position`.

use super::wire::PositionEntry;
use super::{Leverage, Position};
use crate::shared::{Side, Symbol};
use rust_decimal::Decimal;

impl Position {
    /// `Ok(None)` for flat (zero-size) positions.
    pub(crate) fn from_entry(
        symbol: Symbol,
        entry: &PositionEntry,
        mark_price: Decimal,
    ) -> Result<Option<Self>, String> {
        let size = entry.qty.abs();
        if size.is_zero() {
            return Ok(None);
        }
        let side = Side::from_wire(&entry.side)
            .ok_or_else(|| format!("unknown position side '{}'", entry.side))?;

        let per_unit = match side {
            Side::Buy => mark_price - entry.avg_entry_price,
            Side::Sell => entry.avg_entry_price - mark_price,
        };

        Ok(Some(Position {
            symbol,
            side,
            size,
            entry_price: entry.avg_entry_price,
            mark_price,
            notional: size * mark_price,
            unrealized_pnl: size * per_unit,
            leverage: Leverage::Unknown,
        }))
    }
}

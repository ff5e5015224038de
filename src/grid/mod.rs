// Grid strategy module
// Lays out a ladder of limit orders across a price range

use crate::models::{GridOrder, OrderSide};

/// Produces an ordered ladder of price levels across a range and
/// classifies each as a buy or sell order relative to the current price.
#[derive(Debug, Clone)]
pub struct GridManager {
    lower_bound: f64,
    upper_bound: f64,
    grid_count: usize,
}

impl GridManager {
    pub fn new(lower_bound: f64, upper_bound: f64, grid_count: usize) -> Self {
        Self {
            lower_bound,
            upper_bound,
            grid_count,
        }
    }

    /// Evenly spaced levels from lower to upper bound, inclusive
    ///
    /// A count of 1 or less degenerates to the two endpoints.
    pub fn generate_grid_levels(&self) -> Vec<f64> {
        if self.grid_count <= 1 {
            return vec![self.lower_bound, self.upper_bound];
        }

        let interval = (self.upper_bound - self.lower_bound) / (self.grid_count - 1) as f64;
        (0..self.grid_count)
            .map(|i| self.lower_bound + i as f64 * interval)
            .collect()
    }

    /// Classify each level against the current price at a fixed lot
    ///
    /// Levels strictly below the current price become buys, strictly
    /// above become sells. A level exactly equal to the current price
    /// produces no order on either side. Output preserves level order.
    pub fn generate_grid_orders(&self, current_price: f64, base_lot: f64) -> Vec<GridOrder> {
        let levels = self.generate_grid_levels();
        let mut orders = Vec::with_capacity(levels.len());

        for level in levels {
            if level < current_price {
                orders.push(GridOrder {
                    side: OrderSide::Buy,
                    price: level,
                    lot: base_lot,
                });
            } else if level > current_price {
                orders.push(GridOrder {
                    side: OrderSide::Sell,
                    price: level,
                    lot: base_lot,
                });
            }
        }

        tracing::debug!("generated {} grid orders", orders.len());
        orders
    }
}

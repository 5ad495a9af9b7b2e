//! Inclusive range filters over the sector table.

use serde::Serialize;

use crate::error::EquityScopeError;
use crate::sector::{MetricColumn, SectorRow};

/// Inclusive `[lo, hi]` bounds. A missing side is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Bounds {
    pub lo: Option<f64>,
    pub hi: Option<f64>,
}

impl Bounds {
    pub fn new(lo: Option<f64>, hi: Option<f64>) -> Result<Self, EquityScopeError> {
        for v in [lo, hi].into_iter().flatten() {
            if v.is_nan() {
                return Err(EquityScopeError::InvalidInput(
                    "Range bound must be a number".to_string(),
                ));
            }
        }
        if let (Some(l), Some(h)) = (lo, hi) {
            if l > h {
                return Err(EquityScopeError::InvalidInput(format!(
                    "Lower bound {} exceeds upper bound {}",
                    l, h
                )));
            }
        }
        Ok(Self { lo, hi })
    }

    pub fn between(lo: f64, hi: f64) -> Result<Self, EquityScopeError> {
        Self::new(Some(lo), Some(hi))
    }

    pub fn is_unbounded(&self) -> bool {
        self.lo.is_none() && self.hi.is_none()
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lo.map_or(true, |lo| value >= lo) && self.hi.map_or(true, |hi| value <= hi)
    }
}

/// Independent bounds on the four numeric columns of the sector table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RangeFilter {
    pub pe: Bounds,
    pub roe: Bounds,
    pub dividend_yield: Bounds,
    pub market_cap_bn: Bounds,
}

impl RangeFilter {
    pub fn bounds(&self, column: MetricColumn) -> &Bounds {
        match column {
            MetricColumn::TrailingPe => &self.pe,
            MetricColumn::Roe => &self.roe,
            MetricColumn::DividendYield => &self.dividend_yield,
            MetricColumn::MarketCapBn => &self.market_cap_bn,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        MetricColumn::ALL
            .iter()
            .all(|c| self.bounds(*c).is_unbounded())
    }

    pub fn matches(&self, row: &SectorRow) -> bool {
        MetricColumn::ALL
            .iter()
            .all(|c| self.bounds(*c).contains(c.value(row)))
    }

    /// Rows satisfying every bound, in their original order.
    pub fn apply(&self, rows: &[SectorRow]) -> Vec<SectorRow> {
        rows.iter().filter(|r| self.matches(r)).cloned().collect()
    }

    /// Tightest filter that still admits every row: the min/max of each
    /// column. Empty input gives an unbounded filter.
    pub fn extent(rows: &[SectorRow]) -> Self {
        let span = |column: MetricColumn| {
            rows.iter().map(|r| column.value(r)).fold(Bounds::default(), |b, v| Bounds {
                lo: Some(b.lo.map_or(v, |lo| lo.min(v))),
                hi: Some(b.hi.map_or(v, |hi| hi.max(v))),
            })
        };
        Self {
            pe: span(MetricColumn::TrailingPe),
            roe: span(MetricColumn::Roe),
            dividend_yield: span(MetricColumn::DividendYield),
            market_cap_bn: span(MetricColumn::MarketCapBn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sector::Quartile;

    fn row(symbol: &str, pe: f64, roe: f64, dy: f64, mcap_bn: f64) -> SectorRow {
        SectorRow {
            symbol: symbol.to_string(),
            name: None,
            sector: "Technology".to_string(),
            trailing_pe: pe,
            roe_pct: roe,
            dividend_yield_pct: dy,
            market_cap: mcap_bn * 1e9,
            market_cap_bn: mcap_bn,
            quartile: Quartile::Unranked,
        }
    }

    fn table() -> Vec<SectorRow> {
        vec![
            row("IBM", 22.4, 33.1, 3.2, 190.0),
            row("AAPL", 34.79, 157.41, 0.44, 3452.32),
            row("MSFT", 36.1, 35.6, 0.72, 3100.0),
            row("ORCL", 40.7, 150.0, 0.96, 480.0),
            row("INTC", 95.2, -1.5, 1.9, 90.12),
        ]
    }

    fn symbols(rows: &[SectorRow]) -> Vec<&str> {
        rows.iter().map(|r| r.symbol.as_str()).collect()
    }

    #[test]
    fn test_default_filter_keeps_everything() {
        let filter = RangeFilter::default();
        assert!(filter.is_unbounded());
        assert_eq!(filter.apply(&table()), table());
    }

    #[test]
    fn test_single_column_inclusive() {
        let filter = RangeFilter {
            pe: Bounds::between(34.79, 40.7).unwrap(),
            ..Default::default()
        };
        assert_eq!(symbols(&filter.apply(&table())), vec!["AAPL", "MSFT", "ORCL"]);
    }

    #[test]
    fn test_each_column_matches_definition() {
        let rows = table();
        for column in MetricColumn::ALL {
            let bounds = Bounds::between(1.0, 100.0).unwrap();
            let mut filter = RangeFilter::default();
            match column {
                MetricColumn::TrailingPe => filter.pe = bounds,
                MetricColumn::Roe => filter.roe = bounds,
                MetricColumn::DividendYield => filter.dividend_yield = bounds,
                MetricColumn::MarketCapBn => filter.market_cap_bn = bounds,
            }
            let expected: Vec<SectorRow> = rows
                .iter()
                .filter(|r| {
                    let v = column.value(r);
                    (1.0..=100.0).contains(&v)
                })
                .cloned()
                .collect();
            assert_eq!(filter.apply(&rows), expected, "column {:?}", column);
        }
    }

    #[test]
    fn test_conjunction() {
        let filter = RangeFilter {
            roe: Bounds::new(Some(30.0), None).unwrap(),
            dividend_yield: Bounds::new(None, Some(1.0)).unwrap(),
            ..Default::default()
        };
        assert_eq!(symbols(&filter.apply(&table())), vec!["AAPL", "MSFT", "ORCL"]);

        let filter = RangeFilter {
            market_cap_bn: Bounds::new(Some(1000.0), None).unwrap(),
            pe: Bounds::new(None, Some(35.0)).unwrap(),
            ..filter
        };
        assert_eq!(symbols(&filter.apply(&table())), vec!["AAPL"]);
    }

    #[test]
    fn test_extent_admits_all_rows() {
        let rows = table();
        let extent = RangeFilter::extent(&rows);
        assert_eq!(extent.pe, Bounds { lo: Some(22.4), hi: Some(95.2) });
        assert_eq!(extent.roe, Bounds { lo: Some(-1.5), hi: Some(157.41) });
        assert_eq!(extent.apply(&rows), rows);
    }

    #[test]
    fn test_extent_of_empty_table() {
        assert!(RangeFilter::extent(&[]).is_unbounded());
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let err = Bounds::between(10.0, 5.0).unwrap_err();
        assert!(matches!(err, EquityScopeError::InvalidInput(_)));
        assert!(Bounds::new(Some(f64::NAN), None).is_err());
        assert!(Bounds::between(5.0, 5.0).is_ok());
    }
}

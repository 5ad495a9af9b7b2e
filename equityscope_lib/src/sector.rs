//! Sector aggregation pipeline: clean, restrict to one sector, sort by
//! valuation, and label each row with its valuation quartile.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::indicators::round2;
use crate::metrics::TickerMetrics;
use crate::stats::{quantile_sorted, BoxStats};

/// Minimum Jaro-Winkler similarity for a sector label to be suggested.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Valuation quartile within one sector table. Labels are never comparable
/// across sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Quartile {
    Q1,
    Q2,
    Q3,
    Q4,
    /// Placeholder when the table has fewer than four distinct ratios.
    #[serde(rename = "N/A")]
    Unranked,
}

impl fmt::Display for Quartile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Quartile::Q1 => "Q1",
            Quartile::Q2 => "Q2",
            Quartile::Q3 => "Q3",
            Quartile::Q4 => "Q4",
            Quartile::Unranked => "N/A",
        };
        write!(f, "{}", s)
    }
}

/// A cleaned row of the sector table. All numeric fields are finite and
/// rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorRow {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: String,
    pub trailing_pe: f64,
    pub roe_pct: f64,
    pub dividend_yield_pct: f64,
    pub market_cap: f64,
    pub market_cap_bn: f64,
    pub quartile: Quartile,
}

/// Numeric columns of the sector table that can be filtered and summarized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricColumn {
    TrailingPe,
    Roe,
    DividendYield,
    MarketCapBn,
}

impl MetricColumn {
    pub const ALL: [MetricColumn; 4] = [
        MetricColumn::TrailingPe,
        MetricColumn::Roe,
        MetricColumn::DividendYield,
        MetricColumn::MarketCapBn,
    ];

    pub fn value(&self, row: &SectorRow) -> f64 {
        match self {
            MetricColumn::TrailingPe => row.trailing_pe,
            MetricColumn::Roe => row.roe_pct,
            MetricColumn::DividendYield => row.dividend_yield_pct,
            MetricColumn::MarketCapBn => row.market_cap_bn,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MetricColumn::TrailingPe => "Trailing P/E",
            MetricColumn::Roe => "ROE %",
            MetricColumn::DividendYield => "Dividend Yield %",
            MetricColumn::MarketCapBn => "Market Cap (B)",
        }
    }
}

/// Number of fetched rows carrying a sector label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectorCount {
    pub sector: String,
    pub count: usize,
}

fn coerce(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(round2(value))
    } else {
        None
    }
}

/// Runs the sector pipeline over the bulk metrics table.
///
/// Steps, in order: drop rows missing sector/P-E/ROE/yield/market cap;
/// keep rows whose sector equals `sector` exactly; drop non-finite P/E;
/// round numeric fields to 2 decimals (non-finite values drop the row);
/// derive market cap in billions; stable sort ascending by P/E; label
/// quartiles.
pub fn build_sector_table(rows: &[TickerMetrics], sector: &str) -> Vec<SectorRow> {
    let mut table: Vec<SectorRow> = rows
        .iter()
        .filter_map(|r| {
            let row_sector = r.sector.as_deref()?;
            let pe = r.trailing_pe?;
            let roe = r.roe_pct?;
            let dividend_yield = r.dividend_yield_pct?;
            let market_cap = r.market_cap?;

            if row_sector != sector {
                return None;
            }
            if !pe.is_finite() {
                return None;
            }

            let trailing_pe = coerce(pe)?;
            let roe_pct = coerce(roe)?;
            let dividend_yield_pct = coerce(dividend_yield)?;
            let market_cap = coerce(market_cap)?;

            Some(SectorRow {
                symbol: r.symbol.clone(),
                name: r.name.clone(),
                sector: row_sector.to_string(),
                trailing_pe,
                roe_pct,
                dividend_yield_pct,
                market_cap,
                market_cap_bn: round2(market_cap / 1e9),
                quartile: Quartile::Unranked,
            })
        })
        .collect();

    table.sort_by(|a, b| a.trailing_pe.total_cmp(&b.trailing_pe));

    let ratios: Vec<f64> = table.iter().map(|r| r.trailing_pe).collect();
    for (row, quartile) in table.iter_mut().zip(assign_quartiles(&ratios)) {
        row.quartile = quartile;
    }
    table
}

/// Equal-frequency quartile labels for `values`, returned in input order.
///
/// Fewer than four distinct values gives every entry [`Quartile::Unranked`].
/// Otherwise the 0/25/50/75/100 % quantiles are the bin edges, each bin
/// closed on the right and the first one also on the left. When edges
/// coincide (heavy ties) the labels come from sorted rank instead.
pub fn assign_quartiles(values: &[f64]) -> Vec<Quartile> {
    let n = values.len();
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mut distinct = sorted.clone();
    distinct.dedup();

    if n < 4 || distinct.len() < 4 {
        return vec![Quartile::Unranked; n];
    }

    let edges: Vec<f64> = [0.0, 0.25, 0.5, 0.75, 1.0]
        .iter()
        .filter_map(|q| quantile_sorted(&sorted, *q))
        .collect();

    if edges.windows(2).all(|w| w[0] < w[1]) {
        return values.iter().map(|v| bucket_by_edges(*v, &edges)).collect();
    }

    tracing::debug!("quartile edges collide, labelling by rank");
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|a, b| values[*a].total_cmp(&values[*b]).then(a.cmp(b)));
    let mut labels = vec![Quartile::Unranked; n];
    for (rank, idx) in order.into_iter().enumerate() {
        labels[idx] = match rank * 4 / n {
            0 => Quartile::Q1,
            1 => Quartile::Q2,
            2 => Quartile::Q3,
            _ => Quartile::Q4,
        };
    }
    labels
}

fn bucket_by_edges(value: f64, edges: &[f64]) -> Quartile {
    if value <= edges[1] {
        Quartile::Q1
    } else if value <= edges[2] {
        Quartile::Q2
    } else if value <= edges[3] {
        Quartile::Q3
    } else {
        Quartile::Q4
    }
}

/// Distinct sector labels in the fetched table with their row counts,
/// ordered by label.
pub fn list_sectors(rows: &[TickerMetrics]) -> Vec<SectorCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for row in rows {
        if let Some(sector) = row.sector.as_deref() {
            *counts.entry(sector).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .map(|(sector, count)| SectorCount {
            sector: sector.to_string(),
            count,
        })
        .collect()
}

/// Sector labels that look like `needle`, best match first.
pub fn suggest_sectors(rows: &[TickerMetrics], needle: &str) -> Vec<String> {
    let needle = needle.trim().to_lowercase();
    let mut scored: Vec<(f64, String)> = list_sectors(rows)
        .into_iter()
        .map(|c| (strsim::jaro_winkler(&needle, &c.sector.to_lowercase()), c.sector))
        .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().map(|(_, s)| s).collect()
}

/// Five-number summary of every numeric column of a sector table.
pub fn column_stats(table: &[SectorRow]) -> Vec<(MetricColumn, Option<BoxStats>)> {
    MetricColumn::ALL
        .iter()
        .map(|col| {
            let values: Vec<f64> = table.iter().map(|r| col.value(r)).collect();
            (*col, BoxStats::from_values(&values))
        })
        .collect()
}

/// Five-number summary of `column` for each quartile present in the table.
pub fn quartile_stats(table: &[SectorRow], column: MetricColumn) -> Vec<(Quartile, BoxStats)> {
    let mut groups: BTreeMap<Quartile, Vec<f64>> = BTreeMap::new();
    for row in table {
        groups.entry(row.quartile).or_default().push(column.value(row));
    }
    groups
        .into_iter()
        .filter_map(|(q, values)| BoxStats::from_values(&values).map(|s| (q, s)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(symbol: &str, sector: &str, pe: f64, roe: f64, dy: f64, mcap: f64) -> TickerMetrics {
        TickerMetrics {
            symbol: symbol.to_string(),
            name: Some(format!("{} Corp", symbol)),
            sector: Some(sector.to_string()),
            trailing_pe: Some(pe),
            roe_pct: Some(roe),
            dividend_yield_pct: Some(dy),
            market_cap: Some(mcap),
        }
    }

    fn tech_rows() -> Vec<TickerMetrics> {
        vec![
            row("AAPL", "Technology", 34.785, 157.41, 0.44, 3_452_317_941_760.0),
            row("MSFT", "Technology", 36.1, 35.6, 0.72, 3_100_000_000_000.0),
            row("JPM", "Financial Services", 12.3, 16.0, 2.1, 600_000_000_000.0),
            row("INTC", "Technology", 95.2, -1.5, 1.9, 90_123_456_789.0),
            row("IBM", "Technology", 22.4, 33.1, 3.2, 190_000_000_000.0),
            row("ORCL", "Technology", 40.7, 150.0, 0.96, 480_000_000_000.0),
        ]
    }

    #[test]
    fn test_drops_rows_with_missing_fields() {
        let mut rows = tech_rows();
        let mut no_roe = row("NVDA", "Technology", 60.0, 0.0, 0.03, 3.0e12);
        no_roe.roe_pct = None;
        let mut no_yield = row("AMD", "Technology", 100.0, 2.0, 0.0, 2.0e11);
        no_yield.dividend_yield_pct = None;
        let mut no_mcap = row("CRM", "Technology", 50.0, 9.0, 0.5, 0.0);
        no_mcap.market_cap = None;
        let mut no_sector = row("ADBE", "Technology", 45.0, 35.0, 0.0, 2.0e11);
        no_sector.sector = None;
        let mut no_pe = row("CSCO", "Technology", 0.0, 20.0, 2.8, 2.0e11);
        no_pe.trailing_pe = None;
        rows.extend([no_roe, no_yield, no_mcap, no_sector, no_pe]);

        let table = build_sector_table(&rows, "Technology");
        let symbols: Vec<&str> = table.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["IBM", "AAPL", "MSFT", "ORCL", "INTC"]);
    }

    #[test]
    fn test_exact_sector_match() {
        let rows = tech_rows();
        assert!(build_sector_table(&rows, "technology").is_empty());
        assert_eq!(build_sector_table(&rows, "Financial Services").len(), 1);
    }

    #[test]
    fn test_excludes_non_finite_ratio() {
        let mut rows = tech_rows();
        rows.push(row("ZERO", "Technology", f64::INFINITY, 1.0, 1.0, 1.0e9));
        rows.push(row("NANE", "Technology", f64::NAN, 1.0, 1.0, 1.0e9));
        let table = build_sector_table(&rows, "Technology");
        assert!(table.iter().all(|r| r.symbol != "ZERO" && r.symbol != "NANE"));
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn test_non_finite_other_field_drops_row() {
        let rows = vec![row("BAD", "Technology", 10.0, f64::NAN, 1.0, 1.0e9)];
        assert!(build_sector_table(&rows, "Technology").is_empty());
    }

    #[test]
    fn test_sorted_ascending_and_rounded() {
        let table = build_sector_table(&tech_rows(), "Technology");
        assert!(table
            .windows(2)
            .all(|w| w[0].trailing_pe <= w[1].trailing_pe));
        let aapl = table.iter().find(|r| r.symbol == "AAPL").unwrap();
        assert_eq!(aapl.trailing_pe, 34.79);
        assert_eq!(aapl.market_cap_bn, 3452.32);
        let intc = table.iter().find(|r| r.symbol == "INTC").unwrap();
        assert_eq!(intc.market_cap_bn, 90.12);
    }

    #[test]
    fn test_market_cap_in_billions() {
        let table = build_sector_table(&tech_rows(), "Technology");
        for r in &table {
            assert_eq!(r.market_cap_bn, round2(r.market_cap / 1e9));
        }
    }

    #[test]
    fn test_stable_sort_for_equal_ratios() {
        let rows = vec![
            row("B", "Energy", 10.0, 1.0, 1.0, 1.0e9),
            row("A", "Energy", 10.0, 1.0, 1.0, 1.0e9),
            row("C", "Energy", 5.0, 1.0, 1.0, 1.0e9),
        ];
        let table = build_sector_table(&rows, "Energy");
        let symbols: Vec<&str> = table.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["C", "B", "A"]);
    }

    #[test]
    fn test_quartiles_contiguous_and_complete() {
        let table = build_sector_table(&tech_rows(), "Technology");
        assert_eq!(table.len(), 5);
        let labels: Vec<Quartile> = table.iter().map(|r| r.quartile).collect();
        assert!(labels.iter().all(|q| *q != Quartile::Unranked));
        assert!(labels.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(labels.first(), Some(&Quartile::Q1));
        assert_eq!(labels.last(), Some(&Quartile::Q4));
    }

    #[test]
    fn test_quartiles_eight_values() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let labels = assign_quartiles(&values);
        assert_eq!(
            labels,
            vec![
                Quartile::Q1,
                Quartile::Q1,
                Quartile::Q2,
                Quartile::Q2,
                Quartile::Q3,
                Quartile::Q3,
                Quartile::Q4,
                Quartile::Q4
            ]
        );
    }

    #[test]
    fn test_quartiles_input_order_preserved() {
        let labels = assign_quartiles(&[8.0, 1.0, 5.0, 3.0]);
        assert_eq!(
            labels,
            vec![Quartile::Q4, Quartile::Q1, Quartile::Q3, Quartile::Q2]
        );
    }

    #[test]
    fn test_quartiles_placeholder_for_few_distinct() {
        let labels = assign_quartiles(&[5.0, 5.0, 6.0, 7.0, 7.0, 7.0]);
        assert!(labels.iter().all(|q| *q == Quartile::Unranked));
        assert_eq!(labels.len(), 6);

        assert_eq!(assign_quartiles(&[1.0, 2.0, 3.0]).len(), 3);
        assert!(assign_quartiles(&[]).is_empty());
    }

    #[test]
    fn test_quartiles_rank_fallback_on_colliding_edges() {
        let values = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 3.0, 4.0];
        let labels = assign_quartiles(&values);
        assert!(labels.iter().all(|q| *q != Quartile::Unranked));
        assert!(labels.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(labels[0], Quartile::Q1);
        assert_eq!(labels[9], Quartile::Q4);
    }

    #[test]
    fn test_small_sector_gets_placeholder() {
        let table = build_sector_table(&tech_rows(), "Financial Services");
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].quartile, Quartile::Unranked);
        assert_eq!(table[0].quartile.to_string(), "N/A");
    }

    #[test]
    fn test_quartile_serializes_placeholder() {
        assert_eq!(
            serde_json::to_value(Quartile::Unranked).unwrap(),
            serde_json::json!("N/A")
        );
        assert_eq!(
            serde_json::to_value(Quartile::Q3).unwrap(),
            serde_json::json!("Q3")
        );
    }

    #[test]
    fn test_list_sectors() {
        let mut rows = tech_rows();
        rows.push(TickerMetrics::new("NOSECTOR"));
        let sectors = list_sectors(&rows);
        assert_eq!(
            sectors,
            vec![
                SectorCount {
                    sector: "Financial Services".to_string(),
                    count: 1
                },
                SectorCount {
                    sector: "Technology".to_string(),
                    count: 5
                },
            ]
        );
    }

    #[test]
    fn test_suggest_sectors() {
        let rows = tech_rows();
        assert_eq!(suggest_sectors(&rows, "technology")[0], "Technology");
        assert_eq!(suggest_sectors(&rows, "Tecnology")[0], "Technology");
        assert!(suggest_sectors(&rows, "Utilities").is_empty());
    }

    #[test]
    fn test_column_stats() {
        let table = build_sector_table(&tech_rows(), "Technology");
        let stats = column_stats(&table);
        assert_eq!(stats.len(), 4);
        let (col, pe) = &stats[0];
        assert_eq!(*col, MetricColumn::TrailingPe);
        let pe = pe.as_ref().unwrap();
        assert_eq!(pe.count, 5);
        assert_eq!(pe.min, 22.4);
        assert_eq!(pe.max, 95.2);
        assert_eq!(pe.median, 36.1);
        assert!(column_stats(&[]).iter().all(|(_, s)| s.is_none()));
    }

    #[test]
    fn test_quartile_stats_groups() {
        let table = build_sector_table(&tech_rows(), "Technology");
        let groups = quartile_stats(&table, MetricColumn::Roe);
        let total: usize = groups.iter().map(|(_, s)| s.count).sum();
        assert_eq!(total, table.len());
        assert_eq!(groups[0].0, Quartile::Q1);
    }
}

use serde::Serialize;

use crate::format::{format_change, format_currency, format_date};
use crate::types::MarketData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneKind {
    High,
    Low,
}

/// All-time high / low card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Milestone {
    pub kind: MilestoneKind,
    pub title: &'static str,
    pub price: String,
    pub date: String,
    pub change: Option<String>,
    pub positive: bool,
    pub caption: &'static str,
}

fn milestone(
    kind: MilestoneKind,
    price: Option<f64>,
    date: Option<&str>,
    change: Option<f64>,
) -> Option<Milestone> {
    let price = price.filter(|p| *p != 0.0)?;
    let (title, caption) = match kind {
        MilestoneKind::High => ("All-Time High (ATH)", "since ATH"),
        MilestoneKind::Low => ("All-Time Low (ATL)", "since ATL"),
    };

    Some(Milestone {
        kind,
        title,
        price: format_currency(price),
        date: format_date(date),
        change: change.map(|c| format_change(Some(c))),
        positive: change.map_or(false, |c| c > 0.0),
        caption,
    })
}

/// Cards for whichever of ATH / ATL the upstream reports.
pub fn milestones(md: &MarketData) -> Vec<Milestone> {
    [
        milestone(
            MilestoneKind::High,
            md.ath.usd(),
            md.ath_date.get("usd").map(String::as_str),
            md.ath_change_percentage.usd(),
        ),
        milestone(
            MilestoneKind::Low,
            md.atl.usd(),
            md.atl_date.get("usd").map(String::as_str),
            md.atl_change_percentage.usd(),
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
}

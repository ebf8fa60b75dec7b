//! Competition ranking for scoreboards.
//!
//! Standard competition ranking ("1224"): equal scores share the position of
//! the first item of their run, and every item after the first of a run is
//! flagged ex aequo.

use serde::{Deserialize, Serialize};

use crate::config::TransitionConfig;
use crate::row::{Cell, Row, RowError, RowKey};
use crate::snapshot::Update;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranked<T> {
    pub item: T,
    /// 1-based.
    pub rank: usize,
    pub ex_aequo: bool,
}

/// Rank items already sorted by descending score.
pub fn rank_by<T, S, F>(items: impl IntoIterator<Item = T>, score: F) -> Vec<Ranked<T>>
where
    S: PartialEq,
    F: Fn(&T) -> S,
{
    let mut ranked = Vec::new();
    let mut previous: Option<S> = None;
    let mut rank = 1;

    for (position, item) in items.into_iter().enumerate() {
        let current = score(&item);
        let ex_aequo = previous.as_ref() == Some(&current);
        if !ex_aequo {
            rank = position + 1;
            previous = Some(current);
        }
        ranked.push(Ranked {
            item,
            rank,
            ex_aequo,
        });
    }
    ranked
}

/// One participant of a scoreboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub id: String,
    pub name: String,
    pub score: i64,
}

/// Sort standings by score (ties by name) and render them as scoreboard
/// rows: `[rank, name, score]`, rank and score mutable, keyed `sb-<id>`.
pub fn standings_to_update(
    mut standings: Vec<Standing>,
    config: &TransitionConfig,
) -> Result<Update, RowError> {
    standings.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));

    let rows = rank_by(standings, |standing| standing.score)
        .into_iter()
        .map(|ranked| standing_row(&ranked, config))
        .collect::<Result<Vec<_>, _>>()?;
    Update::from_rows(rows)
}

fn standing_row(ranked: &Ranked<Standing>, config: &TransitionConfig) -> Result<Row, RowError> {
    let standing = &ranked.item;
    let rank_class = if ranked.ex_aequo {
        format!("sb-rank ex-aequo {}", config.mutable_class)
    } else {
        format!("sb-rank {}", config.mutable_class)
    };
    let key = RowKey::new(format!("sb-{}", standing.id))?;
    Row::new(
        key,
        [
            Cell::mutable(ranked.rank.to_string()).with_class(rank_class),
            Cell::new(escape_text(&standing.name)).with_class("sb-name"),
            Cell::mutable(standing.score.to_string())
                .with_class(format!("sb-score {}", config.mutable_class)),
        ],
    )
}

fn escape_text(raw: &str) -> String {
    quick_xml::escape::escape(raw).into_owned()
}

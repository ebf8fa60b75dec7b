use std::path::Path;

use anyhow::Result;
use rankboard::{classify, Plan, RowChange, TransitionConfig};

use super::read_feed;

pub fn run(config: &TransitionConfig, initial: &Path, update: &Path) -> Result<()> {
    let snapshot = read_feed(initial, config)?.into_snapshot();
    let update = read_feed(update, config)?;
    print!("{}", render(&classify(&snapshot, &update)));
    Ok(())
}

fn index(index: Option<usize>) -> String {
    index.map_or_else(|| "-".to_string(), |index| index.to_string())
}

fn line(change: &RowChange) -> String {
    format!(
        "{:<16} {:<17} {:>3} -> {}\n",
        change.key.as_str(),
        change.class.to_string(),
        index(change.old_index),
        index(change.new_index)
    )
}

fn render(plan: &Plan) -> String {
    if plan.is_noop() {
        return "nothing to animate\n".to_string();
    }
    plan.changes().iter().map(line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rankboard::{feed, Snapshot, Update};

    fn board(json: &str) -> Update {
        feed::decode_update(json, "sb-update").unwrap()
    }

    #[test]
    fn lists_each_key_once() {
        let before: Snapshot = board(
            r#"[{"key": "a", "cells": [{"html": "1"}]}, {"key": "b", "cells": [{"html": "2"}]}]"#,
        )
        .into_snapshot();
        let after = board(r#"[{"key": "b", "cells": [{"html": "2"}]}, {"key": "c", "cells": [{"html": "3"}]}]"#);

        let text = render(&classify(&before, &after));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("b "));
        assert!(lines[0].contains("moved up"));
        assert!(lines[1].contains("inserted") && lines[1].ends_with("-> 1"));
        assert!(lines[2].contains("removed") && lines[2].ends_with("-> -"));
    }

    #[test]
    fn identical_boards_need_nothing() {
        let json = r#"[{"key": "a", "cells": [{"html": "1"}]}]"#;
        assert_eq!(
            render(&classify(&board(json).into_snapshot(), &board(json))),
            "nothing to animate\n"
        );
    }
}

//! Renders resolved management actions into the simulator's keyword block.
//!
//! Actions are rendered in input order with no reordering or conflict
//! detection. The keyword year is the user's zero-based year plus one,
//! since simulator cycles are numbered from one.

use crate::action::{
    ActionKind, ActionSettings, BurnSettings, ClearcutSettings, ResolvedAction, ThinSettings,
};
use crate::error::{Result, StandsimError};
use crate::keyword::{decimal, plain, record};

/// Encode every action into one command block. Each record ends in `\n`.
pub fn encode(actions: &[ResolvedAction]) -> Result<String> {
    let mut block = String::new();
    for action in actions {
        block.push_str(&render(action)?);
    }
    Ok(block)
}

/// Render a single action. Fails when its settings do not fit the template.
pub fn render(action: &ResolvedAction) -> Result<String> {
    let year = action
        .year
        .checked_add(1)
        .ok_or(StandsimError::YearOutOfRange(action.year))?
        .to_string();
    match action.typed_settings()? {
        ActionSettings::Thin(s) => render_thin(thin_keyword(action.kind), &year, &s),
        ActionSettings::Burn(s) => render_burn(&year, &s),
        ActionSettings::Clearcut(s) => render_clearcut(&year, &s),
    }
}

fn thin_keyword(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::ThinAbove => "ThinABA",
        _ => "ThinBBA",
    }
}

fn render_thin(keyword: &str, year: &str, s: &ThinSettings) -> Result<String> {
    let fields = [
        year.to_string(),
        plain(s.residual_basal_area),
        decimal(s.efficiency),
        plain(s.min_dbh),
        decimal(s.max_dbh),
        plain(s.min_height),
        decimal(s.max_height),
    ];
    Ok(format!("{}\n", record(keyword, &fields)?))
}

fn render_burn(year: &str, s: &BurnSettings) -> Result<String> {
    let fields = [
        year.to_string(),
        decimal(s.wind_speed),
        plain(s.moisture),
        decimal(s.temperature),
        plain(s.mortality),
        decimal(s.percent_burned),
        plain(s.season),
    ];
    Ok(format!("FMIn\n{}\nEnd\n", record("SimFire", &fields)?))
}

fn render_clearcut(year: &str, s: &ClearcutSettings) -> Result<String> {
    let min_dbh = plain(s.min_dbh);
    let first = [
        year.to_string(),
        min_dbh.clone(),
        plain(s.dbh_cap),
        "1.0".to_string(),
        "0".to_string(),
        "0".to_string(),
        "0".to_string(),
    ];
    let second = [
        year.to_string(),
        min_dbh,
        "999.0".to_string(),
        plain(s.efficiency),
        "0".to_string(),
        "0".to_string(),
        "0".to_string(),
    ];
    Ok(format!(
        "{}\n{}\n",
        record("ThinDBH", &first)?,
        record("ThinDBH", &second)?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionRow;

    fn fields(line: &str) -> Vec<&str> {
        line.split_whitespace().collect()
    }

    #[test]
    fn thin_from_below_defaults() {
        let action = ActionRow::new("Thin from Below", "1", "").resolve(1).unwrap();
        let block = encode(&[action]).unwrap();
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(
            fields(lines[0]),
            vec!["ThinBBA", "2", "60", "1.0", "0", "999.0", "0", "999.0"]
        );
    }

    #[test]
    fn thin_from_above_shares_layout() {
        let above = ResolvedAction::new(ActionKind::ThinAbove, 0, "60,1,0,999,0,999");
        let below = ResolvedAction::new(ActionKind::ThinBelow, 0, "60,1,0,999,0,999");
        let a = render(&above).unwrap();
        let b = render(&below).unwrap();
        assert!(a.starts_with("ThinABA"));
        assert_eq!(a.replace("ThinABA", "ThinBBA"), b);
    }

    #[test]
    fn thin_record_uses_fixed_columns() {
        let action = ResolvedAction::new(ActionKind::ThinBelow, 1, "60,1,0,999,0,999");
        let line = render(&action).unwrap();
        assert_eq!(line.trim_end_matches('\n').len(), 80);
        assert_eq!(&line[..10], "ThinBBA   ");
        assert_eq!(&line[10..20], "         2");
    }

    #[test]
    fn clearcut_renders_two_passes() {
        let action = ActionRow::new("Clearcut", "3", "10,5,200").resolve(1).unwrap();
        let block = encode(&[action]).unwrap();
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            fields(lines[0]),
            vec!["ThinDBH", "4", "10", "200", "1.0", "0", "0", "0"]
        );
        assert_eq!(
            fields(lines[1]),
            vec!["ThinDBH", "4", "10", "999.0", "5", "0", "0", "0"]
        );
    }

    #[test]
    fn burn_is_bracketed() {
        let action = ActionRow::new("Prescribed Burn", "", "").resolve(1).unwrap();
        let block = encode(&[action]).unwrap();
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "FMIn");
        assert_eq!(
            fields(lines[1]),
            vec!["SimFire", "1", "8.0", "2", "70.0", "1", "70.0", "1"]
        );
        assert_eq!(lines[2], "End");
    }

    #[test]
    fn block_preserves_input_order() {
        let thin = ResolvedAction::new(ActionKind::ThinBelow, 1, "60,1,0,999,0,999");
        let burn = ResolvedAction::new(ActionKind::PrescribedBurn, 4, "8,2,70,1,70,1");
        let forward = encode(&[thin.clone(), burn.clone()]).unwrap();
        let reverse = encode(&[burn.clone(), thin.clone()]).unwrap();

        let thin_text = render(&thin).unwrap();
        let burn_text = render(&burn).unwrap();
        assert_eq!(forward, format!("{thin_text}{burn_text}"));
        assert_eq!(reverse, format!("{burn_text}{thin_text}"));
    }

    #[test]
    fn same_year_actions_are_not_merged() {
        let a = ResolvedAction::new(ActionKind::Clearcut, 2, "0,0,999");
        let b = ResolvedAction::new(ActionKind::Clearcut, 2, "0,0,999");
        let block = encode(&[a, b]).unwrap();
        assert_eq!(block.lines().count(), 4);
    }

    #[test]
    fn settings_count_mismatch_fails_the_block() {
        let good = ResolvedAction::new(ActionKind::Clearcut, 0, "0,0,999");
        let bad = ResolvedAction::new(ActionKind::PrescribedBurn, 0, "8,2,70");
        let err = encode(&[good, bad]).unwrap_err();
        assert!(matches!(
            err,
            StandsimError::SettingsCount {
                expected: 6,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn empty_action_list_encodes_to_empty_block() {
        assert_eq!(encode(&[]).unwrap(), "");
    }

    #[test]
    fn long_fraction_is_rejected_not_merged() {
        let action = ResolvedAction::new(ActionKind::ThinBelow, 0, "60,0.333333333333,0,999,0,999");
        let err = render(&action).unwrap_err();
        assert!(matches!(
            err,
            StandsimError::FieldTooWide { ref value, .. } if value == "0.333333333333"
        ));
    }

    #[test]
    fn ten_digit_setting_is_rejected() {
        let action = ResolvedAction::new(ActionKind::ThinBelow, 0, "1234567890,1,0,999,0,999");
        assert!(matches!(
            render(&action).unwrap_err(),
            StandsimError::FieldTooWide { .. }
        ));
    }

    #[test]
    fn largest_year_does_not_overflow() {
        let action = ActionRow::new("Clearcut", "4294967295", "").resolve(1).unwrap();
        assert!(matches!(
            render(&action).unwrap_err(),
            StandsimError::YearOutOfRange(4294967295)
        ));
    }

    #[test]
    fn nine_digit_year_still_fits() {
        let action = ResolvedAction::new(ActionKind::Clearcut, 999_999_997, "0,0,999");
        let block = render(&action).unwrap();
        assert_eq!(fields(block.lines().next().unwrap())[1], "999999998");
    }
}

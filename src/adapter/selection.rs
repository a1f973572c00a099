use crate::config::SelectionRule;

/// Outcome of picking the events to show from one source response.
#[derive(Debug, PartialEq)]
pub enum Selection<R> {
    Picked(Vec<R>),
    /// Nothing satisfied the rule.
    Missed,
}

/// Applies a group's selection rule to candidates in source order.
///
/// `ByMatch` keeps the first candidate whose title contains the needle
/// (plain, case-sensitive substring). `ByOrder` keeps the first candidate and
/// the second when there is one; later candidates are never looked at.
pub fn select<R, F>(candidates: Vec<R>, rule: &SelectionRule, title: F) -> Selection<R>
where
    F: Fn(&R) -> &str,
{
    let picked: Vec<R> = match rule {
        SelectionRule::ByMatch(needle) => candidates
            .into_iter()
            .find(|candidate| title(candidate).contains(needle.as_str()))
            .into_iter()
            .collect(),
        SelectionRule::ByOrder => candidates.into_iter().take(2).collect(),
    };

    if picked.is_empty() {
        Selection::Missed
    } else {
        Selection::Picked(picked)
    }
}

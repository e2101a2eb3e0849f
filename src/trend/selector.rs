//! Trend-biased content selection.
//!
//! Given a [`TrendAnalysis`] and a target count, split freshly fetched
//! content into `selected` and `remaining`:
//!
//! 1. keywords are the case-folded topic names and related tags;
//! 2. an item is relevant when its title, description or any tag contains a
//!    keyword;
//! 3. the target is shared out across kinds in proportion to how many
//!    relevant items each kind has, with the rounding remainder going to the
//!    kind with the most relevant items;
//! 4. each share is clamped to what the kind actually has, and any shortfall
//!    is topped up in random order, relevant leftovers first.

use std::collections::BTreeSet;

use crate::chance::{shuffle, Chance};
use crate::types::{ContentItem, ContentKind, TrendAnalysis};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub selected: Vec<ContentItem>,
    pub remaining: Vec<ContentItem>,
}

/// Lowercased topic names and related tags, deduplicated.
pub fn trend_keywords(analysis: &TrendAnalysis) -> Vec<String> {
    let mut keywords = BTreeSet::new();
    for topic in &analysis.topics {
        for word in std::iter::once(&topic.name).chain(topic.related_tags.iter()) {
            let word = word.trim().to_lowercase();
            if !word.is_empty() {
                keywords.insert(word);
            }
        }
    }
    keywords.into_iter().collect()
}

pub fn is_relevant(item: &ContentItem, keywords: &[String]) -> bool {
    let title = item.title.to_lowercase();
    let description = item.description.to_lowercase();
    let tags: Vec<String> = item.tags.iter().map(|t| t.to_lowercase()).collect();
    keywords.iter().any(|k| {
        title.contains(k.as_str())
            || description.contains(k.as_str())
            || tags.iter().any(|t| t.contains(k.as_str()))
    })
}

/// Per-kind quota for `target` given relevant counts per kind, before clamping.
///
/// A positive rounding remainder goes to the kind with the most relevant
/// items. A negative one is taken from that kind too, moving on to the next
/// largest once a quota reaches zero.
pub fn allocate(relevant: [usize; 4], target: usize) -> [usize; 4] {
    let total: usize = relevant.iter().sum();
    if total == 0 || target == 0 {
        return [0; 4];
    }

    let mut quota = relevant.map(|count| ((count * target) as f64 / total as f64).round() as usize);

    // Largest share first; earlier kinds win ties.
    let mut order = [0, 1, 2, 3];
    order.sort_by(|&a, &b| relevant[b].cmp(&relevant[a]).then(a.cmp(&b)));

    let assigned: usize = quota.iter().sum();
    if assigned < target {
        quota[order[0]] += target - assigned;
    } else {
        let mut excess = assigned - target;
        while excess > 0 {
            for &kind in &order {
                if excess > 0 && quota[kind] > 0 {
                    quota[kind] -= 1;
                    excess -= 1;
                }
            }
        }
    }
    quota
}

/// Split `items` into trend-relevant picks and the rest.
pub fn select(
    analysis: &TrendAnalysis,
    items: Vec<ContentItem>,
    target: usize,
    chance: &mut dyn Chance,
) -> Selection {
    let keywords = trend_keywords(analysis);

    let mut relevant: [Vec<ContentItem>; 4] = Default::default();
    let mut other: [Vec<ContentItem>; 4] = Default::default();
    for item in items {
        let slot = item.kind.index();
        if is_relevant(&item, &keywords) {
            relevant[slot].push(item);
        } else {
            other[slot].push(item);
        }
    }

    let quota = allocate(relevant.each_ref().map(Vec::len), target);

    let mut selected = Vec::with_capacity(target);
    let mut leftover_relevant = Vec::new();
    for kind in ContentKind::ALL {
        let slot = kind.index();
        let pool = std::mem::take(&mut relevant[slot]);
        let take = quota[slot].min(pool.len());
        let mut pool = pool.into_iter();
        selected.extend(pool.by_ref().take(take));
        leftover_relevant.extend(pool);
    }

    let mut leftover_other: Vec<ContentItem> = other.into_iter().flatten().collect();

    if selected.len() < target {
        let mut top_up_ids = BTreeSet::new();
        shuffle(chance, &mut leftover_relevant);
        shuffle(chance, &mut leftover_other);
        for item in leftover_relevant.iter().chain(leftover_other.iter()) {
            if selected.len() + top_up_ids.len() >= target {
                break;
            }
            top_up_ids.insert(item.id.clone());
        }
        let (picked_relevant, kept_relevant): (Vec<_>, Vec<_>) = leftover_relevant
            .into_iter()
            .partition(|i| top_up_ids.contains(&i.id));
        let (picked_other, kept_other): (Vec<_>, Vec<_>) = leftover_other
            .into_iter()
            .partition(|i| top_up_ids.contains(&i.id));
        selected.extend(picked_relevant);
        selected.extend(picked_other);
        leftover_relevant = kept_relevant;
        leftover_other = kept_other;
    }

    let mut remaining = leftover_relevant;
    remaining.append(&mut leftover_other);
    remaining.sort_by_key(|i| i.kind.index());

    Selection {
        selected,
        remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chance::FixedChance;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use crate::types::TrendTopic;
    use std::collections::HashSet;

    fn analysis(names: &[&str]) -> TrendAnalysis {
        TrendAnalysis::new(names.iter().map(|n| TrendTopic::new(*n)).collect())
    }

    fn items(kind: ContentKind, prefix: &str, relevant: usize, other: usize) -> Vec<ContentItem> {
        let mut out = Vec::new();
        for i in 0..relevant {
            out.push(
                ContentItem::new(kind, format!("{prefix}-r{i}"), format!("{prefix} r{i}"))
                    .with_tags(["llm"]),
            );
        }
        for i in 0..other {
            out.push(ContentItem::new(
                kind,
                format!("{prefix}-o{i}"),
                format!("{prefix} o{i}"),
            ));
        }
        out
    }

    fn pool(counts: [(usize, usize); 4]) -> Vec<ContentItem> {
        let prefixes = ["p", "m", "d", "s"];
        ContentKind::ALL
            .iter()
            .zip(counts)
            .zip(prefixes)
            .flat_map(|((kind, (r, o)), prefix)| items(*kind, prefix, r, o))
            .collect()
    }

    #[test]
    fn keywords_are_case_folded() {
        let mut a = analysis(&["LLM", "Vision"]);
        a.topics[1].related_tags = vec!["  VLM ".into(), "llm".into()];
        assert_eq!(trend_keywords(&a), vec!["llm", "vision", "vlm"]);
    }

    #[test]
    fn relevance_checks_title_description_and_tags() {
        let keywords = vec!["llm".to_string()];
        let by_title = ContentItem::new(ContentKind::Model, "a", "Tiny-LLM");
        let by_desc = ContentItem::new(ContentKind::Model, "b", "x").with_description("an LLM");
        let by_tag = ContentItem::new(ContentKind::Model, "c", "x").with_tags(["llm-serving"]);
        let none = ContentItem::new(ContentKind::Model, "d", "image net");
        assert!(is_relevant(&by_title, &keywords));
        assert!(is_relevant(&by_desc, &keywords));
        assert!(is_relevant(&by_tag, &keywords));
        assert!(!is_relevant(&none, &keywords));
    }

    #[test]
    fn allocation_is_proportional_and_sums_to_target() {
        assert_eq!(allocate([4, 4, 0, 0], 4), [2, 2, 0, 0]);
        assert_eq!(allocate([6, 2, 1, 1], 5), [2, 1, 1, 1]);
        assert_eq!(allocate([1, 1, 1, 0], 2).iter().sum::<usize>(), 2);
        assert_eq!(allocate([0, 0, 0, 0], 5), [0, 0, 0, 0]);
    }

    #[test]
    fn remainder_goes_to_largest_kind() {
        // 3 * (1/3) rounds to 1 each, sum 3 = target: no remainder.
        assert_eq!(allocate([2, 2, 2, 0], 3), [1, 1, 1, 0]);
        // shares 2.5, 1.5, 1.0 round to 3, 2, 1 = 6; one too many comes off the largest.
        assert_eq!(allocate([5, 3, 2, 0], 5), [2, 2, 1, 0]);
        // 0.5 each rounds up to 4 in total; the excess spills past the largest kind.
        assert_eq!(allocate([3, 3, 3, 3], 2), [0, 0, 1, 1]);
        // Short by one: the largest kind takes it.
        assert_eq!(allocate([3, 3, 3, 0], 4), [2, 1, 1, 0]);
    }

    #[test]
    fn selects_target_from_relevant_pool() {
        let trend = analysis(&["LLM"]);
        let content = pool([(4, 2), (4, 2), (0, 3), (0, 3)]);
        let total = content.len();

        let selection = select(&trend, content, 4, &mut FixedChance(0.0));

        assert_eq!(selection.selected.len(), 4);
        assert_eq!(selection.selected.len() + selection.remaining.len(), total);
        let papers = selection
            .selected
            .iter()
            .filter(|i| i.kind == ContentKind::Paper)
            .count();
        assert_eq!(papers, 2);
        assert!(selection.selected.iter().all(|i| i.id.contains("-r")));

        let selected: HashSet<_> = selection.selected.iter().map(|i| &i.id).collect();
        assert!(selection.remaining.iter().all(|i| !selected.contains(&i.id)));
    }

    #[test]
    fn shortfall_is_topped_up_from_remainder() {
        let trend = analysis(&["LLM"]);
        let content = pool([(1, 0), (0, 3), (0, 3), (0, 0)]);

        let selection = select(&trend, content, 4, &mut StdRng::seed_from_u64(7));

        assert_eq!(selection.selected.len(), 4);
        assert_eq!(selection.remaining.len(), 3);
        assert_eq!(selection.selected[0].id, "p-r0");
        let selected: HashSet<_> = selection.selected.iter().map(|i| &i.id).collect();
        assert!(selection.remaining.iter().all(|i| !selected.contains(&i.id)));
    }

    #[test]
    fn target_larger_than_pool_takes_everything() {
        let trend = analysis(&["LLM"]);
        let content = pool([(1, 1), (0, 1), (0, 0), (0, 0)]);
        let selection = select(&trend, content, 10, &mut FixedChance(0.5));
        assert_eq!(selection.selected.len(), 3);
        assert!(selection.remaining.is_empty());
    }

    #[test]
    fn property_proportional_within_one() {
        let trend = analysis(&["LLM"]);
        let mut rng = StdRng::seed_from_u64(42);
        for (p, m, d, s) in [(3, 3, 3, 3), (8, 4, 2, 2), (1, 5, 0, 2), (10, 0, 0, 0), (2, 2, 2, 2)] {
            let counts = [p, m, d, s];
            let total: usize = counts.iter().sum();
            for target in 1..=total {
                let content = pool([(p, 1), (m, 1), (d, 1), (s, 1)]);
                let selection = select(&trend, content, target, &mut rng);
                assert_eq!(selection.selected.len(), target);
                // Enough relevant items: quotas alone fill the target.
                assert!(
                    selection.selected.iter().all(|i| i.id.contains("-r")),
                    "non-relevant pick for {counts:?} target {target}"
                );
                for kind in ContentKind::ALL {
                    let got = selection.selected.iter().filter(|i| i.kind == kind).count() as f64;
                    let ideal = counts[kind.index()] as f64 / total as f64 * target as f64;
                    assert!(
                        (got - ideal).abs() <= 1.5,
                        "{kind}: got {got}, ideal {ideal} for {counts:?} target {target}"
                    );
                }
            }
        }
    }
}

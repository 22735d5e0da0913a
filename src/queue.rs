use crate::models::Card;
use chrono::NaiveDateTime;
use rand::seq::SliceRandom;
use rand::Rng;

/// A card in a study queue, remembering whether it was due when the queue was built.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedCard {
    pub card: Card,
    pub due: bool,
}

/// Splits cards into due and not yet due ones, keeping the input order in both.
pub fn partition_due(cards: Vec<Card>, now: NaiveDateTime) -> (Vec<Card>, Vec<Card>) {
    cards.into_iter().partition(|card| card.is_due(now))
}

/// Builds the study order: due cards shuffled, followed by the remaining cards
/// in their original order.
pub fn build_queue<R>(cards: Vec<Card>, now: NaiveDateTime, rng: &mut R) -> Vec<QueuedCard>
where
    R: Rng + ?Sized,
{
    let (mut due, not_due) = partition_due(cards, now);
    // Fisher-Yates
    due.shuffle(rng);
    due.into_iter()
        .map(|card| QueuedCard { card, due: true })
        .chain(not_due.into_iter().map(|card| QueuedCard { card, due: false }))
        .collect()
}

#[cfg(test)]
pub(crate) fn test_deck(now: NaiveDateTime, due: usize, not_due: usize) -> Vec<Card> {
    use chrono::TimeDelta;

    let (mut due_left, mut not_due_left) = (due, not_due);
    let mut cards = Vec::new();
    for i in 0..due + not_due {
        let mut card = Card::new(
            format!("c{}", i),
            String::from("deck"),
            format!("front {}", i),
            format!("back {}", i),
        );
        // Interleave due and not due cards
        if not_due_left == 0 || (due_left > 0 && i % 2 == 0) {
            due_left -= 1;
            card.due_date = match i % 3 {
                0 => None,
                1 => Some(now),
                _ => Some(now - TimeDelta::days(1)),
            };
        } else {
            not_due_left -= 1;
            card.due_date = Some(now + TimeDelta::days(i as i64 + 1));
        }
        cards.push(card);
    }
    cards
}

#[test]
fn test_due_cards_first_then_not_due_in_order() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    let now = chrono::NaiveDate::from_ymd_opt(2025, 5, 10)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    let cards = test_deck(now, 3, 2);
    let due_ids: HashSet<String> = cards
        .iter()
        .filter(|c| c.is_due(now))
        .map(|c| c.id.clone())
        .collect();
    let not_due: Vec<Card> = cards.iter().filter(|c| !c.is_due(now)).cloned().collect();
    assert_eq!(due_ids.len(), 3);
    assert_eq!(not_due.len(), 2);

    let queue = build_queue(cards, now, &mut StdRng::seed_from_u64(7));

    assert_eq!(queue.len(), 5);
    let head: HashSet<String> = queue[..3].iter().map(|q| q.card.id.clone()).collect();
    assert_eq!(head, due_ids);
    assert!(queue[..3].iter().all(|q| q.due));
    let tail: Vec<Card> = queue[3..].iter().map(|q| q.card.clone()).collect();
    assert_eq!(tail, not_due);
    assert!(queue[3..].iter().all(|q| !q.due));
}

#[test]
fn test_partition_is_stable_for_same_time() {
    let now = chrono::NaiveDate::from_ymd_opt(2025, 5, 10)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    let cards = test_deck(now, 4, 3);
    let first = partition_due(cards.clone(), now);
    let second = partition_due(cards, now);
    assert_eq!(first, second);
}

#[test]
fn test_shuffle_reaches_every_order() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    let now = chrono::NaiveDate::from_ymd_opt(2025, 5, 10)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    let cards = test_deck(now, 3, 0);
    let mut rng = StdRng::seed_from_u64(42);
    let mut orders = HashSet::new();
    for _ in 0..600 {
        let order: Vec<String> = build_queue(cards.clone(), now, &mut rng)
            .into_iter()
            .map(|q| q.card.id)
            .collect();
        orders.insert(order);
    }
    assert_eq!(orders.len(), 6);
}

#[test]
fn test_empty_deck_gives_empty_queue() {
    let now = chrono::NaiveDate::from_ymd_opt(2025, 5, 10)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    assert!(build_queue(Vec::new(), now, &mut rand::rng()).is_empty());
}

//! Integration tests for live query subscriptions.


use std::time::{Duration, Instant};

use models::Player;

use stored_rust::{
    FetchSpecification, InMemoryBackend, PersistenceClient, SortDirection, Subscription,
};

fn client() -> PersistenceClient<InMemoryBackend> {
    PersistenceClient::new(InMemoryBackend::new())
}

/// Drain snapshots until one satisfies `accept`. Change notifications are
/// delivered off-thread, so intermediate snapshots may or may not be seen.
fn next_snapshot_where<F>(sub: &Subscription<Player>, accept: F) -> Vec<Player>
where
    F: Fn(&[Player]) -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if let Some(snapshot) = sub.poll(200).unwrap() {
            if accept(&snapshot) {
                return snapshot;
            }
        }
    }
    panic!("no matching snapshot arrived within 5s");
}

#[test]
fn subscription_emits_the_initial_snapshot() {
    let client = client();
    client
        .insert(&[Player::new("1", "ada"), Player::new("2", "grace")])
        .wait()
        .unwrap();

    let sub = client
        .observable(FetchSpecification::<Player>::new())
        .unwrap();

    let initial = next_snapshot_where(&sub, |s| !s.is_empty());
    assert_eq!(initial.len(), 2);
}

#[test]
fn delete_commits_push_a_snapshot_excluding_the_record() {
    let client = client();
    let ada = Player::new("1", "ada");
    let grace = Player::new("2", "grace");
    client.insert(&[ada.clone(), grace.clone()]).wait().unwrap();

    let sub = client
        .observable(FetchSpecification::<Player>::new())
        .unwrap();
    let initial = next_snapshot_where(&sub, |s| s.len() == 2);
    assert!(initial.contains(&grace));

    client.delete(&[grace]).wait().unwrap();

    let after = next_snapshot_where(&sub, |s| s.len() == 1);
    assert_eq!(after, vec![ada]);
}

#[test]
fn filtered_subscription_tracks_only_the_matching_set() {
    let client = client();
    let ada = Player::new("1", "ada");
    let grace = Player::new("2", "grace");
    client.insert(&[ada.clone(), grace.clone()]).wait().unwrap();

    let spec = FetchSpecification::new()
        .filter(|p: &Player| p.online)
        .sort_by_key(|p: &Player| p.name.clone(), SortDirection::Ascending);
    let sub = client.observable(spec).unwrap();
    next_snapshot_where(&sub, |s| s.len() == 2);

    let mut offline = grace.clone();
    offline.online = false;
    client.update(&[offline]).wait().unwrap();

    let after = next_snapshot_where(&sub, |s| s.len() == 1);
    assert_eq!(after, vec![ada]);
}

#[test]
fn cancelled_subscription_receives_no_new_snapshots() {
    let client = client();
    client.insert(&[Player::new("1", "ada")]).wait().unwrap();

    let sub = client
        .observable(FetchSpecification::<Player>::new())
        .unwrap();
    next_snapshot_where(&sub, |s| s.len() == 1);

    sub.cancel();
    assert!(sub.is_cancelled());

    client.insert(&[Player::new("2", "grace")]).wait().unwrap();
    assert_eq!(sub.poll(200).unwrap(), None);
}

#[test]
fn independent_subscriptions_see_their_own_queries() {
    let client = client();
    let ada = Player::new("1", "ada");
    let mut grace = Player::new("2", "grace");
    grace.online = false;
    client.insert(&[ada.clone(), grace.clone()]).wait().unwrap();

    let everyone = client
        .observable(FetchSpecification::<Player>::new())
        .unwrap();
    let online_only = client
        .observable(FetchSpecification::new().filter(|p: &Player| p.online))
        .unwrap();

    assert_eq!(next_snapshot_where(&everyone, |s| !s.is_empty()).len(), 2);
    assert_eq!(next_snapshot_where(&online_only, |s| !s.is_empty()), vec![ada]);
}

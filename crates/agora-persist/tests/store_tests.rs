use std::sync::Arc;

use agora_core::{default_personalities, Argument, Debate, DebateResult, DebateStatus, RuleViolation};
use agora_persist::{DebateStore, PersonalityStore, SqliteBackend, StorageBackend, UpdateError};

fn started(names: &[&str]) -> Debate {
    let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
    let mut debate = Debate::new("Is remote work here to stay?", None, names.clone(), 3).unwrap();
    let round_one = names
        .iter()
        .map(|n| Argument::new(n.clone(), format!("{} opens with a strong claim.", n), 1))
        .collect();
    debate.begin(round_one).unwrap();
    debate
}

#[tokio::test]
async fn test_sqlite_concurrent_votes_are_not_lost() -> Result<(), Box<dyn std::error::Error>> {
    let backend = Arc::new(SqliteBackend::new("sqlite::memory:").await?);
    let store = DebateStore::new(backend.clone());
    let debate = started(&["The Philosopher", "The Scientist"]);
    let id = debate.id;
    store.insert(&debate).await?;

    let mut handles = Vec::new();
    for i in 0..12 {
        let store = store.clone();
        let target = if i % 3 == 0 { "The Philosopher" } else { "The Scientist" };
        handles.push(tokio::spawn(async move {
            store
                .update(id, |d| d.record_vote(target, &format!("voter-{}", i), None))
                .await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    let stored = store.load(id).await?.expect("debate exists");
    assert_eq!(stored.total_votes, 12);
    assert_eq!(stored.votes_for("The Philosopher"), 4);
    assert_eq!(stored.votes_for("The Scientist"), 8);
    assert!(stored.votes_consistent());
    Ok(())
}

#[tokio::test]
async fn test_sqlite_duplicate_vote_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let store = DebateStore::new(Arc::new(SqliteBackend::new("sqlite::memory:").await?));
    let debate = started(&["The Philosopher", "The Scientist"]);
    store.insert(&debate).await?;

    store
        .update(debate.id, |d| d.record_vote("The Scientist", "alice", None))
        .await?;
    let again = store
        .update(debate.id, |d| d.record_vote("The Philosopher", "alice", None))
        .await;
    assert!(matches!(
        again,
        Err(UpdateError::Rejected(RuleViolation::DuplicateVote { .. }))
    ));
    assert_eq!(store.load(debate.id).await?.unwrap().total_votes, 1);
    Ok(())
}

#[tokio::test]
async fn test_sqlite_judge_only_once() -> Result<(), Box<dyn std::error::Error>> {
    let store = DebateStore::new(Arc::new(SqliteBackend::new("sqlite::memory:").await?));
    let debate = started(&["The Philosopher", "The Scientist"]);
    store.insert(&debate).await?;

    let (judged, ()) = store
        .update(debate.id, |d| d.judge("The Scientist", None, Some("judge-1".into())))
        .await?;
    assert_eq!(judged.status, DebateStatus::Judged);

    let second = store
        .update(debate.id, |d| d.judge("The Philosopher", None, None))
        .await;
    assert!(matches!(
        second,
        Err(UpdateError::Rejected(RuleViolation::AlreadyJudged))
    ));
    let stored = store.load(debate.id).await?.unwrap();
    assert_eq!(stored.winner.as_deref(), Some("The Scientist"));
    Ok(())
}

#[tokio::test]
async fn test_sqlite_personalities_seed_and_list() -> Result<(), Box<dyn std::error::Error>> {
    let backend = Arc::new(SqliteBackend::new("sqlite::memory:").await?);
    assert!(backend.is_healthy().await);

    let store = PersonalityStore::new(backend);
    assert_eq!(store.seed_if_empty(&default_personalities()).await?, 6);

    let all = store.load_all().await?;
    assert_eq!(all.len(), 6);
    assert!(all.iter().any(|p| p.name == "The Philosopher"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_sqlite_votes_under_thread_contention() -> Result<(), Box<dyn std::error::Error>> {
    let backend = Arc::new(SqliteBackend::new("sqlite::memory:").await?);
    let store = DebateStore::new(backend.clone());
    let debate = started(&["The Philosopher", "The Scientist", "The Historian"]);
    let id = debate.id;
    store.insert(&debate).await?;

    let mut handles = Vec::new();
    for i in 0..300 {
        let store = store.clone();
        let target = ["The Philosopher", "The Scientist", "The Historian"][i % 3];
        handles.push(tokio::spawn(async move {
            store
                .update(id, |d| d.record_vote(target, &format!("voter-{}", i), None))
                .await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    let stored = store.load(id).await?.expect("debate exists");
    assert_eq!(stored.total_votes, 300);
    assert_eq!(stored.voter_records.len(), 300);
    for name in ["The Philosopher", "The Scientist", "The Historian"] {
        assert_eq!(stored.votes_for(name), 100);
    }
    assert!(stored.votes_consistent());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_personality_results_under_thread_contention() -> Result<(), Box<dyn std::error::Error>> {
    let backend = Arc::new(SqliteBackend::new("sqlite::memory:").await?);
    let store = PersonalityStore::new(backend);
    store.seed_if_empty(&default_personalities()).await?;

    let mut handles = Vec::new();
    for i in 0..200u64 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .update::<_, RuleViolation, _>("The Contrarian", |p| {
                    p.record_result(DebateResult {
                        won: i % 4 == 0,
                        votes_received: 1,
                        arguments_contributed: 3,
                    });
                    Ok(())
                })
                .await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    let contrarian = store.load("The Contrarian").await?.expect("seeded");
    assert_eq!(contrarian.total_debates, 200);
    assert_eq!(contrarian.wins, 50);
    assert_eq!(contrarian.total_arguments, 600);
    assert!((contrarian.average_votes - 1.0 / 3.0).abs() < 1e-9);
    Ok(())
}
